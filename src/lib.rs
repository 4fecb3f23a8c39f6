//! Calorie Tracker Rust Client Library
//!
//! A client for the Calorie Tracker REST API (authentication, food catalog
//! and meal ledger) together with the application state store that drives
//! the tracker's screens: navigation, session, today's food ledger and the
//! derived calorie target.

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod foods;
pub mod meals;
pub mod store;

use std::sync::Arc;

use reqwest::Client;

use crate::auth::{AuthClient, FileTokenStore, MemoryTokenStore, TokenStore};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::foods::FoodsClient;
use crate::meals::MealsClient;

/// The main entry point for talking to the Calorie Tracker API
#[derive(Clone)]
pub struct ApiClient {
    /// The base URL of the API
    pub url: String,
    /// HTTP client used for requests
    http_client: Client,
    /// Where the access token is persisted
    tokens: Arc<dyn TokenStore>,
    auth: AuthClient,
    foods: FoodsClient,
    meals: MealsClient,
    /// Client options
    options: ClientOptions,
}

impl ApiClient {
    /// Create a new client.
    ///
    /// The token is kept in a file when `options.token_path` is set and in
    /// memory otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use calorie_tracker_client::{ApiClient, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_base_url("http://localhost:8000");
    /// let api = ApiClient::new(options).unwrap();
    /// assert_eq!(api.url, "http://localhost:8000");
    /// ```
    pub fn new(options: ClientOptions) -> Result<Self> {
        let tokens: Arc<dyn TokenStore> = match &options.token_path {
            Some(path) => Arc::new(FileTokenStore::new(path, &options.token_storage_key)),
            None => Arc::new(MemoryTokenStore::new()),
        };
        Self::with_token_store(options, tokens)
    }

    /// Create a new client that persists its token in `tokens`
    pub fn with_token_store(options: ClientOptions, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let url = options.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            auth: AuthClient::new(&url, http_client.clone(), tokens.clone()),
            foods: FoodsClient::new(&url, http_client.clone(), tokens.clone()),
            meals: MealsClient::new(&url, http_client.clone(), tokens.clone()),
            url,
            http_client,
            tokens,
            options,
        })
    }

    /// Convenience constructor reading [`ClientOptions::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::from_env()?)
    }

    /// Authentication and user profile
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Food catalog
    pub fn foods(&self) -> &FoodsClient {
        &self.foods
    }

    /// Meal ledger
    pub fn meals(&self) -> &MealsClient {
        &self.meals
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Probe the diagnostic path. `false` usually means the server is still
    /// starting up; this never returns an error.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}{}", self.url, self.options.health_path);
        Fetch::get(&self.http_client, &url).execute_raw().await.is_ok()
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, Result};
    pub use crate::meals::MealType;
    pub use crate::store::{AppState, AppStore, FoodEntry, LocalProfile, NewFoodEntry, Screen};
    pub use crate::ApiClient;
}

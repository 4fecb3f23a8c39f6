//! Authentication and user profile access

mod session;
mod token;
mod types;
pub mod validate;

use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::Error;
use crate::fetch::Fetch;

pub use session::*;
pub use token::*;
pub use types::*;

/// Calorie goal sent at registration when the user does not choose one
pub const DEFAULT_DAILY_CALORIE_GOAL: u32 = 2000;

/// Client for the authentication and user endpoints
#[derive(Clone)]
pub struct AuthClient {
    /// The base URL of the API
    url: String,

    /// HTTP client used for requests
    client: Client,

    /// Where the access token is persisted
    tokens: Arc<dyn TokenStore>,
}

impl AuthClient {
    pub(crate) fn new(url: &str, client: Client, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            url: url.to_string(),
            client,
            tokens,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    /// Register a new account and store the returned token
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        daily_calorie_goal: u32,
    ) -> Result<AuthResponse, Error> {
        let body = SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            daily_calorie_goal,
        };

        let result = Fetch::post(&self.client, &self.endpoint("/auth/signup"))
            .json(&body)?
            .execute::<AuthResponse>()
            .await?;

        self.tokens.set(&result.access_token)?;
        info!(email, "account registered");
        Ok(result)
    }

    /// Sign in with email and password and store the returned token
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let result = Fetch::post(&self.client, &self.endpoint("/auth/login"))
            .json(&body)?
            .execute::<AuthResponse>()
            .await?;

        self.tokens.set(&result.access_token)?;
        info!(email, "signed in");
        Ok(result)
    }

    /// Forget the stored token. The backend keeps no session, so nothing is sent.
    pub fn sign_out(&self) -> Result<(), Error> {
        self.tokens.remove()
    }

    /// Get the profile of the signed-in user
    pub async fn get_profile(&self) -> Result<UserProfile, Error> {
        let token = self.tokens.get();
        Fetch::get(&self.client, &self.endpoint("/users/me"))
            .bearer_auth(token.as_deref())
            .execute::<UserProfile>()
            .await
    }

    /// Check the stored token against the backend.
    ///
    /// Returns the token and the profile it belongs to. On any failure the
    /// stored token is discarded, so a later call starts from a clean slate.
    pub async fn validate_token(&self) -> Option<(String, UserProfile)> {
        let token = self.tokens.get()?;

        if is_expired(&token, chrono::Utc::now()) {
            debug!("stored token has expired");
            self.discard_token();
            return None;
        }

        match self.get_profile().await {
            Ok(profile) => Some((token, profile)),
            Err(e) => {
                debug!(error = %e, "stored token rejected");
                self.discard_token();
                None
            }
        }
    }

    /// The stored token, without validation
    pub fn stored_token(&self) -> Option<String> {
        self.tokens.get()
    }

    fn discard_token(&self) {
        if let Err(e) = self.tokens.remove() {
            tracing::warn!(error = %e, "failed to remove stored token");
        }
    }
}

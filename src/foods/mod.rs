//! Food catalog lookup

mod types;

use std::sync::Arc;

use reqwest::Client;

use crate::auth::TokenStore;
use crate::error::Error;
use crate::fetch::Fetch;

pub use types::*;

/// Client for the `/foods` endpoints
#[derive(Clone)]
pub struct FoodsClient {
    url: String,
    client: Client,
    tokens: Arc<dyn TokenStore>,
}

impl FoodsClient {
    pub(crate) fn new(url: &str, client: Client, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            url: url.to_string(),
            client,
            tokens,
        }
    }

    /// List the whole catalog
    pub async fn list(&self) -> Result<Vec<Food>, Error> {
        let token = self.tokens.get();
        Fetch::get(&self.client, &format!("{}/foods", self.url))
            .bearer_auth(token.as_deref())
            .execute::<Vec<Food>>()
            .await
    }

    /// Case-insensitive substring search by name
    pub async fn search(&self, query: &str) -> Result<Vec<Food>, Error> {
        let token = self.tokens.get();
        Fetch::get(&self.client, &format!("{}/foods", self.url))
            .bearer_auth(token.as_deref())
            .query("search", query)
            .execute::<Vec<Food>>()
            .await
    }
}

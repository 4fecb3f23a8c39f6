//! Configuration options for the Calorie Tracker client

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Storage key the access token is kept under.
pub const DEFAULT_TOKEN_KEY: &str = "calorie_tracker_token";

/// Configuration options for the Calorie Tracker client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The base URL of the Calorie Tracker API
    pub base_url: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The key the access token is persisted under
    pub token_storage_key: String,

    /// File used for durable token storage; `None` keeps the token in memory
    pub token_path: Option<PathBuf>,

    /// Quiet period after the last keystroke before a food search is sent
    pub search_debounce: Duration,

    /// Path probed by the health check
    pub health_path: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            token_storage_key: DEFAULT_TOKEN_KEY.to_string(),
            token_path: None,
            search_debounce: Duration::from_millis(300),
            health_path: "/docs".to_string(),
        }
    }
}

impl ClientOptions {
    /// Build options from the environment.
    ///
    /// `CALORIE_TRACKER_API_URL` overrides the base URL,
    /// `CALORIE_TRACKER_TIMEOUT_SECS` the request timeout (`0` disables it) and
    /// `CALORIE_TRACKER_TOKEN_PATH` enables file token storage at that path.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();

        if let Ok(url) = std::env::var("CALORIE_TRACKER_API_URL") {
            url::Url::parse(&url)?;
            options.base_url = url;
        }

        if let Ok(secs) = std::env::var("CALORIE_TRACKER_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                Error::config(format!("CALORIE_TRACKER_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            options.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Ok(path) = std::env::var("CALORIE_TRACKER_TOKEN_PATH") {
            options.token_path = Some(PathBuf::from(path));
        }

        Ok(options)
    }

    /// Default location for the durable token file, under the user data directory
    pub fn default_token_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("calorie-tracker").join("session.json"))
    }

    /// Set the base URL
    pub fn with_base_url(mut self, value: &str) -> Self {
        self.base_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the token storage key
    pub fn with_token_storage_key(mut self, value: &str) -> Self {
        self.token_storage_key = value.to_string();
        self
    }

    /// Persist the token to a file
    pub fn with_token_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.token_path = Some(value.into());
        self
    }

    /// Set the search debounce delay
    pub fn with_search_debounce(mut self, value: Duration) -> Self {
        self.search_debounce = value;
        self
    }

    /// Set the health probe path
    pub fn with_health_path(mut self, value: &str) -> Self {
        self.health_path = value.to_string();
        self
    }
}

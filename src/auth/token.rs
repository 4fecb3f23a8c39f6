//! Durable storage for the access token

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::warn;

use crate::error::Result;

/// Where the access token lives between runs.
///
/// A token's presence says nothing about its validity; callers validate it
/// against the backend before treating the user as signed in.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Token storage that lasts as long as the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token already stored, as if from a previous run
    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        if let Ok(mut current) = self.token.write() {
            *current = Some(token.to_string());
        }
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if let Ok(mut current) = self.token.write() {
            *current = None;
        }
        Ok(())
    }
}

/// Token storage in a JSON file, keyed so several values can share the file
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            path: path.into(),
            key: key.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(values)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match self.read_all() {
            Ok(mut values) => values.remove(&self.key),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token file unreadable");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut values = self.read_all().unwrap_or_default();
        values.insert(self.key.clone(), token.to_string());
        self.write_all(&values)
    }

    fn remove(&self) -> Result<()> {
        let mut values = self.read_all().unwrap_or_default();
        if values.remove(&self.key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Read the `exp` claim of a JWT without verifying its signature.
///
/// Returns `None` for opaque tokens and for JWTs without an expiry.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let header = jsonwebtoken::decode_header(token).ok()?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation.algorithms = vec![header.alg, Algorithm::HS256];

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    data.claims
        .exp
        .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
}

/// True when the token is a JWT whose expiry has already passed
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    token_expiry(token).map(|exp| exp <= now).unwrap_or(false)
}

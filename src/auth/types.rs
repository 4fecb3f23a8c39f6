//! Wire types for authentication and user profiles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /auth/login`
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /auth/signup`
#[derive(Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub daily_calorie_goal: u32,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("daily_calorie_goal", &self.daily_calorie_goal)
            .finish()
    }
}

/// Authentication response
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The access token
    pub access_token: String,

    /// The token type, normally `bearer`
    pub token_type: String,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Profile of the signed-in user as held by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub daily_calorie_goal: u32,
    pub created_at: String,
}

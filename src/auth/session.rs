//! Client-side view of the signed-in session

use super::types::UserProfile;

/// Session data held by the application store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Set only after the stored token has been validated by the backend
    pub is_authenticated: bool,

    /// True while a silent token validation is in flight
    pub checking_auth: bool,

    /// The validated access token
    pub token: Option<String>,

    /// Email of the signed-in user
    pub user_email: Option<String>,

    /// Profile as last fetched from the backend
    pub backend_profile: Option<UserProfile>,
}

impl Session {
    /// A session for a user whose token was just accepted by the backend
    pub fn authenticated(token: String, profile: UserProfile) -> Self {
        Self {
            is_authenticated: true,
            checking_auth: false,
            token: Some(token),
            user_email: Some(profile.email.clone()),
            backend_profile: Some(profile),
        }
    }

    /// Daily goal stored on the backend, if a profile is cached
    pub fn daily_calorie_goal(&self) -> Option<u32> {
        self.backend_profile.as_ref().map(|p| p.daily_calorie_goal)
    }
}

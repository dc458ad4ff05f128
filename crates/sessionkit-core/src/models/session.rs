use serde::Serialize;

use super::UserProfile;

/// Point-in-time copy of the session store's state.
///
/// `token` present with `user` absent means the session is authenticated
/// but the profile has not been loaded yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }

    pub fn is_profile_loaded(&self) -> bool {
        self.user.is_some()
    }
}

//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use corona_core::{Email, Role, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user and
/// decide admin access without a database round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
    /// Permission tier at sign-in.
    pub role: Role,
}

impl CurrentUser {
    /// Whether this user may act on `user_id`'s profile and history.
    #[must_use]
    pub fn can_access(&self, user_id: UserId) -> bool {
        self.id == user_id || self.role.is_admin()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";
}

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use super::coerce::{lenient_counter, lenient_string, lenient_strings};

/// User role. Normal flows never change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

/// User record stored in the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Derived from the institutional e-mail's local part (also the row key)
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    /// Event ids; semantically a set, never holds duplicates
    #[serde(default, deserialize_with = "lenient_strings")]
    pub registered_events: Vec<String>,
    /// Number of events this user has created
    #[serde(default, deserialize_with = "lenient_counter")]
    pub created_events: u64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_registered_for(&self, event_id: &str) -> bool {
        self.registered_events.iter().any(|id| id == event_id)
    }
}

/// Signup payload for `POST /users`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    /// Explicit id; derived from the e-mail when absent
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}

/// User projection returned by `GET /users/{id}`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub registered_events: Vec<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub created_events: u64,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            registered_events: user.registered_events,
            created_events: user.created_events,
        }
    }
}

/// Derive a user id from an e-mail address.
///
/// `student@bu.edu` with domain `bu.edu` becomes `student`. Addresses outside
/// the domain (or plain ids) come back unchanged.
pub fn user_id_from_email(email: &str, domain: &str) -> String {
    let email = email.trim();
    let suffix = format!("@{}", domain.trim_start_matches('@'));
    let Some(split) = email.len().checked_sub(suffix.len()) else {
        return email.to_string();
    };
    match (email.get(..split), email.get(split..)) {
        (Some(local), Some(tail)) if tail.eq_ignore_ascii_case(&suffix) => local.to_string(),
        _ => email.to_string(),
    }
}

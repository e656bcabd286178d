// src/models/user.rs

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::game::GameSummary;

/// Account role, stored as the `user_role` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Unique, lowercased email address.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub role: UserRole,

    pub avatar: Option<String>,

    pub notify_new_releases: bool,
    pub notify_updates: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Full profile of the current user, bookmarks included.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub bookmarks: Vec<GameSummary>,
}

/// Reporter identity attached to admin report listings.
#[derive(Debug, Clone, Serialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(email(message = "Valid email required"))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
}

impl RegisterRequest {
    /// Trims the username and normalizes the email; validation runs on the result.
    pub fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for profile updates.
///
/// Absent fields are left untouched. `avatar` distinguishes "not provided"
/// from an explicit `null` (or blank string), which clears it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub avatar: Option<Option<String>>,
    pub notify_new_releases: Option<bool>,
    pub notify_updates: Option<bool>,
}

impl UpdateProfileRequest {
    /// Trims the username and normalizes the email; validation runs on the result.
    pub fn trimmed(self) -> Self {
        Self {
            username: self.username.map(|u| u.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
            ..self
        }
    }

    /// Avatar change requested by the caller, if any: `Some(None)` clears.
    pub fn avatar_update(&self) -> Option<Option<String>> {
        self.avatar.as_ref().map(|value| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.avatar.is_none()
            && self.notify_new_releases.is_none()
            && self.notify_updates.is_none()
    }
}

/// DTO for changing the password.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 128))]
    pub current_password: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "New password must be at least 6 characters"
    ))]
    pub new_password: String,
}

/// DTO for notification preference flags.
#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub notify_new_releases: Option<bool>,
    pub notify_updates: Option<bool>,
}

/// Wraps any present value (including `null`) in `Some`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

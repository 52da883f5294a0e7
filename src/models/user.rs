//! User models for federated identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Fallback username when the identity carries neither a username nor an email.
const FALLBACK_USERNAME: &str = "user";

/// User stored in database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    /// Stable subject from the identity provider.
    pub oidc_sub: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity attributes received from the authenticating proxy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub email: String,
    pub preferred_username: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

impl IdentityClaims {
    /// Username to create the account with.
    ///
    /// Falls back to the local part of the email address, then to a fixed placeholder.
    pub fn derived_username(&self) -> String {
        if let Some(name) = self
            .preferred_username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return name.to_string();
        }

        match self.email.split_once('@') {
            Some((local, _)) if !local.trim().is_empty() => local.trim().to_string(),
            _ => FALLBACK_USERNAME.to_string(),
        }
    }
}

/// User info response (returned by /auth/me).
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
}

impl UserResponse {
    pub fn new(user: User, is_admin: bool) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_admin,
        }
    }
}

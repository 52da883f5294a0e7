//! Administrator membership.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A username granted administrative capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

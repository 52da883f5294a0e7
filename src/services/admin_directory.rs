//! Administrator membership lookup.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::db::DbPool;

/// Answers whether a username carries administrative capability.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn is_admin(&self, username: &str) -> bool;
}

/// Membership backed by the `admin_users` table, plus usernames from configuration.
#[derive(Clone)]
pub struct DbAdminDirectory {
    pool: DbPool,
    bootstrap: HashSet<String>,
}

impl DbAdminDirectory {
    pub fn new(pool: DbPool, bootstrap: impl IntoIterator<Item = String>) -> Self {
        Self {
            pool,
            bootstrap: bootstrap.into_iter().collect(),
        }
    }
}

#[async_trait]
impl AdminDirectory for DbAdminDirectory {
    async fn is_admin(&self, username: &str) -> bool {
        if self.bootstrap.contains(username) {
            return true;
        }
        match self.pool.admin_exists(username).await {
            Ok(exists) => exists,
            Err(e) => {
                // Lookup failures deny access
                tracing::error!(username = %username, "Admin lookup failed: {}", e);
                false
            }
        }
    }
}

/// Fixed membership, for tests and single-operator setups.
#[derive(Debug, Clone, Default)]
pub struct StaticAdminDirectory {
    admins: HashSet<String>,
}

impl StaticAdminDirectory {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl AdminDirectory for StaticAdminDirectory {
    async fn is_admin(&self, username: &str) -> bool {
        self.admins.contains(username)
    }
}

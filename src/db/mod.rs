//! Database module providing connection management, migrations, and queries.

pub mod admin_users;
pub mod priorities;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use sea_orm_migration::MigratorTrait;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Shared SeaORM connection pool.
#[derive(Clone)]
pub struct DbPool {
    conn: Arc<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        Self::connect(
            &config.database.url,
            config.database.max_connections,
            config.database.connect_timeout_secs,
        )
        .await
    }

    /// Connect to `url` with an explicit pool size.
    ///
    /// An in-memory SQLite database lives only as long as its connection, so callers
    /// using `sqlite::memory:` must pass a pool size of 1.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> AppResult<Self> {
        tracing::info!("Connecting to database: {}", mask_connection_string(url));

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        conn.ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))?;

        Ok(DbPool {
            conn: Arc::new(conn),
        })
    }

    /// Get access to the connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(self.connection(), None)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Number of known migrations not yet applied.
    pub async fn pending_migrations(&self) -> AppResult<usize> {
        let pending = Migrator::get_pending_migrations(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to read migration state: {}", e)))?;
        Ok(pending.len())
    }
}

/// True when `err` is a uniqueness violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Hide credentials in a connection string before logging it.
fn mask_connection_string(url: &str) -> String {
    match (url.find("//"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}****{}", &url[..scheme_end + 2], &url[at..])
        }
        _ => url.to_string(),
    }
}

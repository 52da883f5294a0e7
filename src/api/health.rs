//! Liveness and readiness checks for the priority service.

use actix_web::{HttpResponse, get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::error::ErrorResponse;
use crate::services::PriorityService;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    service: &'static str,
    version: &'static str,
    /// Current time on the service clock (RFC 3339).
    now: String,
}

/// Readiness: the database answers and the schema is current.
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    status: &'static str,
    pending_migrations: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health(service: web::Data<PriorityService>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        now: service.now().to_rfc3339(),
    })
}

/// Ready once the database is reachable and every migration is applied.
#[utoipa::path(
    get,
    path = "/api/v1/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Accepting requests", body = ReadyResponse),
        (status = 503, description = "Database unreachable or schema behind", body = ErrorResponse)
    )
)]
#[get("/ready")]
pub async fn ready(pool: web::Data<DbPool>) -> HttpResponse {
    match pool.pending_migrations().await {
        Ok(0) => HttpResponse::Ok().json(ReadyResponse {
            status: "ready",
            pending_migrations: 0,
        }),
        Ok(pending) => {
            tracing::warn!(pending, "Not ready: migrations pending");
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "MIGRATIONS_PENDING".to_string(),
                message: format!("{} migration(s) not applied", pending),
                details: Vec::new(),
            })
        }
        Err(e) => {
            tracing::warn!("Not ready: {}", e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "DATABASE_UNAVAILABLE".to_string(),
                message: "Database connection failed".to_string(),
                details: Vec::new(),
            })
        }
    }
}

pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}

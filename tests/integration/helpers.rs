//! Shared test helpers.

use std::sync::Arc;

use actix_web::{App, dev::ServiceResponse, test, web};
use chrono::{DateTime, TimeZone, Utc};
use gpu_priority_lib::clock::ManualClock;
use gpu_priority_lib::config::{
    USER_EMAIL_HEADER, USER_PREFERRED_USERNAME_HEADER, USER_SUBJECT_HEADER,
};
use gpu_priority_lib::db::DbPool;
use gpu_priority_lib::models::{IdentityClaims, SubmitPriorityRequest, User};
use gpu_priority_lib::services::{PriorityService, StaticAdminDirectory};
use gpu_priority_lib::store::{MemoryStore, PriorityStore};
use uuid::Uuid;

/// Username every harness treats as administrator.
pub const ADMIN: &str = "admin";

/// Fixed start time for the manual clock.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 14, 30, 0).unwrap()
}

/// A user that only exists in memory.
pub fn user(username: &str) -> User {
    User {
        id: Uuid::new_v4(),
        oidc_sub: format!("sub-{}", username),
        username: username.to_string(),
        email: format!("{}@example.org", username),
        first_name: None,
        last_name: None,
        created_at: t0(),
        updated_at: t0(),
    }
}

pub fn claims(username: &str) -> IdentityClaims {
    IdentityClaims {
        sub: format!("sub-{}", username),
        email: format!("{}@example.org", username),
        preferred_username: Some(username.to_string()),
        given_name: None,
        family_name: None,
    }
}

/// A submission that passes every rule.
pub fn form(ticket: &str) -> SubmitPriorityRequest {
    SubmitPriorityRequest {
        bugzilla_ticket: ticket.to_string(),
        additional_usernames: "alice\nbob".to_string(),
        slurm_project: "vision-lab".to_string(),
        gpu_type: "h100".to_string(),
        gpu_count: 4,
        duration_days: 10,
        reason: "Conference deadline".to_string(),
    }
}

pub struct Harness {
    pub service: PriorityService,
    pub clock: Arc<ManualClock>,
}

/// Service over `store` with a manual clock at `t0()` and `ADMIN` as the only admin.
pub fn harness(store: Arc<dyn PriorityStore>) -> Harness {
    let clock = Arc::new(ManualClock::new(t0()));
    let service = PriorityService::new(
        store,
        clock.clone(),
        Arc::new(StaticAdminDirectory::new([ADMIN])),
    );
    Harness { service, clock }
}

pub fn memory_harness() -> Harness {
    harness(Arc::new(MemoryStore::new()))
}

/// Fresh migrated in-memory SQLite database.
///
/// One connection only: every connection to `sqlite::memory:` opens a separate database.
pub async fn sqlite_pool() -> DbPool {
    let pool = DbPool::connect("sqlite::memory:", 1, 5)
        .await
        .expect("Failed to open in-memory database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

/// Create a test app over `pool` and `service`.
pub async fn create_test_app(
    pool: &DbPool,
    service: &PriorityService,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .wrap(gpu_priority_lib::middleware::RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(service.clone()))
            .service(
                web::scope("/api/v1")
                    .configure(gpu_priority_lib::api::configure_health_routes)
                    .configure(gpu_priority_lib::api::configure_priority_routes)
                    .configure(gpu_priority_lib::api::configure_admin_routes),
            ),
    )
    .await
}

/// Attach the proxy identity headers for `username`.
pub fn as_user(req: test::TestRequest, username: &str) -> test::TestRequest {
    req.insert_header((USER_SUBJECT_HEADER, format!("sub-{}", username)))
        .insert_header((USER_PREFERRED_USERNAME_HEADER, username.to_string()))
        .insert_header((USER_EMAIL_HEADER, format!("{}@example.org", username)))
}

//! API endpoint modules.

pub mod admin;
pub mod health;
pub mod openapi;
pub mod priorities;

pub use admin::configure_routes as configure_admin_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use priorities::configure_routes as configure_priority_routes;

use actix_web::web;

use crate::error::AppError;

/// JSON bodies that fail to parse are reported in the standard error body.
pub(crate) fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(vec![format!("Malformed request body: {}", err)]).into()
    })
}

pub(crate) fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

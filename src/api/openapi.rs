//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GPU Priority Server",
        version = "0.1.0",
        description = "API for requesting temporary GPU scheduling priority and generating the SLURM commands that grant it"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Self-service endpoints
        api::priorities::me,
        api::priorities::submit_priority,
        api::priorities::list_priorities,
        api::priorities::get_priority,
        // Admin endpoints
        api::admin::list_all_priorities,
        api::admin::accept_priority,
        api::admin::refuse_priority,
        api::admin::reopen_priority,
        api::admin::add_message,
        api::admin::update_users,
        api::admin::get_commands,
        api::admin::delete_priority,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Users
            models::UserResponse,
            // Priorities
            models::GpuType,
            models::PriorityStatus,
            models::AdminMessage,
            models::SubmitPriorityRequest,
            models::AcceptPriorityRequest,
            models::StatusChangeRequest,
            models::AddMessageRequest,
            models::UpdateUsersRequest,
            models::ListPrioritiesQuery,
            models::PriorityResponse,
            models::PriorityListResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Identity forwarded by the authenticating proxy"),
        (name = "Priorities", description = "Submit and follow your own priority requests"),
        (name = "Admin", description = "Review, accept and refuse priority requests")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Document the forwarded identity header.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "forwarded_user",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(
                            crate::config::USER_SUBJECT_HEADER,
                        ),
                    ),
                ),
            );
        }
    }
}

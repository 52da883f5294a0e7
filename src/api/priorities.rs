//! Self-service endpoints: the caller's identity and their own priority requests.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::models::{
    ListPrioritiesQuery, PriorityListResponse, PriorityResponse, SubmitPriorityRequest,
    UserResponse,
};
use crate::services::PriorityService;

/// Current user and administrator status.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "No forwarded identity", body = crate::error::ErrorResponse),
    )
)]
pub async fn me(auth: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::new(auth.user, auth.is_admin))
}

/// Submit a priority request.
///
/// Every violated rule is reported in `details`.
#[utoipa::path(
    post,
    path = "/api/v1/priorities",
    tag = "Priorities",
    request_body = SubmitPriorityRequest,
    responses(
        (status = 201, description = "Request created as pending", body = PriorityResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "No forwarded identity", body = crate::error::ErrorResponse),
        (status = 409, description = "Ticket already has a request", body = crate::error::ErrorResponse),
    )
)]
pub async fn submit_priority(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    body: web::Json<SubmitPriorityRequest>,
) -> AppResult<HttpResponse> {
    let created = service.submit(&auth.user, &body).await?;
    Ok(HttpResponse::Created().json(PriorityResponse::from_request(&created, service.now())))
}

/// List the caller's requests, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/priorities",
    tag = "Priorities",
    params(
        ("include_archived" = Option<bool>, Query, description = "Include long-expired accepted requests")
    ),
    responses(
        (status = 200, description = "Caller's requests", body = PriorityListResponse),
        (status = 401, description = "No forwarded identity", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_priorities(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    query: web::Query<ListPrioritiesQuery>,
) -> AppResult<HttpResponse> {
    let include_archived = query.include_archived;
    let requests = service.list_own(&auth.user, include_archived).await?;
    Ok(HttpResponse::Ok().json(to_list_response(&service, &requests, include_archived)))
}

/// Get one request. Owners and administrators only.
#[utoipa::path(
    get,
    path = "/api/v1/priorities/{id}",
    tag = "Priorities",
    params(
        ("id" = Uuid, Path, description = "Priority request UUID")
    ),
    responses(
        (status = 200, description = "Priority request", body = PriorityResponse),
        (status = 403, description = "Owned by someone else", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_priority(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let request = service.get(&auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PriorityResponse::from_request(&request, service.now())))
}

pub(crate) fn to_list_response(
    service: &PriorityService,
    requests: &[crate::models::PriorityRequest],
    include_archived: bool,
) -> PriorityListResponse {
    let now = service.now();
    PriorityListResponse {
        priorities: requests
            .iter()
            .map(|r| PriorityResponse::from_request(r, now))
            .collect(),
        include_archived,
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(super::json_config())
        .app_data(super::query_config())
        .service(web::resource("/auth/me").route(web::get().to(me)))
        .service(
            web::resource("/priorities")
                .route(web::get().to(list_priorities))
                .route(web::post().to(submit_priority)),
        )
        .service(web::resource("/priorities/{id}").route(web::get().to(get_priority)));
}

//! Administrator endpoints for reviewing and transitioning priority requests.
//!
//! Every handler goes through `PriorityService`, which checks administrator capability
//! against the admin directory before touching the store.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::api::priorities::to_list_response;
use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::models::{
    AcceptPriorityRequest, AddMessageRequest, ListPrioritiesQuery, PriorityListResponse,
    PriorityResponse, StatusChangeRequest, UpdateUsersRequest,
};
use crate::services::PriorityService;

/// List every request, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/priorities",
    tag = "Admin",
    params(
        ("include_archived" = Option<bool>, Query, description = "Include long-expired accepted requests")
    ),
    responses(
        (status = 200, description = "All requests", body = PriorityListResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_all_priorities(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    query: web::Query<ListPrioritiesQuery>,
) -> AppResult<HttpResponse> {
    let include_archived = query.include_archived;
    let requests = service.list_all(&auth.user, include_archived).await?;
    Ok(HttpResponse::Ok().json(to_list_response(&service, &requests, include_archived)))
}

/// Accept a request and generate its SLURM commands.
#[utoipa::path(
    post,
    path = "/api/v1/admin/priorities/{id}/accept",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Priority request UUID")),
    request_body = AcceptPriorityRequest,
    responses(
        (status = 200, description = "Accepted", body = PriorityResponse),
        (status = 400, description = "Missing or invalid priority name", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Concurrent update", body = crate::error::ErrorResponse),
    )
)]
pub async fn accept_priority(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    path: web::Path<Uuid>,
    body: web::Json<AcceptPriorityRequest>,
) -> AppResult<HttpResponse> {
    let accepted = service
        .accept(
            &auth.user,
            path.into_inner(),
            &body.priority_name,
            body.message.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(PriorityResponse::from_request(&accepted, service.now())))
}

/// Refuse a request.
#[utoipa::path(
    post,
    path = "/api/v1/admin/priorities/{id}/refuse",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Priority request UUID")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Refused", body = PriorityResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn refuse_priority(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    path: web::Path<Uuid>,
    body: web::Json<StatusChangeRequest>,
) -> AppResult<HttpResponse> {
    let refused = service
        .refuse(&auth.user, path.into_inner(), body.message.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(PriorityResponse::from_request(&refused, service.now())))
}

/// Move a request back to pending.
#[utoipa::path(
    post,
    path = "/api/v1/admin/priorities/{id}/reopen",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Priority request UUID")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Pending again", body = PriorityResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn reopen_priority(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    path: web::Path<Uuid>,
    body: web::Json<StatusChangeRequest>,
) -> AppResult<HttpResponse> {
    let reopened = service
        .reopen(&auth.user, path.into_inner(), body.message.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(PriorityResponse::from_request(&reopened, service.now())))
}

/// Append a message to the request's log.
#[utoipa::path(
    post,
    path = "/api/v1/admin/priorities/{id}/messages",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Priority request UUID")),
    request_body = AddMessageRequest,
    responses(
        (status = 200, description = "Message appended", body = PriorityResponse),
        (status = 400, description = "Empty message", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn add_message(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    path: web::Path<Uuid>,
    body: web::Json<AddMessageRequest>,
) -> AppResult<HttpResponse> {
    let updated = service
        .append_message(&auth.user, path.into_inner(), &body.message)
        .await?;
    Ok(HttpResponse::Ok().json(PriorityResponse::from_request(&updated, service.now())))
}

/// Replace the additional usernames.
#[utoipa::path(
    put,
    path = "/api/v1/admin/priorities/{id}/users",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Priority request UUID")),
    request_body = UpdateUsersRequest,
    responses(
        (status = 200, description = "Users replaced", body = PriorityResponse),
        (status = 400, description = "Invalid usernames", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_users(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUsersRequest>,
) -> AppResult<HttpResponse> {
    let updated = service
        .update_additional_users(&auth.user, path.into_inner(), &body.additional_usernames)
        .await?;
    Ok(HttpResponse::Ok().json(PriorityResponse::from_request(&updated, service.now())))
}

/// Regenerate the SLURM commands of an accepted request as plain text.
#[utoipa::path(
    get,
    path = "/api/v1/admin/priorities/{id}/commands",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Priority request UUID")),
    responses(
        (status = 200, description = "Command script", body = String, content_type = "text/plain"),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found or not accepted", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_commands(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let commands = service
        .generate_commands(&auth.user, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(commands))
}

/// Delete a request and its messages.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/priorities/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Priority request UUID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_priority(
    auth: AuthenticatedUser,
    service: web::Data<PriorityService>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    service.delete(&auth.user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(super::json_config())
        .app_data(super::query_config())
        .service(web::resource("/admin/priorities").route(web::get().to(list_all_priorities)))
        .service(
            web::resource("/admin/priorities/{id}").route(web::delete().to(delete_priority)),
        )
        .service(
            web::resource("/admin/priorities/{id}/accept").route(web::post().to(accept_priority)),
        )
        .service(
            web::resource("/admin/priorities/{id}/refuse").route(web::post().to(refuse_priority)),
        )
        .service(
            web::resource("/admin/priorities/{id}/reopen").route(web::post().to(reopen_priority)),
        )
        .service(
            web::resource("/admin/priorities/{id}/messages").route(web::post().to(add_message)),
        )
        .service(web::resource("/admin/priorities/{id}/users").route(web::put().to(update_users)))
        .service(
            web::resource("/admin/priorities/{id}/commands").route(web::get().to(get_commands)),
        );
}

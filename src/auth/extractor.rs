//! Actix-web extractor for the proxy-authenticated user.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use super::identity_from_headers;
use crate::config::USER_SUBJECT_HEADER;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::User;
use crate::services::PriorityService;

/// The calling user, created or refreshed from the forwarded identity.
///
/// ```ignore
/// async fn handler(auth: AuthenticatedUser) -> impl Responder {
///     // auth.user is the stored user, auth.is_admin their capability
/// }
/// ```
pub struct AuthenticatedUser {
    pub user: User,
    pub is_admin: bool,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let service = req.app_data::<web::Data<PriorityService>>().cloned();
        let claims = identity_from_headers(req);

        Box::pin(async move {
            let (Some(pool), Some(service)) = (pool, service) else {
                return Err(AppError::Internal(
                    "Authentication state missing from app data".to_string(),
                ));
            };

            let claims = claims.ok_or_else(|| {
                AppError::Unauthorized(format!("Missing {} header", USER_SUBJECT_HEADER))
            })?;

            let user = pool.upsert_from_identity(&claims, service.now()).await?;
            let is_admin = service.is_admin(&user.username).await;

            Ok(AuthenticatedUser { user, is_admin })
        })
    }
}

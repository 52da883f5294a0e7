//! Authentication from identity headers set by the authenticating reverse proxy.
//!
//! The proxy terminates the login flow and forwards the identity on every request.
//! Requests that reach the server without a subject header are unauthenticated.

mod extractor;

use actix_web::HttpRequest;

use crate::config::{
    USER_EMAIL_HEADER, USER_FAMILY_NAME_HEADER, USER_GIVEN_NAME_HEADER,
    USER_PREFERRED_USERNAME_HEADER, USER_SUBJECT_HEADER,
};
use crate::models::IdentityClaims;

pub use extractor::AuthenticatedUser;

/// Trimmed, non-empty header value.
fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Read the forwarded identity. `None` when the subject header is absent.
pub fn identity_from_headers(req: &HttpRequest) -> Option<IdentityClaims> {
    Some(IdentityClaims {
        sub: header(req, USER_SUBJECT_HEADER)?,
        email: header(req, USER_EMAIL_HEADER).unwrap_or_default(),
        preferred_username: header(req, USER_PREFERRED_USERNAME_HEADER),
        given_name: header(req, USER_GIVEN_NAME_HEADER),
        family_name: header(req, USER_FAMILY_NAME_HEADER),
    })
}

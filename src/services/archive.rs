//! Which requests show up in default listings.

use chrono::{DateTime, Duration, Utc};

use crate::models::PriorityRequest;

/// Days after expiry before an accepted request drops out of default views.
pub const ARCHIVE_GRACE_DAYS: i64 = 7;

/// Accepted and expired for more than the grace period.
pub fn is_archived(request: &PriorityRequest, now: DateTime<Utc>) -> bool {
    request
        .valid_until()
        .is_some_and(|until| until + Duration::days(ARCHIVE_GRACE_DAYS) < now)
}

/// Drop archived requests unless asked for, newest first.
pub fn select(
    mut requests: Vec<PriorityRequest>,
    include_archived: bool,
    now: DateTime<Utc>,
) -> Vec<PriorityRequest> {
    if !include_archived {
        requests.retain(|r| !is_archived(r, now));
    }
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    requests
}

//! Request lifecycle transitions.
//!
//! Each transition consumes the current request and returns the next one, or an error
//! with nothing changed. Persisting the result is the caller's job.

use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};
use crate::models::{PriorityRequest, RequestState};
use crate::services::{slurm, validation};

pub const PRIORITY_NAME_REQUIRED: &str = "Priority name is required when accepting a priority";
pub const PRIORITY_NAME_INVALID: &str =
    "Invalid priority name. Use only letters, numbers, underscores, and hyphens";
pub const MESSAGE_REQUIRED: &str = "Message is required";
pub const ADDITIONAL_USERS_INVALID: &str = "Invalid additional usernames format";

fn non_empty(message: Option<&str>) -> Option<&str> {
    message.map(str::trim).filter(|m| !m.is_empty())
}

fn stamp(request: &mut PriorityRequest, actor: &str, now: DateTime<Utc>) {
    request.status_updated_at = Some(now);
    request.status_updated_by = Some(actor.to_string());
    request.updated_at = now;
}

/// Approve under `priority_name` and generate the scheduler commands.
///
/// Logs the supplied message, or an automatic confirmation when none is given.
pub fn accept(
    mut request: PriorityRequest,
    priority_name: &str,
    message: Option<&str>,
    actor: &str,
    now: DateTime<Utc>,
) -> AppResult<PriorityRequest> {
    let name = priority_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(vec![PRIORITY_NAME_REQUIRED.to_string()]));
    }
    if !validation::validate_priority_name(name) {
        return Err(AppError::Validation(vec![PRIORITY_NAME_INVALID.to_string()]));
    }

    stamp(&mut request, actor, now);
    let slurm_command =
        slurm::build_commands(&request, name).map_err(|e| AppError::Internal(e.to_string()))?;
    request.state = RequestState::Accepted {
        priority_name: name.to_string(),
        slurm_command,
    };

    match non_empty(message) {
        Some(text) => request.messages.append(now, actor, text),
        None => request.messages.append(
            now,
            actor,
            &format!("Priority accepted and configured with name '{}'", name),
        ),
    }

    Ok(request)
}

/// Decline; drops any priority name and commands.
pub fn refuse(
    mut request: PriorityRequest,
    message: Option<&str>,
    actor: &str,
    now: DateTime<Utc>,
) -> PriorityRequest {
    stamp(&mut request, actor, now);
    request.state = RequestState::Refused;
    if let Some(text) = non_empty(message) {
        request.messages.append(now, actor, text);
    }
    request
}

/// Put back to pending; drops any priority name and commands.
pub fn reopen(
    mut request: PriorityRequest,
    message: Option<&str>,
    actor: &str,
    now: DateTime<Utc>,
) -> PriorityRequest {
    stamp(&mut request, actor, now);
    request.state = RequestState::Pending;
    if let Some(text) = non_empty(message) {
        request.messages.append(now, actor, text);
    }
    request
}

/// Add a note without touching status or commands.
pub fn append_message(
    mut request: PriorityRequest,
    message: &str,
    actor: &str,
    now: DateTime<Utc>,
) -> AppResult<PriorityRequest> {
    let text = non_empty(Some(message))
        .ok_or_else(|| AppError::Validation(vec![MESSAGE_REQUIRED.to_string()]))?;
    request.messages.append(now, actor, text);
    request.updated_at = now;
    Ok(request)
}

/// Replace the additional usernames. An empty block clears them.
///
/// Accepted requests get their commands regenerated for the new user set.
pub fn update_additional_users(
    mut request: PriorityRequest,
    usernames: &str,
    now: DateTime<Utc>,
) -> AppResult<PriorityRequest> {
    let block = usernames.trim();
    if !block.is_empty() && !validation::validate_username_block(block) {
        return Err(AppError::Validation(vec![ADDITIONAL_USERS_INVALID.to_string()]));
    }

    request.additional_usernames = validation::parse_username_block(block);

    if let RequestState::Accepted { priority_name, .. } = &request.state {
        let priority_name = priority_name.clone();
        let slurm_command = slurm::build_commands(&request, &priority_name)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        request.state = RequestState::Accepted {
            priority_name,
            slurm_command,
        };
    }

    request.updated_at = now;
    Ok(request)
}

//! Syntactic validation for submissions and administrator input.
//!
//! The same rules apply at submission time and when an administrator edits a request.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{GpuType, SubmitPriorityRequest};

/// Longest accepted ticket number.
pub const MAX_TICKET_LEN: usize = 50;
/// Maximum number of usernames in one block.
pub const MAX_USERNAMES: usize = 10;
/// Inclusive bounds on a priority window.
pub const MIN_DURATION_DAYS: i64 = 1;
pub const MAX_DURATION_DAYS: i64 = 14;

const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 50;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9.\-]*$").expect("username pattern"));

static PRIORITY_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("priority name pattern"));

/// True iff `ticket` is 1 to 50 ASCII digits.
pub fn validate_ticket(ticket: &str) -> bool {
    !ticket.is_empty()
        && ticket.len() <= MAX_TICKET_LEN
        && ticket.bytes().all(|b| b.is_ascii_digit())
}

/// A single cluster username (also used for project/account names).
pub fn validate_username(name: &str) -> bool {
    (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name.len()) && USERNAME_PATTERN.is_match(name)
}

/// Split a newline-separated block into trimmed, non-empty entries.
pub fn parse_username_block(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A block of 1 to 10 valid usernames, one per line.
pub fn validate_username_block(block: &str) -> bool {
    let names = parse_username_block(block);
    !names.is_empty() && names.len() <= MAX_USERNAMES && names.iter().all(|n| validate_username(n))
}

/// QOS-safe token: letters, digits, `_` and `-`, 2 to 50 chars, no leading or trailing `-`.
pub fn validate_priority_name(name: &str) -> bool {
    let name = name.trim();
    (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name.len())
        && PRIORITY_NAME_PATTERN.is_match(name)
        && !name.starts_with('-')
        && !name.ends_with('-')
}

/// Submission fields after every rule has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub bugzilla_ticket: String,
    pub additional_usernames: Vec<String>,
    pub slurm_project: String,
    pub gpu_type: GpuType,
    pub gpu_count: i32,
    pub duration_days: i32,
    pub reason: String,
}

/// Check a submission, collecting every violated rule.
pub fn validate_submission(
    requester_username: &str,
    form: &SubmitPriorityRequest,
) -> Result<ValidatedSubmission, Vec<String>> {
    let mut errors = Vec::new();

    let ticket = form.bugzilla_ticket.trim();
    if !validate_ticket(ticket) {
        errors.push("Invalid Bugzilla ticket format".to_string());
    }

    let requester = requester_username.trim();
    if requester.is_empty() {
        errors.push("Username is required".to_string());
    } else if !validate_username(requester) {
        errors.push("Invalid requester username".to_string());
    }

    let additional = form.additional_usernames.trim();
    if !additional.is_empty() && !validate_username_block(additional) {
        errors.push("Invalid additional usernames format".to_string());
    }

    let project = form.slurm_project.trim();
    if !validate_username(project) {
        errors.push("Valid SLURM project is required".to_string());
    }

    let gpu_type = GpuType::parse(form.gpu_type.trim());
    if gpu_type.is_none() {
        errors.push("Valid GPU type is required".to_string());
    }

    let gpu_count = i32::try_from(form.gpu_count).ok().filter(|c| *c >= 1);
    if gpu_count.is_none() {
        errors.push("GPU count must be at least 1".to_string());
    }

    let duration_days = (MIN_DURATION_DAYS..=MAX_DURATION_DAYS)
        .contains(&form.duration_days)
        .then_some(form.duration_days as i32);
    if duration_days.is_none() {
        errors.push("Duration must be between 1 and 14 days (maximum 2 weeks)".to_string());
    }

    let reason = form.reason.trim();
    if reason.is_empty() {
        errors.push("Reason is required".to_string());
    }

    match (gpu_type, gpu_count, duration_days) {
        (Some(gpu_type), Some(gpu_count), Some(duration_days)) if errors.is_empty() => {
            Ok(ValidatedSubmission {
                bugzilla_ticket: ticket.to_string(),
                additional_usernames: parse_username_block(additional),
                slurm_project: project.to_string(),
                gpu_type,
                gpu_count,
                duration_days,
                reason: reason.to_string(),
            })
        }
        _ => Err(errors),
    }
}

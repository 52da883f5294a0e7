//! Priority request domain models and DTOs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::archive;

/// GPU model a priority can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GpuType {
    Rtx3090,
    V100,
    H100,
}

impl GpuType {
    pub const ALL: [GpuType; 3] = [GpuType::Rtx3090, GpuType::V100, GpuType::H100];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rtx3090 => "rtx3090",
            Self::V100 => "v100",
            Self::H100 => "h100",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rtx3090" => Some(Self::Rtx3090),
            "v100" => Some(Self::V100),
            "h100" => Some(Self::H100),
            _ => None,
        }
    }
}

impl std::fmt::Display for GpuType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request status as stored and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriorityStatus {
    /// Submitted, waiting for an administrator.
    Pending,
    /// Approved; scheduler commands exist.
    Accepted,
    /// Declined.
    Refused,
}

impl PriorityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Refused => "refused",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "refused" => Some(Self::Refused),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriorityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state. The priority name and generated commands only exist while accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Accepted {
        priority_name: String,
        slurm_command: String,
    },
    Refused,
}

impl RequestState {
    pub fn status(&self) -> PriorityStatus {
        match self {
            Self::Pending => PriorityStatus::Pending,
            Self::Accepted { .. } => PriorityStatus::Accepted,
            Self::Refused => PriorityStatus::Refused,
        }
    }
}

/// One administrator note on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdminMessage {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub text: String,
}

impl AdminMessage {
    /// `[YYYY-MM-DD HH:MM UTC] actor: text`
    pub fn render(&self) -> String {
        format!(
            "[{} UTC] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.actor,
            self.text
        )
    }
}

/// Append-only log of administrator messages.
///
/// Entries can be added but never edited or removed once present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    entries: Vec<AdminMessage>,
}

impl MessageLog {
    /// Rebuild a log from persisted entries (oldest first).
    pub fn from_entries(entries: Vec<AdminMessage>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, timestamp: DateTime<Utc>, actor: &str, text: &str) {
        self.entries.push(AdminMessage {
            timestamp,
            actor: actor.to_string(),
            text: text.to_string(),
        });
    }

    pub fn entries(&self) -> &[AdminMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display text: rendered entries separated by blank lines.
    pub fn render(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        Some(
            self.entries
                .iter()
                .map(AdminMessage::render)
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    }
}

/// A request for temporary elevated scheduling priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityRequest {
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Username of the owning user (primary account for QOS assignment).
    pub requester_username: String,
    /// Bugzilla ticket number; unique across all requests.
    pub bugzilla_ticket: String,
    pub additional_usernames: Vec<String>,
    /// Cluster account the QOS is assigned under.
    pub slurm_project: String,
    pub gpu_type: GpuType,
    pub gpu_count: i32,
    pub duration_days: i32,
    pub reason: String,
    pub state: RequestState,
    pub messages: MessageLog,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub status_updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped by the store on every update.
    pub version: i64,
}

impl PriorityRequest {
    pub fn status(&self) -> PriorityStatus {
        self.state.status()
    }

    pub fn priority_name(&self) -> Option<&str> {
        match &self.state {
            RequestState::Accepted { priority_name, .. } => Some(priority_name),
            _ => None,
        }
    }

    pub fn slurm_command(&self) -> Option<&str> {
        match &self.state {
            RequestState::Accepted { slurm_command, .. } => Some(slurm_command),
            _ => None,
        }
    }

    /// Primary requester followed by additional usernames, in order, duplicates kept.
    pub fn all_usernames(&self) -> Vec<&str> {
        std::iter::once(self.requester_username.as_str())
            .chain(self.additional_usernames.iter().map(String::as_str))
            .collect()
    }

    /// End of the priority window, for accepted requests.
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        match (&self.state, self.status_updated_at) {
            (RequestState::Accepted { .. }, Some(at)) => {
                Some(at + Duration::days(i64::from(self.duration_days)))
            }
            _ => None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until().is_some_and(|until| now > until)
    }
}

/// Fields of a freshly validated submission, ready to persist.
#[derive(Debug, Clone)]
pub struct NewPriorityRequest {
    pub user_id: Uuid,
    pub requester_username: String,
    pub bugzilla_ticket: String,
    pub additional_usernames: Vec<String>,
    pub slurm_project: String,
    pub gpu_type: GpuType,
    pub gpu_count: i32,
    pub duration_days: i32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Request / response DTOs
// ============================================================================

/// Submission form. Missing fields default to empty so every problem is reported at once.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SubmitPriorityRequest {
    /// Bugzilla ticket number (digits only).
    #[serde(default)]
    pub bugzilla_ticket: String,
    /// Extra cluster usernames, one per line.
    #[serde(default)]
    pub additional_usernames: String,
    /// Cluster account / project.
    #[serde(default)]
    pub slurm_project: String,
    /// One of rtx3090, v100, h100.
    #[serde(default)]
    pub gpu_type: String,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub gpu_count: i64,
    /// 1 to 14 days.
    #[serde(default, deserialize_with = "lenient_integer")]
    pub duration_days: i64,
    #[serde(default)]
    pub reason: String,
}

/// Accepts a JSON integer or a numeric string. Anything else reads as 0 so the
/// range check reports it together with the other violations.
fn lenient_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Body for accepting a request.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AcceptPriorityRequest {
    #[serde(default)]
    pub priority_name: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body for refusing or reopening a request.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StatusChangeRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body for appending an administrator message.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddMessageRequest {
    pub message: String,
}

/// Body for replacing the additional usernames.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUsersRequest {
    /// Newline-separated usernames; empty clears the list.
    #[serde(default)]
    pub additional_usernames: String,
}

/// Query parameters for listings.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListPrioritiesQuery {
    /// Include accepted requests that expired more than a week ago.
    #[serde(default)]
    pub include_archived: bool,
}

/// Priority request as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriorityResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requester_username: String,
    pub bugzilla_ticket: String,
    pub additional_usernames: Vec<String>,
    pub slurm_project: String,
    pub gpu_type: GpuType,
    pub gpu_count: i32,
    pub duration_days: i32,
    pub reason: String,
    pub status: PriorityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slurm_command: Option<String>,
    pub admin_messages: Vec<AdminMessage>,
    /// Rendered message log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub is_expired: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PriorityResponse {
    /// Build the response, evaluating time-dependent flags at `now`.
    pub fn from_request(request: &PriorityRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            requester_username: request.requester_username.clone(),
            bugzilla_ticket: request.bugzilla_ticket.clone(),
            additional_usernames: request.additional_usernames.clone(),
            slurm_project: request.slurm_project.clone(),
            gpu_type: request.gpu_type,
            gpu_count: request.gpu_count,
            duration_days: request.duration_days,
            reason: request.reason.clone(),
            status: request.status(),
            priority_name: request.priority_name().map(str::to_string),
            slurm_command: request.slurm_command().map(str::to_string),
            admin_messages: request.messages.entries().to_vec(),
            admin_message: request.messages.render(),
            status_updated_at: request.status_updated_at,
            status_updated_by: request.status_updated_by.clone(),
            valid_until: request.valid_until(),
            is_expired: request.is_expired(now),
            is_archived: archive::is_archived(request, now),
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

/// Listing response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriorityListResponse {
    pub priorities: Vec<PriorityResponse>,
    pub include_archived: bool,
}

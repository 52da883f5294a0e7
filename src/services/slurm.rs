//! SLURM command generation for accepted priority requests.
//!
//! Output is plain text meant to be pasted into a shell on the cluster head node by an
//! administrator. Nothing here talks to the scheduler.

use chrono::{DateTime, Duration, Utc};

use crate::models::PriorityRequest;

/// Scheduling weight given to every priority QOS.
pub const QOS_PRIORITY_WEIGHT: u32 = 1000;

/// Reasons the generator cannot produce output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("priority name is missing")]
    MissingPriorityName,
    #[error("status transition time is missing")]
    MissingTransitionTime,
}

/// `prio-<name>-<days>d`
pub fn qos_name(priority_name: &str, duration_days: i32) -> String {
    format!("prio-{}-{}d", priority_name, duration_days)
}

/// Instant at which the QOS should be removed.
pub fn cleanup_at(accepted_at: DateTime<Utc>, duration_days: i32) -> DateTime<Utc> {
    accepted_at + Duration::days(i64::from(duration_days))
}

/// Render the full command script for `request` under `priority_name`.
///
/// The output depends only on the request fields, the name and the transition time,
/// so regenerating an unchanged request yields identical text.
pub fn build_commands(
    request: &PriorityRequest,
    priority_name: &str,
) -> Result<String, CommandError> {
    if priority_name.trim().is_empty() {
        return Err(CommandError::MissingPriorityName);
    }
    let accepted_at = request
        .status_updated_at
        .ok_or(CommandError::MissingTransitionTime)?;

    let qos = qos_name(priority_name, request.duration_days);
    let users = request.all_usernames();

    let mut lines = vec![
        format!(
            "# GPU Priority Commands for Ticket: {}",
            request.bugzilla_ticket
        ),
        format!("# Generated on: {}", accepted_at.format("%Y-%m-%d %H:%M:%S")),
        format!("# Base Priority Name: {}", priority_name),
        format!("# QOS Name: {}", qos),
        format!("# Users: {}", users.join(", ")),
        String::new(),
        "# Create QOS with resource limits".to_string(),
        format!(
            "sacctmgr add qos {} GrpTRES=gres/gpu:{}={} MaxWall={}-0 Priority={}",
            qos, request.gpu_type, request.gpu_count, request.duration_days, QOS_PRIORITY_WEIGHT
        ),
        String::new(),
        "# Assign QOS to users".to_string(),
    ];

    for user in &users {
        lines.push(format!(
            "sacctmgr modify user {} set qos+={} where account={}",
            user, qos, request.slurm_project
        ));
    }

    lines.push(String::new());
    lines.push("# Schedule QOS cleanup".to_string());
    lines.push(format!(
        "echo 'sacctmgr -i delete qos {}' | at -t {}",
        qos,
        cleanup_at(accepted_at, request.duration_days).format("%Y%m%d%H%M")
    ));

    lines.push(String::new());
    lines.push("# Verification commands".to_string());
    lines.push(format!("sacctmgr show qos {}", qos));
    lines.push(format!("squeue -u {}", users.join(",")));

    Ok(lines.join("\n"))
}

/// Regenerate the commands of an accepted request. `None` for any other state.
pub fn generate_commands(request: &PriorityRequest) -> Option<String> {
    let name = request.priority_name()?;
    match build_commands(request, name) {
        Ok(commands) => Some(commands),
        Err(e) => {
            tracing::warn!(priority_id = %request.id, "Cannot generate SLURM commands: {}", e);
            None
        }
    }
}

//! Priority request operations over an injected store, clock and admin directory.
//!
//! Every administrator action loads the request, applies a pure lifecycle transition and
//! writes it back under the store's version check. Lost races are retried a bounded
//! number of times before the conflict is surfaced.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::models::{NewPriorityRequest, PriorityRequest, SubmitPriorityRequest, User};
use crate::services::admin_directory::AdminDirectory;
use crate::services::{archive, lifecycle, slurm, validation};
use crate::store::PriorityStore;

/// Attempts per administrator action before a version conflict is returned.
pub const MAX_TRANSITION_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct PriorityService {
    store: Arc<dyn PriorityStore>,
    clock: Arc<dyn Clock>,
    admins: Arc<dyn AdminDirectory>,
}

impl PriorityService {
    pub fn new(
        store: Arc<dyn PriorityStore>,
        clock: Arc<dyn Clock>,
        admins: Arc<dyn AdminDirectory>,
    ) -> Self {
        Self {
            store,
            clock,
            admins,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn is_admin(&self, username: &str) -> bool {
        self.admins.is_admin(username).await
    }

    async fn require_admin(&self, actor: &User) -> AppResult<()> {
        if self.is_admin(&actor.username).await {
            Ok(())
        } else {
            warn!(actor = %actor.username, "Administrator action refused");
            Err(AppError::Forbidden(
                "Administrator privileges required".to_string(),
            ))
        }
    }

    async fn load(&self, id: Uuid) -> AppResult<PriorityRequest> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Priority {}", id)))
    }

    /// Create a pending request owned by `requester`.
    pub async fn submit(
        &self,
        requester: &User,
        form: &SubmitPriorityRequest,
    ) -> AppResult<PriorityRequest> {
        let valid =
            validation::validate_submission(&requester.username, form).map_err(AppError::Validation)?;

        let created = self
            .store
            .insert(NewPriorityRequest {
                user_id: requester.id,
                requester_username: requester.username.clone(),
                bugzilla_ticket: valid.bugzilla_ticket,
                additional_usernames: valid.additional_usernames,
                slurm_project: valid.slurm_project,
                gpu_type: valid.gpu_type,
                gpu_count: valid.gpu_count,
                duration_days: valid.duration_days,
                reason: valid.reason,
                created_at: self.clock.now(),
            })
            .await?;

        info!(
            priority_id = %created.id,
            ticket = %created.bugzilla_ticket,
            requester = %requester.username,
            "Priority request submitted"
        );
        Ok(created)
    }

    /// Run an administrator transition with conflict retries.
    async fn transition<F>(
        &self,
        actor: &User,
        id: Uuid,
        action: &'static str,
        apply: F,
    ) -> AppResult<PriorityRequest>
    where
        F: Fn(PriorityRequest, DateTime<Utc>) -> AppResult<PriorityRequest> + Send + Sync,
    {
        self.require_admin(actor).await?;

        let mut attempt = 1;
        loop {
            let current = self.load(id).await?;
            let next = apply(current, self.clock.now())?;

            match self.store.update(&next).await {
                Ok(saved) => {
                    info!(
                        priority_id = %id,
                        actor = %actor.username,
                        status = %saved.status(),
                        "Priority {}",
                        action
                    );
                    return Ok(saved);
                }
                Err(e) if e.is_retryable() && attempt < MAX_TRANSITION_ATTEMPTS => {
                    warn!(priority_id = %id, attempt, "Retrying {}: {}", action, e);
                    attempt += 1;
                }
                Err(e) => {
                    error!(priority_id = %id, actor = %actor.username, "Failed to {}: {}", action, e);
                    return Err(e);
                }
            }
        }
    }

    pub async fn accept(
        &self,
        actor: &User,
        id: Uuid,
        priority_name: &str,
        message: Option<&str>,
    ) -> AppResult<PriorityRequest> {
        self.transition(actor, id, "accepted", |request, now| {
            lifecycle::accept(request, priority_name, message, &actor.username, now)
        })
        .await
    }

    pub async fn refuse(
        &self,
        actor: &User,
        id: Uuid,
        message: Option<&str>,
    ) -> AppResult<PriorityRequest> {
        self.transition(actor, id, "refused", |request, now| {
            Ok(lifecycle::refuse(request, message, &actor.username, now))
        })
        .await
    }

    pub async fn reopen(
        &self,
        actor: &User,
        id: Uuid,
        message: Option<&str>,
    ) -> AppResult<PriorityRequest> {
        self.transition(actor, id, "reopened", |request, now| {
            Ok(lifecycle::reopen(request, message, &actor.username, now))
        })
        .await
    }

    pub async fn append_message(
        &self,
        actor: &User,
        id: Uuid,
        message: &str,
    ) -> AppResult<PriorityRequest> {
        self.transition(actor, id, "message appended", |request, now| {
            lifecycle::append_message(request, message, &actor.username, now)
        })
        .await
    }

    pub async fn update_additional_users(
        &self,
        actor: &User,
        id: Uuid,
        usernames: &str,
    ) -> AppResult<PriorityRequest> {
        self.transition(actor, id, "users updated", |request, now| {
            lifecycle::update_additional_users(request, usernames, now)
        })
        .await
    }

    /// Hard delete, messages included.
    pub async fn delete(&self, actor: &User, id: Uuid) -> AppResult<()> {
        self.require_admin(actor).await?;
        if !self.store.delete(id).await? {
            return Err(AppError::NotFound(format!("Priority {}", id)));
        }
        info!(priority_id = %id, actor = %actor.username, "Priority deleted");
        Ok(())
    }

    /// A single request, readable by its owner or an administrator.
    pub async fn get(&self, viewer: &User, id: Uuid) -> AppResult<PriorityRequest> {
        let request = self.load(id).await?;
        if request.user_id != viewer.id && !self.is_admin(&viewer.username).await {
            return Err(AppError::Forbidden(
                "Priority belongs to another user".to_string(),
            ));
        }
        Ok(request)
    }

    /// Requests of one owner (or everyone), archived ones only when asked, newest first.
    pub async fn list(
        &self,
        owner: Option<Uuid>,
        include_archived: bool,
    ) -> AppResult<Vec<PriorityRequest>> {
        let requests = self.store.list(owner).await?;
        Ok(archive::select(requests, include_archived, self.clock.now()))
    }

    pub async fn list_own(
        &self,
        user: &User,
        include_archived: bool,
    ) -> AppResult<Vec<PriorityRequest>> {
        self.list(Some(user.id), include_archived).await
    }

    pub async fn list_all(
        &self,
        actor: &User,
        include_archived: bool,
    ) -> AppResult<Vec<PriorityRequest>> {
        self.require_admin(actor).await?;
        self.list(None, include_archived).await
    }

    /// Regenerated command text of an accepted request.
    pub async fn generate_commands(&self, actor: &User, id: Uuid) -> AppResult<String> {
        self.require_admin(actor).await?;
        let request = self.load(id).await?;
        slurm::generate_commands(&request).ok_or_else(|| {
            AppError::NotFound(format!("SLURM commands for priority {}", id))
        })
    }
}

//! Process-local store with the same uniqueness and versioning rules as the database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::PriorityStore;
use crate::error::{AppError, AppResult};
use crate::models::{MessageLog, NewPriorityRequest, PriorityRequest, RequestState};

#[derive(Debug, Default)]
pub struct MemoryStore {
    requests: Mutex<HashMap<Uuid, PriorityRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, HashMap<Uuid, PriorityRequest>>> {
        self.requests
            .lock()
            .map_err(|_| AppError::Database("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl PriorityStore for MemoryStore {
    async fn insert(&self, new: NewPriorityRequest) -> AppResult<PriorityRequest> {
        let mut requests = self.lock()?;

        if requests
            .values()
            .any(|r| r.bugzilla_ticket == new.bugzilla_ticket)
        {
            return Err(AppError::DuplicateTicket(new.bugzilla_ticket));
        }

        let request = PriorityRequest {
            id: Uuid::now_v7(),
            user_id: new.user_id,
            requester_username: new.requester_username,
            bugzilla_ticket: new.bugzilla_ticket,
            additional_usernames: new.additional_usernames,
            slurm_project: new.slurm_project,
            gpu_type: new.gpu_type,
            gpu_count: new.gpu_count,
            duration_days: new.duration_days,
            reason: new.reason,
            state: RequestState::Pending,
            messages: MessageLog::default(),
            status_updated_at: None,
            status_updated_by: None,
            created_at: new.created_at,
            updated_at: new.created_at,
            version: 0,
        };
        requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<PriorityRequest>> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn update(&self, request: &PriorityRequest) -> AppResult<PriorityRequest> {
        let mut requests = self.lock()?;

        let stored = requests
            .get_mut(&request.id)
            .ok_or_else(|| AppError::NotFound(format!("Priority {}", request.id)))?;

        if stored.version != request.version {
            return Err(AppError::TransitionConflict(format!(
                "priority {} is at version {}, transition was computed from {}",
                request.id, stored.version, request.version
            )));
        }

        let existing = stored.messages.entries();
        if !request.messages.entries().starts_with(existing) {
            return Err(AppError::Internal(format!(
                "priority {} update would rewrite logged messages",
                request.id
            )));
        }

        let mut updated = request.clone();
        updated.version = stored.version + 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.lock()?.remove(&id).is_some())
    }

    async fn list(&self, owner: Option<Uuid>) -> AppResult<Vec<PriorityRequest>> {
        Ok(self
            .lock()?
            .values()
            .filter(|r| owner.is_none_or(|o| r.user_id == o))
            .cloned()
            .collect())
    }
}

//! Persistence contract for priority requests.
//!
//! Implemented by [`crate::db::DbPool`] (SeaORM) and by [`MemoryStore`].

mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewPriorityRequest, PriorityRequest};

pub use memory::MemoryStore;

/// Storage of priority requests.
///
/// Implementations must make every call atomic: a failed call leaves stored state
/// untouched.
#[async_trait]
pub trait PriorityStore: Send + Sync {
    /// Persist a new pending request.
    ///
    /// Fails with `DuplicateTicket` when the ticket is already taken.
    async fn insert(&self, new: NewPriorityRequest) -> AppResult<PriorityRequest>;

    async fn find(&self, id: Uuid) -> AppResult<Option<PriorityRequest>>;

    /// Write back a transitioned request.
    ///
    /// Applies only if the stored version still equals `request.version`, then bumps it.
    /// Messages beyond those already stored are appended. Fails with `NotFound` when the
    /// row is gone and `TransitionConflict` when someone else wrote first.
    async fn update(&self, request: &PriorityRequest) -> AppResult<PriorityRequest>;

    /// Remove a request and its messages. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// All requests, optionally restricted to one owner. Order is unspecified.
    async fn list(&self, owner: Option<Uuid>) -> AppResult<Vec<PriorityRequest>>;
}

//! SeaORM store and user/admin persistence over in-memory SQLite.

use std::sync::Arc;

use chrono::Duration;
use gpu_priority_lib::db::DbPool;
use gpu_priority_lib::error::AppError;
use gpu_priority_lib::models::{GpuType, NewPriorityRequest, PriorityStatus, User};
use gpu_priority_lib::services::{AdminDirectory, DbAdminDirectory};
use gpu_priority_lib::store::PriorityStore;
use uuid::Uuid;

use super::helpers::*;

fn new_request(owner: &User, ticket: &str) -> NewPriorityRequest {
    NewPriorityRequest {
        user_id: owner.id,
        requester_username: owner.username.clone(),
        bugzilla_ticket: ticket.to_string(),
        additional_usernames: vec!["alice".to_string()],
        slurm_project: "vision-lab".to_string(),
        gpu_type: GpuType::V100,
        gpu_count: 2,
        duration_days: 5,
        reason: "Ablation study".to_string(),
        created_at: t0(),
    }
}

async fn db_harness() -> (DbPool, Harness) {
    let pool = sqlite_pool().await;
    let h = harness(Arc::new(pool.clone()));
    (pool, h)
}

#[tokio::test]
async fn test_insert_and_find_round_trip() {
    let pool = sqlite_pool().await;
    let jdoe = pool.upsert_from_identity(&claims("jdoe"), t0()).await.unwrap();

    let created = pool.insert(new_request(&jdoe, "777")).await.unwrap();
    assert_eq!(created.version, 0);
    assert_eq!(created.status(), PriorityStatus::Pending);

    let found = pool.find(created.id).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert!(pool.find(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_ticket_is_rejected() {
    let pool = sqlite_pool().await;
    let jdoe = pool.upsert_from_identity(&claims("jdoe"), t0()).await.unwrap();
    let other = pool.upsert_from_identity(&claims("other"), t0()).await.unwrap();

    pool.insert(new_request(&jdoe, "777")).await.unwrap();
    assert!(matches!(
        pool.insert(new_request(&other, "777")).await,
        Err(AppError::DuplicateTicket(t)) if t == "777"
    ));
    assert_eq!(pool.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_submits_for_same_ticket() {
    let (pool, h) = db_harness().await;
    let a = pool.upsert_from_identity(&claims("alice"), t0()).await.unwrap();
    let b = pool.upsert_from_identity(&claims("bob"), t0()).await.unwrap();

    let (form_a, form_b) = (form("12345"), form("12345"));
    let (first, second) = tokio::join!(
        h.service.submit(&a, &form_a),
        h.service.submit(&b, &form_b)
    );

    assert_eq!([&first, &second].iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        [first, second]
            .iter()
            .any(|r| matches!(r, Err(AppError::DuplicateTicket(_))))
    );
}

#[tokio::test]
async fn test_pending_migrations_tracks_schema() {
    let pool = DbPool::connect("sqlite::memory:", 1, 5).await.unwrap();
    assert_eq!(pool.pending_migrations().await.unwrap(), 4);

    pool.run_migrations().await.unwrap();
    assert_eq!(pool.pending_migrations().await.unwrap(), 0);
}

#[tokio::test]
async fn test_stale_update_conflicts() {
    let pool = sqlite_pool().await;
    let jdoe = pool.upsert_from_identity(&claims("jdoe"), t0()).await.unwrap();
    let created = pool.insert(new_request(&jdoe, "777")).await.unwrap();

    let mut first = created.clone();
    first.messages.append(t0(), ADMIN, "first writer");
    let saved = pool.update(&first).await.unwrap();
    assert_eq!(saved.version, 1);

    let mut second = created.clone();
    second.messages.append(t0(), ADMIN, "second writer");
    assert!(matches!(
        pool.update(&second).await,
        Err(AppError::TransitionConflict(_))
    ));

    let stored = pool.find(created.id).await.unwrap().unwrap();
    assert_eq!(stored.messages.len(), 1);
    assert_eq!(stored.messages.entries()[0].text, "first writer");

    let mut gone = created.clone();
    gone.id = Uuid::new_v4();
    assert!(matches!(pool.update(&gone).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_lifecycle_persists_state_and_messages() {
    let (pool, h) = db_harness().await;
    let admin = pool.upsert_from_identity(&claims(ADMIN), t0()).await.unwrap();
    let jdoe = pool.upsert_from_identity(&claims("jdoe"), t0()).await.unwrap();

    let created = h.service.submit(&jdoe, &form("12345")).await.unwrap();
    h.clock.advance(Duration::hours(1));
    let accepted = h
        .service
        .accept(&admin, created.id, "teamA-burst", None)
        .await
        .unwrap();
    h.service
        .append_message(&admin, created.id, "Remember to checkpoint")
        .await
        .unwrap();

    let stored = pool.find(created.id).await.unwrap().unwrap();
    assert_eq!(stored.priority_name(), Some("teamA-burst"));
    assert_eq!(stored.slurm_command(), accepted.slurm_command());
    assert_eq!(stored.version, 2);

    let texts: Vec<_> = stored.messages.entries().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Priority accepted and configured with name 'teamA-burst'",
            "Remember to checkpoint"
        ]
    );

    let regenerated = h.service.generate_commands(&admin, created.id).await.unwrap();
    assert_eq!(Some(regenerated.as_str()), accepted.slurm_command());

    let refused = h.service.refuse(&admin, created.id, None).await.unwrap();
    let stored = pool.find(created.id).await.unwrap().unwrap();
    assert_eq!(stored, refused);
    assert_eq!(stored.priority_name(), None);
    assert_eq!(stored.slurm_command(), None);
}

#[tokio::test]
async fn test_delete_removes_messages() {
    let (pool, h) = db_harness().await;
    let admin = pool.upsert_from_identity(&claims(ADMIN), t0()).await.unwrap();
    let jdoe = pool.upsert_from_identity(&claims("jdoe"), t0()).await.unwrap();

    let created = h.service.submit(&jdoe, &form("12345")).await.unwrap();
    h.service.append_message(&admin, created.id, "note").await.unwrap();

    assert!(pool.delete(created.id).await.unwrap());
    assert!(!pool.delete(created.id).await.unwrap());
    assert!(pool.find(created.id).await.unwrap().is_none());

    // Ticket is free again
    h.service.submit(&jdoe, &form("12345")).await.unwrap();
}

#[tokio::test]
async fn test_list_filters_by_owner() {
    let pool = sqlite_pool().await;
    let jdoe = pool.upsert_from_identity(&claims("jdoe"), t0()).await.unwrap();
    let other = pool.upsert_from_identity(&claims("other"), t0()).await.unwrap();

    pool.insert(new_request(&jdoe, "1")).await.unwrap();
    pool.insert(new_request(&other, "2")).await.unwrap();
    pool.insert(new_request(&jdoe, "3")).await.unwrap();

    assert_eq!(pool.list(Some(jdoe.id)).await.unwrap().len(), 2);
    assert_eq!(pool.list(Some(other.id)).await.unwrap().len(), 1);
    assert_eq!(pool.list(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_upsert_keeps_username_and_refreshes_profile() {
    let pool = sqlite_pool().await;

    let first = pool.upsert_from_identity(&claims("jdoe"), t0()).await.unwrap();

    let mut changed = claims("renamed");
    changed.sub = first.oidc_sub.clone();
    changed.email = "john@example.org".to_string();
    changed.given_name = Some("John".to_string());

    let later = t0() + Duration::hours(3);
    let second = pool.upsert_from_identity(&changed, later).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(first.created_at, t0());
    assert_eq!(first.updated_at, t0());
    assert_eq!(second.created_at, t0());
    assert_eq!(second.updated_at, later);
    assert_eq!(second.username, "jdoe");
    assert_eq!(second.email, "john@example.org");
    assert_eq!(second.first_name.as_deref(), Some("John"));
    assert_eq!(pool.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_upsert_derives_username_from_email() {
    let pool = sqlite_pool().await;
    let mut anonymous = claims("ignored");
    anonymous.preferred_username = None;
    anonymous.email = "jane.roe@example.org".to_string();

    let created = pool.upsert_from_identity(&anonymous, t0()).await.unwrap();
    assert_eq!(created.username, "jane.roe");
}

#[tokio::test]
async fn test_delete_user_cascades_to_requests() {
    let (pool, h) = db_harness().await;
    let admin = pool.upsert_from_identity(&claims(ADMIN), t0()).await.unwrap();
    let jdoe = pool.upsert_from_identity(&claims("jdoe"), t0()).await.unwrap();

    let created = h.service.submit(&jdoe, &form("12345")).await.unwrap();
    h.service.append_message(&admin, created.id, "note").await.unwrap();

    assert!(pool.delete_user(jdoe.id).await.unwrap());
    assert!(pool.find_user_by_id(jdoe.id).await.unwrap().is_none());
    assert!(pool.find(created.id).await.unwrap().is_none());
    assert!(!pool.delete_user(jdoe.id).await.unwrap());
}

#[tokio::test]
async fn test_admin_membership() {
    let pool = sqlite_pool().await;

    pool.add_admin("root", "root@example.org").await.unwrap();
    assert!(matches!(
        pool.add_admin("root", "other@example.org").await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(pool.admin_exists("root").await.unwrap());
    assert_eq!(pool.list_admins().await.unwrap().len(), 1);

    let directory = DbAdminDirectory::new(pool.clone(), vec!["bootstrap".to_string()]);
    assert!(directory.is_admin("root").await);
    assert!(directory.is_admin("bootstrap").await);
    assert!(!directory.is_admin("jdoe").await);

    assert!(pool.remove_admin("root").await.unwrap());
    assert!(!pool.remove_admin("root").await.unwrap());
    assert!(!directory.is_admin("root").await);
}

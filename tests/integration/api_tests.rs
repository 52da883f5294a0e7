//! HTTP API tests over in-memory SQLite.

use std::sync::Arc;

use actix_web::test;
use chrono::Duration;
use gpu_priority_lib::db::DbPool;
use serde_json::{Value, json};

use super::helpers::*;

async fn setup() -> (DbPool, Harness) {
    let pool = sqlite_pool().await;
    let h = harness(Arc::new(pool.clone()));
    (pool, h)
}

fn submission(ticket: &str) -> Value {
    json!({
        "bugzilla_ticket": ticket,
        "additional_usernames": "alice\nbob",
        "slurm_project": "vision-lab",
        "gpu_type": "h100",
        "gpu_count": 4,
        "duration_days": 10,
        "reason": "Conference deadline"
    })
}

#[actix_rt::test]
async fn test_health_needs_no_identity() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["service"], "gpu-priority-server");
    assert_eq!(body["now"], t0().to_rfc3339());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/ready").to_request()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pending_migrations"], 0);
}

#[actix_rt::test]
async fn test_missing_identity_is_unauthorized() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let req = test::TestRequest::get().uri("/api/v1/priorities").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_me_reports_admin_status() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let req = as_user(test::TestRequest::get().uri("/api/v1/auth/me"), ADMIN).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], ADMIN);
    assert_eq!(body["is_admin"], true);

    let req = as_user(test::TestRequest::get().uri("/api/v1/auth/me"), "jdoe").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "jdoe");
    assert_eq!(body["is_admin"], false);
}

#[actix_rt::test]
async fn test_submit_validation_and_duplicates() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .set_json(json!({ "bugzilla_ticket": "abc", "gpu_count": 0, "duration_days": 30 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_FAILED");
    let details: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_str().unwrap())
        .collect();
    assert_eq!(
        details,
        vec![
            "Invalid Bugzilla ticket format",
            "Valid SLURM project is required",
            "Valid GPU type is required",
            "GPU count must be at least 1",
            "Duration must be between 1 and 14 days (maximum 2 weeks)",
            "Reason is required",
        ]
    );

    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .set_json(submission("12345"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["requester_username"], "jdoe");
    assert!(body.get("slurm_command").is_none());

    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "other")
        .set_json(submission("12345"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "DUPLICATE_TICKET");
}

#[actix_rt::test]
async fn test_mistyped_numbers_are_listed_with_other_violations() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .set_json(json!({ "bugzilla_ticket": "abc", "gpu_count": "four", "duration_days": 30 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_FAILED");
    let details = body["details"].as_array().unwrap();
    for expected in [
        "Invalid Bugzilla ticket format",
        "GPU count must be at least 1",
        "Duration must be between 1 and 14 days (maximum 2 weeks)",
    ] {
        assert!(details.iter().any(|d| d == expected), "missing {}", expected);
    }

    // Numeric strings are accepted
    let mut quoted = submission("12345");
    quoted["gpu_count"] = json!("4");
    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .set_json(quoted)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["gpu_count"], 4);
}

#[actix_rt::test]
async fn test_malformed_body_uses_error_response() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"bugzilla_ticket\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_FAILED");
    assert!(
        body["details"][0]
            .as_str()
            .unwrap()
            .starts_with("Malformed request body")
    );

    let req = as_user(
        test::TestRequest::get().uri("/api/v1/priorities?include_archived=maybe"),
        "jdoe",
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_admin_accept_and_commands() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .set_json(submission("12345"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();

    // Requester cannot accept their own request
    let req = as_user(
        test::TestRequest::post().uri(&format!("/api/v1/admin/priorities/{}/accept", id)),
        "jdoe",
    )
    .set_json(json!({ "priority_name": "teamA-burst" }))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = as_user(
        test::TestRequest::post().uri(&format!("/api/v1/admin/priorities/{}/accept", id)),
        ADMIN,
    )
    .set_json(json!({ "priority_name": "-bad" }))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    h.clock.advance(Duration::hours(1));
    let req = as_user(
        test::TestRequest::post().uri(&format!("/api/v1/admin/priorities/{}/accept", id)),
        ADMIN,
    )
    .set_json(json!({ "priority_name": "teamA-burst" }))
    .to_request();
    let accepted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(accepted["status"], "accepted");
    assert_eq!(accepted["priority_name"], "teamA-burst");
    assert_eq!(accepted["status_updated_by"], ADMIN);
    assert_eq!(accepted["is_archived"], false);
    assert_eq!(
        accepted["admin_messages"][0]["text"],
        "Priority accepted and configured with name 'teamA-burst'"
    );

    let req = as_user(
        test::TestRequest::get().uri(&format!("/api/v1/admin/priorities/{}/commands", id)),
        ADMIN,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/plain"))
    );
    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert_eq!(Some(text), accepted["slurm_command"].as_str());
    assert!(text.contains("sacctmgr add qos prio-teamA-burst-10d GrpTRES=gres/gpu:h100=4"));

    // The requester sees the accepted request in their own listing
    let req = as_user(test::TestRequest::get().uri("/api/v1/priorities"), "jdoe").to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing["priorities"].as_array().unwrap().len(), 1);
    assert_eq!(listing["priorities"][0]["status"], "accepted");
}

#[actix_rt::test]
async fn test_commands_missing_until_accepted() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .set_json(submission("12345"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();

    let req = as_user(
        test::TestRequest::get().uri(&format!("/api/v1/admin/priorities/{}/commands", id)),
        ADMIN,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_refuse_messages_and_users() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .set_json(submission("12345"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();

    let req = as_user(
        test::TestRequest::put().uri(&format!("/api/v1/admin/priorities/{}/users", id)),
        ADMIN,
    )
    .set_json(json!({ "additional_usernames": "carol" }))
    .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["additional_usernames"], json!(["carol"]));
    assert!(updated.get("slurm_command").is_none());

    let req = as_user(
        test::TestRequest::post().uri(&format!("/api/v1/admin/priorities/{}/messages", id)),
        ADMIN,
    )
    .set_json(json!({ "message": "   " }))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = as_user(
        test::TestRequest::post().uri(&format!("/api/v1/admin/priorities/{}/refuse", id)),
        ADMIN,
    )
    .set_json(json!({ "message": "Cluster is full this week" }))
    .to_request();
    let refused: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(refused["status"], "refused");
    assert!(refused.get("priority_name").is_none());
    assert_eq!(
        refused["admin_message"],
        "[2026-03-02 14:30 UTC] admin: Cluster is full this week"
    );

    let req = as_user(
        test::TestRequest::post().uri(&format!("/api/v1/admin/priorities/{}/reopen", id)),
        ADMIN,
    )
    .set_json(json!({}))
    .to_request();
    let reopened: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reopened["status"], "pending");
    assert_eq!(reopened["admin_messages"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_owner_only_reads_and_admin_delete() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .set_json(submission("12345"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();

    let req = as_user(
        test::TestRequest::get().uri(&format!("/api/v1/priorities/{}", id)),
        "mallory",
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = as_user(
        test::TestRequest::get().uri(&format!("/api/v1/priorities/{}", id)),
        "jdoe",
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = as_user(test::TestRequest::get().uri("/api/v1/admin/priorities"), "jdoe")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = as_user(
        test::TestRequest::delete().uri(&format!("/api/v1/admin/priorities/{}", id)),
        ADMIN,
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    let req = as_user(
        test::TestRequest::get().uri(&format!("/api/v1/priorities/{}", id)),
        ADMIN,
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = as_user(test::TestRequest::get().uri("/api/v1/admin/priorities"), ADMIN)
        .to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert!(listing["priorities"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_archived_hidden_by_default() {
    let (pool, h) = setup().await;
    let app = create_test_app(&pool, &h.service).await;

    let mut week = submission("12345");
    week["duration_days"] = json!(7);
    let req = as_user(test::TestRequest::post().uri("/api/v1/priorities"), "jdoe")
        .set_json(week)
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();

    let req = as_user(
        test::TestRequest::post().uri(&format!("/api/v1/admin/priorities/{}/accept", id)),
        ADMIN,
    )
    .set_json(json!({ "priority_name": "burst" }))
    .to_request();
    test::call_service(&app, req).await;

    h.clock.advance(Duration::days(15));

    let req = as_user(test::TestRequest::get().uri("/api/v1/admin/priorities"), ADMIN)
        .to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert!(listing["priorities"].as_array().unwrap().is_empty());

    let req = as_user(
        test::TestRequest::get().uri("/api/v1/admin/priorities?include_archived=true"),
        ADMIN,
    )
    .to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing["include_archived"], true);
    assert_eq!(listing["priorities"][0]["is_archived"], true);
    assert_eq!(listing["priorities"][0]["is_expired"], true);
}

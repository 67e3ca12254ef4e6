mod common;

use axum::http::{StatusCode, header};
use common::{json_body, login, request, spawn_app};
use serde_json::json;

#[tokio::test]
async fn admin_surface_is_closed_to_regular_users() {
    let app = spawn_app().await;
    let cookie = login(&app, "alice", "wonderland").await;

    for uri in [
        "/admin/logs",
        "/admin/logs/stats",
        "/admin/logs/export",
        "/admin/users",
    ] {
        let response = request(&app, "GET", uri, Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "FORBIDDEN", "{uri}");
    }
}

#[tokio::test]
async fn admin_creates_lists_and_deletes_users() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let response = request(
        &app,
        "POST",
        "/admin/users",
        Some(&cookie),
        Some(json!({
            "username": "bob",
            "name": "Bob",
            "email": "bob@example.com",
            "password": "builder"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Duplicate usernames are refused with no partial effect.
    let response = request(
        &app,
        "POST",
        "/admin/users",
        Some(&cookie),
        Some(json!({
            "username": "bob",
            "name": "Bob II",
            "email": "bob2@example.com",
            "password": "other"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = request(&app, "GET", "/admin/users", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["admins"], 1);
    assert_eq!(body["regular"], 2);
    let bob = body["users"]
        .as_array()
        .expect("users array")
        .iter()
        .find(|u| u["username"] == "bob")
        .expect("bob listed");
    assert_eq!(bob["password"], "builder");
    assert_eq!(bob["role"], "user");

    let response = request(&app, "DELETE", "/admin/users/bob", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = request(&app, "DELETE", "/admin/users/bob", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_account_cannot_be_deleted() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let response = request(&app, "DELETE", "/admin/users/admin", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "PROTECTED_USER");

    // Still exactly one admin credential.
    let response = request(&app, "GET", "/admin/users", Some(&cookie), None).await;
    let body = json_body(response).await;
    assert_eq!(body["admins"], 1);
}

#[tokio::test]
async fn password_reset_takes_effect_immediately() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let response = request(
        &app,
        "POST",
        "/admin/users/alice/password",
        Some(&cookie),
        Some(json!({"password": "looking-glass"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"username": "alice", "password": "wonderland"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    login(&app, "alice", "looking-glass").await;

    let response = request(
        &app,
        "POST",
        "/admin/users/nouser/password",
        Some(&cookie),
        Some(json!({"password": "x"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_user_requires_every_field() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let response = request(
        &app,
        "POST",
        "/admin/users",
        Some(&cookie),
        Some(json!({"username": "carol", "name": "Carol"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION");
}

#[tokio::test]
async fn logs_filter_aggregate_and_export() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    for (user, cas, purpose, at, summary) in [
        ("alice", "64-17-5", "溶剂", "2026-01-01 09:00:00", "乙醇 - 毒性分级: 1级"),
        ("alice", "50-00-0", "防腐剂", "2026-01-02 10:00:00", "甲醛 - 毒性分级: 4级"),
        ("bob", "9999-99-9", "固化剂", "2026-01-02 23:59:59", "未找到结果"),
    ] {
        app.storage
            .append_log(user, cas, purpose, at, summary)
            .await
            .expect("seed log entry");
    }

    let response = request(&app, "GET", "/admin/logs", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["entries"][0]["username"], "alice");

    // Inclusive on both ends, calendar-date comparison.
    let response = request(
        &app,
        "GET",
        "/admin/logs?start=2026-01-02&end=2026-01-02",
        Some(&cookie),
        None,
    )
    .await;
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);

    let response = request(
        &app,
        "GET",
        "/admin/logs/stats?start=2026-01-01&end=2026-01-02",
        Some(&cookie),
        None,
    )
    .await;
    let body = json_body(response).await;
    assert_eq!(body["by_date"][0]["date"], "2026-01-01");
    assert_eq!(body["by_date"][0]["count"], 1);
    assert_eq!(body["by_date"][1]["count"], 2);
    assert_eq!(body["by_user"][0]["username"], "alice");
    assert_eq!(body["by_user"][0]["count"], 2);

    let response = request(&app, "GET", "/admin/logs/export", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .expect("content-type")
        .to_str()
        .expect("ascii");
    assert!(content_type.starts_with("text/csv"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf-8 export");
    assert!(text.starts_with("用户名,CAS号,使用用途,查询时间,查询结果"));
    assert_eq!(text.lines().count(), 4);
}

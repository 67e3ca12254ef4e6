#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::sync::Arc;
use tower::ServiceExt;

use greengrade::db::Storage;
use greengrade::middleware::auth::CookieSettings;
use greengrade::router::{AppState, grade_router};
use greengrade::service::accounts::AccountService;
use greengrade::service::audit::AuditService;
use greengrade::service::dataset::ChemicalDataset;

pub const DATASET_CSV: &str = "\
CAS号,中文名称,绿色分级,涂料现行标准限量要求,我国新污染物相关管理要求
64-17-5,乙醇,1级,无限量要求,无
50-00-0,甲醛,4级,游离甲醛限量0.05%,重点管控
";

pub struct TestApp {
    pub router: Router,
    pub accounts: AccountService,
    pub audit: AuditService,
    pub storage: Storage,
    _dir: tempfile::TempDir,
}

async fn build_app(with_dataset: bool) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");

    let dataset = if with_dataset {
        let dataset_path = dir.path().join("chemicals.csv");
        std::fs::write(&dataset_path, DATASET_CSV).expect("write dataset");
        Some(Arc::new(
            ChemicalDataset::load(&dataset_path).expect("load dataset"),
        ))
    } else {
        None
    };

    let url = format!("sqlite:{}/app.sqlite", dir.path().display());
    let storage = Storage::connect(&url).await.expect("connect storage");
    let accounts = AccountService::new(storage.clone());
    let audit = AuditService::new(storage.clone());

    accounts
        .ensure_admin("管理员", "ops@example.com", "admin123")
        .await
        .expect("bootstrap admin");
    accounts
        .create("alice", "Alice", "alice@example.com", "wonderland")
        .await
        .expect("create test user");

    let cookie = CookieSettings::new(
        "greengrade_session",
        "integration-test-signing-key-0123456789abcdef",
        30,
        true,
    )
    .expect("cookie settings");

    let state = AppState::new(
        dataset,
        accounts.clone(),
        audit.clone(),
        cookie,
        Arc::from("liwei@scies.org"),
    );
    TestApp {
        router: grade_router(state),
        accounts,
        audit,
        storage,
        _dir: dir,
    }
}

pub async fn spawn_app() -> TestApp {
    build_app(true).await
}

pub async fn spawn_app_without_dataset() -> TestApp {
    build_app(false).await
}

pub async fn request(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");
    app.router
        .clone()
        .oneshot(request)
        .await
        .expect("request failed")
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body was not json")
}

/// The `name=value` pair from a response's Set-Cookie header.
pub fn session_cookie_from(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing set-cookie header")
        .to_str()
        .expect("set-cookie was not ascii");
    set_cookie
        .split(';')
        .next()
        .expect("empty set-cookie header")
        .to_string()
}

pub async fn login(app: &TestApp, username: &str, password: &str) -> String {
    let response = request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login must succeed");
    session_cookie_from(&response)
}

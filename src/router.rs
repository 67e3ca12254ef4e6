use axum::{
    Router,
    extract::FromRef,
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

use crate::handlers;
use crate::middleware::auth::CookieSettings;
use crate::service::accounts::AccountService;
use crate::service::audit::AuditService;
use crate::service::dataset::ChemicalDataset;

#[derive(Clone)]
pub struct AppState {
    /// None when the dataset failed to load at startup; the search
    /// endpoints answer 503 until an operator fixes the file.
    pub dataset: Option<Arc<ChemicalDataset>>,
    pub accounts: AccountService,
    pub audit: AuditService,
    pub cookie: CookieSettings,
    pub contact_email: Arc<str>,
}

impl AppState {
    pub fn new(
        dataset: Option<Arc<ChemicalDataset>>,
        accounts: AccountService,
        audit: AuditService,
        cookie: CookieSettings,
        contact_email: Arc<str>,
    ) -> Self {
        Self {
            dataset,
            accounts,
            audit,
            cookie,
            contact_email,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie.key.clone()
    }
}

pub fn grade_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/search", post(handlers::search::search))
        .route("/search/last", get(handlers::search::last_search))
        .route("/admin/logs", get(handlers::admin::list_logs))
        .route("/admin/logs/stats", get(handlers::admin::log_stats))
        .route("/admin/logs/export", get(handlers::admin::export_logs))
        .route(
            "/admin/users",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route("/admin/users/{username}", delete(handlers::admin::remove_user))
        .route(
            "/admin/users/{username}/password",
            post(handlers::admin::reset_password),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

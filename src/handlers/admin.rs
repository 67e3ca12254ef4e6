//! Administrative surface: audit-log browsing, reporting and export,
//! plus user management. Every handler requires the derived admin role.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::GradeError;
use crate::middleware::auth::AdminUser;
use crate::router::AppState;
use crate::service::accounts::{CredentialSummary, Role};
use crate::service::audit::{self, DateCount, QueryLogEntry, UserCount};

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRangeQuery {
    fn apply(&self, entries: Vec<QueryLogEntry>) -> Vec<QueryLogEntry> {
        if self.start.is_none() && self.end.is_none() {
            return entries;
        }
        audit::filter_by_date_range(
            entries,
            self.start.unwrap_or(NaiveDate::MIN),
            self.end.unwrap_or(NaiveDate::MAX),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub total: usize,
    pub entries: Vec<QueryLogEntry>,
}

pub async fn list_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<LogsResponse>, GradeError> {
    let entries = range.apply(state.audit.load_all().await?);
    Ok(Json(LogsResponse {
        total: entries.len(),
        entries,
    }))
}

#[derive(Debug, Serialize)]
pub struct LogStatsResponse {
    pub by_date: Vec<DateCount>,
    pub by_user: Vec<UserCount>,
}

pub async fn log_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<LogStatsResponse>, GradeError> {
    let entries = range.apply(state.audit.load_all().await?);
    Ok(Json(LogStatsResponse {
        by_date: audit::aggregate_by_date(&entries),
        by_user: audit::aggregate_by_user(&entries),
    }))
}

pub async fn export_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<DateRangeQuery>,
) -> Result<Response, GradeError> {
    let entries = range.apply(state.audit.load_all().await?);
    let body = audit::export_csv(&entries)?;
    let filename = format!("query-logs-{}.csv", Local::now().format("%Y%m%d"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub total: usize,
    pub admins: usize,
    pub regular: usize,
    pub users: Vec<CredentialSummary>,
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<UsersResponse>, GradeError> {
    let users = state.accounts.list_all().await?;
    let admins = users.iter().filter(|u| u.role == Role::Admin).count();
    Ok(Json(UsersResponse {
        total: users.len(),
        admins,
        regular: users.len() - admins,
        users,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<StatusCode, GradeError> {
    if req.username.trim().is_empty()
        || req.name.trim().is_empty()
        || req.email.trim().is_empty()
        || req.password.is_empty()
    {
        return Err(GradeError::Validation("请填写所有字段".to_string()));
    }
    state
        .accounts
        .create(req.username.trim(), req.name.trim(), req.email.trim(), &req.password)
        .await?;
    info!(by = %admin.username, username = %req.username.trim(), "user created");
    Ok(StatusCode::CREATED)
}

pub async fn remove_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(username): Path<String>,
) -> Result<StatusCode, GradeError> {
    state.accounts.delete(&username).await?;
    info!(by = %admin.username, username = %username, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(username): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<StatusCode, GradeError> {
    if req.password.is_empty() {
        return Err(GradeError::Validation("请输入新密码".to_string()));
    }
    state.accounts.reset_password(&username, &req.password).await?;
    info!(by = %admin.username, username = %username, "password reset");
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::GradeError;
use crate::middleware::auth::{self, LastQuery, SessionUser};
use crate::router::AppState;
use crate::service::audit::NOT_FOUND_SUMMARY;
use crate::service::dataset::ChemicalDataset;
use crate::types::chemical::{ChemicalRecord, HazardTier};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub cas_number: String,
    #[serde(default)]
    pub usage_purpose: String,
}

#[derive(Debug, Serialize)]
pub struct TierView {
    pub label: &'static str,
    pub description: &'static str,
    pub color: &'static str,
}

impl From<HazardTier> for TierView {
    fn from(tier: HazardTier) -> Self {
        Self {
            label: tier.label(),
            description: tier.description(),
            color: tier.color(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordView {
    pub cas_number: String,
    pub name: String,
    pub tier: TierView,
    pub usage_limit: String,
    pub regulatory_control: String,
}

impl From<&ChemicalRecord> for RecordView {
    fn from(record: &ChemicalRecord) -> Self {
        Self {
            cas_number: record.cas_number.clone(),
            name: record.name.clone(),
            tier: record.tier.into(),
            usage_limit: record.usage_limit.clone(),
            regulatory_control: record.regulatory_control.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactView {
    pub message: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub cas_number: String,
    pub usage_purpose: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactView>,
}

pub async fn search(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    SessionUser(mut session): SessionUser,
    Json(req): Json<SearchRequest>,
) -> Result<(PrivateCookieJar, Json<SearchResponse>), GradeError> {
    let cas_number = req.cas_number.trim().to_string();
    let usage_purpose = req.usage_purpose.trim().to_string();
    validate_request(&cas_number, &usage_purpose)?;

    let dataset = state.dataset.as_ref().ok_or(GradeError::DatasetUnavailable)?;
    let response = run_lookup(&state, dataset, &session.username, &cas_number, &usage_purpose).await;

    // Remember the query for redisplay after a UI refresh.
    session.last = Some(LastQuery {
        cas_number,
        usage_purpose,
    });
    let jar = jar.add(auth::session_cookie(&state.cookie, &session)?);

    Ok((jar, Json(response)))
}

/// Redisplay the session's most recent lookup without recording a new
/// audit entry. 204 when the session has no remembered query.
pub async fn last_search(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
) -> Result<Response, GradeError> {
    let Some(last) = session.last else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let dataset = state.dataset.as_ref().ok_or(GradeError::DatasetUnavailable)?;
    let hit = dataset.find_by_cas(&last.cas_number);
    Ok(Json(build_response(
        &state,
        hit,
        &last.cas_number,
        &last.usage_purpose,
    ))
    .into_response())
}

fn validate_request(cas_number: &str, usage_purpose: &str) -> Result<(), GradeError> {
    let message = match (cas_number.is_empty(), usage_purpose.is_empty()) {
        (false, false) => return Ok(()),
        (true, true) => "请输入CAS号和使用用途进行查询。",
        (true, false) => "请输入CAS号。",
        (false, true) => "请输入使用用途。",
    };
    Err(GradeError::Validation(message.to_string()))
}

/// Look up, record the attempt win or lose, and shape the response. A
/// logging failure is reported in the system log but does not fail the
/// lookup for the user.
async fn run_lookup(
    state: &AppState,
    dataset: &ChemicalDataset,
    username: &str,
    cas_number: &str,
    usage_purpose: &str,
) -> SearchResponse {
    let hit = dataset.find_by_cas(cas_number);
    let summary = match hit {
        Some(record) => format!("{} - 毒性分级: {}", record.name, record.tier.label()),
        None => NOT_FOUND_SUMMARY.to_string(),
    };

    if let Err(e) = state
        .audit
        .append(username, cas_number, &summary, usage_purpose)
        .await
    {
        error!(
            username = %username,
            cas_number = %cas_number,
            error = %e,
            "failed to record query log entry"
        );
    }

    build_response(state, hit, cas_number, usage_purpose)
}

fn build_response(
    state: &AppState,
    hit: Option<&ChemicalRecord>,
    cas_number: &str,
    usage_purpose: &str,
) -> SearchResponse {
    let (record, contact) = match hit {
        Some(record) => (Some(RecordView::from(record)), None),
        None => (
            None,
            Some(ContactView {
                message: format!(
                    "数据库暂无该物质结果。如需获取该物质评估结果，请发送邮件至 {}，并在邮件中注明：化学物质名称、CAS号、用途、企业名称。",
                    state.contact_email
                ),
                email: state.contact_email.to_string(),
            }),
        ),
    };
    SearchResponse {
        cas_number: cas_number.to_string(),
        usage_purpose: usage_purpose.to_string(),
        found: record.is_some(),
        record,
        contact,
    }
}

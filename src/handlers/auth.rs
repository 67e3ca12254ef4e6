use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::GradeError;
use crate::middleware::auth::{self, SessionData};
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub name: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(PrivateCookieJar, Json<LoginResponse>), GradeError> {
    let auth = match state.accounts.verify(&req.username, &req.password).await {
        Ok(auth) => auth,
        Err(e) => {
            if matches!(e, GradeError::AuthFailed) {
                warn!(username = %req.username, "login rejected");
            }
            return Err(e);
        }
    };

    let session = SessionData {
        username: auth.username.clone(),
        name: auth.display_name.clone(),
        last: None,
    };
    let jar = jar.add(auth::session_cookie(&state.cookie, &session)?);
    info!(username = %auth.username, "login succeeded");

    Ok((
        jar,
        Json(LoginResponse {
            username: auth.username,
            name: auth.display_name,
        }),
    ))
}

/// Clears the session cookie. Succeeds whether or not a session exists,
/// so a stale client can always reach the logged-out state.
pub async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, StatusCode) {
    (
        jar.remove(auth::removal_cookie(&state.cookie)),
        StatusCode::NO_CONTENT,
    )
}

//! Session access control.
//!
//! Identity lives in an encrypted private cookie. Role is derived from
//! the username on every request, never stored in the session. A missing
//! or undecodable cookie rejects with 401; `AdminUser` additionally
//! rejects non-admin identities with 403.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, Expiration, Key, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

use crate::error::GradeError;
use crate::router::AppState;
use crate::service::accounts::ADMIN_USERNAME;

/// Runtime cookie parameters, derived from configuration at startup.
#[derive(Clone)]
pub struct CookieSettings {
    pub name: Arc<str>,
    pub key: Key,
    pub expiry_days: i64,
    pub insecure: bool,
}

impl CookieSettings {
    pub fn new(
        name: &str,
        key_material: &str,
        expiry_days: i64,
        insecure: bool,
    ) -> Result<Self, GradeError> {
        if key_material.len() < 32 {
            return Err(GradeError::Config(
                "cookie signing key must be at least 32 bytes".to_string(),
            ));
        }
        Ok(Self {
            name: Arc::from(name),
            key: Key::derive_from(key_material.as_bytes()),
            expiry_days,
            insecure,
        })
    }
}

/// Serialized session payload. `last` remembers the most recent lookup
/// so the UI can redisplay it after a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub username: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<LastQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastQuery {
    pub cas_number: String,
    pub usage_purpose: String,
}

pub fn session_cookie(
    settings: &CookieSettings,
    data: &SessionData,
) -> Result<Cookie<'static>, GradeError> {
    let value = serde_json::to_string(data)?;
    let expires = OffsetDateTime::now_utc() + Duration::days(settings.expiry_days);
    Ok(Cookie::build((settings.name.to_string(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!settings.insecure)
        .expires(Expiration::from(expires))
        .build())
}

pub fn removal_cookie(settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((settings.name.to_string(), "")).path("/").build()
}

/// Authenticated session identity.
#[derive(Debug, Clone)]
pub struct SessionUser(pub SessionData);

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
    Key: FromRef<S>,
{
    type Rejection = GradeError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let jar: PrivateCookieJar = PrivateCookieJar::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        let Some(cookie) = jar.get(app.cookie.name.as_ref()) else {
            return Err(GradeError::Unauthenticated);
        };
        let data: SessionData =
            serde_json::from_str(cookie.value()).map_err(|_| GradeError::Unauthenticated)?;
        Ok(Self(data))
    }
}

/// Authenticated session identity holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub SessionData);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
    Key: FromRef<S>,
{
    type Rejection = GradeError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionUser(data) = SessionUser::from_request_parts(parts, state).await?;
        if data.username != ADMIN_USERNAME {
            return Err(GradeError::Forbidden);
        }
        Ok(Self(data))
    }
}

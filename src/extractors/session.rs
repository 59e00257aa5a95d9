//! Admin session check from the `adminSession` cookie.
//!
//! This is a stub gate: any request carrying `adminSession=true` is treated
//! as logged in. There are no users or credentials behind it.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

pub const SESSION_COOKIE: &str = "adminSession";

/// Lifetime of the cookie set at login, in seconds.
pub const SESSION_MAX_AGE: u64 = 24 * 60 * 60;

/// Present on a request only if it carries a session cookie.
#[derive(Clone, Debug)]
pub struct AdminSession;

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if has_session(&parts.headers) {
            Ok(AdminSession)
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(name, value)| name == SESSION_COOKIE && value == "true")
}

/// `Set-Cookie` value that opens a session.
pub fn session_cookie() -> String {
    format!(
        "{}=true; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, SESSION_MAX_AGE
    )
}

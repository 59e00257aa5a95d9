//! Stub login: opens a session for any non-empty credentials.

use crate::error::AppError;
use crate::extractors::session_cookie;
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(Json(req): Json<LoginRequest>) -> Result<impl IntoResponse, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("email and password are required".into()));
    }
    tracing::info!(email = %req.email, "admin login");
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie())],
        Json(serde_json::json!({ "data": { "status": "ok" } })),
    ))
}

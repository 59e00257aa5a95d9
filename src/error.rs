//! Typed errors and HTTP mapping.

use crate::settings::SettingsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures while resolving and vetting a blueprint definition.
#[derive(Error, Debug)]
pub enum BlueprintError {
    #[error("blueprint not found: {0}")]
    NotFound(String),
    /// Never sanitized: names are interpolated into SQL text.
    #[error("invalid identifier for {field}: '{value}'")]
    InvalidIdentifier { field: String, value: String },
    #[error("malformed blueprint '{name}': {reason}")]
    MalformedDefinition { name: String, reason: String },
    #[error("cannot read blueprint '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Blueprint(#[from] BlueprintError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported type '{field_type}' for dialect {dialect}")]
    UnsupportedType { field_type: String, dialect: String },
    #[error("field '{field}' references unknown collection '{collection}'")]
    UnknownReferencedCollection { field: String, collection: String },
    #[error("item has no id")]
    MissingId,
    #[error("no mappable fields for {0}")]
    EmptyFieldSet(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Blueprint(BlueprintError::NotFound(_)) | AppError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            AppError::Blueprint(BlueprintError::InvalidIdentifier { .. }) => {
                (StatusCode::BAD_REQUEST, "invalid_identifier")
            }
            AppError::Blueprint(BlueprintError::MalformedDefinition { .. }) => {
                (StatusCode::BAD_REQUEST, "malformed_definition")
            }
            AppError::Blueprint(BlueprintError::Read { .. }) => (StatusCode::INTERNAL_SERVER_ERROR, "blueprint_unreadable"),
            AppError::UnsupportedType { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "unsupported_type"),
            AppError::UnknownReferencedCollection { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "unknown_referenced_collection")
            }
            AppError::MissingId => (StatusCode::BAD_REQUEST, "missing_id"),
            AppError::EmptyFieldSet(_) => (StatusCode::BAD_REQUEST, "empty_field_set"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Db(sqlx::Error::RowNotFound) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Settings(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::warn!(error = %self, code, "request rejected");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

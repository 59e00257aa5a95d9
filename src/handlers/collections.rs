//! Collection handlers: what content types exist and their blueprints.

use crate::error::AppError;
use crate::extractors::AdminSession;
use crate::handlers::items::configured_collection;
use crate::response::{success_many, success_one};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub display_name: String,
}

pub async fn list(_session: AdminSession, State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let summaries: Vec<CollectionSummary> = state
        .registry
        .get_all()
        .await?
        .into_iter()
        .map(|c| CollectionSummary {
            name: c.name().to_string(),
            display_name: c.display_name().to_string(),
        })
        .collect();
    Ok(success_many(summaries))
}

pub async fn blueprint(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let collection = configured_collection(&state, &name).await?;
    Ok(success_one(collection.blueprint().clone()))
}

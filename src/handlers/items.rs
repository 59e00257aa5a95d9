//! Item handlers: list, read, create, update within one collection.

use crate::blueprint::{KEY_COLLECTION, KEY_ID, KEY_UPDATED_AT, KEY_UUID};
use crate::collection::Collection;
use crate::error::AppError;
use crate::extractors::AdminSession;
use crate::item::{FieldValue, Item};
use crate::response::{success_created, success_one, success_page};
use crate::service::{CrudService, RequestValidator};
use crate::settings::MAX_ADMIN_ITEMS_LIMIT;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Resolve a configured collection; unconfigured names are not served.
pub(crate) async fn configured_collection(state: &AppState, name: &str) -> Result<Collection, AppError> {
    if !state.registry.names().iter().any(|n| n == name) {
        return Err(AppError::NotFound(format!("collection {}", name)));
    }
    state.registry.get(name).await
}

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Copy body fields onto `item`, leaving out `skip` and reference fields.
fn copy_fields(collection: &Collection, item: &mut Item, body: Map<String, Value>, skip: &[&str]) {
    for (key, value) in body {
        if skip.contains(&key.as_str()) {
            continue;
        }
        if collection.blueprint().field(&key).is_some_and(|f| f.is_reference()) {
            continue;
        }
        item.insert(key, FieldValue::from(value));
    }
}

pub async fn list(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let collection = configured_collection(&state, &name).await?;
    let limit = match params.get("limit") {
        None => state.settings.admin_items_limit,
        Some(v) => v
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=MAX_ADMIN_ITEMS_LIMIT).contains(n))
            .ok_or_else(|| AppError::BadRequest(format!("limit must be 1..={}", MAX_ADMIN_ITEMS_LIMIT)))?,
    };
    let offset = match params.get("offset") {
        None => 0,
        Some(v) => v
            .parse::<u64>()
            .map_err(|_| AppError::BadRequest("offset must be a non-negative integer".into()))?,
    };
    let items = CrudService::list(&state.db, &collection, limit, offset).await?;
    Ok(success_page(items, Some(limit), Some(offset)))
}

pub async fn read(
    _session: AdminSession,
    State(state): State<AppState>,
    Path((name, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let collection = configured_collection(&state, &name).await?;
    let id = parse_id(&id_str)?;
    let item = CrudService::get_by_id(&state.db, &collection, id).await?;
    Ok(success_one(item))
}

pub async fn create(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let collection = configured_collection(&state, &name).await?;
    let body = body_to_map(body)?;
    let mut item = Item::new(&collection);
    copy_fields(&collection, &mut item, body, &[KEY_UUID, KEY_COLLECTION, KEY_ID, KEY_UPDATED_AT]);
    item.coerce(collection.blueprint())?;
    RequestValidator::validate(collection.blueprint(), &item)?;
    CrudService::create(&state.db, &collection, &mut item).await?;
    tracing::info!(collection = %name, id = ?item.id(), "item created");
    Ok(success_created(item))
}

pub async fn update(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let collection = configured_collection(&state, &name).await?;
    let body = body_to_map(body)?;
    let mut item = Item::default();
    copy_fields(&collection, &mut item, body, &[KEY_UUID, KEY_COLLECTION]);
    item.coerce(collection.blueprint())?;
    CrudService::update(&state.db, &collection, &mut item).await?;
    let id = item.id().ok_or(AppError::MissingId)?;
    let stored = CrudService::get_by_id(&state.db, &collection, id).await?;
    tracing::info!(collection = %name, id, "item updated");
    Ok(success_one(stored))
}

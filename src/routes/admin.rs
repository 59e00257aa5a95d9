//! Admin routes. Everything except login requires a session cookie,
//! enforced by the `AdminSession` extractor on each handler.

use crate::handlers::{collections, items, login};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login::login))
        .route("/collections", get(collections::list))
        .route("/collections/:collection", get(collections::blueprint))
        .route(
            "/:collection/items",
            get(items::list).post(items::create).put(items::update),
        )
        .route("/:collection/items/:id", get(items::read))
        .with_state(state)
}

//! Router assembly.

mod admin;
mod common;

pub use admin::admin_routes;
pub use common::common_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Resolves when `signal` fires. If the signal cannot be installed the
/// error is logged and this never resolves, so the server keeps running.
pub async fn shutdown_on<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "failed to install shutdown signal; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

/// The full application: common routes at the root, admin under `/admin`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/admin", admin_routes(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::BlueprintLoader;
    use crate::collection::CollectionRegistry;
    use crate::migration::ensure_tables;
    use crate::settings::Settings;
    use crate::store::Database;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    const SESSION: &str = "adminSession=true";

    async fn test_app() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            blueprints_path: dir.path().to_path_buf(),
            admin_items_limit: 2,
            ..Settings::default()
        };
        let registry =
            CollectionRegistry::new(BlueprintLoader::new(&settings.blueprints_path), settings.collections.clone())
                .unwrap();
        let db = Database::sqlite_in_memory().await.unwrap();
        ensure_tables(&db, &registry).await.unwrap();
        (app(AppState::new(db, registry, settings)), dir)
    }

    async fn send(app: &Router, method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn shutdown_waits_for_the_signal() {
        let fired = tokio::time::timeout(Duration::from_millis(100), shutdown_on(async { Ok::<(), std::io::Error>(()) })).await;
        assert!(fired.is_ok());

        let broken = shutdown_on(async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal handler")) });
        let waited = tokio::time::timeout(Duration::from_millis(100), broken).await;
        assert!(waited.is_err(), "a failed signal must not trigger shutdown");
    }

    #[tokio::test]
    async fn health_and_ready() {
        let (app, _dir) = test_app().await;
        assert_eq!(send(&app, "GET", "/health", None, None).await.0, StatusCode::OK);
        let (status, body) = send(&app, "GET", "/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn admin_requires_session() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(&app, "GET", "/admin/collections", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let (app, _dir) = test_app().await;
        let req = Request::builder()
            .method("POST")
            .uri("/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"email": "a@b.c", "password": "x"}).to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with(SESSION));

        let (status, _) = send(&app, "POST", "/admin/login", None, Some(json!({"email": "", "password": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_collections_and_blueprints() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(&app, "GET", "/admin/collections", Some(SESSION), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["name"], "articles");
        assert_eq!(body["data"][1]["name"], "authors");

        let (status, body) = send(&app, "GET", "/admin/collections/articles", Some(SESSION), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["collection_name"], "articles");

        let (status, _) = send(&app, "GET", "/admin/collections/pages", Some(SESSION), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/admin/collections/a%20b", Some(SESSION), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_read_update_and_list_items() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/admin/authors/items",
            Some(SESSION),
            Some(json!({"title": "Ada", "name": "Ada Lovelace", "uuid": "forged", "id": 99})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_i64().unwrap();
        assert_ne!(id, 99);
        assert_ne!(body["data"]["uuid"], "forged");
        assert_eq!(body["data"]["collection"], "authors");

        let (status, body) = send(&app, "GET", &format!("/admin/authors/items/{}", id), Some(SESSION), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Ada Lovelace");

        let (status, body) = send(
            &app,
            "PUT",
            "/admin/authors/items",
            Some(SESSION),
            Some(json!({"id": id.to_string(), "name": "Ada King"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Ada King");
        assert_eq!(body["data"]["title"], "Ada");

        for title in ["Grace", "Edsger"] {
            let (status, _) =
                send(&app, "POST", "/admin/authors/items", Some(SESSION), Some(json!({"title": title}))).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        // Default page size comes from settings.
        let (status, body) = send(&app, "GET", "/admin/authors/items", Some(SESSION), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["count"], 2);
        assert_eq!(body["data"][0]["title"], "Edsger");

        let (_, body) = send(&app, "GET", "/admin/authors/items?limit=5&offset=2", Some(SESSION), None).await;
        assert_eq!(body["meta"]["count"], 1);
    }

    #[tokio::test]
    async fn rejects_bad_item_requests() {
        let (app, _dir) = test_app().await;
        let cases = [
            ("POST", "/admin/authors/items", Some(json!({"name": "no title"})), StatusCode::BAD_REQUEST),
            ("PUT", "/admin/authors/items", Some(json!({"name": "no id"})), StatusCode::BAD_REQUEST),
            ("PUT", "/admin/authors/items", Some(json!({"id": 404, "name": "x"})), StatusCode::NOT_FOUND),
            ("GET", "/admin/authors/items/abc", None, StatusCode::BAD_REQUEST),
            ("GET", "/admin/authors/items/1", None, StatusCode::NOT_FOUND),
            ("GET", "/admin/authors/items?limit=0", None, StatusCode::BAD_REQUEST),
            ("GET", "/admin/authors/items?limit=201", None, StatusCode::BAD_REQUEST),
            ("GET", "/admin/pages/items", None, StatusCode::NOT_FOUND),
        ];
        for (method, uri, body, expected) in cases {
            let (status, _) = send(&app, method, uri, Some(SESSION), body).await;
            assert_eq!(status, expected, "{} {}", method, uri);
        }
    }
}

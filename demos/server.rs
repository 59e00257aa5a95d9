//! Example server: reads settings from the environment, creates the tables for
//! every configured collection, then serves the admin API until ctrl-c.

use blueprint_cms::{app, ensure_tables, shutdown_on, telemetry, AppState, BlueprintLoader, CollectionRegistry, Database, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::from_env()?;
    telemetry::init(&settings)?;

    let db = Database::connect(&settings).await?;
    tracing::info!(dialect = %db.dialect(), "database connected");

    let mut registry = CollectionRegistry::new(
        BlueprintLoader::new(&settings.blueprints_path),
        settings.collections.clone(),
    )?;
    if settings.cache_collections {
        registry = registry.with_cache();
    }
    let collections = registry.get_all().await?;
    tracing::info!(count = collections.len(), "collections loaded");
    ensure_tables(&db, &registry).await?;

    let addr = settings.host_and_port;
    let state = AppState::new(db, registry, settings);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

//! Shared application state for all routes.

use crate::collection::CollectionRegistry;
use crate::settings::Settings;
use crate::store::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub registry: Arc<CollectionRegistry>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Database, registry: CollectionRegistry, settings: Settings) -> Self {
        AppState {
            db,
            registry: Arc::new(registry),
            settings: Arc::new(settings),
        }
    }
}

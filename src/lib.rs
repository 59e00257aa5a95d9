//! Blueprint CMS: declarative content types mapped to SQL tables, with
//! item CRUD over SQLite or PostgreSQL and a JSON admin interface.

pub mod blueprint;
pub mod collection;
pub mod dialect;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod item;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;
pub mod telemetry;

pub use blueprint::{Blueprint, BlueprintLoader, Field, FieldType};
pub use collection::{Collection, CollectionRegistry};
pub use dialect::Dialect;
pub use error::{AppError, BlueprintError};
pub use item::{FieldValue, Item};
pub use migration::{ensure_reference_table, ensure_table, ensure_tables};
pub use routes::{app, shutdown_on};
pub use service::CrudService;
pub use settings::{Settings, SettingsError};
pub use state::AppState;
pub use store::{ensure_database_exists, Database};

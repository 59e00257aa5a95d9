//! Process settings read from the environment (after `.env`).

use crate::blueprint::{is_safe_identifier, BUILTIN_COLLECTIONS};
use crate::dialect::Dialect;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const MAX_ADMIN_ITEMS_LIMIT: u32 = 200;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("{0} is required")]
    Missing(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub host_and_port: SocketAddr,
    pub log_level: String,
    pub log_format: LogFormat,
    pub blueprints_path: PathBuf,
    pub database_type: Dialect,
    pub sqlite3_database_file: PathBuf,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Default page size for admin item listings.
    pub admin_items_limit: u32,
    pub collections: Vec<String>,
    pub cache_collections: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host_and_port: SocketAddr::from(([0, 0, 0, 0], 6532)),
            log_level: "info".into(),
            log_format: LogFormat::Text,
            blueprints_path: PathBuf::from("content/blueprints"),
            database_type: Dialect::Sqlite3,
            sqlite3_database_file: PathBuf::from("content/sqlite3/cms.db"),
            database_url: None,
            max_connections: 5,
            admin_items_limit: 50,
            collections: BUILTIN_COLLECTIONS.iter().map(|s| s.to_string()).collect(),
            cache_collections: false,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut s = Settings::default();

        if let Some(v) = get("HOST_AND_PORT") {
            s.host_and_port = v.parse().map_err(|e| invalid("HOST_AND_PORT", e))?;
        }
        if let Some(v) = get("LOG_LEVEL") {
            let v = v.to_lowercase();
            if !matches!(v.as_str(), "debug" | "info" | "warn" | "error") {
                return Err(invalid("LOG_LEVEL", format!("'{}' is not one of debug, info, warn, error", v)));
            }
            s.log_level = v;
        }
        if let Some(v) = get("LOG_FORMAT") {
            s.log_format = match v.to_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => return Err(invalid("LOG_FORMAT", format!("'{}' is not text or json", other))),
            };
        }
        if let Some(v) = get("BLUEPRINTS_PATH") {
            s.blueprints_path = PathBuf::from(v);
        }
        if let Some(v) = get("DATABASE_TYPE") {
            s.database_type = v.parse().map_err(|e| invalid("DATABASE_TYPE", e))?;
        }
        if let Some(v) = get("SQLITE3_DATABASE_FILE") {
            s.sqlite3_database_file = PathBuf::from(v);
        }
        s.database_url = get("DATABASE_URL");
        if let Some(v) = get("MAX_CONNECTIONS") {
            s.max_connections = v.parse().map_err(|e| invalid("MAX_CONNECTIONS", e))?;
            if s.max_connections == 0 {
                return Err(invalid("MAX_CONNECTIONS", "must be at least 1"));
            }
        }
        if let Some(v) = get("ADMIN_ITEMS_LIMIT") {
            let n: u32 = v.parse().map_err(|e| invalid("ADMIN_ITEMS_LIMIT", e))?;
            if !(1..=MAX_ADMIN_ITEMS_LIMIT).contains(&n) {
                return Err(invalid("ADMIN_ITEMS_LIMIT", format!("{} is outside 1..={}", n, MAX_ADMIN_ITEMS_LIMIT)));
            }
            s.admin_items_limit = n;
        }
        if let Some(v) = get("COLLECTIONS") {
            let names: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect();
            if let Some(bad) = names.iter().find(|n| !is_safe_identifier(n)) {
                return Err(invalid("COLLECTIONS", format!("'{}' is not a valid collection name", bad)));
            }
            s.collections = names;
        }
        if let Some(v) = get("CACHE_COLLECTIONS") {
            s.cache_collections = match v.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                other => return Err(invalid("CACHE_COLLECTIONS", format!("'{}' is not a boolean", other))),
            };
        }

        if s.database_type == Dialect::Postgresql && s.database_url.is_none() {
            return Err(SettingsError::Missing("DATABASE_URL"));
        }
        Ok(s)
    }
}

fn invalid(key: &'static str, reason: impl ToString) -> SettingsError {
    SettingsError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

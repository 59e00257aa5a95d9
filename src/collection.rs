//! Collections: loaded blueprints, plus the registry that enumerates them.

use crate::blueprint::{check_identifier, Blueprint, BlueprintLoader};
use crate::error::{AppError, BlueprintError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A loaded, usable blueprint backing one SQL table.
#[derive(Clone, Debug, PartialEq)]
pub struct Collection {
    blueprint: Arc<Blueprint>,
}

impl Collection {
    pub fn new(blueprint: Blueprint) -> Self {
        Self {
            blueprint: Arc::new(blueprint),
        }
    }

    /// Table name; identifier-safe by construction.
    pub fn name(&self) -> &str {
        &self.blueprint.collection_name
    }

    pub fn display_name(&self) -> &str {
        &self.blueprint.collection_display_name
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }
}

/// Enumerates the configured collection names and loads them through the
/// blueprint loader. With caching enabled, each collection is loaded once per
/// process; overrides edited afterwards are not picked up.
#[derive(Debug)]
pub struct CollectionRegistry {
    loader: BlueprintLoader,
    names: Vec<String>,
    cache: Option<RwLock<HashMap<String, Collection>>>,
}

impl CollectionRegistry {
    pub fn new(loader: BlueprintLoader, names: Vec<String>) -> Result<Self, BlueprintError> {
        for name in &names {
            check_identifier("collections", name)?;
        }
        Ok(Self {
            loader,
            names,
            cache: None,
        })
    }

    pub fn with_cache(mut self) -> Self {
        self.cache = Some(RwLock::new(HashMap::new()));
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Load every configured collection. The first failure aborts the call.
    pub async fn get_all(&self) -> Result<Vec<Collection>, AppError> {
        let mut out = Vec::with_capacity(self.names.len());
        for name in &self.names {
            out.push(self.get(name).await?);
        }
        Ok(out)
    }

    pub async fn get(&self, name: &str) -> Result<Collection, AppError> {
        if let Some(hit) = self.cached(name) {
            return Ok(hit);
        }
        let collection = Collection::new(self.loader.load(name).await?);
        if let Some(cache) = &self.cache {
            match cache.write() {
                Ok(mut map) => {
                    map.insert(name.to_string(), collection.clone());
                }
                Err(_) => tracing::warn!(collection = %name, "collection cache lock poisoned; not caching"),
            }
        }
        Ok(collection)
    }

    fn cached(&self, name: &str) -> Option<Collection> {
        let cache = self.cache.as_ref()?;
        match cache.read() {
            Ok(map) => map.get(name).cloned(),
            Err(_) => {
                tracing::warn!(collection = %name, "collection cache lock poisoned; loading uncached");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(dir: &std::path::Path, names: &[&str]) -> CollectionRegistry {
        CollectionRegistry::new(
            BlueprintLoader::new(dir),
            names.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn get_all_loads_in_configured_order() {
        let dir = tempfile::tempdir().unwrap();
        let all = registry(dir.path(), &["authors", "articles"]).get_all().await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["authors", "articles"]);
    }

    #[tokio::test]
    async fn get_all_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let err = registry(dir.path(), &["authors", "missing", "articles"]).get_all().await.unwrap_err();
        assert!(matches!(err, AppError::Blueprint(BlueprintError::NotFound(n)) if n == "missing"));
    }

    #[test]
    fn rejects_unsafe_configured_names() {
        let dir = tempfile::tempdir().unwrap();
        let err = CollectionRegistry::new(BlueprintLoader::new(dir.path()), vec!["x y".into()]).unwrap_err();
        assert!(matches!(err, BlueprintError::InvalidIdentifier { .. }));
    }

    #[tokio::test]
    async fn cache_keeps_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.json");
        std::fs::write(&path, r#"{"collection_name":"authors","collection_display_name":"One","fields":[]}"#).unwrap();
        let reg = registry(dir.path(), &["authors"]).with_cache();
        assert_eq!(reg.get("authors").await.unwrap().display_name(), "One");

        std::fs::write(&path, r#"{"collection_name":"authors","collection_display_name":"Two","fields":[]}"#).unwrap();
        assert_eq!(reg.get("authors").await.unwrap().display_name(), "One");

        let uncached = registry(dir.path(), &["authors"]);
        assert_eq!(uncached.get("authors").await.unwrap().display_name(), "Two");
    }

    #[tokio::test]
    async fn poisoned_cache_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path(), &["authors"]).with_cache();
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = reg.cache.as_ref().unwrap().write().unwrap();
                    panic!("poison the cache lock");
                })
                .join();
        });
        assert!(reg.cache.as_ref().unwrap().is_poisoned());
        assert_eq!(reg.get("authors").await.unwrap().name(), "authors");
    }
}

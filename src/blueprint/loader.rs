//! Load blueprints from the override directory, falling back to the built-in set.

use crate::blueprint::{check_identifier, system_fields, validate, Blueprint};
use crate::error::BlueprintError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Collections whose definitions ship with the crate.
pub const BUILTIN_COLLECTIONS: &[&str] = &["articles", "authors"];

fn builtin_definition(name: &str) -> Option<&'static str> {
    match name {
        "articles" => Some(include_str!("builtin/articles.json")),
        "authors" => Some(include_str!("builtin/authors.json")),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct BlueprintLoader {
    blueprints_path: PathBuf,
}

impl BlueprintLoader {
    pub fn new(blueprints_path: impl Into<PathBuf>) -> Self {
        Self {
            blueprints_path: blueprints_path.into(),
        }
    }

    /// Resolve, parse and vet the blueprint for `name`. Runs the identifier
    /// checks on every call.
    pub async fn load(&self, name: &str) -> Result<Blueprint, BlueprintError> {
        // Checked before touching the filesystem so the name cannot escape the directory.
        check_identifier("collection", name)?;

        let override_path = self.blueprints_path.join(format!("{}.json", name));
        let data = match tokio::fs::read_to_string(&override_path).await {
            Ok(data) => {
                tracing::debug!(path = %override_path.display(), "blueprint override");
                data
            }
            Err(e) if e.kind() == ErrorKind::NotFound => builtin_definition(name)
                .map(str::to_string)
                .ok_or_else(|| BlueprintError::NotFound(name.to_string()))?,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(BlueprintError::MalformedDefinition {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                return Err(BlueprintError::Read {
                    name: name.to_string(),
                    source: e,
                })
            }
        };
        parse(name, &data)
    }
}

/// Parse a definition, prepend the system fields and validate the result.
pub fn parse(name: &str, data: &str) -> Result<Blueprint, BlueprintError> {
    let mut blueprint: Blueprint = serde_json::from_str(data).map_err(|e| BlueprintError::MalformedDefinition {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    if blueprint.collection_name != name {
        // Checked first so an unsafe collection_name is reported as such.
        check_identifier("collection_name", &blueprint.collection_name)?;
        return Err(BlueprintError::MalformedDefinition {
            name: name.to_string(),
            reason: format!("collection_name is '{}'", blueprint.collection_name),
        });
    }
    let mut fields = system_fields();
    fields.append(&mut blueprint.fields);
    blueprint.fields = fields;
    validate(&blueprint)?;
    Ok(blueprint)
}

//! Apply blueprints to the database: one table per collection plus one
//! junction table per pair of collections related by a reference field.
//!
//! Every statement is `CREATE TABLE IF NOT EXISTS`, so this is safe to run on
//! each startup. There is no rollback: when a later statement fails, tables
//! created earlier in the same run stay in place.

use crate::blueprint::{Blueprint, Field};
use crate::collection::{Collection, CollectionRegistry};
use crate::dialect::{Dialect, SqlType};
use crate::error::{AppError, BlueprintError};
use crate::sql::{foreign_key_column, quote};
use crate::store::Database;

/// CREATE TABLE statement for the non-reference fields of `blueprint`.
pub fn create_table_sql(dialect: Dialect, blueprint: &Blueprint) -> Result<String, AppError> {
    let mut col_defs = Vec::new();
    for field in &blueprint.fields {
        if let Some(def) = column_def(dialect, field)? {
            col_defs.push(def);
        }
    }
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quote(&blueprint.collection_name)?,
        col_defs.join(",\n  ")
    ))
}

fn column_def(dialect: Dialect, field: &Field) -> Result<Option<String>, AppError> {
    match dialect.map_type(field.type_)? {
        SqlType::Reference => Ok(None),
        SqlType::Column(typ) => {
            let mut def = format!("{} {}", quote(&field.name)?, typ);
            if field.required {
                def.push_str(" NOT NULL");
            }
            Ok(Some(def))
        }
    }
}

/// Junction table name: both collection names sorted, joined with `_`.
pub fn reference_table_name(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}_{}", first, second)
}

pub fn reference_table_sql(dialect: Dialect, a: &str, b: &str) -> Result<String, AppError> {
    if a == b {
        return Err(BlueprintError::MalformedDefinition {
            name: a.to_string(),
            reason: "a collection cannot reference itself".into(),
        }
        .into());
    }
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let fk_type = dialect.foreign_key_type();
    let first_fk = foreign_key_column(first)?;
    let second_fk = foreign_key_column(second)?;
    let id = quote("id")?;
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n  {id} {id_type},\n  {first_fk} {fk_type} NOT NULL,\n  {second_fk} {fk_type} NOT NULL,\n  FOREIGN KEY ({first_fk}) REFERENCES {first} ({id}),\n  FOREIGN KEY ({second_fk}) REFERENCES {second} ({id})\n)",
        table = quote(&reference_table_name(a, b))?,
        id = id,
        id_type = dialect.junction_id_type(),
        first_fk = first_fk,
        second_fk = second_fk,
        fk_type = fk_type,
        first = quote(first)?,
        second = quote(second)?,
    ))
}

/// Create the junction table for `a` and `b`. Argument order does not matter.
pub async fn ensure_reference_table(db: &Database, a: &Collection, b: &Collection) -> Result<(), AppError> {
    let sql = reference_table_sql(db.dialect(), a.name(), b.name())?;
    db.execute_ddl(&sql).await?;
    tracing::debug!(table = %reference_table_name(a.name(), b.name()), "reference table ensured");
    Ok(())
}

/// Create the table for `collection` and the junction tables of its reference
/// fields. Referenced collections are resolved through `registry` and their
/// own tables are created first, so the junction foreign keys have targets.
pub async fn ensure_table(db: &Database, collection: &Collection, registry: &CollectionRegistry) -> Result<(), AppError> {
    let dialect = db.dialect();
    let blueprint = collection.blueprint();

    let mut referenced = Vec::new();
    for field in blueprint.reference_fields() {
        let target = field
            .reference
            .as_ref()
            .map(|r| r.collection.as_str())
            .unwrap_or_default();
        let target = registry.get(target).await.map_err(|e| match e {
            AppError::Blueprint(BlueprintError::NotFound(_)) => AppError::UnknownReferencedCollection {
                field: field.name.clone(),
                collection: target.to_string(),
            },
            other => other,
        })?;
        referenced.push(target);
    }

    let sql = create_table_sql(dialect, blueprint)?;
    db.execute_ddl(&sql).await?;
    tracing::info!(table = %collection.name(), "table ensured");

    for target in &referenced {
        db.execute_ddl(&create_table_sql(dialect, target.blueprint())?).await?;
        ensure_reference_table(db, collection, target).await?;
    }
    Ok(())
}

/// Ensure tables for every collection the registry knows, in order. Stops at the first error.
pub async fn ensure_tables(db: &Database, registry: &CollectionRegistry) -> Result<(), AppError> {
    for collection in registry.get_all().await? {
        ensure_table(db, &collection, registry).await?;
    }
    Ok(())
}

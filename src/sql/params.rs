//! Bind `FieldValue`s to sqlx queries and decode rows back into items.

use crate::item::{FieldValue, Item};
use sqlx::postgres::{PgArguments, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

pub fn bind_pg<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &FieldValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        FieldValue::Null => query.bind(None::<String>),
        FieldValue::Bool(b) => query.bind(*b),
        FieldValue::Int(n) => query.bind(*n),
        FieldValue::Float(f) => query.bind(*f),
        FieldValue::Text(s) => query.bind(s.clone()),
        FieldValue::Bytes(b) => query.bind(b.clone()),
        FieldValue::Json(v) => query.bind(sqlx::types::Json(v.clone())),
    }
}

/// SQLite stores array/object fields as BLOBs holding JSON text.
pub fn bind_sqlite<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &FieldValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        FieldValue::Null => query.bind(None::<String>),
        FieldValue::Bool(b) => query.bind(*b),
        FieldValue::Int(n) => query.bind(*n),
        FieldValue::Float(f) => query.bind(*f),
        FieldValue::Text(s) => query.bind(s.clone()),
        FieldValue::Bytes(b) => query.bind(b.clone()),
        FieldValue::Json(v) => query.bind(v.to_string().into_bytes()),
    }
}

pub fn pg_row_to_item(row: &PgRow) -> Item {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), pg_cell(row, col.ordinal(), col.type_info().name())))
        .collect()
}

fn pg_cell(row: &PgRow, i: usize, type_name: &str) -> FieldValue {
    let decoded = match type_name {
        "INT2" => row.try_get::<Option<i16>, _>(i).map(|v| v.map(|n| FieldValue::Int(n.into()))),
        "INT4" => row.try_get::<Option<i32>, _>(i).map(|v| v.map(|n| FieldValue::Int(n.into()))),
        "INT8" => row.try_get::<Option<i64>, _>(i).map(|v| v.map(FieldValue::Int)),
        "FLOAT4" => row.try_get::<Option<f32>, _>(i).map(|v| v.map(|n| FieldValue::Float(n.into()))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(i).map(|v| v.map(FieldValue::Float)),
        "BOOL" => row.try_get::<Option<bool>, _>(i).map(|v| v.map(FieldValue::Bool)),
        "JSON" | "JSONB" => row.try_get::<Option<serde_json::Value>, _>(i).map(|v| v.map(FieldValue::Json)),
        "BYTEA" => row.try_get::<Option<Vec<u8>>, _>(i).map(|v| v.map(FieldValue::Bytes)),
        _ => row.try_get::<Option<String>, _>(i).map(|v| v.map(FieldValue::Text)),
    };
    match decoded {
        Ok(Some(v)) => v,
        Ok(None) => FieldValue::Null,
        Err(e) => {
            tracing::warn!(column = i, type_name, error = %e, "undecodable column");
            FieldValue::Null
        }
    }
}

pub fn sqlite_row_to_item(row: &SqliteRow) -> Item {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), sqlite_cell(row, col.ordinal())))
        .collect()
}

fn sqlite_cell(row: &SqliteRow, i: usize) -> FieldValue {
    // Storage class of the value itself; declared column types are advisory in SQLite.
    let type_name = match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => return FieldValue::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return FieldValue::Null,
    };
    let decoded = match type_name.as_str() {
        "INTEGER" => row.try_get::<i64, _>(i).map(FieldValue::Int),
        "REAL" => row.try_get::<f64, _>(i).map(FieldValue::Float),
        "BLOB" => row.try_get::<Vec<u8>, _>(i).map(FieldValue::Bytes),
        _ => row.try_get::<String, _>(i).map(FieldValue::Text),
    };
    decoded.unwrap_or_else(|e| {
        tracing::warn!(column = i, type_name = %type_name, error = %e, "undecodable column");
        FieldValue::Null
    })
}

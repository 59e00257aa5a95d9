//! SQL dialects and the per-dialect mapping from field types to column types.

use crate::blueprint::FieldType;
use crate::error::AppError;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite3,
    Postgresql,
}

/// What a field type becomes on the owning table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Column(&'static str),
    /// No column: the relation lives in a junction table.
    Reference,
}

type TypeTable = &'static [(FieldType, SqlType)];

const SQLITE3_TYPES: TypeTable = &[
    (FieldType::Id, SqlType::Column("INTEGER PRIMARY KEY AUTOINCREMENT")),
    (FieldType::Uuid, SqlType::Column("TEXT")),
    (FieldType::String, SqlType::Column("TEXT")),
    (FieldType::Boolean, SqlType::Column("INTEGER")),
    (FieldType::Int, SqlType::Column("INTEGER")),
    (FieldType::Array, SqlType::Column("BLOB")),
    (FieldType::Object, SqlType::Column("BLOB")),
    (FieldType::Reference, SqlType::Reference),
];

const POSTGRESQL_TYPES: TypeTable = &[
    (FieldType::Id, SqlType::Column("BIGSERIAL PRIMARY KEY")),
    (FieldType::Uuid, SqlType::Column("CHARACTER(36)")),
    (FieldType::String, SqlType::Column("TEXT")),
    (FieldType::Boolean, SqlType::Column("BOOLEAN")),
    (FieldType::Int, SqlType::Column("BIGINT")),
    (FieldType::Array, SqlType::Column("JSONB")),
    (FieldType::Object, SqlType::Column("JSONB")),
    (FieldType::Reference, SqlType::Reference),
];

/// Postgres parameter casts, so text and NULL bind into typed columns.
const POSTGRESQL_CASTS: &[(FieldType, &str)] = &[
    (FieldType::Id, "BIGINT"),
    (FieldType::Uuid, "CHARACTER(36)"),
    (FieldType::String, "TEXT"),
    (FieldType::Boolean, "BOOLEAN"),
    (FieldType::Int, "BIGINT"),
    (FieldType::Array, "JSONB"),
    (FieldType::Object, "JSONB"),
];

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite3 => "sqlite3",
            Dialect::Postgresql => "postgresql",
        }
    }

    fn type_table(&self) -> TypeTable {
        match self {
            Dialect::Sqlite3 => SQLITE3_TYPES,
            Dialect::Postgresql => POSTGRESQL_TYPES,
        }
    }

    pub fn map_type(&self, field_type: FieldType) -> Result<SqlType, AppError> {
        self.type_table()
            .iter()
            .find(|(t, _)| *t == field_type)
            .map(|(_, sql)| *sql)
            .ok_or_else(|| AppError::UnsupportedType {
                field_type: field_type.to_string(),
                dialect: self.to_string(),
            })
    }

    /// Surrogate key column of a junction table.
    pub fn junction_id_type(&self) -> &'static str {
        match self {
            Dialect::Sqlite3 => "INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgresql => "BIGSERIAL NOT NULL PRIMARY KEY",
        }
    }

    /// Column type of a foreign key pointing at an `id` column.
    pub fn foreign_key_type(&self) -> &'static str {
        match self {
            Dialect::Sqlite3 => "INTEGER",
            Dialect::Postgresql => "BIGINT",
        }
    }

    /// Placeholder for the `n`th (1-based) parameter bound to a column of `field_type`.
    pub fn placeholder(&self, n: usize, field_type: FieldType) -> String {
        match self {
            Dialect::Sqlite3 => format!("?{}", n),
            Dialect::Postgresql => match POSTGRESQL_CASTS.iter().find(|(t, _)| *t == field_type) {
                Some((_, cast)) => format!("${}::{}", n, cast),
                None => format!("${}", n),
            },
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite3" | "sqlite" => Ok(Dialect::Sqlite3),
            "postgresql" | "postgres" => Ok(Dialect::Postgresql),
            other => Err(format!("unknown database type '{}'", other)),
        }
    }
}

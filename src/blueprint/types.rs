//! Blueprint types matching the JSON definition format.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const KEY_ID: &str = "id";
pub const KEY_UUID: &str = "uuid";
pub const KEY_COLLECTION: &str = "collection";
pub const KEY_UPDATED_AT: &str = "updated_at";
pub const KEY_TITLE: &str = "title";

/// Names of the fields every blueprint starts with, in column order.
pub const SYSTEM_FIELDS: [&str; 5] = [KEY_ID, KEY_UUID, KEY_COLLECTION, KEY_UPDATED_AT, KEY_TITLE];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Id,
    Uuid,
    String,
    Boolean,
    Int,
    Array,
    Object,
    Reference,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::Id,
        FieldType::Uuid,
        FieldType::String,
        FieldType::Boolean,
        FieldType::Int,
        FieldType::Array,
        FieldType::Object,
        FieldType::Reference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Id => "id",
            FieldType::Uuid => "uuid",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Int => "int",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Reference => "reference",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub collection: String,
    /// -1 means unbounded.
    #[serde(default = "unbounded")]
    pub max_references: i64,
}

fn unbounded() -> i64 {
    -1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Used verbatim as the SQL column name.
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default)]
    pub required: bool,
    /// UI-only.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
}

impl Field {
    fn system(name: &str, display_name: &str, type_: FieldType, hidden: bool) -> Self {
        Field {
            name: name.to_string(),
            display_name: display_name.to_string(),
            type_,
            required: true,
            hidden,
            reference: None,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.type_ == FieldType::Reference
    }
}

/// The fixed system fields prepended to every blueprint.
pub fn system_fields() -> Vec<Field> {
    vec![
        Field::system(KEY_ID, "ID", FieldType::Id, true),
        Field::system(KEY_UUID, "UUID", FieldType::Uuid, true),
        Field::system(KEY_COLLECTION, "Collection", FieldType::String, true),
        Field::system(KEY_UPDATED_AT, "Updated at", FieldType::Int, true),
        Field::system(KEY_TITLE, "Title", FieldType::String, false),
    ]
}

/// A vetted content-type definition. Only produced by the loader, so
/// `collection_name` and every field name are identifier-safe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub collection_name: String,
    #[serde(default)]
    pub collection_display_name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Blueprint {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that are stored as columns on the collection table.
    pub fn column_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_reference())
    }

    pub fn reference_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_reference())
    }
}

//! Items: one row of a collection as an untyped field map.

use crate::blueprint::{Blueprint, FieldType, KEY_COLLECTION, KEY_ID, KEY_UUID};
use crate::collection::Collection;
use crate::error::AppError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single stored value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Array and object fields.
    Json(Value),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::Number((*n).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            FieldValue::Json(v) => v.clone(),
        }
    }

    /// Convert loosely typed input into the representation `field_type` stores.
    pub fn coerce(self, field_type: FieldType) -> Result<FieldValue, String> {
        use FieldValue::*;
        Ok(match (field_type, self) {
            (_, Null) => Null,
            (FieldType::Id | FieldType::Int, Int(n)) => Int(n),
            (FieldType::Id | FieldType::Int, Float(f)) if f.fract() == 0.0 => Int(f as i64),
            (FieldType::Id | FieldType::Int, Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    Null
                } else {
                    Int(s.parse().map_err(|_| format!("'{}' is not an integer", s))?)
                }
            }
            (FieldType::Boolean, Bool(b)) => Bool(b),
            (FieldType::Boolean, Int(n)) => Bool(n != 0),
            (FieldType::Boolean, Text(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "on" | "1" | "yes" => Bool(true),
                "false" | "off" | "0" | "no" | "" => Bool(false),
                other => return Err(format!("'{}' is not a boolean", other)),
            },
            (FieldType::String | FieldType::Uuid, Text(s)) => Text(s),
            (FieldType::String, Int(n)) => Text(n.to_string()),
            (FieldType::String, Bool(b)) => Text(b.to_string()),
            (FieldType::Array, Json(v @ Value::Array(_))) => Json(v),
            (FieldType::Object, Json(v @ Value::Object(_))) => Json(v),
            (FieldType::Array | FieldType::Object, Text(s)) if s.trim().is_empty() => Null,
            (FieldType::Array | FieldType::Object, Text(s)) => {
                let v: Value = serde_json::from_str(&s).map_err(|e| format!("invalid JSON: {}", e))?;
                return Json(v).coerce(field_type);
            }
            (FieldType::Array | FieldType::Object, Bytes(b)) => {
                let v: Value = serde_json::from_slice(&b).map_err(|e| format!("invalid JSON: {}", e))?;
                return Json(v).coerce(field_type);
            }
            (t, other) => return Err(format!("{:?} cannot be stored as {}", other, t)),
        })
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            Value::String(s) => FieldValue::Text(s),
            v @ (Value::Array(_) | Value::Object(_)) => FieldValue::Json(v),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Value::deserialize(deserializer)?.into())
    }
}

/// Field name to value. Keys not present in the blueprint are ignored by the repository.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(BTreeMap<String, FieldValue>);

impl Item {
    /// A fresh item for `collection` carrying a random uuid.
    pub fn new(collection: &Collection) -> Self {
        let mut item = Item::default();
        item.insert(KEY_UUID, uuid::Uuid::new_v4().to_string());
        item.insert(KEY_COLLECTION, collection.name());
        item
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn id(&self) -> Option<i64> {
        self.get(KEY_ID).and_then(FieldValue::as_i64)
    }

    /// Convert every value whose key is a blueprint field into that field's type.
    pub fn coerce(&mut self, blueprint: &Blueprint) -> Result<(), AppError> {
        for field in blueprint.column_fields() {
            if let Some(value) = self.0.remove(&field.name) {
                let coerced = value
                    .coerce(field.type_)
                    .map_err(|e| AppError::BadRequest(format!("{}: {}", field.name, e)))?;
                self.0.insert(field.name.clone(), coerced);
            }
        }
        Ok(())
    }

    /// Undo storage encodings after a read: integer booleans and JSON blobs.
    pub(crate) fn normalize(&mut self, blueprint: &Blueprint) {
        for field in blueprint.column_fields() {
            let Some(value) = self.0.get_mut(&field.name) else { continue };
            let replacement = match (field.type_, &*value) {
                (FieldType::Boolean, FieldValue::Int(n)) => Some(FieldValue::Bool(*n != 0)),
                (FieldType::Array | FieldType::Object, FieldValue::Bytes(b)) => {
                    serde_json::from_slice::<Value>(b).ok().map(FieldValue::Json)
                }
                (FieldType::Array | FieldType::Object, FieldValue::Text(s)) => {
                    serde_json::from_str::<Value>(s).ok().map(FieldValue::Json)
                }
                _ => None,
            };
            if let Some(replacement) = replacement {
                *value = replacement;
            }
        }
    }
}

impl FromIterator<(String, FieldValue)> for Item {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Item(iter.into_iter().collect())
    }
}

impl IntoIterator for Item {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::parse;
    use serde_json::json;

    fn blueprint() -> Blueprint {
        parse(
            "pages",
            r#"{"collection_name":"pages","fields":[
                {"name":"views","type":"int"},
                {"name":"published","type":"boolean"},
                {"name":"tags","type":"array"},
                {"name":"meta","type":"object"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn new_item_has_uuid_and_collection() {
        let col = Collection::new(blueprint());
        let a = Item::new(&col);
        let b = Item::new(&col);
        assert_eq!(a.get(KEY_COLLECTION), Some(&FieldValue::Text("pages".into())));
        let uuid = a.get(KEY_UUID).and_then(FieldValue::as_str).unwrap();
        assert_eq!(uuid.len(), 36);
        assert_ne!(a.get(KEY_UUID), b.get(KEY_UUID));
        assert!(!a.contains_key(KEY_ID));
    }

    #[test]
    fn coerces_form_input() {
        let mut item: Item = serde_json::from_value(json!({
            "views": "42",
            "published": "on",
            "tags": "[\"a\",\"b\"]",
            "meta": {"k": 1},
            "extra": "left alone"
        }))
        .unwrap();
        item.coerce(&blueprint()).unwrap();
        assert_eq!(item.get("views"), Some(&FieldValue::Int(42)));
        assert_eq!(item.get("published"), Some(&FieldValue::Bool(true)));
        assert_eq!(item.get("tags"), Some(&FieldValue::Json(json!(["a", "b"]))));
        assert_eq!(item.get("meta"), Some(&FieldValue::Json(json!({"k": 1}))));
        assert_eq!(item.get("extra"), Some(&FieldValue::Text("left alone".into())));
    }

    #[test]
    fn rejects_mismatched_input() {
        let mut item: Item = serde_json::from_value(json!({"views": "many"})).unwrap();
        assert!(matches!(item.coerce(&blueprint()), Err(AppError::BadRequest(_))));

        let mut item: Item = serde_json::from_value(json!({"tags": {"not": "an array"}})).unwrap();
        assert!(matches!(item.coerce(&blueprint()), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn normalizes_sqlite_storage() {
        let mut item: Item = [
            ("published".to_string(), FieldValue::Int(1)),
            ("tags".to_string(), FieldValue::Bytes(b"[1,2]".to_vec())),
            ("views".to_string(), FieldValue::Int(7)),
        ]
        .into_iter()
        .collect();
        item.normalize(&blueprint());
        assert_eq!(item.get("published"), Some(&FieldValue::Bool(true)));
        assert_eq!(item.get("tags"), Some(&FieldValue::Json(json!([1, 2]))));
        assert_eq!(item.get("views"), Some(&FieldValue::Int(7)));
    }

    #[test]
    fn serializes_as_plain_json() {
        let mut item = Item::default();
        item.insert("title", "Hello");
        item.insert("views", 3i64);
        item.insert("gone", FieldValue::Null);
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"title": "Hello", "views": 3, "gone": null})
        );
    }
}

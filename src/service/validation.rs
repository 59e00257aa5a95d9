//! Request validation against blueprint field rules.

use crate::blueprint::{Blueprint, FieldType, KEY_ID, KEY_UPDATED_AT};
use crate::error::AppError;
use crate::item::{FieldValue, Item};

pub struct RequestValidator;

impl RequestValidator {
    /// All required column fields must be present and non-empty, except `id`
    /// and `updated_at`, which are assigned on write.
    pub fn validate(blueprint: &Blueprint, item: &Item) -> Result<(), AppError> {
        for field in blueprint.column_fields() {
            if !field.required || field.name == KEY_ID || field.name == KEY_UPDATED_AT {
                continue;
            }
            let missing = match item.get(&field.name) {
                None | Some(FieldValue::Null) => true,
                Some(FieldValue::Text(s)) => field.type_ == FieldType::String && s.trim().is_empty(),
                Some(_) => false,
            };
            if missing {
                return Err(AppError::BadRequest(format!("{} is required", field.name)));
            }
        }
        Ok(())
    }
}

//! The one place identifiers enter SQL text.

use crate::blueprint::is_safe_identifier;
use crate::error::{AppError, BlueprintError};

/// Quote an identifier for interpolation. Rejects anything outside the safe
/// alphabet instead of escaping it.
pub fn quote(name: &str) -> Result<String, AppError> {
    if !is_safe_identifier(name) {
        return Err(BlueprintError::InvalidIdentifier {
            field: "identifier".into(),
            value: name.to_string(),
        }
        .into());
    }
    Ok(format!("\"{}\"", name))
}

/// Foreign-key column a junction table uses for `collection`.
pub fn foreign_key_column(collection: &str) -> Result<String, AppError> {
    quote(&format!("{}_id", collection))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_safe_names() {
        assert_eq!(quote("blog-posts").unwrap(), "\"blog-posts\"");
        assert_eq!(foreign_key_column("authors").unwrap(), "\"authors_id\"");
    }

    #[test]
    fn refuses_unsafe_names() {
        for bad in ["", "a\"b", "x; DROP TABLE y", "a b", "t.c"] {
            assert!(matches!(
                quote(bad),
                Err(AppError::Blueprint(BlueprintError::InvalidIdentifier { .. }))
            ));
        }
    }
}

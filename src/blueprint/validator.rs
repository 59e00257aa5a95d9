//! Blueprint validation: identifier safety and structural consistency.

use crate::blueprint::{Blueprint, FieldType, SYSTEM_FIELDS};
use crate::error::BlueprintError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Names are interpolated into SQL text, so only this alphabet is accepted.
pub const IDENTIFIER_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

fn identifier_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| match Regex::new(IDENTIFIER_PATTERN) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(error = %e, "identifier pattern does not compile; rejecting all names");
            None
        }
    })
    .as_ref()
}

/// False for every name if the pattern could not be compiled.
pub fn is_safe_identifier(name: &str) -> bool {
    identifier_regex().is_some_and(|re| re.is_match(name))
}

/// Fails with `InvalidIdentifier` naming `what` when `value` is not identifier-safe.
pub fn check_identifier(what: &str, value: &str) -> Result<(), BlueprintError> {
    if is_safe_identifier(value) {
        Ok(())
    } else {
        Err(BlueprintError::InvalidIdentifier {
            field: what.to_string(),
            value: value.to_string(),
        })
    }
}

/// Validate a blueprint whose system fields have already been prepended.
pub fn validate(blueprint: &Blueprint) -> Result<(), BlueprintError> {
    let name = blueprint.collection_name.as_str();
    check_identifier("collection_name", name)?;
    for (i, field) in blueprint.fields.iter().enumerate() {
        check_identifier(&format!("fields[{}].name", i), &field.name)?;
        if let Some(reference) = &field.reference {
            check_identifier(&format!("fields[{}].reference.collection", i), &reference.collection)?;
        }
    }

    let malformed = |reason: String| BlueprintError::MalformedDefinition {
        name: name.to_string(),
        reason,
    };

    let leading: Vec<&str> = blueprint.fields.iter().take(SYSTEM_FIELDS.len()).map(|f| f.name.as_str()).collect();
    if leading != SYSTEM_FIELDS {
        return Err(malformed(format!("system fields must lead in order {:?}", SYSTEM_FIELDS)));
    }

    let mut seen = HashSet::new();
    let mut id_fields = 0;
    for field in &blueprint.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(malformed(format!("duplicate field '{}'", field.name)));
        }
        match field.type_ {
            FieldType::Id => id_fields += 1,
            FieldType::Reference => {
                let Some(reference) = &field.reference else {
                    return Err(malformed(format!("reference field '{}' has no target", field.name)));
                };
                if reference.collection == name {
                    return Err(malformed(format!("field '{}' references its own collection", field.name)));
                }
            }
            _ => {}
        }
    }
    if id_fields != 1 {
        return Err(malformed(format!("expected exactly one id field, found {}", id_fields)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{system_fields, Field, Reference};

    #[test]
    fn identifier_pattern_compiles() {
        assert!(identifier_regex().is_some());
        assert!(is_safe_identifier("blog-posts_2"));
    }

    fn blueprint_with(extra: Vec<Field>) -> Blueprint {
        let mut fields = system_fields();
        fields.extend(extra);
        Blueprint {
            collection_name: "pages".into(),
            collection_display_name: "Pages".into(),
            fields,
        }
    }

    fn field(name: &str, type_: FieldType) -> Field {
        Field {
            name: name.into(),
            display_name: name.into(),
            type_,
            required: false,
            hidden: false,
            reference: None,
        }
    }

    #[test]
    fn identifier_pattern() {
        assert!(is_safe_identifier("blog_posts"));
        assert!(is_safe_identifier("blog-posts2"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("a;DROP"));
        assert!(!is_safe_identifier("a b"));
        assert!(!is_safe_identifier("name\""));
        assert!(!is_safe_identifier("../etc"));
    }

    #[test]
    fn accepts_plain_blueprint() {
        validate(&blueprint_with(vec![field("body", FieldType::String)])).unwrap();
    }

    #[test]
    fn rejects_unsafe_field_name() {
        let err = validate(&blueprint_with(vec![field("a;DROP", FieldType::String)])).unwrap_err();
        match err {
            BlueprintError::InvalidIdentifier { field, value } => {
                assert_eq!(field, "fields[5].name");
                assert_eq!(value, "a;DROP");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_unsafe_reference_target() {
        let mut f = field("owner", FieldType::Reference);
        f.reference = Some(Reference {
            collection: "users; --".into(),
            max_references: 1,
        });
        let err = validate(&blueprint_with(vec![f])).unwrap_err();
        assert!(matches!(err, BlueprintError::InvalidIdentifier { .. }));
    }

    #[test]
    fn rejects_shadowed_system_field() {
        let err = validate(&blueprint_with(vec![field("title", FieldType::String)])).unwrap_err();
        assert!(matches!(err, BlueprintError::MalformedDefinition { .. }));
    }

    #[test]
    fn rejects_second_id_field() {
        let err = validate(&blueprint_with(vec![field("other_id", FieldType::Id)])).unwrap_err();
        assert!(matches!(err, BlueprintError::MalformedDefinition { .. }));
    }

    #[test]
    fn rejects_reference_without_target_or_to_self() {
        let err = validate(&blueprint_with(vec![field("owner", FieldType::Reference)])).unwrap_err();
        assert!(matches!(err, BlueprintError::MalformedDefinition { .. }));

        let mut f = field("parent", FieldType::Reference);
        f.reference = Some(Reference {
            collection: "pages".into(),
            max_references: -1,
        });
        let err = validate(&blueprint_with(vec![f])).unwrap_err();
        assert!(matches!(err, BlueprintError::MalformedDefinition { .. }));
    }
}

//! Definition validation
//!
//! Structural checks applied before a template is diffed or applied.
//! A definition that fails here is rejected outright; validation errors
//! are never retried.

use crate::definition::{ClassDefinition, PropertyDefinition};
use crate::error::{Error, Result};
use crate::normalize::normalize_name;
use crate::template::ParsedTemplate;

/// Maximum entity name length accepted by the backing store
pub const MAX_NAME_LEN: usize = 255;

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::NameTooLong {
            len: name.chars().count(),
            max: MAX_NAME_LEN,
        });
    }
    if name.chars().any(char::is_control) {
        return Err(Error::InvalidNameCharacters {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Validate a single property definition
pub fn validate_property(def: &PropertyDefinition) -> Result<()> {
    validate_name(&def.name)?;
    for class in &def.classes {
        if class.trim().is_empty() {
            return Err(Error::EmptyPropertyReference {
                class: def.name.clone(),
            });
        }
    }
    Ok(())
}

/// Validate a single class definition
///
/// Rejects self-parenting: a class whose `parent` normalizes to its own
/// name would create a trivial inheritance cycle.
pub fn validate_class(def: &ClassDefinition) -> Result<()> {
    validate_name(&def.name)?;
    if let Some(parent) = &def.parent
        && normalize_name(parent) == normalize_name(&def.name)
    {
        return Err(Error::SelfParent {
            name: def.name.clone(),
        });
    }
    for prop in &def.properties {
        if prop.trim().is_empty() {
            return Err(Error::EmptyPropertyReference {
                class: def.name.clone(),
            });
        }
    }
    Ok(())
}

/// Validate every definition in a template, returning the first failure
pub fn validate_template(template: &ParsedTemplate) -> Result<()> {
    for prop in &template.properties {
        validate_property(prop)?;
    }
    for class in &template.classes {
        validate_class(class)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PropertyType;

    #[test]
    fn accepts_plain_definitions() {
        let prop = PropertyDefinition::new("Email", PropertyType::Text);
        assert!(validate_property(&prop).is_ok());

        let class = ClassDefinition::new("Person");
        assert!(validate_class(&class).is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        let prop = PropertyDefinition::new("   ", PropertyType::Text);
        assert_eq!(validate_property(&prop), Err(Error::EmptyName));
    }

    #[test]
    fn rejects_overlong_name() {
        let prop = PropertyDefinition::new("x".repeat(256), PropertyType::Text);
        assert!(matches!(
            validate_property(&prop),
            Err(Error::NameTooLong { len: 256, .. })
        ));
    }

    #[test]
    fn rejects_control_characters() {
        let prop = PropertyDefinition::new("bad\u{0}name", PropertyType::Text);
        assert!(matches!(
            validate_property(&prop),
            Err(Error::InvalidNameCharacters { .. })
        ));
    }

    #[test]
    fn rejects_self_parent_even_across_spellings() {
        let mut class = ClassDefinition::new("Person");
        class.parent = Some("PERSON".to_string());
        assert!(matches!(validate_class(&class), Err(Error::SelfParent { .. })));
    }

    #[test]
    fn rejects_empty_property_reference() {
        let mut class = ClassDefinition::new("Person");
        class.properties = vec!["email".to_string(), " ".to_string()];
        assert!(matches!(
            validate_class(&class),
            Err(Error::EmptyPropertyReference { .. })
        ));
    }

    #[test]
    fn template_validation_walks_everything() {
        let mut class = ClassDefinition::new("Person");
        class.parent = Some("person".to_string());
        let template = ParsedTemplate {
            properties: vec![PropertyDefinition::new("Email", PropertyType::Text)],
            classes: vec![class],
        };
        assert!(matches!(
            validate_template(&template),
            Err(Error::SelfParent { .. })
        ));
    }
}

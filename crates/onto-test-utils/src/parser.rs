//! JSON-backed template parser fake

use onto_backend::{Error, Result, TemplateParser};
use onto_model::{ParsedTemplate, validate_template};

/// Parser that reads templates from plain JSON documents
///
/// The real document format is owned by an external collaborator; tests
/// feed JSON because [`ParsedTemplate`] already derives serde.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParser;

impl TemplateParser for JsonParser {
    fn parse(&self, raw: &str) -> Result<ParsedTemplate> {
        serde_json::from_str(raw).map_err(|e| Error::parse(e.to_string()))
    }

    fn validate(&self, template: &ParsedTemplate) -> Result<()> {
        validate_template(template)?;
        Ok(())
    }
}

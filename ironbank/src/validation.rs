use crate::fields::{Credentials, FieldKind, FieldSchema};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

pub const MISSING_FIELD: &str = "':title' needs to be provided.";
pub const INVALID_VALUE: &str = "Invalid value for ':title'.";
pub const CONFIRMATION_REQUIRED: &str = "Need to confirm ':title'.";

/// One problem with one field. The message stays a template so it can be translated
/// before the arguments are substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub message: &'static str,
    pub args: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(message: &'static str, title: &str) -> ValidationError {
        let mut args = BTreeMap::new();
        args.insert(String::from(":title"), title.to_string());
        ValidationError { message, args }
    }

    /// Substitutes the named arguments into the (untranslated) template.
    pub fn render(&self) -> String {
        self.render_with(self.message)
    }

    /// Substitutes the named arguments into an already translated template.
    pub fn render_with(&self, template: &str) -> String {
        self.args.iter()
            .fold(template.to_string(), |text, (name, value)| text.replace(name.as_str(), value))
    }
}

/// Errors grouped by field key, in the order the fields were checked.
/// Empty means every field validated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: Vec<(String, Vec<ValidationError>)>,
}

impl ValidationErrors {
    pub fn push(&mut self, key: &str, error: ValidationError) {
        match self.errors.iter_mut().find(|(k, _)| k == key) {
            Some((_, list)) => list.push(error),
            None => self.errors.push((key.to_string(), vec![error])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[ValidationError]> {
        self.errors.iter().find(|(k, _)| k == key).map(|(_, list)| list.as_slice())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.errors.iter().any(|(k, _)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item=(&str, &[ValidationError])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (key, list) in &self.errors {
            map.serialize_entry(key, list)?;
        }
        map.end()
    }
}

/// Checks supplied credentials against a field schema.
///
/// A missing field gets exactly one error and nothing else is checked for it.
/// Otherwise the pattern and the confirmation checks both run and may both report.
pub fn check_fields(schema: &FieldSchema, values: &Credentials) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    for (key, field) in schema.iter() {
        let title = field.title();
        let value = match values.get(key) {
            None => {
                errors.push(key, ValidationError::new(MISSING_FIELD, title));
                continue;
            }
            Some(value) => value,
        };

        if let Some(pattern) = field.pattern() {
            if !pattern.is_match(value.as_text()) {
                errors.push(key, ValidationError::new(INVALID_VALUE, title));
            }
        }

        if field.kind() == FieldKind::Confirm && !value.is_truthy() {
            errors.push(key, ValidationError::new(CONFIRMATION_REQUIRED, title));
        }
    }

    errors
}

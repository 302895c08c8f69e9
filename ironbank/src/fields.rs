use crate::errors::IronbankError;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// How a credential-entry UI should render a field, and which extra check applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    #[default]
    Text,
    /// A checkbox the user must tick, e.g. "I understand this key can trade".
    Confirm,
}

impl FieldKind {
    fn type_tag(&self) -> Option<&'static str> {
        match self {
            FieldKind::Text => None,
            FieldKind::Confirm => Some("confirm"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    title: String,
    pattern: Option<Regex>,
    kind: FieldKind,
}

impl FieldDescriptor {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

impl Serialize for FieldDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("title", &self.title)?;
        if let Some(pattern) = &self.pattern {
            map.serialize_entry("pattern", pattern.as_str())?;
        }
        if let Some(tag) = self.kind.type_tag() {
            map.serialize_entry("type", tag)?;
        }
        map.end()
    }
}


/// Credential fields an account type needs, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: Vec<(String, FieldDescriptor)>,
}

impl FieldSchema {
    pub fn builder() -> FieldSchemaBuilder {
        FieldSchemaBuilder::default()
    }

    pub fn empty() -> FieldSchema {
        FieldSchema::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, field)| field)
    }

    pub fn iter(&self) -> impl Iterator<Item=(&str, &FieldDescriptor)> {
        self.fields.iter().map(|(k, field)| (k.as_str(), field))
    }

    pub fn keys(&self) -> impl Iterator<Item=&str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FieldSchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, field) in &self.fields {
            map.serialize_entry(key, field)?;
        }
        map.end()
    }
}


struct PendingField {
    key: String,
    title: String,
    pattern: Option<String>,
    kind: FieldKind,
}

/// Collects field declarations; problems surface once, in [`FieldSchemaBuilder::build`].
#[derive(Default)]
pub struct FieldSchemaBuilder {
    pending: Vec<PendingField>,
}

impl FieldSchemaBuilder {
    pub fn text(self, key: &str, title: &str) -> FieldSchemaBuilder {
        self.push(key, title, None, FieldKind::Text)
    }

    pub fn pattern(self, key: &str, title: &str, pattern: &str) -> FieldSchemaBuilder {
        self.push(key, title, Some(pattern), FieldKind::Text)
    }

    pub fn confirm(self, key: &str, title: &str) -> FieldSchemaBuilder {
        self.push(key, title, None, FieldKind::Confirm)
    }

    pub fn field(self, key: &str, title: &str, pattern: Option<&str>, kind: FieldKind) -> FieldSchemaBuilder {
        self.push(key, title, pattern, kind)
    }

    fn push(mut self, key: &str, title: &str, pattern: Option<&str>, kind: FieldKind) -> FieldSchemaBuilder {
        self.pending.push(PendingField {
            key: key.to_string(),
            title: title.to_string(),
            pattern: pattern.map(String::from),
            kind,
        });
        self
    }

    pub fn build(self) -> Result<FieldSchema, IronbankError> {
        let mut fields: Vec<(String, FieldDescriptor)> = Vec::with_capacity(self.pending.len());
        for field in self.pending {
            if field.key.is_empty() {
                return Err(invalid(&field.key, "key must not be empty"));
            }
            if field.title.trim().is_empty() {
                return Err(invalid(&field.key, "title must not be empty"));
            }
            if fields.iter().any(|(k, _)| k == &field.key) {
                return Err(invalid(&field.key, "declared twice"));
            }
            let pattern = match field.pattern {
                None => None,
                Some(p) => Some(Regex::new(&p).map_err(|e| invalid(&field.key, &e.to_string()))?),
            };
            fields.push((field.key, FieldDescriptor {
                title: field.title,
                pattern,
                kind: field.kind,
            }));
        }
        Ok(FieldSchema { fields })
    }
}

fn invalid(key: &str, reason: &str) -> IronbankError {
    IronbankError::InvalidField {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}


/// A single supplied credential value: form input arrives as text, confirmations as booleans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    /// `false`, `""` and `"0"` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => !(s.is_empty() || s == "0"),
        }
    }

    /// Text form used for pattern matching; booleans render as "1" and "".
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Bool(true) => "1",
            FieldValue::Bool(false) => "",
            FieldValue::Text(s) => s,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}


/// Caller-owned credential values keyed by field key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Credentials {
    values: BTreeMap<String, FieldValue>,
}

impl<'de> Deserialize<'de> for Credentials {
    /// A `null` value counts as not supplied.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: BTreeMap<String, Option<FieldValue>> = Deserialize::deserialize(deserializer)?;
        Ok(Credentials {
            values: raw.into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v)))
                .collect(),
        })
    }
}

impl Credentials {
    pub fn new() -> Credentials {
        Credentials::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Credentials {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.values.insert(key.to_string(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Text of a field, if supplied.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(FieldValue::as_text)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=(&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Credentials {
    fn from_iter<T: IntoIterator<Item=(K, V)>>(iter: T) -> Self {
        Credentials {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

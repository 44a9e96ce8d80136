//! Cassette document model
//!
//! Only the fields the tooling reads are typed; everything else is carried
//! through untouched in the `extra` maps so a rewrite does not lose data.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Header map as recorded: name -> list of values (a bare scalar is accepted)
pub type RecordedHeaders = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cassette {
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub request: RecordedRequest,
    pub response: RecordedResponse,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub headers: RecordedHeaders,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub headers: RecordedHeaders,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A key that is present is `Some`, even when its value is `null`
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Body text, recorded either as `{string: ...}` or as a plain string
fn body_text(body: Option<&Value>) -> Option<String> {
    match body? {
        Value::String(s) => Some(s.clone()),
        Value::Mapping(map) => map.get("string").and_then(scalar_to_string),
        _ => None,
    }
}

impl Cassette {
    pub fn from_interactions(interactions: Vec<Interaction>) -> Self {
        let mut extra = BTreeMap::new();
        extra.insert("version".to_string(), Value::from(1));
        Self { interactions, extra }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid cassette YAML")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize cassette")
    }
}

impl Interaction {
    /// Interaction without bodies
    pub fn new(method: &str, uri: &str, code: u16) -> Self {
        Self {
            request: RecordedRequest {
                method: Some(method.to_string()),
                uri: Some(uri.to_string()),
                ..Default::default()
            },
            response: RecordedResponse {
                status: ResponseStatus {
                    code: Some(code),
                    message: None,
                },
                ..Default::default()
            },
            extra: BTreeMap::new(),
        }
    }
}

/// All values of a header, matching the name case-insensitively
fn header_values(headers: &RecordedHeaders, name: &str) -> Vec<String> {
    headers
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .flat_map(|(_, value)| values_of(value))
        .collect()
}

fn values_of(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl RecordedRequest {
    pub fn is_method(&self, method: &str) -> bool {
        self.method
            .as_deref()
            .map(|m| m.eq_ignore_ascii_case(method))
            .unwrap_or(false)
    }

    /// First recorded value of a request header
    pub fn first_header(&self, name: &str) -> Option<String> {
        header_values(&self.headers, name).into_iter().next()
    }

    pub fn body_text(&self) -> Option<String> {
        body_text(self.body.as_ref())
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(
            name.to_string(),
            Value::Sequence(vec![Value::String(value.to_string())]),
        );
    }
}

impl RecordedResponse {
    pub fn code(&self) -> Option<u16> {
        self.status.code
    }

    /// Every header as (name, value) pairs, one pair per recorded value
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .flat_map(|(name, value)| {
                values_of(value)
                    .into_iter()
                    .map(move |v| (name.clone(), v))
            })
            .collect()
    }

    pub fn body_text(&self) -> Option<String> {
        body_text(self.body.as_ref())
    }
}

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw path and the HTML to store under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInput {
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub content: String,
}

impl PageInput {
    pub fn new(path: &str, content: &str) -> Self {
        Self {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    fn from_value(value: &Value) -> Self {
        Self {
            path: string_field(value, "path"),
            content: string_field(value, "content"),
        }
    }
}

/// Body of an upsert request, decoded into one of its two shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertRequest {
    /// `{"path": .., "content": ..}`
    Single(PageInput),

    /// `{"pages": [{"path": .., "content": ..}, ..]}`
    Batch(Vec<PageInput>),
}

impl UpsertRequest {
    /// Decode a JSON body.
    ///
    /// A non-empty `path` string selects the single shape; otherwise a `pages`
    /// array selects the batch shape. Anything else is a validation failure.
    pub fn from_json(body: &Value) -> Result<Self> {
        if let Some(path) = body.get("path").and_then(Value::as_str) {
            if !path.is_empty() {
                return Ok(UpsertRequest::Single(PageInput::from_value(body)));
            }
        }

        if let Some(pages) = body.get("pages").and_then(Value::as_array) {
            return Ok(UpsertRequest::Batch(
                pages.iter().map(PageInput::from_value).collect(),
            ));
        }

        Err(Error::Validation(
            "expected a page path or a pages array".to_string(),
        ))
    }

    /// Decode a JSON body from raw bytes
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::Validation(format!("malformed request body: {}", e)))?;
        Self::from_json(&value)
    }
}

/// Body of a delete request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub path: String,

    /// Treat `path` as a prefix pattern. Also accepted as `regex`.
    #[serde(default, alias = "regex")]
    pub pattern: bool,
}

impl DeleteRequest {
    /// Decode a JSON body; an empty body is a request for the empty path
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| Error::Validation(format!("malformed delete body: {}", e)))
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

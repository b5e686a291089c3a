use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Value;

/// A unit stored in a vector store, with its embedding once indexed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: HashMap<String, Value>,
    pub embedding: Option<Vec<f32>>,
}

/// A retrieved fragment of a grant document.
///
/// Metadata is expected to carry `filename`, `page_number`, `source` and
/// `chunk_index`, but every accessor tolerates their absence.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
}

impl Chunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.similarity_score = Some(score);
        self
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn filename(&self) -> Option<&str> {
        self.metadata_str("filename")
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata_str("source")
    }

    /// Page numbers arrive as integers from most loaders and as strings from some.
    pub fn page_number(&self) -> Option<String> {
        match self.metadata.get("page_number")? {
            Value::Number(number) => Some(number.to_string()),
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        }
    }

    pub fn chunk_index(&self) -> u64 {
        self.metadata
            .get("chunk_index")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

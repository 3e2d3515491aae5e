use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// A resume record as delivered by the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    /// Flattened text; `None` when the record had nothing readable
    #[serde(default)]
    pub text: Option<String>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()),
        }
    }

    pub fn without_text(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: None,
        }
    }

    /// Text to normalize; missing text reads as empty
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// First `max_chars` characters of the text, whitespace collapsed
    pub fn preview(&self, max_chars: usize) -> String {
        let collapsed = self.text().split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() <= max_chars {
            return collapsed;
        }

        let mut preview: String = collapsed.chars().take(max_chars).collect();
        preview.push_str("...");
        preview
    }
}

/// Identifier of a record that satisfied the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: String,
    pub matched: bool,
}

impl MatchResult {
    pub fn matched(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            matched: true,
        }
    }
}

/// Source of resume records
#[async_trait]
pub trait RecordSource: Send + Sync + Debug {
    /// Fetch every record
    async fn fetch_all(&self) -> Result<Vec<RawRecord>>;
}

/// Records held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    records: Vec<RawRecord>,
}

impl InMemoryRecordSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn fetch_all(&self) -> Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }
}

/// Records read from a JSON array file or a JSON Lines file
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    path: PathBuf,
    config: Config,
}

impl JsonRecordSource {
    pub fn with_config(path: impl AsRef<Path>, config: Config) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse file content into records
    pub fn parse(&self, content: &str) -> Result<Vec<RawRecord>> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        // A whole-document parse covers arrays and single objects; anything
        // else is treated as JSON Lines
        if let Ok(document) = serde_json::from_str::<Value>(content) {
            let values = match document {
                Value::Array(items) => items,
                other => vec![other],
            };
            return Ok(values
                .iter()
                .enumerate()
                .map(|(ordinal, value)| record_from_json(value, ordinal, &self.config))
                .collect());
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line_number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(line) {
                Ok(value) => {
                    let ordinal = records.len() + skipped;
                    records.push(record_from_json(&value, ordinal, &self.config));
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        "Skipping malformed record on line {} of {:?}: {}",
                        line_number + 1,
                        self.path,
                        e
                    );
                }
            }
        }

        if records.is_empty() && skipped > 0 {
            anyhow::bail!("No valid records found in {:?}", self.path);
        }

        Ok(records)
    }
}

#[async_trait]
impl RecordSource for JsonRecordSource {
    async fn fetch_all(&self) -> Result<Vec<RawRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read records from {:?}", self.path))?;

        let records = self.parse(&content)?;
        tracing::info!("Loaded {} records from {:?}", records.len(), self.path);
        Ok(records)
    }
}

/// Build a record from one JSON document
pub fn record_from_json(value: &Value, ordinal: usize, config: &Config) -> RawRecord {
    let Value::Object(fields) = value else {
        let text = flatten_json(value);
        return RawRecord {
            id: ordinal.to_string(),
            text: (!text.is_empty()).then_some(text),
        };
    };

    let id = fields
        .get(&config.id_field)
        .or_else(|| fields.get("id"))
        .and_then(id_to_string)
        .unwrap_or_else(|| ordinal.to_string());

    let mut parts = Vec::new();
    if config.text_fields.is_empty() {
        for (name, field) in fields {
            if config.should_index_field(name) {
                collect_strings(field, &mut parts);
            }
        }
    } else {
        // Configured field order
        for name in &config.text_fields {
            if let Some(field) = fields.get(name) {
                collect_strings(field, &mut parts);
            }
        }
    }

    let text = parts.join(" ");
    if text.trim().is_empty() {
        tracing::debug!("Record {} has no readable text", id);
    }

    RawRecord {
        id,
        text: (!text.trim().is_empty()).then_some(text),
    }
}

/// Join every string found in a JSON value, depth first
pub fn flatten_json(value: &Value) -> String {
    let mut parts = Vec::new();
    collect_strings(value, &mut parts);
    parts.join(" ")
}

fn collect_strings<'a>(value: &'a Value, parts: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => parts.push(s),
        Value::Array(items) => {
            for item in items {
                collect_strings(item, parts);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_strings(item, parts);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // Extended JSON: {"$oid": "..."}
        Value::Object(map) => map.get("$oid").and_then(id_to_string),
        _ => None,
    }
}

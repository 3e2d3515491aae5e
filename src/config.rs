use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::search::normalizer::NormalizerConfig;

/// Default record field holding the identifier (MongoDB export style)
pub const DEFAULT_ID_FIELD: &str = "_id";

/// Record count from which evaluation runs on the worker pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Field holding the record identifier
    pub id_field: String,

    /// Fields flattened into the searchable text (empty means every field but the id)
    pub text_fields: Vec<String>,

    /// Worker threads used for parallel evaluation
    pub workers: usize,

    /// Record count at which evaluation switches to the worker pool
    pub parallel_threshold: usize,

    /// Normalization switches
    pub normalizer: NormalizerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            text_fields: Vec::new(),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl Config {
    /// Load a JSON config file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {path:?}"))?;
        let config: Config =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.id_field.trim().is_empty() {
            anyhow::bail!("id_field must not be empty");
        }
        Ok(())
    }

    /// Check if a record field contributes to the searchable text
    ///
    /// The id field never does. When `text_fields` is empty every other field is used.
    pub fn should_index_field(&self, field: &str) -> bool {
        if field == self.id_field {
            return false;
        }

        if self.text_fields.is_empty() {
            return true;
        }

        self.text_fields.iter().any(|f| f == field)
    }
}

//! Generation settings loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! ```yaml
//! endpoint: https://api-inference.huggingface.co
//! model: mistralai/Mistral-7B-Instruct
//! backup_model: google/flan-t5-large
//! max_new_tokens: 1300
//! temperature: 0.75
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Parameters for the hosted text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the inference API; the model id is appended as `/models/{id}`.
    pub endpoint: String,
    /// Model tried first.
    pub model: String,
    /// Model tried when the primary one fails or answers too briefly.
    pub backup_model: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
    /// Generated text shorter than this (in characters) counts as a failure.
    pub min_chars: usize,
    /// Retry attempts per model before moving on.
    pub max_retries: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co".to_string(),
            model: "mistralai/Mistral-7B-Instruct".to_string(),
            backup_model: "google/flan-t5-large".to_string(),
            max_new_tokens: 1300,
            temperature: 0.75,
            top_p: 0.92,
            repetition_penalty: 1.1,
            min_chars: 400,
            max_retries: 2,
            timeout_secs: 120,
        }
    }
}

/// Load a [`GenerationConfig`] from `path`, or the defaults when `path` is `None`.
#[instrument(level = "info", skip_all)]
pub fn load_config(path: Option<&Path>) -> Result<GenerationConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(GenerationConfig::default());
    };
    let raw = std::fs::read_to_string(path)?;
    let config = if raw.trim().is_empty() {
        GenerationConfig::default()
    } else {
        serde_yaml::from_str(&raw)?
    };
    info!(path = %path.display(), model = %config.model, "Loaded generation config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config, GenerationConfig::default());
        assert_eq!(config.backup_model, "google/flan-t5-large");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model: tiiuae/falcon-7b-instruct\nmax_new_tokens: 700").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.model, "tiiuae/falcon-7b-instruct");
        assert_eq!(config.max_new_tokens, 700);
        assert_eq!(config.top_p, GenerationConfig::default().top_p);
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config, GenerationConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_new_tokens: [not, a, number]").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }
}

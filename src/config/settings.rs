//! Configuration settings for tubelens.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub acquisition: AcquisitionSettings,
    pub segmentation: SegmentationSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub summarization: SummarizationSettings,
    pub sentiment: SentimentSettings,
    pub record_store: RecordStoreSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (index artifacts, database).
    pub data_dir: String,
    /// Directory for temporary files (downloaded audio).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tubelens".to_string(),
            temp_dir: "/tmp/tubelens".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Preferred caption language.
    pub language: String,
    /// Whisper model for the speech-to-text fallback.
    pub whisper_model: String,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            whisper_model: "whisper-1".to_string(),
        }
    }
}

/// Segmentation (chunking) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Words per segment window.
    pub window_words: usize,
    /// Words shared between consecutive windows. Must be smaller than
    /// `window_words`.
    pub overlap_words: usize,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            window_words: 200,
            overlap_words: 40,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// LLM model for answer generation.
    pub model: String,
    /// Maximum output token budget per generation call.
    pub max_output_tokens: u32,
    /// Default number of segments retrieved per question.
    pub default_top_k: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_output_tokens: 250,
            default_top_k: 4,
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// Characters per summarization window. Character-based (not word-based)
    /// to bound the model's input budget.
    pub window_chars: usize,
    /// Lower word bound requested for each window summary.
    pub min_summary_words: u32,
    /// Token budget for each window summary.
    pub max_summary_tokens: u32,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            window_chars: 1000,
            min_summary_words: 30,
            max_summary_tokens: 130,
        }
    }
}

/// Sentiment classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentSettings {
    /// Model for sentiment classification.
    pub model: String,
    /// Only the first `prefix_chars` characters of the transcript are
    /// classified, to bound cost on long transcripts.
    pub prefix_chars: usize,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            prefix_chars: 1000,
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordStoreSettings {
    /// Path to the SQLite database.
    pub sqlite_path: String,
}

impl Default for RecordStoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.tubelens/records.db".to_string(),
        }
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8020,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Path to a TOML file overriding the default prompt templates.
    pub custom_path: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TubelensError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubelens")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Directory holding per-video index artifacts.
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir().join("index")
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.record_store.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let settings = Settings::default();
        assert!(settings.segmentation.overlap_words < settings.segmentation.window_words);
        assert_eq!(settings.generation.default_top_k, 4);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [segmentation]
            window_words = 100
            "#,
        )
        .unwrap();
        assert_eq!(settings.segmentation.window_words, 100);
        assert_eq!(settings.segmentation.overlap_words, 40);
        assert_eq!(settings.embedding.dimensions, 1536);
    }
}

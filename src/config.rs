//! Configuration for the recognizer service.

use crate::core::vocabulary::DEFAULT_LABELS;
use crate::core::window::DEFAULT_WINDOW_SIZE;
use crate::features::FeatureLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub host: String,

    /// Port to bind to (0 for random)
    pub port: u16,

    /// Frames per classification window
    pub window_size: usize,

    /// Confidence must exceed this to report a recognized word
    pub confidence_threshold: f32,

    /// Start a fresh window after each recognized word
    pub clear_on_recognized: bool,

    /// Which landmark groups make up a frame
    pub layout: FeatureLayout,

    /// Label vocabulary, in classifier output order
    pub labels: Vec<String>,

    /// Path to the classifier weights
    pub model_path: PathBuf,

    /// Directory for per-session window files (disabled when unset)
    pub sequences_dir: Option<PathBuf>,

    /// Path for storing state
    pub data_path: PathBuf,

    /// Maximum sessions held in memory
    pub max_sessions: usize,

    /// Sessions idle for longer than this are dropped
    #[serde(with = "duration_secs")]
    pub session_ttl: Duration,

    /// How often idle sessions are swept
    #[serde(with = "duration_secs")]
    pub sweep_interval: Duration,

    /// Upper bound on waiting for and running one inference
    #[serde(with = "duration_millis")]
    pub inference_timeout: Duration,

    /// Inferences allowed to run at once
    pub max_concurrent_inferences: usize,

    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qazsign");

        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            window_size: DEFAULT_WINDOW_SIZE,
            confidence_threshold: 0.5,
            clear_on_recognized: true,
            layout: FeatureLayout::HandsOnly,
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
            model_path: data_dir.join("model.json"),
            sequences_dir: None,
            data_path: data_dir,
            max_sessions: 1024,
            session_ttl: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(60),
            inference_timeout: Duration::from_millis(5000),
            max_concurrent_inferences: 4,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file. A missing file means defaults; a file
    /// that exists but does not parse is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qazsign")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        if let Some(ref dir) = self.sequences_dir {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }
        Ok(())
    }

    /// Apply a named deployment preset.
    pub fn apply_preset(&mut self, preset: RecognitionPreset) {
        match preset {
            RecognitionPreset::Streaming => {
                self.confidence_threshold = 0.5;
                self.clear_on_recognized = false;
            }
            RecognitionPreset::Persisted => {
                self.confidence_threshold = 0.7;
                self.clear_on_recognized = true;
                if self.sequences_dir.is_none() {
                    self.sequences_dir = Some(self.data_path.join("sequences"));
                }
            }
        }
    }

    /// Check values that would make the service unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be positive".to_string()));
        }
        if self.labels.is_empty() {
            return Err(ConfigError::Invalid("labels must not be empty".to_string()));
        }
        if self.max_sessions == 0 || self.max_concurrent_inferences == 0 {
            return Err(ConfigError::Invalid(
                "max_sessions and max_concurrent_inferences must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Legacy deployment presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionPreset {
    /// Interactive server: threshold 0.5, window keeps sliding after a word
    Streaming,
    /// Batch tool: threshold 0.7, window persisted and cleared after a word
    Persisted,
}

impl RecognitionPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "streaming" => Some(RecognitionPreset::Streaming),
            "persisted" | "batch" => Some(RecognitionPreset::Persisted),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    Invalid(String),
    Model(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
            ConfigError::Model(e) => write!(f, "Model error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde support for Duration as milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.window_size, 30);
        assert_eq!(config.confidence_threshold, 0.5);
        assert!(config.clear_on_recognized);
        assert_eq!(config.labels.len(), 7);
        assert!(config.sequences_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let mut config = Config::default();
        config.apply_preset(RecognitionPreset::Persisted);
        assert_eq!(config.confidence_threshold, 0.7);
        assert!(config.clear_on_recognized);
        assert_eq!(
            config.sequences_dir,
            Some(config.data_path.join("sequences"))
        );

        config.apply_preset(RecognitionPreset::Streaming);
        assert_eq!(config.confidence_threshold, 0.5);
        assert!(!config.clear_on_recognized);

        assert_eq!(
            RecognitionPreset::from_name("batch"),
            Some(RecognitionPreset::Persisted)
        );
        assert_eq!(RecognitionPreset::from_name("other"), None);
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json(
            r#"{"port": 8080, "layout": "holistic", "inference_timeout": 250, "session_ttl": 30}"#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.layout, FeatureLayout::Holistic);
        assert_eq!(config.inference_timeout, Duration::from_millis(250));
        assert_eq!(config.session_ttl, Duration::from_secs(30));
        assert_eq!(config.window_size, 30);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("qazsign-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.port, 5001);

        std::fs::write(&path, r#"{"confidence_threshold": 0.7}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.confidence_threshold, 0.7);

        std::fs::write(&path, r#"{"confidence_threshold": 0.7,"#).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validation() {
        let config = Config {
            confidence_threshold: 1.5,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            window_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            labels: Vec::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        assert!(matches!(
            Config::from_json("{not json"),
            Err(ConfigError::ParseError(_))
        ));
    }
}

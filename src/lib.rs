//! QazSign recognizer - real-time sign-language word recognition.
//!
//! Clients stream video frames for a session. Each frame is reduced to a
//! fixed-length landmark feature vector and appended to that session's
//! sliding window; once the window holds enough frames a sequence classifier
//! names the signed word, gated by a confidence threshold.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        QazSign Recognizer                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌──────────┐ │
//! │  │   Decode   │──▶│  Features  │──▶│  Session   │──▶│ Trigger  │ │
//! │  │  (base64)  │   │ (landmarks)│   │  Window    │   │ (W = 30) │ │
//! │  └────────────┘   └────────────┘   └────────────┘   └──────────┘ │
//! │                                                          │       │
//! │                                                          ▼       │
//! │                                                   ┌──────────┐   │
//! │                                                   │Classifier│   │
//! │                                                   └──────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use qazsign_recognizer::{Config, Recognizer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let recognizer = Recognizer::from_config(&config)?;
//!
//! let result = recognizer
//!     .submit_image("default", "data:image/jpeg;base64,...".to_string())
//!     .await?;
//! println!("{}", result.status());
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod core;
pub mod features;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use classifier::{Classifier, ClassifierError, DenseClassifier};
pub use config::{Config, ConfigError, RecognitionPreset};
pub use core::{
    PredictionResult, RecognizeError, Recognizer, SessionStore, TriggerPolicy, Vocabulary,
    DEFAULT_SESSION_ID,
};
pub use features::{FeatureExtractor, FeatureFrame, FeatureLayout, LandmarkDetector, NoopDetector};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Core functionality for the recognizer.
//!
//! This module contains:
//! - The per-session sliding window of feature frames
//! - The session store and its lifecycle (creation, reset, eviction, persistence)
//! - The classification trigger and confidence gating
//! - The recognizer tying sessions, extractor and classifier together

pub mod recognizer;
pub mod session;
pub mod stats;
pub mod trigger;
pub mod vocabulary;
pub mod window;

// Re-export commonly used types
pub use recognizer::{RecognizeError, Recognizer, RecognizerStatus};
pub use session::{SessionSnapshot, SessionStore, StoreConfig, StoreError, DEFAULT_SESSION_ID};
pub use stats::{RecognizerStats, StatsSnapshot};
pub use trigger::{PredictionResult, TriggerPolicy};
pub use vocabulary::Vocabulary;
pub use window::{FrameWindow, DEFAULT_WINDOW_SIZE};

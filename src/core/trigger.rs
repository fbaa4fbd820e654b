//! Classification trigger and confidence gating.
//!
//! After every append the trigger either reports collection progress or, once
//! the window is full, turns the classifier's probabilities into a
//! [`PredictionResult`].

use crate::core::vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};

/// Result of submitting one frame to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResult {
    /// The window is not full yet
    Collecting {
        frames_collected: usize,
        frames_needed: usize,
        message: String,
    },
    /// Confidence exceeded the threshold
    Recognized {
        word: String,
        confidence: f32,
        action_index: usize,
        message: String,
    },
    /// Best guess did not clear the threshold
    LowConfidence {
        word: String,
        confidence: f32,
        action_index: usize,
        message: String,
    },
}

impl PredictionResult {
    pub fn collecting(frames_collected: usize, frames_needed: usize) -> Self {
        PredictionResult::Collecting {
            frames_collected,
            frames_needed,
            message: format!("Collecting frames: {frames_collected}/{frames_needed}"),
        }
    }

    /// Status tag as it appears on the wire.
    pub fn status(&self) -> &'static str {
        match self {
            PredictionResult::Collecting { .. } => "collecting",
            PredictionResult::Recognized { .. } => "recognized",
            PredictionResult::LowConfidence { .. } => "low_confidence",
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, PredictionResult::Recognized { .. })
    }
}

/// Errors turning a probability vector into a result.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerError {
    /// Classifier produced no probabilities
    EmptyDistribution,
    /// Distribution length does not match the vocabulary
    VocabularyMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for TriggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerError::EmptyDistribution => write!(f, "Classifier returned no probabilities"),
            TriggerError::VocabularyMismatch { expected, actual } => write!(
                f,
                "Classifier returned {actual} probabilities for {expected} labels"
            ),
        }
    }
}

impl std::error::Error for TriggerError {}

/// When to classify and how to gate the outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerPolicy {
    /// Window length W at which classification fires
    pub window_size: usize,
    /// Confidence must be strictly greater than this to count as recognized
    pub threshold: f32,
    /// Empty the session window after a recognized word
    pub clear_on_recognized: bool,
}

impl TriggerPolicy {
    /// Result to return when the window holds `frames_collected` frames.
    ///
    /// Returns `None` once the window is full and the classifier must run.
    pub fn progress(&self, frames_collected: usize) -> Option<PredictionResult> {
        if frames_collected < self.window_size {
            Some(PredictionResult::collecting(frames_collected, self.window_size))
        } else {
            None
        }
    }

    /// Gate a probability vector against the threshold.
    pub fn evaluate(
        &self,
        probabilities: &[f32],
        vocabulary: &Vocabulary,
    ) -> Result<PredictionResult, TriggerError> {
        if probabilities.len() != vocabulary.len() {
            return Err(TriggerError::VocabularyMismatch {
                expected: vocabulary.len(),
                actual: probabilities.len(),
            });
        }
        let action_index = argmax(probabilities).ok_or(TriggerError::EmptyDistribution)?;
        let confidence = probabilities[action_index];
        let word = vocabulary.get(action_index).unwrap_or_default().to_string();

        if confidence > self.threshold {
            Ok(PredictionResult::Recognized {
                word,
                confidence,
                action_index,
                message: "Streaming prediction".to_string(),
            })
        } else {
            Ok(PredictionResult::LowConfidence {
                word,
                confidence,
                action_index,
                message: "Gesture not clear enough, please try again".to_string(),
            })
        }
    }
}

/// Index of the first maximal component. NaN never wins.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i).or(if values.is_empty() { None } else { Some(0) })
}

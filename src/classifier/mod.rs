//! Sequence classifier boundary.
//!
//! A classifier maps a batch-of-one window tensor of shape `[1, W, D]` to a
//! probability distribution over the label vocabulary. Implementations must be
//! safe to call from several sessions at once.

pub mod dense;

pub use dense::{DenseClassifier, DenseWeights};

use ndarray::Array3;

/// Errors raised by a classifier.
#[derive(Debug)]
pub enum ClassifierError {
    /// Could not load model weights
    Load(String),
    /// Input tensor has the wrong shape
    Shape(String),
    /// Backend failure during inference
    Backend(String),
}

impl std::fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierError::Load(e) => write!(f, "Failed to load model: {e}"),
            ClassifierError::Shape(e) => write!(f, "Input shape mismatch: {e}"),
            ClassifierError::Backend(e) => write!(f, "Inference failed: {e}"),
        }
    }
}

impl std::error::Error for ClassifierError {}

/// A pretrained sequence classifier.
pub trait Classifier: Send + Sync {
    /// Per-frame feature dimension D the model expects.
    fn feature_dim(&self) -> usize;

    /// Number of output classes.
    fn num_classes(&self) -> usize;

    /// Run inference on a `[1, W, D]` batch and return class probabilities.
    fn predict(&self, batch: &Array3<f32>) -> Result<Vec<f32>, ClassifierError>;
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

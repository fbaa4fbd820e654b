//! A dense classifier loaded from JSON weights.
//!
//! The window is mean-pooled over time, passed through a single affine layer
//! and normalized with softmax.

use super::{softmax, Classifier, ClassifierError};
use ndarray::{Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk weights format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseWeights {
    /// One row of D weights per class
    pub weights: Vec<Vec<f32>>,
    /// One bias per class
    pub bias: Vec<f32>,
}

/// Mean-pool + affine + softmax classifier.
#[derive(Debug, Clone)]
pub struct DenseClassifier {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl DenseClassifier {
    /// Build from raw weights, validating their shape.
    pub fn from_weights(raw: DenseWeights) -> Result<Self, ClassifierError> {
        let classes = raw.weights.len();
        if classes == 0 {
            return Err(ClassifierError::Load("model has no classes".to_string()));
        }
        if raw.bias.len() != classes {
            return Err(ClassifierError::Load(format!(
                "{} bias values for {} classes",
                raw.bias.len(),
                classes
            )));
        }

        let dim = raw.weights[0].len();
        if dim == 0 || raw.weights.iter().any(|row| row.len() != dim) {
            return Err(ClassifierError::Load(
                "weight rows must be non-empty and equally long".to_string(),
            ));
        }

        let flat: Vec<f32> = raw.weights.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((classes, dim), flat)
            .map_err(|e| ClassifierError::Load(e.to_string()))?;

        Ok(Self {
            weights,
            bias: Array1::from(raw.bias),
        })
    }

    /// Load weights from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClassifierError::Load(format!("{}: {e}", path.display())))?;
        let raw: DenseWeights = serde_json::from_str(&content)
            .map_err(|e| ClassifierError::Load(format!("{}: {e}", path.display())))?;
        Self::from_weights(raw)
    }
}

impl Classifier for DenseClassifier {
    fn feature_dim(&self) -> usize {
        self.weights.ncols()
    }

    fn num_classes(&self) -> usize {
        self.weights.nrows()
    }

    fn predict(&self, batch: &Array3<f32>) -> Result<Vec<f32>, ClassifierError> {
        let (n, steps, dim) = batch.dim();
        if n != 1 || steps == 0 || dim != self.feature_dim() {
            return Err(ClassifierError::Shape(format!(
                "expected [1, W, {}], got [{n}, {steps}, {dim}]",
                self.feature_dim()
            )));
        }

        let pooled = batch
            .index_axis(Axis(0), 0)
            .mean_axis(Axis(0))
            .ok_or_else(|| ClassifierError::Backend("empty window".to_string()))?;
        let logits = (self.weights.dot(&pooled) + &self.bias).to_vec();

        Ok(softmax(&logits))
    }
}

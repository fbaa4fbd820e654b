//! The ordered label vocabulary.

use serde::{Deserialize, Serialize};

/// Words the bundled model was trained on, in output order.
pub const DEFAULT_LABELS: [&str; 7] = [
    "сәлеметсіз бе",
    "сау болыңыз",
    "аты",
    "тегі",
    "әкесінің аты",
    "бір",
    "мектеп",
];

/// Index-addressable list of signed words, aligned with classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(Vec<String>);

impl Vocabulary {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self(DEFAULT_LABELS.iter().map(|s| s.to_string()).collect())
    }
}

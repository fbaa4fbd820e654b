//! Landmark detector boundary.
//!
//! Detection models are external; anything that can map an image to
//! [`Landmarks`] plugs in here.

use super::{ExtractionError, Landmarks};
use image::DynamicImage;

/// A pose/face/hand landmark detector.
pub trait LandmarkDetector: Send + Sync {
    /// Short name used in logs and health output.
    fn name(&self) -> &str;

    /// Detect landmarks in one image. Undetected parts are left empty.
    fn detect(&self, image: &DynamicImage) -> Result<Landmarks, ExtractionError>;
}

/// A detector that never finds anything.
///
/// This exists so the server can run on hosts without a detection backend;
/// every frame becomes the zero vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDetector;

impl LandmarkDetector for NoopDetector {
    fn name(&self) -> &str {
        "noop"
    }

    fn detect(&self, _image: &DynamicImage) -> Result<Landmarks, ExtractionError> {
        Ok(Landmarks::default())
    }
}

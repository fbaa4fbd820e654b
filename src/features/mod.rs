//! Per-frame feature extraction.
//!
//! A frame image is reduced to a fixed-length [`FeatureFrame`] by concatenating
//! landmark coordinate blocks for each body part in the configured
//! [`FeatureLayout`]. Parts the detector did not find are filled with zeros, so
//! every frame of a deployment has the same dimension.

pub mod decode;
pub mod detector;

pub use decode::{decode_image, DecodeError};
pub use detector::{LandmarkDetector, NoopDetector};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Landmarks per pose detection.
pub const POSE_LANDMARKS: usize = 33;
/// Landmarks per face mesh.
pub const FACE_LANDMARKS: usize = 468;
/// Landmarks per hand.
pub const HAND_LANDMARKS: usize = 21;

/// A fixed-length feature vector for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureFrame(Vec<f32>);

impl FeatureFrame {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// All-zero frame, the shape of a frame where nothing was detected.
    pub fn zeros(dim: usize) -> Self {
        Self(vec![0.0; dim])
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Which landmark groups are concatenated into a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureLayout {
    /// Left hand then right hand, x/y/z each.
    HandsOnly,
    /// Pose (x/y/z/visibility), face, left hand, right hand.
    Holistic,
}

impl FeatureLayout {
    /// Frame dimension D for this layout.
    pub fn dim(self) -> usize {
        let hands = 2 * HAND_LANDMARKS * 3;
        match self {
            FeatureLayout::HandsOnly => hands,
            FeatureLayout::Holistic => POSE_LANDMARKS * 4 + FACE_LANDMARKS * 3 + hands,
        }
    }

    /// Parse a layout name as used on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "hands" | "hands_only" | "hands-only" => Some(FeatureLayout::HandsOnly),
            "holistic" | "full" => Some(FeatureLayout::Holistic),
            _ => None,
        }
    }
}

/// A single detected keypoint in normalized image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Only reported by pose detection.
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: 0.0,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Side a detected hand belongs to, as reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// One detected hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub handedness: Handedness,
    pub landmarks: Vec<Landmark>,
}

/// Everything a detector found in one image. Absent groups are `None`/empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    pub pose: Option<Vec<Landmark>>,
    pub face: Option<Vec<Landmark>>,
    pub hands: Vec<Hand>,
}

/// Errors raised while turning an image into a feature frame.
#[derive(Debug)]
pub enum ExtractionError {
    /// The image cannot be processed at all
    InvalidImage(String),
    /// The detector failed
    Detector(String),
    /// A detected group has the wrong number of landmarks
    LandmarkCount {
        group: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionError::InvalidImage(msg) => write!(f, "Invalid image: {msg}"),
            ExtractionError::Detector(msg) => write!(f, "Landmark detection failed: {msg}"),
            ExtractionError::LandmarkCount {
                group,
                expected,
                actual,
            } => write!(
                f,
                "Detector returned {actual} {group} landmarks, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Turns decoded images into feature frames using a landmark detector.
#[derive(Clone)]
pub struct FeatureExtractor {
    layout: FeatureLayout,
    detector: Arc<dyn LandmarkDetector>,
}

impl FeatureExtractor {
    pub fn new(layout: FeatureLayout, detector: Arc<dyn LandmarkDetector>) -> Self {
        Self { layout, detector }
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    /// Frame dimension produced by this extractor.
    pub fn dim(&self) -> usize {
        self.layout.dim()
    }

    /// Name of the underlying detector, for health reporting.
    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Detect landmarks in `image` and flatten them into a frame.
    pub fn extract(&self, image: &DynamicImage) -> Result<FeatureFrame, ExtractionError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ExtractionError::InvalidImage(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let landmarks = self.detector.detect(image)?;
        flatten_landmarks(self.layout, &landmarks)
    }
}

/// Flatten detected landmarks into a frame for `layout`, zero-filling absent parts.
pub fn flatten_landmarks(
    layout: FeatureLayout,
    landmarks: &Landmarks,
) -> Result<FeatureFrame, ExtractionError> {
    let mut values = Vec::with_capacity(layout.dim());

    if layout == FeatureLayout::Holistic {
        push_group(
            &mut values,
            "pose",
            landmarks.pose.as_deref(),
            POSE_LANDMARKS,
            true,
        )?;
        push_group(
            &mut values,
            "face",
            landmarks.face.as_deref(),
            FACE_LANDMARKS,
            false,
        )?;
    }

    // Later detections of the same side replace earlier ones.
    let mut left = None;
    let mut right = None;
    for hand in &landmarks.hands {
        match hand.handedness {
            Handedness::Left => left = Some(hand.landmarks.as_slice()),
            Handedness::Right => right = Some(hand.landmarks.as_slice()),
        }
    }
    push_group(&mut values, "left hand", left, HAND_LANDMARKS, false)?;
    push_group(&mut values, "right hand", right, HAND_LANDMARKS, false)?;

    debug_assert_eq!(values.len(), layout.dim());
    Ok(FeatureFrame(values))
}

fn push_group(
    values: &mut Vec<f32>,
    group: &'static str,
    points: Option<&[Landmark]>,
    expected: usize,
    with_visibility: bool,
) -> Result<(), ExtractionError> {
    let stride = if with_visibility { 4 } else { 3 };

    let Some(points) = points else {
        values.extend(std::iter::repeat(0.0).take(expected * stride));
        return Ok(());
    };

    if points.len() != expected {
        return Err(ExtractionError::LandmarkCount {
            group,
            expected,
            actual: points.len(),
        });
    }

    for lm in points {
        values.extend_from_slice(&[lm.x, lm.y, lm.z]);
        if with_visibility {
            values.push(lm.visibility);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(handedness: Handedness, value: f32) -> Hand {
        Hand {
            handedness,
            landmarks: vec![Landmark::new(value, value, value); HAND_LANDMARKS],
        }
    }

    #[test]
    fn test_layout_dimensions() {
        assert_eq!(FeatureLayout::HandsOnly.dim(), 126);
        assert_eq!(FeatureLayout::Holistic.dim(), 1662);
        assert_eq!(
            FeatureLayout::from_name("holistic"),
            Some(FeatureLayout::Holistic)
        );
        assert_eq!(FeatureLayout::from_name("hands"), Some(FeatureLayout::HandsOnly));
        assert_eq!(FeatureLayout::from_name("feet"), None);
    }

    #[test]
    fn test_nothing_detected_is_zero_frame() {
        for layout in [FeatureLayout::HandsOnly, FeatureLayout::Holistic] {
            let frame = flatten_landmarks(layout, &Landmarks::default()).unwrap();
            assert_eq!(frame, FeatureFrame::zeros(layout.dim()));
        }
    }

    #[test]
    fn test_hands_are_placed_by_handedness() {
        let landmarks = Landmarks {
            hands: vec![hand(Handedness::Right, 2.0)],
            ..Default::default()
        };
        let frame = flatten_landmarks(FeatureLayout::HandsOnly, &landmarks).unwrap();
        let values = frame.as_slice();

        assert!(values[..63].iter().all(|v| *v == 0.0));
        assert!(values[63..].iter().all(|v| *v == 2.0));
    }

    #[test]
    fn test_later_hand_of_same_side_wins() {
        let landmarks = Landmarks {
            hands: vec![hand(Handedness::Left, 1.0), hand(Handedness::Left, 3.0)],
            ..Default::default()
        };
        let frame = flatten_landmarks(FeatureLayout::HandsOnly, &landmarks).unwrap();
        assert_eq!(frame.as_slice()[0], 3.0);
    }

    #[test]
    fn test_pose_includes_visibility() {
        let landmarks = Landmarks {
            pose: Some(vec![
                Landmark::new(0.1, 0.2, 0.3).with_visibility(0.9);
                POSE_LANDMARKS
            ]),
            ..Default::default()
        };
        let frame = flatten_landmarks(FeatureLayout::Holistic, &landmarks).unwrap();
        assert_eq!(&frame.as_slice()[..4], &[0.1, 0.2, 0.3, 0.9]);
        assert_eq!(frame.dim(), 1662);
    }

    #[test]
    fn test_wrong_landmark_count_is_rejected() {
        let landmarks = Landmarks {
            hands: vec![Hand {
                handedness: Handedness::Left,
                landmarks: vec![Landmark::default(); 5],
            }],
            ..Default::default()
        };
        let err = flatten_landmarks(FeatureLayout::HandsOnly, &landmarks).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::LandmarkCount {
                expected: 21,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_extractor_with_noop_detector() {
        let extractor = FeatureExtractor::new(FeatureLayout::HandsOnly, Arc::new(NoopDetector));
        let image = DynamicImage::new_rgb8(4, 4);
        let frame = extractor.extract(&image).unwrap();
        assert_eq!(frame, FeatureFrame::zeros(126));
    }

    #[test]
    fn test_extractor_rejects_empty_image() {
        let extractor = FeatureExtractor::new(FeatureLayout::HandsOnly, Arc::new(NoopDetector));
        let image = DynamicImage::new_rgb8(0, 0);
        assert!(matches!(
            extractor.extract(&image),
            Err(ExtractionError::InvalidImage(_))
        ));
    }
}

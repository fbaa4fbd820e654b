//! Fixed-length sliding window of feature frames.
//!
//! Each session owns one window holding its most recent `capacity` frames.
//! Pushing into a full window evicts the oldest frame.

use crate::features::FeatureFrame;
use ndarray::Array3;
use std::collections::VecDeque;

/// Number of frames the classifier consumes at once.
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Bounded, oldest-first-evicting buffer of frames.
#[derive(Debug, Clone)]
pub struct FrameWindow {
    capacity: usize,
    frames: VecDeque<FeatureFrame>,
}

/// Undo token returned by [`FrameWindow::push`].
#[derive(Debug)]
#[must_use]
pub struct Pushed {
    evicted: Option<FeatureFrame>,
}

impl FrameWindow {
    /// Create an empty window. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Create a window from stored frames, keeping only the most recent ones.
    pub fn from_frames(capacity: usize, frames: Vec<FeatureFrame>) -> Self {
        let mut window = Self::new(capacity);
        let skip = frames.len().saturating_sub(window.capacity);
        window.frames.extend(frames.into_iter().skip(skip));
        window
    }

    /// Append a frame, evicting the oldest when full.
    pub fn push(&mut self, frame: FeatureFrame) -> Pushed {
        let evicted = if self.frames.len() == self.capacity {
            self.frames.pop_front()
        } else {
            None
        };
        self.frames.push_back(frame);
        Pushed { evicted }
    }

    /// Revert the most recent push, restoring any evicted frame.
    pub fn undo(&mut self, pushed: Pushed) {
        self.frames.pop_back();
        if let Some(frame) = pushed.evicted {
            self.frames.push_front(frame);
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the window holds enough frames to classify.
    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    /// Frames in arrival order, oldest first.
    pub fn frames(&self) -> impl Iterator<Item = &FeatureFrame> {
        self.frames.iter()
    }

    pub fn to_vec(&self) -> Vec<FeatureFrame> {
        self.frames.iter().cloned().collect()
    }

    /// Assemble the window as a `[1, W, D]` batch tensor.
    ///
    /// Returns `None` if the window is empty or frames disagree on dimension.
    pub fn to_batch(&self) -> Option<Array3<f32>> {
        let dim = self.frames.front()?.dim();
        if self.frames.iter().any(|f| f.dim() != dim) {
            return None;
        }

        let flat: Vec<f32> = self
            .frames
            .iter()
            .flat_map(|f| f.as_slice().iter().copied())
            .collect();
        Array3::from_shape_vec((1, self.frames.len(), dim), flat).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(value: f32) -> FeatureFrame {
        FeatureFrame::new(vec![value; 4])
    }

    #[test]
    fn test_window_fills_then_slides() {
        let mut window = FrameWindow::new(DEFAULT_WINDOW_SIZE);

        for i in 0..DEFAULT_WINDOW_SIZE {
            let _ = window.push(frame(i as f32));
            assert_eq!(window.len(), i + 1);
        }
        assert!(window.is_full());

        for i in 0..10 {
            let _ = window.push(frame(100.0 + i as f32));
            assert_eq!(window.len(), DEFAULT_WINDOW_SIZE);
        }

        // Oldest ten frames were evicted
        let first = window.frames().next().unwrap();
        assert_eq!(first.as_slice()[0], 10.0);
    }

    #[test]
    fn test_undo_restores_evicted_frame() {
        let mut window = FrameWindow::new(3);
        for i in 0..3 {
            let _ = window.push(frame(i as f32));
        }

        let pushed = window.push(frame(9.0));
        window.undo(pushed);

        let values: Vec<f32> = window.frames().map(|f| f.as_slice()[0]).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_undo_on_partial_window() {
        let mut window = FrameWindow::new(3);
        let _ = window.push(frame(1.0));
        let pushed = window.push(frame(2.0));
        window.undo(pushed);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_from_frames_keeps_most_recent() {
        let frames = (0..40).map(|i| frame(i as f32)).collect();
        let window = FrameWindow::from_frames(30, frames);
        assert_eq!(window.len(), 30);
        assert_eq!(window.frames().next().unwrap().as_slice()[0], 10.0);
    }

    #[test]
    fn test_to_batch_shape() {
        let mut window = FrameWindow::new(5);
        for i in 0..5 {
            let _ = window.push(frame(i as f32));
        }
        let batch = window.to_batch().unwrap();
        assert_eq!(batch.dim(), (1, 5, 4));
        assert_eq!(batch[[0, 4, 0]], 4.0);
    }

    #[test]
    fn test_to_batch_rejects_mixed_dims() {
        let mut window = FrameWindow::new(2);
        let _ = window.push(frame(1.0));
        let _ = window.push(FeatureFrame::new(vec![1.0; 2]));
        assert!(window.to_batch().is_none());
        assert!(FrameWindow::new(2).to_batch().is_none());
    }
}

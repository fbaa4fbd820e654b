//! Process-wide recognition counters.
//!
//! Counters are plain atomics so request handlers can record without locking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for the recognizer.
#[derive(Debug)]
pub struct RecognizerStats {
    frames_received: AtomicU64,
    classifications: AtomicU64,
    recognized: AtomicU64,
    low_confidence: AtomicU64,
    failures: AtomicU64,
    resets: AtomicU64,
    started_at: DateTime<Utc>,
}

impl RecognizerStats {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            classifications: AtomicU64::new(0),
            recognized: AtomicU64::new(0),
            low_confidence: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a classifier run and its outcome.
    pub fn record_classification(&self, recognized: bool) {
        self.classifications.fetch_add(1, Ordering::Relaxed);
        if recognized {
            self.recognized.fetch_add(1, Ordering::Relaxed);
        } else {
            self.low_confidence.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            classifications: self.classifications.load(Ordering::Relaxed),
            recognized: self.recognized.load(Ordering::Relaxed),
            low_confidence: self.low_confidence.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }
}

impl Default for RecognizerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub frames_received: u64,
    pub classifications: u64,
    pub recognized: u64,
    pub low_confidence: u64,
    pub failures: u64,
    pub resets: u64,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = RecognizerStats::new();
        stats.record_frame();
        stats.record_frame();
        stats.record_classification(true);
        stats.record_classification(false);
        stats.record_classification(false);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_received, 2);
        assert_eq!(snapshot.classifications, 3);
        assert_eq!(snapshot.recognized, 1);
        assert_eq!(snapshot.low_confidence, 2);
        assert_eq!(snapshot.failures, 0);
    }
}

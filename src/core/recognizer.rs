//! Session lifecycle and the append-and-classify path.
//!
//! [`Recognizer`] is constructed once at startup and shared by all request
//! handlers. A submitted frame is decoded and extracted on the blocking pool,
//! then appended to its session under that session's lock; when the window
//! fills, inference also runs on the blocking pool while the lock is held, so
//! each session sees its frames strictly one at a time.
//!
//! A frame only stays in the window if the whole step succeeds. Classifier
//! failures and timeouts undo the append.

use crate::classifier::{Classifier, DenseClassifier};
use crate::config::{Config, ConfigError};
use crate::core::session::{SessionSnapshot, SessionStore, StoreConfig, StoreError};
use crate::core::stats::{RecognizerStats, StatsSnapshot};
use crate::core::trigger::{PredictionResult, TriggerPolicy};
use crate::core::vocabulary::Vocabulary;
use crate::core::window::FrameWindow;
use crate::features::{decode_image, FeatureExtractor, FeatureFrame, NoopDetector};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Errors surfaced to callers of the recognizer.
#[derive(Debug)]
pub enum RecognizeError {
    /// Malformed request or undecodable image
    Input(String),
    /// Feature extraction failed
    Extraction(String),
    /// Classifier failed or frame shape is incompatible
    Inference(String),
    /// Session persistence failed
    Storage(String),
    /// No capacity for another session or inference
    Busy(String),
    /// Inference exceeded its time budget
    Timeout(Duration),
}

impl RecognizeError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            RecognizeError::Input(_) => 400,
            RecognizeError::Extraction(_)
            | RecognizeError::Inference(_)
            | RecognizeError::Storage(_) => 500,
            RecognizeError::Busy(_) => 503,
            RecognizeError::Timeout(_) => 504,
        }
    }

    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RecognizeError::Input(_) => "INVALID_INPUT",
            RecognizeError::Extraction(_) => "EXTRACTION_ERROR",
            RecognizeError::Inference(_) => "INFERENCE_ERROR",
            RecognizeError::Storage(_) => "STORAGE_ERROR",
            RecognizeError::Busy(_) => "BUSY",
            RecognizeError::Timeout(_) => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for RecognizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognizeError::Input(msg) => write!(f, "{msg}"),
            RecognizeError::Extraction(msg) => write!(f, "Feature extraction failed: {msg}"),
            RecognizeError::Inference(msg) => write!(f, "Inference failed: {msg}"),
            RecognizeError::Storage(msg) => write!(f, "{msg}"),
            RecognizeError::Busy(msg) => write!(f, "Server busy: {msg}"),
            RecognizeError::Timeout(limit) => {
                write!(f, "Inference timed out after {}ms", limit.as_millis())
            }
        }
    }
}

impl std::error::Error for RecognizeError {}

impl From<StoreError> for RecognizeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Capacity(_) => RecognizeError::Busy(e.to_string()),
            StoreError::Io(_) => RecognizeError::Storage(e.to_string()),
        }
    }
}

/// Readiness and configuration summary.
#[derive(Debug, Clone, Serialize)]
pub struct RecognizerStatus {
    pub models_loaded: bool,
    pub detector: String,
    pub feature_dim: usize,
    pub window_size: usize,
    pub confidence_threshold: f32,
    pub clear_on_recognized: bool,
    pub sessions: usize,
    pub sessions_evicted: u64,
    pub stats: StatsSnapshot,
}

/// Owns every session and runs frames through the trigger.
pub struct Recognizer {
    extractor: FeatureExtractor,
    classifier: Arc<dyn Classifier>,
    vocabulary: Vocabulary,
    policy: TriggerPolicy,
    store: SessionStore,
    inference_slots: Arc<Semaphore>,
    inference_timeout: Duration,
    stats: RecognizerStats,
}

impl Recognizer {
    /// Build a recognizer, checking that extractor, classifier and labels agree.
    pub fn new(
        config: &Config,
        extractor: FeatureExtractor,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        if classifier.num_classes() != config.labels.len() {
            return Err(ConfigError::Model(format!(
                "model has {} classes but {} labels are configured",
                classifier.num_classes(),
                config.labels.len()
            )));
        }
        if classifier.feature_dim() != extractor.dim() {
            return Err(ConfigError::Model(format!(
                "model expects {} features per frame, {:?} layout produces {}",
                classifier.feature_dim(),
                extractor.layout(),
                extractor.dim()
            )));
        }

        let policy = TriggerPolicy {
            window_size: config.window_size,
            threshold: config.confidence_threshold,
            clear_on_recognized: config.clear_on_recognized,
        };
        let store = SessionStore::new(StoreConfig {
            window_size: config.window_size,
            max_sessions: config.max_sessions,
            frame_dim: Some(classifier.feature_dim()),
            persist_dir: config.sequences_dir.clone(),
        });

        tracing::info!(
            detector = extractor.detector_name(),
            feature_dim = classifier.feature_dim(),
            classes = classifier.num_classes(),
            window_size = policy.window_size,
            threshold = policy.threshold,
            clear_on_recognized = policy.clear_on_recognized,
            "Recognizer ready"
        );

        Ok(Self {
            extractor,
            classifier,
            vocabulary: Vocabulary::new(config.labels.clone()),
            policy,
            store,
            inference_slots: Arc::new(Semaphore::new(config.max_concurrent_inferences)),
            inference_timeout: config.inference_timeout,
            stats: RecognizerStats::new(),
        })
    }

    /// Load the classifier named by the configuration, with no landmark backend.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let classifier = DenseClassifier::load(&config.model_path)
            .map_err(|e| ConfigError::Model(e.to_string()))?;
        let extractor = FeatureExtractor::new(config.layout, Arc::new(NoopDetector));
        Self::new(config, extractor, Arc::new(classifier))
    }

    /// Decode a base64 image, extract its features and submit them.
    pub async fn submit_image(
        &self,
        session_id: &str,
        payload: String,
    ) -> Result<PredictionResult, RecognizeError> {
        let extractor = self.extractor.clone();
        let frame = tokio::task::spawn_blocking(move || {
            let image = decode_image(&payload).map_err(|e| RecognizeError::Input(e.to_string()))?;
            extractor
                .extract(&image)
                .map_err(|e| RecognizeError::Extraction(e.to_string()))
        })
        .await
        .map_err(|e| RecognizeError::Extraction(format!("extraction task failed: {e}")))
        .and_then(|r| r);

        match frame {
            Ok(frame) => self.submit_frame(session_id, frame).await,
            Err(e) => {
                self.stats.record_failure();
                Err(e)
            }
        }
    }

    /// Append a feature frame to a session and classify if the window is full.
    pub async fn submit_frame(
        &self,
        session_id: &str,
        frame: FeatureFrame,
    ) -> Result<PredictionResult, RecognizeError> {
        self.stats.record_frame();
        let result = self.append_and_classify(session_id, frame).await;
        if result.is_err() {
            self.stats.record_failure();
        }
        result
    }

    async fn append_and_classify(
        &self,
        session_id: &str,
        frame: FeatureFrame,
    ) -> Result<PredictionResult, RecognizeError> {
        let expected = self.classifier.feature_dim();
        if frame.dim() != expected {
            return Err(RecognizeError::Inference(format!(
                "frame has {} features, model expects {expected}",
                frame.dim()
            )));
        }

        let mut session = self.store.lock(session_id).await?;
        let pushed = session.window_mut().push(frame);
        let collected = session.window().len();

        if let Some(progress) = self.policy.progress(collected) {
            session.persist().await?;
            tracing::debug!(session_id, collected, "Collecting frames");
            return Ok(progress);
        }

        let result = match self.classify(session.window()).await {
            Ok(result) => result,
            Err(e) => {
                session.window_mut().undo(pushed);
                return Err(e);
            }
        };
        self.stats.record_classification(result.is_recognized());

        match result {
            PredictionResult::Recognized {
                ref word,
                confidence,
                ..
            } => {
                tracing::info!(session_id, word = %word, confidence, "Recognized sign");
                if self.policy.clear_on_recognized {
                    session.window_mut().clear();
                }
            }
            PredictionResult::LowConfidence { confidence, .. } => {
                tracing::debug!(session_id, confidence, "Low confidence prediction");
            }
            PredictionResult::Collecting { .. } => {}
        }

        session.persist().await?;
        Ok(result)
    }

    async fn classify(&self, window: &FrameWindow) -> Result<PredictionResult, RecognizeError> {
        let batch = window.to_batch().ok_or_else(|| {
            RecognizeError::Inference("window frames have inconsistent dimensions".to_string())
        })?;

        let permit = timeout(
            self.inference_timeout,
            Arc::clone(&self.inference_slots).acquire_owned(),
        )
        .await
        .map_err(|_| RecognizeError::Busy("no inference slot became available".to_string()))?
        .map_err(|_| RecognizeError::Inference("inference pool is closed".to_string()))?;

        let classifier = Arc::clone(&self.classifier);
        let task = tokio::task::spawn_blocking(move || {
            // Held until the model returns, even if the caller stops waiting.
            let _permit = permit;
            classifier.predict(&batch)
        });

        let probabilities = match timeout(self.inference_timeout, task).await {
            Err(_) => return Err(RecognizeError::Timeout(self.inference_timeout)),
            Ok(Err(e)) => {
                return Err(RecognizeError::Inference(format!(
                    "inference task failed: {e}"
                )))
            }
            Ok(Ok(Err(e))) => return Err(RecognizeError::Inference(e.to_string())),
            Ok(Ok(Ok(probabilities))) => probabilities,
        };

        self.policy
            .evaluate(&probabilities, &self.vocabulary)
            .map_err(|e| RecognizeError::Inference(e.to_string()))
    }

    /// Clear a session's window. Unknown sessions are left alone.
    pub async fn reset(&self, session_id: &str) -> Result<bool, RecognizeError> {
        let existed = self.store.reset(session_id).await?;
        self.stats.record_reset();
        tracing::info!(session_id, existed, "Session reset");
        Ok(existed)
    }

    /// Current window contents for a session.
    pub async fn session(&self, session_id: &str) -> Result<Option<SessionSnapshot>, RecognizeError> {
        Ok(self.store.get(session_id).await?)
    }

    /// Ordered label vocabulary.
    pub fn actions(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Drop sessions idle for longer than `ttl`.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        self.store.sweep_idle(ttl)
    }

    pub fn status(&self) -> RecognizerStatus {
        RecognizerStatus {
            models_loaded: true,
            detector: self.extractor.detector_name().to_string(),
            feature_dim: self.classifier.feature_dim(),
            window_size: self.policy.window_size,
            confidence_threshold: self.policy.threshold,
            clear_on_recognized: self.policy.clear_on_recognized,
            sessions: self.store.len(),
            sessions_evicted: self.store.evicted(),
            stats: self.stats.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, DenseClassifier, DenseWeights};
    use crate::core::session::DEFAULT_SESSION_ID;
    use crate::features::FeatureLayout;
    use ndarray::Array3;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const DIM: usize = 126;

    /// Returns a fixed distribution and counts calls.
    struct FixedClassifier {
        probabilities: Vec<f32>,
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Option<Duration>,
    }

    impl FixedClassifier {
        fn new(probabilities: Vec<f32>) -> Self {
            Self {
                probabilities,
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Classifier for FixedClassifier {
        fn feature_dim(&self) -> usize {
            DIM
        }

        fn num_classes(&self) -> usize {
            self.probabilities.len()
        }

        fn predict(&self, batch: &Array3<f32>) -> Result<Vec<f32>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClassifierError::Backend("backend unavailable".to_string()));
            }
            assert_eq!(batch.dim(), (1, 30, DIM));
            Ok(self.probabilities.clone())
        }
    }

    fn config(labels: usize, clear_on_recognized: bool) -> Config {
        Config {
            labels: (0..labels).map(|i| format!("word{i}")).collect(),
            clear_on_recognized,
            confidence_threshold: 0.5,
            sequences_dir: None,
            ..Config::default()
        }
    }

    fn recognizer(
        classifier: Arc<FixedClassifier>,
        clear_on_recognized: bool,
    ) -> Recognizer {
        let labels = classifier.num_classes();
        Recognizer::new(
            &config(labels, clear_on_recognized),
            FeatureExtractor::new(FeatureLayout::HandsOnly, Arc::new(NoopDetector)),
            classifier,
        )
        .unwrap()
    }

    fn zeros() -> FeatureFrame {
        FeatureFrame::zeros(DIM)
    }

    async fn window_len(recognizer: &Recognizer, session_id: &str) -> usize {
        recognizer
            .session(session_id)
            .await
            .unwrap()
            .map(|s| s.frames_collected)
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_collecting_until_window_full() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.9, 0.1]));
        let recognizer = recognizer(Arc::clone(&classifier), false);

        for n in 1..30 {
            let result = recognizer
                .submit_frame(DEFAULT_SESSION_ID, zeros())
                .await
                .unwrap();
            assert_eq!(result, PredictionResult::collecting(n, 30));
        }
        assert_eq!(classifier.calls(), 0);

        let result = recognizer
            .submit_frame(DEFAULT_SESSION_ID, zeros())
            .await
            .unwrap();
        assert_eq!(classifier.calls(), 1);
        match result {
            PredictionResult::Recognized {
                word, action_index, ..
            } => {
                assert_eq!(word, "word0");
                assert_eq!(action_index, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_streaming_keeps_sliding_after_recognition() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.9, 0.1]));
        let recognizer = recognizer(Arc::clone(&classifier), false);

        for _ in 0..35 {
            recognizer.submit_frame("s", zeros()).await.unwrap();
        }
        assert_eq!(classifier.calls(), 6);
        assert_eq!(window_len(&recognizer, "s").await, 30);
    }

    #[tokio::test]
    async fn test_recognition_clears_window() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.9, 0.1]));
        let recognizer = recognizer(Arc::clone(&classifier), true);

        for _ in 0..30 {
            recognizer.submit_frame("s", zeros()).await.unwrap();
        }
        assert_eq!(window_len(&recognizer, "s").await, 0);

        let next = recognizer.submit_frame("s", zeros()).await.unwrap();
        assert_eq!(next, PredictionResult::collecting(1, 30));
    }

    #[tokio::test]
    async fn test_low_confidence_keeps_window() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.4, 0.35, 0.25]));
        let recognizer = recognizer(Arc::clone(&classifier), true);

        for _ in 0..31 {
            recognizer.submit_frame("s", zeros()).await.unwrap();
        }
        assert_eq!(classifier.calls(), 2);
        assert_eq!(window_len(&recognizer, "s").await, 30);
    }

    #[tokio::test]
    async fn test_inference_failure_leaves_window_unchanged() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.2, 0.8]));
        let recognizer = recognizer(Arc::clone(&classifier), false);

        for i in 0..30 {
            let frame = FeatureFrame::new(vec![i as f32; DIM]);
            recognizer.submit_frame("s", frame).await.unwrap();
        }
        let before = recognizer.session("s").await.unwrap().unwrap().frames;

        classifier.fail.store(true, Ordering::SeqCst);
        let err = recognizer
            .submit_frame("s", FeatureFrame::new(vec![99.0; DIM]))
            .await
            .unwrap_err();
        assert!(matches!(err, RecognizeError::Inference(_)));
        assert_eq!(err.status_code(), 500);

        let after = recognizer.session("s").await.unwrap().unwrap().frames;
        assert_eq!(before, after);
        assert_eq!(recognizer.status().stats.failures, 1);
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_rejected_before_append() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.5, 0.5]));
        let recognizer = recognizer(Arc::clone(&classifier), false);

        recognizer.submit_frame("s", zeros()).await.unwrap();
        let err = recognizer
            .submit_frame("s", FeatureFrame::zeros(DIM + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, RecognizeError::Inference(_)));
        assert_eq!(window_len(&recognizer, "s").await, 1);
    }

    #[tokio::test]
    async fn test_inference_timeout_leaves_window_unchanged() {
        let classifier = Arc::new(FixedClassifier {
            delay: Some(Duration::from_millis(300)),
            ..FixedClassifier::new(vec![0.9, 0.1])
        });
        let config = Config {
            inference_timeout: Duration::from_millis(20),
            ..config(2, false)
        };
        let recognizer = Recognizer::new(
            &config,
            FeatureExtractor::new(FeatureLayout::HandsOnly, Arc::new(NoopDetector)),
            classifier,
        )
        .unwrap();

        for _ in 0..29 {
            recognizer.submit_frame("s", zeros()).await.unwrap();
        }
        let err = recognizer.submit_frame("s", zeros()).await.unwrap_err();
        assert!(matches!(err, RecognizeError::Timeout(_)));
        assert_eq!(err.status_code(), 504);
        assert_eq!(window_len(&recognizer, "s").await, 29);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_busy_when_no_inference_slot_frees_up() {
        let classifier = Arc::new(FixedClassifier {
            delay: Some(Duration::from_millis(400)),
            ..FixedClassifier::new(vec![0.9, 0.1])
        });
        let config = Config {
            max_concurrent_inferences: 1,
            inference_timeout: Duration::from_millis(50),
            ..config(2, false)
        };
        let recognizer = Recognizer::new(
            &config,
            FeatureExtractor::new(FeatureLayout::HandsOnly, Arc::new(NoopDetector)),
            Arc::clone(&classifier) as Arc<dyn Classifier>,
        )
        .unwrap();

        for session_id in ["a", "b"] {
            for _ in 0..29 {
                recognizer.submit_frame(session_id, zeros()).await.unwrap();
            }
        }

        let (a, b) = tokio::join!(
            recognizer.submit_frame("a", zeros()),
            recognizer.submit_frame("b", zeros())
        );
        let errors = [a.unwrap_err(), b.unwrap_err()];

        // The slot holder outlives its deadline and keeps the permit meanwhile
        let busy = errors
            .iter()
            .filter(|e| matches!(e, RecognizeError::Busy(_)))
            .collect::<Vec<_>>();
        assert_eq!(busy.len(), 1);
        assert_eq!(busy[0].status_code(), 503);
        assert!(errors
            .iter()
            .any(|e| matches!(e, RecognizeError::Timeout(_))));
        assert!(classifier.calls() <= 1);

        assert_eq!(window_len(&recognizer, "a").await, 29);
        assert_eq!(window_len(&recognizer, "b").await, 29);
    }

    #[tokio::test]
    async fn test_reset_then_append_yields_one() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.9, 0.1]));
        let recognizer = recognizer(classifier, false);

        for _ in 0..12 {
            recognizer.submit_frame("s", zeros()).await.unwrap();
        }
        assert!(recognizer.reset("s").await.unwrap());
        assert!(!recognizer.reset("unknown").await.unwrap());

        let result = recognizer.submit_frame("s", zeros()).await.unwrap();
        assert_eq!(result, PredictionResult::collecting(1, 30));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sessions_stay_independent() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.9, 0.1]));
        let recognizer = Arc::new(recognizer(Arc::clone(&classifier), false));

        let mut handles = Vec::new();
        for (session, count) in [("a", 17usize), ("b", 23usize)] {
            for _ in 0..count {
                let recognizer = Arc::clone(&recognizer);
                handles.push(tokio::spawn(async move {
                    recognizer.submit_frame(session, zeros()).await.unwrap()
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(window_len(&recognizer, "a").await, 17);
        assert_eq!(window_len(&recognizer, "b").await, 23);
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_trigger_once_per_full_window() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.9, 0.1]));
        let recognizer = Arc::new(recognizer(Arc::clone(&classifier), false));

        let handles: Vec<_> = (0..40)
            .map(|_| {
                let recognizer = Arc::clone(&recognizer);
                tokio::spawn(async move { recognizer.submit_frame("a", zeros()).await.unwrap() })
            })
            .collect();

        let mut collecting = Vec::new();
        for handle in handles {
            if let PredictionResult::Collecting {
                frames_collected, ..
            } = handle.await.unwrap()
            {
                collecting.push(frames_collected);
            }
        }
        collecting.sort_unstable();

        assert_eq!(collecting, (1..30).collect::<Vec<_>>());
        assert_eq!(classifier.calls(), 11);
        assert_eq!(window_len(&recognizer, "a").await, 30);
    }

    #[tokio::test]
    async fn test_identical_windows_classify_identically() {
        let weights = DenseWeights {
            weights: (0..3)
                .map(|c| (0..DIM).map(|i| ((i * (c + 1)) % 7) as f32 * 0.01).collect())
                .collect(),
            bias: vec![0.1, -0.2, 0.05],
        };
        let classifier = Arc::new(DenseClassifier::from_weights(weights).unwrap());
        let recognizer = Recognizer::new(
            &config(3, false),
            FeatureExtractor::new(FeatureLayout::HandsOnly, Arc::new(NoopDetector)),
            classifier,
        )
        .unwrap();

        let mut last = Vec::new();
        for session in ["x", "y"] {
            let mut result = None;
            for i in 0..30 {
                let frame = FeatureFrame::new(vec![(i % 5) as f32 * 0.3; DIM]);
                result = Some(recognizer.submit_frame(session, frame).await.unwrap());
            }
            last.push(result.unwrap());
        }
        assert_eq!(last[0], last[1]);
    }

    #[tokio::test]
    async fn test_submit_image_through_extractor() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
        use image::{ImageFormat, Rgb, RgbImage};

        let classifier = Arc::new(FixedClassifier::new(vec![0.9, 0.1]));
        let recognizer = recognizer(classifier, false);

        let mut bytes = std::io::Cursor::new(Vec::new());
        RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]))
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        let payload = format!("data:image/png;base64,{}", BASE64.encode(bytes.into_inner()));

        let result = recognizer.submit_image("img", payload).await.unwrap();
        assert_eq!(result, PredictionResult::collecting(1, 30));

        let err = recognizer
            .submit_image("bad", "%%%".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(recognizer.session("bad").await.unwrap().is_none());
    }

    #[test]
    fn test_label_count_must_match_model() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.5, 0.5]));
        let result = Recognizer::new(
            &config(7, false),
            FeatureExtractor::new(FeatureLayout::HandsOnly, Arc::new(NoopDetector)),
            classifier,
        );
        assert!(matches!(result, Err(ConfigError::Model(_))));
    }

    #[test]
    fn test_layout_must_match_model() {
        let classifier = Arc::new(FixedClassifier::new(vec![0.5, 0.5]));
        let result = Recognizer::new(
            &config(2, false),
            FeatureExtractor::new(FeatureLayout::Holistic, Arc::new(NoopDetector)),
            classifier,
        );
        assert!(matches!(result, Err(ConfigError::Model(_))));
    }
}

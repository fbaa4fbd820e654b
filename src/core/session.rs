//! Per-session window storage.
//!
//! The store maps session ids to [`FrameWindow`]s. Each session sits behind its
//! own async lock so that append-and-classify is atomic per session while
//! different sessions proceed in parallel. The map itself is bounded: new
//! sessions beyond `max_sessions` evict the least recently touched idle one,
//! and [`SessionStore::sweep_idle`] drops sessions that have gone quiet.
//!
//! With a persistence directory configured, every session is also mirrored to
//! `<dir>/<escaped-id>.json` as an array of frames. The file is read the first
//! time a session is touched in this process, rewritten after each change and
//! removed once the window is empty.

use crate::core::window::FrameWindow;
use crate::features::FeatureFrame;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Session id used when the caller does not supply one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Frames kept per session
    pub window_size: usize,
    /// Maximum sessions held in memory
    pub max_sessions: usize,
    /// Expected frame dimension; persisted windows of another shape are discarded
    pub frame_dim: Option<usize>,
    /// Directory for per-session files
    pub persist_dir: Option<PathBuf>,
}

/// Session store errors.
#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing a session file failed
    Io(String),
    /// Every session slot is in use
    Capacity(usize),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Session storage error: {e}"),
            StoreError::Capacity(max) => {
                write!(f, "All {max} session slots are busy")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Read-only view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub frames_collected: usize,
    pub frames: Vec<FeatureFrame>,
}

struct SessionSlot {
    window: FrameWindow,
    loaded: bool,
}

struct Entry {
    slot: Arc<AsyncMutex<SessionSlot>>,
    last_touched: Instant,
}

impl Entry {
    /// Nobody holds or is waiting on this session.
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.slot) == 1
    }
}

/// Owned map of session id to frame window.
pub struct SessionStore {
    config: StoreConfig,
    sessions: Mutex<HashMap<String, Entry>>,
    evicted: AtomicU64,
}

impl SessionStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config: StoreConfig {
                max_sessions: config.max_sessions.max(1),
                ..config
            },
            sessions: Mutex::new(HashMap::new()),
            evicted: AtomicU64::new(0),
        }
    }

    /// Lock a session for exclusive use, creating it if unseen.
    pub async fn lock(&self, session_id: &str) -> Result<SessionGuard, StoreError> {
        let slot = {
            let mut sessions = self.map();
            let now = Instant::now();

            match sessions.get_mut(session_id) {
                Some(entry) => {
                    entry.last_touched = now;
                    Arc::clone(&entry.slot)
                }
                None => {
                    if sessions.len() >= self.config.max_sessions {
                        self.evict_lru(&mut sessions)?;
                    }
                    let slot = Arc::new(AsyncMutex::new(SessionSlot {
                        window: FrameWindow::new(self.config.window_size),
                        loaded: false,
                    }));
                    sessions.insert(
                        session_id.to_string(),
                        Entry {
                            slot: Arc::clone(&slot),
                            last_touched: now,
                        },
                    );
                    tracing::debug!(session_id, "Created session");
                    slot
                }
            }
        };

        let mut slot = slot.lock_owned().await;
        let persist_path = self.session_path(session_id);

        if !slot.loaded {
            if let Some(ref path) = persist_path {
                if let Some(frames) = self.load_frames(path).await? {
                    slot.window = FrameWindow::from_frames(self.config.window_size, frames);
                }
            }
            slot.loaded = true;
        }

        Ok(SessionGuard {
            session_id: session_id.to_string(),
            slot,
            persist_path,
        })
    }

    /// Append a frame and return the resulting window length.
    pub async fn append(&self, session_id: &str, frame: FeatureFrame) -> Result<usize, StoreError> {
        let mut guard = self.lock(session_id).await?;
        let _ = guard.window_mut().push(frame);
        guard.persist().await?;
        Ok(guard.window().len())
    }

    /// Empty a session's window. Returns whether the session existed.
    pub async fn reset(&self, session_id: &str) -> Result<bool, StoreError> {
        if !self.exists(session_id).await {
            return Ok(false);
        }

        let mut guard = self.lock(session_id).await?;
        guard.window_mut().clear();
        guard.persist().await?;
        Ok(true)
    }

    /// Current contents of a session, if it exists.
    pub async fn get(&self, session_id: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        if !self.exists(session_id).await {
            return Ok(None);
        }

        let guard = self.lock(session_id).await?;
        Ok(Some(guard.snapshot()))
    }

    /// Number of sessions held in memory.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Sessions dropped by capacity eviction or idle sweeps so far.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Drop idle sessions untouched for longer than `ttl`.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        match Instant::now().checked_sub(ttl) {
            Some(cutoff) => self.sweep_idle_before(cutoff),
            None => 0,
        }
    }

    /// Drop idle sessions last touched before `cutoff`.
    pub fn sweep_idle_before(&self, cutoff: Instant) -> usize {
        let mut sessions = self.map();
        let before = sessions.len();
        sessions.retain(|_, entry| !(entry.is_idle() && entry.last_touched < cutoff));
        let removed = before - sessions.len();

        if removed > 0 {
            self.evicted.fetch_add(removed as u64, Ordering::Relaxed);
            tracing::info!(removed, remaining = sessions.len(), "Swept idle sessions");
        }
        removed
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn exists(&self, session_id: &str) -> bool {
        let in_memory = self.map().contains_key(session_id);
        if in_memory {
            return true;
        }
        match self.session_path(session_id) {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    fn evict_lru(&self, sessions: &mut HashMap<String, Entry>) -> Result<(), StoreError> {
        let victim = sessions
            .iter()
            .filter(|(_, entry)| entry.is_idle())
            .min_by_key(|(_, entry)| entry.last_touched)
            .map(|(id, _)| id.clone())
            .ok_or(StoreError::Capacity(self.config.max_sessions))?;

        sessions.remove(&victim);
        self.evicted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(session_id = %victim, "Evicted least recently used session");
        Ok(())
    }

    fn session_path(&self, session_id: &str) -> Option<PathBuf> {
        self.config
            .persist_dir
            .as_ref()
            .map(|dir| dir.join(session_file_name(session_id)))
    }

    async fn load_frames(&self, path: &Path) -> Result<Option<Vec<FeatureFrame>>, StoreError> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", path.display()))),
        };

        let frames: Vec<FeatureFrame> = match serde_json::from_slice(&content) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Discarding unreadable session file: {}", e);
                return Ok(None);
            }
        };

        if let Some(dim) = self.config.frame_dim {
            if frames.iter().any(|f| f.dim() != dim) {
                tracing::warn!(
                    path = %path.display(),
                    expected = dim,
                    "Discarding session file with mismatched frame dimension"
                );
                return Ok(None);
            }
        }

        Ok(Some(frames))
    }
}

/// Exclusive access to one session's window.
pub struct SessionGuard {
    session_id: String,
    slot: OwnedMutexGuard<SessionSlot>,
    persist_path: Option<PathBuf>,
}

impl SessionGuard {
    pub fn window(&self) -> &FrameWindow {
        &self.slot.window
    }

    pub fn window_mut(&mut self) -> &mut FrameWindow {
        &mut self.slot.window
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            frames_collected: self.slot.window.len(),
            frames: self.slot.window.to_vec(),
        }
    }

    /// Mirror the window to disk, if persistence is enabled.
    pub async fn persist(&self) -> Result<(), StoreError> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };

        if self.slot.window.is_empty() {
            return match tokio::fs::remove_file(path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StoreError::Io(format!("{}: {e}", path.display()))),
            };
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("{}: {e}", parent.display())))?;
        }

        let frames: Vec<&FeatureFrame> = self.slot.window.frames().collect();
        let json = serde_json::to_vec(&frames).map_err(|e| StoreError::Io(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
        Ok(())
    }
}

/// File name for a session, escaping anything outside `[A-Za-z0-9_-]`.
pub fn session_file_name(session_id: &str) -> String {
    let mut name = String::with_capacity(session_id.len() + 5);
    for byte in session_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            name.push(byte as char);
        } else {
            name.push_str(&format!("%{byte:02X}"));
        }
    }
    name.push_str(".json");
    name
}

//! Frame sources.
//!
//! A [`FrameSource`] fetches the bytes behind a [`FrameLocator`]. The
//! loader treats any failure as the end of a sequence, so sources report
//! *why* a fetch failed only for diagnostics.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use flipstage_sequence_model::sequence::FrameLocator;

/// Why a single frame could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("not found")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("content is not an image")]
    NotAnImage,
}

/// Trait for frame asset backends.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Fetch the raw bytes for one frame.
    async fn fetch(&self, locator: &FrameLocator) -> Result<Vec<u8>, FetchFailure>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Reads frames from a directory tree.
///
/// Locators are resolved relative to `root`, so
/// `/image-sequences/falling/0122.png` maps to
/// `{root}/image-sequences/falling/0122.png`.
#[derive(Debug, Clone)]
pub struct FsFrameSource {
    root: PathBuf,
}

impl FsFrameSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, locator: &FrameLocator) -> PathBuf {
        self.root.join(locator.as_str().trim_start_matches('/'))
    }
}

#[async_trait]
impl FrameSource for FsFrameSource {
    async fn fetch(&self, locator: &FrameLocator) -> Result<Vec<u8>, FetchFailure> {
        let path = self.path_for(locator);
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchFailure::NotFound,
            _ => FetchFailure::Transport(e.to_string()),
        })
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}

/// PNG file signature, enough for format detection.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// In-memory frames, used by simulations and tests.
///
/// Counts every fetch and can be told to fail specific locators a number
/// of times before succeeding.
#[derive(Debug, Default)]
pub struct MemoryFrameSource {
    frames: HashMap<String, Vec<u8>>,
    flaky: Mutex<HashMap<String, u32>>,
    fetches: AtomicUsize,
    fetched: Mutex<HashSet<String>>,
}

impl MemoryFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` PNG frames for `name`, numbered from `start_frame`.
    pub fn with_sequence(mut self, base_path: &str, name: &str, start_frame: u32, count: u32) -> Self {
        for frame in start_frame..start_frame.saturating_add(count) {
            let locator = FrameLocator::new(base_path, name, frame);
            self.frames.insert(locator.as_str().to_string(), PNG_SIGNATURE.to_vec());
        }
        self
    }

    /// Store arbitrary bytes at `locator`.
    pub fn insert(&mut self, locator: &FrameLocator, bytes: Vec<u8>) {
        self.frames.insert(locator.as_str().to_string(), bytes);
    }

    /// Remove the frame at `locator`.
    pub fn remove(&mut self, locator: &FrameLocator) {
        self.frames.remove(locator.as_str());
    }

    /// Make the next `times` fetches of `locator` fail with a transport error.
    pub fn fail_times(&self, locator: &FrameLocator, times: u32) {
        let mut flaky = self.flaky.lock().unwrap_or_else(|e| e.into_inner());
        flaky.insert(locator.as_str().to_string(), times);
    }

    /// Total number of fetch calls.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Whether `locator` has been fetched at least once.
    pub fn was_fetched(&self, locator: &FrameLocator) -> bool {
        let fetched = self.fetched.lock().unwrap_or_else(|e| e.into_inner());
        fetched.contains(locator.as_str())
    }
}

#[async_trait]
impl FrameSource for MemoryFrameSource {
    async fn fetch(&self, locator: &FrameLocator) -> Result<Vec<u8>, FetchFailure> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(locator.as_str().to_string());

        {
            let mut flaky = self.flaky.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(remaining) = flaky.get_mut(locator.as_str()) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchFailure::Transport("injected failure".to_string()));
                }
            }
        }

        // Yield so concurrent loads interleave the way network fetches do.
        tokio::task::yield_now().await;

        self.frames
            .get(locator.as_str())
            .cloned()
            .ok_or(FetchFailure::NotFound)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_source_serves_sequence() {
        let source = MemoryFrameSource::new().with_sequence("", "falling", 122, 2);
        let hit = FrameLocator::new("", "falling", 123);
        let miss = FrameLocator::new("", "falling", 124);

        assert_eq!(source.fetch(&hit).await.unwrap(), PNG_SIGNATURE.to_vec());
        assert_eq!(source.fetch(&miss).await, Err(FetchFailure::NotFound));
        assert_eq!(source.fetch_count(), 2);
        assert!(source.was_fetched(&miss));
    }

    #[tokio::test]
    async fn test_memory_source_flaky_then_ok() {
        let source = MemoryFrameSource::new().with_sequence("", "box-idle", 1, 1);
        let locator = FrameLocator::new("", "box-idle", 1);
        source.fail_times(&locator, 1);

        assert!(matches!(
            source.fetch(&locator).await,
            Err(FetchFailure::Transport(_))
        ));
        assert!(source.fetch(&locator).await.is_ok());
    }

    #[tokio::test]
    async fn test_fs_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let seq_dir = dir.path().join("image-sequences").join("box-idle");
        std::fs::create_dir_all(&seq_dir).unwrap();
        std::fs::write(seq_dir.join("0001.png"), PNG_SIGNATURE).unwrap();

        let source = FsFrameSource::new(dir.path());
        let present = FrameLocator::new("", "box-idle", 1);
        let absent = FrameLocator::new("", "box-idle", 2);

        assert!(source.fetch(&present).await.is_ok());
        assert_eq!(source.fetch(&absent).await, Err(FetchFailure::NotFound));
    }
}

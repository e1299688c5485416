//! Pre-warmed frame bytes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use flipstage_sequence_model::sequence::FrameLocator;

/// Bytes of every frame that probed successfully.
///
/// Cloning shares the same storage.
#[derive(Debug, Clone, Default)]
pub struct FrameCache {
    frames: Arc<Mutex<HashMap<FrameLocator, Arc<Vec<u8>>>>>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, locator: FrameLocator, bytes: Vec<u8>) -> Arc<Vec<u8>> {
        let bytes = Arc::new(bytes);
        let mut frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        frames.insert(locator, bytes.clone());
        bytes
    }

    pub fn get(&self, locator: &FrameLocator) -> Option<Arc<Vec<u8>>> {
        let frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        frames.get(locator).cloned()
    }

    pub fn contains(&self, locator: &FrameLocator) -> bool {
        let frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        frames.contains_key(locator)
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total cached bytes.
    pub fn total_bytes(&self) -> usize {
        let frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        frames.values().map(|b| b.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_storage() {
        let cache = FrameCache::new();
        let other = cache.clone();
        let locator = FrameLocator::new("", "box-idle", 1);

        cache.insert(locator.clone(), vec![1, 2, 3]);

        assert!(other.contains(&locator));
        assert_eq!(other.get(&locator).unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(other.total_bytes(), 3);
        assert_eq!(other.len(), 1);
    }
}

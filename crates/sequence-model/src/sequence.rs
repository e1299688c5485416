//! Frame sequences and frame locators.
//!
//! A [`Sequence`] is built once by the loader and never mutated. Frame `i`
//! in the list is asset number `start_frame + i`; the list stops at the
//! first asset that failed to resolve, so it never contains gaps.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::SequenceId;

/// Directory under the base path that holds all sequences.
pub const SEQUENCE_ROOT: &str = "image-sequences";

/// Location of one frame asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameLocator(String);

impl FrameLocator {
    /// Build the locator for `frame_number` of `sequence_name`.
    ///
    /// The frame number is zero-padded to four digits. A trailing `/` on
    /// `base_path` is ignored so `""` and `"/"` both give root-relative
    /// locators.
    pub fn new(base_path: &str, sequence_name: &str, frame_number: u32) -> Self {
        let base = base_path.trim_end_matches('/');
        Self(format!(
            "{base}/{SEQUENCE_ROOT}/{sequence_name}/{frame_number:04}.png"
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FrameLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Loaded sequences keyed by id, shared read-only between players.
pub type SequenceSet = BTreeMap<SequenceId, Arc<Sequence>>;

/// An ordered, immutable set of frames for one sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    id: SequenceId,
    start_frame: u32,
    frames: Vec<FrameLocator>,
}

impl Sequence {
    pub fn new(id: SequenceId, start_frame: u32, frames: Vec<FrameLocator>) -> Self {
        Self {
            id,
            start_frame,
            frames,
        }
    }

    /// A sequence with no resolvable frames.
    pub fn empty(id: SequenceId, start_frame: u32) -> Self {
        Self::new(id, start_frame, Vec::new())
    }

    pub fn id(&self) -> &SequenceId {
        &self.id
    }

    pub fn start_frame(&self) -> u32 {
        self.start_frame
    }

    pub fn frames(&self) -> &[FrameLocator] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Locator for list index `index`.
    pub fn frame(&self, index: usize) -> Option<&FrameLocator> {
        self.frames.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SequenceCatalog;
    use proptest::prelude::*;

    #[test]
    fn test_locator_is_zero_padded() {
        let locator = FrameLocator::new("", "box-idle", 13);
        assert_eq!(locator.as_str(), "/image-sequences/box-idle/0013.png");
    }

    #[test]
    fn test_locator_with_base_path() {
        let a = FrameLocator::new("https://cdn.example", "falling", 122);
        let b = FrameLocator::new("https://cdn.example/", "falling", 122);
        assert_eq!(a.as_str(), "https://cdn.example/image-sequences/falling/0122.png");
        assert_eq!(a, b);
    }

    #[test]
    fn test_locator_wider_than_four_digits() {
        let locator = FrameLocator::new("", "long", 12345);
        assert_eq!(locator.as_str(), "/image-sequences/long/12345.png");
    }

    #[test]
    fn test_asset_numbers_follow_start_frame() {
        let mut catalog = SequenceCatalog::new("");
        let id = catalog.register("falling", 122).unwrap();
        let frames = (122..125)
            .map(|n| FrameLocator::new("", "falling", n))
            .collect();
        let sequence = Sequence::new(id, 122, frames);

        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.start_frame(), 122);
        assert!(sequence.frame(3).is_none());
        assert_eq!(
            sequence.frame(1).unwrap().as_str(),
            "/image-sequences/falling/0123.png"
        );
    }

    #[test]
    fn test_empty_sequence() {
        let mut catalog = SequenceCatalog::new("");
        let id = catalog.register("ghost", 1).unwrap();
        let sequence = Sequence::empty(id, 1);
        assert!(sequence.is_empty());
        assert!(sequence.frame(0).is_none());
    }

    proptest! {
        #[test]
        fn prop_locator_file_stem_is_four_digits(frame in 0u32..10_000) {
            let locator = FrameLocator::new("", "seq", frame);
            let stem = locator
                .as_str()
                .rsplit('/')
                .next()
                .and_then(|file| file.strip_suffix(".png"))
                .unwrap();
            prop_assert_eq!(stem.len(), 4);
            prop_assert_eq!(stem.parse::<u32>().unwrap(), frame);
        }
    }
}

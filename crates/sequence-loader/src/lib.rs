//! Flipstage Sequence Loader
//!
//! Resolves a catalog sequence into its ordered frame list by probing
//! asset numbers `start, start + 1, ...` one at a time:
//!
//! - The first probe that fails ends the sequence, even if later assets
//!   exist. Optional retries can re-probe a failing frame first.
//! - Probing stops at `start + probe_ceiling` regardless.
//! - Each successful probe pre-warms the [`FrameCache`].
//! - Zero frames is a valid result, never an error.
//!
//! Different sequences load concurrently; one sequence's probes are
//! strictly sequential because the stop condition depends on order.

pub mod cache;
pub mod source;

use std::collections::BTreeSet;
use std::sync::Arc;

use flipstage_common::config::AssetConfig;
use flipstage_common::error::{Degradation, StageError, StageResult};
use flipstage_sequence_model::catalog::{SequenceCatalog, SequenceId};
use flipstage_sequence_model::sequence::{FrameLocator, Sequence, SequenceSet};

pub use cache::FrameCache;
pub use source::{FetchFailure, FrameSource, FsFrameSource, MemoryFrameSource};

/// Probe limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Maximum number of frames probed per sequence.
    pub probe_ceiling: u32,

    /// Extra attempts for a failing probe before it ends the sequence.
    pub max_probe_retries: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            probe_ceiling: 1000,
            max_probe_retries: 0,
        }
    }
}

impl From<&AssetConfig> for LoaderConfig {
    fn from(assets: &AssetConfig) -> Self {
        Self {
            probe_ceiling: assets.probe_ceiling,
            max_probe_retries: assets.max_probe_retries,
        }
    }
}

/// Loads sequences from a [`FrameSource`].
///
/// Cheap to clone; clones share the source, catalog, and cache.
#[derive(Clone)]
pub struct SequenceLoader {
    source: Arc<dyn FrameSource>,
    catalog: Arc<SequenceCatalog>,
    cache: FrameCache,
    config: LoaderConfig,
}

impl SequenceLoader {
    pub fn new(
        source: Arc<dyn FrameSource>,
        catalog: Arc<SequenceCatalog>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            source,
            catalog,
            cache: FrameCache::new(),
            config,
        }
    }

    pub fn catalog(&self) -> &SequenceCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    /// Load a sequence by name, rejecting names the catalog doesn't know.
    pub async fn load_by_name(&self, name: &str) -> StageResult<Arc<Sequence>> {
        let id = self.catalog.resolve(name)?;
        self.load(&id).await
    }

    /// Load a catalog sequence from its configured start frame.
    pub async fn load(&self, id: &SequenceId) -> StageResult<Arc<Sequence>> {
        let start_frame = self.catalog.start_frame(id).ok_or_else(|| {
            StageError::catalog(format!("sequence '{id}' belongs to another catalog"))
        })?;
        Ok(Arc::new(self.load_from(id, start_frame).await))
    }

    /// Probe `id` starting at asset number `start_frame`.
    ///
    /// Never fails: a sequence whose first probe fails is simply empty.
    pub async fn load_from(&self, id: &SequenceId, start_frame: u32) -> Sequence {
        let ceiling = start_frame.saturating_add(self.config.probe_ceiling);
        let mut frames = Vec::new();
        let mut frame = start_frame;

        tracing::debug!(sequence = %id, start_frame, ceiling, source = self.source.name(), "Probing sequence");

        while frame < ceiling {
            let locator = self.catalog.locator(id, frame);
            match self.probe(&locator).await {
                Ok(bytes) => {
                    self.cache.insert(locator.clone(), bytes);
                    frames.push(locator);
                    frame += 1;
                }
                Err(failure) => {
                    let end = Degradation::ExpectedEnd {
                        sequence: id.to_string(),
                        frame,
                        reason: failure.to_string(),
                    };
                    tracing::debug!("{end}");
                    break;
                }
            }
        }

        if frames.is_empty() {
            let empty = Degradation::EmptySequence {
                sequence: id.to_string(),
            };
            tracing::warn!("{empty}");
        } else {
            tracing::info!(sequence = %id, frames = frames.len(), "Sequence loaded");
        }

        Sequence::new(id.clone(), start_frame, frames)
    }

    /// Load several sequences concurrently, each distinct id once.
    pub async fn load_many<I>(&self, ids: I) -> StageResult<SequenceSet>
    where
        I: IntoIterator<Item = SequenceId>,
    {
        let unique: BTreeSet<SequenceId> = ids.into_iter().collect();
        let mut tasks = tokio::task::JoinSet::new();

        for id in unique {
            let loader = self.clone();
            tasks.spawn(async move {
                let sequence = loader.load(&id).await;
                (id, sequence)
            });
        }

        let mut loaded = SequenceSet::new();
        while let Some(joined) = tasks.join_next().await {
            let (id, sequence) = joined
                .map_err(|e| StageError::probe(format!("sequence load task failed: {e}")))?;
            loaded.insert(id, sequence?);
        }
        Ok(loaded)
    }

    /// Load every catalog sequence.
    pub async fn load_catalog(&self) -> StageResult<SequenceSet> {
        let ids: Vec<SequenceId> = self.catalog.entries().iter().map(|e| e.id.clone()).collect();
        self.load_many(ids).await
    }

    /// Fetch one frame, retrying up to the configured limit.
    async fn probe(&self, locator: &FrameLocator) -> Result<Vec<u8>, FetchFailure> {
        let mut attempt = 0;
        loop {
            let result = self
                .source
                .fetch(locator)
                .await
                .and_then(ensure_image);

            match result {
                Ok(bytes) => return Ok(bytes),
                Err(failure) if attempt < self.config.max_probe_retries => {
                    attempt += 1;
                    tracing::debug!(%locator, attempt, %failure, "Retrying frame probe");
                }
                Err(failure) => return Err(failure),
            }
        }
    }
}

/// Reject bytes that aren't a recognised image format.
fn ensure_image(bytes: Vec<u8>) -> Result<Vec<u8>, FetchFailure> {
    match image::guess_format(&bytes) {
        Ok(_) => Ok(bytes),
        Err(_) => Err(FetchFailure::NotAnImage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use source::PNG_SIGNATURE;

    fn catalog_with(entries: &[(&str, u32)]) -> Arc<SequenceCatalog> {
        let mut catalog = SequenceCatalog::new("");
        for (name, start) in entries {
            catalog.register(name, *start).unwrap();
        }
        Arc::new(catalog)
    }

    fn loader(source: MemoryFrameSource, catalog: Arc<SequenceCatalog>) -> SequenceLoader {
        SequenceLoader::new(Arc::new(source), catalog, LoaderConfig::default())
    }

    #[tokio::test]
    async fn test_loads_contiguous_frames() {
        let catalog = catalog_with(&[("falling", 122)]);
        let source = MemoryFrameSource::new().with_sequence("", "falling", 122, 50);
        let loader = loader(source, catalog);

        let sequence = loader.load_by_name("falling").await.unwrap();
        assert_eq!(sequence.len(), 50);
        assert_eq!(sequence.start_frame(), 122);
        assert_eq!(
            sequence.frame(0).unwrap().as_str(),
            "/image-sequences/falling/0122.png"
        );
        assert_eq!(
            sequence.frame(49).unwrap().as_str(),
            "/image-sequences/falling/0171.png"
        );
        assert_eq!(loader.cache().len(), 50);
    }

    #[tokio::test]
    async fn test_first_gap_ends_sequence() {
        let catalog = catalog_with(&[("box-idle", 1)]);
        let mut source = MemoryFrameSource::new().with_sequence("", "box-idle", 1, 10);
        source.remove(&FrameLocator::new("", "box-idle", 4));
        let loader = loader(source, catalog);

        let sequence = loader.load_by_name("box-idle").await.unwrap();
        assert_eq!(sequence.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_first_frame_gives_empty_sequence() {
        let catalog = catalog_with(&[("ghost", 1)]);
        let loader = loader(MemoryFrameSource::new(), catalog);

        let sequence = loader.load_by_name("ghost").await.unwrap();
        assert!(sequence.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_name_is_rejected() {
        let catalog = catalog_with(&[("box-idle", 1)]);
        let loader = loader(MemoryFrameSource::new(), catalog);

        let err = loader.load_by_name("nope").await.unwrap_err();
        assert!(matches!(err, StageError::UnknownSequence { .. }));
    }

    #[tokio::test]
    async fn test_non_image_content_ends_sequence() {
        let catalog = catalog_with(&[("box-idle", 1)]);
        let mut source = MemoryFrameSource::new().with_sequence("", "box-idle", 1, 5);
        source.insert(
            &FrameLocator::new("", "box-idle", 3),
            b"<html>404</html>".to_vec(),
        );
        let loader = loader(source, catalog);

        let sequence = loader.load_by_name("box-idle").await.unwrap();
        assert_eq!(sequence.len(), 2);
    }

    #[tokio::test]
    async fn test_probe_ceiling_caps_length() {
        let catalog = catalog_with(&[("long", 1)]);
        let source = MemoryFrameSource::new().with_sequence("", "long", 1, 20);
        let loader = SequenceLoader::new(
            Arc::new(source),
            catalog,
            LoaderConfig {
                probe_ceiling: 8,
                max_probe_retries: 0,
            },
        );

        let sequence = loader.load_by_name("long").await.unwrap();
        assert_eq!(sequence.len(), 8);
    }

    #[tokio::test]
    async fn test_transient_failure_without_retries_truncates() {
        let catalog = catalog_with(&[("box-idle", 1)]);
        let source = MemoryFrameSource::new().with_sequence("", "box-idle", 1, 6);
        source.fail_times(&FrameLocator::new("", "box-idle", 3), 1);
        let loader = loader(source, catalog);

        let sequence = loader.load_by_name("box-idle").await.unwrap();
        assert_eq!(sequence.len(), 2);
    }

    #[tokio::test]
    async fn test_retries_ride_out_transient_failure() {
        let catalog = catalog_with(&[("box-idle", 1)]);
        let source = MemoryFrameSource::new().with_sequence("", "box-idle", 1, 6);
        source.fail_times(&FrameLocator::new("", "box-idle", 3), 2);
        let loader = SequenceLoader::new(
            Arc::new(source),
            catalog,
            LoaderConfig {
                probe_ceiling: 1000,
                max_probe_retries: 2,
            },
        );

        let sequence = loader.load_by_name("box-idle").await.unwrap();
        assert_eq!(sequence.len(), 6);
    }

    #[tokio::test]
    async fn test_load_many_deduplicates() {
        let catalog = catalog_with(&[("box-idle", 1), ("falling", 122)]);
        let source = Arc::new(
            MemoryFrameSource::new()
                .with_sequence("", "box-idle", 1, 4)
                .with_sequence("", "falling", 122, 3),
        );
        let loader = SequenceLoader::new(source.clone(), catalog.clone(), LoaderConfig::default());

        let box_idle = catalog.resolve("box-idle").unwrap();
        let falling = catalog.resolve("falling").unwrap();
        let loaded = loader
            .load_many(vec![box_idle.clone(), falling.clone(), box_idle.clone()])
            .await
            .unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[&box_idle].len(), 4);
        assert_eq!(loaded[&falling].len(), 3);
        // 4 + 1 terminating probe, 3 + 1 terminating probe
        assert_eq!(source.fetch_count(), 9);
    }

    #[tokio::test]
    async fn test_load_catalog_includes_empty_sequences() {
        let catalog = catalog_with(&[("box-idle", 1), ("ghost", 1)]);
        let source = MemoryFrameSource::new().with_sequence("", "box-idle", 1, 2);
        let loader = loader(source, catalog.clone());

        let loaded = loader.load_catalog().await.unwrap();
        let ghost = catalog.resolve("ghost").unwrap();
        assert!(loaded[&ghost].is_empty());
    }

    #[tokio::test]
    async fn test_probing_is_sequential_and_stops_at_gap() {
        let catalog = catalog_with(&[("box-idle", 1)]);
        let mut source = MemoryFrameSource::new().with_sequence("", "box-idle", 1, 10);
        source.remove(&FrameLocator::new("", "box-idle", 3));
        let source = Arc::new(source);
        let loader = SequenceLoader::new(source.clone(), catalog, LoaderConfig::default());

        loader.load_by_name("box-idle").await.unwrap();
        assert!(source.was_fetched(&FrameLocator::new("", "box-idle", 3)));
        assert!(!source.was_fetched(&FrameLocator::new("", "box-idle", 4)));
        assert_eq!(source.fetch_count(), 3);
    }

    proptest! {
        #[test]
        fn prop_loaded_frames_are_prefix_before_first_gap(
            start in 0u32..500,
            available in proptest::collection::vec(any::<bool>(), 0..40),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let catalog = catalog_with(&[("seq", start)]);

            let mut source = MemoryFrameSource::new();
            for (i, present) in available.iter().enumerate() {
                if *present {
                    let locator = FrameLocator::new("", "seq", start + i as u32);
                    source.insert(&locator, PNG_SIGNATURE.to_vec());
                }
            }
            let expected = available.iter().take_while(|p| **p).count();

            let loader = loader(source, catalog);
            let sequence = rt.block_on(loader.load_by_name("seq")).unwrap();

            prop_assert_eq!(sequence.len(), expected);
            for (i, locator) in sequence.frames().iter().enumerate() {
                prop_assert_eq!(locator, &FrameLocator::new("", "seq", start + i as u32));
            }
        }
    }
}

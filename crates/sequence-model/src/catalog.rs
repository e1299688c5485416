//! Sequence catalog.
//!
//! The catalog maps sequence names to their start frame. Names are checked
//! once, here, and turned into [`SequenceId`] values; everything past the
//! boundary works with ids that are known to exist.

use std::fmt;

use flipstage_common::config::StageConfig;
use flipstage_common::error::{StageError, StageResult};
use serde::Serialize;

use crate::sequence::FrameLocator;

/// A sequence name that has been validated against a catalog.
///
/// Only [`SequenceCatalog`] can create these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SequenceId(String);

impl SequenceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: SequenceId,
    pub start_frame: u32,
}

/// Static registry of known sequences.
#[derive(Debug, Clone, Default)]
pub struct SequenceCatalog {
    base_path: String,
    entries: Vec<CatalogEntry>,
}

impl SequenceCatalog {
    /// Create an empty catalog whose locators start with `base_path`.
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            entries: Vec::new(),
        }
    }

    /// Build the catalog described by `config`.
    pub fn from_config(config: &StageConfig) -> StageResult<Self> {
        let mut catalog = Self::new(config.assets.base_path.clone());
        for entry in &config.sequences {
            catalog.register(&entry.name, entry.start_frame)?;
        }
        tracing::debug!(sequences = catalog.len(), "Sequence catalog built");
        Ok(catalog)
    }

    /// Register a sequence and return its id.
    pub fn register(&mut self, name: &str, start_frame: u32) -> StageResult<SequenceId> {
        validate_name(name)?;
        if self.entries.iter().any(|e| e.id.0 == name) {
            return Err(StageError::catalog(format!(
                "sequence '{name}' is registered twice"
            )));
        }
        let id = SequenceId(name.to_string());
        self.entries.push(CatalogEntry {
            id: id.clone(),
            start_frame,
        });
        Ok(id)
    }

    /// Look up a name, rejecting anything not registered.
    pub fn resolve(&self, name: &str) -> StageResult<SequenceId> {
        self.entries
            .iter()
            .find(|e| e.id.0 == name)
            .map(|e| e.id.clone())
            .ok_or_else(|| StageError::unknown_sequence(name))
    }

    pub fn entry(&self, id: &SequenceId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn start_frame(&self, id: &SequenceId) -> Option<u32> {
        self.entry(id).map(|e| e.start_frame)
    }

    /// Locator for asset number `frame_number` of `id`.
    pub fn locator(&self, id: &SequenceId, frame_number: u32) -> FrameLocator {
        FrameLocator::new(&self.base_path, id.as_str(), frame_number)
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Names become path segments, so they must stay inside one directory.
fn validate_name(name: &str) -> StageResult<()> {
    if name.is_empty() {
        return Err(StageError::catalog("sequence name must not be empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StageError::catalog(format!(
            "sequence name '{name}' is not a single path segment"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let catalog = SequenceCatalog::from_config(&StageConfig::default()).unwrap();
        let falling = catalog.resolve("falling").unwrap();
        assert_eq!(catalog.start_frame(&falling), Some(122));
        assert_eq!(
            catalog.locator(&falling, 122).as_str(),
            "/image-sequences/falling/0122.png"
        );
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let catalog = SequenceCatalog::from_config(&StageConfig::default()).unwrap();
        let err = catalog.resolve("does-not-exist").unwrap_err();
        assert!(matches!(err, StageError::UnknownSequence { .. }));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut catalog = SequenceCatalog::new("");
        catalog.register("box-idle", 1).unwrap();
        assert!(catalog.register("box-idle", 5).is_err());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_path_like_names_fail() {
        let mut catalog = SequenceCatalog::new("");
        assert!(catalog.register("", 1).is_err());
        assert!(catalog.register("..", 1).is_err());
        assert!(catalog.register("a/b", 1).is_err());
    }

    #[test]
    fn test_entries_keep_registration_order() {
        let mut catalog = SequenceCatalog::new("/assets");
        catalog.register("b", 1).unwrap();
        catalog.register("a", 7).unwrap();
        let names: Vec<_> = catalog.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(catalog.base_path(), "/assets");
    }
}

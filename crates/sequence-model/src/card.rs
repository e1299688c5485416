//! Carousel cards.

use flipstage_common::config::StageConfig;
use flipstage_common::error::StageResult;
use serde::Serialize;

use crate::catalog::{SequenceCatalog, SequenceId};

/// One card in the main-view carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardSpec {
    pub id: String,
    /// Flip-book sequence looped while the card is active.
    pub sequence: SequenceId,
    pub title: String,
    pub description: String,
    pub date: String,
}

/// Resolve the configured cards against `catalog`.
pub fn cards_from_config(
    config: &StageConfig,
    catalog: &SequenceCatalog,
) -> StageResult<Vec<CardSpec>> {
    config
        .cards
        .iter()
        .map(|card| {
            Ok(CardSpec {
                id: card.id.clone(),
                sequence: catalog.resolve(&card.sequence)?,
                title: card.title.clone(),
                description: card.description.clone(),
                date: card.date.clone(),
            })
        })
        .collect()
}

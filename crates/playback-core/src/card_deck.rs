//! Main-view card carousel.
//!
//! Each card owns a looping [`FramePlayer`]. At most one card is active;
//! activating another cancels the previous card's player before the new
//! one starts.

use std::sync::Arc;

use flipstage_common::clock::TimestampNs;
use flipstage_common::error::{StageError, StageResult};
use flipstage_sequence_model::card::CardSpec;
use flipstage_sequence_model::sequence::{FrameLocator, Sequence};

use crate::frame_player::{FramePlayer, PlaybackMode};

/// A card and its flip-book player.
#[derive(Debug)]
pub struct CardSlot {
    spec: CardSpec,
    sequence: Arc<Sequence>,
    player: FramePlayer,
}

impl CardSlot {
    pub fn new(spec: CardSpec, sequence: Arc<Sequence>) -> Self {
        Self {
            spec,
            sequence,
            player: FramePlayer::new(),
        }
    }

    pub fn spec(&self) -> &CardSpec {
        &self.spec
    }

    pub fn sequence(&self) -> &Arc<Sequence> {
        &self.sequence
    }

    pub fn player(&self) -> &FramePlayer {
        &self.player
    }
}

/// Ordered cards with a single active slot.
#[derive(Debug)]
pub struct CardDeck {
    slots: Vec<CardSlot>,
    active: Option<usize>,
    frame_rate: f64,
}

impl CardDeck {
    pub fn new(slots: Vec<CardSlot>, frame_rate: f64) -> Self {
        Self {
            slots,
            active: None,
            frame_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[CardSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&CardSlot> {
        self.slots.get(index)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    /// Make card `index` the active one.
    ///
    /// Re-activating the current card keeps its playback running.
    pub fn activate(&mut self, index: usize) -> StageResult<()> {
        if index >= self.slots.len() {
            return Err(StageError::CardOutOfRange {
                index,
                len: self.slots.len(),
            });
        }
        if self.active == Some(index) {
            return Ok(());
        }

        if let Some(previous) = self.active.take() {
            self.slots[previous].player.cancel();
        }

        let slot = &mut self.slots[index];
        if slot.sequence.is_empty() {
            tracing::warn!(card = %slot.spec.id, sequence = %slot.sequence.id(), "Card sequence has no frames");
        }
        slot.player.start(slot.sequence.clone(), self.frame_rate, PlaybackMode::Loop);
        self.active = Some(index);
        tracing::debug!(card = %slot.spec.id, index, "Card activated");
        Ok(())
    }

    /// Activate the next card, wrapping from the last to the first.
    pub fn advance(&mut self) -> Option<usize> {
        let next = match self.active {
            _ if self.slots.is_empty() => return None,
            Some(i) => (i + 1) % self.slots.len(),
            None => 0,
        };
        self.activate(next).ok().map(|_| next)
    }

    /// Activate the previous card, wrapping from the first to the last.
    pub fn retreat(&mut self) -> Option<usize> {
        let len = self.slots.len();
        let prev = match self.active {
            _ if len == 0 => return None,
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        self.activate(prev).ok().map(|_| prev)
    }

    /// Cancel the active card's player and leave no card active.
    pub fn deactivate(&mut self) {
        if let Some(previous) = self.active.take() {
            self.slots[previous].player.cancel();
        }
    }

    /// Tick the active card only.
    pub fn update(&mut self, now: TimestampNs) -> Option<usize> {
        let index = self.active?;
        self.slots[index].player.tick(now).map(|t| t.index)
    }

    /// Active card's frame on screen.
    pub fn current_frame(&self) -> Option<(&FrameLocator, usize)> {
        self.active.and_then(|i| self.slots[i].player.current_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipstage_sequence_model::catalog::SequenceCatalog;

    const SEC: u64 = 1_000_000_000;

    fn deck(count: usize, frames: u32) -> CardDeck {
        let mut catalog = SequenceCatalog::new("");
        let id = catalog.register("box-idle", 1).unwrap();
        let sequence = Arc::new(Sequence::new(
            id.clone(),
            1,
            (1..=frames).map(|n| catalog.locator(&id, n)).collect(),
        ));
        let slots = (0..count)
            .map(|i| {
                let spec = CardSpec {
                    id: (i + 1).to_string(),
                    sequence: id.clone(),
                    title: format!("Card {}", i + 1),
                    description: String::new(),
                    date: String::new(),
                };
                CardSlot::new(spec, sequence.clone())
            })
            .collect();
        CardDeck::new(slots, 12.0)
    }

    #[test]
    fn test_selecting_card_cancels_previous() {
        let mut deck = deck(3, 24);
        deck.activate(0).unwrap();
        deck.update(0);
        deck.update(SEC / 2);
        let observed = deck.slot(0).unwrap().player().ticks_observed();
        assert!(deck.is_active(0));

        deck.activate(2).unwrap();
        assert!(!deck.slot(0).unwrap().player().is_active());
        assert_eq!(deck.update(SEC), Some(0));

        deck.update(2 * SEC);
        assert_eq!(deck.slot(0).unwrap().player().ticks_observed(), observed);
        assert!(deck.is_active(2));
        assert!(!deck.is_active(0));
    }

    #[test]
    fn test_reactivating_same_card_keeps_playing() {
        let mut deck = deck(2, 24);
        deck.activate(1).unwrap();
        let generation = deck.slot(1).unwrap().player().generation();
        deck.activate(1).unwrap();
        assert_eq!(deck.slot(1).unwrap().player().generation(), generation);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut deck = deck(3, 24);
        let err = deck.activate(3).unwrap_err();
        assert!(matches!(err, StageError::CardOutOfRange { index: 3, len: 3 }));
        assert_eq!(deck.active_index(), None);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut deck = deck(3, 24);
        assert_eq!(deck.advance(), Some(0));
        assert_eq!(deck.retreat(), Some(2));
        assert_eq!(deck.advance(), Some(0));
        assert_eq!(deck.advance(), Some(1));
    }

    #[test]
    fn test_empty_deck_navigation_is_noop() {
        let mut deck = deck(0, 24);
        assert_eq!(deck.advance(), None);
        assert_eq!(deck.retreat(), None);
        assert_eq!(deck.update(0), None);
    }

    #[test]
    fn test_deactivate_stops_active_player() {
        let mut deck = deck(2, 24);
        deck.activate(0).unwrap();
        deck.deactivate();
        assert_eq!(deck.active_index(), None);
        assert!(!deck.slot(0).unwrap().player().is_active());
        assert!(deck.current_frame().is_none());
    }
}

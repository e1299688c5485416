//! Frame player: wall-clock time to frame index.
//!
//! A [`FramePlayer`] turns timestamps into an index into a [`Sequence`].
//! The first tick after [`FramePlayer::start`] anchors playback, so the
//! first displayed frame is always index 0 no matter how late that tick
//! arrives. After that the index is
//! `floor(elapsed_secs * frame_rate)`, clamped (one-shot) or wrapped
//! (loop) to the sequence length.
//!
//! Ticks are O(1) and touch nothing but the player's own state.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use flipstage_common::clock::TimestampNs;
use flipstage_common::scheduler::{CancelToken, TickScheduler};
use flipstage_sequence_model::sequence::{FrameLocator, Sequence};
use serde::{Deserialize, Serialize};

const NS_PER_SEC: u64 = 1_000_000_000;

/// How playback behaves at the end of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Play once, hold the last frame, signal completion once.
    OneShot,
    /// Wrap around forever.
    Loop,
}

/// Emitted by the tick on which a one-shot playback reaches its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSignal {
    /// Which `start()` call this completion belongs to.
    pub generation: u64,
    /// Index held after completion (`len - 1`).
    pub final_index: usize,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    pub index: usize,
    pub completion: Option<CompletionSignal>,
}

/// Mutable playback state, changed only by the owning player.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub sequence: Option<Arc<Sequence>>,
    pub frame_rate: f64,
    pub mode: PlaybackMode,
    pub start_time_ns: Option<TimestampNs>,
    pub current_index: usize,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            sequence: None,
            frame_rate: 0.0,
            mode: PlaybackMode::Loop,
            start_time_ns: None,
            current_index: 0,
        }
    }
}

/// Frame index reached after `elapsed_ns` at `frame_rate`.
///
/// Whole seconds and the sub-second remainder are scaled separately so
/// integer rates stay exact for the full `u64` nanosecond range.
pub fn frame_index_at(elapsed_ns: u64, frame_rate: f64) -> u64 {
    if !(frame_rate > 0.0 && frame_rate.is_finite()) {
        return 0;
    }
    let whole_secs = elapsed_ns / NS_PER_SEC;
    let rem_ns = elapsed_ns % NS_PER_SEC;

    let base = whole_secs as f64 * frame_rate;
    let base_floor = base.floor();
    let frac = (base - base_floor) + rem_ns as f64 * frame_rate / NS_PER_SEC as f64;
    (base_floor + frac.floor()) as u64
}

/// A single playback slot.
#[derive(Debug, Default)]
pub struct FramePlayer {
    state: PlaybackState,
    generation: u64,
    active: bool,
    completed: bool,
    completion_emitted: bool,
    ticks_observed: u64,
    subscription: Option<CancelToken>,
}

impl FramePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin playing `sequence` from index 0.
    ///
    /// Any previous playback is discarded. Returns the new generation,
    /// which tags this playback's completion signal.
    pub fn start(&mut self, sequence: Arc<Sequence>, frame_rate: f64, mode: PlaybackMode) -> u64 {
        if !(frame_rate > 0.0 && frame_rate.is_finite()) {
            tracing::warn!(sequence = %sequence.id(), frame_rate, "Non-positive frame rate; playback will hold frame 0");
        }
        self.generation += 1;
        tracing::debug!(
            sequence = %sequence.id(),
            frames = sequence.len(),
            frame_rate,
            ?mode,
            generation = self.generation,
            "Playback started"
        );
        self.state = PlaybackState {
            sequence: Some(sequence),
            frame_rate,
            mode,
            start_time_ns: None,
            current_index: 0,
        };
        self.active = true;
        self.completed = false;
        self.completion_emitted = false;
        self.generation
    }

    /// Advance to `now` and return the frame to display.
    ///
    /// `None` when the player is stopped or the sequence has no frames.
    pub fn tick(&mut self, now: TimestampNs) -> Option<FrameTick> {
        if !self.active {
            return None;
        }
        let len = self.state.sequence.as_ref().map_or(0, |s| s.len());
        if len == 0 {
            return None;
        }
        self.ticks_observed += 1;

        if self.completed {
            return Some(FrameTick {
                index: self.state.current_index,
                completion: None,
            });
        }

        let start = *self.state.start_time_ns.get_or_insert(now);
        let raw = frame_index_at(now.saturating_sub(start), self.state.frame_rate);

        let mut completion = None;
        self.state.current_index = match self.state.mode {
            PlaybackMode::Loop => (raw % len as u64) as usize,
            PlaybackMode::OneShot if raw >= len as u64 => {
                self.completed = true;
                if !self.completion_emitted {
                    self.completion_emitted = true;
                    completion = Some(CompletionSignal {
                        generation: self.generation,
                        final_index: len - 1,
                    });
                }
                len - 1
            }
            PlaybackMode::OneShot => raw as usize,
        };

        Some(FrameTick {
            index: self.state.current_index,
            completion,
        })
    }

    /// Stop playback and forget the anchor time.
    ///
    /// Cancels the bound scheduler registration, if any. Safe to call
    /// repeatedly.
    pub fn cancel(&mut self) {
        if let Some(token) = self.subscription.take() {
            token.cancel();
        }
        if self.active {
            tracing::trace!(generation = self.generation, "Playback cancelled");
        }
        self.active = false;
        self.state.start_time_ns = None;
        self.state.current_index = 0;
    }

    /// Tie a scheduler registration to this player's lifetime.
    pub fn bind_subscription(&mut self, token: CancelToken) {
        if let Some(previous) = self.subscription.replace(token) {
            previous.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a one-shot playback has reached its last frame.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    /// Ticks that produced a frame since creation.
    pub fn ticks_observed(&self) -> u64 {
        self.ticks_observed
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn sequence(&self) -> Option<&Arc<Sequence>> {
        self.state.sequence.as_ref()
    }

    /// Locator and index of the frame currently shown.
    pub fn current_frame(&self) -> Option<(&FrameLocator, usize)> {
        if !self.active {
            return None;
        }
        let index = self.state.current_index;
        self.state
            .sequence
            .as_ref()
            .and_then(|s| s.frame(index))
            .map(|locator| (locator, index))
    }
}

/// Player shared with a scheduler callback.
pub type SharedPlayer = Rc<RefCell<FramePlayer>>;

/// Drive `player` from `scheduler` until the player is cancelled.
///
/// The callback holds only a weak reference, so dropping the player also
/// ends the registration's effect.
pub fn schedule_player(player: &SharedPlayer, scheduler: &mut dyn TickScheduler) -> CancelToken {
    let weak = Rc::downgrade(player);
    let token = scheduler.register_tick(Box::new(move |now| {
        if let Some(player) = weak.upgrade() {
            player.borrow_mut().tick(now);
        }
    }));
    player.borrow_mut().bind_subscription(token.clone());
    token
}

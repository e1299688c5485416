//! Intro-to-main view sequencing.
//!
//! ```text
//! IntroIdle --advance--> IntroTransition --completion--> Main
//! ```
//!
//! The intro slot loops an idle sequence until the user advances, then
//! plays a transition sequence once. The controller accepts exactly one
//! completion for the transition it started; duplicates and stale
//! signals are suppressed here, whichever collaborator sent them. A
//! transition with no frames completes on the next update.

use std::sync::Arc;

use flipstage_common::clock::TimestampNs;
use flipstage_common::error::Degradation;
use flipstage_sequence_model::sequence::{FrameLocator, Sequence};
use serde::{Deserialize, Serialize};

use crate::frame_player::{CompletionSignal, FramePlayer, PlaybackMode};

/// Which part of the scene is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    IntroIdle,
    IntroTransition,
    Main,
}

/// Sequences played in the intro slot.
#[derive(Debug, Clone)]
pub struct IntroSequences {
    pub idle: Arc<Sequence>,
    pub transition: Arc<Sequence>,
    pub frame_rate: f64,
}

/// What an update or completion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEvent {
    /// The view moved to a new state.
    Entered(ViewState),
    /// A completion was ignored.
    Suppressed(Degradation),
}

/// Result of one controller update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
    pub state: ViewState,
    /// Intro frame index, while an intro sequence is showing.
    pub frame: Option<usize>,
    pub event: Option<TransitionEvent>,
}

/// Drives the intro slot and decides when the main view begins.
#[derive(Debug)]
pub struct ViewTransitionController {
    state: ViewState,
    intro: IntroSequences,
    player: FramePlayer,
    awaiting: Option<u64>,
    suppressed: u64,
}

impl ViewTransitionController {
    /// Start in `IntroIdle` with the idle loop playing.
    pub fn new(intro: IntroSequences) -> Self {
        let mut player = FramePlayer::new();
        player.start(intro.idle.clone(), intro.frame_rate, PlaybackMode::Loop);
        Self {
            state: ViewState::IntroIdle,
            intro,
            player,
            awaiting: None,
            suppressed: 0,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// The user asked to leave the intro.
    ///
    /// Only acts in `IntroIdle`. Returns whether the state changed.
    pub fn advance(&mut self) -> bool {
        if self.state != ViewState::IntroIdle {
            tracing::debug!(state = ?self.state, "Advance ignored outside intro idle");
            return false;
        }

        self.player.cancel();
        let generation = self.player.start(
            self.intro.transition.clone(),
            self.intro.frame_rate,
            PlaybackMode::OneShot,
        );
        self.awaiting = Some(generation);
        self.set_state(ViewState::IntroTransition);
        true
    }

    /// Tick the intro player and apply any transition that results.
    pub fn update(&mut self, now: TimestampNs) -> ViewUpdate {
        if self.state == ViewState::IntroTransition && self.intro.transition.is_empty() {
            let empty = Degradation::EmptySequence {
                sequence: self.intro.transition.id().to_string(),
            };
            tracing::warn!("{empty}; treating transition as complete");
            let event = self.enter_main();
            return ViewUpdate {
                state: self.state,
                frame: None,
                event: Some(event),
            };
        }

        let tick = self.player.tick(now);
        let event = tick
            .and_then(|t| t.completion)
            .map(|signal| self.on_completion(signal));

        ViewUpdate {
            state: self.state,
            frame: if self.state == ViewState::Main {
                None
            } else {
                tick.map(|t| t.index)
            },
            event,
        }
    }

    /// Handle a completion signal from any source.
    ///
    /// Only the first signal for the transition currently playing moves
    /// the view to `Main`; everything else is suppressed.
    pub fn on_completion(&mut self, signal: CompletionSignal) -> TransitionEvent {
        let expected = self.state == ViewState::IntroTransition
            && self.awaiting == Some(signal.generation);

        if !expected {
            self.suppressed += 1;
            let duplicate = Degradation::DoubleCompletion {
                generation: signal.generation,
            };
            tracing::debug!(state = ?self.state, "{duplicate} suppressed");
            return TransitionEvent::Suppressed(duplicate);
        }

        self.enter_main()
    }

    /// Stop intro playback without changing state.
    pub fn teardown(&mut self) {
        self.player.cancel();
    }

    /// Completions ignored so far.
    pub fn suppressed_completions(&self) -> u64 {
        self.suppressed
    }

    pub fn player(&self) -> &FramePlayer {
        &self.player
    }

    /// Locator and index of the intro frame on screen.
    pub fn current_frame(&self) -> Option<(&FrameLocator, usize)> {
        match self.state {
            ViewState::Main => None,
            _ => self.player.current_frame(),
        }
    }

    fn enter_main(&mut self) -> TransitionEvent {
        self.awaiting = None;
        self.player.cancel();
        self.set_state(ViewState::Main);
        TransitionEvent::Entered(ViewState::Main)
    }

    fn set_state(&mut self, next: ViewState) {
        tracing::info!(from = ?self.state, to = ?next, "View state changed");
        self.state = next;
    }
}

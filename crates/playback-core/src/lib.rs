//! Flipstage Playback Core
//!
//! Drives a presentation from synthetic or real refresh ticks:
//! - **Frame Player:** Wall-clock time to frame index, one-shot or looping
//! - **View Transition:** Intro idle loop, one-shot transition, main view
//! - **Card Deck:** One looping flip-book per card, one card live at a time
//! - **Auto-Framer:** Camera distance from object bounds, blended per tick
//! - **Scene:** All of the above advanced from a single update callback
//!
//! No I/O happens here. Sequences arrive already loaded, and the renderer
//! is reached only through [`scene::RenderCollaborator`].

pub mod auto_framer;
pub mod card_deck;
pub mod frame_player;
pub mod intent;
pub mod scene;
pub mod view_transition;

pub use auto_framer::{CameraAutoFramer, CameraRig, FramingConfig, FramingOutcome, PerspectiveCamera};
pub use card_deck::CardDeck;
pub use frame_player::{FramePlayer, PlaybackMode};
pub use intent::{SwipeTracker, UserIntent};
pub use scene::{HeadlessRenderer, RenderCollaborator, Scene, SceneSnapshot};
pub use view_transition::{ViewState, ViewTransitionController};

//! Scene orchestration.
//!
//! A [`Scene`] owns the intro controller, the card deck and the camera
//! framer, and advances all of them from one [`Scene::tick`] call per
//! display refresh. Order within a tick: intro view, card deck, then the
//! camera, which reads bounds after the renderer has updated the object.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use flipstage_common::clock::TimestampNs;
use flipstage_common::config::StageConfig;
use flipstage_common::error::{StageError, StageResult};
use flipstage_common::scheduler::{CancelToken, TickScheduler};
use flipstage_sequence_model::card::cards_from_config;
use flipstage_sequence_model::catalog::{SequenceCatalog, SequenceId};
use flipstage_sequence_model::geometry::{BoundingBox, CameraPose};
use flipstage_sequence_model::sequence::{FrameLocator, Sequence, SequenceSet};
use glam::DVec3;
use serde::Serialize;

use crate::auto_framer::{
    CameraAutoFramer, CameraControls, CameraRig, FramingConfig, FramingStatus, PerspectiveCamera,
};
use crate::card_deck::{CardDeck, CardSlot};
use crate::frame_player::CompletionSignal;
use crate::intent::UserIntent;
use crate::view_transition::{IntroSequences, TransitionEvent, ViewState, ViewTransitionController};

/// What the scene needs from the 3D renderer.
pub trait RenderCollaborator {
    /// World-space bounds of the tracked object, once it has loaded.
    fn tracked_bounds(&self) -> Option<BoundingBox>;

    /// The camera the framer drives.
    fn camera(&mut self) -> &mut dyn CameraRig;
}

/// Renderer stand-in with a static object and a plain camera.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    pub bounds: Option<BoundingBox>,
    pub camera: PerspectiveCamera,
}

impl HeadlessRenderer {
    pub fn new(bounds: Option<BoundingBox>, pose: CameraPose) -> Self {
        Self {
            bounds,
            camera: PerspectiveCamera::new(pose),
        }
    }

    /// An object of `size` centered at `center`, default camera.
    pub fn with_object(center: DVec3, size: DVec3) -> Self {
        Self::new(
            Some(BoundingBox::from_center_size(center, size)),
            CameraPose::default(),
        )
    }
}

impl RenderCollaborator for HeadlessRenderer {
    fn tracked_bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    fn camera(&mut self) -> &mut dyn CameraRig {
        &mut self.camera
    }
}

/// A displayed frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameView {
    pub locator: String,
    pub index: usize,
}

impl FrameView {
    fn from_parts((locator, index): (&FrameLocator, usize)) -> Self {
        Self {
            locator: locator.as_str().to_string(),
            index,
        }
    }
}

/// Presentation state after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub view_state: ViewState,
    pub intro_frame: Option<FrameView>,
    pub active_card: Option<usize>,
    pub card_frame: Option<FrameView>,
    pub camera: Option<FramingStatus>,
    pub controls: CameraControls,
    pub suppressed_completions: u64,
    pub ticks: u64,
}

/// The intro, the card carousel and the camera for one presentation.
#[derive(Debug)]
pub struct Scene {
    view: ViewTransitionController,
    deck: CardDeck,
    framer: CameraAutoFramer,
    selected_card: usize,
    main_started: bool,
    ticks: u64,
    subscription: Option<CancelToken>,
}

impl Scene {
    /// Build a scene from loaded sequences.
    ///
    /// Sequences missing from `sequences` are treated as empty.
    pub fn new(
        config: &StageConfig,
        catalog: &SequenceCatalog,
        sequences: &SequenceSet,
    ) -> StageResult<Self> {
        for (what, rate) in [
            ("intro", config.intro.frame_rate),
            ("card", config.playback.card_frame_rate),
        ] {
            if !(rate > 0.0 && rate.is_finite()) {
                return Err(StageError::playback(format!(
                    "{what} frame rate must be positive, got {rate}"
                )));
            }
        }

        let lookup = |id: &SequenceId| -> Arc<Sequence> {
            sequences.get(id).cloned().unwrap_or_else(|| {
                tracing::warn!(sequence = %id, "Sequence not loaded; using an empty one");
                Arc::new(Sequence::empty(
                    id.clone(),
                    catalog.start_frame(id).unwrap_or(1),
                ))
            })
        };

        let intro = IntroSequences {
            idle: lookup(&catalog.resolve(&config.intro.idle_sequence)?),
            transition: lookup(&catalog.resolve(&config.intro.transition_sequence)?),
            frame_rate: config.intro.frame_rate,
        };

        let slots = cards_from_config(config, catalog)?
            .into_iter()
            .map(|spec| {
                let sequence = lookup(&spec.sequence);
                CardSlot::new(spec, sequence)
            })
            .collect();

        tracing::info!(
            idle = %intro.idle.id(),
            idle_frames = intro.idle.len(),
            transition = %intro.transition.id(),
            transition_frames = intro.transition.len(),
            cards = config.cards.len(),
            "Scene built"
        );

        Ok(Self {
            view: ViewTransitionController::new(intro),
            deck: CardDeck::new(slots, config.playback.card_frame_rate),
            framer: CameraAutoFramer::new(FramingConfig::from(&config.camera)),
            selected_card: 0,
            main_started: false,
            ticks: 0,
            subscription: None,
        })
    }

    pub fn view_state(&self) -> ViewState {
        self.view.state()
    }

    pub fn view(&self) -> &ViewTransitionController {
        &self.view
    }

    pub fn deck(&self) -> &CardDeck {
        &self.deck
    }

    pub fn framer(&self) -> &CameraAutoFramer {
        &self.framer
    }

    /// Apply a user intent.
    ///
    /// Navigation before the main view only advances the intro; camera
    /// controls apply in every state.
    pub fn handle_intent(&mut self, intent: UserIntent) -> StageResult<()> {
        tracing::debug!(%intent, state = ?self.view.state(), "Intent received");
        match intent {
            UserIntent::Advance => match self.view.state() {
                ViewState::IntroIdle => {
                    self.view.advance();
                }
                ViewState::IntroTransition => {}
                ViewState::Main => {
                    if let Some(index) = self.deck.advance() {
                        self.selected_card = index;
                    }
                }
            },
            UserIntent::Retreat => {
                if self.view.state() == ViewState::Main {
                    if let Some(index) = self.deck.retreat() {
                        self.selected_card = index;
                    }
                }
            }
            UserIntent::SelectCard(index) => {
                if index >= self.deck.len() {
                    return Err(StageError::CardOutOfRange {
                        index,
                        len: self.deck.len(),
                    });
                }
                if self.view.state() == ViewState::Main {
                    self.deck.activate(index)?;
                    self.selected_card = index;
                } else {
                    tracing::debug!(index, "Card selection ignored before main view");
                }
            }
            UserIntent::ToggleFreeLook => {
                self.framer.toggle_free_look();
            }
            UserIntent::SetZoom(zoom) => self.framer.set_zoom(zoom),
            UserIntent::SetVerticalPan(pan) => self.framer.set_vertical_pan(pan),
        }
        Ok(())
    }

    /// Forward a completion from an outside collaborator.
    pub fn on_completion(&mut self, signal: CompletionSignal) -> TransitionEvent {
        self.view.on_completion(signal)
    }

    /// Advance everything to `now`.
    pub fn tick(&mut self, now: TimestampNs, renderer: &mut dyn RenderCollaborator) -> SceneSnapshot {
        self.view.update(now);

        if self.view.state() == ViewState::Main && !self.main_started {
            self.start_main();
        }
        self.deck.update(now);

        let bounds = renderer.tracked_bounds();
        self.framer.tick(bounds.as_ref(), renderer.camera());

        self.ticks += 1;
        self.snapshot()
    }

    /// Current presentation state.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            view_state: self.view.state(),
            intro_frame: self.view.current_frame().map(FrameView::from_parts),
            active_card: self.deck.active_index(),
            card_frame: self.deck.current_frame().map(FrameView::from_parts),
            camera: self.framer.last_outcome().map(|o| o.status()),
            controls: *self.framer.controls(),
            suppressed_completions: self.view.suppressed_completions(),
            ticks: self.ticks,
        }
    }

    /// Drive `scene` from `scheduler` with a single update callback.
    ///
    /// The registration ends when the scene is torn down or dropped.
    pub fn install<R>(
        scene: &Rc<RefCell<Scene>>,
        renderer: Rc<RefCell<R>>,
        scheduler: &mut dyn TickScheduler,
    ) -> CancelToken
    where
        R: RenderCollaborator + 'static,
    {
        let weak = Rc::downgrade(scene);
        let token = scheduler.register_tick(Box::new(move |now| {
            if let Some(scene) = weak.upgrade() {
                let mut renderer = renderer.borrow_mut();
                scene.borrow_mut().tick(now, &mut *renderer);
            }
        }));

        let mut scene = scene.borrow_mut();
        if let Some(previous) = scene.subscription.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Stop all playback and the scheduler registration.
    pub fn teardown(&mut self) {
        if let Some(token) = self.subscription.take() {
            token.cancel();
        }
        self.view.teardown();
        self.deck.deactivate();
        tracing::info!(ticks = self.ticks, "Scene torn down");
    }

    fn start_main(&mut self) {
        self.main_started = true;
        if self.deck.is_empty() {
            tracing::warn!("Main view has no cards");
            return;
        }
        if let Err(e) = self.deck.activate(self.selected_card) {
            tracing::warn!("Could not activate card {}: {e}", self.selected_card);
        }
    }
}

//! Camera auto-framing.
//!
//! # Algorithm
//!
//! 1. `max_dimension = max(size.x, size.y, size.z) * padding_factor`.
//! 2. `distance = (max_dimension / 2) / tan(fov / 2)`, divided by the
//!    user's zoom.
//! 3. Target look-at is the box center; target position is the center
//!    plus `offset * distance`. Vertical pan shifts both along world Y by
//!    `pan * max_dimension`.
//! 4. The live position moves `blend_factor` of the way to the target
//!    each tick, an exponential approach with no popping.
//!
//! The framer never owns the camera. It reads the live pose through
//! [`CameraRig`] and writes position and look-at back. In free-look mode
//! it writes nothing, and leaving free-look resumes from wherever the
//! camera was moved to.

use flipstage_common::config::CameraConfig;
use flipstage_common::error::Degradation;
use flipstage_sequence_model::geometry::{BoundingBox, CameraPose};
use glam::DVec3;
use serde::Serialize;

/// Framing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramingConfig {
    /// Multiplier on the largest dimension so the object never clips.
    pub padding_factor: f64,
    /// Fraction of the remaining distance covered per tick.
    pub blend_factor: f64,
    /// Camera direction from the object center, scaled by distance.
    pub offset: DVec3,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self::from(&CameraConfig::default())
    }
}

impl From<&CameraConfig> for FramingConfig {
    fn from(config: &CameraConfig) -> Self {
        Self {
            padding_factor: config.padding_factor,
            blend_factor: config.blend_factor,
            offset: DVec3::from_array(config.offset),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }
}

/// User-owned camera controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraControls {
    pub free_look: bool,
    /// Requested zoom; clamped to the configured range when used.
    pub zoom: f64,
    /// Vertical offset as a fraction of the padded largest dimension.
    pub vertical_pan: f64,
}

impl Default for CameraControls {
    fn default() -> Self {
        Self {
            free_look: false,
            zoom: 1.0,
            vertical_pan: 0.0,
        }
    }
}

/// The renderer's camera, as seen by the framer.
pub trait CameraRig {
    /// Current live pose.
    fn pose(&self) -> CameraPose;

    /// Move the camera.
    fn write_pose(&mut self, position: DVec3, look_at: DVec3);
}

/// A plain perspective camera.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerspectiveCamera {
    pub pose: CameraPose,
    /// Pose writes received.
    pub writes: u64,
}

impl PerspectiveCamera {
    pub fn new(pose: CameraPose) -> Self {
        Self { pose, writes: 0 }
    }
}

impl CameraRig for PerspectiveCamera {
    fn pose(&self) -> CameraPose {
        self.pose
    }

    fn write_pose(&mut self, position: DVec3, look_at: DVec3) {
        self.pose.position = position;
        self.pose.look_at = look_at;
        self.writes += 1;
    }
}

/// Distance at which `max_dimension` fills a vertical field of view of
/// `fov_degrees`.
///
/// `None` for a non-positive dimension or a field of view outside
/// (0, 180) degrees.
pub fn framing_distance(max_dimension: f64, fov_degrees: f64) -> Option<f64> {
    if !(max_dimension.is_finite() && max_dimension > 0.0) {
        return None;
    }
    if !(fov_degrees.is_finite() && fov_degrees > 0.0 && fov_degrees < 180.0) {
        return None;
    }
    let half_fov = fov_degrees.to_radians() / 2.0;
    Some((max_dimension / 2.0) / half_fov.tan())
}

/// Pose the camera is heading for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FramingTarget {
    pub position: DVec3,
    pub look_at: DVec3,
    pub distance: f64,
    /// Padded largest dimension.
    pub max_dimension: f64,
}

/// What one framing tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum FramingOutcome {
    /// The camera moved toward `target` and now sits at `position`.
    Blended {
        target: FramingTarget,
        position: DVec3,
    },
    /// Free-look is on; the camera was left alone.
    FreeLook,
    /// No usable input this tick.
    Skipped(Degradation),
}

/// Serializable summary of a [`FramingOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FramingStatus {
    Blended {
        position: DVec3,
        look_at: DVec3,
        distance: f64,
    },
    FreeLook,
    Skipped {
        reason: String,
    },
}

impl FramingOutcome {
    pub fn status(&self) -> FramingStatus {
        match self {
            FramingOutcome::Blended { target, position } => FramingStatus::Blended {
                position: *position,
                look_at: target.look_at,
                distance: target.distance,
            },
            FramingOutcome::FreeLook => FramingStatus::FreeLook,
            FramingOutcome::Skipped(reason) => FramingStatus::Skipped {
                reason: reason.to_string(),
            },
        }
    }
}

/// Keeps a tracked object framed.
#[derive(Debug, Clone)]
pub struct CameraAutoFramer {
    config: FramingConfig,
    controls: CameraControls,
    last: Option<FramingOutcome>,
}

impl CameraAutoFramer {
    pub fn new(config: FramingConfig) -> Self {
        Self {
            config,
            controls: CameraControls::default(),
            last: None,
        }
    }

    pub fn config(&self) -> &FramingConfig {
        &self.config
    }

    pub fn controls(&self) -> &CameraControls {
        &self.controls
    }

    /// Flip free-look and return the new value.
    pub fn toggle_free_look(&mut self) -> bool {
        self.set_free_look(!self.controls.free_look);
        self.controls.free_look
    }

    pub fn set_free_look(&mut self, enabled: bool) {
        if self.controls.free_look != enabled {
            tracing::debug!(free_look = enabled, "Camera control mode changed");
        }
        self.controls.free_look = enabled;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() || zoom <= 0.0 {
            tracing::warn!(zoom, "Ignoring invalid zoom");
            return;
        }
        self.controls.zoom = zoom;
    }

    pub fn set_vertical_pan(&mut self, pan: f64) {
        if !pan.is_finite() {
            tracing::warn!(pan, "Ignoring invalid vertical pan");
            return;
        }
        self.controls.vertical_pan = pan;
    }

    /// Zoom actually applied to the framing distance.
    pub fn effective_zoom(&self) -> f64 {
        self.controls
            .zoom
            .max(self.config.min_zoom)
            .min(self.config.max_zoom)
    }

    /// Target pose for `bounds` seen through `fov_degrees`.
    pub fn compute_target(
        &self,
        bounds: &BoundingBox,
        fov_degrees: f64,
    ) -> Result<FramingTarget, Degradation> {
        if bounds.is_degenerate() {
            return Err(Degradation::DegenerateGeometry);
        }
        let max_dimension = bounds.max_dimension() * self.config.padding_factor;
        let distance = framing_distance(max_dimension, fov_degrees)
            .ok_or(Degradation::DegenerateGeometry)?
            / self.effective_zoom();

        let center = bounds.center();
        let pan = DVec3::Y * (self.controls.vertical_pan * max_dimension);
        let target = FramingTarget {
            position: center + self.config.offset * distance + pan,
            look_at: center + pan,
            distance,
            max_dimension,
        };

        if !(target.position.is_finite() && target.look_at.is_finite()) {
            return Err(Degradation::DegenerateGeometry);
        }
        Ok(target)
    }

    /// Blend `rig` one step toward framing `bounds`.
    ///
    /// `bounds` is `None` while the tracked object has not loaded.
    pub fn tick(&mut self, bounds: Option<&BoundingBox>, rig: &mut dyn CameraRig) -> FramingOutcome {
        let outcome = self.frame(bounds, rig);
        if let FramingOutcome::Skipped(reason) = &outcome {
            if !matches!(&self.last, Some(FramingOutcome::Skipped(_))) {
                tracing::debug!("Camera update skipped: {reason}");
            }
        }
        self.last = Some(outcome.clone());
        outcome
    }

    /// Outcome of the most recent tick.
    pub fn last_outcome(&self) -> Option<&FramingOutcome> {
        self.last.as_ref()
    }

    fn frame(&self, bounds: Option<&BoundingBox>, rig: &mut dyn CameraRig) -> FramingOutcome {
        if self.controls.free_look {
            return FramingOutcome::FreeLook;
        }
        let Some(bounds) = bounds else {
            return FramingOutcome::Skipped(Degradation::DegenerateGeometry);
        };

        let live = rig.pose();
        let target = match self.compute_target(bounds, live.fov_degrees) {
            Ok(target) => target,
            Err(reason) => return FramingOutcome::Skipped(reason),
        };

        let goal = CameraPose::new(target.position, target.look_at, live.fov_degrees);
        let blended = CameraPose::lerp(&live, &goal, self.config.blend_factor);
        rig.write_pose(blended.position, target.look_at);

        FramingOutcome::Blended {
            target,
            position: blended.position,
        }
    }
}

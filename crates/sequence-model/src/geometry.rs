//! World-space geometry for camera framing.
//!
//! Bounding boxes and camera poses are in renderer world units. The
//! renderer owns the live camera; these types only describe it.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Smallest extent treated as a real object.
pub const MIN_EXTENT: f64 = 1e-9;

/// An axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    /// A box with no extent, as reported for an object that has not loaded.
    pub const EMPTY: BoundingBox = BoundingBox {
        min: DVec3::ZERO,
        max: DVec3::ZERO,
    };

    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// A box centered at `center` with the given full size.
    pub fn from_center_size(center: DVec3, size: DVec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Extent along each axis.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Largest extent across the three axes.
    pub fn max_dimension(&self) -> f64 {
        self.size().max_element()
    }

    /// Whether this box can't be framed: no extent, inverted, or non-finite.
    pub fn is_degenerate(&self) -> bool {
        if !self.min.is_finite() || !self.max.is_finite() {
            return true;
        }
        let size = self.size();
        size.min_element() < 0.0 || size.max_element() <= MIN_EXTENT
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Placement of a perspective camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: DVec3,
    pub look_at: DVec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f64,
}

impl CameraPose {
    pub fn new(position: DVec3, look_at: DVec3, fov_degrees: f64) -> Self {
        Self {
            position,
            look_at,
            fov_degrees,
        }
    }

    /// Distance between the camera and its look-at point.
    pub fn distance(&self) -> f64 {
        self.position.distance(self.look_at)
    }

    /// Interpolate position and look-at toward `target`. Field of view is kept.
    pub fn lerp(a: &CameraPose, b: &CameraPose, t: f64) -> CameraPose {
        let t = t.clamp(0.0, 1.0);
        CameraPose {
            position: a.position.lerp(b.position, t),
            look_at: a.look_at.lerp(b.look_at, t),
            fov_degrees: a.fov_degrees,
        }
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: DVec3::new(0.0, 0.0, 5.0),
            look_at: DVec3::ZERO,
            fov_degrees: 45.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_and_center() {
        let bbox = BoundingBox::new(DVec3::new(-1.0, 0.0, -2.0), DVec3::new(1.0, 3.0, 2.0));
        assert_eq!(bbox.size(), DVec3::new(2.0, 3.0, 4.0));
        assert_eq!(bbox.center(), DVec3::new(0.0, 1.5, 0.0));
        assert_eq!(bbox.max_dimension(), 4.0);
        assert!(!bbox.is_degenerate());
    }

    #[test]
    fn test_empty_box_is_degenerate() {
        assert!(BoundingBox::EMPTY.is_degenerate());
        assert!(BoundingBox::default().is_degenerate());
    }

    #[test]
    fn test_inverted_and_infinite_boxes_are_degenerate() {
        let inverted = BoundingBox::new(DVec3::splat(1.0), DVec3::splat(-1.0));
        assert!(inverted.is_degenerate());

        let infinite = BoundingBox::new(DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY));
        assert!(infinite.is_degenerate());

        let nan = BoundingBox::new(DVec3::ZERO, DVec3::new(f64::NAN, 1.0, 1.0));
        assert!(nan.is_degenerate());
    }

    #[test]
    fn test_flat_box_is_framable() {
        let plane = BoundingBox::new(DVec3::ZERO, DVec3::new(2.0, 0.0, 2.0));
        assert!(!plane.is_degenerate());
    }

    #[test]
    fn test_from_center_size() {
        let bbox = BoundingBox::from_center_size(DVec3::new(0.0, 1.0, 0.0), DVec3::splat(2.0));
        assert_eq!(bbox.min, DVec3::new(-1.0, 0.0, -1.0));
        assert_eq!(bbox.max, DVec3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn test_pose_lerp() {
        let a = CameraPose::new(DVec3::ZERO, DVec3::ZERO, 45.0);
        let b = CameraPose::new(DVec3::new(10.0, 0.0, 0.0), DVec3::new(0.0, 2.0, 0.0), 60.0);
        let mid = CameraPose::lerp(&a, &b, 0.5);
        assert!((mid.position.x - 5.0).abs() < 1e-9);
        assert!((mid.look_at.y - 1.0).abs() < 1e-9);
        assert_eq!(mid.fov_degrees, 45.0);
    }
}

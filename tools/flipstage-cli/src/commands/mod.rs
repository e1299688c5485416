pub mod catalog;
pub mod config;
pub mod frame;
pub mod probe;
pub mod simulate;

use glam::DVec3;

/// `(x, y, z)` with `precision` decimals per component.
pub fn fmt_vec3(v: DVec3, precision: usize) -> String {
    format!(
        "({:.p$}, {:.p$}, {:.p$})",
        v.x,
        v.y,
        v.z,
        p = precision
    )
}

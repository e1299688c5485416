//! Compute camera framing for a bounding box.

use flipstage_common::config::StageConfig;
use flipstage_playback_core::auto_framer::{
    CameraAutoFramer, FramingConfig, FramingOutcome, PerspectiveCamera,
};
use flipstage_sequence_model::geometry::{BoundingBox, CameraPose};
use glam::DVec3;

use super::fmt_vec3;

fn vec3(values: &[f64], what: &str) -> anyhow::Result<DVec3> {
    match values {
        [x, y, z] => Ok(DVec3::new(*x, *y, *z)),
        _ => anyhow::bail!("{what} needs exactly 3 components, got {}", values.len()),
    }
}

pub fn run(
    config: &StageConfig,
    size: Vec<f64>,
    center: Vec<f64>,
    fov: f64,
    zoom: f64,
    pan: f64,
    ticks: u32,
) -> anyhow::Result<()> {
    let bounds = BoundingBox::from_center_size(vec3(&center, "center")?, vec3(&size, "size")?);

    let mut framer = CameraAutoFramer::new(FramingConfig::from(&config.camera));
    framer.set_zoom(zoom);
    framer.set_vertical_pan(pan);

    println!(
        "Box: center {} size {}",
        fmt_vec3(bounds.center(), 3),
        fmt_vec3(bounds.size(), 3)
    );
    println!(
        "Padding {} / blend {} / fov {fov} deg / zoom {}",
        framer.config().padding_factor,
        framer.config().blend_factor,
        framer.effective_zoom()
    );

    let target = match framer.compute_target(&bounds, fov) {
        Ok(target) => target,
        Err(reason) => {
            println!("No framing: {reason}");
            return Ok(());
        }
    };

    println!();
    println!("Padded size: {:.4}", target.max_dimension);
    println!("Distance:    {:.4}", target.distance);
    println!("Position:    {}", fmt_vec3(target.position, 4));
    println!("Look-at:     {}", fmt_vec3(target.look_at, 4));

    if ticks > 0 {
        let mut camera = PerspectiveCamera::new(CameraPose {
            fov_degrees: fov,
            ..CameraPose::default()
        });
        let mut last = None;
        for _ in 0..ticks {
            last = Some(framer.tick(Some(&bounds), &mut camera));
        }
        println!();
        println!(
            "After {ticks} blend tick(s) from {}:",
            fmt_vec3(CameraPose::default().position, 3)
        );
        println!("  Position:  {}", fmt_vec3(camera.pose.position, 4));
        println!(
            "  Remaining: {:.6}",
            camera.pose.position.distance(target.position)
        );
        if let Some(FramingOutcome::Skipped(reason)) = last {
            println!("  Skipped: {reason}");
        }
    }

    Ok(())
}

//! Run a scene headlessly with synthetic timestamps.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use flipstage_common::clock::{refresh_interval_ns, StageClock, TimestampNs};
use flipstage_common::config::StageConfig;
use flipstage_common::scheduler::ManualScheduler;
use flipstage_playback_core::auto_framer::FramingStatus;
use flipstage_playback_core::scene::{HeadlessRenderer, Scene, SceneSnapshot};
use flipstage_playback_core::{SwipeTracker, UserIntent};
use flipstage_sequence_loader::{
    FrameSource, FsFrameSource, LoaderConfig, MemoryFrameSource, SequenceLoader,
};
use flipstage_sequence_model::catalog::SequenceCatalog;
use glam::DVec3;

pub struct SimulateOptions {
    pub root: Option<PathBuf>,
    pub frames: u32,
    pub duration_secs: f64,
    pub intents: Vec<String>,
    pub swipes: Vec<String>,
    pub report_every_secs: f64,
    pub object_size: f64,
    pub json: bool,
}

/// Input applied once the simulated clock reaches `at_ns`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scripted {
    at_ns: TimestampNs,
    input: ScriptedInput,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScriptedInput {
    Intent(UserIntent),
    /// Vertical touch drag from `from_y` to `to_y`.
    Swipe { from_y: f64, to_y: f64 },
}

fn split_time(raw: &str, form: &str) -> anyhow::Result<(TimestampNs, String)> {
    let (secs, rest) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected {form}, got '{raw}'"))?;
    let secs: f64 = secs
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid time in '{raw}'"))?;
    if !(secs >= 0.0 && secs.is_finite()) {
        anyhow::bail!("Time must be non-negative in '{raw}'");
    }
    Ok((StageClock::secs_to_ns(secs), rest.to_string()))
}

fn parse_scripted(raw: &str) -> anyhow::Result<Scripted> {
    let (at_ns, intent) = split_time(raw, "SECS=INTENT")?;
    Ok(Scripted {
        at_ns,
        input: ScriptedInput::Intent(intent.parse()?),
    })
}

fn parse_swipe(raw: &str) -> anyhow::Result<Scripted> {
    let (at_ns, drag) = split_time(raw, "SECS=FROM_Y:TO_Y")?;
    let coord = |value: &str| -> anyhow::Result<f64> {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| anyhow::anyhow!("Invalid coordinate '{value}' in '{raw}'"))
    };
    let (from, to) = drag
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Expected SECS=FROM_Y:TO_Y, got '{raw}'"))?;
    Ok(Scripted {
        at_ns,
        input: ScriptedInput::Swipe {
            from_y: coord(from)?,
            to_y: coord(to)?,
        },
    })
}

/// Resolve scripted input to an intent. Short swipes resolve to nothing.
fn resolve_input(input: ScriptedInput, swipe: &mut SwipeTracker) -> Option<UserIntent> {
    match input {
        ScriptedInput::Intent(intent) => Some(intent),
        ScriptedInput::Swipe { from_y, to_y } => {
            swipe.touch_start(from_y);
            swipe.touch_move(to_y);
            let intent = swipe.touch_end();
            if intent.is_none() {
                tracing::debug!(from_y, to_y, "Swipe below threshold");
            }
            intent
        }
    }
}

fn generated_source(catalog: &SequenceCatalog, frames: u32) -> MemoryFrameSource {
    catalog
        .entries()
        .iter()
        .fold(MemoryFrameSource::new(), |source, entry| {
            source.with_sequence(catalog.base_path(), entry.id.as_str(), entry.start_frame, frames)
        })
}

pub async fn run(config: &StageConfig, options: SimulateOptions) -> anyhow::Result<()> {
    let mut script = options
        .intents
        .iter()
        .map(|raw| parse_scripted(raw))
        .chain(options.swipes.iter().map(|raw| parse_swipe(raw)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    script.sort_by_key(|s| s.at_ns);

    let catalog = Arc::new(
        SequenceCatalog::from_config(config)
            .map_err(|e| anyhow::anyhow!("Invalid catalog: {e}"))?,
    );
    let source: Arc<dyn FrameSource> = match &options.root {
        Some(root) => Arc::new(FsFrameSource::new(root)),
        None => Arc::new(generated_source(&catalog, options.frames)),
    };

    let loader = SequenceLoader::new(source, catalog.clone(), LoaderConfig::from(&config.assets));
    let sequences = loader.load_catalog().await?;
    if !options.json {
        println!("Loaded {} sequence(s):", sequences.len());
        for (id, sequence) in &sequences {
            println!("  {:<20} {} frame(s)", id.as_str(), sequence.len());
        }
        println!();
    }

    let scene = Rc::new(RefCell::new(Scene::new(config, &catalog, &sequences)?));
    let renderer = Rc::new(RefCell::new(HeadlessRenderer::with_object(
        DVec3::ZERO,
        DVec3::splat(options.object_size),
    )));
    let mut scheduler = ManualScheduler::new();
    Scene::install(&scene, renderer.clone(), &mut scheduler);

    let interval = refresh_interval_ns(config.playback.refresh_hz);
    let end = StageClock::secs_to_ns(options.duration_secs.max(0.0));
    let report_every = StageClock::secs_to_ns(options.report_every_secs.max(0.0)).max(interval);

    let mut pending = script.into_iter().peekable();
    let mut swipe = SwipeTracker::new();
    let mut next_report: TimestampNs = 0;
    let mut now: TimestampNs = 0;

    while now <= end {
        while let Some(scripted) = pending.next_if(|s| s.at_ns <= now) {
            let Some(intent) = resolve_input(scripted.input, &mut swipe) else {
                continue;
            };
            if let Err(e) = scene.borrow_mut().handle_intent(intent) {
                tracing::warn!(%intent, "Intent rejected: {e}");
            }
        }

        scheduler.fire(now);

        if now >= next_report {
            report(now, &scene.borrow().snapshot(), options.json)?;
            next_report += report_every;
        }
        now += interval;
    }

    let last = scene.borrow().snapshot();
    scene.borrow_mut().teardown();

    if !options.json {
        let camera = renderer.borrow().camera.pose;
        println!();
        println!("Final state:");
        println!("  View: {:?}", last.view_state);
        println!("  Ticks: {}", last.ticks);
        println!("  Suppressed completions: {}", last.suppressed_completions);
        println!("  Camera position: {}", super::fmt_vec3(camera.position, 3));
        println!("  Camera look-at:  {}", super::fmt_vec3(camera.look_at, 3));
    }

    Ok(())
}

fn report(now: TimestampNs, snapshot: &SceneSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }

    let intro = snapshot
        .intro_frame
        .as_ref()
        .map_or("-".to_string(), |f| format!("#{}", f.index));
    let card = match (snapshot.active_card, &snapshot.card_frame) {
        (Some(card), Some(frame)) => format!("{card}#{}", frame.index),
        (Some(card), None) => format!("{card}"),
        _ => "-".to_string(),
    };
    let camera = match &snapshot.camera {
        Some(FramingStatus::Blended { distance, .. }) => format!("framing d={distance:.3}"),
        Some(FramingStatus::FreeLook) => "free-look".to_string(),
        Some(FramingStatus::Skipped { reason }) => format!("skipped ({reason})"),
        None => "-".to_string(),
    };

    println!(
        "t={:>7.3}s  view={:<16} intro={:<5} card={:<6} camera={}",
        StageClock::ns_to_secs(now),
        format!("{:?}", snapshot.view_state),
        intro,
        card,
        camera
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scripted_intent() {
        let scripted = parse_scripted("6.5=select:2").unwrap();
        assert_eq!(scripted.at_ns, 6_500_000_000);
        assert_eq!(scripted.input, ScriptedInput::Intent(UserIntent::SelectCard(2)));

        assert!(parse_scripted("advance").is_err());
        assert!(parse_scripted("x=advance").is_err());
        assert!(parse_scripted("-1=advance").is_err());
        assert!(parse_scripted("1=jump").is_err());
    }

    #[test]
    fn test_parse_swipe() {
        let scripted = parse_swipe("2=400:300").unwrap();
        assert_eq!(scripted.at_ns, 2_000_000_000);
        assert_eq!(
            scripted.input,
            ScriptedInput::Swipe {
                from_y: 400.0,
                to_y: 300.0
            }
        );

        assert!(parse_swipe("2=400").is_err());
        assert!(parse_swipe("2=up:300").is_err());
        assert!(parse_swipe("400:300").is_err());
    }

    #[test]
    fn test_swipes_resolve_through_tracker() {
        let mut swipe = SwipeTracker::new();
        let up = parse_swipe("0=400:300").unwrap().input;
        let down = parse_swipe("0=100:200").unwrap().input;
        let short = parse_swipe("0=400:350").unwrap().input;

        assert_eq!(resolve_input(up, &mut swipe), Some(UserIntent::Advance));
        assert_eq!(resolve_input(down, &mut swipe), Some(UserIntent::Retreat));
        assert_eq!(resolve_input(short, &mut swipe), None);
        assert_eq!(
            resolve_input(ScriptedInput::Intent(UserIntent::ToggleFreeLook), &mut swipe),
            Some(UserIntent::ToggleFreeLook)
        );
    }

    #[test]
    fn test_generated_source_covers_catalog() {
        let config = StageConfig::default();
        let catalog = SequenceCatalog::from_config(&config).unwrap();
        let source = generated_source(&catalog, 3);
        let falling = catalog.resolve("falling").unwrap();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();

        let hit = rt.block_on(source.fetch(&catalog.locator(&falling, 124)));
        let miss = rt.block_on(source.fetch(&catalog.locator(&falling, 125)));
        assert!(hit.is_ok());
        assert!(miss.is_err());
    }
}

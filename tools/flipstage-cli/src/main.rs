//! Flipstage CLI: inspect, probe, and simulate flip-book scenes.
//!
//! Usage:
//!   flipstage catalog              List catalog sequences and cards
//!   flipstage probe <NAME>         Probe a sequence on disk
//!   flipstage simulate [OPTIONS]   Run a scene headlessly
//!   flipstage frame [OPTIONS]      Compute camera framing for a box
//!   flipstage config [OPTIONS]     Show or write configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flipstage_common::config::StageConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "flipstage",
    about = "Frame-sequence playback and camera auto-framing",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the standard location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog sequences, intro, and cards
    Catalog,

    /// Probe a sequence and report its frames
    Probe {
        /// Catalog sequence name
        name: String,

        /// Directory containing `image-sequences/`
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Extra attempts per failing frame
        #[arg(long)]
        retries: Option<u32>,

        /// Maximum frames to probe
        #[arg(long)]
        ceiling: Option<u32>,

        /// List every frame locator
        #[arg(long)]
        list: bool,
    },

    /// Run a scene headlessly with synthetic timestamps
    Simulate {
        /// Load frames from this directory instead of generating them
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Frames generated per sequence when no root is given
        #[arg(long, default_value = "36")]
        frames: u32,

        /// Simulated duration (seconds)
        #[arg(short, long, default_value = "10.0")]
        duration: f64,

        /// Scripted intent as SECS=INTENT, e.g. 2=advance or 6.5=select:2
        #[arg(short, long = "intent")]
        intents: Vec<String>,

        /// Scripted touch drag as SECS=FROM_Y:TO_Y, e.g. 2=400:300 advances
        #[arg(long = "swipe", allow_hyphen_values = true)]
        swipes: Vec<String>,

        /// Seconds between reported snapshots
        #[arg(long, default_value = "1.0")]
        every: f64,

        /// Edge length of the tracked cube
        #[arg(long, default_value = "2.0")]
        object_size: f64,

        /// Print snapshots as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Compute the framing distance and target pose for a box
    Frame {
        /// Box size as X,Y,Z
        #[arg(long, value_delimiter = ',', default_values_t = [2.0, 2.0, 2.0])]
        size: Vec<f64>,

        /// Box center as X,Y,Z
        #[arg(long, value_delimiter = ',', default_values_t = [0.0, 0.0, 0.0], allow_hyphen_values = true)]
        center: Vec<f64>,

        /// Vertical field of view (degrees)
        #[arg(long, default_value = "45")]
        fov: f64,

        /// Zoom factor
        #[arg(long, default_value = "1.0")]
        zoom: f64,

        /// Vertical pan as a fraction of the padded size
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        pan: f64,

        /// Blend ticks to run from the default camera pose
        #[arg(long, default_value = "0")]
        ticks: u32,
    },

    /// Show or write configuration
    Config {
        /// Show built-in defaults instead of the loaded config
        #[arg(long)]
        defaults: bool,

        /// Write the shown config to this path
        #[arg(long)]
        write: Option<PathBuf>,

        /// Write the shown config to the standard location
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StageConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => StageConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    flipstage_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Catalog => commands::catalog::run(&config),
        Commands::Probe {
            name,
            root,
            retries,
            ceiling,
            list,
        } => commands::probe::run(&config, name, root, retries, ceiling, list).await,
        Commands::Simulate {
            root,
            frames,
            duration,
            intents,
            swipes,
            every,
            object_size,
            json,
        } => {
            commands::simulate::run(
                &config,
                commands::simulate::SimulateOptions {
                    root,
                    frames,
                    duration_secs: duration,
                    intents,
                    swipes,
                    report_every_secs: every,
                    object_size,
                    json,
                },
            )
            .await
        }
        Commands::Frame {
            size,
            center,
            fov,
            zoom,
            pan,
            ticks,
        } => commands::frame::run(&config, size, center, fov, zoom, pan, ticks),
        Commands::Config {
            defaults,
            write,
            save,
        } => commands::config::run(config, defaults, write, save),
    }
}

//! Shopfloor - replay manufacturing event logs from the command line.
//!
//! Loads a machine event log (CSV or `.sflog` archive) and answers queries
//! against the replay engine:
//! - log metadata
//! - the machine and transport state at a point in time
//! - raw events in a time range or around a point
//! - the timeline of one product entity
//! - headless playback, one line per frame
//! - packing a CSV log into a binary archive

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Replay manufacturing event logs
#[derive(Parser, Debug)]
#[command(name = "shopfloor")]
#[command(about = "Replay manufacturing event logs")]
#[command(version)]
struct Cli {
    /// Config file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Machine events file, overriding the config and environment
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the time range, machines and transport routes of the log
    Metadata,

    /// Print machine and transport state at a point in time
    Snapshot {
        /// Simulation time in minutes
        #[arg(long)]
        at: f64,
    },

    /// Print the events in [start, end)
    Events {
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
    },

    /// Print the events in a window centred on a point
    Window {
        #[arg(long)]
        at: f64,
        /// Window width in minutes (defaults to the configured width)
        #[arg(long)]
        width: Option<f64>,
    },

    /// Print the timeline of one product entity, ordered by start time
    Product {
        /// Product entity id
        #[arg(long)]
        entity: i64,
    },

    /// Play the log headlessly, one line per frame
    Play {
        /// Speed selector such as "0.5x" or "2x"
        #[arg(long)]
        speed: Option<String>,
        /// Simulation minutes per wall-clock second at 1x
        #[arg(long)]
        minutes_per_second: Option<f64>,
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<usize>,
        /// Sleep between frames instead of running as fast as possible
        #[arg(long)]
        realtime: bool,
    },

    /// Write the log as a binary archive
    Pack {
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let settings = commands::load_settings(cli.config.as_deref(), cli.data)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Command::Metadata => commands::metadata(&settings, &mut out),
        Command::Snapshot { at } => commands::snapshot(&settings, at, &mut out),
        Command::Events { start, end } => commands::events(&settings, start, end, &mut out),
        Command::Window { at, width } => commands::window(&settings, at, width, &mut out),
        Command::Product { entity } => commands::product(&settings, entity, &mut out),
        Command::Play {
            speed,
            minutes_per_second,
            frames,
            realtime,
        } => commands::play(
            &settings,
            commands::PlayOptions {
                speed: speed.as_deref(),
                minutes_per_second,
                frames,
                realtime,
            },
            &mut out,
        ),
        Command::Pack { out: path } => commands::pack(&settings, &path, &mut out),
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use notelog::writer::{write_track_files, OutputOptions};
use notelog::{Config, TrackSelection};

/// notelog - turn a MIDI file into process-mining event logs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Standard MIDI file to process
    midi_file: PathBuf,

    /// Measures per case (0 = one case per track)
    #[arg(long)]
    measures: Option<u32>,

    /// Output directory [default: lower-cased input file name]
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Tracks to process: "all" or a comma separated list such as 0,2
    #[arg(long, value_parser = parse_tracks)]
    tracks: Option<TrackSelection>,

    /// YAML configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Add a Timestamp column (seconds from track start)
    #[arg(long)]
    timestamps: bool,

    /// Skip the XES files
    #[arg(long)]
    no_xes: bool,

    /// Log every event
    #[arg(short, long)]
    verbose: bool,
}

fn parse_tracks(s: &str) -> std::result::Result<TrackSelection, String> {
    TrackSelection::parse(s).map_err(|e| e.to_string())
}

fn default_output_dir(midi_file: &Path) -> PathBuf {
    let stem = midi_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "notelog".to_string());
    PathBuf::from(stem)
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Error reading config '{}'", path.display()))?,
        None => Config::default(),
    };
    if let Some(measures) = args.measures {
        config.measures_per_case = measures;
    }
    if let Some(tracks) = &args.tracks {
        config.tracks = tracks.clone();
    }
    if args.timestamps {
        config.timestamps = true;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = build_config(&args)?;
    let logs = notelog::process_file(&args.midi_file, &config)
        .with_context(|| format!("Error processing MIDI file '{}'", args.midi_file.display()))?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.midi_file));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Error creating '{}'", output_dir.display()))?;

    let options = OutputOptions {
        timestamps: config.timestamps,
        xes: !args.no_xes,
    };
    for log in &logs {
        write_track_files(log, &output_dir, options)
            .with_context(|| format!("Error writing logs for track {}", log.track_index))?;
    }

    info!(
        "Wrote {} track logs to {}",
        logs.len(),
        output_dir.display()
    );
    Ok(())
}

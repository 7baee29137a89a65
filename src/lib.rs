pub mod config;
pub mod duration;
pub mod error;
pub mod midi;
pub mod pitch;
pub mod segment;
pub mod writer;

use std::path::Path;

pub use config::{Config, TrackSelection};
pub use error::*;
pub use midi::{read_score, read_score_file};
pub use pitch::pitch_key;
pub use segment::{EventRecord, SegmentationPipeline, TrackLog};

/// Turn the bytes of a Standard MIDI File into one event log per note track.
/// This is the main entry point for the library.
pub fn process_bytes(bytes: &[u8], config: &Config) -> Result<Vec<TrackLog>> {
    let score = read_score(bytes)?;
    SegmentationPipeline::new(config.clone())?.process_score(&score)
}

/// Same as [`process_bytes`], reading the file at `path`
pub fn process_file(path: impl AsRef<Path>, config: &Config) -> Result<Vec<TrackLog>> {
    let score = read_score_file(path)?;
    SegmentationPipeline::new(config.clone())?.process_score(&score)
}

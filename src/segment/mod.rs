//! # Segment Module
//!
//! Turn per-track note event streams into ordered, cased event logs.
//!
//! ## Sub-modules
//! - `types` - ScoreEvent, Track, Score, EventRecord, TrackLog type definitions
//! - `measure` - Case bookkeeping against the time-signature threshold
//! - `chord` - Open-note state, chord detection, zero-delta note-off resolution
//! - `pipeline` - Per-track driver and the parallel score-level driver
//!
//! ## Entry Point
//! [`SegmentationPipeline::process_score()`] - Segment all selected tracks
//!
//! ## Example
//! ```rust
//! use notelog::segment::{Score, ScoreEvent, SegmentationPipeline, Track};
//! use notelog::Config;
//!
//! let score = Score {
//!     ticks_per_beat: 480,
//!     tracks: vec![Track {
//!         name: Some("Piano".to_string()),
//!         events: vec![
//!             ScoreEvent::note_on(0, 60, 90),
//!             ScoreEvent::note_on(0, 64, 90),
//!             ScoreEvent::note_off(480, 60),
//!             ScoreEvent::note_off(0, 64),
//!         ],
//!     }],
//! };
//!
//! let pipeline = SegmentationPipeline::new(Config::default()).unwrap();
//! let logs = pipeline.process_score(&score).unwrap();
//!
//! let records = &logs[0].records;
//! assert_eq!(records.len(), 2);
//! assert!(records.iter().all(|r| r.order == 1 && r.is_chord));
//! assert!(records.iter().all(|r| r.duration_class == "quarter note"));
//! ```
//!
//! ## Event Flow
//!
//! For every event of a track:
//! 1. The delta advances the case counter (and the tempo clock)
//! 2. A note-on after a silence first emits one `Pause` record per rest;
//!    the rests' canonical lengths advance the case counter instead of the
//!    raw gap
//! 3. A note-on opens a note at the current case and order
//! 4. A note-off closes it, classifies its duration and appends the record
//!
//! Time signatures change the case threshold from their position onward.
//! Tempo changes only affect timestamps.

mod chord;
mod measure;
mod pipeline;
mod types;


pub use chord::{ClosedNote, NoteStateTracker, OpenNote};
pub use measure::{CaseThreshold, MeasureSegmenter, SegmentSignal};
pub use pipeline::{SegmentationPipeline, TrackContext, DEFAULT_MICROS_PER_BEAT};
pub use types::{EventKind, EventRecord, Score, ScoreEvent, Track, TrackLog, PAUSE_KEY};

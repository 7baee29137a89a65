//! Event stream and event log type definitions
//!
//! The score reader produces [`Score`]s (one [`ScoreEvent`] stream per track);
//! the segmentation pipeline turns each stream into a [`TrackLog`].

use std::time::Duration;

use crate::duration::TimeSignature;

/// Event name used for synthesized rests
pub const PAUSE_KEY: &str = "Pause";

/// What happened at an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A note-on with velocity 0 is a note-off
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    TimeSignature(TimeSignature),
    SetTempo { micros_per_beat: u32 },
}

/// One event of a track, `delta` ticks after the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEvent {
    pub delta: u64,
    pub kind: EventKind,
}

impl ScoreEvent {
    pub fn note_on(delta: u64, pitch: u8, velocity: u8) -> Self {
        Self {
            delta,
            kind: EventKind::NoteOn { pitch, velocity },
        }
    }

    pub fn note_off(delta: u64, pitch: u8) -> Self {
        Self {
            delta,
            kind: EventKind::NoteOff { pitch },
        }
    }

    pub fn time_signature(delta: u64, numerator: u32, denominator: u32) -> Self {
        Self {
            delta,
            kind: EventKind::TimeSignature(TimeSignature {
                numerator,
                denominator,
            }),
        }
    }

    pub fn tempo(delta: u64, micros_per_beat: u32) -> Self {
        Self {
            delta,
            kind: EventKind::SetTempo { micros_per_beat },
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.kind, EventKind::TimeSignature(_) | EventKind::SetTempo { .. })
    }
}

/// Event stream of a single track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub name: Option<String>,
    pub events: Vec<ScoreEvent>,
}

impl Track {
    /// Conductor tracks only carry time signatures and tempo changes
    pub fn is_meta_only(&self) -> bool {
        self.events.iter().all(ScoreEvent::is_meta)
    }
}

/// A whole score as delivered by the score reader
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub ticks_per_beat: u16,
    pub tracks: Vec<Track>,
}

/// One row of the event log.
///
/// # Fields
/// - `case`: Case id (1-based); one case spans `measures_per_case` measures
/// - `key`: Pitch key such as "C#4", or [`PAUSE_KEY`] for rests
/// - `duration_class`: Duration class label including a "k-times " prefix
///   for multiples, or "unknown"
/// - `order`: 1-based position in the track; chord members share one slot
/// - `is_chord`: Whether the note sounded together with others
/// - `timestamp`: Onset relative to the start of the track, when requested
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub case: u32,
    pub key: String,
    pub duration_class: String,
    pub order: u32,
    pub is_chord: bool,
    pub timestamp: Option<Duration>,
}

impl EventRecord {
    pub fn is_pause(&self) -> bool {
        self.key == PAUSE_KEY
    }
}

/// Event log of one track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLog {
    pub track_index: usize,
    pub name: Option<String>,
    pub records: Vec<EventRecord>,
}

impl TrackLog {
    /// Distinct case ids in order of appearance.
    ///
    /// Records are sorted by order, so each case forms one consecutive run.
    pub fn case_ids(&self) -> Vec<u32> {
        let mut cases: Vec<u32> = self.records.iter().map(|record| record.case).collect();
        cases.dedup();
        cases
    }

    /// Records grouped into consecutive runs of the same case
    pub fn cases(&self) -> impl Iterator<Item = (u32, &[EventRecord])> {
        self.records
            .chunk_by(|a, b| a.case == b.case)
            .filter_map(|run| run.first().map(|first| (first.case, run)))
    }
}

//! Per-track segmentation and the score-level driver

use std::time::Duration;

use log::{debug, info, warn};
use rayon::prelude::*;

use super::chord::NoteStateTracker;
use super::measure::MeasureSegmenter;
use super::types::{EventKind, EventRecord, Score, Track, TrackLog, PAUSE_KEY};
use crate::config::{Config, TrackSelection};
use crate::duration::{
    decompose_pause, DurationClassifier, DurationTable, PauseDecomposition, TimeSignature,
};
use crate::error::{NoteLogError, Result};
use crate::pitch::pitch_key;

/// MIDI default tempo (120 bpm)
pub const DEFAULT_MICROS_PER_BEAT: u32 = 500_000;

/// Time signature and tempo a track starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackContext {
    pub time_signature: TimeSignature,
    pub micros_per_beat: u32,
}

impl Default for TrackContext {
    fn default() -> Self {
        Self {
            time_signature: TimeSignature::default(),
            micros_per_beat: DEFAULT_MICROS_PER_BEAT,
        }
    }
}

impl TrackContext {
    /// Last time signature and tempo found in the meta-only (conductor) tracks
    pub fn from_conductor_tracks(tracks: &[Track]) -> Self {
        let mut context = TrackContext::default();
        for track in tracks.iter().filter(|t| t.is_meta_only()) {
            for event in &track.events {
                match event.kind {
                    EventKind::TimeSignature(time_signature) => {
                        context.time_signature = time_signature
                    }
                    EventKind::SetTempo { micros_per_beat } => {
                        context.micros_per_beat = micros_per_beat
                    }
                    _ => {}
                }
            }
        }
        context
    }
}

/// Maps absolute ticks to elapsed wall-clock time across tempo changes
#[derive(Debug, Clone)]
struct TempoClock {
    /// (start tick, elapsed µs at start tick, µs per beat)
    segments: Vec<(u64, f64, u32)>,
    ticks_per_beat: u16,
}

impl TempoClock {
    fn new(ticks_per_beat: u16, micros_per_beat: u32) -> Self {
        Self {
            segments: vec![(0, 0.0, micros_per_beat)],
            ticks_per_beat,
        }
    }

    fn micros_at(&self, tick: f64) -> f64 {
        let (start, elapsed, micros_per_beat) = self
            .segments
            .iter()
            .rev()
            .find(|(start, _, _)| *start as f64 <= tick)
            .copied()
            .unwrap_or(self.segments[0]);
        elapsed + (tick - start as f64) * micros_per_beat as f64 / self.ticks_per_beat as f64
    }

    /// New tempo from `tick` on
    fn set_tempo(&mut self, tick: u64, micros_per_beat: u32) {
        let elapsed = self.micros_at(tick as f64);
        self.segments.push((tick, elapsed, micros_per_beat));
    }

    fn at(&self, tick: f64) -> Duration {
        Duration::from_secs_f64(self.micros_at(tick) / 1_000_000.0)
    }
}

/// Ticks between two note events, with the time signature changes met there
#[derive(Debug, Default)]
struct PendingGap {
    ticks: u64,
    /// (offset into the gap, new signature)
    signatures: Vec<(u64, TimeSignature)>,
    /// Ticks of this gap already fed to the segmenter
    advanced: f64,
}

impl PendingGap {
    /// Feed the segmenter up to `offset` ticks into the gap, switching time
    /// signature where a change sits
    fn advance_to(
        &mut self,
        offset: f64,
        segmenter: &mut MeasureSegmenter,
        table: &DurationTable,
    ) -> Result<()> {
        while let Some(&(at, time_signature)) = self.signatures.first() {
            if at as f64 > offset {
                break;
            }
            segmenter.advance((at as f64 - self.advanced).max(0.0));
            self.advanced = self.advanced.max(at as f64);
            segmenter.set_time_signature(&time_signature, table)?;
            self.signatures.remove(0);
        }
        if offset > self.advanced {
            segmenter.advance(offset - self.advanced);
            self.advanced = offset;
        }
        Ok(())
    }

    /// Advance to `offset` and start a new gap. Changes past `offset` still
    /// apply.
    fn close(
        &mut self,
        offset: f64,
        segmenter: &mut MeasureSegmenter,
        table: &DurationTable,
    ) -> Result<()> {
        self.advance_to(offset, segmenter, table)?;
        for (_, time_signature) in self.signatures.drain(..) {
            segmenter.set_time_signature(&time_signature, table)?;
        }
        *self = PendingGap::default();
        Ok(())
    }
}

/// Turns track event streams into event logs.
///
/// The note and pause tables are built once and shared read-only by every
/// track run, so tracks can be processed in parallel.
#[derive(Debug, Clone)]
pub struct SegmentationPipeline {
    config: Config,
    notes: DurationTable,
    pauses: DurationTable,
}

impl SegmentationPipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let notes = config.duration_table()?;
        let pauses = notes.pause_table();
        Ok(Self {
            config,
            notes,
            pauses,
        })
    }

    fn classifier<'t>(&self, table: &'t DurationTable) -> DurationClassifier<'t> {
        DurationClassifier::new(table)
            .with_max_multiplier(self.config.max_multiplier)
            .with_rebind_tolerance(self.config.rebind_tolerance)
    }

    /// Segment every selected note track of `score`.
    ///
    /// Meta-only tracks produce no log; their last time signature and tempo
    /// become the starting context of the note tracks.
    pub fn process_score(&self, score: &Score) -> Result<Vec<TrackLog>> {
        if score.ticks_per_beat == 0 {
            return Err(NoteLogError::ScoreError(
                "ticks per beat must be positive".to_string(),
            ));
        }
        let context = TrackContext::from_conductor_tracks(&score.tracks);
        debug!(
            "conductor context: {} at {} µs per beat",
            context.time_signature, context.micros_per_beat
        );

        if let TrackSelection::Indices(indices) = &self.config.tracks {
            for index in indices.iter().filter(|&&i| i >= score.tracks.len()) {
                warn!("track {} selected but the score has {} tracks", index, score.tracks.len());
            }
        }

        let selected: Vec<(usize, &Track)> = score
            .tracks
            .iter()
            .enumerate()
            .filter(|(index, _)| self.config.tracks.includes(*index))
            .filter(|(index, track)| {
                let skip = track.is_meta_only();
                if skip {
                    debug!("track {} has no note events, skipped", index);
                }
                !skip
            })
            .collect();

        selected
            .par_iter()
            .map(|(index, track)| self.run_track(*index, track, score.ticks_per_beat, context))
            .collect()
    }

    /// Segment a single track.
    ///
    /// Records come back sorted by order; chord members keep their relative
    /// note-off order.
    pub fn run_track(
        &self,
        track_index: usize,
        track: &Track,
        ticks_per_beat: u16,
        context: TrackContext,
    ) -> Result<TrackLog> {
        let note_classifier = self.classifier(&self.notes);
        let pause_classifier = self.classifier(&self.pauses);
        let mut segmenter = MeasureSegmenter::new(
            ticks_per_beat,
            self.config.measures_per_case,
            &context.time_signature,
            &self.notes,
        )?;
        let mut clock = TempoClock::new(ticks_per_beat, context.micros_per_beat);
        let mut tracker = NoteStateTracker::new();
        let mut records = Vec::new();
        let mut tick: u64 = 0;
        let mut gap = PendingGap::default();

        for event in &track.events {
            tick += event.delta;
            // meta events do not end the gap between two note events
            let delta = gap.ticks + event.delta;
            match event.kind {
                EventKind::TimeSignature(time_signature) => {
                    gap.ticks = delta;
                    gap.signatures.push((delta, time_signature));
                }
                EventKind::SetTempo { micros_per_beat } => {
                    gap.ticks = delta;
                    clock.set_tempo(tick, micros_per_beat);
                    debug!("tempo {} µs per beat at tick {}", micros_per_beat, tick);
                }
                EventKind::NoteOn { pitch, velocity } if velocity > 0 => {
                    let key = pitch_key(pitch);
                    debug!("note_on {} ({}) velocity={} delta={}", key, pitch, velocity, delta);
                    let gap_start = tick - delta;

                    let rests = if delta > 0 {
                        Some(decompose_pause(delta, ticks_per_beat, &pause_classifier)?)
                    } else {
                        None
                    };
                    match rests {
                        Some(PauseDecomposition::Rests(rests)) => {
                            let mut offset = 0.0;
                            for rest in rests {
                                gap.advance_to(offset, &mut segmenter, &self.notes)?;
                                records.push(EventRecord {
                                    case: segmenter.case_id(),
                                    key: PAUSE_KEY.to_string(),
                                    duration_class: rest.name.clone(),
                                    order: tracker.take_order(),
                                    is_chord: false,
                                    timestamp: self
                                        .config
                                        .timestamps
                                        .then(|| clock.at(gap_start as f64 + offset)),
                                });
                                offset += rest.midpoint_ticks(ticks_per_beat);
                            }
                            gap.close(offset, &mut segmenter, &self.notes)?;
                        }
                        Some(PauseDecomposition::Unknown) => {
                            warn!(
                                "track {}: {} tick gap before {} is shorter than any rest, dropped",
                                track_index, delta, key
                            );
                            gap.close(delta as f64, &mut segmenter, &self.notes)?;
                        }
                        None => gap.close(0.0, &mut segmenter, &self.notes)?,
                    }

                    let timestamp = self.config.timestamps.then(|| clock.at(tick as f64));
                    tracker.note_on(&key, delta, tick, segmenter.case_id(), timestamp)?;
                }
                EventKind::NoteOn { pitch, .. } | EventKind::NoteOff { pitch } => {
                    let key = pitch_key(pitch);
                    debug!("note_off {} ({}) delta={}", key, pitch, delta);
                    gap.close(delta as f64, &mut segmenter, &self.notes)?;

                    let closed = tracker.note_off(&key, delta)?;
                    let class = note_classifier.classify(closed.effective_ticks, ticks_per_beat)?;
                    records.push(EventRecord {
                        case: closed.note.case,
                        key,
                        duration_class: class.label(),
                        order: closed.note.order,
                        is_chord: closed.note.is_chord,
                        timestamp: closed.note.timestamp,
                    });
                }
            }
        }

        let trailing = gap.ticks as f64;
        gap.close(trailing, &mut segmenter, &self.notes)?;
        for note in tracker.open_notes() {
            warn!(
                "track {}: {} still sounding at tick {} when the track ends, dropped",
                track_index, note.key, tick
            );
        }

        records.sort_by_key(|record| record.order);
        let log = TrackLog {
            track_index,
            name: track.name.clone(),
            records,
        };
        info!(
            "track {} ({}): {} records in {} cases",
            track_index,
            log.name.as_deref().unwrap_or("unnamed"),
            log.records.len(),
            log.case_ids().len()
        );
        Ok(log)
    }
}

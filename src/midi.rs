//! Standard MIDI File reader
//!
//! Flattens every track of an SMF into the [`ScoreEvent`] stream the
//! segmentation pipeline consumes. Channels are ignored; only note on/off,
//! time signatures and tempo changes are kept. The delta of every dropped
//! event is carried into the next kept one, so absolute positions survive.

use std::path::Path;

use log::{debug, info};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::error::{NoteLogError, Result};
use crate::segment::{Score, ScoreEvent, Track};

/// Parse SMF bytes into a [`Score`].
///
/// # Errors
/// [`NoteLogError::ScoreError`] for unparseable data, timecode based timing
/// or a zero tick resolution.
pub fn read_score(bytes: &[u8]) -> Result<Score> {
    let smf = Smf::parse(bytes).map_err(|e| NoteLogError::ScoreError(e.to_string()))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(fps, subframes) => {
            return Err(NoteLogError::ScoreError(format!(
                "timecode timing ({:?}, {} subframes) is not supported",
                fps,
                subframes
            )))
        }
    };
    if ticks_per_beat == 0 {
        return Err(NoteLogError::ScoreError(
            "ticks per beat must be positive".to_string(),
        ));
    }

    let tracks = smf
        .tracks
        .iter()
        .map(|events| read_track(events))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "read {} tracks at {} ticks per beat",
        tracks.len(),
        ticks_per_beat
    );
    Ok(Score {
        ticks_per_beat,
        tracks,
    })
}

pub fn read_score_file(path: impl AsRef<Path>) -> Result<Score> {
    let bytes = std::fs::read(path)?;
    read_score(&bytes)
}

fn read_track(events: &[midly::TrackEvent<'_>]) -> Result<Track> {
    let mut track = Track::default();
    let mut pending: u64 = 0;

    for event in events {
        let delta = pending + event.delta.as_int() as u64;
        let kept = match event.kind {
            TrackEventKind::Midi { message, .. } => match message {
                MidiMessage::NoteOn { key, vel } => {
                    Some(ScoreEvent::note_on(delta, key.as_int(), vel.as_int()))
                }
                MidiMessage::NoteOff { key, .. } => Some(ScoreEvent::note_off(delta, key.as_int())),
                _ => None,
            },
            TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denominator_power, _, _)) => {
                let denominator = 1u32.checked_shl(denominator_power as u32).ok_or_else(|| {
                    NoteLogError::ScoreError(format!(
                        "time signature denominator 2^{} out of range",
                        denominator_power
                    ))
                })?;
                Some(ScoreEvent::time_signature(delta, numerator as u32, denominator))
            }
            TrackEventKind::Meta(MetaMessage::Tempo(micros_per_beat)) => {
                Some(ScoreEvent::tempo(delta, micros_per_beat.as_int()))
            }
            TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                if track.name.is_none() {
                    track.name = Some(String::from_utf8_lossy(name).trim().to_string());
                }
                None
            }
            _ => None,
        };

        match kept {
            Some(score_event) => {
                track.events.push(score_event);
                pending = 0;
            }
            None => pending = delta,
        }
    }

    debug!(
        "track {:?}: {} events kept of {}",
        track.name,
        track.events.len(),
        events.len()
    );
    Ok(track)
}

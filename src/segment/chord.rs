//! Open-note state, chord detection and note-off duration resolution.
//!
//! ## Chords
//! A note-on with zero delta directly after another note-on (no note-off in
//! between) joins a chord: both notes are flagged and the new note reuses the
//! order slot of the previous one.
//!
//! ## Zero-delta note-offs
//! Authoring tools often serialize simultaneous releases back to back, so all
//! but the first carry a delta of 0. Such a note-off borrows its duration:
//! - chord members take the delta of the chord's anchor note-off
//! - other notes take the delta of the previous note-off

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{NoteLogError, Result};

/// A note that has started but not yet ended
#[derive(Debug, Clone, PartialEq)]
pub struct OpenNote {
    pub key: String,
    /// Absolute tick of the note-on
    pub start_tick: u64,
    pub is_chord: bool,
    pub order: u32,
    pub case: u32,
    pub timestamp: Option<Duration>,
}

/// A note removed from the open set together with the duration to classify
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedNote {
    pub note: OpenNote,
    pub effective_ticks: u64,
}

/// Per-track open-note bookkeeping.
///
/// One tracker belongs to exactly one track run; nothing is shared between
/// tracks.
#[derive(Debug, Clone)]
pub struct NoteStateTracker {
    open: HashMap<String, OpenNote>,
    order: u32,
    /// Key of the last note-on, cleared by any note-off
    previous_note_on: Option<String>,
    previous_note_off_delta: Option<u64>,
    chord_anchor_delta: Option<u64>,
    seen_note_on: bool,
}

impl Default for NoteStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteStateTracker {
    pub fn new() -> Self {
        Self {
            open: HashMap::new(),
            order: 1,
            previous_note_on: None,
            previous_note_off_delta: None,
            chord_anchor_delta: None,
            seen_note_on: false,
        }
    }

    /// The order the next event will get
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Hand out the next order slot (used for rests)
    pub fn take_order(&mut self) -> u32 {
        let order = self.order;
        self.order += 1;
        order
    }

    /// Start a note.
    ///
    /// # Errors
    /// [`NoteLogError::StateError`] if `key` is already sounding.
    pub fn note_on(
        &mut self,
        key: &str,
        delta: u64,
        start_tick: u64,
        case: u32,
        timestamp: Option<Duration>,
    ) -> Result<&OpenNote> {
        if self.open.contains_key(key) {
            return Err(NoteLogError::StateError {
                key: key.to_string(),
                message: "note-on while the same pitch is still sounding".to_string(),
            });
        }

        let is_chord = delta == 0 && self.seen_note_on && self.previous_note_on.is_some();
        if is_chord {
            if let Some(previous) = self
                .previous_note_on
                .as_deref()
                .and_then(|previous| self.open.get_mut(previous))
            {
                previous.is_chord = true;
            }
            self.order = self.order.saturating_sub(1);
        }

        let note = OpenNote {
            key: key.to_string(),
            start_tick,
            is_chord,
            order: self.order,
            case,
            timestamp,
        };
        self.order += 1;
        self.previous_note_on = Some(key.to_string());
        self.seen_note_on = true;

        Ok(&*self.open.entry(key.to_string()).or_insert(note))
    }

    /// Remove an open note.
    ///
    /// # Errors
    /// [`NoteLogError::StateError`] if `key` is not sounding.
    pub fn close_note(&mut self, key: &str) -> Result<OpenNote> {
        self.open.remove(key).ok_or_else(|| NoteLogError::StateError {
            key: key.to_string(),
            message: "note-off without a matching note-on".to_string(),
        })
    }

    /// End a note and work out which delta its duration is.
    pub fn note_off(&mut self, key: &str, delta: u64) -> Result<ClosedNote> {
        let note = self.close_note(key)?;

        let effective_ticks = if note.is_chord {
            if delta == 0 {
                self.chord_anchor_delta.unwrap_or(0)
            } else {
                self.chord_anchor_delta = Some(delta);
                delta
            }
        } else if delta == 0 {
            self.previous_note_off_delta.unwrap_or(0)
        } else {
            delta
        };

        self.previous_note_on = None;
        self.previous_note_off_delta = Some(delta);

        Ok(ClosedNote {
            note,
            effective_ticks,
        })
    }

    pub fn open_notes(&self) -> impl Iterator<Item = &OpenNote> {
        self.open.values()
    }

    pub fn is_open(&self, key: &str) -> bool {
        self.open.contains_key(key)
    }
}

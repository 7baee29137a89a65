//! # Duration Module
//!
//! Turns tick counts into musical duration classes.
//!
//! ## Sub-modules
//! - `table` - [`DurationTable`]: the tolerance-banded classes ("dotted eighth note", ...)
//! - `classify` - [`DurationClassifier`]: tick duration → class, with multiples and rebinding
//! - `pause` - [`decompose_pause`]: silence → ordered rests
//!
//! ## Ratios
//! Everything is expressed as `ticks / ticks_per_beat`. With a quarter-note
//! beat a quarter note has ratio 1.0 and a whole note 4.0, so the default
//! base ratio is 4.0.
//!
//! ## Example
//! ```rust
//! use notelog::duration::{DurationClassifier, DurationTable, DEFAULT_NOTE_NAMES};
//!
//! let table = DurationTable::build(4.0, 0.2, &DEFAULT_NOTE_NAMES).unwrap();
//! let classifier = DurationClassifier::new(&table);
//!
//! assert_eq!(classifier.classify(1440, 480).unwrap().label(), "dotted half note");
//! // ten beats only fit as a multiple
//! assert_eq!(classifier.classify(4800, 480).unwrap().label(), "3-times double dotted half note");
//! ```

mod classify;
mod pause;
mod table;

pub use classify::{
    Classification, DurationClassifier, DEFAULT_MAX_MULTIPLIER, DEFAULT_REBIND_TOLERANCE,
};
pub use pause::{decompose_pause, PauseDecomposition};
pub use table::{
    ClassKind, DurationClass, DurationTable, TimeSignature, DEFAULT_BASE_RATIO, DEFAULT_DEVIATION,
    DEFAULT_NOTE_NAMES,
};

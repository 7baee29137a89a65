//! Silence → sequence of rests.
//!
//! A gap that fits a single band is classified like a note (a multiplier `k`
//! becomes `k` rests of that class). Longer gaps are filled greedily with the
//! longest plain note value that still fits.

use super::classify::{Classification, DurationClassifier};
use super::table::DurationClass;
use crate::error::Result;

/// The rests a silence was split into
#[derive(Debug, Clone, PartialEq)]
pub enum PauseDecomposition<'t> {
    /// Too short to be a rest at all
    Unknown,
    Rests(Vec<&'t DurationClass>),
}

impl<'t> PauseDecomposition<'t> {
    /// Class names in order, `["unknown"]` for a sub-threshold gap
    pub fn names(&self) -> Vec<String> {
        match self {
            PauseDecomposition::Unknown => vec!["unknown".to_string()],
            PauseDecomposition::Rests(rests) => rests.iter().map(|c| c.name.clone()).collect(),
        }
    }

    /// Sum of the canonical (midpoint) lengths in ticks
    pub fn span_ticks(&self, ticks_per_beat: u16) -> f64 {
        match self {
            PauseDecomposition::Unknown => 0.0,
            PauseDecomposition::Rests(rests) => {
                rests.iter().map(|c| c.midpoint_ticks(ticks_per_beat)).sum()
            }
        }
    }
}

/// Split a silence of `ticks` into rests.
///
/// `classifier` must run over a pause table (see
/// [`DurationTable::pause_table`](super::DurationTable::pause_table)).
///
/// # Example
/// ```
/// use notelog::duration::{decompose_pause, DurationClassifier, DurationTable, DEFAULT_NOTE_NAMES};
///
/// let table = DurationTable::build(4.0, 0.2, &DEFAULT_NOTE_NAMES).unwrap().pause_table();
/// let classifier = DurationClassifier::new(&table);
///
/// let rests = decompose_pause(960, 480, &classifier).unwrap();
/// assert_eq!(rests.names(), vec!["half note"]);
/// ```
pub fn decompose_pause<'t>(
    ticks: u64,
    ticks_per_beat: u16,
    classifier: &DurationClassifier<'t>,
) -> Result<PauseDecomposition<'t>> {
    let table = classifier.table();
    let ratio = ticks as f64 / ticks_per_beat as f64;
    if ratio < table.lower_bound() {
        return Ok(PauseDecomposition::Unknown);
    }

    if ratio > table.upper_bound() {
        let plain: Vec<&'t DurationClass> = table.plain_classes().collect();
        let mut remaining = ratio;
        let mut rests = Vec::new();
        while remaining >= table.lower_bound() {
            match plain.iter().find(|c| c.lower <= remaining) {
                Some(class) => {
                    rests.push(*class);
                    remaining -= class.lower;
                }
                None => break,
            }
        }
        return Ok(PauseDecomposition::Rests(rests));
    }

    match classifier.classify(ticks, ticks_per_beat)? {
        Classification::Class { multiplier, class } => {
            Ok(PauseDecomposition::Rests(vec![class; multiplier as usize]))
        }
        Classification::Unknown => Ok(PauseDecomposition::Unknown),
    }
}

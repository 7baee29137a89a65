//! Tick duration → duration class.
//!
//! Classification runs in two passes. The first pass tries the raw ratio and
//! its integer fractions (`ratio / 2`, `ratio / 3`, ...) against every band, so
//! tied or multi-beat notes come out as "3-times quarter note". If nothing
//! matches, the ratio is snapped onto the closest band midpoint within the
//! rebinding tolerance and the search runs exactly once more.

use log::trace;

use super::table::{DurationClass, DurationTable};
use crate::error::{NoteLogError, Result};

pub const DEFAULT_MAX_MULTIPLIER: u32 = 100;

/// Relative distance to a band midpoint that still rebinds to it
pub const DEFAULT_REBIND_TOLERANCE: f64 = 0.10;

/// Result of classifying one duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification<'t> {
    Class {
        multiplier: u32,
        class: &'t DurationClass,
    },
    /// Shorter than the shortest band
    Unknown,
}

impl Classification<'_> {
    /// Label as it appears in the event log, e.g. "dotted eighth note",
    /// "2-times half note" or "unknown"
    pub fn label(&self) -> String {
        match self {
            Classification::Class { multiplier, class } if *multiplier > 1 => {
                format!("{}-times {}", multiplier, class.name)
            }
            Classification::Class { class, .. } => class.name.clone(),
            Classification::Unknown => "unknown".to_string(),
        }
    }
}

/// Outcome of one multiplier search
#[derive(Debug, Clone, Copy, PartialEq)]
enum MatchOutcome<'t> {
    Matched {
        multiplier: u32,
        class: &'t DurationClass,
    },
    NeedsRebind,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    First,
    Rebound,
}

/// Maps tick durations onto the classes of a [`DurationTable`]
#[derive(Debug, Clone, Copy)]
pub struct DurationClassifier<'t> {
    table: &'t DurationTable,
    max_multiplier: u32,
    rebind_tolerance: f64,
}

impl<'t> DurationClassifier<'t> {
    pub fn new(table: &'t DurationTable) -> Self {
        Self {
            table,
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
            rebind_tolerance: DEFAULT_REBIND_TOLERANCE,
        }
    }

    pub fn with_max_multiplier(mut self, max_multiplier: u32) -> Self {
        self.max_multiplier = max_multiplier.max(1);
        self
    }

    pub fn with_rebind_tolerance(mut self, tolerance: f64) -> Self {
        self.rebind_tolerance = tolerance;
        self
    }

    pub fn table(&self) -> &'t DurationTable {
        self.table
    }

    /// Classify `ticks` relative to `ticks_per_beat`.
    ///
    /// # Example
    /// ```
    /// use notelog::duration::{DurationClassifier, DurationTable, DEFAULT_NOTE_NAMES};
    ///
    /// let table = DurationTable::build(4.0, 0.2, &DEFAULT_NOTE_NAMES).unwrap();
    /// let classifier = DurationClassifier::new(&table);
    ///
    /// assert_eq!(classifier.classify(480, 480).unwrap().label(), "quarter note");
    /// assert_eq!(classifier.classify(720, 480).unwrap().label(), "dotted quarter note");
    /// assert_eq!(classifier.classify(2, 480).unwrap().label(), "unknown");
    /// ```
    ///
    /// # Errors
    /// [`NoteLogError::ClassificationError`] when neither pass finds a band.
    pub fn classify(&self, ticks: u64, ticks_per_beat: u16) -> Result<Classification<'t>> {
        let ratio = ticks as f64 / ticks_per_beat as f64;
        if ratio < self.table.lower_bound() {
            return Ok(Classification::Unknown);
        }

        let mut outcome = self.search(ratio, Pass::First);
        loop {
            match outcome {
                MatchOutcome::Matched { multiplier, class } => {
                    return Ok(Classification::Class { multiplier, class });
                }
                MatchOutcome::NeedsRebind => {
                    outcome = match self.nearest_midpoint(ratio) {
                        Some(class) => {
                            trace!(
                                "rebinding {} ticks (ratio {:.4}) onto {} (midpoint {:.4})",
                                ticks,
                                ratio,
                                class.name,
                                class.midpoint()
                            );
                            self.search(class.midpoint(), Pass::Rebound)
                        }
                        None => MatchOutcome::Exhausted,
                    };
                }
                MatchOutcome::Exhausted => {
                    return Err(NoteLogError::ClassificationError {
                        ticks,
                        ticks_per_beat,
                    });
                }
            }
        }
    }

    /// Try `ratio / m` for `m = 1..=max_multiplier`; first band in declaration order wins
    fn search(&self, ratio: f64, pass: Pass) -> MatchOutcome<'t> {
        for multiplier in 1..=self.max_multiplier {
            let scaled = ratio / multiplier as f64;
            if scaled < self.table.lower_bound() {
                break;
            }
            if let Some(class) = self.table.classes().iter().find(|c| c.contains(scaled)) {
                return MatchOutcome::Matched { multiplier, class };
            }
        }
        match pass {
            Pass::First => MatchOutcome::NeedsRebind,
            Pass::Rebound => MatchOutcome::Exhausted,
        }
    }

    /// The band whose midpoint is closest to `ratio`, if it lies within the tolerance
    fn nearest_midpoint(&self, ratio: f64) -> Option<&'t DurationClass> {
        self.table
            .classes()
            .iter()
            .filter(|c| (ratio - c.midpoint()).abs() <= self.rebind_tolerance * c.midpoint())
            .min_by(|a, b| {
                let da = (ratio - a.midpoint()).abs();
                let db = (ratio - b.midpoint()).abs();
                da.total_cmp(&db)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::table::{DEFAULT_BASE_RATIO, DEFAULT_DEVIATION, DEFAULT_NOTE_NAMES};

    fn table() -> DurationTable {
        DurationTable::build(DEFAULT_BASE_RATIO, DEFAULT_DEVIATION, &DEFAULT_NOTE_NAMES).unwrap()
    }

    #[test]
    fn test_basic_values() {
        let table = table();
        let classifier = DurationClassifier::new(&table);
        let label = |ticks| classifier.classify(ticks, 480).unwrap().label();

        assert_eq!(label(1920), "whole note");
        assert_eq!(label(960), "half note");
        assert_eq!(label(480), "quarter note");
        assert_eq!(label(240), "eighth note");
        assert_eq!(label(360), "dotted eighth note");
        assert_eq!(label(420), "double dotted eighth note");
        assert_eq!(label(80), "triplet sixteenth note");
    }

    #[test]
    fn test_jitter_within_band() {
        let table = table();
        let classifier = DurationClassifier::new(&table);
        // a few ticks off the canonical value still lands in the band
        assert_eq!(classifier.classify(470, 480).unwrap().label(), "quarter note");
        assert_eq!(classifier.classify(495, 480).unwrap().label(), "quarter note");
    }

    #[test]
    fn test_below_lower_bound_is_unknown() {
        let table = table();
        let classifier = DurationClassifier::new(&table);
        assert_eq!(classifier.classify(0, 480).unwrap(), Classification::Unknown);
        assert_eq!(classifier.classify(9, 480).unwrap(), Classification::Unknown);
        assert_eq!(classifier.classify(9, 480).unwrap().label(), "unknown");
    }

    #[test]
    fn test_multiplier() {
        let table = table();
        let classifier = DurationClassifier::new(&table);

        // 10 beats: nothing fits directly, 10 / 2 = 5 neither, 10 / 3 = 3.33 is a double dotted half
        let result = classifier.classify(4800, 480).unwrap();
        assert_eq!(result.label(), "3-times double dotted half note");

        // 1.2 beats sits between quarter and dotted quarter; 1.2 / 5 = 0.24 is a sixteenth
        let result = classifier.classify(576, 480).unwrap();
        match result {
            Classification::Class { multiplier, class } => {
                assert_eq!(multiplier, 5);
                assert_eq!(class.name, "sixteenth note");
            }
            Classification::Unknown => panic!("expected a class"),
        }
    }

    #[test]
    fn test_rebinding_recovers_near_miss() {
        let table = table();
        let classifier = DurationClassifier::new(&table).with_max_multiplier(1);
        // ratio 1.083 misses the quarter band (0.95, 1.05] but is within 10% of 1.0
        let result = classifier.classify(520, 480).unwrap();
        assert_eq!(result.label(), "quarter note");
    }

    #[test]
    fn test_rebinding_failure_is_error() {
        let table = table();
        let classifier = DurationClassifier::new(&table).with_max_multiplier(1);
        // ratio 1.3: 30% off a quarter, 13% off a dotted quarter
        let result = classifier.classify(624, 480);
        assert!(matches!(
            result,
            Err(NoteLogError::ClassificationError {
                ticks: 624,
                ticks_per_beat: 480
            })
        ));
    }

    #[test]
    fn test_midpoint_round_trip() {
        let table = table();
        let classifier = DurationClassifier::new(&table);
        // 3840 ticks per beat keeps every midpoint on a whole tick
        for class in table.classes() {
            let ticks = class.midpoint_ticks(3840).round() as u64;
            match classifier.classify(ticks, 3840).unwrap() {
                Classification::Class { multiplier, class: found } => {
                    assert_eq!(multiplier, 1, "{}", class.name);
                    assert_eq!(found.name, class.name);
                }
                Classification::Unknown => panic!("{} classified as unknown", class.name),
            }
        }
    }

    #[test]
    fn test_band_containment() {
        let table = table();
        let classifier = DurationClassifier::new(&table);
        let tpb = 960u16;
        for ticks in 1..=7200u64 {
            let ratio = ticks as f64 / tpb as f64;
            let Some(band) = table.classes().iter().find(|c| c.contains(ratio)) else {
                continue;
            };
            match classifier.classify(ticks, tpb).unwrap() {
                Classification::Class { multiplier, class } => {
                    assert_eq!(multiplier, 1);
                    assert_eq!(class.name, band.name);
                    assert!(class.contains(ratio));
                }
                Classification::Unknown => panic!("{} ticks classified as unknown", ticks),
            }
        }
    }

    #[test]
    fn test_everything_below_lower_bound_is_unknown() {
        let table = table();
        let classifier = DurationClassifier::new(&table);
        for ticks in 0u64.. {
            if ticks as f64 / 960.0 >= table.lower_bound() {
                break;
            }
            assert_eq!(classifier.classify(ticks, 960).unwrap(), Classification::Unknown);
        }
    }
}

//! Case bookkeeping: which measure group an event belongs to.

use log::debug;

use crate::duration::{DurationTable, TimeSignature};
use crate::error::{NoteLogError, Result};

/// Number of ticks after which a new case starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaseThreshold {
    Ticks(f64),
    /// `measures_per_case = 0`: the whole track is one case
    Unbounded,
}

impl CaseThreshold {
    /// `ticks_per_beat * lower(reference class) * numerator * measures_per_case`
    ///
    /// The lower edge of the reference band is used so that slightly short
    /// measures (authoring-tool rounding) still close their case.
    pub fn for_time_signature(
        time_signature: &TimeSignature,
        ticks_per_beat: u16,
        measures_per_case: u32,
        table: &DurationTable,
    ) -> Result<Self> {
        let reference = table.reference_class(time_signature)?;
        if time_signature.numerator == 0 {
            return Err(NoteLogError::ConfigError(format!(
                "time signature {} has no beats",
                time_signature
            )));
        }
        if measures_per_case == 0 {
            return Ok(CaseThreshold::Unbounded);
        }
        Ok(CaseThreshold::Ticks(
            ticks_per_beat as f64
                * reference.lower
                * time_signature.numerator as f64
                * measures_per_case as f64,
        ))
    }
}

/// Transient signal returned by [`MeasureSegmenter::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSignal {
    WithinCase,
    CaseBoundaryCrossed { cases: u32 },
}

/// Tracks accumulated ticks against the case threshold.
///
/// Overflow past the threshold is carried into the next case rather than
/// dropped. A threshold change applies from the next advance on.
#[derive(Debug, Clone)]
pub struct MeasureSegmenter {
    case: u32,
    ticks: f64,
    threshold: CaseThreshold,
    ticks_per_beat: u16,
    measures_per_case: u32,
}

impl MeasureSegmenter {
    pub fn new(
        ticks_per_beat: u16,
        measures_per_case: u32,
        time_signature: &TimeSignature,
        table: &DurationTable,
    ) -> Result<Self> {
        let threshold =
            CaseThreshold::for_time_signature(time_signature, ticks_per_beat, measures_per_case, table)?;
        Ok(Self {
            case: 1,
            ticks: 0.0,
            threshold,
            ticks_per_beat,
            measures_per_case,
        })
    }

    pub fn set_time_signature(&mut self, time_signature: &TimeSignature, table: &DurationTable) -> Result<()> {
        self.threshold = CaseThreshold::for_time_signature(
            time_signature,
            self.ticks_per_beat,
            self.measures_per_case,
            table,
        )?;
        debug!("time signature {} → case threshold {:?}", time_signature, self.threshold);
        Ok(())
    }

    /// Add `ticks` and start a new case for every threshold they reach.
    ///
    /// # Example
    /// ```
    /// use notelog::duration::{DurationTable, TimeSignature, DEFAULT_NOTE_NAMES};
    /// use notelog::segment::{MeasureSegmenter, SegmentSignal};
    ///
    /// let table = DurationTable::build(4.0, 0.2, &DEFAULT_NOTE_NAMES).unwrap();
    /// let mut segmenter = MeasureSegmenter::new(480, 1, &TimeSignature::default(), &table).unwrap();
    ///
    /// assert_eq!(segmenter.advance(960.0), SegmentSignal::WithinCase);
    /// assert_eq!(segmenter.advance(960.0), SegmentSignal::CaseBoundaryCrossed { cases: 1 });
    /// assert_eq!(segmenter.case_id(), 2);
    /// ```
    pub fn advance(&mut self, ticks: f64) -> SegmentSignal {
        self.ticks += ticks;
        let CaseThreshold::Ticks(threshold) = self.threshold else {
            return SegmentSignal::WithinCase;
        };
        if self.ticks < threshold {
            return SegmentSignal::WithinCase;
        }

        let cases = (self.ticks / threshold).floor() as u32;
        self.case += cases;
        self.ticks %= threshold;
        debug!("case boundary crossed, now in case {}", self.case);
        SegmentSignal::CaseBoundaryCrossed { cases }
    }

    pub fn case_id(&self) -> u32 {
        self.case
    }

    pub fn threshold(&self) -> CaseThreshold {
        self.threshold
    }

    /// Ticks accumulated in the current case
    pub fn ticks(&self) -> f64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::DEFAULT_NOTE_NAMES;

    fn table() -> DurationTable {
        DurationTable::build(4.0, 0.2, &DEFAULT_NOTE_NAMES).unwrap()
    }

    fn ts(numerator: u32, denominator: u32) -> TimeSignature {
        TimeSignature {
            numerator,
            denominator,
        }
    }

    #[test]
    fn test_threshold_values() {
        let table = table();
        // 480 * 0.95 * 4
        assert_eq!(
            CaseThreshold::for_time_signature(&ts(4, 4), 480, 1, &table).unwrap(),
            CaseThreshold::Ticks(480.0 * 0.95 * 4.0)
        );
        // two measures of 6/8: 480 * 0.475 * 6 * 2
        match CaseThreshold::for_time_signature(&ts(6, 8), 480, 2, &table).unwrap() {
            CaseThreshold::Ticks(t) => assert!((t - 2736.0).abs() < 1e-9),
            CaseThreshold::Unbounded => panic!("expected a bounded threshold"),
        }
        assert_eq!(
            CaseThreshold::for_time_signature(&ts(3, 4), 480, 0, &table).unwrap(),
            CaseThreshold::Unbounded
        );
    }

    #[test]
    fn test_invalid_time_signatures() {
        let table = table();
        assert!(matches!(
            CaseThreshold::for_time_signature(&ts(4, 5), 480, 1, &table),
            Err(NoteLogError::ConfigError(_))
        ));
        assert!(matches!(
            CaseThreshold::for_time_signature(&ts(0, 4), 480, 1, &table),
            Err(NoteLogError::ConfigError(_))
        ));
        // measures_per_case = 0 still validates the denominator
        assert!(CaseThreshold::for_time_signature(&ts(4, 6), 480, 0, &table).is_err());
    }

    #[test]
    fn test_overflow_carries_into_next_case() {
        let table = table();
        let mut segmenter = MeasureSegmenter::new(100, 1, &ts(4, 4), &table).unwrap();
        // threshold 380
        assert_eq!(segmenter.advance(300.0), SegmentSignal::WithinCase);
        assert_eq!(segmenter.advance(100.0), SegmentSignal::CaseBoundaryCrossed { cases: 1 });
        assert_eq!(segmenter.case_id(), 2);
        assert!((segmenter.ticks() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_count_is_floor_of_total() {
        let table = table();
        let deltas = [480.0, 0.0, 240.0, 1920.0, 5000.0, 120.0, 960.0, 3.0, 7681.0];
        let mut segmenter = MeasureSegmenter::new(480, 1, &ts(4, 4), &table).unwrap();
        let threshold = match segmenter.threshold() {
            CaseThreshold::Ticks(t) => t,
            CaseThreshold::Unbounded => panic!("expected a bounded threshold"),
        };

        let mut increments = 0;
        for delta in deltas {
            if let SegmentSignal::CaseBoundaryCrossed { cases } = segmenter.advance(delta) {
                increments += cases;
            }
        }
        let total: f64 = deltas.iter().sum();
        assert_eq!(increments, (total / threshold).floor() as u32);
        assert_eq!(segmenter.case_id(), 1 + increments);
    }

    #[test]
    fn test_unbounded_never_crosses() {
        let table = table();
        let mut segmenter = MeasureSegmenter::new(480, 0, &ts(4, 4), &table).unwrap();
        for _ in 0..100 {
            assert_eq!(segmenter.advance(1920.0), SegmentSignal::WithinCase);
        }
        assert_eq!(segmenter.case_id(), 1);
    }

    #[test]
    fn test_time_signature_change_applies_forward() {
        let table = table();
        let mut segmenter = MeasureSegmenter::new(480, 1, &ts(4, 4), &table).unwrap();
        segmenter.advance(1000.0);
        segmenter.set_time_signature(&ts(2, 4), &table).unwrap();
        // new threshold 912: 1000 already accumulated crosses on the next advance
        assert_eq!(segmenter.advance(0.0), SegmentSignal::CaseBoundaryCrossed { cases: 1 });
        assert_eq!(segmenter.case_id(), 2);
    }
}

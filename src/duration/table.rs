//! Duration classes and the table they live in.
//!
//! Every class is a half-open band `(lower, upper]` of ratios, where a ratio is
//! a duration in ticks divided by the ticks per beat. The table is built once
//! from a base whole-note ratio and a deviation and never changes afterwards.

use crate::error::{NoteLogError, Result};

/// Whole note (four beats) in ticks-per-beat units.
pub const DEFAULT_BASE_RATIO: f64 = 4.0;

/// Half-width of the whole-note band. Every other band is scaled from it.
pub const DEFAULT_DEVIATION: f64 = 0.2;

/// Base note names, longest first. Each entry halves the previous one.
pub const DEFAULT_NOTE_NAMES: [&str; 8] = [
    "whole note",
    "half note",
    "quarter note",
    "eighth note",
    "sixteenth note",
    "thirty-second note",
    "sixty-fourth note",
    "a hundred and twenty-eighth note",
];

/// Only the shortest base values get a triplet band.
const TRIPLET_LEVELS: usize = 4;

/// How a class relates to its base note value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    DoubleDotted,
    Dotted,
    Plain,
    Triplet,
}

impl ClassKind {
    fn prefix(&self) -> &'static str {
        match self {
            ClassKind::DoubleDotted => "double dotted ",
            ClassKind::Dotted => "dotted ",
            ClassKind::Plain => "",
            ClassKind::Triplet => "triplet ",
        }
    }
}

/// A named duration band
#[derive(Debug, Clone, PartialEq)]
pub struct DurationClass {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub kind: ClassKind,
    /// Index of the base note value (0 = whole note, 1 = half note, ...)
    pub level: usize,
}

impl DurationClass {
    /// Whether `ratio` falls into `(lower, upper]`
    pub fn contains(&self, ratio: f64) -> bool {
        self.lower < ratio && ratio <= self.upper
    }

    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    /// Canonical length of this class in ticks
    pub fn midpoint_ticks(&self, ticks_per_beat: u16) -> f64 {
        self.midpoint() * ticks_per_beat as f64
    }
}

/// Time signature as found in the score (e.g. 3/4, 6/8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Immutable, ordered set of duration classes.
///
/// Declaration order matters: when a ratio sits in more than one band the
/// earliest declared class wins. Per base value the order is double dotted,
/// dotted, plain, triplet, longest base value first.
#[derive(Debug, Clone)]
pub struct DurationTable {
    classes: Vec<DurationClass>,
    lower: f64,
    upper: f64,
}

impl DurationTable {
    /// Build the table from a base whole-note ratio and a deviation.
    ///
    /// For the base name at index `i` the plain band is
    /// `[base_ratio - deviation, base_ratio + deviation] * 2^-i`; dotted and
    /// double dotted bands scale it by 1.5 and 1.75. The four shortest names
    /// also get a triplet band, a third of the next longer plain band.
    ///
    /// # Example
    /// ```
    /// use notelog::duration::{DurationTable, DEFAULT_NOTE_NAMES};
    ///
    /// let table = DurationTable::build(4.0, 0.2, &DEFAULT_NOTE_NAMES).unwrap();
    /// let quarter = table.get("quarter note").unwrap();
    /// assert!(quarter.contains(1.0));
    /// assert!(table.get("triplet sixteenth note").is_some());
    /// ```
    pub fn build<S: AsRef<str>>(base_ratio: f64, deviation: f64, note_names: &[S]) -> Result<Self> {
        if note_names.len() < 2 {
            return Err(NoteLogError::ConfigError(format!(
                "at least 2 note names are required, got {}",
                note_names.len()
            )));
        }
        if !base_ratio.is_finite() || base_ratio <= 0.0 {
            return Err(NoteLogError::ConfigError(format!(
                "base ratio must be a positive number, got {}",
                base_ratio
            )));
        }
        if !deviation.is_finite() || deviation <= 0.0 || deviation >= base_ratio / 2.0 {
            return Err(NoteLogError::ConfigError(format!(
                "deviation must lie in (0, {}), got {}",
                base_ratio / 2.0,
                deviation
            )));
        }

        let plain_bounds = |level: usize| {
            let scale = 0.5f64.powi(level as i32);
            ((base_ratio - deviation) * scale, (base_ratio + deviation) * scale)
        };
        let first_triplet_level = note_names.len().saturating_sub(TRIPLET_LEVELS).max(1);

        let mut classes = Vec::with_capacity(note_names.len() * 4);
        for (level, name) in note_names.iter().enumerate() {
            let name = name.as_ref();
            let (lower, upper) = plain_bounds(level);

            for (kind, factor) in [
                (ClassKind::DoubleDotted, 1.75),
                (ClassKind::Dotted, 1.5),
                (ClassKind::Plain, 1.0),
            ] {
                classes.push(DurationClass {
                    name: format!("{}{}", kind.prefix(), name),
                    lower: lower * factor,
                    upper: upper * factor,
                    kind,
                    level,
                });
            }

            if level >= first_triplet_level {
                let (longer_lower, longer_upper) = plain_bounds(level - 1);
                classes.push(DurationClass {
                    name: format!("{}{}", ClassKind::Triplet.prefix(), name),
                    lower: longer_lower / 3.0,
                    upper: longer_upper / 3.0,
                    kind: ClassKind::Triplet,
                    level,
                });
            }
        }

        Ok(Self::from_classes(classes))
    }

    fn from_classes(classes: Vec<DurationClass>) -> Self {
        let lower = classes.iter().map(|c| c.lower).fold(f64::INFINITY, f64::min);
        let upper = classes.iter().map(|c| c.upper).fold(0.0, f64::max);
        Self {
            classes,
            lower,
            upper,
        }
    }

    /// The same table without the dotted and double dotted whole-note bands.
    ///
    /// A rest never lasts longer than a whole measure, so silences are
    /// classified against this reduced table.
    pub fn pause_table(&self) -> DurationTable {
        let classes = self
            .classes
            .iter()
            .filter(|c| !(c.level == 0 && matches!(c.kind, ClassKind::Dotted | ClassKind::DoubleDotted)))
            .cloned()
            .collect();
        Self::from_classes(classes)
    }

    pub fn classes(&self) -> &[DurationClass] {
        &self.classes
    }

    /// Smallest lower ratio of all bands
    pub fn lower_bound(&self) -> f64 {
        self.lower
    }

    /// Largest upper ratio of all bands
    pub fn upper_bound(&self) -> f64 {
        self.upper
    }

    pub fn get(&self, name: &str) -> Option<&DurationClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Plain (undotted, non-triplet) classes, longest first
    pub fn plain_classes(&self) -> impl Iterator<Item = &DurationClass> {
        self.classes.iter().filter(|c| c.kind == ClassKind::Plain)
    }

    /// The note value a time signature counts in: 4 → quarter note, 8 → eighth note.
    ///
    /// Denominators outside `{1, 2, 4, ..., 128}`, or beyond the shortest
    /// configured note name, are a configuration error.
    pub fn reference_class(&self, time_signature: &TimeSignature) -> Result<&DurationClass> {
        let denominator = time_signature.denominator;
        if !denominator.is_power_of_two() || denominator > 128 {
            return Err(NoteLogError::ConfigError(format!(
                "unsupported time signature denominator {} in {}",
                denominator, time_signature
            )));
        }
        let level = denominator.trailing_zeros() as usize;
        self.plain_classes()
            .find(|c| c.level == level)
            .ok_or_else(|| {
                NoteLogError::ConfigError(format!(
                    "no note name configured for time signature denominator {}",
                    denominator
                ))
            })
    }
}

//! Run configuration
//!
//! A configuration file is plain YAML; every key is optional:
//!
//! ```yaml
//! measures-per-case: 2
//! tracks: [1, 2]        # or "all"
//! base-ratio: 4.0
//! deviation: 0.2
//! max-multiplier: 100
//! rebind-tolerance: 0.1
//! timestamps: true
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::duration::{
    DurationTable, DEFAULT_BASE_RATIO, DEFAULT_DEVIATION, DEFAULT_MAX_MULTIPLIER,
    DEFAULT_NOTE_NAMES, DEFAULT_REBIND_TOLERANCE,
};
use crate::error::{NoteLogError, Result};

/// Which tracks of a score get an event log
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrackSelection {
    #[default]
    All,
    Indices(Vec<usize>),
}

impl TrackSelection {
    pub fn includes(&self, index: usize) -> bool {
        match self {
            TrackSelection::All => true,
            TrackSelection::Indices(indices) => indices.contains(&index),
        }
    }

    /// Parse the command-line form: `all` or a comma separated index list
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(TrackSelection::All);
        }
        let indices = s
            .split(',')
            .map(|part| {
                part.trim().parse::<usize>().map_err(|_| {
                    NoteLogError::ConfigError(format!("Invalid track index: {}", part.trim()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TrackSelection::Indices(indices))
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawTracks {
    Keyword(String),
    Indices(Vec<usize>),
}

/// Raw configuration for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    measures_per_case: Option<u32>,
    tracks: Option<RawTracks>,
    base_ratio: Option<f64>,
    deviation: Option<f64>,
    max_multiplier: Option<u32>,
    rebind_tolerance: Option<f64>,
    note_names: Option<Vec<String>>,
    timestamps: Option<bool>,
}

/// Validated run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Measures grouped into one case; 0 makes the whole track a single case
    pub measures_per_case: u32,
    pub tracks: TrackSelection,
    pub base_ratio: f64,
    pub deviation: f64,
    pub max_multiplier: u32,
    pub rebind_tolerance: f64,
    /// Plain note names, longest first
    pub note_names: Vec<String>,
    pub timestamps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            measures_per_case: 1,
            tracks: TrackSelection::All,
            base_ratio: DEFAULT_BASE_RATIO,
            deviation: DEFAULT_DEVIATION,
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
            rebind_tolerance: DEFAULT_REBIND_TOLERANCE,
            note_names: DEFAULT_NOTE_NAMES.iter().map(|s| s.to_string()).collect(),
            timestamps: false,
        }
    }
}

impl Config {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        let raw: RawConfig = serde_yaml::from_str(content)
            .map_err(|e| NoteLogError::ConfigError(e.to_string()))?;

        let defaults = Config::default();
        let tracks = match raw.tracks {
            None => defaults.tracks,
            Some(RawTracks::Keyword(keyword)) if keyword.eq_ignore_ascii_case("all") => {
                TrackSelection::All
            }
            Some(RawTracks::Keyword(keyword)) => {
                return Err(NoteLogError::ConfigError(format!(
                    "Invalid track selection: {}",
                    keyword
                )))
            }
            Some(RawTracks::Indices(indices)) => TrackSelection::Indices(indices),
        };

        let config = Config {
            measures_per_case: raw.measures_per_case.unwrap_or(defaults.measures_per_case),
            tracks,
            base_ratio: raw.base_ratio.unwrap_or(defaults.base_ratio),
            deviation: raw.deviation.unwrap_or(defaults.deviation),
            max_multiplier: raw.max_multiplier.unwrap_or(defaults.max_multiplier),
            rebind_tolerance: raw.rebind_tolerance.unwrap_or(defaults.rebind_tolerance),
            note_names: raw.note_names.unwrap_or(defaults.note_names),
            timestamps: raw.timestamps.unwrap_or(defaults.timestamps),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Check value ranges. Table parameters are checked by building the table.
    pub fn validate(&self) -> Result<()> {
        if self.max_multiplier == 0 {
            return Err(NoteLogError::ConfigError(
                "max-multiplier must be at least 1".to_string(),
            ));
        }
        if !(self.rebind_tolerance.is_finite() && self.rebind_tolerance >= 0.0) {
            return Err(NoteLogError::ConfigError(format!(
                "rebind-tolerance must be a non-negative number, got {}",
                self.rebind_tolerance
            )));
        }
        if let TrackSelection::Indices(indices) = &self.tracks {
            if indices.is_empty() {
                return Err(NoteLogError::ConfigError(
                    "track selection is empty".to_string(),
                ));
            }
        }
        // names end up as CSV fields
        if let Some(name) = self
            .note_names
            .iter()
            .find(|name| name.contains([';', '\n', '\r']))
        {
            return Err(NoteLogError::ConfigError(format!(
                "note name {:?} must not contain ';' or a line break",
                name
            )));
        }
        self.duration_table().map(|_| ())
    }

    pub fn duration_table(&self) -> Result<DurationTable> {
        DurationTable::build(self.base_ratio, self.deviation, &self.note_names)
    }
}

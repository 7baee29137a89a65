//! # Error Types
//!
//! All fallible operations in notelog return [`NoteLogError`].
//!
//! ## Error Types
//! - `ConfigError` - Bad duration-table parameters, unknown time-signature denominator, bad config file
//! - `ClassificationError` - A duration fits no duration class, even after rebinding
//! - `StateError` - The note stream breaks open/close bookkeeping (note-off without note-on, ...)
//! - `ScoreError` - The score reader could not turn the input into event streams
//! - `WriteError` / `Io` - Log writer failures
//!
//! "unknown" is not an error: durations below the shortest class are a valid
//! classification result.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoteLogError {
    /// Invalid configuration.
    ///
    /// # Example
    /// ```
    /// # use notelog::NoteLogError;
    /// let err = NoteLogError::ConfigError("unsupported time signature denominator 3".to_string());
    /// assert_eq!(err.to_string(), "Configuration error: unsupported time signature denominator 3");
    /// ```
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A tick duration that matched no duration class, neither directly, as a
    /// multiple, nor after snapping to the nearest band midpoint.
    #[error("Classification error: {ticks} ticks ({ticks_per_beat} per beat) fit no duration class")]
    ClassificationError { ticks: u64, ticks_per_beat: u16 },

    /// Open-note bookkeeping was violated by the input stream.
    ///
    /// # Example
    /// ```
    /// # use notelog::NoteLogError;
    /// let err = NoteLogError::StateError {
    ///     key: "C4".to_string(),
    ///     message: "note-off without a matching note-on".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "State error for C4: note-off without a matching note-on");
    /// ```
    #[error("State error for {key}: {message}")]
    StateError { key: String, message: String },

    #[error("Invalid score: {0}")]
    ScoreError(String),

    #[error("Failed to write log: {0}")]
    WriteError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NoteLogError>;

//! # Writer Module
//!
//! Serialize track event logs.
//!
//! ## Sub-modules
//! - `csv` - `;`-delimited rows with a `Case_ID;Event;Type;Order;Is_Chord` header
//! - `xes` - XES XML with one trace per case
//!
//! [`write_track_files()`] writes both next to each other as
//! `track_{index}.csv` and `track_{index}.xes`.

mod csv;
mod xes;

use std::path::{Path, PathBuf};

use log::info;

pub use self::csv::{write_csv, write_csv_file, CSV_HEADER};
pub use self::xes::{write_xes, write_xes_file};

use crate::error::Result;
use crate::segment::TrackLog;

/// Which files to produce per track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub timestamps: bool,
    pub xes: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            timestamps: false,
            xes: true,
        }
    }
}

/// Write the log files of one track into `dir`, returning the written paths
pub fn write_track_files(log: &TrackLog, dir: &Path, options: OutputOptions) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let csv_path = dir.join(format!("track_{}.csv", log.track_index));
    write_csv_file(&csv_path, &log.records, options.timestamps)?;
    info!("wrote {}", csv_path.display());
    written.push(csv_path);

    if options.xes {
        let xes_path = dir.join(format!("track_{}.xes", log.track_index));
        write_xes_file(&xes_path, log)?;
        info!("wrote {}", xes_path.display());
        written.push(xes_path);
    }

    Ok(written)
}

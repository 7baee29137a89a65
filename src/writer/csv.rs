//! `;`-delimited event log

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::segment::EventRecord;

pub const CSV_HEADER: &str = "Case_ID;Event;Type;Order;Is_Chord";

/// Write `records` with a header row.
///
/// Booleans are written `True`/`False`. With `timestamps` an extra
/// `Timestamp` column holds seconds from the start of the track.
///
/// # Example
/// ```
/// use notelog::segment::EventRecord;
/// use notelog::writer::write_csv;
///
/// let records = vec![EventRecord {
///     case: 1,
///     key: "C4".to_string(),
///     duration_class: "quarter note".to_string(),
///     order: 1,
///     is_chord: false,
///     timestamp: None,
/// }];
///
/// let mut out = Vec::new();
/// write_csv(&mut out, &records, false).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "Case_ID;Event;Type;Order;Is_Chord\n1;C4;quarter note;1;False\n"
/// );
/// ```
pub fn write_csv<W: Write>(mut out: W, records: &[EventRecord], timestamps: bool) -> Result<()> {
    if timestamps {
        writeln!(out, "{};Timestamp", CSV_HEADER)?;
    } else {
        writeln!(out, "{}", CSV_HEADER)?;
    }

    for record in records {
        write!(
            out,
            "{};{};{};{};{}",
            record.case,
            record.key,
            record.duration_class,
            record.order,
            if record.is_chord { "True" } else { "False" }
        )?;
        if timestamps {
            match record.timestamp {
                Some(at) => write!(out, ";{:.3}", at.as_secs_f64())?,
                None => write!(out, ";")?,
            }
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_csv_file(path: impl AsRef<Path>, records: &[EventRecord], timestamps: bool) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), records, timestamps)
}

//! XES (IEEE 1849) event log
//!
//! One `<trace>` per case, in order of first appearance. Record fields map
//! onto the standard extensions:
//!
//! | Record | XES attribute |
//! |---|---|
//! | case | trace `concept:name` |
//! | key | `concept:name` |
//! | duration class | `org:type` |
//! | order | `org:order` |
//! | chord flag | `org:is_chord` |
//! | timestamp | `time:timestamp`, counted from the Unix epoch |

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::{NoteLogError, Result};
use crate::segment::{EventRecord, TrackLog};

const XES_NAMESPACE: &str = "http://www.xes-standard.org/";

const EXTENSIONS: [(&str, &str, &str); 3] = [
    ("Concept", "concept", "http://www.xes-standard.org/concept.xesext"),
    ("Organizational", "org", "http://www.xes-standard.org/org.xesext"),
    ("Time", "time", "http://www.xes-standard.org/time.xesext"),
];

fn xml_error(e: quick_xml::Error) -> NoteLogError {
    NoteLogError::WriteError(e.to_string())
}

/// RFC 3339 time of `offset` after the Unix epoch
fn epoch_timestamp(offset: Duration) -> Result<String> {
    let secs = i64::try_from(offset.as_secs())
        .map_err(|_| NoteLogError::WriteError(format!("timestamp {:?} out of range", offset)))?;
    DateTime::<Utc>::from_timestamp(secs, offset.subsec_nanos())
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| NoteLogError::WriteError(format!("timestamp {:?} out of range", offset)))
}

struct XesWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XesWriter<W> {
    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(xml_error)
    }

    fn attribute(&mut self, kind: &str, key: &str, value: &str) -> Result<()> {
        let mut element = BytesStart::new(kind);
        element.push_attribute(("key", key));
        element.push_attribute(("value", value));
        self.event(Event::Empty(element))
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn record(&mut self, record: &EventRecord) -> Result<()> {
        self.start("event")?;
        self.attribute("string", "concept:name", &record.key)?;
        self.attribute("string", "org:type", &record.duration_class)?;
        self.attribute("int", "org:order", &record.order.to_string())?;
        self.attribute("boolean", "org:is_chord", if record.is_chord { "true" } else { "false" })?;
        if let Some(offset) = record.timestamp {
            self.attribute("date", "time:timestamp", &epoch_timestamp(offset)?)?;
        }
        self.end("event")
    }
}

/// Write `log` as an XES document.
pub fn write_xes<W: Write>(out: W, log: &TrackLog) -> Result<()> {
    let mut xes = XesWriter {
        writer: Writer::new_with_indent(out, b' ', 2),
    };

    xes.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("log");
    root.push_attribute(("xes.version", "1.0"));
    root.push_attribute(("xes.features", "nested-attributes"));
    root.push_attribute(("xmlns", XES_NAMESPACE));
    xes.event(Event::Start(root))?;

    let with_time = log.records.iter().any(|r| r.timestamp.is_some());
    for (name, prefix, uri) in EXTENSIONS {
        if prefix == "time" && !with_time {
            continue;
        }
        let mut extension = BytesStart::new("extension");
        extension.push_attribute(("name", name));
        extension.push_attribute(("prefix", prefix));
        extension.push_attribute(("uri", uri));
        xes.event(Event::Empty(extension))?;
    }
    if let Some(name) = &log.name {
        xes.attribute("string", "concept:name", name)?;
    }

    for (case, records) in log.cases() {
        xes.start("trace")?;
        xes.attribute("string", "concept:name", &case.to_string())?;
        for record in records {
            xes.record(record)?;
        }
        xes.end("trace")?;
    }

    xes.end("log")?;
    xes.writer.get_mut().flush()?;
    Ok(())
}

pub fn write_xes_file(path: impl AsRef<Path>, log: &TrackLog) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_xes(std::io::BufWriter::new(file), log)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(case: u32, key: &str, order: u32, timestamp: Option<Duration>) -> EventRecord {
        EventRecord {
            case,
            key: key.to_string(),
            duration_class: "quarter note".to_string(),
            order,
            is_chord: false,
            timestamp,
        }
    }

    fn render(log: &TrackLog) -> String {
        let mut out = Vec::new();
        write_xes(&mut out, log).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_traces_per_case() {
        let log = TrackLog {
            track_index: 1,
            name: Some("Violin".to_string()),
            records: vec![
                record(1, "C4", 1, None),
                record(1, "Pause", 2, None),
                record(2, "D4", 3, None),
            ],
        };
        let xml = render(&log);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert_eq!(xml.matches("<trace>").count(), 2);
        assert_eq!(xml.matches("<event>").count(), 3);
        assert!(xml.contains(r#"<string key="concept:name" value="Violin"/>"#));
        assert!(xml.contains(r#"<string key="org:type" value="quarter note"/>"#));
        assert!(xml.contains(r#"<int key="org:order" value="3"/>"#));
        assert!(xml.contains(r#"<boolean key="org:is_chord" value="false"/>"#));
        assert!(!xml.contains("time.xesext"));

        // the second trace holds only the case 2 event
        let second_trace = &xml[xml.rfind("<trace>").unwrap()..];
        assert!(second_trace.contains(r#"<string key="concept:name" value="2"/>"#));
        assert!(second_trace.contains(r#"value="D4""#));
        assert!(!second_trace.contains(r#"value="C4""#));
    }

    #[test]
    fn test_one_trace_per_case_in_long_log() {
        let records = (0..40_000u32).map(|i| record(i / 4 + 1, "C4", i + 1, None)).collect();
        let log = TrackLog {
            track_index: 0,
            name: None,
            records,
        };
        let xml = render(&log);
        assert_eq!(xml.matches("<trace>").count(), 10_000);
        assert_eq!(xml.matches("<event>").count(), 40_000);
    }

    #[test]
    fn test_timestamps() {
        let log = TrackLog {
            track_index: 0,
            name: None,
            records: vec![record(1, "C4", 1, Some(Duration::from_millis(1500)))],
        };
        let xml = render(&log);

        assert!(xml.contains("time.xesext"));
        assert!(xml.contains(r#"<date key="time:timestamp" value="1970-01-01T00:00:01.500Z"/>"#));
    }

    #[test]
    fn test_escaping() {
        let mut odd = record(1, "C4", 1, None);
        odd.duration_class = "a <b> & c".to_string();
        let log = TrackLog {
            track_index: 0,
            name: None,
            records: vec![odd],
        };
        let xml = render(&log);
        assert!(xml.contains("a &lt;b&gt; &amp; c"));
    }

    #[test]
    fn test_epoch_timestamp() {
        assert_eq!(epoch_timestamp(Duration::ZERO).unwrap(), "1970-01-01T00:00:00.000Z");
        assert_eq!(
            epoch_timestamp(Duration::from_secs(3661)).unwrap(),
            "1970-01-01T01:01:01.000Z"
        );
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track_0.xes");
        let log = TrackLog {
            track_index: 0,
            name: None,
            records: vec![record(1, "C4", 1, None)],
        };
        write_xes_file(&path, &log).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.trim_end().ends_with("</log>"));
    }
}

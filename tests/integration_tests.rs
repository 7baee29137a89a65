//! Integration tests for notelog
//!
//! Tests the full pipeline from Standard MIDI File bytes to written event logs.

use std::time::Duration;

use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use notelog::writer::{write_track_files, OutputOptions};
use notelog::{process_bytes, process_file, Config, NoteLogError, TrackSelection};
use pretty_assertions::assert_eq;

fn note_on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Midi {
            channel: 0.into(),
            message: MidiMessage::NoteOn {
                key: key.into(),
                vel: vel.into(),
            },
        },
    }
}

fn note_off(delta: u32, key: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Midi {
            channel: 0.into(),
            message: MidiMessage::NoteOff {
                key: key.into(),
                vel: 0.into(),
            },
        },
    }
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(message),
    }
}

fn smf_bytes(tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
    let smf = Smf {
        header: Header {
            format: Format::Parallel,
            timing: Timing::Metrical(480.into()),
        },
        tracks,
    };
    let mut bytes = Vec::new();
    smf.write(&mut bytes).unwrap();
    bytes
}

/// Conductor in 3/4 at 60 bpm, a piano and a bass track
fn song() -> Vec<u8> {
    let conductor = vec![
        meta(0, MetaMessage::TimeSignature(3, 2, 24, 8)),
        meta(0, MetaMessage::Tempo(1_000_000.into())),
        meta(0, MetaMessage::EndOfTrack),
    ];
    let piano = vec![
        meta(0, MetaMessage::TrackName(b"Piano")),
        note_on(0, 60, 90),
        note_on(0, 64, 90),
        note_off(480, 60),
        note_off(0, 64),
        note_on(480, 62, 90),
        TrackEvent {
            delta: 240.into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::Controller {
                    controller: 64.into(),
                    value: 127.into(),
                },
            },
        },
        note_off(720, 62),
        note_on(0, 65, 90),
        note_off(1440, 65),
        meta(0, MetaMessage::EndOfTrack),
    ];
    let bass = vec![
        meta(0, MetaMessage::TrackName(b"Bass")),
        note_on(0, 36, 100),
        note_off(1920, 36),
        note_on(0, 43, 100),
        note_on(960, 43, 0),
        meta(0, MetaMessage::EndOfTrack),
    ];
    smf_bytes(vec![conductor, piano, bass])
}

#[test]
fn test_process_song() {
    let logs = process_bytes(&song(), &Config::default()).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].track_index, 1);
    assert_eq!(logs[0].name.as_deref(), Some("Piano"));
    assert_eq!(logs[1].track_index, 2);

    let piano: Vec<(u32, &str, &str, u32, bool)> = logs[0]
        .records
        .iter()
        .map(|r| (r.case, r.key.as_str(), r.duration_class.as_str(), r.order, r.is_chord))
        .collect();
    assert_eq!(
        piano,
        vec![
            (1, "C4", "quarter note", 1, true),
            (1, "E4", "quarter note", 1, true),
            (1, "Pause", "quarter note", 2, false),
            (1, "D4", "half note", 3, false),
            (2, "F4", "dotted half note", 4, false),
        ]
    );

    let bass: Vec<(&str, &str, u32)> = logs[1]
        .records
        .iter()
        .map(|r| (r.key.as_str(), r.duration_class.as_str(), r.order))
        .collect();
    assert_eq!(bass, vec![("C2", "whole note", 1), ("G2", "half note", 2)]);
}

#[test]
fn test_written_logs() {
    let logs = process_bytes(&song(), &Config::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    for log in &logs {
        write_track_files(log, dir.path(), OutputOptions::default()).unwrap();
    }

    let csv = std::fs::read_to_string(dir.path().join("track_1.csv")).unwrap();
    assert_eq!(
        csv,
        "Case_ID;Event;Type;Order;Is_Chord\n\
         1;C4;quarter note;1;True\n\
         1;E4;quarter note;1;True\n\
         1;Pause;quarter note;2;False\n\
         1;D4;half note;3;False\n\
         2;F4;dotted half note;4;False\n"
    );

    let xes = std::fs::read_to_string(dir.path().join("track_1.xes")).unwrap();
    assert_eq!(xes.matches("<trace>").count(), 2);
    assert_eq!(xes.matches("<event>").count(), 5);
    assert!(dir.path().join("track_2.csv").exists());
    assert!(!dir.path().join("track_0.csv").exists());
}

#[test]
fn test_timestamps_follow_conductor_tempo() {
    let config = Config {
        timestamps: true,
        ..Config::default()
    };
    let logs = process_bytes(&song(), &config).unwrap();
    let timestamps: Vec<Duration> = logs[0]
        .records
        .iter()
        .map(|r| r.timestamp.unwrap())
        .collect();
    assert_eq!(
        timestamps,
        vec![
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
        ]
    );
}

#[test]
fn test_process_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.mid");
    std::fs::write(&path, song()).unwrap();

    let from_file = process_file(&path, &Config::default()).unwrap();
    let from_bytes = process_bytes(&song(), &Config::default()).unwrap();
    assert_eq!(from_file, from_bytes);

    assert!(matches!(
        process_file(dir.path().join("missing.mid"), &Config::default()),
        Err(NoteLogError::Io(_))
    ));
}

#[test]
fn test_track_selection() {
    let config = Config {
        tracks: TrackSelection::Indices(vec![2]),
        ..Config::default()
    };
    let logs = process_bytes(&song(), &config).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].name.as_deref(), Some("Bass"));
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notelog.yaml");
    std::fs::write(&path, "measures-per-case: 0\ntracks: [1]\n").unwrap();

    let config = Config::load(&path).unwrap();
    let logs = process_bytes(&song(), &config).unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].records.iter().all(|r| r.case == 1));
}

#[test]
fn test_note_off_without_note_on() {
    let bytes = smf_bytes(vec![vec![
        note_on(0, 60, 90),
        note_off(480, 61),
        meta(0, MetaMessage::EndOfTrack),
    ]]);
    let result = process_bytes(&bytes, &Config::default());
    assert!(matches!(
        result,
        Err(NoteLogError::StateError { ref key, .. }) if key == "C#4"
    ));
}

#[test]
fn test_not_a_midi_file() {
    let result = process_bytes(b"MThd garbage", &Config::default());
    assert!(matches!(result, Err(NoteLogError::ScoreError(_))));
}

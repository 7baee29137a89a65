//! Pitch keys used as event names in the log.

const PITCH_CLASSES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Scientific pitch name for a MIDI note number (60 → "C4", 61 → "C#4", 21 → "A0")
pub fn pitch_key(note: u8) -> String {
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", PITCH_CLASSES[(note % 12) as usize], octave)
}

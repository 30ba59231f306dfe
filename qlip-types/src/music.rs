//! Musical configuration for a generation run.
//!
//! A `PhraseConfig` bundles the chord table, duration palette, bar length,
//! scheduling mode, bar count, and tempo. It is immutable for one run;
//! the engine validates it up front and samples everything else.

use serde::{Deserialize, Serialize};

/// A three-note chord voicing as absolute MIDI pitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChordTemplate {
    pitches: [u8; 3],
}

impl ChordTemplate {
    pub fn new(pitches: [u8; 3]) -> Self {
        Self { pitches }
    }

    pub fn pitches(&self) -> [u8; 3] {
        self.pitches
    }

    /// The triad plus its root raised one octave: the 4-way pitch choice
    /// set the mapping engine draws from.
    pub fn extended(&self) -> [u8; 4] {
        let [root, third, fifth] = self.pitches;
        let octave_root = (root as i32 + 12).clamp(0, 127) as u8;
        [root, third, fifth, octave_root]
    }
}

/// The default I-V-vi-IV-iii-ii table in C major.
pub fn default_chord_table() -> Vec<ChordTemplate> {
    vec![
        ChordTemplate::new([60, 64, 67]), // C major
        ChordTemplate::new([55, 59, 62]), // G major
        ChordTemplate::new([57, 60, 64]), // A minor
        ChordTemplate::new([53, 57, 60]), // F major
        ChordTemplate::new([52, 55, 59]), // E minor
        ChordTemplate::new([50, 53, 57]), // D minor
    ]
}

/// Ordered palette of note lengths in beats.
///
/// An entry of `0.0` is a rest slot: the engine consumes its random draws
/// but emits no note, keeping the stream cursor aligned with the number of
/// slots attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationPalette(Vec<f64>);

impl DurationPalette {
    pub fn new(entries: Vec<f64>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub fn entries(&self) -> &[f64] {
        &self.0
    }

    /// Shortest positive entry, used to bound how many notes can fit in a
    /// bar when pre-sizing random streams.
    pub fn min_positive(&self) -> Option<f64> {
        self.0
            .iter()
            .copied()
            .filter(|&d| d > 0.0)
            .fold(None, |acc, d| match acc {
                Some(m) if m <= d => Some(m),
                _ => Some(d),
            })
    }
}

/// How notes are laid into each bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScheduleMode {
    /// Exactly `notes_per_bar` notes per bar. Each note lasts
    /// `bar_beats / notes_per_bar`, or `note_beats` when supplied.
    FixedCount {
        notes_per_bar: u32,
        note_beats: Option<f64>,
    },
    /// Notes accumulate until the bar is full, lengths drawn from the
    /// duration palette, with the final note clamped to the bar boundary.
    VariableDuration,
}

impl ScheduleMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FixedCount { .. } => "fixed",
            Self::VariableDuration => "variable",
        }
    }
}

/// Everything the mapping engine needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseConfig {
    pub chords: Vec<ChordTemplate>,
    pub durations: DurationPalette,
    /// Length of one bar in beats.
    pub bar_beats: f64,
    pub mode: ScheduleMode,
    /// Number of bars (one chord per bar).
    pub bars: u32,
    pub bpm: u16,
    /// Velocity applied to every emitted note.
    pub velocity: u8,
}

impl PhraseConfig {
    /// Check the invariants the engine depends on.
    pub fn validate(&self) -> Result<(), String> {
        if self.chords.is_empty() {
            return Err("chord table is empty".to_string());
        }
        if self.bars == 0 {
            return Err("bar count must be at least 1".to_string());
        }
        if self.bar_beats <= 0.0 {
            return Err(format!("bar length must be positive, got {}", self.bar_beats));
        }
        match self.mode {
            ScheduleMode::FixedCount { notes_per_bar, note_beats } => {
                if notes_per_bar == 0 {
                    return Err("notes per bar must be at least 1".to_string());
                }
                if let Some(beats) = note_beats {
                    if beats <= 0.0 {
                        return Err(format!("note length must be positive, got {}", beats));
                    }
                }
            }
            ScheduleMode::VariableDuration => {
                if self.durations.is_empty() {
                    return Err("duration palette is empty".to_string());
                }
                if self.durations.entries().iter().any(|&d| d < 0.0) {
                    return Err("duration palette entries must be non-negative".to_string());
                }
                if self.durations.min_positive().is_none() {
                    return Err("duration palette has no positive entry".to_string());
                }
            }
        }
        Ok(())
    }
}

impl Default for PhraseConfig {
    fn default() -> Self {
        Self {
            chords: default_chord_table(),
            durations: DurationPalette::new(vec![0.5, 1.0, 2.0]),
            bar_beats: 4.0,
            mode: ScheduleMode::VariableDuration,
            bars: 4,
            bpm: 120,
            velocity: 100,
        }
    }
}

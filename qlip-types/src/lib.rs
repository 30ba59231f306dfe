//! # qlip-types
//!
//! Shared type definitions for the qlip phrase generator: note events,
//! clip addressing, and the musical configuration consumed by the mapping
//! engine in qlip-core.

pub mod music;

pub use music::{ChordTemplate, DurationPalette, PhraseConfig, ScheduleMode};

/// Session-view track index in the remote DAW (0-indexed).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct TrackIndex(u32);

impl TrackIndex {
    pub fn new(index: u32) -> Self {
        Self(index)
    }
    pub fn get(self) -> u32 {
        self.0
    }
    /// The following track, for callers that place successive runs on
    /// successive tracks.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for TrackIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clip slot index within a track (0-indexed).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ClipSlot(u32);

impl ClipSlot {
    pub fn new(index: u32) -> Self {
        Self(index)
    }
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ClipSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single timed note. Times are in beats relative to the clip start.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NoteEvent {
    /// MIDI note number.
    pub pitch: u8,
    /// Start time in beats from the clip start. Never negative.
    pub start: f64,
    /// Length in beats. Always positive for emitted notes.
    pub duration: f64,
    /// MIDI velocity (0-127).
    pub velocity: u8,
}

impl NoteEvent {
    /// End time in beats.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Destination clip in the remote DAW. Built once per generation run and
/// never mutated; a new run picks a new (or the same) target.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipTarget {
    pub track: TrackIndex,
    pub slot: ClipSlot,
    /// Clip length in beats, sized from the generated phrase.
    pub length_beats: f64,
}

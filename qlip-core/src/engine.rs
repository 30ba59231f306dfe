//! Maps uniform random draws onto a timed note sequence.
//!
//! One draw in `[0, chord_table_len)` per bar fixes the progression up
//! front. Within a bar, one draw in `[0, 4)` per slot picks a pitch from
//! that bar's extended chord; variable-duration mode adds one palette draw
//! per slot. Pitch and duration streams are materialized once, sized for
//! the worst-case slot count, and consumed by monotonic cursors.

use qlip_types::music::{PhraseConfig, ScheduleMode};
use qlip_types::NoteEvent;

use crate::circuit::BitSource;
use crate::error::SamplerError;
use crate::sampler::{sample_uniform, RandomStream};

/// Pitch choices per slot: the triad plus the octave-doubled root.
const EXTENDED_CHORD_SIZE: u64 = 4;

/// Extra slots materialized beyond the worst-case note count, so rest
/// slots rarely push the cursor off the end of a stream.
const STREAM_MARGIN: usize = 8;

/// A fully generated phrase plus the bookkeeping downstream stages need.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    /// Notes in non-decreasing start order.
    pub notes: Vec<NoteEvent>,
    /// Total elapsed beats, for clip-length sizing.
    pub total_beats: f64,
    /// Chord-table index governing each bar.
    pub progression: Vec<usize>,
}

/// Generate one phrase from the config, drawing all randomness from `source`.
pub fn generate_phrase(
    config: &PhraseConfig,
    source: &mut dyn BitSource,
) -> Result<Phrase, SamplerError> {
    config.validate().map_err(SamplerError::InvalidArgument)?;

    let progression: Vec<usize> =
        sample_uniform(source, config.bars as usize, config.chords.len() as u64)?
            .into_iter()
            .map(|i| i as usize)
            .collect();

    let slots = slot_budget(config);
    let mut pitches = RandomStream::sample(source, slots, EXTENDED_CHORD_SIZE)?;
    log::debug!(
        target: "engine",
        "generating {} bars ({} mode), {} slots materialized",
        config.bars,
        config.mode.name(),
        slots
    );

    let mut notes = Vec::new();
    let total_beats;

    match config.mode {
        ScheduleMode::FixedCount {
            notes_per_bar,
            note_beats,
        } => {
            let step = note_beats.unwrap_or(config.bar_beats / notes_per_bar as f64);
            let bar_span = match note_beats {
                Some(beats) => beats * notes_per_bar as f64,
                None => config.bar_beats,
            };
            for (bar, &chord_index) in progression.iter().enumerate() {
                let choices = config.chords[chord_index].extended();
                let bar_start = bar as f64 * bar_span;
                for slot in 0..notes_per_bar {
                    let pitch = choices[pitches.next() as usize];
                    notes.push(NoteEvent {
                        pitch,
                        start: bar_start + slot as f64 * step,
                        duration: step,
                        velocity: config.velocity,
                    });
                }
            }
            total_beats = progression.len() as f64 * bar_span;
        }
        ScheduleMode::VariableDuration => {
            let mut durations =
                RandomStream::sample(source, slots, config.durations.len() as u64)?;
            for (bar, &chord_index) in progression.iter().enumerate() {
                let choices = config.chords[chord_index].extended();
                let bar_start = bar as f64 * config.bar_beats;
                let mut filled = 0.0f64;
                while filled < config.bar_beats {
                    let pitch = choices[pitches.next() as usize];
                    let drawn = config.durations.get(durations.next() as usize);
                    if drawn == 0.0 {
                        // Rest slot: draws consumed, no note emitted.
                        continue;
                    }
                    let remaining = config.bar_beats - filled;
                    if drawn < remaining {
                        notes.push(NoteEvent {
                            pitch,
                            start: bar_start + filled,
                            duration: drawn,
                            velocity: config.velocity,
                        });
                        filled += drawn;
                    } else {
                        // Last note of the bar, clamped to the boundary.
                        notes.push(NoteEvent {
                            pitch,
                            start: bar_start + filled,
                            duration: remaining,
                            velocity: config.velocity,
                        });
                        filled = config.bar_beats;
                    }
                }
            }
            total_beats = progression.len() as f64 * config.bar_beats;
        }
    }

    Ok(Phrase {
        notes,
        total_beats,
        progression,
    })
}

/// Upper bound on the slots a run can attempt, plus the safety margin.
fn slot_budget(config: &PhraseConfig) -> usize {
    let per_bar = match config.mode {
        ScheduleMode::FixedCount { notes_per_bar, .. } => notes_per_bar as usize,
        ScheduleMode::VariableDuration => {
            let shortest = config.durations.min_positive().unwrap_or(config.bar_beats);
            (config.bar_beats / shortest).ceil() as usize
        }
    };
    config.bars as usize * per_bar.max(1) + STREAM_MARGIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use qlip_types::music::{ChordTemplate, DurationPalette};

    use crate::circuit::CircuitSampler;

    /// Deterministic source: each register width draws from its own cycling
    /// sequence, so streams sampled at different widths can be scripted
    /// independently.
    struct ScriptedSource {
        by_width: HashMap<u32, (Vec<u64>, usize)>,
    }

    impl ScriptedSource {
        fn new(scripts: &[(u32, &[u64])]) -> Self {
            let by_width = scripts
                .iter()
                .map(|&(w, seq)| (w, (seq.to_vec(), 0)))
                .collect();
            Self { by_width }
        }
    }

    impl BitSource for ScriptedSource {
        fn draw_bits(&mut self, width: u32, shots: usize) -> Result<Vec<u64>, SamplerError> {
            let (seq, cursor) = self
                .by_width
                .get_mut(&width)
                .unwrap_or_else(|| panic!("no script for width {}", width));
            Ok((0..shots)
                .map(|_| {
                    let v = seq[*cursor % seq.len()];
                    *cursor += 1;
                    v
                })
                .collect())
        }
    }

    fn single_chord_config(mode: ScheduleMode, bars: u32, bar_beats: f64) -> PhraseConfig {
        PhraseConfig {
            chords: vec![ChordTemplate::new([60, 64, 67])],
            durations: DurationPalette::new(vec![0.5, 1.0, 2.0]),
            bar_beats,
            mode,
            bars,
            bpm: 120,
            velocity: 100,
        }
    }

    #[test]
    fn fixed_mode_quarter_notes_two_bars() {
        // Single chord table: the progression needs no draws, pitch draws
        // cycle 0..4. Expect 8 quarter notes walking the extended chord.
        let config = single_chord_config(
            ScheduleMode::FixedCount {
                notes_per_bar: 4,
                note_beats: None,
            },
            2,
            4.0,
        );
        let mut source = ScriptedSource::new(&[(2, &[0, 1, 2, 3])]);
        let phrase = generate_phrase(&config, &mut source).unwrap();

        assert_eq!(phrase.notes.len(), 8);
        assert_eq!(phrase.progression, vec![0, 0]);
        assert!((phrase.total_beats - 8.0).abs() < 1e-12);
        for (i, note) in phrase.notes.iter().enumerate() {
            assert!((note.start - i as f64).abs() < 1e-12);
            assert!((note.duration - 1.0).abs() < 1e-12);
            assert_eq!(note.velocity, 100);
        }
        let pitches: Vec<u8> = phrase.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 64, 67, 72, 60, 64, 67, 72]);
    }

    #[test]
    fn variable_mode_half_bar_draw_fills_bar_alone() {
        // Palette index 2 is a 2.0-beat note in a 2.0-beat bar: the first
        // slot fills the bar exactly and no second note is emitted.
        let config = PhraseConfig {
            durations: DurationPalette::new(vec![0.5, 1.0, 2.0]),
            bar_beats: 2.0,
            bars: 1,
            ..single_chord_config(ScheduleMode::VariableDuration, 1, 2.0)
        };
        // Palette length 3 and extended-chord size 4 both sample at width
        // 2, so a single constant script serves both streams.
        let mut source = ScriptedSource::new(&[(2, &[2])]);
        let phrase = generate_phrase(&config, &mut source).unwrap();

        assert_eq!(phrase.notes.len(), 1);
        let note = phrase.notes[0];
        assert_eq!(note.pitch, 67);
        assert!((note.start).abs() < 1e-12);
        assert!((note.duration - 2.0).abs() < 1e-12);
        assert!((phrase.total_beats - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rest_slot_consumes_draws_without_emitting() {
        // Palette [0.0, 2.0] samples at width 1, pitch at width 2, so the
        // two streams are scripted independently. The first slot is a rest;
        // it must burn both its draws so the second slot sees pitch draw 1.
        let config = PhraseConfig {
            durations: DurationPalette::new(vec![0.0, 2.0]),
            bar_beats: 2.0,
            bars: 1,
            ..single_chord_config(ScheduleMode::VariableDuration, 1, 2.0)
        };
        let mut source = ScriptedSource::new(&[(2, &[0, 1, 2, 3]), (1, &[0, 1])]);
        let phrase = generate_phrase(&config, &mut source).unwrap();

        assert_eq!(phrase.notes.len(), 1);
        assert_eq!(phrase.notes[0].pitch, 64, "rest slot must consume a pitch draw");
        assert!((phrase.notes[0].duration - 2.0).abs() < 1e-12);
    }

    #[test]
    fn fixed_mode_note_beats_override() {
        let config = single_chord_config(
            ScheduleMode::FixedCount {
                notes_per_bar: 4,
                note_beats: Some(0.25),
            },
            2,
            4.0,
        );
        let mut source = ScriptedSource::new(&[(2, &[0])]);
        let phrase = generate_phrase(&config, &mut source).unwrap();

        assert_eq!(phrase.notes.len(), 8);
        assert!(phrase.notes.iter().all(|n| (n.duration - 0.25).abs() < 1e-12));
        assert!((phrase.total_beats - 2.0).abs() < 1e-12);
    }

    #[test]
    fn fixed_mode_bars_partition_exactly() {
        let config = PhraseConfig {
            bars: 4,
            mode: ScheduleMode::FixedCount {
                notes_per_bar: 8,
                note_beats: None,
            },
            ..PhraseConfig::default()
        };
        let mut source = CircuitSampler::with_seed(21);
        let phrase = generate_phrase(&config, &mut source).unwrap();

        assert_eq!(phrase.notes.len(), 32);
        for bar in 0..4 {
            let in_bar: Vec<&NoteEvent> = phrase
                .notes
                .iter()
                .filter(|n| n.start >= bar as f64 * 4.0 - 1e-9 && n.start < (bar + 1) as f64 * 4.0 - 1e-9)
                .collect();
            assert_eq!(in_bar.len(), 8, "bar {} note count", bar);
            let sum: f64 = in_bar.iter().map(|n| n.duration).sum();
            assert!((sum - 4.0).abs() < 1e-9, "bar {} sums to {}", bar, sum);
        }
        // Bar boundaries land exactly on the beat grid.
        assert!((phrase.notes[8].start - 4.0).abs() < 1e-12);
        assert!((phrase.notes[16].start - 8.0).abs() < 1e-12);
    }

    #[test]
    fn variable_mode_never_overflows_a_bar() {
        let config = PhraseConfig {
            bars: 16,
            durations: DurationPalette::new(vec![0.0, 0.5, 0.75, 1.0, 2.0]),
            ..PhraseConfig::default()
        };
        let mut source = CircuitSampler::with_seed(1234);
        let phrase = generate_phrase(&config, &mut source).unwrap();

        assert!((phrase.total_beats - 64.0).abs() < 1e-9);
        assert!(!phrase.notes.is_empty());
        for pair in phrase.notes.windows(2) {
            assert!(pair[1].start >= pair[0].start, "starts must be non-decreasing");
        }
        for (bar, &_chord) in phrase.progression.iter().enumerate() {
            let lo = bar as f64 * 4.0;
            let hi = lo + 4.0;
            let sum: f64 = phrase
                .notes
                .iter()
                .filter(|n| n.start >= lo - 1e-9 && n.start < hi - 1e-9)
                .map(|n| n.duration)
                .sum();
            assert!(sum <= 4.0 + 1e-9, "bar {} overflows: {}", bar, sum);
        }
        assert!(phrase.notes.iter().all(|n| n.duration > 0.0));
    }

    #[test]
    fn pitches_come_from_the_bar_chord() {
        let config = PhraseConfig {
            bars: 12,
            ..PhraseConfig::default()
        };
        let mut source = CircuitSampler::with_seed(777);
        let phrase = generate_phrase(&config, &mut source).unwrap();

        assert_eq!(phrase.progression.len(), 12);
        assert!(phrase.progression.iter().all(|&i| i < config.chords.len()));
        for note in &phrase.notes {
            let bar = (note.start / config.bar_beats) as usize;
            let choices = config.chords[phrase.progression[bar]].extended();
            assert!(
                choices.contains(&note.pitch),
                "pitch {} not in chord for bar {}",
                note.pitch,
                bar
            );
        }
    }

    #[test]
    fn seeded_source_reproduces_the_phrase() {
        let config = PhraseConfig::default();
        let mut a = CircuitSampler::with_seed(5150);
        let mut b = CircuitSampler::with_seed(5150);
        assert_eq!(
            generate_phrase(&config, &mut a).unwrap(),
            generate_phrase(&config, &mut b).unwrap()
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PhraseConfig {
            bars: 0,
            ..PhraseConfig::default()
        };
        let mut source = CircuitSampler::with_seed(1);
        assert!(matches!(
            generate_phrase(&config, &mut source),
            Err(SamplerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn slot_budget_covers_shortest_durations() {
        let config = PhraseConfig {
            bars: 4,
            durations: DurationPalette::new(vec![0.5, 1.0, 2.0]),
            ..PhraseConfig::default()
        };
        // 4 bars of 4.0 beats at 0.5 minimum is 32 slots, plus the margin.
        assert_eq!(slot_budget(&config), 32 + STREAM_MARGIN);
    }
}

//! Standard MIDI file export of a generated phrase.
//!
//! Single-track SMF at 480 PPQ with a tempo meta event, so the same notes
//! that went to the DAW over OSC can be kept as a portable file.

use std::path::Path;

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

use crate::engine::Phrase;

/// Pulses per quarter note.
const PPQ: u16 = 480;

/// Render a phrase to MIDI file bytes.
pub fn phrase_to_midi(phrase: &Phrase, bpm: u16) -> Result<Vec<u8>, String> {
    let header = Header {
        format: Format::SingleTrack,
        timing: Timing::Metrical(PPQ.into()),
    };

    let mut track = Track::new();
    let us_per_quarter = 60_000_000 / bpm.max(1) as u32;
    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter.into())),
    });

    // Absolute ticks first; note-on precedes the paired note-off, and the
    // stable sort keeps an earlier note's off ahead of a later note's on
    // when they share a tick.
    let mut events: Vec<(u32, TrackEventKind)> = Vec::with_capacity(phrase.notes.len() * 2);
    for note in &phrase.notes {
        let tick_on = beats_to_ticks(note.start);
        let tick_off = beats_to_ticks(note.end());
        events.push((
            tick_on,
            TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn {
                    key: note.pitch.into(),
                    vel: note.velocity.into(),
                },
            },
        ));
        events.push((
            tick_off,
            TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOff {
                    key: note.pitch.into(),
                    vel: 0.into(),
                },
            },
        ));
    }
    events.sort_by_key(|(tick, _)| *tick);

    let mut last_tick = 0u32;
    for (tick, kind) in events {
        let delta = tick.saturating_sub(last_tick);
        track.push(TrackEvent {
            delta: delta.into(),
            kind,
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header,
        tracks: vec![track],
    };
    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| format!("failed to encode MIDI: {}", e))?;
    Ok(bytes)
}

/// Render a phrase and write it to `path`.
pub fn export_phrase(phrase: &Phrase, bpm: u16, path: &Path) -> Result<(), String> {
    let bytes = phrase_to_midi(phrase, bpm)?;
    std::fs::write(path, bytes).map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
    log::info!(target: "midi_export", "wrote {} notes to {}", phrase.notes.len(), path.display());
    Ok(())
}

fn beats_to_ticks(beats: f64) -> u32 {
    (beats * PPQ as f64).round() as u32
}

//! One generation run: sample, map, ship to the DAW.
//!
//! Strictly sequential: phrase generation, clip creation, note
//! transmission, then fire. The pauses between transport stages are fixed
//! waits, not acknowledgment-based synchronization; the remote end
//! processes control messages asynchronously and needs bounded settle time
//! before the next stage's messages arrive.

use std::thread;
use std::time::Duration;

use qlip_types::music::PhraseConfig;
use qlip_types::{ClipSlot, ClipTarget, TrackIndex};

use crate::circuit::BitSource;
use crate::engine::{generate_phrase, Phrase};
use crate::error::RunError;
use crate::transport::ClipTransport;

/// Settle pauses between transport stages.
#[derive(Debug, Clone, Copy)]
pub struct SettleTimes {
    pub after_create: Duration,
    pub after_notes: Duration,
}

impl SettleTimes {
    /// No pauses; for tests and dry runs.
    pub fn none() -> Self {
        Self {
            after_create: Duration::ZERO,
            after_notes: Duration::ZERO,
        }
    }
}

impl Default for SettleTimes {
    fn default() -> Self {
        Self {
            after_create: Duration::from_millis(200),
            after_notes: Duration::from_millis(500),
        }
    }
}

/// What a completed run produced and where it went.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub target: ClipTarget,
    pub phrase: Phrase,
}

impl RunSummary {
    pub fn notes_sent(&self) -> usize {
        self.phrase.notes.len()
    }
}

/// Generate a phrase and ship it to one clip slot.
///
/// The target track is an explicit caller-owned parameter; callers that
/// trigger repeated runs advance their own counter between calls. Each run
/// builds fresh sampler state, so a failed run leaves nothing behind for
/// the next one to trip over. On a transport error, notes already sent
/// stay sent; the channel has no transactional semantics.
pub fn run_generation(
    config: &PhraseConfig,
    track: TrackIndex,
    slot: ClipSlot,
    transport: &dyn ClipTransport,
    source: &mut dyn BitSource,
    settle: SettleTimes,
) -> Result<RunSummary, RunError> {
    let phrase = generate_phrase(config, source)?;
    let target = ClipTarget {
        track,
        slot,
        length_beats: phrase.total_beats,
    };

    transport.create_clip(&target)?;
    thread::sleep(settle.after_create);

    transport.clear_notes(track, slot)?;
    transport.add_notes(track, slot, &phrase.notes)?;
    thread::sleep(settle.after_notes);

    transport.fire(track, slot)?;
    log::info!(
        target: "run",
        "sent {} notes ({} beats) to track {} slot {}",
        phrase.notes.len(),
        phrase.total_beats,
        track,
        slot
    );

    Ok(RunSummary { target, phrase })
}

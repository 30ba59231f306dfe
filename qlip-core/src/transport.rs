//! OSC transport to the DAW's clip API.
//!
//! Speaks the AbletonOSC dialect over UDP: four message shapes, each a
//! one-way request with no acknowledgment. The remote end applies control
//! messages asynchronously, so callers insert settle pauses between stages
//! rather than waiting on replies (see `run`).

use std::io;
use std::net::UdpSocket;

use rosc::{OscMessage, OscPacket, OscType};

use qlip_types::{ClipSlot, ClipTarget, NoteEvent, TrackIndex};

/// Sink for clip-creation and note-event messages.
///
/// Ordering matters: `create_clip` at most once per run, before any notes.
/// Repeated creation may reset the slot's content on the remote end.
pub trait ClipTransport {
    /// Request allocation of a playable clip of `length_beats` at the target.
    fn create_clip(&self, target: &ClipTarget) -> io::Result<()>;

    /// Remove any notes a previous run left in the slot.
    fn clear_notes(&self, track: TrackIndex, slot: ClipSlot) -> io::Result<()>;

    /// Transmit notes one message at a time, in order. An empty slice sends
    /// nothing and succeeds. If the channel drops mid-sequence the clip is
    /// left partially populated; there is no rollback.
    fn add_notes(&self, track: TrackIndex, slot: ClipSlot, notes: &[NoteEvent]) -> io::Result<()>;

    /// Request playback of the clip.
    fn fire(&self, track: TrackIndex, slot: ClipSlot) -> io::Result<()>;
}

/// UDP/OSC implementation of the transport contract.
pub struct OscTransport {
    socket: UdpSocket,
    server_addr: String,
}

impl OscTransport {
    pub fn new(host: &str, port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket,
            server_addr: format!("{}:{}", host, port),
        })
    }

    fn send_message(&self, addr: &str, args: Vec<OscType>) -> io::Result<()> {
        let msg = OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        });
        let buf = rosc::encoder::encode(&msg)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        self.socket.send_to(&buf, &self.server_addr)?;
        Ok(())
    }
}

impl ClipTransport for OscTransport {
    /// /live/clip_slot/create_clip track slot length_beats
    fn create_clip(&self, target: &ClipTarget) -> io::Result<()> {
        log::info!(
            target: "transport",
            "creating clip at track {} slot {} ({} beats)",
            target.track,
            target.slot,
            target.length_beats
        );
        self.send_message(
            "/live/clip_slot/create_clip",
            vec![
                OscType::Int(target.track.get() as i32),
                OscType::Int(target.slot.get() as i32),
                OscType::Float(target.length_beats as f32),
            ],
        )
    }

    /// /live/clip/remove/notes track slot
    fn clear_notes(&self, track: TrackIndex, slot: ClipSlot) -> io::Result<()> {
        self.send_message(
            "/live/clip/remove/notes",
            vec![
                OscType::Int(track.get() as i32),
                OscType::Int(slot.get() as i32),
            ],
        )
    }

    /// /live/clip/add/notes track slot pitch start duration velocity mute
    fn add_notes(&self, track: TrackIndex, slot: ClipSlot, notes: &[NoteEvent]) -> io::Result<()> {
        log::debug!(
            target: "transport",
            "sending {} notes to track {} slot {}",
            notes.len(),
            track,
            slot
        );
        for note in notes {
            self.send_message(
                "/live/clip/add/notes",
                vec![
                    OscType::Int(track.get() as i32),
                    OscType::Int(slot.get() as i32),
                    OscType::Int(note.pitch as i32),
                    OscType::Float(note.start as f32),
                    OscType::Float(note.duration as f32),
                    OscType::Int(note.velocity as i32),
                    OscType::Bool(false),
                ],
            )?;
        }
        Ok(())
    }

    /// /live/clip_slot/fire track slot
    fn fire(&self, track: TrackIndex, slot: ClipSlot) -> io::Result<()> {
        log::info!(target: "transport", "firing clip at track {} slot {}", track, slot);
        self.send_message(
            "/live/clip_slot/fire",
            vec![
                OscType::Int(track.get() as i32),
                OscType::Int(slot.get() as i32),
            ],
        )
    }
}

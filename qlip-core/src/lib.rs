//! # qlip-core
//!
//! Quantum-random phrase generation and its clip transport: a simulated
//! measurement backend feeds a rejection sampler, the mapping engine turns
//! the draws into timed notes, and the transport ships them to a DAW clip
//! over OSC.

pub mod circuit;
pub mod config;
pub mod engine;
pub mod error;
pub mod midi_export;
pub mod run;
pub mod sampler;
pub mod transport;

pub use circuit::{BitSource, CircuitSampler};
pub use config::Config;
pub use engine::{generate_phrase, Phrase};
pub use error::{RunError, SamplerError};
pub use run::{run_generation, RunSummary, SettleTimes};
pub use transport::{ClipTransport, OscTransport};

//! Simulated quantum measurement backend.
//!
//! Models a register of `width` qubits prepared in equal superposition and
//! measured `shots` times: each measurement collapses to an integer drawn
//! uniformly from `[0, 2^width)`. Only the statistical contract matters to
//! callers, so the simulation is backed by xoshiro256++ (Blackman & Vigna,
//! 2019) with SplitMix64 seeding rather than a state-vector simulator.
//! Output is non-deterministic per process unless a seed is supplied.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::SamplerError;

/// Widest register the simulator serves; draws are packed into a `u64`.
const MAX_WIDTH: u32 = 63;

/// Source of uniformly distributed random bitstrings.
///
/// Implementations guarantee a stable sequence length and per-element
/// uniformity over the requested width; no ordering relation between
/// elements is promised.
pub trait BitSource {
    /// Draw `shots` integers, each uniform in `[0, 2^width)`.
    fn draw_bits(&mut self, width: u32, shots: usize) -> Result<Vec<u64>, SamplerError>;
}

/// Equal-superposition circuit simulator.
pub struct CircuitSampler {
    state: [u64; 4],
}

impl CircuitSampler {
    /// Simulator seeded from wall-clock entropy.
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9e37_79b9_7f4a_7c15);
        Self::with_seed(seed)
    }

    /// Simulator with a fixed seed, for reproducible streams.
    pub fn with_seed(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            state: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[0].wrapping_add(self.state[3]))
            .rotate_left(23)
            .wrapping_add(self.state[0]);

        let t = self.state[1] << 17;

        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];

        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);

        result
    }
}

impl Default for CircuitSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl BitSource for CircuitSampler {
    fn draw_bits(&mut self, width: u32, shots: usize) -> Result<Vec<u64>, SamplerError> {
        if width == 0 {
            return Err(SamplerError::InvalidArgument(
                "register width must be at least 1 qubit".to_string(),
            ));
        }
        if width > MAX_WIDTH {
            return Err(SamplerError::InvalidArgument(format!(
                "register width {} exceeds the {}-qubit maximum",
                width, MAX_WIDTH
            )));
        }
        if shots == 0 {
            return Err(SamplerError::InvalidArgument(
                "shot count must be at least 1".to_string(),
            ));
        }
        let mask = (1u64 << width) - 1;
        Ok((0..shots).map(|_| self.next_u64() & mask).collect())
    }
}

/// SplitMix64, the xoshiro authors' recommended seeder for expanding one
/// `u64` into the 256-bit generator state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_width() {
        let mut sim = CircuitSampler::with_seed(1);
        assert!(matches!(
            sim.draw_bits(0, 10),
            Err(SamplerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_oversized_width() {
        let mut sim = CircuitSampler::with_seed(1);
        assert!(matches!(
            sim.draw_bits(64, 10),
            Err(SamplerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_zero_shots() {
        let mut sim = CircuitSampler::with_seed(1);
        assert!(matches!(
            sim.draw_bits(2, 0),
            Err(SamplerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn draws_requested_count_within_range() {
        let mut sim = CircuitSampler::with_seed(42);
        let draws = sim.draw_bits(3, 1000).unwrap();
        assert_eq!(draws.len(), 1000);
        assert!(draws.iter().all(|&v| v < 8));
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = CircuitSampler::with_seed(7);
        let mut b = CircuitSampler::with_seed(7);
        assert_eq!(a.draw_bits(16, 100).unwrap(), b.draw_bits(16, 100).unwrap());
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = CircuitSampler::with_seed(7);
        let mut b = CircuitSampler::with_seed(8);
        assert_ne!(a.draw_bits(32, 8).unwrap(), b.draw_bits(32, 8).unwrap());
    }

    #[test]
    fn two_qubit_register_hits_every_outcome() {
        let mut sim = CircuitSampler::with_seed(12345);
        let draws = sim.draw_bits(2, 4000).unwrap();
        let mut counts = [0usize; 4];
        for &v in &draws {
            counts[v as usize] += 1;
        }
        // Each outcome of an equal superposition should land near 1000.
        for (outcome, &count) in counts.iter().enumerate() {
            assert!(
                count > 800 && count < 1200,
                "outcome {} occurred {} times in 4000 shots",
                outcome,
                count
            );
        }
    }
}

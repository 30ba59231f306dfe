//! Uniform integer sampling over arbitrary ranges.
//!
//! The bit source only yields power-of-two ranges. `sample_uniform` narrows
//! those to an arbitrary `[0, max)` with rejection sampling: draws at or
//! above `max` are discarded, because folding them back in (e.g. with a
//! modulo) would bias the distribution toward the low end whenever
//! `2^width` is not a multiple of `max`.

use crate::circuit::BitSource;
use crate::error::SamplerError;

/// Draw exactly `count` integers, each uniform in `[0, max)`.
///
/// `max == 1` is the documented degenerate range: the result is all zeros
/// and the bit source is never invoked. Batches are sized at twice the
/// remaining deficit; the minimal covering width keeps the rejection rate
/// below one half, so the loop terminates in expected O(count) source
/// invocations.
pub fn sample_uniform(
    source: &mut dyn BitSource,
    count: usize,
    max: u64,
) -> Result<Vec<u64>, SamplerError> {
    if max == 0 {
        return Err(SamplerError::InvalidArgument(
            "sample range must be positive".to_string(),
        ));
    }
    if count == 0 {
        return Ok(Vec::new());
    }
    if max == 1 {
        return Ok(vec![0; count]);
    }

    let width = covering_width(max);
    let mut accepted = Vec::with_capacity(count);
    while accepted.len() < count {
        let batch = (count - accepted.len()) * 2;
        for value in source.draw_bits(width, batch)? {
            if value < max {
                accepted.push(value);
                if accepted.len() == count {
                    break;
                }
            }
        }
    }
    Ok(accepted)
}

/// Minimal bit width whose range covers `[0, max)`, i.e. `ceil(log2(max))`.
/// Caller guarantees `max >= 2`.
fn covering_width(max: u64) -> u32 {
    64 - (max - 1).leading_zeros()
}

/// A pre-materialized sequence of uniform draws consumed by one cursor.
///
/// Streams are sized generously by the engine, so the cursor should never
/// reach the end. If it does anyway, it wraps to the start and keeps going;
/// the wrap reintroduces correlation between notes, so it is logged as a
/// degraded mode rather than treated as a failure.
#[derive(Debug)]
pub struct RandomStream {
    values: Vec<u64>,
    cursor: usize,
}

impl RandomStream {
    /// Materialize `count` uniform draws in `[0, max)` from the source.
    pub fn sample(
        source: &mut dyn BitSource,
        count: usize,
        max: u64,
    ) -> Result<Self, SamplerError> {
        let values = sample_uniform(source, count, max)?;
        Ok(Self { values, cursor: 0 })
    }

    /// The value under the cursor, advancing it by one.
    pub fn next(&mut self) -> u64 {
        if self.values.is_empty() {
            return 0;
        }
        if self.cursor >= self.values.len() {
            log::warn!(
                target: "sampler",
                "random stream exhausted after {} draws, recycling from the start",
                self.values.len()
            );
            self.cursor = 0;
        }
        let value = self.values[self.cursor];
        self.cursor += 1;
        value
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Current cursor position within the stream.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

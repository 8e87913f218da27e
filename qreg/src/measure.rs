//! Born-rule sampling of a state vector.

use std::collections::BTreeMap;

use num_complex::Complex;
use rand::Rng;
use serde::Serialize;
use tracing::warn;

use crate::error::{Result, SimError};
use crate::state::NORM_TOLERANCE;

/// A sampled basis state of an `width`-qubit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub index: usize,
    pub width: usize,
}

impl Outcome {
    /// Fixed-width bitstring, qubit 0 first.
    pub fn bitstring(&self) -> String {
        format!("{:0width$b}", self.index, width = self.width)
    }

    /// Measured value of a single qubit, `None` past the register width.
    pub fn bit(&self, qubit: usize) -> Option<u8> {
        let shift = self.width.checked_sub(qubit)?.checked_sub(1)?;
        Some(((self.index >> shift) & 1) as u8)
    }
}

/// Number of qubits behind a state vector of `len` amplitudes.
pub(crate) fn register_width(len: usize) -> Result<usize> {
    if len < 2 || !len.is_power_of_two() {
        return Err(SimError::invalid_argument(format!(
            "state vector length must be a power of two of at least 2, got {len}"
        )));
    }
    Ok(len.trailing_zeros() as usize)
}

/// Draws `r` uniformly from `[0, 1)` and returns the first basis index whose
/// cumulative probability exceeds it.
///
/// A state whose total probability has drifted away from 1 is sampled as if
/// it were renormalised. When rounding leaves the running sum just short of
/// `r` the last index is returned.
pub fn measure(amplitudes: &[Complex<f64>], rng: &mut impl Rng) -> Result<Outcome> {
    let width = register_width(amplitudes.len())?;
    let total: f64 = amplitudes.iter().map(|a| a.norm_sqr()).sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(SimError::NumericalDrift { norm: total.sqrt() });
    }

    let mut r = rng.gen_range(0.0..1.0);
    if (total - 1.0).abs() > NORM_TOLERANCE {
        warn!(total, "measuring a state that is not normalised; rescaling the draw");
        r *= total;
    }

    let mut cumulative = 0.0;
    for (index, amp) in amplitudes.iter().enumerate() {
        cumulative += amp.norm_sqr();
        if cumulative > r {
            return Ok(Outcome { index, width });
        }
    }
    Ok(Outcome {
        index: amplitudes.len() - 1,
        width,
    })
}

/// Repeated measurement of the same state, keyed by bitstring.
pub fn sample_counts(
    amplitudes: &[Complex<f64>],
    shots: u32,
    rng: &mut impl Rng,
) -> Result<BTreeMap<String, u32>> {
    let mut counts = BTreeMap::new();
    for _ in 0..shots {
        let outcome = measure(amplitudes, rng)?;
        *counts.entry(outcome.bitstring()).or_insert(0) += 1;
    }
    Ok(counts)
}

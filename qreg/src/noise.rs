//! Stochastic gate errors: small random rotations on random qubits.
//!
//! An error operator is a product of single-qubit rotations. One target
//! qubit is always chosen; every other qubit joins with probability
//! `error_probability`. Each target gets its own random axis and an angle
//! drawn from `[0, 4π·error_size)`.

use std::f64::consts::PI;

use rand::Rng;
use tracing::debug;

use crate::algebra::extend_unary;
use crate::backend::{LinearBackend, Operator};
use crate::error::Result;
use crate::gates::{axis_rotation, to_operator};
use crate::options::{ExtendOptions, NoiseConfig};

/// Builds one composite error operator on an `num_qubits` register.
pub fn get_error_matrix<B: LinearBackend>(
    backend: &B,
    num_qubits: usize,
    config: &NoiseConfig,
    rng: &mut impl Rng,
) -> Result<Operator> {
    config.validate()?;
    let dim = backend.register_dim(num_qubits)?;

    let first = rng.gen_range(0..num_qubits);
    let mut targets = vec![first];
    for qubit in 0..num_qubits {
        if qubit != first && rng.gen_bool(config.error_probability) {
            targets.push(qubit);
        }
    }

    let mut error = backend.identity(dim)?;
    for &target in &targets {
        let axis = random_axis(rng);
        let angle = 4.0 * PI * config.error_size * rng.gen_range(0.0..1.0);
        let rotation = to_operator(&axis_rotation(axis, angle));
        let extended = extend_unary(backend, &rotation, num_qubits, &ExtendOptions::targets(vec![target]))?;
        error = backend.matmul(&extended, &error)?;
    }
    debug!(?targets, "built error operator");
    Ok(error)
}

/// Rolls a single insertion point: with probability `error_probability` an
/// error operator is returned, otherwise `None`. Disabled noise never fires.
pub fn maybe_error<B: LinearBackend>(
    backend: &B,
    num_qubits: usize,
    noise: Option<&NoiseConfig>,
    rng: &mut impl Rng,
) -> Result<Option<Operator>> {
    let Some(config) = noise else {
        return Ok(None);
    };
    config.validate()?;
    if !rng.gen_bool(config.error_probability) {
        return Ok(None);
    }
    get_error_matrix(backend, num_qubits, config, rng).map(Some)
}

/// Uniform magnitudes with random signs, normalised. A (vanishingly rare)
/// zero vector is redrawn.
fn random_axis(rng: &mut impl Rng) -> [f64; 3] {
    loop {
        let mut axis = [0.0; 3];
        for component in &mut axis {
            let magnitude: f64 = rng.gen_range(0.0..1.0);
            *component = if rng.gen_bool(0.5) { -magnitude } else { magnitude };
        }
        let norm = axis.iter().map(|c| c * c).sum::<f64>().sqrt();
        if norm > f64::EPSILON {
            return axis.map(|c| c / norm);
        }
    }
}

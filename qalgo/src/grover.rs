//! Grover search over an `n`-qubit register with a boolean oracle.
//!
//! The engine precomputes three dense operators once per instance: the
//! Hadamard network `H⊗ⁿ`, the diffuser `H⊗ⁿ (2|0⟩⟨0| − I) H⊗ⁿ` and the
//! diagonal oracle. Changing the oracle only rebuilds the oracle operator.

use std::f64::consts::FRAC_PI_4;

use num_complex::Complex;
use qreg::gates::{HADAMARD, to_operator};
use qreg::{
    DenseBackend, ExtendOptions, LinearBackend, NoiseConfig, Operator, Outcome, ResourceLimits,
    Result, StateVector, extend_unary, maybe_error,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arith::ceil_log2;

const MINUS_ONE: Complex<f64> = Complex::new(-1.0, 0.0);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroverOptions {
    /// Report operator construction progress at debug level.
    pub verbose: bool,
    /// Memory budget for the default dense backend.
    pub limits: ResourceLimits,
}

pub struct Grover<B: LinearBackend = DenseBackend> {
    backend: B,
    num_qubits: usize,
    verbose: bool,
    hadamards: Operator,
    diffuser: Operator,
    oracle: Operator,
    marked: Vec<usize>,
}

impl Grover<DenseBackend> {
    /// `oracle(i)` marks basis state `i`. Returning `None` means `i` is out
    /// of the oracle's range; the state is then left unmarked.
    pub fn new<F>(oracle: F, num_qubits: usize, options: GroverOptions) -> Result<Self>
    where
        F: Fn(usize) -> Option<bool>,
    {
        let backend = DenseBackend::with_limits(options.limits);
        Self::with_backend(backend, oracle, num_qubits, options)
    }

    /// Searches `database` for entries satisfying `predicate`, on the
    /// smallest register that indexes every entry.
    pub fn from_database<T, P>(database: &[T], predicate: P, options: GroverOptions) -> Result<Self>
    where
        P: Fn(&T) -> bool,
    {
        let num_qubits = database_width(database.len());
        Self::new(|i| database.get(i).map(&predicate), num_qubits, options)
    }
}

impl<B: LinearBackend> Grover<B> {
    pub fn with_backend<F>(backend: B, oracle: F, num_qubits: usize, options: GroverOptions) -> Result<Self>
    where
        F: Fn(usize) -> Option<bool>,
    {
        let dim = backend.register_dim(num_qubits)?;
        let extend = ExtendOptions::default().verbose(options.verbose);
        let hadamards = extend_unary(&backend, &to_operator(&HADAMARD), num_qubits, &extend)?;

        // 2|0⟩⟨0| − I
        let mut reflection = backend.zeros(dim)?;
        reflection.fill_diagonal(MINUS_ONE);
        reflection[(0, 0)] = Complex::new(1.0, 0.0);
        let diffuser = backend.matmul(&hadamards, &backend.matmul(&reflection, &hadamards)?)?;

        let (oracle, marked) = build_oracle(&backend, dim, oracle)?;
        if options.verbose {
            debug!(num_qubits, marked = marked.len(), "built Grover operators");
        }
        Ok(Self {
            backend,
            num_qubits,
            verbose: options.verbose,
            hadamards,
            diffuser,
            oracle,
            marked,
        })
    }

    /// Swaps in a new oracle, keeping the Hadamard network and diffuser.
    pub fn set_oracle<F>(&mut self, oracle: F) -> Result<()>
    where
        F: Fn(usize) -> Option<bool>,
    {
        let (op, marked) = build_oracle(&self.backend, 1 << self.num_qubits, oracle)?;
        if self.verbose {
            debug!(marked = marked.len(), "rebuilt oracle");
        }
        self.oracle = op;
        self.marked = marked;
        Ok(())
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Basis states the current oracle flips.
    pub fn marked(&self) -> &[usize] {
        &self.marked
    }

    pub fn oracle_operator(&self) -> &Operator {
        &self.oracle
    }

    pub fn diffuser(&self) -> &Operator {
        &self.diffuser
    }

    /// Runs `iterations` oracle/diffuser rounds from the uniform
    /// superposition and returns the final state.
    ///
    /// With noise enabled each round rolls for an error three times: before
    /// the oracle, between oracle and diffuser, and after the diffuser.
    pub fn search(
        &self,
        iterations: usize,
        noise: Option<&NoiseConfig>,
        rng: &mut impl Rng,
    ) -> Result<StateVector> {
        let mut state = StateVector::new(self.num_qubits);
        state.apply(&self.backend, &self.hadamards)?;
        for _ in 0..iterations {
            self.inject_noise(&mut state, noise, rng)?;
            state.apply(&self.backend, &self.oracle)?;
            self.inject_noise(&mut state, noise, rng)?;
            state.apply(&self.backend, &self.diffuser)?;
            self.inject_noise(&mut state, noise, rng)?;
        }
        info!(
            num_qubits = self.num_qubits,
            iterations,
            noisy = noise.is_some(),
            "grover search finished"
        );
        Ok(state)
    }

    /// [`Grover::search`] followed by a measurement of the whole register.
    pub fn sample(
        &self,
        iterations: usize,
        noise: Option<&NoiseConfig>,
        rng: &mut impl Rng,
    ) -> Result<Outcome> {
        let state = self.search(iterations, noise, rng)?;
        state.measure(rng)
    }

    fn inject_noise(
        &self,
        state: &mut StateVector,
        noise: Option<&NoiseConfig>,
        rng: &mut impl Rng,
    ) -> Result<()> {
        if let Some(error) = maybe_error(&self.backend, self.num_qubits, noise, rng)? {
            state.apply(&self.backend, &error)?;
        }
        Ok(())
    }
}

/// Diagonal `±1` operator; entries the oracle declines to answer stay `+1`.
fn build_oracle<B, F>(backend: &B, dim: usize, oracle: F) -> Result<(Operator, Vec<usize>)>
where
    B: LinearBackend,
    F: Fn(usize) -> Option<bool>,
{
    let mut op = backend.identity(dim)?;
    let mut marked = Vec::new();
    let mut skipped = 0usize;
    for index in 0..dim {
        match oracle(index) {
            Some(true) => {
                op[(index, index)] = MINUS_ONE;
                marked.push(index);
            }
            Some(false) => {}
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "oracle left out-of-range indices unmarked");
    }
    Ok((op, marked))
}

/// Register width needed to index `len` entries (at least one qubit).
pub(crate) fn database_width(len: usize) -> usize {
    ceil_log2(len as u64).max(1)
}

/// Standard iteration count `⌊π/4 · √(2ⁿ / marked)⌋`, never below one.
pub fn optimal_iterations(num_qubits: usize, marked: usize) -> usize {
    let space = (1u64 << num_qubits) as f64;
    let ratio = space / marked.max(1) as f64;
    ((FRAC_PI_4 * ratio.sqrt()).floor() as usize).max(1)
}

/// Total probability of the basis states satisfying `predicate`.
pub fn success_probability(state: &StateVector, predicate: impl Fn(usize) -> bool) -> f64 {
    state
        .probabilities()
        .into_iter()
        .enumerate()
        .filter(|&(index, _)| predicate(index))
        .map(|(_, p)| p)
        .sum()
}

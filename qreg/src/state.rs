use num_complex::Complex;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::backend::{LinearBackend, Operator};
use crate::error::{Result, SimError};
use crate::measure::{self, Outcome};

/// How far a state's norm may drift from 1 before it counts as drift.
pub const NORM_TOLERANCE: f64 = 1e-6;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StateVector {
    pub num_qubits: usize,
    #[serde(rename = "amplitudes")]
    pub amplitudes: Vec<Complex<f64>>,
}

impl StateVector {
    /// The all-zero state |0…0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits; // 2^num_qubits
        let mut amplitudes = vec![Complex::new(0.0, 0.0); size];
        amplitudes[0] = Complex::new(1.0, 0.0);
        Self {
            num_qubits,
            amplitudes,
        }
    }

    /// The computational basis state `|index⟩`.
    pub fn basis(num_qubits: usize, index: usize) -> Result<Self> {
        let mut state = Self::new(num_qubits);
        if index >= state.amplitudes.len() {
            return Err(SimError::invalid_argument(format!(
                "basis index {index} out of range for {num_qubits} qubits"
            )));
        }
        state.amplitudes[0] = Complex::new(0.0, 0.0);
        state.amplitudes[index] = Complex::new(1.0, 0.0);
        Ok(state)
    }

    pub fn from_amplitudes(amplitudes: Vec<Complex<f64>>) -> Result<Self> {
        let num_qubits = measure::register_width(amplitudes.len())?;
        Ok(Self {
            num_qubits,
            amplitudes,
        })
    }

    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    pub fn apply<B: LinearBackend>(&mut self, backend: &B, op: &Operator) -> Result<()> {
        self.amplitudes = backend.apply(op, &self.amplitudes)?;
        Ok(())
    }

    /// Moves the amplitude of basis state `i` to `targets[i]`. `targets` must
    /// be a permutation of the basis indices.
    pub fn permute(&mut self, targets: &[usize]) -> Result<()> {
        let len = self.amplitudes.len();
        if targets.len() != len {
            return Err(SimError::invalid_argument(format!(
                "permutation of {} entries cannot act on {len} amplitudes",
                targets.len()
            )));
        }
        let mut seen = vec![false; len];
        for &target in targets {
            if target >= len || std::mem::replace(&mut seen[target], true) {
                return Err(SimError::invalid_argument(format!(
                    "basis index {target} is out of range or repeated in the permutation"
                )));
            }
        }
        let mut new_amplitudes = vec![Complex::new(0.0, 0.0); len];
        for (amp, &target) in self.amplitudes.iter().zip(targets) {
            new_amplitudes[target] = *amp;
        }
        self.amplitudes = new_amplitudes;
        Ok(())
    }

    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    pub fn probability(&self, index: usize) -> f64 {
        self.amplitudes.get(index).map_or(0.0, |a| a.norm_sqr())
    }

    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.norm_sqr() - 1.0).abs() <= tolerance
    }

    /// Rescales to unit norm. A state with (almost) no weight left cannot be
    /// repaired and is reported as drift.
    pub fn normalize(&mut self) -> Result<()> {
        let norm = self.norm_sqr().sqrt();
        if !norm.is_finite() || norm < f64::EPSILON {
            return Err(SimError::NumericalDrift { norm });
        }
        for amp in &mut self.amplitudes {
            *amp /= norm;
        }
        Ok(())
    }

    /// Keeps only the basis states with `index & mask == value` and
    /// renormalises: the collapse left behind by measuring the masked bits.
    pub fn project(&mut self, mask: usize, value: usize) -> Result<()> {
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != value {
                *amp = Complex::new(0.0, 0.0);
            }
        }
        self.normalize()
    }

    pub fn measure(&self, rng: &mut impl Rng) -> Result<Outcome> {
        measure::measure(&self.amplitudes, rng)
    }

    /// Back to `|0…0⟩`. An empty (deserialised) state stays empty.
    pub fn reset(&mut self) {
        for amp in &mut self.amplitudes {
            *amp = Complex::new(0.0, 0.0);
        }
        if let Some(first) = self.amplitudes.first_mut() {
            *first = Complex::new(1.0, 0.0);
        }
    }
}

//! Dense linear algebra behind the register algebra.
//!
//! The Grover and Shor engines only ever talk to a [`LinearBackend`], so a
//! threaded or accelerator-backed implementation can be swapped in without
//! touching the algorithms. Every backend enforces the same
//! [`ResourceLimits`]: an operator that would not fit is reported as
//! [`SimError::ResourceExhaustion`] before anything is allocated.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::error::{Result, SimError};
use crate::options::ResourceLimits;

/// A dense complex matrix acting on a register's state vector.
pub type Operator = DMatrix<Complex<f64>>;

pub(crate) const ZERO: Complex<f64> = Complex::new(0.0, 0.0);
pub(crate) const ONE: Complex<f64> = Complex::new(1.0, 0.0);

const ENTRY_BYTES: u128 = std::mem::size_of::<Complex<f64>>() as u128;

pub trait LinearBackend {
    fn limits(&self) -> &ResourceLimits;

    /// Kronecker product `a ⊗ b`.
    fn kron(&self, a: &Operator, b: &Operator) -> Result<Operator>;

    /// Matrix product `a · b`.
    fn matmul(&self, a: &Operator, b: &Operator) -> Result<Operator>;

    /// `op · amplitudes`.
    fn apply(&self, op: &Operator, amplitudes: &[Complex<f64>]) -> Result<Vec<Complex<f64>>>;

    /// Checks that a `rows × cols` operator fits the memory budget.
    fn ensure_fits(&self, rows: usize, cols: usize) -> Result<()> {
        let bytes = (rows as u128)
            .saturating_mul(cols as u128)
            .saturating_mul(ENTRY_BYTES);
        if bytes > self.limits().max_operator_bytes as u128 {
            return Err(SimError::ResourceExhaustion {
                num_qubits: qubits_for(rows.max(cols)),
                bytes,
            });
        }
        Ok(())
    }

    /// Dimension `2^n` of an `n`-qubit register, after checking that a
    /// `2^n × 2^n` operator fits the memory budget.
    fn register_dim(&self, num_qubits: usize) -> Result<usize> {
        if num_qubits == 0 {
            return Err(SimError::invalid_argument(
                "a register needs at least one qubit",
            ));
        }
        // 16 · 4^n bytes; past 61 qubits that no longer fits a u128.
        let bytes = u32::try_from(num_qubits)
            .ok()
            .and_then(|n| n.checked_mul(2))
            .and_then(|shift| 1u128.checked_shl(shift))
            .and_then(|entries| entries.checked_mul(ENTRY_BYTES))
            .unwrap_or(u128::MAX);
        if bytes > self.limits().max_operator_bytes as u128 {
            return Err(SimError::ResourceExhaustion { num_qubits, bytes });
        }
        Ok(1 << num_qubits)
    }

    fn zeros(&self, dim: usize) -> Result<Operator> {
        allocate(self, dim, dim)
    }

    fn identity(&self, dim: usize) -> Result<Operator> {
        let mut op = self.zeros(dim)?;
        op.fill_diagonal(ONE);
        Ok(op)
    }
}

fn qubits_for(dim: usize) -> usize {
    dim.next_power_of_two().trailing_zeros() as usize
}

/// Zero-filled operator whose storage is reserved fallibly, so allocator
/// failure is surfaced instead of aborting the process.
fn allocate<B: LinearBackend + ?Sized>(backend: &B, rows: usize, cols: usize) -> Result<Operator> {
    backend.ensure_fits(rows, cols)?;
    let len = rows * cols;
    let mut entries = Vec::new();
    entries
        .try_reserve_exact(len)
        .map_err(|_| SimError::ResourceExhaustion {
            num_qubits: qubits_for(rows.max(cols)),
            bytes: len as u128 * ENTRY_BYTES,
        })?;
    entries.resize(len, ZERO);
    Ok(Operator::from_vec(rows, cols, entries))
}

fn dense_kron<B: LinearBackend + ?Sized>(backend: &B, a: &Operator, b: &Operator) -> Result<Operator> {
    let (b_rows, b_cols) = b.shape();
    let mut out = allocate(backend, a.nrows() * b_rows, a.ncols() * b_cols)?;
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            let scale = a[(i, j)];
            if scale == ZERO {
                continue;
            }
            for k in 0..b_rows {
                for l in 0..b_cols {
                    out[(i * b_rows + k, j * b_cols + l)] = scale * b[(k, l)];
                }
            }
        }
    }
    Ok(out)
}

fn check_product(a: &Operator, b_rows: usize) -> Result<()> {
    if a.ncols() != b_rows {
        return Err(SimError::invalid_argument(format!(
            "cannot multiply a {}x{} operator with {} rows",
            a.nrows(),
            a.ncols(),
            b_rows
        )));
    }
    Ok(())
}

/// Single-threaded CPU backend built on nalgebra.
#[derive(Debug, Clone, Default)]
pub struct DenseBackend {
    limits: ResourceLimits,
}

impl DenseBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self { limits }
    }
}

impl LinearBackend for DenseBackend {
    fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    fn kron(&self, a: &Operator, b: &Operator) -> Result<Operator> {
        dense_kron(self, a, b)
    }

    fn matmul(&self, a: &Operator, b: &Operator) -> Result<Operator> {
        check_product(a, b.nrows())?;
        self.ensure_fits(a.nrows(), b.ncols())?;
        Ok(a * b)
    }

    fn apply(&self, op: &Operator, amplitudes: &[Complex<f64>]) -> Result<Vec<Complex<f64>>> {
        check_product(op, amplitudes.len())?;
        let state = DVector::from_column_slice(amplitudes);
        let evolved = op * state;
        Ok(evolved.as_slice().to_vec())
    }
}

#[cfg(feature = "parallel")]
pub use parallel::ParallelBackend;

#[cfg(feature = "parallel")]
mod parallel {
    use num_complex::Complex;
    use rayon::prelude::*;

    use super::{LinearBackend, Operator, allocate, check_product, dense_kron};
    use crate::error::Result;
    use crate::options::ResourceLimits;

    /// Spreads matrix-vector and matrix-matrix products over the rayon pool.
    /// Results match [`super::DenseBackend`] entry for entry.
    #[derive(Debug, Clone, Default)]
    pub struct ParallelBackend {
        limits: ResourceLimits,
    }

    impl ParallelBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_limits(limits: ResourceLimits) -> Self {
            Self { limits }
        }
    }

    impl LinearBackend for ParallelBackend {
        fn limits(&self) -> &ResourceLimits {
            &self.limits
        }

        fn kron(&self, a: &Operator, b: &Operator) -> Result<Operator> {
            dense_kron(self, a, b)
        }

        fn matmul(&self, a: &Operator, b: &Operator) -> Result<Operator> {
            check_product(a, b.nrows())?;
            let rows = a.nrows();
            let mut out = allocate(self, rows, b.ncols())?;
            if rows == 0 {
                return Ok(out);
            }
            // Storage is column-major, so each chunk is one output column.
            out.as_mut_slice()
                .par_chunks_mut(rows)
                .enumerate()
                .for_each(|(j, column)| {
                    for (i, entry) in column.iter_mut().enumerate() {
                        *entry = (0..a.ncols())
                            .map(|k| a[(i, k)] * b[(k, j)])
                            .sum::<Complex<f64>>();
                    }
                });
            Ok(out)
        }

        fn apply(&self, op: &Operator, amplitudes: &[Complex<f64>]) -> Result<Vec<Complex<f64>>> {
            check_product(op, amplitudes.len())?;
            Ok((0..op.nrows())
                .into_par_iter()
                .map(|i| {
                    amplitudes
                        .iter()
                        .enumerate()
                        .map(|(j, amp)| op[(i, j)] * amp)
                        .sum::<Complex<f64>>()
                })
                .collect())
        }
    }
}

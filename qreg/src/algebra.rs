//! Embedding of one- and two-qubit gates into an `n`-qubit register.
//!
//! Qubit 0 is the first (most significant) Kronecker factor, so in a basis
//! index it is the highest bit.

use num_complex::Complex;
use tracing::debug;

use crate::backend::{LinearBackend, ONE, Operator};
use crate::error::{Result, SimError};
use crate::gates::{self, IDENTITY};
use crate::options::{ExtendOptions, Targets};

fn check_gate(gate: &Operator, dim: usize, kind: &str) -> Result<()> {
    if gate.shape() != (dim, dim) {
        let (rows, cols) = gate.shape();
        return Err(SimError::invalid_argument(format!(
            "{kind} gate must be {dim}x{dim}, got {rows}x{cols}"
        )));
    }
    Ok(())
}

fn check_qubit(index: usize, num_qubits: usize) -> Result<()> {
    if index >= num_qubits {
        return Err(SimError::QubitIndex { index, num_qubits });
    }
    Ok(())
}

/// Places `gate` on every target qubit and the identity everywhere else.
pub fn extend_unary<B: LinearBackend>(
    backend: &B,
    gate: &Operator,
    num_qubits: usize,
    options: &ExtendOptions,
) -> Result<Operator> {
    check_gate(gate, 2, "unary")?;
    backend.register_dim(num_qubits)?;
    if let Targets::Only(targets) = &options.targets {
        for &target in targets {
            check_qubit(target, num_qubits)?;
        }
    }

    let identity = gates::to_operator(&IDENTITY);
    let mut extended = Operator::from_element(1, 1, ONE);
    for qubit in 0..num_qubits {
        let factor = if options.targets.contains(qubit) {
            gate
        } else {
            &identity
        };
        extended = backend.kron(&extended, factor)?;
        if options.verbose {
            debug!("Computed {}/{} tensor products", qubit + 1, num_qubits);
        }
    }
    Ok(extended)
}

/// Places a 4x4 `gate` on the neighbouring qubits `(i, i + 1)`.
pub fn extend_adjacent_binary<B: LinearBackend>(
    backend: &B,
    pair: (usize, usize),
    gate: &Operator,
    num_qubits: usize,
) -> Result<Operator> {
    check_gate(gate, 4, "binary")?;
    backend.register_dim(num_qubits)?;
    let (first, second) = pair;
    if second != first + 1 {
        return Err(SimError::invalid_argument(format!(
            "gate must be applied to adjacent qubits, got ({first}, {second})"
        )));
    }
    check_qubit(second, num_qubits)?;

    let identity = gates::to_operator(&IDENTITY);
    let mut extended = Operator::from_element(1, 1, ONE);
    let mut qubit = 0;
    while qubit < num_qubits {
        if qubit == first {
            extended = backend.kron(&extended, gate)?;
            qubit += 2;
        } else {
            extended = backend.kron(&extended, &identity)?;
            qubit += 1;
        }
    }
    Ok(extended)
}

/// Places a 4x4 `gate` on any two distinct qubits. `pair.0` plays the role
/// of the gate's first qubit and `pair.1` of its second.
///
/// The qubits are routed next to each other by a network of adjacent SWAPs,
/// the gate is applied there, and the inverse network restores the original
/// ordering.
pub fn extend_binary<B: LinearBackend>(
    backend: &B,
    pair: (usize, usize),
    gate: &Operator,
    num_qubits: usize,
) -> Result<Operator> {
    check_gate(gate, 4, "binary")?;
    backend.register_dim(num_qubits)?;
    let (first, second) = pair;
    check_qubit(first, num_qubits)?;
    check_qubit(second, num_qubits)?;
    if first == second {
        return Err(SimError::invalid_argument(format!(
            "binary gate needs two distinct qubits, got ({first}, {second})"
        )));
    }
    if second == first + 1 {
        return extend_adjacent_binary(backend, pair, gate, num_qubits);
    }

    let (layout, position) = adjacent_layout(num_qubits, first, second);
    let forward = adjacent_transpositions(&layout);
    let reverse: Vec<usize> = forward.iter().rev().copied().collect();
    debug_assert!(restores_identity(&layout, &reverse));

    let route = swap_network(backend, &forward, num_qubits)?;
    let unroute = swap_network(backend, &reverse, num_qubits)?;
    let core = extend_adjacent_binary(backend, (position, position + 1), gate, num_qubits)?;
    backend.matmul(&unroute, &backend.matmul(&core, &route)?)
}

/// Qubit ordering in which `first` sits immediately before `second`, with
/// every other qubit keeping its relative order. Returns the ordering and the
/// position of `first` in it.
fn adjacent_layout(num_qubits: usize, first: usize, second: usize) -> (Vec<usize>, usize) {
    let mut layout: Vec<usize> = (0..num_qubits).filter(|&q| q != first).collect();
    let position = if first < second { second - 1 } else { second };
    layout.insert(position, first);
    (layout, position)
}

/// Adjacent transpositions that carry the identity ordering to `layout`.
///
/// Entry `p` swaps positions `p` and `p + 1`. The sequence is the
/// insertion-sort trace of `layout`, reversed: sorting undoes the
/// permutation, so replaying the swaps backwards builds it.
pub fn adjacent_transpositions(layout: &[usize]) -> Vec<usize> {
    let mut scratch = layout.to_vec();
    let mut trace = Vec::new();
    for i in 1..scratch.len() {
        let mut j = i;
        while j > 0 && scratch[j - 1] > scratch[j] {
            scratch.swap(j - 1, j);
            trace.push(j - 1);
            j -= 1;
        }
    }
    trace.reverse();
    trace
}

fn restores_identity(layout: &[usize], transpositions: &[usize]) -> bool {
    let mut scratch = layout.to_vec();
    for &p in transpositions {
        scratch.swap(p, p + 1);
    }
    scratch.iter().enumerate().all(|(position, &qubit)| position == qubit)
}

/// Product of extended SWAP gates, the first transposition applied first.
pub fn swap_network<B: LinearBackend>(
    backend: &B,
    transpositions: &[usize],
    num_qubits: usize,
) -> Result<Operator> {
    let dim = backend.register_dim(num_qubits)?;
    let swap = gates::swap();
    let mut network = backend.identity(dim)?;
    for &p in transpositions {
        let extended = extend_adjacent_binary(backend, (p, p + 1), &swap, num_qubits)?;
        network = backend.matmul(&extended, &network)?;
    }
    Ok(network)
}

/// Largest entry-wise deviation of `op · op†` from the identity.
pub fn unitarity_error(op: &Operator) -> f64 {
    let product = op * op.adjoint();
    let mut worst: f64 = 0.0;
    for i in 0..product.nrows() {
        for j in 0..product.ncols() {
            let expected = if i == j {
                Complex::new(1.0, 0.0)
            } else {
                Complex::new(0.0, 0.0)
            };
            worst = worst.max((product[(i, j)] - expected).norm());
        }
    }
    worst
}

pub fn is_unitary(op: &Operator, tolerance: f64) -> bool {
    op.is_square() && unitarity_error(op) <= tolerance
}

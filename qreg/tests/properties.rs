//! Property-based tests for the register algebra, sampler and noise model.

use num_complex::Complex;
use proptest::prelude::*;
use qreg::algebra::swap_network;
use qreg::gates::{axis_rotation, cnot, swap, to_operator};
use qreg::{
    DenseBackend, ExtendOptions, LinearBackend, NoiseConfig, Operator, extend_adjacent_binary,
    extend_binary, extend_unary, get_error_matrix, is_unitary, measure,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

const TOLERANCE: f64 = 1e-6;

fn unit_axis(raw: [f64; 3]) -> [f64; 3] {
    let norm = raw.iter().map(|c| c * c).sum::<f64>().sqrt();
    if norm < 1e-6 {
        [0.0, 0.0, 1.0]
    } else {
        raw.map(|c| c / norm)
    }
}

/// Permutation matrix sending each basis state to the one whose qubit `k`
/// holds the old value of qubit `order[k]`.
fn relabelling(order: &[usize]) -> Operator {
    let n = order.len();
    let dim = 1 << n;
    let mut op = Operator::zeros(dim, dim);
    for index in 0..dim {
        let relabelled = order.iter().enumerate().fold(0, |acc, (k, &q)| {
            acc | (((index >> (n - 1 - q)) & 1) << (n - 1 - k))
        });
        op[(relabelled, index)] = Complex::new(1.0, 0.0);
    }
    op
}

/// A two-qubit unitary that is not symmetric under exchanging its qubits.
fn entangling_gate(angle: f64) -> Operator {
    let backend = DenseBackend::new();
    let rotation = to_operator(&axis_rotation([0.0, 1.0, 0.0], angle));
    let local = backend
        .kron(&rotation, &to_operator(&qreg::gates::IDENTITY))
        .unwrap();
    backend.matmul(&cnot(), &local).unwrap()
}

proptest! {
    /// Property: any rotation extended onto any target set stays unitary.
    #[test]
    fn extended_unary_is_unitary(
        num_qubits in 1usize..5,
        raw_axis in prop::array::uniform3(-1.0f64..1.0),
        angle in 0.0f64..(4.0 * std::f64::consts::PI),
        mask in 0u8..16,
    ) {
        let backend = DenseBackend::new();
        let gate = to_operator(&axis_rotation(unit_axis(raw_axis), angle));
        let targets: Vec<usize> = (0..num_qubits).filter(|q| mask & (1 << q) != 0).collect();
        let extended = extend_unary(&backend, &gate, num_qubits, &ExtendOptions::targets(targets)).unwrap();
        prop_assert_eq!(extended.shape(), (1 << num_qubits, 1 << num_qubits));
        prop_assert!(is_unitary(&extended, TOLERANCE));
    }

    /// Property: binary gates on any ordered pair of distinct qubits stay unitary.
    #[test]
    fn extended_binary_is_unitary(
        num_qubits in 2usize..5,
        first in 0usize..4,
        second in 0usize..4,
        angle in 0.0f64..3.0,
    ) {
        prop_assume!(first < num_qubits && second < num_qubits && first != second);
        let backend = DenseBackend::new();
        let extended = extend_binary(&backend, (first, second), &entangling_gate(angle), num_qubits).unwrap();
        prop_assert!(is_unitary(&extended, TOLERANCE));
    }

    /// Property: a gate routed onto `(first, second)` equals the gate on
    /// qubits `(0, 1)` conjugated by the basis permutation that relabels
    /// `first` as qubit 0 and `second` as qubit 1.
    #[test]
    fn routed_binary_matches_relabelled_basis(
        num_qubits in 3usize..5,
        first in 0usize..4,
        second in 0usize..4,
        angle in 0.0f64..3.0,
    ) {
        prop_assume!(first < num_qubits && second < num_qubits && first != second);
        let backend = DenseBackend::new();
        let gate = entangling_gate(angle);

        let mut order = vec![first, second];
        order.extend((0..num_qubits).filter(|&q| q != first && q != second));
        let relabel = relabelling(&order);
        let core = extend_adjacent_binary(&backend, (0, 1), &gate, num_qubits).unwrap();
        let manual = relabel.transpose() * core * &relabel;

        let routed = extend_binary(&backend, (first, second), &gate, num_qubits).unwrap();
        let worst = routed
            .iter()
            .zip(manual.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max);
        prop_assert!(worst < 1e-9, "max deviation {}", worst);
    }

    /// Property: measurement always lands inside the register.
    #[test]
    fn measure_stays_in_range(
        raw in prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0), 8),
        seed in any::<u64>(),
    ) {
        let norm = raw.iter().map(|(re, im)| re * re + im * im).sum::<f64>().sqrt();
        prop_assume!(norm > 1e-3);
        let amps: Vec<Complex<f64>> = raw.iter().map(|&(re, im)| Complex::new(re / norm, im / norm)).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let outcome = measure(&amps, &mut rng).unwrap();
        prop_assert!(outcome.index < 8);
        prop_assert_eq!(outcome.width, 3);
    }

    /// Property: error operators are unitary whatever targets were drawn.
    #[test]
    fn error_matrix_is_unitary(
        num_qubits in 1usize..5,
        probability in 0.0f64..=1.0,
        size in 0.0f64..0.5,
        seed in any::<u64>(),
    ) {
        let backend = DenseBackend::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let config = NoiseConfig::new(probability).with_error_size(size);
        let error = get_error_matrix(&backend, num_qubits, &config, &mut rng).unwrap();
        prop_assert!(is_unitary(&error, TOLERANCE));
    }
}

#[test]
fn swap_network_of_a_single_transposition_is_the_extended_swap() {
    let backend = DenseBackend::new();
    let network = swap_network(&backend, &[1], 3).unwrap();
    let direct = extend_adjacent_binary(&backend, (1, 2), &swap(), 3).unwrap();
    assert_eq!(network, direct);
}

#[test]
fn empirical_frequencies_follow_born_rule() {
    let amps: Vec<Complex<f64>> = [0.1f64, 0.2, 0.3, 0.4]
        .iter()
        .map(|p| Complex::new(p.sqrt(), 0.0))
        .collect();
    let mut rng = StdRng::seed_from_u64(2024);
    let shots = 20_000;
    let mut counts = [0u32; 4];
    for _ in 0..shots {
        counts[measure(&amps, &mut rng).unwrap().index] += 1;
    }
    for (i, &expected) in [0.1, 0.2, 0.3, 0.4].iter().enumerate() {
        let observed = f64::from(counts[i]) / f64::from(shots);
        // σ ≤ 0.0035 at 20k shots; 0.02 is beyond 5σ.
        assert!((observed - expected).abs() < 0.02, "p({}) = {} vs {}", i, observed, expected);
    }
}

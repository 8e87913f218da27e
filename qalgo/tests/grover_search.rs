mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::RecordingBackend;
use qalgo::{Grover, GroverOptions, optimal_iterations, success_probability};
use qreg::{NoiseConfig, ResourceLimits, SimError};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn hits(num_qubits: usize, target: usize, shots: usize, seed: u64) -> usize {
    let grover = Grover::new(|i| Some(i == target), num_qubits, GroverOptions::default()).unwrap();
    let iterations = optimal_iterations(num_qubits, 1);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..shots)
        .filter(|_| grover.sample(iterations, None, &mut rng).unwrap().index == target)
        .count()
}

#[test]
fn single_marked_item_is_found_in_most_shots() {
    for seed in [1, 2, 3] {
        // p ≈ 0.945 for three qubits, ≥ 0.96 from four upwards.
        let three = hits(3, 5, 100, seed);
        assert!(three >= 90, "n = 3, seed {seed}: {three}/100");
        for num_qubits in 4..=6 {
            let target = (seed as usize * 7) % (1 << num_qubits);
            let found = hits(num_qubits, target, 100, seed);
            assert!(found >= 90, "n = {num_qubits}, seed {seed}: {found}/100");
        }
    }
}

#[test]
fn several_marked_items_share_the_amplified_weight() {
    let marked = [3, 9, 12, 14];
    let grover = Grover::new(|i| Some(marked.contains(&i)), 5, GroverOptions::default()).unwrap();
    let iterations = optimal_iterations(5, marked.len());
    let mut rng = StdRng::seed_from_u64(4);
    let state = grover.search(iterations, None, &mut rng).unwrap();
    let p = success_probability(&state, |i| marked.contains(&i));
    assert!(p > 0.9, "p = {p}");
    // Marked states are symmetric under the Grover iteration.
    let first = state.probability(marked[0]);
    for &m in &marked[1..] {
        assert!((state.probability(m) - first).abs() < 1e-9);
    }
}

#[test]
fn database_search_skips_missing_entries() {
    let names = ["ada", "grace", "alan", "edsger", "barbara"];
    let grover = Grover::from_database(&names, |name| *name == "edsger", GroverOptions::default()).unwrap();
    assert_eq!(grover.num_qubits(), 3);
    assert_eq!(grover.marked(), &[3]);
    let mut rng = StdRng::seed_from_u64(5);
    let state = grover.search(optimal_iterations(3, 1), None, &mut rng).unwrap();
    assert!(state.probability(3) > 0.9);
}

#[test]
fn light_noise_degrades_gracefully() {
    let grover = Grover::new(|i| Some(i == 6), 4, GroverOptions::default()).unwrap();
    let noise = NoiseConfig::new(0.1).with_error_size(0.01);
    let mut rng = StdRng::seed_from_u64(6);
    let iterations = optimal_iterations(4, 1);
    let mut total = 0.0;
    for _ in 0..20 {
        let state = grover.search(iterations, Some(&noise), &mut rng).unwrap();
        assert!(state.is_normalized(1e-9));
        total += state.probability(6);
    }
    // Rotations of at most 0.04π per error barely move the peak.
    assert!(total / 20.0 > 0.8, "mean p = {}", total / 20.0);
}

#[test]
fn errors_are_rolled_around_oracle_and_diffuser() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let grover = Grover::with_backend(
        RecordingBackend::new(Rc::clone(&log)),
        |i| Some(i == 2),
        3,
        GroverOptions::default(),
    )
    .unwrap();
    log.borrow_mut().clear();

    let noise = NoiseConfig::new(1.0).with_error_size(0.0);
    let mut rng = StdRng::seed_from_u64(8);
    grover.search(2, Some(&noise), &mut rng).unwrap();

    // H, then error, oracle, error, diffuser, error for each iteration.
    let applied = log.borrow();
    assert_eq!(applied.len(), 1 + 2 * 5);
    for round in 0..2 {
        let start = 1 + 5 * round;
        assert_eq!(&applied[start + 1].0, grover.oracle_operator());
        assert_eq!(&applied[start + 3].0, grover.diffuser());
        for error in [start, start + 2, start + 4] {
            assert_ne!(&applied[error].0, grover.oracle_operator());
            assert_ne!(&applied[error].0, grover.diffuser());
        }
    }
}

#[test]
fn registers_beyond_the_budget_are_refused() {
    let options = GroverOptions {
        verbose: false,
        limits: ResourceLimits::with_max_operator_bytes(1 << 20),
    };
    // 2^9 × 2^9 × 16 bytes = 4 MiB.
    let err = Grover::new(|i| Some(i == 0), 9, options).err().unwrap();
    assert!(matches!(err, SimError::ResourceExhaustion { num_qubits: 9, .. }));
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_backend_gives_the_same_state() {
    use qreg::ParallelBackend;

    let dense = Grover::new(|i| Some(i == 11), 4, GroverOptions::default()).unwrap();
    let parallel = Grover::with_backend(
        ParallelBackend::new(),
        |i| Some(i == 11),
        4,
        GroverOptions::default(),
    )
    .unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let a = dense.search(3, None, &mut rng).unwrap();
    let b = parallel.search(3, None, &mut rng).unwrap();
    for (x, y) in a.amplitudes.iter().zip(&b.amplitudes) {
        assert!((x - y).norm() < 1e-12);
    }
}

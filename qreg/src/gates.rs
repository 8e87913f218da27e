use num_complex::Complex;
use std::f64::consts::FRAC_1_SQRT_2;

use crate::backend::Operator;

// custom type for single-qubit gate matrices
pub type GateMatrix = [[Complex<f64>; 2]; 2];

pub const IDENTITY: GateMatrix = [
    [Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)],
    [Complex::new(0.0, 0.0), Complex::new(1.0, 0.0)],
];

pub const HADAMARD: GateMatrix = [
    [
        Complex::new(FRAC_1_SQRT_2, 0.0),
        Complex::new(FRAC_1_SQRT_2, 0.0),
    ],
    [
        Complex::new(FRAC_1_SQRT_2, 0.0),
        Complex::new(-FRAC_1_SQRT_2, 0.0),
    ],
];

pub const PAULI_X: GateMatrix = [
    [Complex::new(0.0, 0.0), Complex::new(1.0, 0.0)],
    [Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)],
];

pub const PAULI_Y: GateMatrix = [
    [Complex::new(0.0, 0.0), Complex::new(0.0, -1.0)],
    [Complex::new(0.0, 1.0), Complex::new(0.0, 0.0)],
];

pub const PAULI_Z: GateMatrix = [
    [Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)],
    [Complex::new(0.0, 0.0), Complex::new(-1.0, 0.0)],
];

pub fn to_operator(gate: &GateMatrix) -> Operator {
    Operator::from_fn(2, 2, |row, col| gate[row][col])
}

fn permutation_gate(targets: [usize; 4]) -> Operator {
    let mut op = Operator::zeros(4, 4);
    for (column, &row) in targets.iter().enumerate() {
        op[(row, column)] = Complex::new(1.0, 0.0);
    }
    op
}

/// Exchanges two qubits: |ab⟩ → |ba⟩.
pub fn swap() -> Operator {
    permutation_gate([0, 2, 1, 3])
}

/// Controlled NOT with the first qubit as control.
pub fn cnot() -> Operator {
    permutation_gate([0, 1, 3, 2])
}

/// Rotation by `angle` about the unit `axis`:
/// `cos(θ/2)·I − i·sin(θ/2)·(n_x X + n_y Y + n_z Z)`.
///
/// The axis is expected to be normalised; the result is only unitary if it is.
pub fn axis_rotation(axis: [f64; 3], angle: f64) -> GateMatrix {
    let [nx, ny, nz] = axis;
    let half = angle * 0.5;
    let (ct, st) = (half.cos(), half.sin());
    [
        [Complex::new(ct, -st * nz), Complex::new(-st * ny, -st * nx)],
        [Complex::new(st * ny, -st * nx), Complex::new(ct, st * nz)],
    ]
}

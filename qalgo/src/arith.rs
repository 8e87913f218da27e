//! Classical number theory used around Shor's algorithm.

use std::fmt;

use qreg::SimError;

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// `(a · b) mod modulus` without overflow.
pub fn mod_mul(a: u64, b: u64, modulus: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) % u128::from(modulus)) as u64
}

/// `base^exponent mod modulus` by square-and-multiply.
pub fn mod_pow(base: u64, mut exponent: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result = 1;
    let mut base = base % modulus;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = mod_mul(result, base, modulus);
        }
        base = mod_mul(base, base, modulus);
        exponent >>= 1;
    }
    result
}

/// Smallest `k` with `2^k >= value`. `ceil_log2(1) == 0`.
pub fn ceil_log2(value: u64) -> usize {
    if value <= 1 {
        0
    } else {
        (u64::BITS - (value - 1).leading_zeros()) as usize
    }
}

/// A measured phase `numerator / denominator` in `[0, 1)`, kept in lowest
/// terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Phase {
    numerator: u64,
    denominator: u64,
}

impl Phase {
    pub fn new(numerator: u64, denominator: u64) -> qreg::Result<Self> {
        if denominator == 0 || numerator >= denominator {
            return Err(SimError::invalid_argument(format!(
                "phase {numerator}/{denominator} is not in [0, 1)"
            )));
        }
        let divisor = gcd(numerator, denominator);
        Ok(Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl TryFrom<f64> for Phase {
    type Error = SimError;

    /// Exact for dyadic values with up to 52 fractional bits, which covers
    /// every phase a register of at most 52 qubits can report.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || !(0.0..1.0).contains(&value) {
            return Err(SimError::invalid_argument(format!(
                "phase {value} is not in [0, 1)"
            )));
        }
        const SCALE: u64 = 1 << 52;
        let numerator = (value * SCALE as f64).round() as u64;
        Phase::new(numerator.min(SCALE - 1), SCALE)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A rational approximation `numerator / denominator` of some value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergent {
    pub numerator: u64,
    pub denominator: u64,
}

/// Simple continued fraction `[a0; a1, a2, …]` of a non-negative rational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuedFraction {
    quotients: Vec<u64>,
}

impl ContinuedFraction {
    /// Euclidean expansion of `numerator / denominator`. The expansion of a
    /// rational always terminates; `denominator` must be non-zero.
    pub fn expand(mut numerator: u64, mut denominator: u64) -> Self {
        let mut quotients = Vec::new();
        while denominator != 0 {
            quotients.push(numerator / denominator);
            (numerator, denominator) = (denominator, numerator % denominator);
        }
        Self { quotients }
    }

    pub fn quotients(&self) -> &[u64] {
        &self.quotients
    }

    /// Successive truncations of the expansion, shortest first. The last
    /// convergent is the expanded value itself.
    pub fn convergents(&self) -> impl Iterator<Item = Convergent> + '_ {
        // (h_{k-1}, k_{k-1}), (h_{k-2}, k_{k-2})
        self.quotients
            .iter()
            .scan(((1u64, 0u64), (0u64, 1u64)), |(prev, prev2), &a| {
                let numerator = a.checked_mul(prev.0)?.checked_add(prev2.0)?;
                let denominator = a.checked_mul(prev.1)?.checked_add(prev2.1)?;
                *prev2 = *prev;
                *prev = (numerator, denominator);
                Some(Convergent {
                    numerator,
                    denominator,
                })
            })
    }
}

impl From<Phase> for ContinuedFraction {
    fn from(phase: Phase) -> Self {
        Self::expand(phase.numerator, phase.denominator)
    }
}

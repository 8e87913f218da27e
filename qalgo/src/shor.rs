//! Shor's factoring algorithm on a simulated register.
//!
//! The register is split into a main register of `m` qubits (qubit 0 most
//! significant) followed by an ancillary register of `k = ⌈log2 N⌉` qubits.
//! Main-register qubit `c` controls multiplication of the ancillary value
//! by `a^{2^(m-1-c)} mod N`, so after the controlled-U sequence the main
//! register index is the exponent `x` of `a^x`. The inverse Fourier
//! transform on the main register then concentrates weight on multiples of
//! `2^m / r` for the period `r`, read back as the phase `x / 2^m`.

use std::f64::consts::PI;

use num_complex::Complex;
use qreg::gates::{HADAMARD, to_operator};
use qreg::{
    DenseBackend, ExtendOptions, LinearBackend, NoiseConfig, Operator, ResourceLimits, Result,
    SimError, StateVector, extend_unary, maybe_error,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arith::{ContinuedFraction, Phase, ceil_log2, gcd, mod_mul, mod_pow};

pub const DEFAULT_INITIAL_RADIUS: u64 = 10;
pub const DEFAULT_MAX_RADIUS: u64 = 1 << 20;

/// Budget for the classical period search. The radius bounds both the
/// number of convergents tried and the number of multiples checked; it
/// doubles on every restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodSearch {
    pub initial_radius: u64,
    pub max_radius: u64,
}

impl Default for PeriodSearch {
    fn default() -> Self {
        Self {
            initial_radius: DEFAULT_INITIAL_RADIUS,
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShorOptions {
    /// Fixed base `a`; drawn uniformly from `[1, N)` when absent.
    pub base: Option<u64>,
    /// Main register width; `2·⌈log2 N⌉` when absent.
    pub main_bits: Option<usize>,
    pub verbose: bool,
    pub period_search: PeriodSearch,
    /// Memory budget for the default dense backend.
    pub limits: ResourceLimits,
}

/// Result of a single quantum run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ShorOutcome {
    /// The base already shares a factor with `N`; nothing was simulated.
    Skipped { factors: (u64, u64) },
    Phase(Phase),
}

impl ShorOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, ShorOutcome::Skipped { .. })
    }
}

/// One full pass of run, period extraction and factor guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "camelCase")]
pub enum FactorAttempt {
    /// `factors.0 · factors.1 == N`, both strictly between 1 and `N`.
    Nontrivial {
        factors: (u64, u64),
        phase: Option<Phase>,
        period: Option<u64>,
    },
    /// The guesses were only `1` or `N`; retry with another base.
    Trivial {
        guesses: (u64, u64),
        phase: Phase,
        period: u64,
    },
}

impl FactorAttempt {
    pub fn factors(&self) -> Option<(u64, u64)> {
        match self {
            FactorAttempt::Nontrivial { factors, .. } => Some(*factors),
            FactorAttempt::Trivial { .. } => None,
        }
    }
}

/// Controlled modular multiplication as a basis permutation: basis state
/// `i` moves to `targets[i]`.
#[derive(Debug, Clone)]
struct ModularMultiplier {
    factor: u64,
    targets: Vec<usize>,
}

pub struct Shor<B: LinearBackend = DenseBackend> {
    backend: B,
    target: u64,
    base: u64,
    main_bits: usize,
    ancillary_bits: usize,
    verbose: bool,
    period_search: PeriodSearch,
    hadamards: Operator,
    iqft: Operator,
    multipliers: Vec<ModularMultiplier>,
}

impl Shor<DenseBackend> {
    pub fn new(target: u64, options: ShorOptions, rng: &mut impl Rng) -> Result<Self> {
        let backend = DenseBackend::with_limits(options.limits);
        Self::with_backend(backend, target, options, rng)
    }
}

impl<B: LinearBackend> Shor<B> {
    pub fn with_backend(
        backend: B,
        target: u64,
        options: ShorOptions,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if target < 3 {
            return Err(SimError::invalid_argument(format!(
                "target must be at least 3, got {target}"
            )));
        }
        let base = match options.base {
            Some(base) if (1..target).contains(&base) => base,
            Some(base) => {
                return Err(SimError::invalid_argument(format!(
                    "base {base} is outside [1, {target})"
                )));
            }
            None => rng.gen_range(1..target),
        };
        let ancillary_bits = ceil_log2(target);
        let main_bits = options.main_bits.unwrap_or(2 * ancillary_bits);
        if main_bits == 0 {
            return Err(SimError::invalid_argument(
                "the main register needs at least one qubit",
            ));
        }
        let num_qubits = main_bits.checked_add(ancillary_bits).ok_or_else(|| {
            SimError::invalid_argument(format!("a main register of {main_bits} qubits is too wide"))
        })?;
        backend.register_dim(num_qubits)?;

        let extend = ExtendOptions::targets((0..main_bits).collect::<Vec<_>>()).verbose(options.verbose);
        let hadamards = extend_unary(&backend, &to_operator(&HADAMARD), num_qubits, &extend)?;
        let iqft = backend.kron(
            &inverse_fourier(&backend, main_bits)?,
            &backend.identity(1 << ancillary_bits)?,
        )?;

        let mut shor = Self {
            backend,
            target,
            base,
            main_bits,
            ancillary_bits,
            verbose: options.verbose,
            period_search: options.period_search,
            hadamards,
            iqft,
            multipliers: Vec::new(),
        };
        if gcd(base, target) == 1 {
            shor.multipliers = (0..main_bits)
                .map(|control| shor.multiplier(control))
                .collect::<Result<_>>()?;
        }
        info!(target, base, main_bits, ancillary_bits, "prepared Shor instance");
        Ok(shor)
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn main_bits(&self) -> usize {
        self.main_bits
    }

    pub fn ancillary_bits(&self) -> usize {
        self.ancillary_bits
    }

    pub fn num_qubits(&self) -> usize {
        self.main_bits + self.ancillary_bits
    }

    /// Inverse Fourier transform on the main register, identity on the
    /// ancillary register.
    pub fn iqft(&self) -> &Operator {
        &self.iqft
    }

    /// Dense permutation operator for the multiplication controlled by
    /// main-register qubit `control`. Ancillary values `≥ N` pass through.
    pub fn construct_cu_matrix(&self, control: usize) -> Result<Operator> {
        let multiplier = self.multiplier(control)?;
        let mut op = self.backend.zeros(multiplier.targets.len())?;
        for (column, &row) in multiplier.targets.iter().enumerate() {
            op[(row, column)] = Complex::new(1.0, 0.0);
        }
        Ok(op)
    }

    fn multiplier(&self, control: usize) -> Result<ModularMultiplier> {
        if control >= self.main_bits {
            return Err(SimError::QubitIndex {
                index: control,
                num_qubits: self.main_bits,
            });
        }
        if gcd(self.base, self.target) != 1 {
            return Err(SimError::invalid_argument(format!(
                "base {} shares a factor with {}; multiplication is not invertible",
                self.base, self.target
            )));
        }

        // a^(2^(m-1-c)) by repeated squaring.
        let mut factor = self.base % self.target;
        for _ in 0..(self.main_bits - 1 - control) {
            factor = mod_mul(factor, factor, self.target);
        }

        let num_qubits = self.num_qubits();
        let control_mask = 1usize << (num_qubits - 1 - control);
        let ancilla_mask = (1usize << self.ancillary_bits) - 1;
        let targets = (0..1usize << num_qubits)
            .map(|index| {
                let value = (index & ancilla_mask) as u64;
                if index & control_mask == 0 || value >= self.target {
                    index
                } else {
                    (index & !ancilla_mask) | mod_mul(factor, value, self.target) as usize
                }
            })
            .collect();
        Ok(ModularMultiplier { factor, targets })
    }

    /// One quantum run. A base sharing a factor with `N` short-circuits to
    /// [`ShorOutcome::Skipped`] with the pair `(N / g, g)`.
    pub fn run_algorithm(
        &self,
        noise: Option<&NoiseConfig>,
        rng: &mut impl Rng,
    ) -> Result<ShorOutcome> {
        let shared = gcd(self.base, self.target);
        if shared != 1 {
            info!(base = self.base, shared, "base shares a factor; skipping simulation");
            return Ok(ShorOutcome::Skipped {
                factors: (self.target / shared, shared),
            });
        }

        let mut state = StateVector::basis(self.num_qubits(), 1)?;
        state.apply(&self.backend, &self.hadamards)?;
        for (control, multiplier) in self.multipliers.iter().enumerate() {
            self.inject_noise(&mut state, noise, rng)?;
            state.permute(&multiplier.targets)?;
            if self.verbose {
                debug!(control, factor = multiplier.factor, "applied controlled multiplication");
            }
        }

        let ancilla_mask = (1usize << self.ancillary_bits) - 1;
        let first = state.measure(rng)?;
        state.project(ancilla_mask, first.index & ancilla_mask)?;
        self.inject_noise(&mut state, noise, rng)?;
        state.apply(&self.backend, &self.iqft)?;
        self.inject_noise(&mut state, noise, rng)?;

        let second = state.measure(rng)?;
        let x = (second.index >> self.ancillary_bits) as u64;
        let phase = Phase::new(x, 1 << self.main_bits)?;
        info!(%phase, ancilla = first.index & ancilla_mask, "measured phase");
        Ok(ShorOutcome::Phase(phase))
    }

    /// Recovers a period from a measured phase.
    ///
    /// The first convergent `s/d` with `d < N` lying within `1/(2q)` of the
    /// phase `p/q` gives a candidate `d` (the phase denominator if none
    /// qualifies); the smallest multiple `i·d` with `a^(i·d) ≡ 1 (mod N)` is
    /// the period. Both searches are bounded by the current radius.
    pub fn get_period(&self, phase: Phase) -> Result<u64> {
        let expansion = ContinuedFraction::from(phase);
        let (p, q) = (i128::from(phase.numerator()), i128::from(phase.denominator()));
        let mut radius = self.period_search.initial_radius.max(1);
        loop {
            let candidate = expansion
                .convergents()
                .take(usize::try_from(radius).unwrap_or(usize::MAX))
                .find(|c| {
                    let (s, d) = (i128::from(c.numerator), i128::from(c.denominator));
                    // |p/q - s/d| < 1/(2q)  ⇔  2|p·d - s·q| < d
                    c.denominator < self.target && 2 * (p * d - s * q).abs() < d
                })
                .map_or(phase.denominator(), |c| c.denominator);

            let period = (1..=radius)
                .map_while(|i| candidate.checked_mul(i))
                .find(|&period| mod_pow(self.base, period, self.target) == 1);
            if let Some(period) = period {
                debug!(%phase, candidate, period, radius, "found period");
                return Ok(period);
            }

            if radius >= self.period_search.max_radius {
                return Err(SimError::NonConvergence { radius });
            }
            radius = radius.saturating_mul(2).min(self.period_search.max_radius);
            debug!(%phase, radius, "widening period search");
        }
    }

    /// `gcd(a^(r/2) − 1, N)` and `gcd(a^(r/2) + 1, N)`.
    pub fn get_factors(&self, period: u64) -> (u64, u64) {
        let half = mod_pow(self.base, period / 2, self.target);
        (
            gcd((half + self.target - 1) % self.target, self.target),
            gcd((half + 1) % self.target, self.target),
        )
    }

    /// Runs the algorithm once and classifies the result. Failed attempts
    /// are reported, never retried.
    pub fn attempt(&self, noise: Option<&NoiseConfig>, rng: &mut impl Rng) -> Result<FactorAttempt> {
        let phase = match self.run_algorithm(noise, rng)? {
            ShorOutcome::Skipped { factors } => {
                return Ok(FactorAttempt::Nontrivial {
                    factors: ordered(factors),
                    phase: None,
                    period: None,
                });
            }
            ShorOutcome::Phase(phase) => phase,
        };
        let period = self.get_period(phase)?;
        let guesses = self.get_factors(period);
        let attempt = match [guesses.0, guesses.1]
            .into_iter()
            .find(|&f| 1 < f && f < self.target)
        {
            Some(factor) => FactorAttempt::Nontrivial {
                factors: ordered((factor, self.target / factor)),
                phase: Some(phase),
                period: Some(period),
            },
            None => FactorAttempt::Trivial {
                guesses,
                phase,
                period,
            },
        };
        info!(base = self.base, period, ?guesses, "factor attempt finished");
        Ok(attempt)
    }

    fn inject_noise(
        &self,
        state: &mut StateVector,
        noise: Option<&NoiseConfig>,
        rng: &mut impl Rng,
    ) -> Result<()> {
        if let Some(error) = maybe_error(&self.backend, self.num_qubits(), noise, rng)? {
            state.apply(&self.backend, &error)?;
        }
        Ok(())
    }
}

fn ordered((a, b): (u64, u64)) -> (u64, u64) {
    (a.min(b), a.max(b))
}

/// `F[i][j] = ω^(ij) / √M` with `ω = e^(-2πi/M)`, `M = 2^bits`.
fn inverse_fourier<B: LinearBackend>(backend: &B, bits: usize) -> Result<Operator> {
    let dim = 1usize << bits;
    let mut op = backend.zeros(dim)?;
    let scale = 1.0 / (dim as f64).sqrt();
    for i in 0..dim {
        for j in 0..dim {
            // Reduce the exponent first to keep the angle small.
            let turns = ((i * j) % dim) as f64 / dim as f64;
            op[(i, j)] = Complex::from_polar(scale, -2.0 * PI * turns);
        }
    }
    Ok(op)
}

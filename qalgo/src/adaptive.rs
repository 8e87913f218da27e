//! Extremum finding without a known solution count (Dürr–Høyer).
//!
//! Starting from a random index, each round runs a Grover search for
//! entries strictly better than the current best, with a random iteration
//! count in `[1, ⌈m⌉]`. A measured improvement replaces the best index and
//! resets the failure counter. The iteration ceiling `m` grows by
//! `scaling` every round, capped at `√(2ⁿ)`. The search stops once
//! `threshold` consecutive rounds fail to improve.

use qreg::{DenseBackend, LinearBackend, NoiseConfig, ResourceLimits, Result, SimError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::grover::{Grover, GroverOptions, database_width};

pub const DEFAULT_SCALING: f64 = 1.34;
pub const DEFAULT_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extremum {
    Minimum,
    #[default]
    Maximum,
}

impl Extremum {
    /// Whether `candidate` strictly improves on `current`.
    pub fn improves<T: PartialOrd>(self, candidate: &T, current: &T) -> bool {
        match self {
            Extremum::Minimum => candidate < current,
            Extremum::Maximum => candidate > current,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveSearch {
    /// Consecutive non-improving rounds before giving up.
    pub threshold: usize,
    pub scaling: f64,
    pub extremum: Extremum,
    pub noise: Option<NoiseConfig>,
    pub limits: ResourceLimits,
}

impl Default for AdaptiveSearch {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            scaling: DEFAULT_SCALING,
            extremum: Extremum::default(),
            noise: None,
            limits: ResourceLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveOutcome {
    /// Believed index of the extremal entry.
    pub index: usize,
    pub rounds: usize,
    pub improvements: usize,
}

impl AdaptiveSearch {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn extremum(mut self, extremum: Extremum) -> Self {
        self.extremum = extremum;
        self
    }

    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = Some(noise);
        self
    }

    pub fn find<T: PartialOrd>(&self, database: &[T], rng: &mut impl Rng) -> Result<AdaptiveOutcome> {
        self.find_with_backend(DenseBackend::with_limits(self.limits), database, rng)
    }

    pub fn find_with_backend<B, T>(
        &self,
        backend: B,
        database: &[T],
        rng: &mut impl Rng,
    ) -> Result<AdaptiveOutcome>
    where
        B: LinearBackend,
        T: PartialOrd,
    {
        if database.is_empty() {
            return Err(SimError::invalid_argument("cannot search an empty database"));
        }
        if !self.scaling.is_finite() || self.scaling < 1.0 {
            return Err(SimError::invalid_argument(format!(
                "scaling factor must be at least 1, got {}",
                self.scaling
            )));
        }

        let mut best = rng.gen_range(0..database.len());
        let mut outcome = AdaptiveOutcome {
            index: best,
            rounds: 0,
            improvements: 0,
        };
        if self.threshold == 0 {
            return Ok(outcome);
        }

        let num_qubits = database_width(database.len());
        let ceiling = ((1u64 << num_qubits) as f64).sqrt();
        let options = GroverOptions {
            verbose: false,
            limits: self.limits,
        };
        let mut grover = Grover::with_backend(
            backend,
            improves_on(database, best, self.extremum),
            num_qubits,
            options,
        )?;

        let mut m: f64 = 1.0;
        let mut failures = 0;
        while failures < self.threshold {
            let iterations = rng.gen_range(1..=m.ceil() as usize);
            let measured = grover.sample(iterations, self.noise.as_ref(), rng)?;
            outcome.rounds += 1;

            let improved = database
                .get(measured.index)
                .is_some_and(|candidate| self.extremum.improves(candidate, &database[best]));
            if improved {
                debug!(from = best, to = measured.index, iterations, "improved");
                best = measured.index;
                outcome.improvements += 1;
                failures = 0;
                grover.set_oracle(improves_on(database, best, self.extremum))?;
            } else {
                failures += 1;
            }
            m = (self.scaling * m).min(ceiling);
        }

        outcome.index = best;
        info!(
            index = outcome.index,
            rounds = outcome.rounds,
            improvements = outcome.improvements,
            "adaptive search finished"
        );
        Ok(outcome)
    }
}

/// Oracle marking the entries that beat `database[best]`. Indices past the
/// end of the database get no answer.
fn improves_on<T: PartialOrd>(
    database: &[T],
    best: usize,
    extremum: Extremum,
) -> impl Fn(usize) -> Option<bool> + '_ {
    let current = &database[best];
    move |index| {
        database
            .get(index)
            .map(|candidate| extremum.improves(candidate, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn empty_database_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let empty: [u32; 0] = [];
        let err = AdaptiveSearch::new(3).find(&empty, &mut rng).unwrap_err();
        assert!(matches!(err, SimError::InvalidArgument(_)));
    }

    #[test]
    fn bad_scaling_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let search = AdaptiveSearch {
            scaling: 0.5,
            ..AdaptiveSearch::default()
        };
        assert!(search.find(&[1, 2, 3], &mut rng).is_err());
    }

    #[test]
    fn zero_threshold_returns_the_random_start() {
        let mut rng = StdRng::seed_from_u64(4);
        let database = [5, 3, 9, 1];
        let outcome = AdaptiveSearch::new(0).find(&database, &mut rng).unwrap();
        assert_eq!(outcome.rounds, 0);
        assert_eq!(outcome.improvements, 0);
        assert!(outcome.index < database.len());
    }

    #[test]
    fn single_entry_database_terminates_immediately_after_threshold() {
        let mut rng = StdRng::seed_from_u64(8);
        let outcome = AdaptiveSearch::new(3).find(&[42], &mut rng).unwrap();
        assert_eq!(outcome.index, 0);
        // Nothing can improve on the only entry.
        assert_eq!(outcome.rounds, 3);
        assert_eq!(outcome.improvements, 0);
    }

    #[test]
    fn improvement_comparisons() {
        assert!(Extremum::Maximum.improves(&5, &3));
        assert!(!Extremum::Maximum.improves(&3, &3));
        assert!(Extremum::Minimum.improves(&1.5, &2.0));
        assert!(!Extremum::Minimum.improves(&2.0, &1.5));
    }

    #[test]
    fn oracle_skips_indices_past_the_end() {
        let database = [3, 7, 1];
        let oracle = improves_on(&database, 0, Extremum::Maximum);
        assert_eq!(oracle(1), Some(true));
        assert_eq!(oracle(2), Some(false));
        assert_eq!(oracle(3), None);
    }

    #[test]
    fn high_threshold_finds_both_extremes() {
        let database = [12, 4, 31, 8, 27, 1, 19, 22];
        let mut rng = StdRng::seed_from_u64(21);
        let mut max_hits = 0;
        let mut min_hits = 0;
        for _ in 0..20 {
            if AdaptiveSearch::new(10).find(&database, &mut rng).unwrap().index == 2 {
                max_hits += 1;
            }
            let minimum = AdaptiveSearch::new(10).extremum(Extremum::Minimum);
            if minimum.find(&database, &mut rng).unwrap().index == 5 {
                min_hits += 1;
            }
        }
        assert!(max_hits >= 15, "maximum found {max_hits}/20 times");
        assert!(min_hits >= 15, "minimum found {min_hits}/20 times");
    }
}

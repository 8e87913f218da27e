use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use qalgo::events::{AdaptiveInfo, GroverInfo, RunStartInfo, ShorAttemptInfo};
use qalgo::{
    AdaptiveSearch, Event, Extremum, FactorAttempt, Grover, GroverOptions, RunConfig, Shor,
    ShorOptions, emit_event, optimal_iterations, success_probability,
};
use qreg::{NoiseConfig, Outcome, sample_counts};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{info, warn};

/// Simulates Grover search, adaptive extremum search and Shor factoring on a
/// classical model of a qubit register
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with the noise model and memory budget.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the random number generator. A fresh seed is drawn (and
    /// reported) if not provided.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// The output file to write JSON events to. If not provided, writes to stdout.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fixed-iteration Grover search for one marked basis state.
    Grover {
        #[arg(long)]
        qubits: usize,
        #[arg(long)]
        marked: usize,
        /// Defaults to ⌊π/4·√(2^qubits)⌋.
        #[arg(long)]
        iterations: Option<usize>,
        #[arg(long, default_value_t = 100)]
        shots: u32,
    },
    /// Extremum search over a shuffled database of distinct values.
    Adaptive {
        #[arg(long)]
        qubits: usize,
        #[arg(long, default_value_t = qalgo::adaptive::DEFAULT_THRESHOLD)]
        threshold: usize,
        /// Search for the minimum instead of the maximum.
        #[arg(long)]
        minimum: bool,
        /// Database size, at most 2^qubits (the default). The register is
        /// sized to the database, with unused basis states left unmarked.
        #[arg(long)]
        entries: Option<usize>,
    },
    /// Factor a composite with Shor's algorithm, retrying with new bases.
    Shor {
        #[arg(long)]
        target: u64,
        /// Fixed base; a random base is drawn per attempt otherwise.
        #[arg(long)]
        base: Option<u64>,
        #[arg(long)]
        main_bits: Option<usize>,
        #[arg(long, default_value_t = 10)]
        attempts: usize,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = RunConfig::from_json(&json)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    info!(seed, "starting a qalgo run");

    // Determine the output writer (file or stdout)
    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let algorithm = match &cli.command {
        Command::Grover { .. } => "grover",
        Command::Adaptive { .. } => "adaptive",
        Command::Shor { .. } => "shor",
    };
    emit_event(
        &Event::RunStart(RunStartInfo {
            algorithm: algorithm.to_string(),
            seed,
            noisy: config.noise.is_some(),
        }),
        &mut writer,
    )?;

    let event = match cli.command {
        Command::Grover {
            qubits,
            marked,
            iterations,
            shots,
        } => run_grover(&config, qubits, marked, iterations, shots, &mut rng)?,
        Command::Adaptive {
            qubits,
            threshold,
            minimum,
            entries,
        } => {
            let extremum = if minimum { Extremum::Minimum } else { Extremum::Maximum };
            run_adaptive(&config, qubits, threshold, extremum, entries, &mut rng)?
        }
        Command::Shor {
            target,
            base,
            main_bits,
            attempts,
        } => {
            run_shor(&config, target, base, main_bits, attempts, &mut rng, &mut writer)?;
            None
        }
    };
    if let Some(event) = event {
        emit_event(&event, &mut writer)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_grover(
    config: &RunConfig,
    qubits: usize,
    marked: usize,
    iterations: Option<usize>,
    shots: u32,
    rng: &mut StdRng,
) -> Result<Option<Event>> {
    if qubits == 0 || qubits >= usize::BITS as usize || marked >= 1 << qubits {
        bail!("marked index {marked} is outside a {qubits}-qubit register");
    }
    let options = GroverOptions {
        verbose: false,
        limits: config.limits,
    };
    let grover = Grover::new(|i| Some(i == marked), qubits, options)?;
    let iterations = iterations.unwrap_or_else(|| optimal_iterations(qubits, 1));
    let noise = config.noise.as_ref();

    let state = grover.search(iterations, noise, rng)?;
    let probability = success_probability(&state, |i| i == marked);
    // Noiseless runs all end in the same state; noisy runs are re-simulated
    // shot by shot.
    let counts = match noise {
        None => sample_counts(&state.amplitudes, shots, rng)?,
        Some(_) => {
            let mut counts = std::collections::BTreeMap::new();
            for _ in 0..shots {
                let outcome = grover.sample(iterations, noise, rng)?;
                *counts.entry(outcome.bitstring()).or_insert(0) += 1;
            }
            counts
        }
    };
    let target = Outcome {
        index: marked,
        width: qubits,
    }
    .bitstring();
    let hits = counts.get(&target).copied().unwrap_or(0);
    info!(hits, shots, probability, "grover run complete");

    Ok(Some(Event::GroverResult(GroverInfo {
        num_qubits: qubits,
        marked,
        iterations,
        success_probability: probability,
        shots,
        hits,
        counts,
    })))
}

fn run_adaptive(
    config: &RunConfig,
    qubits: usize,
    threshold: usize,
    extremum: Extremum,
    entries: Option<usize>,
    rng: &mut StdRng,
) -> Result<Option<Event>> {
    if qubits == 0 || qubits >= usize::BITS as usize {
        bail!("cannot build a database for a {qubits}-qubit register");
    }
    let size = entries.unwrap_or(1 << qubits);
    if size == 0 || size > 1 << qubits {
        bail!("database size {size} does not fit a {qubits}-qubit register");
    }
    let mut database: Vec<u64> = (1..=size as u64).collect();
    database.shuffle(rng);

    let search = AdaptiveSearch {
        threshold,
        extremum,
        noise: config.noise,
        limits: config.limits,
        ..AdaptiveSearch::default()
    };
    let outcome = search.find(&database, rng)?;
    let expected = match extremum {
        Extremum::Minimum => 1,
        Extremum::Maximum => size as u64,
    };
    let found_extremum = database[outcome.index] == expected;
    info!(index = outcome.index, found_extremum, "adaptive run complete");

    Ok(Some(Event::AdaptiveResult(AdaptiveInfo {
        database_size: size,
        threshold,
        extremum,
        outcome,
        found_extremum,
    })))
}

fn run_shor(
    config: &RunConfig,
    target: u64,
    base: Option<u64>,
    main_bits: Option<usize>,
    attempts: usize,
    rng: &mut StdRng,
    writer: &mut impl Write,
) -> Result<()> {
    let noise: Option<&NoiseConfig> = config.noise.as_ref();
    let options = ShorOptions {
        base,
        main_bits,
        limits: config.limits,
        ..ShorOptions::default()
    };
    // A fixed base only needs its operators built once.
    let fixed = match base {
        Some(_) => Some(Shor::new(target, options.clone(), rng)?),
        None => None,
    };

    for attempt in 1..=attempts {
        let fresh;
        let shor = match &fixed {
            Some(shor) => shor,
            None => {
                fresh = Shor::new(target, options.clone(), rng)?;
                &fresh
            }
        };
        let result = match shor.attempt(noise, rng) {
            Ok(result) => result,
            Err(err) if err.is_recoverable() => {
                warn!(attempt, base = shor.base(), %err, "attempt failed; retrying");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        emit_event(
            &Event::ShorAttempt(ShorAttemptInfo {
                attempt,
                target,
                base: shor.base(),
                result,
            }),
            writer,
        )?;
        if let FactorAttempt::Nontrivial { factors, .. } = result {
            info!(attempt, ?factors, "factored {target}");
            return Ok(());
        }
    }
    bail!("no non-trivial factor of {target} found in {attempts} attempts")
}

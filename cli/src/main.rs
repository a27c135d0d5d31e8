//! `lostfind` CLI: simulated search campaigns, one-off queries and updates
//! against a saved suggester state, grid search.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use search_core::{DVec, NonFinitePolicy, Suggester, SuggesterConfig};
use sim::scenarios::{Scenario, ScenarioKind};
use sim::{load_snapshot, save_snapshot, LostItemSimulator};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lostfind", about = "Suggest where a lost item is most likely to be")]
struct Cli {
    /// Evaluate ensemble samples one by one instead of on the thread pool
    #[arg(long, global = true)]
    sequential: bool,
    /// Fail an update whose marginal likelihood is zero instead of storing
    /// non-finite densities
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate lost-item episodes and learn the miss probabilities from
    /// every found position.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Size of the miss-probability ensemble
        #[arg(long, default_value_t = 500)]
        samples: usize,
        /// Number of simulated episodes
        #[arg(long, default_value_t = 100)]
        episodes: usize,
        /// Output summary metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Save the final suggester state
        #[arg(long)]
        save_state: Option<PathBuf>,
    },
    /// Print the predictive density at a point.
    Suggest {
        /// Suggester state file
        #[arg(long)]
        state: PathBuf,
        /// Query point, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        at: Vec<f32>,
    },
    /// Apply one observation and write the state back.
    Update {
        /// Suggester state file (rewritten in place)
        #[arg(long)]
        state: PathBuf,
        /// Observed position, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        at: Vec<f32>,
    },
    /// Find the most promising point of a regular grid.
    Grid {
        /// Suggester state file
        #[arg(long)]
        state: PathBuf,
        /// Lower grid corner, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        min: Vec<f32>,
        /// Upper grid corner, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        max: Vec<f32>,
        /// Points per axis
        #[arg(long, default_value_t = 50)]
        steps: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = SuggesterConfig {
        parallel: !cli.sequential,
        non_finite: if cli.strict {
            NonFinitePolicy::Reject
        } else {
            NonFinitePolicy::Propagate
        },
    };

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            samples,
            episodes,
            output,
            save_state,
        } => {
            run_scenario(
                scenario,
                seed,
                samples,
                episodes,
                config,
                output.as_deref(),
                save_state.as_deref(),
            )?;
        }
        Commands::Suggest { state, at } => run_suggest(&state, &at, config)?,
        Commands::Update { state, at } => run_update(&state, &at, config)?,
        Commands::Grid {
            state,
            min,
            max,
            steps,
        } => run_grid(&state, &min, &max, steps, config)?,
    }

    Ok(())
}

fn load_suggester(path: &Path, config: SuggesterConfig) -> Result<Suggester> {
    let snapshot = load_snapshot(path)?;
    Suggester::from_snapshot(&snapshot, config)
        .with_context(|| format!("invalid suggester state in {}", path.display()))
}

fn format_vec(v: &DVec) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.3}")).collect();
    format!("[{}]", parts.join(", "))
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    samples: usize,
    episodes: usize,
    config: SuggesterConfig,
    output_path: Option<&Path>,
    state_path: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind);
    let mut suggester = Suggester::from_snapshot(&scenario.initial_snapshot(samples, seed), config)?;
    let mut simulator = LostItemSimulator::new(scenario.clone(), seed.wrapping_add(1))?;

    println!(
        "Running scenario '{}' (seed={}, samples={}, episodes={})...",
        scenario.name, seed, samples, episodes
    );

    let start = std::time::Instant::now();
    let mut found = 0usize;
    let mut log_score = 0.0f64;

    for episode in 0..episodes {
        let Some(item) = simulator.episode() else {
            tracing::info!(episode, "item never lost");
            continue;
        };
        let x = DVec::from_iterator(2, item.position.iter().map(|&v| v as f32));

        // `update` returns the predictive density at x before the update.
        let density = suggester.update(&x)?;
        found += 1;
        log_score += f64::from(density).ln();
        tracing::info!(
            episode,
            state = %scenario.states[item.state].name,
            moves = item.moves,
            density,
            "item found"
        );
    }

    let elapsed = start.elapsed();
    let posterior = suggester.posterior_mean_miss()?;
    let weights = suggester.expected_weights()?;
    let ess = suggester.ensemble().effective_sample_size();
    let mean_log_density = (found > 0).then(|| log_score / found as f64);

    println!(
        "Done: {} items found, mean log predictive density={:.3}, ESS={:.1}/{}, elapsed={:.2}s",
        found,
        mean_log_density.unwrap_or(f64::NAN),
        ess,
        suggester.n_samples(),
        elapsed.as_secs_f64(),
    );
    println!("{:<10} {:>10} {:>10} {:>10}", "state", "true miss", "posterior", "weight");
    for (i, state) in scenario.states.iter().enumerate() {
        println!(
            "{:<10} {:>10.3} {:>10.3} {:>10.3}",
            state.name, scenario.true_miss[i], posterior[i], weights[i]
        );
    }

    if let Some(spath) = state_path {
        save_snapshot(&suggester.snapshot(), spath)?;
        println!("State saved to {}", spath.display());
    }

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "scenario": scenario.name,
            "seed": seed,
            "samples": samples,
            "episodes": episodes,
            "found": found,
            "mean_log_density": mean_log_density,
            "effective_sample_size": ess,
            "true_miss": scenario.true_miss,
            "posterior_miss": posterior.iter().collect::<Vec<_>>(),
            "expected_weights": weights.iter().collect::<Vec<_>>(),
            "elapsed_s": elapsed.as_secs_f64(),
        });
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
        println!("Metrics saved to {}", opath.display());
    }

    Ok(())
}

fn run_suggest(path: &Path, at: &[f32], config: SuggesterConfig) -> Result<()> {
    let suggester = load_suggester(path, config)?;
    let x = DVec::from_row_slice(at);
    let density = suggester.suggest(&x)?;
    let weights = suggester.expected_weights()?;
    println!("density at {} = {:.6e}", format_vec(&x), density);
    println!("expected state weights {}", format_vec(&weights));
    Ok(())
}

fn run_update(path: &Path, at: &[f32], config: SuggesterConfig) -> Result<()> {
    let mut suggester = load_suggester(path, config)?;
    let x = DVec::from_row_slice(at);
    let normalizer = suggester.update(&x)?;
    save_snapshot(&suggester.snapshot(), path)?;
    println!(
        "updated at {}: marginal likelihood={:.6e}, ESS={:.1}/{}",
        format_vec(&x),
        normalizer,
        suggester.ensemble().effective_sample_size(),
        suggester.n_samples()
    );
    Ok(())
}

/// All points of a regular `steps^D` grid spanning `[min, max]`.
fn grid_points(min: &[f32], max: &[f32], steps: usize) -> Result<Vec<DVec>> {
    if min.len() != max.len() {
        bail!("grid corners differ in dimension ({} vs {})", min.len(), max.len());
    }
    if steps < 2 {
        bail!("a grid needs at least 2 steps per axis, got {steps}");
    }
    let dim = min.len();
    let total = steps
        .checked_pow(dim as u32)
        .filter(|&t| t <= 10_000_000)
        .context("grid too large")?;

    let axis = |d: usize, k: usize| min[d] + (max[d] - min[d]) * k as f32 / (steps - 1) as f32;
    Ok((0..total)
        .map(|mut idx| {
            DVec::from_iterator(
                dim,
                (0..dim).map(|d| {
                    let k = idx % steps;
                    idx /= steps;
                    axis(d, k)
                }),
            )
        })
        .collect())
}

fn run_grid(path: &Path, min: &[f32], max: &[f32], steps: usize, config: SuggesterConfig) -> Result<()> {
    let suggester = load_suggester(path, config)?;
    let points = grid_points(min, max, steps)?;
    match suggester.best_of(&points)? {
        Some((best, density)) => println!(
            "best of {} grid points: {} (density {:.6e})",
            points.len(),
            format_vec(&points[best]),
            density
        ),
        None => println!("no grid point has a finite density"),
    }
    Ok(())
}

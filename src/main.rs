use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sku_forecast::config::SimulationConfig;
use sku_forecast::loader::{self, SkuPaths};
use sku_forecast::orchestrator::{SimulationOrchestrator, SimulationReport};
use sku_forecast::output;
use sku_forecast::probability::{
    sensitivity_analysis, PriceProbabilityModel, SENSITIVITY_DAYS, SENSITIVITY_PRICES,
};
use sku_forecast::rng::StdRandom;
use sku_forecast::Result;

#[derive(Parser)]
#[command(name = "sku-forecast", about = "ABC-refined daily price simulator for retail SKUs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Simulation config (TOML)
    #[arg(long, default_value = "simulation.toml")]
    config: PathBuf,

    /// SKU to simulate (overrides config)
    #[arg(long)]
    sku: Option<String>,

    /// Snapshot date, YYYY-MM-DD (overrides config)
    #[arg(long)]
    date: Option<String>,

    /// Random seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Outer iterations (overrides config)
    #[arg(long)]
    iterations: Option<usize>,

    /// ABC trials per iteration (overrides config)
    #[arg(long)]
    trials: Option<usize>,

    /// Run refinement trials in parallel
    #[arg(long)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a single SKU
    Run(RunArgs),

    /// Simulate every sku_* directory under the input dir
    RunAll(RunArgs),

    /// Print the probability model over a price x day grid
    Sensitivity(RunArgs),
}

fn load_config(args: &RunArgs) -> Result<SimulationConfig> {
    let mut config = SimulationConfig::from_toml(&args.config)?;
    if let Some(sku) = &args.sku {
        config.sku = sku.clone();
    }
    if let Some(date) = &args.date {
        config.day_for_simulate = date.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(n) = args.iterations {
        config.number_of_iterations = n;
    }
    if let Some(n) = args.trials {
        config.number_of_refinement_trials = n;
    }
    if args.parallel {
        config.parallel_trials = true;
    }
    config.validate()?;
    Ok(config)
}

fn paths_for(config: &SimulationConfig) -> SkuPaths {
    SkuPaths::new(
        &config.input_dir,
        &config.output_dir,
        &config.sku,
        &config.day_for_simulate,
    )
}

fn run_sku(config: &SimulationConfig) -> Result<SimulationReport> {
    let paths = paths_for(config);
    info!(sku = %config.sku, date = %config.day_for_simulate, "preparing simulation");

    let inputs = loader::load_inputs(&paths)?;
    let mut orchestrator = SimulationOrchestrator::new(
        config.clone(),
        inputs.sku,
        inputs.history,
        &inputs.normalized_features,
        inputs.stats,
    )?
    .with_raw_features(inputs.raw_features);

    let bar = ProgressBar::new(config.number_of_iterations as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} iterations {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let mut rng = StdRandom::new(config.seed);
    let report = orchestrator.run_with(&mut rng, |record| {
        bar.set_message(format!("distance={:.4}", record.distance));
        bar.inc(1);
    });
    bar.finish_and_clear();

    output::save_all(&report, config, &paths)?;
    info!(
        sku = %report.sku,
        accepted = report.accepted_simulations,
        output = %paths.output_dir.display(),
        "simulation completed"
    );
    Ok(report)
}

fn run_sensitivity(config: &SimulationConfig) -> Result<()> {
    let inputs = loader::load_inputs(&paths_for(config))?;
    let model = PriceProbabilityModel::new(&inputs.history);
    let mut rng = StdRandom::new(config.seed);
    let grid = sensitivity_analysis(
        &model,
        &inputs.sku,
        &SENSITIVITY_PRICES,
        &SENSITIVITY_DAYS,
        &mut rng,
    );
    for point in grid {
        println!(
            "Price: {}, Day: {}, Probability: {:.6}",
            point.price, point.day, point.probability
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => load_config(&args).and_then(|config| run_sku(&config).map(|_| ())),

        Commands::RunAll(args) => load_config(&args).and_then(|config| {
            let skus = loader::discover_skus(&config.input_dir)?;
            info!(count = skus.len(), "running all SKUs");
            for sku in skus {
                let config = SimulationConfig {
                    sku: sku.clone(),
                    ..config.clone()
                };
                if let Err(e) = run_sku(&config) {
                    error!(sku = %sku, error = %e, "simulation failed, skipping");
                }
            }
            Ok(())
        }),

        Commands::Sensitivity(args) => load_config(&args).and_then(|config| run_sensitivity(&config)),
    };

    if let Err(e) = result {
        error!(error = %e, "run failed");
        std::process::exit(1);
    }
}

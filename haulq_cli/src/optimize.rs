use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Args, ValueEnum};
use haulq_optimizer::{
    json::report::JsonOptimizationReport,
    objective::objective::Objective,
    solver::{
        solver::Solver,
        solver_params::{SearchStrategy, Termination, Threads},
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::{file_utils, parsers, report};

#[derive(Clone, Copy, ValueEnum)]
pub enum Strategy {
    Auto,
    Grid,
    CoordinateDescent,
    MonteCarlo,
}

impl From<Strategy> for SearchStrategy {
    fn from(value: Strategy) -> Self {
        match value {
            Strategy::Auto => SearchStrategy::Auto,
            Strategy::Grid => SearchStrategy::Grid,
            Strategy::CoordinateDescent => SearchStrategy::CoordinateDescent,
            Strategy::MonteCarlo => SearchStrategy::MonteCarlo,
        }
    }
}

#[derive(Args)]
pub struct OptimizeArgs {
    /// Scenario file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Timeout for the search (e.g., "30s", "5m", "PT1H30M")
    #[arg(short, long, value_parser = parsers::parse_duration)]
    timeout: Option<jiff::SignedDuration>,

    /// Evaluation threads, 0 for one per core. Falls back to HAULQ_THREADS.
    #[arg(long)]
    threads: Option<usize>,

    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Spacing of candidate offsets (e.g., "15m")
    #[arg(long, value_parser = parsers::parse_duration)]
    step: Option<jiff::SignedDuration>,

    #[arg(long)]
    seed: Option<u64>,

    /// Writes the optimization report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Includes every evaluated offset vector in the JSON report
    #[arg(long)]
    trace: bool,
}

fn threads_from_env() -> Option<usize> {
    std::env::var("HAULQ_THREADS").ok()?.parse().ok()
}

pub fn run(args: OptimizeArgs) -> Result<(), anyhow::Error> {
    info!("Optimizing scenario {:?}", args.scenario);
    let scenario = file_utils::read_scenario(&args.scenario)?;
    let problem = Arc::new(scenario.build_problem()?);

    let mut params = scenario.solver;
    if let Some(timeout) = args.timeout {
        params
            .terminations
            .retain(|termination| !matches!(termination, Termination::Duration(_)));
        params.terminations.push(Termination::Duration(timeout));
    }
    if let Some(threads) = args.threads.or_else(threads_from_env) {
        params.threads = match threads {
            0 => Threads::Auto,
            1 => Threads::Single,
            threads => Threads::Multi(threads),
        };
    }
    if let Some(strategy) = args.strategy {
        params.strategy = strategy.into();
    }
    if let Some(step) = args.step {
        params.step = step;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }

    let objective = Arc::new(Objective::new(
        problem.clone(),
        scenario.simulation,
        scenario.objective,
    )?);
    let mut solver = Solver::new(objective.clone(), params);

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner().template("{spinner} [{elapsed}] {msg}")?);
    bar.enable_steady_tick(Duration::from_millis(120));

    let best_bar = bar.clone();
    solver.on_best_solution(move |best| {
        best_bar.set_message(format!("best cost {:.3}", best.score.cost));
    });

    let outcome = solver.solve()?;
    bar.finish_and_clear();

    let best = objective.evaluate(&outcome.best.offsets)?;

    println!("{}", report::score_table(&outcome));
    println!("{}", report::offsets_table(&outcome, &problem));
    println!("{}", report::site_table(&best.kpis));
    println!("{}", report::contractor_table(&best.kpis));

    info!(
        evaluations = outcome.evaluations,
        "Improvement over baseline: {:.1}%",
        outcome.improvement() * 100.0
    );

    if let Some(output) = args.output {
        let report = JsonOptimizationReport::new(&outcome, &best.kpis, &problem, args.trace);
        file_utils::write_json(&output, &report)?;
        info!("Report written to {}", output.display());
    }

    Ok(())
}

use std::{path::PathBuf, sync::Arc};

use clap::{Args, ValueEnum};
use haulq_optimizer::{
    json::report::{FromProblem, JsonSimulationReport},
    objective::objective::Objective,
    simulation::simulation_config::QueueModel,
};
use jiff::SignedDuration;
use tracing::{info, warn};

use crate::{file_utils, parsers, report};

#[derive(Clone, Copy, ValueEnum)]
pub enum Model {
    Bucketed,
    EventDriven,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Offset of one contractor, e.g. `B=+30m`. Others keep their current offset.
    #[arg(long = "offset", value_parser = parsers::parse_offset)]
    offsets: Vec<(String, SignedDuration)>,

    #[arg(long, value_enum)]
    model: Option<Model>,

    /// Writes the KPIs and per-bucket series as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: SimulateArgs) -> Result<(), anyhow::Error> {
    let scenario = file_utils::read_scenario(&args.scenario)?;
    let problem = Arc::new(scenario.build_problem()?);

    let mut config = scenario.simulation;
    if let Some(model) = args.model {
        config.queue_model = match model {
            Model::Bucketed => QueueModel::Bucketed,
            Model::EventDriven => QueueModel::EventDriven,
        };
    }

    let offsets = problem.offsets_with(
        args.offsets
            .iter()
            .map(|(contractor, offset)| (contractor.as_str(), *offset)),
    )?;
    let objective = Objective::new(problem.clone(), config, scenario.objective)?;
    let evaluation = objective.evaluate(&offsets)?;

    if !evaluation.kpis.has_data {
        warn!("Scenario has no trips, every KPI is zero");
    }

    println!("{}", report::site_table(&evaluation.kpis));
    println!("{}", report::contractor_table(&evaluation.kpis));
    info!(
        cost = evaluation.score.cost,
        "Fleet average dump wait {:.1} min, load wait {:.1} min",
        evaluation.score.dump_wait_minutes,
        evaluation.score.load_wait_minutes
    );

    if let Some(output) = args.output {
        let report = JsonSimulationReport::from_problem(&evaluation, &problem);
        file_utils::write_json(&output, &report)?;
        info!("Simulation written to {}", output.display());
    }

    Ok(())
}

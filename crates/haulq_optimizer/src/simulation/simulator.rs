use rand::{SeedableRng, rngs::SmallRng};
use serde::Serialize;
use tracing::instrument;

use crate::{
    error::HaulError,
    problem::{
        haul_problem::HaulProblem, horizon::TimeBucket, offset_vector::OffsetVector,
        site::SiteIdx,
    },
};

use super::{
    arrivals::{ArrivalTable, SiteArrivals, build_arrivals},
    bucket_grid::BucketGrid,
    bucket_queue::simulate_buckets,
    event_queue::simulate_events,
    service_sampler::{FixedService, PerturbedService, ServiceSampler, site_stream_seed},
    simulation_config::{QueueModel, SimulationConfig, Variability},
    site_series::SiteSeries,
};

/// Queue state of every site for one offset vector.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub buckets: Vec<TimeBucket>,
    pub sites: Vec<SiteSeries>,
}

impl SimulationResult {
    pub fn site(&self, site: SiteIdx) -> &SiteSeries {
        &self.sites[site.get()]
    }

    pub fn excluded_arrivals(&self) -> usize {
        self.sites.iter().map(|series| series.excluded_arrivals).sum()
    }
}

#[instrument(skip_all, level = "trace")]
pub fn simulate(
    problem: &HaulProblem,
    offsets: &OffsetVector,
    config: &SimulationConfig,
) -> Result<SimulationResult, HaulError> {
    config.validate()?;
    let grid = BucketGrid::for_problem(problem, config.bucket_width)?;
    let arrivals = build_arrivals(problem, offsets, &grid, config.horizon_policy)?;

    Ok(simulate_arrivals(problem, &arrivals, &grid, config))
}

pub fn simulate_arrivals(
    problem: &HaulProblem,
    arrivals: &ArrivalTable,
    grid: &BucketGrid,
    config: &SimulationConfig,
) -> SimulationResult {
    let sites = arrivals
        .iter()
        .map(|(index, site_arrivals)| match config.variability {
            Variability::Deterministic => {
                simulate_site(problem, index, site_arrivals, grid, config, &mut FixedService)
            }
            Variability::Perturbed { coefficient, seed } => {
                let rng = SmallRng::seed_from_u64(site_stream_seed(seed, index.get()));
                let mut sampler = PerturbedService::new(rng, coefficient);
                simulate_site(problem, index, site_arrivals, grid, config, &mut sampler)
            }
        })
        .collect();

    SimulationResult {
        buckets: grid.buckets().to_vec(),
        sites,
    }
}

fn simulate_site<S: ServiceSampler>(
    problem: &HaulProblem,
    index: SiteIdx,
    arrivals: &SiteArrivals,
    grid: &BucketGrid,
    config: &SimulationConfig,
    sampler: &mut S,
) -> SiteSeries {
    let site = problem.site(index);
    match config.queue_model {
        QueueModel::Bucketed => simulate_buckets(site, index, arrivals, grid, sampler),
        QueueModel::EventDriven => simulate_events(site, index, arrivals, grid, sampler),
    }
}

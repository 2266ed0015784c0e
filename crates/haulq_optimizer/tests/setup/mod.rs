#![allow(dead_code)]

pub mod mock_rng;

use std::sync::Arc;

use haulq_optimizer::{
    objective::{objective::Objective, objective_weights::ObjectiveWeights},
    problem::{
        contractor::{Contractor, DepartureSchedule, OffsetBounds},
        haul_cycle_record::CycleSegments,
        haul_problem::{HaulProblem, HaulProblemBuilder, SiteOverride},
        horizon::Horizon,
        route_template::RouteTemplate,
    },
    simulation::simulation_config::SimulationConfig,
};
use jiff::{SignedDuration, Timestamp};

pub const PIT: &str = "PIT";
pub const DUMP: &str = "DUMP";

pub fn start() -> Timestamp {
    "2025-03-01T05:00:00Z".parse().unwrap()
}

pub fn minutes_after_start(minutes: i64) -> Timestamp {
    start() + SignedDuration::from_mins(minutes)
}

/// Trucks join the dump queue 40 minutes after leaving.
pub fn segments() -> CycleSegments {
    CycleSegments {
        travel_to_load: SignedDuration::from_mins(5),
        load: SignedDuration::from_mins(2),
        loaded_travel: SignedDuration::from_mins(33),
        dump: SignedDuration::from_mins(6),
        empty_travel: SignedDuration::from_mins(30),
        ..CycleSegments::default()
    }
}

pub fn dump_site(servers: usize, service_minutes: i64) -> SiteOverride {
    SiteOverride {
        site: DUMP.to_owned(),
        servers: Some(servers),
        service_time: Some(SignedDuration::from_mins(service_minutes)),
        peak_windows: None,
    }
}

/// Every contractor sends its trucks from [`start`], 72 s apart, through an
/// uncongested [`PIT`] to [`DUMP`], with offsets bounded to ±60 minutes.
pub fn haul_problem(
    fleets: &[(&str, usize)],
    dump: SiteOverride,
    horizon: Option<Horizon>,
) -> HaulProblem {
    let mut builder = HaulProblemBuilder::default();
    let schedule = DepartureSchedule::new(start());

    for &(contractor, trucks) in fleets {
        builder
            .add_contractor(
                Contractor::new(contractor, trucks)
                    .with_bounds(OffsetBounds::symmetric(SignedDuration::from_mins(60)))
                    .with_schedule(schedule),
            )
            .add_records(RouteTemplate::new(contractor, PIT, DUMP, segments()).expand(trucks, &schedule));
    }

    builder
        .add_site_override(SiteOverride {
            site: PIT.to_owned(),
            servers: Some(50),
            service_time: Some(SignedDuration::from_mins(1)),
            peak_windows: None,
        })
        .add_site_override(dump);

    if let Some(horizon) = horizon {
        builder.set_horizon(horizon);
    }

    builder.build().unwrap()
}

pub fn objective(problem: HaulProblem, config: SimulationConfig) -> Arc<Objective> {
    Arc::new(Objective::new(Arc::new(problem), config, ObjectiveWeights::default()).unwrap())
}

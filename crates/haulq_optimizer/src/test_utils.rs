use jiff::{SignedDuration, Timestamp};

use crate::problem::{
    contractor::{Contractor, DepartureSchedule, OffsetBounds},
    haul_cycle_record::CycleSegments,
    haul_problem::{HaulProblem, HaulProblemBuilder, SiteOverride},
    route_template::RouteTemplate,
};

pub const PIT: &str = "PIT";
pub const DUMP: &str = "DUMP";

pub fn start() -> Timestamp {
    "2025-03-01T05:00:00Z".parse().unwrap()
}

pub struct TestRoute {
    contractor: &'static str,
    trucks: usize,
    first_departure: i64,
    spacing: SignedDuration,
    dump_after: i64,
    bounds: OffsetBounds,
}

impl TestRoute {
    pub fn new(contractor: &'static str, trucks: usize) -> Self {
        TestRoute {
            contractor,
            trucks,
            first_departure: 0,
            spacing: DepartureSchedule::DEFAULT_SPACING,
            dump_after: 40,
            bounds: OffsetBounds::default(),
        }
    }

    pub fn departing_at(mut self, minutes: i64) -> Self {
        self.first_departure = minutes;
        self
    }

    pub fn spacing_mins(mut self, minutes: i64) -> Self {
        self.spacing = SignedDuration::from_mins(minutes);
        self
    }

    /// Minutes from departure until the truck reaches the dump queue.
    pub fn dump_after(mut self, minutes: i64) -> Self {
        self.dump_after = minutes;
        self
    }

    pub fn bounds_mins(mut self, min: i64, max: i64) -> Self {
        self.bounds = OffsetBounds::new(SignedDuration::from_mins(min), SignedDuration::from_mins(max));
        self
    }
}

/// Dump site parameters for [`create_problem`].
pub fn dump_site(servers: usize, service_minutes: i64) -> SiteOverride {
    SiteOverride {
        site: DUMP.to_owned(),
        servers: Some(servers),
        service_time: Some(SignedDuration::from_mins(service_minutes)),
        peak_windows: None,
    }
}

/// Every route loads at an uncongested [`PIT`] and dumps at [`DUMP`].
pub fn create_problem(routes: &[TestRoute], dump: SiteOverride) -> HaulProblem {
    let mut builder = HaulProblemBuilder::default();

    for route in routes {
        let segments = CycleSegments {
            travel_to_load: SignedDuration::from_mins(5),
            load: SignedDuration::from_mins(2),
            loaded_travel: SignedDuration::from_mins(route.dump_after - 7),
            dump: SignedDuration::from_mins(6),
            empty_travel: SignedDuration::from_mins(30),
            ..CycleSegments::default()
        };
        let schedule = DepartureSchedule::new(start() + SignedDuration::from_mins(route.first_departure))
            .with_spacing(route.spacing);

        builder
            .add_contractor(
                Contractor::new(route.contractor, route.trucks)
                    .with_bounds(route.bounds)
                    .with_schedule(schedule),
            )
            .add_records(
                RouteTemplate::new(route.contractor, PIT, DUMP, segments)
                    .expand(route.trucks, &schedule),
            );
    }

    builder
        .add_site_override(SiteOverride {
            site: PIT.to_owned(),
            servers: Some(50),
            service_time: Some(SignedDuration::from_mins(1)),
            peak_windows: None,
        })
        .add_site_override(dump);

    builder.build().unwrap()
}

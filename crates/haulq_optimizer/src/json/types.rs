use std::io::Read;

use jiff::{SignedDuration, Timestamp, tz::TimeZone};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    error::{HaulError, ValidationError},
    objective::objective_weights::ObjectiveWeights,
    problem::{
        contractor::{Contractor, DepartureSchedule, OffsetBounds},
        haul_cycle_record::{CycleSegments, HaulCycleRecord},
        haul_problem::{HaulProblem, HaulProblemBuilder, SiteOverride},
        horizon::Horizon,
        route_template::RouteTemplate,
    },
    simulation::simulation_config::SimulationConfig,
    solver::solver_params::SolverParams,
};

/// A haul scenario: observed trips and planned routes of each contractor,
/// site parameters and the tunables of a run.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "HaulScenario")]
pub struct JsonScenario {
    pub id: Option<String>,
    /// IANA name used to place peak windows, UTC when absent.
    pub time_zone: Option<String>,
    pub horizon: Option<JsonHorizon>,
    pub default_servers: Option<usize>,
    pub contractors: Vec<JsonContractor>,
    #[serde(default)]
    pub records: Vec<JsonHaulCycleRecord>,
    #[serde(default)]
    pub routes: Vec<JsonRoute>,
    #[serde(default)]
    pub sites: Vec<SiteOverride>,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub objective: ObjectiveWeights,
    #[serde(default)]
    pub solver: SolverParams,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Horizon")]
pub struct JsonHorizon {
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Contractor")]
pub struct JsonContractor {
    pub id: String,
    pub trucks: usize,
    pub min_offset: Option<SignedDuration>,
    pub max_offset: Option<SignedDuration>,
    pub current_offset: Option<SignedDuration>,
    /// Departure of the first truck. Required when the contractor has routes.
    pub first_departure: Option<Timestamp>,
    pub departure_spacing: Option<SignedDuration>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "HaulCycleRecord")]
pub struct JsonHaulCycleRecord {
    pub contractor: String,
    pub parking_origin: Option<String>,
    pub loading_origin: String,
    pub dumping_destination: String,
    pub departure: Timestamp,
    pub segments: CycleSegments,
    pub cycle_time: Option<SignedDuration>,
}

/// Run by every truck of the contractor, in procession from its schedule.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Route")]
pub struct JsonRoute {
    pub contractor: String,
    pub parking_origin: Option<String>,
    pub loading_origin: String,
    pub dumping_destination: String,
    pub segments: CycleSegments,
}

impl JsonContractor {
    fn schedule(&self) -> Option<DepartureSchedule> {
        self.first_departure.map(|first_departure| {
            let schedule = DepartureSchedule::new(first_departure);
            match self.departure_spacing {
                Some(spacing) => schedule.with_spacing(spacing),
                None => schedule,
            }
        })
    }

    fn to_contractor(&self) -> Contractor {
        let defaults = OffsetBounds::default();
        let bounds = OffsetBounds::new(
            self.min_offset.unwrap_or(defaults.min),
            self.max_offset.unwrap_or(defaults.max),
        );

        let mut contractor = Contractor::new(self.id.clone(), self.trucks)
            .with_bounds(bounds)
            .with_current_offset(self.current_offset.unwrap_or(SignedDuration::ZERO));
        if let Some(schedule) = self.schedule() {
            contractor = contractor.with_schedule(schedule);
        }
        contractor
    }
}

impl From<&JsonHaulCycleRecord> for HaulCycleRecord {
    fn from(value: &JsonHaulCycleRecord) -> Self {
        let mut record = HaulCycleRecord::new(
            value.contractor.clone(),
            value.loading_origin.clone(),
            value.dumping_destination.clone(),
            value.departure,
            value.segments.clone(),
        );
        if let Some(parking) = &value.parking_origin {
            record = record.with_parking_origin(parking.clone());
        }
        if let Some(cycle_time) = value.cycle_time {
            record = record.with_cycle_time(cycle_time);
        }
        record
    }
}

impl JsonScenario {
    pub fn from_reader(reader: impl Read) -> Result<Self, HaulError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(json: &str) -> Result<Self, HaulError> {
        Ok(serde_json::from_str(json)?)
    }

    #[instrument(skip_all, level = "debug")]
    pub fn build_problem(&self) -> Result<HaulProblem, HaulError> {
        let mut builder = HaulProblemBuilder::default();

        builder.set_contractors(
            self.contractors
                .iter()
                .map(JsonContractor::to_contractor)
                .collect(),
        );

        builder.add_records(self.records.iter().map(HaulCycleRecord::from));

        let mut next_record = self.records.len();
        for route in &self.routes {
            let contractor = self
                .contractors
                .iter()
                .find(|contractor| contractor.id == route.contractor)
                .ok_or_else(|| ValidationError::UnknownContractor {
                    record: next_record,
                    contractor: route.contractor.clone(),
                })?;
            let schedule = contractor
                .schedule()
                .ok_or_else(|| ValidationError::MissingDepartureSchedule(contractor.id.clone()))?;

            let mut template = RouteTemplate::new(
                route.contractor.clone(),
                route.loading_origin.clone(),
                route.dumping_destination.clone(),
                route.segments.clone(),
            );
            if let Some(parking) = &route.parking_origin {
                template = template.with_parking_origin(parking.clone());
            }

            builder.add_records(template.expand(contractor.trucks, &schedule));
            next_record += contractor.trucks;
        }

        builder.set_site_overrides(self.sites.clone());

        if let Some(horizon) = &self.horizon {
            builder.set_horizon(Horizon::new(horizon.start, horizon.end)?);
        }

        if let Some(name) = &self.time_zone {
            let time_zone = TimeZone::get(name).map_err(|source| HaulError::TimeZone {
                name: name.clone(),
                source,
            })?;
            builder.set_time_zone(time_zone);
        }

        if let Some(servers) = self.default_servers {
            builder.set_default_servers(servers);
        }

        builder.build()
    }
}

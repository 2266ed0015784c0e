//! Wait, utilization and throughput indicators aggregated from one
//! simulation run.
//!
//! Averages are truck weighted: a contractor with more trips through a site
//! weighs more in the fleet figure. Arrivals dropped by the horizon policy
//! are left out of every denominator and reported separately.

use std::collections::BTreeMap;

use jiff::SignedDuration;
use serde::Serialize;

use crate::{
    problem::{
        contractor::ContractorIdx,
        haul_problem::HaulProblem,
        site::{SiteIdx, SiteKind},
    },
    simulation::simulator::SimulationResult,
    utils::time::minutes,
};

use super::wait_rating::WaitRating;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteKpi {
    pub site: SiteIdx,
    pub external_id: String,
    pub kind: SiteKind,
    pub arrivals: u64,
    pub avg_wait_minutes: f64,
    pub max_wait_minutes: f64,
    pub max_bucket_wait_minutes: f64,
    pub avg_utilization: f64,
    /// Trucks whose service started within the horizon.
    pub throughput: f64,
    pub residual_queue: f64,
    pub overloaded_buckets: usize,
    pub excluded_arrivals: usize,
    pub rating: WaitRating,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractorKpi {
    pub contractor: ContractorIdx,
    pub external_id: String,
    pub trucks: usize,
    pub trips: usize,
    pub avg_dump_wait_minutes: f64,
    pub avg_load_wait_minutes: f64,
    pub avg_cycle_minutes: f64,
    pub trips_per_truck: f64,
    pub trips_per_shift: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FleetKpi {
    pub trips: usize,
    pub avg_dump_wait_minutes: f64,
    pub avg_load_wait_minutes: f64,
    pub avg_cycle_minutes: f64,
    pub avg_dump_utilization: f64,
    pub throughput: f64,
    pub excluded_arrivals: usize,
    pub rating: Option<WaitRating>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSet {
    /// False when there were no trips to aggregate; every figure is then zero.
    pub has_data: bool,
    pub fleet: FleetKpi,
    pub sites: Vec<SiteKpi>,
    pub contractors: Vec<ContractorKpi>,
}

#[derive(Default)]
struct Mean {
    total: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

#[derive(Default)]
struct ContractorTotals {
    trips: usize,
    dump_wait: Mean,
    load_wait: Mean,
    cycle: Mean,
}

impl KpiSet {
    pub fn no_data() -> Self {
        KpiSet {
            has_data: false,
            fleet: FleetKpi::default(),
            sites: Vec::new(),
            contractors: Vec::new(),
        }
    }

    pub fn calculate(
        problem: &HaulProblem,
        result: &SimulationResult,
        shift_length: SignedDuration,
    ) -> Self {
        if problem.trips().is_empty() {
            return Self::no_data();
        }

        let trips = problem.trips().len();
        let mut load_waits: Vec<Option<SignedDuration>> = vec![None; trips];
        let mut dump_waits: Vec<Option<SignedDuration>> = vec![None; trips];
        for series in &result.sites {
            let waits = match problem.site(series.site).kind() {
                SiteKind::Load => &mut load_waits,
                SiteKind::Dump => &mut dump_waits,
            };
            for truck in &series.truck_waits {
                waits[truck.trip] = Some(truck.wait);
            }
        }

        let mut fleet_dump_wait = Mean::default();
        let mut fleet_load_wait = Mean::default();
        let mut fleet_cycle = Mean::default();
        let mut totals: Vec<ContractorTotals> = (0..problem.contractors().len())
            .map(|_| ContractorTotals::default())
            .collect();

        for (index, trip) in problem.trips().iter().enumerate() {
            let record = problem.record(trip);
            let segments = record.segments();
            let contractor = &mut totals[trip.contractor.get()];
            contractor.trips += 1;

            if let Some(wait) = dump_waits[index] {
                contractor.dump_wait.add(minutes(wait));
                fleet_dump_wait.add(minutes(wait));
            }
            if let Some(wait) = load_waits[index] {
                contractor.load_wait.add(minutes(wait));
                fleet_load_wait.add(minutes(wait));
            }

            let cycle = record.cycle_time_with_waits(
                load_waits[index].unwrap_or(segments.wait_for_load),
                dump_waits[index].unwrap_or(segments.wait_to_dump),
            );
            contractor.cycle.add(minutes(cycle));
            fleet_cycle.add(minutes(cycle));
        }

        let shift_minutes = minutes(shift_length);
        let contractors = problem
            .contractors()
            .iter()
            .zip(totals)
            .enumerate()
            .map(|(index, (contractor, totals))| {
                let avg_cycle = totals.cycle.value();
                let avg_dump_wait = totals.dump_wait.value();
                let trips_per_truck = if avg_cycle > 0.0 {
                    shift_minutes / avg_cycle
                } else {
                    0.0
                };
                let utilization = if avg_cycle + avg_dump_wait > 0.0 {
                    avg_cycle / (avg_cycle + avg_dump_wait)
                } else {
                    0.0
                };

                ContractorKpi {
                    contractor: ContractorIdx::new(index),
                    external_id: contractor.external_id().to_owned(),
                    trucks: contractor.truck_count(),
                    trips: totals.trips,
                    avg_dump_wait_minutes: avg_dump_wait,
                    avg_load_wait_minutes: totals.load_wait.value(),
                    avg_cycle_minutes: avg_cycle,
                    trips_per_truck,
                    trips_per_shift: trips_per_truck * contractor.truck_count() as f64,
                    utilization,
                }
            })
            .collect();

        let sites: Vec<SiteKpi> = result
            .sites
            .iter()
            .map(|series| {
                let site = problem.site(series.site);
                let avg_wait = series.average_wait_minutes();
                SiteKpi {
                    site: series.site,
                    external_id: site.external_id().to_owned(),
                    kind: site.kind(),
                    arrivals: series.total_arrivals(),
                    avg_wait_minutes: avg_wait,
                    max_wait_minutes: series.max_wait_minutes(),
                    max_bucket_wait_minutes: series.wait_minutes.iter().copied().fold(0.0, f64::max),
                    avg_utilization: series.average_utilization(),
                    throughput: series.total_served(),
                    residual_queue: series.residual_queue(),
                    overloaded_buckets: series.overloaded_buckets(),
                    excluded_arrivals: series.excluded_arrivals,
                    rating: WaitRating::from_minutes(avg_wait),
                }
            })
            .collect();

        let mut dump_utilization = Mean::default();
        let mut dump_throughput = 0.0;
        for site in sites.iter().filter(|site| site.kind == SiteKind::Dump) {
            if site.arrivals > 0 {
                dump_utilization.total += site.avg_utilization * site.arrivals as f64;
                dump_utilization.count += site.arrivals as usize;
            }
            dump_throughput += site.throughput;
        }

        let fleet = FleetKpi {
            trips,
            avg_dump_wait_minutes: fleet_dump_wait.value(),
            avg_load_wait_minutes: fleet_load_wait.value(),
            avg_cycle_minutes: fleet_cycle.value(),
            avg_dump_utilization: dump_utilization.value(),
            throughput: dump_throughput,
            excluded_arrivals: result.excluded_arrivals(),
            rating: Some(WaitRating::from_minutes(fleet_dump_wait.value())),
        };

        KpiSet {
            has_data: true,
            fleet,
            sites,
            contractors,
        }
    }

    pub fn site(&self, external_id: &str) -> Option<&SiteKpi> {
        self.sites.iter().find(|site| site.external_id == external_id)
    }

    pub fn contractor(&self, external_id: &str) -> Option<&ContractorKpi> {
        self.contractors
            .iter()
            .find(|contractor| contractor.external_id == external_id)
    }

    /// Every figure under a dotted key, e.g. `site.<id>.utilization`.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        let fleet = &self.fleet;

        let mut put = |key: String, value: f64| {
            metrics.insert(key, value);
        };

        put("fleet.has_data".into(), if self.has_data { 1.0 } else { 0.0 });
        put("fleet.trips".into(), fleet.trips as f64);
        put("fleet.avg_dump_wait_min".into(), fleet.avg_dump_wait_minutes);
        put("fleet.avg_load_wait_min".into(), fleet.avg_load_wait_minutes);
        put("fleet.avg_cycle_min".into(), fleet.avg_cycle_minutes);
        put("fleet.avg_dump_utilization".into(), fleet.avg_dump_utilization);
        put("fleet.throughput".into(), fleet.throughput);
        put("fleet.excluded_arrivals".into(), fleet.excluded_arrivals as f64);

        for site in &self.sites {
            let prefix = format!("site.{}", site.external_id);
            put(format!("{prefix}.arrivals"), site.arrivals as f64);
            put(format!("{prefix}.avg_wait_min"), site.avg_wait_minutes);
            put(format!("{prefix}.max_wait_min"), site.max_wait_minutes);
            put(format!("{prefix}.max_bucket_wait_min"), site.max_bucket_wait_minutes);
            put(format!("{prefix}.utilization"), site.avg_utilization);
            put(format!("{prefix}.throughput"), site.throughput);
            put(format!("{prefix}.residual_queue"), site.residual_queue);
            put(format!("{prefix}.overloaded_buckets"), site.overloaded_buckets as f64);
            put(format!("{prefix}.excluded_arrivals"), site.excluded_arrivals as f64);
        }

        for contractor in &self.contractors {
            let prefix = format!("contractor.{}", contractor.external_id);
            put(format!("{prefix}.trucks"), contractor.trucks as f64);
            put(format!("{prefix}.trips"), contractor.trips as f64);
            put(format!("{prefix}.avg_dump_wait_min"), contractor.avg_dump_wait_minutes);
            put(format!("{prefix}.avg_load_wait_min"), contractor.avg_load_wait_minutes);
            put(format!("{prefix}.avg_cycle_min"), contractor.avg_cycle_minutes);
            put(format!("{prefix}.trips_per_truck"), contractor.trips_per_truck);
            put(format!("{prefix}.trips_per_shift"), contractor.trips_per_shift);
            put(format!("{prefix}.utilization"), contractor.utilization);
        }

        metrics
    }
}

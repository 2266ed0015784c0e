use std::collections::BTreeMap;

use jiff::{SignedDuration, Timestamp};
use tracing::{debug, instrument};

use crate::{
    error::ValidationError,
    problem::{
        contractor::ContractorIdx, haul_problem::HaulProblem, horizon::HorizonPolicy,
        offset_vector::OffsetVector, site::SiteIdx,
    },
};

use super::bucket_grid::BucketGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruckArrival {
    /// Index into [`HaulProblem::trips`].
    pub trip: usize,
    pub contractor: ContractorIdx,
    pub at: Timestamp,
    pub bucket: usize,
}

/// Arrivals at one site: truck counts per bucket and the trucks themselves
/// in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteArrivals {
    pub counts: Vec<u32>,
    pub trucks: Vec<TruckArrival>,
    pub excluded: usize,
}

impl SiteArrivals {
    pub fn new(buckets: usize) -> Self {
        SiteArrivals {
            counts: vec![0; buckets],
            trucks: Vec::new(),
            excluded: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&count| u64::from(count)).sum()
    }

    fn place(
        &mut self,
        grid: &BucketGrid,
        policy: HorizonPolicy,
        trip: usize,
        contractor: ContractorIdx,
        instant: Timestamp,
    ) {
        match grid.locate(instant, policy) {
            Some(placement) => {
                self.counts[placement.bucket] += 1;
                self.trucks.push(TruckArrival {
                    trip,
                    contractor,
                    at: placement.at,
                    bucket: placement.bucket,
                });
            }
            None => self.excluded += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalTable {
    sites: Vec<SiteArrivals>,
}

impl ArrivalTable {
    pub fn site(&self, site: SiteIdx) -> &SiteArrivals {
        &self.sites[site.get()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SiteIdx, &SiteArrivals)> {
        self.sites
            .iter()
            .enumerate()
            .map(|(index, arrivals)| (SiteIdx::new(index), arrivals))
    }

    pub fn excluded(&self) -> usize {
        self.sites.iter().map(|arrivals| arrivals.excluded).sum()
    }

    /// Per-bucket counts keyed by site id.
    pub fn counts_by_site(&self, problem: &HaulProblem) -> BTreeMap<String, Vec<u32>> {
        self.iter()
            .map(|(site, arrivals)| {
                (
                    problem.site(site).external_id().to_owned(),
                    arrivals.counts.clone(),
                )
            })
            .collect()
    }
}

/// Shifts every trip by its contractor's offset and counts the trucks
/// reaching each loading and dumping queue per bucket.
#[instrument(skip_all, level = "trace")]
pub fn build_arrivals(
    problem: &HaulProblem,
    offsets: &OffsetVector,
    grid: &BucketGrid,
    policy: HorizonPolicy,
) -> Result<ArrivalTable, ValidationError> {
    offsets.validate(problem.contractors())?;

    let mut sites = vec![SiteArrivals::new(grid.len()); problem.sites().len()];

    for (index, trip) in problem.trips().iter().enumerate() {
        let record = problem.record(trip);
        let segments = record.segments();
        let departure = record.departure() + offsets.get(trip.contractor);

        sites[trip.load_site.get()].place(
            grid,
            policy,
            index,
            trip.contractor,
            departure + segments.until_load_queue(),
        );
        sites[trip.dump_site.get()].place(
            grid,
            policy,
            index,
            trip.contractor,
            departure + segments.until_dump_queue(),
        );
    }

    for arrivals in sites.iter_mut() {
        arrivals.trucks.sort_by_key(|truck| (truck.at, truck.trip));
    }

    let table = ArrivalTable { sites };
    let excluded = table.excluded();
    if excluded > 0 {
        debug!(excluded, ?policy, "Arrivals fell outside the horizon");
    }

    Ok(table)
}

/// Instant a trip joins the dumping queue under `offset`.
pub fn dump_arrival(problem: &HaulProblem, trip: usize, offset: SignedDuration) -> Timestamp {
    let record = problem.record(&problem.trips()[trip]);
    record.departure() + offset + record.segments().until_dump_queue()
}

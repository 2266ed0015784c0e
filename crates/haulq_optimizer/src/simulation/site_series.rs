use jiff::{SignedDuration, Timestamp};
use serde::Serialize;

use crate::{
    problem::{contractor::ContractorIdx, site::SiteIdx},
    utils::time::minutes,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TruckWait {
    pub trip: usize,
    pub contractor: ContractorIdx,
    pub wait: SignedDuration,
}

/// Per-bucket queue state of one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSeries {
    pub site: SiteIdx,
    pub arrivals: Vec<u32>,
    pub capacity: Vec<f64>,
    pub served: Vec<f64>,
    /// Trucks still waiting at the end of each bucket.
    pub queue: Vec<f64>,
    pub wait_minutes: Vec<f64>,
    pub utilization: Vec<f64>,
    /// Buckets without capacity, whose arrivals wait for a later bucket.
    pub deferred: Vec<bool>,
    pub truck_waits: Vec<TruckWait>,
    pub excluded_arrivals: usize,
    pub last_service_end: Option<Timestamp>,
}

impl SiteSeries {
    pub fn new(site: SiteIdx, buckets: usize) -> Self {
        SiteSeries {
            site,
            arrivals: vec![0; buckets],
            capacity: vec![0.0; buckets],
            served: vec![0.0; buckets],
            queue: vec![0.0; buckets],
            wait_minutes: vec![0.0; buckets],
            utilization: vec![0.0; buckets],
            deferred: vec![false; buckets],
            truck_waits: Vec::new(),
            excluded_arrivals: 0,
            last_service_end: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    pub fn total_arrivals(&self) -> u64 {
        self.arrivals.iter().map(|&count| u64::from(count)).sum()
    }

    pub fn total_served(&self) -> f64 {
        self.served.iter().sum()
    }

    /// Trucks still queued when the horizon ends.
    pub fn residual_queue(&self) -> f64 {
        self.queue.last().copied().unwrap_or(0.0)
    }

    /// Buckets that received more trucks than they could serve.
    pub fn overloaded_buckets(&self) -> usize {
        self.arrivals
            .iter()
            .zip(&self.capacity)
            .filter(|&(&arrivals, &capacity)| f64::from(arrivals) > capacity)
            .count()
    }

    pub fn average_wait_minutes(&self) -> f64 {
        if self.truck_waits.is_empty() {
            return 0.0;
        }
        self.truck_waits
            .iter()
            .map(|truck| minutes(truck.wait))
            .sum::<f64>()
            / self.truck_waits.len() as f64
    }

    pub fn max_wait_minutes(&self) -> f64 {
        self.truck_waits
            .iter()
            .map(|truck| minutes(truck.wait))
            .fold(0.0, f64::max)
    }

    pub fn average_utilization(&self) -> f64 {
        if self.utilization.is_empty() {
            return 0.0;
        }
        self.utilization.iter().sum::<f64>() / self.utilization.len() as f64
    }
}

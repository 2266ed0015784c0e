use crate::{
    problem::site::{Site, SiteIdx},
    utils::time::from_minutes,
};

use super::{
    arrivals::SiteArrivals,
    bucket_grid::BucketGrid,
    service_sampler::ServiceSampler,
    site_series::{SiteSeries, TruckWait},
};

/// Backlog carried through consecutive buckets of fixed capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueTrace {
    pub served: Vec<f64>,
    pub queue: Vec<f64>,
    pub wait_minutes: Vec<f64>,
    pub deferred: Vec<bool>,
}

/// Carries the backlog bucket to bucket: each bucket serves up to its
/// capacity and the rest waits. A truck's wait is `queue / capacity` times
/// the bucket's service time in minutes. Buckets without capacity defer
/// their backlog to the next bucket that has some, or to the end of the
/// horizon.
pub fn drain_queue(
    arrivals: &[u32],
    capacity: &[f64],
    service_minutes: &[f64],
    width_minutes: f64,
) -> QueueTrace {
    let buckets = arrivals.len();
    let mut served = vec![0.0; buckets];
    let mut queue = vec![0.0; buckets];
    let mut deferred = vec![false; buckets];

    let mut backlog = 0.0;
    for t in 0..buckets {
        let pending = backlog + f64::from(arrivals[t]);
        let available = capacity[t].max(0.0);
        served[t] = pending.min(available);
        queue[t] = (pending - served[t]).max(0.0);
        deferred[t] = available <= 0.0;
        backlog = queue[t];
    }

    let mut next_open: Option<usize> = None;
    let mut wait_minutes = vec![0.0; buckets];
    for t in (0..buckets).rev() {
        let waiting = queue[t] > 0.0 || arrivals[t] > 0;
        wait_minutes[t] = if !deferred[t] {
            queue[t] / capacity[t] * service_minutes[t]
        } else if !waiting {
            0.0
        } else {
            match next_open {
                Some(open) => {
                    (open - t) as f64 * width_minutes
                        + queue[t] / capacity[open] * service_minutes[open]
                }
                None => (buckets - t) as f64 * width_minutes,
            }
        };

        if !deferred[t] {
            next_open = Some(t);
        }
    }

    QueueTrace {
        served,
        queue,
        wait_minutes,
        deferred,
    }
}

/// Bucketed fluid simulation of one site.
pub fn simulate_buckets<S: ServiceSampler>(
    site: &Site,
    index: SiteIdx,
    arrivals: &SiteArrivals,
    grid: &BucketGrid,
    sampler: &mut S,
) -> SiteSeries {
    let width_minutes = grid.width_minutes();
    let multipliers = grid.peak_multipliers(site);

    let (capacity, service_minutes): (Vec<f64>, Vec<f64>) = arrivals
        .counts
        .iter()
        .zip(&multipliers)
        .map(|(&count, &multiplier)| {
            let factor = sampler.mean_factor(count);
            (
                site.capacity(grid.width(), factor, multiplier),
                site.service_minutes(factor, multiplier),
            )
        })
        .unzip();

    let trace = drain_queue(&arrivals.counts, &capacity, &service_minutes, width_minutes);

    let utilization = arrivals
        .counts
        .iter()
        .zip(&capacity)
        .zip(&trace.queue)
        .map(|((&count, &capacity), &queue)| {
            if capacity > 0.0 {
                (f64::from(count) / capacity).min(1.0)
            } else if count > 0 || queue > 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .collect();

    let truck_waits = arrivals
        .trucks
        .iter()
        .map(|truck| TruckWait {
            trip: truck.trip,
            contractor: truck.contractor,
            wait: from_minutes(trace.wait_minutes[truck.bucket]),
        })
        .collect();

    SiteSeries {
        site: index,
        arrivals: arrivals.counts.clone(),
        capacity,
        served: trace.served,
        queue: trace.queue,
        wait_minutes: trace.wait_minutes,
        utilization,
        deferred: trace.deferred,
        truck_waits,
        excluded_arrivals: arrivals.excluded,
        last_service_end: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog_carries_over() {
        let trace = drain_queue(&[5, 0, 0], &[2.0, 2.0, 2.0], &[6.0; 3], 15.0);
        assert_eq!(trace.served, vec![2.0, 2.0, 1.0]);
        assert_eq!(trace.queue, vec![3.0, 1.0, 0.0]);
        assert_eq!(trace.wait_minutes, vec![9.0, 3.0, 0.0]);
        assert_eq!(trace.deferred, vec![false, false, false]);
    }

    #[test]
    fn test_wait_is_queue_over_capacity_times_service_time() {
        // One server, 6 minute service, 15 minute buckets.
        let trace = drain_queue(&[5], &[2.5], &[6.0], 15.0);
        assert_eq!(trace.queue, vec![2.5]);
        assert_eq!(trace.wait_minutes, vec![6.0]);
    }

    #[test]
    fn test_below_capacity_has_no_wait() {
        let trace = drain_queue(&[1, 2, 1], &[2.5, 2.5, 2.5], &[6.0; 3], 15.0);
        assert!(trace.queue.iter().all(|&queue| queue == 0.0));
        assert!(trace.wait_minutes.iter().all(|&wait| wait == 0.0));
    }

    #[test]
    fn test_zero_capacity_defers_to_next_open_bucket() {
        let trace = drain_queue(&[3, 0, 0], &[0.0, 0.0, 3.0], &[0.0, 0.0, 6.0], 15.0);
        assert_eq!(trace.served, vec![0.0, 0.0, 3.0]);
        assert_eq!(trace.queue, vec![3.0, 3.0, 0.0]);
        assert_eq!(trace.deferred, vec![true, true, false]);
        // Closed until bucket 2, then the backlog drains at its service time.
        assert_eq!(trace.wait_minutes[0], 36.0);
        assert_eq!(trace.wait_minutes[1], 21.0);
        assert!(trace.wait_minutes.iter().all(|wait| wait.is_finite()));
    }

    #[test]
    fn test_capacity_never_resumes() {
        let trace = drain_queue(&[2, 1], &[0.0, 0.0], &[0.0, 0.0], 15.0);
        assert_eq!(trace.served, vec![0.0, 0.0]);
        assert_eq!(trace.queue, vec![2.0, 3.0]);
        assert_eq!(trace.wait_minutes, vec![30.0, 15.0]);
    }

    #[test]
    fn test_conservation() {
        let arrivals = [4, 7, 0, 1, 9, 0, 0, 3];
        let capacity = [2.5, 0.0, 3.0, 2.5, 1.0, 0.0, 4.0, 2.0];
        let trace = drain_queue(&arrivals, &capacity, &[6.0; 8], 15.0);

        let total_arrivals: f64 = arrivals.iter().map(|&count| f64::from(count)).sum();
        let total_served: f64 = trace.served.iter().sum();
        let residual = *trace.queue.last().unwrap();
        assert!((total_served + residual - total_arrivals).abs() < 1e-9);
    }

    #[test]
    fn test_simulated_wait_uses_site_service_time() {
        use jiff::SignedDuration;

        use crate::{
            problem::{horizon::Horizon, site::SiteKind},
            simulation::service_sampler::FixedService,
        };

        let start: jiff::Timestamp = "2025-03-01T05:00:00Z".parse().unwrap();
        let horizon = Horizon::new(start, start + SignedDuration::from_mins(30)).unwrap();
        let grid =
            BucketGrid::new(horizon, SignedDuration::from_mins(15), jiff::tz::TimeZone::UTC).unwrap();
        let site = Site::new("DUMP", SiteKind::Dump, 1, SignedDuration::from_mins(6)).unwrap();

        let mut arrivals = SiteArrivals::new(grid.len());
        arrivals.counts[0] = 5;
        let series = simulate_buckets(&site, SiteIdx::new(0), &arrivals, &grid, &mut FixedService);

        assert!((series.capacity[0] - 2.5).abs() < 1e-9);
        assert!((series.wait_minutes[0] - 6.0).abs() < 1e-9);
    }
}

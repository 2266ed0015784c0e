use jiff::Timestamp;

use crate::{
    problem::site::{Site, SiteIdx},
    utils::time::minutes,
};

use super::{
    arrivals::SiteArrivals,
    bucket_grid::BucketGrid,
    service_sampler::ServiceSampler,
    site_series::{SiteSeries, TruckWait},
};

/// First instant at or after `ready` at which the site has throughput.
fn next_open_instant(grid: &BucketGrid, multipliers: &[f64], ready: Timestamp) -> Option<(Timestamp, usize)> {
    let bucket = grid.bucket_of(ready)?;
    if multipliers[bucket] > 0.0 {
        return Some((ready, bucket));
    }

    (bucket + 1..grid.len())
        .find(|&candidate| multipliers[candidate] > 0.0)
        .map(|open| (grid.buckets()[open].start, open))
}

/// Exact FIFO simulation: every truck takes the server that frees up first.
/// Peak multipliers stretch service times, and a closed site holds trucks
/// until it reopens. Results are folded back into the bucket grid.
pub fn simulate_events<S: ServiceSampler>(
    site: &Site,
    index: SiteIdx,
    arrivals: &SiteArrivals,
    grid: &BucketGrid,
    sampler: &mut S,
) -> SiteSeries {
    let buckets = grid.len();
    let multipliers = grid.peak_multipliers(site);
    let mut series = SiteSeries::new(index, buckets);

    series.arrivals = arrivals.counts.clone();
    series.excluded_arrivals = arrivals.excluded;
    for (bucket, multiplier) in multipliers.iter().enumerate() {
        series.capacity[bucket] = site.capacity(grid.width(), 1.0, *multiplier);
        series.deferred[bucket] = series.capacity[bucket] <= 0.0;
    }

    let mut free_at = vec![grid.horizon().start(); site.servers()];
    let mut wait_totals = vec![0.0; buckets];

    for truck in &arrivals.trucks {
        let (server, &server_free) = free_at
            .iter()
            .enumerate()
            .min_by_key(|&(_, free)| *free)
            .unwrap_or((0, &truck.at));
        let ready = truck.at.max(server_free);

        // Buckets the truck spends queued at their end, up to `queued_until`.
        let queued_until = match next_open_instant(grid, &multipliers, ready) {
            Some((start, bucket)) => {
                let service = site
                    .service_time()
                    .mul_f64(sampler.factor() / multipliers[bucket]);
                let done = start + service;
                if let Some(slot) = free_at.get_mut(server) {
                    *slot = done;
                }
                series.last_service_end = series.last_service_end.max(Some(done));
                series.served[bucket] += 1.0;

                let wait = start.duration_since(truck.at);
                wait_totals[truck.bucket] += minutes(wait);
                series.truck_waits.push(TruckWait {
                    trip: truck.trip,
                    contractor: truck.contractor,
                    wait,
                });
                bucket
            }
            None => {
                let wait = grid.horizon().end().duration_since(truck.at);
                wait_totals[truck.bucket] += minutes(wait);
                series.truck_waits.push(TruckWait {
                    trip: truck.trip,
                    contractor: truck.contractor,
                    wait,
                });
                buckets
            }
        };

        for queued in &mut series.queue[truck.bucket..queued_until] {
            *queued += 1.0;
        }
    }

    for bucket in 0..buckets {
        let count = series.arrivals[bucket];
        if count > 0 {
            series.wait_minutes[bucket] = wait_totals[bucket] / f64::from(count);
        }
        let capacity = series.capacity[bucket];
        series.utilization[bucket] = if capacity > 0.0 {
            (f64::from(count) / capacity).min(1.0)
        } else if count > 0 || series.queue[bucket] > 0.0 {
            1.0
        } else {
            0.0
        };
    }

    series
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, tz::TimeZone};

    use super::*;
    use crate::{
        problem::{
            contractor::ContractorIdx,
            horizon::Horizon,
            site::SiteKind,
        },
        simulation::{arrivals::TruckArrival, service_sampler::FixedService},
    };

    fn grid() -> BucketGrid {
        let start: Timestamp = "2025-03-01T05:00:00Z".parse().unwrap();
        let horizon = Horizon::new(start, start + SignedDuration::from_mins(60)).unwrap();
        BucketGrid::new(horizon, SignedDuration::from_mins(15), TimeZone::UTC).unwrap()
    }

    fn arrivals(grid: &BucketGrid, minutes: &[i64]) -> SiteArrivals {
        let mut arrivals = SiteArrivals::new(grid.len());
        for (trip, &minute) in minutes.iter().enumerate() {
            let at = grid.horizon().start() + SignedDuration::from_mins(minute);
            let bucket = grid.bucket_of(at).unwrap();
            arrivals.counts[bucket] += 1;
            arrivals.trucks.push(TruckArrival {
                trip,
                contractor: ContractorIdx::new(0),
                at,
                bucket,
            });
        }
        arrivals
    }

    #[test]
    fn test_single_server_fifo() {
        let grid = grid();
        let site = Site::new("DUMP", SiteKind::Dump, 1, SignedDuration::from_mins(6)).unwrap();
        let arrivals = arrivals(&grid, &[0, 0, 0]);
        let series = simulate_events(&site, SiteIdx::new(0), &arrivals, &grid, &mut FixedService);

        let waits: Vec<_> = series.truck_waits.iter().map(|truck| truck.wait).collect();
        assert_eq!(
            waits,
            vec![
                SignedDuration::ZERO,
                SignedDuration::from_mins(6),
                SignedDuration::from_mins(12)
            ]
        );
        assert_eq!(series.wait_minutes[0], 6.0);
        assert_eq!(series.served, vec![3.0, 0.0, 0.0, 0.0]);
        assert_eq!(series.queue, vec![0.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            series.last_service_end,
            Some(grid.horizon().start() + SignedDuration::from_mins(18))
        );
    }

    #[test]
    fn test_parallel_servers() {
        let grid = grid();
        let site = Site::new("DUMP", SiteKind::Dump, 2, SignedDuration::from_mins(10)).unwrap();
        let arrivals = arrivals(&grid, &[0, 0, 0, 0]);
        let series = simulate_events(&site, SiteIdx::new(0), &arrivals, &grid, &mut FixedService);

        assert_eq!(series.max_wait_minutes(), 10.0);
        assert_eq!(series.average_wait_minutes(), 5.0);
    }

    #[test]
    fn test_queue_spills_into_later_buckets() {
        let grid = grid();
        let site = Site::new("DUMP", SiteKind::Dump, 1, SignedDuration::from_mins(10)).unwrap();
        let arrivals = arrivals(&grid, &[0, 0, 0]);
        let series = simulate_events(&site, SiteIdx::new(0), &arrivals, &grid, &mut FixedService);

        // The third truck starts at 20 minutes, so it is queued at the end of bucket 0.
        assert_eq!(series.served, vec![2.0, 1.0, 0.0, 0.0]);
        assert_eq!(series.queue, vec![1.0, 0.0, 0.0, 0.0]);
        let conserved = series.total_served() + series.residual_queue();
        assert_eq!(conserved, series.total_arrivals() as f64);
    }
}

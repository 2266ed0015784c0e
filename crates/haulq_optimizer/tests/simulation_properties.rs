mod setup;

use haulq_optimizer::{
    problem::{
        horizon::Horizon,
        offset_vector::OffsetVector,
        site::{PeakWindow, Site, SiteIdx, SiteKind},
    },
    simulation::{
        arrivals::SiteArrivals,
        bucket_grid::BucketGrid,
        bucket_queue::{drain_queue, simulate_buckets},
        service_sampler::{FixedService, PerturbedService, ServiceSampler},
        simulation_config::{QueueModel, SimulationConfig, Variability},
        simulator::simulate,
    },
};
use jiff::{SignedDuration, civil::time, tz::TimeZone};

use setup::{DUMP, mock_rng::MockRng};

#[test]
fn test_seeded_simulation_is_reproducible() {
    let problem = setup::haul_problem(&[("A", 10), ("B", 10)], setup::dump_site(1, 6), None);
    let config = SimulationConfig {
        variability: Variability::Perturbed {
            coefficient: 0.15,
            seed: 7,
        },
        ..SimulationConfig::default()
    };
    let offsets = OffsetVector::from_minutes(&[0, 30]);

    let first = simulate(&problem, &offsets, &config).unwrap();
    let second = simulate(&problem, &offsets, &config).unwrap();
    assert_eq!(first.sites, second.sites);
}

#[test]
fn test_more_arrivals_never_shorten_the_queue() {
    let arrivals = [3, 1, 0, 4, 2, 0, 0, 5, 1, 0];
    let capacity = [2.5, 2.5, 2.5, 0.0, 2.5, 1.0, 2.5, 2.5, 2.5, 2.5];
    let baseline = drain_queue(&arrivals, &capacity, &[6.0; 10], 15.0);

    for bucket in 0..arrivals.len() {
        let mut more = arrivals;
        more[bucket] += 2;
        let trace = drain_queue(&more, &capacity, &[6.0; 10], 15.0);

        for t in bucket..arrivals.len() {
            assert!(
                trace.queue[t] >= baseline.queue[t],
                "bucket {bucket}: queue at {t} dropped from {} to {}",
                baseline.queue[t],
                trace.queue[t]
            );
        }
    }
}

#[test]
fn test_every_arrival_is_served_when_the_queue_drains() {
    let arrivals = [4, 6, 2, 0, 0, 0, 0, 0];
    let capacity = [3.0; 8];
    let trace = drain_queue(&arrivals, &capacity, &[5.0; 8], 15.0);

    let served: f64 = trace.served.iter().sum();
    assert!((served - 12.0).abs() < 1e-9);
    assert_eq!(trace.queue.last(), Some(&0.0));

    let problem = setup::haul_problem(&[("A", 5)], setup::dump_site(2, 6), None);
    for queue_model in [QueueModel::Bucketed, QueueModel::EventDriven] {
        let config = SimulationConfig {
            queue_model,
            ..SimulationConfig::default()
        };
        let result = simulate(&problem, &OffsetVector::zeros(1), &config).unwrap();
        let dump = result.site(problem.site_by_id(DUMP).unwrap());

        assert_eq!(dump.total_arrivals(), 5);
        assert!((dump.total_served() - 5.0).abs() < 1e-9, "{queue_model:?}");
        assert_eq!(dump.residual_queue(), 0.0);
    }
}

#[test]
fn test_zero_capacity_everywhere_grows_the_queue() {
    let arrivals = [1, 2, 1, 3];
    let trace = drain_queue(&arrivals, &[0.0; 4], &[0.0; 4], 15.0);

    assert_eq!(trace.served, vec![0.0; 4]);
    for pair in trace.queue.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    assert!(trace.deferred.iter().all(|&deferred| deferred));
    assert_eq!(trace.wait_minutes, vec![60.0, 45.0, 30.0, 15.0]);
}

#[test]
fn test_closed_site_defers_service() {
    let mut dump = setup::dump_site(1, 6);
    dump.peak_windows = Some(vec![PeakWindow {
        start: time(5, 0, 0, 0),
        end: time(5, 45, 0, 0),
        multiplier: 0.0,
    }]);
    let problem = setup::haul_problem(&[("A", 3)], dump, None);

    let result = simulate(&problem, &OffsetVector::zeros(1), &SimulationConfig::default()).unwrap();
    let series = result.site(problem.site_by_id(DUMP).unwrap());
    let closed: Vec<usize> = (0..series.len()).filter(|&t| series.deferred[t]).collect();

    assert!(!closed.is_empty());
    for &t in &closed {
        assert_eq!(series.served[t], 0.0);
        assert!(series.wait_minutes[t].is_finite());
    }
    assert!(series.average_wait_minutes() > 0.0);
}

#[test]
fn test_perturbed_service_uses_injected_rng() {
    let mut slow = PerturbedService::new(MockRng::new(vec![u64::MAX]), 0.2);
    let mut fast = PerturbedService::new(MockRng::new(vec![0]), 0.2);
    assert!((slow.factor() - 1.2).abs() < 1e-9);
    assert!((fast.factor() - 0.8).abs() < 1e-9);

    let start = setup::start();
    let horizon = Horizon::new(start, start + SignedDuration::from_hours(1)).unwrap();
    let grid = BucketGrid::new(horizon, SignedDuration::from_mins(15), TimeZone::UTC).unwrap();
    let site = Site::new("DUMP", SiteKind::Dump, 1, SignedDuration::from_mins(6)).unwrap();

    let mut arrivals = SiteArrivals::new(grid.len());
    arrivals.counts[0] = 4;

    let fixed = simulate_buckets(&site, SiteIdx::new(0), &arrivals, &grid, &mut FixedService);
    let faster = simulate_buckets(&site, SiteIdx::new(0), &arrivals, &grid, &mut fast);

    assert!((fixed.capacity[0] - 2.5).abs() < 1e-9);
    assert!((faster.capacity[0] - 2.5 / 0.8).abs() < 1e-9);
    assert!(faster.queue[0] < fixed.queue[0]);
}

#[test]
fn test_event_model_serves_first_come_first_served() {
    let problem = setup::haul_problem(&[("A", 4)], setup::dump_site(1, 6), None);
    let config = SimulationConfig {
        queue_model: QueueModel::EventDriven,
        ..SimulationConfig::default()
    };
    let result = simulate(&problem, &OffsetVector::zeros(1), &config).unwrap();
    let series = result.site(problem.site_by_id(DUMP).unwrap());

    let waits: Vec<SignedDuration> = series.truck_waits.iter().map(|truck| truck.wait).collect();
    assert_eq!(waits[0], SignedDuration::ZERO);
    for pair in waits.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    // Arrivals every 1.2 min against 6 min of service.
    assert_eq!(waits[3], SignedDuration::from_secs(3 * (360 - 72)));
}

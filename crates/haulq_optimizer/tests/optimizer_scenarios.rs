mod setup;

use std::sync::Arc;

use haulq_optimizer::{
    kpi::kpi_set::{FleetKpi, KpiSet},
    objective::{objective::Objective, objective_weights::ObjectiveWeights},
    problem::{contractor::ContractorIdx, offset_vector::OffsetVector},
    simulation::simulation_config::{QueueModel, SimulationConfig},
    solver::{
        accepted_offsets::AcceptedOffsets,
        optimization_outcome::{Convergence, ConvergenceWarning},
        solver::{Solver, optimize},
        solver_params::{SearchStrategy, SolverParams, Termination},
    },
};
use jiff::SignedDuration;

fn params(strategy: SearchStrategy) -> SolverParams {
    SolverParams {
        strategy,
        terminations: vec![Termination::Evaluations(100_000)],
        ..SolverParams::default()
    }
}

fn two_contractors(queue_model: QueueModel) -> Arc<Objective> {
    let problem = setup::haul_problem(&[("A", 10), ("B", 10)], setup::dump_site(1, 6), None);
    setup::objective(
        problem,
        SimulationConfig {
            queue_model,
            ..SimulationConfig::default()
        },
    )
}

#[test]
fn test_uncongested_site_keeps_the_schedule() {
    let problem = setup::haul_problem(&[("A", 4)], setup::dump_site(4, 1), None);
    let objective = setup::objective(problem, SimulationConfig::default());

    for strategy in [SearchStrategy::Grid, SearchStrategy::CoordinateDescent] {
        let outcome = optimize(&OffsetVector::zeros(1), objective.clone(), params(strategy)).unwrap();

        assert_eq!(outcome.baseline.score.cost, 0.0);
        assert_eq!(outcome.best.offsets, OffsetVector::zeros(1), "{strategy:?}");
        assert!(outcome.changed_contractors().is_empty());
    }
}

#[test]
fn test_two_contractors_are_spread_apart() {
    for queue_model in [QueueModel::Bucketed, QueueModel::EventDriven] {
        let objective = two_contractors(queue_model);
        let solver = Solver::new(objective, params(SearchStrategy::Auto));
        let outcome = solver.solve().unwrap();

        assert_eq!(outcome.strategy, Some(SearchStrategy::Grid));
        assert!(outcome.convergence.is_converged());
        // 9 candidates per contractor at the default 15 minute step.
        assert_eq!(outcome.evaluations, 9 * 9);

        assert!(outcome.baseline.score.dump_wait_minutes > 0.0);
        assert!(outcome.best.score.cost < outcome.baseline.score.cost);
        assert!(outcome.improvement() > 0.0);

        let a = outcome.best.offsets.get(ContractorIdx::new(0));
        let b = outcome.best.offsets.get(ContractorIdx::new(1));
        assert!(
            (b - a).abs() >= SignedDuration::from_mins(30),
            "{queue_model:?}: A {a:#}, B {b:#}"
        );

        let best: Vec<f64> = outcome.trace.best_so_far().collect();
        assert_eq!(best[0], outcome.baseline.score.cost);
        assert!(best.windows(2).all(|pair| pair[1] <= pair[0]));
        assert!((best[best.len() - 1] - outcome.best.score.cost).abs() < 1e-9);
    }
}

#[test]
fn test_local_search_improves_on_the_baseline() {
    let outcome = optimize(
        &OffsetVector::zeros(2),
        two_contractors(QueueModel::Bucketed),
        params(SearchStrategy::CoordinateDescent),
    )
    .unwrap();

    assert!(outcome.convergence.is_converged());
    assert!(outcome.best.score.cost < outcome.baseline.score.cost);
    assert!(!outcome.changed_contractors().is_empty());
}

#[test]
fn test_monte_carlo_keeps_the_best_draw() {
    let params = SolverParams {
        monte_carlo_samples: 64,
        ..params(SearchStrategy::MonteCarlo)
    };
    let outcome = optimize(&OffsetVector::zeros(2), two_contractors(QueueModel::Bucketed), params).unwrap();

    assert_eq!(outcome.evaluations, 65);
    let lowest = outcome
        .trace
        .entries()
        .iter()
        .map(|entry| entry.score.cost)
        .fold(f64::INFINITY, f64::min);
    assert!((outcome.best.score.cost - lowest).abs() < 1e-9);
}

#[test]
fn test_weighted_objective_prefers_lower_dump_wait() {
    let objective = two_contractors(QueueModel::Bucketed);
    let kpis = |dump: f64, load: f64| KpiSet {
        has_data: true,
        fleet: FleetKpi {
            avg_dump_wait_minutes: dump,
            avg_load_wait_minutes: load,
            ..FleetKpi::default()
        },
        sites: Vec::new(),
        contractors: Vec::new(),
    };

    let first = objective.score_kpis(&kpis(10.0, 0.0));
    let second = objective.score_kpis(&kpis(5.0, 20.0));
    assert!((first.cost - 7.0).abs() < 1e-9);
    assert!((second.cost - 9.5).abs() < 1e-9);

    let first = AcceptedOffsets::new(OffsetVector::from_minutes(&[0, 30]), first);
    let second = AcceptedOffsets::new(OffsetVector::zeros(2), second);
    assert!(first.is_better_than(&second, 1e-9));
    assert!(!second.is_better_than(&first, 1e-9));
}

#[test]
fn test_weights_change_the_cost() {
    let problem = setup::haul_problem(&[("A", 10), ("B", 10)], setup::dump_site(1, 6), None);
    let objective = Objective::new(
        Arc::new(problem),
        SimulationConfig::default(),
        ObjectiveWeights::new(1.0, 0.0),
    )
    .unwrap();

    let score = objective.score(&OffsetVector::zeros(2)).unwrap();
    assert_eq!(score.cost, score.dump_wait_minutes);
}

#[test]
fn test_stalled_search_stops_early() {
    let params = SolverParams {
        terminations: vec![Termination::EvaluationsWithoutImprovement(5)],
        ..params(SearchStrategy::Grid)
    };
    let outcome = optimize(&OffsetVector::zeros(2), two_contractors(QueueModel::Bucketed), params).unwrap();

    assert_eq!(
        outcome.convergence,
        Convergence::BudgetExhausted(ConvergenceWarning::Terminated(
            Termination::EvaluationsWithoutImprovement(5)
        ))
    );
    assert!(outcome.evaluations < 9 * 9);
    assert!(outcome.best.score.cost <= outcome.baseline.score.cost);
}

#[test]
fn test_zero_duration_returns_the_baseline() {
    let params = SolverParams {
        terminations: vec![Termination::Duration(SignedDuration::ZERO)],
        ..params(SearchStrategy::Grid)
    };
    let outcome = optimize(&OffsetVector::zeros(2), two_contractors(QueueModel::Bucketed), params).unwrap();

    assert_eq!(outcome.evaluations, 1);
    assert_eq!(outcome.best, outcome.baseline);
    assert!(outcome.convergence.warning().is_some());
}

#[test]
fn test_stop_from_another_thread() {
    let solver = Solver::new(two_contractors(QueueModel::Bucketed), params(SearchStrategy::Grid));

    let outcome = std::thread::scope(|scope| {
        let handle = scope.spawn(|| solver.solve());
        solver.stop();
        handle.join().unwrap()
    })
    .unwrap();

    assert!(matches!(
        outcome.convergence,
        Convergence::Cancelled | Convergence::Converged
    ));
    assert!(outcome.best.score.cost <= outcome.baseline.score.cost);
    assert!(solver.is_stopped());
}

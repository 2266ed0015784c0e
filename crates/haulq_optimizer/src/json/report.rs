use std::collections::BTreeMap;

use jiff::SignedDuration;
use serde::Serialize;

use crate::{
    kpi::kpi_set::KpiSet,
    objective::{objective::Evaluation, objective_score::ObjectiveScore},
    problem::haul_problem::HaulProblem,
    simulation::simulator::SimulationResult,
    solver::{
        accepted_offsets::AcceptedOffsets,
        optimization_outcome::{Convergence, OptimizationOutcome},
        search_trace::TraceEntry,
        solver_params::SearchStrategy,
    },
};

pub trait FromProblem<T> {
    fn from_problem(value: T, problem: &HaulProblem) -> Self;
}

#[derive(Debug, Serialize)]
#[serde(rename = "ScoredOffsets")]
pub struct JsonScoredOffsets {
    pub offsets: BTreeMap<String, SignedDuration>,
    pub score: ObjectiveScore,
}

impl FromProblem<&AcceptedOffsets> for JsonScoredOffsets {
    fn from_problem(value: &AcceptedOffsets, problem: &HaulProblem) -> Self {
        JsonScoredOffsets {
            offsets: value.offsets.to_named(problem.contractors()),
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "TraceEntry")]
pub struct JsonTraceEntry {
    pub evaluation: usize,
    pub offsets: BTreeMap<String, SignedDuration>,
    pub cost: f64,
    pub best_so_far: f64,
}

impl FromProblem<&TraceEntry> for JsonTraceEntry {
    fn from_problem(value: &TraceEntry, problem: &HaulProblem) -> Self {
        JsonTraceEntry {
            evaluation: value.evaluation,
            offsets: value.offsets.to_named(problem.contractors()),
            cost: value.score.cost,
            best_so_far: value.best_so_far,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "OptimizationReport")]
pub struct JsonOptimizationReport {
    pub strategy: Option<SearchStrategy>,
    pub convergence: Convergence,
    pub evaluations: usize,
    /// Relative cost reduction of the best offsets against the baseline.
    pub improvement: f64,
    pub baseline: JsonScoredOffsets,
    pub best: JsonScoredOffsets,
    pub changed_contractors: Vec<String>,
    /// Flat KPI set of the best offsets.
    pub kpis: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<JsonTraceEntry>>,
}

impl JsonOptimizationReport {
    pub fn new(
        outcome: &OptimizationOutcome,
        best_kpis: &KpiSet,
        problem: &HaulProblem,
        include_trace: bool,
    ) -> Self {
        let trace = include_trace.then(|| {
            outcome
                .trace
                .entries()
                .iter()
                .map(|entry| JsonTraceEntry::from_problem(entry, problem))
                .collect()
        });

        JsonOptimizationReport {
            strategy: outcome.strategy,
            convergence: outcome.convergence.clone(),
            evaluations: outcome.evaluations,
            improvement: outcome.improvement(),
            baseline: JsonScoredOffsets::from_problem(&outcome.baseline, problem),
            best: JsonScoredOffsets::from_problem(&outcome.best, problem),
            changed_contractors: outcome
                .changed_contractors()
                .into_iter()
                .map(|contractor| problem.contractor(contractor).external_id().to_owned())
                .collect(),
            kpis: best_kpis.metrics(),
            trace,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "SimulationReport")]
pub struct JsonSimulationReport<'a> {
    pub offsets: BTreeMap<String, SignedDuration>,
    pub score: ObjectiveScore,
    pub metrics: BTreeMap<String, f64>,
    pub kpis: &'a KpiSet,
    pub simulation: &'a SimulationResult,
}

impl<'a> FromProblem<&'a Evaluation> for JsonSimulationReport<'a> {
    fn from_problem(value: &'a Evaluation, problem: &HaulProblem) -> Self {
        JsonSimulationReport {
            offsets: value.offsets.to_named(problem.contractors()),
            score: value.score,
            metrics: value.kpis.metrics(),
            kpis: &value.kpis,
            simulation: &value.result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        objective::{objective::Objective, objective_weights::ObjectiveWeights},
        simulation::simulation_config::SimulationConfig,
        problem::offset_vector::OffsetVector,
        solver::search_trace::SearchTrace,
        test_utils::{self, TestRoute},
    };

    #[test]
    fn test_optimization_report_names_contractors() {
        let problem = test_utils::create_problem(
            &[TestRoute::new("A", 4), TestRoute::new("B", 4)],
            test_utils::dump_site(1, 6),
        );
        let objective = Objective::new(
            Arc::new(problem),
            SimulationConfig::default(),
            ObjectiveWeights::default(),
        )
        .unwrap();

        let baseline_offsets = OffsetVector::zeros(2);
        let best_offsets = OffsetVector::from_minutes(&[0, 30]);
        let baseline = AcceptedOffsets::new(
            baseline_offsets.clone(),
            objective.score(&baseline_offsets).unwrap(),
        );
        let best = objective.evaluate(&best_offsets).unwrap();

        let mut trace = SearchTrace::default();
        trace.push(baseline.offsets.clone(), baseline.score);
        trace.push(best.offsets.clone(), best.score);

        let outcome = OptimizationOutcome {
            baseline,
            best: AcceptedOffsets::new(best.offsets.clone(), best.score),
            trace,
            convergence: Convergence::Converged,
            strategy: Some(SearchStrategy::Grid),
            evaluations: 2,
        };

        let report = JsonOptimizationReport::new(&outcome, &best.kpis, objective.problem(), true);
        assert_eq!(report.changed_contractors, vec!["B".to_owned()]);
        assert_eq!(report.best.offsets["B"], SignedDuration::from_mins(30));
        assert_eq!(report.trace.as_ref().map(Vec::len), Some(2));
        assert!(report.kpis.contains_key("contractor.A.trips_per_shift"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["strategy"], "grid");
        assert_eq!(json["convergence"], "converged");
    }
}

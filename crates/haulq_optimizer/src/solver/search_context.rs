use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use jiff::Timestamp;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::HaulError,
    objective::{objective::Objective, objective_score::ObjectiveScore},
    problem::offset_vector::OffsetVector,
};

use super::{
    accepted_offsets::AcceptedOffsets,
    optimization_outcome::{Convergence, ConvergenceWarning},
    search_trace::SearchTrace,
    solver_params::{SolverParams, Termination},
};

pub(crate) type BestSolutionHandler =
    Arc<Mutex<dyn FnMut(&AcceptedOffsets) + Send + Sync + 'static>>;

#[derive(Debug, Clone, PartialEq)]
enum StopReason {
    Cancelled,
    Terminated(Termination),
}

/// State shared by every search strategy: the evaluation pool, the trace,
/// the incumbent and the stop conditions.
pub(crate) struct SearchContext<'a> {
    objective: &'a Objective,
    params: &'a SolverParams,
    pool: rayon::ThreadPool,
    is_stopped: &'a AtomicBool,
    best_solution: &'a RwLock<Option<AcceptedOffsets>>,
    on_best_solution: Option<&'a BestSolutionHandler>,
    started_at: Timestamp,
    trace: SearchTrace,
    best: AcceptedOffsets,
    evaluations_without_improvement: usize,
    stop_reason: Option<StopReason>,
}

impl<'a> SearchContext<'a> {
    /// Evaluates `baseline` as the first trace entry and initial incumbent.
    pub fn new(
        objective: &'a Objective,
        params: &'a SolverParams,
        is_stopped: &'a AtomicBool,
        best_solution: &'a RwLock<Option<AcceptedOffsets>>,
        on_best_solution: Option<&'a BestSolutionHandler>,
        baseline: &OffsetVector,
    ) -> Result<Self, HaulError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.threads.number_of_threads())
            .build()?;

        let score = crate::timer_debug!("Baseline evaluation", objective.score(baseline))?;
        let mut trace = SearchTrace::default();
        trace.push(baseline.clone(), score);

        let context = SearchContext {
            objective,
            params,
            pool,
            is_stopped,
            best_solution,
            on_best_solution,
            started_at: Timestamp::now(),
            trace,
            best: AcceptedOffsets::new(baseline.clone(), score),
            evaluations_without_improvement: 0,
            stop_reason: None,
        };
        context.publish_best();

        Ok(context)
    }

    pub fn params(&self) -> &SolverParams {
        self.params
    }

    pub fn best(&self) -> &AcceptedOffsets {
        &self.best
    }

    pub fn evaluations(&self) -> usize {
        self.trace.len()
    }

    /// Candidates evaluated between two checks of the stop conditions.
    pub fn batch_size(&self) -> usize {
        self.pool.current_num_threads() * 8
    }

    /// Scores `candidates` in parallel and records them in order. Returns
    /// fewer results than candidates when an evaluation budget runs out.
    pub fn evaluate(
        &mut self,
        mut candidates: Vec<OffsetVector>,
    ) -> Result<Vec<AcceptedOffsets>, HaulError> {
        if self.should_stop() {
            return Ok(Vec::new());
        }

        if let Some((remaining, limit)) = self.remaining_evaluations()
            && candidates.len() > remaining
        {
            debug!(
                dropped = candidates.len() - remaining,
                "Evaluation budget cut the batch short"
            );
            candidates.truncate(remaining);
            self.stop_reason = Some(StopReason::Terminated(Termination::Evaluations(limit)));
        }

        let objective = self.objective;
        let scores: Vec<ObjectiveScore> = self.pool.install(|| {
            candidates
                .par_iter()
                .map(|offsets| objective.score(offsets))
                .collect::<Result<Vec<_>, _>>()
        })?;

        let evaluated: Vec<AcceptedOffsets> = candidates
            .into_iter()
            .zip(scores)
            .map(|(offsets, score)| AcceptedOffsets::new(offsets, score))
            .collect();

        for candidate in &evaluated {
            self.record(candidate);
        }

        Ok(evaluated)
    }

    /// Whether the search must end now. Latches the first reason found.
    fn should_stop(&mut self) -> bool {
        if self.stop_reason.is_some() {
            return true;
        }

        if self.is_stopped.load(Ordering::Relaxed) {
            self.stop_reason = Some(StopReason::Cancelled);
            return true;
        }

        let params = self.params;
        if let Some(termination) = params
            .terminations
            .iter()
            .find(|termination| self.is_terminated_by(termination))
        {
            debug!(
                evaluations = self.trace.len(),
                "Termination condition met: {:?}", termination
            );
            self.stop_reason = Some(StopReason::Terminated(termination.clone()));
            return true;
        }

        false
    }

    /// How the search ended if a stop condition holds.
    pub fn check_stop(&mut self) -> Option<Convergence> {
        if !self.should_stop() {
            return None;
        }
        self.stopped()
    }

    /// The latched stop, without checking the conditions again.
    pub fn stopped(&self) -> Option<Convergence> {
        match self.stop_reason.as_ref()? {
            StopReason::Terminated(termination) => Some(Convergence::BudgetExhausted(
                ConvergenceWarning::Terminated(termination.clone()),
            )),
            StopReason::Cancelled => Some(Convergence::Cancelled),
        }
    }

    /// Convergence of a strategy that has no work left.
    pub fn converged(&self) -> Convergence {
        self.stopped().unwrap_or(Convergence::Converged)
    }

    pub fn finish(self) -> (SearchTrace, AcceptedOffsets) {
        (self.trace, self.best)
    }

    fn record(&mut self, candidate: &AcceptedOffsets) {
        self.trace
            .push(candidate.offsets.clone(), candidate.score);

        if candidate.is_better_than(&self.best, self.params.tie_tolerance) {
            debug!(
                evaluation = self.trace.len() - 1,
                "New best offsets {:?}: {}", candidate.offsets, candidate.score
            );
            self.best = candidate.clone();
            self.evaluations_without_improvement = 0;
            self.publish_best();
        } else {
            self.evaluations_without_improvement += 1;
        }
    }

    fn publish_best(&self) {
        *self.best_solution.write() = Some(self.best.clone());
        if let Some(callback) = self.on_best_solution {
            callback.lock()(&self.best);
        }
    }

    /// Evaluations left under the tightest `Evaluations` budget, with that budget.
    fn remaining_evaluations(&self) -> Option<(usize, usize)> {
        self.params
            .terminations
            .iter()
            .filter_map(|termination| match termination {
                Termination::Evaluations(limit) => {
                    Some((limit.saturating_sub(self.trace.len()), *limit))
                }
                _ => None,
            })
            .min_by_key(|&(remaining, _)| remaining)
    }

    fn is_terminated_by(&self, termination: &Termination) -> bool {
        match termination {
            Termination::Duration(duration) => {
                Timestamp::now().duration_since(self.started_at) >= *duration
            }
            Termination::Evaluations(limit) => self.trace.len() >= *limit,
            Termination::EvaluationsWithoutImprovement(limit) => {
                self.evaluations_without_improvement >= *limit
            }
        }
    }
}

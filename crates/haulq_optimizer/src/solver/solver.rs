use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use jiff::Timestamp;
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    error::{DataInsufficiencyError, HaulError},
    objective::objective::Objective,
    problem::{horizon::HorizonPolicy, offset_vector::OffsetVector},
};

use super::{
    accepted_offsets::AcceptedOffsets,
    coordinate_descent, grid_search, monte_carlo,
    offset_domain::OffsetDomain,
    optimization_outcome::{Convergence, OptimizationOutcome},
    search_context::{BestSolutionHandler, SearchContext},
    search_trace::SearchTrace,
    solver_params::{SearchStrategy, SolverParams},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum SolverStatus {
    Pending,
    Running,
    Completed,
}

pub struct Solver {
    objective: Arc<Objective>,
    params: SolverParams,
    status: RwLock<SolverStatus>,
    best_solution: RwLock<Option<AcceptedOffsets>>,
    is_stopped: Arc<AtomicBool>,
    on_best_solution_handler: Option<BestSolutionHandler>,
    created_at: Timestamp,
}

impl Solver {
    pub fn new(objective: Arc<Objective>, params: SolverParams) -> Self {
        Solver {
            objective,
            params,
            status: RwLock::new(SolverStatus::Pending),
            best_solution: RwLock::new(None),
            is_stopped: Arc::new(AtomicBool::new(false)),
            on_best_solution_handler: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn on_best_solution<F>(&mut self, callback: F)
    where
        F: FnMut(&AcceptedOffsets) + Send + Sync + 'static,
    {
        self.on_best_solution_handler = Some(Arc::new(Mutex::new(callback)));
    }

    /// Searches from the contractors' current offsets.
    pub fn solve(&self) -> Result<OptimizationOutcome, HaulError> {
        let initial = self.objective.problem().baseline_offsets();
        self.solve_from(&initial)
    }

    #[instrument(skip_all, level = "debug")]
    pub fn solve_from(&self, initial: &OffsetVector) -> Result<OptimizationOutcome, HaulError> {
        *self.status.write() = SolverStatus::Running;
        let outcome = self.run(initial);
        *self.status.write() = SolverStatus::Completed;
        outcome
    }

    fn run(&self, initial: &OffsetVector) -> Result<OptimizationOutcome, HaulError> {
        self.params.validate()?;

        let problem = self.objective.problem();
        let contractors = problem.contractors();
        initial.validate(contractors)?;

        if contractors.is_empty() {
            let score = self.objective.score(initial)?;
            let baseline = AcceptedOffsets::new(initial.clone(), score);
            *self.best_solution.write() = Some(baseline.clone());

            return Ok(OptimizationOutcome {
                best: baseline.clone(),
                baseline,
                trace: SearchTrace::default(),
                convergence: Convergence::Converged,
                strategy: None,
                evaluations: 0,
            });
        }

        if !problem.has_records() {
            return Err(DataInsufficiencyError::NoRecords {
                contractors: contractors.len(),
            }
            .into());
        }

        let leaving = problem.trips_leaving_horizon();
        if leaving > 0 && self.objective.config().horizon_policy == HorizonPolicy::Exclude {
            warn!(
                trips = leaving,
                "Some offsets move trips outside the horizon, excluded trips leave the wait averages"
            );
        }

        let domain = OffsetDomain::new(contractors, self.params.step)?;
        let size = domain.size();
        let strategy = match (self.params.strategy, size) {
            (SearchStrategy::Auto, Some(size)) if size <= self.params.grid_ceiling => {
                SearchStrategy::Grid
            }
            (SearchStrategy::Auto, _) => self.params.fallback.into(),
            (strategy, _) => strategy,
        };

        info!(
            contractors = contractors.len(),
            grid_size = ?size,
            ?strategy,
            "Starting offset search"
        );

        let mut context = SearchContext::new(
            &self.objective,
            &self.params,
            &self.is_stopped,
            &self.best_solution,
            self.on_best_solution_handler.as_ref(),
            initial,
        )?;
        let baseline = context.best().clone();

        let convergence = crate::timer_debug!("Offset search", {
            match (strategy, size) {
                (SearchStrategy::Grid, Some(size)) => grid_search::run(&mut context, &domain, size),
                (SearchStrategy::Grid, None) => {
                    warn!("Offset grid too large to enumerate, using coordinate descent");
                    coordinate_descent::run(&mut context, &domain)
                }
                (SearchStrategy::MonteCarlo, _) => monte_carlo::run(&mut context, &domain),
                _ => coordinate_descent::run(&mut context, &domain),
            }
        })?;

        match &convergence {
            Convergence::BudgetExhausted(warning) => {
                warn!("Offset search returned its best so far: {warning}");
            }
            Convergence::Cancelled => warn!("Offset search cancelled"),
            Convergence::Converged => {}
        }

        let evaluations = context.evaluations();
        let (trace, best) = context.finish();

        info!(
            evaluations,
            baseline = baseline.score.cost,
            best = best.score.cost,
            "Offset search finished"
        );

        Ok(OptimizationOutcome {
            baseline,
            best,
            trace,
            convergence,
            strategy: Some(strategy),
            evaluations,
        })
    }

    /// Asks a running search to return its best so far. Takes effect at the
    /// next batch boundary.
    pub fn stop(&self) {
        self.is_stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.is_stopped.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> SolverStatus {
        *self.status.read()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn current_best(&self) -> Option<MappedRwLockReadGuard<'_, AcceptedOffsets>> {
        RwLockReadGuard::try_map(self.best_solution.read(), |best| best.as_ref()).ok()
    }
}

/// Runs one search from `initial` and returns its outcome.
pub fn optimize(
    initial: &OffsetVector,
    objective: Arc<Objective>,
    params: SolverParams,
) -> Result<OptimizationOutcome, HaulError> {
    Solver::new(objective, params).solve_from(initial)
}

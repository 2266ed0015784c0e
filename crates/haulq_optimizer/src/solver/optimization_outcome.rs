use std::fmt;

use serde::Serialize;

use crate::problem::contractor::ContractorIdx;

use super::{
    accepted_offsets::AcceptedOffsets,
    search_trace::SearchTrace,
    solver_params::{SearchStrategy, Termination},
};

/// Why a search returned its best-so-far instead of a converged result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceWarning {
    RoundsExhausted { rounds: usize },
    Terminated(Termination),
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvergenceWarning::RoundsExhausted { rounds } => {
                write!(f, "still improving after {rounds} rounds")
            }
            ConvergenceWarning::Terminated(termination) => {
                write!(f, "stopped by {termination:?}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Convergence {
    /// The strategy ran to completion.
    Converged,
    BudgetExhausted(ConvergenceWarning),
    Cancelled,
}

impl Convergence {
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged)
    }

    pub fn warning(&self) -> Option<&ConvergenceWarning> {
        match self {
            Convergence::BudgetExhausted(warning) => Some(warning),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    pub baseline: AcceptedOffsets,
    pub best: AcceptedOffsets,
    pub trace: SearchTrace,
    pub convergence: Convergence,
    /// Strategy that actually ran, `None` when there was nothing to search.
    pub strategy: Option<SearchStrategy>,
    pub evaluations: usize,
}

impl OptimizationOutcome {
    /// Relative cost reduction against the baseline, 0 when the baseline costs nothing.
    pub fn improvement(&self) -> f64 {
        let baseline = self.baseline.score.cost;
        if baseline <= 0.0 {
            return 0.0;
        }
        (baseline - self.best.score.cost) / baseline
    }

    pub fn changed_contractors(&self) -> Vec<ContractorIdx> {
        self.best
            .offsets
            .iter()
            .zip(self.baseline.offsets.iter())
            .filter(|((_, best), (_, baseline))| best != baseline)
            .map(|((contractor, _), _)| contractor)
            .collect()
    }
}

use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Grid search when the grid fits under the ceiling, the fallback otherwise.
    #[default]
    Auto,
    Grid,
    CoordinateDescent,
    MonteCarlo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    #[default]
    CoordinateDescent,
    MonteCarlo,
}

impl From<FallbackStrategy> for SearchStrategy {
    fn from(fallback: FallbackStrategy) -> Self {
        match fallback {
            FallbackStrategy::CoordinateDescent => SearchStrategy::CoordinateDescent,
            FallbackStrategy::MonteCarlo => SearchStrategy::MonteCarlo,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Duration(SignedDuration),
    Evaluations(usize),
    EvaluationsWithoutImprovement(usize),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Threads {
    #[default]
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct SolverParams {
    pub strategy: SearchStrategy,
    pub fallback: FallbackStrategy,
    /// Spacing of candidate offsets within each contractor's bounds.
    pub step: SignedDuration,
    /// Largest grid searched exhaustively under `SearchStrategy::Auto`.
    pub grid_ceiling: usize,
    /// Costs this close are equal; the smaller total shift wins.
    pub tie_tolerance: f64,
    /// Minimum cost decrease for coordinate descent to accept a move.
    pub improvement_epsilon: f64,
    pub max_rounds: usize,
    pub monte_carlo_samples: usize,
    pub seed: u64,
    pub threads: Threads,
    pub terminations: Vec<Termination>,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            strategy: SearchStrategy::default(),
            fallback: FallbackStrategy::default(),
            step: SignedDuration::from_mins(15),
            grid_ceiling: 10_000,
            tie_tolerance: 1e-9,
            improvement_epsilon: 1e-6,
            max_rounds: 50,
            monte_carlo_samples: 500,
            seed: 2_427_121,
            threads: Threads::default(),
            terminations: vec![Termination::Duration(SignedDuration::from_mins(2))],
        }
    }
}

impl SolverParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.step <= SignedDuration::ZERO {
            return Err(ValidationError::NonPositiveStep(self.step));
        }
        if self.terminations.is_empty() {
            return Err(ValidationError::NoTermination);
        }
        Ok(())
    }
}

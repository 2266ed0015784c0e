use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::{
    error::{HaulError, ValidationError},
    kpi::kpi_set::KpiSet,
    problem::{haul_problem::HaulProblem, offset_vector::OffsetVector},
    simulation::{
        simulation_config::SimulationConfig,
        simulator::{SimulationResult, simulate},
    },
};

use super::{objective_score::ObjectiveScore, objective_weights::ObjectiveWeights};

/// Everything one offset vector produces.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub offsets: OffsetVector,
    pub score: ObjectiveScore,
    pub kpis: KpiSet,
    pub result: SimulationResult,
}

/// Maps an offset vector to a scalar cost: the weighted sum of the fleet's
/// average dump and loading waits, in minutes. Deterministic for a given
/// problem and configuration.
///
/// Under [`HorizonPolicy::Exclude`](crate::problem::horizon::HorizonPolicy)
/// trips pushed outside an explicit horizon drop out of the averages, so such
/// a horizon should cover every offset the bounds allow. See
/// [`HaulProblem::trips_leaving_horizon`].
pub struct Objective {
    problem: Arc<HaulProblem>,
    config: SimulationConfig,
    weights: ObjectiveWeights,
}

impl Objective {
    pub fn new(
        problem: Arc<HaulProblem>,
        config: SimulationConfig,
        weights: ObjectiveWeights,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        weights.validate()?;

        Ok(Objective {
            problem,
            config,
            weights,
        })
    }

    pub fn problem(&self) -> &HaulProblem {
        &self.problem
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    /// Full evaluation of one offset vector. Logs a warning for arrivals
    /// left out by the horizon policy and for overloaded sites.
    pub fn evaluate(&self, offsets: &OffsetVector) -> Result<Evaluation, HaulError> {
        let evaluation = self.run(offsets)?;

        if evaluation.kpis.fleet.excluded_arrivals > 0 {
            warn!(
                excluded = evaluation.kpis.fleet.excluded_arrivals,
                policy = ?self.config.horizon_policy,
                "Arrivals outside the horizon were left out"
            );
        }
        for site in &evaluation.kpis.sites {
            if site.overloaded_buckets > 0 {
                warn!(
                    site = %site.external_id,
                    buckets = site.overloaded_buckets,
                    residual_queue = site.residual_queue,
                    "Arrivals exceed capacity"
                );
            }
        }

        Ok(evaluation)
    }

    pub fn score(&self, offsets: &OffsetVector) -> Result<ObjectiveScore, HaulError> {
        self.run(offsets).map(|evaluation| evaluation.score)
    }

    fn run(&self, offsets: &OffsetVector) -> Result<Evaluation, HaulError> {
        let result = simulate(&self.problem, offsets, &self.config)?;
        let kpis = KpiSet::calculate(&self.problem, &result, self.config.shift_length);
        let score = self.score_kpis(&kpis);

        Ok(Evaluation {
            offsets: offsets.clone(),
            score,
            kpis,
            result,
        })
    }

    pub fn score_kpis(&self, kpis: &KpiSet) -> ObjectiveScore {
        let dump_wait_minutes = kpis.fleet.avg_dump_wait_minutes;
        let load_wait_minutes = kpis.fleet.avg_load_wait_minutes;

        ObjectiveScore {
            cost: self.weights.combine(dump_wait_minutes, load_wait_minutes),
            dump_wait_minutes,
            load_wait_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, TestRoute};

    fn objective(routes: &[TestRoute]) -> Objective {
        let problem = test_utils::create_problem(routes, test_utils::dump_site(1, 6));
        Objective::new(
            Arc::new(problem),
            SimulationConfig::default(),
            ObjectiveWeights::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_score_is_idempotent() {
        let objective = objective(&[TestRoute::new("A", 10), TestRoute::new("B", 10)]);
        let offsets = OffsetVector::from_minutes(&[-15, 45]);

        let first = objective.score(&offsets).unwrap();
        let second = objective.score(&offsets).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_score_weights_dump_wait() {
        let objective = objective(&[TestRoute::new("A", 10)]);
        let score = objective.score(&OffsetVector::zeros(1)).unwrap();

        assert!(score.dump_wait_minutes > 0.0);
        assert_eq!(score.load_wait_minutes, 0.0);
        assert!((score.cost - 0.7 * score.dump_wait_minutes).abs() < 1e-9);
    }

    #[test]
    fn test_separating_contractors_lowers_cost() {
        let objective = objective(&[TestRoute::new("A", 10), TestRoute::new("B", 10)]);
        let together = objective.score(&OffsetVector::zeros(2)).unwrap();
        let apart = objective.score(&OffsetVector::from_minutes(&[0, 60])).unwrap();
        assert!(apart < together);
    }

    #[test]
    fn test_rejects_out_of_bounds_offsets() {
        let objective = objective(&[TestRoute::new("A", 1)]);
        assert!(matches!(
            objective.score(&OffsetVector::from_minutes(&[121])),
            Err(HaulError::Validation(ValidationError::OffsetOutOfBounds { .. }))
        ));
    }

    #[test]
    fn test_invalid_weights_are_rejected() {
        let problem = test_utils::create_problem(&[TestRoute::new("A", 1)], test_utils::dump_site(1, 6));
        assert!(
            Objective::new(
                Arc::new(problem),
                SimulationConfig::default(),
                ObjectiveWeights::new(-1.0, 0.0)
            )
            .is_err()
        );
    }
}

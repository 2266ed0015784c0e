use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, problem::horizon::HorizonPolicy};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueueModel {
    /// Fluid backlog per time bucket.
    #[default]
    Bucketed,
    /// Truck-by-truck FIFO across the site's servers.
    EventDriven,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Variability {
    #[default]
    Deterministic,
    /// Each service time is scaled by a factor drawn uniformly from
    /// `[1 - coefficient, 1 + coefficient]`.
    Perturbed { coefficient: f64, seed: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub bucket_width: SignedDuration,
    pub horizon_policy: HorizonPolicy,
    pub queue_model: QueueModel,
    pub variability: Variability,
    /// Working time per shift, used to turn cycle times into trip counts.
    pub shift_length: SignedDuration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            bucket_width: SignedDuration::from_mins(15),
            horizon_policy: HorizonPolicy::default(),
            queue_model: QueueModel::default(),
            variability: Variability::default(),
            shift_length: SignedDuration::from_mins(570),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bucket_width <= SignedDuration::ZERO {
            return Err(ValidationError::NonPositiveBucketWidth(self.bucket_width));
        }

        if let Variability::Perturbed { coefficient, .. } = self.variability
            && !(0.0..1.0).contains(&coefficient)
        {
            return Err(ValidationError::InvalidVariability(coefficient));
        }

        Ok(())
    }
}

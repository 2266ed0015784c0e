use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Relative importance of dump-site and loading-site waits. Used as given,
/// without normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectiveWeights {
    pub dump: f64,
    pub load: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        ObjectiveWeights {
            dump: 0.7,
            load: 0.3,
        }
    }
}

impl ObjectiveWeights {
    pub fn new(dump: f64, load: f64) -> Self {
        ObjectiveWeights { dump, load }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [("dump", self.dump), ("load", self.load)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }

    pub fn combine(&self, dump_wait_minutes: f64, load_wait_minutes: f64) -> f64 {
        self.dump * dump_wait_minutes + self.load * load_wait_minutes
    }
}

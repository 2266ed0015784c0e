use std::{cmp::Ordering, fmt};

use schemars::JsonSchema;
use serde::Serialize;

/// Weighted wait cost of one offset vector. Lower is better.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ObjectiveScore {
    pub cost: f64,
    pub dump_wait_minutes: f64,
    pub load_wait_minutes: f64,
}

impl ObjectiveScore {
    pub const ZERO: ObjectiveScore = ObjectiveScore {
        cost: 0.0,
        dump_wait_minutes: 0.0,
        load_wait_minutes: 0.0,
    };

    pub const MAX: ObjectiveScore = ObjectiveScore {
        cost: f64::MAX,
        dump_wait_minutes: f64::MAX,
        load_wait_minutes: f64::MAX,
    };

    /// Whether `self` beats `other` by more than `epsilon`.
    pub fn improves_on(&self, other: &ObjectiveScore, epsilon: f64) -> bool {
        self.cost < other.cost - epsilon
    }

    pub fn ties_with(&self, other: &ObjectiveScore, tolerance: f64) -> bool {
        (self.cost - other.cost).abs() <= tolerance
    }
}

impl Eq for ObjectiveScore {}

impl PartialOrd for ObjectiveScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectiveScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost.total_cmp(&other.cost)
    }
}

impl fmt::Display for ObjectiveScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} (dump {:.2} min, load {:.2} min)",
            self.cost, self.dump_wait_minutes, self.load_wait_minutes
        )
    }
}

use serde::Serialize;

use crate::{objective::objective_score::ObjectiveScore, problem::offset_vector::OffsetVector};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedOffsets {
    pub offsets: OffsetVector,
    pub score: ObjectiveScore,
}

impl AcceptedOffsets {
    pub fn new(offsets: OffsetVector, score: ObjectiveScore) -> Self {
        AcceptedOffsets { offsets, score }
    }

    /// Lower cost wins. Costs within `tolerance` tie, and the tie goes to
    /// the smaller total shift; remaining ties keep the incumbent.
    pub fn is_better_than(&self, incumbent: &AcceptedOffsets, tolerance: f64) -> bool {
        if self.score.ties_with(&incumbent.score, tolerance) {
            self.offsets.l1_norm() < incumbent.offsets.l1_norm()
        } else {
            self.score.cost < incumbent.score.cost
        }
    }
}

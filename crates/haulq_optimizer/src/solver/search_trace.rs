use serde::Serialize;

use crate::{objective::objective_score::ObjectiveScore, problem::offset_vector::OffsetVector};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub evaluation: usize,
    pub offsets: OffsetVector,
    pub score: ObjectiveScore,
    /// Lowest cost seen up to and including this evaluation.
    pub best_so_far: f64,
}

/// Every evaluation of a search in the order it was recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SearchTrace {
    entries: Vec<TraceEntry>,
}

impl SearchTrace {
    pub fn push(&mut self, offsets: OffsetVector, score: ObjectiveScore) {
        let best_so_far = self
            .entries
            .last()
            .map_or(score.cost, |last| last.best_so_far.min(score.cost));

        self.entries.push(TraceEntry {
            evaluation: self.entries.len(),
            offsets,
            score,
            best_so_far,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn best_so_far(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|entry| entry.best_so_far)
    }
}

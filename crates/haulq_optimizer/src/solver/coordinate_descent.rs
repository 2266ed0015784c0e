use tracing::{debug, instrument, warn};

use crate::{error::HaulError, problem::contractor::ContractorIdx};

use super::{
    accepted_offsets::AcceptedOffsets,
    offset_domain::OffsetDomain,
    optimization_outcome::{Convergence, ConvergenceWarning},
    search_context::SearchContext,
};

/// A move is taken when it lowers the cost by more than `epsilon`, or when it
/// ties and shifts the fleet less. Both strictly decrease, so moves never cycle.
fn accepts(
    candidate: &AcceptedOffsets,
    current: &AcceptedOffsets,
    epsilon: f64,
    tolerance: f64,
) -> bool {
    candidate.score.improves_on(&current.score, epsilon)
        || (candidate.score.ties_with(&current.score, tolerance)
            && candidate.offsets.l1_norm() < current.offsets.l1_norm())
}

/// Sweeps contractors in order, moving each to its best value with the
/// others held fixed, until a full round makes no move.
#[instrument(skip_all, level = "debug")]
pub(crate) fn run(
    context: &mut SearchContext,
    domain: &OffsetDomain,
) -> Result<Convergence, HaulError> {
    let epsilon = context.params().improvement_epsilon;
    let tolerance = context.params().tie_tolerance;
    let max_rounds = context.params().max_rounds;

    let mut current = context.best().clone();

    for round in 0..max_rounds {
        let mut moved = false;

        for contractor in ContractorIdx::range(domain.contractors()) {
            if let Some(convergence) = context.check_stop() {
                return Ok(convergence);
            }

            let position = current.offsets.get(contractor);
            let candidates = domain
                .values(contractor.get())
                .iter()
                .filter(|&&offset| offset != position)
                .map(|&offset| current.offsets.with_offset(contractor, offset))
                .collect();

            let best_move = context
                .evaluate(candidates)?
                .into_iter()
                .reduce(|best, candidate| {
                    if candidate.is_better_than(&best, tolerance) {
                        candidate
                    } else {
                        best
                    }
                });

            if let Some(candidate) = best_move
                && accepts(&candidate, &current, epsilon, tolerance)
            {
                current = candidate;
                moved = true;
            }
        }

        debug!(
            round,
            cost = current.score.cost,
            "Coordinate descent round finished"
        );

        if !moved {
            return Ok(context.converged());
        }
    }

    warn!(
        rounds = max_rounds,
        "Coordinate descent still improving when the round limit was reached"
    );
    Ok(Convergence::BudgetExhausted(
        ConvergenceWarning::RoundsExhausted { rounds: max_rounds },
    ))
}

use tracing::instrument;

use crate::error::HaulError;

use super::{
    offset_domain::OffsetDomain, optimization_outcome::Convergence,
    search_context::SearchContext,
};

/// Evaluates every point of the domain in enumeration order, one parallel
/// batch at a time.
#[instrument(skip_all, level = "debug")]
pub(crate) fn run(
    context: &mut SearchContext,
    domain: &OffsetDomain,
    size: usize,
) -> Result<Convergence, HaulError> {
    let baseline = context.best().offsets.clone();
    let batch_size = context.batch_size();

    let mut next = 0;
    while next < size {
        if let Some(convergence) = context.check_stop() {
            return Ok(convergence);
        }

        let end = (next + batch_size).min(size);
        let batch = (next..end)
            .map(|index| domain.nth(index))
            .filter(|offsets| *offsets != baseline)
            .collect();
        next = end;

        context.evaluate(batch)?;
    }

    Ok(context.converged())
}

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::instrument;

use crate::error::HaulError;

use super::{
    offset_domain::OffsetDomain, optimization_outcome::Convergence,
    search_context::SearchContext,
};

#[instrument(skip_all, level = "debug")]
pub(crate) fn run(
    context: &mut SearchContext,
    domain: &OffsetDomain,
) -> Result<Convergence, HaulError> {
    let mut rng = SmallRng::seed_from_u64(context.params().seed);
    let samples = context.params().monte_carlo_samples;
    run_with_rng(context, domain, samples, &mut rng)
}

/// Draws `samples` uniform grid points. Draws happen on the calling thread so
/// the sequence only depends on the generator.
pub(crate) fn run_with_rng<R: Rng>(
    context: &mut SearchContext,
    domain: &OffsetDomain,
    samples: usize,
    rng: &mut R,
) -> Result<Convergence, HaulError> {
    let batch_size = context.batch_size();

    let mut drawn = 0;
    while drawn < samples {
        if let Some(convergence) = context.check_stop() {
            return Ok(convergence);
        }

        let count = batch_size.min(samples - drawn);
        let batch = (0..count).map(|_| domain.sample(rng)).collect();
        drawn += count;

        context.evaluate(batch)?;
    }

    Ok(context.converged())
}

use jiff::SignedDuration;
use rand::Rng;

use crate::{
    error::ValidationError,
    problem::{contractor::Contractor, offset_vector::OffsetVector},
};

/// Candidate offsets per contractor: every multiple of the step within the
/// bounds, plus the bounds themselves and the contractor's current offset.
#[derive(Debug, Clone)]
pub struct OffsetDomain {
    values: Vec<Vec<SignedDuration>>,
}

impl OffsetDomain {
    pub fn new(contractors: &[Contractor], step: SignedDuration) -> Result<Self, ValidationError> {
        if step <= SignedDuration::ZERO {
            return Err(ValidationError::NonPositiveStep(step));
        }

        let step_nanos = step.as_nanos();
        let values = contractors
            .iter()
            .map(|contractor| {
                let bounds = contractor.bounds();
                let low = bounds.min.as_nanos().div_euclid(step_nanos);
                let high = bounds.max.as_nanos().div_euclid(step_nanos);

                let mut values: Vec<SignedDuration> = (low..=high)
                    .filter_map(|k| i64::try_from(k * step_nanos).ok())
                    .map(SignedDuration::from_nanos)
                    .filter(|&offset| bounds.contains(offset))
                    .collect();
                values.extend([bounds.min, bounds.max, contractor.current_offset()]);
                values.sort();
                values.dedup();
                values
            })
            .collect();

        Ok(OffsetDomain { values })
    }

    pub fn contractors(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self, contractor: usize) -> &[SignedDuration] {
        &self.values[contractor]
    }

    /// Number of grid points, `None` when it does not fit in a `usize`.
    pub fn size(&self) -> Option<usize> {
        self.values
            .iter()
            .try_fold(1usize, |size, values| size.checked_mul(values.len()))
    }

    /// Grid point number `index`, the first contractor varying slowest.
    pub fn nth(&self, mut index: usize) -> OffsetVector {
        let mut offsets = vec![SignedDuration::ZERO; self.values.len()];
        for (slot, values) in offsets.iter_mut().zip(&self.values).rev() {
            *slot = values[index % values.len()];
            index /= values.len();
        }
        offsets.into_iter().collect()
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> OffsetVector {
        self.values
            .iter()
            .map(|values| values[rng.random_range(0..values.len())])
            .collect()
    }
}

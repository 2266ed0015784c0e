use std::collections::BTreeMap;

use jiff::SignedDuration;
use serde::Serialize;
use smallvec::SmallVec;

use crate::error::ValidationError;

use super::contractor::{Contractor, ContractorIdx};

/// Departure shift per contractor, addressed by [`ContractorIdx`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OffsetVector {
    offsets: SmallVec<[SignedDuration; 8]>,
}

impl OffsetVector {
    pub fn zeros(len: usize) -> Self {
        OffsetVector {
            offsets: SmallVec::from_elem(SignedDuration::ZERO, len),
        }
    }

    pub fn from_minutes(minutes: &[i64]) -> Self {
        minutes
            .iter()
            .map(|&minutes| SignedDuration::from_mins(minutes))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn get(&self, contractor: ContractorIdx) -> SignedDuration {
        self.offsets[contractor.get()]
    }

    pub fn set(&mut self, contractor: ContractorIdx, offset: SignedDuration) {
        self.offsets[contractor.get()] = offset;
    }

    /// Copy of `self` with a single contractor shifted to `offset`.
    pub fn with_offset(&self, contractor: ContractorIdx, offset: SignedDuration) -> Self {
        let mut offsets = self.clone();
        offsets.set(contractor, offset);
        offsets
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContractorIdx, SignedDuration)> + '_ {
        self.offsets
            .iter()
            .enumerate()
            .map(|(index, &offset)| (ContractorIdx::new(index), offset))
    }

    /// Total absolute shift, used to prefer the least disruptive of equal schedules.
    pub fn l1_norm(&self) -> SignedDuration {
        self.offsets
            .iter()
            .fold(SignedDuration::ZERO, |total, offset| total + offset.abs())
    }

    pub fn validate(&self, contractors: &[Contractor]) -> Result<(), ValidationError> {
        if self.len() != contractors.len() {
            return Err(ValidationError::OffsetCountMismatch {
                expected: contractors.len(),
                actual: self.len(),
            });
        }

        self.offsets
            .iter()
            .zip(contractors)
            .try_for_each(|(&offset, contractor)| contractor.check_offset(offset))
    }

    pub fn to_named(&self, contractors: &[Contractor]) -> BTreeMap<String, SignedDuration> {
        contractors
            .iter()
            .zip(&self.offsets)
            .map(|(contractor, &offset)| (contractor.external_id().to_owned(), offset))
            .collect()
    }
}

impl FromIterator<SignedDuration> for OffsetVector {
    fn from_iter<I: IntoIterator<Item = SignedDuration>>(iter: I) -> Self {
        OffsetVector {
            offsets: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::contractor::OffsetBounds;

    #[test]
    fn test_l1_norm() {
        let offsets = OffsetVector::from_minutes(&[-30, 0, 45]);
        assert_eq!(offsets.l1_norm(), SignedDuration::from_mins(75));
        assert_eq!(OffsetVector::zeros(3).l1_norm(), SignedDuration::ZERO);
    }

    #[test]
    fn test_validate() {
        let contractors = vec![
            Contractor::new("A", 1),
            Contractor::new("B", 1)
                .with_bounds(OffsetBounds::symmetric(SignedDuration::from_mins(30))),
        ];

        assert!(OffsetVector::from_minutes(&[120, 30]).validate(&contractors).is_ok());
        assert!(matches!(
            OffsetVector::from_minutes(&[0, 45]).validate(&contractors),
            Err(ValidationError::OffsetOutOfBounds { contractor, .. }) if contractor == "B"
        ));
        assert!(matches!(
            OffsetVector::zeros(1).validate(&contractors),
            Err(ValidationError::OffsetCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_to_named() {
        let contractors = vec![Contractor::new("A", 1), Contractor::new("B", 1)];
        let offsets = OffsetVector::zeros(2).with_offset(ContractorIdx::new(1), SignedDuration::from_mins(15));
        let named = offsets.to_named(&contractors);
        assert_eq!(named["A"], SignedDuration::ZERO);
        assert_eq!(named["B"], SignedDuration::from_mins(15));
    }
}

use jiff::{SignedDuration, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{define_index_newtype, error::ValidationError};

define_index_newtype!(ContractorIdx, Contractor);

/// Inclusive range of departure offsets the optimizer may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OffsetBounds {
    pub min: SignedDuration,
    pub max: SignedDuration,
}

impl Default for OffsetBounds {
    fn default() -> Self {
        OffsetBounds {
            min: SignedDuration::from_mins(-120),
            max: SignedDuration::from_mins(120),
        }
    }
}

impl OffsetBounds {
    pub fn new(min: SignedDuration, max: SignedDuration) -> Self {
        OffsetBounds { min, max }
    }

    pub fn symmetric(radius: SignedDuration) -> Self {
        let radius = radius.abs();
        OffsetBounds {
            min: -radius,
            max: radius,
        }
    }

    pub fn contains(&self, offset: SignedDuration) -> bool {
        offset >= self.min && offset <= self.max
    }

    /// Largest shift, in either direction, these bounds allow.
    pub fn reach(&self) -> SignedDuration {
        self.min.abs().max(self.max.abs())
    }
}

/// Trucks of a contractor leave one after another, `spacing` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepartureSchedule {
    first_departure: Timestamp,
    spacing: SignedDuration,
}

impl DepartureSchedule {
    pub const DEFAULT_SPACING: SignedDuration = SignedDuration::from_secs(72);

    pub fn new(first_departure: Timestamp) -> Self {
        DepartureSchedule {
            first_departure,
            spacing: Self::DEFAULT_SPACING,
        }
    }

    pub fn with_spacing(mut self, spacing: SignedDuration) -> Self {
        self.spacing = spacing.abs();
        self
    }

    pub fn first_departure(&self) -> Timestamp {
        self.first_departure
    }

    pub fn spacing(&self) -> SignedDuration {
        self.spacing
    }

    pub fn departures(&self, trucks: usize) -> impl Iterator<Item = Timestamp> + '_ {
        let mut departure = self.first_departure;
        (0..trucks).map(move |_| {
            let current = departure;
            departure += self.spacing;
            current
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Contractor {
    external_id: String,
    truck_count: usize,
    bounds: OffsetBounds,
    current_offset: SignedDuration,
    schedule: Option<DepartureSchedule>,
}

impl Contractor {
    pub fn new(external_id: impl Into<String>, truck_count: usize) -> Self {
        Contractor {
            external_id: external_id.into(),
            truck_count,
            bounds: OffsetBounds::default(),
            current_offset: SignedDuration::ZERO,
            schedule: None,
        }
    }

    pub fn with_bounds(mut self, bounds: OffsetBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_current_offset(mut self, offset: SignedDuration) -> Self {
        self.current_offset = offset;
        self
    }

    pub fn with_schedule(mut self, schedule: DepartureSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn truck_count(&self) -> usize {
        self.truck_count
    }

    pub fn bounds(&self) -> OffsetBounds {
        self.bounds
    }

    pub fn current_offset(&self) -> SignedDuration {
        self.current_offset
    }

    pub fn schedule(&self) -> Option<&DepartureSchedule> {
        self.schedule.as_ref()
    }

    pub fn check_offset(&self, offset: SignedDuration) -> Result<(), ValidationError> {
        if self.bounds.contains(offset) {
            Ok(())
        } else {
            Err(ValidationError::OffsetOutOfBounds {
                contractor: self.external_id.clone(),
                offset,
                min: self.bounds.min,
                max: self.bounds.max,
            })
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.bounds.min > self.bounds.max {
            return Err(ValidationError::InvertedBounds {
                contractor: self.external_id.clone(),
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }
        self.check_offset(self.current_offset)
    }
}

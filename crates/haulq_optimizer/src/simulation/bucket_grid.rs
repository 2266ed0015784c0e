use jiff::{SignedDuration, Timestamp, tz::TimeZone};

use crate::{
    error::ValidationError,
    problem::{
        haul_problem::HaulProblem,
        horizon::{Horizon, HorizonPolicy, Placement, TimeBucket},
        site::Site,
    },
    utils::time::minutes,
};

/// The horizon cut into equal-width buckets, shared by every site of a run.
#[derive(Debug, Clone)]
pub struct BucketGrid {
    horizon: Horizon,
    width: SignedDuration,
    buckets: Vec<TimeBucket>,
    time_zone: TimeZone,
}

impl BucketGrid {
    pub fn new(
        horizon: Horizon,
        width: SignedDuration,
        time_zone: TimeZone,
    ) -> Result<Self, ValidationError> {
        if width <= SignedDuration::ZERO {
            return Err(ValidationError::NonPositiveBucketWidth(width));
        }

        Ok(BucketGrid {
            buckets: horizon.buckets(width),
            horizon,
            width,
            time_zone,
        })
    }

    pub fn for_problem(
        problem: &HaulProblem,
        width: SignedDuration,
    ) -> Result<Self, ValidationError> {
        Self::new(*problem.horizon(), width, problem.time_zone().clone())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn width(&self) -> SignedDuration {
        self.width
    }

    pub fn width_minutes(&self) -> f64 {
        minutes(self.width)
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn buckets(&self) -> &[TimeBucket] {
        &self.buckets
    }

    pub fn locate(&self, instant: Timestamp, policy: HorizonPolicy) -> Option<Placement> {
        self.horizon.locate(instant, self.width, policy)
    }

    /// Bucket holding `instant`, `None` outside the horizon.
    pub fn bucket_of(&self, instant: Timestamp) -> Option<usize> {
        self.locate(instant, HorizonPolicy::Exclude)
            .map(|placement| placement.bucket)
    }

    /// Peak multiplier in force at the start of each bucket, in local time.
    pub fn peak_multipliers(&self, site: &Site) -> Vec<f64> {
        let schedule = site.peak_schedule();
        if schedule.windows().is_empty() {
            return vec![1.0; self.len()];
        }

        self.buckets
            .iter()
            .map(|bucket| {
                let local = bucket.start.to_zoned(self.time_zone.clone()).time();
                schedule.multiplier_at(local)
            })
            .collect()
    }
}

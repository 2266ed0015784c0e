use jiff::{SignedDuration, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// What happens to an arrival that falls outside the horizon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HorizonPolicy {
    /// Dropped from the simulation and counted separately.
    #[default]
    Exclude,
    /// Pinned to the first or last bucket.
    Clamp,
    /// Folded back into the horizon modulo its length.
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    pub index: usize,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Where an arrival lands once the horizon policy has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub bucket: usize,
    pub at: Timestamp,
}

/// Half-open simulation window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Horizon {
    start: Timestamp,
    end: Timestamp,
}

impl Horizon {
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::EmptyHorizon { start, end });
        }
        Ok(Horizon { start, end })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn length(&self) -> SignedDuration {
        self.end.duration_since(self.start)
    }

    pub fn contains(&self, instant: Timestamp) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Number of buckets of `width` needed to cover the horizon. The last
    /// bucket may extend past the end.
    pub fn bucket_count(&self, width: SignedDuration) -> usize {
        let length = self.length().as_nanos();
        let width = width.as_nanos();
        if width <= 0 {
            return 0;
        }
        ((length + width - 1) / width) as usize
    }

    pub fn buckets(&self, width: SignedDuration) -> Vec<TimeBucket> {
        let mut start = self.start;
        (0..self.bucket_count(width))
            .map(|index| {
                let end = start + width;
                let bucket = TimeBucket { index, start, end };
                start = end;
                bucket
            })
            .collect()
    }

    /// Places `instant` on the bucket grid, or `None` when the policy drops it.
    pub fn locate(
        &self,
        instant: Timestamp,
        width: SignedDuration,
        policy: HorizonPolicy,
    ) -> Option<Placement> {
        let count = self.bucket_count(width);
        if count == 0 {
            return None;
        }

        let width_nanos = width.as_nanos();
        let bucket_of = |offset: i128| (offset / width_nanos) as usize;

        if self.contains(instant) {
            let offset = instant.duration_since(self.start).as_nanos();
            return Some(Placement {
                bucket: bucket_of(offset),
                at: instant,
            });
        }

        match policy {
            HorizonPolicy::Exclude => None,
            HorizonPolicy::Clamp => {
                if instant < self.start {
                    Some(Placement {
                        bucket: 0,
                        at: self.start,
                    })
                } else {
                    Some(Placement {
                        bucket: count - 1,
                        at: self.end - SignedDuration::from_nanos(1),
                    })
                }
            }
            HorizonPolicy::Wrap => {
                let length = self.length().as_nanos();
                let offset = instant
                    .duration_since(self.start)
                    .as_nanos()
                    .rem_euclid(length);
                let at = self.start + SignedDuration::from_nanos(i64::try_from(offset).ok()?);
                Some(Placement {
                    bucket: bucket_of(offset),
                    at,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizon() -> Horizon {
        let start: Timestamp = "2025-03-01T05:00:00Z".parse().unwrap();
        Horizon::new(start, start + SignedDuration::from_mins(60)).unwrap()
    }

    #[test]
    fn test_bucket_count_rounds_up() {
        let horizon = horizon();
        assert_eq!(horizon.bucket_count(SignedDuration::from_mins(15)), 4);
        assert_eq!(horizon.bucket_count(SignedDuration::from_mins(25)), 3);

        let buckets = horizon.buckets(SignedDuration::from_mins(25));
        assert_eq!(buckets[2].start, horizon.start() + SignedDuration::from_mins(50));
        assert_eq!(buckets[2].end, horizon.start() + SignedDuration::from_mins(75));
    }

    #[test]
    fn test_empty_horizon_is_rejected() {
        let start: Timestamp = "2025-03-01T05:00:00Z".parse().unwrap();
        assert!(matches!(
            Horizon::new(start, start),
            Err(ValidationError::EmptyHorizon { .. })
        ));
    }

    #[test]
    fn test_locate_inside() {
        let horizon = horizon();
        let width = SignedDuration::from_mins(15);
        let placement = horizon
            .locate(
                horizon.start() + SignedDuration::from_mins(30),
                width,
                HorizonPolicy::Exclude,
            )
            .unwrap();
        assert_eq!(placement.bucket, 2);

        let placement = horizon
            .locate(
                horizon.start() + SignedDuration::from_secs(29 * 60 + 59),
                width,
                HorizonPolicy::Exclude,
            )
            .unwrap();
        assert_eq!(placement.bucket, 1);
    }

    #[test]
    fn test_locate_exclude() {
        let horizon = horizon();
        let width = SignedDuration::from_mins(15);
        assert_eq!(
            horizon.locate(
                horizon.start() - SignedDuration::from_mins(1),
                width,
                HorizonPolicy::Exclude
            ),
            None
        );
        assert_eq!(
            horizon.locate(horizon.end(), width, HorizonPolicy::Exclude),
            None
        );
    }

    #[test]
    fn test_locate_clamp() {
        let horizon = horizon();
        let width = SignedDuration::from_mins(15);
        let early = horizon
            .locate(
                horizon.start() - SignedDuration::from_mins(40),
                width,
                HorizonPolicy::Clamp,
            )
            .unwrap();
        assert_eq!(early.bucket, 0);
        assert_eq!(early.at, horizon.start());

        let late = horizon
            .locate(
                horizon.end() + SignedDuration::from_mins(40),
                width,
                HorizonPolicy::Clamp,
            )
            .unwrap();
        assert_eq!(late.bucket, 3);
    }

    #[test]
    fn test_locate_wrap() {
        let horizon = horizon();
        let width = SignedDuration::from_mins(15);
        let late = horizon
            .locate(
                horizon.end() + SignedDuration::from_mins(20),
                width,
                HorizonPolicy::Wrap,
            )
            .unwrap();
        assert_eq!(late.bucket, 1);
        assert_eq!(late.at, horizon.start() + SignedDuration::from_mins(20));

        let early = horizon
            .locate(
                horizon.start() - SignedDuration::from_mins(10),
                width,
                HorizonPolicy::Wrap,
            )
            .unwrap();
        assert_eq!(early.bucket, 3);
        assert_eq!(early.at, horizon.start() + SignedDuration::from_mins(50));
    }
}

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    TravelToLoad,
    WaitForLoad,
    Load,
    LoadedTravel,
    WaitToDump,
    DumpSpotting,
    Dump,
    EmptyTravel,
}

impl Segment {
    pub const ALL: [Segment; 8] = [
        Segment::TravelToLoad,
        Segment::WaitForLoad,
        Segment::Load,
        Segment::LoadedTravel,
        Segment::WaitToDump,
        Segment::DumpSpotting,
        Segment::Dump,
        Segment::EmptyTravel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::TravelToLoad => "travel_to_load",
            Segment::WaitForLoad => "wait_for_load",
            Segment::Load => "load",
            Segment::LoadedTravel => "loaded_travel",
            Segment::WaitToDump => "wait_to_dump",
            Segment::DumpSpotting => "dump_spotting",
            Segment::Dump => "dump",
            Segment::EmptyTravel => "empty_travel",
        }
    }

    pub fn is_wait(&self) -> bool {
        matches!(self, Segment::WaitForLoad | Segment::WaitToDump)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed durations of each leg of one haul cycle. Missing legs are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct CycleSegments {
    /// Parking to the loading queue, including loading-side spotting.
    pub travel_to_load: SignedDuration,
    pub wait_for_load: SignedDuration,
    pub load: SignedDuration,
    pub loaded_travel: SignedDuration,
    pub wait_to_dump: SignedDuration,
    pub dump_spotting: SignedDuration,
    pub dump: SignedDuration,
    pub empty_travel: SignedDuration,
}

impl CycleSegments {
    pub fn get(&self, segment: Segment) -> SignedDuration {
        match segment {
            Segment::TravelToLoad => self.travel_to_load,
            Segment::WaitForLoad => self.wait_for_load,
            Segment::Load => self.load,
            Segment::LoadedTravel => self.loaded_travel,
            Segment::WaitToDump => self.wait_to_dump,
            Segment::DumpSpotting => self.dump_spotting,
            Segment::Dump => self.dump,
            Segment::EmptyTravel => self.empty_travel,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Segment, SignedDuration)> + '_ {
        Segment::ALL
            .into_iter()
            .map(|segment| (segment, self.get(segment)))
    }

    pub fn total(&self) -> SignedDuration {
        self.iter()
            .fold(SignedDuration::ZERO, |total, (_, duration)| total + duration)
    }

    /// Sum of every leg that is not spent queueing.
    pub fn total_without_waits(&self) -> SignedDuration {
        self.iter()
            .filter(|(segment, _)| !segment.is_wait())
            .fold(SignedDuration::ZERO, |total, (_, duration)| total + duration)
    }

    /// Time from departure until the truck joins the loading queue.
    pub fn until_load_queue(&self) -> SignedDuration {
        self.travel_to_load
    }

    /// Time from departure until the truck joins the dumping queue.
    pub fn until_dump_queue(&self) -> SignedDuration {
        self.travel_to_load + self.wait_for_load + self.load + self.loaded_travel
    }

    pub fn load_service(&self) -> SignedDuration {
        self.load
    }

    pub fn dump_service(&self) -> SignedDuration {
        self.dump_spotting + self.dump
    }
}

/// One observed truck trip from a parking origin through a loading origin
/// to a dumping destination and back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HaulCycleRecord {
    contractor: String,
    parking_origin: Option<String>,
    loading_origin: String,
    dumping_destination: String,
    departure: Timestamp,
    segments: CycleSegments,
    cycle_time: Option<SignedDuration>,
}

impl HaulCycleRecord {
    pub fn new(
        contractor: impl Into<String>,
        loading_origin: impl Into<String>,
        dumping_destination: impl Into<String>,
        departure: Timestamp,
        segments: CycleSegments,
    ) -> Self {
        HaulCycleRecord {
            contractor: contractor.into(),
            parking_origin: None,
            loading_origin: loading_origin.into(),
            dumping_destination: dumping_destination.into(),
            departure,
            segments,
            cycle_time: None,
        }
    }

    pub fn with_parking_origin(mut self, parking_origin: impl Into<String>) -> Self {
        self.parking_origin = Some(parking_origin.into());
        self
    }

    pub fn with_cycle_time(mut self, cycle_time: SignedDuration) -> Self {
        self.cycle_time = Some(cycle_time);
        self
    }

    pub fn contractor(&self) -> &str {
        &self.contractor
    }

    pub fn parking_origin(&self) -> Option<&str> {
        self.parking_origin.as_deref()
    }

    pub fn loading_origin(&self) -> &str {
        &self.loading_origin
    }

    pub fn dumping_destination(&self) -> &str {
        &self.dumping_destination
    }

    pub fn departure(&self) -> Timestamp {
        self.departure
    }

    pub fn segments(&self) -> &CycleSegments {
        &self.segments
    }

    /// Recorded cycle time, or the sum of the segments when none was recorded.
    pub fn cycle_time(&self) -> SignedDuration {
        self.cycle_time.unwrap_or_else(|| self.segments.total())
    }

    /// Cycle time with the recorded waits swapped for the given ones.
    pub fn cycle_time_with_waits(
        &self,
        wait_for_load: SignedDuration,
        wait_to_dump: SignedDuration,
    ) -> SignedDuration {
        self.cycle_time() - self.segments.wait_for_load - self.segments.wait_to_dump
            + wait_for_load
            + wait_to_dump
    }

    pub(crate) fn validate(&self, record: usize) -> Result<(), ValidationError> {
        if let Some((segment, duration)) = self
            .segments
            .iter()
            .find(|(_, duration)| duration.is_negative())
        {
            return Err(ValidationError::NegativeDuration {
                record,
                segment,
                duration,
            });
        }

        match self.cycle_time {
            Some(duration) if duration.is_negative() => {
                Err(ValidationError::NegativeCycleTime { record, duration })
            }
            _ => Ok(()),
        }
    }
}

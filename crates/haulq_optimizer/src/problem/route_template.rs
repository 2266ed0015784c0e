use serde::Serialize;

use super::{
    contractor::DepartureSchedule,
    haul_cycle_record::{CycleSegments, HaulCycleRecord},
};

/// A planned route a contractor runs with every truck of its fleet.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTemplate {
    contractor: String,
    parking_origin: Option<String>,
    loading_origin: String,
    dumping_destination: String,
    segments: CycleSegments,
}

impl RouteTemplate {
    pub fn new(
        contractor: impl Into<String>,
        loading_origin: impl Into<String>,
        dumping_destination: impl Into<String>,
        segments: CycleSegments,
    ) -> Self {
        RouteTemplate {
            contractor: contractor.into(),
            parking_origin: None,
            loading_origin: loading_origin.into(),
            dumping_destination: dumping_destination.into(),
            segments,
        }
    }

    pub fn with_parking_origin(mut self, parking_origin: impl Into<String>) -> Self {
        self.parking_origin = Some(parking_origin.into());
        self
    }

    pub fn contractor(&self) -> &str {
        &self.contractor
    }

    /// One record per truck, departing in procession from the schedule.
    pub fn expand(&self, trucks: usize, schedule: &DepartureSchedule) -> Vec<HaulCycleRecord> {
        schedule
            .departures(trucks)
            .map(|departure| {
                let record = HaulCycleRecord::new(
                    self.contractor.clone(),
                    self.loading_origin.clone(),
                    self.dumping_destination.clone(),
                    departure,
                    self.segments.clone(),
                );
                match &self.parking_origin {
                    Some(parking) => record.with_parking_origin(parking.clone()),
                    None => record,
                }
            })
            .collect()
    }
}

use jiff::{SignedDuration, civil};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{define_index_newtype, error::ValidationError, utils::time::minutes};

define_index_newtype!(SiteIdx, Site);

/// Smallest multiplier of an open window. Anything slower would stretch one
/// service past the range of a duration.
pub const MIN_OPEN_MULTIPLIER: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    Load,
    Dump,
}

/// Scales a site's throughput over a daily window of local time.
/// A window whose end precedes its start wraps past midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PeakWindow {
    pub start: civil::Time,
    pub end: civil::Time,
    pub multiplier: f64,
}

impl PeakWindow {
    pub fn contains(&self, time: civil::Time) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeakSchedule {
    windows: Vec<PeakWindow>,
}

impl PeakSchedule {
    pub fn new(windows: Vec<PeakWindow>) -> Self {
        PeakSchedule { windows }
    }

    pub fn windows(&self) -> &[PeakWindow] {
        &self.windows
    }

    /// Multiplier of the first window containing `time`, 1.0 outside all windows.
    pub fn multiplier_at(&self, time: civil::Time) -> f64 {
        self.windows
            .iter()
            .find(|window| window.contains(time))
            .map_or(1.0, |window| window.multiplier)
    }
}

/// A loading origin or dumping destination served by parallel, identical servers.
#[derive(Debug, Clone, Serialize)]
pub struct Site {
    external_id: String,
    kind: SiteKind,
    servers: usize,
    service_time: SignedDuration,
    peak_schedule: PeakSchedule,
}

impl Site {
    pub fn new(
        external_id: impl Into<String>,
        kind: SiteKind,
        servers: usize,
        service_time: SignedDuration,
    ) -> Result<Self, ValidationError> {
        let external_id = external_id.into();
        if servers == 0 {
            return Err(ValidationError::NoServers(external_id));
        }
        if service_time <= SignedDuration::ZERO {
            return Err(ValidationError::NonPositiveServiceTime {
                site: external_id,
                service_time,
            });
        }

        Ok(Site {
            external_id,
            kind,
            servers,
            service_time,
            peak_schedule: PeakSchedule::default(),
        })
    }

    pub fn with_peak_schedule(mut self, schedule: PeakSchedule) -> Result<Self, ValidationError> {
        if let Some(window) = schedule
            .windows()
            .iter()
            .find(|window| {
                let multiplier = window.multiplier;
                !multiplier.is_finite()
                    || multiplier < 0.0
                    || (multiplier > 0.0 && multiplier < MIN_OPEN_MULTIPLIER)
            })
        {
            return Err(ValidationError::InvalidPeakMultiplier {
                site: self.external_id,
                multiplier: window.multiplier,
            });
        }

        self.peak_schedule = schedule;
        Ok(self)
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn kind(&self) -> SiteKind {
        self.kind
    }

    pub fn servers(&self) -> usize {
        self.servers
    }

    pub fn service_time(&self) -> SignedDuration {
        self.service_time
    }

    pub fn peak_schedule(&self) -> &PeakSchedule {
        &self.peak_schedule
    }

    /// Minutes one service takes under a sampler `factor` and peak
    /// `multiplier`, 0 while the site is closed.
    pub fn service_minutes(&self, factor: f64, multiplier: f64) -> f64 {
        if multiplier <= 0.0 {
            return 0.0;
        }
        minutes(self.service_time) * factor / multiplier
    }

    /// Trucks the site can start serving within `width` when each service
    /// takes `service_time * factor`, scaled by the peak `multiplier`.
    pub fn capacity(&self, width: SignedDuration, factor: f64, multiplier: f64) -> f64 {
        let service_minutes = minutes(self.service_time) * factor;
        if service_minutes <= 0.0 {
            return 0.0;
        }
        self.servers as f64 * minutes(width) / service_minutes * multiplier
    }
}

/// Reads a server count from labels such as `PIT 3 (LINE 65-66)`.
pub fn servers_from_label(label: &str) -> Option<usize> {
    let upper = label.to_ascii_uppercase();
    let position = upper.find("LINE")?;
    let range = upper[position + "LINE".len()..]
        .trim_start()
        .split(|c: char| c == ')' || c.is_whitespace())
        .next()?;

    let (low, high) = range.split_once('-')?;
    let low: i64 = low.trim().parse().ok()?;
    let high: i64 = high.trim().parse().ok()?;

    Some((high - low + 1).max(1) as usize)
}

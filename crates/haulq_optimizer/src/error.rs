use jiff::{SignedDuration, Timestamp};
use thiserror::Error;

use crate::problem::haul_cycle_record::Segment;

/// Malformed input rejected before any simulation runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("offset {offset:#} for contractor {contractor} is outside [{min:#}, {max:#}]")]
    OffsetOutOfBounds {
        contractor: String,
        offset: SignedDuration,
        min: SignedDuration,
        max: SignedDuration,
    },
    #[error("offset vector has {actual} entries but the problem has {expected} contractors")]
    OffsetCountMismatch { expected: usize, actual: usize },
    #[error("record {record}: {segment} has a negative duration ({duration:#})")]
    NegativeDuration {
        record: usize,
        segment: Segment,
        duration: SignedDuration,
    },
    #[error("record {record}: cycle time is negative ({duration:#})")]
    NegativeCycleTime {
        record: usize,
        duration: SignedDuration,
    },
    #[error("record {record} references unknown contractor {contractor}")]
    UnknownContractor { record: usize, contractor: String },
    #[error("offset given for unknown contractor {0}")]
    UnknownOffsetContractor(String),
    #[error("contractor {0} is declared more than once")]
    DuplicateContractor(String),
    #[error("contractor {0} has routes but no departure schedule")]
    MissingDepartureSchedule(String),
    #[error("site override references unknown site {0}")]
    UnknownSite(String),
    #[error("site {0} is used both as a loading origin and a dumping destination")]
    SiteKindConflict(String),
    #[error("site {0} must have at least one server")]
    NoServers(String),
    #[error("site {site}: service time must be positive, got {service_time:#}")]
    NonPositiveServiceTime {
        site: String,
        service_time: SignedDuration,
    },
    #[error("site {site}: peak multiplier must be 0 or a finite value of at least {min}, got {multiplier}", min = crate::problem::site::MIN_OPEN_MULTIPLIER)]
    InvalidPeakMultiplier { site: String, multiplier: f64 },
    #[error("contractor {contractor}: offset bounds are inverted ({min:#} > {max:#})")]
    InvertedBounds {
        contractor: String,
        min: SignedDuration,
        max: SignedDuration,
    },
    #[error("bucket width must be positive, got {0:#}")]
    NonPositiveBucketWidth(SignedDuration),
    #[error("horizon end {end} is not after its start {start}")]
    EmptyHorizon { start: Timestamp, end: Timestamp },
    #[error("objective weight {name} must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("variability coefficient must lie in [0, 1), got {0}")]
    InvalidVariability(f64),
    #[error("offset step must be positive, got {0:#}")]
    NonPositiveStep(SignedDuration),
    #[error("at least one termination condition is required")]
    NoTermination,
}

/// Inputs that are well formed but carry too little data to evaluate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataInsufficiencyError {
    #[error("no haul cycle records to evaluate offsets of {contractors} contractors against")]
    NoRecords { contractors: usize },
    #[error("site {0} has no observed service time and no override")]
    NoServiceTime(String),
    #[error("a horizon must be given when there are no haul cycle records")]
    NoHorizon,
}

#[derive(Error, Debug)]
pub enum HaulError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    DataInsufficiency(#[from] DataInsufficiencyError),
    #[error("failed to build the evaluation thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("unknown time zone {name}")]
    TimeZone {
        name: String,
        #[source]
        source: jiff::Error,
    },
    #[error("invalid scenario")]
    Json(#[from] serde_json::Error),
}

use schemars::JsonSchema;
use serde::Serialize;

/// Qualitative band for an average queue wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WaitRating {
    Excellent,
    Good,
    Poor,
    Critical,
    Severe,
}

impl WaitRating {
    pub const EXCELLENT_BELOW: f64 = 5.0;
    pub const GOOD_BELOW: f64 = 15.0;
    pub const POOR_BELOW: f64 = 30.0;
    pub const CRITICAL_BELOW: f64 = 45.0;

    pub fn from_minutes(minutes: f64) -> Self {
        if minutes < Self::EXCELLENT_BELOW {
            WaitRating::Excellent
        } else if minutes < Self::GOOD_BELOW {
            WaitRating::Good
        } else if minutes < Self::POOR_BELOW {
            WaitRating::Poor
        } else if minutes < Self::CRITICAL_BELOW {
            WaitRating::Critical
        } else {
            WaitRating::Severe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WaitRating::Excellent => "excellent",
            WaitRating::Good => "good",
            WaitRating::Poor => "poor",
            WaitRating::Critical => "critical",
            WaitRating::Severe => "severe",
        }
    }
}

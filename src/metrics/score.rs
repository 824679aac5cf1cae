//! Composite project score and star rating.

use std::fmt;

use serde::{Deserialize, Serialize};

const TRAINING_WEIGHT: f64 = 30.0;
const LTI_FREE_WEIGHT: f64 = 40.0;
const LEADING_WEIGHT: f64 = 20.0;
const NCR_WEIGHT: f64 = 10.0;

/// LTI-free days for full credit.
const LTI_FREE_TARGET_DAYS: f64 = 365.0;
/// Near misses reported for full credit.
const LEADING_TARGET: f64 = 10.0;
/// Open NCRs at which the NCR component reaches zero.
const NCR_LIMIT: f64 = 10.0;

/// Inputs to the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreInputs {
    /// Training pass rate, 0–100.
    pub training_average: f64,
    pub days_without_lti: i64,
    pub leading_indicators: u32,
    /// Open NCRs.
    pub ncr_count: u32,
}

/// Weighted 0–100 project score, rounded to the nearest integer.
///
/// # Arguments
///
/// * `inputs` - Training pass rate, LTI-free days, near misses and open NCRs
///
/// # Returns
///
/// The clamped score. Each component saturates at its target, and open NCRs
/// only subtract, so better inputs never lower the score.
pub fn project_score(inputs: ScoreInputs) -> u32 {
    let training = TRAINING_WEIGHT * (inputs.training_average / 100.0).clamp(0.0, 1.0);
    let lti_free =
        LTI_FREE_WEIGHT * (inputs.days_without_lti.max(0) as f64 / LTI_FREE_TARGET_DAYS).min(1.0);
    let leading = LEADING_WEIGHT * (inputs.leading_indicators as f64 / LEADING_TARGET).min(1.0);
    let ncr = NCR_WEIGHT * (1.0 - inputs.ncr_count as f64 / NCR_LIMIT).max(0.0);

    let total = training + lti_free + leading + ncr;
    if !total.is_finite() {
        return 0;
    }
    total.round().clamp(0.0, 100.0) as u32
}

/// Five-level star rating derived from the project score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRating {
    #[default]
    OneStar,
    TwoStars,
    ThreeStars,
    FourStars,
    FiveStars,
}

impl ProjectRating {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => ProjectRating::FiveStars,
            80..=89 => ProjectRating::FourStars,
            70..=79 => ProjectRating::ThreeStars,
            60..=69 => ProjectRating::TwoStars,
            _ => ProjectRating::OneStar,
        }
    }

    pub fn stars(&self) -> u8 {
        match self {
            ProjectRating::OneStar => 1,
            ProjectRating::TwoStars => 2,
            ProjectRating::ThreeStars => 3,
            ProjectRating::FourStars => 4,
            ProjectRating::FiveStars => 5,
        }
    }

    /// Filled and empty stars, e.g. `★★★☆☆`.
    pub fn label(&self) -> String {
        let filled = self.stars() as usize;
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

impl fmt::Display for ProjectRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

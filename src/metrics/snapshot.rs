//! Snapshot values published by the aggregator.

use serde::Serialize;

use crate::metrics::score::ProjectRating;
use crate::metrics::window::DateWindow;

/// One value per KPI. Fields a pipeline does not compute stay at their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SafetyKpis {
    pub leading_indicators: u32,
    pub incidents_reported: u32,
    pub total_incidents: u32,
    pub training_average: f64,
    pub days_without_lti: i64,
    pub ltifr: f64,
    pub ltisr: f64,
    pub art: f64,
    pub ncrs_open: u32,
    pub project_score: u32,
    pub project_rating: ProjectRating,
    pub lti_count: u32,
    pub lost_days: u64,
    pub critical_incidents: u32,
    pub observations_open: u32,
    pub total_violations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Point-in-time result of an aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub kpis: SafetyKpis,
    /// Window the KPI values were computed over, once any computation succeeded.
    pub window: Option<DateWindow>,
    pub status: PipelineStatus,
    pub loading: bool,
    pub error: Option<String>,
}

impl Snapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    /// A computation started; previous values stay visible.
    pub fn loading(previous: &Snapshot) -> Self {
        Self {
            kpis: previous.kpis.clone(),
            window: previous.window,
            status: PipelineStatus::Loading,
            loading: true,
            error: None,
        }
    }

    pub fn ready(kpis: SafetyKpis, window: DateWindow) -> Self {
        Self {
            kpis,
            window: Some(window),
            status: PipelineStatus::Ready,
            loading: false,
            error: None,
        }
    }

    /// A read failed; the last good values stay visible.
    pub fn failed(previous: &Snapshot, error: impl Into<String>) -> Self {
        Self {
            kpis: previous.kpis.clone(),
            window: previous.window,
            status: PipelineStatus::Error,
            loading: false,
            error: Some(error.into()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == PipelineStatus::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> DateWindow {
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid date");
        DateWindow::ending_at(end, 31).expect("window")
    }

    #[test]
    fn test_loading_and_failed_keep_previous_values() {
        let kpis = SafetyKpis {
            total_incidents: 4,
            ..Default::default()
        };
        let ready = Snapshot::ready(kpis.clone(), window());

        let loading = Snapshot::loading(&ready);
        assert_eq!(loading.status, PipelineStatus::Loading);
        assert!(loading.loading);
        assert_eq!(loading.kpis, kpis);

        let failed = Snapshot::failed(&loading, "backend offline");
        assert_eq!(failed.status, PipelineStatus::Error);
        assert!(!failed.loading);
        assert_eq!(failed.kpis, kpis);
        assert_eq!(failed.window, Some(window()));
        assert_eq!(failed.error.as_deref(), Some("backend offline"));
    }

    #[test]
    fn test_idle_is_empty() {
        let idle = Snapshot::idle();
        assert_eq!(idle.status, PipelineStatus::Idle);
        assert_eq!(idle.kpis, SafetyKpis::default());
        assert!(idle.error.is_none());
        assert!(!idle.is_ready());
    }

    #[test]
    fn test_serializes_status_in_snake_case() {
        let json = serde_json::to_value(Snapshot::ready(SafetyKpis::default(), window()))
            .expect("serialize");
        assert_eq!(json["status"], "ready");
        assert_eq!(json["kpis"]["project_rating"], "one_star");
        assert_eq!(json["window"]["start"], "2024-01-01");
    }
}

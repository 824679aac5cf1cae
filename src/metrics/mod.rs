//! Safety KPI computation.
//!
//! [`compute_kpis`] evaluates a [`KpiSet`] over a [`RecordSet`] in a
//! [`MetricContext`]. The result depends only on its inputs: the same records,
//! window, as-of date and hours worked always give an equal [`SafetyKpis`].

pub mod definitions;
pub mod kpi;
pub mod report;
pub mod score;
pub mod snapshot;
pub mod window;

use crate::records::{Incident, Injury, Ncr, Observation, Training, Violation};

pub use definitions::{PASSING_SCORE, RATE_BASE_HOURS};
pub use kpi::{Kpi, KpiSet, UnknownKpi};
pub use report::{format_critical, format_snapshot};
pub use score::{project_score, ProjectRating, ScoreInputs};
pub use snapshot::{PipelineStatus, SafetyKpis, Snapshot};
pub use window::{DateWindow, InvalidWindow, MetricContext, DEFAULT_HOURS_WORKED};

/// Records the KPIs read, one sequence per domain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub incidents: Vec<Incident>,
    pub injuries: Vec<Injury>,
    pub trainings: Vec<Training>,
    pub ncrs: Vec<Ncr>,
    pub observations: Vec<Observation>,
    pub violations: Vec<Violation>,
}

/// Compute the requested KPIs. KPIs outside `kpis` keep their defaults.
pub fn compute_kpis(records: &RecordSet, context: &MetricContext, kpis: &KpiSet) -> SafetyKpis {
    let mut out = SafetyKpis::default();
    let wants_score = kpis.contains(Kpi::ProjectScore) || kpis.contains(Kpi::ProjectRating);

    if kpis.contains(Kpi::LeadingIndicators) || wants_score {
        out.leading_indicators = definitions::leading_indicators(&records.incidents, context);
    }
    if kpis.contains(Kpi::IncidentsReported) {
        out.incidents_reported = definitions::incidents_reported(&records.incidents, context);
    }
    if kpis.contains(Kpi::TotalIncidents) {
        out.total_incidents = definitions::total_incidents(&records.incidents, context);
    }
    if kpis.contains(Kpi::CriticalIncidents) {
        out.critical_incidents = definitions::critical_incidents(&records.incidents, context);
    }
    if kpis.contains(Kpi::TrainingAverage) || wants_score {
        out.training_average = definitions::training_average(&records.trainings, context);
    }
    if kpis.contains(Kpi::DaysWithoutLti) || wants_score {
        out.days_without_lti = definitions::days_without_lti(&records.injuries, context);
    }
    if kpis.contains(Kpi::LtiCount) {
        out.lti_count = definitions::lti_count(&records.injuries, context);
    }
    if kpis.contains(Kpi::LostDays) {
        out.lost_days = definitions::lost_days(&records.injuries, context);
    }
    if kpis.contains(Kpi::Ltifr) {
        out.ltifr = definitions::ltifr(&records.injuries, context);
    }
    if kpis.contains(Kpi::Ltisr) {
        out.ltisr = definitions::ltisr(&records.injuries, context);
    }
    if kpis.contains(Kpi::Art) {
        out.art = definitions::accident_rate(&records.injuries, &records.incidents, context);
    }
    if kpis.contains(Kpi::NcrsOpen) || wants_score {
        out.ncrs_open = definitions::ncrs_open(&records.ncrs, context);
    }
    if kpis.contains(Kpi::ObservationsOpen) {
        out.observations_open = definitions::observations_open(&records.observations, context);
    }
    if kpis.contains(Kpi::TotalViolations) {
        out.total_violations = definitions::total_violations(&records.violations, context);
    }

    if wants_score {
        let score = project_score(ScoreInputs {
            training_average: out.training_average,
            days_without_lti: out.days_without_lti,
            leading_indicators: out.leading_indicators,
            ncr_count: out.ncrs_open,
        });
        out.project_score = score;
        out.project_rating = ProjectRating::from_score(score);
    }

    out
}

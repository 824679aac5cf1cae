//! KPI definitions.
//!
//! Every function is pure: the same records and context always produce the
//! same value. Records are restricted to the context window by their
//! [`window_date`](DomainRecord::window_date); undated records never count.
//! Ratios over empty inputs are 0, never NaN.

use crate::alerts::is_critical;
use crate::metrics::window::{DateWindow, MetricContext};
use crate::records::{
    DomainRecord, Incident, Injury, Ncr, NcrStatus, Observation, ObservationStatus, Training,
    Violation,
};

/// Rates are expressed per this many hours worked.
pub const RATE_BASE_HOURS: f64 = 100_000.0;

/// Minimum training score counted as a pass.
pub const PASSING_SCORE: f64 = 70.0;

const NEAR_MISS_MARKERS: [&str; 3] = ["near miss", "near-miss", "nearmiss"];

/// Records dated inside the window.
pub fn in_window<'a, R: DomainRecord>(
    records: &'a [R],
    window: &'a DateWindow,
) -> impl Iterator<Item = &'a R> + 'a {
    records
        .iter()
        .filter(move |record| window.contains_opt(record.window_date()))
}

fn count<'a, R: DomainRecord + 'a>(
    records: &'a [R],
    context: &'a MetricContext,
    predicate: impl Fn(&R) -> bool,
) -> u32 {
    in_window(records, &context.window)
        .filter(|record| predicate(*record))
        .count() as u32
}

fn rate(numerator: f64, hours_worked: f64) -> f64 {
    if !(hours_worked.is_finite() && hours_worked > 0.0) {
        return 0.0;
    }
    RATE_BASE_HOURS * numerator / hours_worked
}

fn contains_marker(text: &str, markers: &[&str]) -> bool {
    let text = text.to_lowercase();
    markers.iter().any(|marker| text.contains(marker))
}

/// Whether an incident was logged as a near miss.
pub fn is_near_miss(incident: &Incident) -> bool {
    let in_text = [&incident.description, &incident.incident_type]
        .into_iter()
        .flatten()
        .any(|text| contains_marker(text, &NEAR_MISS_MARKERS));
    in_text
        || incident
            .tags
            .iter()
            .any(|tag| contains_marker(tag, &NEAR_MISS_MARKERS))
}

/// Near-miss incidents: the proactive signal.
pub fn leading_indicators(incidents: &[Incident], context: &MetricContext) -> u32 {
    count(incidents, context, is_near_miss)
}

/// Incidents with a filed report reference.
///
/// # Arguments
///
/// * `incidents` - The incident register
/// * `context` - Window the incidents must be dated in
///
/// # Returns
///
/// The number of in-window incidents whose report reference is non-blank.
pub fn incidents_reported(incidents: &[Incident], context: &MetricContext) -> u32 {
    count(incidents, context, Incident::is_reported)
}

/// Every in-window incident, whatever its severity or type.
pub fn total_incidents(incidents: &[Incident], context: &MetricContext) -> u32 {
    count(incidents, context, |_| true)
}

/// Incidents the alert feed would raise.
pub fn critical_incidents(incidents: &[Incident], context: &MetricContext) -> u32 {
    count(incidents, context, is_critical)
}

/// Percentage of trainings scored at or above [`PASSING_SCORE`].
pub fn training_average(trainings: &[Training], context: &MetricContext) -> f64 {
    let total = count(trainings, context, |_| true);
    if total == 0 {
        return 0.0;
    }
    let passed = count(trainings, context, |training| {
        training.score.is_some_and(|score| score >= PASSING_SCORE)
    });
    100.0 * passed as f64 / total as f64
}

/// Days since the most recent LTI, or since the window start when there is
/// none. Never negative.
pub fn days_without_lti(injuries: &[Injury], context: &MetricContext) -> i64 {
    let since = in_window(injuries, &context.window)
        .filter(|injury| injury.is_lti())
        .filter_map(|injury| injury.incident_date)
        .max()
        .unwrap_or(context.window.start);
    (context.as_of - since).num_days().max(0)
}

/// Injuries flagged as lost-time.
pub fn lti_count(injuries: &[Injury], context: &MetricContext) -> u32 {
    count(injuries, context, Injury::is_lti)
}

/// Total time-off days across all in-window injuries.
pub fn lost_days(injuries: &[Injury], context: &MetricContext) -> u64 {
    in_window(injuries, &context.window)
        .map(|injury| injury.time_off_days.unwrap_or(0) as u64)
        .sum()
}

/// LTI frequency rate.
///
/// # Arguments
///
/// * `injuries` - The injury register
/// * `context` - Window and hours worked
///
/// # Returns
///
/// Lost-time injuries per [`RATE_BASE_HOURS`] hours worked, or 0 when the
/// hours worked are not a positive finite number.
pub fn ltifr(injuries: &[Injury], context: &MetricContext) -> f64 {
    rate(lti_count(injuries, context) as f64, context.hours_worked)
}

/// LTI severity rate: lost days per [`RATE_BASE_HOURS`] hours worked.
pub fn ltisr(injuries: &[Injury], context: &MetricContext) -> f64 {
    rate(lost_days(injuries, context) as f64, context.hours_worked)
}

/// Accident rate over injuries and incidents combined.
pub fn accident_rate(injuries: &[Injury], incidents: &[Incident], context: &MetricContext) -> f64 {
    let events = count(injuries, context, |_| true) + total_incidents(incidents, context);
    rate(events as f64, context.hours_worked)
}

/// Non-conformance reports still open.
///
/// # Arguments
///
/// * `ncrs` - The NCR register
/// * `context` - Window the reports must be issued in
///
/// # Returns
///
/// The number of in-window NCRs whose status is `Open`. In-progress,
/// closed, cancelled and unrecognized statuses do not count.
pub fn ncrs_open(ncrs: &[Ncr], context: &MetricContext) -> u32 {
    count(ncrs, context, |ncr| ncr.status == Some(NcrStatus::Open))
}

/// Open safety observations.
pub fn observations_open(observations: &[Observation], context: &MetricContext) -> u32 {
    count(observations, context, |observation| {
        observation.status == Some(ObservationStatus::Open)
    })
}

/// Violations dated in the window.
pub fn total_violations(violations: &[Violation], context: &MetricContext) -> u32 {
    count(violations, context, |_| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Severity;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn january() -> MetricContext {
        let window = DateWindow::new(day(2024, 1, 1), day(2024, 2, 1)).expect("window");
        MetricContext::at_window_end(window)
    }

    #[test]
    fn test_empty_inputs_are_zero() {
        let context = january();
        assert_eq!(leading_indicators(&[], &context), 0);
        assert_eq!(incidents_reported(&[], &context), 0);
        assert_eq!(total_incidents(&[], &context), 0);
        assert_eq!(training_average(&[], &context), 0.0);
        assert_eq!(ltifr(&[], &context), 0.0);
        assert_eq!(ltisr(&[], &context), 0.0);
        assert_eq!(accident_rate(&[], &[], &context), 0.0);
        assert_eq!(ncrs_open(&[], &context), 0);
        assert_eq!(days_without_lti(&[], &context), 31);
    }

    #[test]
    fn test_window_boundaries_for_total_incidents() {
        let context = january();
        let incidents = vec![
            Incident::new(1u64).with_date(day(2023, 12, 31)),
            Incident::new(2u64).with_date(day(2024, 1, 1)),
            Incident::new(3u64).with_date(day(2024, 1, 31)),
            Incident::new(4u64).with_date(day(2024, 2, 1)),
            Incident::new(5u64).with_date(day(2024, 2, 2)),
            Incident::new(6u64),
        ];
        assert_eq!(total_incidents(&incidents, &context), 2);
    }

    #[test]
    fn test_near_miss_markers() {
        let context = january();
        let date = day(2024, 1, 10);
        let incidents = vec![
            Incident::new(1u64).with_date(date).with_description("Near Miss at gate 3"),
            Incident::new(2u64).with_date(date).with_tag("near-miss"),
            Incident::new(3u64).with_date(date).with_type("NearMiss"),
            Incident::new(4u64).with_date(date).with_description("Cut finger"),
        ];
        assert_eq!(leading_indicators(&incidents, &context), 3);
    }

    #[test]
    fn test_incidents_reported_requires_reference() {
        let context = january();
        let date = day(2024, 1, 10);
        let incidents = vec![
            Incident::new(1u64).with_date(date).with_report_reference("RPT-1"),
            Incident::new(2u64).with_date(date),
            Incident::new(3u64)
                .with_date(day(2023, 6, 1))
                .with_report_reference("RPT-0"),
        ];
        assert_eq!(incidents_reported(&incidents, &context), 1);
    }

    #[test]
    fn test_training_average_counts_passes() {
        let context = january();
        let date = day(2024, 1, 15);
        let trainings: Vec<Training> = (0..10)
            .map(|n| {
                let score = if n < 7 { 70.0 + n as f64 } else { 40.0 };
                Training::new(n as u64).with_date(date).with_score(score)
            })
            .collect();
        assert_eq!(training_average(&trainings, &context), 70.0);
    }

    #[test]
    fn test_unscored_training_counts_as_not_passed() {
        let context = january();
        let date = day(2024, 1, 15);
        let trainings = vec![
            Training::new(1u64).with_date(date).with_score(95.0),
            Training::new(2u64).with_date(date),
        ];
        assert_eq!(training_average(&trainings, &context), 50.0);
    }

    #[test]
    fn test_lti_rates() {
        let context = january();
        let date = day(2024, 1, 20);
        let injuries = vec![
            Injury::new(1u64).with_date(date).with_lti(true).with_time_off(5),
            Injury::new(2u64).with_date(date).with_lti(false),
            Injury::new(3u64).with_date(date),
        ];
        assert_eq!(lti_count(&injuries, &context), 1);
        assert_eq!(ltifr(&injuries, &context), 1.0);
        assert_eq!(ltisr(&injuries, &context), 5.0);
        assert_eq!(accident_rate(&injuries, &[], &context), 3.0);
    }

    #[test]
    fn test_rates_scale_with_hours_worked() {
        let context = january().with_hours_worked(200_000.0);
        let injuries = vec![Injury::new(1u64)
            .with_date(day(2024, 1, 2))
            .with_lti(true)
            .with_time_off(10)];
        assert_eq!(ltifr(&injuries, &context), 0.5);
        assert_eq!(ltisr(&injuries, &context), 5.0);
        assert_eq!(ltifr(&injuries, &january().with_hours_worked(0.0)), 0.0);
    }

    #[test]
    fn test_days_without_lti_uses_latest_lti() {
        let context = january();
        let injuries = vec![
            Injury::new(1u64).with_date(day(2024, 1, 5)).with_lti(true),
            Injury::new(2u64).with_date(day(2024, 1, 21)).with_lti(true),
            Injury::new(3u64).with_date(day(2024, 1, 30)).with_lti(false),
        ];
        assert_eq!(days_without_lti(&injuries, &context), 11);
    }

    #[test]
    fn test_days_without_lti_never_negative() {
        let window = DateWindow::new(day(2024, 1, 1), day(2024, 2, 1)).expect("window");
        let context = MetricContext::new(window, day(2024, 1, 10));
        let injuries = vec![Injury::new(1u64).with_date(day(2024, 1, 25)).with_lti(true)];
        assert_eq!(days_without_lti(&injuries, &context), 0);
    }

    #[test]
    fn test_open_counts() {
        let context = january();
        let date = day(2024, 1, 3);
        let mut ncrs: Vec<Ncr> = (0..4)
            .map(|n| Ncr::new(n as u64).with_date(date).with_status(NcrStatus::Open))
            .collect();
        ncrs.push(Ncr::new(10u64).with_date(date).with_status(NcrStatus::Closed));
        ncrs.push(Ncr::new(11u64).with_date(date).with_status(NcrStatus::Closed));
        assert_eq!(ncrs_open(&ncrs, &context), 4);

        let observations = vec![
            Observation::new(1u64)
                .with_date(date)
                .with_status(ObservationStatus::Open),
            Observation::new(2u64)
                .with_date(date)
                .with_status(ObservationStatus::Closed),
        ];
        assert_eq!(observations_open(&observations, &context), 1);
    }

    #[test]
    fn test_critical_incident_count() {
        let context = january();
        let date = day(2024, 1, 3);
        let incidents = vec![
            Incident::new(1u64).with_date(date).with_severity(Severity::High),
            Incident::new(2u64).with_date(date).with_severity(Severity::Low),
        ];
        assert_eq!(critical_incidents(&incidents, &context), 1);
    }

    #[test]
    fn test_violations_fall_back_to_creation_time() {
        let context = january();
        let mut violation = Violation::new(1u64);
        violation.created_at = day(2024, 1, 9).and_hms_opt(8, 0, 0).map(|t| t.and_utc());
        let violations = vec![violation, Violation::new(2u64)];
        assert_eq!(total_violations(&violations, &context), 1);
    }

    #[test]
    fn test_definitions_are_repeatable() {
        let context = january();
        let injuries = vec![Injury::new(1u64)
            .with_date(day(2024, 1, 2))
            .with_lti(true)
            .with_time_off(3)];
        assert_eq!(ltisr(&injuries, &context), ltisr(&injuries, &context));
        assert_eq!(
            days_without_lti(&injuries, &context),
            days_without_lti(&injuries, &context)
        );
    }
}

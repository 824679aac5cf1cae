//! Markdown rendering of snapshots.

use crate::metrics::snapshot::{PipelineStatus, Snapshot};
use crate::records::Incident;

/// Format a snapshot as a Markdown summary.
pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let mut output = String::from("## HSE Metrics\n\n");
    let kpis = &snapshot.kpis;

    if let Some(window) = snapshot.window {
        output.push_str(&format!(
            "_Window: {} to {} ({} days)_\n\n",
            window.start,
            window.end,
            window.length_days()
        ));
    }

    match snapshot.status {
        PipelineStatus::Error => {
            output.push_str(&format!(
                "> **Error**: {}. Showing last known values.\n\n",
                snapshot.error.as_deref().unwrap_or("unknown failure")
            ));
        }
        PipelineStatus::Loading => output.push_str("> Loading...\n\n"),
        PipelineStatus::Idle => output.push_str("> No data loaded yet.\n\n"),
        PipelineStatus::Ready => {}
    }

    output.push_str("### Project\n");
    output.push_str(&format!(
        "- **Score**: {} / 100 {}\n",
        kpis.project_score, kpis.project_rating
    ));
    output.push_str(&format!(
        "- **Days Without LTI**: {}\n",
        kpis.days_without_lti
    ));

    output.push_str("\n### Leading Indicators\n");
    output.push_str(&format!(
        "- **Near Misses**: {}\n",
        kpis.leading_indicators
    ));
    output.push_str(&format!(
        "- **Training Pass Rate**: {:.1}%\n",
        kpis.training_average
    ));
    output.push_str(&format!(
        "- **Open Observations**: {}\n",
        kpis.observations_open
    ));

    output.push_str("\n### Lagging Indicators\n");
    output.push_str(&format!(
        "- **Incidents**: {} ({} reported, {} critical)\n",
        kpis.total_incidents, kpis.incidents_reported, kpis.critical_incidents
    ));
    output.push_str(&format!(
        "- **LTIs**: {} ({} days lost)\n",
        kpis.lti_count, kpis.lost_days
    ));
    output.push_str(&format!("- **LTIFR**: {:.2}\n", kpis.ltifr));
    output.push_str(&format!("- **LTISR**: {:.2}\n", kpis.ltisr));
    output.push_str(&format!("- **Accident Rate**: {:.2}\n", kpis.art));

    output.push_str("\n### Compliance\n");
    output.push_str(&format!("- **Open NCRs**: {}\n", kpis.ncrs_open));
    output.push_str(&format!("- **Violations**: {}\n", kpis.total_violations));

    output
}

/// Format critical incidents as a Markdown list, newest first.
pub fn format_critical(incidents: &[Incident]) -> String {
    let mut output = String::from("## Critical Incidents\n\n");
    if incidents.is_empty() {
        output.push_str("None.\n");
        return output;
    }

    for incident in incidents {
        let date = incident
            .incident_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "undated".to_string());
        let severity = incident
            .severity
            .map(|severity| format!("{:?}", severity))
            .unwrap_or_else(|| "-".to_string());
        let summary = incident
            .description
            .as_deref()
            .or(incident.incident_type.as_deref())
            .unwrap_or("(no description)");
        output.push_str(&format!(
            "- **{}** [{}] {} (id {})\n",
            date, severity, summary, incident.id
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::snapshot::SafetyKpis;
    use crate::metrics::window::DateWindow;
    use crate::records::Severity;
    use chrono::NaiveDate;

    fn window() -> DateWindow {
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).expect("date");
        DateWindow::ending_at(end, 31).expect("window")
    }

    #[test]
    fn test_format_ready_snapshot() {
        let kpis = SafetyKpis {
            total_incidents: 3,
            incidents_reported: 2,
            ltifr: 1.0,
            ncrs_open: 4,
            ..Default::default()
        };
        let output = format_snapshot(&Snapshot::ready(kpis, window()));

        assert!(output.contains("## HSE Metrics"));
        assert!(output.contains("2024-01-01 to 2024-02-01 (31 days)"));
        assert!(output.contains("**Incidents**: 3 (2 reported, 0 critical)"));
        assert!(output.contains("**LTIFR**: 1.00"));
        assert!(output.contains("**Open NCRs**: 4"));
        assert!(!output.contains("Error"));
    }

    #[test]
    fn test_format_error_snapshot() {
        let failed = Snapshot::failed(&Snapshot::idle(), "store unavailable");
        let output = format_snapshot(&failed);
        assert!(output.contains("**Error**: store unavailable"));
    }

    #[test]
    fn test_format_critical_list() {
        let incidents = vec![Incident::new(7u64)
            .with_date(NaiveDate::from_ymd_opt(2024, 1, 9).expect("date"))
            .with_severity(Severity::Critical)
            .with_description("Crane collapse")];
        let output = format_critical(&incidents);
        assert!(output.contains("- **2024-01-09** [Critical] Crane collapse (id 7)"));
        assert!(format_critical(&[]).contains("None."));
    }
}

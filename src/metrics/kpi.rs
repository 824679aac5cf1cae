//! KPI selection and domain dependencies.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::records::{Domain, DomainSet};

/// A single dashboard KPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kpi {
    LeadingIndicators,
    IncidentsReported,
    TotalIncidents,
    TrainingAverage,
    DaysWithoutLti,
    Ltifr,
    Ltisr,
    Art,
    NcrsOpen,
    ProjectScore,
    ProjectRating,
    LtiCount,
    LostDays,
    CriticalIncidents,
    ObservationsOpen,
    TotalViolations,
}

impl Kpi {
    pub const ALL: [Kpi; 16] = [
        Kpi::LeadingIndicators,
        Kpi::IncidentsReported,
        Kpi::TotalIncidents,
        Kpi::TrainingAverage,
        Kpi::DaysWithoutLti,
        Kpi::Ltifr,
        Kpi::Ltisr,
        Kpi::Art,
        Kpi::NcrsOpen,
        Kpi::ProjectScore,
        Kpi::ProjectRating,
        Kpi::LtiCount,
        Kpi::LostDays,
        Kpi::CriticalIncidents,
        Kpi::ObservationsOpen,
        Kpi::TotalViolations,
    ];

    /// Domains whose records this KPI reads.
    pub fn dependencies(&self) -> DomainSet {
        let set = DomainSet::empty();
        match self {
            Kpi::LeadingIndicators
            | Kpi::IncidentsReported
            | Kpi::TotalIncidents
            | Kpi::CriticalIncidents => set.with(Domain::Incident),
            Kpi::TrainingAverage => set.with(Domain::Training),
            Kpi::DaysWithoutLti | Kpi::Ltifr | Kpi::Ltisr | Kpi::LtiCount | Kpi::LostDays => {
                set.with(Domain::Injury)
            }
            Kpi::Art => set.with(Domain::Injury).with(Domain::Incident),
            Kpi::NcrsOpen => set.with(Domain::Ncr),
            Kpi::ProjectScore | Kpi::ProjectRating => set
                .with(Domain::Training)
                .with(Domain::Injury)
                .with(Domain::Incident)
                .with(Domain::Ncr),
            Kpi::ObservationsOpen => set.with(Domain::Observation),
            Kpi::TotalViolations => set.with(Domain::Violation),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kpi::LeadingIndicators => "leading_indicators",
            Kpi::IncidentsReported => "incidents_reported",
            Kpi::TotalIncidents => "total_incidents",
            Kpi::TrainingAverage => "training_average",
            Kpi::DaysWithoutLti => "days_without_lti",
            Kpi::Ltifr => "ltifr",
            Kpi::Ltisr => "ltisr",
            Kpi::Art => "art",
            Kpi::NcrsOpen => "ncrs_open",
            Kpi::ProjectScore => "project_score",
            Kpi::ProjectRating => "project_rating",
            Kpi::LtiCount => "lti_count",
            Kpi::LostDays => "lost_days",
            Kpi::CriticalIncidents => "critical_incidents",
            Kpi::ObservationsOpen => "observations_open",
            Kpi::TotalViolations => "total_violations",
        }
    }
}

impl fmt::Display for Kpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown KPI: {0}")]
pub struct UnknownKpi(pub String);

impl FromStr for Kpi {
    type Err = UnknownKpi;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Kpi::ALL
            .into_iter()
            .find(|kpi| kpi.name() == wanted)
            .ok_or_else(|| UnknownKpi(s.to_string()))
    }
}

/// The KPIs a pipeline computes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KpiSet(BTreeSet<Kpi>);

impl KpiSet {
    pub fn all() -> Self {
        Kpi::ALL.into_iter().collect()
    }

    pub fn only(kpis: impl IntoIterator<Item = Kpi>) -> Self {
        kpis.into_iter().collect()
    }

    pub fn contains(&self, kpi: Kpi) -> bool {
        self.0.contains(&kpi)
    }

    /// Union of every member's dependencies.
    pub fn domains(&self) -> DomainSet {
        self.0
            .iter()
            .fold(DomainSet::empty(), |set, kpi| set.union(kpi.dependencies()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Kpi> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Kpi> for KpiSet {
    fn from_iter<T: IntoIterator<Item = Kpi>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

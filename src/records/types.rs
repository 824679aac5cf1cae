//! Typed records for each domain.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::de::{self, Aliased, Aliases};
use super::domain::Domain;

/// Opaque record identifier; the forms use epoch milliseconds, imports use text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(Number),
    Text(String),
}

impl RecordId {
    /// Numeric view of the identifier, when it has one.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            RecordId::Number(number) => number.as_f64(),
            RecordId::Text(text) => text.trim().parse::<f64>().ok(),
        }
        .filter(|value| value.is_finite())
    }

    /// Order by insertion recency: numeric ids compare numerically and rank
    /// above non-numeric ones, which compare as text.
    pub fn recency_cmp(&self, other: &RecordId) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(number) => write!(f, "{}", number),
            RecordId::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        RecordId::Number(Number::from(value))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

/// Human-readable serial number as stored (`"07"`, `7`, `"INC-007"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Serial {
    Number(Number),
    Text(String),
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Serial::Number(number) => write!(f, "{}", number),
            Serial::Text(text) => f.write_str(text),
        }
    }
}

fn normalize_label(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Incident severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "low" => Ok(Severity::Low),
            "medium" | "moderate" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(()),
        }
    }
}

/// Non-conformance report status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NcrStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
    Cancelled,
}

impl FromStr for NcrStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "open" => Ok(NcrStatus::Open),
            "inprogress" => Ok(NcrStatus::InProgress),
            "closed" => Ok(NcrStatus::Closed),
            "cancelled" | "canceled" => Ok(NcrStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// Observation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationStatus {
    Open,
    Closed,
}

impl FromStr for ObservationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "open" => Ok(ObservationStatus::Open),
            "closed" => Ok(ObservationStatus::Closed),
            _ => Err(()),
        }
    }
}

/// Whether a training was delivered in-house or by an outside provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainingKind {
    Internal,
    External,
}

impl FromStr for TrainingKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "internal" | "inhouse" => Ok(TrainingKind::Internal),
            "external" => Ok(TrainingKind::External),
            _ => Err(()),
        }
    }
}

/// `createdAt` as older imports spelled it.
const CREATED_AT: (&str, &[&str]) = ("createdAt", &["created_at"]);

/// A record stored in one domain collection.
///
/// Stored values are decoded with [`Aliased::from_stored`].
pub trait DomainRecord: Aliased + Serialize + Clone + Send + Sync + 'static {
    const DOMAIN: Domain;

    fn id(&self) -> &RecordId;

    /// Date used to place the record in a reporting window.
    fn window_date(&self) -> Option<NaiveDate>;
}

/// Extra incident details older forms stored as an embedded JSON string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDetails {
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub immediate_action: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
}

impl Aliased for IncidentDetails {
    const ALIASES: Aliases = &[
        ("reportedBy", &["reported_by"]),
        ("immediateAction", &["immediate_action"]),
        ("rootCause", &["root_cause"]),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "srno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::label", skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::tags", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub report_reference: Option<String>,
    #[serde(default, deserialize_with = "de::embedded", skip_serializing_if = "Option::is_none")]
    pub details: Option<IncidentDetails>,
}

impl Incident {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            serial: None,
            incident_date: None,
            severity: None,
            incident_type: None,
            description: None,
            tags: Vec::new(),
            report_reference: None,
            details: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.incident_date = Some(date);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_type(mut self, incident_type: impl Into<String>) -> Self {
        self.incident_type = Some(incident_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_report_reference(mut self, reference: impl Into<String>) -> Self {
        self.report_reference = Some(reference.into());
        self
    }

    /// True when a report reference has been filed.
    pub fn is_reported(&self) -> bool {
        self.report_reference
            .as_deref()
            .is_some_and(|reference| !reference.trim().is_empty())
    }
}

impl Aliased for Incident {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("incidentDate", &["incident_date", "date"]),
        ("incidentType", &["incident_type", "type"]),
        ("tags", &["classification"]),
        ("reportReference", &["report_reference", "reportNo"]),
        ("details", &["extra_details", "extraDetails"]),
    ];
}

impl DomainRecord for Incident {
    const DOMAIN: Domain = Domain::Incident;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.incident_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Injury {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "srno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<NaiveDate>,
    #[serde(
        default,
        rename = "isLTI",
        deserialize_with = "de::flag",
        skip_serializing_if = "Option::is_none",
    )]
    pub is_lti: Option<bool>,
    #[serde(default, deserialize_with = "de::count", skip_serializing_if = "Option::is_none")]
    pub time_off_days: Option<u32>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub injured_person: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Injury {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            serial: None,
            incident_date: None,
            is_lti: None,
            time_off_days: None,
            injured_person: None,
            description: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.incident_date = Some(date);
        self
    }

    pub fn with_lti(mut self, is_lti: bool) -> Self {
        self.is_lti = Some(is_lti);
        self
    }

    pub fn with_time_off(mut self, days: u32) -> Self {
        self.time_off_days = Some(days);
        self
    }

    pub fn is_lti(&self) -> bool {
        self.is_lti.unwrap_or(false)
    }
}

impl Aliased for Injury {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("incidentDate", &["incident_date", "injuryDate", "date"]),
        ("isLTI", &["is_lti", "isLti", "lti"]),
        ("timeOffDays", &["time_off_days", "daysLost"]),
        ("injuredPerson", &["injured_person"]),
    ];
}

impl DomainRecord for Injury {
    const DOMAIN: Domain = Domain::Injury;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.incident_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "srno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub training_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de::number", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "de::label", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TrainingKind>,
}

impl Training {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            serial: None,
            training_date: None,
            title: None,
            score: None,
            kind: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.training_date = Some(date);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_kind(mut self, kind: TrainingKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl Aliased for Training {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("trainingDate", &["training_date", "date"]),
        ("title", &["topic"]),
        ("kind", &["internalExternal", "trainingType"]),
    ];
}

impl DomainRecord for Training {
    const DOMAIN: Domain = Domain::Training;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.training_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Induction {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "sno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub induction_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Aliased for Induction {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("inductionDate", &["induction_date", "date"]),
        ("name", &["inducteeName"]),
    ];
}

impl DomainRecord for Induction {
    const DOMAIN: Domain = Domain::Induction;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.induction_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyEntry {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "srno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub competency: Option<String>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

impl Aliased for CompetencyEntry {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("expiryDate", &["expiry_date"]),
    ];
}

impl DomainRecord for CompetencyEntry {
    const DOMAIN: Domain = Domain::TrainingCompetency;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|stamp| stamp.date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "srno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Aliased for EventRecord {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("eventDate", &["event_date", "date"]),
        ("title", &["eventName"]),
    ];
}

impl DomainRecord for EventRecord {
    const DOMAIN: Domain = Domain::Event;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.event_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "srno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub created_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de::label", skip_serializing_if = "Option::is_none")]
    pub status: Option<ObservationStatus>,
}

impl Observation {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            serial: None,
            created_date: None,
            category: None,
            status: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.created_date = Some(date);
        self
    }

    pub fn with_status(mut self, status: ObservationStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl Aliased for Observation {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("createdDate", &["created_date", "observationDate", "date"]),
    ];
}

impl DomainRecord for Observation {
    const DOMAIN: Domain = Domain::Observation;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.created_date
            .or_else(|| self.created_at.map(|stamp| stamp.date_naive()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ncr {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "srno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub issued_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::label", skip_serializing_if = "Option::is_none")]
    pub status: Option<NcrStatus>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Ncr {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            serial: None,
            issued_date: None,
            status: None,
            description: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.issued_date = Some(date);
        self
    }

    pub fn with_status(mut self, status: NcrStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl Aliased for Ncr {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("issuedDate", &["issued_date", "issueDate", "date"]),
    ];
}

impl DomainRecord for Ncr {
    const DOMAIN: Domain = Domain::Ncr;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.issued_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "srno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub reported_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub safety_codes_broken: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub next_course_of_action: Option<String>,
}

impl Violation {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            serial: None,
            reported_date: None,
            report_type: None,
            safety_codes_broken: None,
            next_course_of_action: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.reported_date = Some(date);
        self
    }
}

impl Aliased for Violation {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("reportedDate", &["reported_date", "violationDate", "date"]),
        ("reportType", &["report_type"]),
        ("safetyCodesBroken", &["safety_codes_broken"]),
        ("nextCourseOfAction", &["next_course_of_action"]),
    ];
}

impl DomainRecord for Violation {
    const DOMAIN: Domain = Domain::Violation;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.reported_date
            .or_else(|| self.created_at.map(|stamp| stamp.date_naive()))
    }
}

/// Entry in the CNR tracker register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CnrEntry {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "srno", skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,
    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub cnr_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Aliased for CnrEntry {
    const ALIASES: Aliases = &[
        CREATED_AT,
        ("cnrDate", &["cnr_date", "date"]),
    ];
}

impl DomainRecord for CnrEntry {
    const DOMAIN: Domain = Domain::Cnr;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn window_date(&self) -> Option<NaiveDate> {
        self.cnr_date
    }
}

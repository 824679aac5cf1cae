//! Domain records read by the metrics core.
//!
//! Each dashboard register is a [`Domain`] with a stable storage key. Records
//! are decoded into typed structs once, at the store boundary, with lenient
//! field decoders for the loosely typed data the forms produce.

pub mod de;
pub mod domain;
pub mod types;

use serde_json::Value;

pub use de::Aliased;
pub use domain::{Domain, DomainSet, UnknownDomain};
pub use types::{
    CnrEntry, CompetencyEntry, DomainRecord, EventRecord, Incident, IncidentDetails, Induction,
    Injury, Ncr, NcrStatus, Observation, ObservationStatus, RecordId, Serial, Severity, Training,
    TrainingKind, Violation,
};

/// Check that `value` decodes as a record of `domain`.
///
/// Lenient fields never fail; this rejects shapes no record can take, such
/// as an object where the id belongs.
pub fn check_value(domain: Domain, value: &Value) -> serde_json::Result<()> {
    fn decodes<R: DomainRecord>(value: &Value) -> serde_json::Result<()> {
        R::from_stored(value.clone()).map(drop)
    }

    match domain {
        Domain::Incident => decodes::<Incident>(value),
        Domain::Injury => decodes::<Injury>(value),
        Domain::Training => decodes::<Training>(value),
        Domain::Induction => decodes::<Induction>(value),
        Domain::TrainingCompetency => decodes::<CompetencyEntry>(value),
        Domain::Event => decodes::<EventRecord>(value),
        Domain::Observation => decodes::<Observation>(value),
        Domain::Ncr => decodes::<Ncr>(value),
        Domain::Violation => decodes::<Violation>(value),
        Domain::Cnr => decodes::<CnrEntry>(value),
    }
}

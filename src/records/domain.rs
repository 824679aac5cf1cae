//! Record domains and their storage keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named collection of records, one per dashboard register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Incident,
    Injury,
    Training,
    Induction,
    TrainingCompetency,
    Event,
    Observation,
    Ncr,
    Violation,
    Cnr,
}

impl Domain {
    /// Every domain, in storage-key order of the original registers.
    pub const ALL: [Domain; 10] = [
        Domain::Incident,
        Domain::Injury,
        Domain::Training,
        Domain::Induction,
        Domain::TrainingCompetency,
        Domain::Event,
        Domain::Observation,
        Domain::Ncr,
        Domain::Violation,
        Domain::Cnr,
    ];

    /// Stable storage key for the domain's collection.
    pub fn key(&self) -> &'static str {
        match self {
            Domain::Incident => "incident_report",
            Domain::Injury => "injury_details",
            Domain::Training => "training_records",
            Domain::Induction => "induction_records",
            Domain::TrainingCompetency => "training_competency_register",
            Domain::Event => "event_records",
            Domain::Observation => "observation_tracker",
            Domain::Ncr => "ncr_register",
            Domain::Violation => "hse_violations",
            Domain::Cnr => "cnr_tracker",
        }
    }

    /// Parse a storage key back into a domain.
    pub fn from_key(key: &str) -> Option<Domain> {
        Domain::ALL.into_iter().find(|domain| domain.key() == key)
    }

    /// Name of the field holding the human-readable serial number.
    ///
    /// The induction register predates the others and uses `sno`.
    pub fn serial_field(&self) -> &'static str {
        match self {
            Domain::Induction => "sno",
            _ => "srno",
        }
    }

    fn bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when a storage key names no known domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown domain key: {0}")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::from_key(s.trim()).ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

/// A small copyable set of domains.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DomainSet(u16);

impl DomainSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Domain::ALL.into_iter().collect()
    }

    pub fn with(mut self, domain: Domain) -> Self {
        self.insert(domain);
        self
    }

    pub fn insert(&mut self, domain: Domain) {
        self.0 |= domain.bit();
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.0 & domain.bit() != 0
    }

    pub fn union(self, other: DomainSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Domain> + '_ {
        Domain::ALL
            .into_iter()
            .filter(move |domain| self.contains(*domain))
    }
}

impl FromIterator<Domain> for DomainSet {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        let mut set = DomainSet::empty();
        for domain in iter {
            set.insert(domain);
        }
        set
    }
}

impl fmt::Debug for DomainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

//! Suggested serial numbers for new records.
//!
//! The next serial is derived from the most recently inserted record (the one
//! with the largest identifier), not from the largest serial. Two drafts opened
//! before either is saved will be offered the same serial; nothing here
//! reserves a number.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::records::{Domain, RecordId};
use crate::store::{RecordStore, StoreError};

/// Serial offered when a domain has no usable previous serial.
pub const FIRST_SERIAL: &str = "01";

const MIN_WIDTH: usize = 2;

fn trailing_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s*$").expect("static serial pattern is valid"))
}

/// Why a serial could not be derived. Logged; callers get [`FIRST_SERIAL`].
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("could not read {domain}: {source}")]
    Read {
        domain: Domain,
        #[source]
        source: StoreError,
    },
    #[error("serial {serial:?} in {domain} overflows")]
    Overflow { domain: Domain, serial: String },
}

/// Suggests the next serial number for a domain.
#[derive(Debug, Clone)]
pub struct SerialGenerator {
    store: RecordStore,
}

impl SerialGenerator {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Next serial for `domain`, never failing: any error is logged and
    /// [`FIRST_SERIAL`] is returned.
    pub async fn next(&self, domain: Domain) -> String {
        match self.try_next(domain).await {
            Ok(serial) => serial,
            Err(err) => {
                tracing::warn!(domain = %domain, error = %err, "serial generation failed");
                FIRST_SERIAL.to_string()
            }
        }
    }

    /// Next serial for `domain`, reporting why derivation failed.
    pub async fn try_next(&self, domain: Domain) -> Result<String, SerialError> {
        let records = self
            .store
            .read_values(domain)
            .await
            .map_err(|source| SerialError::Read { domain, source })?;
        next_serial_from(domain, &records)
    }
}

/// Pure form of [`SerialGenerator::try_next`] over already-read records.
pub fn next_serial_from(domain: Domain, records: &[Value]) -> Result<String, SerialError> {
    let Some(latest) = latest_record(records) else {
        return Ok(FIRST_SERIAL.to_string());
    };

    let current = match latest.get(domain.serial_field()) {
        None | Some(Value::Null) => return Ok(FIRST_SERIAL.to_string()),
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n.trunc() as u64))
            .unwrap_or(0),
        Some(Value::String(text)) => match trailing_digits().captures(text) {
            Some(captures) => captures[1].parse::<u64>().map_err(|_| SerialError::Overflow {
                domain,
                serial: text.clone(),
            })?,
            None => 0,
        },
        Some(_) => 0,
    };

    let next = current.checked_add(1).ok_or_else(|| SerialError::Overflow {
        domain,
        serial: current.to_string(),
    })?;
    Ok(format!("{:0width$}", next, width = MIN_WIDTH))
}

/// The record with the numerically largest id; among non-numeric ids the
/// later position wins.
fn latest_record(records: &[Value]) -> Option<&Value> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.is_object())
        .max_by(|(a_pos, a), (b_pos, b)| {
            let a_id = record_id(a).as_ref().and_then(RecordId::numeric);
            let b_id = record_id(b).as_ref().and_then(RecordId::numeric);
            match (a_id, b_id) {
                (Some(x), Some(y)) => x.total_cmp(&y).then(a_pos.cmp(b_pos)),
                (Some(_), None) => std::cmp::Ordering::Greater,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (None, None) => a_pos.cmp(b_pos),
            }
        })
        .map(|(_, record)| record)
}

fn record_id(record: &Value) -> Option<RecordId> {
    record
        .get("id")
        .and_then(|id| serde_json::from_value::<RecordId>(id.clone()).ok())
}

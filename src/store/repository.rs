//! Typed access to domain collections.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::bus::ChangeBus;
use crate::records::{Domain, DomainRecord};
use crate::store::backend::{MemoryBackend, StoreBackend};
use crate::store::{ParseFailure, StoreResult};

/// Reads and writes whole domain collections and announces writes.
///
/// Writes replace the full collection. [`append`](Self::append) is a plain
/// read-modify-write with no locking: two concurrent appends to the same
/// domain can lose one of the records.
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn StoreBackend>,
    bus: ChangeBus,
}

impl RecordStore {
    pub fn new(backend: impl StoreBackend + 'static, bus: ChangeBus) -> Self {
        Self {
            backend: Arc::new(backend),
            bus,
        }
    }

    pub fn from_shared(backend: Arc<dyn StoreBackend>, bus: ChangeBus) -> Self {
        Self { backend, bus }
    }

    /// Store over a fresh [`MemoryBackend`] and bus.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new(), ChangeBus::new())
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Read a domain as untyped JSON values.
    ///
    /// Missing data and data that is not a JSON array read as empty; only an
    /// unreachable backend is an error.
    pub async fn read_values(&self, domain: Domain) -> StoreResult<Vec<Value>> {
        let Some(contents) = self.backend.load(domain).await? else {
            return Ok(Vec::new());
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(values)) => Ok(values),
            Ok(Value::Null) => Ok(Vec::new()),
            Ok(other) => {
                let failure = ParseFailure {
                    domain,
                    reason: format!("expected a JSON array, found {}", json_kind(&other)),
                };
                tracing::warn!(error = %failure, "treating collection as empty");
                Ok(Vec::new())
            }
            Err(err) => {
                let failure = ParseFailure {
                    domain,
                    reason: err.to_string(),
                };
                tracing::warn!(error = %failure, "treating collection as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Read a domain as typed records. Records that fail to decode are
    /// skipped and logged.
    pub async fn read<R: DomainRecord>(&self) -> StoreResult<Vec<R>> {
        let values = self.read_values(R::DOMAIN).await?;
        let mut records = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match R::from_stored(value) {
                Ok(record) => records.push(record),
                Err(err) => {
                    let failure = ParseFailure {
                        domain: R::DOMAIN,
                        reason: format!("record {}: {}", index, err),
                    };
                    tracing::warn!(error = %failure, "skipping record");
                }
            }
        }
        Ok(records)
    }

    /// Replace a domain's collection with `records`.
    pub async fn write<R: DomainRecord>(&self, records: &[R]) -> StoreResult<()> {
        let contents = serde_json::to_string(records)?;
        self.save(R::DOMAIN, contents).await
    }

    pub async fn write_values(&self, domain: Domain, values: &[Value]) -> StoreResult<()> {
        let contents = serde_json::to_string(values)?;
        self.save(domain, contents).await
    }

    /// Read, push, write.
    pub async fn append<R: DomainRecord>(&self, record: R) -> StoreResult<()> {
        let mut values = self.read_values(R::DOMAIN).await?;
        values.push(serde_json::to_value(&record)?);
        self.write_values(R::DOMAIN, &values).await
    }

    pub async fn append_value(&self, domain: Domain, value: Value) -> StoreResult<()> {
        let mut values = self.read_values(domain).await?;
        values.push(value);
        self.write_values(domain, &values).await
    }

    async fn save(&self, domain: Domain, contents: String) -> StoreResult<()> {
        self.backend.save(domain, contents).await?;
        self.bus.publish(domain);
        Ok(())
    }
}

impl fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("subscribers", &self.bus.subscriber_count())
            .finish_non_exhaustive()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

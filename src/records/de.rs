//! Lenient field decoders applied once at the store boundary.
//!
//! Collections written by the dashboard forms are loosely typed: dates arrive
//! as plain dates or full timestamps, flags as booleans or "yes"/"no", counts
//! as numbers or numeric strings. Each helper accepts the shapes seen in
//! practice and maps anything else to `None` instead of failing the record.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.filter(|value| !value.is_null()))
}

/// Parse a calendar date from the formats the forms produce.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.with_timezone(&Utc).date_naive());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
        return Some(stamp.date());
    }
    NaiveDate::parse_from_str(text, "%d/%m/%Y").ok()
}

/// Parse a point in time from RFC 3339 text or epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            DateTime::parse_from_rfc3339(text)
                .map(|stamp| stamp.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    parse_date(text)
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                        .map(|stamp| stamp.and_utc())
                })
        }
        Value::Number(number) => number.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    Ok(raw(deserializer)?.and_then(|value| match value {
        Value::String(text) => parse_date(&text),
        other => parse_timestamp(&other).map(|stamp| stamp.date_naive()),
    }))
}

pub fn timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(raw(deserializer)?.as_ref().and_then(parse_timestamp))
}

pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(raw(deserializer)?.and_then(|value| match value {
        Value::Bool(flag) => Some(flag),
        Value::Number(number) => number.as_i64().map(|n| n != 0),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }))
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(raw(deserializer)?.as_ref().and_then(number_of))
}

/// Non-negative whole count; negative or fractional-garbage input is dropped.
pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(raw(deserializer)?
        .as_ref()
        .and_then(number_of)
        .filter(|number| *number >= 0.0)
        .map(|number| number.trunc().min(u32::MAX as f64) as u32))
}

pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(raw(deserializer)?.and_then(|value| match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }))
}

/// Tags arrive either as a JSON array or one comma-separated string.
pub fn tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let tags = match raw(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        Some(Value::String(text)) => text.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(tags
        .into_iter()
        .map(|tag: String| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect())
}

/// Case-insensitive enum text; unknown labels decode as absent.
pub fn label<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(raw(deserializer)?.and_then(|value| match value {
        Value::String(text) => text.parse::<T>().ok(),
        _ => None,
    }))
}

/// A structured object that older forms stored as serialized JSON text.
pub fn embedded<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Aliased,
{
    let decoded = match raw(deserializer)? {
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::String(text)) => {
            serde_json::from_str::<Value>(&text).and_then(T::from_stored)
        }
        Some(value @ Value::Object(_)) => T::from_stored(value),
        _ => return Ok(None),
    };
    match decoded {
        Ok(inner) => Ok(Some(inner)),
        Err(err) => {
            tracing::debug!(error = %err, "ignoring undecodable embedded details");
            Ok(None)
        }
    }
}

/// Stored key spellings: the canonical key, then the other spellings older
/// forms and imports used for the same field.
pub type Aliases = &'static [(&'static str, &'static [&'static str])];

/// A stored shape whose keys have more than one spelling.
///
/// A payload may carry several spellings of one field at once. Decoding goes
/// through [`from_stored`](Aliased::from_stored), which folds them into the
/// canonical key so the record is never rejected as a duplicate field.
pub trait Aliased: DeserializeOwned {
    const ALIASES: Aliases;

    /// Decode one stored value.
    ///
    /// # Arguments
    ///
    /// * `value` - The record as read from the collection
    ///
    /// # Returns
    ///
    /// The typed record, or the decode error for shapes the lenient field
    /// decoders cannot accept (for example an object where the id belongs).
    fn from_stored(mut value: Value) -> serde_json::Result<Self> {
        fold_aliases(&mut value, Self::ALIASES);
        serde_json::from_value(value)
    }
}

/// Rewrite every spelling in `aliases` to its canonical key.
///
/// The first non-blank value wins, checking the canonical key first and then
/// the alternates in order. Blank means null or whitespace-only text.
pub fn fold_aliases(value: &mut Value, aliases: Aliases) {
    let Value::Object(fields) = value else {
        return;
    };
    for (canonical, alternates) in aliases.iter() {
        let mut chosen: Option<Value> = None;
        for key in std::iter::once(*canonical).chain(alternates.iter().copied()) {
            let Some(candidate) = fields.remove(key) else {
                continue;
            };
            let replace = match &chosen {
                None => true,
                Some(current) => is_blank(current) && !is_blank(&candidate),
            };
            if replace {
                chosen = Some(candidate);
            }
        }
        if let Some(chosen) = chosen {
            fields.insert(canonical.to_string(), chosen);
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

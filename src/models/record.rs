//! Parsed performance log record
//!
//! A [`Record`] is built once, either from a validated log line (see
//! [`crate::parser`]) or from its flattened map form read back from a store.
//! It is never mutated afterwards.
//!
//! ## Flattened form
//!
//! ```text
//! {"id": "<uuid>", "service_name": "api", "process": "api.233",
//!  "load_avg_1m": "0.849", "load_avg_5m": "0.561", ...}
//! ```
//!
//! Samples become top-level keys next to the identity fields, in sample order.
//! The map type keeps insertion order, so `from_flattened(to_flattened(r)) == r`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub const ID_KEY: &str = "id";
pub const SERVICE_NAME_KEY: &str = "service_name";
pub const PROCESS_KEY: &str = "process";

/// Keys of the flattened form that are never metric names
pub const RESERVED_KEYS: [&str; 3] = [ID_KEY, SERVICE_NAME_KEY, PROCESS_KEY];

/// Error turning a flattened map back into a [`Record`]
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must be a string")]
    NotAString(&'static str),

    #[error("`{0}` is not a valid UUID")]
    InvalidId(String),

    #[error("sample `{metric}` has a non-numeric value: {value}")]
    InvalidSampleValue { metric: String, value: String },
}

/// One metric measurement attached to a record
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: String,
    pub value: f64,
}

impl Sample {
    pub fn new(metric: impl Into<String>, value: f64) -> Self {
        Self {
            metric: metric.into(),
            value,
        }
    }
}

impl From<(&str, f64)> for Sample {
    fn from((metric, value): (&str, f64)) -> Self {
        Self::new(metric, value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: Uuid,
    service_name: String,
    process: String,
    samples: Vec<Sample>,
}

impl Record {
    pub(crate) fn new(id: Uuid, service_name: String, process: String, samples: Vec<Sample>) -> Self {
        Self {
            id,
            service_name,
            process,
            samples,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    /// Samples in the order they appeared in the log line
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Flatten into the JSON object form used on the wire and in stores.
    ///
    /// Sample values are written as decimal strings. A metric name repeated
    /// within one record keeps its first position and its last value.
    pub fn to_flattened(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(RESERVED_KEYS.len() + self.samples.len());
        map.insert(ID_KEY.to_string(), Value::String(self.id.to_string()));
        map.insert(
            SERVICE_NAME_KEY.to_string(),
            Value::String(self.service_name.clone()),
        );
        map.insert(PROCESS_KEY.to_string(), Value::String(self.process.clone()));

        for sample in &self.samples {
            map.insert(sample.metric.clone(), Value::String(sample.value.to_string()));
        }

        map
    }

    /// Rebuild a record from its flattened form.
    ///
    /// Every non-reserved key is a sample; values may be numbers or numeric
    /// strings. Samples keep the map's iteration order.
    pub fn from_flattened(map: &Map<String, Value>) -> Result<Self, RecordError> {
        let id = string_field(map, ID_KEY)?;
        let id = Uuid::parse_str(id).map_err(|_| RecordError::InvalidId(id.to_string()))?;
        let service_name = string_field(map, SERVICE_NAME_KEY)?.to_string();
        let process = string_field(map, PROCESS_KEY)?.to_string();

        let samples = map
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(metric, value)| sample_from_value(metric, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(id, service_name, process, samples))
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.to_flattened()).to_string()
    }
}

fn string_field<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, RecordError> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(RecordError::NotAString(key)),
        None => Err(RecordError::MissingField(key)),
    }
}

/// Parse a sample value. Only finite numbers are samples.
pub fn parse_sample_value(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn sample_from_value(metric: &str, value: &Value) -> Result<Sample, RecordError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_sample_value(s),
        _ => None,
    };

    parsed
        .map(|v| Sample::new(metric, v))
        .ok_or_else(|| RecordError::InvalidSampleValue {
            metric: metric.to_string(),
            value: value.to_string(),
        })
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_flattened().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Record::from_flattened(&map).map_err(D::Error::custom)
    }
}

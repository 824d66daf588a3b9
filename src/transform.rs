//! Pluggable derivation step applied before storage
//!
//! A transform maps a record's flattened form to a derived flattened form. It
//! may be slow; the pipeline runs it on the blocking pool and never times it out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::RESERVED_KEYS;

#[derive(Debug, Error)]
#[error("transform `{name}` failed: {reason}")]
pub struct TransformError {
    pub name: &'static str,
    pub reason: String,
}

pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, flat: Map<String, Value>) -> Result<Map<String, Value>, TransformError>;
}

/// Which transform the pipeline runs, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    #[default]
    None,
    Summary,
}

pub fn build_transform(kind: TransformKind, delay: Duration) -> Option<Arc<dyn Transform>> {
    match kind {
        TransformKind::None => None,
        TransformKind::Summary => Some(Arc::new(SampleSummary::new(delay))),
    }
}

/// Appends `sample_count`, `sample_mean` and `sample_max` to the samples.
///
/// `delay` stands in for an expensive scoring step.
#[derive(Debug, Clone, Default)]
pub struct SampleSummary {
    delay: Duration,
}

impl SampleSummary {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Transform for SampleSummary {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn apply(&self, mut flat: Map<String, Value>) -> Result<Map<String, Value>, TransformError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let values = flat
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| {
                numeric(value).ok_or_else(|| TransformError {
                    name: self.name(),
                    reason: format!("sample `{}` is not numeric", key),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        flat.insert("sample_count".to_string(), Value::String(values.len().to_string()));
        if !values.is_empty() {
            let n = values.len() as f64;
            let sum = values.iter().sum::<f64>();
            // Scale first when the plain sum overflows
            let mean = if sum.is_finite() {
                sum / n
            } else {
                values.iter().map(|v| v / n).sum()
            };
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            flat.insert("sample_mean".to_string(), Value::String(mean.to_string()));
            flat.insert("sample_max".to_string(), Value::String(max.to_string()));
        }

        Ok(flat)
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

//! Grammar checks for raw performance log lines
//!
//! ```text
//! id=<UUID> service_name=<service> process=<service>.<pid> [sample#<metric>=<float> ...]
//! ```
//!
//! Tokens are separated by single spaces and nothing is trimmed. Each phase is
//! a pure function; [`validate`] runs them in order and stops at the first
//! failure, including the first bad sample.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{parse_sample_value, Service, RESERVED_KEYS};

pub const MIN_FIELDS: usize = 3;
pub const SAMPLE_PREFIX: &str = "sample#";

/// Why a raw line was rejected
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("the log must have at least 3 space-separated parts, found {found}")]
    TooFewFields { found: usize },

    #[error("invalid id part `{token}`: {reason}")]
    InvalidIdentifier { token: String, reason: &'static str },

    #[error("expected the `{expected}=` part, found `{token}`")]
    UnknownField { expected: &'static str, token: String },

    #[error("the service `{0}` is not a valid service")]
    UnknownService(String),

    #[error("the process's service `{process_service}` does not match the service_name `{service_name}`")]
    ServiceMismatch {
        process_service: String,
        service_name: String,
    },

    #[error("the process's pid `{0}` is not a valid integer")]
    InvalidPid(String),

    #[error("invalid sample part `{token}`: {reason}")]
    MalformedSample { token: String, reason: &'static str },

    #[error("the sample value `{value}` for the metric `{metric}` is not a valid number")]
    NonNumericSample { metric: String, value: String },
}

impl ValidationError {
    /// Stable identifier for error bodies and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TooFewFields { .. } => "too_few_fields",
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::UnknownField { .. } => "unknown_field",
            Self::UnknownService(_) => "unknown_service",
            Self::ServiceMismatch { .. } => "service_mismatch",
            Self::InvalidPid(_) => "invalid_pid",
            Self::MalformedSample { .. } => "malformed_sample",
            Self::NonNumericSample { .. } => "non_numeric_sample",
        }
    }
}

/// Pieces of a line that passed every grammar check.
///
/// Only [`validate`] builds one, so anything holding a `ValidatedLine` is
/// known to be well formed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLine<'a> {
    pub(crate) id: Uuid,
    pub(crate) service_name: &'a str,
    pub(crate) process: &'a str,
    pub(crate) samples: Vec<(&'a str, f64)>,
}

pub fn validate(line: &str) -> Result<ValidatedLine<'_>, ValidationError> {
    let parts: Vec<&str> = line.split(' ').collect();
    if parts.len() < MIN_FIELDS {
        return Err(ValidationError::TooFewFields { found: parts.len() });
    }

    let id = validate_id(parts[0])?;
    let service_name = validate_service(parts[1])?;
    let process = validate_process(parts[2], service_name)?;
    let samples = validate_samples(&parts[MIN_FIELDS..])?;

    Ok(ValidatedLine {
        id,
        service_name,
        process,
        samples,
    })
}

/// `id=<UUID>`
pub fn validate_id(part: &str) -> Result<Uuid, ValidationError> {
    let value = part
        .strip_prefix("id=")
        .ok_or_else(|| ValidationError::InvalidIdentifier {
            token: part.to_string(),
            reason: "must start with id=<UUID>",
        })?;

    Uuid::parse_str(value).map_err(|_| ValidationError::InvalidIdentifier {
        token: part.to_string(),
        reason: "not a valid UUID",
    })
}

/// `service_name=<service>`, returning `<service>` in its original casing
pub fn validate_service(part: &str) -> Result<&str, ValidationError> {
    let value = field_value(part, "service_name")?;
    match Service::lookup(value) {
        Some(_) => Ok(value),
        None => Err(ValidationError::UnknownService(value.to_string())),
    }
}

/// `process=<service>.<pid>` where `<service>` equals `service_name` exactly
pub fn validate_process<'a>(part: &'a str, service_name: &str) -> Result<&'a str, ValidationError> {
    let value = field_value(part, "process")?;
    let (process_service, pid) = value.split_once('.').unwrap_or((value, ""));

    if process_service != service_name {
        return Err(ValidationError::ServiceMismatch {
            process_service: process_service.to_string(),
            service_name: service_name.to_string(),
        });
    }
    if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidPid(pid.to_string()));
    }

    Ok(value)
}

/// `sample#<metric>=<float>` for every remaining part, in order
pub fn validate_samples<'a>(parts: &[&'a str]) -> Result<Vec<(&'a str, f64)>, ValidationError> {
    parts.iter().copied().map(validate_sample).collect()
}

fn validate_sample(part: &str) -> Result<(&str, f64), ValidationError> {
    let malformed = |reason| ValidationError::MalformedSample {
        token: part.to_string(),
        reason,
    };

    let body = part
        .strip_prefix(SAMPLE_PREFIX)
        .ok_or_else(|| malformed("must start with sample#<metric>"))?;
    let (metric, value) = body
        .split_once('=')
        .ok_or_else(|| malformed("must be sample#<metric>=<value>"))?;

    if RESERVED_KEYS.contains(&metric) {
        return Err(malformed("metric name is reserved"));
    }

    let value = parse_sample_value(value).ok_or_else(|| ValidationError::NonNumericSample {
        metric: metric.to_string(),
        value: value.to_string(),
    })?;

    Ok((metric, value))
}

fn field_value<'a>(part: &'a str, key: &'static str) -> Result<&'a str, ValidationError> {
    match part.split_once('=') {
        Some((k, value)) if k == key => Ok(value),
        _ => Err(ValidationError::UnknownField {
            expected: key,
            token: part.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG_ID: &str = "0060cd38-9dd5-4eff-a72f-9705f3dd25d9";

    fn line(rest: &str) -> String {
        format!("id={} {}", LOG_ID, rest)
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id=4755dc84-4621-4ba9-a83d-136080aae309").is_ok());

        // missing id= part
        assert!(matches!(
            validate_id("4755dc84-4621-4ba9-a83d-136080aae309"),
            Err(ValidationError::InvalidIdentifier { .. })
        ));

        // not a valid UUID
        assert!(matches!(
            validate_id("id=4755dc84-4621-4ba9-a83d"),
            Err(ValidationError::InvalidIdentifier { reason: "not a valid UUID", .. })
        ));
    }

    #[test]
    fn test_validate_service() {
        assert_eq!(validate_service("service_name=api"), Ok("api"));
        assert_eq!(validate_service("service_name=API"), Ok("API"));

        assert!(matches!(
            validate_service("service"),
            Err(ValidationError::UnknownField { expected: "service_name", .. })
        ));
        assert!(matches!(
            validate_service("service=api"),
            Err(ValidationError::UnknownField { .. })
        ));
        assert_eq!(
            validate_service("service_name=service1"),
            Err(ValidationError::UnknownService("service1".to_string()))
        );
    }

    #[test]
    fn test_validate_process() {
        assert_eq!(validate_process("process=api.1", "api"), Ok("api.1"));

        assert!(matches!(
            validate_process("api.1", "api"),
            Err(ValidationError::UnknownField { expected: "process", .. })
        ));
        assert!(matches!(
            validate_process("process=api.1", "service"),
            Err(ValidationError::ServiceMismatch { .. })
        ));
        // the comparison is case-sensitive after validation
        assert!(matches!(
            validate_process("process=api.1", "API"),
            Err(ValidationError::ServiceMismatch { .. })
        ));
        assert_eq!(
            validate_process("process=api.x1", "api"),
            Err(ValidationError::InvalidPid("x1".to_string()))
        );
        assert_eq!(
            validate_process("process=api", "api"),
            Err(ValidationError::InvalidPid(String::new()))
        );
        assert_eq!(
            validate_process("process=api.-1", "api"),
            Err(ValidationError::InvalidPid("-1".to_string()))
        );
    }

    #[test]
    fn test_validate_samples() {
        assert_eq!(
            validate_samples(&["sample#cpu=1", "sample#memory=2"]),
            Ok(vec![("cpu", 1.0), ("memory", 2.0)])
        );
        assert_eq!(validate_samples(&[]), Ok(vec![]));

        // missing sample# part
        assert!(matches!(
            validate_samples(&["cpu=1", "memory=2"]),
            Err(ValidationError::MalformedSample { .. })
        ));
        // missing =
        assert!(matches!(
            validate_samples(&["sample#cpu=1", "sample#memory"]),
            Err(ValidationError::MalformedSample { token, .. }) if token == "sample#memory"
        ));
        assert!(matches!(
            validate_samples(&["sample#cpu=fast"]),
            Err(ValidationError::NonNumericSample { metric, value }) if metric == "cpu" && value == "fast"
        ));
    }

    #[test]
    fn test_non_finite_samples_rejected() {
        for value in ["NaN", "nan", "inf", "-inf", "infinity", "1e999"] {
            let token = format!("sample#cpu={}", value);
            assert!(
                matches!(
                    validate_samples(&[token.as_str()]),
                    Err(ValidationError::NonNumericSample { .. })
                ),
                "{} should be rejected",
                value
            );
        }
        assert!(validate_samples(&["sample#cpu=1e3", "sample#mem=-0.5"]).is_ok());
    }

    #[test]
    fn test_first_invalid_sample_is_reported() {
        let result = validate_samples(&["sample#a=1", "sample#b=x", "oops"]);
        assert!(matches!(result, Err(ValidationError::NonNumericSample { metric, .. }) if metric == "b"));
    }

    #[test]
    fn test_reserved_metric_names_rejected() {
        assert!(matches!(
            validate_samples(&["sample#id=1"]),
            Err(ValidationError::MalformedSample { reason: "metric name is reserved", .. })
        ));
    }

    #[test]
    fn test_validate_accepts_example_line() {
        let raw = line("service_name=api process=api.233 sample#load_avg_1m=0.849 sample#load_avg_5m=0.561 sample#load_avg_15m=0.202");
        let validated = validate(&raw).unwrap();
        assert_eq!(validated.service_name, "api");
        assert_eq!(validated.process, "api.233");
        assert_eq!(
            validated.samples,
            vec![("load_avg_1m", 0.849), ("load_avg_5m", 0.561), ("load_avg_15m", 0.202)]
        );
    }

    #[test]
    fn test_validate_rejects_unknown_service() {
        let raw = line("service_name=unknownsvc process=unknownsvc.1");
        assert_eq!(
            validate(&raw).unwrap_err().kind(),
            "unknown_service"
        );
    }

    #[test]
    fn test_too_few_fields_checked_first() {
        assert_eq!(
            validate(""),
            Err(ValidationError::TooFewFields { found: 1 })
        );
        // would also fail the id check, but the count runs first
        assert_eq!(
            validate("garbage process=api.1"),
            Err(ValidationError::TooFewFields { found: 2 })
        );
    }

    #[test]
    fn test_no_whitespace_tolerance() {
        // double space yields an empty token where service_name is expected
        let raw = format!("id={}  service_name=api process=api.1", LOG_ID);
        assert_eq!(validate(&raw).unwrap_err().kind(), "unknown_field");

        // trailing space yields an empty sample token
        let raw = line("service_name=api process=api.1 ");
        assert_eq!(validate(&raw).unwrap_err().kind(), "malformed_sample");
    }

    #[test]
    fn test_error_kinds() {
        let cases = [
            ("4755dc84-4621-4ba9-a83d-136080aae309 service_name=api process=api.1", "invalid_identifier"),
            ("id=not-a-uuid service_name=api process=api.1", "invalid_identifier"),
        ];
        for (raw, kind) in cases {
            assert_eq!(validate(raw).unwrap_err().kind(), kind, "{}", raw);
        }

        let cases = [
            ("api process=api.1", "unknown_field"),
            ("service_name=api api.1", "unknown_field"),
            ("service_name=api process=web.1", "service_mismatch"),
            ("service_name=api process=api.one", "invalid_pid"),
            ("service_name=api process=api.1 load=1", "malformed_sample"),
            ("service_name=api process=api.1 sample#load", "malformed_sample"),
            ("service_name=api process=api.1 sample#load=abc", "non_numeric_sample"),
        ];
        for (rest, kind) in cases {
            assert_eq!(validate(&line(rest)).unwrap_err().kind(), kind, "{}", rest);
        }
    }
}

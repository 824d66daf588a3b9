use std::str::FromStr;

use crate::models::{Record, Sample};
use crate::validator::{self, ValidatedLine, ValidationError};

/// Build a [`Record`] from a line that already passed validation
pub fn parse(line: &ValidatedLine<'_>) -> Record {
    let samples = line
        .samples
        .iter()
        .map(|&(metric, value)| Sample::new(metric, value))
        .collect();

    Record::new(
        line.id,
        line.service_name.to_string(),
        line.process.to_string(),
        samples,
    )
}

/// Validate then parse a raw log line
pub fn parse_line(line: &str) -> Result<Record, ValidationError> {
    validator::validate(line).map(|validated| parse(&validated))
}

impl FromStr for Record {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_line(s)
    }
}

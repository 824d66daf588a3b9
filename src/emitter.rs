//! Sample traffic generator
//!
//! Posts random but valid log lines to a running gateway.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::models::Service;

/// What happened to one posted line
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Status(u16),
    TimedOut,
    ConnectionRefused,
    Failed(String),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EmitReport {
    pub accepted: usize,
    pub rejected: usize,
    pub timed_out: usize,
    pub refused: usize,
    pub failed: usize,
}

impl EmitReport {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Status(201) => self.accepted += 1,
            Outcome::Status(_) => self.rejected += 1,
            Outcome::TimedOut => self.timed_out += 1,
            Outcome::ConnectionRefused => self.refused += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

/// A random line the validator always accepts
pub fn sample_line<R: Rng + ?Sized>(id: Uuid, rng: &mut R) -> String {
    let service = Service::ALL.choose(rng).copied().unwrap_or(Service::Api);
    let pid: u32 = rng.gen_range(1..=65535);
    let load_1m: f64 = rng.gen_range(0.0..4.0);
    let load_5m: f64 = rng.gen_range(0.0..4.0);
    let load_15m: f64 = rng.gen_range(0.0..4.0);

    format!(
        "id={} service_name={} process={}.{} sample#load_avg_1m={:.3} sample#load_avg_5m={:.3} sample#load_avg_15m={:.3}",
        id, service, service, pid, load_1m, load_5m, load_15m
    )
}

/// Post `count` random lines to `endpoint`, one at a time.
///
/// Errors never stop the run; `on_outcome` sees each result with its 1-based
/// position.
pub async fn emit<F>(
    client: &reqwest::Client,
    endpoint: &str,
    count: usize,
    timeout: Duration,
    mut on_outcome: F,
) -> EmitReport
where
    F: FnMut(usize, &Outcome),
{
    let mut report = EmitReport::default();

    for i in 1..=count {
        let line = sample_line(Uuid::new_v4(), &mut rand::thread_rng());
        let outcome = post_line(client, endpoint, &line, timeout).await;

        on_outcome(i, &outcome);
        report.record(&outcome);
    }

    report
}

async fn post_line(client: &reqwest::Client, endpoint: &str, line: &str, timeout: Duration) -> Outcome {
    let result = client
        .post(endpoint)
        .json(&json!({ "log": line }))
        .timeout(timeout)
        .send()
        .await;

    match result {
        Ok(response) => Outcome::Status(response.status().as_u16()),
        Err(e) if e.is_timeout() => Outcome::TimedOut,
        Err(e) if e.is_connect() => Outcome::ConnectionRefused,
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_lines_validate() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let line = sample_line(Uuid::new_v4(), &mut rng);
            let validated = validate(&line);
            assert!(validated.is_ok(), "{} -> {:?}", line, validated);
            assert_eq!(validated.unwrap().samples.len(), 3);
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = EmitReport::default();
        for outcome in [
            Outcome::Status(201),
            Outcome::Status(201),
            Outcome::Status(422),
            Outcome::TimedOut,
            Outcome::ConnectionRefused,
        ] {
            report.record(&outcome);
        }

        assert_eq!(
            report,
            EmitReport {
                accepted: 2,
                rejected: 1,
                timed_out: 1,
                refused: 1,
                failed: 0,
            }
        );
    }
}

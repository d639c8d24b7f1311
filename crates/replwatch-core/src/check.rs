//! The check pipeline: resolve, write, poll, classify

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{CheckError, Result};
use crate::lag::{GRACE_PERIOD, Lag, MeasurementWindow, Thresholds, classify};
use crate::probe::{
    DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_KEY, PollOutcome, wait_for_propagation, write_probe,
};
use crate::resolver::resolve;
use crate::store::{Connector, Endpoint};
use crate::verdict::Verdict;

/// Everything one check needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    /// Replica to measure from
    pub replica: Endpoint,
    pub thresholds: Thresholds,
    pub probe_key: String,
    pub poll_interval: Duration,
}

impl CheckRequest {
    pub fn new(replica: Endpoint, thresholds: Thresholds) -> Self {
        Self {
            replica,
            thresholds,
            probe_key: DEFAULT_PROBE_KEY.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_probe_key(mut self, key: impl Into<String>) -> Self {
        self.probe_key = key.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Result of a measurement that reached the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurement {
    Lag(Lag),
    TimedOut,
}

/// Verdict plus the single line shown to the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub verdict: Verdict,
    /// Measured lag, when the probe was observed in time
    pub lag: Option<Lag>,
    pub summary: String,
}

impl Report {
    /// Report for a probe observed on the replica
    pub fn measured(lag: Lag, thresholds: &Thresholds) -> Self {
        let verdict = classify(lag, thresholds);
        let summary = match verdict {
            Verdict::Ok => format!(
                "Replication is OK. Replica is {lag} seconds behind primary (< {} sec).",
                thresholds.warning
            ),
            Verdict::Critical => format!(
                "Critical! Replication problems: replica is {lag} seconds behind primary (>= {} sec).",
                thresholds.critical
            ),
            Verdict::Warning | Verdict::Unknown => format!(
                "Warning - Replication is slow: replica is {lag} seconds behind primary (>= {} sec).",
                thresholds.warning
            ),
        };
        Self {
            verdict,
            lag: Some(lag),
            summary,
        }
    }

    /// Report for a probe that never showed up before the deadline
    pub fn timed_out(thresholds: &Thresholds) -> Self {
        let waited = thresholds.critical.saturating_add(GRACE_PERIOD.as_secs());
        Self {
            verdict: Verdict::Warning,
            lag: None,
            summary: format!(
                "Warning - Could not measure replication time. Replica may be more than {waited} seconds behind primary (> {} sec).",
                thresholds.warning
            ),
        }
    }

    pub fn failed(err: &CheckError) -> Self {
        Self {
            verdict: err.verdict(),
            lag: None,
            summary: format!("Warning - {err}"),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.verdict.exit_code()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

/// Run the measurement and stop at the first failure
pub async fn measure(connector: &dyn Connector, request: &CheckRequest) -> Result<Measurement> {
    connector.ensure_available()?;

    let mut connections = resolve(connector, &request.replica).await?;
    let probe = write_probe(connections.primary.as_mut(), &request.probe_key).await?;
    let window = MeasurementWindow::open(Instant::now(), &request.thresholds);

    let outcome = wait_for_propagation(
        connections.replica.as_mut(),
        &probe,
        &window,
        request.poll_interval,
    )
    .await?;

    Ok(match outcome {
        PollOutcome::Matched { observed_at, polls } => {
            let lag = window.lag_at(observed_at);
            info!(%lag, polls, primary = %connections.primary_endpoint, "probe round trip complete");
            Measurement::Lag(lag)
        }
        PollOutcome::TimedOut { polls } => {
            warn!(polls, "probe not observed on replica before the deadline");
            Measurement::TimedOut
        }
    })
}

/// Run one check and turn whatever happened into a report
pub async fn run_check(connector: &dyn Connector, request: &CheckRequest) -> Report {
    match measure(connector, request).await {
        Ok(Measurement::Lag(lag)) => Report::measured(lag, &request.thresholds),
        Ok(Measurement::TimedOut) => Report::timed_out(&request.thresholds),
        Err(err) => {
            warn!(kind = err.kind(), error = %err, "replication check failed");
            Report::failed(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_request_defaults() {
        let request = CheckRequest::new(Endpoint::new("replica", 6379), Thresholds::new(5, 10));
        assert_eq!(request.probe_key, "REPL_DELAY_TEST_KEY");
        assert_eq!(request.poll_interval, Duration::from_millis(50));

        let request = request
            .with_probe_key("custom")
            .with_poll_interval(Duration::from_millis(10));
        assert_eq!(request.probe_key, "custom");
        assert_eq!(request.poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn test_measured_reports() {
        let t = Thresholds::new(5, 10);

        let ok = Report::measured(Lag::from_ticks(30_000), &t);
        assert_eq!(ok.verdict, Verdict::Ok);
        assert_eq!(
            ok.to_string(),
            "Replication is OK. Replica is 3.0 seconds behind primary (< 5 sec)."
        );

        let warning = Report::measured(Lag::from_ticks(70_000), &t);
        assert_eq!(warning.exit_code(), 1);
        assert!(warning.summary.starts_with("Warning - Replication is slow"));

        let critical = Report::measured(Lag::from_ticks(120_000), &t);
        assert_eq!(critical.exit_code(), 2);
        assert!(critical.summary.contains("(>= 10 sec)"));
    }

    #[test]
    fn test_timeout_report_is_distinguishable() {
        let t = Thresholds::new(5, 10);
        let report = Report::timed_out(&t);
        assert_eq!(report.verdict, Verdict::Warning);
        assert_eq!(report.lag, None);
        assert!(report.summary.contains("Could not measure replication time"));
        assert!(report.summary.contains("more than 12 seconds"));
        assert_ne!(
            report.summary,
            Report::measured(Lag::from_ticks(70_000), &t).summary
        );
    }

    #[test]
    fn test_failed_report() {
        let err = CheckError::Read(StoreError::Communication("connection reset by peer".into()));
        let report = Report::failed(&err);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(
            report.summary,
            "Warning - Error when trying to read from replica: connection reset by peer"
        );
    }

    #[test]
    fn test_summary_is_one_line() {
        let t = Thresholds::new(1, 2);
        for report in [
            Report::measured(Lag::from_ticks(1), &t),
            Report::measured(Lag::from_ticks(15_000), &t),
            Report::measured(Lag::from_ticks(25_000), &t),
            Report::timed_out(&t),
        ] {
            assert!(!report.to_string().contains('\n'));
        }
    }
}

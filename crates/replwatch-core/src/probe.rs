//! Probe writer and reader
//!
//! The writer replaces the probe key on the primary with the current
//! wall-clock timestamp. The reader polls the same key on the replica until
//! that exact value shows up or the measurement window closes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, info};

use crate::error::{CheckError, Result};
use crate::lag::MeasurementWindow;
use crate::store::StoreClient;

/// Key written on the primary and read back from the replica
pub const DEFAULT_PROBE_KEY: &str = "REPL_DELAY_TEST_KEY";

/// Pause between two reads of the replica
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The marker written to the primary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRecord {
    pub key: String,
    /// Write timestamp, `<unix seconds>.<microseconds>`
    pub value: String,
}

/// How the polling loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The replica returned the probe value
    Matched {
        /// Moment the match was observed
        observed_at: Instant,
        polls: u64,
    },
    /// The window closed before a match was seen
    TimedOut { polls: u64 },
}

/// Render a timestamp the way probe values are stored
pub fn probe_timestamp(now: DateTime<Utc>) -> String {
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

/// Clear the probe key on the primary and write a fresh timestamp under it
pub async fn write_probe(primary: &mut dyn StoreClient, key: &str) -> Result<ProbeRecord> {
    primary.delete(key).await.map_err(CheckError::Write)?;

    let value = probe_timestamp(Utc::now());
    primary.set(key, &value).await.map_err(CheckError::Write)?;

    info!(key, value = %value, "probe written to primary");
    Ok(ProbeRecord {
        key: key.to_string(),
        value,
    })
}

/// Poll the replica until it returns `probe.value` or `window.deadline` passes.
///
/// Each iteration reads, then checks the deadline, then compares. A read that
/// is still pending when the deadline arrives ends the loop as timed out. An
/// absent or stale value just means "not yet".
pub async fn wait_for_propagation(
    replica: &mut dyn StoreClient,
    probe: &ProbeRecord,
    window: &MeasurementWindow,
    poll_interval: Duration,
) -> Result<PollOutcome> {
    let mut polls = 0u64;

    loop {
        polls += 1;

        let observed = match timeout_at(window.deadline, replica.get(&probe.key)).await {
            Ok(read) => read.map_err(CheckError::Read)?,
            Err(_) => {
                debug!(polls, "replica read still pending at deadline");
                return Ok(PollOutcome::TimedOut { polls });
            }
        };

        let now = Instant::now();
        if now > window.deadline {
            return Ok(PollOutcome::TimedOut { polls });
        }

        if observed.as_deref() == Some(probe.value.as_str()) {
            debug!(polls, "probe visible on replica");
            return Ok(PollOutcome::Matched {
                observed_at: now,
                polls,
            });
        }

        debug!(polls, observed = ?observed, "probe not yet visible on replica");
        sleep(poll_interval).await;
    }
}

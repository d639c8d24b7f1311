//! Lag evaluation
//!
//! Elapsed time is kept as an integer count of ten-thousandths of a second,
//! rounded up from the measured duration. Comparing integers against the
//! (integer second) thresholds keeps the boundaries exact: a lag that would
//! print as `5.0` never classifies as below a 5 second threshold.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::verdict::Verdict;

/// Extra wait beyond the critical threshold before giving up on a probe
pub const GRACE_PERIOD: Duration = Duration::from_secs(2);

const TICKS_PER_SECOND: u64 = 10_000;
const NANOS_PER_TICK: u128 = 100_000;

// Stand-in deadline for budgets too large to add to an Instant
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Replication lag with 4 decimal places of precision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lag(u64);

impl Lag {
    /// Round `elapsed` up to the next ten-thousandth of a second
    pub fn from_duration(elapsed: Duration) -> Self {
        let ticks = elapsed.as_nanos().div_ceil(NANOS_PER_TICK);
        Self(u64::try_from(ticks).unwrap_or(u64::MAX))
    }

    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Ten-thousandths of a second
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// True when the lag is at least `seconds`
    pub fn reaches(self, seconds: u64) -> bool {
        self.0 >= seconds.saturating_mul(TICKS_PER_SECOND)
    }
}

impl fmt::Display for Lag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / TICKS_PER_SECOND;
        let frac = format!("{:04}", self.0 % TICKS_PER_SECOND);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            write!(f, "{whole}.0")
        } else {
            write!(f, "{whole}.{frac}")
        }
    }
}

/// Operator-supplied lag limits in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub warning: u64,
    pub critical: u64,
}

impl Thresholds {
    pub fn new(warning: u64, critical: u64) -> Self {
        Self { warning, critical }
    }

    /// How long the reader may wait for the probe to appear
    pub fn wait_budget(&self) -> Duration {
        Duration::from_secs(self.critical).saturating_add(GRACE_PERIOD)
    }
}

/// Classify a measured lag. The critical bound is checked first, so with
/// `warning > critical` a lag never lands in the warning band.
///
/// | lag                     | verdict  |
/// |-------------------------|----------|
/// | `< warning`             | OK       |
/// | `warning ..< critical`  | WARNING  |
/// | `>= critical`           | CRITICAL |
pub fn classify(lag: Lag, thresholds: &Thresholds) -> Verdict {
    if lag.reaches(thresholds.critical) {
        Verdict::Critical
    } else if lag.reaches(thresholds.warning) {
        Verdict::Warning
    } else {
        Verdict::Ok
    }
}

/// Time bounds of one probe measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementWindow {
    /// Moment the probe write completed
    pub start: Instant,
    /// Last moment a match may still be observed
    pub deadline: Instant,
}

impl MeasurementWindow {
    pub fn open(start: Instant, thresholds: &Thresholds) -> Self {
        let deadline = start
            .checked_add(thresholds.wait_budget())
            .unwrap_or(start + FAR_FUTURE);
        Self { start, deadline }
    }

    /// Lag for a match observed at `now`
    pub fn lag_at(&self, now: Instant) -> Lag {
        Lag::from_duration(now.saturating_duration_since(self.start))
    }
}

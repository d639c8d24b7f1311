//! Health verdicts and their supervisor exit codes

use std::fmt;

/// Outcome of a check as understood by a monitoring supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Lag below the warning threshold
    Ok,
    /// Lag between thresholds, or no lag could be measured
    Warning,
    /// Lag at or above the critical threshold
    Critical,
    /// Reserved for supervisor compatibility
    Unknown,
}

impl Verdict {
    /// Process exit code for this verdict
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

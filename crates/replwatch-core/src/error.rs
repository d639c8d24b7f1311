//! Error types for a replication check

use thiserror::Error;

use crate::store::StoreError;
use crate::verdict::Verdict;

/// Result type alias using CheckError
pub type Result<T> = std::result::Result<T, CheckError>;

/// Failures that stop a check before a lag could be measured.
///
/// Timeouts and threshold breaches are outcomes, not errors.
#[derive(Error, Debug)]
pub enum CheckError {
    /// No store client backend can be used
    #[error("store client library is unavailable: {0}")]
    EnvironmentUnavailable(String),

    /// Replica unreachable or its replication metadata unusable
    #[error("Error when trying to get primary's connection details: {0}")]
    Resolution(#[source] StoreError),

    /// Probe key could not be cleared or written on the primary
    #[error("Error when trying to write to primary: {0}")]
    Write(#[source] StoreError),

    /// Communication failure while polling the replica
    #[error("Error when trying to read from replica: {0}")]
    Read(#[source] StoreError),
}

impl CheckError {
    /// Every failure is reported as degraded: the lag could not be verified
    pub fn verdict(&self) -> Verdict {
        Verdict::Warning
    }

    /// Short stable name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EnvironmentUnavailable(_) => "environment_unavailable",
            Self::Resolution(_) => "resolution",
            Self::Write(_) => "write",
            Self::Read(_) => "read",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_failures_are_warnings() {
        let errors = [
            CheckError::EnvironmentUnavailable("no backend".into()),
            CheckError::Resolution(StoreError::MissingField("master_host".into())),
            CheckError::Write(StoreError::Server("READONLY".into())),
            CheckError::Read(StoreError::Communication("connection reset".into())),
        ];
        for err in &errors {
            assert_eq!(err.verdict(), Verdict::Warning, "{}", err.kind());
        }
    }

    #[test]
    fn test_messages_name_the_stage() {
        let err = CheckError::Write(StoreError::Server("OOM command not allowed".into()));
        assert_eq!(
            err.to_string(),
            "Error when trying to write to primary: server replied with an error: OOM command not allowed"
        );
        assert_eq!(err.kind(), "write");
    }
}

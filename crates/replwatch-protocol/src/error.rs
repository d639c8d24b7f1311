//! Error types for the store client

use std::time::Duration;

use redis::RedisError;
use thiserror::Error;

/// Result type alias using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Failures talking to a store instance
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Connection could not be established
    #[error("could not connect to {addr}: {source}")]
    Connect {
        /// Address we tried to reach
        addr: String,
        #[source]
        source: RedisError,
    },

    /// No answer within the configured budget
    #[error("timed out after {after:?} waiting for {operation}")]
    Timeout {
        /// What was pending
        operation: &'static str,
        /// Budget that elapsed
        after: Duration,
    },

    /// Anything the client library reported on an open connection
    #[error(transparent)]
    Redis(#[from] RedisError),

    /// INFO payload has a field we cannot interpret
    #[error("invalid INFO reply: {0}")]
    InvalidInfo(String),

    /// INFO payload lacks a required field
    #[error("missing field `{0}` in INFO reply")]
    MissingField(&'static str),
}

impl ProtocolError {
    /// True when the failure is about the transport rather than the reply content
    pub fn is_communication(&self) -> bool {
        match self {
            Self::Connect { .. } | Self::Timeout { .. } => true,
            Self::Redis(err) => err.is_io_error() || err.is_connection_dropped() || err.is_timeout(),
            Self::InvalidInfo(_) | Self::MissingField(_) => false,
        }
    }

    /// Error reply sent by the server, as `CODE detail`
    pub fn server_reply(&self) -> Option<String> {
        let Self::Redis(err) = self else {
            return None;
        };
        if self.is_communication() {
            return None;
        }
        err.code().map(|code| match err.detail() {
            Some(detail) => format!("{code} {detail}"),
            None => code.to_string(),
        })
    }
}

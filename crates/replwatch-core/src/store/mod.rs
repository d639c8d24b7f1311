//! Store client seam
//!
//! The check only needs five capabilities from the data store: connect,
//! replication metadata, delete, set and get. Anything implementing
//! [`Connector`] and [`StoreClient`] can back a check.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{CheckError, Result};

#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "redis")]
pub use self::redis::RedisConnector;

/// Host and port of a store instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Failures reported by a store client
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not connect to {endpoint}: {reason}")]
    Connect { endpoint: Endpoint, reason: String },

    /// Transport-level failure on an open connection
    #[error("{0}")]
    Communication(String),

    #[error("server replied with an error: {0}")]
    Server(String),

    /// Replication metadata lacks a field the resolver needs
    #[error("replication metadata is missing `{0}`")]
    MissingField(String),

    /// Reply did not have the expected shape
    #[error("invalid reply: {0}")]
    InvalidReply(String),
}

/// An open connection to one store instance
#[async_trait]
pub trait StoreClient: Send {
    /// Address of the primary this instance replicates from
    async fn primary_endpoint(&mut self) -> std::result::Result<Endpoint, StoreError>;

    /// Remove `key`; a missing key is not an error
    async fn delete(&mut self, key: &str) -> std::result::Result<(), StoreError>;

    async fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StoreError>;

    /// Current value of `key`, `None` when not set
    async fn get(&mut self, key: &str) -> std::result::Result<Option<String>, StoreError>;
}

/// Opens store connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Fails when no client backend can be used; checked before any connect
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    async fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> std::result::Result<Box<dyn StoreClient>, StoreError>;
}

/// Socket budgets handed to the client backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(5),
        }
    }
}

/// Connector used when the crate is built without a client backend
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingBackend;

#[async_trait]
impl Connector for MissingBackend {
    fn ensure_available(&self) -> Result<()> {
        Err(CheckError::EnvironmentUnavailable(
            "replwatch was built without a store client backend (enable the `redis` feature)"
                .to_string(),
        ))
    }

    async fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> std::result::Result<Box<dyn StoreClient>, StoreError> {
        Err(StoreError::Connect {
            endpoint: endpoint.clone(),
            reason: "no store client backend".to_string(),
        })
    }
}

/// The connector this build provides
pub fn default_connector(options: ConnectOptions) -> Box<dyn Connector> {
    #[cfg(feature = "redis")]
    {
        Box::new(RedisConnector::new(options))
    }
    #[cfg(not(feature = "redis"))]
    {
        let _ = options;
        Box::new(MissingBackend)
    }
}

//! In-memory primary/replica pair with simulated replication delay
//!
//! Writes on the primary become visible on the replica `delay` later, measured
//! on the tokio clock, so tests can run with paused time.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use replwatch_core::{CheckError, Connector, Endpoint, StoreClient, StoreError};

/// Failure injection knobs
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// `ensure_available` fails: no client library
    pub backend_missing: bool,
    /// Connecting to the replica is refused
    pub replica_unreachable: bool,
    /// Replica reports no primary in its metadata
    pub no_primary_metadata: bool,
    /// Connecting to the primary is refused
    pub primary_unreachable: bool,
    /// Primary rejects writes
    pub primary_read_only: bool,
    /// Replica connection drops after this many successful reads
    pub replica_drops_after: Option<u64>,
    /// Replica reads never complete
    pub replica_hangs: bool,
}

#[derive(Debug, Default)]
struct State {
    primary: HashMap<String, String>,
    replica: HashMap<String, String>,
    in_flight: Vec<(Instant, String, Option<String>)>,
    connects: Vec<Endpoint>,
    replica_reads: u64,
    primary_ops: Vec<String>,
}

impl State {
    fn apply_due(&mut self, now: Instant) {
        let (due, pending): (Vec<_>, Vec<_>) = self
            .in_flight
            .drain(..)
            .partition(|(visible_at, _, _)| *visible_at <= now);
        self.in_flight = pending;
        for (_, key, value) in due {
            match value {
                Some(value) => self.replica.insert(key, value),
                None => self.replica.remove(&key),
            };
        }
    }
}

#[derive(Clone)]
pub struct SimulatedCluster {
    pub replica: Endpoint,
    pub primary: Endpoint,
    /// `None` means replication is stalled
    delay: Option<Duration>,
    faults: Faults,
    state: Arc<Mutex<State>>,
}

impl SimulatedCluster {
    pub fn with_delay(delay: Duration) -> Self {
        Self::build(Some(delay), Faults::default())
    }

    pub fn stalled() -> Self {
        Self::build(None, Faults::default())
    }

    pub fn with_faults(delay: Option<Duration>, faults: Faults) -> Self {
        Self::build(delay, faults)
    }

    fn build(delay: Option<Duration>, faults: Faults) -> Self {
        Self {
            replica: Endpoint::new("replica.test", 6380),
            primary: Endpoint::new("primary.test", 6379),
            delay,
            faults,
            state: Arc::default(),
        }
    }

    /// Endpoints connected to, in order
    pub fn connects(&self) -> Vec<Endpoint> {
        self.state.lock().connects.clone()
    }

    pub fn replica_reads(&self) -> u64 {
        self.state.lock().replica_reads
    }

    /// Commands issued against the primary, in order
    pub fn primary_ops(&self) -> Vec<String> {
        self.state.lock().primary_ops.clone()
    }

    pub fn primary_value(&self, key: &str) -> Option<String> {
        self.state.lock().primary.get(key).cloned()
    }

    pub fn seed_replica(&self, key: &str, value: &str) {
        self.state
            .lock()
            .replica
            .insert(key.to_string(), value.to_string());
    }

    pub fn seed_primary(&self, key: &str, value: &str) {
        self.state
            .lock()
            .primary
            .insert(key.to_string(), value.to_string());
    }

    fn replicate(&self, state: &mut State, key: &str, value: Option<String>) {
        if let Some(delay) = self.delay {
            state
                .in_flight
                .push((Instant::now() + delay, key.to_string(), value));
        }
    }
}

#[async_trait]
impl Connector for SimulatedCluster {
    fn ensure_available(&self) -> replwatch_core::Result<()> {
        if self.faults.backend_missing {
            return Err(CheckError::EnvironmentUnavailable(
                "simulated missing client library".to_string(),
            ));
        }
        Ok(())
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn StoreClient>, StoreError> {
        self.state.lock().connects.push(endpoint.clone());

        let refused = if *endpoint == self.replica {
            self.faults.replica_unreachable
        } else if *endpoint == self.primary {
            self.faults.primary_unreachable
        } else {
            true
        };
        if refused {
            return Err(StoreError::Connect {
                endpoint: endpoint.clone(),
                reason: "connection refused".to_string(),
            });
        }

        Ok(Box::new(Node {
            is_replica: *endpoint == self.replica,
            cluster: self.clone(),
        }))
    }
}

struct Node {
    is_replica: bool,
    cluster: SimulatedCluster,
}

#[async_trait]
impl StoreClient for Node {
    async fn primary_endpoint(&mut self) -> Result<Endpoint, StoreError> {
        if !self.is_replica || self.cluster.faults.no_primary_metadata {
            return Err(StoreError::MissingField("master_host".to_string()));
        }
        Ok(self.cluster.primary.clone())
    }

    async fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.write(key, None)
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(key, Some(value.to_string()))
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        if self.is_replica && self.cluster.faults.replica_hangs {
            std::future::pending::<()>().await;
        }

        let mut state = self.cluster.state.lock();
        if !self.is_replica {
            return Ok(state.primary.get(key).cloned());
        }

        if let Some(limit) = self.cluster.faults.replica_drops_after {
            if state.replica_reads >= limit {
                return Err(StoreError::Communication(
                    "connection reset by peer".to_string(),
                ));
            }
        }
        state.replica_reads += 1;
        state.apply_due(Instant::now());
        Ok(state.replica.get(key).cloned())
    }
}

impl Node {
    fn write(&self, key: &str, value: Option<String>) -> Result<(), StoreError> {
        if self.is_replica || self.cluster.faults.primary_read_only {
            return Err(StoreError::Server(
                "READONLY You can't write against a read only replica.".to_string(),
            ));
        }

        let mut state = self.cluster.state.lock();
        state.primary_ops.push(match value {
            Some(_) => format!("SET {key}"),
            None => format!("DEL {key}"),
        });
        match &value {
            Some(v) => state.primary.insert(key.to_string(), v.clone()),
            None => state.primary.remove(key),
        };
        self.cluster.replicate(&mut state, key, value);
        Ok(())
    }
}

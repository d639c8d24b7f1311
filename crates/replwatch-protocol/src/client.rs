//! Async client for a single store instance

use std::future::Future;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisResult};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::info::ReplicationInfo;

/// Socket budgets for a client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound on establishing the connection
    pub connect_timeout: Duration,
    /// Upper bound on a single command round trip
    pub io_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(5),
        }
    }
}

/// One connection to one store instance
pub struct RedisClient {
    conn: MultiplexedConnection,
    peer: String,
    options: ClientOptions,
}

impl RedisClient {
    /// Open a connection to `host:port`
    pub async fn connect(host: &str, port: u16, options: ClientOptions) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let client = Client::open(ConnectionInfo {
            addr: ConnectionAddr::Tcp(host.to_string(), port),
            redis: RedisConnectionInfo::default(),
        })
        .map_err(|source| ProtocolError::Connect {
            addr: addr.clone(),
            source,
        })?;

        let conn = match timeout(options.connect_timeout, client.get_multiplexed_async_connection())
            .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(source)) => return Err(ProtocolError::Connect { addr, source }),
            Err(_) => {
                return Err(ProtocolError::Timeout {
                    operation: "connect",
                    after: options.connect_timeout,
                });
            }
        };

        debug!(peer = %addr, "connected");
        Ok(Self {
            conn,
            peer: addr,
            options,
        })
    }

    /// Address this client is connected to
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Fetch one INFO section
    pub async fn info(&mut self, section: &str) -> Result<String> {
        let mut cmd = redis::cmd("INFO");
        cmd.arg(section);
        bounded(
            self.options.io_timeout,
            "INFO",
            cmd.query_async(&mut self.conn),
        )
        .await
    }

    /// Replication metadata reported by this instance
    pub async fn replication_info(&mut self) -> Result<ReplicationInfo> {
        let text = self.info("replication").await?;
        ReplicationInfo::from_info(&text)
    }

    /// Read a string key; `None` when the key does not exist
    pub async fn get(&mut self, key: &str) -> Result<Option<String>> {
        bounded(self.options.io_timeout, "GET", self.conn.get(key)).await
    }

    pub async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        bounded(self.options.io_timeout, "SET", self.conn.set(key, value)).await
    }

    /// Delete a key, returning how many keys were removed (0 when absent)
    pub async fn del(&mut self, key: &str) -> Result<u64> {
        bounded(self.options.io_timeout, "DEL", self.conn.del(key)).await
    }
}

async fn bounded<T>(
    after: Duration,
    operation: &'static str,
    request: impl Future<Output = RedisResult<T>>,
) -> Result<T> {
    match timeout(after, request).await {
        Ok(reply) => Ok(reply?),
        Err(_) => Err(ProtocolError::Timeout { operation, after }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
        assert_eq!(options.io_timeout, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let err = bounded::<()>(
            Duration::from_millis(300),
            "GET",
            std::future::pending::<RedisResult<()>>(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Timeout {
                operation: "GET",
                ..
            }
        ));
    }
}

//! Redis backend for the store seam

use async_trait::async_trait;
use replwatch_protocol::{ClientOptions, ProtocolError, RedisClient};
use tracing::warn;

use super::{ConnectOptions, Connector, Endpoint, StoreClient, StoreError};

impl From<ProtocolError> for StoreError {
    fn from(err: ProtocolError) -> Self {
        if err.is_communication() {
            return Self::Communication(err.to_string());
        }
        if let Some(reply) = err.server_reply() {
            return Self::Server(reply);
        }
        match err {
            ProtocolError::MissingField(field) => Self::MissingField(field.to_string()),
            other => Self::InvalidReply(other.to_string()),
        }
    }
}

/// Opens connections through the `redis` client library
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector {
    options: ClientOptions,
}

impl RedisConnector {
    pub fn new(options: ConnectOptions) -> Self {
        Self {
            options: ClientOptions {
                connect_timeout: options.connect_timeout,
                io_timeout: options.io_timeout,
            },
        }
    }
}

#[async_trait]
impl Connector for RedisConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> std::result::Result<Box<dyn StoreClient>, StoreError> {
        let client = RedisClient::connect(&endpoint.host, endpoint.port, self.options)
            .await
            .map_err(|err| StoreError::Connect {
                endpoint: endpoint.clone(),
                reason: match err {
                    ProtocolError::Connect { source, .. } => source.to_string(),
                    other => other.to_string(),
                },
            })?;
        Ok(Box::new(client))
    }
}

#[async_trait]
impl StoreClient for RedisClient {
    async fn primary_endpoint(&mut self) -> std::result::Result<Endpoint, StoreError> {
        let info = self.replication_info().await?;
        if !info.link_up() {
            warn!(
                replica = %self.peer(),
                role = info.role.as_deref().unwrap_or("unknown"),
                link = info.master_link_status.as_deref().unwrap_or("unknown"),
                "replica reports its link to the primary is not up"
            );
        }
        Ok(Endpoint::new(info.master_host, info.master_port))
    }

    async fn delete(&mut self, key: &str) -> std::result::Result<(), StoreError> {
        self.del(key).await?;
        Ok(())
    }

    async fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StoreError> {
        RedisClient::set(self, key, value).await?;
        Ok(())
    }

    async fn get(&mut self, key: &str) -> std::result::Result<Option<String>, StoreError> {
        Ok(RedisClient::get(self, key).await?)
    }
}

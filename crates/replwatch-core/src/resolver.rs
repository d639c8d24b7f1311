//! Primary discovery from a replica

use tracing::info;

use crate::error::{CheckError, Result};
use crate::store::{Connector, Endpoint, StoreClient};

/// The two open connections a check works with
pub struct Connections {
    /// Read side: the replica being measured
    pub replica: Box<dyn StoreClient>,
    /// Write side: the primary the replica reported
    pub primary: Box<dyn StoreClient>,
    pub primary_endpoint: Endpoint,
}

/// Connect to the replica, ask it where its primary is, connect there too.
///
/// The primary's address is a single snapshot; topology changes during the
/// check are not followed.
pub async fn resolve(connector: &dyn Connector, replica: &Endpoint) -> Result<Connections> {
    let mut replica_conn = connector
        .connect(replica)
        .await
        .map_err(CheckError::Resolution)?;

    let primary_endpoint = replica_conn
        .primary_endpoint()
        .await
        .map_err(CheckError::Resolution)?;
    info!(%replica, primary = %primary_endpoint, "resolved primary from replica metadata");

    let primary = connector
        .connect(&primary_endpoint)
        .await
        .map_err(CheckError::Resolution)?;

    Ok(Connections {
        replica: replica_conn,
        primary,
        primary_endpoint,
    })
}

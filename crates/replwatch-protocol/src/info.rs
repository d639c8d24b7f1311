//! INFO payload parsing

use std::collections::HashMap;

use crate::error::{ProtocolError, Result};

/// Split an INFO payload into `field -> value`.
///
/// Section headers (`# Replication`) and blank lines are skipped; lines
/// without a `:` separator are ignored.
pub fn parse_info(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(field, value)| (field.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Where a replica replicates from, as reported by the replica itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationInfo {
    /// `master` or `slave`, when reported
    pub role: Option<String>,
    pub master_host: String,
    pub master_port: u16,
    /// `up` while the replication link is established
    pub master_link_status: Option<String>,
}

impl ReplicationInfo {
    /// Extract the primary's address from an INFO payload
    pub fn from_info(text: &str) -> Result<Self> {
        let mut fields = parse_info(text);

        let master_host = fields
            .remove("master_host")
            .filter(|host| !host.is_empty())
            .ok_or(ProtocolError::MissingField("master_host"))?;
        let raw_port = fields
            .remove("master_port")
            .ok_or(ProtocolError::MissingField("master_port"))?;
        let master_port = raw_port.parse::<u16>().map_err(|_| {
            ProtocolError::InvalidInfo(format!("master_port {raw_port:?} is not a port"))
        })?;

        Ok(Self {
            role: fields.remove("role"),
            master_host,
            master_port,
            master_link_status: fields.remove("master_link_status"),
        })
    }

    /// True when the replica reports a live link to its primary
    pub fn link_up(&self) -> bool {
        self.master_link_status.as_deref() == Some("up")
    }
}

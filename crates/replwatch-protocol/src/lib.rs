//! replwatch protocol - client side of the store
//!
//! Provides:
//! - A timeout-bounded async client over the `redis` crate (`client`)
//! - INFO payload parsing for replication metadata (`info`)

#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod info;

#[cfg(feature = "testing")]
pub mod testing;

pub use client::{ClientOptions, RedisClient};
pub use error::{ProtocolError, Result};
pub use info::ReplicationInfo;
pub use redis;

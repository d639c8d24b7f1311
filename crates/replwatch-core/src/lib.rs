//! replwatch core - replication lag measurement
//!
//! A check runs one pipeline per invocation:
//!
//! ```text
//! resolver ──► probe writer ──► probe reader ──► lag evaluator ──► Verdict
//! (replica +    (DEL + SET on    (poll GET on      (ceil to 1e-4 s,
//!  primary)      the primary)     the replica)      warn / crit)
//! ```
//!
//! Every stage returns its result to the caller; nothing is kept in
//! process-wide state.

#![warn(clippy::all)]

pub mod check;
pub mod error;
pub mod lag;
pub mod probe;
pub mod resolver;
pub mod store;
pub mod verdict;

pub use check::{CheckRequest, Measurement, Report, measure, run_check};
pub use error::{CheckError, Result};
pub use lag::{GRACE_PERIOD, Lag, MeasurementWindow, Thresholds, classify};
pub use probe::{DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_KEY, PollOutcome, ProbeRecord};
pub use resolver::{Connections, resolve};
pub use store::{
    ConnectOptions, Connector, Endpoint, MissingBackend, StoreClient, StoreError,
    default_connector,
};
pub use verdict::Verdict;

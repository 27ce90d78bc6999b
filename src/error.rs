#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use std::collections::TryReserveError;

use thiserror::Error;

use crate::domain::LoadKind;

/// Failures a load generator can hit while serving a request.
///
/// None of these are fatal to the worker: the runner renders each one as the
/// plain-text response body.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A throttling or hold sleep was cut short by shutdown.
    #[error("load generation interrupted by shutdown")]
    Interrupted,

    #[error(
        "Memory allocation failed after {allocated_mb} MB of {requested_mb} MB requested: {source}"
    )]
    ResourceExhausted {
        allocated_mb: u64,
        requested_mb: u64,
        #[source]
        source: TryReserveError,
    },

    #[error("Application is shutting down, {0} load generation skipped")]
    ShuttingDown(LoadKind),
}

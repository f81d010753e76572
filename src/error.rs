// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
/// Represents errors that can occur while configuring instruments.
///
/// Recording itself never fails; only building an
/// [`InstrumentsConfig`](crate::InstrumentsConfig) can.
pub enum Error {
    /// An instrument name or prefix is not usable as a metric name
    InvalidName {
        /// The rejected name
        name: String,
        /// Why the name was rejected
        details: String,
    },
}

/// Implementation of the Display trait for Error enum.
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidName { name, details } => {
                write!(f, "Invalid instrument name '{}': {}", name, details)
            }
        }
    }
}

impl std::error::Error for Error {}

/// A Result type specialized for actor-instruments configuration.
///
/// # Examples
///
/// ```rust
/// use actor_instruments::{InstrumentsConfig, Result};
///
/// fn config() -> Result<InstrumentsConfig> {
///     InstrumentsConfig::new().with_prefix("orders")
/// }
/// # assert!(config().is_ok());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

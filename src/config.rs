// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

use metrics::Recorder;

use crate::{Error, GuardPolicy, MetricsProvider, Result};

/// Prefix applied to every instrument name unless configured otherwise.
pub const DEFAULT_PREFIX: &str = "actor";

/// Configuration of an [`InstrumentRegistry`](crate::InstrumentRegistry).
///
/// # Example
///
/// ```rust
/// use actor_instruments::{GuardPolicy, InstrumentsConfig, ValidityGuard};
///
/// let config = InstrumentsConfig::new()
///     .with_prefix("orders")
///     .unwrap()
///     .with_guard_policy(GuardPolicy::uniform(ValidityGuard::Suppress))
///     .with_remote_node_tag(false);
///
/// assert_eq!(config.prefix(), "orders");
/// assert!(!config.record_remote_node());
/// ```
#[derive(Debug, Clone)]
pub struct InstrumentsConfig {
    prefix: String,
    guard: GuardPolicy,
    record_remote_node: bool,
    provider: MetricsProvider,
}

impl Default for InstrumentsConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            guard: GuardPolicy::default(),
            record_remote_node: true,
            provider: MetricsProvider::Global,
        }
    }
}

impl InstrumentsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the instrument name prefix.
    ///
    /// The prefix must be non-empty and may only contain ASCII letters,
    /// digits, `_`, `.` and `-`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_name(&prefix)?;
        self.prefix = prefix;
        Ok(self)
    }

    pub fn with_guard_policy(mut self, guard: GuardPolicy) -> Self {
        self.guard = guard;
        self
    }

    /// Whether size samples carry the `RemoteNode` tag when the node is known.
    ///
    /// Each distinct node string gets its own size series, and the facade
    /// caches them for its whole lifetime. Disabling the tag bounds both series
    /// cardinality and that cache to a fixed size, independent of how many
    /// nodes are ever seen. Ping counters are always tagged with their node.
    pub fn with_remote_node_tag(mut self, enabled: bool) -> Self {
        self.record_remote_node = enabled;
        self
    }

    pub fn with_provider(mut self, provider: MetricsProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Shorthand for [`MetricsProvider::from_recorder`].
    pub fn with_recorder<R>(self, recorder: R) -> Self
    where
        R: Recorder + Send + Sync + 'static,
    {
        self.with_provider(MetricsProvider::from_recorder(recorder))
    }

    /// Turns every instrument into a no-op.
    pub fn disabled(self) -> Self {
        self.with_provider(MetricsProvider::Disabled)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn guard_policy(&self) -> GuardPolicy {
        self.guard
    }

    pub fn record_remote_node(&self) -> bool {
        self.record_remote_node
    }

    pub fn provider(&self) -> &MetricsProvider {
        &self.provider
    }

    /// Joins the prefix and a base instrument name.
    pub(crate) fn full_name(&self, name: &str) -> String {
        format!("{}-{}", self.prefix, name)
    }
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName {
            name: name.to_string(),
            details: "name must not be empty".to_string(),
        });
    }

    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(Error::InvalidName {
            name: name.to_string(),
            details: format!("unsupported character {c:?}"),
        });
    }

    Ok(())
}

// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

//! Validity guards for direction-tagged events.
//!
//! Failed, dropped, rejected and rerouted messages are counted by their
//! [`Direction`](crate::Direction). A message that is missing, or that has no
//! direction, cannot be classified. What happens then is a per-event-kind
//! [`ValidityGuard`] choice collected in a [`GuardPolicy`]:
//!
//! | Guard | Unclassifiable event |
//! |-------|----------------------|
//! | [`ValidityGuard::Suppress`] | Nothing is recorded |
//! | [`ValidityGuard::Trust`] | Debug builds panic; release builds record `Direction=None`, or drop the event when the message itself is missing |
//!
//! The default policy suppresses failed, dropped and rejected events and
//! trusts reroutes.
//!
//! # Observability
//!
//! Suppressed events are never counted and never surface as errors. They emit
//! a `trace` level event with structured fields via `tracing`:
//!
//! ```text
//! TRACE actor_instruments::guard: Unclassifiable event suppressed
//!   instrument="actor-messaging-sent-failed"
//!   suppressed.reason="missing direction"
//! ```
//!
//! # Testing Support
//!
//! When the `test-utils` feature is enabled (or in unit tests), a counter tracks
//! the number of suppressed events. Use `suppressed_event_count()` and
//! `reset_suppressed_event_count()` to inspect and reset it.

#[cfg(any(test, feature = "test-utils"))]
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(any(test, feature = "test-utils"))]
static SUPPRESSED_EVENT_COUNT: AtomicU64 = AtomicU64::new(0);

/// How a direction-tagged event kind treats messages it cannot classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityGuard {
    /// Silently drop unclassifiable events.
    Suppress,
    /// The caller guarantees a valid message.
    ///
    /// Violations are a caller bug: they trip a debug assertion and are not
    /// defended against in release builds.
    Trust,
}

/// Guard choice for each direction-tagged event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardPolicy {
    pub failed: ValidityGuard,
    pub dropped: ValidityGuard,
    pub rejected: ValidityGuard,
    pub rerouted: ValidityGuard,
}

impl GuardPolicy {
    /// Every event kind uses `guard`.
    pub const fn uniform(guard: ValidityGuard) -> Self {
        Self {
            failed: guard,
            dropped: guard,
            rejected: guard,
            rerouted: guard,
        }
    }
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            failed: ValidityGuard::Suppress,
            dropped: ValidityGuard::Suppress,
            rejected: ValidityGuard::Suppress,
            rerouted: ValidityGuard::Trust,
        }
    }
}

/// Reason why an event was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SuppressReason {
    /// No message was supplied.
    MissingMessage,
    /// The message carries no direction.
    MissingDirection,
}

impl std::fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuppressReason::MissingMessage => write!(f, "missing message"),
            SuppressReason::MissingDirection => write!(f, "missing direction"),
        }
    }
}

/// Records that an event on `instrument` was suppressed.
#[cold]
pub(crate) fn suppressed(instrument: &str, reason: SuppressReason) {
    #[cfg(any(test, feature = "test-utils"))]
    SUPPRESSED_EVENT_COUNT.fetch_add(1, Ordering::Relaxed);

    tracing::trace!(
        instrument = instrument,
        suppressed.reason = %reason,
        "Unclassifiable event suppressed"
    );
}

/// Returns the total number of suppressed events.
///
/// This function is only available when the `test-utils` feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub fn suppressed_event_count() -> u64 {
    SUPPRESSED_EVENT_COUNT.load(Ordering::Relaxed)
}

/// Resets the suppressed event counter.
///
/// This function is only available when the `test-utils` feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub fn reset_suppressed_event_count() {
    SUPPRESSED_EVENT_COUNT.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_trusts_reroutes_only() {
        let policy = GuardPolicy::default();
        assert_eq!(policy.failed, ValidityGuard::Suppress);
        assert_eq!(policy.dropped, ValidityGuard::Suppress);
        assert_eq!(policy.rejected, ValidityGuard::Suppress);
        assert_eq!(policy.rerouted, ValidityGuard::Trust);
    }

    #[test]
    fn test_uniform_policy() {
        let policy = GuardPolicy::uniform(ValidityGuard::Suppress);
        assert_eq!(policy.rerouted, ValidityGuard::Suppress);
    }

    #[test]
    fn test_suppressed_increments_count() {
        let before = suppressed_event_count();
        suppressed("test-instrument", SuppressReason::MissingDirection);
        assert!(suppressed_event_count() > before);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(SuppressReason::MissingMessage.to_string(), "missing message");
        assert_eq!(SuppressReason::MissingDirection.to_string(), "missing direction");
    }
}

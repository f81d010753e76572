// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

//! # actor-instruments: messaging and scheduler metrics for actor runtimes
//!
//! `actor-instruments` is the always-on instrumentation facade of an actor
//! runtime's messaging layer. It counts message traffic (sends, receives,
//! failures, drops, rejections, reroutes, expirations), liveness probe
//! exchanges between nodes, and scheduler turns that ran too long, and hands
//! every event to a [`metrics`] recorder.
//!
//! ## Features
//!
//! - **Hot-path friendly**: recording never blocks and never takes a lock
//!   shared across unrelated message flows. Tag combinations are resolved
//!   once and cached in dense tables or a lock-free map.
//! - **Never fails the caller**: recording methods return `()`. Events that
//!   cannot be classified are suppressed, and a missing recorder makes every
//!   instrument a no-op.
//! - **Fixed tag schemas**: each instrument records with one [`TagSet`]
//!   type, so the keys a series can carry are checked at compile time.
//! - **No hidden globals**: the [`InstrumentRegistry`] is constructed
//!   explicitly and shared with the components that record.
//!
//! ## Core Concepts
//!
//! - **[`InstrumentRegistry`]**: owns the named counters and histograms, each
//!   created once per name.
//! - **[`MessagingInstruments`]**: one method per messaging event kind.
//! - **[`SchedulerInstruments`]**: counts long-running scheduler turns.
//! - **[`ObservedMessage`]**: how the facade reads a message's [`Direction`].
//! - **[`GuardPolicy`]**: what each direction-tagged event kind does with
//!   messages it cannot classify.
//!
//! ## Getting Started
//!
//! ```rust
//! use actor_instruments::{
//!     ConnectionDirection, Direction, Instruments, InstrumentRegistry, InstrumentsConfig,
//!     ObservedMessage, Phase,
//! };
//!
//! struct Envelope {
//!     direction: Option<Direction>,
//! }
//!
//! impl ObservedMessage for Envelope {
//!     fn direction(&self) -> Option<Direction> {
//!         self.direction
//!     }
//! }
//!
//! // Uses whatever recorder was installed with `metrics::set_global_recorder`.
//! let registry = InstrumentRegistry::new(InstrumentsConfig::new());
//! let instruments = Instruments::new(&registry);
//!
//! let msg = Envelope { direction: Some(Direction::Request) };
//! instruments
//!     .messaging
//!     .on_message_send(&msg, 512, 32, ConnectionDirection::Outbound, None);
//! instruments.messaging.on_message_expired(Phase::Dispatch);
//! instruments.scheduler.on_long_running_turn(Phase::Invoke);
//! ```

extern crate self as actor_instruments;

mod config;
mod error;
mod guard;
mod instrument;
pub mod messaging;
pub mod names;
mod provider;
mod registry;
mod scheduler;
pub mod tags;

pub use actor_instruments_derive::{MetricLabel, TagSet};
pub use metrics::{Label, SharedString, Unit};

pub use config::{InstrumentsConfig, DEFAULT_PREFIX};
pub use error::{Error, Result};
pub use guard::{GuardPolicy, SuppressReason, ValidityGuard};
#[cfg(any(test, feature = "test-utils"))]
pub use guard::{reset_suppressed_event_count, suppressed_event_count};
pub use instrument::{CounterHandle, HistogramHandle};
pub use messaging::{MessagingInstruments, ObservedMessage};
pub use provider::MetricsProvider;
pub use registry::InstrumentRegistry;
pub use scheduler::SchedulerInstruments;
pub use tags::{
    ConnectionDirection, Direction, MetricLabel, Phase, TagSet, TagValue,
};

/// Every recording facade built from one registry.
pub struct Instruments {
    pub messaging: MessagingInstruments,
    pub scheduler: SchedulerInstruments,
}

impl Instruments {
    pub fn new(registry: &InstrumentRegistry) -> Self {
        Self {
            messaging: MessagingInstruments::new(registry),
            scheduler: SchedulerInstruments::new(registry),
        }
    }
}

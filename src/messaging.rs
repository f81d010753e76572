// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

//! Messaging instruments.
//!
//! [`MessagingInstruments`] is the recording facade called inline from the
//! send, receive and dispatch paths of the runtime. Every method is
//! synchronous, never blocks, never fails, and forwards exactly one increment
//! or sample (send and receive additionally bump their header byte counter).
//!
//! # Instruments
//!
//! | Base name | Kind | Tags |
//! |-----------|------|------|
//! | `messaging-sent-header-size` | counter (bytes) | none |
//! | `messaging-received-header-size` | counter (bytes) | none |
//! | `messaging-sent-local` | counter | none |
//! | `messaging-sent-failed` | counter | `Direction` |
//! | `messaging-sent-dropped` | counter | `Direction` |
//! | `messaging-rejected` | counter | `Direction` |
//! | `messaging-rerouted` | counter | `Direction` |
//! | `messaging-expired` | counter | `Phase` |
//! | `gateway-connected-clients` | counter | none |
//! | `messaging-pings-*` | counter | `Destination` |
//! | `messaging-sent-messages-size` | histogram (bytes) | `ConnectionDirection`, `MessageDirection`, optional `RemoteNode` |
//! | `messaging-received-messages-size` | histogram (bytes) | `ConnectionDirection`, `MessageDirection`, optional `RemoteNode` |
//!
//! # Example
//!
//! ```rust
//! use actor_instruments::{
//!     ConnectionDirection, Direction, InstrumentRegistry, MessagingInstruments, ObservedMessage,
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
//! let registry = InstrumentRegistry::disabled();
//! let messaging = MessagingInstruments::new(&registry);
//!
//! let msg = Envelope { direction: Some(Direction::Request) };
//! messaging.on_message_send(&msg, 512, 32, ConnectionDirection::Outbound, None);
//! messaging.on_ping_send(&"10.0.0.1:11111");
//! messaging.on_failed_sent_message(None::<&Envelope>);
//! ```

use std::fmt::Display;

use metrics::Unit;

use crate::guard::{self, SuppressReason};
use crate::instrument::{LabeledCounter, NodeCounter, PlainCounter, SizeHistogram};
use crate::tags::{ConnectionDirection, Direction, DirectionTags, Phase, PhaseTags};
use crate::{names, GuardPolicy, InstrumentRegistry, ValidityGuard};

/// A message as seen by the instruments.
///
/// Only the logical direction is needed. Messages that do not know their
/// direction return `None`.
pub trait ObservedMessage {
    fn direction(&self) -> Option<Direction>;
}

impl<M: ObservedMessage + ?Sized> ObservedMessage for &M {
    fn direction(&self) -> Option<Direction> {
        (**self).direction()
    }
}

type DirectionCounter = LabeledCounter<Option<Direction>, DirectionTags>;

/// Recording facade for message traffic and liveness probes.
///
/// Build one per [`InstrumentRegistry`] and share it; all methods take
/// `&self` and are safe to call from any number of threads.
pub struct MessagingInstruments {
    header_bytes_sent: PlainCounter,
    header_bytes_received: PlainCounter,
    local_messages_sent: PlainCounter,
    connected_clients: PlainCounter,
    failed_sent: DirectionCounter,
    dropped_sent: DirectionCounter,
    rejected: DirectionCounter,
    rerouted: DirectionCounter,
    expired: LabeledCounter<Phase, PhaseTags>,
    pings_sent: NodeCounter,
    pings_received: NodeCounter,
    ping_replies_received: NodeCounter,
    ping_replies_missed: NodeCounter,
    sent_size: SizeHistogram,
    received_size: SizeHistogram,
    guard: GuardPolicy,
    record_remote_node: bool,
}

impl MessagingInstruments {
    pub fn new(registry: &InstrumentRegistry) -> Self {
        let counter = |name, unit, description| registry.create_counter(name, unit, description);
        let histogram =
            |name, description| registry.create_histogram(name, Unit::Bytes, description);

        Self {
            header_bytes_sent: PlainCounter::new(counter(
                names::MESSAGING_SENT_BYTES_HEADER,
                Unit::Bytes,
                "Header bytes of sent messages",
            )),
            header_bytes_received: PlainCounter::new(counter(
                names::MESSAGING_RECEIVED_BYTES_HEADER,
                Unit::Bytes,
                "Header bytes of received messages",
            )),
            local_messages_sent: PlainCounter::new(counter(
                names::MESSAGING_SENT_LOCAL_MESSAGES,
                Unit::Count,
                "Messages delivered without leaving the node",
            )),
            connected_clients: PlainCounter::new(counter(
                names::GATEWAY_CONNECTED_CLIENTS,
                Unit::Count,
                "Client connections accepted by the gateway",
            )),
            failed_sent: LabeledCounter::new(counter(
                names::MESSAGING_SENT_FAILED,
                Unit::Count,
                "Messages that failed to send",
            )),
            dropped_sent: LabeledCounter::new(counter(
                names::MESSAGING_SENT_DROPPED,
                Unit::Count,
                "Messages dropped before sending",
            )),
            rejected: LabeledCounter::new(counter(
                names::MESSAGING_REJECTED,
                Unit::Count,
                "Messages rejected by the receiver",
            )),
            rerouted: LabeledCounter::new(counter(
                names::MESSAGING_REROUTED,
                Unit::Count,
                "Messages forwarded to another node",
            )),
            expired: LabeledCounter::new(counter(
                names::MESSAGING_EXPIRED,
                Unit::Count,
                "Messages that expired before completion",
            )),
            pings_sent: NodeCounter::new(counter(
                names::MESSAGING_PINGS_SENT,
                Unit::Count,
                "Liveness probes sent",
            )),
            pings_received: NodeCounter::new(counter(
                names::MESSAGING_PINGS_RECEIVED,
                Unit::Count,
                "Liveness probes received",
            )),
            ping_replies_received: NodeCounter::new(counter(
                names::MESSAGING_PINGS_REPLY_RECEIVED,
                Unit::Count,
                "Liveness probe replies received",
            )),
            ping_replies_missed: NodeCounter::new(counter(
                names::MESSAGING_PINGS_REPLY_MISSED,
                Unit::Count,
                "Liveness probe replies missed",
            )),
            sent_size: SizeHistogram::new(histogram(
                names::MESSAGING_SENT_MESSAGES_SIZE,
                "Total size of sent messages",
            )),
            received_size: SizeHistogram::new(histogram(
                names::MESSAGING_RECEIVED_MESSAGES_SIZE,
                "Total size of received messages",
            )),
            guard: registry.config().guard_policy(),
            record_remote_node: registry.config().record_remote_node(),
        }
    }

    /// The guard policy this facade was built with.
    pub fn guard_policy(&self) -> GuardPolicy {
        self.guard
    }

    #[inline]
    pub fn on_message_expired(&self, phase: Phase) {
        self.expired.increment(phase);
    }

    #[inline]
    pub fn on_ping_send(&self, destination: &impl Display) {
        self.pings_sent.increment(&destination.to_string());
    }

    #[inline]
    pub fn on_ping_receive(&self, destination: &impl Display) {
        self.pings_received.increment(&destination.to_string());
    }

    #[inline]
    pub fn on_ping_reply_received(&self, replier: &impl Display) {
        self.ping_replies_received.increment(&replier.to_string());
    }

    #[inline]
    pub fn on_ping_reply_missed(&self, replier: &impl Display) {
        self.ping_replies_missed.increment(&replier.to_string());
    }

    /// Counts a failed send. Guarded by [`GuardPolicy::failed`].
    #[inline]
    pub fn on_failed_sent_message<M>(&self, msg: Option<&M>)
    where
        M: ObservedMessage + ?Sized,
    {
        record_directed(&self.failed_sent, self.guard.failed, msg);
    }

    /// Counts a dropped send. Guarded by [`GuardPolicy::dropped`].
    #[inline]
    pub fn on_dropped_sent_message<M>(&self, msg: Option<&M>)
    where
        M: ObservedMessage + ?Sized,
    {
        record_directed(&self.dropped_sent, self.guard.dropped, msg);
    }

    /// Counts a rejection. Guarded by [`GuardPolicy::rejected`].
    #[inline]
    pub fn on_rejected_message<M>(&self, msg: Option<&M>)
    where
        M: ObservedMessage + ?Sized,
    {
        record_directed(&self.rejected, self.guard.rejected, msg);
    }

    /// Counts a reroute. Guarded by [`GuardPolicy::rerouted`], which trusts
    /// the caller by default.
    #[inline]
    pub fn on_message_reroute<M>(&self, msg: Option<&M>)
    where
        M: ObservedMessage + ?Sized,
    {
        record_directed(&self.rerouted, self.guard.rerouted, msg);
    }

    /// Records a received message: one size sample and its header bytes.
    #[inline]
    pub fn on_message_receive<M>(
        &self,
        msg: &M,
        total_bytes: usize,
        header_bytes: usize,
        connection_direction: ConnectionDirection,
        remote_node: Option<&dyn Display>,
    ) where
        M: ObservedMessage + ?Sized,
    {
        self.record_size(
            &self.received_size,
            msg.direction(),
            total_bytes,
            connection_direction,
            remote_node,
        );
        self.header_bytes_received.increment(header_bytes as u64);
    }

    /// Records a sent message: one size sample and its header bytes.
    #[inline]
    pub fn on_message_send<M>(
        &self,
        msg: &M,
        total_bytes: usize,
        header_bytes: usize,
        connection_direction: ConnectionDirection,
        remote_node: Option<&dyn Display>,
    ) where
        M: ObservedMessage + ?Sized,
    {
        self.record_size(
            &self.sent_size,
            msg.direction(),
            total_bytes,
            connection_direction,
            remote_node,
        );
        self.header_bytes_sent.increment(header_bytes as u64);
    }

    #[inline]
    pub fn on_local_message_sent(&self) {
        self.local_messages_sent.increment(1);
    }

    /// Counts an accepted gateway client connection.
    ///
    /// Occurrences only; this is not a gauge of currently connected clients.
    #[inline]
    pub fn on_client_connected(&self) {
        self.connected_clients.increment(1);
    }

    fn record_size(
        &self,
        histogram: &SizeHistogram,
        direction: Option<Direction>,
        total_bytes: usize,
        connection_direction: ConnectionDirection,
        remote_node: Option<&dyn Display>,
    ) {
        let node = match remote_node {
            Some(node) if self.record_remote_node => Some(node.to_string()),
            _ => None,
        };
        histogram.record(
            connection_direction,
            direction,
            node.as_deref(),
            total_bytes as u64,
        );
    }
}

#[inline]
fn record_directed<M>(counter: &DirectionCounter, policy: ValidityGuard, msg: Option<&M>)
where
    M: ObservedMessage + ?Sized,
{
    let direction = msg.and_then(|m| m.direction());

    match policy {
        ValidityGuard::Suppress => match (msg, direction) {
            (None, _) => guard::suppressed(counter.name(), SuppressReason::MissingMessage),
            (Some(_), None) => guard::suppressed(counter.name(), SuppressReason::MissingDirection),
            (Some(_), Some(direction)) => counter.increment(Some(direction)),
        },
        ValidityGuard::Trust => {
            debug_assert!(
                msg.is_some(),
                "{}: caller passed no message to a trusted instrument",
                counter.name()
            );
            debug_assert!(
                direction.is_some(),
                "{}: caller passed a message without direction to a trusted instrument",
                counter.name()
            );
            if msg.is_some() {
                counter.increment(direction);
            }
        }
    }
}

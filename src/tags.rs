// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

//! Closed tag schemas for every instrument.
//!
//! Each instrument records with exactly one [`TagSet`] type, so the set of
//! tag keys an instrument can ever receive is fixed at compile time. Enum tag
//! values implement [`MetricLabel`], which lets the facade address their
//! series through dense, pre-sized handle tables instead of hashing labels on
//! every event.
//!
//! | Tag set | Keys |
//! |---------|------|
//! | [`NoTags`] | none |
//! | [`DirectionTags`] | `Direction` |
//! | [`PhaseTags`] | `Phase` |
//! | [`DestinationTags`] | `Destination` |
//! | [`MessageSizeTags`] | `ConnectionDirection`, `MessageDirection`, optional `RemoteNode` |

use metrics::{Label, SharedString};

use actor_instruments_derive::{MetricLabel, TagSet};

/// A closed enumeration of tag values.
///
/// Usually derived with `#[derive(MetricLabel)]`.
pub trait MetricLabel: Sized {
    /// Number of distinct values.
    const COUNT: usize;

    /// Dense position of this value in `0..COUNT`.
    fn index(&self) -> usize;

    /// The tag value emitted for this label.
    fn as_str(&self) -> &'static str;
}

/// An absent label is its own tag value, `None`, so the tag key stays present.
impl<L: MetricLabel> MetricLabel for Option<L> {
    const COUNT: usize = L::COUNT + 1;

    #[inline]
    fn index(&self) -> usize {
        match self {
            None => 0,
            Some(label) => label.index() + 1,
        }
    }

    #[inline]
    fn as_str(&self) -> &'static str {
        match self {
            None => "None",
            Some(label) => label.as_str(),
        }
    }
}

/// A value that can be attached to a tag key.
pub trait TagValue {
    /// The value emitted to the metrics provider.
    fn tag_value(&self) -> SharedString;
}

impl<L: MetricLabel> TagValue for Option<L> {
    #[inline]
    fn tag_value(&self) -> SharedString {
        SharedString::from(self.as_str())
    }
}

impl TagValue for &str {
    fn tag_value(&self) -> SharedString {
        SharedString::from((*self).to_owned())
    }
}

impl TagValue for String {
    fn tag_value(&self) -> SharedString {
        SharedString::from(self.clone())
    }
}

/// The fixed tag schema of one instrument.
///
/// Usually derived with `#[derive(TagSet)]`.
pub trait TagSet {
    /// Every key this schema can emit, in emission order.
    const KEYS: &'static [&'static str];

    /// Builds the ordered labels for one recording.
    fn labels(&self) -> Vec<Label>;
}

/// Logical direction of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, MetricLabel)]
pub enum Direction {
    /// A request expecting a response.
    Request,
    /// A response to an earlier request.
    Response,
    /// A fire-and-forget message.
    OneWay,
}

/// Stage of a message's lifecycle, used to tag expirations and long turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, MetricLabel)]
pub enum Phase {
    Send,
    Receive,
    Dispatch,
    Invoke,
    Respond,
}

/// Direction of the physical connection a message travelled over.
///
/// Independent of the message's own [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, MetricLabel)]
pub enum ConnectionDirection {
    Inbound,
    Outbound,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for ConnectionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untagged instruments.
#[derive(Debug, Clone, Copy, Default, TagSet)]
pub struct NoTags;

#[derive(Debug, Clone, Copy, TagSet)]
pub struct DirectionTags {
    #[tag(key = "Direction")]
    pub direction: Option<Direction>,
}

impl From<Option<Direction>> for DirectionTags {
    fn from(direction: Option<Direction>) -> Self {
        Self { direction }
    }
}

#[derive(Debug, Clone, Copy, TagSet)]
pub struct PhaseTags {
    #[tag(key = "Phase")]
    pub phase: Phase,
}

impl From<Phase> for PhaseTags {
    fn from(phase: Phase) -> Self {
        Self { phase }
    }
}

/// Tags of the ping counters; `destination` is the node's string form.
#[derive(Debug, Clone, Copy, TagSet)]
pub struct DestinationTags<'a> {
    #[tag(key = "Destination")]
    pub destination: &'a str,
}

/// Tags of the message size histograms.
///
/// `RemoteNode` is only emitted when the remote node is known, which yields a
/// separate series from the untagged one.
#[derive(Debug, Clone, Copy, TagSet)]
pub struct MessageSizeTags<'a> {
    #[tag(key = "ConnectionDirection")]
    pub connection_direction: ConnectionDirection,
    #[tag(key = "MessageDirection")]
    pub message_direction: Option<Direction>,
    #[tag(key = "RemoteNode", optional)]
    pub remote_node: Option<&'a str>,
}

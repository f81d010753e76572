// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

//! Instrument handles and the hot-path series caches built on them.
//!
//! A [`CounterHandle`] or [`HistogramHandle`] names one instrument. Resolving
//! a tag combination into a provider handle (a "series") costs a key build and
//! a provider lookup, so the facade never does that per event. Instead:
//!
//! - [`LabeledCounter`] keeps one lazily registered series per enum label in a
//!   dense table indexed by [`MetricLabel::index`].
//! - [`NodeCounter`] caches one series per node in a lock-free map.
//! - [`SizeHistogram`] combines both for the message size histograms.
//!
//! After the first event for a combination, recording is an atomic load plus
//! the provider's own atomic update.

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use metrics::{Counter, Histogram, Key, KeyName, Unit};

use crate::tags::{ConnectionDirection, DestinationTags, Direction, MessageSizeTags, NoTags};
use crate::{MetricLabel, MetricsProvider, TagSet};

#[derive(Debug)]
struct InstrumentInner {
    name: KeyName,
    unit: Unit,
    provider: MetricsProvider,
}

impl InstrumentInner {
    fn key<T: TagSet>(&self, tags: &T) -> Key {
        Key::from_parts(self.name.clone(), tags.labels())
    }
}

/// A named monotonic counter.
///
/// Cloning is cheap and every clone feeds the same instrument.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    inner: Arc<InstrumentInner>,
}

impl CounterHandle {
    pub(crate) fn new(name: KeyName, unit: Unit, provider: MetricsProvider) -> Self {
        Self {
            inner: Arc::new(InstrumentInner {
                name,
                unit,
                provider,
            }),
        }
    }

    /// The full instrument name.
    pub fn name(&self) -> &str {
        self.inner.name.as_str()
    }

    pub fn unit(&self) -> Unit {
        self.inner.unit
    }

    /// Increments the series selected by `tags` by `amount`.
    ///
    /// Resolves the series on every call; prefer [`CounterHandle::series`]
    /// on hot paths.
    pub fn add<T: TagSet>(&self, amount: u64, tags: &T) {
        self.series(tags).increment(amount);
    }

    /// Resolves the provider handle for one tag combination.
    pub fn series<T: TagSet>(&self, tags: &T) -> Counter {
        self.inner.provider.register_counter(&self.inner.key(tags))
    }

    #[cfg(test)]
    pub(crate) fn same_instrument(&self, other: &CounterHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// A named histogram of integer samples.
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    inner: Arc<InstrumentInner>,
}

impl HistogramHandle {
    pub(crate) fn new(name: KeyName, unit: Unit, provider: MetricsProvider) -> Self {
        Self {
            inner: Arc::new(InstrumentInner {
                name,
                unit,
                provider,
            }),
        }
    }

    /// The full instrument name.
    pub fn name(&self) -> &str {
        self.inner.name.as_str()
    }

    pub fn unit(&self) -> Unit {
        self.inner.unit
    }

    /// Records one sample on the series selected by `tags`.
    pub fn record<T: TagSet>(&self, value: u64, tags: &T) {
        self.series(tags).record(value as f64);
    }

    /// Resolves the provider handle for one tag combination.
    pub fn series<T: TagSet>(&self, tags: &T) -> Histogram {
        self.inner.provider.register_histogram(&self.inner.key(tags))
    }

    #[cfg(test)]
    pub(crate) fn same_instrument(&self, other: &HistogramHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Fixed-size table of lazily registered series.
struct SeriesTable<H> {
    slots: Box<[OnceLock<H>]>,
}

impl<H> SeriesTable<H> {
    fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    #[inline]
    fn get_or_register(&self, index: usize, register: impl FnOnce() -> H) -> &H {
        self.slots[index].get_or_init(register)
    }
}

/// A counter whose only tag is one closed enum label.
///
/// `T` is the tag set built from the label when its series is first used.
pub(crate) struct LabeledCounter<L, T> {
    handle: CounterHandle,
    series: SeriesTable<Counter>,
    _marker: PhantomData<fn(L) -> T>,
}

impl<L, T> LabeledCounter<L, T>
where
    L: MetricLabel,
    T: TagSet + From<L>,
{
    pub(crate) fn new(handle: CounterHandle) -> Self {
        Self {
            handle,
            series: SeriesTable::new(L::COUNT),
            _marker: PhantomData,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.handle.name()
    }

    #[inline]
    pub(crate) fn increment(&self, label: L) {
        let index = label.index();
        self.series
            .get_or_register(index, || self.handle.series(&T::from(label)))
            .increment(1);
    }
}

/// An untagged counter whose single series is registered on first use.
pub(crate) struct PlainCounter {
    handle: CounterHandle,
    series: OnceLock<Counter>,
}

impl PlainCounter {
    pub(crate) fn new(handle: CounterHandle) -> Self {
        Self {
            handle,
            series: OnceLock::new(),
        }
    }

    #[inline]
    pub(crate) fn increment(&self, amount: u64) {
        self.series
            .get_or_init(|| self.handle.series(&NoTags))
            .increment(amount);
    }
}

/// A counter tagged with the string form of a remote node.
///
/// Holds one cached series per node ever seen; entries are never evicted.
pub(crate) struct NodeCounter {
    handle: CounterHandle,
    series: papaya::HashMap<String, Counter>,
}

impl NodeCounter {
    pub(crate) fn new(handle: CounterHandle) -> Self {
        Self {
            handle,
            series: papaya::HashMap::new(),
        }
    }

    #[inline]
    pub(crate) fn increment(&self, node: &str) {
        let series = self.series.pin();
        match series.get(node) {
            Some(counter) => counter.increment(1),
            None => series
                .get_or_insert_with(node.to_owned(), || {
                    self.handle.series(&DestinationTags { destination: node })
                })
                .increment(1),
        }
    }
}

const SIZE_SERIES: usize = ConnectionDirection::COUNT * <Option<Direction>>::COUNT;

/// The message size histogram of one traffic direction.
///
/// Samples without a remote node go to a dense table keyed by connection and
/// message direction; samples with a remote node get a per-node table. Node
/// tables are kept for every node ever seen.
pub(crate) struct SizeHistogram {
    handle: HistogramHandle,
    local: SeriesTable<Histogram>,
    per_node: papaya::HashMap<String, SeriesTable<Histogram>>,
}

impl SizeHistogram {
    pub(crate) fn new(handle: HistogramHandle) -> Self {
        Self {
            handle,
            local: SeriesTable::new(SIZE_SERIES),
            per_node: papaya::HashMap::new(),
        }
    }

    #[inline]
    fn index(connection: ConnectionDirection, direction: Option<Direction>) -> usize {
        connection.index() * <Option<Direction>>::COUNT + direction.index()
    }

    pub(crate) fn record(
        &self,
        connection: ConnectionDirection,
        direction: Option<Direction>,
        remote_node: Option<&str>,
        value: u64,
    ) {
        let index = Self::index(connection, direction);
        let register = || {
            self.handle.series(&MessageSizeTags {
                connection_direction: connection,
                message_direction: direction,
                remote_node,
            })
        };

        match remote_node {
            None => self.local.get_or_register(index, register).record(value as f64),
            Some(node) => {
                let tables = self.per_node.pin();
                let table = match tables.get(node) {
                    Some(table) => table,
                    None => tables
                        .get_or_insert_with(node.to_owned(), || SeriesTable::new(SIZE_SERIES)),
                };
                table.get_or_register(index, register).record(value as f64);
            }
        }
    }
}

// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers: a registry backed by a `DebuggingRecorder` and lookups
//! over its snapshots.

#![allow(dead_code)]

use actor_instruments::{
    Direction, InstrumentRegistry, InstrumentsConfig, Instruments, ObservedMessage,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use metrics_util::MetricKind;

/// A message with a fixed direction.
pub struct TestMessage(pub Option<Direction>);

impl ObservedMessage for TestMessage {
    fn direction(&self) -> Option<Direction> {
        self.0
    }
}

pub struct Harness {
    pub registry: InstrumentRegistry,
    pub instruments: Instruments,
    snapshotter: Snapshotter,
}

/// One recorded series.
#[derive(Debug, PartialEq)]
pub struct Series {
    pub name: String,
    pub kind: MetricKind,
    pub labels: Vec<(String, String)>,
    pub value: DebugValue,
}

impl Series {
    pub fn label_keys(&self) -> Vec<&str> {
        self.labels.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn counter(&self) -> Option<u64> {
        match self.value {
            DebugValue::Counter(v) => Some(v),
            _ => None,
        }
    }

    pub fn samples(&self) -> Vec<f64> {
        match &self.value {
            DebugValue::Histogram(samples) => samples.iter().map(|s| s.into_inner()).collect(),
            _ => Vec::new(),
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn harness() -> Harness {
    harness_with(InstrumentsConfig::new())
}

pub fn harness_with(config: InstrumentsConfig) -> Harness {
    init_tracing();

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let registry = InstrumentRegistry::new(config.with_recorder(recorder));
    let instruments = Instruments::new(&registry);

    Harness {
        registry,
        instruments,
        snapshotter,
    }
}

impl Harness {
    /// Every series registered so far.
    ///
    /// Histogram samples may be drained by a snapshot, so take one snapshot
    /// per assertion block.
    pub fn snapshot(&self) -> Vec<Series> {
        collect(&self.snapshotter)
    }
}

/// Every series `snapshotter` has seen so far.
pub fn collect(snapshotter: &Snapshotter) -> Vec<Series> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(key, _, _, value)| {
            let kind = key.kind();
            let key = key.key();
            Series {
                name: key.name().to_owned(),
                kind,
                labels: key
                    .labels()
                    .map(|l| (l.key().to_owned(), l.value().to_owned()))
                    .collect(),
                value,
            }
        })
        .collect()
}

/// Full name of a base instrument name under the default prefix.
pub fn full(name: &str) -> String {
    format!("{}-{}", actor_instruments::DEFAULT_PREFIX, name)
}

/// Series of instrument `name` (base name).
pub fn series_of<'a>(snapshot: &'a [Series], name: &str) -> Vec<&'a Series> {
    let name = full(name);
    snapshot.iter().filter(|s| s.name == name).collect()
}

/// The series of `name` whose labels are exactly `labels`, in order.
pub fn find<'a>(snapshot: &'a [Series], name: &str, labels: &[(&str, &str)]) -> Option<&'a Series> {
    series_of(snapshot, name).into_iter().find(|s| {
        s.labels.len() == labels.len()
            && s
                .labels
                .iter()
                .zip(labels)
                .all(|((k, v), (ek, ev))| k == ek && v == ev)
    })
}

pub fn counter(snapshot: &[Series], name: &str, labels: &[(&str, &str)]) -> Option<u64> {
    find(snapshot, name, labels).and_then(Series::counter)
}

/// Sum of every counter series of `name`.
pub fn counter_total(snapshot: &[Series], name: &str) -> u64 {
    series_of(snapshot, name)
        .into_iter()
        .filter_map(|s| s.counter())
        .sum()
}

// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use metrics::{Counter, Histogram, Key, KeyName, Level, Metadata, Recorder, SharedString, Unit};

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// The metrics backend instruments are registered against.
///
/// Exporting, aggregation and bucket layout belong to the backend; the
/// registry only asks it for counter and histogram handles. Every mode is
/// infallible: a missing backend yields no-op handles.
#[derive(Clone, Default)]
pub enum MetricsProvider {
    /// The recorder installed with `metrics::set_global_recorder`, or the
    /// local recorder in scope at registration time. No-op when neither exists.
    #[default]
    Global,
    /// An explicitly injected recorder.
    Recorder(Arc<dyn Recorder + Send + Sync>),
    /// Metrics switched off.
    Disabled,
}

impl MetricsProvider {
    /// Wraps a recorder so it can be injected into a registry.
    pub fn from_recorder<R>(recorder: R) -> Self
    where
        R: Recorder + Send + Sync + 'static,
    {
        MetricsProvider::Recorder(Arc::new(recorder))
    }

    /// Returns `false` only for [`MetricsProvider::Disabled`].
    pub fn is_enabled(&self) -> bool {
        !matches!(self, MetricsProvider::Disabled)
    }

    pub(crate) fn register_counter(&self, key: &Key) -> Counter {
        match self {
            MetricsProvider::Global => {
                metrics::with_recorder(|recorder| recorder.register_counter(key, &METADATA))
            }
            MetricsProvider::Recorder(recorder) => recorder.register_counter(key, &METADATA),
            MetricsProvider::Disabled => Counter::noop(),
        }
    }

    pub(crate) fn register_histogram(&self, key: &Key) -> Histogram {
        match self {
            MetricsProvider::Global => {
                metrics::with_recorder(|recorder| recorder.register_histogram(key, &METADATA))
            }
            MetricsProvider::Recorder(recorder) => recorder.register_histogram(key, &METADATA),
            MetricsProvider::Disabled => Histogram::noop(),
        }
    }

    pub(crate) fn describe_counter(&self, name: KeyName, unit: Unit, description: SharedString) {
        match self {
            MetricsProvider::Global => metrics::with_recorder(|recorder| {
                recorder.describe_counter(name, Some(unit), description)
            }),
            MetricsProvider::Recorder(recorder) => {
                recorder.describe_counter(name, Some(unit), description)
            }
            MetricsProvider::Disabled => {}
        }
    }

    pub(crate) fn describe_histogram(&self, name: KeyName, unit: Unit, description: SharedString) {
        match self {
            MetricsProvider::Global => metrics::with_recorder(|recorder| {
                recorder.describe_histogram(name, Some(unit), description)
            }),
            MetricsProvider::Recorder(recorder) => {
                recorder.describe_histogram(name, Some(unit), description)
            }
            MetricsProvider::Disabled => {}
        }
    }
}

impl std::fmt::Debug for MetricsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsProvider::Global => write!(f, "MetricsProvider::Global"),
            MetricsProvider::Recorder(_) => write!(f, "MetricsProvider::Recorder(..)"),
            MetricsProvider::Disabled => write!(f, "MetricsProvider::Disabled"),
        }
    }
}

// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

use metrics::{KeyName, SharedString, Unit};

use crate::{CounterHandle, HistogramHandle, InstrumentsConfig, MetricsProvider};

/// Owns every named instrument of one process or application context.
///
/// Construct it once at startup and share it by reference or `Arc` with the
/// components that record. Instruments are created at most once per name:
/// asking again returns a handle to the same instrument. Instruments are never
/// removed.
///
/// All methods are infallible. With [`MetricsProvider::Disabled`] every
/// handle is a no-op.
#[derive(Debug)]
pub struct InstrumentRegistry {
    config: InstrumentsConfig,
    counters: papaya::HashMap<String, CounterHandle>,
    histograms: papaya::HashMap<String, HistogramHandle>,
}

impl InstrumentRegistry {
    pub fn new(config: InstrumentsConfig) -> Self {
        tracing::debug!(
            prefix = config.prefix(),
            provider = ?config.provider(),
            "Instrument registry created"
        );
        Self {
            config,
            counters: papaya::HashMap::new(),
            histograms: papaya::HashMap::new(),
        }
    }

    /// A registry whose instruments record nothing.
    pub fn disabled() -> Self {
        Self::new(InstrumentsConfig::default().disabled())
    }

    pub fn config(&self) -> &InstrumentsConfig {
        &self.config
    }

    pub fn provider(&self) -> &MetricsProvider {
        self.config.provider()
    }

    /// Returns the counter `name`, creating and describing it on first use.
    ///
    /// `name` is the base name; the configured prefix is prepended.
    pub fn create_counter(
        &self,
        name: &str,
        unit: Unit,
        description: &'static str,
    ) -> CounterHandle {
        let full_name = self.config.full_name(name);
        let counters = self.counters.pin();
        if let Some(handle) = counters.get(full_name.as_str()) {
            return handle.clone();
        }

        if self.histograms.pin().contains_key(full_name.as_str()) {
            tracing::warn!(
                instrument = %full_name,
                "Instrument name already used by a histogram"
            );
        }

        counters
            .get_or_insert_with(full_name.clone(), || {
                let provider = self.config.provider().clone();
                provider.describe_counter(
                    KeyName::from(full_name.clone()),
                    unit,
                    SharedString::from(description),
                );
                tracing::debug!(instrument = %full_name, kind = "counter", "Instrument created");
                CounterHandle::new(KeyName::from(full_name.clone()), unit, provider)
            })
            .clone()
    }

    /// Returns the histogram `name`, creating and describing it on first use.
    ///
    /// `name` is the base name; the configured prefix is prepended.
    pub fn create_histogram(
        &self,
        name: &str,
        unit: Unit,
        description: &'static str,
    ) -> HistogramHandle {
        let full_name = self.config.full_name(name);
        let histograms = self.histograms.pin();
        if let Some(handle) = histograms.get(full_name.as_str()) {
            return handle.clone();
        }

        if self.counters.pin().contains_key(full_name.as_str()) {
            tracing::warn!(
                instrument = %full_name,
                "Instrument name already used by a counter"
            );
        }

        histograms
            .get_or_insert_with(full_name.clone(), || {
                let provider = self.config.provider().clone();
                provider.describe_histogram(
                    KeyName::from(full_name.clone()),
                    unit,
                    SharedString::from(description),
                );
                tracing::debug!(instrument = %full_name, kind = "histogram", "Instrument created");
                HistogramHandle::new(KeyName::from(full_name.clone()), unit, provider)
            })
            .clone()
    }

    /// Full names of every instrument created so far, sorted.
    pub fn instrument_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .counters
            .pin()
            .keys()
            .chain(self.histograms.pin().keys())
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for InstrumentRegistry {
    fn default() -> Self {
        Self::new(InstrumentsConfig::default())
    }
}

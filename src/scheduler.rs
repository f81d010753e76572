// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

use metrics::Unit;

use crate::instrument::LabeledCounter;
use crate::tags::{Phase, PhaseTags};
use crate::{names, InstrumentRegistry};

/// Recording facade for the scheduler.
///
/// The scheduler decides when a turn ran too long; this only counts it.
pub struct SchedulerInstruments {
    long_running_turns: LabeledCounter<Phase, PhaseTags>,
}

impl SchedulerInstruments {
    pub fn new(registry: &InstrumentRegistry) -> Self {
        Self {
            long_running_turns: LabeledCounter::new(registry.create_counter(
                names::SCHEDULER_LONG_RUNNING_TURNS,
                Unit::Count,
                "Turns that exceeded the scheduler's long-running threshold",
            )),
        }
    }

    /// Counts one turn that exceeded the long-running threshold.
    ///
    /// This is an occurrence count. It is not, and cannot be turned into, the
    /// number of turns running long right now.
    #[inline]
    pub fn on_long_running_turn(&self, phase: Phase) {
        self.long_running_turns.increment(phase);
    }
}

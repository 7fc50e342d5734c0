//! Clock definitions consumed by the reference engine.

use crate::ids::PinId;
use stave_common::Ident;
use serde::{Deserialize, Serialize};

/// The clock constraints of a design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingConstraints {
    /// Clock definitions, in definition order.
    pub clocks: Vec<ClockConstraint>,
}

impl TimingConstraints {
    /// Creates an empty set of timing constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clock and returns its index.
    pub fn add_clock(&mut self, name: Ident, period_ns: f64, source: PinId) -> usize {
        self.clocks.push(ClockConstraint {
            name,
            period_ns,
            source,
        });
        self.clocks.len() - 1
    }

    /// Returns the clock constraint with the given name, if any.
    pub fn find_clock(&self, name: Ident) -> Option<&ClockConstraint> {
        self.clocks.iter().find(|c| c.name == name)
    }

    /// Returns the number of defined clocks.
    pub fn clock_count(&self) -> usize {
        self.clocks.len()
    }
}

/// A periodic clock applied at a source pin.
///
/// The launching edge is at time zero; the next capturing edge is one period
/// later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConstraint {
    /// The name of the clock.
    pub name: Ident,
    /// Clock period in nanoseconds.
    pub period_ns: f64,
    /// The port or pin the clock is applied to.
    pub source: PinId,
}

impl ClockConstraint {
    /// Returns the target frequency in MHz for this clock.
    pub fn frequency_mhz(&self) -> f64 {
        if self.period_ns > 0.0 {
            1000.0 / self.period_ns
        } else {
            0.0
        }
    }
}

//! Contracts consumed from the timing engine and the design database.
//!
//! The path and cone extraction code never computes timing itself. It reads
//! path objects, per-pin values, and graph adjacency through [`TimingEngine`],
//! and pin identity and connectivity through [`DesignDatabase`]. The
//! reference [`StaEngine`](crate::sta::StaEngine) implements both; any other
//! engine can be plugged in behind the same traits.

use crate::ids::{CornerId, InstanceId, NetId, PinId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An ordered set of timing-engine pins.
pub type PinSet = BTreeSet<PinId>;

/// Direction of the analysis: late (setup) or early (hold) arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinMax {
    /// Early arrivals, checked against hold requirements.
    Min,
    /// Late arrivals, checked against setup requirements.
    Max,
}

impl MinMax {
    /// Maps the session's `use_max` flag to a direction.
    pub fn from_use_max(use_max: bool) -> Self {
        if use_max {
            MinMax::Max
        } else {
            MinMax::Min
        }
    }

    /// Returns `true` for [`MinMax::Max`].
    pub fn is_max(self) -> bool {
        self == MinMax::Max
    }
}

/// A corner combined with an analysis direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisPoint {
    /// The process/voltage/temperature corner.
    pub corner: CornerId,
    /// Whether late or early arrivals are analyzed.
    pub min_max: MinMax,
}

impl AnalysisPoint {
    /// Creates an analysis point.
    pub fn new(corner: CornerId, min_max: MinMax) -> Self {
        Self { corner, min_max }
    }
}

/// Design-database view of a pin: an instance terminal or a top-level port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbPin {
    /// A terminal of a cell instance.
    InstanceTerm {
        /// The owning instance.
        instance: InstanceId,
    },
    /// A top-level port of the block.
    BoundaryTerm,
}

impl DbPin {
    /// Returns the owning instance for instance terminals.
    pub fn instance(self) -> Option<InstanceId> {
        match self {
            DbPin::InstanceTerm { instance } => Some(instance),
            DbPin::BoundaryTerm => None,
        }
    }
}

/// One stage of a path object: a pin reached at a given arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStage {
    /// The pin at this stage.
    pub pin: PinId,
    /// `true` if the signal transition at this pin is rising.
    pub rising: bool,
    /// Path arrival time at this pin in ns.
    pub arrival: f64,
}

/// An ordered source-to-sink walk, split at the clock/data boundary.
///
/// `clock_stages` holds the clock network from its root up to (not including)
/// the first element of `data_stages`. For a register-launched path the first
/// data stage is the launching register's clock pin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathTrace {
    /// Clock network stages, root first.
    pub clock_stages: Vec<PathStage>,
    /// Data path stages, startpoint first.
    pub data_stages: Vec<PathStage>,
}

impl PathTrace {
    /// Returns `true` if the trace has no stages at all.
    pub fn is_empty(&self) -> bool {
        self.clock_stages.is_empty() && self.data_stages.is_empty()
    }

    /// Iterates stages in path order, tagging each with whether it belongs to
    /// the clock network section. The clock section is skipped unless
    /// `clock_expanded` is set.
    pub fn stages(&self, clock_expanded: bool) -> impl Iterator<Item = (bool, &PathStage)> + '_ {
        let clock: &[PathStage] = if clock_expanded {
            &self.clock_stages
        } else {
            &[]
        };
        clock
            .iter()
            .map(|s| (true, s))
            .chain(self.data_stages.iter().map(|s| (false, s)))
    }
}

/// A path object produced by the timing engine's path search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRecord {
    /// Name of the launching clock, if the startpoint is clocked.
    pub start_clock: Option<String>,
    /// Name of the capturing clock, if the endpoint is clocked.
    pub end_clock: Option<String>,
    /// Data arrival time at the endpoint in ns.
    pub arrival: f64,
    /// Required time at the endpoint in ns (infinite when unconstrained).
    pub required: f64,
    /// Slack in ns; negative means the check is violated.
    pub slack: f64,
    /// Data path delay from startpoint to endpoint in ns.
    pub path_delay: f64,
    /// `true` if no timing check constrains this path.
    pub unconstrained: bool,
    /// The launching walk.
    pub launch: PathTrace,
    /// The capturing clock walk, when the endpoint has a capture clock.
    pub capture: Option<PathTrace>,
    /// Offset placing capture times on the launch timeline (the capture edge).
    pub capture_offset: f64,
}

/// Constraints of a path search.
#[derive(Debug, Clone, Copy)]
pub struct PathSearch<'a> {
    /// Allowed startpoints; empty means any.
    pub from: &'a PinSet,
    /// Ordered through-sets; the path must hit each set in turn.
    pub thrus: &'a [PinSet],
    /// Allowed endpoints; empty means any.
    pub to: &'a PinSet,
    /// Where to analyze.
    pub ap: AnalysisPoint,
    /// Upper bound on returned paths.
    pub max_paths: usize,
    /// Whether unconstrained paths may be returned.
    pub unconstrained: bool,
}

/// Live timing values of one pin at an analysis point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinTiming {
    /// Arrival time in ns.
    pub arrival: f64,
    /// `true` if the worst arrival is a rising transition.
    pub rising: bool,
    /// Transition time in ns.
    pub slew: f64,
    /// Capacitive load in pF.
    pub load: f64,
    /// Worst slack of any constrained path through the pin, if any.
    pub slack: Option<f64>,
}

/// Capabilities consumed from a static timing engine.
pub trait TimingEngine {
    /// Returns the corner used when the session names none.
    fn default_corner(&self) -> Option<CornerId>;

    /// Looks up a corner by name.
    fn find_corner(&self, name: &str) -> Option<CornerId>;

    /// Returns the name of a corner.
    fn corner_name(&self, corner: CornerId) -> Option<&str>;

    /// Runs a path search. Paths come back worst slack first.
    fn find_paths(&self, search: &PathSearch<'_>) -> Vec<PathRecord>;

    /// Reads the current timing of a pin, or `None` if nothing is computed
    /// for it (unconnected, unanalyzed, or timing not updated).
    fn pin_timing(&self, pin: PinId, ap: AnalysisPoint) -> Option<PinTiming>;

    /// Transition time at a pin in ns.
    fn slew(&self, pin: PinId, ap: AnalysisPoint) -> f64;

    /// Capacitive load seen at a pin in pF.
    fn load(&self, pin: PinId, ap: AnalysisPoint) -> f64;

    /// Returns `true` if the pin is part of a clock network.
    fn is_clock_pin(&self, pin: PinId) -> bool;

    /// Immediate predecessors of a pin in the timing graph.
    fn fanin_pins(&self, pin: PinId) -> Vec<PinId>;

    /// Immediate successors of a pin in the timing graph.
    fn fanout_pins(&self, pin: PinId) -> Vec<PinId>;
}

/// Capabilities consumed from the design database.
pub trait DesignDatabase {
    /// Classifies a pin, or returns `None` if the pin is unknown.
    fn db_pin(&self, pin: PinId) -> Option<DbPin>;

    /// Terminal name of a pin (`"Q"`) or the port name for top-level pins.
    fn pin_name(&self, pin: PinId) -> Option<&str>;

    /// Name of an instance.
    fn instance_name(&self, instance: InstanceId) -> Option<&str>;

    /// Library cell (master) name of an instance.
    fn instance_master(&self, instance: InstanceId) -> Option<&str>;

    /// Net connected to a pin.
    fn pin_net(&self, pin: PinId) -> Option<NetId>;

    /// Name of a net.
    fn net_name(&self, net: NetId) -> Option<&str>;

    /// Pins loading a net (everything on it except drivers).
    fn net_loads(&self, net: NetId) -> Vec<PinId>;

    /// Returns `true` if the pin drives its net.
    fn is_driver(&self, pin: PinId) -> bool;
}

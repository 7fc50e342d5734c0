//! Netlist-level timing graph used by the reference engine.
//!
//! The [`TimingGraph`] holds pins (instance terminals and top-level ports),
//! the instances and nets they belong to, analysis corners, and directed
//! timing edges. Edges carry min/max delays and a semantic type that decides
//! how [`StaEngine`](crate::sta::StaEngine) propagates across them.
//!
//! Pins, instances, nets, corners, and edges live in `Vec`s indexed by their
//! IDs; each pin keeps the IDs of its incoming and outgoing edges so that
//! adjacency is answered without scanning the edge list.

use crate::engine::{DbPin, MinMax};
use crate::ids::{CornerId, InstanceId, NetId, PinId, TimingEdgeId};
use serde::{Deserialize, Serialize};

/// A min/max delay pair in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Delay {
    /// Early (best-case) delay.
    pub min_ns: f64,
    /// Late (worst-case) delay.
    pub max_ns: f64,
}

impl Delay {
    /// A zero delay.
    pub const ZERO: Self = Self {
        min_ns: 0.0,
        max_ns: 0.0,
    };

    /// Creates a delay from its early and late values.
    pub fn new(min_ns: f64, max_ns: f64) -> Self {
        Self { min_ns, max_ns }
    }

    /// Creates a delay with identical early and late values.
    pub fn fixed(ns: f64) -> Self {
        Self::new(ns, ns)
    }

    /// Selects the value used for the given analysis direction.
    pub fn select(&self, min_max: MinMax) -> f64 {
        match min_max {
            MinMax::Min => self.min_ns,
            MinMax::Max => self.max_ns,
        }
    }
}

/// Signal direction of a pin, seen from its owner.
///
/// A top-level `Input` port drives into the design; an instance `Output` pin
/// drives its net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    /// Signal enters the owner.
    Input,
    /// Signal leaves the owner.
    Output,
}

/// A pin of the timing graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPin {
    /// The unique ID of this pin.
    pub id: PinId,
    /// Terminal name (`"Q"`) or port name.
    pub name: String,
    /// Owning instance, or top-level port.
    pub owner: DbPin,
    /// Signal direction relative to the owner.
    pub direction: PinDirection,
    /// Connected net, once wired.
    pub net: Option<NetId>,
    /// Nominal transition time in ns.
    pub slew_ns: f64,
    /// Pin capacitance in pF.
    pub cap_pf: f64,
    /// Edges arriving at this pin.
    pub fanin_edges: Vec<TimingEdgeId>,
    /// Edges leaving this pin.
    pub fanout_edges: Vec<TimingEdgeId>,
}

/// A cell instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphInstance {
    /// The unique ID of this instance.
    pub id: InstanceId,
    /// Instance name (`"u_alu/add0"`).
    pub name: String,
    /// Library cell name (`"DFF_X1"`).
    pub master: String,
}

/// A net with one driver and any number of loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNet {
    /// The unique ID of this net.
    pub id: NetId,
    /// Net name.
    pub name: String,
    /// The driving pin.
    pub driver: PinId,
    /// Load pins in connection order.
    pub loads: Vec<PinId>,
}

/// An analysis corner. Every delay and slew is scaled by `derate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corner {
    /// The unique ID of this corner.
    pub id: CornerId,
    /// Corner name (`"slow"`, `"typ"`).
    pub name: String,
    /// Delay multiplier.
    pub derate: f64,
}

/// A directed edge carrying a delay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingEdge {
    /// The unique ID of this edge.
    pub id: TimingEdgeId,
    /// The source pin.
    pub from: PinId,
    /// The destination pin.
    pub to: PinId,
    /// Propagation delay, or the check value for check edges.
    pub delay: Delay,
    /// The semantic type of this edge.
    pub edge_type: TimingEdgeType,
    /// `true` if a rising transition at `from` falls at `to`.
    pub inverting: bool,
}

impl TimingEdge {
    /// Returns `true` for setup and hold check edges.
    pub fn is_check(&self) -> bool {
        matches!(
            self.edge_type,
            TimingEdgeType::SetupCheck | TimingEdgeType::HoldCheck
        )
    }
}

/// The type of a timing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingEdgeType {
    /// Combinational delay through a cell (input pin to output pin).
    CellDelay,
    /// Interconnect delay from a net's driver to one of its loads.
    NetDelay,
    /// Clock-to-output delay of a register (clock pin to Q).
    ClockToQ,
    /// Setup requirement, from a register clock pin to its data pin.
    SetupCheck,
    /// Hold requirement, from a register clock pin to its data pin.
    HoldCheck,
}

/// A pin-level timing graph with its netlist context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingGraph {
    /// All pins.
    pub pins: Vec<GraphPin>,
    /// All instances.
    pub instances: Vec<GraphInstance>,
    /// All nets.
    pub nets: Vec<GraphNet>,
    /// All analysis corners.
    pub corners: Vec<Corner>,
    /// All directed edges.
    pub edges: Vec<TimingEdge>,
}

impl TimingGraph {
    /// Creates an empty timing graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an analysis corner and returns its ID.
    pub fn add_corner(&mut self, name: impl Into<String>, derate: f64) -> CornerId {
        let id = CornerId::from_raw(self.corners.len() as u32);
        self.corners.push(Corner {
            id,
            name: name.into(),
            derate,
        });
        id
    }

    /// Adds a cell instance and returns its ID.
    pub fn add_instance(
        &mut self,
        name: impl Into<String>,
        master: impl Into<String>,
    ) -> InstanceId {
        let id = InstanceId::from_raw(self.instances.len() as u32);
        self.instances.push(GraphInstance {
            id,
            name: name.into(),
            master: master.into(),
        });
        id
    }

    /// Adds a terminal of `instance` and returns its pin ID.
    pub fn add_instance_pin(
        &mut self,
        instance: InstanceId,
        name: impl Into<String>,
        direction: PinDirection,
    ) -> PinId {
        self.push_pin(name.into(), DbPin::InstanceTerm { instance }, direction)
    }

    /// Adds a top-level port and returns its pin ID.
    pub fn add_port(&mut self, name: impl Into<String>, direction: PinDirection) -> PinId {
        self.push_pin(name.into(), DbPin::BoundaryTerm, direction)
    }

    fn push_pin(&mut self, name: String, owner: DbPin, direction: PinDirection) -> PinId {
        let id = PinId::from_raw(self.pins.len() as u32);
        self.pins.push(GraphPin {
            id,
            name,
            owner,
            direction,
            net: None,
            slew_ns: 0.0,
            cap_pf: 0.0,
            fanin_edges: Vec::new(),
            fanout_edges: Vec::new(),
        });
        id
    }

    /// Sets the nominal slew and capacitance of a pin.
    pub fn set_pin_electrical(&mut self, pin: PinId, slew_ns: f64, cap_pf: f64) {
        if let Some(p) = self.pins.get_mut(pin.index()) {
            p.slew_ns = slew_ns;
            p.cap_pf = cap_pf;
        }
    }

    /// Connects `driver` to `loads` with a new net and adds one
    /// [`TimingEdgeType::NetDelay`] edge per load with delay `wire`.
    pub fn add_net(
        &mut self,
        name: impl Into<String>,
        driver: PinId,
        loads: &[PinId],
        wire: Delay,
    ) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        self.nets.push(GraphNet {
            id,
            name: name.into(),
            driver,
            loads: loads.to_vec(),
        });
        for &pin in std::iter::once(&driver).chain(loads) {
            if let Some(p) = self.pins.get_mut(pin.index()) {
                p.net = Some(id);
            }
        }
        for &load in loads {
            self.add_edge(driver, load, wire, TimingEdgeType::NetDelay);
        }
        id
    }

    /// Adds a non-inverting edge and returns its ID.
    pub fn add_edge(
        &mut self,
        from: PinId,
        to: PinId,
        delay: Delay,
        edge_type: TimingEdgeType,
    ) -> TimingEdgeId {
        self.add_edge_with_sense(from, to, delay, edge_type, false)
    }

    /// Adds an edge with an explicit inversion sense and returns its ID.
    ///
    /// Adjacency is only recorded on endpoints that exist;
    /// [`TimingGraph::validate`] reports the dangling ones.
    pub fn add_edge_with_sense(
        &mut self,
        from: PinId,
        to: PinId,
        delay: Delay,
        edge_type: TimingEdgeType,
        inverting: bool,
    ) -> TimingEdgeId {
        let id = TimingEdgeId::from_raw(self.edges.len() as u32);
        self.edges.push(TimingEdge {
            id,
            from,
            to,
            delay,
            edge_type,
            inverting,
        });
        if let Some(p) = self.pins.get_mut(from.index()) {
            p.fanout_edges.push(id);
        }
        if let Some(p) = self.pins.get_mut(to.index()) {
            p.fanin_edges.push(id);
        }
        id
    }

    /// Returns the pin with the given ID.
    pub fn pin(&self, id: PinId) -> Option<&GraphPin> {
        self.pins.get(id.index())
    }

    /// Returns the instance with the given ID.
    pub fn instance(&self, id: InstanceId) -> Option<&GraphInstance> {
        self.instances.get(id.index())
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> Option<&GraphNet> {
        self.nets.get(id.index())
    }

    /// Returns the corner with the given ID.
    pub fn corner(&self, id: CornerId) -> Option<&Corner> {
        self.corners.get(id.index())
    }

    /// Returns the edge with the given ID.
    pub fn edge(&self, id: TimingEdgeId) -> &TimingEdge {
        &self.edges[id.index()]
    }

    /// Looks up a corner by name.
    pub fn find_corner(&self, name: &str) -> Option<CornerId> {
        self.corners.iter().find(|c| c.name == name).map(|c| c.id)
    }

    /// Looks up a pin by its hierarchical name (`"inst/pin"` or a port name).
    pub fn find_pin(&self, full_name: &str) -> Option<PinId> {
        self.pins
            .iter()
            .find(|p| self.pin_full_name(p) == full_name)
            .map(|p| p.id)
    }

    /// Returns the hierarchical name of a pin, or an empty string if unknown.
    pub fn full_name(&self, id: PinId) -> String {
        self.pin(id)
            .map(|p| self.pin_full_name(p))
            .unwrap_or_default()
    }

    fn pin_full_name(&self, pin: &GraphPin) -> String {
        match pin.owner.instance().and_then(|i| self.instance(i)) {
            Some(inst) => format!("{}/{}", inst.name, pin.name),
            None => pin.name.clone(),
        }
    }

    /// Returns `true` if the pin drives its net: an instance output or a
    /// top-level input port.
    pub fn is_driver(&self, id: PinId) -> bool {
        self.pin(id).is_some_and(|p| match p.owner {
            DbPin::InstanceTerm { .. } => p.direction == PinDirection::Output,
            DbPin::BoundaryTerm => p.direction == PinDirection::Input,
        })
    }

    /// Returns `true` for top-level output ports.
    pub fn is_output_port(&self, id: PinId) -> bool {
        self.pin(id).is_some_and(|p| {
            p.owner == DbPin::BoundaryTerm && p.direction == PinDirection::Output
        })
    }

    /// Returns all edges leaving the given pin.
    pub fn outgoing_edges(&self, pin: PinId) -> impl Iterator<Item = &TimingEdge> + '_ {
        self.pin(pin)
            .into_iter()
            .flat_map(|p| p.fanout_edges.iter())
            .map(|&e| self.edge(e))
    }

    /// Returns all edges arriving at the given pin.
    pub fn incoming_edges(&self, pin: PinId) -> impl Iterator<Item = &TimingEdge> + '_ {
        self.pin(pin)
            .into_iter()
            .flat_map(|p| p.fanin_edges.iter())
            .map(|&e| self.edge(e))
    }

    /// Returns the total number of pins.
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Returns the total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the first edge whose endpoints are not pins of this graph.
    pub fn validate(&self) -> Result<(), &TimingEdge> {
        match self
            .edges
            .iter()
            .find(|e| self.pin(e.from).is_none() || self.pin(e.to).is_none())
        {
            Some(edge) => Err(edge),
            None => Ok(()),
        }
    }
}

//! Per-stage records of timing paths and cones.
//!
//! A [`PathNode`] captures one pin of a path or cone together with the timing
//! values read for it. Nodes never point at each other directly: pairing and
//! instance back-references are [`NodeRef`] indices into the container that
//! owns the nodes, so releasing a path or cone cannot leave dangling links.

use crate::engine::{DbPin, DesignDatabase, PinTiming};
use crate::ids::{InstanceId, NetId, PinId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The node sequence a [`NodeRef`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeList {
    /// The launch sequence of a [`TimingPath`](crate::path::TimingPath).
    Launch,
    /// The capture sequence of a [`TimingPath`](crate::path::TimingPath).
    Capture,
    /// One depth level of a [`ConeDepthMap`](crate::cone::ConeDepthMap).
    Depth(usize),
}

/// Non-owning link to a node held by the same path or cone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// Which sequence the node lives in.
    pub list: NodeList,
    /// Position of the node in that sequence.
    pub index: usize,
}

impl NodeRef {
    /// Creates a link to `list[index]`.
    pub fn new(list: NodeList, index: usize) -> Self {
        Self { list, index }
    }
}

/// Classification flags fixed when a node is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// The pin belongs to a clock network.
    pub is_clock: bool,
    /// The transition at the pin is rising.
    pub is_rising: bool,
    /// The pin is a load of its net rather than a driver.
    pub is_sink: bool,
}

/// Electrical values of a path stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageValues {
    /// Arrival time in ns.
    pub arrival: f64,
    /// Delay from the previous stage in ns.
    pub delay: f64,
    /// Transition time in ns.
    pub slew: f64,
    /// Capacitive load in pF.
    pub load: f64,
}

/// One pin of a timing path or cone, with its timing annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pin: DbPin,
    sta_pin: PinId,
    is_clock: bool,
    is_rising: bool,
    is_sink: bool,
    has_values: bool,
    arrival: f64,
    delay: f64,
    slew: f64,
    load: f64,
    path_slack: f64,
    fanout: usize,
    paired_nodes: BTreeSet<NodeRef>,
    instance_node: Option<NodeRef>,
}

impl PathNode {
    /// Creates a node without timing values.
    pub fn new(pin: DbPin, sta_pin: PinId, flags: NodeFlags) -> Self {
        Self {
            pin,
            sta_pin,
            is_clock: flags.is_clock,
            is_rising: flags.is_rising,
            is_sink: flags.is_sink,
            has_values: false,
            arrival: 0.0,
            delay: 0.0,
            slew: 0.0,
            load: 0.0,
            path_slack: 0.0,
            fanout: 0,
            paired_nodes: BTreeSet::new(),
            instance_node: None,
        }
    }

    /// Creates a node carrying the values of a path stage.
    pub fn with_values(pin: DbPin, sta_pin: PinId, flags: NodeFlags, values: StageValues) -> Self {
        Self {
            has_values: true,
            arrival: values.arrival,
            delay: values.delay,
            slew: values.slew,
            load: values.load,
            ..Self::new(pin, sta_pin, flags)
        }
    }

    /// Design-database view of the pin.
    pub fn pin(&self) -> DbPin {
        self.pin
    }

    /// Timing-engine handle of the pin.
    pub fn sta_pin(&self) -> PinId {
        self.sta_pin
    }

    /// Returns `true` for instance terminals.
    pub fn is_pin_iterm(&self) -> bool {
        matches!(self.pin, DbPin::InstanceTerm { .. })
    }

    /// Returns `true` for top-level ports.
    pub fn is_pin_bterm(&self) -> bool {
        matches!(self.pin, DbPin::BoundaryTerm)
    }

    /// The owning instance, for instance terminals.
    pub fn instance(&self) -> Option<InstanceId> {
        self.pin.instance()
    }

    /// Returns `true` if the pin belongs to an instance.
    pub fn has_instance(&self) -> bool {
        self.instance().is_some()
    }

    /// The net the pin connects to.
    pub fn net(&self, db: &dyn DesignDatabase) -> Option<NetId> {
        db.pin_net(self.sta_pin)
    }

    /// Name of the connected net, or an empty string if unconnected.
    pub fn net_name(&self, db: &dyn DesignDatabase) -> String {
        self.net(db)
            .and_then(|net| db.net_name(net))
            .unwrap_or_default()
            .to_string()
    }

    /// Display name: `inst/pin` for instance terminals (with the master in
    /// parentheses when `include_master`), the port name for boundary
    /// terminals.
    pub fn node_name(&self, db: &dyn DesignDatabase, include_master: bool) -> String {
        let pin_name = db.pin_name(self.sta_pin).unwrap_or("?");
        match self.pin {
            DbPin::BoundaryTerm => pin_name.to_string(),
            DbPin::InstanceTerm { instance } => {
                let inst_name = db.instance_name(instance).unwrap_or("?");
                match db.instance_master(instance) {
                    Some(master) if include_master => {
                        format!("{inst_name}/{pin_name} ({master})")
                    }
                    _ => format!("{inst_name}/{pin_name}"),
                }
            }
        }
    }

    /// Returns `true` if the pin is on a clock network.
    pub fn is_clock(&self) -> bool {
        self.is_clock
    }

    /// Returns `true` if the transition is rising.
    pub fn is_rising_edge(&self) -> bool {
        self.is_rising
    }

    /// Returns `true` if the pin loads its net.
    pub fn is_sink(&self) -> bool {
        self.is_sink
    }

    /// Returns `true` if the pin drives its net.
    pub fn is_source(&self) -> bool {
        !self.is_sink
    }

    /// Whether the electrical fields below were populated.
    pub fn has_values(&self) -> bool {
        self.has_values
    }

    /// Arrival time in ns.
    pub fn arrival(&self) -> f64 {
        self.arrival
    }

    /// Delay from the previous stage in ns.
    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Transition time in ns.
    pub fn slew(&self) -> f64 {
        self.slew
    }

    /// Capacitive load in pF.
    pub fn load(&self) -> f64 {
        self.load
    }

    /// Sets the slack of the path this node belongs to.
    pub fn set_path_slack(&mut self, value: f64) {
        self.path_slack = value;
    }

    /// Slack of the path this node belongs to, in ns.
    pub fn path_slack(&self) -> f64 {
        self.path_slack
    }

    /// Sets the number of loads driven by this pin.
    pub fn set_fanout(&mut self, fanout: usize) {
        self.fanout = fanout;
    }

    /// Number of loads driven by this pin.
    pub fn fanout(&self) -> usize {
        self.fanout
    }

    /// Links this node to its counterpart in another view.
    pub fn add_paired_node(&mut self, node: NodeRef) {
        self.paired_nodes.insert(node);
    }

    /// Removes all pairing links.
    pub fn clear_paired_nodes(&mut self) {
        self.paired_nodes.clear();
    }

    /// Links to counterpart nodes.
    pub fn paired_nodes(&self) -> &BTreeSet<NodeRef> {
        &self.paired_nodes
    }

    /// Links this node to the representative node of its instance.
    pub fn set_instance_node(&mut self, node: NodeRef) {
        self.instance_node = Some(node);
    }

    /// Link to the representative node of this pin's instance.
    pub fn instance_node(&self) -> Option<NodeRef> {
        self.instance_node
    }

    /// Copies every flag and electrical field into `other`.
    ///
    /// Identity, paired nodes, and the instance link of `other` are left as
    /// they are.
    pub fn copy_data(&self, other: &mut PathNode) {
        other.is_clock = self.is_clock;
        other.is_rising = self.is_rising;
        other.is_sink = self.is_sink;
        other.has_values = self.has_values;
        other.arrival = self.arrival;
        other.delay = self.delay;
        other.slew = self.slew;
        other.load = self.load;
        other.path_slack = self.path_slack;
        other.fanout = self.fanout;
    }

    /// Fills arrival, edge, slew, load, and (when known) slack from a live
    /// readout.
    pub(crate) fn apply_timing(&mut self, timing: &PinTiming) {
        self.has_values = true;
        self.is_rising = timing.rising;
        self.arrival = timing.arrival;
        self.slew = timing.slew;
        self.load = timing.load;
        if let Some(slack) = timing.slack {
            self.path_slack = slack;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iterm(inst: u32, pin: u32) -> PathNode {
        PathNode::new(
            DbPin::InstanceTerm {
                instance: InstanceId::from_raw(inst),
            },
            PinId::from_raw(pin),
            NodeFlags::default(),
        )
    }

    fn valued() -> PathNode {
        PathNode::with_values(
            DbPin::BoundaryTerm,
            PinId::from_raw(1),
            NodeFlags {
                is_clock: true,
                is_rising: true,
                is_sink: true,
            },
            StageValues {
                arrival: 1.25,
                delay: 0.5,
                slew: 0.08,
                load: 0.004,
            },
        )
    }

    #[test]
    fn bare_node_has_no_values() {
        let node = iterm(0, 3);
        assert!(!node.has_values());
        assert_eq!(node.arrival(), 0.0);
        assert_eq!(node.delay(), 0.0);
        assert_eq!(node.slew(), 0.0);
        assert_eq!(node.load(), 0.0);
        assert_eq!(node.fanout(), 0);
        assert!(node.paired_nodes().is_empty());
        assert_eq!(node.instance_node(), None);
    }

    #[test]
    fn source_is_not_sink() {
        let source = iterm(0, 3);
        assert!(source.is_source());
        assert!(!source.is_sink());
        let sink = valued();
        assert!(sink.is_sink());
        assert!(!sink.is_source());
    }

    #[test]
    fn pin_kind() {
        let node = iterm(7, 3);
        assert!(node.is_pin_iterm());
        assert!(!node.is_pin_bterm());
        assert_eq!(node.instance(), Some(InstanceId::from_raw(7)));
        assert!(valued().is_pin_bterm());
        assert!(!valued().has_instance());
    }

    #[test]
    fn copy_data_keeps_identity_and_links() {
        let src = valued();
        let mut dst = iterm(2, 9);
        dst.add_paired_node(NodeRef::new(NodeList::Capture, 4));
        dst.set_instance_node(NodeRef::new(NodeList::Launch, 0));
        let mut src = src;
        src.set_fanout(3);
        src.set_path_slack(-0.2);

        src.copy_data(&mut dst);

        assert!(dst.has_values());
        assert!(dst.is_clock());
        assert!(dst.is_rising_edge());
        assert!(dst.is_sink());
        assert_eq!(dst.arrival(), 1.25);
        assert_eq!(dst.delay(), 0.5);
        assert_eq!(dst.fanout(), 3);
        assert_eq!(dst.path_slack(), -0.2);
        assert_eq!(dst.sta_pin(), PinId::from_raw(9));
        assert!(dst.is_pin_iterm());
        assert_eq!(dst.paired_nodes().len(), 1);
        assert_eq!(dst.instance_node(), Some(NodeRef::new(NodeList::Launch, 0)));
    }

    #[test]
    fn paired_nodes_are_a_set() {
        let mut node = iterm(0, 0);
        node.add_paired_node(NodeRef::new(NodeList::Depth(1), 2));
        node.add_paired_node(NodeRef::new(NodeList::Depth(1), 2));
        node.add_paired_node(NodeRef::new(NodeList::Depth(1), 0));
        let refs: Vec<usize> = node.paired_nodes().iter().map(|r| r.index).collect();
        assert_eq!(refs, vec![0, 2]);
        node.clear_paired_nodes();
        assert!(node.paired_nodes().is_empty());
    }

    #[test]
    fn apply_timing_sets_values() {
        let mut node = iterm(0, 0);
        node.apply_timing(&PinTiming {
            arrival: 0.7,
            rising: false,
            slew: 0.05,
            load: 0.002,
            slack: Some(0.9),
        });
        assert!(node.has_values());
        assert!(!node.is_rising_edge());
        assert_eq!(node.arrival(), 0.7);
        assert_eq!(node.path_slack(), 0.9);
        assert_eq!(node.delay(), 0.0);
    }

    #[test]
    fn serde_roundtrip() {
        let mut node = valued();
        node.add_paired_node(NodeRef::new(NodeList::Launch, 1));
        let json = serde_json::to_string(&node).unwrap();
        let back: PathNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}

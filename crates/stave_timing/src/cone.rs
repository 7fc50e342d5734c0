//! Fanin and fanout cones as depth-layered pin sets and node levels.
//!
//! A cone is discovered breadth-first from a seed pin over the timing
//! engine's immediate fanin or fanout. Each pin is assigned the depth at
//! which it is first reached, so no pin appears at two depths and
//! reconvergent logic is reported once at its shortest distance.

use crate::engine::{AnalysisPoint, DesignDatabase, PinSet, TimingEngine};
use crate::ids::PinId;
use crate::node::{NodeFlags, NodeList, NodeRef, PathNode};
use std::collections::{BTreeMap, HashSet};

/// Pins of a cone grouped by distance from the seed.
pub type ConeDepthMapPinSet = BTreeMap<usize, PinSet>;

/// Nodes of a cone grouped by distance from the seed, each level ordered by
/// pin ID.
pub type ConeDepthMap = BTreeMap<usize, Vec<PathNode>>;

/// Which way a cone grows from its seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConeDirection {
    /// Toward the inputs feeding the seed.
    Fanin,
    /// Toward the logic the seed drives.
    Fanout,
}

impl ConeDirection {
    /// Maps an `is_fanin` flag to a direction.
    pub fn from_is_fanin(is_fanin: bool) -> Self {
        if is_fanin {
            ConeDirection::Fanin
        } else {
            ConeDirection::Fanout
        }
    }
}

/// Layers the cone of `seed` by breadth-first distance.
///
/// Depth 0 is exactly `{seed}`. With `bounding`, pins outside the set are
/// never entered (the seed is exempt). Traversal stops when a level adds no
/// unvisited pin, so cycles terminate.
pub fn trace_cone(
    sta: &dyn TimingEngine,
    seed: PinId,
    bounding: Option<&PinSet>,
    direction: ConeDirection,
) -> ConeDepthMapPinSet {
    let mut depth_map = ConeDepthMapPinSet::new();
    let mut visited: HashSet<PinId> = HashSet::from([seed]);
    let mut frontier = PinSet::from([seed]);
    let mut depth = 0;

    while !frontier.is_empty() {
        let mut next = PinSet::new();
        for &pin in &frontier {
            let neighbors = match direction {
                ConeDirection::Fanin => sta.fanin_pins(pin),
                ConeDirection::Fanout => sta.fanout_pins(pin),
            };
            for neighbor in neighbors {
                if bounding.is_some_and(|b| !b.contains(&neighbor)) {
                    continue;
                }
                if visited.insert(neighbor) {
                    next.insert(neighbor);
                }
            }
        }
        depth_map.insert(depth, frontier);
        frontier = next;
        depth += 1;
    }

    depth_map
}

/// Builds an untimed node for `pin`, or `None` if the design does not know
/// the pin. Source nodes get the load count of their net as fanout.
pub(crate) fn bare_node(
    sta: &dyn TimingEngine,
    db: &dyn DesignDatabase,
    pin: PinId,
) -> Option<PathNode> {
    let db_pin = db.db_pin(pin)?;
    let flags = NodeFlags {
        is_clock: sta.is_clock_pin(pin),
        is_rising: true,
        is_sink: !db.is_driver(pin),
    };
    let mut node = PathNode::new(db_pin, pin, flags);
    if node.is_source() {
        if let Some(net) = db.pin_net(pin) {
            node.set_fanout(db.net_loads(net).len());
        }
    }
    Some(node)
}

/// Turns each depth's pins into nodes. Pins the design does not know are
/// left out.
pub(crate) fn build_levels(
    sta: &dyn TimingEngine,
    db: &dyn DesignDatabase,
    depth_map: &ConeDepthMapPinSet,
) -> ConeDepthMap {
    depth_map
        .iter()
        .map(|(&depth, pins)| {
            let nodes = pins
                .iter()
                .filter_map(|&pin| {
                    let node = bare_node(sta, db, pin);
                    if node.is_none() {
                        tracing::trace!(pin = pin.as_raw(), depth, "cone pin outside the design");
                    }
                    node
                })
                .collect();
            (depth, nodes)
        })
        .collect()
}

/// Pairs every node at depth `d` with the nodes at depth `d + 1` it is
/// directly connected to (in either direction), recording the link on both
/// nodes.
pub(crate) fn link_levels(sta: &dyn TimingEngine, levels: &mut ConeDepthMap) {
    let mut links = Vec::new();
    for (&depth, here) in levels.iter() {
        let Some(next) = levels.get(&(depth + 1)) else {
            continue;
        };
        for (i, node) in here.iter().enumerate() {
            let pin = node.sta_pin();
            let mut adjacent: HashSet<PinId> = sta.fanout_pins(pin).into_iter().collect();
            adjacent.extend(sta.fanin_pins(pin));
            for (j, other) in next.iter().enumerate() {
                if adjacent.contains(&other.sta_pin()) {
                    links.push((depth, i, j));
                }
            }
        }
    }

    for (depth, i, j) in links {
        if let Some(node) = levels.get_mut(&depth).and_then(|l| l.get_mut(i)) {
            node.add_paired_node(NodeRef::new(NodeList::Depth(depth + 1), j));
        }
        if let Some(node) = levels.get_mut(&(depth + 1)).and_then(|l| l.get_mut(j)) {
            node.add_paired_node(NodeRef::new(NodeList::Depth(depth), i));
        }
    }
}

/// Fills live timing into every node the engine has values for.
pub(crate) fn annotate_levels(sta: &dyn TimingEngine, ap: AnalysisPoint, levels: &mut ConeDepthMap) {
    for node in levels.values_mut().flatten() {
        if let Some(timing) = sta.pin_timing(node.sta_pin(), ap) {
            node.apply_timing(&timing);
        }
    }
}

/// Resolves a link held by a cone node.
pub fn cone_node(levels: &ConeDepthMap, node_ref: NodeRef) -> Option<&PathNode> {
    match node_ref.list {
        NodeList::Depth(depth) => levels.get(&depth)?.get(node_ref.index),
        NodeList::Launch | NodeList::Capture => None,
    }
}

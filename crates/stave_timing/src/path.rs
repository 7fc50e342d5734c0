//! Timing paths as ordered, annotated node sequences.
//!
//! A [`TimingPath`] is built from an engine [`PathRecord`]: the launch walk
//! becomes the launch node sequence and, optionally, the capture clock walk
//! becomes the capture sequence. After population the path records where the
//! clock network ends in each sequence and broadcasts its slack to every node.

use crate::engine::{AnalysisPoint, DbPin, DesignDatabase, PathRecord, PathTrace, TimingEngine};
use crate::ids::InstanceId;
use crate::node::{NodeFlags, NodeList, NodeRef, PathNode, StageValues};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A timing path with launch and capture node sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingPath {
    path_nodes: Vec<PathNode>,
    capture_nodes: Vec<PathNode>,
    start_clock: Option<String>,
    end_clock: Option<String>,
    slack: f64,
    path_delay: f64,
    arrival_time: f64,
    required_time: f64,
    clk_path_end_index: Option<usize>,
    clk_capture_end_index: Option<usize>,
}

impl TimingPath {
    /// Creates an empty path with zeroed summary values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty path carrying the summary values of `record`.
    pub fn from_record(record: &PathRecord) -> Self {
        Self {
            start_clock: record.start_clock.clone(),
            end_clock: record.end_clock.clone(),
            slack: record.slack,
            path_delay: record.path_delay,
            arrival_time: record.arrival,
            required_time: record.required,
            ..Self::default()
        }
    }

    /// Sets the launching clock name.
    pub fn set_start_clock(&mut self, name: impl Into<String>) {
        self.start_clock = Some(name.into());
    }

    /// The launching clock name, if the path is clocked at its start.
    pub fn start_clock(&self) -> Option<&str> {
        self.start_clock.as_deref()
    }

    /// Sets the capturing clock name.
    pub fn set_end_clock(&mut self, name: impl Into<String>) {
        self.end_clock = Some(name.into());
    }

    /// The capturing clock name, if the path is clocked at its end.
    pub fn end_clock(&self) -> Option<&str> {
        self.end_clock.as_deref()
    }

    /// Data arrival time at the endpoint in ns.
    pub fn path_arrival_time(&self) -> f64 {
        self.arrival_time
    }

    /// Sets the data arrival time at the endpoint.
    pub fn set_path_arrival_time(&mut self, arrival: f64) {
        self.arrival_time = arrival;
    }

    /// Required time at the endpoint in ns.
    pub fn path_required_time(&self) -> f64 {
        self.required_time
    }

    /// Sets the required time at the endpoint.
    pub fn set_path_required_time(&mut self, required: f64) {
        self.required_time = required;
    }

    /// Path slack in ns; negative means violated.
    pub fn slack(&self) -> f64 {
        self.slack
    }

    /// Sets the path slack.
    pub fn set_slack(&mut self, slack: f64) {
        self.slack = slack;
    }

    /// Data path delay in ns.
    pub fn path_delay(&self) -> f64 {
        self.path_delay
    }

    /// Sets the data path delay.
    pub fn set_path_delay(&mut self, delay: f64) {
        self.path_delay = delay;
    }

    /// Index of the last clock network node of the launch sequence.
    pub fn clk_path_end_index(&self) -> Option<usize> {
        self.clk_path_end_index
    }

    /// Index of the last clock network node of the capture sequence.
    pub fn clk_capture_end_index(&self) -> Option<usize> {
        self.clk_capture_end_index
    }

    /// Launch nodes, source first.
    pub fn path_nodes(&self) -> &[PathNode] {
        &self.path_nodes
    }

    /// Mutable access to the launch nodes.
    pub fn path_nodes_mut(&mut self) -> &mut Vec<PathNode> {
        &mut self.path_nodes
    }

    /// Capture nodes, clock root first.
    pub fn capture_nodes(&self) -> &[PathNode] {
        &self.capture_nodes
    }

    /// Mutable access to the capture nodes.
    pub fn capture_nodes_mut(&mut self) -> &mut Vec<PathNode> {
        &mut self.capture_nodes
    }

    /// Resolves a link held by one of this path's nodes.
    ///
    /// Links into cone levels never resolve against a path.
    pub fn node(&self, node_ref: NodeRef) -> Option<&PathNode> {
        match node_ref.list {
            NodeList::Launch => self.path_nodes.get(node_ref.index),
            NodeList::Capture => self.capture_nodes.get(node_ref.index),
            NodeList::Depth(_) => None,
        }
    }

    /// Name of the first data path stage (the node after the clock prefix).
    pub fn start_stage_name(&self, db: &dyn DesignDatabase) -> String {
        let first_data = self.clk_path_end_index.map_or(0, |i| i + 1);
        self.path_nodes
            .get(first_data)
            .or_else(|| self.path_nodes.last())
            .map(|node| node.node_name(db, false))
            .unwrap_or_default()
    }

    /// Name of the endpoint stage.
    pub fn end_stage_name(&self, db: &dyn DesignDatabase) -> String {
        self.path_nodes
            .last()
            .map(|node| node.node_name(db, false))
            .unwrap_or_default()
    }

    /// Appends one node per launch stage to the launch sequence.
    ///
    /// With `clock_expanded`, the clock network stages are emitted first and
    /// flagged as clock nodes.
    pub fn populate_path(
        &mut self,
        trace: &PathTrace,
        sta: &dyn TimingEngine,
        db: &dyn DesignDatabase,
        ap: AnalysisPoint,
        clock_expanded: bool,
    ) {
        populate_node_list(
            &mut self.path_nodes,
            trace,
            sta,
            db,
            ap,
            0.0,
            clock_expanded,
            NodeList::Launch,
        );
    }

    /// Appends one node per capture stage to the capture sequence, shifting
    /// every arrival by `offset`.
    pub fn populate_capture_path(
        &mut self,
        trace: &PathTrace,
        sta: &dyn TimingEngine,
        db: &dyn DesignDatabase,
        ap: AnalysisPoint,
        offset: f64,
        clock_expanded: bool,
    ) {
        populate_node_list(
            &mut self.capture_nodes,
            trace,
            sta,
            db,
            ap,
            offset,
            clock_expanded,
            NodeList::Capture,
        );
    }

    /// Records where the leading clock-network run ends in both sequences.
    pub fn compute_clk_end_index(&mut self) {
        self.clk_path_end_index = clock_prefix_end(&self.path_nodes);
        self.clk_capture_end_index = clock_prefix_end(&self.capture_nodes);
    }

    /// Copies the path slack onto every node of both sequences.
    pub fn set_slack_on_path_nodes(&mut self) {
        let slack = self.slack;
        for node in self
            .path_nodes
            .iter_mut()
            .chain(self.capture_nodes.iter_mut())
        {
            node.set_path_slack(slack);
        }
    }

    /// Pairs clock nodes of the capture sequence with the launch clock nodes
    /// on the same pin (the clock network shared by launch and capture).
    ///
    /// Existing pairings are replaced.
    pub fn pair_common_clock_nodes(&mut self) {
        for node in self
            .path_nodes
            .iter_mut()
            .chain(self.capture_nodes.iter_mut())
        {
            node.clear_paired_nodes();
        }

        let mut pairs = Vec::new();
        for (ci, capture) in self.capture_nodes.iter().enumerate() {
            if !capture.is_clock() {
                continue;
            }
            let launch = self
                .path_nodes
                .iter()
                .position(|n| n.is_clock() && n.sta_pin() == capture.sta_pin());
            if let Some(li) = launch {
                pairs.push((li, ci));
            }
        }

        for (li, ci) in pairs {
            self.path_nodes[li].add_paired_node(NodeRef::new(NodeList::Capture, ci));
            self.capture_nodes[ci].add_paired_node(NodeRef::new(NodeList::Launch, li));
        }
    }
}

fn clock_prefix_end(nodes: &[PathNode]) -> Option<usize> {
    nodes
        .iter()
        .take_while(|node| node.is_clock())
        .count()
        .checked_sub(1)
}

/// Walks `trace` and appends one node per stage to `nodes`.
///
/// Stage delay is the arrival difference to the previous emitted stage.
/// Stages whose pin the design database does not know are dropped. Instance
/// links index into the whole sequence, including nodes already present.
#[allow(clippy::too_many_arguments)]
fn populate_node_list(
    nodes: &mut Vec<PathNode>,
    trace: &PathTrace,
    sta: &dyn TimingEngine,
    db: &dyn DesignDatabase,
    ap: AnalysisPoint,
    offset: f64,
    clock_expanded: bool,
    list: NodeList,
) {
    let mut first_on_instance: HashMap<InstanceId, usize> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        if let Some(instance) = node.instance() {
            first_on_instance.entry(instance).or_insert(index);
        }
    }
    let mut prev_arrival: Option<f64> = None;

    for (in_clock_section, stage) in trace.stages(clock_expanded) {
        let Some(db_pin) = db.db_pin(stage.pin) else {
            tracing::trace!(pin = stage.pin.as_raw(), "skipping stage outside the design");
            continue;
        };

        let delay = prev_arrival.map_or(0.0, |prev| stage.arrival - prev);
        prev_arrival = Some(stage.arrival);

        let flags = NodeFlags {
            is_clock: in_clock_section || sta.is_clock_pin(stage.pin),
            is_rising: stage.rising,
            is_sink: !db.is_driver(stage.pin),
        };
        let values = StageValues {
            arrival: stage.arrival + offset,
            delay,
            slew: sta.slew(stage.pin, ap),
            load: sta.load(stage.pin, ap),
        };
        let mut node = PathNode::with_values(db_pin, stage.pin, flags, values);

        if node.is_source() {
            if let Some(net) = db.pin_net(stage.pin) {
                node.set_fanout(db.net_loads(net).len());
            }
        }
        if let DbPin::InstanceTerm { instance } = db_pin {
            let index = nodes.len();
            let first = *first_on_instance.entry(instance).or_insert(index);
            node.set_instance_node(NodeRef::new(list, first));
        }

        nodes.push(node);
    }
}

//! Reference static timing engine.
//!
//! [`StaEngine`] owns a [`TimingGraph`] and its clock constraints. Calling
//! [`StaEngine::update_timing`] propagates clock and data arrivals for every
//! corner in both analysis directions, derives required times at register
//! data pins from setup and hold checks, and back-propagates required times
//! so every pin on a constrained path carries a slack.
//!
//! The engine answers path searches with ordered through-sets by relaxing
//! over (pin, number of through-sets satisfied) states and backtracking the
//! worst arrival per endpoint. It implements both [`TimingEngine`] and
//! [`DesignDatabase`], which makes it the collaborator used by the tests of
//! the path and cone extraction code.

use crate::constraints::TimingConstraints;
use crate::engine::{
    AnalysisPoint, DbPin, DesignDatabase, MinMax, PathRecord, PathSearch, PathStage, PathTrace,
    PinTiming, TimingEngine,
};
use crate::graph::{TimingEdge, TimingEdgeType, TimingGraph};
use crate::ids::{CornerId, InstanceId, NetId, PinId, TimingEdgeId};
use stave_common::{InternalError, Interner, StaveResult};
use stave_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use std::collections::{HashMap, HashSet};

/// Reported when relaxation does not settle (a combinational loop).
const LOOP_CODE: DiagnosticCode = DiagnosticCode::new(Category::Error, 1);
/// Reported for a register clock pin no clock reaches.
const UNCLOCKED_CODE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);
/// Reported when an analysis point has negative worst slack.
const VIOLATION_CODE: DiagnosticCode = DiagnosticCode::new(Category::Timing, 10);
/// Noted for an endpoint without a timing check.
const UNCONSTRAINED_CODE: DiagnosticCode = DiagnosticCode::new(Category::Timing, 20);

/// A worst arrival at a pin and the edge it came through.
#[derive(Debug, Clone, Copy)]
struct Arrival {
    time: f64,
    rising: bool,
    via: Option<TimingEdgeId>,
}

/// A timing check at a register data pin.
#[derive(Debug, Clone, Copy)]
struct Check {
    clock: usize,
    capture_pin: PinId,
    required: f64,
}

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    pin: PinId,
    arrival: f64,
    /// `None` for unconstrained endpoints (output ports, unclocked checks).
    check: Option<Check>,
}

/// Propagation results of one analysis point.
#[derive(Debug, Clone, Default)]
struct Propagation {
    clock: Vec<Option<Arrival>>,
    data: Vec<Option<Arrival>>,
    required: Vec<Option<f64>>,
    endpoints: Vec<Endpoint>,
}

/// A state of the through-set path search.
#[derive(Debug, Clone, Copy)]
struct Reach {
    time: f64,
    rising: bool,
    /// Incoming edge and the number of through-sets satisfied before it.
    via: Option<(TimingEdgeId, usize)>,
}

/// A static timing engine over a netlist-level [`TimingGraph`].
pub struct StaEngine {
    graph: TimingGraph,
    constraints: TimingConstraints,
    interner: Interner,
    /// Index of the clock reaching each clock-network pin.
    clock_of: Vec<Option<usize>>,
    results: HashMap<AnalysisPoint, Propagation>,
}

impl StaEngine {
    /// Creates an engine and traces the clock network. Timing is not
    /// computed until [`StaEngine::update_timing`] runs.
    pub fn new(graph: TimingGraph, constraints: TimingConstraints, interner: Interner) -> Self {
        let clock_of = trace_clock_network(&graph, &constraints);
        Self {
            graph,
            constraints,
            interner,
            clock_of,
            results: HashMap::new(),
        }
    }

    /// The underlying timing graph.
    pub fn graph(&self) -> &TimingGraph {
        &self.graph
    }

    /// The clock constraints.
    pub fn constraints(&self) -> &TimingConstraints {
        &self.constraints
    }

    /// The interner holding clock names.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Returns `true` once [`StaEngine::update_timing`] has produced results.
    pub fn is_timing_updated(&self) -> bool {
        !self.results.is_empty()
    }

    /// Propagates timing for every corner and direction.
    ///
    /// Findings go to `sink`: loops and unclocked registers, violated
    /// checks, and a note per unconstrained endpoint. An `Err` means the graph itself is malformed.
    pub fn update_timing(&mut self, sink: &DiagnosticSink) -> StaveResult<()> {
        if let Err(edge) = self.graph.validate() {
            return Err(InternalError::new(format!(
                "timing edge {} references a pin outside the graph",
                edge.id.as_raw()
            )));
        }

        self.results.clear();
        self.report_unclocked_registers(sink);

        let corners: Vec<(CornerId, f64)> =
            self.graph.corners.iter().map(|c| (c.id, c.derate)).collect();
        for (corner, derate) in corners {
            for min_max in [MinMax::Max, MinMax::Min] {
                let ap = AnalysisPoint::new(corner, min_max);
                let propagation = self.propagate(ap, derate, sink);
                self.report_violations(ap, &propagation, sink);
                self.results.insert(ap, propagation);
            }
        }
        // Endpoint checks do not depend on the analysis point.
        if let Some(propagation) = self
            .default_corner()
            .and_then(|corner| self.results.get(&AnalysisPoint::new(corner, MinMax::Max)))
        {
            self.report_unconstrained_endpoints(propagation, sink);
        }

        tracing::debug!(
            pins = self.graph.pin_count(),
            edges = self.graph.edge_count(),
            analysis_points = self.results.len(),
            "timing updated"
        );
        Ok(())
    }

    /// Worst slack over all constrained endpoints, or `None` if nothing is
    /// constrained or timing is not updated.
    pub fn worst_slack(&self, ap: AnalysisPoint) -> Option<f64> {
        let propagation = self.results.get(&ap)?;
        worst_endpoint(ap.min_max, propagation).map(|(_, slack)| slack)
    }

    fn derate(&self, corner: CornerId) -> f64 {
        self.graph.corner(corner).map_or(1.0, |c| c.derate)
    }

    fn clock_name(&self, clock: usize) -> Option<String> {
        self.constraints
            .clocks
            .get(clock)
            .map(|c| self.interner.resolve(c.name).to_string())
    }

    fn is_register_clock_pin(&self, pin: PinId) -> bool {
        self.graph
            .outgoing_edges(pin)
            .any(|e| e.edge_type == TimingEdgeType::ClockToQ)
    }

    fn is_clock_edge(&self, edge: &TimingEdge) -> bool {
        propagates_clock(edge)
            && self.clock_of[edge.from.index()].is_some()
            && self.clock_of[edge.to.index()].is_some()
    }

    /// Data edges stop at the clock network and never include checks.
    fn is_data_edge(&self, edge: &TimingEdge) -> bool {
        !edge.is_check() && self.clock_of[edge.to.index()].is_none()
    }

    fn propagate(&self, ap: AnalysisPoint, derate: f64, sink: &DiagnosticSink) -> Propagation {
        let n = self.graph.pin_count();
        let min_max = ap.min_max;

        let mut clock: Vec<Option<Arrival>> = vec![None; n];
        for def in &self.constraints.clocks {
            if let Some(slot) = clock.get_mut(def.source.index()) {
                slot.get_or_insert(Arrival {
                    time: 0.0,
                    rising: true,
                    via: None,
                });
            }
        }
        let clock_settled = relax(&self.graph, min_max, derate, &mut clock, |e| {
            self.is_clock_edge(e)
        });

        // Registers launch at their clock arrival; unclocked ones at zero.
        let mut data: Vec<Option<Arrival>> = vec![None; n];
        for pin in &self.graph.pins {
            let i = pin.id.index();
            let seed = if self.is_register_clock_pin(pin.id) {
                Some(clock[i].map_or((0.0, true), |a| (a.time, a.rising)))
            } else if self.graph.is_driver(pin.id)
                && pin.owner == DbPin::BoundaryTerm
                && self.clock_of[i].is_none()
            {
                Some((0.0, true))
            } else {
                None
            };
            data[i] = seed.map(|(time, rising)| Arrival {
                time,
                rising,
                via: None,
            });
        }
        let data_settled = relax(&self.graph, min_max, derate, &mut data, |e| {
            self.is_data_edge(e)
        });

        if !(clock_settled && data_settled) {
            sink.emit(
                Diagnostic::error(LOOP_CODE, "arrival times do not converge")
                    .with_subject(self.corner_label(ap))
                    .with_note("the timing graph contains a combinational loop"),
            );
        }

        let endpoints = self.collect_endpoints(ap, derate, &clock, &data);
        let required = self.propagate_required(min_max, derate, &data, &endpoints);

        tracing::trace!(
            corner = ap.corner.as_raw(),
            max = min_max.is_max(),
            endpoints = endpoints.len(),
            "analysis point propagated"
        );

        Propagation {
            clock,
            data,
            required,
            endpoints,
        }
    }

    fn collect_endpoints(
        &self,
        ap: AnalysisPoint,
        derate: f64,
        clock: &[Option<Arrival>],
        data: &[Option<Arrival>],
    ) -> Vec<Endpoint> {
        let check_type = match ap.min_max {
            MinMax::Max => TimingEdgeType::SetupCheck,
            MinMax::Min => TimingEdgeType::HoldCheck,
        };

        let mut endpoints = Vec::new();
        for pin in &self.graph.pins {
            let Some(arrival) = data[pin.id.index()] else {
                continue;
            };
            let check_edge = self
                .graph
                .incoming_edges(pin.id)
                .find(|e| e.edge_type == check_type);

            if let Some(edge) = check_edge {
                let capture = self.clock_of[edge.from.index()].zip(clock[edge.from.index()]);
                let check = capture.and_then(|(index, capture)| {
                    let period = self.constraints.clocks.get(index)?.period_ns;
                    let margin = edge.delay.select(ap.min_max) * derate;
                    let required = match ap.min_max {
                        MinMax::Max => capture.time + period - margin,
                        MinMax::Min => capture.time + margin,
                    };
                    Some(Check {
                        clock: index,
                        capture_pin: edge.from,
                        required,
                    })
                });
                endpoints.push(Endpoint {
                    pin: pin.id,
                    arrival: arrival.time,
                    check,
                });
            } else if self.graph.is_output_port(pin.id) {
                endpoints.push(Endpoint {
                    pin: pin.id,
                    arrival: arrival.time,
                    check: None,
                });
            }
        }
        endpoints
    }

    /// Backward propagation of required times along data edges.
    fn propagate_required(
        &self,
        min_max: MinMax,
        derate: f64,
        data: &[Option<Arrival>],
        endpoints: &[Endpoint],
    ) -> Vec<Option<f64>> {
        let mut required: Vec<Option<f64>> = vec![None; self.graph.pin_count()];
        for endpoint in endpoints {
            if let Some(check) = endpoint.check {
                required[endpoint.pin.index()] = Some(check.required);
            }
        }

        for _ in 0..=self.graph.pin_count() {
            let mut changed = false;
            for edge in self.graph.edges.iter().filter(|e| self.is_data_edge(e)) {
                let Some(downstream) = required[edge.to.index()] else {
                    continue;
                };
                if data[edge.from.index()].is_none() {
                    continue;
                }
                let candidate = downstream - edge.delay.select(min_max) * derate;
                let slot = &mut required[edge.from.index()];
                let tighter = match (*slot, min_max) {
                    (None, _) => true,
                    (Some(r), MinMax::Max) => candidate < r,
                    (Some(r), MinMax::Min) => candidate > r,
                };
                if tighter {
                    *slot = Some(candidate);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        required
    }

    fn report_unclocked_registers(&self, sink: &DiagnosticSink) {
        for pin in &self.graph.pins {
            if self.is_register_clock_pin(pin.id) && self.clock_of[pin.id.index()].is_none() {
                sink.emit(
                    Diagnostic::warning(UNCLOCKED_CODE, "register clock pin is not reached by any clock")
                        .with_subject(self.graph.full_name(pin.id))
                        .with_note("paths launched or captured here are unconstrained"),
                );
            }
        }
    }

    fn report_unconstrained_endpoints(&self, propagation: &Propagation, sink: &DiagnosticSink) {
        for endpoint in propagation.endpoints.iter().filter(|ep| ep.check.is_none()) {
            sink.emit(
                Diagnostic::note(UNCONSTRAINED_CODE, "endpoint has no timing check")
                    .with_subject(self.graph.full_name(endpoint.pin)),
            );
        }
    }

    fn report_violations(&self, ap: AnalysisPoint, propagation: &Propagation, sink: &DiagnosticSink) {
        let Some((endpoint, slack)) = worst_endpoint(ap.min_max, propagation) else {
            return;
        };
        if slack < 0.0 {
            sink.emit(
                Diagnostic::warning(
                    VIOLATION_CODE,
                    format!(
                        "timing not met at {}: worst negative slack = {:.3} ns",
                        self.corner_label(ap),
                        slack
                    ),
                )
                .with_subject(self.graph.full_name(endpoint)),
            );
        }
    }

    fn corner_label(&self, ap: AnalysisPoint) -> String {
        let corner = self.corner_name(ap.corner).unwrap_or("?");
        let direction = if ap.min_max.is_max() { "max" } else { "min" };
        format!("corner '{corner}' ({direction})")
    }

    /// Clock network stages from the root up to, not including, `pin`.
    ///
    /// A looped clock network leaves cyclic back-pointers; the trace stops at
    /// the first repeated pin.
    fn clock_stages_to(&self, propagation: &Propagation, pin: PinId) -> Vec<PathStage> {
        let mut stages = Vec::new();
        let mut seen = HashSet::from([pin]);
        let mut via = propagation.clock[pin.index()].and_then(|a| a.via);
        while let Some(edge) = via {
            let from = self.graph.edge(edge).from;
            if !seen.insert(from) {
                tracing::trace!(pin = from.as_raw(), "clock trace cut at loop");
                break;
            }
            let Some(arrival) = propagation.clock[from.index()] else {
                break;
            };
            stages.push(PathStage {
                pin: from,
                rising: arrival.rising,
                arrival: arrival.time,
            });
            via = arrival.via;
        }
        stages.reverse();
        stages
    }

    /// Backtracks the search states ending at `endpoint` into a record.
    ///
    /// Returns `None` when the back-pointers cycle, which happens when the
    /// search did not settle on a combinational loop.
    fn build_record(
        &self,
        propagation: &Propagation,
        reach: &[Vec<Option<Reach>>],
        endpoint: &Endpoint,
        end: Reach,
        min_max: MinMax,
    ) -> Option<PathRecord> {
        let mut data_stages = vec![PathStage {
            pin: endpoint.pin,
            rising: end.rising,
            arrival: end.time,
        }];
        let mut seen = HashSet::from([endpoint.pin]);
        let mut start = endpoint.pin;
        let mut start_time = end.time;
        let mut via = end.via;
        while let Some((edge, satisfied)) = via {
            let from = self.graph.edge(edge).from;
            if !seen.insert(from) {
                tracing::debug!(
                    endpoint = %self.graph.full_name(endpoint.pin),
                    "path dropped: backtrack revisits a pin"
                );
                return None;
            }
            let Some(state) = reach[from.index()][satisfied] else {
                break;
            };
            data_stages.push(PathStage {
                pin: from,
                rising: state.rising,
                arrival: state.time,
            });
            start = from;
            start_time = state.time;
            via = state.via;
        }
        data_stages.reverse();

        let launch_clock = self.clock_of[start.index()];
        let launch = PathTrace {
            clock_stages: if launch_clock.is_some() {
                self.clock_stages_to(propagation, start)
            } else {
                Vec::new()
            },
            data_stages,
        };

        let path_delay = end.time - start_time;
        let record = match endpoint.check {
            Some(check) => {
                let capture_ck = propagation.clock[check.capture_pin.index()];
                let capture = PathTrace {
                    clock_stages: self.clock_stages_to(propagation, check.capture_pin),
                    data_stages: capture_ck
                        .map(|a| PathStage {
                            pin: check.capture_pin,
                            rising: a.rising,
                            arrival: a.time,
                        })
                        .into_iter()
                        .collect(),
                };
                let capture_offset = match min_max {
                    MinMax::Max => self
                        .constraints
                        .clocks
                        .get(check.clock)
                        .map_or(0.0, |c| c.period_ns),
                    MinMax::Min => 0.0,
                };
                PathRecord {
                    start_clock: launch_clock.and_then(|c| self.clock_name(c)),
                    end_clock: self.clock_name(check.clock),
                    arrival: end.time,
                    required: check.required,
                    slack: slack_of(min_max, end.time, check.required),
                    path_delay,
                    unconstrained: false,
                    launch,
                    capture: Some(capture),
                    capture_offset,
                }
            }
            None => PathRecord {
                start_clock: launch_clock.and_then(|c| self.clock_name(c)),
                end_clock: None,
                arrival: end.time,
                required: f64::INFINITY,
                slack: f64::INFINITY,
                path_delay,
                unconstrained: true,
                launch,
                capture: None,
                capture_offset: 0.0,
            },
        };
        Some(record)
    }
}

impl TimingEngine for StaEngine {
    fn default_corner(&self) -> Option<CornerId> {
        self.graph.corners.first().map(|c| c.id)
    }

    fn find_corner(&self, name: &str) -> Option<CornerId> {
        self.graph.find_corner(name)
    }

    fn corner_name(&self, corner: CornerId) -> Option<&str> {
        self.graph.corner(corner).map(|c| c.name.as_str())
    }

    fn find_paths(&self, search: &PathSearch<'_>) -> Vec<PathRecord> {
        let Some(propagation) = self.results.get(&search.ap) else {
            tracing::debug!("path search before timing update");
            return Vec::new();
        };
        let min_max = search.ap.min_max;
        let derate = self.derate(search.ap.corner);
        let thru_count = search.thrus.len();
        let advance = |pin: PinId, mut satisfied: usize| {
            while satisfied < thru_count && search.thrus[satisfied].contains(&pin) {
                satisfied += 1;
            }
            satisfied
        };

        let n = self.graph.pin_count();
        let mut reach: Vec<Vec<Option<Reach>>> = vec![vec![None; thru_count + 1]; n];
        for (i, arrival) in propagation.data.iter().enumerate() {
            let Some(arrival) = arrival else {
                continue;
            };
            let pin = PinId::from_raw(i as u32);
            if arrival.via.is_some() || (!search.from.is_empty() && !search.from.contains(&pin)) {
                continue;
            }
            reach[i][advance(pin, 0)] = Some(Reach {
                time: arrival.time,
                rising: arrival.rising,
                via: None,
            });
        }

        for _ in 0..=n {
            let mut changed = false;
            for edge in self.graph.edges.iter().filter(|e| self.is_data_edge(e)) {
                let delay = edge.delay.select(min_max) * derate;
                for satisfied in 0..=thru_count {
                    let Some(from) = reach[edge.from.index()][satisfied] else {
                        continue;
                    };
                    let time = from.time + delay;
                    let slot = &mut reach[edge.to.index()][advance(edge.to, satisfied)];
                    if slot.map_or(true, |r| is_worse(min_max, time, r.time)) {
                        *slot = Some(Reach {
                            time,
                            rising: from.rising != edge.inverting,
                            via: Some((edge.id, satisfied)),
                        });
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let mut records: Vec<PathRecord> = propagation
            .endpoints
            .iter()
            .filter(|ep| search.to.is_empty() || search.to.contains(&ep.pin))
            .filter(|ep| ep.check.is_some() || search.unconstrained)
            .filter_map(|ep| {
                let end = reach[ep.pin.index()][thru_count]?;
                self.build_record(propagation, &reach, ep, end, min_max)
            })
            .collect();
        records.sort_by(|a, b| a.slack.total_cmp(&b.slack));
        records.truncate(search.max_paths);

        tracing::debug!(
            paths = records.len(),
            thrus = thru_count,
            "path search finished"
        );
        records
    }

    fn pin_timing(&self, pin: PinId, ap: AnalysisPoint) -> Option<PinTiming> {
        let propagation = self.results.get(&ap)?;
        let i = pin.index();
        let arrival = propagation
            .data
            .get(i)
            .copied()
            .flatten()
            .or_else(|| propagation.clock.get(i).copied().flatten())?;
        let slack = propagation.required[i].map(|r| slack_of(ap.min_max, arrival.time, r));
        Some(PinTiming {
            arrival: arrival.time,
            rising: arrival.rising,
            slew: self.slew(pin, ap),
            load: self.load(pin, ap),
            slack,
        })
    }

    fn slew(&self, pin: PinId, ap: AnalysisPoint) -> f64 {
        self.graph
            .pin(pin)
            .map_or(0.0, |p| p.slew_ns * self.derate(ap.corner))
    }

    /// Drivers see the summed capacitance of their loads; other pins their
    /// own capacitance.
    fn load(&self, pin: PinId, _ap: AnalysisPoint) -> f64 {
        let Some(p) = self.graph.pin(pin) else {
            return 0.0;
        };
        if !self.graph.is_driver(pin) {
            return p.cap_pf;
        }
        p.net
            .and_then(|net| self.graph.net(net))
            .map_or(0.0, |net| {
                net.loads
                    .iter()
                    .filter_map(|&l| self.graph.pin(l))
                    .map(|l| l.cap_pf)
                    .sum()
            })
    }

    fn is_clock_pin(&self, pin: PinId) -> bool {
        self.clock_of.get(pin.index()).copied().flatten().is_some()
    }

    fn fanin_pins(&self, pin: PinId) -> Vec<PinId> {
        let mut pins = Vec::new();
        for edge in self.graph.incoming_edges(pin).filter(|e| !e.is_check()) {
            if !pins.contains(&edge.from) {
                pins.push(edge.from);
            }
        }
        pins
    }

    fn fanout_pins(&self, pin: PinId) -> Vec<PinId> {
        let mut pins = Vec::new();
        for edge in self.graph.outgoing_edges(pin).filter(|e| !e.is_check()) {
            if !pins.contains(&edge.to) {
                pins.push(edge.to);
            }
        }
        pins
    }
}

impl DesignDatabase for StaEngine {
    fn db_pin(&self, pin: PinId) -> Option<DbPin> {
        self.graph.pin(pin).map(|p| p.owner)
    }

    fn pin_name(&self, pin: PinId) -> Option<&str> {
        self.graph.pin(pin).map(|p| p.name.as_str())
    }

    fn instance_name(&self, instance: InstanceId) -> Option<&str> {
        self.graph.instance(instance).map(|i| i.name.as_str())
    }

    fn instance_master(&self, instance: InstanceId) -> Option<&str> {
        self.graph.instance(instance).map(|i| i.master.as_str())
    }

    fn pin_net(&self, pin: PinId) -> Option<NetId> {
        self.graph.pin(pin).and_then(|p| p.net)
    }

    fn net_name(&self, net: NetId) -> Option<&str> {
        self.graph.net(net).map(|n| n.name.as_str())
    }

    fn net_loads(&self, net: NetId) -> Vec<PinId> {
        self.graph
            .net(net)
            .map(|n| n.loads.clone())
            .unwrap_or_default()
    }

    fn is_driver(&self, pin: PinId) -> bool {
        self.graph.is_driver(pin)
    }
}

/// Marks every pin reachable from a clock source through cell and net
/// delays. The first clock to reach a pin owns it.
fn trace_clock_network(graph: &TimingGraph, constraints: &TimingConstraints) -> Vec<Option<usize>> {
    let mut clock_of = vec![None; graph.pin_count()];
    for (index, clock) in constraints.clocks.iter().enumerate() {
        let mut stack = vec![clock.source];
        while let Some(pin) = stack.pop() {
            let Some(slot) = clock_of.get_mut(pin.index()) else {
                continue;
            };
            if slot.is_some() {
                continue;
            }
            *slot = Some(index);
            stack.extend(
                graph
                    .outgoing_edges(pin)
                    .filter(|e| propagates_clock(e))
                    .map(|e| e.to),
            );
        }
    }
    clock_of
}

fn propagates_clock(edge: &TimingEdge) -> bool {
    matches!(
        edge.edge_type,
        TimingEdgeType::CellDelay | TimingEdgeType::NetDelay
    )
}

fn is_worse(min_max: MinMax, candidate: f64, current: f64) -> bool {
    match min_max {
        MinMax::Max => candidate > current,
        MinMax::Min => candidate < current,
    }
}

fn slack_of(min_max: MinMax, arrival: f64, required: f64) -> f64 {
    match min_max {
        MinMax::Max => required - arrival,
        MinMax::Min => arrival - required,
    }
}

fn worst_endpoint(min_max: MinMax, propagation: &Propagation) -> Option<(PinId, f64)> {
    propagation
        .endpoints
        .iter()
        .filter_map(|ep| {
            ep.check
                .map(|c| (ep.pin, slack_of(min_max, ep.arrival, c.required)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Bellman-Ford style relaxation of worst arrivals along `follow` edges.
///
/// Returns `false` if arrivals still change after one pass per pin.
fn relax(
    graph: &TimingGraph,
    min_max: MinMax,
    derate: f64,
    arrivals: &mut [Option<Arrival>],
    follow: impl Fn(&TimingEdge) -> bool,
) -> bool {
    for _ in 0..=graph.pin_count() {
        let mut changed = false;
        for edge in graph.edges.iter().filter(|e| follow(e)) {
            let Some(from) = arrivals[edge.from.index()] else {
                continue;
            };
            let time = from.time + edge.delay.select(min_max) * derate;
            let slot = &mut arrivals[edge.to.index()];
            if slot.map_or(true, |a| is_worse(min_max, time, a.time)) {
                *slot = Some(Arrival {
                    time,
                    rising: from.rising != edge.inverting,
                    via: Some(edge.id),
                });
                changed = true;
            }
        }
        if !changed {
            return true;
        }
    }
    false
}

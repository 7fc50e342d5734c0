//! Shared netlists for unit tests.

use crate::constraints::TimingConstraints;
use crate::engine::{AnalysisPoint, MinMax};
use crate::graph::{Delay, PinDirection, TimingEdgeType, TimingGraph};
use crate::ids::{CornerId, PinId};
use crate::sta::StaEngine;
use stave_common::Interner;
use stave_diagnostics::DiagnosticSink;

pub(crate) fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Two registers on a buffered clock with an inverter between them.
///
/// ```text
/// clk -> ckbuf -> reg0/CK, reg1/CK        (period 2.0)
/// in1 -> reg0/D    reg0/Q -> u1 -> reg1/D    reg1/Q -> out1
/// ```
pub(crate) struct RegDesign {
    pub engine: StaEngine,
    pub sink: DiagnosticSink,
    pub corner: CornerId,
    pub clk: PinId,
    pub in1: PinId,
    pub out1: PinId,
    pub ckbuf_a: PinId,
    pub ckbuf_z: PinId,
    pub reg0_ck: PinId,
    pub reg0_d: PinId,
    pub reg0_q: PinId,
    pub reg1_ck: PinId,
    pub reg1_d: PinId,
    pub reg1_q: PinId,
    pub u1_a: PinId,
    pub u1_zn: PinId,
    /// Unconnected input, never timed.
    pub spare_a: PinId,
}

impl RegDesign {
    pub fn max_ap(&self) -> AnalysisPoint {
        AnalysisPoint::new(self.corner, MinMax::Max)
    }

    pub fn min_ap(&self) -> AnalysisPoint {
        AnalysisPoint::new(self.corner, MinMax::Min)
    }
}

pub(crate) fn reg_to_reg_design() -> RegDesign {
    reg_to_reg_design_derated(1.0)
}

pub(crate) fn reg_to_reg_design_derated(derate: f64) -> RegDesign {
    let mut g = TimingGraph::new();
    let corner = g.add_corner("typ", derate);
    let wire = Delay::fixed(0.05);

    let clk = g.add_port("clk", PinDirection::Input);
    let in1 = g.add_port("in1", PinDirection::Input);
    let out1 = g.add_port("out1", PinDirection::Output);

    let ckbuf = g.add_instance("ckbuf", "BUF_X1");
    let ckbuf_a = g.add_instance_pin(ckbuf, "A", PinDirection::Input);
    let ckbuf_z = g.add_instance_pin(ckbuf, "Z", PinDirection::Output);
    g.add_edge(ckbuf_a, ckbuf_z, Delay::new(0.1, 0.2), TimingEdgeType::CellDelay);

    let register = |g: &mut TimingGraph, name: &str| {
        let reg = g.add_instance(name, "DFF_X1");
        let d = g.add_instance_pin(reg, "D", PinDirection::Input);
        let ck = g.add_instance_pin(reg, "CK", PinDirection::Input);
        let q = g.add_instance_pin(reg, "Q", PinDirection::Output);
        g.add_edge(ck, q, Delay::new(0.3, 0.4), TimingEdgeType::ClockToQ);
        g.add_edge(ck, d, Delay::fixed(0.1), TimingEdgeType::SetupCheck);
        g.add_edge(ck, d, Delay::fixed(0.05), TimingEdgeType::HoldCheck);
        (d, ck, q)
    };
    let (reg0_d, reg0_ck, reg0_q) = register(&mut g, "reg0");
    let (reg1_d, reg1_ck, reg1_q) = register(&mut g, "reg1");

    let u1 = g.add_instance("u1", "INV_X1");
    let u1_a = g.add_instance_pin(u1, "A", PinDirection::Input);
    let u1_zn = g.add_instance_pin(u1, "ZN", PinDirection::Output);
    g.add_edge_with_sense(
        u1_a,
        u1_zn,
        Delay::new(0.2, 0.5),
        TimingEdgeType::CellDelay,
        true,
    );

    let spare = g.add_instance("spare", "INV_X1");
    let spare_a = g.add_instance_pin(spare, "A", PinDirection::Input);

    g.add_net("clk", clk, &[ckbuf_a], wire);
    g.add_net("clk_buf", ckbuf_z, &[reg0_ck, reg1_ck], wire);
    g.add_net("in1", in1, &[reg0_d], wire);
    g.add_net("n1", reg0_q, &[u1_a], wire);
    g.add_net("n2", u1_zn, &[reg1_d], wire);
    g.add_net("out1", reg1_q, &[out1], wire);

    for pin in [clk, in1, ckbuf_z, reg0_q, reg1_q] {
        g.set_pin_electrical(pin, 0.02, 0.0);
    }
    g.set_pin_electrical(u1_zn, 0.03, 0.0);
    g.set_pin_electrical(ckbuf_a, 0.02, 0.003);
    g.set_pin_electrical(reg0_ck, 0.025, 0.001);
    g.set_pin_electrical(reg1_ck, 0.025, 0.001);
    g.set_pin_electrical(reg0_d, 0.02, 0.002);
    g.set_pin_electrical(reg1_d, 0.03, 0.002);
    g.set_pin_electrical(u1_a, 0.02, 0.004);
    g.set_pin_electrical(out1, 0.02, 0.01);

    let interner = Interner::new();
    let mut constraints = TimingConstraints::new();
    constraints.add_clock(interner.get_or_intern("clk"), 2.0, clk);

    let mut engine = StaEngine::new(g, constraints, interner);
    let sink = DiagnosticSink::new();
    if let Err(err) = engine.update_timing(&sink) {
        panic!("fixture failed to time: {err}");
    }

    RegDesign {
        engine,
        sink,
        corner,
        clk,
        in1,
        out1,
        ckbuf_a,
        ckbuf_z,
        reg0_ck,
        reg0_d,
        reg0_q,
        reg1_ck,
        reg1_d,
        reg1_q,
        u1_a,
        u1_zn,
        spare_a,
    }
}

/// Pins of a reconvergent netlist: `q` fans out to `a` and `b`, which both
/// feed `c`.
pub(crate) struct Diamond {
    pub engine: StaEngine,
    pub q: PinId,
    pub a: PinId,
    pub b: PinId,
    pub c: PinId,
}

pub(crate) fn diamond() -> Diamond {
    let mut g = TimingGraph::new();
    g.add_corner("typ", 1.0);
    let drv = g.add_instance("drv", "BUF_X1");
    let q = g.add_instance_pin(drv, "Z", PinDirection::Output);
    let and = g.add_instance("and0", "AND2_X1");
    let a = g.add_instance_pin(and, "A1", PinDirection::Input);
    let b = g.add_instance_pin(and, "A2", PinDirection::Input);
    let c = g.add_instance_pin(and, "ZN", PinDirection::Output);
    g.add_net("n0", q, &[a, b], Delay::fixed(0.01));
    g.add_edge(a, c, Delay::fixed(0.1), TimingEdgeType::CellDelay);
    g.add_edge(b, c, Delay::fixed(0.1), TimingEdgeType::CellDelay);

    Diamond {
        engine: StaEngine::new(g, TimingConstraints::new(), Interner::new()),
        q,
        a,
        b,
        c,
    }
}

/// Two inverters wired into a ring; returns the engine and the ring pins
/// in signal order.
pub(crate) fn ring() -> (StaEngine, Vec<PinId>) {
    let mut g = TimingGraph::new();
    g.add_corner("typ", 1.0);
    let mut pins = Vec::new();
    for name in ["u0", "u1"] {
        let inst = g.add_instance(name, "INV_X1");
        let a = g.add_instance_pin(inst, "A", PinDirection::Input);
        let zn = g.add_instance_pin(inst, "ZN", PinDirection::Output);
        g.add_edge_with_sense(a, zn, Delay::fixed(0.1), TimingEdgeType::CellDelay, true);
        pins.extend([a, zn]);
    }
    g.add_net("n0", pins[1], &[pins[2]], Delay::ZERO);
    g.add_net("n1", pins[3], &[pins[0]], Delay::ZERO);
    (
        StaEngine::new(g, TimingConstraints::new(), Interner::new()),
        pins,
    )
}

/// Two registers on an ideal clock whose data pins are fed identically, so
/// both endpoints end up with the same slack. `regb` is built first and its
/// data pin has the lower id.
pub(crate) struct TwinCapture {
    pub engine: StaEngine,
    pub regb_d: PinId,
    pub rega_d: PinId,
}

pub(crate) fn twin_capture() -> TwinCapture {
    let mut g = TimingGraph::new();
    g.add_corner("typ", 1.0);
    let clk = g.add_port("clk", PinDirection::Input);

    let mut data_pins = Vec::new();
    let mut clock_pins = Vec::new();
    for name in ["regb", "rega"] {
        let port = g.add_port(format!("in_{name}"), PinDirection::Input);
        let reg = g.add_instance(name, "DFF_X1");
        let d = g.add_instance_pin(reg, "D", PinDirection::Input);
        let ck = g.add_instance_pin(reg, "CK", PinDirection::Input);
        g.add_edge(ck, d, Delay::fixed(0.1), TimingEdgeType::SetupCheck);
        g.add_edge(ck, d, Delay::fixed(0.05), TimingEdgeType::HoldCheck);
        g.add_net(format!("in_{name}"), port, &[d], Delay::fixed(0.2));
        data_pins.push(d);
        clock_pins.push(ck);
    }
    g.add_net("clk", clk, &clock_pins, Delay::ZERO);

    let interner = Interner::new();
    let mut constraints = TimingConstraints::new();
    constraints.add_clock(interner.get_or_intern("clk"), 1.0, clk);

    let mut engine = StaEngine::new(g, constraints, interner);
    if let Err(err) = engine.update_timing(&DiagnosticSink::new()) {
        panic!("fixture failed to time: {err}");
    }
    TwinCapture {
        engine,
        regb_d: data_pins[0],
        rega_d: data_pins[1],
    }
}

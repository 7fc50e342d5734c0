//! The path and cone query facade.
//!
//! A [`PathQuery`] borrows a timing engine and a design database and owns a
//! [`SessionConfig`]. Every query resolves the configured analysis point,
//! asks the engine for raw results, and converts them into [`TimingPath`]s
//! or cone maps of [`PathNode`]s that a viewer can render directly.

use crate::cone::{
    annotate_levels, bare_node, build_levels, link_levels, trace_cone, ConeDepthMap,
    ConeDepthMapPinSet, ConeDirection,
};
use crate::engine::{
    AnalysisPoint, DesignDatabase, MinMax, PathRecord, PathSearch, PinSet, TimingEngine,
};
use crate::error::QueryError;
use crate::ids::PinId;
use crate::node::PathNode;
use crate::path::TimingPath;
use stave_config::SessionConfig;
use std::collections::HashMap;

/// Query session over a timing engine and a design database.
///
/// The engine and database are borrowed, so both must outlive the session.
/// Settings changed through the setters apply to subsequent queries only.
#[derive(Clone, Default)]
pub struct PathQuery<'a> {
    sta: Option<&'a dyn TimingEngine>,
    db: Option<&'a dyn DesignDatabase>,
    config: SessionConfig,
}

impl<'a> PathQuery<'a> {
    /// Creates a session with default settings and nothing attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session over `sta` and `db` with default settings.
    pub fn with_engine(sta: &'a dyn TimingEngine, db: &'a dyn DesignDatabase) -> Self {
        Self {
            sta: Some(sta),
            db: Some(db),
            config: SessionConfig::default(),
        }
    }

    /// Creates a session with the given settings and nothing attached.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Attaches the timing engine.
    pub fn set_sta(&mut self, sta: &'a dyn TimingEngine) {
        self.sta = Some(sta);
    }

    /// Attaches the design database.
    pub fn set_design(&mut self, db: &'a dyn DesignDatabase) {
        self.db = Some(db);
    }

    /// The current session settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replaces all session settings.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    /// Restores the default session settings.
    pub fn reset_config(&mut self) {
        self.config = SessionConfig::default();
    }

    /// Name of the configured corner; `None` means the engine's default.
    pub fn corner(&self) -> Option<&str> {
        self.config.corner.as_deref()
    }

    /// Selects a corner by name, or the engine's default with `None`.
    pub fn set_corner(&mut self, corner: Option<String>) {
        self.config.corner = corner;
    }

    /// Whether the max (setup) direction is analyzed.
    pub fn use_max(&self) -> bool {
        self.config.use_max
    }

    /// Selects the max (setup) or min (hold) direction.
    pub fn set_use_max(&mut self, use_max: bool) {
        self.config.use_max = use_max;
    }

    /// Upper bound on paths returned by one query.
    pub fn max_path_count(&self) -> usize {
        self.config.max_path_count
    }

    /// Sets the upper bound on paths returned by one query.
    pub fn set_max_path_count(&mut self, count: usize) {
        self.config.max_path_count = count;
    }

    /// Whether unconstrained paths are returned.
    pub fn include_unconstrained_paths(&self) -> bool {
        self.config.include_unconstrained_paths
    }

    /// Sets whether unconstrained paths are returned.
    pub fn set_include_unconstrained_paths(&mut self, include: bool) {
        self.config.include_unconstrained_paths = include;
    }

    /// Whether capture clock paths are populated.
    pub fn include_capture_paths(&self) -> bool {
        self.config.include_capture_paths
    }

    /// Sets whether capture clock paths are populated.
    pub fn set_include_capture_paths(&mut self, include: bool) {
        self.config.include_capture_paths = include;
    }

    /// Whether clock network stages are emitted as a path prefix.
    pub fn clock_expanded(&self) -> bool {
        self.config.clock_expanded
    }

    /// Sets whether clock network stages are emitted as a path prefix.
    pub fn set_clock_expanded(&mut self, expanded: bool) {
        self.config.clock_expanded = expanded;
    }

    fn engine(&self) -> Result<&'a dyn TimingEngine, QueryError> {
        self.sta.ok_or(QueryError::NoTimingEngine)
    }

    fn design(&self) -> Result<&'a dyn DesignDatabase, QueryError> {
        self.db.ok_or(QueryError::NoDesign)
    }

    /// Resolves the configured corner and direction.
    pub fn analysis_point(&self) -> Result<AnalysisPoint, QueryError> {
        let sta = self.engine()?;
        let corner = match &self.config.corner {
            Some(name) => sta
                .find_corner(name)
                .ok_or_else(|| QueryError::UnknownCorner(name.clone()))?,
            None => sta.default_corner().ok_or(QueryError::NoCorners)?,
        };
        Ok(AnalysisPoint::new(
            corner,
            MinMax::from_use_max(self.config.use_max),
        ))
    }

    /// Finds the worst paths matching the startpoint, through, and endpoint
    /// constraints. Empty sets do not constrain.
    ///
    /// Paths come back worst slack first; equal slacks keep the engine's
    /// order. At most `max_path_count` paths are returned.
    pub fn get_timing_paths(
        &self,
        from: &PinSet,
        thrus: &[PinSet],
        to: &PinSet,
    ) -> Result<Vec<TimingPath>, QueryError> {
        self.find_timing_paths(from, thrus, to, self.config.max_path_count)
    }

    /// Finds the worst paths through `pin`, including paths that start or
    /// end there.
    pub fn get_timing_paths_through(&self, pin: PinId) -> Result<Vec<TimingPath>, QueryError> {
        let none = PinSet::new();
        self.get_timing_paths(&none, &[PinSet::from([pin])], &none)
    }

    fn find_timing_paths(
        &self,
        from: &PinSet,
        thrus: &[PinSet],
        to: &PinSet,
        max_paths: usize,
    ) -> Result<Vec<TimingPath>, QueryError> {
        let sta = self.engine()?;
        let db = self.design()?;
        let ap = self.analysis_point()?;

        let include_unconstrained = self.config.include_unconstrained_paths;
        let records = sta.find_paths(&PathSearch {
            from,
            thrus,
            to,
            ap,
            max_paths,
            unconstrained: include_unconstrained,
        });

        let mut paths: Vec<TimingPath> = records
            .iter()
            .filter(|record| include_unconstrained || !record.unconstrained)
            .map(|record| self.timing_path(record, sta, db, ap))
            .collect();
        paths.sort_by(|a, b| a.slack().total_cmp(&b.slack()));
        paths.truncate(max_paths);

        tracing::debug!(
            found = records.len(),
            returned = paths.len(),
            max = ap.min_max.is_max(),
            "timing paths collected"
        );
        Ok(paths)
    }

    fn timing_path(
        &self,
        record: &PathRecord,
        sta: &dyn TimingEngine,
        db: &dyn DesignDatabase,
        ap: AnalysisPoint,
    ) -> TimingPath {
        let expanded = self.config.clock_expanded;
        let mut path = TimingPath::from_record(record);
        path.populate_path(&record.launch, sta, db, ap, expanded);
        if self.config.include_capture_paths {
            if let Some(capture) = &record.capture {
                path.populate_capture_path(capture, sta, db, ap, record.capture_offset, expanded);
            }
        }
        path.compute_clk_end_index();
        path.set_slack_on_path_nodes();
        path.pair_common_clock_nodes();
        path
    }

    /// Snapshot of one pin's current timing.
    ///
    /// A pin the engine has no timing for yields a node with
    /// `has_values() == false` and zeroed values.
    pub fn get_timing_node(&self, pin: PinId) -> Result<PathNode, QueryError> {
        let sta = self.engine()?;
        let db = self.design()?;
        let ap = self.analysis_point()?;
        let mut node = bare_node(sta, db, pin).ok_or(QueryError::UnknownPin(pin))?;
        if let Some(timing) = sta.pin_timing(pin, ap) {
            node.apply_timing(&timing);
        }
        Ok(node)
    }

    /// Everything feeding `pin`, layered by distance.
    pub fn get_fanin_cone(&self, pin: PinId) -> Result<ConeDepthMapPinSet, QueryError> {
        self.get_cone(pin, None, true)
    }

    /// Everything `pin` drives, layered by distance.
    pub fn get_fanout_cone(&self, pin: PinId) -> Result<ConeDepthMapPinSet, QueryError> {
        self.get_cone(pin, None, false)
    }

    /// Fanin or fanout cone of `pin`, optionally restricted to `bounding`.
    pub fn get_cone(
        &self,
        pin: PinId,
        bounding: Option<&PinSet>,
        is_fanin: bool,
    ) -> Result<ConeDepthMapPinSet, QueryError> {
        let sta = self.engine()?;
        let cone = trace_cone(sta, pin, bounding, ConeDirection::from_is_fanin(is_fanin));
        tracing::debug!(
            seed = pin.as_raw(),
            fanin = is_fanin,
            depth = cone.len(),
            pins = cone.values().map(|level| level.len()).sum::<usize>(),
            "cone traced"
        );
        Ok(cone)
    }

    /// Converts a layered cone into linked, timed nodes.
    ///
    /// Each node is paired with its neighbors one level deeper, and timing
    /// is filled in as by [`PathQuery::annotate_cone_timing`].
    pub fn build_cone_connectivity(
        &self,
        pin: PinId,
        depth_map: &ConeDepthMapPinSet,
    ) -> Result<ConeDepthMap, QueryError> {
        let sta = self.engine()?;
        let db = self.design()?;
        let mut levels = build_levels(sta, db, depth_map);
        link_levels(sta, &mut levels);
        self.annotate_cone_timing(pin, &mut levels)?;
        Ok(levels)
    }

    /// Fills timing into the nodes of a cone around `pin`.
    ///
    /// Every node gets the engine's live readout for its pin. Nodes on the
    /// worst path through `pin` then take that path's values, which adds
    /// stage delays and makes the slack the one of the path being inspected.
    pub fn annotate_cone_timing(&self, pin: PinId, map: &mut ConeDepthMap) -> Result<(), QueryError> {
        let sta = self.engine()?;
        let ap = self.analysis_point()?;
        annotate_levels(sta, ap, map);

        let none = PinSet::new();
        let worst = self.find_timing_paths(&none, &[PinSet::from([pin])], &none, 1)?;
        if let Some(path) = worst.first() {
            let on_path: HashMap<PinId, &PathNode> = path
                .path_nodes()
                .iter()
                .map(|node| (node.sta_pin(), node))
                .collect();
            for node in map.values_mut().flatten() {
                if let Some(path_node) = on_path.get(&node.sta_pin()) {
                    path_node.copy_data(node);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::TimingConstraints;
    use crate::graph::{PinDirection, TimingGraph};
    use crate::node::{NodeList, NodeRef};
    use crate::sta::StaEngine;
    use crate::test_support::{approx, reg_to_reg_design, twin_capture};
    use stave_common::Interner;
    use stave_config::load_config_from_str;

    fn end_pin(path: &TimingPath) -> PinId {
        path.path_nodes().last().unwrap().sta_pin()
    }

    #[test]
    fn missing_collaborators() {
        let d = reg_to_reg_design();
        let none = PinSet::new();

        let q = PathQuery::new();
        assert_eq!(
            q.get_timing_paths(&none, &[], &none).unwrap_err(),
            QueryError::NoTimingEngine
        );
        assert_eq!(q.get_fanin_cone(d.u1_a).unwrap_err(), QueryError::NoTimingEngine);

        let mut q = PathQuery::new();
        q.set_sta(&d.engine);
        assert_eq!(
            q.get_timing_paths(&none, &[], &none).unwrap_err(),
            QueryError::NoDesign
        );
        assert_eq!(q.get_timing_node(d.u1_a).unwrap_err(), QueryError::NoDesign);
        // cones only need the engine
        assert_eq!(q.get_fanout_cone(d.u1_a).unwrap().len(), 3);

        q.set_design(&d.engine);
        assert!(q.get_timing_paths(&none, &[], &none).is_ok());
    }

    #[test]
    fn corner_resolution() {
        let d = reg_to_reg_design();
        let mut q = PathQuery::with_engine(&d.engine, &d.engine);
        assert_eq!(q.analysis_point().unwrap(), d.max_ap());

        q.set_corner(Some("typ".into()));
        q.set_use_max(false);
        assert_eq!(q.analysis_point().unwrap(), d.min_ap());

        q.set_corner(Some("slow".into()));
        assert_eq!(
            q.get_timing_paths_through(d.u1_a).unwrap_err(),
            QueryError::UnknownCorner("slow".into())
        );

        let mut graph = TimingGraph::new();
        graph.add_port("a", PinDirection::Input);
        let bare = StaEngine::new(graph, TimingConstraints::new(), Interner::new());
        let q = PathQuery::with_engine(&bare, &bare);
        assert_eq!(q.analysis_point().unwrap_err(), QueryError::NoCorners);
    }

    #[test]
    fn default_session_paths() {
        let d = reg_to_reg_design();
        let q = PathQuery::with_engine(&d.engine, &d.engine);
        let none = PinSet::new();
        let paths = q.get_timing_paths(&none, &[], &none).unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(end_pin(&paths[0]), d.reg1_d);
        assert_eq!(end_pin(&paths[1]), d.reg0_d);
        assert!(paths[0].slack() <= paths[1].slack());

        let worst = &paths[0];
        assert_eq!(worst.path_nodes().len(), 8);
        assert!(worst.capture_nodes().is_empty());
        assert_eq!(worst.clk_path_end_index(), Some(3));
        assert_eq!(worst.clk_capture_end_index(), None);
        assert_eq!(worst.start_clock(), Some("clk"));
        assert!(approx(worst.path_required_time(), 2.20));
        assert!(worst
            .path_nodes()
            .iter()
            .all(|n| approx(n.path_slack(), 0.90)));
        assert_eq!(worst.start_stage_name(&d.engine), "reg0/Q");
        assert_eq!(worst.end_stage_name(&d.engine), "reg1/D");

        // port-launched path has no clock prefix to expand
        assert_eq!(paths[1].path_nodes().len(), 2);
        assert_eq!(paths[1].clk_path_end_index(), None);
    }

    #[test]
    fn capture_paths_share_clock_nodes() {
        let d = reg_to_reg_design();
        let mut q = PathQuery::with_engine(&d.engine, &d.engine);
        q.set_include_capture_paths(true);
        let paths = q.get_timing_paths_through(d.u1_zn).unwrap();
        assert_eq!(paths.len(), 1);

        let path = &paths[0];
        let arrivals: Vec<f64> = path.capture_nodes().iter().map(PathNode::arrival).collect();
        assert_eq!(arrivals.len(), 4);
        for (got, want) in arrivals.iter().zip([2.0, 2.05, 2.25, 2.30]) {
            assert!(approx(*got, want), "{got} != {want}");
        }
        assert_eq!(path.clk_capture_end_index(), Some(3));
        assert!(path.capture_nodes().iter().all(|n| approx(n.path_slack(), 0.90)));

        for i in 0..3 {
            assert!(path.path_nodes()[i]
                .paired_nodes()
                .contains(&NodeRef::new(NodeList::Capture, i)));
        }
        assert!(path.path_nodes()[3].paired_nodes().is_empty());
    }

    #[test]
    fn unexpanded_clock() {
        let d = reg_to_reg_design();
        let mut q = PathQuery::with_engine(&d.engine, &d.engine);
        q.set_clock_expanded(false);
        q.set_include_capture_paths(true);
        let paths = q.get_timing_paths_through(d.reg1_d).unwrap();
        let path = &paths[0];
        assert_eq!(path.path_nodes().len(), 5);
        assert_eq!(path.clk_path_end_index(), Some(0));
        assert_eq!(path.capture_nodes().len(), 1);
        assert_eq!(path.clk_capture_end_index(), Some(0));
    }

    #[test]
    fn unconstrained_and_cap() {
        let d = reg_to_reg_design();
        let none = PinSet::new();
        let mut q = PathQuery::with_engine(&d.engine, &d.engine);
        q.set_include_unconstrained_paths(true);
        let paths = q.get_timing_paths(&none, &[], &none).unwrap();
        assert_eq!(paths.len(), 3);
        assert_eq!(end_pin(&paths[2]), d.out1);

        for cap in [0, 1, 2] {
            q.set_max_path_count(cap);
            assert_eq!(q.get_timing_paths(&none, &[], &none).unwrap().len(), cap);
        }
    }

    #[test]
    fn equal_slack_keeps_engine_order() {
        let t = twin_capture();
        let none = PinSet::new();
        let mut q = PathQuery::with_engine(&t.engine, &t.engine);
        let paths = q.get_timing_paths(&none, &[], &none).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].slack(), paths[1].slack());
        assert!(approx(paths[0].slack(), 0.7));
        assert!(t.regb_d < t.rega_d);
        assert_eq!(end_pin(&paths[0]), t.regb_d);
        assert_eq!(end_pin(&paths[1]), t.rega_d);

        q.set_max_path_count(1);
        let paths = q.get_timing_paths(&none, &[], &none).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(end_pin(&paths[0]), t.regb_d);
    }

    #[test]
    fn hold_session_from_toml() {
        let d = reg_to_reg_design();
        let config = load_config_from_str("[session]\nuse_max = false\nmax_path_count = 1\n")
            .unwrap();
        let mut q = PathQuery::with_config(config.session);
        q.set_sta(&d.engine);
        q.set_design(&d.engine);

        let none = PinSet::new();
        let paths = q.get_timing_paths(&none, &[], &none).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(end_pin(&paths[0]), d.reg0_d);
        assert!(approx(paths[0].slack(), -0.20));

        q.reset_config();
        assert!(q.use_max());
        assert_eq!(q.max_path_count(), stave_config::DEFAULT_MAX_PATH_COUNT);
    }

    #[test]
    fn hold_capture_is_not_offset() {
        let d = reg_to_reg_design();
        let mut q = PathQuery::with_engine(&d.engine, &d.engine);
        q.set_use_max(false);
        q.set_include_capture_paths(true);
        let paths = q.get_timing_paths_through(d.u1_a).unwrap();
        let capture = paths[0].capture_nodes();
        assert!(approx(capture.last().unwrap().arrival(), 0.20));
    }

    #[test]
    fn paths_through_a_startpoint() {
        let d = reg_to_reg_design();
        let q = PathQuery::with_engine(&d.engine, &d.engine);
        let paths = q.get_timing_paths_through(d.in1).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(end_pin(&paths[0]), d.reg0_d);
        assert!(q.get_timing_paths_through(d.spare_a).unwrap().is_empty());
    }

    #[test]
    fn timing_node_snapshots() {
        let d = reg_to_reg_design();
        let q = PathQuery::with_engine(&d.engine, &d.engine);

        let node = q.get_timing_node(d.u1_a).unwrap();
        assert!(node.has_values());
        assert!(approx(node.arrival(), 0.75));
        assert!(approx(node.load(), 0.004));
        assert!(node.is_sink());

        let spare = q.get_timing_node(d.spare_a).unwrap();
        assert!(!spare.has_values());
        assert_eq!(spare.arrival(), 0.0);
        assert_eq!(spare.slew(), 0.0);
        assert_eq!(spare.load(), 0.0);
        assert_eq!(spare.delay(), 0.0);

        let missing = PinId::from_raw(404);
        assert_eq!(
            q.get_timing_node(missing).unwrap_err(),
            QueryError::UnknownPin(missing)
        );
    }

    #[test]
    fn cones_through_the_facade() {
        let d = reg_to_reg_design();
        let q = PathQuery::with_engine(&d.engine, &d.engine);
        let fanout = q.get_fanout_cone(d.reg0_q).unwrap();
        assert_eq!(fanout.len(), 4);
        assert_eq!(fanout[&3], PinSet::from([d.reg1_d]));

        let fanin = q.get_fanin_cone(d.u1_zn).unwrap();
        assert_eq!(fanin[&1], PinSet::from([d.u1_a]));

        let bound = PinSet::from([d.u1_a, d.u1_zn]);
        let bounded = q.get_cone(d.reg0_q, Some(&bound), false).unwrap();
        assert_eq!(bounded.len(), 3);
    }

    #[test]
    fn cone_connectivity_is_timed_along_worst_path() {
        let d = reg_to_reg_design();
        let q = PathQuery::with_engine(&d.engine, &d.engine);
        let cone = q.get_fanout_cone(d.reg0_q).unwrap();
        let levels = q.build_cone_connectivity(d.reg0_q, &cone).unwrap();

        assert_eq!(levels.len(), 4);
        assert!(levels.values().all(|level| level.len() == 1));
        let q_node = &levels[&0][0];
        assert_eq!(q_node.fanout(), 1);
        assert_eq!(
            q_node.paired_nodes().iter().copied().collect::<Vec<_>>(),
            vec![NodeRef::new(NodeList::Depth(1), 0)]
        );

        let zn = &levels[&2][0];
        assert!(zn.has_values());
        assert!(approx(zn.delay(), 0.5));
        assert!(!zn.is_rising_edge());
        let reg1_d = &levels[&3][0];
        assert!(approx(reg1_d.path_slack(), 0.90));
        assert!(approx(reg1_d.arrival(), 1.30));
    }

    #[test]
    fn annotation_without_paths_keeps_live_values() {
        let d = reg_to_reg_design();
        let q = PathQuery::with_engine(&d.engine, &d.engine);
        let cone = q.get_fanin_cone(d.spare_a).unwrap();
        let levels = q.build_cone_connectivity(d.spare_a, &cone).unwrap();
        assert_eq!(levels.len(), 1);
        assert!(!levels[&0][0].has_values());
    }

    #[test]
    fn session_settings() {
        let mut q = PathQuery::new();
        assert_eq!(q.corner(), None);
        assert!(q.clock_expanded());
        q.set_corner(Some("ff".into()));
        q.set_include_unconstrained_paths(true);
        q.set_include_capture_paths(true);
        assert_eq!(q.corner(), Some("ff"));
        assert!(q.include_unconstrained_paths());
        assert!(q.include_capture_paths());

        let saved = q.config().clone();
        q.reset_config();
        assert_eq!(q.config(), &SessionConfig::default());
        q.set_config(saved);
        assert_eq!(q.corner(), Some("ff"));
    }
}

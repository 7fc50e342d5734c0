//! Timing-path and cone extraction for the Stave timing viewer.
//!
//! This crate turns the raw results of a static timing engine into
//! structures a viewer can render: ordered, annotated timing paths with their
//! launch and capture clock networks, and fanin/fanout cones layered by
//! distance from a pin. A reference engine over a netlist-level timing graph
//! is included and implements the collaborator traits.
//!
//! # Usage
//!
//! ```ignore
//! use stave_timing::{PathQuery, PinSet, StaEngine};
//!
//! let mut engine = StaEngine::new(graph, constraints, interner);
//! engine.update_timing(&sink)?;
//!
//! let mut query = PathQuery::with_engine(&engine, &engine);
//! query.set_include_capture_paths(true);
//! for path in query.get_timing_paths_through(pin)? {
//!     println!("{:.3} ns  {}", path.slack(), path.end_stage_name(&engine));
//! }
//! ```
//!
//! # Architecture
//!
//! - [`engine`]: collaborator traits (timing engine, design database) and the
//!   raw path objects they exchange
//! - [`node`]: one annotated pin of a path or cone
//! - [`path`]: launch/capture node sequences built from path objects
//! - [`cone`]: breadth-first cone layering and level linking
//! - [`query`]: the session facade with its configuration
//! - [`graph`], [`constraints`], [`sta`]: the reference engine

#![warn(missing_docs)]

pub mod cone;
pub mod constraints;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ids;
pub mod node;
pub mod path;
pub mod query;
pub mod sta;

#[cfg(test)]
mod test_support;

pub use cone::{cone_node, trace_cone, ConeDepthMap, ConeDepthMapPinSet, ConeDirection};
pub use constraints::{ClockConstraint, TimingConstraints};
pub use engine::{
    AnalysisPoint, DbPin, DesignDatabase, MinMax, PathRecord, PathSearch, PathStage, PathTrace,
    PinSet, PinTiming, TimingEngine,
};
pub use error::QueryError;
pub use graph::{Delay, PinDirection, TimingEdge, TimingEdgeType, TimingGraph};
pub use ids::{CornerId, InstanceId, NetId, PinId, TimingEdgeId};
pub use node::{NodeFlags, NodeList, NodeRef, PathNode, StageValues};
pub use path::TimingPath;
pub use query::PathQuery;
pub use sta::StaEngine;

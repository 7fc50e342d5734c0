//! Error types for path and cone queries.

use crate::ids::PinId;

/// Errors returned by [`PathQuery`](crate::query::PathQuery) operations.
///
/// Only session misconfiguration and invalid handles are errors. A query that
/// finds nothing returns an empty container instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// No timing engine has been attached to the session.
    #[error("no timing engine attached to the query session")]
    NoTimingEngine,

    /// No design database has been attached to the session.
    #[error("no design database attached to the query session")]
    NoDesign,

    /// The configured corner name is not known to the timing engine.
    #[error("unknown analysis corner '{0}'")]
    UnknownCorner(String),

    /// The timing engine defines no corners at all.
    #[error("timing engine has no analysis corners")]
    NoCorners,

    /// The pin handle does not exist in the design database.
    #[error("pin {} is not part of the design", .0.as_raw())]
    UnknownPin(PinId),
}

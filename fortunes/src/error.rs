use thiserror::Error;

use crate::geometry::Point;

/// Faults raised by the core engine.
///
/// Numerical degeneracies that the algorithm can route around in-band
/// (collinear circumcenter candidates, a Lloyd step that doesn't move a
/// site) are not represented here — only conditions the caller must fix
/// before the computation can proceed.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum VoronoiError {
    #[error("identical input sites at {0:?} and {1:?}")]
    IdenticalDatapoints(Point, Point),

    #[error("lloyd relaxation window must have at least 3 vertices")]
    DegenerateWindow,
}

pub type Result<T> = std::result::Result<T, VoronoiError>;

//! Fortune's sweep-line algorithm for planar Voronoi diagrams, producing
//! a winged-edge boundary representation, plus Lloyd relaxation as an
//! optional post-processing pass.

mod beachline;
pub mod error;
mod event;
mod fortune;
pub mod geometry;
mod lloyd;
#[cfg(test)]
mod test_utils;
pub mod winged_edge;

pub use error::{Result, VoronoiError};
pub use fortune::compute_voronoi;
pub use geometry::Point;
pub use lloyd::{lloyd_relax, ClipWindow};
pub use winged_edge::{EdgeId, PolyId, VertexId, WeEdge, WePolygon, WeVertex, WingedEdge};

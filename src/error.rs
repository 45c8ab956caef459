//! Error type shared by the graph, transaction and input APIs.

use crate::graph::{ControlPointId, SegmentId};
use crate::landscape::LandscapeId;

/// Errors reported by the railway builder and the spline graph API.
///
/// A build never fails because of missing terrain or missing neighbours;
/// those fall back to defaults. Errors describe input the API rejects.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RailwayError {
    /// A way's node index list does not line up with its points.
    #[error("railway way has {points} points but {node_indices} node indices")]
    MismatchedNodeIndices { points: usize, node_indices: usize },

    /// The control point is not a member of the graph.
    #[error("control point {0:?} does not exist in the spline graph")]
    MissingControlPoint(ControlPointId),

    /// The segment is not a member of the graph.
    #[error("segment {0:?} does not exist in the spline graph")]
    MissingSegment(SegmentId),

    /// Undo or redo was applied to a landscape the transaction did not record.
    #[error("transaction recorded landscape {expected:?}, got {actual:?}")]
    LandscapeMismatch {
        expected: LandscapeId,
        actual: LandscapeId,
    },
}

pub type Result<T> = std::result::Result<T, RailwayError>;

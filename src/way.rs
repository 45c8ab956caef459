//! Railway ways imported from street-map data.

use bevy::prelude::*;
use serde::Deserialize;

use crate::error::{RailwayError, Result};

/// Id of a map node shared by several ways at a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct NodeIndex(pub u64);

impl NodeIndex {
    /// Converts a raw map index; negative values mean "no shared node".
    pub fn from_raw(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().map(NodeIndex)
    }
}

/// An ordered railway polyline on the map plane.
///
/// Every point has an optional [`NodeIndex`]; points without one are unique
/// to this way. Map points `(x, y)` lie on the world XZ plane.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRailwayWay")]
pub struct RailwayWay {
    points: Vec<Vec2>,
    node_indices: Vec<Option<NodeIndex>>,
}

impl RailwayWay {
    /// Creates a way from parallel point and node index lists.
    pub fn new(points: Vec<Vec2>, node_indices: Vec<Option<NodeIndex>>) -> Result<Self> {
        if points.len() != node_indices.len() {
            return Err(RailwayError::MismatchedNodeIndices {
                points: points.len(),
                node_indices: node_indices.len(),
            });
        }
        Ok(Self {
            points,
            node_indices,
        })
    }

    /// A way whose points are all unique.
    pub fn from_points(points: Vec<Vec2>) -> Self {
        let node_indices = vec![None; points.len()];
        Self {
            points,
            node_indices,
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn node_indices(&self) -> &[Option<NodeIndex>] {
        &self.node_indices
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points paired with their node indices.
    pub fn iter(&self) -> impl Iterator<Item = (Vec2, Option<NodeIndex>)> + '_ {
        self.points
            .iter()
            .copied()
            .zip(self.node_indices.iter().copied())
    }
}

/// Serialized form: `node_indices` may be omitted, and `null` or negative
/// entries mean "no shared node".
#[derive(Deserialize)]
struct RawRailwayWay {
    points: Vec<[f32; 2]>,
    #[serde(default)]
    node_indices: Vec<Option<i64>>,
}

impl TryFrom<RawRailwayWay> for RailwayWay {
    type Error = RailwayError;

    fn try_from(raw: RawRailwayWay) -> Result<Self> {
        let points: Vec<Vec2> = raw.points.into_iter().map(Vec2::from).collect();
        if raw.node_indices.is_empty() {
            return Ok(Self::from_points(points));
        }
        let node_indices = raw
            .node_indices
            .into_iter()
            .map(|raw| raw.and_then(NodeIndex::from_raw))
            .collect();
        Self::new(points, node_indices)
    }
}

/// Supplies railway ways to the builder.
pub trait RailwaySource {
    fn railways(&self) -> &[RailwayWay];
}

impl RailwaySource for [RailwayWay] {
    fn railways(&self) -> &[RailwayWay] {
        self
    }
}

impl<const N: usize> RailwaySource for [RailwayWay; N] {
    fn railways(&self) -> &[RailwayWay] {
        self
    }
}

impl RailwaySource for Vec<RailwayWay> {
    fn railways(&self) -> &[RailwayWay] {
        self
    }
}

/// Railway data of one imported map.
#[derive(Component, Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreetMap {
    #[serde(default)]
    railways: Vec<RailwayWay>,
}

impl StreetMap {
    pub fn new(railways: Vec<RailwayWay>) -> Self {
        Self { railways }
    }

    pub fn push(&mut self, way: RailwayWay) {
        self.railways.push(way);
    }
}

impl RailwaySource for StreetMap {
    fn railways(&self) -> &[RailwayWay] {
        &self.railways
    }
}

//! Spline graph edges.

use bevy::prelude::*;

use crate::control_point::SegmentEnd;
use crate::graph::ControlPointId;
use crate::settings::SplineMeshAxis;
use crate::spline::SplinePoint;

/// One end of a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub control_point: ControlPointId,
    /// Socket on the control point's mesh, `None` for the point itself.
    pub socket: Option<String>,
    /// Signed tangent length; negative values flip the tangent.
    pub tangent_len: f32,
}

impl Connection {
    pub fn new(control_point: ControlPointId) -> Self {
        Self {
            control_point,
            socket: None,
            tangent_len: 0.0,
        }
    }
}

/// A mesh deformed along a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineMeshEntry {
    pub mesh: Handle<Mesh>,
    pub scale_to_width: bool,
    pub forward_axis: SplineMeshAxis,
    pub up_axis: SplineMeshAxis,
    pub scale: Vec3,
}

impl SplineMeshEntry {
    pub fn new(mesh: Handle<Mesh>) -> Self {
        Self {
            mesh,
            scale_to_width: true,
            forward_axis: SplineMeshAxis::X,
            up_axis: SplineMeshAxis::Y,
            scale: Vec3::ONE,
        }
    }
}

/// An edge of the spline graph between two control points.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub(crate) connections: [Connection; 2],
    pub layer_name: String,
    pub spline_meshes: Vec<SplineMeshEntry>,
    pub max_draw_distance: f32,
    pub raise_terrain: bool,
    pub lower_terrain: bool,
    pub place_in_streaming_levels: bool,
    pub enable_collision: bool,
    pub cast_shadow: bool,
    pub(crate) spline_points: Vec<SplinePoint>,
}

impl Segment {
    /// A segment from `start` to `end` with host defaults.
    pub fn new(start: ControlPointId, end: ControlPointId) -> Self {
        Self {
            connections: [Connection::new(start), Connection::new(end)],
            layer_name: String::new(),
            spline_meshes: Vec::new(),
            max_draw_distance: 0.0,
            raise_terrain: true,
            lower_terrain: true,
            place_in_streaming_levels: true,
            enable_collision: true,
            cast_shadow: true,
            spline_points: Vec::new(),
        }
    }

    pub fn connection(&self, end: SegmentEnd) -> &Connection {
        &self.connections[end.index()]
    }

    pub fn connection_mut(&mut self, end: SegmentEnd) -> &mut Connection {
        &mut self.connections[end.index()]
    }

    pub fn start(&self) -> ControlPointId {
        self.connections[0].control_point
    }

    pub fn end(&self) -> ControlPointId {
        self.connections[1].control_point
    }

    pub fn spline_points(&self) -> &[SplinePoint] {
        &self.spline_points
    }

    /// True when the mesh list is exactly one entry rendering `marker`.
    pub fn is_tagged_with(&self, marker: &Handle<Mesh>) -> bool {
        matches!(self.spline_meshes.as_slice(), [entry] if entry.mesh == *marker)
    }

    /// Copies layer, meshes, draw distance and terrain/render flags.
    pub fn copy_style_from(&mut self, other: &Segment) {
        self.layer_name = other.layer_name.clone();
        self.spline_meshes = other.spline_meshes.clone();
        self.max_draw_distance = other.max_draw_distance;
        self.raise_terrain = other.raise_terrain;
        self.lower_terrain = other.lower_terrain;
        self.place_in_streaming_levels = other.place_in_streaming_levels;
        self.enable_collision = other.enable_collision;
        self.cast_shadow = other.cast_shadow;
    }
}

//! Build configuration for railway generation.

use bevy::prelude::*;

/// Default control point width in world units.
pub const DEFAULT_RAILWAY_WIDTH: f32 = 4.0;

/// Local mesh axis used when deforming a spline mesh along a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SplineMeshAxis {
    #[default]
    X,
    Y,
    Z,
}

impl SplineMeshAxis {
    /// Unit vector of this axis in mesh space.
    pub fn to_vec3(self) -> Vec3 {
        match self {
            SplineMeshAxis::X => Vec3::X,
            SplineMeshAxis::Y => Vec3::Y,
            SplineMeshAxis::Z => Vec3::Z,
        }
    }
}

/// Settings for a single railway build.
///
/// The railway line mesh doubles as the marker of generated geometry: segments
/// whose mesh list is exactly this mesh are deleted before every rebuild.
///
/// # Example
///
/// ```ignore
/// use bevy_symbios_railway::{RailwayBuildSettings, SplineMeshAxis};
///
/// let settings = RailwayBuildSettings::new(rail_mesh)
///     .with_width(6.0)
///     .with_up_axis(SplineMeshAxis::Y);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RailwayBuildSettings {
    width: f32,
    forward_axis: SplineMeshAxis,
    up_axis: SplineMeshAxis,
    railway_line_mesh: Handle<Mesh>,
}

impl RailwayBuildSettings {
    /// Creates settings with the default width, `X` forward and `Y` up.
    pub fn new(railway_line_mesh: Handle<Mesh>) -> Self {
        Self {
            width: DEFAULT_RAILWAY_WIDTH,
            forward_axis: SplineMeshAxis::X,
            up_axis: SplineMeshAxis::Y,
            railway_line_mesh,
        }
    }

    /// Sets the width of the first control point of every way.
    /// Clamped to a non-negative value.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width.max(0.0);
        self
    }

    pub fn with_forward_axis(mut self, axis: SplineMeshAxis) -> Self {
        self.forward_axis = axis;
        self
    }

    pub fn with_up_axis(mut self, axis: SplineMeshAxis) -> Self {
        self.up_axis = axis;
        self
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn forward_axis(&self) -> SplineMeshAxis {
        self.forward_axis
    }

    pub fn up_axis(&self) -> SplineMeshAxis {
        self.up_axis
    }

    /// The mesh rendered on new railway segments and used to find old ones.
    pub fn railway_line_mesh(&self) -> &Handle<Mesh> {
        &self.railway_line_mesh
    }
}

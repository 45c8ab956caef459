//! Editor visualization mesh for spline graphs.
//!
//! Converts the cached spline points of a [`SplineGraph`] into a Bevy
//! [`Mesh`] ribbon with:
//! - `TriangleList` topology, one quad per pair of consecutive samples
//! - Smooth per-vertex normals (area-weighted average of adjacent face normals)
//! - UVs running `0..1` across the ribbon and along its length in world units
//!   divided by `uv_tile_size`
//!
//! Vertices are in landscape space: graph-local positions multiplied by the
//! graph's relative scale, so the mesh lines up when placed on the landscape
//! entity.

use bevy::asset::RenderAssetUsages;
use bevy::log::warn;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::graph::SplineGraph;
use crate::landscape::Landscape;

/// Builds a ribbon [`Mesh`] following every segment of a [`SplineGraph`].
///
/// Each segment contributes two vertices (left and right edge) per cached
/// spline point. Segments whose spline points were never computed, or were
/// deleted, contribute nothing.
///
/// # Example
///
/// ```ignore
/// use bevy_symbios_railway::SplineEditorMeshBuilder;
///
/// let mesh = SplineEditorMeshBuilder::new()
///     .with_uv_tile_size(4.0)
///     .build(&graph);
/// ```
pub struct SplineEditorMeshBuilder {
    uv_tile_size: f32,
}

impl Default for SplineEditorMeshBuilder {
    fn default() -> Self {
        Self { uv_tile_size: 1.0 }
    }
}

impl SplineEditorMeshBuilder {
    /// Creates a new builder with default settings (`uv_tile_size = 1.0`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ribbon length covered by one UV tile.
    /// Clamped to a positive minimum to avoid division by zero.
    pub fn with_uv_tile_size(mut self, size: f32) -> Self {
        self.uv_tile_size = size.max(f32::EPSILON);
        self
    }

    /// Builds the ribbon mesh. An empty graph yields a mesh without vertices.
    pub fn build(&self, graph: &SplineGraph) -> Mesh {
        let scale = graph.scale();
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut uvs: Vec<[f32; 2]> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for (_, segment) in graph.segments() {
            let samples = segment.spline_points();
            if samples.len() < 2 {
                continue;
            }

            let base = positions.len() as u32;
            let mut travelled = 0.0;
            let mut previous_center: Option<Vec3> = None;
            for sample in samples {
                let center = sample.center * scale;
                if let Some(previous) = previous_center {
                    travelled += previous.distance(center);
                }
                previous_center = Some(center);

                let v = travelled / self.uv_tile_size;
                positions.push((sample.left * scale).into());
                positions.push((sample.right * scale).into());
                uvs.push([0.0, v]);
                uvs.push([1.0, v]);
            }

            // Each sample pair (i, i+1) emits two triangles:
            //   l0──r0
            //   │ ╲  │     Triangle 1: l0, r0, l1
            //   │  ╲ │     Triangle 2: r0, r1, l1
            //   l1──r1
            // Wound so the face normal points +Y on flat ground.
            for i in 0..(samples.len() as u32 - 1) {
                let l0 = base + i * 2;
                let r0 = l0 + 1;
                let l1 = l0 + 2;
                let r1 = l0 + 3;

                indices.extend_from_slice(&[l0, r0, l1]);
                indices.extend_from_slice(&[r0, r1, l1]);
            }
        }

        let mut normals: Vec<Vec3> = vec![Vec3::ZERO; positions.len()];
        for tri in indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(positions[i0]);
            let p1 = Vec3::from(positions[i1]);
            let p2 = Vec3::from(positions[i2]);
            let face_normal = (p1 - p0).cross(p2 - p0);
            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        let normals: Vec<[f32; 3]> = normals
            .iter()
            .map(|n| {
                let len = n.length();
                // Degenerate vertex (zero-width ribbon): default to +Y.
                if len > f32::EPSILON { (*n / len).into() } else { [0.0, 1.0, 0.0] }
            })
            .collect();

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
        mesh.insert_indices(Indices::U32(indices));
        mesh
    }
}

/// Component holding the editor mesh of a landscape's spline graph.
///
/// Insert it on the [`Landscape`] entity (together with a `Mesh3d` using the
/// same handle) and add [`sync_spline_editor_mesh`] to your `Update`
/// schedule.
#[derive(Component, Debug, Clone)]
pub struct SplineEditorMesh {
    /// Handle to the ribbon mesh. Rebuilt in place on graph changes.
    pub handle: Handle<Mesh>,
    synced_revision: Option<u64>,
}

impl SplineEditorMesh {
    pub fn new(handle: Handle<Mesh>) -> Self {
        Self {
            handle,
            synced_revision: None,
        }
    }

    /// Forces the next [`sync_spline_editor_mesh`] pass to rebuild.
    pub fn mark_dirty(&mut self) {
        self.synced_revision = None;
    }
}

/// Bevy system that rebuilds [`SplineEditorMesh`] assets when their graph's
/// render revision changes and the graph shows its editor mesh.
///
/// Only rebuilds on change, so it is safe to run every frame.
pub fn sync_spline_editor_mesh(
    mut meshes: ResMut<Assets<Mesh>>,
    mut landscapes: Query<(&Landscape, &mut SplineEditorMesh)>,
) {
    for (landscape, mut editor_mesh) in &mut landscapes {
        let Some(graph) = landscape.spline_graph() else {
            continue;
        };
        if !graph.editor_mesh_visible() {
            continue;
        }
        let revision = graph.render_revision();
        if editor_mesh.synced_revision == Some(revision) {
            continue;
        }

        let mesh = SplineEditorMeshBuilder::new().build(graph);
        if let Err(error) = meshes.insert(&editor_mesh.handle, mesh) {
            warn!("could not store spline editor mesh: {error}");
            continue;
        }
        editor_mesh.synced_revision = Some(revision);
    }
}

/// Bevy system that draws every visible spline graph with gizmos: a line
/// along each segment's centre and a sphere per control point.
pub fn draw_spline_graph_gizmos(
    mut gizmos: Gizmos,
    landscapes: Query<(&Landscape, &GlobalTransform)>,
) {
    let segment_color = Color::srgb(0.9, 0.6, 0.2);
    let point_color = Color::srgb(0.2, 0.7, 1.0);

    for (landscape, transform) in &landscapes {
        let Some(graph) = landscape.spline_graph() else {
            continue;
        };
        if !graph.editor_mesh_visible() {
            continue;
        }
        let scale = graph.scale();
        let to_world = |local: Vec3| transform.transform_point(local * scale);

        for (_, segment) in graph.segments() {
            gizmos.linestrip(
                segment.spline_points().iter().map(|sample| to_world(sample.center)),
                segment_color,
            );
        }
        for (_, point) in graph.control_points() {
            gizmos.sphere(
                Isometry3d::from_translation(to_world(point.location)),
                point.width * 0.25,
                point_color,
            );
        }
    }
}

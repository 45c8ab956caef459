//! Railway graph construction.
//!
//! A build runs four phases on one landscape inside one transaction:
//!
//! 1. attach (or reuse) the landscape's spline graph, scaled by the inverse
//!    of the landscape scale,
//! 2. delete the railway segments and points a previous build generated,
//! 3. sample the terrain height under every new point,
//! 4. rebuild the graph way by way, sharing one control point per map node.

use std::collections::{BTreeSet, HashMap};

use bevy::log::{info, warn};
use bevy::prelude::*;

use crate::control_point::{ControlPoint, SegmentEnd};
use crate::elevation::{TerrainRaycast, sample_elevation};
use crate::error::{RailwayError, Result};
use crate::graph::{ControlPointId, SegmentId, SplineGraph};
use crate::landscape::Landscape;
use crate::segment::{Segment, SplineMeshEntry};
use crate::settings::RailwayBuildSettings;
use crate::spline::rotation_from_direction;
use crate::transaction::{ScopedTransaction, UndoHistory};
use crate::way::{NodeIndex, RailwaySource, RailwayWay};

/// Side falloff of the first control point of a way.
pub const DEFAULT_SIDE_FALLOFF: f32 = 1.5;
/// End falloff of the first control point of a way.
pub const DEFAULT_END_FALLOFF: f32 = 3.0;
/// Paint layer of every new control point; it is not inherited.
pub const CONTROL_POINT_LAYER: &str = "Soil";
/// Paint layer of railway segments.
pub const SEGMENT_LAYER: &str = "soil";
/// Draw distance of railway segment meshes.
pub const RAILWAY_DRAW_DISTANCE: f32 = 100_000.0;

/// Description of the undo entry a build records.
pub const BUILD_TRANSACTION: &str = "Creating Railways";

/// What [`clean_old_railways`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed_segments: usize,
    pub removed_control_points: usize,
    /// Other segments dropped because they lost an endpoint.
    pub reclaimed_segments: usize,
}

/// What a build did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub cleanup: CleanupReport,
    pub created_control_points: usize,
    pub reused_control_points: usize,
    pub created_segments: usize,
}

/// Removes railway geometry generated by an earlier build.
///
/// A segment is railway geometry when its mesh list is exactly one entry
/// rendering `marker`. Both endpoints of every such segment are removed too,
/// even when other segments still use them; those other segments are then
/// dropped by [`SplineGraph::reclaim`].
pub fn clean_old_railways(graph: &mut SplineGraph, marker: &Handle<Mesh>) -> Result<CleanupReport> {
    let stale: Vec<SegmentId> = graph
        .segments()
        .filter(|(_, segment)| segment.is_tagged_with(marker))
        .map(|(id, _)| id)
        .collect();

    let mut points_to_delete = BTreeSet::new();
    for &id in stale.iter().rev() {
        graph.delete_segment_spline_points(id)?;
        let segment = graph.remove_segment(id)?;
        points_to_delete.insert(segment.start());
        points_to_delete.insert(segment.end());
    }

    for &id in &points_to_delete {
        graph.delete_control_point_spline_points(id)?;
        graph.remove_control_point(id)?;
    }

    graph.modify();
    let reclaimed_segments = graph.reclaim();
    if reclaimed_segments > 0 {
        warn!("dropped {reclaimed_segments} segments attached to removed railway points");
    }

    Ok(CleanupReport {
        removed_segments: stale.len(),
        removed_control_points: points_to_delete.len(),
        reclaimed_segments,
    })
}

/// Builds railway geometry for every way of `source` onto `landscape`.
///
/// The whole build is recorded as one transaction in `history`. If it fails
/// midway, everything it did is reverted and nothing is recorded.
///
/// # Example
///
/// ```ignore
/// let settings = RailwayBuildSettings::new(rail_mesh);
/// let raycast = HeightfieldRaycast::new(&heightfield, landscape.id());
/// let report = build_railway(&street_map, &mut landscape, &raycast, &settings, &mut history)?;
/// ```
pub fn build_railway(
    source: &(impl RailwaySource + ?Sized),
    landscape: &mut Landscape,
    raycast: &dyn TerrainRaycast,
    settings: &RailwayBuildSettings,
    history: &mut UndoHistory,
) -> Result<BuildReport> {
    let mut transaction = ScopedTransaction::new(history, landscape, BUILD_TRANSACTION);
    match RailwayBuilder::new(settings, raycast).build(source.railways(), &mut transaction) {
        Ok(report) => {
            info!(
                "built railways: {} control points ({} shared), {} segments, removed {} old segments",
                report.created_control_points,
                report.reused_control_points,
                report.created_segments,
                report.cleanup.removed_segments,
            );
            Ok(report)
        }
        Err(error) => {
            warn!("railway build failed, reverting: {error}");
            transaction.cancel();
            Err(error)
        }
    }
}

/// One build over one landscape.
struct RailwayBuilder<'a> {
    settings: &'a RailwayBuildSettings,
    raycast: &'a dyn TerrainRaycast,
}

impl<'a> RailwayBuilder<'a> {
    fn new(settings: &'a RailwayBuildSettings, raycast: &'a dyn TerrainRaycast) -> Self {
        Self { settings, raycast }
    }

    fn build(&self, ways: &[RailwayWay], landscape: &mut Landscape) -> Result<BuildReport> {
        let landscape_id = landscape.id();
        let spline_scale = Vec3::ONE / landscape.transform().scale;
        let graph_scale = landscape
            .spline_graph()
            .map_or(spline_scale, SplineGraph::scale);
        let world_to_graph = landscape
            .graph_to_world(graph_scale)
            .compute_affine()
            .inverse();

        let graph = landscape.ensure_spline_graph(spline_scale);
        let cleanup = clean_old_railways(graph, self.settings.railway_line_mesh())?;

        let mut report = BuildReport {
            cleanup,
            ..default()
        };
        let mut node_points: HashMap<NodeIndex, ControlPointId> = HashMap::new();

        for way in ways {
            let mut previous: Option<ControlPointId> = None;

            for (index, (location, node)) in way.iter().enumerate() {
                let known = node.and_then(|node| node_points.get(&node).copied());
                let current = match known {
                    Some(id) => {
                        report.reused_control_points += 1;
                        id
                    }
                    None => {
                        let elevation = sample_elevation(self.raycast, landscape_id, location);
                        let world = Vec3::new(location.x, elevation, location.y);
                        let local = world_to_graph.transform_point3(world);

                        let id = self.add_control_point(graph, local, previous)?;
                        report.created_control_points += 1;
                        if let Some(node) = node {
                            node_points.insert(node, id);
                        }
                        id
                    }
                };

                if let Some(previous) = previous {
                    let segment = add_segment(graph, previous, current, true, true)?;
                    report.created_segments += 1;
                    if index == 1 {
                        self.apply_railway_line(graph, segment)?;
                    }
                }
                previous = Some(current);
            }
        }

        Ok(report)
    }

    /// Adds a control point, inheriting from `previous` when there is one.
    fn add_control_point(
        &self,
        graph: &mut SplineGraph,
        location: Vec3,
        previous: Option<ControlPointId>,
    ) -> Result<ControlPointId> {
        graph.modify();

        let mut point = ControlPoint {
            location,
            width: self.settings.width(),
            side_falloff: DEFAULT_SIDE_FALLOFF,
            end_falloff: DEFAULT_END_FALLOFF,
            layer_name: CONTROL_POINT_LAYER.to_string(),
            ..default()
        };
        let previous = previous.and_then(|id| graph.control_point(id));
        if let Some(previous) = previous {
            point.rotation = rotation_from_direction(location - previous.location);
            point.inherit_from(previous);
        }
        let had_previous = previous.is_some();

        let id = graph.add_control_point(point);
        if !had_previous {
            // A lone point has no segment to draw it yet.
            graph.update_control_point_spline_points(id)?;
        }

        if graph.is_registered() {
            graph.mark_render_state_dirty();
        } else {
            graph.register();
        }
        Ok(id)
    }

    /// Gives the first segment of a way the railway line look.
    ///
    /// An inherited mesh list is kept as is.
    fn apply_railway_line(&self, graph: &mut SplineGraph, id: SegmentId) -> Result<()> {
        let segment = graph.segment_mut(id)?;
        segment.layer_name = SEGMENT_LAYER.to_string();
        segment.max_draw_distance = RAILWAY_DRAW_DISTANCE;
        segment.raise_terrain = true;
        segment.lower_terrain = true;
        segment.place_in_streaming_levels = true;
        segment.enable_collision = false;
        segment.cast_shadow = true;

        if segment.spline_meshes.is_empty() {
            segment.spline_meshes.push(SplineMeshEntry {
                mesh: self.settings.railway_line_mesh().clone(),
                scale_to_width: false,
                forward_axis: self.settings.forward_axis(),
                up_axis: self.settings.up_axis(),
                scale: Vec3::ONE,
            });
        }
        Ok(())
    }
}

/// Connects `start` to `end` with a new segment.
///
/// `start` and `end` may be the same point; the segment then has zero length
/// and adds nothing to the point's auto-rotation.
///
/// Sockets face each other, both tangents span the distance between the
/// connection locations, and the style is copied from the first segment
/// already attached to `start` (or else `end`). Endpoints flagged for
/// auto-rotation get a new rotation and fresh spline points; an endpoint
/// with a mesh is refreshed either way. If neither endpoint was refreshed,
/// the segment's own spline points are computed directly.
pub fn add_segment(
    graph: &mut SplineGraph,
    start: ControlPointId,
    end: ControlPointId,
    auto_rotate_start: bool,
    auto_rotate_end: bool,
) -> Result<SegmentId> {
    graph.modify();
    let id = graph.add_segment(Segment::new(start, end))?;

    let (start_socket, end_socket, start_has_mesh, end_has_mesh) = {
        let start_point = graph
            .control_point(start)
            .ok_or(RailwayError::MissingControlPoint(start))?;
        let end_point = graph
            .control_point(end)
            .ok_or(RailwayError::MissingControlPoint(end))?;
        (
            start_point.best_connection_to(end_point.location),
            end_point.best_connection_to(start_point.location),
            start_point.mesh.is_some(),
            end_point.mesh.is_some(),
        )
    };
    {
        let segment = graph.segment_mut(id)?;
        segment.connection_mut(SegmentEnd::Start).socket = start_socket;
        segment.connection_mut(SegmentEnd::End).socket = end_socket;
    }

    let tangent_len = {
        let segment = graph
            .segment(id)
            .ok_or(RailwayError::MissingSegment(id))?;
        let (start_location, _) =
            graph.connection_location_and_rotation(segment.connection(SegmentEnd::Start))?;
        let (end_location, _) =
            graph.connection_location_and_rotation(segment.connection(SegmentEnd::End))?;
        start_location.distance(end_location)
    };
    {
        let segment = graph.segment_mut(id)?;
        segment.connection_mut(SegmentEnd::Start).tangent_len = tangent_len;
        segment.connection_mut(SegmentEnd::End).tangent_len = tangent_len;
    }
    graph.auto_flip_tangents(id)?;

    let style_source = match graph.first_connected_segment(start)? {
        Some(segment) => Some(segment),
        None => graph.first_connected_segment(end)?,
    };
    if let Some(source) = style_source.and_then(|source| graph.segment(source)).cloned() {
        graph.segment_mut(id)?.copy_style_from(&source);
    }

    graph.connect_segment(id)?;

    let mut updated_start = false;
    let mut updated_end = false;
    if auto_rotate_start {
        graph.auto_calc_rotation(start)?;
        graph.update_control_point_spline_points(start)?;
        updated_start = true;
    }
    if auto_rotate_end {
        graph.auto_calc_rotation(end)?;
        graph.update_control_point_spline_points(end)?;
        updated_end = true;
    }

    if !updated_start && start_has_mesh {
        graph.update_control_point_spline_points(start)?;
    }
    if !updated_end && end_has_mesh {
        graph.update_control_point_spline_points(end)?;
    }

    // Updating an endpoint already resampled the new segment.
    if !(updated_start || updated_end) {
        graph.update_segment_spline_points(id)?;
    }

    Ok(id)
}

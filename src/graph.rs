//! Arena-owned spline graph.
//!
//! Control points and segments live in ordered maps keyed by ids that are
//! handed out in increasing order and never reused by the same graph. Segments
//! refer to their endpoints by id and control points keep `(segment, end)`
//! back references, so the graph has no ownership cycles.
//!
//! Every mutating method records the touched object's previous state in the
//! active [`GraphJournal`](crate::transaction) first, which is what makes a
//! build undoable as a whole.

use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;

use crate::control_point::{ConnectedSegment, ControlPoint, SegmentEnd};
use crate::error::{RailwayError, Result};
use crate::segment::{Connection, Segment};
use crate::spline::{
    SplinePoint, forward, hermite_point, hermite_tangent, rotation_from_direction,
    segment_intervals, side_vector,
};
use crate::transaction::GraphJournal;

/// Stable id of a control point within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlPointId(u32);

/// Stable id of a segment within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u32);

/// Graph-level state captured by transactions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GraphMeta {
    pub(crate) scale: Vec3,
    pub(crate) registered: bool,
    pub(crate) editor_mesh_visible: bool,
    pub(crate) next_control_point: u32,
    pub(crate) next_segment: u32,
}

/// Control points and segments attached to one landscape.
#[derive(Debug, Clone)]
pub struct SplineGraph {
    meta: GraphMeta,
    control_points: BTreeMap<ControlPointId, ControlPoint>,
    segments: BTreeMap<SegmentId, Segment>,
    render_revision: u64,
    journal: Option<GraphJournal>,
}

impl PartialEq for SplineGraph {
    fn eq(&self, other: &Self) -> bool {
        self.meta == other.meta
            && self.control_points == other.control_points
            && self.segments == other.segments
    }
}

impl SplineGraph {
    /// Creates an empty, unregistered graph with a relative `scale`.
    pub fn new(scale: Vec3) -> Self {
        Self {
            meta: GraphMeta {
                scale,
                registered: false,
                editor_mesh_visible: false,
                next_control_point: 0,
                next_segment: 0,
            },
            control_points: BTreeMap::new(),
            segments: BTreeMap::new(),
            render_revision: 0,
            journal: None,
        }
    }

    /// Scale of the graph relative to its landscape.
    pub fn scale(&self) -> Vec3 {
        self.meta.scale
    }

    pub fn is_registered(&self) -> bool {
        self.meta.registered
    }

    /// Registers the graph with its landscape so it starts rendering.
    pub fn register(&mut self) {
        self.modify();
        self.meta.registered = true;
        self.mark_render_state_dirty();
    }

    /// Bumps the render revision; consumers rebuild render data on change.
    pub fn mark_render_state_dirty(&mut self) {
        self.render_revision = self.render_revision.wrapping_add(1);
    }

    pub fn render_revision(&self) -> u64 {
        self.render_revision
    }

    pub fn editor_mesh_visible(&self) -> bool {
        self.meta.editor_mesh_visible
    }

    pub fn show_editor_mesh(&mut self, visible: bool) {
        if self.meta.editor_mesh_visible == visible {
            return;
        }
        self.modify();
        self.meta.editor_mesh_visible = visible;
        self.mark_render_state_dirty();
    }

    /// Records the graph-level state in the active journal.
    pub fn modify(&mut self) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record_meta(&self.meta);
        }
    }

    fn modify_control_point(&mut self, id: ControlPointId) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record_control_point(id, self.control_points.get(&id));
        }
        self.mark_render_state_dirty();
    }

    fn modify_segment(&mut self, id: SegmentId) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record_segment(id, self.segments.get(&id));
        }
        self.mark_render_state_dirty();
    }

    pub fn control_point_count(&self) -> usize {
        self.control_points.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Control points in creation order.
    pub fn control_points(&self) -> impl Iterator<Item = (ControlPointId, &ControlPoint)> + '_ {
        self.control_points.iter().map(|(id, point)| (*id, point))
    }

    /// Segments in creation order.
    pub fn segments(&self) -> impl Iterator<Item = (SegmentId, &Segment)> + '_ {
        self.segments.iter().map(|(id, segment)| (*id, segment))
    }

    pub fn control_point(&self, id: ControlPointId) -> Option<&ControlPoint> {
        self.control_points.get(&id)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    fn try_control_point(&self, id: ControlPointId) -> Result<&ControlPoint> {
        self.control_points
            .get(&id)
            .ok_or(RailwayError::MissingControlPoint(id))
    }

    fn try_segment(&self, id: SegmentId) -> Result<&Segment> {
        self.segments.get(&id).ok_or(RailwayError::MissingSegment(id))
    }

    /// Mutable access to a control point, recorded for undo.
    pub fn control_point_mut(&mut self, id: ControlPointId) -> Result<&mut ControlPoint> {
        self.try_control_point(id)?;
        self.modify_control_point(id);
        self.control_points
            .get_mut(&id)
            .ok_or(RailwayError::MissingControlPoint(id))
    }

    /// Mutable access to a segment, recorded for undo.
    ///
    /// Connections stay owned by the graph; use [`connect_segment`] and
    /// [`remove_segment`] to change topology.
    ///
    /// [`connect_segment`]: SplineGraph::connect_segment
    /// [`remove_segment`]: SplineGraph::remove_segment
    pub fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Segment> {
        self.try_segment(id)?;
        self.modify_segment(id);
        self.segments
            .get_mut(&id)
            .ok_or(RailwayError::MissingSegment(id))
    }

    /// Adds a control point. Any back references it carries are discarded.
    pub fn add_control_point(&mut self, mut point: ControlPoint) -> ControlPointId {
        self.modify();
        let id = ControlPointId(self.meta.next_control_point);
        self.meta.next_control_point += 1;
        self.modify_control_point(id);

        point.connected_segments.clear();
        self.control_points.insert(id, point);
        id
    }

    /// Removes a control point.
    ///
    /// Segments still referring to it are left dangling until [`reclaim`].
    ///
    /// [`reclaim`]: SplineGraph::reclaim
    pub fn remove_control_point(&mut self, id: ControlPointId) -> Result<ControlPoint> {
        self.try_control_point(id)?;
        self.modify();
        self.modify_control_point(id);
        self.control_points
            .remove(&id)
            .ok_or(RailwayError::MissingControlPoint(id))
    }

    /// Adds a segment whose endpoints must already be in the graph.
    ///
    /// The endpoints do not know about the segment until
    /// [`connect_segment`](SplineGraph::connect_segment) runs.
    pub fn add_segment(&mut self, segment: Segment) -> Result<SegmentId> {
        self.try_control_point(segment.start())?;
        self.try_control_point(segment.end())?;

        self.modify();
        let id = SegmentId(self.meta.next_segment);
        self.meta.next_segment += 1;
        self.modify_segment(id);

        self.segments.insert(id, segment);
        Ok(id)
    }

    /// Registers the segment as connected on both of its endpoints.
    pub fn connect_segment(&mut self, id: SegmentId) -> Result<()> {
        let (start_point, end_point) = {
            let segment = self.try_segment(id)?;
            (segment.start(), segment.end())
        };
        for (point, end) in [(start_point, SegmentEnd::Start), (end_point, SegmentEnd::End)] {
            self.control_point_mut(point)?
                .connected_segments
                .push(ConnectedSegment { segment: id, end });
        }
        Ok(())
    }

    /// Removes a segment and detaches it from whichever endpoints still exist.
    pub fn remove_segment(&mut self, id: SegmentId) -> Result<Segment> {
        self.try_segment(id)?;
        self.modify();
        self.modify_segment(id);
        let segment = self
            .segments
            .remove(&id)
            .ok_or(RailwayError::MissingSegment(id))?;

        for point_id in [segment.start(), segment.end()] {
            if self.control_points.contains_key(&point_id) {
                self.control_point_mut(point_id)?
                    .connected_segments
                    .retain(|connected| connected.segment != id);
            }
        }
        Ok(segment)
    }

    /// Location and rotation of a segment connection.
    pub fn connection_location_and_rotation(&self, connection: &Connection) -> Result<(Vec3, Quat)> {
        let point = self.try_control_point(connection.control_point)?;
        Ok(point.connection_location_and_rotation(connection.socket.as_deref()))
    }

    /// First segment connected to `point`, if any.
    pub fn first_connected_segment(&self, point: ControlPointId) -> Result<Option<SegmentId>> {
        Ok(self
            .try_control_point(point)?
            .connected_segments
            .first()
            .map(|connected| connected.segment))
    }

    /// Flips socketless tangents that point away from the opposite end.
    pub fn auto_flip_tangents(&mut self, id: SegmentId) -> Result<()> {
        let segment = self.try_segment(id)?;
        let (start_location, start_rotation) =
            self.connection_location_and_rotation(segment.connection(SegmentEnd::Start))?;
        let (end_location, end_rotation) =
            self.connection_location_and_rotation(segment.connection(SegmentEnd::End))?;

        let towards_end = (end_location - start_location).normalize_or_zero();
        let segment = self.segment_mut(id)?;

        let start = segment.connection_mut(SegmentEnd::Start);
        if start.socket.is_none() && (towards_end * start.tangent_len).dot(forward(start_rotation)) < 0.0
        {
            start.tangent_len = -start.tangent_len;
        }

        let end = segment.connection_mut(SegmentEnd::End);
        if end.socket.is_none() && (-towards_end * end.tangent_len).dot(forward(end_rotation)) < 0.0 {
            end.tangent_len = -end.tangent_len;
        }
        Ok(())
    }

    /// Points a control point along the average direction of its segments.
    ///
    /// A connection with a negative tangent length contributes the direction
    /// away from its opposite end. Points without usable connections keep
    /// their rotation.
    pub fn auto_calc_rotation(&mut self, id: ControlPointId) -> Result<()> {
        let point = self.try_control_point(id)?;
        let mut direction = Vec3::ZERO;

        for connected in &point.connected_segments {
            let Some(segment) = self.segments.get(&connected.segment) else {
                continue;
            };
            let own = segment.connection(connected.end);
            let other = segment.connection(connected.end.opposite());
            let Some(other_point) = self.control_points.get(&other.control_point) else {
                continue;
            };

            let (own_location, _) = point.connection_location_and_rotation(own.socket.as_deref());
            let (other_location, _) =
                other_point.connection_location_and_rotation(other.socket.as_deref());
            let towards = (other_location - own_location).normalize_or_zero();

            direction += if own.tangent_len < 0.0 { -towards } else { towards };
        }

        if direction.length_squared() > f32::EPSILON {
            self.control_point_mut(id)?.rotation = rotation_from_direction(direction);
        }
        Ok(())
    }

    /// Recomputes a control point's cached samples and those of every
    /// segment attached to it.
    pub fn update_control_point_spline_points(&mut self, id: ControlPointId) -> Result<()> {
        let point = self.try_control_point(id)?;
        let sample = |location: Vec3, rotation: Quat| {
            SplinePoint::new(
                location,
                side_vector(forward(rotation), rotation),
                point.width,
                point.side_falloff,
            )
        };

        let samples: Vec<SplinePoint> = if point.connected_segments.is_empty() {
            vec![sample(point.location, point.rotation)]
        } else {
            point
                .connected_segments
                .iter()
                .filter_map(|connected| {
                    let segment = self.segments.get(&connected.segment)?;
                    let socket = segment.connection(connected.end).socket.as_deref();
                    let (location, rotation) = point.connection_location_and_rotation(socket);
                    Some(sample(location, rotation))
                })
                .collect()
        };
        let attached: BTreeSet<SegmentId> = point
            .connected_segments
            .iter()
            .map(|connected| connected.segment)
            .collect();

        self.control_point_mut(id)?.spline_points = samples;
        for segment in attached {
            if self.segments.contains_key(&segment) {
                self.update_segment_spline_points(segment)?;
            }
        }
        Ok(())
    }

    /// Resamples a segment's Hermite curve into its cache.
    pub fn update_segment_spline_points(&mut self, id: SegmentId) -> Result<()> {
        let segment = self.try_segment(id)?;
        let start_connection = segment.connection(SegmentEnd::Start);
        let end_connection = segment.connection(SegmentEnd::End);
        let start = self.try_control_point(start_connection.control_point)?;
        let end = self.try_control_point(end_connection.control_point)?;

        let (p0, r0) = start.connection_location_and_rotation(start_connection.socket.as_deref());
        let (p1, r1) = end.connection_location_and_rotation(end_connection.socket.as_deref());
        let m0 = forward(r0) * start_connection.tangent_len;
        let m1 = forward(r1) * -end_connection.tangent_len;

        let intervals = segment_intervals(p0.distance(p1));
        let samples: Vec<SplinePoint> = (0..=intervals)
            .map(|i| {
                let t = i as f32 / intervals as f32;
                let center = hermite_point(p0, m0, p1, m1, t);
                let tangent = hermite_tangent(p0, m0, p1, m1, t);
                let side = side_vector(tangent, r0.slerp(r1, t));
                let width = start.width + (end.width - start.width) * t;
                let falloff = start.side_falloff + (end.side_falloff - start.side_falloff) * t;
                SplinePoint::new(center, side, width, falloff)
            })
            .collect();

        self.segment_mut(id)?.spline_points = samples;
        Ok(())
    }

    /// Drops a control point's cached samples.
    pub fn delete_control_point_spline_points(&mut self, id: ControlPointId) -> Result<()> {
        self.control_point_mut(id)?.spline_points.clear();
        Ok(())
    }

    /// Drops a segment's cached samples.
    pub fn delete_segment_spline_points(&mut self, id: SegmentId) -> Result<()> {
        self.segment_mut(id)?.spline_points.clear();
        Ok(())
    }

    /// Drops objects that are no longer reachable.
    ///
    /// Segments with a missing endpoint are removed (and detached from the
    /// endpoint that survived), then back references to missing segments are
    /// pruned. Returns the number of removed segments.
    pub fn reclaim(&mut self) -> usize {
        let dangling: Vec<SegmentId> = self
            .segments
            .iter()
            .filter(|(_, segment)| {
                !self.control_points.contains_key(&segment.start())
                    || !self.control_points.contains_key(&segment.end())
            })
            .map(|(id, _)| *id)
            .collect();

        for id in &dangling {
            // The segment is known to exist, so removal cannot fail.
            let _ = self.remove_segment(*id);
        }

        let stale: Vec<ControlPointId> = self
            .control_points
            .iter()
            .filter(|(_, point)| {
                point
                    .connected_segments
                    .iter()
                    .any(|connected| !self.segments.contains_key(&connected.segment))
            })
            .map(|(id, _)| *id)
            .collect();

        for id in stale {
            self.modify_control_point(id);
            if let Some(point) = self.control_points.get_mut(&id) {
                let segments = &self.segments;
                point
                    .connected_segments
                    .retain(|connected| segments.contains_key(&connected.segment));
            }
        }

        dangling.len()
    }

    /// A copy of the graph without any in-flight journal.
    pub(crate) fn snapshot(&self) -> Self {
        Self {
            journal: None,
            ..self.clone()
        }
    }

    pub(crate) fn begin_journal(&mut self) {
        if self.journal.is_none() {
            self.journal = Some(GraphJournal::default());
        }
    }

    pub(crate) fn take_journal(&mut self) -> Option<GraphJournal> {
        self.journal.take()
    }

    pub(crate) fn meta(&self) -> &GraphMeta {
        &self.meta
    }

    pub(crate) fn restore_meta(&mut self, meta: &GraphMeta) {
        self.meta = meta.clone();
        self.mark_render_state_dirty();
    }

    pub(crate) fn restore_control_point(&mut self, id: ControlPointId, point: Option<&ControlPoint>) {
        match point {
            Some(point) => {
                self.control_points.insert(id, point.clone());
            }
            None => {
                self.control_points.remove(&id);
            }
        }
        self.mark_render_state_dirty();
    }

    pub(crate) fn restore_segment(&mut self, id: SegmentId, segment: Option<&Segment>) {
        match segment {
            Some(segment) => {
                self.segments.insert(id, segment.clone());
            }
            None => {
                self.segments.remove(&id);
            }
        }
        self.mark_render_state_dirty();
    }
}

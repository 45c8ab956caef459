//! Spline graph nodes.

use bevy::prelude::*;

use crate::graph::SegmentId;
use crate::spline::SplinePoint;

/// Which end of a segment a connection is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentEnd {
    Start,
    End,
}

impl SegmentEnd {
    pub fn index(self) -> usize {
        match self {
            SegmentEnd::Start => 0,
            SegmentEnd::End => 1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            SegmentEnd::Start => SegmentEnd::End,
            SegmentEnd::End => SegmentEnd::Start,
        }
    }
}

/// Back reference from a control point to one end of a segment.
///
/// This is a relation, not ownership: the graph owns both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectedSegment {
    pub segment: SegmentId,
    pub end: SegmentEnd,
}

/// Named attachment point on a control point's mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSocket {
    pub name: String,
    /// Offset from the control point, in its local frame.
    pub offset: Vec3,
    /// Rotation relative to the control point; local +X leaves the socket.
    pub rotation: Quat,
}

impl ConnectionSocket {
    pub fn new(name: impl Into<String>, offset: Vec3, rotation: Quat) -> Self {
        Self {
            name: name.into(),
            offset,
            rotation,
        }
    }
}

/// A node of the spline graph.
///
/// Locations are in graph-local space. The rotation faces along local +X.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoint {
    pub location: Vec3,
    pub rotation: Quat,
    pub width: f32,
    pub side_falloff: f32,
    pub end_falloff: f32,
    pub layer_name: String,
    pub mesh: Option<Handle<Mesh>>,
    pub mesh_scale: Vec3,
    /// Sockets provided by `mesh`; empty when there is no mesh.
    pub sockets: Vec<ConnectionSocket>,
    pub place_in_streaming_levels: bool,
    pub enable_collision: bool,
    pub cast_shadow: bool,
    pub(crate) connected_segments: Vec<ConnectedSegment>,
    pub(crate) spline_points: Vec<SplinePoint>,
}

impl Default for ControlPoint {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            width: 10.0,
            side_falloff: 10.0,
            end_falloff: 10.0,
            layer_name: String::new(),
            mesh: None,
            mesh_scale: Vec3::ONE,
            sockets: Vec::new(),
            place_in_streaming_levels: true,
            enable_collision: true,
            cast_shadow: true,
            connected_segments: Vec::new(),
            spline_points: Vec::new(),
        }
    }
}

impl ControlPoint {
    pub fn new(location: Vec3) -> Self {
        Self {
            location,
            ..default()
        }
    }

    pub fn connected_segments(&self) -> &[ConnectedSegment] {
        &self.connected_segments
    }

    /// Cached spline samples; empty until the graph updates this point.
    pub fn spline_points(&self) -> &[SplinePoint] {
        &self.spline_points
    }

    /// Copies the visual and behavioural settings of `previous`.
    ///
    /// Location, rotation and layer are left alone.
    pub fn inherit_from(&mut self, previous: &ControlPoint) {
        self.width = previous.width;
        self.side_falloff = previous.side_falloff;
        self.end_falloff = previous.end_falloff;
        self.mesh = previous.mesh.clone();
        self.mesh_scale = previous.mesh_scale;
        self.sockets = previous.sockets.clone();
        self.place_in_streaming_levels = previous.place_in_streaming_levels;
        self.enable_collision = previous.enable_collision;
        self.cast_shadow = previous.cast_shadow;
    }

    pub fn socket(&self, name: &str) -> Option<&ConnectionSocket> {
        self.sockets.iter().find(|socket| socket.name == name)
    }

    /// Graph-local location and rotation of a socket, or of the point
    /// itself when `socket` is `None` or unknown.
    pub fn connection_location_and_rotation(&self, socket: Option<&str>) -> (Vec3, Quat) {
        match socket.and_then(|name| self.socket(name)) {
            Some(socket) => (
                self.location + self.rotation * (socket.offset * self.mesh_scale),
                self.rotation * socket.rotation,
            ),
            None => (self.location, self.rotation),
        }
    }

    /// Picks the socket that faces `destination` best.
    ///
    /// Scores each socket by the dot product between its outward direction and
    /// the direction from the socket to `destination`. Returns `None` when the
    /// point has no sockets.
    pub fn best_connection_to(&self, destination: Vec3) -> Option<String> {
        self.sockets
            .iter()
            .map(|socket| {
                let (location, rotation) = self.connection_location_and_rotation(Some(&socket.name));
                let towards = (destination - location).normalize_or_zero();
                let score = crate::spline::forward(rotation).dot(towards);
                (socket, score)
            })
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(socket, _)| socket.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_connection_picks_facing_socket() {
        let mut point = ControlPoint::new(Vec3::ZERO);
        point.sockets = vec![
            ConnectionSocket::new("front", Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY),
            ConnectionSocket::new(
                "back",
                Vec3::new(-1.0, 0.0, 0.0),
                Quat::from_rotation_y(std::f32::consts::PI),
            ),
        ];

        assert_eq!(
            point.best_connection_to(Vec3::new(50.0, 0.0, 0.0)).as_deref(),
            Some("front")
        );
        assert_eq!(
            point.best_connection_to(Vec3::new(-50.0, 0.0, 0.0)).as_deref(),
            Some("back")
        );
    }

    #[test]
    fn no_sockets_means_no_connection_name() {
        let point = ControlPoint::new(Vec3::ONE);
        assert_eq!(point.best_connection_to(Vec3::ZERO), None);
        assert_eq!(
            point.connection_location_and_rotation(None),
            (Vec3::ONE, Quat::IDENTITY)
        );
    }
}

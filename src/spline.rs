//! Curve math for spline segments.
//!
//! Control points face along their local +X axis. Segments are cubic Hermite
//! curves between the two connection locations, with tangents taken from the
//! connection rotations scaled by the signed tangent lengths.

use bevy::prelude::*;

/// Target distance between two cached samples on a segment.
pub const SPLINE_SAMPLE_SPACING: f32 = 2.0;

/// Lower bound on intervals per segment (so a segment always has 2 samples).
pub const MIN_SEGMENT_INTERVALS: usize = 1;

/// Upper bound on intervals per segment.
pub const MAX_SEGMENT_INTERVALS: usize = 64;

/// One cached sample of a spline, in graph-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplinePoint {
    pub center: Vec3,
    pub left: Vec3,
    pub right: Vec3,
    pub falloff_left: Vec3,
    pub falloff_right: Vec3,
}

impl SplinePoint {
    /// Builds a sample at `center` spanning `width` across `side`
    /// (unit vector pointing to the right), with `side_falloff` beyond each edge.
    pub fn new(center: Vec3, side: Vec3, width: f32, side_falloff: f32) -> Self {
        let half = side * (width * 0.5);
        let falloff = side * side_falloff;
        Self {
            center,
            left: center - half,
            right: center + half,
            falloff_left: center - half - falloff,
            falloff_right: center + half + falloff,
        }
    }
}

/// Forward direction of a rotation (local +X).
pub fn forward(rotation: Quat) -> Vec3 {
    rotation * Vec3::X
}

/// Right-hand side vector of a horizontal-ish tangent in a Y-up world.
///
/// Falls back to the rotation's local +Z for vertical tangents.
pub fn side_vector(tangent: Vec3, rotation: Quat) -> Vec3 {
    let side = tangent.cross(Vec3::Y);
    if side.length_squared() > f32::EPSILON {
        side.normalize()
    } else {
        rotation * Vec3::Z
    }
}

/// Yaw/pitch rotation that points local +X along `direction`, without roll.
///
/// Returns identity for a zero direction.
pub fn rotation_from_direction(direction: Vec3) -> Quat {
    let Some(dir) = direction.try_normalize() else {
        return Quat::IDENTITY;
    };
    let yaw = (-dir.z).atan2(dir.x);
    let pitch = dir.y.clamp(-1.0, 1.0).asin();
    Quat::from_rotation_y(yaw) * Quat::from_rotation_z(pitch)
}

/// Position on a cubic Hermite curve at `t` in `[0, 1]`.
pub fn hermite_point(p0: Vec3, m0: Vec3, p1: Vec3, m1: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    (2.0 * t3 - 3.0 * t2 + 1.0) * p0
        + (t3 - 2.0 * t2 + t) * m0
        + (-2.0 * t3 + 3.0 * t2) * p1
        + (t3 - t2) * m1
}

/// First derivative of [`hermite_point`].
pub fn hermite_tangent(p0: Vec3, m0: Vec3, p1: Vec3, m1: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    (6.0 * t2 - 6.0 * t) * p0
        + (3.0 * t2 - 4.0 * t + 1.0) * m0
        + (-6.0 * t2 + 6.0 * t) * p1
        + (3.0 * t2 - 2.0 * t) * m1
}

/// Number of intervals to sample a segment spanning `length` with.
pub fn segment_intervals(length: f32) -> usize {
    if !length.is_finite() {
        return MIN_SEGMENT_INTERVALS;
    }
    let intervals = (length / SPLINE_SAMPLE_SPACING).ceil() as usize;
    intervals.clamp(MIN_SEGMENT_INTERVALS, MAX_SEGMENT_INTERVALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-4), "expected {b:?}, got {a:?}");
    }

    #[test]
    fn rotation_points_x_along_direction() {
        for dir in [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Z,
            Vec3::NEG_Z,
            Vec3::new(3.0, 1.0, -2.0),
        ] {
            let rotation = rotation_from_direction(dir);
            assert_close(forward(rotation), dir.normalize());
        }
    }

    #[test]
    fn zero_direction_is_identity() {
        assert_eq!(rotation_from_direction(Vec3::ZERO), Quat::IDENTITY);
    }

    #[test]
    fn hermite_endpoints_and_straight_line() {
        let p0 = Vec3::ZERO;
        let p1 = Vec3::new(10.0, 0.0, 0.0);
        let m = Vec3::new(10.0, 0.0, 0.0);
        assert_close(hermite_point(p0, m, p1, m, 0.0), p0);
        assert_close(hermite_point(p0, m, p1, m, 1.0), p1);
        assert_close(hermite_point(p0, m, p1, m, 0.5), Vec3::new(5.0, 0.0, 0.0));
        assert_close(hermite_tangent(p0, m, p1, m, 0.5), m);
    }

    #[test]
    fn intervals_are_clamped() {
        assert_eq!(segment_intervals(0.0), MIN_SEGMENT_INTERVALS);
        assert_eq!(segment_intervals(5.0), 3);
        assert_eq!(segment_intervals(1.0e6), MAX_SEGMENT_INTERVALS);
        assert_eq!(segment_intervals(f32::NAN), MIN_SEGMENT_INTERVALS);
    }

    #[test]
    fn side_vector_is_right_of_forward() {
        // Facing +X in a Y-up world, the right-hand side is +Z.
        assert_close(side_vector(Vec3::X, Quat::IDENTITY), Vec3::Z);
    }
}

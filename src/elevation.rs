//! Terrain elevation sampling through a ray-cast service.

use bevy::log::debug;
use bevy::prelude::*;

use crate::heightfield::Heightfield;
use crate::landscape::LandscapeId;

/// Half-height of the vertical elevation ray.
pub const ELEVATION_TRACE_EXTENT: f32 = 1_000_000.0;

/// One hit reported by a [`TerrainRaycast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit location.
    pub location: Vec3,
    /// Landscape owning the hit collider; `None` for non-landscape colliders.
    pub landscape: Option<LandscapeId>,
}

/// Ray-cast service queried for terrain heights.
///
/// Implementations return every hit between `start` and `end` against the
/// editor collision, in the order their query produced them.
pub trait TerrainRaycast {
    fn cast_ray(&self, start: Vec3, end: Vec3) -> Vec<RayHit>;
}

/// A world without terrain collision.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTerrain;

impl TerrainRaycast for NoTerrain {
    fn cast_ray(&self, _start: Vec3, _end: Vec3) -> Vec<RayHit> {
        Vec::new()
    }
}

/// Resolves rays against a [`Heightfield`] belonging to `landscape`.
#[derive(Debug, Clone, Copy)]
pub struct HeightfieldRaycast<'a> {
    heightfield: &'a Heightfield,
    landscape: LandscapeId,
}

impl<'a> HeightfieldRaycast<'a> {
    pub fn new(heightfield: &'a Heightfield, landscape: LandscapeId) -> Self {
        Self {
            heightfield,
            landscape,
        }
    }

    fn hit(&self, location: Vec3) -> RayHit {
        RayHit {
            location,
            landscape: Some(self.landscape),
        }
    }
}

impl TerrainRaycast for HeightfieldRaycast<'_> {
    fn cast_ray(&self, start: Vec3, end: Vec3) -> Vec<RayHit> {
        let horizontal = plane(end) - plane(start);

        // Vertical rays hit exactly once if the surface lies within their span.
        if horizontal.length_squared() <= f32::EPSILON {
            let Some(height) = self.heightfield.height_at(plane(start)) else {
                return Vec::new();
            };
            let (low, high) = (start.y.min(end.y), start.y.max(end.y));
            return if (low..=high).contains(&height) {
                vec![self.hit(Vec3::new(start.x, height, start.z))]
            } else {
                Vec::new()
            };
        }

        // March at half the grid spacing and report every surface crossing.
        let steps = (horizontal.length() / (self.heightfield.scale() * 0.5)).ceil() as usize;
        let mut hits = Vec::new();
        let mut previous: Option<(f32, f32)> = None;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let point = start.lerp(end, t);
            let Some(height) = self.heightfield.height_at(plane(point)) else {
                previous = None;
                continue;
            };
            let above = point.y - height;
            if let Some((previous_t, previous_above)) = previous {
                if (previous_above > 0.0) != (above > 0.0) {
                    let blend = previous_above / (previous_above - above);
                    let hit_t = previous_t + (t - previous_t) * blend;
                    hits.push(self.hit(start.lerp(end, hit_t)));
                }
            }
            previous = Some((t, above));
        }
        hits
    }
}

/// Projection of a world position onto the XZ map plane.
fn plane(position: Vec3) -> Vec2 {
    Vec2::new(position.x, position.z)
}

/// World height of `landscape` under a 2D map location.
///
/// Casts from `ELEVATION_TRACE_EXTENT` above to the same distance below the
/// XZ location `(location.x, location.y)` and returns the Y of the first hit
/// on `landscape`'s collision. Returns `0.0` when nothing qualifies.
pub fn sample_elevation(
    raycast: &dyn TerrainRaycast,
    landscape: LandscapeId,
    location: Vec2,
) -> f32 {
    let start = Vec3::new(location.x, ELEVATION_TRACE_EXTENT, location.y);
    let end = Vec3::new(location.x, -ELEVATION_TRACE_EXTENT, location.y);

    match raycast
        .cast_ray(start, end)
        .into_iter()
        .find(|hit| hit.landscape == Some(landscape))
    {
        Some(hit) => hit.location.y,
        None => {
            debug!("no landscape hit at {location}, using elevation 0");
            0.0
        }
    }
}

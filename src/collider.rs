//! Avian3D landscape collision and ray casting.
//!
//! Provides [`build_heightfield_collider`] which converts a [`Heightfield`]
//! into an Avian3D `Collider::heightfield`, the [`LandscapeCollision`] marker
//! that ties a collider to its landscape, and [`SpatialQueryRaycast`], a
//! [`TerrainRaycast`] backed by Avian's spatial queries.

use avian3d::prelude::{Collider, SpatialQuery, SpatialQueryFilter};
use bevy::prelude::*;

use crate::elevation::{RayHit, TerrainRaycast};
use crate::heightfield::Heightfield;
use crate::landscape::LandscapeId;

/// Marks a collider entity as the editor collision of a landscape.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandscapeCollision {
    pub landscape: LandscapeId,
}

/// Builds an Avian3D `Collider::heightfield` from a [`Heightfield`].
///
/// The collider is centered at the origin of its local space, spanning
/// `[-world_width/2, world_width/2]` × `[-world_depth/2, world_depth/2]`
/// in the XZ plane. Heights are in world units.
///
/// Spawn it with a [`LandscapeCollision`] and a `Transform` translated to
/// `origin + (world_width/2, 0, world_depth/2)` so it lines up with
/// [`Heightfield::height_at`].
///
/// # Example
///
/// ```ignore
/// let collider = build_heightfield_collider(&heightfield);
/// commands.spawn((collider, LandscapeCollision { landscape: landscape.id() }, transform));
/// ```
pub fn build_heightfield_collider(heightfield: &Heightfield) -> Collider {
    let w = heightfield.width();
    let d = heightfield.depth();

    // Avian's 3D heightfield expects `heights[row][col]` where:
    //   rows  → subdivisions along X axis (width)
    //   cols  → subdivisions along Z axis (depth)
    let heights: Vec<Vec<f32>> = (0..w)
        .map(|x| (0..d).map(|z| heightfield.get(x, z)).collect())
        .collect();

    let scale = Vec3::new(heightfield.world_width(), 1.0, heightfield.world_depth());

    Collider::heightfield(heights, scale)
}

/// Translation that aligns [`build_heightfield_collider`]'s output with the
/// heightfield's world placement.
pub fn heightfield_collider_transform(heightfield: &Heightfield) -> Transform {
    let center = heightfield.origin()
        + Vec2::new(heightfield.world_width(), heightfield.world_depth()) * 0.5;
    Transform::from_xyz(center.x, 0.0, center.y)
}

/// [`TerrainRaycast`] over Avian's spatial query pipeline.
///
/// Hits on entities carrying [`LandscapeCollision`] are attributed to that
/// landscape; all other hits are reported without one.
pub struct SpatialQueryRaycast<'a, 'w, 's, 'c> {
    spatial: &'a SpatialQuery<'w, 's>,
    collisions: &'a Query<'w, 's, &'c LandscapeCollision>,
}

impl<'a, 'w, 's, 'c> SpatialQueryRaycast<'a, 'w, 's, 'c> {
    pub fn new(
        spatial: &'a SpatialQuery<'w, 's>,
        collisions: &'a Query<'w, 's, &'c LandscapeCollision>,
    ) -> Self {
        Self {
            spatial,
            collisions,
        }
    }
}

impl TerrainRaycast for SpatialQueryRaycast<'_, '_, '_, '_> {
    fn cast_ray(&self, start: Vec3, end: Vec3) -> Vec<RayHit> {
        let delta = end - start;
        let Ok(direction) = Dir3::new(delta) else {
            return Vec::new();
        };

        self.spatial
            .ray_hits(
                start,
                direction,
                delta.length(),
                u32::MAX,
                true,
                &SpatialQueryFilter::default(),
            )
            .into_iter()
            .map(|hit| RayHit {
                location: start + *direction * hit.distance,
                landscape: self
                    .collisions
                    .get(hit.entity)
                    .ok()
                    .map(|collision| collision.landscape),
            })
            .collect()
    }
}

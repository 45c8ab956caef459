//! Regular height grid used as the landscape's editor collision.

use bevy::prelude::*;

/// Heights sampled on a regular grid in the world XZ plane.
///
/// Sample `(x, z)` sits at `origin + (x * scale, z * scale)`; heights are
/// world Y values. Between samples the surface is bilinear.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Heightfield {
    width: usize,
    depth: usize,
    scale: f32,
    origin: Vec2,
    data: Vec<f32>,
}

impl Heightfield {
    /// A flat heightfield of `width × depth` samples at height 0.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is below 2 or `scale` is not positive.
    pub fn new(width: usize, depth: usize, scale: f32) -> Self {
        assert!(
            width >= 2 && depth >= 2,
            "Heightfield needs at least 2×2 samples (got {width}×{depth})"
        );
        assert!(scale > 0.0, "Heightfield scale must be positive (got {scale})");
        Self {
            width,
            depth,
            scale,
            origin: Vec2::ZERO,
            data: vec![0.0; width * depth],
        }
    }

    /// Moves sample `(0, 0)` to `origin` on the XZ plane.
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn world_width(&self) -> f32 {
        (self.width - 1) as f32 * self.scale
    }

    pub fn world_depth(&self) -> f32 {
        (self.depth - 1) as f32 * self.scale
    }

    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.data[z * self.width + x]
    }

    pub fn set(&mut self, x: usize, z: usize, height: f32) {
        self.data[z * self.width + x] = height;
    }

    /// Height under a world XZ location, `None` outside the grid.
    pub fn height_at(&self, location: Vec2) -> Option<f32> {
        let local = (location - self.origin) / self.scale;
        let max_x = (self.width - 1) as f32;
        let max_z = (self.depth - 1) as f32;
        if !(0.0..=max_x).contains(&local.x) || !(0.0..=max_z).contains(&local.y) {
            return None;
        }

        let x0 = (local.x.floor() as usize).min(self.width - 2);
        let z0 = (local.y.floor() as usize).min(self.depth - 2);
        let tx = local.x - x0 as f32;
        let tz = local.y - z0 as f32;

        let near = self.get(x0, z0) + (self.get(x0 + 1, z0) - self.get(x0, z0)) * tx;
        let far = self.get(x0, z0 + 1) + (self.get(x0 + 1, z0 + 1) - self.get(x0, z0 + 1)) * tx;
        Some(near + (far - near) * tz)
    }
}

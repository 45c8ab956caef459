//! Bevy plugin running railway builds from messages.

use bevy::log::warn;
use bevy::prelude::*;

use crate::builder::{BuildReport, build_railway};
use crate::elevation::TerrainRaycast;
use crate::landscape::Landscape;
use crate::settings::RailwayBuildSettings;
use crate::transaction::UndoHistory;
use crate::way::StreetMap;

#[cfg(not(feature = "physics"))]
use crate::elevation::{HeightfieldRaycast, NoTerrain};
#[cfg(not(feature = "physics"))]
use crate::heightfield::Heightfield;

#[cfg(feature = "physics")]
use crate::collider::{LandscapeCollision, SpatialQueryRaycast};
#[cfg(feature = "physics")]
use avian3d::prelude::SpatialQuery;

/// Asks for the railways of `street_map` to be built onto `landscape`.
#[derive(Message, Debug, Clone)]
pub struct BuildRailwayRequest {
    /// Entity with a [`StreetMap`].
    pub street_map: Entity,
    /// Entity with a [`Landscape`].
    pub landscape: Entity,
    pub settings: RailwayBuildSettings,
}

/// Sent after a requested build finished.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RailwayBuilt {
    pub landscape: Entity,
    pub report: BuildReport,
}

/// Registers [`BuildRailwayRequest`] handling and the [`UndoHistory`].
///
/// Without the `physics` feature, terrain heights come from a [`Heightfield`]
/// on the landscape entity (elevation 0 without one). With it, they come from
/// Avian colliders tagged with [`LandscapeCollision`], so Avian's physics
/// plugins must be added as well.
///
/// [`Heightfield`]: crate::heightfield::Heightfield
/// [`LandscapeCollision`]: crate::collider::LandscapeCollision
pub struct RailwayPlugin;

impl Plugin for RailwayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UndoHistory>()
            .add_message::<BuildRailwayRequest>()
            .add_message::<RailwayBuilt>()
            .add_systems(Update, build_requested_railways);
    }
}

fn run_request(
    request: &BuildRailwayRequest,
    street_maps: &Query<&StreetMap>,
    landscape: &mut Landscape,
    transform: Option<&Transform>,
    raycast: &dyn TerrainRaycast,
    history: &mut UndoHistory,
) -> Option<RailwayBuilt> {
    let Ok(street_map) = street_maps.get(request.street_map) else {
        warn!("railway build skipped: {:?} has no StreetMap", request.street_map);
        return None;
    };
    if let Some(transform) = transform {
        landscape.set_transform(*transform);
    }

    match build_railway(street_map, landscape, raycast, &request.settings, history) {
        Ok(report) => Some(RailwayBuilt {
            landscape: request.landscape,
            report,
        }),
        Err(error) => {
            warn!("railway build on {:?} failed: {error}", request.landscape);
            None
        }
    }
}

#[cfg(not(feature = "physics"))]
fn build_requested_railways(
    mut requests: MessageReader<BuildRailwayRequest>,
    mut built: MessageWriter<RailwayBuilt>,
    street_maps: Query<&StreetMap>,
    mut landscapes: Query<(&mut Landscape, Option<&Transform>, Option<&Heightfield>)>,
    mut history: ResMut<UndoHistory>,
) {
    for request in requests.read() {
        let Ok((mut landscape, transform, heightfield)) = landscapes.get_mut(request.landscape)
        else {
            warn!("railway build skipped: {:?} has no Landscape", request.landscape);
            continue;
        };
        let landscape_id = landscape.id();
        let heightfield_raycast = heightfield.map(|field| HeightfieldRaycast::new(field, landscape_id));
        let raycast: &dyn TerrainRaycast = match &heightfield_raycast {
            Some(raycast) => raycast,
            None => &NoTerrain,
        };

        if let Some(result) = run_request(
            request,
            &street_maps,
            &mut landscape,
            transform,
            raycast,
            &mut history,
        ) {
            built.write(result);
        }
    }
}

#[cfg(feature = "physics")]
fn build_requested_railways(
    mut requests: MessageReader<BuildRailwayRequest>,
    mut built: MessageWriter<RailwayBuilt>,
    street_maps: Query<&StreetMap>,
    mut landscapes: Query<(&mut Landscape, Option<&Transform>)>,
    spatial: SpatialQuery,
    collisions: Query<&LandscapeCollision>,
    mut history: ResMut<UndoHistory>,
) {
    let raycast = SpatialQueryRaycast::new(&spatial, &collisions);
    for request in requests.read() {
        let Ok((mut landscape, transform)) = landscapes.get_mut(request.landscape) else {
            warn!("railway build skipped: {:?} has no Landscape", request.landscape);
            continue;
        };

        if let Some(result) = run_request(
            request,
            &street_maps,
            &mut landscape,
            transform,
            &raycast,
            &mut history,
        ) {
            built.write(result);
        }
    }
}

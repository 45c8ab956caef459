//! Railway spline graphs on Bevy landscapes.
//!
//! Lays railway ways imported from street-map data onto a landscape's
//! [`SplineGraph`]: map nodes shared by several ways become one shared
//! [`ControlPoint`], every point is placed on the terrain through a ray-cast
//! service, and consecutive points are joined by [`Segment`]s rendering the
//! railway line mesh. Each build is one undoable [`Transaction`].
//!
//! # Features
//!
//! - **Railway builds**: [`build_railway`] removes the geometry of the previous
//!   build and rebuilds it from a [`RailwaySource`] such as a [`StreetMap`].
//! - **Undo**: [`UndoHistory`] records builds as [`Transaction`]s; use
//!   [`ScopedTransaction`] to record your own edits.
//! - **Editor mesh**: [`SplineEditorMeshBuilder`] turns a graph into a ribbon
//!   [`Mesh`], kept in sync by [`sync_spline_editor_mesh`].
//! - **Plugin**: [`RailwayPlugin`] runs builds requested with
//!   [`BuildRailwayRequest`] messages.
//! - **Physics** (optional, `physics` feature): heightfield colliders and a
//!   ray-cast service over Avian3D spatial queries via [`collider`].
//!
//! # Feature Flags
//!
//! - `physics`: Enables [`collider`], and makes [`RailwayPlugin`] sample
//!   elevations from Avian3D colliders instead of [`Heightfield`] components.
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_symbios_railway::*;
//!
//! fn setup(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
//!     let rail = meshes.add(Cuboid::new(1.0, 0.2, 1.0));
//!     let street_map: StreetMap = serde_json::from_str(OSM_RAILWAYS).unwrap();
//!
//!     let street_map = commands.spawn(street_map).id();
//!     let landscape = commands
//!         .spawn((
//!             Landscape::new(LandscapeId(1), Transform::default()),
//!             Heightfield::new(256, 256, 4.0),
//!             Transform::default(),
//!         ))
//!         .id();
//!
//!     commands.write_message(BuildRailwayRequest {
//!         street_map,
//!         landscape,
//!         settings: RailwayBuildSettings::new(rail).with_width(6.0),
//!     });
//! }
//! ```
//!
//! [`Mesh`]: bevy::prelude::Mesh

pub mod builder;
pub mod control_point;
pub mod editor_mesh;
pub mod elevation;
pub mod error;
pub mod graph;
pub mod heightfield;
pub mod landscape;
pub mod plugin;
pub mod segment;
pub mod settings;
pub mod spline;
pub mod transaction;
pub mod way;

#[cfg(feature = "physics")]
pub mod collider;

pub use builder::{BuildReport, CleanupReport, add_segment, build_railway, clean_old_railways};
pub use control_point::{ConnectedSegment, ConnectionSocket, ControlPoint, SegmentEnd};
pub use editor_mesh::{
    SplineEditorMesh, SplineEditorMeshBuilder, draw_spline_graph_gizmos, sync_spline_editor_mesh,
};
pub use elevation::{HeightfieldRaycast, NoTerrain, RayHit, TerrainRaycast, sample_elevation};
pub use error::{RailwayError, Result};
pub use graph::{ControlPointId, SegmentId, SplineGraph};
pub use heightfield::Heightfield;
pub use landscape::{Landscape, LandscapeId};
pub use plugin::{BuildRailwayRequest, RailwayBuilt, RailwayPlugin};
pub use segment::{Connection, Segment, SplineMeshEntry};
pub use settings::{DEFAULT_RAILWAY_WIDTH, RailwayBuildSettings, SplineMeshAxis};
pub use spline::SplinePoint;
pub use transaction::{GraphDiff, LandscapeChange, ScopedTransaction, Transaction, UndoHistory};
pub use way::{NodeIndex, RailwaySource, RailwayWay, StreetMap};

#[cfg(feature = "physics")]
pub use collider::{
    LandscapeCollision, SpatialQueryRaycast, build_heightfield_collider,
    heightfield_collider_transform,
};

#![cfg(not(feature = "physics"))]

use bevy::prelude::*;
use bevy_symbios_railway::*;

#[derive(Resource, Default)]
struct Built(Vec<RailwayBuilt>);

fn collect_built(mut messages: MessageReader<RailwayBuilt>, mut built: ResMut<Built>) {
    built.0.extend(messages.read().copied());
}

fn app() -> App {
    let mut app = App::new();
    app.add_plugins(RailwayPlugin)
        .init_resource::<Built>()
        .add_systems(Update, collect_built);
    app
}

fn street_map() -> StreetMap {
    serde_json::from_str(
        r#"{ "railways": [
            { "points": [[0.0, 0.0], [10.0, 0.0], [20.0, 0.0]], "node_indices": [5, null, 7] },
            { "points": [[20.0, 0.0], [30.0, 0.0]], "node_indices": [7, null] }
        ] }"#,
    )
    .expect("valid map")
}

#[test]
fn request_builds_onto_the_landscape() {
    let mut meshes = Assets::<Mesh>::default();
    let rail = meshes.add(Cuboid::default());
    let mut app = app();

    let mut heightfield = Heightfield::new(8, 8, 10.0);
    for z in 0..8 {
        for x in 0..8 {
            heightfield.set(x, z, 2.0);
        }
    }
    let map = app.world_mut().spawn(street_map()).id();
    let landscape = app
        .world_mut()
        .spawn((
            Landscape::new(LandscapeId(1), Transform::default()),
            Transform::default(),
            heightfield,
        ))
        .id();

    app.world_mut().write_message(BuildRailwayRequest {
        street_map: map,
        landscape,
        settings: RailwayBuildSettings::new(rail),
    });
    app.update();
    app.update();

    let graph = app
        .world()
        .get::<Landscape>(landscape)
        .unwrap()
        .spline_graph()
        .expect("graph attached");
    assert_eq!(graph.control_point_count(), 4);
    assert_eq!(graph.segment_count(), 3);
    for (_, point) in graph.control_points() {
        assert!((point.location.y - 2.0).abs() < 1e-4);
    }

    assert_eq!(app.world().resource::<UndoHistory>().len(), 1);
    let built = &app.world().resource::<Built>().0;
    assert_eq!(built.len(), 1);
    assert_eq!(built[0].landscape, landscape);
    assert_eq!(built[0].report.created_segments, 3);
}

#[test]
fn entity_transform_is_applied_before_building() {
    let mut meshes = Assets::<Mesh>::default();
    let rail = meshes.add(Cuboid::default());
    let mut app = app();

    let map = app
        .world_mut()
        .spawn(StreetMap::new(vec![RailwayWay::from_points(vec![Vec2::new(60.0, 0.0)])]))
        .id();
    let landscape = app
        .world_mut()
        .spawn((
            Landscape::new(LandscapeId(1), Transform::default()),
            Transform::from_xyz(50.0, 0.0, 0.0),
        ))
        .id();

    app.world_mut().write_message(BuildRailwayRequest {
        street_map: map,
        landscape,
        settings: RailwayBuildSettings::new(rail),
    });
    app.update();

    let graph = app
        .world()
        .get::<Landscape>(landscape)
        .unwrap()
        .spline_graph()
        .unwrap();
    let (_, point) = graph.control_points().next().unwrap();
    assert!(point.location.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-4));
}

#[test]
fn request_without_street_map_is_skipped() {
    let mut meshes = Assets::<Mesh>::default();
    let rail = meshes.add(Cuboid::default());
    let mut app = app();

    let not_a_map = app.world_mut().spawn_empty().id();
    let landscape = app
        .world_mut()
        .spawn(Landscape::new(LandscapeId(1), Transform::default()))
        .id();

    app.world_mut().write_message(BuildRailwayRequest {
        street_map: not_a_map,
        landscape,
        settings: RailwayBuildSettings::new(rail),
    });
    app.update();
    app.update();

    assert!(
        app.world()
            .get::<Landscape>(landscape)
            .unwrap()
            .spline_graph()
            .is_none()
    );
    assert!(app.world().resource::<UndoHistory>().is_empty());
    assert!(app.world().resource::<Built>().0.is_empty());
}

#[test]
fn request_without_landscape_is_skipped() {
    let mut meshes = Assets::<Mesh>::default();
    let rail = meshes.add(Cuboid::default());
    let mut app = app();

    let map = app.world_mut().spawn(street_map()).id();
    let not_a_landscape = app.world_mut().spawn_empty().id();

    app.world_mut().write_message(BuildRailwayRequest {
        street_map: map,
        landscape: not_a_landscape,
        settings: RailwayBuildSettings::new(rail),
    });
    app.update();

    assert!(app.world().resource::<UndoHistory>().is_empty());
}

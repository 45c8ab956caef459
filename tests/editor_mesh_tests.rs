use bevy::prelude::*;
use bevy_symbios_railway::*;

/// A graph with one straight 10-unit segment along +X.
fn straight_graph(scale: Vec3) -> SplineGraph {
    let mut graph = SplineGraph::new(scale);
    let a = graph.add_control_point(ControlPoint::new(Vec3::ZERO));
    let b = graph.add_control_point(ControlPoint::new(Vec3::new(10.0, 0.0, 0.0)));
    add_segment(&mut graph, a, b, true, true).unwrap();
    graph
}

fn positions(mesh: &Mesh) -> Vec<[f32; 3]> {
    mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        .expect("mesh must have positions")
        .as_float3()
        .expect("positions must be Float32x3")
        .to_vec()
}

#[test]
fn empty_graph_gives_empty_mesh() {
    let mesh = SplineEditorMeshBuilder::new().build(&SplineGraph::new(Vec3::ONE));
    assert_eq!(mesh.count_vertices(), 0);
    assert_eq!(mesh.indices().expect("mesh must have indices").len(), 0);
}

#[test]
fn two_vertices_per_sample() {
    let graph = straight_graph(Vec3::ONE);
    let samples = graph.segments().next().unwrap().1.spline_points().len();
    assert_eq!(samples, 6);

    let mesh = SplineEditorMeshBuilder::new().build(&graph);
    assert_eq!(mesh.count_vertices(), samples * 2);
    // (samples - 1) quads × 6 indices each
    assert_eq!(
        mesh.indices().expect("mesh must have indices").len(),
        (samples - 1) * 6
    );
}

#[test]
fn has_all_required_attributes() {
    let mesh = SplineEditorMeshBuilder::new().build(&straight_graph(Vec3::ONE));
    assert!(
        mesh.attribute(Mesh::ATTRIBUTE_POSITION).is_some(),
        "missing POSITION"
    );
    assert!(
        mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some(),
        "missing NORMAL"
    );
    assert!(
        mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some(),
        "missing UV_0"
    );
}

#[test]
fn flat_ribbon_normals_point_up() {
    let mesh = SplineEditorMeshBuilder::new().build(&straight_graph(Vec3::ONE));
    let normals = mesh
        .attribute(Mesh::ATTRIBUTE_NORMAL)
        .expect("mesh must have normals")
        .as_float3()
        .expect("normals must be Float32x3");
    for n in normals {
        assert!(n[1] > 0.99, "flat ribbon normal y should be ~1.0, got {n:?}");
    }
}

#[test]
fn ribbon_spans_the_point_width() {
    let mesh = SplineEditorMeshBuilder::new().build(&straight_graph(Vec3::ONE));
    let positions = positions(&mesh);
    let left = Vec3::from(positions[0]);
    let right = Vec3::from(positions[1]);
    assert!((left.distance(right) - 10.0).abs() < 1e-4);
    assert!(((left + right) * 0.5).abs_diff_eq(Vec3::ZERO, 1e-4));
}

#[test]
fn uvs_tile_along_the_length() {
    let mesh = SplineEditorMeshBuilder::new()
        .with_uv_tile_size(5.0)
        .build(&straight_graph(Vec3::ONE));
    let Some(bevy::mesh::VertexAttributeValues::Float32x2(uvs)) =
        mesh.attribute(Mesh::ATTRIBUTE_UV_0)
    else {
        panic!("UV_0 must be Float32x2");
    };

    assert_eq!(uvs[0], [0.0, 0.0]);
    assert_eq!(uvs[1], [1.0, 0.0]);
    let last = uvs.last().unwrap();
    assert!((last[1] - 2.0).abs() < 1e-3, "10 units over 5-unit tiles, got {last:?}");
}

#[test]
fn vertices_follow_the_graph_scale() {
    let unit = positions(&SplineEditorMeshBuilder::new().build(&straight_graph(Vec3::ONE)));
    let doubled = positions(&SplineEditorMeshBuilder::new().build(&straight_graph(Vec3::splat(2.0))));
    for (a, b) in unit.iter().zip(&doubled) {
        assert!((Vec3::from(*a) * 2.0).abs_diff_eq(Vec3::from(*b), 1e-4));
    }
}

fn sync_app(landscape: Landscape) -> (App, Entity, Handle<Mesh>) {
    let mut app = App::new();
    app.init_resource::<Assets<Mesh>>()
        .add_systems(Update, sync_spline_editor_mesh);
    let handle = app
        .world_mut()
        .resource_mut::<Assets<Mesh>>()
        .add(Cuboid::default());
    let entity = app
        .world_mut()
        .spawn((landscape, SplineEditorMesh::new(handle.clone())))
        .id();
    (app, entity, handle)
}

fn mesh_vertices(app: &App, handle: &Handle<Mesh>) -> usize {
    app.world()
        .resource::<Assets<Mesh>>()
        .get(handle)
        .expect("mesh asset exists")
        .count_vertices()
}

#[test]
fn sync_rebuilds_on_graph_change() {
    let mut landscape = Landscape::new(LandscapeId(1), Transform::default());
    let graph = landscape.ensure_spline_graph(Vec3::ONE);
    let a = graph.add_control_point(ControlPoint::new(Vec3::ZERO));
    let b = graph.add_control_point(ControlPoint::new(Vec3::new(10.0, 0.0, 0.0)));
    add_segment(graph, a, b, true, true).unwrap();

    let (mut app, entity, handle) = sync_app(landscape);
    app.update();
    assert_eq!(mesh_vertices(&app, &handle), 12);

    {
        let mut landscape = app.world_mut().get_mut::<Landscape>(entity).unwrap();
        let graph = landscape.spline_graph_mut().unwrap();
        let c = graph.add_control_point(ControlPoint::new(Vec3::new(20.0, 0.0, 0.0)));
        add_segment(graph, b, c, true, true).unwrap();
    }
    app.update();
    assert_eq!(mesh_vertices(&app, &handle), 24);
}

#[test]
fn hidden_graph_is_not_synced() {
    let mut landscape = Landscape::new(LandscapeId(1), Transform::default());
    let graph = landscape.ensure_spline_graph(Vec3::ONE);
    let a = graph.add_control_point(ControlPoint::new(Vec3::ZERO));
    let b = graph.add_control_point(ControlPoint::new(Vec3::new(10.0, 0.0, 0.0)));
    add_segment(graph, a, b, true, true).unwrap();
    graph.show_editor_mesh(false);

    let cube_vertices = Mesh::from(Cuboid::default()).count_vertices();
    let (mut app, _, handle) = sync_app(landscape);
    app.update();
    assert_eq!(mesh_vertices(&app, &handle), cube_vertices);
}

#[test]
fn marked_dirty_mesh_is_stored_again() {
    let mut landscape = Landscape::new(LandscapeId(1), Transform::default());
    let graph = landscape.ensure_spline_graph(Vec3::ONE);
    let a = graph.add_control_point(ControlPoint::new(Vec3::ZERO));
    let b = graph.add_control_point(ControlPoint::new(Vec3::new(10.0, 0.0, 0.0)));
    add_segment(graph, a, b, true, true).unwrap();

    let (mut app, entity, handle) = sync_app(landscape);
    app.update();
    assert_eq!(mesh_vertices(&app, &handle), 12);

    app.world_mut()
        .resource_mut::<Assets<Mesh>>()
        .insert(&handle, Mesh::from(Cuboid::default()))
        .expect("handle is live");
    app.update();
    assert_ne!(mesh_vertices(&app, &handle), 12, "unchanged revision is skipped");

    app.world_mut()
        .get_mut::<SplineEditorMesh>(entity)
        .unwrap()
        .mark_dirty();
    app.update();
    assert_eq!(mesh_vertices(&app, &handle), 12);
}

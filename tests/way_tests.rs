use bevy::prelude::*;
use bevy_symbios_railway::*;

#[test]
fn parses_points_and_node_indices() {
    let way: RailwayWay = serde_json::from_str(
        r#"{ "points": [[0.0, 0.0], [10.0, 0.0], [20.0, 5.0]], "node_indices": [5, null, 7] }"#,
    )
    .expect("valid way");

    assert_eq!(way.len(), 3);
    assert_eq!(way.points()[2], Vec2::new(20.0, 5.0));
    assert_eq!(
        way.node_indices(),
        &[Some(NodeIndex(5)), None, Some(NodeIndex(7))]
    );
}

#[test]
fn negative_node_index_means_unique_point() {
    let way: RailwayWay =
        serde_json::from_str(r#"{ "points": [[1.0, 2.0], [3.0, 4.0]], "node_indices": [-1, 0] }"#)
            .expect("valid way");
    assert_eq!(way.node_indices(), &[None, Some(NodeIndex(0))]);
}

#[test]
fn missing_node_indices_make_every_point_unique() {
    let way: RailwayWay =
        serde_json::from_str(r#"{ "points": [[1.0, 2.0], [3.0, 4.0]] }"#).expect("valid way");
    assert!(way.node_indices().iter().all(Option::is_none));
    assert_eq!(way.iter().count(), 2);
}

#[test]
fn mismatched_lengths_are_rejected() {
    let parsed: serde_json::Result<RailwayWay> =
        serde_json::from_str(r#"{ "points": [[1.0, 2.0], [3.0, 4.0]], "node_indices": [1] }"#);
    assert!(parsed.is_err());

    assert_eq!(
        RailwayWay::new(vec![Vec2::ZERO], Vec::new()),
        Err(RailwayError::MismatchedNodeIndices {
            points: 1,
            node_indices: 0,
        })
    );
}

#[test]
fn street_map_lists_its_railways() {
    let map: StreetMap = serde_json::from_str(
        r#"{ "railways": [
            { "points": [[0.0, 0.0], [10.0, 0.0]], "node_indices": [1, 2] },
            { "points": [[10.0, 0.0]], "node_indices": [2] }
        ] }"#,
    )
    .expect("valid map");
    assert_eq!(map.railways().len(), 2);

    let empty: StreetMap = serde_json::from_str("{}").expect("railways default to empty");
    assert!(empty.railways().is_empty());
}

#[test]
fn node_index_from_raw() {
    assert_eq!(NodeIndex::from_raw(-1), None);
    assert_eq!(NodeIndex::from_raw(0), Some(NodeIndex(0)));
    assert_eq!(NodeIndex::from_raw(42), Some(NodeIndex(42)));
}

#[test]
fn iter_pairs_points_with_nodes() {
    let mut map = StreetMap::default();
    map.push(
        RailwayWay::new(
            vec![Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)],
            vec![None, Some(NodeIndex(3))],
        )
        .unwrap(),
    );

    let pairs: Vec<_> = map.railways()[0].iter().collect();
    assert_eq!(
        pairs,
        vec![
            (Vec2::new(1.0, 1.0), None),
            (Vec2::new(2.0, 2.0), Some(NodeIndex(3))),
        ]
    );
}

#[test]
fn arrays_and_vecs_are_railway_sources() {
    let way = RailwayWay::from_points(vec![Vec2::ZERO, Vec2::X]);
    let array = [way.clone()];
    let list = vec![way.clone(), way];

    assert_eq!(array.railways().len(), 1);
    assert_eq!(list.railways().len(), 2);
    assert_eq!(array.railways()[0], list.railways()[1]);
}

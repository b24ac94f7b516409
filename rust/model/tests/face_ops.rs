// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests for the face editing operations.

use approx::assert_relative_eq;
use envelope_geometry::{Face3D, Point3, Vector2};
use envelope_model::{
    Aperture, BoundaryCondition, CheckMode, Face, FaceType, Model, Room, Shaded, Units,
};

const TOL: f64 = 0.01;
const ANG_TOL: f64 = 0.017453292519943295; // 1 degree

fn wall_3x3() -> Face {
    Face::from_vertices(
        "wall",
        &[
            [0.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
            [3.0, 0.0, 3.0],
            [0.0, 0.0, 3.0],
        ],
        None,
        None,
    )
    .unwrap()
}

fn square_face(id: &str, size: f64, x_offset: f64) -> Face {
    Face::from_vertices(
        id,
        &[
            [x_offset, 0.0, 0.0],
            [x_offset + size, 0.0, 0.0],
            [x_offset + size, 0.0, size],
            [x_offset, 0.0, size],
        ],
        None,
        None,
    )
    .unwrap()
}

fn triangle_aperture(id: &str, x0: f64) -> Aperture {
    let geometry = Face3D::new(vec![
        Point3::new(x0, 0.0, 1.0),
        Point3::new(x0 + 0.8, 0.0, 1.0),
        Point3::new(x0 + 0.4, 0.0, 1.8),
    ])
    .unwrap();
    Aperture::new(id, geometry).unwrap()
}

#[test]
fn apertures_by_ratio_hits_target_area() {
    for ratio in [0.1, 0.25, 0.5, 0.75, 0.9] {
        let mut face = wall_3x3();
        face.apertures_by_ratio(ratio, TOL, false).unwrap();
        let total: f64 = face.aperture_area();
        assert_relative_eq!(total, ratio * 9.0, epsilon = TOL);
        for aperture in face.apertures() {
            assert!(face
                .geometry()
                .is_sub_face(aperture.geometry(), TOL, ANG_TOL));
        }
    }
}

#[test]
fn apertures_by_ratio_half_on_3x3_wall() {
    // the canonical scenario: 3x3 wall, ratio 0.5, no rect split
    let mut face = wall_3x3();
    face.apertures_by_ratio(0.5, TOL, false).unwrap();
    assert!(!face.apertures().is_empty());
    assert_relative_eq!(face.aperture_area(), 4.5, epsilon = TOL);
    for aperture in face.apertures() {
        assert!(face
            .geometry()
            .is_sub_face(aperture.geometry(), TOL, ANG_TOL));
    }
}

#[test]
fn apertures_by_ratio_replaces_existing_sub_faces() {
    let mut face = wall_3x3();
    face.apertures_by_ratio(0.3, TOL, true).unwrap();
    let first_ids: Vec<String> = face
        .apertures()
        .iter()
        .map(|a| a.identifier().to_string())
        .collect();
    assert!(!first_ids.is_empty());
    face.apertures_by_ratio(0.6, TOL, true).unwrap();
    assert_relative_eq!(face.aperture_area(), 0.6 * 9.0, epsilon = TOL);
}

#[test]
fn apertures_by_ratio_zero_clears() {
    let mut face = wall_3x3();
    face.apertures_by_ratio(0.4, TOL, true).unwrap();
    assert!(face.has_sub_faces());
    face.apertures_by_ratio(0.0, TOL, true).unwrap();
    assert!(!face.has_sub_faces());
}

#[test]
fn apertures_by_ratio_rejects_bad_ratio() {
    let mut face = wall_3x3();
    assert!(face.apertures_by_ratio(1.0, TOL, true).is_err());
    assert!(face.apertures_by_ratio(-0.1, TOL, true).is_err());
}

#[test]
fn apertures_by_ratio_rectangle_respects_inputs() {
    let mut face = wall_3x3();
    face.apertures_by_ratio_rectangle(0.4, 2.0, 0.9, 3.0, 0.0, TOL)
        .unwrap();
    assert_relative_eq!(face.aperture_area(), 3.6, epsilon = TOL);
    for aperture in face.apertures() {
        assert!(face
            .geometry()
            .is_sub_face(aperture.geometry(), TOL, ANG_TOL));
    }
}

#[test]
fn aperture_by_width_height_preserves_existing() {
    let mut face = wall_3x3();
    face.aperture_by_width_height(1.0, 1.0, 0.5, None).unwrap();
    let id = face
        .aperture_by_width_height(0.5, 0.5, 2.0, None)
        .unwrap()
        .unwrap();
    assert_eq!(face.apertures().len(), 2);
    assert_eq!(id, "wall_Glz1");
}

#[test]
fn degenerate_face_is_silently_skipped() {
    let mut sliver = Face::from_vertices(
        "sliver",
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.001],
            [0.0, 0.0, 0.001],
        ],
        None,
        None,
    )
    .unwrap();
    sliver.apertures_by_ratio(0.5, TOL, true).unwrap();
    assert!(!sliver.has_sub_faces());
}

#[test]
fn rectangularize_is_idempotent_on_rectangles() {
    let mut face = wall_3x3();
    face.add_aperture(triangle_aperture("tri", 0.4)).unwrap();
    let changed = face
        .rectangularize_apertures(None, None, false, TOL, ANG_TOL)
        .unwrap();
    assert!(changed);
    for aperture in face.apertures() {
        assert!(aperture.geometry().is_rectangle(ANG_TOL));
    }
    // a second pass over an all-rectangular set reports no change
    let changed_again = face
        .rectangularize_apertures(None, None, false, TOL, ANG_TOL)
        .unwrap();
    assert!(!changed_again);
}

#[test]
fn rectangularize_matches_original_identity() {
    let mut face = wall_3x3();
    face.add_aperture(triangle_aperture("tri", 0.4).with_operable(true))
        .unwrap();
    face.rectangularize_apertures(None, None, false, TOL, ANG_TOL)
        .unwrap();
    assert_eq!(face.apertures().len(), 1);
    // the bounding rectangle contains the original centroid, so the
    // identity and operable flag carry over
    assert_eq!(face.apertures()[0].identifier(), "tri");
    assert!(face.apertures()[0].is_operable());
}

#[test]
fn rectangularize_subdivision_stays_inside_parent() {
    let mut face = wall_3x3();
    face.add_aperture(triangle_aperture("tri", 1.0)).unwrap();
    let changed = face
        .rectangularize_apertures(Some(0.2), None, false, TOL, ANG_TOL)
        .unwrap();
    assert!(changed);
    assert!(!face.apertures().is_empty());
    for aperture in face.apertures() {
        assert!(aperture.geometry().is_rectangle(ANG_TOL));
        assert!(face
            .geometry()
            .is_sub_face(aperture.geometry(), TOL, ANG_TOL));
    }
}

#[test]
fn rectangularize_reopens_boundary_condition() {
    let mut face = wall_3x3();
    face.add_aperture(triangle_aperture("tri", 0.4)).unwrap();
    face.set_boundary_condition(BoundaryCondition::surface(vec!["other".to_string()]))
        .unwrap();
    face.rectangularize_apertures(None, None, false, TOL, ANG_TOL)
        .unwrap();
    assert!(face.boundary_condition().is_outdoors());
}

#[test]
fn fix_invalid_sub_faces_is_noop_without_sub_faces() {
    let mut face = wall_3x3();
    let before = face.geometry().clone();
    face.fix_invalid_sub_faces(true, true, 0.05, TOL).unwrap();
    assert!(!face.has_sub_faces());
    assert_eq!(face.geometry(), &before);
}

#[test]
fn fix_invalid_sub_faces_trims_overhanging_aperture() {
    let mut face = wall_3x3();
    // aperture spilling past the right edge of the wall
    let spilling = Face3D::new(vec![
        Point3::new(2.0, 0.0, 1.0),
        Point3::new(4.0, 0.0, 1.0),
        Point3::new(4.0, 0.0, 2.0),
        Point3::new(2.0, 0.0, 2.0),
    ])
    .unwrap();
    face.add_aperture(Aperture::new("spill", spilling).unwrap())
        .unwrap();
    face.fix_invalid_sub_faces(true, true, 0.05, TOL).unwrap();
    assert_eq!(face.apertures().len(), 1);
    let fixed = face.apertures()[0].geometry();
    assert!(face.geometry().is_sub_face(fixed, TOL, ANG_TOL));
    // clearance from the boundary is at least the offset distance
    assert!(fixed.max().x < 3.0 - 0.04);
}

#[test]
fn fix_invalid_sub_faces_unions_overlaps() {
    let mut face = wall_3x3();
    let square = |x0: f64| {
        Face3D::new(vec![
            Point3::new(x0, 0.0, 1.0),
            Point3::new(x0 + 1.0, 0.0, 1.0),
            Point3::new(x0 + 1.0, 0.0, 2.0),
            Point3::new(x0, 0.0, 2.0),
        ])
        .unwrap()
    };
    face.add_aperture(Aperture::new("a", square(0.5)).unwrap())
        .unwrap();
    face.add_aperture(Aperture::new("b", square(1.0)).unwrap())
        .unwrap();
    face.fix_invalid_sub_faces(false, true, 0.05, TOL).unwrap();
    assert_eq!(face.apertures().len(), 1);
    // union covers the combined footprint
    assert_relative_eq!(face.aperture_area(), 1.5, epsilon = 0.05);
    // identity preserved from the original whose centroid is inside
    assert_eq!(face.apertures()[0].identifier(), "a");
}

#[test]
fn merge_neighboring_sub_faces_joins_across_gap() {
    let mut face = wall_3x3();
    let square = |x0: f64, size: f64| {
        Face3D::new(vec![
            Point3::new(x0, 0.0, 1.0),
            Point3::new(x0 + size, 0.0, 1.0),
            Point3::new(x0 + size, 0.0, 1.0 + size),
            Point3::new(x0, 0.0, 1.0 + size),
        ])
        .unwrap()
    };
    face.add_aperture(Aperture::new("a", square(0.5, 0.8)).unwrap())
        .unwrap();
    face.add_aperture(Aperture::new("b", square(1.4, 0.8)).unwrap())
        .unwrap();
    face.merge_neighboring_sub_faces(0.2, TOL).unwrap();
    assert_eq!(face.apertures().len(), 1);
    assert!(face.aperture_area() > 1.28);
}

#[test]
fn offset_aperture_edges_grows_windows() {
    let mut face = wall_3x3();
    let window = Face3D::new(vec![
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(2.0, 0.0, 1.0),
        Point3::new(2.0, 0.0, 2.0),
        Point3::new(1.0, 0.0, 2.0),
    ])
    .unwrap();
    face.add_aperture(Aperture::new("win", window).unwrap())
        .unwrap();
    face.offset_aperture_edges(0.1, TOL).unwrap();
    assert_relative_eq!(face.aperture_area(), 1.44, epsilon = 1e-6);
    assert!(face
        .geometry()
        .is_sub_face(face.apertures()[0].geometry(), TOL, ANG_TOL));
}

#[test]
fn set_adjacency_pairs_faces_and_sub_faces() {
    let mut face_a = square_face("face_a", 2.0, 0.0);
    let mut face_b = square_face("face_b", 2.0, 0.0);
    let window = |id: &str| {
        Aperture::new(
            id,
            Face3D::new(vec![
                Point3::new(0.5, 0.0, 0.5),
                Point3::new(1.5, 0.0, 0.5),
                Point3::new(1.5, 0.0, 1.5),
                Point3::new(0.5, 0.0, 1.5),
            ])
            .unwrap(),
        )
        .unwrap()
    };
    face_a.add_aperture(window("win_a")).unwrap();
    face_b.add_aperture(window("win_b")).unwrap();
    let info = face_a.set_adjacency(&mut face_b, TOL).unwrap();
    assert_eq!(info.adjacent_apertures.len(), 1);
    match face_a.boundary_condition() {
        BoundaryCondition::Surface(s) => assert_eq!(s.adjacent_object(), Some("face_b")),
        other => panic!("expected surface, got {other:?}"),
    }
    match face_b.boundary_condition() {
        BoundaryCondition::Surface(s) => assert_eq!(s.adjacent_object(), Some("face_a")),
        other => panic!("expected surface, got {other:?}"),
    }
    assert!(face_a.apertures()[0].boundary_condition().is_surface());
    assert!(face_b.apertures()[0].boundary_condition().is_surface());
}

#[test]
fn set_adjacency_without_sub_faces_succeeds() {
    // identical squares offset only in position
    let mut face_a = square_face("face_a", 2.0, 0.0);
    let mut face_b = square_face("face_b", 2.0, 5.0);
    face_a.set_adjacency(&mut face_b, TOL).unwrap();
    assert!(face_a.boundary_condition().is_surface());
    assert!(face_b.boundary_condition().is_surface());
}

#[test]
fn set_adjacency_count_mismatch_raises() {
    let mut face_a = square_face("face_a", 2.0, 0.0);
    let mut face_b = square_face("face_b", 2.0, 0.0);
    let window = |id: &str, x0: f64| {
        Aperture::new(
            id,
            Face3D::new(vec![
                Point3::new(x0, 0.0, 0.5),
                Point3::new(x0 + 0.5, 0.0, 0.5),
                Point3::new(x0 + 0.5, 0.0, 1.0),
                Point3::new(x0, 0.0, 1.0),
            ])
            .unwrap(),
        )
        .unwrap()
    };
    face_a.add_aperture(window("a0", 0.2)).unwrap();
    face_b.add_aperture(window("b0", 0.2)).unwrap();
    face_b.add_aperture(window("b1", 1.0)).unwrap();
    assert!(face_a.set_adjacency(&mut face_b, TOL).is_err());
}

#[test]
fn set_adjacency_unmatched_centers_raise() {
    let mut face_a = square_face("face_a", 2.0, 0.0);
    let mut face_b = square_face("face_b", 2.0, 0.0);
    let window = |id: &str, x0: f64| {
        Aperture::new(
            id,
            Face3D::new(vec![
                Point3::new(x0, 0.0, 0.5),
                Point3::new(x0 + 0.5, 0.0, 0.5),
                Point3::new(x0 + 0.5, 0.0, 1.0),
                Point3::new(x0, 0.0, 1.0),
            ])
            .unwrap(),
        )
        .unwrap()
    };
    face_a.add_aperture(window("a0", 0.2)).unwrap();
    face_b.add_aperture(window("b0", 1.2)).unwrap(); // centers 1m apart
    assert!(face_a.set_adjacency(&mut face_b, TOL).is_err());
}

#[test]
fn louver_count_and_spacing_policies() {
    let mut face = wall_3x3();
    let ids = face
        .louvers_by_count(4, 0.3, 0.0, 0.0, Vector2::new(0.0, 1.0), false, false, TOL, None)
        .unwrap();
    assert_eq!(ids.len(), 4);
    assert_eq!(face.outdoor_shades().len(), 4);

    let mut face = wall_3x3();
    let ids = face
        .louvers_by_distance_between(
            1.0,
            0.3,
            0.0,
            0.0,
            Vector2::new(0.0, 1.0),
            false,
            false,
            TOL,
            Some(2),
            None,
        )
        .unwrap();
    assert_eq!(ids.len(), 2); // capped by max_count
}

#[test]
fn overhang_names_and_places_shade() {
    let mut face = wall_3x3();
    let ids = face.overhang(0.8, 0.0, false, TOL).unwrap();
    assert_eq!(ids.len(), 1);
    assert!(ids[0].starts_with("wall_OutOverhang"));
    let shade = &face.outdoor_shades()[0];
    assert_relative_eq!(shade.geometry().min().z, 3.0, epsilon = 1e-6);
}

#[test]
fn indoor_louvers_land_in_indoor_collection() {
    let mut face = wall_3x3();
    face.louvers_by_count(2, 0.3, 0.0, 0.0, Vector2::new(0.0, 1.0), false, true, TOL, None)
        .unwrap();
    assert_eq!(face.indoor_shades().len(), 2);
    assert!(face.outdoor_shades().is_empty());
}

#[test]
fn model_roundtrip_preserves_everything() {
    let mut room = Room::from_box("room", 4.0, 5.0, 3.0, Point3::origin()).unwrap();
    room.face_mut("room_Front")
        .unwrap()
        .apertures_by_ratio(0.35, TOL, true)
        .unwrap();
    room.face_mut("room_Front")
        .unwrap()
        .overhang(0.6, 0.0, false, TOL)
        .unwrap();
    let mut model = Model::with_rooms("test_model", vec![room]).unwrap();
    model.set_display_name("Test Model");

    let json = model.to_json().unwrap();
    let restored = Model::from_json(&json).unwrap();
    assert_eq!(restored.identifier(), "test_model");
    assert_eq!(restored.display_name(), "Test Model");
    assert_eq!(restored.rooms().len(), 1);
    let face = restored.room("room").unwrap().face("room_Front").unwrap();
    assert_eq!(
        face.apertures().len(),
        model.room("room").unwrap().face("room_Front").unwrap().apertures().len()
    );
    assert_relative_eq!(face.aperture_area(), 0.35 * 12.0, epsilon = TOL);
    assert_eq!(face.outdoor_shades().len(), 1);
    // a second round-trip is byte-identical
    assert_eq!(restored.to_json().unwrap(), json);
}

#[test]
fn convert_units_roundtrip_scale() {
    let room = Room::from_box("room", 3.0, 3.0, 3.0, Point3::origin()).unwrap();
    let mut model = Model::with_rooms("m", vec![room]).unwrap();
    model.convert_to_units(Units::Feet);
    assert_relative_eq!(model.rooms()[0].max().z, 3.0 / 0.3048, epsilon = 1e-6);
    model.convert_to_units(Units::Meters);
    assert_relative_eq!(model.rooms()[0].max().z, 3.0, epsilon = 1e-6);
    assert_relative_eq!(model.tolerance(), 0.01, epsilon = 1e-9);
}

#[test]
fn validation_checks_collect_and_raise() {
    let mut face = wall_3x3();
    // two overlapping windows and one spilling out of the parent
    let geo = |x0: f64, size: f64| {
        Face3D::new(vec![
            Point3::new(x0, 0.0, 1.0),
            Point3::new(x0 + size, 0.0, 1.0),
            Point3::new(x0 + size, 0.0, 1.0 + size),
            Point3::new(x0, 0.0, 1.0 + size),
        ])
        .unwrap()
    };
    face.add_aperture(Aperture::new("a", geo(0.5, 1.0)).unwrap())
        .unwrap();
    face.add_aperture(Aperture::new("b", geo(1.0, 1.0)).unwrap())
        .unwrap();
    face.add_aperture(Aperture::new("c", geo(2.5, 1.0)).unwrap())
        .unwrap();

    let invalid = face
        .check_sub_faces_valid(TOL, ANG_TOL, CheckMode::Collect)
        .unwrap();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].code, "000104");
    assert_eq!(invalid[0].element_id, vec!["c".to_string()]);

    let overlaps = face
        .check_sub_faces_overlapping(TOL, CheckMode::Collect)
        .unwrap();
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].code, "000105");

    assert!(face
        .check_sub_faces_valid(TOL, ANG_TOL, CheckMode::RaiseFirst)
        .is_err());
    assert!(face.check_planar(TOL, CheckMode::RaiseFirst).is_ok());
}

#[test]
fn extension_properties_survive_roundtrip() {
    let mut room = Room::from_box("room", 3.0, 3.0, 3.0, Point3::origin()).unwrap();
    room.face_mut("room_Front")
        .unwrap()
        .properties_mut()
        .set("energy", serde_json::json!({"construction": "Generic Exterior Wall"}));
    let model = Model::with_rooms("m", vec![room]).unwrap();
    let restored = Model::from_json(&model.to_json().unwrap()).unwrap();
    let props = restored
        .room("room")
        .unwrap()
        .face("room_Front")
        .unwrap()
        .properties()
        .get("energy")
        .unwrap();
    assert_eq!(props["construction"], "Generic Exterior Wall");
}

#[test]
fn face_type_assignment_from_normal() {
    let room = Room::from_box("r", 2.0, 2.0, 2.0, Point3::origin()).unwrap();
    assert_eq!(room.face("r_Bottom").unwrap().face_type(), FaceType::Floor);
    assert_eq!(room.face("r_Top").unwrap().face_type(), FaceType::RoofCeiling);
    assert_eq!(room.face("r_Left").unwrap().face_type(), FaceType::Wall);
}

#[test]
fn gridded_apertures_for_skylights() {
    let mut room = Room::from_box("r", 4.0, 4.0, 3.0, Point3::origin()).unwrap();
    let roof = room.face_mut("r_Top").unwrap();
    roof.apertures_by_ratio_gridded(0.05, 2.0, None, TOL).unwrap();
    assert!(!roof.apertures().is_empty());
    assert_relative_eq!(roof.aperture_area(), 0.05 * 16.0, epsilon = TOL);
}

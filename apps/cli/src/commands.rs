// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command implementations: load a model, edit its rooms, write it back.

use std::path::Path;

use anyhow::{ensure, Context};
use envelope_geometry::{Vector2, Vector3};
use envelope_model::{Face, FaceType, Model, Shaded, Units};

/// Loads a model and checks it has a usable tolerance.
fn load_model(model_file: &Path, operation: &str) -> anyhow::Result<Model> {
    let model = Model::from_file(model_file)
        .with_context(|| format!("failed to read model {}", model_file.display()))?;
    ensure!(
        model.tolerance() != 0.0,
        "model must have a non-zero tolerance to use {operation}"
    );
    Ok(model)
}

/// Writes the edited model JSON to a file, or stdout when no path is given.
fn write_model(model: &Model, output_file: Option<&Path>) -> anyhow::Result<()> {
    let json = model.to_json()?;
    match output_file {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn is_outdoor_wall(face: &Face) -> bool {
    face.boundary_condition().is_outdoors() && face.face_type() == FaceType::Wall
}

fn contour_vector(vertical: bool) -> Vector2<f64> {
    if vertical {
        Vector2::new(1.0, 0.0)
    } else {
        Vector2::new(0.0, 1.0)
    }
}

pub fn windows_by_ratio(
    model_file: &Path,
    ratio: f64,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut model = load_model(model_file, "windows-by-ratio")?;
    let tolerance = model.tolerance();
    for room in model.rooms_mut() {
        for face in room.faces_mut() {
            if is_outdoor_wall(face) {
                face.apertures_by_ratio(ratio, tolerance, true)?;
            }
        }
    }
    write_model(&model, output_file)
}

pub fn windows_by_ratio_rect(
    model_file: &Path,
    ratio: f64,
    aperture_height: f64,
    sill_height: f64,
    horizontal_separation: f64,
    vertical_separation: f64,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut model = load_model(model_file, "windows-by-ratio-rect")?;
    let tolerance = model.tolerance();
    for room in model.rooms_mut() {
        for face in room.faces_mut() {
            if is_outdoor_wall(face) {
                face.apertures_by_ratio_rectangle(
                    ratio,
                    aperture_height,
                    sill_height,
                    horizontal_separation,
                    vertical_separation,
                    tolerance,
                )?;
            }
        }
    }
    write_model(&model, output_file)
}

pub fn overhang(
    model_file: &Path,
    depth: f64,
    angle: f64,
    vertical_offset: f64,
    per_window: bool,
    indoor: bool,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut model = load_model(model_file, "overhang")?;
    let tolerance = model.tolerance();
    let offset_vec = Vector3::new(0.0, 0.0, vertical_offset);
    for room in model.rooms_mut() {
        for face in room.faces_mut() {
            if !is_outdoor_wall(face) {
                continue;
            }
            if per_window {
                for aperture in face.apertures_mut() {
                    let ids = aperture.overhang(depth, angle, indoor, tolerance)?;
                    if vertical_offset != 0.0 {
                        for id in &ids {
                            if let Some(shade) = aperture.shade_mut(id) {
                                shade.translate(&offset_vec);
                            }
                        }
                    }
                }
            } else {
                let ids = face.overhang(depth, angle, indoor, tolerance)?;
                if vertical_offset != 0.0 {
                    for id in &ids {
                        if let Some(shade) = face.shade_mut(id) {
                            shade.translate(&offset_vec);
                        }
                    }
                }
            }
        }
    }
    write_model(&model, output_file)
}

#[allow(clippy::too_many_arguments)]
pub fn louvers_by_count(
    model_file: &Path,
    louver_count: usize,
    depth: f64,
    angle: f64,
    offset: f64,
    vertical: bool,
    per_window: bool,
    indoor: bool,
    flip_start: bool,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut model = load_model(model_file, "louvers-by-count")?;
    let tolerance = model.tolerance();
    let contour = contour_vector(vertical);
    for room in model.rooms_mut() {
        for face in room.faces_mut() {
            if !is_outdoor_wall(face) {
                continue;
            }
            if per_window {
                for aperture in face.apertures_mut() {
                    aperture.louvers_by_count(
                        louver_count,
                        depth,
                        offset,
                        angle,
                        contour,
                        flip_start,
                        indoor,
                        tolerance,
                        None,
                    )?;
                }
            } else {
                face.louvers_by_count(
                    louver_count,
                    depth,
                    offset,
                    angle,
                    contour,
                    flip_start,
                    indoor,
                    tolerance,
                    None,
                )?;
            }
        }
    }
    write_model(&model, output_file)
}

#[allow(clippy::too_many_arguments)]
pub fn louvers_by_spacing(
    model_file: &Path,
    spacing: f64,
    depth: f64,
    angle: f64,
    offset: f64,
    vertical: bool,
    max_count: Option<usize>,
    per_window: bool,
    indoor: bool,
    flip_start: bool,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut model = load_model(model_file, "louvers-by-spacing")?;
    let tolerance = model.tolerance();
    let contour = contour_vector(vertical);
    for room in model.rooms_mut() {
        for face in room.faces_mut() {
            if !is_outdoor_wall(face) {
                continue;
            }
            if per_window {
                for aperture in face.apertures_mut() {
                    aperture.louvers_by_distance_between(
                        spacing,
                        depth,
                        offset,
                        angle,
                        contour,
                        flip_start,
                        indoor,
                        tolerance,
                        max_count,
                        None,
                    )?;
                }
            } else {
                face.louvers_by_distance_between(
                    spacing,
                    depth,
                    offset,
                    angle,
                    contour,
                    flip_start,
                    indoor,
                    tolerance,
                    max_count,
                    None,
                )?;
            }
        }
    }
    write_model(&model, output_file)
}

pub fn extruded_border(
    model_file: &Path,
    depth: f64,
    indoor: bool,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut model = load_model(model_file, "extruded-border")?;
    for room in model.rooms_mut() {
        for face in room.faces_mut() {
            if !is_outdoor_wall(face) {
                continue;
            }
            for aperture in face.apertures_mut() {
                aperture.extruded_border(depth, indoor)?;
            }
        }
    }
    write_model(&model, output_file)
}

pub fn solve_adjacency(model_file: &Path, output_file: Option<&Path>) -> anyhow::Result<()> {
    let mut model = load_model(model_file, "solve-adjacency")?;
    let info = model.solve_adjacency()?;
    tracing::info!(
        "paired {} apertures and {} doors",
        info.adjacent_apertures.len(),
        info.adjacent_doors.len()
    );
    write_model(&model, output_file)
}

pub fn convert_units(
    model_file: &Path,
    units: &str,
    no_scale: bool,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut model = Model::from_file(model_file)
        .with_context(|| format!("failed to read model {}", model_file.display()))?;
    let units: Units = units.parse()?;
    if no_scale {
        model.set_units(units);
    } else {
        model.convert_to_units(units);
    }
    write_model(&model, output_file)
}

pub fn fix_sub_faces(
    model_file: &Path,
    offset_distance: f64,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut model = load_model(model_file, "fix-sub-faces")?;
    let tolerance = model.tolerance();
    for room in model.rooms_mut() {
        for face in room.faces_mut() {
            if face.has_sub_faces() {
                face.fix_invalid_sub_faces(true, true, offset_distance, tolerance)?;
            }
        }
    }
    write_model(&model, output_file)
}

pub fn rectangularize(
    model_file: &Path,
    subdivision_distance: Option<f64>,
    max_separation: Option<f64>,
    merge_all: bool,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut model = load_model(model_file, "rectangularize")?;
    let tolerance = model.tolerance();
    let angle_tolerance = model.angle_tolerance();
    let mut changed = 0usize;
    for room in model.rooms_mut() {
        for face in room.faces_mut() {
            if face.rectangularize_apertures(
                subdivision_distance,
                max_separation,
                merge_all,
                tolerance,
                angle_tolerance,
            )? {
                changed += 1;
            }
        }
    }
    tracing::info!("rectangularized apertures on {changed} faces");
    write_model(&model, output_file)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ratio-driven sub-face generation.
//!
//! Every generator here replaces whatever sub-faces a caller had: given a
//! target area ratio (or explicit dimensions) it produces fresh coplanar
//! faces whose combined area hits the target within tolerance, bounded by
//! the parent. Degenerate parents surface as errors for the caller to skip.

use nalgebra::{Point2, Rotation3, Unit, Vector3};

use crate::bool2d;
use crate::error::{Error, Result};
use crate::face3d::Face3D;
use crate::grid;
use crate::plane::Plane;
use crate::polygon::Polygon2D;

/// Angle below which a face normal counts as parallel to the world Z-axis
/// when deriving a reference plane (radians).
const VERTICAL_ANGLE_TOLERANCE: f64 = 0.017453292519943295; // 1 degree

/// Derives a working plane for a face with the Y-axis aligned toward the
/// world Z-axis (or the world Y-axis for near-horizontal faces) and the
/// origin at the face's lower-left corner in that frame.
pub fn reference_plane(face: &Face3D, angle_tolerance: f64) -> Result<Plane> {
    let n = *face.normal();
    let vertical = Vector3::z();
    let vert_ang = (n.dot(&vertical)).clamp(-1.0, 1.0).acos();
    let proj_x = if vert_ang <= angle_tolerance
        || vert_ang >= std::f64::consts::PI - angle_tolerance
    {
        Vector3::x()
    } else {
        let proj_y = (vertical - n * vertical.dot(&n)).normalize();
        Rotation3::from_axis_angle(&Unit::new_normalize(n), -std::f64::consts::FRAC_PI_2) * proj_y
    };
    let temp = Plane::from_normal_x(n, face.boundary()[0], proj_x)?;
    let min = face.polygon_in_plane(&temp).min();
    Plane::from_normal_x(n, temp.xy_to_xyz(&min), proj_x)
}

/// Generates sub-faces covering `ratio` of the face area.
///
/// Convex faces yield a single copy scaled about the centroid; concave
/// faces are triangulated and each triangle is scaled about its own
/// centroid, which keeps every piece inside the parent.
pub fn sub_faces_by_ratio(face: &Face3D, ratio: f64) -> Result<Vec<Face3D>> {
    if ratio <= 0.0 {
        return Ok(Vec::new());
    }
    let scale = ratio.sqrt();
    let poly = face.polygon2d();
    if poly.is_convex() {
        return Ok(vec![face.scaled(scale, &face.centroid())]);
    }
    let verts = poly.vertices();
    let flat: Vec<f64> = verts.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcutr::earcut(&flat, &[], 2)
        .map_err(|e| Error::Triangulation(format!("{e:?}")))?;
    let mut faces = Vec::new();
    for tri in indices.chunks(3) {
        if tri.len() < 3 {
            continue;
        }
        let points = vec![verts[tri[0]], verts[tri[1]], verts[tri[2]]];
        let tri_poly = Polygon2D::new(points)?;
        if tri_poly.area() < 1e-9 {
            continue;
        }
        let scaled = tri_poly.scaled(scale, &tri_poly.centroid());
        faces.push(Face3D::from_polygon(&scaled, face.plane())?);
    }
    Ok(faces)
}

/// Generates sub-faces covering `ratio` of the face area, extracting the
/// rectangular portion of the face first so that the dominant sub-face is a
/// clean rectangle. The non-rectangular remainder (a gable triangle, say)
/// is handled by centroid scaling at the same ratio, which keeps the
/// combined area proportional.
pub fn sub_faces_by_ratio_rectangle(face: &Face3D, ratio: f64, tolerance: f64) -> Result<Vec<Face3D>> {
    if ratio <= 0.0 {
        return Ok(Vec::new());
    }
    let ref_plane = reference_plane(face, VERTICAL_ANGLE_TOLERANCE)?;
    let poly = face.polygon_in_plane(&ref_plane);
    let Some((rect, remainders)) = extract_bottom_rectangle(&poly, tolerance) else {
        return sub_faces_by_ratio(face, ratio);
    };
    let scale = ratio.sqrt();
    let rect_poly = rect.polygon()?;
    let mut faces = vec![Face3D::from_polygon(
        &rect_poly.scaled(scale, &rect_poly.center()),
        &ref_plane,
    )?];
    faces.extend(scaled_remainders(&remainders, scale, &ref_plane, tolerance));
    Ok(faces)
}

/// Generates repeating rectangular sub-faces sized by a target height, sill
/// height and horizontal separation, hitting `ratio` of the face area.
///
/// The ratio takes precedence: when the requested height cannot fit the
/// required area, the dimensions are enlarged; when the sill pushes the
/// windows past the top, the sill drops. A positive `vertical_separation`
/// splits each window into an upper and lower pair when there is room.
pub fn sub_faces_by_ratio_sub_rectangle(
    face: &Face3D,
    ratio: f64,
    aperture_height: f64,
    sill_height: f64,
    horizontal_separation: f64,
    vertical_separation: f64,
    tolerance: f64,
) -> Result<Vec<Face3D>> {
    if ratio <= 0.0 {
        return Ok(Vec::new());
    }
    let ref_plane = reference_plane(face, VERTICAL_ANGLE_TOLERANCE)?;
    let poly = face.polygon_in_plane(&ref_plane);
    let Some((rect, remainders)) = extract_bottom_rectangle(&poly, tolerance) else {
        return sub_faces_by_ratio(face, ratio);
    };
    let windows = windows_in_rectangle(
        &rect,
        ratio,
        aperture_height,
        sill_height,
        horizontal_separation,
        vertical_separation,
        tolerance,
    );
    let mut faces = Vec::with_capacity(windows.len());
    for window in &windows {
        faces.push(Face3D::from_polygon(window, &ref_plane)?);
    }
    faces.extend(scaled_remainders(&remainders, ratio.sqrt(), &ref_plane, tolerance));
    Ok(faces)
}

/// Generates repeating sub-faces of an explicit width and height at a sill
/// height, spaced by the horizontal separation. Faces without a
/// recognizable rectangular portion get no sub-faces.
pub fn sub_faces_by_dimension_rectangle(
    face: &Face3D,
    aperture_height: f64,
    aperture_width: f64,
    sill_height: f64,
    horizontal_separation: f64,
    tolerance: f64,
) -> Result<Vec<Face3D>> {
    if aperture_height <= 0.0 || aperture_width <= 0.0 {
        return Ok(Vec::new());
    }
    let ref_plane = reference_plane(face, VERTICAL_ANGLE_TOLERANCE)?;
    let poly = face.polygon_in_plane(&ref_plane);
    let Some((rect, _)) = extract_bottom_rectangle(&poly, tolerance) else {
        return Ok(Vec::new());
    };
    let count = window_count(rect.width, horizontal_separation);
    let margin = 2.0 * tolerance;
    let width = aperture_width.min(rect.width / count as f64 - margin);
    let height = aperture_height.min(rect.height - margin);
    if width <= tolerance || height <= tolerance {
        return Ok(Vec::new());
    }
    let sill = clamp_sill(sill_height, height, rect.height, tolerance);
    let mut faces = Vec::with_capacity(count);
    for i in 0..count {
        let center_x = rect.min.x + (i as f64 + 0.5) * rect.width / count as f64;
        let window = Polygon2D::from_rectangle(
            Point2::new(center_x - width * 0.5, rect.min.y + sill),
            width,
            height,
        )?;
        faces.push(Face3D::from_polygon(&window, &ref_plane)?);
    }
    Ok(faces)
}

/// Generates sub-faces on a grid derived from the face's own plane, scaled
/// so their combined area covers `ratio` of the face. Falls back to the
/// plain ratio generator when the grid cannot cover the face.
pub fn sub_faces_by_ratio_gridded(
    face: &Face3D,
    ratio: f64,
    x_dim: f64,
    y_dim: Option<f64>,
) -> Result<Vec<Face3D>> {
    if ratio <= 0.0 {
        return Ok(Vec::new());
    }
    let y_dim = y_dim.unwrap_or(x_dim);
    let poly = face.polygon2d();
    let cells = match grid::polygon_grid_cells(&poly, x_dim, y_dim) {
        Ok(cells) if !cells.is_empty() => cells,
        _ => return sub_faces_by_ratio(face, ratio),
    };
    let covered: f64 = cells.iter().map(grid::GridCell::area).sum();
    let scale = (ratio * face.area() / covered).sqrt();
    if scale >= 1.0 {
        return sub_faces_by_ratio(face, ratio);
    }
    let mut faces = Vec::with_capacity(cells.len());
    for cell in &cells {
        let scaled = cell.polygon()?.scaled(scale, &cell.center());
        faces.push(Face3D::from_polygon(&scaled, face.plane())?);
    }
    Ok(faces)
}

/// A maximal axis-aligned rectangle anchored on a polygon's bottom edge.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BottomRect {
    pub min: Point2<f64>,
    pub width: f64,
    pub height: f64,
}

impl BottomRect {
    pub fn polygon(&self) -> Result<Polygon2D> {
        Polygon2D::from_rectangle(self.min, self.width, self.height)
    }
}

/// Finds the tallest full-width rectangle sitting on the polygon's bottom
/// edge that is entirely contained in the polygon, along with the leftover
/// polygon pieces above or beside it. `None` when the bottom edge is not a
/// horizontal span in the reference frame.
pub(crate) fn extract_bottom_rectangle(
    polygon: &Polygon2D,
    tolerance: f64,
) -> Option<(BottomRect, Vec<Polygon2D>)> {
    let min = polygon.min();
    let base_xs: Vec<f64> = polygon
        .vertices()
        .iter()
        .filter(|p| (p.y - min.y).abs() <= tolerance)
        .map(|p| p.x)
        .collect();
    if base_xs.len() < 2 {
        return None;
    }
    let x0 = base_xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let x1 = base_xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if x1 - x0 <= tolerance {
        return None;
    }
    let mut heights: Vec<f64> = polygon
        .vertices()
        .iter()
        .map(|p| p.y - min.y)
        .filter(|&h| h > tolerance)
        .collect();
    heights.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    heights.dedup_by(|a, b| (*a - *b).abs() <= tolerance);
    for height in heights {
        let rect = match Polygon2D::from_rectangle(Point2::new(x0, min.y), x1 - x0, height) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let covered: f64 = bool2d::boolean_intersection(polygon, &rect, tolerance)
            .iter()
            .map(Polygon2D::area)
            .sum();
        if (rect.area() - covered).abs() <= tolerance * rect.perimeter().max(1.0) {
            let remainders = bool2d::boolean_difference(polygon, &[rect], tolerance);
            return Some((
                BottomRect {
                    min: Point2::new(x0, min.y),
                    width: x1 - x0,
                    height,
                },
                remainders,
            ));
        }
    }
    None
}

fn window_count(base: f64, horizontal_separation: f64) -> usize {
    if horizontal_separation <= 0.0 {
        return 1;
    }
    ((base / horizontal_separation).round() as usize).max(1)
}

fn clamp_sill(sill: f64, height: f64, total_height: f64, tolerance: f64) -> f64 {
    if sill + height > total_height - tolerance {
        (total_height - height - tolerance).max(0.0)
    } else {
        sill.max(0.0)
    }
}

fn windows_in_rectangle(
    rect: &BottomRect,
    ratio: f64,
    aperture_height: f64,
    sill_height: f64,
    horizontal_separation: f64,
    vertical_separation: f64,
    tolerance: f64,
) -> Vec<Polygon2D> {
    let base = rect.width;
    let total_height = rect.height;
    let target = ratio * base * total_height;
    if target <= tolerance * tolerance {
        return Vec::new();
    }
    let count = window_count(base, horizontal_separation);
    let margin = 2.0 * tolerance;
    let max_width = base / count as f64 - margin;
    let max_height = total_height - margin;
    if max_width <= tolerance || max_height <= tolerance {
        return Vec::new();
    }
    // the ratio takes precedence over the requested height
    let mut height = aperture_height.clamp(tolerance, max_height);
    let mut width = target / (count as f64 * height);
    if width > max_width {
        width = max_width;
        height = (target / (count as f64 * width)).min(max_height);
    }
    let sill = clamp_sill(sill_height, height, total_height, tolerance);
    let split = vertical_separation > tolerance
        && sill + height + vertical_separation <= total_height - tolerance
        && height * 0.5 > tolerance;
    let mut windows = Vec::new();
    for i in 0..count {
        let center_x = rect.min.x + (i as f64 + 0.5) * base / count as f64;
        let x_lo = center_x - width * 0.5;
        let y_lo = rect.min.y + sill;
        if split {
            let half = height * 0.5;
            if let Ok(lower) =
                Polygon2D::from_rectangle(Point2::new(x_lo, y_lo), width, half)
            {
                windows.push(lower);
            }
            if let Ok(upper) = Polygon2D::from_rectangle(
                Point2::new(x_lo, y_lo + half + vertical_separation),
                width,
                half,
            ) {
                windows.push(upper);
            }
        } else if let Ok(window) =
            Polygon2D::from_rectangle(Point2::new(x_lo, y_lo), width, height)
        {
            windows.push(window);
        }
    }
    windows
}

fn scaled_remainders(
    remainders: &[Polygon2D],
    scale: f64,
    ref_plane: &Plane,
    tolerance: f64,
) -> Vec<Face3D> {
    let mut faces = Vec::new();
    for remainder in remainders {
        let cleaned = match remainder.remove_colinear_vertices(tolerance) {
            Ok(poly) => poly,
            Err(_) => continue, // degenerate sliver left over by the cut
        };
        let scaled = cleaned.scaled(scale, &cleaned.centroid());
        if let Ok(face) = Face3D::from_polygon(&scaled, ref_plane) {
            faces.push(face);
        }
    }
    faces
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn wall_3x3() -> Face3D {
        Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 3.0),
        ])
        .unwrap()
    }

    fn gable_wall() -> Face3D {
        // 4 wide, 2 tall rectangle with a 1-tall triangular gable on top
        Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 2.0),
        ])
        .unwrap()
    }

    fn total_area(faces: &[Face3D]) -> f64 {
        faces.iter().map(Face3D::area).sum()
    }

    #[test]
    fn ratio_on_convex_face_hits_target() {
        let wall = wall_3x3();
        let subs = sub_faces_by_ratio(&wall, 0.5).unwrap();
        assert_eq!(subs.len(), 1);
        assert_relative_eq!(total_area(&subs), 4.5, epsilon = 0.01);
        assert!(wall.is_sub_face(&subs[0], 0.01, 0.02));
    }

    #[test]
    fn ratio_zero_yields_nothing() {
        assert!(sub_faces_by_ratio(&wall_3x3(), 0.0).unwrap().is_empty());
    }

    #[test]
    fn ratio_on_concave_face_hits_target() {
        let ell = Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 4.0),
            Point3::new(0.0, 0.0, 4.0),
        ])
        .unwrap();
        let subs = sub_faces_by_ratio(&ell, 0.25).unwrap();
        assert!(subs.len() > 1);
        assert_relative_eq!(total_area(&subs), 0.25 * ell.area(), epsilon = 0.01);
        for sub in &subs {
            assert!(ell.is_sub_face(sub, 0.01, 0.02));
        }
    }

    #[test]
    fn ratio_rectangle_on_square_wall() {
        let wall = wall_3x3();
        let subs = sub_faces_by_ratio_rectangle(&wall, 0.5, 0.01).unwrap();
        assert_eq!(subs.len(), 1);
        assert_relative_eq!(total_area(&subs), 4.5, epsilon = 0.01);
        assert!(subs[0].is_rectangle(0.02));
    }

    #[test]
    fn ratio_rectangle_on_gable_keeps_proportion() {
        let wall = gable_wall();
        let subs = sub_faces_by_ratio_rectangle(&wall, 0.4, 0.01).unwrap();
        assert!(subs.len() >= 2);
        assert_relative_eq!(total_area(&subs), 0.4 * wall.area(), epsilon = 0.05);
        for sub in &subs {
            assert!(wall.is_sub_face(sub, 0.01, 0.02));
        }
    }

    #[test]
    fn sub_rectangle_windows_hit_ratio() {
        let wall = wall_3x3();
        let subs =
            sub_faces_by_ratio_sub_rectangle(&wall, 0.4, 2.0, 0.9, 3.0, 0.0, 0.01).unwrap();
        assert_eq!(subs.len(), 1);
        assert_relative_eq!(total_area(&subs), 3.6, epsilon = 0.01);
        assert!(wall.is_sub_face(&subs[0], 0.01, 0.02));
    }

    #[test]
    fn sub_rectangle_vertical_separation_splits_windows() {
        let wall = wall_3x3();
        let subs =
            sub_faces_by_ratio_sub_rectangle(&wall, 0.2, 1.0, 0.4, 3.0, 0.3, 0.01).unwrap();
        assert_eq!(subs.len(), 2);
        assert_relative_eq!(total_area(&subs), 1.8, epsilon = 0.01);
    }

    #[test]
    fn dimension_rectangle_repeats_windows() {
        // 6 wide, 3 tall wall with 2m separation: 3 windows of 1 x 1.5
        let wall = Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 3.0),
        ])
        .unwrap();
        let subs = sub_faces_by_dimension_rectangle(&wall, 1.5, 1.0, 0.8, 2.0, 0.01).unwrap();
        assert_eq!(subs.len(), 3);
        assert_relative_eq!(total_area(&subs), 4.5, epsilon = 0.01);
        for sub in &subs {
            assert!(wall.is_sub_face(sub, 0.01, 0.02));
        }
    }

    #[test]
    fn gridded_cells_hit_ratio() {
        let roof = Face3D::new(vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(4.0, 0.0, 3.0),
            Point3::new(4.0, 4.0, 3.0),
            Point3::new(0.0, 4.0, 3.0),
        ])
        .unwrap();
        let subs = sub_faces_by_ratio_gridded(&roof, 0.05, 2.0, None).unwrap();
        assert_eq!(subs.len(), 4);
        assert_relative_eq!(total_area(&subs), 0.05 * 16.0, epsilon = 0.01);
    }

    #[test]
    fn reference_plane_y_points_up_for_walls() {
        let plane = reference_plane(&wall_3x3(), VERTICAL_ANGLE_TOLERANCE).unwrap();
        assert_relative_eq!(plane.y_axis().z, 1.0, epsilon = 1e-9);
        // origin sits at the lower-left corner of the wall
        assert_relative_eq!(plane.origin().z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn bottom_rectangle_of_gable() {
        let wall = gable_wall();
        let ref_plane = reference_plane(&wall, VERTICAL_ANGLE_TOLERANCE).unwrap();
        let poly = wall.polygon_in_plane(&ref_plane);
        let (rect, remainders) = extract_bottom_rectangle(&poly, 0.01).unwrap();
        assert_relative_eq!(rect.width, 4.0, epsilon = 1e-6);
        assert_relative_eq!(rect.height, 2.0, epsilon = 1e-6);
        assert_eq!(remainders.len(), 1);
        assert_relative_eq!(remainders[0].area(), 2.0, epsilon = 1e-6);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prismatic louver and overhang geometry.
//!
//! Louvers are generated as contour fins: scanlines are swept across the
//! face in its reference frame along the contour direction, each in-polygon
//! scanline segment is extruded by the fin depth along the face normal
//! (optionally rotated about the contour axis), and fins shorter than the
//! tolerance are dropped.

use nalgebra::{Point2, Rotation3, Unit, Vector2, Vector3};
use smallvec::SmallVec;

use crate::error::Result;
use crate::face3d::Face3D;
use crate::ratio::reference_plane;

const VERTICAL_ANGLE_TOLERANCE: f64 = 0.017453292519943295; // 1 degree
const SCAN_EPSILON: f64 = 1e-9;

/// Generates `count` contour fins evenly spaced across the face extent.
///
/// `contour_vector` is the 2D direction in the face's reference frame along
/// which the fins vary: (0, 1) gives horizontal louvers on a wall, (1, 0)
/// vertical ones. Fins start from the top/right unless `flip_start` is set.
/// Positive angles rotate the fins downward.
#[allow(clippy::too_many_arguments)]
pub fn contour_fins_by_number(
    face: &Face3D,
    count: usize,
    depth: f64,
    offset: f64,
    angle: f64,
    contour_vector: Vector2<f64>,
    flip_start: bool,
    tolerance: f64,
) -> Result<Vec<Face3D>> {
    if count == 0 || depth.abs() <= tolerance {
        return Ok(Vec::new());
    }
    let frame = ContourFrame::build(face, contour_vector)?;
    let step = frame.extent() / count as f64;
    let positions: Vec<f64> = (0..count)
        .map(|i| {
            if flip_start {
                frame.t_min + i as f64 * step
            } else {
                frame.t_max - i as f64 * step
            }
        })
        .collect();
    frame.fins_at(&positions, depth, offset, angle, tolerance)
}

/// Generates contour fins spaced `distance` apart, filling the face extent
/// from the start side.
#[allow(clippy::too_many_arguments)]
pub fn contour_fins_by_distance_between(
    face: &Face3D,
    distance: f64,
    depth: f64,
    offset: f64,
    angle: f64,
    contour_vector: Vector2<f64>,
    flip_start: bool,
    tolerance: f64,
) -> Result<Vec<Face3D>> {
    if distance <= tolerance || depth.abs() <= tolerance {
        return Ok(Vec::new());
    }
    let frame = ContourFrame::build(face, contour_vector)?;
    let count = (frame.extent() / distance).floor() as usize + 1;
    let positions: Vec<f64> = (0..count)
        .map(|i| {
            if flip_start {
                frame.t_min + i as f64 * distance
            } else {
                frame.t_max - i as f64 * distance
            }
        })
        .collect();
    frame.fins_at(&positions, depth, offset, angle, tolerance)
}

/// The 2D scan frame of a face: its reference plane, projected boundary and
/// the axis along which contour positions run.
struct ContourFrame {
    plane: crate::plane::Plane,
    vertices: Vec<Point2<f64>>,
    axis: Vector2<f64>,
    perp: Vector2<f64>,
    normal: Vector3<f64>,
    t_min: f64,
    t_max: f64,
}

impl ContourFrame {
    fn build(face: &Face3D, contour_vector: Vector2<f64>) -> Result<Self> {
        let plane = reference_plane(face, VERTICAL_ANGLE_TOLERANCE)?;
        let norm = contour_vector.norm();
        let axis = if norm < 1e-12 {
            Vector2::new(0.0, 1.0)
        } else {
            contour_vector / norm
        };
        let perp = Vector2::new(-axis.y, axis.x);
        let vertices: Vec<Point2<f64>> = face
            .boundary()
            .iter()
            .map(|p| plane.xyz_to_xy(p))
            .collect();
        let mut t_min = f64::INFINITY;
        let mut t_max = f64::NEG_INFINITY;
        for v in &vertices {
            let t = v.coords.dot(&axis);
            t_min = t_min.min(t);
            t_max = t_max.max(t);
        }
        Ok(Self {
            plane,
            vertices,
            axis,
            perp,
            normal: *face.normal(),
            t_min,
            t_max,
        })
    }

    fn extent(&self) -> f64 {
        self.t_max - self.t_min
    }

    fn fins_at(
        &self,
        positions: &[f64],
        depth: f64,
        offset: f64,
        angle: f64,
        tolerance: f64,
    ) -> Result<Vec<Face3D>> {
        let mut fins = Vec::new();
        for &t in positions {
            if t < self.t_min - SCAN_EPSILON || t > self.t_max + SCAN_EPSILON {
                continue;
            }
            for (u1, u2) in self.scanline_segments(t) {
                if u2 - u1 <= tolerance {
                    continue; // fin shorter than the tolerance
                }
                let a2 = self.axis * t + self.perp * u1;
                let b2 = self.axis * t + self.perp * u2;
                let mut a3 = self.plane.xy_to_xyz(&Point2::from(a2));
                let mut b3 = self.plane.xy_to_xyz(&Point2::from(b2));
                if offset != 0.0 {
                    a3 += self.normal * offset;
                    b3 += self.normal * offset;
                }
                let contour_axis = match Unit::try_new(b3 - a3, 1e-12) {
                    Some(axis) => axis,
                    None => continue,
                };
                // negative rotation makes positive angles tilt fins downward
                let extrusion =
                    Rotation3::from_axis_angle(&contour_axis, -angle) * self.normal * depth;
                if let Ok(fin) = Face3D::new(vec![a3, b3, b3 + extrusion, a3 + extrusion]) {
                    fins.push(fin);
                }
            }
        }
        Ok(fins)
    }

    /// In-polygon segments of the scanline at contour position `t`, as
    /// sorted (start, end) pairs along the perpendicular axis.
    fn scanline_segments(&self, t: f64) -> Vec<(f64, f64)> {
        let n = self.vertices.len();
        let mut crossings: SmallVec<[f64; 8]> = SmallVec::new();
        for i in 0..n {
            let a = &self.vertices[i];
            let b = &self.vertices[(i + 1) % n];
            let ta = a.coords.dot(&self.axis);
            let tb = b.coords.dot(&self.axis);
            let ua = a.coords.dot(&self.perp);
            let ub = b.coords.dot(&self.perp);
            if (ta - t).abs() <= SCAN_EPSILON && (tb - t).abs() <= SCAN_EPSILON {
                // edge lies on the scanline
                crossings.push(ua);
                crossings.push(ub);
            } else if (ta - t) * (tb - t) <= 0.0 && (ta - tb).abs() > SCAN_EPSILON {
                let f = (t - ta) / (tb - ta);
                crossings.push(ua + (ub - ua) * f);
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        crossings.dedup_by(|a, b| (*a - *b).abs() <= SCAN_EPSILON);
        crossings
            .chunks(2)
            .filter_map(|pair| match pair {
                [u1, u2] => Some((*u1, *u2)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn wall_4x3() -> Face3D {
        Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 3.0),
        ])
        .unwrap()
    }

    #[test]
    fn count_policy_yields_exact_fin_count() {
        let fins = contour_fins_by_number(
            &wall_4x3(),
            3,
            0.5,
            0.0,
            0.0,
            Vector2::new(0.0, 1.0),
            false,
            0.01,
        )
        .unwrap();
        assert_eq!(fins.len(), 3);
        for fin in &fins {
            assert_relative_eq!(fin.area(), 4.0 * 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn single_fin_sits_at_the_top() {
        let fins = contour_fins_by_number(
            &wall_4x3(),
            1,
            1.0,
            0.0,
            0.0,
            Vector2::new(0.0, 1.0),
            false,
            0.01,
        )
        .unwrap();
        assert_eq!(fins.len(), 1);
        // overhang hangs off the top edge of the wall
        assert_relative_eq!(fins[0].min().z, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn flip_start_moves_first_fin_to_the_bottom() {
        let fins = contour_fins_by_number(
            &wall_4x3(),
            1,
            1.0,
            0.0,
            0.0,
            Vector2::new(0.0, 1.0),
            true,
            0.01,
        )
        .unwrap();
        assert_eq!(fins.len(), 1);
        assert_relative_eq!(fins[0].max().z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn spacing_policy_fills_the_extent() {
        let fins = contour_fins_by_distance_between(
            &wall_4x3(),
            1.0,
            0.3,
            0.0,
            0.0,
            Vector2::new(0.0, 1.0),
            false,
            0.01,
        )
        .unwrap();
        // 3m extent at 1m spacing: fins at 3, 2, 1, 0
        assert_eq!(fins.len(), 4);
    }

    #[test]
    fn vertical_contours_run_along_the_width() {
        let fins = contour_fins_by_number(
            &wall_4x3(),
            2,
            0.4,
            0.0,
            0.0,
            Vector2::new(1.0, 0.0),
            false,
            0.01,
        )
        .unwrap();
        assert_eq!(fins.len(), 2);
        // each fin spans the full 3m height
        for fin in &fins {
            assert_relative_eq!(fin.area(), 3.0 * 0.4, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_depth_yields_no_fins() {
        let fins = contour_fins_by_number(
            &wall_4x3(),
            3,
            0.0,
            0.0,
            0.0,
            Vector2::new(0.0, 1.0),
            false,
            0.01,
        )
        .unwrap();
        assert!(fins.is_empty());
    }

    #[test]
    fn offset_moves_fins_off_the_face() {
        let fins = contour_fins_by_number(
            &wall_4x3(),
            1,
            0.5,
            0.2,
            0.0,
            Vector2::new(0.0, 1.0),
            false,
            0.01,
        )
        .unwrap();
        // wall normal is -Y, so the offset pushes fins to negative Y
        assert_relative_eq!(fins[0].max().y, -0.2, epsilon = 1e-6);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar faces in 3D space.
//!
//! A `Face3D` is an oriented planar polygon with optional holes. The holes
//! are how punched geometry (a boundary with sub-face regions removed) is
//! represented: hole contours are carried alongside the boundary rather than
//! being meshed away.

use nalgebra::{Point3, Rotation3, Unit, Vector3};

use crate::error::{Error, Result};
use crate::plane::Plane;
use crate::polygon::Polygon2D;
use crate::segment::Segment3D;

/// An oriented planar polygon in 3D with optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Face3D {
    boundary: Vec<Point3<f64>>,
    holes: Vec<Vec<Point3<f64>>>,
    plane: Plane,
}

impl Face3D {
    /// Creates a face from boundary vertices, deriving the plane from the
    /// winding via Newell's method.
    pub fn new(boundary: Vec<Point3<f64>>) -> Result<Self> {
        if boundary.len() < 3 {
            return Err(Error::InvalidPolygon(format!(
                "face boundary needs at least 3 vertices, got {}",
                boundary.len()
            )));
        }
        let normal = newell_normal(&boundary)?;
        let plane = Plane::new(normal, boundary[0])?;
        Ok(Self {
            boundary,
            holes: Vec::new(),
            plane,
        })
    }

    /// Creates a face from boundary vertices lying in a known plane.
    pub fn new_in_plane(boundary: Vec<Point3<f64>>, plane: Plane) -> Result<Self> {
        if boundary.len() < 3 {
            return Err(Error::InvalidPolygon(format!(
                "face boundary needs at least 3 vertices, got {}",
                boundary.len()
            )));
        }
        Ok(Self {
            boundary,
            holes: Vec::new(),
            plane,
        })
    }

    /// Lifts a 2D polygon into 3D through a plane's coordinate frame.
    pub fn from_polygon(polygon: &Polygon2D, plane: &Plane) -> Result<Self> {
        Self::new_in_plane(
            polygon.vertices().iter().map(|p| plane.xy_to_xyz(p)).collect(),
            plane.clone(),
        )
    }

    /// Creates a face with holes. Hole contours with fewer than 3 vertices
    /// are rejected.
    pub fn with_holes(
        boundary: Vec<Point3<f64>>,
        holes: Vec<Vec<Point3<f64>>>,
        plane: Plane,
    ) -> Result<Self> {
        if boundary.len() < 3 {
            return Err(Error::InvalidPolygon(format!(
                "face boundary needs at least 3 vertices, got {}",
                boundary.len()
            )));
        }
        for hole in &holes {
            if hole.len() < 3 {
                return Err(Error::InvalidPolygon(
                    "face hole needs at least 3 vertices".to_string(),
                ));
            }
        }
        Ok(Self {
            boundary,
            holes,
            plane,
        })
    }

    pub fn boundary(&self) -> &[Point3<f64>] {
        &self.boundary
    }

    pub fn holes(&self) -> &[Vec<Point3<f64>>] {
        &self.holes
    }

    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn normal(&self) -> &Vector3<f64> {
        self.plane.normal()
    }

    /// Boundary vertices (holes excluded).
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.boundary
    }

    /// Face area with hole areas subtracted.
    pub fn area(&self) -> f64 {
        let boundary_area = self.polygon2d().area();
        let hole_area: f64 = self
            .hole_polygons_in_plane(&self.plane)
            .iter()
            .map(Polygon2D::area)
            .sum();
        (boundary_area - hole_area).max(0.0)
    }

    /// Perimeter including the length of hole contours.
    pub fn perimeter(&self) -> f64 {
        let loop_len = |pts: &[Point3<f64>]| -> f64 {
            let n = pts.len();
            (0..n).map(|i| (pts[(i + 1) % n] - pts[i]).norm()).sum()
        };
        loop_len(&self.boundary) + self.holes.iter().map(|h| loop_len(h)).sum::<f64>()
    }

    /// Area centroid, with holes weighted out.
    pub fn centroid(&self) -> Point3<f64> {
        let boundary_poly = self.polygon2d();
        let b_area = boundary_poly.area();
        let b_centroid = boundary_poly.centroid();
        let mut weighted = b_centroid.coords * b_area;
        let mut total = b_area;
        for hole in self.hole_polygons_in_plane(&self.plane) {
            let a = hole.area();
            weighted -= hole.centroid().coords * a;
            total -= a;
        }
        let centroid_2d = if total.abs() < 1e-12 {
            b_centroid
        } else {
            nalgebra::Point2::from(weighted / total)
        };
        self.plane.xy_to_xyz(&centroid_2d)
    }

    /// Center of the 3D bounding box (not the area centroid).
    pub fn center(&self) -> Point3<f64> {
        let (min, max) = self.bounds();
        Point3::from((min.coords + max.coords) * 0.5)
    }

    /// Minimum corner of the 3D bounding box.
    pub fn min(&self) -> Point3<f64> {
        self.bounds().0
    }

    /// Maximum corner of the 3D bounding box.
    pub fn max(&self) -> Point3<f64> {
        self.bounds().1
    }

    fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        let mut min = self.boundary[0];
        let mut max = self.boundary[0];
        for p in self.boundary.iter().chain(self.holes.iter().flatten()) {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        (min, max)
    }

    /// Tilt in radians: 0 pointing up, PI pointing down.
    pub fn tilt(&self) -> f64 {
        self.normal().z.clamp(-1.0, 1.0).acos()
    }

    /// Altitude in radians: +PI/2 pointing up, -PI/2 pointing down.
    pub fn altitude(&self) -> f64 {
        self.normal().z.clamp(-1.0, 1.0).asin()
    }

    /// Azimuth in radians clockwise from the world Y-axis, in [0, 2*PI).
    /// Zero for horizontal faces.
    pub fn azimuth(&self) -> f64 {
        let n = self.normal();
        if n.x.abs() < 1e-12 && n.y.abs() < 1e-12 {
            return 0.0;
        }
        let az = n.x.atan2(n.y);
        if az < 0.0 {
            az + 2.0 * std::f64::consts::PI
        } else {
            az
        }
    }

    /// Boundary projected into an arbitrary plane's 2D frame.
    pub fn polygon_in_plane(&self, plane: &Plane) -> Polygon2D {
        // boundary always has at least 3 vertices
        Polygon2D::new_unchecked(self.boundary.iter().map(|p| plane.xyz_to_xy(p)).collect())
    }

    /// Boundary projected into the face's own plane.
    pub fn polygon2d(&self) -> Polygon2D {
        self.polygon_in_plane(&self.plane)
    }

    /// Hole contours projected into an arbitrary plane's 2D frame.
    pub fn hole_polygons_in_plane(&self, plane: &Plane) -> Vec<Polygon2D> {
        self.holes
            .iter()
            .filter_map(|hole| {
                Polygon2D::new(hole.iter().map(|p| plane.xyz_to_xy(p)).collect()).ok()
            })
            .collect()
    }

    /// True when the boundary is a rectangle within the angle tolerance
    /// (radians) and the face has no holes.
    pub fn is_rectangle(&self, angle_tolerance: f64) -> bool {
        !self.has_holes() && self.polygon2d().is_rectangle(angle_tolerance)
    }

    /// Returns the face with reversed orientation.
    pub fn flip(&self) -> Face3D {
        Face3D {
            boundary: self.boundary.iter().rev().cloned().collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().rev().cloned().collect())
                .collect(),
            plane: self.plane.flip(),
        }
    }

    pub fn translated(&self, vector: &Vector3<f64>) -> Face3D {
        self.map_points(|p| p + vector, self.plane.translated(vector))
    }

    pub fn rotated(&self, axis: &Vector3<f64>, angle: f64, origin: &Point3<f64>) -> Face3D {
        let unit_axis = match Unit::try_new(*axis, 1e-12) {
            Some(a) => a,
            None => return self.clone(), // degenerate axis
        };
        let rotation = Rotation3::from_axis_angle(&unit_axis, angle);
        self.map_points(
            |p| origin + rotation * (p - origin),
            self.plane.rotated(axis, angle, origin),
        )
    }

    /// Rotation in the world XY plane (about the Z-axis through `origin`).
    pub fn rotated_xy(&self, angle: f64, origin: &Point3<f64>) -> Face3D {
        self.rotated(&Vector3::z(), angle, origin)
    }

    /// Scales about an origin point; the factor must be positive.
    pub fn scaled(&self, factor: f64, origin: &Point3<f64>) -> Face3D {
        self.map_points(
            |p| origin + (p - origin) * factor,
            self.plane.scaled(factor, origin),
        )
    }

    /// Reflects across the plane defined by `normal` and `origin`.
    pub fn reflected(&self, normal: &Vector3<f64>, origin: &Point3<f64>) -> Result<Face3D> {
        let m = Unit::try_new(*normal, 1e-12)
            .ok_or_else(|| Error::Degenerate("zero-length reflection normal".to_string()))?
            .into_inner();
        let plane = self.plane.reflected(&m, origin)?;
        Ok(self.map_points(|p| p - m * (2.0 * (p - origin).dot(&m)), plane))
    }

    fn map_points<F>(&self, f: F, plane: Plane) -> Face3D
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        Face3D {
            boundary: self.boundary.iter().map(&f).collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().map(&f).collect())
                .collect(),
            plane,
        }
    }

    /// Removes colinear and duplicate vertices from the boundary and holes.
    /// Holes that degenerate are dropped; a degenerate boundary is an error.
    pub fn remove_colinear_vertices(&self, tolerance: f64) -> Result<Face3D> {
        let cleaned = self.polygon2d().remove_colinear_vertices(tolerance)?;
        let boundary = cleaned
            .vertices()
            .iter()
            .map(|p| self.plane.xy_to_xyz(p))
            .collect();
        let holes = self
            .hole_polygons_in_plane(&self.plane)
            .iter()
            .filter_map(|h| h.remove_colinear_vertices(tolerance).ok())
            .map(|h| {
                h.vertices()
                    .iter()
                    .map(|p| self.plane.xy_to_xyz(p))
                    .collect()
            })
            .collect();
        Ok(Face3D {
            boundary,
            holes,
            plane: self.plane.clone(),
        })
    }

    /// Removes consecutive duplicate vertices within the tolerance.
    pub fn remove_duplicate_vertices(&self, tolerance: f64) -> Result<Face3D> {
        let mut boundary: Vec<Point3<f64>> = Vec::with_capacity(self.boundary.len());
        for p in &self.boundary {
            if boundary.last().map_or(true, |q| (p - q).norm() > tolerance) {
                boundary.push(*p);
            }
        }
        if boundary.len() > 1 {
            let first = boundary[0];
            let last = boundary[boundary.len() - 1];
            if (last - first).norm() <= tolerance {
                boundary.pop();
            }
        }
        if boundary.len() < 3 {
            return Err(Error::Degenerate(
                "face collapsed while removing duplicate vertices".to_string(),
            ));
        }
        Ok(Face3D {
            boundary,
            holes: self.holes.clone(),
            plane: self.plane.clone(),
        })
    }

    /// True when non-adjacent boundary edges cross one another.
    pub fn is_self_intersecting(&self) -> bool {
        self.polygon2d().is_self_intersecting()
    }

    /// True when every vertex lies within `tolerance` of the face plane.
    pub fn is_planar(&self, tolerance: f64) -> bool {
        self.non_planar_vertices(tolerance).is_empty()
    }

    /// Vertices farther than `tolerance` from the face plane.
    pub fn non_planar_vertices(&self, tolerance: f64) -> Vec<Point3<f64>> {
        self.boundary
            .iter()
            .chain(self.holes.iter().flatten())
            .filter(|p| self.plane.signed_distance(p).abs() > tolerance)
            .cloned()
            .collect()
    }

    /// True when `other` is coplanar with this face (within the tolerances)
    /// and fully bounded by it, holes respected.
    pub fn is_sub_face(&self, other: &Face3D, tolerance: f64, angle_tolerance: f64) -> bool {
        let angle = self.plane.angle_to(other.normal());
        if angle > angle_tolerance && angle < std::f64::consts::PI - angle_tolerance {
            return false;
        }
        if other
            .boundary()
            .iter()
            .any(|p| self.plane.signed_distance(p).abs() > tolerance)
        {
            return false;
        }
        let parent = self.polygon2d();
        let sub = other.polygon_in_plane(&self.plane);
        if !parent.is_polygon_inside(&sub) {
            return false;
        }
        self.hole_polygons_in_plane(&self.plane)
            .iter()
            .all(|hole| hole.is_polygon_outside(&sub))
    }

    /// True when the bounding-box centers of the two faces coincide within
    /// the tolerance.
    pub fn is_centered_adjacent(&self, other: &Face3D, tolerance: f64) -> bool {
        (self.center() - other.center()).norm() <= tolerance
    }

    /// Returns this face with the given sub-faces punched as holes.
    pub fn punched(&self, sub_faces: &[&Face3D]) -> Face3D {
        let mut holes = self.holes.clone();
        holes.extend(sub_faces.iter().map(|f| f.boundary.clone()));
        Face3D {
            boundary: self.boundary.clone(),
            holes,
            plane: self.plane.clone(),
        }
    }

    pub fn boundary_segments(&self) -> Vec<Segment3D> {
        loop_segments(&self.boundary)
    }

    /// Segments of every hole contour, flattened.
    pub fn hole_segments(&self) -> Vec<Segment3D> {
        self.holes.iter().flat_map(|h| loop_segments(h)).collect()
    }
}

fn loop_segments(points: &[Point3<f64>]) -> Vec<Segment3D> {
    let n = points.len();
    (0..n)
        .map(|i| Segment3D::new(points[i], points[(i + 1) % n]))
        .collect()
}

/// Polygon normal by Newell's method. Works for any planar polygon, convex
/// or concave; direction follows the right-hand rule of the winding.
pub fn newell_normal(points: &[Point3<f64>]) -> Result<Vector3<f64>> {
    if points.len() < 3 {
        return Err(Error::Degenerate(
            "need at least 3 points for a normal".to_string(),
        ));
    }
    let mut normal: Vector3<f64> = Vector3::zeros();
    let n = points.len();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    let len = normal.norm();
    if len < 1e-15 {
        return Err(Error::Degenerate("degenerate polygon normal".to_string()));
    }
    Ok(normal / len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wall_3x3() -> Face3D {
        // 3x3 wall in the XZ plane, normal pointing -Y
        Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 3.0),
        ])
        .unwrap()
    }

    #[test]
    fn newell_normal_of_wall() {
        let wall = wall_3x3();
        assert_relative_eq!(wall.normal().y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn area_and_perimeter() {
        let wall = wall_3x3();
        assert_relative_eq!(wall.area(), 9.0, epsilon = 1e-12);
        assert_relative_eq!(wall.perimeter(), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn punched_area_subtracts_holes() {
        let wall = wall_3x3();
        let window = Face3D::new(vec![
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
        ])
        .unwrap();
        let punched = wall.punched(&[&window]);
        assert!(punched.has_holes());
        assert_relative_eq!(punched.area(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn sub_face_containment() {
        let wall = wall_3x3();
        let window = Face3D::new(vec![
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
        ])
        .unwrap();
        assert!(wall.is_sub_face(&window, 0.01, 0.017));
        let outside = window.translated(&Vector3::new(5.0, 0.0, 0.0));
        assert!(!wall.is_sub_face(&outside, 0.01, 0.017));
        let tilted = Face3D::new(vec![
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.5, 1.0),
            Point3::new(2.0, 0.5, 2.0),
            Point3::new(1.0, 0.0, 2.0),
        ])
        .unwrap();
        assert!(!wall.is_sub_face(&tilted, 0.01, 0.017));
    }

    #[test]
    fn tilt_altitude_azimuth() {
        let wall = wall_3x3();
        assert_relative_eq!(wall.tilt(), std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
        assert_relative_eq!(wall.altitude(), 0.0, epsilon = 1e-9);
        // normal -Y faces south with Y as north
        assert_relative_eq!(wall.azimuth(), std::f64::consts::PI, epsilon = 1e-9);

        let roof = Face3D::new(vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(3.0, 0.0, 3.0),
            Point3::new(3.0, 3.0, 3.0),
            Point3::new(0.0, 3.0, 3.0),
        ])
        .unwrap();
        assert_relative_eq!(roof.tilt(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn transforms_preserve_area() {
        let wall = wall_3x3();
        let moved = wall.translated(&Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(moved.area(), 9.0, epsilon = 1e-9);
        let rotated = wall.rotated(&Vector3::z(), 1.0, &Point3::origin());
        assert_relative_eq!(rotated.area(), 9.0, epsilon = 1e-9);
        let scaled = wall.scaled(2.0, &Point3::origin());
        assert_relative_eq!(scaled.area(), 36.0, epsilon = 1e-9);
        let reflected = wall
            .reflected(&Vector3::x(), &Point3::origin())
            .unwrap();
        assert_relative_eq!(reflected.area(), 9.0, epsilon = 1e-9);
    }

    #[test]
    fn flip_reverses_normal() {
        let wall = wall_3x3();
        let flipped = wall.flip();
        assert_relative_eq!(flipped.normal().y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(flipped.area(), 9.0, epsilon = 1e-12);
    }

    #[test]
    fn centered_adjacency() {
        let wall = wall_3x3();
        let twin = wall.flip();
        assert!(wall.is_centered_adjacent(&twin, 0.01));
        let moved = wall.translated(&Vector3::new(0.1, 0.0, 0.0));
        assert!(!wall.is_centered_adjacent(&moved, 0.01));
    }

    #[test]
    fn planarity_check_finds_warped_vertex() {
        let warped = Face3D::new_in_plane(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(3.0, 0.5, 3.0),
                Point3::new(0.0, 0.0, 3.0),
            ],
            Plane::new(Vector3::new(0.0, -1.0, 0.0), Point3::origin()).unwrap(),
        )
        .unwrap();
        assert!(!warped.is_planar(0.01));
        assert_eq!(warped.non_planar_vertices(0.01).len(), 1);
    }
}

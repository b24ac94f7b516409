// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygons and the point/containment queries used throughout sub-face
//! reconciliation.

use nalgebra::{Point2, Vector2};

use crate::error::{Error, Result};

/// A simple closed polygon in 2D, stored as an ordered vertex loop without
/// a repeated closing vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2D {
    vertices: Vec<Point2<f64>>,
}

impl Polygon2D {
    /// Creates a polygon from at least 3 vertices.
    pub fn new(vertices: Vec<Point2<f64>>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Error::InvalidPolygon(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self { vertices })
    }

    /// Creates an axis-aligned rectangle from its minimum corner, counter-clockwise.
    pub fn from_rectangle(min: Point2<f64>, width: f64, height: f64) -> Result<Self> {
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidPolygon(format!(
                "rectangle dimensions must be positive, got {width} x {height}"
            )));
        }
        Ok(Self {
            vertices: vec![
                min,
                Point2::new(min.x + width, min.y),
                Point2::new(min.x + width, min.y + height),
                Point2::new(min.x, min.y + height),
            ],
        })
    }

    /// Builds a polygon without the vertex-count check. Callers must
    /// guarantee at least 3 vertices.
    pub(crate) fn new_unchecked(vertices: Vec<Point2<f64>>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Signed area by the shoelace formula.
    /// Positive = counter-clockwise, negative = clockwise.
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.vertices[i].x * self.vertices[j].y;
            area -= self.vertices[j].x * self.vertices[i].y;
        }
        area * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn perimeter(&self) -> f64 {
        let n = self.vertices.len();
        (0..n)
            .map(|i| (self.vertices[(i + 1) % n] - self.vertices[i]).norm())
            .sum()
    }

    /// Area centroid. Falls back to the vertex average for near-zero areas.
    pub fn centroid(&self) -> Point2<f64> {
        let n = self.vertices.len();
        let a = self.signed_area();
        if a.abs() < 1e-12 {
            let sum = self
                .vertices
                .iter()
                .fold(Vector2::zeros(), |acc, p| acc + p.coords);
            return Point2::from(sum / n as f64);
        }
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let p = &self.vertices[i];
            let q = &self.vertices[(i + 1) % n];
            let cross = p.x * q.y - q.x * p.y;
            cx += (p.x + q.x) * cross;
            cy += (p.y + q.y) * cross;
        }
        Point2::new(cx / (6.0 * a), cy / (6.0 * a))
    }

    /// Minimum corner of the bounding rectangle.
    pub fn min(&self) -> Point2<f64> {
        let mut min = self.vertices[0];
        for p in &self.vertices[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
        }
        min
    }

    /// Maximum corner of the bounding rectangle.
    pub fn max(&self) -> Point2<f64> {
        let mut max = self.vertices[0];
        for p in &self.vertices[1..] {
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        max
    }

    /// Center of the bounding rectangle (not the area centroid).
    pub fn center(&self) -> Point2<f64> {
        let min = self.min();
        let max = self.max();
        Point2::new((min.x + max.x) * 0.5, (min.y + max.y) * 0.5)
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn reversed(&self) -> Polygon2D {
        Polygon2D {
            vertices: self.vertices.iter().rev().cloned().collect(),
        }
    }

    /// Returns the polygon with counter-clockwise winding.
    pub fn to_ccw(&self) -> Polygon2D {
        if self.is_clockwise() {
            self.reversed()
        } else {
            self.clone()
        }
    }

    /// Removes duplicate vertices and vertices lying within `tolerance` of
    /// the line through their neighbors.
    ///
    /// Errors if the cleaned polygon degenerates below 3 vertices or below
    /// `tolerance` squared in area.
    pub fn remove_colinear_vertices(&self, tolerance: f64) -> Result<Polygon2D> {
        let n = self.vertices.len();
        let mut kept = Vec::with_capacity(n);
        for i in 0..n {
            let prev = self.vertices[(i + n - 1) % n];
            let curr = self.vertices[i];
            let next = self.vertices[(i + 1) % n];
            if (curr - prev).norm() <= tolerance {
                continue; // duplicate of the previous vertex
            }
            let edge = next - prev;
            let edge_len = edge.norm();
            if edge_len <= tolerance {
                continue;
            }
            let dist = ((curr.x - prev.x) * edge.y - (curr.y - prev.y) * edge.x).abs() / edge_len;
            if dist > tolerance {
                kept.push(curr);
            }
        }
        if kept.len() < 3 {
            return Err(Error::Degenerate(
                "polygon collapsed while removing colinear vertices".to_string(),
            ));
        }
        let cleaned = Polygon2D { vertices: kept };
        if cleaned.area() <= tolerance * tolerance {
            return Err(Error::Degenerate(
                "polygon area below tolerance".to_string(),
            ));
        }
        Ok(cleaned)
    }

    /// True when the polygon has exactly 4 vertices forming corners within
    /// `angle_tolerance` radians of a right angle.
    pub fn is_rectangle(&self, angle_tolerance: f64) -> bool {
        if self.vertices.len() != 4 {
            return false;
        }
        let half_pi = std::f64::consts::FRAC_PI_2;
        for i in 0..4 {
            let prev = self.vertices[(i + 3) % 4];
            let curr = self.vertices[i];
            let next = self.vertices[(i + 1) % 4];
            let a = prev - curr;
            let b = next - curr;
            let denom = a.norm() * b.norm();
            if denom < 1e-12 {
                return false;
            }
            let angle = (a.dot(&b) / denom).clamp(-1.0, 1.0).acos();
            if (angle - half_pi).abs() > angle_tolerance {
                return false;
            }
        }
        true
    }

    /// True when every interior angle turns the same way.
    pub fn is_convex(&self) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut sign = 0i8;
        for i in 0..n {
            let p0 = &self.vertices[i];
            let p1 = &self.vertices[(i + 1) % n];
            let p2 = &self.vertices[(i + 2) % n];
            let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);
            if cross.abs() > 1e-10 {
                let current = if cross > 0.0 { 1i8 } else { -1i8 };
                if sign == 0 {
                    sign = current;
                } else if sign != current {
                    return false;
                }
            }
        }
        true
    }

    /// Point containment by ray casting.
    pub fn is_point_inside(&self, point: &Point2<f64>) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = &self.vertices[i];
            let pj = &self.vertices[j];
            if ((pi.y > point.y) != (pj.y > point.y))
                && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Point containment against the bounding rectangle only.
    pub fn is_point_inside_bound_rect(&self, point: &Point2<f64>) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// True when `other` lies completely inside this polygon.
    pub fn is_polygon_inside(&self, other: &Polygon2D) -> bool {
        if !other.vertices.iter().all(|p| self.is_point_inside(p)) {
            return false;
        }
        !self.edges_intersect(other)
    }

    /// True when `other` lies completely outside this polygon.
    pub fn is_polygon_outside(&self, other: &Polygon2D) -> bool {
        if other.vertices.iter().any(|p| self.is_point_inside(p)) {
            return false;
        }
        if self.vertices.iter().any(|p| other.is_point_inside(p)) {
            return false;
        }
        !self.edges_intersect(other)
    }

    /// True when any boundary edge of this polygon properly crosses any
    /// boundary edge of `other`.
    fn edges_intersect(&self, other: &Polygon2D) -> bool {
        let n = self.vertices.len();
        let m = other.vertices.len();
        for i in 0..n {
            let a1 = self.vertices[i];
            let a2 = self.vertices[(i + 1) % n];
            for j in 0..m {
                let b1 = other.vertices[j];
                let b2 = other.vertices[(j + 1) % m];
                if segments_cross(&a1, &a2, &b1, &b2) {
                    return true;
                }
            }
        }
        false
    }

    /// True when non-adjacent boundary edges cross one another.
    pub fn is_self_intersecting(&self) -> bool {
        let n = self.vertices.len();
        for i in 0..n {
            let a1 = self.vertices[i];
            let a2 = self.vertices[(i + 1) % n];
            for j in (i + 1)..n {
                // skip edges sharing a vertex
                if j == i || (j + 1) % n == i || (i + 1) % n == j {
                    continue;
                }
                let b1 = self.vertices[j];
                let b2 = self.vertices[(j + 1) % n];
                if segments_cross(&a1, &a2, &b1, &b2) {
                    return true;
                }
            }
        }
        false
    }

    /// Offsets the boundary by mitering the edges. Positive distances move
    /// counter-clockwise boundaries inward (shrink), negative outward.
    ///
    /// Errors when the offset collapses or inverts the polygon.
    pub fn offset(&self, distance: f64) -> Result<Polygon2D> {
        if distance == 0.0 {
            return Ok(self.clone());
        }
        let ccw = self.to_ccw();
        let n = ccw.vertices.len();
        let mut offset_lines = Vec::with_capacity(n);
        for i in 0..n {
            let a = ccw.vertices[i];
            let b = ccw.vertices[(i + 1) % n];
            let edge = b - a;
            let len = edge.norm();
            if len < 1e-12 {
                continue;
            }
            // inward normal for a counter-clockwise boundary
            let normal = Vector2::new(-edge.y, edge.x) / len;
            offset_lines.push((a + normal * distance, edge));
        }
        let m = offset_lines.len();
        if m < 3 {
            return Err(Error::Degenerate("offset collapsed polygon".to_string()));
        }
        let mut vertices = Vec::with_capacity(m);
        for i in 0..m {
            let (p1, d1) = offset_lines[(i + m - 1) % m];
            let (p2, d2) = offset_lines[i];
            let cross = d1.x * d2.y - d1.y * d2.x;
            if cross.abs() < 1e-12 {
                vertices.push(p2); // near-parallel edges meet at the moved point
            } else {
                let t = ((p2.x - p1.x) * d2.y - (p2.y - p1.y) * d2.x) / cross;
                vertices.push(p1 + d1 * t);
            }
        }
        let result = Polygon2D { vertices };
        let shrunk_away = distance > 0.0
            && (result.area() >= ccw.area() || result.signed_area() <= 0.0);
        if shrunk_away || result.is_self_intersecting() {
            return Err(Error::Degenerate("offset inverted polygon".to_string()));
        }
        Ok(result)
    }

    /// Scales the polygon about an origin point.
    pub fn scaled(&self, factor: f64, origin: &Point2<f64>) -> Polygon2D {
        Polygon2D {
            vertices: self
                .vertices
                .iter()
                .map(|p| origin + (p - origin) * factor)
                .collect(),
        }
    }

    /// Translates the polygon by a vector.
    pub fn translated(&self, vector: &Vector2<f64>) -> Polygon2D {
        Polygon2D {
            vertices: self.vertices.iter().map(|p| p + vector).collect(),
        }
    }
}

/// Proper crossing test for two segments (shared endpoints do not count).
fn segments_cross(
    a1: &Point2<f64>,
    a2: &Point2<f64>,
    b1: &Point2<f64>,
    b2: &Point2<f64>,
) -> bool {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn orient(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Polygon2D {
        Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn signed_area_ccw_positive() {
        assert_relative_eq!(unit_square().signed_area(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(unit_square().reversed().signed_area(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn centroid_of_square() {
        let c = unit_square().centroid();
        assert_relative_eq!(c.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(c.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn remove_colinear_vertices_drops_midpoints() {
        let poly = Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])
        .unwrap();
        let cleaned = poly.remove_colinear_vertices(0.01).unwrap();
        assert_eq!(cleaned.len(), 4);
    }

    #[test]
    fn remove_colinear_vertices_rejects_sliver() {
        let poly = Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.001),
        ])
        .unwrap();
        assert!(poly.remove_colinear_vertices(0.01).is_err());
    }

    #[test]
    fn rectangle_detection() {
        assert!(unit_square().is_rectangle(0.017));
        let skewed = Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.4, 1.0),
            Point2::new(0.4, 1.0),
        ])
        .unwrap();
        assert!(!skewed.is_rectangle(0.017));
        let triangle = Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 1.0),
        ])
        .unwrap();
        assert!(!triangle.is_rectangle(0.017));
    }

    #[test]
    fn point_containment() {
        let square = unit_square();
        assert!(square.is_point_inside(&Point2::new(0.5, 0.5)));
        assert!(!square.is_point_inside(&Point2::new(1.5, 0.5)));
    }

    #[test]
    fn polygon_containment() {
        let outer = unit_square();
        let inner = outer.scaled(0.5, &Point2::new(0.5, 0.5));
        assert!(outer.is_polygon_inside(&inner));
        assert!(!inner.is_polygon_inside(&outer));
        let shifted = outer.translated(&Vector2::new(5.0, 0.0));
        assert!(outer.is_polygon_outside(&shifted));
    }

    #[test]
    fn self_intersection_bowtie() {
        let bowtie = Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ])
        .unwrap();
        assert!(bowtie.is_self_intersecting());
        assert!(!unit_square().is_self_intersecting());
    }

    #[test]
    fn inward_offset_shrinks() {
        let offset = unit_square().offset(0.1).unwrap();
        assert_relative_eq!(offset.area(), 0.64, epsilon = 1e-9);
    }

    #[test]
    fn outward_offset_grows() {
        let offset = unit_square().offset(-0.5).unwrap();
        assert_relative_eq!(offset.area(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn too_deep_offset_fails() {
        assert!(unit_square().offset(0.6).is_err());
    }

    #[test]
    fn convexity() {
        assert!(unit_square().is_convex());
        let ell = Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ])
        .unwrap();
        assert!(!ell.is_convex());
    }
}

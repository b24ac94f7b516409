// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 3D line segments.

use nalgebra::{Point3, Vector3};

/// A finite line segment in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment3D {
    pub p1: Point3<f64>,
    pub p2: Point3<f64>,
}

impl Segment3D {
    pub fn new(p1: Point3<f64>, p2: Point3<f64>) -> Self {
        Self { p1, p2 }
    }

    /// Direction vector from `p1` to `p2` (not normalized).
    pub fn vector(&self) -> Vector3<f64> {
        self.p2 - self.p1
    }

    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    pub fn midpoint(&self) -> Point3<f64> {
        Point3::from((self.p1.coords + self.p2.coords) * 0.5)
    }

    /// Closest point on the segment to `point`, clamped to the endpoints.
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let v = self.vector();
        let len_sq = v.norm_squared();
        if len_sq < 1e-24 {
            return self.p1;
        }
        let t = ((point - self.p1).dot(&v) / len_sq).clamp(0.0, 1.0);
        self.p1 + v * t
    }

    /// Distance from `point` to the closest point on the segment.
    pub fn distance_to_point(&self, point: &Point3<f64>) -> f64 {
        (point - self.closest_point(point)).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let seg = Segment3D::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0));
        let closest = seg.closest_point(&Point3::new(-1.0, 1.0, 0.0));
        assert_relative_eq!(closest.x, 0.0, epsilon = 1e-12);
        let closest = seg.closest_point(&Point3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(closest.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn distance_to_interior_point() {
        let seg = Segment3D::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(
            seg.distance_to_point(&Point3::new(1.0, 3.0, 0.0)),
            3.0,
            epsilon = 1e-12
        );
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planes with an in-plane coordinate frame.
//!
//! Unlike a plain point-and-normal plane, every `Plane` here carries
//! orthonormal X/Y axes so that 3D points can be projected to 2D plane
//! coordinates and back without losing orientation. All of the 2D sub-face
//! reconciliation work happens in these frames.

use nalgebra::{Point2, Point3, Rotation3, Unit, Vector3};

use crate::error::{Error, Result};

const AXIS_EPSILON: f64 = 1e-12;

/// A plane in 3D space with an orthonormal in-plane coordinate frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    n: Vector3<f64>,
    o: Point3<f64>,
    x: Vector3<f64>,
    y: Vector3<f64>,
}

impl Plane {
    /// Creates a plane from a normal and an origin point.
    ///
    /// The X-axis is derived automatically: horizontal (perpendicular to the
    /// world Z-axis) whenever the normal allows it, world X for horizontal
    /// planes. The Y-axis completes a right-handed frame, which means it
    /// points "up" for vertical planes.
    pub fn new(normal: Vector3<f64>, origin: Point3<f64>) -> Result<Self> {
        let norm = normal.norm();
        if norm < AXIS_EPSILON {
            return Err(Error::Degenerate("zero-length plane normal".to_string()));
        }
        let n = normal / norm;
        let x = if n.x.abs() < AXIS_EPSILON && n.y.abs() < AXIS_EPSILON {
            Vector3::x()
        } else {
            Vector3::z().cross(&n).normalize()
        };
        let y = n.cross(&x);
        Ok(Self { n, o: origin, x, y })
    }

    /// Creates a plane from a normal, an origin and an explicit X-axis.
    ///
    /// The X-axis is projected into the plane and normalized; an X-axis
    /// parallel to the normal is rejected.
    pub fn from_normal_x(
        normal: Vector3<f64>,
        origin: Point3<f64>,
        x_axis: Vector3<f64>,
    ) -> Result<Self> {
        let norm = normal.norm();
        if norm < AXIS_EPSILON {
            return Err(Error::Degenerate("zero-length plane normal".to_string()));
        }
        let n = normal / norm;
        let in_plane = x_axis - n * x_axis.dot(&n);
        let x_norm = in_plane.norm();
        if x_norm < AXIS_EPSILON {
            return Err(Error::Degenerate(
                "plane x-axis is parallel to the normal".to_string(),
            ));
        }
        let x = in_plane / x_norm;
        let y = n.cross(&x);
        Ok(Self { n, o: origin, x, y })
    }

    /// The unit normal of the plane.
    pub fn normal(&self) -> &Vector3<f64> {
        &self.n
    }

    /// The origin of the in-plane coordinate frame.
    pub fn origin(&self) -> &Point3<f64> {
        &self.o
    }

    /// The in-plane X-axis.
    pub fn x_axis(&self) -> &Vector3<f64> {
        &self.x
    }

    /// The in-plane Y-axis.
    pub fn y_axis(&self) -> &Vector3<f64> {
        &self.y
    }

    /// Signed distance from a point to the plane (positive on the normal side).
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.o).dot(&self.n)
    }

    /// Projects a 3D point into 2D plane coordinates.
    pub fn xyz_to_xy(&self, point: &Point3<f64>) -> Point2<f64> {
        let d = point - self.o;
        Point2::new(d.dot(&self.x), d.dot(&self.y))
    }

    /// Maps 2D plane coordinates back into 3D space.
    pub fn xy_to_xyz(&self, point: &Point2<f64>) -> Point3<f64> {
        self.o + self.x * point.x + self.y * point.y
    }

    /// Projects a 3D point onto the plane along the normal.
    pub fn project_point(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.n * self.signed_distance(point)
    }

    /// Angle in radians between this plane's normal and another vector.
    pub fn angle_to(&self, vector: &Vector3<f64>) -> f64 {
        let denom = vector.norm();
        if denom < AXIS_EPSILON {
            return 0.0;
        }
        (self.n.dot(vector) / denom).clamp(-1.0, 1.0).acos()
    }

    /// Returns the plane with its normal reversed.
    ///
    /// The X-axis is kept so that the frame stays right-handed (the Y-axis
    /// flips along with the normal).
    pub fn flip(&self) -> Plane {
        Plane {
            n: -self.n,
            o: self.o,
            x: self.x,
            y: -self.y,
        }
    }

    /// Translates the plane origin by a vector.
    pub fn translated(&self, vector: &Vector3<f64>) -> Plane {
        Plane {
            n: self.n,
            o: self.o + vector,
            x: self.x,
            y: self.y,
        }
    }

    /// Rotates the plane about an arbitrary axis through an origin point.
    pub fn rotated(&self, axis: &Vector3<f64>, angle: f64, origin: &Point3<f64>) -> Plane {
        let unit_axis = match Unit::try_new(*axis, AXIS_EPSILON) {
            Some(a) => a,
            None => return self.clone(), // degenerate axis
        };
        let rotation = Rotation3::from_axis_angle(&unit_axis, angle);
        Plane {
            n: rotation * self.n,
            o: origin + rotation * (self.o - origin),
            x: rotation * self.x,
            y: rotation * self.y,
        }
    }

    /// Scales the plane origin relative to a point (axes are unchanged;
    /// factors must be positive).
    pub fn scaled(&self, factor: f64, origin: &Point3<f64>) -> Plane {
        Plane {
            n: self.n,
            o: origin + (self.o - origin) * factor,
            x: self.x,
            y: self.y,
        }
    }

    /// Reflects the plane across the plane defined by `normal` and `origin`.
    ///
    /// The returned normal is negated after mirroring so that it stays
    /// consistent with the winding of reflected boundary points.
    pub fn reflected(&self, normal: &Vector3<f64>, origin: &Point3<f64>) -> Result<Plane> {
        let m = match Unit::try_new(*normal, AXIS_EPSILON) {
            Some(a) => a.into_inner(),
            None => {
                return Err(Error::Degenerate(
                    "zero-length reflection normal".to_string(),
                ))
            }
        };
        let reflect_vec = |v: &Vector3<f64>| v - m * (2.0 * v.dot(&m));
        let reflect_pt =
            |p: &Point3<f64>| p - m * (2.0 * (p - origin).dot(&m));
        Plane::from_normal_x(-reflect_vec(&self.n), reflect_pt(&self.o), reflect_vec(&self.x))
    }
}

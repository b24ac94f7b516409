// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary condition tags.
//!
//! Classifies what lies on the far side of a face: outdoor air, ground,
//! another face (Surface), an adiabatic no-exchange boundary, or an
//! extension-defined condition this crate treats as opaque.

use std::fmt;

use nalgebra::Point3;

/// What lies on the far side of a face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryCondition {
    Outdoors,
    Ground,
    Adiabatic,
    /// Paired with another face; carries the linked object identifiers.
    Surface(SurfaceBc),
    /// Extension-defined condition, carried through by name.
    Other(String),
}

/// The identifier chain of a Surface boundary condition: the adjacent
/// object first (sub-face or face), followed by its parents when known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SurfaceBc {
    pub boundary_condition_objects: Vec<String>,
}

impl SurfaceBc {
    pub fn new(boundary_condition_objects: Vec<String>) -> Self {
        Self {
            boundary_condition_objects,
        }
    }

    /// Identifier of the directly adjacent object.
    pub fn adjacent_object(&self) -> Option<&str> {
        self.boundary_condition_objects.first().map(String::as_str)
    }
}

impl BoundaryCondition {
    /// Builds a Surface condition from the adjacent object's identifier
    /// chain.
    pub fn surface(boundary_condition_objects: Vec<String>) -> BoundaryCondition {
        BoundaryCondition::Surface(SurfaceBc::new(boundary_condition_objects))
    }

    /// Default condition for a boundary: Ground when every vertex lies at
    /// or below the world XY plane, Outdoors otherwise.
    pub fn from_position(boundary: &[Point3<f64>], tolerance: f64) -> BoundaryCondition {
        if !boundary.is_empty() && boundary.iter().all(|p| p.z <= tolerance) {
            BoundaryCondition::Ground
        } else {
            BoundaryCondition::Outdoors
        }
    }

    /// Whether a face with this condition may carry apertures or doors.
    pub fn allows_sub_faces(&self) -> bool {
        matches!(
            self,
            BoundaryCondition::Outdoors | BoundaryCondition::Surface(_)
        )
    }

    pub fn is_outdoors(&self) -> bool {
        matches!(self, BoundaryCondition::Outdoors)
    }

    pub fn is_surface(&self) -> bool {
        matches!(self, BoundaryCondition::Surface(_))
    }

    pub fn name(&self) -> &str {
        match self {
            BoundaryCondition::Outdoors => "Outdoors",
            BoundaryCondition::Ground => "Ground",
            BoundaryCondition::Adiabatic => "Adiabatic",
            BoundaryCondition::Surface(_) => "Surface",
            BoundaryCondition::Other(name) => name,
        }
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_below_grade_is_ground() {
        let below = [
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert_eq!(
            BoundaryCondition::from_position(&below, 0.01),
            BoundaryCondition::Ground
        );
        let above = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 2.0),
        ];
        assert_eq!(
            BoundaryCondition::from_position(&above, 0.01),
            BoundaryCondition::Outdoors
        );
    }

    #[test]
    fn sub_face_permissions() {
        assert!(BoundaryCondition::Outdoors.allows_sub_faces());
        assert!(BoundaryCondition::surface(vec!["other".to_string()]).allows_sub_faces());
        assert!(!BoundaryCondition::Ground.allows_sub_faces());
        assert!(!BoundaryCondition::Adiabatic.allows_sub_faces());
        assert!(!BoundaryCondition::Other("Custom".to_string()).allows_sub_faces());
    }
}

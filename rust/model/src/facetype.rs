// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face type tags.

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;

use crate::error::Error;

/// Angle from vertical within which a face counts as a roof or floor.
const HORIZONTAL_CONE: f64 = std::f64::consts::PI / 6.0; // 30 degrees

/// The structural role of a face, derived from its normal when unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceType {
    Wall,
    Floor,
    RoofCeiling,
    AirBoundary,
}

impl FaceType {
    /// Derives a face type from a normal vector: within 30 degrees of
    /// straight up is a roof/ceiling, within 30 degrees of straight down a
    /// floor, anything else a wall.
    pub fn from_normal(normal: &Vector3<f64>) -> FaceType {
        let norm = normal.norm();
        if norm < 1e-12 {
            return FaceType::Wall;
        }
        let tilt = (normal.z / norm).clamp(-1.0, 1.0).acos();
        if tilt <= HORIZONTAL_CONE {
            FaceType::RoofCeiling
        } else if tilt >= std::f64::consts::PI - HORIZONTAL_CONE {
            FaceType::Floor
        } else {
            FaceType::Wall
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FaceType::Wall => "Wall",
            FaceType::Floor => "Floor",
            FaceType::RoofCeiling => "RoofCeiling",
            FaceType::AirBoundary => "AirBoundary",
        }
    }
}

impl fmt::Display for FaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FaceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Wall" => Ok(FaceType::Wall),
            "Floor" => Ok(FaceType::Floor),
            "RoofCeiling" => Ok(FaceType::RoofCeiling),
            "AirBoundary" => Ok(FaceType::AirBoundary),
            other => Err(Error::UnknownTag {
                kind: "face type",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_from_normal() {
        assert_eq!(FaceType::from_normal(&Vector3::z()), FaceType::RoofCeiling);
        assert_eq!(FaceType::from_normal(&-Vector3::z()), FaceType::Floor);
        assert_eq!(FaceType::from_normal(&Vector3::x()), FaceType::Wall);
        // 20 degrees off vertical still counts as a roof
        let tilted = Vector3::new(0.0, 20f64.to_radians().sin(), 20f64.to_radians().cos());
        assert_eq!(FaceType::from_normal(&tilted), FaceType::RoofCeiling);
        // 45 degrees is a wall
        let steep = Vector3::new(0.0, 1.0, 1.0);
        assert_eq!(FaceType::from_normal(&steep), FaceType::Wall);
    }
}

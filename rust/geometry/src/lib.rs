// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Envelope Geometry
//!
//! Planar computational geometry for building envelope models: planes with
//! 2D projection frames, polygons with boolean operations (via i_overlay),
//! planar faces in 3D with holes, grid subdivision, and the ratio/louver
//! generators used to punch windows and extrude shades.
//!
//! Every geometric comparison takes an explicit tolerance; there is no
//! global epsilon state.

pub mod bool2d;
pub mod error;
pub mod face3d;
pub mod grid;
pub mod louver;
pub mod plane;
pub mod polygon;
pub mod ratio;
pub mod segment;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use error::{Error, Result};
pub use face3d::Face3D;
pub use plane::Plane;
pub use polygon::Polygon2D;
pub use segment::Segment3D;

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Envelope Model
//!
//! In-memory building model for envelope editing: rooms own planar faces,
//! faces own punched apertures and doors, and every entity can carry indoor
//! and outdoor shades. The editing surface covers window generation by
//! ratio, louver and overhang extrusion, sub-face repair and
//! rectangularization, adjacency solving between paired faces, validation
//! checks and JSON round-tripping.

pub mod aperture;
pub mod boundary;
pub mod door;
pub mod error;
pub mod face;
pub mod facetype;
pub mod identifier;
mod louvers;
pub mod model;
pub mod properties;
pub mod room;
pub mod serialization;
pub mod shade;
pub mod shading;
pub mod units;
pub mod validation;

pub use aperture::Aperture;
pub use boundary::{BoundaryCondition, SurfaceBc};
pub use door::Door;
pub use error::{Error, Result};
pub use face::{AdjacencyInfo, Face};
pub use facetype::FaceType;
pub use model::Model;
pub use properties::ExtensionProperties;
pub use room::Room;
pub use shade::Shade;
pub use shading::{ShadeSet, Shaded};
pub use units::Units;
pub use validation::{CheckMode, ValidationRecord};

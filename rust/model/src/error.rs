// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for model operations.

use crate::validation::ValidationRecord;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or editing model entities.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An identifier failed validation (empty, too long, illegal characters).
    #[error("invalid identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// Geometry handed to a constructor could not form a valid entity.
    #[error("invalid geometry for {entity} {id:?}: {reason}")]
    InvalidGeometry {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// A sub-face was added to a face whose boundary condition forbids it.
    #[error("{kind} cannot be added to face {face:?} with a {bc} boundary condition")]
    SubFaceBoundaryCondition {
        kind: &'static str,
        face: String,
        bc: String,
    },

    /// A sub-face was added to an air-boundary face.
    #[error("{kind} cannot be added to air-boundary face {face:?}")]
    AirBoundarySubFace { kind: &'static str, face: String },

    /// A boundary condition outside {Outdoors, Surface} was assigned to a
    /// face that still has sub-faces.
    #[error("{bc} cannot be assigned to face {face:?} with apertures or doors")]
    BoundaryConditionWithSubFaces { bc: String, face: String },

    /// The air-boundary face type was assigned to a face with sub-faces.
    #[error("air boundary cannot be assigned to face {face:?} with apertures or doors")]
    AirBoundaryWithSubFaces { face: String },

    /// A boundary condition was assigned to a sub-face that only supports
    /// Outdoors or Surface.
    #[error("{bc} cannot be assigned to {kind} {id:?}")]
    SubFaceBoundaryConditionKind {
        kind: &'static str,
        id: String,
        bc: String,
    },

    /// Adjacency solving could not pair the two faces completely.
    #[error("{0}")]
    AdjacencyMismatch(String),

    /// A validation check failed in raise-on-first mode.
    #[error("{}", .0.message)]
    Validation(ValidationRecord),

    /// A numeric argument fell outside its documented range.
    #[error("{field} must be {expected}, got {value}")]
    ArgumentOutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    /// The model tolerance is zero but the operation needs one.
    #[error("model must have a non-zero tolerance to use {0}")]
    ZeroTolerance(&'static str),

    /// An unknown tag value was found during deserialization.
    #[error("unknown {kind} {value:?}")]
    UnknownTag { kind: &'static str, value: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Error bubbled up from the geometry kernel.
    #[error("geometry error: {0}")]
    Geometry(#[from] envelope_geometry::Error),

    /// I/O error while reading or writing a model file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room entities: closed volumes that exclusively own their faces.

use envelope_geometry::{Face3D, Point3, Vector3};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::face::Face;
use crate::identifier::{clean_identifier, validate_identifier};
use crate::properties::ExtensionProperties;
use crate::shading::{ShadeSet, Shaded};

/// A single room volume bounded by faces.
#[derive(Debug, Clone)]
pub struct Room {
    identifier: String,
    display_name: Option<String>,
    faces: Vec<Face>,
    shades: ShadeSet,
    user_data: Option<Value>,
    properties: ExtensionProperties,
}

impl Room {
    /// Creates a room that takes exclusive ownership of its faces; each
    /// face gets a parent back-reference to this room.
    pub fn new(identifier: impl Into<String>, mut faces: Vec<Face>) -> Result<Self> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        if faces.is_empty() {
            return Err(Error::InvalidGeometry {
                entity: "Room",
                id: identifier,
                reason: "room needs at least one face".to_string(),
            });
        }
        for face in &mut faces {
            face.set_parent(Some(identifier.clone()));
        }
        Ok(Self {
            identifier,
            display_name: None,
            faces,
            shades: ShadeSet::new(),
            user_data: None,
            properties: ExtensionProperties::new(),
        })
    }

    /// Creates a box-shaped room with its origin at the minimum corner:
    /// a downward floor, four outward walls and an upward roof/ceiling.
    pub fn from_box(
        identifier: impl Into<String>,
        width: f64,
        depth: f64,
        height: f64,
        origin: Point3<f64>,
    ) -> Result<Self> {
        let identifier = identifier.into();
        if width <= 0.0 || depth <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidGeometry {
                entity: "Room",
                id: identifier,
                reason: format!("box dimensions must be positive, got {width} x {depth} x {height}"),
            });
        }
        let (x, y, z) = (origin.x, origin.y, origin.z);
        let (w, d, h) = (width, depth, height);
        let corners = |pts: [[f64; 3]; 4]| -> Result<Face3D> {
            Face3D::new(
                pts.iter()
                    .map(|p| Point3::new(x + p[0], y + p[1], z + p[2]))
                    .collect(),
            )
            .map_err(Error::Geometry)
        };
        let bottom = corners([[0.0, 0.0, 0.0], [0.0, d, 0.0], [w, d, 0.0], [w, 0.0, 0.0]])?;
        let front = corners([[0.0, 0.0, 0.0], [w, 0.0, 0.0], [w, 0.0, h], [0.0, 0.0, h]])?;
        let right = corners([[w, 0.0, 0.0], [w, d, 0.0], [w, d, h], [w, 0.0, h]])?;
        let back = corners([[w, d, 0.0], [0.0, d, 0.0], [0.0, d, h], [w, d, h]])?;
        let left = corners([[0.0, d, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, h], [0.0, d, h]])?;
        let top = corners([[0.0, 0.0, h], [w, 0.0, h], [w, d, h], [0.0, d, h]])?;
        let faces = vec![
            Face::new(format!("{identifier}_Bottom"), bottom)?,
            Face::new(format!("{identifier}_Front"), front)?,
            Face::new(format!("{identifier}_Right"), right)?,
            Face::new(format!("{identifier}_Back"), back)?,
            Face::new(format!("{identifier}_Left"), left)?,
            Face::new(format!("{identifier}_Top"), top)?,
        ];
        Self::new(identifier, faces)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.identifier)
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = Some(name.into());
    }

    pub(crate) fn set_raw_display_name(&mut self, name: Option<String>) {
        self.display_name = name;
    }

    pub(crate) fn raw_display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn faces_mut(&mut self) -> &mut [Face] {
        &mut self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn face_at_mut(&mut self, index: usize) -> &mut Face {
        &mut self.faces[index]
    }

    /// Looks a face up by identifier.
    pub fn face(&self, identifier: &str) -> Option<&Face> {
        self.faces.iter().find(|f| f.identifier() == identifier)
    }

    pub fn face_mut(&mut self, identifier: &str) -> Option<&mut Face> {
        self.faces.iter_mut().find(|f| f.identifier() == identifier)
    }

    /// Detaches a face by identifier, clearing its parent reference.
    pub fn remove_face(&mut self, identifier: &str) -> Option<Face> {
        let index = self.faces.iter().position(|f| f.identifier() == identifier)?;
        let mut face = self.faces.remove(index);
        face.set_parent(None);
        Some(face)
    }

    /// Combined area of all exterior walls.
    pub fn exterior_wall_area(&self) -> f64 {
        self.faces
            .iter()
            .filter(|f| f.is_exterior() && f.face_type() == crate::facetype::FaceType::Wall)
            .map(Face::area)
            .sum()
    }

    /// Combined area of all exterior apertures.
    pub fn exterior_aperture_area(&self) -> f64 {
        self.faces
            .iter()
            .filter(|f| f.is_exterior())
            .map(Face::aperture_area)
            .sum()
    }

    pub fn user_data(&self) -> Option<&Value> {
        self.user_data.as_ref()
    }

    pub fn set_user_data(&mut self, data: Option<Value>) {
        self.user_data = data;
    }

    pub fn properties(&self) -> &ExtensionProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut ExtensionProperties {
        &mut self.properties
    }

    pub fn min(&self) -> Point3<f64> {
        self.faces
            .iter()
            .map(Face::min)
            .reduce(|a, b| Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)))
            .unwrap_or_else(Point3::origin)
    }

    pub fn max(&self) -> Point3<f64> {
        self.faces
            .iter()
            .map(Face::max)
            .reduce(|a, b| Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)))
            .unwrap_or_else(Point3::origin)
    }

    pub fn center(&self) -> Point3<f64> {
        let min = self.min();
        let max = self.max();
        Point3::from((min.coords + max.coords) * 0.5)
    }

    /// Inserts a prefix into this room's identifier and every child.
    pub fn add_prefix(&mut self, prefix: &str) {
        self.identifier = clean_identifier(&format!("{prefix}_{}", self.identifier));
        self.display_name = Some(format!("{prefix}_{}", self.display_name()));
        for face in &mut self.faces {
            face.add_prefix(prefix);
            face.set_parent(Some(self.identifier.clone()));
        }
        self.add_prefix_shades(prefix);
    }

    pub fn translate(&mut self, vector: &Vector3<f64>) {
        for face in &mut self.faces {
            face.translate(vector);
        }
        self.translate_shades(vector);
    }

    pub fn rotate(&mut self, axis: &Vector3<f64>, angle: f64, origin: &Point3<f64>) {
        for face in &mut self.faces {
            face.rotate(axis, angle, origin);
        }
        self.rotate_shades(axis, angle, origin);
    }

    pub fn rotate_xy(&mut self, angle: f64, origin: &Point3<f64>) {
        self.rotate(&Vector3::z(), angle, origin);
    }

    pub fn scale(&mut self, factor: f64, origin: &Point3<f64>) {
        for face in &mut self.faces {
            face.scale(factor, origin);
        }
        self.scale_shades(factor, origin);
    }

    pub fn reflect(&mut self, normal: &Vector3<f64>, origin: &Point3<f64>) -> Result<()> {
        for face in &mut self.faces {
            face.reflect(normal, origin)?;
        }
        self.reflect_shades(normal, origin)
    }
}

impl Shaded for Room {
    fn shade_set(&self) -> &ShadeSet {
        &self.shades
    }

    fn shade_set_mut(&mut self) -> &mut ShadeSet {
        &mut self.shades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::facetype::FaceType;
    use approx::assert_relative_eq;

    #[test]
    fn box_room_has_six_classified_faces() {
        let room = Room::from_box("shoebox", 3.0, 6.0, 3.2, Point3::origin()).unwrap();
        assert_eq!(room.face_count(), 6);
        let bottom = room.face("shoebox_Bottom").unwrap();
        assert_eq!(bottom.face_type(), FaceType::Floor);
        assert_eq!(*bottom.boundary_condition(), BoundaryCondition::Ground);
        let top = room.face("shoebox_Top").unwrap();
        assert_eq!(top.face_type(), FaceType::RoofCeiling);
        assert_eq!(*top.boundary_condition(), BoundaryCondition::Outdoors);
        let front = room.face("shoebox_Front").unwrap();
        assert_eq!(front.face_type(), FaceType::Wall);
        assert_relative_eq!(front.area(), 3.0 * 3.2, epsilon = 1e-9);
    }

    #[test]
    fn faces_carry_parent_reference() {
        let room = Room::from_box("r1", 2.0, 2.0, 2.0, Point3::origin()).unwrap();
        for face in room.faces() {
            assert_eq!(face.parent(), Some("r1"));
        }
    }

    #[test]
    fn remove_face_detaches_parent() {
        let mut room = Room::from_box("r1", 2.0, 2.0, 2.0, Point3::origin()).unwrap();
        let face = room.remove_face("r1_Front").unwrap();
        assert!(face.parent().is_none());
        assert_eq!(room.face_count(), 5);
    }

    #[test]
    fn exterior_wall_area_sums_walls() {
        let room = Room::from_box("r1", 3.0, 6.0, 3.0, Point3::origin()).unwrap();
        assert_relative_eq!(room.exterior_wall_area(), 2.0 * (3.0 + 6.0) * 3.0, epsilon = 1e-9);
    }

    #[test]
    fn scale_grows_the_box() {
        let mut room = Room::from_box("r1", 1.0, 1.0, 1.0, Point3::origin()).unwrap();
        room.scale(2.0, &Point3::origin());
        assert_relative_eq!(room.max().z, 2.0, epsilon = 1e-9);
    }
}

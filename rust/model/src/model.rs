// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The top-level model: rooms, orphaned shades, units and tolerances.

use std::path::Path;

use envelope_geometry::{Point3, Vector3};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::face::AdjacencyInfo;
use crate::identifier::validate_identifier;
use crate::properties::ExtensionProperties;
use crate::room::Room;
use crate::serialization::ModelData;
use crate::shade::Shade;
use crate::shading::{ShadeSet, Shaded};
use crate::units::Units;

/// Default distance below which two coordinates are considered equal,
/// suitable for objects in meters.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Default angle tolerance in radians (1 degree).
pub const DEFAULT_ANGLE_TOLERANCE: f64 = 0.017453292519943295;

/// A whole building model.
#[derive(Debug, Clone)]
pub struct Model {
    identifier: String,
    display_name: Option<String>,
    units: Units,
    tolerance: f64,
    angle_tolerance: f64,
    rooms: Vec<Room>,
    orphaned_shades: Vec<Shade>,
    user_data: Option<Value>,
    properties: ExtensionProperties,
}

impl Model {
    pub fn new(identifier: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        Ok(Self {
            identifier,
            display_name: None,
            units: Units::Meters,
            tolerance: DEFAULT_TOLERANCE,
            angle_tolerance: DEFAULT_ANGLE_TOLERANCE,
            rooms: Vec::new(),
            orphaned_shades: Vec::new(),
            user_data: None,
            properties: ExtensionProperties::new(),
        })
    }

    pub fn with_rooms(identifier: impl Into<String>, rooms: Vec<Room>) -> Result<Self> {
        let mut model = Self::new(identifier)?;
        model.rooms = rooms;
        Ok(model)
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

    pub fn units(&self) -> Units {
        self.units
    }

    /// Changes the units tag without scaling any geometry.
    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    pub fn angle_tolerance(&self) -> f64 {
        self.angle_tolerance
    }

    pub fn set_angle_tolerance(&mut self, angle_tolerance: f64) {
        self.angle_tolerance = angle_tolerance;
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn rooms_mut(&mut self) -> &mut [Room] {
        &mut self.rooms
    }

    pub fn add_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    pub fn room(&self, identifier: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.identifier() == identifier)
    }

    pub fn orphaned_shades(&self) -> &[Shade] {
        &self.orphaned_shades
    }

    pub fn add_orphaned_shade(&mut self, shade: Shade) {
        self.orphaned_shades.push(shade);
    }

    pub(crate) fn set_orphaned_shades(&mut self, shades: Vec<Shade>) {
        self.orphaned_shades = shades;
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

    /// Scales the whole model, including its tolerance, from the world
    /// origin.
    pub fn scale(&mut self, factor: f64) {
        let origin = Point3::origin();
        for room in &mut self.rooms {
            room.scale(factor, &origin);
        }
        for shade in &mut self.orphaned_shades {
            shade.scale(factor, &origin);
        }
        self.tolerance *= factor;
    }

    /// Converts the model to another unit system, scaling all geometry by
    /// the conversion factor and updating the units tag.
    pub fn convert_to_units(&mut self, units: Units) {
        if units != self.units {
            let factor = self.units.conversion_factor(units);
            self.scale(factor);
            self.units = units;
        }
    }

    /// Solves surface adjacency across all rooms: face pairs from
    /// different rooms whose bounding-box centers coincide within the
    /// model tolerance are set mutually adjacent (sub-faces paired too).
    /// Faces already holding a Surface condition are left alone.
    pub fn solve_adjacency(&mut self) -> Result<AdjacencyInfo> {
        if self.tolerance == 0.0 {
            return Err(Error::ZeroTolerance("solve_adjacency"));
        }
        let tolerance = self.tolerance;
        let mut info = AdjacencyInfo::default();
        let mut face_pairs: Vec<(String, String)> = Vec::new();
        for i in 0..self.rooms.len() {
            let (head, tail) = self.rooms.split_at_mut(i + 1);
            let room_a = &mut head[i];
            for room_b in tail.iter_mut() {
                for fa in 0..room_a.face_count() {
                    for fb in 0..room_b.face_count() {
                        let candidate = {
                            let face_a = &room_a.faces()[fa];
                            let face_b = &room_b.faces()[fb];
                            !face_a.boundary_condition().is_surface()
                                && !face_b.boundary_condition().is_surface()
                                && face_a
                                    .geometry()
                                    .is_centered_adjacent(face_b.geometry(), tolerance)
                        };
                        if !candidate {
                            continue;
                        }
                        let face_a = room_a.face_at_mut(fa);
                        let face_b = room_b.face_at_mut(fb);
                        let pair_info = face_a.set_adjacency(face_b, tolerance)?;
                        face_pairs.push((
                            face_a.identifier().to_string(),
                            face_b.identifier().to_string(),
                        ));
                        info.adjacent_apertures.extend(pair_info.adjacent_apertures);
                        info.adjacent_doors.extend(pair_info.adjacent_doors);
                    }
                }
            }
        }
        Ok(info)
    }

    pub fn translate(&mut self, vector: &Vector3<f64>) {
        for room in &mut self.rooms {
            room.translate(vector);
        }
        for shade in &mut self.orphaned_shades {
            shade.translate(vector);
        }
    }

    /// Serializes the model to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        let data = ModelData::from(self);
        serde_json::to_string(&data).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Serializes the model to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        let data = ModelData::from(self);
        serde_json::to_string_pretty(&data).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserializes a model from a JSON string, re-validating every
    /// construction invariant.
    pub fn from_json(json: &str) -> Result<Model> {
        let data: ModelData =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Model::try_from(data)
    }

    /// Reads a model from a JSON file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Model> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Writes the model as JSON to a file on disk.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

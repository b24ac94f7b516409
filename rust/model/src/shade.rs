// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shade entities: planar geometry attached to faces, sub-faces or rooms
//! that blocks light without being part of the envelope itself.

use envelope_geometry::{Face3D, Point3, Vector3};
use serde_json::Value;

use crate::error::Result;
use crate::identifier::{clean_identifier, validate_identifier};
use crate::properties::ExtensionProperties;

/// A single planar shade.
#[derive(Debug, Clone)]
pub struct Shade {
    identifier: String,
    display_name: Option<String>,
    geometry: Face3D,
    user_data: Option<Value>,
    properties: ExtensionProperties,
}

impl Shade {
    pub fn new(identifier: impl Into<String>, geometry: Face3D) -> Result<Self> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        Ok(Self {
            identifier,
            display_name: None,
            geometry,
            user_data: None,
            properties: ExtensionProperties::new(),
        })
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

    pub fn geometry(&self) -> &Face3D {
        &self.geometry
    }

    pub fn area(&self) -> f64 {
        self.geometry.area()
    }

    pub fn center(&self) -> Point3<f64> {
        self.geometry.center()
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

    pub(crate) fn set_raw_display_name(&mut self, name: Option<String>) {
        self.display_name = name;
    }

    pub(crate) fn raw_display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Inserts a prefix into the identifier and display name.
    pub fn add_prefix(&mut self, prefix: &str) {
        self.identifier = clean_identifier(&format!("{prefix}_{}", self.identifier));
        self.display_name = Some(format!("{prefix}_{}", self.display_name()));
    }

    pub fn translate(&mut self, vector: &Vector3<f64>) {
        self.geometry = self.geometry.translated(vector);
    }

    pub fn rotate(&mut self, axis: &Vector3<f64>, angle: f64, origin: &Point3<f64>) {
        self.geometry = self.geometry.rotated(axis, angle, origin);
    }

    pub fn rotate_xy(&mut self, angle: f64, origin: &Point3<f64>) {
        self.geometry = self.geometry.rotated_xy(angle, origin);
    }

    pub fn scale(&mut self, factor: f64, origin: &Point3<f64>) {
        self.geometry = self.geometry.scaled(factor, origin);
    }

    pub fn reflect(&mut self, normal: &Vector3<f64>, origin: &Point3<f64>) -> Result<()> {
        self.geometry = self.geometry.reflected(normal, origin)?;
        Ok(())
    }
}

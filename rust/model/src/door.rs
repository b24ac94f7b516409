// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door entities: opaque sub-faces punched into a parent face.

use envelope_geometry::{Face3D, Point3, Segment3D, Vector2, Vector3};
use serde_json::Value;

use crate::boundary::BoundaryCondition;
use crate::error::{Error, Result};
use crate::identifier::{clean_identifier, validate_identifier};
use crate::louvers::{louver_shades_by_count, LouverSpec};
use crate::properties::ExtensionProperties;
use crate::shade::Shade;
use crate::shading::{ShadeSet, Shaded};

/// A planar sub-region of a face that opens but does not glaze.
#[derive(Debug, Clone)]
pub struct Door {
    identifier: String,
    display_name: Option<String>,
    geometry: Face3D,
    boundary_condition: BoundaryCondition,
    parent: Option<String>,
    shades: ShadeSet,
    user_data: Option<Value>,
    properties: ExtensionProperties,
}

impl Door {
    pub fn new(identifier: impl Into<String>, geometry: Face3D) -> Result<Self> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        Ok(Self {
            identifier,
            display_name: None,
            geometry,
            boundary_condition: BoundaryCondition::Outdoors,
            parent: None,
            shades: ShadeSet::new(),
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

    pub(crate) fn set_raw_display_name(&mut self, name: Option<String>) {
        self.display_name = name;
    }

    pub(crate) fn raw_display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn geometry(&self) -> &Face3D {
        &self.geometry
    }

    pub(crate) fn set_geometry(&mut self, geometry: Face3D) {
        self.geometry = geometry;
    }

    pub fn boundary_condition(&self) -> &BoundaryCondition {
        &self.boundary_condition
    }

    /// Doors only support Outdoors and Surface boundary conditions.
    pub fn set_boundary_condition(&mut self, value: BoundaryCondition) -> Result<()> {
        if !value.allows_sub_faces() {
            return Err(Error::SubFaceBoundaryConditionKind {
                kind: "Door",
                id: self.identifier.clone(),
                bc: value.name().to_string(),
            });
        }
        self.boundary_condition = value;
        Ok(())
    }

    pub(crate) fn set_boundary_condition_unchecked(&mut self, value: BoundaryCondition) {
        self.boundary_condition = value;
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<String>) {
        self.parent = parent;
    }

    pub fn is_exterior(&self) -> bool {
        self.boundary_condition.is_outdoors()
    }

    pub fn center(&self) -> Point3<f64> {
        self.geometry.center()
    }

    pub fn area(&self) -> f64 {
        self.geometry.area()
    }

    pub fn normal(&self) -> &Vector3<f64> {
        self.geometry.normal()
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

    /// Copy with the parent reference cleared.
    pub fn duplicate(&self) -> Door {
        let mut copy = self.clone();
        copy.parent = None;
        copy
    }

    /// Pairs this door with its counterpart on an adjacent face.
    pub fn set_adjacency(&mut self, other: &mut Door) {
        let mut self_objects = vec![other.identifier.clone()];
        if let Some(parent) = &other.parent {
            self_objects.push(parent.clone());
        }
        let mut other_objects = vec![self.identifier.clone()];
        if let Some(parent) = &self.parent {
            other_objects.push(parent.clone());
        }
        self.boundary_condition = BoundaryCondition::surface(self_objects);
        other.boundary_condition = BoundaryCondition::surface(other_objects);
    }

    /// Inserts a prefix into the identifier, display name, child shades
    /// and any Surface boundary references.
    pub fn add_prefix(&mut self, prefix: &str) {
        self.identifier = clean_identifier(&format!("{prefix}_{}", self.identifier));
        self.display_name = Some(format!("{prefix}_{}", self.display_name()));
        self.add_prefix_shades(prefix);
        if let BoundaryCondition::Surface(surface) = &self.boundary_condition {
            let objects = surface
                .boundary_condition_objects
                .iter()
                .map(|o| clean_identifier(&format!("{prefix}_{o}")))
                .collect();
            self.boundary_condition = BoundaryCondition::surface(objects);
        }
    }

    /// Adds border shades extruded from the door perimeter, one per
    /// boundary edge. Returns the identifiers of the new shades.
    pub fn extruded_border(&mut self, depth: f64, indoor: bool) -> Result<Vec<String>> {
        if depth <= 0.0 {
            return Ok(Vec::new());
        }
        let direction = if indoor {
            -self.geometry.normal() * depth
        } else {
            self.geometry.normal() * depth
        };
        let segments: Vec<Segment3D> = self.geometry.boundary_segments();
        let mut ids = Vec::with_capacity(segments.len());
        for (i, seg) in segments.iter().enumerate() {
            let border = match Face3D::new(vec![
                seg.p1,
                seg.p2,
                seg.p2 + direction,
                seg.p1 + direction,
            ]) {
                Ok(face) => face,
                Err(_) => continue, // zero-length edge
            };
            let shade = Shade::new(format!("{}_EB{i}", self.identifier), border)?;
            ids.push(shade.identifier().to_string());
            if indoor {
                self.add_indoor_shade(shade);
            } else {
                self.add_outdoor_shade(shade);
            }
        }
        Ok(ids)
    }

    /// Adds a single overhang shade above this door. Returns the new shade
    /// identifiers.
    pub fn overhang(
        &mut self,
        depth: f64,
        angle: f64,
        indoor: bool,
        tolerance: f64,
    ) -> Result<Vec<String>> {
        let base = if indoor { "InOverhang" } else { "OutOverhang" };
        let spec = LouverSpec {
            depth,
            offset: 0.0,
            angle,
            contour_vector: Vector2::new(0.0, 1.0),
            flip_start: false,
            indoor,
            tolerance,
            base_name: Some(base),
        };
        let shades = louver_shades_by_count(&self.geometry, &self.identifier, 1, &spec)?;
        let ids = shades.iter().map(|s| s.identifier().to_string()).collect();
        if indoor {
            self.add_indoor_shades(shades);
        } else {
            self.add_outdoor_shades(shades);
        }
        Ok(ids)
    }

    pub fn translate(&mut self, vector: &Vector3<f64>) {
        self.geometry = self.geometry.translated(vector);
        self.translate_shades(vector);
    }

    pub fn rotate(&mut self, axis: &Vector3<f64>, angle: f64, origin: &Point3<f64>) {
        self.geometry = self.geometry.rotated(axis, angle, origin);
        self.rotate_shades(axis, angle, origin);
    }

    pub fn rotate_xy(&mut self, angle: f64, origin: &Point3<f64>) {
        self.geometry = self.geometry.rotated_xy(angle, origin);
        self.rotate_xy_shades(angle, origin);
    }

    pub fn scale(&mut self, factor: f64, origin: &Point3<f64>) {
        self.geometry = self.geometry.scaled(factor, origin);
        self.scale_shades(factor, origin);
    }

    pub fn reflect(&mut self, normal: &Vector3<f64>, origin: &Point3<f64>) -> Result<()> {
        self.geometry = self.geometry.reflected(normal, origin)?;
        self.reflect_shades(normal, origin)
    }

    /// Removes colinear vertices from the door geometry; errors when the
    /// result is degenerate.
    pub fn remove_colinear_vertices(&mut self, tolerance: f64) -> Result<()> {
        self.geometry = self
            .geometry
            .remove_colinear_vertices(tolerance)
            .map_err(|e| Error::InvalidGeometry {
                entity: "Door",
                id: self.identifier.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Geometric equivalence within a tolerance.
    pub fn is_geo_equivalent(&self, other: &Door, tolerance: f64) -> bool {
        if (self.area() - other.area()).abs() > tolerance * self.area().max(1.0) {
            return false;
        }
        self.geometry.is_centered_adjacent(&other.geometry, tolerance)
    }
}

impl Shaded for Door {
    fn shade_set(&self) -> &ShadeSet {
        &self.shades
    }

    fn shade_set_mut(&mut self) -> &mut ShadeSet {
        &mut self.shades
    }
}

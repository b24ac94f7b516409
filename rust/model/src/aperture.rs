// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Aperture entities: glazed sub-faces punched into a parent face.

use envelope_geometry::{Face3D, Point3, Segment3D, Vector2, Vector3};
use serde_json::Value;

use crate::boundary::BoundaryCondition;
use crate::error::{Error, Result};
use crate::identifier::{clean_identifier, validate_identifier};
use crate::louvers::{louver_shades_by_count, louver_shades_by_distance, LouverSpec};
use crate::properties::ExtensionProperties;
use crate::shade::Shade;
use crate::shading::{ShadeSet, Shaded};

/// A planar sub-region of a face that transmits light.
#[derive(Debug, Clone)]
pub struct Aperture {
    identifier: String,
    display_name: Option<String>,
    geometry: Face3D,
    is_operable: bool,
    boundary_condition: BoundaryCondition,
    parent: Option<String>,
    shades: ShadeSet,
    user_data: Option<Value>,
    properties: ExtensionProperties,
}

impl Aperture {
    pub fn new(identifier: impl Into<String>, geometry: Face3D) -> Result<Self> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        Ok(Self {
            identifier,
            display_name: None,
            geometry,
            is_operable: false,
            boundary_condition: BoundaryCondition::Outdoors,
            parent: None,
            shades: ShadeSet::new(),
            user_data: None,
            properties: ExtensionProperties::new(),
        })
    }

    pub fn with_operable(mut self, is_operable: bool) -> Self {
        self.is_operable = is_operable;
        self
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

    pub fn is_operable(&self) -> bool {
        self.is_operable
    }

    pub fn set_is_operable(&mut self, is_operable: bool) {
        self.is_operable = is_operable;
    }

    pub fn boundary_condition(&self) -> &BoundaryCondition {
        &self.boundary_condition
    }

    /// Apertures only support Outdoors and Surface boundary conditions.
    pub fn set_boundary_condition(&mut self, value: BoundaryCondition) -> Result<()> {
        if !value.allows_sub_faces() {
            return Err(Error::SubFaceBoundaryConditionKind {
                kind: "Aperture",
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

    /// Copy with the parent reference cleared, ready for reuse elsewhere.
    pub fn duplicate(&self) -> Aperture {
        let mut copy = self.clone();
        copy.parent = None;
        copy
    }

    /// Pairs this aperture with its counterpart on an adjacent face: both
    /// get a Surface boundary condition referencing the other.
    pub fn set_adjacency(&mut self, other: &mut Aperture) {
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

    /// Adds border shades extruded from the aperture perimeter, one per
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

    /// Adds a single overhang shade above this aperture. Returns the new
    /// shade identifiers.
    pub fn overhang(
        &mut self,
        depth: f64,
        angle: f64,
        indoor: bool,
        tolerance: f64,
    ) -> Result<Vec<String>> {
        let base = if indoor { "InOverhang" } else { "OutOverhang" };
        self.louvers_by_count(
            1,
            depth,
            0.0,
            angle,
            Vector2::new(0.0, 1.0),
            false,
            indoor,
            tolerance,
            Some(base),
        )
    }

    /// Adds louvered shades over this aperture to hit a target count.
    /// Returns the new shade identifiers.
    #[allow(clippy::too_many_arguments)]
    pub fn louvers_by_count(
        &mut self,
        louver_count: usize,
        depth: f64,
        offset: f64,
        angle: f64,
        contour_vector: Vector2<f64>,
        flip_start: bool,
        indoor: bool,
        tolerance: f64,
        base_name: Option<&str>,
    ) -> Result<Vec<String>> {
        let spec = LouverSpec {
            depth,
            offset,
            angle,
            contour_vector,
            flip_start,
            indoor,
            tolerance,
            base_name,
        };
        let shades = louver_shades_by_count(&self.geometry, &self.identifier, louver_count, &spec)?;
        Ok(self.adopt_louvers(shades, indoor))
    }

    /// Adds louvered shades over this aperture at a target spacing.
    /// Returns the new shade identifiers.
    #[allow(clippy::too_many_arguments)]
    pub fn louvers_by_distance_between(
        &mut self,
        distance: f64,
        depth: f64,
        offset: f64,
        angle: f64,
        contour_vector: Vector2<f64>,
        flip_start: bool,
        indoor: bool,
        tolerance: f64,
        max_count: Option<usize>,
        base_name: Option<&str>,
    ) -> Result<Vec<String>> {
        let spec = LouverSpec {
            depth,
            offset,
            angle,
            contour_vector,
            flip_start,
            indoor,
            tolerance,
            base_name,
        };
        let shades =
            louver_shades_by_distance(&self.geometry, &self.identifier, distance, max_count, &spec)?;
        Ok(self.adopt_louvers(shades, indoor))
    }

    fn adopt_louvers(&mut self, shades: Vec<Shade>, indoor: bool) -> Vec<String> {
        let ids = shades.iter().map(|s| s.identifier().to_string()).collect();
        if indoor {
            self.add_indoor_shades(shades);
        } else {
            self.add_outdoor_shades(shades);
        }
        ids
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

    /// Removes colinear vertices from the aperture geometry; errors when
    /// the result is degenerate.
    pub fn remove_colinear_vertices(&mut self, tolerance: f64) -> Result<()> {
        self.geometry = self
            .geometry
            .remove_colinear_vertices(tolerance)
            .map_err(|e| Error::InvalidGeometry {
                entity: "Aperture",
                id: self.identifier.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Geometric equivalence within a tolerance, including operability.
    pub fn is_geo_equivalent(&self, other: &Aperture, tolerance: f64) -> bool {
        if self.is_operable != other.is_operable {
            return false;
        }
        if (self.area() - other.area()).abs() > tolerance * self.area().max(1.0) {
            return false;
        }
        self.geometry.is_centered_adjacent(&other.geometry, tolerance)
    }
}

impl Shaded for Aperture {
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
    use approx::assert_relative_eq;

    fn window() -> Aperture {
        let geometry = Face3D::new(vec![
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
        ])
        .unwrap();
        Aperture::new("wall_Glz0", geometry).unwrap()
    }

    #[test]
    fn rejects_ground_boundary_condition() {
        let mut ap = window();
        assert!(ap.set_boundary_condition(BoundaryCondition::Ground).is_err());
        assert!(ap
            .set_boundary_condition(BoundaryCondition::Outdoors)
            .is_ok());
    }

    #[test]
    fn adjacency_references_both_ways() {
        let mut a = window();
        let mut b = window().duplicate();
        a.set_parent(Some("face_a".to_string()));
        b.set_parent(Some("face_b".to_string()));
        a.set_adjacency(&mut b);
        match a.boundary_condition() {
            BoundaryCondition::Surface(s) => {
                assert_eq!(s.adjacent_object(), Some("wall_Glz0"));
                assert_eq!(s.boundary_condition_objects[1], "face_b");
            }
            other => panic!("expected surface, got {other:?}"),
        }
        assert!(b.boundary_condition().is_surface());
    }

    #[test]
    fn extruded_border_adds_edge_shades() {
        let mut ap = window();
        let ids = ap.extruded_border(0.1, false).unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(ap.outdoor_shades().len(), 4);
        assert_relative_eq!(ap.outdoor_shades()[0].area(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn overhang_adds_single_shade() {
        let mut ap = window();
        let ids = ap.overhang(0.5, 0.0, false, 0.01).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ap.outdoor_shades().len(), 1);
    }

    #[test]
    fn prefix_rewrites_surface_references() {
        let mut a = window();
        let mut b = window();
        a.set_adjacency(&mut b);
        a.add_prefix("Bldg");
        match a.boundary_condition() {
            BoundaryCondition::Surface(s) => {
                assert_eq!(s.adjacent_object(), Some("Bldg_wall_Glz0"));
            }
            other => panic!("expected surface, got {other:?}"),
        }
    }
}

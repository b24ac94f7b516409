// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face entities: planar envelope boundaries that own punched apertures,
//! doors and shades.
//!
//! Beyond plain CRUD, a face carries the sub-face reconciliation logic:
//! ratio-driven window generation, rectangularization of arbitrary
//! apertures, repair of overlapping or out-of-bounds sub-faces, louver
//! extrusion and adjacency pairing with another face.

use std::cell::OnceCell;

use envelope_geometry::grid::{polygon_grid_cells, GridCell};
use envelope_geometry::{bool2d, ratio, Face3D, Plane, Point2, Point3, Polygon2D, Segment3D, Vector2, Vector3};
use nalgebra::{Rotation3, Unit};
use serde_json::Value;

use crate::aperture::Aperture;
use crate::boundary::BoundaryCondition;
use crate::door::Door;
use crate::error::{Error, Result};
use crate::facetype::FaceType;
use crate::identifier::{clean_identifier, validate_identifier};
use crate::louvers::{louver_shades_by_count, louver_shades_by_distance, LouverSpec};
use crate::properties::ExtensionProperties;
use crate::shade::Shade;
use crate::shading::{ShadeSet, Shaded};
use crate::validation::{resolve, CheckMode, ValidationRecord};

/// Sub-face pairs produced while solving adjacency between two faces.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyInfo {
    pub adjacent_apertures: Vec<(String, String)>,
    pub adjacent_doors: Vec<(String, String)>,
}

/// Snapshot of a sub-face taken before a rebuild, so regenerated geometry
/// can be matched back to the object that spawned it.
#[derive(Debug, Clone)]
enum SubFaceSnapshot {
    Aperture(Aperture),
    Door(Door),
}

/// A single planar face of a room envelope.
#[derive(Debug, Clone)]
pub struct Face {
    identifier: String,
    display_name: Option<String>,
    geometry: Face3D,
    face_type: FaceType,
    boundary_condition: BoundaryCondition,
    apertures: Vec<Aperture>,
    doors: Vec<Door>,
    shades: ShadeSet,
    parent: Option<String>,
    punched: OnceCell<Face3D>,
    user_data: Option<Value>,
    properties: ExtensionProperties,
}

impl Face {
    /// Creates a face, deriving the face type from the normal and the
    /// boundary condition from the position below/above grade.
    pub fn new(identifier: impl Into<String>, geometry: Face3D) -> Result<Self> {
        Self::with_attributes(identifier, geometry, None, None)
    }

    /// Creates a face with explicit type and boundary condition; either may
    /// be `None` to derive the default.
    pub fn with_attributes(
        identifier: impl Into<String>,
        geometry: Face3D,
        face_type: Option<FaceType>,
        boundary_condition: Option<BoundaryCondition>,
    ) -> Result<Self> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        let face_type = face_type.unwrap_or_else(|| FaceType::from_normal(geometry.normal()));
        let boundary_condition = boundary_condition
            .unwrap_or_else(|| BoundaryCondition::from_position(geometry.boundary(), 0.01));
        Ok(Self {
            identifier,
            display_name: None,
            geometry,
            face_type,
            boundary_condition,
            apertures: Vec::new(),
            doors: Vec::new(),
            shades: ShadeSet::new(),
            parent: None,
            punched: OnceCell::new(),
            user_data: None,
            properties: ExtensionProperties::new(),
        })
    }

    /// Creates a face from raw vertex triples.
    pub fn from_vertices(
        identifier: impl Into<String>,
        vertices: &[[f64; 3]],
        face_type: Option<FaceType>,
        boundary_condition: Option<BoundaryCondition>,
    ) -> Result<Self> {
        let identifier = identifier.into();
        let points = vertices
            .iter()
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect();
        let geometry = Face3D::new(points).map_err(|e| Error::InvalidGeometry {
            entity: "Face",
            id: identifier.clone(),
            reason: e.to_string(),
        })?;
        Self::with_attributes(identifier, geometry, face_type, boundary_condition)
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

    pub fn face_type(&self) -> FaceType {
        self.face_type
    }

    /// Changes the face type. Air boundaries cannot carry sub-faces, and
    /// switching type resets extension attributes to their defaults.
    pub fn set_face_type(&mut self, value: FaceType) -> Result<()> {
        if value == FaceType::AirBoundary && self.has_sub_faces() {
            return Err(Error::AirBoundaryWithSubFaces {
                face: self.identifier.clone(),
            });
        }
        self.properties.reset_to_default();
        self.face_type = value;
        Ok(())
    }

    pub fn boundary_condition(&self) -> &BoundaryCondition {
        &self.boundary_condition
    }

    /// Changes the boundary condition. A face with sub-faces only accepts
    /// Outdoors or Surface.
    pub fn set_boundary_condition(&mut self, value: BoundaryCondition) -> Result<()> {
        if self.has_sub_faces() && !value.allows_sub_faces() {
            return Err(Error::BoundaryConditionWithSubFaces {
                bc: value.name().to_string(),
                face: self.identifier.clone(),
            });
        }
        self.boundary_condition = value;
        Ok(())
    }

    pub fn apertures(&self) -> &[Aperture] {
        &self.apertures
    }

    /// Mutable access to the apertures. The punched-geometry cache is
    /// invalidated up front since callers may edit geometry through this.
    pub fn apertures_mut(&mut self) -> &mut [Aperture] {
        self.punched.take();
        &mut self.apertures
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn doors_mut(&mut self) -> &mut [Door] {
        self.punched.take();
        &mut self.doors
    }

    pub fn has_sub_faces(&self) -> bool {
        !self.apertures.is_empty() || !self.doors.is_empty()
    }

    pub fn sub_face_count(&self) -> usize {
        self.apertures.len() + self.doors.len()
    }

    /// Whether this face could take a Ground boundary condition.
    pub fn can_be_ground(&self) -> bool {
        !self.has_sub_faces() && self.face_type != FaceType::AirBoundary
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

    /// The face boundary with holes cut for every aperture and door,
    /// recomputed lazily after any mutation.
    pub fn punched_geometry(&self) -> &Face3D {
        self.punched.get_or_init(|| {
            let subs: Vec<&Face3D> = self
                .apertures
                .iter()
                .map(Aperture::geometry)
                .chain(self.doors.iter().map(Door::geometry))
                .collect();
            if subs.is_empty() {
                self.geometry.clone()
            } else {
                self.geometry.punched(&subs)
            }
        })
    }

    fn invalidate_punched(&mut self) {
        self.punched.take();
    }

    pub fn normal(&self) -> &Vector3<f64> {
        self.geometry.normal()
    }

    pub fn center(&self) -> Point3<f64> {
        self.geometry.center()
    }

    pub fn area(&self) -> f64 {
        self.geometry.area()
    }

    pub fn perimeter(&self) -> f64 {
        self.geometry.perimeter()
    }

    pub fn aperture_area(&self) -> f64 {
        self.apertures.iter().map(Aperture::area).sum()
    }

    pub fn aperture_ratio(&self) -> f64 {
        self.aperture_area() / self.area()
    }

    /// Tilt in radians: 0 pointing up, PI pointing down.
    pub fn tilt(&self) -> f64 {
        self.geometry.tilt()
    }

    /// Altitude in radians: +PI/2 pointing up, -PI/2 pointing down.
    pub fn altitude(&self) -> f64 {
        self.geometry.altitude()
    }

    /// Azimuth in radians clockwise from the world Y-axis.
    pub fn azimuth(&self) -> f64 {
        self.geometry.azimuth()
    }

    /// Minimum corner of the bounding box around this face and all of its
    /// children.
    pub fn min(&self) -> Point3<f64> {
        self.child_points()
            .fold(self.geometry.min(), |acc, p| {
                Point3::new(acc.x.min(p.x), acc.y.min(p.y), acc.z.min(p.z))
            })
    }

    /// Maximum corner of the bounding box around this face and all of its
    /// children.
    pub fn max(&self) -> Point3<f64> {
        self.child_points()
            .fold(self.geometry.max(), |acc, p| {
                Point3::new(acc.x.max(p.x), acc.y.max(p.y), acc.z.max(p.z))
            })
    }

    fn child_points(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        let sub_corners = self
            .apertures
            .iter()
            .map(Aperture::geometry)
            .chain(self.doors.iter().map(Door::geometry))
            .chain(self.shades.iter().map(Shade::geometry))
            .flat_map(|g| [g.min(), g.max()]);
        sub_corners
    }

    /// Orientation of the face in radians clockwise from a north vector.
    pub fn horizontal_orientation(&self, north_vector: Vector2<f64>) -> f64 {
        let n = self.geometry.normal();
        let facing = Vector2::new(n.x, n.y);
        if facing.norm() < 1e-12 {
            return 0.0;
        }
        let ccw = (north_vector.x * facing.y - north_vector.y * facing.x)
            .atan2(north_vector.dot(&facing));
        let cw = -ccw;
        if cw < 0.0 {
            cw + 2.0 * std::f64::consts::PI
        } else {
            cw
        }
    }

    /// Compass direction the face points toward.
    pub fn cardinal_direction(&self, north_vector: Vector2<f64>) -> &'static str {
        const NAMES: [&str; 8] = [
            "North",
            "NorthEast",
            "East",
            "SouthEast",
            "South",
            "SouthWest",
            "West",
            "NorthWest",
        ];
        let orientation = self.horizontal_orientation(north_vector).to_degrees();
        let sector = ((orientation + 22.5) / 45.0).floor() as usize % 8;
        NAMES[sector]
    }

    /// Inserts a prefix into this face's identifier, display name, children
    /// and Surface boundary references.
    pub fn add_prefix(&mut self, prefix: &str) {
        self.identifier = clean_identifier(&format!("{prefix}_{}", self.identifier));
        self.display_name = Some(format!("{prefix}_{}", self.display_name()));
        for aperture in &mut self.apertures {
            aperture.add_prefix(prefix);
        }
        for door in &mut self.doors {
            door.add_prefix(prefix);
        }
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

    /// Detaches and returns all apertures, clearing their parent references.
    pub fn remove_apertures(&mut self) -> Vec<Aperture> {
        let mut removed = std::mem::take(&mut self.apertures);
        for aperture in &mut removed {
            aperture.set_parent(None);
        }
        self.invalidate_punched();
        removed
    }

    /// Detaches and returns all doors, clearing their parent references.
    pub fn remove_doors(&mut self) -> Vec<Door> {
        let mut removed = std::mem::take(&mut self.doors);
        for door in &mut removed {
            door.set_parent(None);
        }
        self.invalidate_punched();
        removed
    }

    /// Detaches and returns every aperture and door.
    pub fn remove_sub_faces(&mut self) -> (Vec<Aperture>, Vec<Door>) {
        (self.remove_apertures(), self.remove_doors())
    }

    fn acceptable_sub_face_check(&self, kind: &'static str) -> Result<()> {
        if !self.boundary_condition.allows_sub_faces() {
            return Err(Error::SubFaceBoundaryCondition {
                kind,
                face: self.identifier.clone(),
                bc: self.boundary_condition.name().to_string(),
            });
        }
        if self.face_type == FaceType::AirBoundary {
            return Err(Error::AirBoundarySubFace {
                kind,
                face: self.identifier.clone(),
            });
        }
        Ok(())
    }

    /// Adds an aperture, flipping it when its normal opposes the face
    /// normal. Coplanarity and containment are not checked here; use
    /// `check_apertures_valid` afterwards when that matters.
    pub fn add_aperture(&mut self, mut aperture: Aperture) -> Result<()> {
        self.acceptable_sub_face_check("Aperture")?;
        if self.geometry.normal().dot(aperture.normal()) < 0.0 {
            aperture.set_geometry(aperture.geometry().flip());
        }
        aperture.set_parent(Some(self.identifier.clone()));
        self.apertures.push(aperture);
        self.invalidate_punched();
        Ok(())
    }

    /// Adds a door, flipping it when its normal opposes the face normal.
    pub fn add_door(&mut self, mut door: Door) -> Result<()> {
        self.acceptable_sub_face_check("Door")?;
        if self.geometry.normal().dot(door.normal()) < 0.0 {
            door.set_geometry(door.geometry().flip());
        }
        door.set_parent(Some(self.identifier.clone()));
        self.doors.push(door);
        self.invalidate_punched();
        Ok(())
    }

    pub fn add_apertures(&mut self, apertures: Vec<Aperture>) -> Result<()> {
        for aperture in apertures {
            self.add_aperture(aperture)?;
        }
        Ok(())
    }

    pub fn add_doors(&mut self, doors: Vec<Door>) -> Result<()> {
        for door in doors {
            self.add_door(door)?;
        }
        Ok(())
    }

    /// Replaces the whole aperture set.
    pub fn replace_apertures(&mut self, apertures: Vec<Aperture>) -> Result<()> {
        self.remove_sub_faces();
        self.add_apertures(apertures)
    }

    /// Projects an aperture into this face's plane and adds it. With an
    /// angle tolerance, apertures that are not parallel within it are
    /// ignored and `false` is returned.
    pub fn project_and_add_aperture(
        &mut self,
        mut aperture: Aperture,
        angle_tolerance: Option<f64>,
    ) -> Result<bool> {
        if !self.projection_is_parallel(aperture.normal(), angle_tolerance) {
            return Ok(false);
        }
        let plane = self.geometry.plane().clone();
        let projected: Vec<Point3<f64>> = aperture
            .geometry()
            .boundary()
            .iter()
            .map(|p| plane.project_point(p))
            .collect();
        aperture.set_geometry(
            Face3D::new_in_plane(projected, plane).map_err(Error::Geometry)?,
        );
        self.add_aperture(aperture)?;
        Ok(true)
    }

    /// Projects a door into this face's plane and adds it.
    pub fn project_and_add_door(
        &mut self,
        mut door: Door,
        angle_tolerance: Option<f64>,
    ) -> Result<bool> {
        if !self.projection_is_parallel(door.normal(), angle_tolerance) {
            return Ok(false);
        }
        let plane = self.geometry.plane().clone();
        let projected: Vec<Point3<f64>> = door
            .geometry()
            .boundary()
            .iter()
            .map(|p| plane.project_point(p))
            .collect();
        door.set_geometry(Face3D::new_in_plane(projected, plane).map_err(Error::Geometry)?);
        self.add_door(door)?;
        Ok(true)
    }

    fn projection_is_parallel(&self, normal: &Vector3<f64>, angle_tolerance: Option<f64>) -> bool {
        match angle_tolerance {
            None => true,
            Some(a_tol) => {
                let angle = self.geometry.plane().angle_to(normal);
                angle <= a_tol || angle >= std::f64::consts::PI - a_tol
            }
        }
    }

    /// Sets this face and `other` mutually adjacent: both boundary
    /// conditions become Surface references to the other, and their
    /// apertures and doors are paired by nearest center within the
    /// tolerance. Errors when sub-face counts differ or any sub-face has
    /// no counterpart; partial adjacency is never left behind.
    pub fn set_adjacency(&mut self, other: &mut Face, tolerance: f64) -> Result<AdjacencyInfo> {
        self.boundary_condition = BoundaryCondition::surface(Self::surface_objects(other));
        other.boundary_condition = BoundaryCondition::surface(Self::surface_objects(self));

        if self.apertures.len() != other.apertures.len() {
            return Err(Error::AdjacencyMismatch(self.mismatch_message(
                other,
                "Number of apertures does not match",
            )));
        }
        if self.doors.len() != other.doors.len() {
            return Err(Error::AdjacencyMismatch(self.mismatch_message(
                other,
                "Number of doors does not match",
            )));
        }

        let mut info = AdjacencyInfo::default();

        // greedy pairing: first counterpart within tolerance wins
        let mut found = 0;
        for ap1 in &mut self.apertures {
            for ap2 in &mut other.apertures {
                if (ap1.center() - ap2.center()).norm() <= tolerance {
                    ap1.set_adjacency(ap2);
                    info.adjacent_apertures
                        .push((ap1.identifier().to_string(), ap2.identifier().to_string()));
                    found += 1;
                    break;
                }
            }
        }
        if found != self.apertures.len() {
            return Err(Error::AdjacencyMismatch(self.mismatch_message(
                other,
                "Not all apertures were found to be adjacent to apertures",
            )));
        }

        let mut found = 0;
        for dr1 in &mut self.doors {
            for dr2 in &mut other.doors {
                if (dr1.center() - dr2.center()).norm() <= tolerance {
                    dr1.set_adjacency(dr2);
                    info.adjacent_doors
                        .push((dr1.identifier().to_string(), dr2.identifier().to_string()));
                    found += 1;
                    break;
                }
            }
        }
        if found != self.doors.len() {
            return Err(Error::AdjacencyMismatch(self.mismatch_message(
                other,
                "Not all doors were found to be adjacent to doors",
            )));
        }

        Ok(info)
    }

    fn surface_objects(face: &Face) -> Vec<String> {
        let mut objects = vec![face.identifier.clone()];
        if let Some(parent) = &face.parent {
            objects.push(parent.clone());
        }
        objects
    }

    fn mismatch_message(&self, other: &Face, base: &str) -> String {
        let mut msg = format!(
            "{base} between {} and {}.",
            self.display_name(),
            other.display_name()
        );
        if let (Some(room_a), Some(room_b)) = (&self.parent, &other.parent) {
            msg = format!("{msg} Relevant rooms: {room_a}, {room_b}.");
        }
        msg
    }

    // ------------------------------------------------------------------
    // Sub-face generation
    // ------------------------------------------------------------------

    /// Replaces all sub-faces with apertures covering `ratio` of the face
    /// area. With `rect_split`, the rectangular portion of the face is
    /// extracted first so gabled faces get a rectangle plus a triangle
    /// rather than one odd pentagon. Degenerate faces are skipped silently.
    pub fn apertures_by_ratio(&mut self, ratio: f64, tolerance: f64, rect_split: bool) -> Result<()> {
        if !(0.0..1.0).contains(&ratio) {
            return Err(Error::ArgumentOutOfRange {
                field: "ratio",
                expected: "between 0 and 1",
                value: ratio,
            });
        }
        self.acceptable_sub_face_check("Aperture")?;
        self.remove_sub_faces();
        if ratio == 0.0 {
            return Ok(());
        }
        let geo = match self.geometry.remove_colinear_vertices(tolerance) {
            Ok(geo) => geo,
            Err(_) => return Ok(()), // degenerate face gets no apertures
        };
        let result = if rect_split {
            ratio::sub_faces_by_ratio_rectangle(&geo, ratio, tolerance)
        } else {
            ratio::sub_faces_by_ratio(&geo, ratio)
        };
        match result {
            Ok(ap_faces) => self.add_generated_apertures(ap_faces),
            Err(_) => Ok(()),
        }
    }

    /// Replaces all sub-faces with customizable rectangular apertures
    /// hitting `ratio` of the face area (height, sill and separations per
    /// the geometry generator; the ratio wins conflicts).
    #[allow(clippy::too_many_arguments)]
    pub fn apertures_by_ratio_rectangle(
        &mut self,
        ratio: f64,
        aperture_height: f64,
        sill_height: f64,
        horizontal_separation: f64,
        vertical_separation: f64,
        tolerance: f64,
    ) -> Result<()> {
        if !(0.0..=0.95).contains(&ratio) {
            return Err(Error::ArgumentOutOfRange {
                field: "ratio",
                expected: "between 0 and 0.95",
                value: ratio,
            });
        }
        self.acceptable_sub_face_check("Aperture")?;
        self.remove_sub_faces();
        if ratio == 0.0 {
            return Ok(());
        }
        let geo = match self.geometry.remove_colinear_vertices(tolerance) {
            Ok(geo) => geo,
            Err(_) => return Ok(()),
        };
        match ratio::sub_faces_by_ratio_sub_rectangle(
            &geo,
            ratio,
            aperture_height,
            sill_height,
            horizontal_separation,
            vertical_separation,
            tolerance,
        ) {
            Ok(ap_faces) => self.add_generated_apertures(ap_faces),
            Err(_) => Ok(()),
        }
    }

    /// Replaces all sub-faces with apertures on a grid derived from this
    /// face's plane; useful for skylights.
    pub fn apertures_by_ratio_gridded(
        &mut self,
        ratio: f64,
        x_dim: f64,
        y_dim: Option<f64>,
        tolerance: f64,
    ) -> Result<()> {
        if !(0.0..1.0).contains(&ratio) {
            return Err(Error::ArgumentOutOfRange {
                field: "ratio",
                expected: "between 0 and 1",
                value: ratio,
            });
        }
        self.acceptable_sub_face_check("Aperture")?;
        self.remove_sub_faces();
        if ratio == 0.0 {
            return Ok(());
        }
        let geo = match self.geometry.remove_colinear_vertices(tolerance) {
            Ok(geo) => geo,
            Err(_) => return Ok(()),
        };
        match ratio::sub_faces_by_ratio_gridded(&geo, ratio, x_dim, y_dim) {
            Ok(ap_faces) => self.add_generated_apertures(ap_faces),
            Err(_) => Ok(()),
        }
    }

    /// Replaces all sub-faces with repeating apertures of an explicit
    /// width and height. Faces without a rectangular portion get none.
    pub fn apertures_by_width_height_rectangle(
        &mut self,
        aperture_height: f64,
        aperture_width: f64,
        sill_height: f64,
        horizontal_separation: f64,
        tolerance: f64,
    ) -> Result<()> {
        if horizontal_separation <= 0.0 {
            return Err(Error::ArgumentOutOfRange {
                field: "horizontal_separation",
                expected: "above 0",
                value: horizontal_separation,
            });
        }
        if aperture_height <= 0.0 || aperture_width <= 0.0 {
            return Ok(());
        }
        self.acceptable_sub_face_check("Aperture")?;
        self.remove_sub_faces();
        let geo = match self.geometry.remove_colinear_vertices(tolerance) {
            Ok(geo) => geo,
            Err(_) => return Ok(()),
        };
        match ratio::sub_faces_by_dimension_rectangle(
            &geo,
            aperture_height,
            aperture_width,
            sill_height,
            horizontal_separation,
            tolerance,
        ) {
            Ok(ap_faces) => self.add_generated_apertures(ap_faces),
            Err(_) => Ok(()),
        }
    }

    /// Adds a single centered aperture of the given width and height at a
    /// sill height, preserving existing apertures. Returns the identifier
    /// of the new aperture, or `None` for non-positive dimensions.
    pub fn aperture_by_width_height(
        &mut self,
        width: f64,
        height: f64,
        sill_height: f64,
        aperture_identifier: Option<String>,
    ) -> Result<Option<String>> {
        if width <= 0.0 || height <= 0.0 {
            return Ok(None);
        }
        self.acceptable_sub_face_check("Aperture")?;
        let ref_plane = ratio::reference_plane(&self.geometry, 0.017_453_292_519_943_295)
            .map_err(Error::Geometry)?;
        let center_2d = ref_plane.xyz_to_xy(&self.geometry.center());
        let window = Polygon2D::from_rectangle(
            Point2::new(center_2d.x - width * 0.5, sill_height),
            width,
            height,
        )
        .map_err(Error::Geometry)?;
        let geometry = Face3D::from_polygon(&window, &ref_plane).map_err(Error::Geometry)?;
        let identifier = aperture_identifier
            .unwrap_or_else(|| format!("{}_Glz{}", self.identifier, self.apertures.len()));
        let aperture = Aperture::new(identifier.clone(), geometry)?;
        self.add_aperture(aperture)?;
        Ok(Some(identifier))
    }

    fn add_generated_apertures(&mut self, ap_faces: Vec<Face3D>) -> Result<()> {
        for (i, ap_face) in ap_faces.into_iter().enumerate() {
            let aperture = Aperture::new(format!("{}_Glz{i}", self.identifier), ap_face)?;
            self.add_aperture(aperture)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shade generation
    // ------------------------------------------------------------------

    /// Adds a single overhang shade across the top of this face. Returns
    /// the new shade identifiers.
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

    /// Adds louvered shades by count or spacing: with neither, one louver;
    /// with a spacing, the count (if given) caps how many are generated.
    #[allow(clippy::too_many_arguments)]
    pub fn louvers(
        &mut self,
        depth: f64,
        louver_count: Option<usize>,
        distance: Option<f64>,
        offset: f64,
        angle: f64,
        contour_vector: Vector2<f64>,
        flip_start: bool,
        indoor: bool,
        tolerance: f64,
        base_name: Option<&str>,
    ) -> Result<Vec<String>> {
        if depth == 0.0 || louver_count == Some(0) {
            return Ok(Vec::new());
        }
        match (louver_count, distance) {
            (None, None) => self.louvers_by_count(
                1,
                depth,
                offset,
                angle,
                contour_vector,
                flip_start,
                indoor,
                tolerance,
                base_name,
            ),
            (Some(count), None) => self.louvers_by_count(
                count,
                depth,
                offset,
                angle,
                contour_vector,
                flip_start,
                indoor,
                tolerance,
                base_name,
            ),
            (count, Some(distance)) => self.louvers_by_distance_between(
                distance,
                depth,
                offset,
                angle,
                contour_vector,
                flip_start,
                indoor,
                tolerance,
                count,
                base_name,
            ),
        }
    }

    /// Adds louvered shades over this face to hit a target count. Returns
    /// the new shade identifiers.
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

    /// Adds louvered shades over this face at a target spacing, filling
    /// the face extent up to an optional maximum count. Returns the new
    /// shade identifiers.
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

    // ------------------------------------------------------------------
    // Sub-face reconciliation
    // ------------------------------------------------------------------

    /// Converts every non-rectangular aperture into one or more
    /// rectangular ones.
    ///
    /// With a `max_separation`, nearby apertures are merged before
    /// conversion (all of them when `merge_all` is set). Without a
    /// `subdivision_distance`, each shape snaps to its bounding rectangle,
    /// which may overlap neighbors or spill past the face; with one, shapes
    /// are gridded at that resolution and the grid rows merged into
    /// area-preserving rectangular strips that stay inside the original.
    ///
    /// Regenerated apertures inherit the identifier and operable flag of
    /// the original whose centroid falls inside their bounding rectangle;
    /// unmatched ones get synthesized identifiers. Returns whether any
    /// apertures changed.
    pub fn rectangularize_apertures(
        &mut self,
        subdivision_distance: Option<f64>,
        max_separation: Option<f64>,
        merge_all: bool,
        tolerance: f64,
        angle_tolerance: f64,
    ) -> Result<bool> {
        if self.apertures.is_empty() {
            return Ok(false);
        }

        // sort the rectangular from the non-rectangular apertures
        let mut rect_aps: Vec<Aperture> = Vec::new();
        let mut non_rect_aps: Vec<Aperture> = Vec::new();
        let mut non_rect_geos: Vec<Face3D> = Vec::new();
        for aperture in self.apertures.clone() {
            let clean_geo = match aperture.geometry().remove_colinear_vertices(tolerance) {
                Ok(geo) => geo,
                Err(_) => continue, // degenerate aperture is dropped
            };
            if max_separation.is_none() || !merge_all {
                if clean_geo.is_rectangle(angle_tolerance) {
                    rect_aps.push(aperture);
                } else {
                    non_rect_aps.push(aperture);
                    non_rect_geos.push(clean_geo);
                }
            } else {
                non_rect_aps.push(aperture);
                non_rect_geos.push(clean_geo);
            }
        }
        if non_rect_geos.is_empty() {
            return Ok(false); // nothing to be rectangularized
        }

        // re-open the boundary condition so new apertures can be added
        if !self.boundary_condition.is_outdoors() {
            self.boundary_condition = BoundaryCondition::Outdoors;
            for aperture in &mut rect_aps {
                aperture.set_boundary_condition_unchecked(BoundaryCondition::Outdoors);
            }
        }

        let mut edits_occurred = false;
        let ref_plane =
            ratio::reference_plane(&self.geometry, angle_tolerance).map_err(Error::Geometry)?;

        // merge neighboring shapes when a separation distance is given
        if let Some(max_sep) = max_separation {
            if merge_all || non_rect_geos.len() > 1 {
                edits_occurred = true;
                let polys: Vec<Polygon2D> = non_rect_geos
                    .iter()
                    .map(|g| g.polygon_in_plane(&ref_plane))
                    .collect();
                let joined = if max_sep <= tolerance {
                    bool2d::joined_intersected_boundary(&polys, tolerance)
                } else {
                    bool2d::gap_crossing_boundary(&polys, max_sep, tolerance)
                };
                non_rect_geos = joined
                    .iter()
                    .filter_map(|p| p.remove_colinear_vertices(tolerance).ok())
                    .filter_map(|p| Face3D::from_polygon(&p, &ref_plane).ok())
                    .collect();
            }
        }

        // snap remaining shapes to bounding rectangles when not subdividing
        if subdivision_distance.is_none() {
            edits_occurred = true;
            let mut rect_geos = Vec::with_capacity(non_rect_geos.len());
            for geo in &non_rect_geos {
                let poly = geo.polygon_in_plane(&ref_plane);
                if poly.is_rectangle(angle_tolerance) {
                    rect_geos.push(geo.clone()); // rectangle found in merging
                    continue;
                }
                let min = poly.min();
                let max = poly.max();
                let bound =
                    match Polygon2D::from_rectangle(min, max.x - min.x, max.y - min.y) {
                        Ok(rect) => rect,
                        Err(_) => continue,
                    };
                if let Ok(face) = Face3D::from_polygon(&bound, &ref_plane) {
                    rect_geos.push(face);
                }
            }
            non_rect_geos = rect_geos;
        }

        // rebuild aperture objects, matching identities by centroid
        let new_aps: Vec<Aperture> = if !edits_occurred {
            non_rect_aps.clone()
        } else {
            let originals: Vec<(Polygon2D, &Aperture)> = non_rect_aps
                .iter()
                .map(|ap| (ap.geometry().polygon_in_plane(&ref_plane), ap))
                .collect();
            let mut rebuilt = Vec::new();
            for (i, geo) in non_rect_geos.iter().enumerate() {
                let new_poly = geo.polygon_in_plane(&ref_plane);
                let matched = originals
                    .iter()
                    .find(|(poly, _)| new_poly.is_point_inside_bound_rect(&poly.centroid()));
                let new_ap = match matched {
                    Some((_, original)) => {
                        let mut ap = Aperture::new(original.identifier().to_string(), geo.clone())?
                            .with_operable(original.is_operable());
                        ap.set_display_name(format!("{}_{i}", original.display_name()));
                        ap
                    }
                    None => Aperture::new(format!("{}_RG{i}", self.identifier), geo.clone())?,
                };
                rebuilt.push(new_ap);
            }
            rebuilt
        };

        let Some(distance) = subdivision_distance else {
            // no subdivision: drop overlaps, keeping the largest of each group
            let mut all_aps = rect_aps;
            all_aps.extend(new_aps);
            let all_aps = Self::remove_overlapping_sub_faces(all_aps, &ref_plane, tolerance);
            self.remove_apertures();
            self.add_apertures(all_aps)?;
            return Ok(true);
        };

        // subdivide each shape into a grid and merge rows into strips
        let mut new_ap_objs: Vec<Aperture> = Vec::new();
        for ap_obj in &new_aps {
            let geo_poly = ap_obj.geometry().polygon_in_plane(&ref_plane);
            if geo_poly.is_rectangle(angle_tolerance) {
                new_ap_objs.push(ap_obj.clone());
                continue;
            }
            let cells = match polygon_grid_cells(&geo_poly, distance, distance) {
                Ok(cells) if !cells.is_empty() => cells,
                _ => continue, // aperture smaller than the resolution
            };
            for (j, (strip_min, strip_max)) in
                merge_cells_into_strips(&cells, tolerance).into_iter().enumerate()
            {
                let rect = match Polygon2D::from_rectangle(
                    strip_min,
                    strip_max.x - strip_min.x,
                    strip_max.y - strip_min.y,
                ) {
                    Ok(rect) => rect,
                    Err(_) => continue,
                };
                let geometry = match Face3D::from_polygon(&rect, &ref_plane) {
                    Ok(face) => face,
                    Err(_) => continue,
                };
                let mut strip =
                    Aperture::new(format!("{}_Glz{j}", ap_obj.identifier()), geometry)?
                        .with_operable(ap_obj.is_operable());
                strip.set_display_name(format!("{}_{j}", ap_obj.display_name()));
                new_ap_objs.push(strip);
            }
        }
        self.remove_apertures();
        self.add_apertures(rect_aps)?;
        self.add_apertures(new_ap_objs)?;
        Ok(true)
    }

    /// Fixes invalid sub-faces with two independently toggleable passes:
    /// trimming sub-faces that spill past the parent (with an inward edge
    /// offset guaranteeing clearance from the boundary) and unioning
    /// sub-faces that overlap or touch. When either pass changes the
    /// sub-face count or total area beyond tolerance, the whole set is
    /// rebuilt with identities matched by centroid.
    pub fn fix_invalid_sub_faces(
        &mut self,
        trim_with_parent: bool,
        union_overlaps: bool,
        offset_distance: f64,
        tolerance: f64,
    ) -> Result<()> {
        let prim_pl = self.geometry.plane().clone();
        let (original_polys, original_objs, original_area) =
            self.sub_face_snapshot(&prim_pl, tolerance);
        let mut clean_polys = original_polys.clone();

        if trim_with_parent {
            let parent_poly = self.geometry.polygon_in_plane(&prim_pl);
            let parent_holes = self.geometry.hole_polygons_in_plane(&prim_pl);
            let parent_edges: Vec<Segment3D> = self
                .geometry
                .boundary_segments()
                .into_iter()
                .chain(self.geometry.hole_segments())
                .collect();
            let mut trimmed = Vec::with_capacity(clean_polys.len());
            for polygon in &clean_polys {
                if is_sub_polygon(polygon, &parent_poly, &parent_holes) {
                    trimmed.push(polygon.clone());
                    continue;
                }
                let mut pieces = bool2d::boolean_intersection(&parent_poly, polygon, tolerance);
                if !parent_holes.is_empty() {
                    pieces = pieces
                        .iter()
                        .flat_map(|p| bool2d::boolean_difference(p, &parent_holes, tolerance))
                        .collect();
                }
                // sub-face completely outside the parent simply disappears
                for piece in pieces {
                    trimmed.push(offset_from_edges(
                        &piece,
                        &parent_edges,
                        &prim_pl,
                        offset_distance,
                    ));
                }
            }
            clean_polys = trimmed;
        }

        if union_overlaps {
            let groups = bool2d::group_by_overlap(&clean_polys, tolerance);
            if groups.iter().any(|g| g.len() > 1) {
                let mut unioned = Vec::new();
                for group in &groups {
                    if group.len() == 1 {
                        unioned.push(clean_polys[group[0]].clone());
                    } else {
                        let members: Vec<Polygon2D> =
                            group.iter().map(|&i| clean_polys[i].clone()).collect();
                        for merged in bool2d::boolean_union_all(&members, tolerance) {
                            if let Ok(cleaned) = merged.remove_colinear_vertices(tolerance) {
                                unioned.push(cleaned);
                            }
                        }
                    }
                }
                clean_polys = unioned;
            }
            clean_polys = bool2d::joined_intersected_boundary(&clean_polys, tolerance);
        }

        let new_area: f64 = clean_polys.iter().map(Polygon2D::area).sum();
        if clean_polys.len() != original_polys.len()
            || (original_area - new_area).abs() > tolerance
        {
            self.remove_sub_faces();
            self.rebuild_sub_faces(&clean_polys, &original_polys, &original_objs, &prim_pl)?;
        }
        Ok(())
    }

    /// Merges neighboring apertures and doors into single sub-faces: those
    /// touching always merge, those within `merge_distance` merge across
    /// the gap. Useful for simplifying triangulated apertures on concave
    /// faces.
    pub fn merge_neighboring_sub_faces(
        &mut self,
        merge_distance: f64,
        tolerance: f64,
    ) -> Result<()> {
        if self.sub_face_count() <= 1 {
            return Ok(());
        }
        let prim_pl = self.geometry.plane().clone();
        let (original_polys, original_objs, original_area) =
            self.sub_face_snapshot(&prim_pl, tolerance);
        let joined = if merge_distance <= tolerance {
            bool2d::joined_intersected_boundary(&original_polys, tolerance)
        } else {
            bool2d::gap_crossing_boundary(&original_polys, merge_distance, tolerance)
        };
        let new_area: f64 = joined.iter().map(Polygon2D::area).sum();
        if joined.len() != original_polys.len() || (original_area - new_area).abs() > tolerance {
            let cleaned: Vec<Polygon2D> = joined
                .iter()
                .filter_map(|p| p.remove_colinear_vertices(tolerance).ok())
                .collect();
            self.remove_sub_faces();
            self.rebuild_sub_faces(&cleaned, &original_polys, &original_objs, &prim_pl)?;
        }
        Ok(())
    }

    /// Offsets the edges of every aperture, outward for positive
    /// distances. Useful when translating between window conventions that
    /// include or exclude the frame. Apertures whose offset degenerates
    /// are kept unchanged; `fix_invalid_sub_faces` cleans up collisions.
    pub fn offset_aperture_edges(&mut self, offset_distance: f64, tolerance: f64) -> Result<()> {
        let prim_pl = self.geometry.plane().clone();
        let apertures = self.remove_apertures();
        for mut aperture in apertures {
            let offset = aperture
                .geometry()
                .polygon_in_plane(&prim_pl)
                .remove_colinear_vertices(tolerance)
                .and_then(|poly| poly.offset(-offset_distance));
            if let Ok(poly) = offset {
                if let Ok(geometry) = Face3D::from_polygon(&poly, &prim_pl) {
                    aperture.set_geometry(geometry);
                }
            }
            self.add_aperture(aperture)?;
        }
        Ok(())
    }

    /// Projects sub-face polygons into the face plane and snapshots the
    /// owning objects, silently skipping degenerate geometry.
    fn sub_face_snapshot(
        &self,
        plane: &Plane,
        tolerance: f64,
    ) -> (Vec<Polygon2D>, Vec<SubFaceSnapshot>, f64) {
        let mut polys = Vec::new();
        let mut objs = Vec::new();
        let mut area = 0.0;
        for aperture in &self.apertures {
            if let Ok(poly) = aperture
                .geometry()
                .polygon_in_plane(plane)
                .remove_colinear_vertices(tolerance)
            {
                area += poly.area();
                polys.push(poly);
                objs.push(SubFaceSnapshot::Aperture(aperture.duplicate()));
            }
        }
        for door in &self.doors {
            if let Ok(poly) = door
                .geometry()
                .polygon_in_plane(plane)
                .remove_colinear_vertices(tolerance)
            {
                area += poly.area();
                polys.push(poly);
                objs.push(SubFaceSnapshot::Door(door.duplicate()));
            }
        }
        (polys, objs, area)
    }

    /// Rebuilds the sub-face set from repaired polygons. Each polygon is
    /// matched to the original object whose centroid falls inside its
    /// bounding rectangle (first match wins, preserving identifier, kind
    /// and operable flag); unmatched polygons become new apertures.
    fn rebuild_sub_faces(
        &mut self,
        new_polys: &[Polygon2D],
        original_polys: &[Polygon2D],
        original_objs: &[SubFaceSnapshot],
        plane: &Plane,
    ) -> Result<()> {
        for (i, n_poly) in new_polys.iter().enumerate() {
            let geometry = Face3D::from_polygon(n_poly, plane).map_err(Error::Geometry)?;
            let matched = original_polys
                .iter()
                .zip(original_objs)
                .find(|(o_poly, _)| n_poly.is_point_inside_bound_rect(&o_poly.centroid()))
                .map(|(_, obj)| obj);
            match matched {
                Some(SubFaceSnapshot::Aperture(original)) => {
                    let mut aperture = original.duplicate();
                    aperture.set_geometry(geometry);
                    self.add_aperture(aperture)?;
                }
                Some(SubFaceSnapshot::Door(original)) => {
                    let mut door = original.duplicate();
                    door.set_geometry(geometry);
                    self.add_door(door)?;
                }
                None => {
                    let aperture = Aperture::new(format!("{}_{i}", self.identifier), geometry)?;
                    self.add_aperture(aperture)?;
                }
            }
        }
        Ok(())
    }

    /// Drops overlapping apertures, keeping the largest of each overlap
    /// group.
    fn remove_overlapping_sub_faces(
        apertures: Vec<Aperture>,
        ref_plane: &Plane,
        tolerance: f64,
    ) -> Vec<Aperture> {
        if apertures.len() <= 1 {
            return apertures;
        }
        let mut sorted = apertures;
        sorted.sort_by(|a, b| {
            b.area()
                .partial_cmp(&a.area())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let polys: Vec<Polygon2D> = sorted
            .iter()
            .map(|ap| ap.geometry().polygon_in_plane(ref_plane))
            .collect();
        let groups = bool2d::group_by_overlap(&polys, tolerance);
        let mut keep = vec![false; sorted.len()];
        for group in groups {
            if let Some(&first) = group.first() {
                keep[first] = true; // largest member: groups build in area order
            }
        }
        sorted
            .into_iter()
            .zip(keep)
            .filter_map(|(ap, kept)| kept.then_some(ap))
            .collect()
    }

    // ------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------

    pub fn translate(&mut self, vector: &Vector3<f64>) {
        self.geometry = self.geometry.translated(vector);
        for aperture in &mut self.apertures {
            aperture.translate(vector);
        }
        for door in &mut self.doors {
            door.translate(vector);
        }
        self.translate_shades(vector);
        self.invalidate_punched();
    }

    pub fn rotate(&mut self, axis: &Vector3<f64>, angle: f64, origin: &Point3<f64>) {
        self.geometry = self.geometry.rotated(axis, angle, origin);
        for aperture in &mut self.apertures {
            aperture.rotate(axis, angle, origin);
        }
        for door in &mut self.doors {
            door.rotate(axis, angle, origin);
        }
        self.rotate_shades(axis, angle, origin);
        self.invalidate_punched();
    }

    pub fn rotate_xy(&mut self, angle: f64, origin: &Point3<f64>) {
        self.rotate(&Vector3::z(), angle, origin);
    }

    pub fn scale(&mut self, factor: f64, origin: &Point3<f64>) {
        self.geometry = self.geometry.scaled(factor, origin);
        for aperture in &mut self.apertures {
            aperture.scale(factor, origin);
        }
        for door in &mut self.doors {
            door.scale(factor, origin);
        }
        self.scale_shades(factor, origin);
        self.invalidate_punched();
    }

    pub fn reflect(&mut self, normal: &Vector3<f64>, origin: &Point3<f64>) -> Result<()> {
        self.geometry = self.geometry.reflected(normal, origin)?;
        for aperture in &mut self.apertures {
            aperture.reflect(normal, origin)?;
        }
        for door in &mut self.doors {
            door.reflect(normal, origin)?;
        }
        self.reflect_shades(normal, origin)?;
        self.invalidate_punched();
        Ok(())
    }

    /// Removes colinear and duplicate vertices from this face's boundary.
    /// Sub-faces and shades are unaffected.
    pub fn remove_colinear_vertices(&mut self, tolerance: f64) -> Result<()> {
        self.geometry = self
            .geometry
            .remove_colinear_vertices(tolerance)
            .map_err(|e| Error::InvalidGeometry {
                entity: "Face",
                id: self.identifier.clone(),
                reason: e.to_string(),
            })?;
        self.invalidate_punched();
        Ok(())
    }

    /// Cleans colinear vertices from every sub-face and drops the ones
    /// that degenerate. Returns how many were removed.
    pub fn remove_degenerate_sub_faces(&mut self, tolerance: f64) -> usize {
        let before = self.sub_face_count();
        self.apertures
            .retain_mut(|aperture| aperture.remove_colinear_vertices(tolerance).is_ok());
        self.doors
            .retain_mut(|door| door.remove_colinear_vertices(tolerance).is_ok());
        let removed = before - self.sub_face_count();
        if removed > 0 {
            self.invalidate_punched();
        }
        removed
    }

    /// Geometric equivalence with another face, including children.
    pub fn is_geo_equivalent(&self, other: &Face, tolerance: f64) -> bool {
        if self.display_name() != other.display_name()
            || self.face_type != other.face_type
            || self.boundary_condition.name() != other.boundary_condition.name()
        {
            return false;
        }
        if (self.area() - other.area()).abs() > tolerance * self.area().max(1.0) {
            return false;
        }
        if !self.geometry.is_centered_adjacent(&other.geometry, tolerance) {
            return false;
        }
        if self.apertures.len() != other.apertures.len() || self.doors.len() != other.doors.len() {
            return false;
        }
        self.apertures
            .iter()
            .zip(&other.apertures)
            .all(|(a, b)| a.is_geo_equivalent(b, tolerance))
            && self
                .doors
                .iter()
                .zip(&other.doors)
                .all(|(a, b)| a.is_geo_equivalent(b, tolerance))
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    fn record(&self, code: &str, error_type: &str, message: String) -> ValidationRecord {
        ValidationRecord::new(
            code,
            error_type,
            message,
            "Face",
            self.identifier.clone(),
            self.display_name().to_string(),
            self.parent.iter().cloned().collect(),
        )
    }

    fn child_record(
        &self,
        code: &str,
        error_type: &str,
        message: String,
        element_type: &str,
        element_id: String,
        element_name: String,
    ) -> ValidationRecord {
        let mut parents = vec![self.identifier.clone()];
        parents.extend(self.parent.iter().cloned());
        ValidationRecord::new(
            code,
            error_type,
            message,
            element_type,
            element_id,
            element_name,
            parents,
        )
    }

    /// Checks that every vertex lies in the face plane.
    pub fn check_planar(&self, tolerance: f64, mode: CheckMode) -> Result<Vec<ValidationRecord>> {
        let bad = self.geometry.non_planar_vertices(tolerance);
        if bad.is_empty() {
            return resolve(Vec::new(), mode);
        }
        let mut record = self.record(
            "000101",
            "Non-Planar Geometry",
            format!("Face \"{}\" is not planar.", self.display_name()),
        );
        record.helper_geometry = Some(bad.iter().map(|p| [p.x, p.y, p.z]).collect());
        resolve(vec![record], mode)
    }

    /// Checks that the boundary edges do not cross one another. Faces that
    /// self-intersect only because of a duplicate vertex pass.
    pub fn check_self_intersecting(
        &self,
        tolerance: f64,
        mode: CheckMode,
    ) -> Result<Vec<ValidationRecord>> {
        if !self.geometry.is_self_intersecting() {
            return resolve(Vec::new(), mode);
        }
        if let Ok(deduped) = self.geometry.remove_duplicate_vertices(tolerance) {
            if !deduped.is_self_intersecting() {
                return resolve(Vec::new(), mode); // artifact of a duplicate vertex
            }
        }
        let record = self.record(
            "000102",
            "Self-Intersecting Geometry",
            format!("Face \"{}\" has self-intersecting edges.", self.display_name()),
        );
        resolve(vec![record], mode)
    }

    /// Checks that the face still has real area once colinear vertices
    /// within the tolerance are removed.
    pub fn check_degenerate(&self, tolerance: f64, mode: CheckMode) -> Result<Vec<ValidationRecord>> {
        if let Ok(cleaned) = self.geometry.remove_colinear_vertices(tolerance) {
            if cleaned.area() > tolerance {
                return resolve(Vec::new(), mode);
            }
        }
        let record = self.record(
            "000103",
            "Zero-Area Geometry",
            format!(
                "Face \"{}\" is degenerate and should be deleted.",
                self.display_name()
            ),
        );
        resolve(vec![record], mode)
    }

    /// Checks that every aperture is coplanar with and bounded by this face.
    pub fn check_apertures_valid(
        &self,
        tolerance: f64,
        angle_tolerance: f64,
        mode: CheckMode,
    ) -> Result<Vec<ValidationRecord>> {
        let mut records = Vec::new();
        for aperture in &self.apertures {
            if !self
                .geometry
                .is_sub_face(aperture.geometry(), tolerance, angle_tolerance)
            {
                records.push(self.child_record(
                    "000104",
                    "Invalid Sub-Face Geometry",
                    format!(
                        "Aperture \"{}\" is not coplanar or fully bounded by its parent Face \"{}\".",
                        aperture.display_name(),
                        self.display_name()
                    ),
                    "Aperture",
                    aperture.identifier().to_string(),
                    aperture.display_name().to_string(),
                ));
            }
        }
        resolve(records, mode)
    }

    /// Checks that every door is coplanar with and bounded by this face.
    pub fn check_doors_valid(
        &self,
        tolerance: f64,
        angle_tolerance: f64,
        mode: CheckMode,
    ) -> Result<Vec<ValidationRecord>> {
        let mut records = Vec::new();
        for door in &self.doors {
            if !self
                .geometry
                .is_sub_face(door.geometry(), tolerance, angle_tolerance)
            {
                records.push(self.child_record(
                    "000104",
                    "Invalid Sub-Face Geometry",
                    format!(
                        "Door \"{}\" is not coplanar or fully bounded by its parent Face \"{}\".",
                        door.display_name(),
                        self.display_name()
                    ),
                    "Door",
                    door.identifier().to_string(),
                    door.display_name().to_string(),
                ));
            }
        }
        resolve(records, mode)
    }

    /// Checks apertures and doors together.
    pub fn check_sub_faces_valid(
        &self,
        tolerance: f64,
        angle_tolerance: f64,
        mode: CheckMode,
    ) -> Result<Vec<ValidationRecord>> {
        let mut records = self.check_apertures_valid(tolerance, angle_tolerance, CheckMode::Collect)?;
        records.extend(self.check_doors_valid(tolerance, angle_tolerance, CheckMode::Collect)?);
        resolve(records, mode)
    }

    /// Checks that sub-faces do not overlap one another.
    pub fn check_sub_faces_overlapping(
        &self,
        tolerance: f64,
        mode: CheckMode,
    ) -> Result<Vec<ValidationRecord>> {
        if self.sub_face_count() <= 1 {
            return resolve(Vec::new(), mode);
        }
        let plane = self.geometry.plane();
        let mut polys = Vec::new();
        let mut labels: Vec<(String, String)> = Vec::new();
        for aperture in &self.apertures {
            polys.push(aperture.geometry().polygon_in_plane(plane));
            labels.push((
                aperture.identifier().to_string(),
                aperture.display_name().to_string(),
            ));
        }
        for door in &self.doors {
            polys.push(door.geometry().polygon_in_plane(plane));
            labels.push((door.identifier().to_string(), door.display_name().to_string()));
        }
        let groups = bool2d::group_by_overlap(&polys, tolerance);
        let mut records = Vec::new();
        for group in groups.iter().filter(|g| g.len() > 1) {
            let names: Vec<&str> = group.iter().map(|&i| labels[i].0.as_str()).collect();
            let mut record = self.child_record(
                "000105",
                "Overlapping Sub-Face Geometry",
                format!(
                    "Face \"{}\" contains Apertures and/or Doors that overlap with each other: {}",
                    self.display_name(),
                    names.join(", ")
                ),
                "SubFace",
                labels[group[0]].0.clone(),
                labels[group[0]].1.clone(),
            );
            for &i in &group[1..] {
                record.element_id.push(labels[i].0.clone());
                record.element_name.push(labels[i].1.clone());
                record.parents.push(record.parents[0].clone());
            }
            records.push(record);
        }
        resolve(records, mode)
    }

    /// Checks for floors pointing up or roofs pointing down beyond the
    /// angle tolerance (radians).
    pub fn check_upside_down(
        &self,
        angle_tolerance: f64,
        mode: CheckMode,
    ) -> Result<Vec<ValidationRecord>> {
        let half_pi = std::f64::consts::FRAC_PI_2;
        let altitude = self.altitude();
        let message = match self.face_type {
            FaceType::Floor if altitude > half_pi - angle_tolerance => Some(format!(
                "Face \"{}\" is an upward-pointing Floor, which should be changed to a RoofCeiling.",
                self.display_name()
            )),
            FaceType::RoofCeiling if altitude < angle_tolerance - half_pi => Some(format!(
                "Face \"{}\" is a downward-pointing RoofCeiling, which should be changed to a Floor.",
                self.display_name()
            )),
            _ => None,
        };
        match message {
            Some(msg) => resolve(vec![self.record("000109", "Upside Down Face", msg)], mode),
            None => resolve(Vec::new(), mode),
        }
    }
}

impl Shaded for Face {
    fn shade_set(&self) -> &ShadeSet {
        &self.shades
    }

    fn shade_set_mut(&mut self) -> &mut ShadeSet {
        &mut self.shades
    }
}

/// True when `sub` lies inside the parent boundary and outside its holes.
fn is_sub_polygon(sub: &Polygon2D, parent: &Polygon2D, parent_holes: &[Polygon2D]) -> bool {
    if !parent.is_polygon_inside(sub) {
        return false;
    }
    parent_holes.iter().all(|hole| hole.is_polygon_outside(sub))
}

/// Pushes the vertices of a trimmed polygon away from any parent edge
/// closer than `offset_distance`, along the edge's in-plane perpendicular.
fn offset_from_edges(
    polygon: &Polygon2D,
    parent_edges: &[Segment3D],
    plane: &Plane,
    offset_distance: f64,
) -> Polygon2D {
    let axis = Unit::new_normalize(*plane.normal());
    let quarter_turn = Rotation3::from_axis_angle(&axis, std::f64::consts::FRAC_PI_2);
    let mut moved = Vec::with_capacity(polygon.len());
    for pt2 in polygon.vertices() {
        let mut pt3 = plane.xy_to_xyz(pt2);
        for edge in parent_edges {
            let closest = edge.closest_point(&pt3);
            if (pt3 - closest).norm() < offset_distance {
                let move_vec = quarter_turn * edge.vector();
                let norm = move_vec.norm();
                if norm > 1e-12 {
                    pt3 += move_vec / norm * offset_distance;
                }
            }
        }
        moved.push(plane.xyz_to_xy(&pt3));
    }
    Polygon2D::new(moved).unwrap_or_else(|_| polygon.clone())
}

/// Merges grid cells into maximal rectangular strips: contiguous cells in
/// each column first, then neighboring columns with the same vertical
/// extent.
fn merge_cells_into_strips(
    cells: &[GridCell],
    tolerance: f64,
) -> Vec<(Point2<f64>, Point2<f64>)> {
    let mut runs: Vec<(Point2<f64>, Point2<f64>)> = Vec::new();
    for cell in cells {
        match runs.last_mut() {
            Some(run)
                if (run.0.x - cell.min.x).abs() <= tolerance
                    && (run.1.x - cell.max.x).abs() <= tolerance
                    && (run.1.y - cell.min.y).abs() <= tolerance =>
            {
                run.1.y = cell.max.y;
            }
            _ => runs.push((cell.min, cell.max)),
        }
    }
    let mut strips: Vec<(Point2<f64>, Point2<f64>)> = Vec::new();
    for run in runs {
        match strips.last_mut() {
            Some(strip)
                if (strip.0.y - run.0.y).abs() <= tolerance
                    && (strip.1.y - run.1.y).abs() <= tolerance
                    && (strip.1.x - run.0.x).abs() <= tolerance =>
            {
                strip.1.x = run.1.x;
            }
            _ => strips.push(run),
        }
    }
    strips
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wall() -> Face {
        Face::from_vertices(
            "south_wall",
            &[
                [0.0, 0.0, 0.0],
                [3.0, 0.0, 0.0],
                [3.0, 0.0, 3.0],
                [0.0, 0.0, 3.0],
            ],
            None,
            None,
        )
        .unwrap()
    }

    fn window(id: &str, x0: f64, z0: f64, size: f64) -> Aperture {
        let geometry = Face3D::new(vec![
            Point3::new(x0, 0.0, z0),
            Point3::new(x0 + size, 0.0, z0),
            Point3::new(x0 + size, 0.0, z0 + size),
            Point3::new(x0, 0.0, z0 + size),
        ])
        .unwrap();
        Aperture::new(id, geometry).unwrap()
    }

    #[test]
    fn derived_type_and_boundary_condition() {
        let face = wall();
        assert_eq!(face.face_type(), FaceType::Wall);
        assert_eq!(*face.boundary_condition(), BoundaryCondition::Outdoors);
    }

    #[test]
    fn punched_geometry_invalidates_on_change() {
        let mut face = wall();
        assert_relative_eq!(face.punched_geometry().area(), 9.0, epsilon = 1e-9);
        face.add_aperture(window("w", 1.0, 1.0, 1.0)).unwrap();
        assert_relative_eq!(face.punched_geometry().area(), 8.0, epsilon = 1e-9);
        face.remove_apertures();
        assert_relative_eq!(face.punched_geometry().area(), 9.0, epsilon = 1e-9);
    }

    #[test]
    fn add_aperture_flips_reversed_normals() {
        let mut face = wall();
        let reversed = Aperture::new(
            "w",
            window("w", 1.0, 1.0, 1.0).geometry().flip(),
        )
        .unwrap();
        face.add_aperture(reversed).unwrap();
        assert!(face.normal().dot(face.apertures()[0].normal()) > 0.0);
    }

    #[test]
    fn ground_face_rejects_sub_faces() {
        let mut face = wall();
        face.set_boundary_condition(BoundaryCondition::Ground).unwrap();
        assert!(face.add_aperture(window("w", 1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn boundary_condition_locked_with_sub_faces() {
        let mut face = wall();
        face.add_aperture(window("w", 1.0, 1.0, 1.0)).unwrap();
        assert!(face.set_boundary_condition(BoundaryCondition::Ground).is_err());
        assert!(face
            .set_boundary_condition(BoundaryCondition::surface(vec!["other".into()]))
            .is_ok());
    }

    #[test]
    fn air_boundary_rejects_sub_faces() {
        let mut face = wall();
        face.set_face_type(FaceType::AirBoundary).unwrap();
        assert!(face.add_aperture(window("w", 1.0, 1.0, 1.0)).is_err());
        let mut face2 = wall();
        face2.add_aperture(window("w", 1.0, 1.0, 1.0)).unwrap();
        assert!(face2.set_face_type(FaceType::AirBoundary).is_err());
    }

    #[test]
    fn cardinal_directions() {
        let face = wall(); // normal -Y points south with +Y north
        assert_eq!(face.cardinal_direction(Vector2::new(0.0, 1.0)), "South");
    }

    #[test]
    fn upside_down_floor_detected() {
        let mut roof_geo = Face::from_vertices(
            "flipped_floor",
            &[
                [0.0, 0.0, 3.0],
                [3.0, 0.0, 3.0],
                [3.0, 3.0, 3.0],
                [0.0, 3.0, 3.0],
            ],
            Some(FaceType::Floor),
            Some(BoundaryCondition::Outdoors),
        )
        .unwrap();
        let records = roof_geo
            .check_upside_down(0.017, CheckMode::Collect)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "000109");
        assert!(roof_geo.check_upside_down(0.017, CheckMode::RaiseFirst).is_err());
        roof_geo.set_face_type(FaceType::RoofCeiling).unwrap();
        assert!(roof_geo
            .check_upside_down(0.017, CheckMode::Collect)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn overlapping_sub_faces_detected() {
        let mut face = wall();
        face.add_aperture(window("a", 0.5, 0.5, 1.5)).unwrap();
        face.add_aperture(window("b", 1.0, 1.0, 1.5)).unwrap();
        let records = face
            .check_sub_faces_overlapping(0.01, CheckMode::Collect)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].element_id.len(), 2);
    }

    #[test]
    fn degenerate_check_catches_slivers() {
        let sliver = Face::from_vertices(
            "sliver",
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 0.0, 0.001],
                [0.0, 0.0, 0.001],
            ],
            None,
            None,
        )
        .unwrap();
        assert!(!sliver
            .check_degenerate(0.01, CheckMode::Collect)
            .unwrap()
            .is_empty());
        assert!(wall()
            .check_degenerate(0.01, CheckMode::Collect)
            .unwrap()
            .is_empty());
    }
}

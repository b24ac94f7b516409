// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shade-bearing capability.
//!
//! Faces, apertures, doors and rooms all carry indoor and outdoor shade
//! collections. The collections live in a `ShadeSet` composed into each
//! entity; the `Shaded` trait exposes the shared behavior over that set.

use envelope_geometry::{Point3, Vector3};

use crate::error::Result;
use crate::shade::Shade;

/// Indoor and outdoor shade collections owned by an entity.
#[derive(Debug, Clone, Default)]
pub struct ShadeSet {
    indoor: Vec<Shade>,
    outdoor: Vec<Shade>,
}

impl ShadeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indoor(&self) -> &[Shade] {
        &self.indoor
    }

    pub fn outdoor(&self) -> &[Shade] {
        &self.outdoor
    }

    pub fn is_empty(&self) -> bool {
        self.indoor.is_empty() && self.outdoor.is_empty()
    }

    pub fn add_indoor(&mut self, shade: Shade) {
        self.indoor.push(shade);
    }

    pub fn add_outdoor(&mut self, shade: Shade) {
        self.outdoor.push(shade);
    }

    pub fn remove_all(&mut self) {
        self.indoor.clear();
        self.outdoor.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shade> {
        self.outdoor.iter().chain(self.indoor.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Shade> {
        self.outdoor.iter_mut().chain(self.indoor.iter_mut())
    }

    pub(crate) fn set_indoor(&mut self, shades: Vec<Shade>) {
        self.indoor = shades;
    }

    pub(crate) fn set_outdoor(&mut self, shades: Vec<Shade>) {
        self.outdoor = shades;
    }
}

/// Shared behavior for entities that carry indoor/outdoor shades.
pub trait Shaded {
    fn shade_set(&self) -> &ShadeSet;
    fn shade_set_mut(&mut self) -> &mut ShadeSet;

    fn indoor_shades(&self) -> &[Shade] {
        self.shade_set().indoor()
    }

    fn outdoor_shades(&self) -> &[Shade] {
        self.shade_set().outdoor()
    }

    fn add_indoor_shade(&mut self, shade: Shade) {
        self.shade_set_mut().add_indoor(shade);
    }

    fn add_outdoor_shade(&mut self, shade: Shade) {
        self.shade_set_mut().add_outdoor(shade);
    }

    fn add_indoor_shades(&mut self, shades: Vec<Shade>) {
        for shade in shades {
            self.add_indoor_shade(shade);
        }
    }

    fn add_outdoor_shades(&mut self, shades: Vec<Shade>) {
        for shade in shades {
            self.add_outdoor_shade(shade);
        }
    }

    fn remove_shades(&mut self) {
        self.shade_set_mut().remove_all();
    }

    /// Looks a shade up by identifier in either collection.
    fn shade_mut(&mut self, identifier: &str) -> Option<&mut Shade> {
        self.shade_set_mut()
            .iter_mut()
            .find(|s| s.identifier() == identifier)
    }

    fn add_prefix_shades(&mut self, prefix: &str) {
        for shade in self.shade_set_mut().iter_mut() {
            shade.add_prefix(prefix);
        }
    }

    fn translate_shades(&mut self, vector: &Vector3<f64>) {
        for shade in self.shade_set_mut().iter_mut() {
            shade.translate(vector);
        }
    }

    fn rotate_shades(&mut self, axis: &Vector3<f64>, angle: f64, origin: &Point3<f64>) {
        for shade in self.shade_set_mut().iter_mut() {
            shade.rotate(axis, angle, origin);
        }
    }

    fn rotate_xy_shades(&mut self, angle: f64, origin: &Point3<f64>) {
        for shade in self.shade_set_mut().iter_mut() {
            shade.rotate_xy(angle, origin);
        }
    }

    fn scale_shades(&mut self, factor: f64, origin: &Point3<f64>) {
        for shade in self.shade_set_mut().iter_mut() {
            shade.scale(factor, origin);
        }
    }

    fn reflect_shades(&mut self, normal: &Vector3<f64>, origin: &Point3<f64>) -> Result<()> {
        for shade in self.shade_set_mut().iter_mut() {
            shade.reflect(normal, origin)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envelope_geometry::Face3D;

    struct Holder {
        shades: ShadeSet,
    }

    impl Shaded for Holder {
        fn shade_set(&self) -> &ShadeSet {
            &self.shades
        }
        fn shade_set_mut(&mut self) -> &mut ShadeSet {
            &mut self.shades
        }
    }

    fn shade(id: &str) -> Shade {
        let geometry = Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
        ])
        .unwrap();
        Shade::new(id, geometry).unwrap()
    }

    #[test]
    fn add_and_remove_shades() {
        let mut holder = Holder {
            shades: ShadeSet::new(),
        };
        holder.add_outdoor_shade(shade("out_0"));
        holder.add_indoor_shade(shade("in_0"));
        assert_eq!(holder.outdoor_shades().len(), 1);
        assert_eq!(holder.indoor_shades().len(), 1);
        holder.remove_shades();
        assert!(holder.shade_set().is_empty());
    }

    #[test]
    fn shade_lookup_by_identifier() {
        let mut holder = Holder {
            shades: ShadeSet::new(),
        };
        holder.add_outdoor_shade(shade("louver_2"));
        assert!(holder.shade_mut("louver_2").is_some());
        assert!(holder.shade_mut("louver_9").is_none());
    }

    #[test]
    fn prefix_propagates_to_all_shades() {
        let mut holder = Holder {
            shades: ShadeSet::new(),
        };
        holder.add_outdoor_shade(shade("s0"));
        holder.add_indoor_shade(shade("s1"));
        holder.add_prefix_shades("Room1");
        assert_eq!(holder.outdoor_shades()[0].identifier(), "Room1_s0");
        assert_eq!(holder.indoor_shades()[0].identifier(), "Room1_s1");
    }
}

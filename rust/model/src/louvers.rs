// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared louver-shade generation for faces and apertures.

use envelope_geometry::louver::{contour_fins_by_distance_between, contour_fins_by_number};
use envelope_geometry::{Face3D, Vector2};

use crate::error::{Error, Result};
use crate::shade::Shade;

pub(crate) struct LouverSpec<'a> {
    pub depth: f64,
    pub offset: f64,
    pub angle: f64,
    pub contour_vector: Vector2<f64>,
    pub flip_start: bool,
    pub indoor: bool,
    pub tolerance: f64,
    pub base_name: Option<&'a str>,
}

impl LouverSpec<'_> {
    fn shade_base(&self) -> &str {
        match self.base_name {
            Some(name) => name,
            None if self.indoor => "InShd",
            None => "OutShd",
        }
    }

    fn oriented_geometry(&self, geometry: &Face3D) -> Face3D {
        if self.indoor {
            geometry.flip()
        } else {
            geometry.clone()
        }
    }

    fn shades_from_fins(&self, fins: Vec<Face3D>, owner_id: &str) -> Result<Vec<Shade>> {
        let base = self.shade_base();
        let mut shades = Vec::with_capacity(fins.len());
        for (i, fin) in fins.into_iter().enumerate() {
            shades.push(Shade::new(format!("{owner_id}_{base}{i}"), fin)?);
        }
        Ok(shades)
    }
}

/// Generates louver shades to hit a target count. Degenerate owner
/// geometry produces no shades rather than an error.
pub(crate) fn louver_shades_by_count(
    geometry: &Face3D,
    owner_id: &str,
    louver_count: usize,
    spec: &LouverSpec<'_>,
) -> Result<Vec<Shade>> {
    if louver_count == 0 {
        return Err(Error::ArgumentOutOfRange {
            field: "louver_count",
            expected: "greater than 0",
            value: 0.0,
        });
    }
    let oriented = spec.oriented_geometry(geometry);
    let fins = match contour_fins_by_number(
        &oriented,
        louver_count,
        spec.depth,
        spec.offset,
        spec.angle,
        spec.contour_vector,
        spec.flip_start,
        spec.tolerance,
    ) {
        Ok(fins) => fins,
        Err(_) => return Ok(Vec::new()), // degenerate geometry is skipped
    };
    spec.shades_from_fins(fins, owner_id)
}

/// Generates louver shades at a target spacing, filling the owner extent,
/// optionally capped at a maximum count.
pub(crate) fn louver_shades_by_distance(
    geometry: &Face3D,
    owner_id: &str,
    distance: f64,
    max_count: Option<usize>,
    spec: &LouverSpec<'_>,
) -> Result<Vec<Shade>> {
    let oriented = spec.oriented_geometry(geometry);
    let mut fins = match contour_fins_by_distance_between(
        &oriented,
        distance,
        spec.depth,
        spec.offset,
        spec.angle,
        spec.contour_vector,
        spec.flip_start,
        spec.tolerance,
    ) {
        Ok(fins) => fins,
        Err(_) => return Ok(Vec::new()),
    };
    if let Some(cap) = max_count {
        fins.truncate(cap);
    }
    spec.shades_from_fins(fins, owner_id)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned grid subdivision of polygons.

use nalgebra::Point2;

use crate::error::{Error, Result};
use crate::polygon::Polygon2D;

/// A grid cell as its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl GridCell {
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    pub fn area(&self) -> f64 {
        (self.max.x - self.min.x) * (self.max.y - self.min.y)
    }

    pub fn polygon(&self) -> Result<Polygon2D> {
        Polygon2D::from_rectangle(
            self.min,
            self.max.x - self.min.x,
            self.max.y - self.min.y,
        )
    }
}

/// Covers a polygon with an axis-aligned grid of `x_dim` by `y_dim` cells,
/// keeping only the cells that lie fully inside the polygon.
///
/// Cells are returned sorted by column (ascending x) then row (ascending y).
/// Errors when the cell dimensions are not positive or exceed the polygon's
/// extent in either direction.
pub fn polygon_grid_cells(polygon: &Polygon2D, x_dim: f64, y_dim: f64) -> Result<Vec<GridCell>> {
    if x_dim <= 0.0 || y_dim <= 0.0 {
        return Err(Error::InvalidPolygon(format!(
            "grid cell dimensions must be positive, got {x_dim} x {y_dim}"
        )));
    }
    let min = polygon.min();
    let max = polygon.max();
    if max.x - min.x < x_dim || max.y - min.y < y_dim {
        return Err(Error::Degenerate(
            "polygon smaller than the grid resolution".to_string(),
        ));
    }
    let cols = ((max.x - min.x) / x_dim).floor() as usize;
    let rows = ((max.y - min.y) / y_dim).floor() as usize;
    let mut cells = Vec::new();
    for col in 0..cols {
        for row in 0..rows {
            let cell_min = Point2::new(min.x + col as f64 * x_dim, min.y + row as f64 * y_dim);
            let cell_max = Point2::new(cell_min.x + x_dim, cell_min.y + y_dim);
            let cell = GridCell {
                min: cell_min,
                max: cell_max,
            };
            if cell_inside(polygon, &cell) {
                cells.push(cell);
            }
        }
    }
    Ok(cells)
}

/// A cell counts as inside when its corners (nudged slightly toward the
/// cell center, so edge-flush cells pass) and its center all fall inside
/// the polygon. Edge-grazing cells are rejected rather than clipped.
fn cell_inside(polygon: &Polygon2D, cell: &GridCell) -> bool {
    let center = cell.center();
    let nudge = 1e-9;
    let corners = [
        cell.min,
        Point2::new(cell.max.x, cell.min.y),
        cell.max,
        Point2::new(cell.min.x, cell.max.y),
    ];
    if !polygon.is_point_inside(&center) {
        return false;
    }
    corners.iter().all(|c| {
        let dir = center - c;
        let norm = dir.norm();
        let probe = if norm < 1e-12 { *c } else { c + dir / norm * nudge };
        polygon.is_point_inside(&probe)
    })
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D boolean operations for sub-face reconciliation.
//!
//! Thin, tolerance-parameterized wrappers over the i_overlay crate: union,
//! intersection and difference of polygons, pairwise overlap grouping, and
//! the gap-crossing merge used to join shapes separated by window frames.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

use crate::polygon::Polygon2D;

/// Minimum area below which boolean results are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Union of all polygons. Overlapping and touching shapes merge; the outer
/// boundary of each resulting shape is returned (holes punched by the union
/// are dropped, which is the behavior sub-face merging wants).
pub fn boolean_union_all(polygons: &[Polygon2D], tolerance: f64) -> Vec<Polygon2D> {
    if polygons.is_empty() {
        return Vec::new();
    }
    if polygons.len() == 1 {
        return vec![polygons[0].clone()];
    }
    let subject = vec![polygon_to_path(&polygons[0])];
    let clip: Vec<Vec<[f64; 2]>> = polygons[1..].iter().map(polygon_to_path).collect();
    let result = subject.overlay(&clip, OverlayRule::Union, FillRule::EvenOdd);
    shapes_to_boundaries(result, tolerance)
}

/// Boolean intersection of two polygons.
pub fn boolean_intersection(a: &Polygon2D, b: &Polygon2D, tolerance: f64) -> Vec<Polygon2D> {
    let subject = vec![polygon_to_path(a)];
    let clip = vec![polygon_to_path(b)];
    let result = subject.overlay(&clip, OverlayRule::Intersect, FillRule::EvenOdd);
    shapes_to_boundaries(result, tolerance)
}

/// Boolean difference `a - others`.
pub fn boolean_difference(a: &Polygon2D, others: &[Polygon2D], tolerance: f64) -> Vec<Polygon2D> {
    if others.is_empty() {
        return vec![a.clone()];
    }
    let subject = vec![polygon_to_path(a)];
    let clip: Vec<Vec<[f64; 2]>> = others.iter().map(polygon_to_path).collect();
    let result = subject.overlay(&clip, OverlayRule::Difference, FillRule::EvenOdd);
    shapes_to_boundaries(result, tolerance)
}

/// True when two polygons share interior area beyond the tolerance, or one
/// contains the other.
pub fn polygons_overlap(a: &Polygon2D, b: &Polygon2D, tolerance: f64) -> bool {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());
    if a_min.x > b_max.x || a_max.x < b_min.x || a_min.y > b_max.y || a_max.y < b_min.y {
        return false;
    }
    let threshold = (tolerance * tolerance).max(MIN_AREA_THRESHOLD);
    boolean_intersection(a, b, tolerance)
        .iter()
        .map(Polygon2D::area)
        .sum::<f64>()
        > threshold
}

/// Groups polygons by pairwise overlap: each group holds the indices of
/// polygons that overlap at least one other member of the group. Greedy,
/// first-match-wins, the way sub-face repair expects it.
pub fn group_by_overlap(polygons: &[Polygon2D], tolerance: f64) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, poly) in polygons.iter().enumerate() {
        let mut placed = false;
        for group in &mut groups {
            if group
                .iter()
                .any(|&j| polygons_overlap(poly, &polygons[j], tolerance))
            {
                group.push(i);
                placed = true;
                break;
            }
        }
        if !placed {
            groups.push(vec![i]);
        }
    }
    groups
}

/// Joins polygons that touch or overlap one another into single boundaries;
/// disjoint polygons pass through unchanged.
pub fn joined_intersected_boundary(polygons: &[Polygon2D], tolerance: f64) -> Vec<Polygon2D> {
    boolean_union_all(polygons, tolerance)
}

/// Joins polygons separated by gaps up to `min_gap` by morphological
/// closing: offset outward by half the gap, union, offset back inward.
///
/// Polygons whose offset degenerates are passed through untouched.
pub fn gap_crossing_boundary(
    polygons: &[Polygon2D],
    min_gap: f64,
    tolerance: f64,
) -> Vec<Polygon2D> {
    if polygons.len() <= 1 || min_gap <= tolerance {
        return joined_intersected_boundary(polygons, tolerance);
    }
    let half_gap = min_gap * 0.5;
    let inflated: Vec<Polygon2D> = polygons
        .iter()
        .map(|p| p.offset(-half_gap).unwrap_or_else(|_| p.clone()))
        .collect();
    let merged = boolean_union_all(&inflated, tolerance);
    let mut deflated = Vec::with_capacity(merged.len());
    for poly in merged {
        match poly.offset(half_gap) {
            Ok(shrunk) => deflated.push(shrunk),
            Err(_) => deflated.push(poly), // collapsed back past the original
        }
    }
    deflated
}

/// Convert a polygon to the i_overlay path format
fn polygon_to_path(polygon: &Polygon2D) -> Vec<[f64; 2]> {
    polygon.vertices().iter().map(|p| [p.x, p.y]).collect()
}

/// Convert i_overlay result shapes into outer-boundary polygons
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>>: a list of shapes, each shape a
/// list of contours where the first contour is the outer boundary.
fn shapes_to_boundaries(shapes: Vec<Vec<Vec<[f64; 2]>>>, tolerance: f64) -> Vec<Polygon2D> {
    let threshold = (tolerance * tolerance).max(MIN_AREA_THRESHOLD);
    let mut boundaries = Vec::new();
    for shape in shapes {
        let Some(outer) = shape.into_iter().next() else {
            continue;
        };
        let points: Vec<Point2<f64>> = outer.into_iter().map(|p| Point2::new(p[0], p[1])).collect();
        if points.len() < 3 {
            continue;
        }
        if let Ok(poly) = Polygon2D::new(points) {
            if poly.area() > threshold {
                boundaries.push(poly.to_ccw());
            }
        }
    }
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64, size: f64) -> Polygon2D {
        Polygon2D::from_rectangle(Point2::new(x, y), size, size).unwrap()
    }

    #[test]
    fn union_of_overlapping_squares() {
        let merged = boolean_union_all(&[square(0.0, 0.0, 2.0), square(1.0, 0.0, 2.0)], 0.01);
        assert_eq!(merged.len(), 1);
        assert_relative_eq!(merged[0].area(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn union_keeps_disjoint_squares_apart() {
        let merged = boolean_union_all(&[square(0.0, 0.0, 1.0), square(5.0, 0.0, 1.0)], 0.01);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn intersection_of_offset_squares() {
        let result = boolean_intersection(&square(0.0, 0.0, 2.0), &square(1.0, 1.0, 2.0), 0.01);
        assert_eq!(result.len(), 1);
        assert_relative_eq!(result[0].area(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn difference_cuts_corner() {
        let result = boolean_difference(&square(0.0, 0.0, 2.0), &[square(1.0, 1.0, 2.0)], 0.01);
        assert_eq!(result.len(), 1);
        assert_relative_eq!(result[0].area(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn overlap_detection() {
        assert!(polygons_overlap(
            &square(0.0, 0.0, 2.0),
            &square(1.0, 1.0, 2.0),
            0.01
        ));
        assert!(!polygons_overlap(
            &square(0.0, 0.0, 1.0),
            &square(3.0, 0.0, 1.0),
            0.01
        ));
    }

    #[test]
    fn grouping_by_overlap() {
        let polys = vec![
            square(0.0, 0.0, 2.0),
            square(1.0, 0.0, 2.0),
            square(10.0, 0.0, 1.0),
        ];
        let groups = group_by_overlap(&polys, 0.01);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![0, 1]);
        assert_eq!(groups[1], vec![2]);
    }

    #[test]
    fn gap_crossing_merges_nearby_squares() {
        // two 1x1 squares 0.2 apart merge when the gap allowance is 0.3
        let polys = vec![square(0.0, 0.0, 1.0), square(1.2, 0.0, 1.0)];
        let merged = gap_crossing_boundary(&polys, 0.3, 0.01);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].area() > 2.0);
    }

    #[test]
    fn gap_crossing_leaves_distant_squares() {
        let polys = vec![square(0.0, 0.0, 1.0), square(5.0, 0.0, 1.0)];
        let merged = gap_crossing_boundary(&polys, 0.3, 0.01);
        assert_eq!(merged.len(), 2);
    }
}

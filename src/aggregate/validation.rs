use std::collections::HashSet;

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, BooleanOps, BoundingRect, EuclideanLength};
use rstar::primitives::{GeomWithData, Line as RTreeLine};

use super::error::{catch_geometry_panic, AggregationError, FeatureRef};
use super::index::EnvelopeIndex;
use super::types::{CountyPolygon, LineFeature, WaterbodyFeature};

type IndexedSegment = GeomWithData<RTreeLine<[f64; 2]>, usize>;

/// Shared area between two parts of a multipolygon, relative to the smaller part, above which
/// they count as overlapping.
const PART_OVERLAP_TOLERANCE: f64 = 1e-9;

/// Rejects the first county name that appears twice.
pub fn check_unique_county_names(counties: &[CountyPolygon]) -> Result<(), AggregationError> {
    let mut seen = HashSet::with_capacity(counties.len());
    for county in counties {
        if !seen.insert(county.name.as_str()) {
            return Err(AggregationError::DuplicateCountyName(county.name.clone()));
        }
    }
    Ok(())
}

pub fn validate_line(line: &LineFeature) -> Result<(), AggregationError> {
    let feature = || FeatureRef::Line(line.id.clone());
    let num_coords = line.geometry.0.len();
    if num_coords < 2 {
        return Err(AggregationError::invalid(
            feature(),
            format!("has {} coordinate pairs, at least 2 are required", num_coords),
        ));
    }
    if !all_finite(&line.geometry) {
        return Err(AggregationError::invalid(
            feature(),
            "contains a non-finite coordinate",
        ));
    }
    if line.geometry.euclidean_length() <= 0.0 {
        return Err(AggregationError::invalid(feature(), "has zero length"));
    }
    Ok(())
}

pub fn validate_county(county: &CountyPolygon) -> Result<(), AggregationError> {
    validate_multi_polygon(&county.geometry, || FeatureRef::County(county.name.clone()))
}

pub fn validate_waterbody(waterbody: &WaterbodyFeature) -> Result<(), AggregationError> {
    validate_multi_polygon(&waterbody.geometry, || {
        FeatureRef::Waterbody(waterbody.id.clone())
    })
}

fn validate_multi_polygon(
    geometry: &geo::MultiPolygon,
    feature: impl Fn() -> FeatureRef,
) -> Result<(), AggregationError> {
    if geometry.0.is_empty() {
        return Err(AggregationError::invalid(feature(), "has no polygons"));
    }
    for polygon in geometry {
        validate_ring(polygon.exterior(), "exterior ring").map_err(|reason| {
            AggregationError::invalid(feature(), reason)
        })?;
        for (index, interior) in polygon.interiors().iter().enumerate() {
            validate_ring(interior, &format!("interior ring {}", index))
                .map_err(|reason| AggregationError::invalid(feature(), reason))?;
        }
    }
    check_parts_disjoint(geometry, &feature)
}

/// Parts may touch along edges or at points, but must not share area.
fn check_parts_disjoint(
    geometry: &geo::MultiPolygon,
    feature: &impl Fn() -> FeatureRef,
) -> Result<(), AggregationError> {
    if geometry.0.len() < 2 {
        return Ok(());
    }
    let part_index = EnvelopeIndex::new(&geometry.0);
    for (i, part) in geometry.0.iter().enumerate() {
        let rect = match part.bounding_rect() {
            Some(rect) => rect,
            None => continue,
        };
        for j in part_index.candidates(&rect).into_iter().filter(|j| *j > i) {
            let other = &geometry.0[j];
            let shared_area = catch_geometry_panic(
                || part.intersection(other).unsigned_area(),
                feature,
                || format!("overlap test of polygons {} and {} failed", i, j),
            )?;
            let smaller_area = part.unsigned_area().min(other.unsigned_area());
            if shared_area > PART_OVERLAP_TOLERANCE * smaller_area {
                return Err(AggregationError::invalid(
                    feature(),
                    format!("polygons {} and {} overlap", i, j),
                ));
            }
        }
    }
    Ok(())
}

fn validate_ring(ring: &geo::LineString, ring_name: &str) -> Result<(), String> {
    // Rings are closed, so three distinct vertices need four coordinates.
    let num_coords = distinct_coords(ring).len();
    if num_coords < 4 {
        return Err(format!(
            "{} has {} coordinate pairs, at least 3 are required",
            ring_name,
            num_coords.saturating_sub(1)
        ));
    }
    if !all_finite(ring) {
        return Err(format!("{} contains a non-finite coordinate", ring_name));
    }
    if geo::Polygon::new(ring.clone(), vec![]).unsigned_area() <= 0.0 {
        return Err(format!("{} encloses zero area", ring_name));
    }
    if let Some(coord) = find_ring_self_intersection(ring) {
        return Err(format!(
            "{} intersects itself at ({}, {})",
            ring_name, coord.x, coord.y
        ));
    }
    Ok(())
}

fn all_finite(line: &geo::LineString) -> bool {
    line.coords().all(|coord| coord.x.is_finite() && coord.y.is_finite())
}

/// Coordinates with consecutive duplicates removed.
fn distinct_coords(ring: &geo::LineString) -> Vec<geo::Coord> {
    let mut coords: Vec<geo::Coord> = Vec::with_capacity(ring.0.len());
    for coord in ring.coords() {
        if coords.last() != Some(coord) {
            coords.push(*coord);
        }
    }
    coords
}

/// Finds a point where two non-adjacent edges of a closed ring touch, or where adjacent
/// edges fold back over each other. Candidate edge pairs come from an R-tree self join.
fn find_ring_self_intersection(ring: &geo::LineString) -> Option<geo::Coord> {
    let coords = distinct_coords(ring);
    let edges: Vec<geo::Line> = coords
        .windows(2)
        .map(|pair| geo::Line::new(pair[0], pair[1]))
        .collect();
    let num_edges = edges.len();

    let tree = rstar::RTree::bulk_load(
        edges
            .iter()
            .enumerate()
            .map(|(index, edge)| {
                IndexedSegment::new(
                    RTreeLine::new([edge.start.x, edge.start.y], [edge.end.x, edge.end.y]),
                    index,
                )
            })
            .collect(),
    );

    let mut candidates: Vec<(usize, usize)> = tree
        .intersection_candidates_with_other_tree(&tree)
        .map(|(a, b)| (a.data, b.data))
        .filter(|(a, b)| a < b)
        .collect();
    candidates.sort_unstable();

    for (i, j) in candidates {
        let adjacent = j == i + 1 || (i == 0 && j == num_edges - 1);
        match line_intersection(edges[i], edges[j]) {
            None => {}
            Some(LineIntersection::Collinear { intersection }) => {
                return Some(intersection.start);
            }
            Some(LineIntersection::SinglePoint { intersection, .. }) => {
                if !adjacent {
                    return Some(intersection);
                }
            }
        }
    }
    None
}

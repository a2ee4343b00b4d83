use geo::{BooleanOps, BoundingRect, EuclideanDistance, EuclideanLength, Intersects};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use super::error::{catch_geometry_panic, first_error_in_order, AggregationError, FeatureRef};
use super::index::EnvelopeIndex;
use super::types::{ClippedSegment, CountyPolygon, CountyTotals, LineFeature};
use super::validation::{check_unique_county_names, validate_county, validate_line};

pub const METRES_PER_KILOMETRE: f64 = 1000.0;

/// Points this close to a county boundary, in CRS units, count as lying on it.
const BOUNDARY_TOLERANCE: f64 = 1e-6;

/// Total length of river geometry inside each county, in kilometres.
///
/// Every county gets an entry, including those no river crosses. A line crossing several
/// counties contributes its interior portion to each of them. A stretch of river running
/// along a border shared by several counties is counted once, for the first of them in
/// input order. Coordinates must share a projected CRS in metres.
///
/// # Errors
/// * `DuplicateCountyName` if two counties share a name. Checked before anything else.
/// * `InvalidGeometry` for the first malformed line or county, or a line that cannot be
///   clipped against a county. Clipping failures are reported for the first county in input
///   order; the clipping library's panic message is still printed to stderr.
pub fn aggregate_river_lengths(
    lines: &[LineFeature],
    counties: &[CountyPolygon],
) -> Result<CountyTotals, AggregationError> {
    let segments = clip_lines_by_county(lines, counties)?;
    Ok(totals_from_segments(&segments, counties))
}

/// Sum clipped segment lengths per county, in kilometres. Counties without segments get zero.
pub fn totals_from_segments(segments: &[ClippedSegment], counties: &[CountyPolygon]) -> CountyTotals {
    let mut lengths_m = CountyTotals::zeroed(counties);
    for segment in segments {
        lengths_m.add(&segment.county, segment.length());
    }
    lengths_m.divided_by(METRES_PER_KILOMETRE)
}

/// Clip every line against every county. Segments are grouped by county in input order, and
/// within a county follow the order of `lines`.
pub fn clip_lines_by_county(
    lines: &[LineFeature],
    counties: &[CountyPolygon],
) -> Result<Vec<ClippedSegment>, AggregationError> {
    check_unique_county_names(counties)?;
    for county in counties {
        validate_county(county)?;
    }
    for line in lines {
        validate_line(line)?;
    }

    let line_index = EnvelopeIndex::new(lines.iter().map(|line| &line.geometry));
    let county_index = EnvelopeIndex::new(counties.iter().map(|county| &county.geometry));
    log::debug!(
        "Clipping {} lines against {} counties",
        line_index.len(),
        county_index.len()
    );

    let per_county: Vec<Result<Vec<ClippedSegment>, AggregationError>> = counties
        .par_iter()
        .enumerate()
        .progress_count(counties.len() as u64)
        .map(|(position, _)| {
            clip_lines_to_county(lines, &line_index, counties, &county_index, position)
        })
        .collect();
    Ok(first_error_in_order(per_county)?
        .into_iter()
        .flatten()
        .collect())
}

/// Sum of the unclipped line lengths, in kilometres.
pub fn total_length_km(lines: &[LineFeature]) -> f64 {
    lines
        .iter()
        .map(|line| line.geometry.euclidean_length())
        .sum::<f64>()
        / METRES_PER_KILOMETRE
}

/// Full length of every line touching a county, in kilometres, counted once per county it
/// touches. This is what a spatial join of lines onto counties measures, so it exceeds the
/// clipped total whenever a line leaves a county or crosses between counties.
pub fn joined_length_km(lines: &[LineFeature], counties: &[CountyPolygon]) -> f64 {
    let line_index = EnvelopeIndex::new(lines.iter().map(|line| &line.geometry));
    let mut length_m = 0.0;
    for county in counties {
        let county_rect = match county.geometry.bounding_rect() {
            Some(rect) => rect,
            None => continue,
        };
        length_m += line_index
            .candidates(&county_rect)
            .into_iter()
            .map(|line_idx| &lines[line_idx].geometry)
            .filter(|line| county.geometry.intersects(*line))
            .map(|line| line.euclidean_length())
            .sum::<f64>();
    }
    length_m / METRES_PER_KILOMETRE
}

fn clip_lines_to_county(
    lines: &[LineFeature],
    line_index: &EnvelopeIndex,
    counties: &[CountyPolygon],
    county_index: &EnvelopeIndex,
    position: usize,
) -> Result<Vec<ClippedSegment>, AggregationError> {
    let county = &counties[position];
    let county_rect = match county.geometry.bounding_rect() {
        Some(rect) => rect,
        None => return Ok(Vec::new()),
    };
    let candidates = line_index.candidates(&county_rect);

    let mut segments = Vec::new();
    for line_idx in &candidates {
        let line = &lines[*line_idx];
        for part in clip_line(county, line)? {
            segments.extend(
                without_edges_claimed_earlier(part, counties, county_index, position)
                    .into_iter()
                    .filter(|piece| piece.euclidean_length() > 0.0)
                    .map(|piece| ClippedSegment {
                        county: county.name.clone(),
                        line_id: line.id.clone(),
                        geometry: piece,
                    }),
            );
        }
    }
    log::debug!(
        "County {}: {} candidate lines, {} clipped segments",
        county.name,
        candidates.len(),
        segments.len()
    );
    Ok(segments)
}

fn clip_line(
    county: &CountyPolygon,
    line: &LineFeature,
) -> Result<geo::MultiLineString, AggregationError> {
    let lines = geo::MultiLineString::new(vec![line.geometry.clone()]);
    catch_geometry_panic(
        || county.geometry.clip(&lines, false),
        || FeatureRef::Line(line.id.clone()),
        || format!("clipping against county '{}' failed", county.name),
    )
}

/// Split a clipped part around the edges that run along the boundary of the county at
/// `position` and that an earlier county also touches. Those edges count for the earlier county.
fn without_edges_claimed_earlier(
    part: geo::LineString,
    counties: &[CountyPolygon],
    county_index: &EnvelopeIndex,
    position: usize,
) -> Vec<geo::LineString> {
    let mut pieces = Vec::new();
    let mut coords: Vec<geo::Coord> = Vec::new();
    for edge in part.lines() {
        if is_claimed_earlier(&edge, counties, county_index, position) {
            if coords.len() >= 2 {
                pieces.push(geo::LineString::new(std::mem::take(&mut coords)));
            }
            continue;
        }
        if coords.is_empty() {
            coords.push(edge.start);
        }
        coords.push(edge.end);
    }
    if coords.len() >= 2 {
        pieces.push(geo::LineString::new(coords));
    }
    pieces
}

fn is_claimed_earlier(
    edge: &geo::Line,
    counties: &[CountyPolygon],
    county_index: &EnvelopeIndex,
    position: usize,
) -> bool {
    let midpoint = geo::Point::new(
        (edge.start.x + edge.end.x) / 2.0,
        (edge.start.y + edge.end.y) / 2.0,
    );
    if !on_boundary(&counties[position].geometry, &midpoint) {
        return false;
    }
    let around = geo::Rect::new(
        (midpoint.x() - BOUNDARY_TOLERANCE, midpoint.y() - BOUNDARY_TOLERANCE),
        (midpoint.x() + BOUNDARY_TOLERANCE, midpoint.y() + BOUNDARY_TOLERANCE),
    );
    county_index
        .candidates(&around)
        .into_iter()
        .take_while(|other| *other < position)
        .any(|other| midpoint.euclidean_distance(&counties[other].geometry) <= BOUNDARY_TOLERANCE)
}

fn on_boundary(geometry: &geo::MultiPolygon, point: &geo::Point) -> bool {
    geometry
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .any(|ring| point.euclidean_distance(ring) <= BOUNDARY_TOLERANCE)
}

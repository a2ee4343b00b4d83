use geo::{Area, BooleanOps, BoundingRect};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use super::error::{catch_geometry_panic, first_error_in_order, AggregationError, FeatureRef};
use super::index::EnvelopeIndex;
use super::types::{CountyPolygon, CountyTotals, WaterbodyFeature};
use super::validation::{check_unique_county_names, validate_county, validate_waterbody};

pub const SQUARE_METRES_PER_SQUARE_KILOMETRE: f64 = 1_000_000.0;

/// Total area of waterbodies inside each county, in square kilometres.
///
/// A waterbody straddling a county boundary contributes the overlapping part of its area to
/// each county. Errors are reported the same way as for `aggregate_river_lengths`, a failed
/// intersection being reported for the first county in input order.
pub fn aggregate_water_area(
    waterbodies: &[WaterbodyFeature],
    counties: &[CountyPolygon],
) -> Result<CountyTotals, AggregationError> {
    check_unique_county_names(counties)?;
    for county in counties {
        validate_county(county)?;
    }
    for waterbody in waterbodies {
        validate_waterbody(waterbody)?;
    }

    let water_index = EnvelopeIndex::new(waterbodies.iter().map(|water| &water.geometry));
    let areas_m2: Vec<Result<f64, AggregationError>> = counties
        .par_iter()
        .progress_count(counties.len() as u64)
        .map(|county| county_water_area(waterbodies, &water_index, county))
        .collect();
    let areas_m2 = first_error_in_order(areas_m2)?;

    let mut totals = CountyTotals::zeroed(counties);
    for (county, area_m2) in counties.iter().zip(areas_m2) {
        totals.add(&county.name, area_m2);
    }
    Ok(totals.divided_by(SQUARE_METRES_PER_SQUARE_KILOMETRE))
}

fn county_water_area(
    waterbodies: &[WaterbodyFeature],
    water_index: &EnvelopeIndex,
    county: &CountyPolygon,
) -> Result<f64, AggregationError> {
    let county_rect = match county.geometry.bounding_rect() {
        Some(rect) => rect,
        None => return Ok(0.0),
    };
    let mut area_m2 = 0.0;
    for water_idx in water_index.candidates(&county_rect) {
        let waterbody = &waterbodies[water_idx];
        let overlap = catch_geometry_panic(
            || county.geometry.intersection(&waterbody.geometry),
            || FeatureRef::Waterbody(waterbody.id.clone()),
            || format!("intersection with county '{}' failed", county.name),
        )?;
        area_m2 += overlap.unsigned_area();
    }
    Ok(area_m2)
}

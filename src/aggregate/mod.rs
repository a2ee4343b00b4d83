//! Per-county aggregation of river length and waterbody area.
//!
//! All geometries must already share a projected CRS measured in metres.

pub mod error;
pub mod index;
pub mod river_length;
pub mod types;
pub mod validation;
pub mod water_area;

pub use error::{AggregationError, FeatureRef};
pub use river_length::{
    aggregate_river_lengths, clip_lines_by_county, joined_length_km, total_length_km,
    totals_from_segments,
};
pub use types::{ClippedSegment, CountyPolygon, CountyTotals, LineFeature, WaterbodyFeature};
pub use water_area::aggregate_water_area;

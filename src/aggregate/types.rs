use std::collections::BTreeMap;

use geo::EuclideanLength;
use serde::Serialize;

/// A river or canal polyline in a planar CRS (metres).
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub id: String,
    pub geometry: geo::LineString,
}

impl LineFeature {
    pub fn new(id: impl Into<String>, geometry: geo::LineString) -> Self {
        Self {
            id: id.into(),
            geometry,
        }
    }
}

/// A county boundary. Counties with islands have several polygon parts.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyPolygon {
    pub name: String,
    pub geometry: geo::MultiPolygon,
}

impl CountyPolygon {
    pub fn new(name: impl Into<String>, geometry: impl Into<geo::MultiPolygon>) -> Self {
        Self {
            name: name.into(),
            geometry: geometry.into(),
        }
    }
}

/// A lake or other inland waterbody.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterbodyFeature {
    pub id: String,
    pub geometry: geo::MultiPolygon,
}

impl WaterbodyFeature {
    pub fn new(id: impl Into<String>, geometry: impl Into<geo::MultiPolygon>) -> Self {
        Self {
            id: id.into(),
            geometry: geometry.into(),
        }
    }
}

/// The part of one line that falls inside one county.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedSegment {
    pub county: String,
    pub line_id: String,
    pub geometry: geo::LineString,
}

impl ClippedSegment {
    /// Planar length in CRS units (metres).
    pub fn length(&self) -> f64 {
        self.geometry.euclidean_length()
    }
}

/// Per-county totals, ordered by county name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CountyTotals(BTreeMap<String, f64>);

impl CountyTotals {
    /// Totals with a zero entry for every county.
    pub fn zeroed(counties: &[CountyPolygon]) -> Self {
        Self(
            counties
                .iter()
                .map(|county| (county.name.clone(), 0.0))
                .collect(),
        )
    }

    pub fn add(&mut self, county: &str, value: f64) {
        *self.0.entry(county.to_string()).or_insert(0.0) += value;
    }

    pub fn get(&self, county: &str) -> Option<f64> {
        self.0.get(county).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Divide every value, e.g. to convert units.
    pub fn divided_by(mut self, divisor: f64) -> Self {
        for value in self.0.values_mut() {
            *value /= divisor;
        }
        self
    }

    /// Sum over all counties.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use geo::polygon;

    use super::{ClippedSegment, CountyPolygon, CountyTotals};

    #[test]
    fn test_zeroed_totals_contain_every_county() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let counties = vec![
            CountyPolygon::new("Sligo", square.clone()),
            CountyPolygon::new("Leitrim", square),
        ];
        let totals = CountyTotals::zeroed(&counties);
        assert_eq!(2, totals.len());
        assert_eq!(Some(0.0), totals.get("Sligo"));
        assert_eq!(Some(0.0), totals.get("Leitrim"));
        // Ordered by name.
        let names: Vec<&str> = totals.iter().map(|(name, _)| name).collect();
        assert_eq!(vec!["Leitrim", "Sligo"], names);
    }

    #[test]
    fn test_add_accumulates() {
        let mut totals = CountyTotals::default();
        totals.add("Clare", 1.5);
        totals.add("Clare", 2.0);
        totals.add("Kerry", 0.25);
        assert_abs_diff_eq!(3.5, totals.get("Clare").unwrap());
        assert_abs_diff_eq!(3.75, totals.total());
    }

    #[test]
    fn test_clipped_segment_length() {
        let segment = ClippedSegment {
            county: "Mayo".to_string(),
            line_id: "Moy".to_string(),
            geometry: vec![(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)].into(),
        };
        assert_abs_diff_eq!(11.0, segment.length());
    }
}

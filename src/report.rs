use std::{collections::HashMap, fs, path::Path};

use serde::Serialize;

use crate::aggregate::{CountyPolygon, CountyTotals};
use crate::geofile::feature::{AttributeValue, Feature};

#[derive(Serialize, Debug, PartialEq)]
pub struct CountyReport {
    pub county: String,
    pub river_length_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_area_sq_km: Option<f64>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct RiverReport {
    /// Length of all input rivers before clipping.
    pub total_river_length_km: f64,
    /// Length of river inside any county.
    pub clipped_river_length_km: f64,
    /// Full length of every river touching a county, once per county it touches.
    pub joined_river_length_km: f64,
    pub counties: Vec<CountyReport>,
}

impl RiverReport {
    /// Rows ordered by county name. Waterbody areas are included when `water_areas` is given.
    pub fn new(
        total_river_length_km: f64,
        joined_river_length_km: f64,
        river_lengths: &CountyTotals,
        water_areas: Option<&CountyTotals>,
    ) -> Self {
        let counties = river_lengths
            .iter()
            .map(|(county, river_length_km)| CountyReport {
                county: county.to_string(),
                river_length_km,
                water_area_sq_km: water_areas.map(|areas| areas.get(county).unwrap_or(0.0)),
            })
            .collect();
        Self {
            total_river_length_km,
            clipped_river_length_km: river_lengths.total(),
            joined_river_length_km,
            counties,
        }
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn write_yaml(&self, output_filepath: &Path) -> anyhow::Result<()> {
        fs::write(output_filepath, self.to_yaml()?)?;
        Ok(())
    }

    /// Log one line per county, longest river total first.
    pub fn log_summary(&self) {
        log::info!(
            "Total river length {:.1} km, {:.1} km inside counties, {:.1} km joined to counties",
            self.total_river_length_km,
            self.clipped_river_length_km,
            self.joined_river_length_km
        );
        let mut rows: Vec<&CountyReport> = self.counties.iter().collect();
        rows.sort_by(|a, b| b.river_length_km.total_cmp(&a.river_length_km));
        for row in rows {
            match row.water_area_sq_km {
                Some(area) => log::info!(
                    "{:<16} {:>9.1} km of river {:>8.1} km2 of water",
                    row.county,
                    row.river_length_km,
                    area
                ),
                None => log::info!("{:<16} {:>9.1} km of river", row.county, row.river_length_km),
            }
        }
    }
}

/// County polygons carrying their report values as attributes, ready for a choropleth.
pub fn county_features(counties: &[CountyPolygon], report: &RiverReport) -> Vec<Feature> {
    let rows: HashMap<&str, &CountyReport> = report
        .counties
        .iter()
        .map(|row| (row.county.as_str(), row))
        .collect();
    counties
        .iter()
        .map(|county| {
            let mut attributes =
                HashMap::from([("name".to_string(), AttributeValue::from(county.name.as_str()))]);
            if let Some(row) = rows.get(county.name.as_str()) {
                attributes.insert(
                    "river_km".to_string(),
                    AttributeValue::from(row.river_length_km),
                );
                if let Some(area) = row.water_area_sq_km {
                    attributes.insert("water_km2".to_string(), AttributeValue::from(area));
                }
            }
            Feature {
                geometry: geo::Geometry::MultiPolygon(county.geometry.clone()),
                fid: None,
                attributes: Some(attributes),
            }
        })
        .collect()
}

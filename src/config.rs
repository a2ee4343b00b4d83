use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use anyhow::anyhow;
use serde::Deserialize;

use crate::crs::crs_utils::{EpsgCode, IRISH_TRANSVERSE_MERCATOR};
use crate::geofile::gdal_geofile::GdalDriverType;

pub const DEFAULT_COUNTY_NAME_FIELD: &str = "name";

/// A vector layer on disk and the attribute identifying its features.
#[derive(Deserialize, Debug, PartialEq)]
pub struct LayerSource {
    pub filepath: PathBuf,
    #[serde(default)]
    pub id_field: Option<String>,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct Config {
    pub rivers: LayerSource,
    pub counties: LayerSource,
    #[serde(default)]
    pub waterbodies: Option<LayerSource>,
    #[serde(default = "default_target_epsg")]
    pub target_epsg: EpsgCode,
    #[serde(default)]
    pub county_output_format: GdalDriverType,
    pub output_dir: PathBuf,
}

fn default_target_epsg() -> EpsgCode {
    IRISH_TRANSVERSE_MERCATOR
}

impl Config {
    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn from_file(filepath: &Path) -> anyhow::Result<Self> {
        if !filepath.exists() {
            return Err(anyhow!("Config file {:?} not found", filepath));
        }
        let config_contents = read_to_string(filepath)?;
        Self::from_yaml(&config_contents)
    }

    pub fn county_name_field(&self) -> &str {
        self.counties
            .id_field
            .as_deref()
            .unwrap_or(DEFAULT_COUNTY_NAME_FIELD)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use testdir::testdir;

    use super::{Config, LayerSource};
    use crate::geofile::gdal_geofile::GdalDriverType;

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::from_yaml(
            r#"
rivers:
  filepath: data/Ire_Rivers_Canals.shp
counties:
  filepath: data/Ire_Counties.shp
output_dir: data/out
"#,
        )
        .unwrap();
        assert_eq!(PathBuf::from("data/Ire_Rivers_Canals.shp"), config.rivers.filepath);
        assert_eq!(None, config.rivers.id_field);
        assert_eq!(None, config.waterbodies);
        assert_eq!(2158, config.target_epsg);
        assert_eq!(GdalDriverType::GeoPackage, config.county_output_format);
        assert_eq!("name", config.county_name_field());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_yaml(
            r#"
rivers:
  filepath: rivers.gpkg
  id_field: osm_id
counties:
  filepath: counties.shp
  id_field: COUNTY
waterbodies:
  filepath: water.shp
  id_field: osm_id
target_epsg: 29902
county_output_format: Shapefile
output_dir: out
"#,
        )
        .unwrap();
        assert_eq!(Some("osm_id".to_string()), config.rivers.id_field);
        assert_eq!("COUNTY", config.county_name_field());
        assert_eq!(
            Some(LayerSource {
                filepath: PathBuf::from("water.shp"),
                id_field: Some("osm_id".to_string()),
            }),
            config.waterbodies
        );
        assert_eq!(29902, config.target_epsg);
        assert_eq!(GdalDriverType::Shapefile, config.county_output_format);
    }

    #[test]
    fn test_missing_required_field() {
        assert!(Config::from_yaml("rivers:\n  filepath: rivers.shp\n").is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let test_dir = testdir!();
        assert!(Config::from_file(&test_dir.join("missing.yaml")).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let test_dir = testdir!();
        let filepath = test_dir.join("run.yaml");
        std::fs::write(
            &filepath,
            "rivers: {filepath: r.shp}\ncounties: {filepath: c.shp}\noutput_dir: out\n",
        )
        .unwrap();
        let config = Config::from_file(&filepath).unwrap();
        assert_eq!(PathBuf::from("out"), config.output_dir);
    }
}

use anyhow::{anyhow, Context};
use gdal::vector::LayerAccess;
use indicatif::ProgressBar;
use serde::Deserialize;
use std::{collections::HashMap, path::Path};

use super::feature::{AttributeValue, Feature, FeatureMap};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GdalDriverType {
    #[default]
    GeoPackage,
    Shapefile,
}

impl GdalDriverType {
    pub fn name(&self) -> &'static str {
        match self {
            GdalDriverType::GeoPackage => "GPKG",
            GdalDriverType::Shapefile => "ESRI Shapefile",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            GdalDriverType::GeoPackage => "gpkg",
            GdalDriverType::Shapefile => "shp",
        }
    }
}

pub fn write_features_to_geofile(
    features: &[Feature],
    output_filepath: &Path,
    crs: &gdal::spatial_ref::SpatialRef,
    layer_name: &str,
    driver: &str,
) -> anyhow::Result<()> {
    let driver = gdal::DriverManager::get_driver_by_name(driver).context("Getting GDAL driver")?;

    let first_geometry = match features.first() {
        Some(feature) => &feature.geometry,
        None => return Ok(()),
    };
    let layer_type = {
        use gdal::vector::OGRwkbGeometryType::*;
        match first_geometry {
            geo::Geometry::Point(_) => wkbPoint,
            geo::Geometry::LineString(_) => wkbLineString,
            geo::Geometry::Polygon(_) => wkbPolygon,
            geo::Geometry::MultiPoint(_) => wkbMultiPoint,
            geo::Geometry::MultiLineString(_) => wkbMultiLineString,
            geo::Geometry::MultiPolygon(_) => wkbMultiPolygon,
            _ => {
                return Err(anyhow!(
                    "Cannot write geometry type {:?} to file.",
                    first_geometry
                ))
            }
        }
    };
    // Create the fields based on all attributes of all features.
    let field_types = get_field_types(features)?;
    let mut field_definitions: Vec<(&str, gdal::vector::OGRFieldType::Type)> = field_types
        .iter()
        .map(|(field_name, field_type)| (field_name.as_str(), *field_type))
        .collect();
    field_definitions.sort_by(|a, b| a.0.cmp(b.0));
    log::debug!("Using spatial ref {} for writing geofile", crs.name()?);

    remove_existing_geofile(output_filepath)?;
    let mut dataset = driver.create_vector_only(output_filepath)?;
    let layer_options = gdal::LayerOptions {
        name: layer_name,
        srs: Some(crs),
        ty: layer_type,
        options: None,
    };
    let mut layer = dataset.create_layer(layer_options)?;
    layer.create_defn_fields(&field_definitions)?;

    log::info!(
        "Writing {} features to {:?}",
        features.len(),
        output_filepath
    );
    unsafe {
        // Start a transaction in case the driver supports transactions, e.g. GeoPackage.
        // Committing all features once as opposed to per-feature is a massive speedup for these drivers.
        gdal_sys::OGR_L_StartTransaction(layer.c_layer());
    };
    let bar = ProgressBar::new(features.len() as u64);
    for feature in features {
        let wkb = wkb::geom_to_wkb(&feature.geometry)
            .map_err(|err| anyhow!("Could not write geometry to WKB, {:?}", err))?;
        let geometry = gdal::vector::Geometry::from_wkb(&wkb)?;

        match &feature.attributes {
            Some(attributes) => {
                let mut field_names = Vec::new();
                let mut values = Vec::new();
                for (key, value) in attributes {
                    field_names.push(key.as_str());
                    values.push(value.to_field_value());
                }
                layer.create_feature_fields(geometry, &field_names, &values)?;
            }
            None => layer.create_feature(geometry)?,
        }

        bar.inc(1);
    }
    unsafe {
        gdal_sys::OGR_L_CommitTransaction(layer.c_layer());
    };
    bar.finish_and_clear();
    Ok(())
}

/// Remove a previous output, including the sidecar files of a shapefile.
fn remove_existing_geofile(filepath: &Path) -> anyhow::Result<()> {
    const SHAPEFILE_SIDECARS: [&str; 4] = ["shx", "dbf", "prj", "cpg"];
    let mut filepaths = vec![filepath.to_path_buf()];
    if filepath.extension().map_or(false, |ext| ext == "shp") {
        filepaths.extend(SHAPEFILE_SIDECARS.iter().map(|ext| filepath.with_extension(ext)));
    }
    for path in filepaths.iter().filter(|path| path.exists()) {
        std::fs::remove_file(path).with_context(|| format!("Removing existing {:?}", path))?;
    }
    Ok(())
}

/// Field types keyed by field name. A field must have the same type on every feature.
fn get_field_types(
    features: &[Feature],
) -> anyhow::Result<HashMap<String, gdal::vector::OGRFieldType::Type>> {
    let mut field_types = HashMap::new();
    for attributes in features.iter().filter_map(|feature| feature.attributes.as_ref()) {
        for (key, value) in attributes {
            let field_type = value.field_type();
            match field_types.insert(key.clone(), field_type) {
                Some(previous) if previous != field_type => {
                    return Err(anyhow!("Field '{}' has mixed value types", key))
                }
                _ => {}
            }
        }
    }
    Ok(field_types)
}

/// Read all features of a single-layer vector dataset, along with the layer's CRS.
pub fn read_features_from_geofile(
    filepath: &Path,
) -> anyhow::Result<(Vec<Feature>, gdal::spatial_ref::SpatialRef)> {
    gdal::DriverManager::register_all();
    let mut open_options = gdal::DatasetOptions::default();
    open_options.open_flags = gdal::GdalOpenFlags::GDAL_OF_VECTOR;
    let dataset = gdal::Dataset::open_ex(filepath, open_options)
        .with_context(|| format!("Opening {:?}", filepath))?;

    let layer_count = dataset.layer_count();
    if 0 == layer_count || 1 < layer_count {
        return Err(anyhow!(
            "Found {} layers in {:?}, only one layer is supported.",
            layer_count,
            filepath
        ));
    }
    let mut layer = dataset.layer(0)?;
    let spatial_ref = layer
        .spatial_ref()
        .with_context(|| format!("Reading the CRS of {:?}", filepath))?;

    let mut features = Vec::new();
    let mut num_skipped = 0;
    for gdal_feature in layer.features() {
        let geometry = match gdal_feature.geometry_by_index(0) {
            Ok(geometry) => geometry,
            Err(_) => {
                num_skipped += 1;
                continue;
            }
        };
        let wkb = geometry.wkb()?;
        let geometry = wkb::wkb_to_geom(&mut wkb.as_slice())
            .map_err(|err| anyhow!("Could not read geometry from WKB, {:?}", err))?;

        let attributes: FeatureMap = gdal_feature
            .fields()
            .filter_map(|(name, value)| {
                value
                    .and_then(AttributeValue::from_field_value)
                    .map(|value| (name, value))
            })
            .collect();

        features.push(Feature {
            geometry,
            fid: gdal_feature.fid(),
            attributes: Some(attributes),
        });
    }
    if num_skipped > 0 {
        log::warn!(
            "Skipped {} features without geometry in {:?}",
            num_skipped,
            filepath
        );
    }
    Ok((features, spatial_ref))
}

use std::path::Path;

use anyhow::anyhow;

use super::feature::Feature;
use super::gdal_geofile::read_features_from_geofile;
use crate::aggregate::{CountyPolygon, LineFeature, WaterbodyFeature};

/// Features of one layer together with the CRS their coordinates are in.
pub struct GeoreferencedLayer<F> {
    pub features: Vec<F>,
    pub spatial_ref: gdal::spatial_ref::SpatialRef,
}

/// A feature whose geometry can be reprojected in place.
pub trait ProjectableFeature {
    fn project(&mut self, projection: &proj::Proj) -> Result<(), proj::ProjError>;
}

impl ProjectableFeature for LineFeature {
    fn project(&mut self, projection: &proj::Proj) -> Result<(), proj::ProjError> {
        use proj::Transform;
        self.geometry.transform(projection)
    }
}

impl ProjectableFeature for CountyPolygon {
    fn project(&mut self, projection: &proj::Proj) -> Result<(), proj::ProjError> {
        use proj::Transform;
        self.geometry.transform(projection)
    }
}

impl ProjectableFeature for WaterbodyFeature {
    fn project(&mut self, projection: &proj::Proj) -> Result<(), proj::ProjError> {
        use proj::Transform;
        self.geometry.transform(projection)
    }
}

/// Identifier for a feature: the `id_field` attribute if configured and present, else the
/// feature id, else the position in the layer.
fn feature_id(feature: &Feature, id_field: Option<&str>, position: usize) -> String {
    id_field
        .and_then(|field| feature.attribute_string(field))
        .or_else(|| feature.fid.map(|fid| fid.to_string()))
        .unwrap_or_else(|| position.to_string())
}

/// Convert features to line features. MultiLineStrings are split into one line feature per
/// part, all sharing the feature's id. Other geometry types are skipped.
pub fn lines_from_features(features: Vec<Feature>, id_field: Option<&str>) -> Vec<LineFeature> {
    let num_features = features.len();
    let mut num_line_features = 0;
    let mut lines = Vec::new();
    for (position, feature) in features.into_iter().enumerate() {
        let id = feature_id(&feature, id_field, position);
        match feature.geometry {
            geo::Geometry::LineString(linestring) => {
                lines.push(LineFeature::new(id, linestring));
            }
            geo::Geometry::MultiLineString(multi_linestring) => {
                lines.extend(
                    multi_linestring
                        .into_iter()
                        .map(|linestring| LineFeature::new(id.clone(), linestring)),
                );
            }
            _ => continue,
        }
        num_line_features += 1;
    }
    if num_line_features != num_features {
        log::warn!(
            "Out of {} features read, only {} were LineStrings or MultiLineStrings.",
            num_features,
            num_line_features
        )
    }
    lines
}

fn multi_polygon_from_geometry(geometry: geo::Geometry) -> Option<geo::MultiPolygon> {
    match geometry {
        geo::Geometry::Polygon(polygon) => Some(polygon.into()),
        geo::Geometry::MultiPolygon(multi_polygon) => Some(multi_polygon),
        _ => None,
    }
}

/// Convert features to counties named by the `name_field` attribute. A polygon feature without
/// that attribute is an error, since counties are keyed by name.
pub fn counties_from_features(
    features: Vec<Feature>,
    name_field: &str,
) -> anyhow::Result<Vec<CountyPolygon>> {
    let num_features = features.len();
    let mut counties = Vec::new();
    for feature in features {
        let name = feature.attribute_string(name_field);
        let fid = feature.fid;
        if let Some(geometry) = multi_polygon_from_geometry(feature.geometry) {
            let name = name.ok_or_else(|| {
                anyhow!(
                    "County feature {:?} has no '{}' attribute",
                    fid,
                    name_field
                )
            })?;
            counties.push(CountyPolygon::new(name, geometry));
        }
    }
    if counties.len() != num_features {
        log::warn!(
            "Out of {} features read, only {} were Polygons or MultiPolygons.",
            num_features,
            counties.len()
        )
    }
    Ok(counties)
}

pub fn waterbodies_from_features(
    features: Vec<Feature>,
    id_field: Option<&str>,
) -> Vec<WaterbodyFeature> {
    let num_features = features.len();
    let waterbodies: Vec<WaterbodyFeature> = features
        .into_iter()
        .enumerate()
        .filter_map(|(position, feature)| {
            let id = feature_id(&feature, id_field, position);
            multi_polygon_from_geometry(feature.geometry)
                .map(|geometry| WaterbodyFeature::new(id, geometry))
        })
        .collect();
    if waterbodies.len() != num_features {
        log::warn!(
            "Out of {} features read, only {} were Polygons or MultiPolygons.",
            num_features,
            waterbodies.len()
        )
    }
    waterbodies
}

pub fn read_line_layer(
    filepath: &Path,
    id_field: Option<&str>,
) -> anyhow::Result<GeoreferencedLayer<LineFeature>> {
    let (features, spatial_ref) = read_features_from_geofile(filepath)?;
    Ok(GeoreferencedLayer {
        features: lines_from_features(features, id_field),
        spatial_ref,
    })
}

pub fn read_county_layer(
    filepath: &Path,
    name_field: &str,
) -> anyhow::Result<GeoreferencedLayer<CountyPolygon>> {
    let (features, spatial_ref) = read_features_from_geofile(filepath)?;
    Ok(GeoreferencedLayer {
        features: counties_from_features(features, name_field)?,
        spatial_ref,
    })
}

pub fn read_waterbody_layer(
    filepath: &Path,
    id_field: Option<&str>,
) -> anyhow::Result<GeoreferencedLayer<WaterbodyFeature>> {
    let (features, spatial_ref) = read_features_from_geofile(filepath)?;
    Ok(GeoreferencedLayer {
        features: waterbodies_from_features(features, id_field),
        spatial_ref,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use geo::polygon;

    use super::{counties_from_features, lines_from_features, waterbodies_from_features};
    use crate::geofile::feature::{AttributeValue, Feature};

    fn feature(geometry: geo::Geometry, fid: u64, name: Option<&str>) -> Feature {
        Feature {
            geometry,
            fid: Some(fid),
            attributes: name.map(|name| {
                HashMap::from([("name".to_string(), AttributeValue::from(name))])
            }),
        }
    }

    fn square() -> geo::Polygon {
        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)]
    }

    #[test]
    fn test_lines_from_features() {
        let features = vec![
            feature(
                geo::Geometry::LineString(vec![(0.0, 0.0), (1.0, 0.0)].into()),
                10,
                Some("Boyne"),
            ),
            feature(
                geo::Geometry::MultiLineString(geo::MultiLineString::new(vec![
                    vec![(0.0, 1.0), (1.0, 1.0)].into(),
                    vec![(0.0, 2.0), (1.0, 2.0)].into(),
                ])),
                11,
                None,
            ),
            feature(geo::Geometry::Point(geo::Point::new(0.0, 0.0)), 12, None),
        ];
        let lines = lines_from_features(features, Some("name"));
        let ids: Vec<&str> = lines.iter().map(|line| line.id.as_str()).collect();
        // The second feature has no name and falls back to its fid.
        assert_eq!(vec!["Boyne", "11", "11"], ids);
    }

    #[test]
    fn test_lines_fall_back_to_position() {
        let features = vec![Feature::from(geo::Geometry::LineString(
            vec![(0.0, 0.0), (1.0, 0.0)].into(),
        ))];
        let lines = lines_from_features(features, None);
        assert_eq!("0", lines[0].id);
    }

    #[test]
    fn test_counties_from_features() {
        let features = vec![
            feature(geo::Geometry::Polygon(square()), 0, Some("Carlow")),
            feature(
                geo::Geometry::MultiPolygon(geo::MultiPolygon::new(vec![square(), square()])),
                1,
                Some("Donegal"),
            ),
            feature(
                geo::Geometry::LineString(vec![(0.0, 0.0), (1.0, 0.0)].into()),
                2,
                None,
            ),
        ];
        let counties = counties_from_features(features, "name").unwrap();
        assert_eq!(2, counties.len());
        assert_eq!("Carlow", counties[0].name);
        assert_eq!(1, counties[0].geometry.0.len());
        assert_eq!("Donegal", counties[1].name);
        assert_eq!(2, counties[1].geometry.0.len());
    }

    #[test]
    fn test_county_without_name_fails() {
        let features = vec![feature(geo::Geometry::Polygon(square()), 4, None)];
        assert!(counties_from_features(features, "name").is_err());
    }

    #[test]
    fn test_waterbodies_from_features() {
        let features = vec![
            feature(geo::Geometry::Polygon(square()), 7, Some("Lough Neagh")),
            feature(geo::Geometry::Polygon(square()), 8, None),
        ];
        let waterbodies = waterbodies_from_features(features, Some("name"));
        assert_eq!("Lough Neagh", waterbodies[0].id);
        assert_eq!("8", waterbodies[1].id);
    }
}

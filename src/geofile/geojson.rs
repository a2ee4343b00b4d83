use std::{fs, io, path::Path};

use crate::aggregate::{river_length::METRES_PER_KILOMETRE, ClippedSegment};

pub fn segments_to_feature_collection(segments: &[ClippedSegment]) -> geojson::FeatureCollection {
    segments
        .iter()
        .map(|segment| {
            let mut feature =
                geojson::Feature::from(geojson::Geometry::new(geojson::Value::from(
                    &segment.geometry,
                )));
            feature.set_property("county", segment.county.as_str());
            feature.set_property("river_id", segment.line_id.as_str());
            feature.set_property("length_km", segment.length() / METRES_PER_KILOMETRE);
            feature
        })
        .collect()
}

/// Write clipped river segments as a GeoJSON FeatureCollection. Coordinates are written as is,
/// without reprojection to WGS84.
pub fn write_segments_to_geojson(
    segments: &[ClippedSegment],
    output_filepath: &Path,
) -> io::Result<()> {
    let geojson_contents =
        geojson::GeoJson::from(segments_to_feature_collection(segments));
    fs::write(output_filepath, geojson_contents.to_string())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use testdir::testdir;

    use super::{segments_to_feature_collection, write_segments_to_geojson};
    use crate::aggregate::ClippedSegment;

    fn segments() -> Vec<ClippedSegment> {
        vec![
            ClippedSegment {
                county: "Leitrim".to_string(),
                line_id: "Shannon".to_string(),
                geometry: vec![(0.0, 0.0), (0.0, 1_500.0)].into(),
            },
            ClippedSegment {
                county: "Roscommon".to_string(),
                line_id: "Shannon".to_string(),
                geometry: vec![(0.0, 1_500.0), (0.0, 2_000.0)].into(),
            },
        ]
    }

    #[test]
    fn test_segment_properties() {
        let collection = segments_to_feature_collection(&segments());
        assert_eq!(2, collection.features.len());

        let first = &collection.features[0];
        assert_eq!(Some("Leitrim"), first.property("county").and_then(|v| v.as_str()));
        assert_eq!(Some("Shannon"), first.property("river_id").and_then(|v| v.as_str()));
        let length_km = first
            .property("length_km")
            .and_then(|v| v.as_f64())
            .unwrap();
        assert_abs_diff_eq!(1.5, length_km, epsilon = 1e-12);
    }

    #[test]
    fn test_write_segments_to_geojson() {
        let test_dir = testdir!();
        let filepath = test_dir.join("clipped_rivers.geojson");
        write_segments_to_geojson(&segments(), &filepath).unwrap();

        let contents = std::fs::read_to_string(&filepath).unwrap();
        let parsed: geojson::GeoJson = contents.parse().unwrap();
        match parsed {
            geojson::GeoJson::FeatureCollection(collection) => {
                assert_eq!(2, collection.features.len());
                let geometry: geo::Geometry = collection.features[1]
                    .geometry
                    .clone()
                    .unwrap()
                    .try_into()
                    .unwrap();
                assert_eq!(
                    geo::Geometry::LineString(vec![(0.0, 1_500.0), (0.0, 2_000.0)].into()),
                    geometry
                );
            }
            other => panic!("Expected a FeatureCollection, got {:?}", other),
        }
    }
}

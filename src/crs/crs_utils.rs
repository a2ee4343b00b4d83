use anyhow::{anyhow, Context};

use crate::geofile::layers::{GeoreferencedLayer, ProjectableFeature};

pub type EpsgCode = u32;

/// IRENET95 / Irish Transverse Mercator, metres.
pub const IRISH_TRANSVERSE_MERCATOR: EpsgCode = 2158;

pub fn epsg_code_to_authority_string(code: EpsgCode) -> String {
    format!("EPSG:{}", code)
}

pub fn spatial_ref_from_epsg(code: EpsgCode) -> anyhow::Result<gdal::spatial_ref::SpatialRef> {
    gdal::spatial_ref::SpatialRef::from_epsg(code)
        .map_err(|err| anyhow!("Could not create SpatialRef from EPSG code {}. {}", code, err))
}

/// EPSG code of a spatial reference, if it has one.
pub fn epsg_code(spatial_ref: &gdal::spatial_ref::SpatialRef) -> anyhow::Result<EpsgCode> {
    let code = spatial_ref
        .auth_code()
        .context("The CRS has no EPSG authority code")?;
    EpsgCode::try_from(code).map_err(|_| anyhow!("Invalid EPSG code {}", code))
}

/// Lengths and areas are only meaningful in a projected CRS.
pub fn ensure_projected(spatial_ref: &gdal::spatial_ref::SpatialRef) -> anyhow::Result<()> {
    if spatial_ref.is_projected() {
        Ok(())
    } else {
        Err(anyhow!(
            "The CRS {} is not a projected CRS.",
            spatial_ref.name().unwrap_or_else(|_| "<unnamed>".to_string())
        ))
    }
}

/// Reproject every feature of the layer into `to_crs`. Does nothing if the layer already uses it.
pub fn project_layer<F: ProjectableFeature>(
    layer: &mut GeoreferencedLayer<F>,
    to_crs: &gdal::spatial_ref::SpatialRef,
) -> anyhow::Result<()> {
    let from_code = epsg_code(&layer.spatial_ref)?;
    let to_code = epsg_code(to_crs)?;
    if from_code == to_code {
        log::debug!(
            "Layer is already in {}",
            epsg_code_to_authority_string(to_code)
        );
        return Ok(());
    }

    log::info!(
        "Projecting {} features from {} to {}",
        layer.features.len(),
        epsg_code_to_authority_string(from_code),
        epsg_code_to_authority_string(to_code)
    );
    let projection = proj::Proj::new_known_crs(
        &epsg_code_to_authority_string(from_code),
        &epsg_code_to_authority_string(to_code),
        None,
    )?;
    for feature in layer.features.iter_mut() {
        feature
            .project(&projection)
            .map_err(|err| anyhow!("Could not project feature, {}", err))?;
    }
    layer.spatial_ref = to_crs.clone();
    Ok(())
}

extern crate log;
use anyhow::Context;
use clap::Parser;
use county_rivers::aggregate::{
    aggregate_water_area, clip_lines_by_county, joined_length_km, total_length_km,
    totals_from_segments,
};
use county_rivers::config::Config;
use county_rivers::crs::crs_utils::{ensure_projected, project_layer, spatial_ref_from_epsg};
use county_rivers::geofile::gdal_geofile::write_features_to_geofile;
use county_rivers::geofile::geojson::write_segments_to_geojson;
use county_rivers::geofile::layers::{read_county_layer, read_line_layer, read_waterbody_layer};
use county_rivers::report::{county_features, RiverReport};
use std::path::PathBuf;

/// Compute river length and waterbody area per county for trip planning.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: PathBuf,
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::try_parse()?;
    let config = Config::from_file(&args.config_filepath)?;

    let target_crs = spatial_ref_from_epsg(config.target_epsg)?;
    ensure_projected(&target_crs)?;

    log::info!("Reading rivers from {:?}", config.rivers.filepath);
    let mut rivers = read_line_layer(&config.rivers.filepath, config.rivers.id_field.as_deref())?;
    log::info!("Read {} river lines", rivers.features.len());

    log::info!("Reading counties from {:?}", config.counties.filepath);
    let mut counties = read_county_layer(&config.counties.filepath, config.county_name_field())?;
    log::info!("Read {} counties", counties.features.len());

    project_layer(&mut rivers, &target_crs)?;
    project_layer(&mut counties, &target_crs)?;

    let water_areas = match &config.waterbodies {
        Some(source) => {
            log::info!("Reading waterbodies from {:?}", source.filepath);
            let mut waterbodies = read_waterbody_layer(&source.filepath, source.id_field.as_deref())?;
            log::info!("Read {} waterbodies", waterbodies.features.len());
            project_layer(&mut waterbodies, &target_crs)?;
            log::info!("Aggregating waterbody area per county");
            Some(aggregate_water_area(&waterbodies.features, &counties.features)?)
        }
        None => None,
    };

    log::info!("Clipping rivers to counties");
    let segments = clip_lines_by_county(&rivers.features, &counties.features)?;
    let river_lengths = totals_from_segments(&segments, &counties.features);
    let report = RiverReport::new(
        total_length_km(&rivers.features),
        joined_length_km(&rivers.features, &counties.features),
        &river_lengths,
        water_areas.as_ref(),
    );
    report.log_summary();

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Creating output directory {:?}", config.output_dir))?;

    let report_filepath = config.output_dir.join("county_report.yaml");
    log::info!("Writing county report to {:?}", report_filepath);
    report.write_yaml(&report_filepath)?;

    let counties_filepath = config.output_dir.join(format!(
        "counties.{}",
        config.county_output_format.extension()
    ));
    write_features_to_geofile(
        &county_features(&counties.features, &report),
        &counties_filepath,
        &target_crs,
        "counties",
        config.county_output_format.name(),
    )?;

    let segments_filepath = config.output_dir.join("clipped_rivers.geojson");
    log::info!(
        "Writing {} clipped river segments to {:?}",
        segments.len(),
        segments_filepath
    );
    write_segments_to_geojson(&segments, &segments_filepath)?;
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}

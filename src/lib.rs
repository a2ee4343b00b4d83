pub mod aggregate;
pub mod config;
pub mod crs;
pub mod geofile;
pub mod report;

pub mod crs_utils;

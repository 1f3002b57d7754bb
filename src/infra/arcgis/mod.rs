//! ArcGIS image server serving the GLAD alert rasters.

mod client;

pub use client::ArcgisClient;

//! Geostore microservice resolving regions to stored geometries.

mod client;

pub use client::GeostoreClient;

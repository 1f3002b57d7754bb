//! HTTP implementations of the collaborator contracts in [`crate::services`].

pub mod arcgis;
pub mod carto;
pub mod geostore;

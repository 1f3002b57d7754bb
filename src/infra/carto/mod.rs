//! CartoDB SQL API over the tabular alert datasets.

mod client;

pub use client::CartoClient;

pub mod analyzers;
pub mod catalog;
pub mod config;
pub mod coverage;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod geometry;
pub mod infra;
pub mod orchestrator;
pub mod output;
pub mod parser;
pub mod region;
pub mod services;

//! Year/variant to raster-id lookup.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::dates::DateRange;
use crate::error::{AlertsError, Result};

/// Identifier of a year-partitioned raster on the image server.
pub type RasterId = u32;

/// One configured raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterDescriptor {
    pub id: RasterId,
    pub year: i32,
    pub confirmed_only: bool,
}

/// The static year → raster tables, one per alert variant.
///
/// Stored in config as:
/// ```json
/// { "all": { "2015": 6, "2016": 4 }, "confirmed_only": { "2015": 7, "2016": 5 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterTables {
    pub all: BTreeMap<i32, RasterId>,
    pub confirmed_only: BTreeMap<i32, RasterId>,
}

impl Default for RasterTables {
    fn default() -> Self {
        Self {
            all: BTreeMap::from([(2015, 6), (2016, 4)]),
            confirmed_only: BTreeMap::from([(2015, 7), (2016, 5)]),
        }
    }
}

/// Raster lookups in both directions.
#[derive(Debug, Clone)]
pub struct RasterCatalog {
    tables: RasterTables,
    years: HashMap<RasterId, i32>,
}

impl RasterCatalog {
    pub fn new(tables: RasterTables) -> Self {
        let mut years = HashMap::new();
        for (&year, &id) in tables.all.iter().chain(tables.confirmed_only.iter()) {
            if let Some(previous) = years.insert(id, year) {
                if previous != year {
                    warn!(raster = id, previous, year, "Raster id mapped to two years");
                }
            }
        }
        Self { tables, years }
    }

    pub fn raster_for_year(&self, year: i32, confirmed_only: bool) -> Option<RasterId> {
        let table = if confirmed_only {
            &self.tables.confirmed_only
        } else {
            &self.tables.all
        };
        table.get(&year).copied()
    }

    pub fn year_for_raster(&self, raster: RasterId) -> Option<i32> {
        self.years.get(&raster).copied()
    }

    /// Rasters for the years of `range.begin` and `range.end`, de-duplicated.
    ///
    /// Years strictly between the two ends are NOT included, so a range
    /// spanning three or more calendar years under-counts.
    ///
    /// # Errors
    ///
    /// [`AlertsError::MissingRaster`] if either end's year has no raster.
    pub fn rasters_for_period(&self, range: &DateRange, confirmed_only: bool) -> Result<Vec<RasterId>> {
        let mut rasters = Vec::with_capacity(2);
        for year in [range.begin.year(), range.end.year()] {
            let raster = self
                .raster_for_year(year, confirmed_only)
                .ok_or(AlertsError::MissingRaster {
                    year,
                    confirmed_only,
                })?;
            if !rasters.contains(&raster) {
                rasters.push(raster);
            }
        }
        Ok(rasters)
    }

    /// All configured rasters of one variant, ordered by year.
    pub fn descriptors(&self, confirmed_only: bool) -> Vec<RasterDescriptor> {
        let table = if confirmed_only {
            &self.tables.confirmed_only
        } else {
            &self.tables.all
        };
        table
            .iter()
            .map(|(&year, &id)| RasterDescriptor {
                id,
                year,
                confirmed_only,
            })
            .collect()
    }
}

impl Default for RasterCatalog {
    fn default() -> Self {
        Self::new(RasterTables::default())
    }
}

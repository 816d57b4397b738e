use rayon::prelude::*;
use serde::Serialize;

use crate::catalog::PeakCatalog;
use crate::error::Result;
use crate::geodesy::GeoPoint;
use crate::skyline::{Skyline, SkylineBuilder};

/// A place the skyline is computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartPoint {
    pub name: String,
    pub location: GeoPoint,
}

impl StartPoint {
    pub fn new(name: String, location: GeoPoint) -> Self {
        Self { name, location }
    }
}

impl std::fmt::Display for StartPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One start point and its skyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkylineEntry {
    pub start: StartPoint,
    #[serde(flatten)]
    pub skyline: Skyline,
}

/// Skylines keyed by start point, in the order the start points were given.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    entries: Vec<SkylineEntry>,
}

impl ResultSet {
    pub fn iter(&self) -> std::slice::Iter<'_, SkylineEntry> {
        self.entries.iter()
    }

    /// Skyline of the first start point called `name`.
    pub fn get(&self, name: &str) -> Option<&Skyline> {
        self.entries
            .iter()
            .find(|e| e.start.name == name)
            .map(|e| &e.skyline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SkylineEntry;
    type IntoIter = std::slice::Iter<'a, SkylineEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Runs one skyline computation per start point against a shared catalog.
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    builder: SkylineBuilder,
}

impl BatchRunner {
    pub fn new(builder: SkylineBuilder) -> Self {
        Self { builder }
    }

    /// Start points are processed in parallel; the first failure aborts the batch.
    pub fn run(&self, starts: &[StartPoint], catalog: &PeakCatalog) -> Result<ResultSet> {
        let entries = starts
            .par_iter()
            .map(|start| {
                self.builder.compute(start, catalog).map(|skyline| SkylineEntry {
                    start: start.clone(),
                    skyline,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ResultSet { entries })
    }
}

use log::debug;

use crate::error::{Result, SkylineError};
use crate::geodesy::GeoPoint;
use crate::name::NameFields;

/// Elevations at or above this are treated as data errors and never used.
pub const MAX_VALID_ELEVATION: i32 = 9000;

/// A peak as it comes out of the feature library, before any distance is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name_fields: NameFields,
    /// Metres above sea level.
    pub elevation: i32,
    pub location: GeoPoint,
}

impl Candidate {
    pub fn new(name_fields: NameFields, elevation: i32, location: GeoPoint) -> Self {
        Self {
            name_fields,
            elevation,
            location,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.elevation < MAX_VALID_ELEVATION
    }
}

/// The valid candidate peaks of one run.
///
/// Outliers are dropped on construction, so nothing reading the catalog can
/// see them.
#[derive(Debug, Clone, Default)]
pub struct PeakCatalog {
    candidates: Vec<Candidate>,
}

impl PeakCatalog {
    pub fn new(candidates: impl IntoIterator<Item = Candidate>) -> Self {
        let mut dropped = 0usize;
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| {
                let valid = c.is_valid();
                if !valid {
                    dropped += 1;
                }
                valid
            })
            .collect();
        if dropped > 0 {
            debug!("{dropped} candidates at or above {MAX_VALID_ELEVATION} m dropped as invalid.");
        }
        Self { candidates }
    }

    /// The highest valid candidate. Among equal elevations the earliest one wins.
    pub fn highest(&self) -> Result<&Candidate> {
        self.candidates
            .iter()
            .reduce(|best, c| if c.elevation > best.elevation { c } else { best })
            .ok_or(SkylineError::EmptyCatalog)
    }

    pub fn all(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl FromIterator<Candidate> for PeakCatalog {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        PeakCatalog::new(iter)
    }
}

//! Next higher peak
//!
//! Walking outward from a place, which peaks are each higher than every peak
//! closer to it? For every start point this crate computes that sequence over
//! a catalog of tagged peaks, using ellipsoidal (WGS84) distances.

pub mod app;
pub mod batch;
pub mod catalog;
pub mod data;
pub mod error;
pub mod geodesy;
pub mod name;
pub mod report;
pub mod settings;
pub mod skyline;

pub use batch::{BatchRunner, ResultSet, SkylineEntry, StartPoint};
pub use catalog::{Candidate, PeakCatalog};
pub use error::SkylineError;
pub use geodesy::{GeoPoint, distance};
pub use name::{NameResolver, resolve_name};
pub use skyline::{Peak, Skyline, SkylineBuilder};

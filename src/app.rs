use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::batch::{BatchRunner, ResultSet};
use crate::catalog::PeakCatalog;
use crate::data::filter::{FeatureQuery, select_candidates, select_start_points};
use crate::data::loader::load_files;
use crate::report::label;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// One run, independent of the command line
// ---------------------------------------------------------------------------

/// Everything needed for one skyline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Feature libraries holding both the places and the peaks.
    pub libraries: Vec<PathBuf>,
    pub settings: Settings,
}

impl RunConfig {
    pub fn new(libraries: Vec<PathBuf>, settings: Settings) -> Self {
        Self {
            libraries,
            settings,
        }
    }
}

/// Load the libraries, select places and peaks, and compute every skyline.
///
/// Fails with [`SkylineError`](crate::error::SkylineError) when no place
/// matches or no valid peak exists.
pub fn run(config: &RunConfig) -> Result<ResultSet> {
    let settings = &config.settings;
    let start_query: FeatureQuery = settings.start_query.parse().context("start point query")?;
    let peak_query: FeatureQuery = settings.peak_query.parse().context("peak query")?;
    let names = settings.name_resolver();

    let library = load_files(&config.libraries)?;
    info!("{} features loaded from {} libraries.", library.len(), config.libraries.len());

    debug!("Looking for start points according to {start_query}.");
    let starts = select_start_points(&library, &start_query, &names)?;

    debug!("Looking for peaks according to {peak_query}.");
    let catalog = PeakCatalog::new(select_candidates(&library, &peak_query, &names));

    let results = BatchRunner::new(settings.skyline_builder()).run(&starts, &catalog)?;

    for entry in &results {
        debug!("Next higher mountains from {}:", entry.start);
        for (i, peak) in entry.skyline.iter().enumerate() {
            debug!("{}, {}", label(i + 1, peak), peak.location);
        }
    }
    debug!("Done.");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkylineError;

    fn write_library(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("nhp-{}-{name}", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    const CITIES: &str = "\
name,name:en,place,population,lat,lon
Praha,Prague,city,1300000,50.0875,14.4213
Brno,,city,380000,49.1951,16.6068
";

    const PEAKS: &str = "\
name,name:cs,natural,ele,lat,lon
Schneekoppe,Sněžka,peak,1603,50.7360,15.7399
,,peak,459,50.3867,14.2994
Ještěd,,peak,1012,50.7324,14.9849
Bogus,,peak,9999,50.1,14.5
Kahlenberg,,hill,,48.2750,16.3330
";

    #[test]
    fn end_to_end_from_csv() {
        let cities = write_library("e2e-cities.csv", CITIES);
        let peaks = write_library("e2e-peaks.csv", PEAKS);
        let config = RunConfig::new(vec![cities.clone(), peaks.clone()], Settings::default());
        let results = run(&config).unwrap();
        std::fs::remove_file(cities).ok();
        std::fs::remove_file(peaks).ok();

        // Brno is below the population threshold.
        assert_eq!(results.len(), 1);
        let entry = results.iter().next().unwrap();
        assert_eq!(entry.start.name, "Prague");
        let names: Vec<&str> = entry.skyline.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Bezejmenný vrchol", "Ještěd", "Sněžka"]);
    }

    #[test]
    fn no_matching_places() {
        let cities = write_library("none-cities.csv", CITIES);
        let settings = Settings {
            start_query: "n[place=city][population>=5000000]".into(),
            ..Settings::default()
        };
        let err = run(&RunConfig::new(vec![cities.clone()], settings)).unwrap_err();
        std::fs::remove_file(cities).ok();
        assert_eq!(err.downcast_ref::<SkylineError>(), Some(&SkylineError::NoStartPoints));
    }

    #[test]
    fn no_valid_peaks() {
        let cities = write_library("nopeaks-cities.csv", CITIES);
        let peaks = write_library("nopeaks-peaks.csv", "name,natural,ele,lat,lon\nBogus,peak,9000,50.1,14.5\n");
        let err = run(&RunConfig::new(vec![cities.clone(), peaks.clone()], Settings::default())).unwrap_err();
        std::fs::remove_file(cities).ok();
        std::fs::remove_file(peaks).ok();
        assert_eq!(err.downcast_ref::<SkylineError>(), Some(&SkylineError::EmptyCatalog));
    }

    #[test]
    fn bad_query_is_reported() {
        let settings = Settings {
            peak_query: "n[natural=peak".into(),
            ..Settings::default()
        };
        let err = run(&RunConfig::new(Vec::new(), settings)).unwrap_err();
        assert!(format!("{err:#}").contains("peak query"));
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::filter::{DEFAULT_PEAK_QUERY, DEFAULT_START_QUERY};
use crate::name::{DEFAULT_NAME_KEYS, DEFAULT_UNNAMED, NameResolver};
use crate::skyline::{RADIUS_TOLERANCE, SkylineBuilder};

/// Optional settings file; every field falls back to its default.
///
/// ```json
/// {
///   "name_keys": ["name:de", "name:en", "name"],
///   "unnamed": "unnamed peak",
///   "start_query": "n[place=city][name][population>=500000]"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Name tags tried in order when labelling places and peaks.
    pub name_keys: Vec<String>,
    /// Label for features with no usable name.
    pub unnamed: String,
    /// Metres of slack on the search radius.
    pub radius_tolerance_m: f64,
    pub start_query: String,
    pub peak_query: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name_keys: DEFAULT_NAME_KEYS.iter().map(|k| k.to_string()).collect(),
            unnamed: DEFAULT_UNNAMED.to_string(),
            radius_tolerance_m: RADIUS_TOLERANCE,
            start_query: DEFAULT_START_QUERY.to_string(),
            peak_query: DEFAULT_PEAK_QUERY.to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    pub fn name_resolver(&self) -> NameResolver {
        NameResolver::new(self.name_keys.clone(), self.unnamed.clone())
    }

    pub fn skyline_builder(&self) -> SkylineBuilder {
        SkylineBuilder::new(self.name_resolver()).with_tolerance(self.radius_tolerance_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"unnamed": "?", "name_keys": ["name"]}"#).unwrap();
        assert_eq!(settings.unnamed, "?");
        assert_eq!(settings.name_keys, ["name"]);
        assert_eq!(settings.radius_tolerance_m, 0.1);
        assert_eq!(settings.peak_query, DEFAULT_PEAK_QUERY);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<Settings>(r#"{"radius": 5}"#).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("nhp-{}-settings.json", std::process::id()));
        std::fs::write(&path, r#"{"start_query": "n[place=city]"}"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(settings.start_query, "n[place=city]");
        assert_eq!(settings.name_resolver().keys(), Settings::default().name_keys.as_slice());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Settings::load(Path::new("/nonexistent/nhp.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/nhp.json"));
    }
}

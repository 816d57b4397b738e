use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use crate::batch::StartPoint;
use crate::catalog::{Candidate, PeakCatalog};
use crate::error::Result;
use crate::geodesy::{GeoPoint, distance};
use crate::name::NameResolver;

/// Slack in metres when comparing a peak's distance with the search radius.
pub const RADIUS_TOLERANCE: f64 = 0.1;

// ---------------------------------------------------------------------------
// Peak / Skyline
// ---------------------------------------------------------------------------

/// A candidate seen from one particular start point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peak {
    pub name: String,
    #[serde(rename = "elevation_m")]
    pub elevation: i32,
    /// Metres from the start point this peak was computed for.
    #[serde(rename = "distance_m")]
    pub distance: f64,
    pub location: GeoPoint,
}

/// Peaks in ascending distance, each strictly higher than the one before.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skyline {
    /// Distance to the highest valid peak; nothing farther is considered.
    #[serde(rename = "radius_m")]
    pub radius: f64,
    pub peaks: Vec<Peak>,
}

impl Skyline {
    pub fn iter(&self) -> std::slice::Iter<'_, Peak> {
        self.peaks.iter()
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// The last (and highest) peak of the sequence.
    pub fn summit(&self) -> Option<&Peak> {
        self.peaks.last()
    }
}

impl<'a> IntoIterator for &'a Skyline {
    type Item = &'a Peak;
    type IntoIter = std::slice::Iter<'a, Peak>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.iter()
    }
}

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Keep each item whose key strictly exceeds every key kept before it.
///
/// A single left-to-right pass; the only state is the last kept key.
pub fn running_maximum<T, I, F>(items: I, key: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> i32,
{
    items
        .into_iter()
        .fold((Vec::new(), None), |(mut kept, last), item| {
            let k = key(&item);
            if last.map_or(true, |l| k > l) {
                kept.push(item);
                (kept, Some(k))
            } else {
                (kept, last)
            }
        })
        .0
}

// ---------------------------------------------------------------------------
// SkylineBuilder
// ---------------------------------------------------------------------------

/// Computes the skyline of one start point over a shared catalog.
#[derive(Debug, Clone)]
pub struct SkylineBuilder {
    names: NameResolver,
    tolerance: f64,
}

impl Default for SkylineBuilder {
    fn default() -> Self {
        Self::new(NameResolver::default())
    }
}

impl SkylineBuilder {
    pub fn new(names: NameResolver) -> Self {
        Self {
            names,
            tolerance: RADIUS_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Skyline of `start`, or [`SkylineError::EmptyCatalog`](crate::error::SkylineError)
    /// when there is no valid peak at all.
    pub fn compute(&self, start: &StartPoint, catalog: &PeakCatalog) -> Result<Skyline> {
        debug!("Now computing mountains for place {}.", start.name);
        let highest = catalog.highest()?;
        let radius = distance(start.location, highest.location);
        debug!(
            "Highest peak is {} m at {:.0} m from {}.",
            highest.elevation, radius, start.name
        );

        let mut within: Vec<(&Candidate, f64)> = catalog
            .all()
            .par_iter()
            .map(|c| (c, distance(start.location, c.location)))
            .filter(|(_, d)| *d - radius < self.tolerance)
            .collect();

        // Stable, so equal distances keep catalog order.
        within.sort_by(|a, b| a.1.total_cmp(&b.1));

        let peaks: Vec<Peak> = running_maximum(within, |(c, _)| c.elevation)
            .into_iter()
            .map(|(c, d)| Peak {
                name: self.names.resolve(&c.name_fields),
                elevation: c.elevation,
                distance: d,
                location: c.location,
            })
            .collect();

        debug!("{} mountains stored for displaying.", peaks.len());
        Ok(Skyline { radius, peaks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkylineError;

    const START: GeoPoint = GeoPoint {
        latitude: 50.0,
        longitude: 14.0,
    };

    fn start() -> StartPoint {
        StartPoint::new("Start".to_string(), START)
    }

    /// A peak roughly `km` kilometres due north of the start.
    fn north(name: &str, km: f64, elevation: i32) -> Candidate {
        Candidate::new(
            vec![("name".to_string(), Some(name.to_string()))],
            elevation,
            GeoPoint::new(START.latitude + km / 111.2, START.longitude),
        )
    }

    fn elevations(skyline: &Skyline) -> Vec<i32> {
        skyline.iter().map(|p| p.elevation).collect()
    }

    #[test]
    fn running_maximum_keeps_records() {
        assert_eq!(running_maximum([3, 1, 4, 1, 5, 9, 2, 6], |x| *x), [3, 4, 5, 9]);
        assert_eq!(running_maximum([5, 5, 5], |x| *x), [5]);
        assert!(running_maximum(Vec::<i32>::new(), |x| *x).is_empty());
    }

    #[test]
    fn single_peak() {
        let location = GeoPoint::new(50.1, 14.1);
        let catalog = PeakCatalog::new([Candidate::new(
            vec![("name".to_string(), Some("Only".to_string()))],
            1000,
            location,
        )]);
        let skyline = SkylineBuilder::default().compute(&start(), &catalog).unwrap();
        assert_eq!(skyline.len(), 1);
        assert_eq!(skyline.peaks[0].name, "Only");
        assert_eq!(skyline.peaks[0].elevation, 1000);
        assert_eq!(skyline.peaks[0].distance, distance(START, location));
        assert_eq!(skyline.radius, skyline.peaks[0].distance);
    }

    #[test]
    fn lower_peak_is_skipped() {
        let catalog = PeakCatalog::new([north("c", 30.0, 900), north("a", 10.0, 500), north("b", 20.0, 300)]);
        let skyline = SkylineBuilder::default().compute(&start(), &catalog).unwrap();
        assert_eq!(elevations(&skyline), [500, 900]);
        let names: Vec<&str> = skyline.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn highest_peak_sets_the_radius() {
        let mut peaks = vec![north("a", 10.0, 400), north("b", 20.0, 1200), north("c", 30.0, 1500)];
        let catalog = PeakCatalog::new(peaks.clone());
        let skyline = SkylineBuilder::default().compute(&start(), &catalog).unwrap();
        assert_eq!(elevations(&skyline), [400, 1200, 1500]);

        peaks.push(north("d", 40.0, 2000));
        let catalog = PeakCatalog::new(peaks);
        let skyline = SkylineBuilder::default().compute(&start(), &catalog).unwrap();
        assert_eq!(elevations(&skyline), [400, 1200, 1500, 2000]);
        assert_eq!(skyline.summit().map(|p| p.name.as_str()), Some("d"));
    }

    #[test]
    fn peaks_beyond_the_highest_are_excluded() {
        // Everything past the 800 m peak is outside the radius.
        let catalog = PeakCatalog::new([
            north("near", 5.0, 300),
            north("top", 20.0, 800),
            north("far", 50.0, 700),
            north("farther", 60.0, 600),
        ]);
        let skyline = SkylineBuilder::default().compute(&start(), &catalog).unwrap();
        assert_eq!(elevations(&skyline), [300, 800]);
        assert!(skyline.iter().all(|p| p.distance <= skyline.radius + RADIUS_TOLERANCE));
    }

    /// Smallest `f64` strictly greater than `x`.
    fn next_up(x: f64) -> f64 {
        if x == 0.0 {
            f64::from_bits(1)
        } else if x > 0.0 {
            f64::from_bits(x.to_bits() + 1)
        } else {
            f64::from_bits(x.to_bits() - 1)
        }
    }

    #[test]
    fn radius_comparison_is_strict() {
        let catalog = PeakCatalog::new([north("a", 5.0, 300), north("b", 10.0, 500), north("top", 20.0, 900)]);
        let radius = distance(START, catalog.highest().unwrap().location);
        let margin_b = distance(START, north("b", 10.0, 500).location) - radius;

        // A peak whose `d - radius` equals the tolerance is outside.
        let at_b = SkylineBuilder::default().with_tolerance(margin_b);
        assert_eq!(elevations(&at_b.compute(&start(), &catalog).unwrap()), [300]);
        let past_b = SkylineBuilder::default().with_tolerance(next_up(margin_b));
        assert_eq!(elevations(&past_b.compute(&start(), &catalog).unwrap()), [300, 500]);

        // The highest peak sits at `d - radius == 0`.
        let at_top = SkylineBuilder::default().with_tolerance(0.0);
        assert_eq!(elevations(&at_top.compute(&start(), &catalog).unwrap()), [300, 500]);
        let past_top = SkylineBuilder::default().with_tolerance(next_up(0.0));
        assert_eq!(elevations(&past_top.compute(&start(), &catalog).unwrap()), [300, 500, 900]);
    }

    #[test]
    fn outliers_never_appear() {
        let catalog = PeakCatalog::new([
            north("bogus", 1.0, 9000),
            north("bogus2", 2.0, 15000),
            north("a", 10.0, 500),
            north("b", 20.0, 700),
        ]);
        let skyline = SkylineBuilder::default().compute(&start(), &catalog).unwrap();
        assert_eq!(elevations(&skyline), [500, 700]);
        assert!(skyline.radius > 19_000.0);
    }

    #[test]
    fn empty_or_invalid_catalog_fails() {
        let builder = SkylineBuilder::default();
        assert_eq!(builder.compute(&start(), &PeakCatalog::default()), Err(SkylineError::EmptyCatalog));
        let catalog = PeakCatalog::new([north("x", 1.0, 9001), north("y", 3.0, 9000)]);
        assert_eq!(builder.compute(&start(), &catalog), Err(SkylineError::EmptyCatalog));
    }

    #[test]
    fn standing_on_the_highest_peak() {
        let catalog = PeakCatalog::new([
            north("low", 1.0, 100),
            Candidate::new(vec![("name".to_string(), Some("here".to_string()))], 1500, START),
        ]);
        let skyline = SkylineBuilder::default().compute(&start(), &catalog).unwrap();
        assert_eq!(skyline.radius, 0.0);
        assert_eq!(elevations(&skyline), [1500]);
    }

    #[test]
    fn equal_distances_keep_catalog_order() {
        let catalog = PeakCatalog::new([north("first", 10.0, 500), north("second", 10.0, 700), north("third", 10.0, 600)]);
        let skyline = SkylineBuilder::default().compute(&start(), &catalog).unwrap();
        let names: Vec<&str> = skyline.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn unnamed_peaks_get_the_sentinel() {
        let catalog = PeakCatalog::new([Candidate::new(vec![("name".to_string(), None)], 500, GeoPoint::new(50.2, 14.0))]);
        let builder = SkylineBuilder::new(NameResolver::new(vec!["name".into()], "unnamed".into()));
        let skyline = builder.compute(&start(), &catalog).unwrap();
        assert_eq!(skyline.peaks[0].name, "unnamed");
    }

    #[test]
    fn invariants_hold_on_a_scattered_field() {
        // Deterministic LCG scatter of a few hundred peaks around the start.
        let mut state: u64 = 0x5eed;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        let candidates: Vec<Candidate> = (0..400)
            .map(|i| {
                let lat = START.latitude + (next() - 0.5) * 4.0;
                let lon = START.longitude + (next() - 0.5) * 6.0;
                let elevation = (next() * 9500.0) as i32;
                Candidate::new(vec![("name".to_string(), Some(format!("p{i}")))], elevation, GeoPoint::new(lat, lon))
            })
            .collect();
        let catalog = PeakCatalog::new(candidates);
        let highest = catalog.highest().unwrap().elevation;

        let skyline = SkylineBuilder::default().compute(&start(), &catalog).unwrap();
        assert!(!skyline.is_empty());
        assert_eq!(skyline.summit().map(|p| p.elevation), Some(highest));
        for pair in skyline.peaks.windows(2) {
            assert!(pair[1].elevation > pair[0].elevation);
            assert!(pair[1].distance >= pair[0].distance);
        }
        for peak in &skyline {
            assert!(peak.elevation < 9000);
            assert!(peak.distance <= skyline.radius + RADIUS_TOLERANCE);
        }
        // The nearest valid peak always starts the sequence.
        let nearest = catalog
            .all()
            .iter()
            .map(|c| distance(START, c.location))
            .fold(f64::INFINITY, f64::min);
        assert_eq!(skyline.peaks[0].distance, nearest);
    }
}

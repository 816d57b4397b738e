use geo::{Distance, Geodesic, Point};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GeoPoint
// ---------------------------------------------------------------------------

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Ellipsoidal distance to `other` in metres.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance(*self, *other)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.latitude, self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Surface distance in metres between two points on the WGS84 ellipsoid
/// (geodesic inverse problem).
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    // Evaluate in a fixed order so swapping the arguments is bit-identical.
    let (p1, p2) = if (a.latitude, a.longitude) <= (b.latitude, b.longitude) {
        (a, b)
    } else {
        (b, a)
    };
    if p1 == p2 {
        return 0.0;
    }
    let from = Point::new(p1.longitude, p1.latitude);
    let to = Point::new(p2.longitude, p2.latitude);
    Geodesic::distance(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn same_point_is_zero() {
        let p = GeoPoint::new(50.0875, 14.4213);
        assert_eq!(distance(p, p), 0.0);
    }

    #[test]
    fn flinders_peak_to_buninyong() {
        // Geoscience Australia worked example, 54 972.271 m.
        let flinders = GeoPoint::new(-37.951_033_42, 144.424_867_89);
        let buninyong = GeoPoint::new(-37.652_821_14, 143.926_495_54);
        let d = distance(flinders, buninyong);
        assert!(approx_eq(d, 54_972.271, 0.05), "got {d}");
    }

    #[test]
    fn one_degree_of_latitude_at_equator() {
        // Meridian arc from 0° to 1° on WGS84 is 110 574.389 m.
        let d = distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!(approx_eq(d, 110_574.389, 1.0), "got {d}");
    }

    #[test]
    fn along_the_equator() {
        // Equatorial arc of one degree: a * π / 180.
        let d = distance(GeoPoint::new(0.0, 10.0), GeoPoint::new(0.0, 11.0));
        let expected = 6_378_137.0 * std::f64::consts::PI / 180.0;
        assert!(approx_eq(d, expected, 1e-3), "got {d}, expected {expected}");
    }

    #[test]
    fn symmetric() {
        let pairs = [
            (GeoPoint::new(50.0, 14.0), GeoPoint::new(50.1, 14.1)),
            (GeoPoint::new(50.0875, 14.4213), GeoPoint::new(45.8326, 6.8652)),
            (GeoPoint::new(-33.45, -70.66), GeoPoint::new(-32.6532, -70.0109)),
            (GeoPoint::new(27.9881, 86.925), GeoPoint::new(35.6762, 139.6503)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance(a, b), distance(b, a));
        }
    }

    #[test]
    fn prague_to_mont_blanc() {
        let prague = GeoPoint::new(50.0875, 14.4213);
        let mont_blanc = GeoPoint::new(45.8326, 6.8652);
        let d = distance(prague, mont_blanc);
        assert!(approx_eq(d, 735_750.8517, 0.01), "got {d}");
        assert_eq!(prague.distance_to(&mont_blanc), d);
    }
}

use serde::{Deserialize, Serialize};

/// Mean Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic position in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance in kilometers (haversine)
#[inline(always)]
pub fn distance_km(p1: Coordinate, p2: Coordinate) -> f64 {
    let dlat = (p2.lat - p1.lat).to_radians();
    let dlng = (p2.lng - p1.lng).to_radians();
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points
    2.0 * EARTH_RADIUS_KM * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Map any heading into [0, 360)
#[inline(always)]
pub fn normalize_heading(heading: f64) -> f64 {
    if !heading.is_finite() {
        return 0.0;
    }
    let h = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Like [`normalize_heading`], a missing reading counts as north
pub fn normalize_optional_heading(heading: Option<f64>) -> f64 {
    heading.map(normalize_heading).unwrap_or(0.0)
}

/// Convert a raw orientation reading into a compass heading.
///
/// An absolute compass heading is used as-is. Otherwise `alpha` is the
/// counter-clockwise rotation about the vertical axis, so the heading is
/// `360 - alpha`. With neither, the device is assumed to face north.
pub fn heading_from_orientation(compass: Option<f64>, alpha: Option<f64>) -> f64 {
    match (compass, alpha) {
        (Some(c), _) if c.is_finite() => normalize_heading(c),
        (_, Some(a)) if a.is_finite() => normalize_heading(360.0 - a),
        _ => 0.0,
    }
}

/// Destination reached from `origin` travelling `distance_km` along the
/// great circle with initial bearing `bearing_deg`
pub fn destination(origin: Coordinate, bearing_deg: f64, distance_km: f64) -> Coordinate {
    let delta = distance_km / EARTH_RADIUS_KM;
    let theta = bearing_deg.to_radians();
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lng2 = lng1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    Coordinate {
        lat: lat2.to_degrees(),
        // Wrap to [-180, 180)
        lng: (lng2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0,
    }
}

/// Closed polygon approximating a geodesic circle, as (lon, lat) pairs
pub fn geodesic_circle(center: Coordinate, radius_km: f64, segments: usize) -> Vec<(f64, f64)> {
    let segments = segments.max(8);
    (0..=segments)
        .map(|i| {
            let bearing = i as f64 * 360.0 / segments as f64;
            let p = destination(center, bearing, radius_km);
            (p.lng, p.lat)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TEL_AVIV: Coordinate = Coordinate::new(32.0853, 34.7818);
    const JERUSALEM: Coordinate = Coordinate::new(31.7683, 35.2137);
    const TEHRAN: Coordinate = Coordinate::new(35.6892, 51.3890);

    #[test]
    fn test_zero_distance() {
        assert_eq!(distance_km(TEL_AVIV, TEL_AVIV), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let ab = distance_km(TEL_AVIV, TEHRAN);
        let ba = distance_km(TEHRAN, TEL_AVIV);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        let d = distance_km(TEL_AVIV, JERUSALEM);
        assert!((d - 54.0).abs() < 2.0, "got {d}");
    }

    #[test]
    fn test_triangle_inequality() {
        let points = [
            TEL_AVIV,
            JERUSALEM,
            TEHRAN,
            Coordinate::new(-33.9, 151.2),
            Coordinate::new(64.1, -21.9),
            Coordinate::new(0.0, 0.0),
        ];
        for a in points {
            for b in points {
                for c in points {
                    let direct = distance_km(a, c);
                    let via = distance_km(a, b) + distance_km(b, c);
                    assert!(direct <= via + 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(359.5, 359.5)]
    #[case(360.0, 0.0)]
    #[case(725.0, 5.0)]
    #[case(-90.0, 270.0)]
    #[case(-720.0, 0.0)]
    #[case(-1e-20, 0.0)]
    #[case(f64::NAN, 0.0)]
    fn test_normalize_heading(#[case] input: f64, #[case] expected: f64) {
        let h = normalize_heading(input);
        assert!((0.0..360.0).contains(&h));
        assert!((h - expected).abs() < 1e-9, "{input} -> {h}");
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional_heading(None), 0.0);
        assert_eq!(normalize_optional_heading(Some(-10.0)), 350.0);
    }

    #[rstest]
    #[case(Some(45.0), Some(10.0), 45.0)]
    #[case(None, Some(90.0), 270.0)]
    #[case(None, Some(0.0), 0.0)]
    #[case(None, None, 0.0)]
    #[case(Some(f64::NAN), Some(30.0), 330.0)]
    fn test_heading_from_orientation(
        #[case] compass: Option<f64>,
        #[case] alpha: Option<f64>,
        #[case] expected: f64,
    ) {
        assert_eq!(heading_from_orientation(compass, alpha), expected);
    }

    #[test]
    fn test_destination_round_trip_distance() {
        for bearing in [0.0, 45.0, 133.0, 270.0] {
            let p = destination(TEL_AVIV, bearing, 250.0);
            assert!((distance_km(TEL_AVIV, p) - 250.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_destination_north() {
        let p = destination(Coordinate::new(0.0, 10.0), 0.0, 111.195);
        assert!((p.lat - 1.0).abs() < 1e-3);
        assert!((p.lng - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_geodesic_circle_is_closed() {
        let ring = geodesic_circle(JERUSALEM, 100.0, 64);
        assert_eq!(ring.len(), 65);
        let first = ring[0];
        let last = ring[64];
        assert!((first.0 - last.0).abs() < 1e-9 && (first.1 - last.1).abs() < 1e-9);
    }
}

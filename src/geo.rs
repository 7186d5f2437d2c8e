//! Great-circle distance over waypoint coordinates.

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Calculate the great-circle distance between two positions.
///
/// Positions are `(latitude, longitude)` in degrees; the result is in
/// kilometres on a spherical Earth.
///
/// # Example
///
/// ```
/// use routexml2csv::geo::haversine_km;
///
/// // One degree of longitude along the equator
/// let dist = haversine_km((0.0, 0.0), (0.0, 1.0));
/// assert!((dist - 111.195).abs() < 0.001);
/// ```
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Total length of the polyline through `points`, in kilometres.
///
/// Fewer than two points give `0.0`.
pub fn path_length_km(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}

/// Round to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let dist = round_to(path_length_km(&[(0.0, 0.0), (0.0, 1.0)]), 6);
        assert!((dist - 111.195080).abs() < 1e-5, "got {dist}");
    }

    #[test]
    fn test_short_paths_are_zero() {
        assert_eq!(path_length_km(&[]), 0.0);
        assert_eq!(path_length_km(&[(25.0, 121.5)]), 0.0);
    }

    #[test]
    fn test_path_sums_segments() {
        let points = [(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)];
        let single = haversine_km((0.0, 0.0), (0.0, 1.0));
        assert!((path_length_km(&points) - 2.0 * single).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_and_zero_for_same_point() {
        let a = (25.033, 121.565);
        let b = (24.147, 120.673);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
        assert_eq!(haversine_km(a, a), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456789, 6), 1.234568);
        assert_eq!(round_to(0.0, 6), 0.0);
    }
}

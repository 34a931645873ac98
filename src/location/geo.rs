//! Great-circle distance (spec §4.3): spherical-Earth haversine, accurate
//! to within 1 m for inputs ≤ 10 km.

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// `2R · asin( √(sin²(Δφ/2) + cos φ₁ · cos φ₂ · sin²(Δλ/2)) )`, φ/λ in radians.
pub fn haversine_distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        assert!(haversine_distance_meters(39.6042, -105.9538, 39.6042, -105.9538).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_longitude_at_equator_is_about_111_km() {
        let d = haversine_distance_meters(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn six_meters_apart_is_under_proximity_threshold() {
        let d = haversine_distance_meters(39.6042, -105.9538, 39.60425, -105.95385);
        assert!(d < 100.0, "expected < 100m, got {d}");
    }

    #[test]
    fn matches_closed_form_within_one_meter_under_10km() {
        // Two points roughly 9.93 km apart along a meridian (0.0893deg lat).
        let d = haversine_distance_meters(39.6042, -105.9538, 39.6935, -105.9538);
        let expected = EARTH_RADIUS_METERS * (0.0893_f64).to_radians();
        assert!((d - expected).abs() < 1.0, "d={d} expected={expected}");
    }
}

use crate::location_fix::Coordinate;

/// Mean radius of the earth in meters
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Great-circle distance in meters between two coordinates.
pub fn haversine_distance(p1: Coordinate, p2: Coordinate) -> f64 {
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lon = (p2.longitude - p1.longitude).to_radians();
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::asin(f64::sqrt(a.min(1.)));

    EARTH_RADIUS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let p = Coordinate::new(56.175188, 10.196123);
        assert_eq!(haversine_distance(p, p), 0.);
    }

    #[test]
    fn thousandth_degree_of_latitude() {
        let d = haversine_distance(Coordinate::new(37.0, -122.0), Coordinate::new(37.001, -122.0));
        assert!((d - 111.).abs() / 111. < 0.01, "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = Coordinate::new(55.6761, 12.5683);
        let b = Coordinate::new(56.1629, 10.2039);
        assert!((haversine_distance(a, b) - haversine_distance(b, a)).abs() < 1e-6);
        // Copenhagen to Aarhus is roughly 157 km
        assert!((haversine_distance(a, b) / 1000. - 157.).abs() < 3.);
    }
}

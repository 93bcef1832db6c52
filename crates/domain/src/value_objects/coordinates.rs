use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic point as (longitude, latitude) in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_meters(&self, other: &Coordinates) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = Coordinates::new(127.0276, 37.4979);
        assert!(p.distance_meters(&p) < f64::EPSILON);
    }

    #[test]
    fn test_known_distance() {
        // Gangnam station to Yangjae station, roughly 2.5 km apart.
        let gangnam = Coordinates::new(127.0276, 37.4979);
        let yangjae = Coordinates::new(127.0340, 37.4846);
        let d = gangnam.distance_meters(&yangjae);
        assert!(d > 1_500.0 && d < 2_500.0, "got {d}");
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinates::new(126.9780, 37.5665);
        let b = Coordinates::new(129.0756, 35.1796);
        let ab = a.distance_meters(&b);
        let ba = b.distance_meters(&a);
        assert!((ab - ba).abs() < 1e-6);
        // Seoul to Busan is on the order of 325 km.
        assert!(ab > 300_000.0 && ab < 350_000.0, "got {ab}");
    }
}

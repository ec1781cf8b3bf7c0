use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

/// A single reported device location with its accuracy radius in meters.
///
/// The position is stored as a `geo_types::Point`, so `x` is longitude and `y` is latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub position: Point,
    pub horizontal_accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, horizontal_accuracy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            position: Point::new(longitude, latitude),
            horizontal_accuracy,
            timestamp,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    pub fn longitude(&self) -> f64 {
        self.position.x()
    }

    /// Non-positive accuracy is what location services report for invalid fixes.
    pub fn has_valid_accuracy(&self) -> bool {
        self.horizontal_accuracy > 0.
    }

    /// Finite latitude within ±90 and longitude within ±180
    pub fn has_valid_position(&self) -> bool {
        let (lat, lon) = (self.latitude(), self.longitude());
        lat.is_finite() && lon.is_finite() && lat.abs() <= 90. && lon.abs() <= 180.
    }

    pub fn is_valid(&self) -> bool {
        self.has_valid_accuracy() && self.has_valid_position()
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude(),
            longitude: self.longitude(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

#[test]
fn position_axes() {
    let fix = LocationFix::new(37.0, -122.0, 5., Utc::now());
    assert_eq!(fix.position.x(), -122.0);
    assert_eq!(fix.latitude(), 37.0);
    assert_eq!(fix.coordinate(), Coordinate::new(37.0, -122.0));
}

#[test]
fn accuracy_validity() {
    assert!(LocationFix::new(0., 0., 0.1, Utc::now()).is_valid());
    assert!(!LocationFix::new(0., 0., 0., Utc::now()).is_valid());
    assert!(!LocationFix::new(0., 0., -1., Utc::now()).is_valid());
    assert!(!LocationFix::new(0., 0., f64::NAN, Utc::now()).is_valid());
}

#[test]
fn position_validity() {
    assert!(LocationFix::new(90., -180., 5., Utc::now()).has_valid_position());
    assert!(!LocationFix::new(f64::NAN, -122., 5., Utc::now()).has_valid_position());
    assert!(!LocationFix::new(37., f64::INFINITY, 5., Utc::now()).has_valid_position());
    assert!(!LocationFix::new(90.5, 10., 5., Utc::now()).has_valid_position());
    assert!(!LocationFix::new(10., -180.1, 5., Utc::now()).is_valid());
}

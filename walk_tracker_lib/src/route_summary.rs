use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{location_fix::Coordinate, walk_session::WalkSession};

/// Smallest span (degrees) a region may have on either axis. Roughly 1 km of latitude.
pub const MIN_SPAN_DEGREES: f64 = 0.009;

/// Extra room above and below the route, so the toolbar covering the top of the map does not hide it.
pub const LATITUDE_PADDING: f64 = 1.3;
pub const LONGITUDE_PADDING: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSpan {
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub center: Coordinate,
    pub span: CoordinateSpan,
}

/// The padded rectangle covering every fix of the walk, or `None` when there are no fixes.
pub fn bounding_region(session: &WalkSession) -> Option<MapRegion> {
    let (first, rest) = session.samples().split_first()?;

    let mut min_latitude = first.latitude();
    let mut max_latitude = first.latitude();
    let mut min_longitude = first.longitude();
    let mut max_longitude = first.longitude();

    for fix in rest {
        min_latitude = min_latitude.min(fix.latitude());
        max_latitude = max_latitude.max(fix.latitude());
        min_longitude = min_longitude.min(fix.longitude());
        max_longitude = max_longitude.max(fix.longitude());
    }

    let center = Coordinate::new(
        (min_latitude + max_latitude) / 2.,
        (min_longitude + max_longitude) / 2.,
    );

    let span = CoordinateSpan {
        latitude_delta: ((max_latitude - min_latitude) * LATITUDE_PADDING).max(MIN_SPAN_DEGREES),
        longitude_delta: ((max_longitude - min_longitude) * LONGITUDE_PADDING).max(MIN_SPAN_DEGREES),
    };

    Some(MapRegion { center, span })
}

/// The route as a polyline, in the order the fixes were recorded.
pub fn path(session: &WalkSession) -> Vec<Coordinate> {
    session.samples().iter().map(|fix| fix.coordinate()).collect()
}

/// Everything a map or a log line needs to show a walk.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub region: Option<MapRegion>,
    pub path: Vec<Coordinate>,
    pub distance: f64,
    pub duration: Option<TimeDelta>,
}

impl RouteSummary {
    pub fn of(session: &WalkSession) -> Self {
        Self {
            region: bounding_region(session),
            path: path(session),
            distance: session.total_distance(),
            duration: session.duration().ok(),
        }
    }

    /// Human readable distance, e.g. `850.0 m` or `2.4 km`
    pub fn distance_text(&self) -> String {
        if self.distance >= 1000. {
            format!("{:.1} km", self.distance / 1000.)
        } else {
            format!("{:.1} m", self.distance)
        }
    }

    pub fn duration_text(&self) -> String {
        let Some(duration) = self.duration else {
            return "-".into();
        };
        let secs = duration.num_seconds().max(0);
        format!("{:02}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::location_fix::LocationFix;

    fn walk(points: &[(f64, f64)]) -> WalkSession {
        let mut session = WalkSession::new();
        session.start().unwrap();
        for (lat, lon) in points {
            session.ingest(LocationFix::new(*lat, *lon, 5., Utc::now()));
        }
        session
    }

    #[test]
    fn empty_walk_has_no_region() {
        assert_eq!(bounding_region(&WalkSession::new()), None);
        assert_eq!(bounding_region(&walk(&[])), None);
        assert!(path(&walk(&[])).is_empty());
    }

    #[test]
    fn single_fix_is_centered_with_floor_span() {
        let region = bounding_region(&walk(&[(37.0, -122.0)])).unwrap();
        assert_eq!(region.center, Coordinate::new(37.0, -122.0));
        assert_eq!(region.span.latitude_delta, MIN_SPAN_DEGREES);
        assert_eq!(region.span.longitude_delta, MIN_SPAN_DEGREES);
    }

    #[test]
    fn padded_region() {
        let region = bounding_region(&walk(&[(37.0, -122.0), (37.1, -121.8), (36.9, -122.1)])).unwrap();
        assert!((region.center.latitude - 37.0).abs() < 1e-9);
        assert!((region.center.longitude - -121.95).abs() < 1e-9);
        assert!((region.span.latitude_delta - 0.2 * 1.3).abs() < 1e-9);
        assert!((region.span.longitude_delta - 0.3 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn longitude_maximum_uses_longitudes() {
        // Latitude grows while longitude shrinks; comparing longitude with latitude would miss the east edge.
        let region = bounding_region(&walk(&[(10.0, 20.0), (10.5, 19.0), (11.0, 19.5)])).unwrap();
        assert!((region.center.longitude - 19.5).abs() < 1e-9);
        assert!((region.span.longitude_delta - 1.1).abs() < 1e-9);
    }

    #[test]
    fn path_keeps_insertion_order() {
        let session = walk(&[(37.0, -122.0), (37.001, -122.0), (36.5, -121.0)]);
        assert_eq!(
            path(&session),
            vec![
                Coordinate::new(37.0, -122.0),
                Coordinate::new(37.001, -122.0),
                Coordinate::new(36.5, -121.0),
            ]
        );
    }

    #[test]
    fn summary_text() {
        let mut summary = RouteSummary::of(&walk(&[(37.0, -122.0), (37.001, -122.0)]));
        assert!(summary.distance_text().ends_with(" m"));
        summary.distance = 2400.;
        assert_eq!(summary.distance_text(), "2.4 km");
        summary.duration = Some(TimeDelta::seconds(3725));
        assert_eq!(summary.duration_text(), "01h 02m 05s");
        summary.duration = None;
        assert_eq!(summary.duration_text(), "-");
    }
}

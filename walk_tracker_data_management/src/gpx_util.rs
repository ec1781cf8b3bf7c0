use std::{fs::File, io::{BufReader, BufWriter}, path::Path};

use chrono::{DateTime, TimeDelta, Utc};
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use walk_tracker_lib::{location_fix::LocationFix, walk_session::WalkSession};

use crate::DataManagerError;

/// Meters of horizontal error per unit of HDOP. Rough figure for consumer GPS receivers.
pub const HDOP_METERS: f64 = 5.0;

/// Reads every track point of a GPX file as location fixes.
///
/// Accuracy comes from the point's HDOP when present, otherwise `default_accuracy` is used.
/// Points without a time are stamped one second after the previous point.
pub fn read_gpx(path: &Path, default_accuracy: f64) -> Result<Vec<LocationFix>, DataManagerError> {
    let file = File::open(path)
        .map_err(|err| DataManagerError::Io(format!("Failed to open {:?}: {}", path, err)))?;
    let gpx = gpx::read(BufReader::new(file))
        .map_err(|err| DataManagerError::Gpx(format!("Failed to parse {:?}: {}", path, err)))?;

    let mut time = match gpx.metadata.as_ref().and_then(|meta| meta.time.as_ref()) {
        Some(t) => parse_time(t)?,
        None => DateTime::UNIX_EPOCH,
    };

    let mut fixes = Vec::new();
    for track in gpx.tracks {
        for segment in track.segments {
            for point in segment.points {
                time = match &point.time {
                    Some(t) => parse_time(t)?,
                    None if fixes.is_empty() => time,
                    None => time + TimeDelta::seconds(1),
                };

                let accuracy = point.hdop.map_or(default_accuracy, |hdop| hdop * HDOP_METERS);
                let position = point.point();
                fixes.push(LocationFix::new(position.y(), position.x(), accuracy, time));
            }
        }
    }

    tracing::debug!("Read {} fixes from {:?}", fixes.len(), path);
    Ok(fixes)
}

/// Writes the walk's fixes as a single GPX track.
pub fn write_gpx(path: &Path, name: &str, session: &WalkSession) -> Result<(), DataManagerError> {
    let mut segment = TrackSegment::new();
    for fix in session.samples() {
        let mut waypoint = Waypoint::new(fix.position);
        waypoint.time = Some(to_gpx_time(fix.timestamp)?);
        waypoint.hdop = Some(fix.horizontal_accuracy / HDOP_METERS);
        segment.points.push(waypoint);
    }

    let mut track = Track::new();
    track.name = Some(name.to_string());
    track.segments.push(segment);

    let gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("walk_tracker".into()),
        tracks: vec![track],
        ..Default::default()
    };

    let file = File::create(path)
        .map_err(|err| DataManagerError::Io(format!("Failed to create {:?}: {}", path, err)))?;
    gpx::write(&gpx, BufWriter::new(file))
        .map_err(|err| DataManagerError::Gpx(format!("Failed to write {:?}: {}", path, err)))
}

fn parse_time(time: &gpx::Time) -> Result<DateTime<Utc>, DataManagerError> {
    let text = time.format().map_err(|err| DataManagerError::Gpx(err.to_string()))?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|err| DataManagerError::Gpx(format!("Bad timestamp {text}: {err}")))
}

fn to_gpx_time(timestamp: DateTime<Utc>) -> Result<gpx::Time, DataManagerError> {
    let nanos = timestamp.timestamp_nanos_opt()
        .ok_or_else(|| DataManagerError::Gpx(format!("Timestamp out of range: {timestamp}")))?;
    time::OffsetDateTime::from_unix_timestamp_nanos(nanos as i128)
        .map(gpx::Time::from)
        .map_err(|err| DataManagerError::Gpx(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::TimeZone;

    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Lake loop</name>
    <trkseg>
      <trkpt lat="56.1500" lon="10.2000"><time>2024-06-01T07:00:00Z</time><hdop>1.2</hdop></trkpt>
      <trkpt lat="56.1510" lon="10.2005"><time>2024-06-01T07:00:10Z</time></trkpt>
      <trkpt lat="56.1520" lon="10.2010"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn read_sample() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let fixes = read_gpx(file.path(), 5.).unwrap();
        assert_eq!(fixes.len(), 3);
        assert_eq!(fixes[0].latitude(), 56.15);
        assert_eq!(fixes[0].longitude(), 10.2);
        assert!((fixes[0].horizontal_accuracy - 6.).abs() < 1e-9);
        assert_eq!(fixes[1].horizontal_accuracy, 5.);
        assert_eq!(fixes[1].timestamp, Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 10).unwrap());
        assert_eq!(fixes[2].timestamp, Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 11).unwrap());
    }

    #[test]
    fn exported_walk_reads_back() {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap();
        let mut session = WalkSession::new();
        session.start_at(t0).unwrap();
        session.ingest(LocationFix::new(37.0, -122.0, 5., t0));
        session.ingest(LocationFix::new(37.001, -122.0, 10., t0 + TimeDelta::seconds(30)));
        session.stop(false).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk.gpx");
        write_gpx(&path, "Morning walk", &session).unwrap();

        let fixes = read_gpx(&path, 1.).unwrap();
        assert_eq!(fixes.len(), 2);
        assert!((fixes[1].latitude() - 37.001).abs() < 1e-9);
        assert!(fixes[1].is_valid());
        assert_eq!(fixes[1].timestamp, t0 + TimeDelta::seconds(30));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(read_gpx(Path::new("does/not/exist.gpx"), 5.), Err(DataManagerError::Io(_))));
    }
}

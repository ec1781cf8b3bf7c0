use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::surfaces::VoiceSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "phone")]
#[command(about = "Walk tracker phone app, driven by a simulated wearable", long_about = None)]
pub struct Config {
    /// GPX route to replay as location fixes
    #[arg(long, env = "WALK_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Milliseconds between replayed fixes
    #[arg(long, env = "WALK_REPLAY_INTERVAL_MS", default_value_t = 1000)]
    pub replay_interval_ms: u64,

    /// Accuracy in meters for replayed points without HDOP
    #[arg(long, default_value_t = 5.0)]
    pub default_accuracy: f64,

    /// Closed walks are written here as GPX
    #[arg(long, env = "WALK_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    #[arg(long, env = "WALK_LOG_DIR", default_value = "phone/log")]
    pub log_dir: PathBuf,

    #[arg(long, default_value = "en-GB")]
    pub voice_language: String,

    #[arg(long, default_value_t = 0.5)]
    pub speech_rate: f32,

    /// Seconds between the wearable's start and stop presses
    #[arg(long, default_value_t = 10)]
    pub walk_secs: u64,
}

impl Config {
    pub fn voice(&self) -> VoiceSettings {
        VoiceSettings {
            language: self.voice_language.clone(),
            rate: self.speech_rate,
        }
    }

    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.replay_interval_ms)
    }

    pub fn walk_duration(&self) -> Duration {
        Duration::from_secs(self.walk_secs)
    }
}

#[test]
fn defaults() {
    let config = Config::try_parse_from(["phone"]).unwrap();
    assert_eq!(config.voice(), VoiceSettings::default());
    assert_eq!(config.default_accuracy, 5.0);
    assert_eq!(config.walk_duration(), Duration::from_secs(10));
}

#[test]
fn overrides() {
    let config = Config::try_parse_from([
        "phone",
        "--replay", "route.gpx",
        "--replay-interval-ms", "250",
        "--voice-language", "da-DK",
        "--speech-rate", "0.8",
    ]).unwrap();

    assert_eq!(config.replay, Some(PathBuf::from("route.gpx")));
    assert_eq!(config.replay_interval(), Duration::from_millis(250));
    assert_eq!(config.voice().language, "da-DK");
    assert_eq!(config.voice().rate, 0.8);
}

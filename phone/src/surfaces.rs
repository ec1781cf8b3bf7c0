use walk_tracker_lib::{location_fix::Coordinate, route_summary::MapRegion};

/// Whatever draws the map.
pub trait DisplaySurface: Send {
    fn center_on(&mut self, coordinate: Coordinate);
    fn show_route(&mut self, region: Option<MapRegion>, path: &[Coordinate]);
    fn clear(&mut self);
}

/// Fire-and-forget text to speech.
pub trait SpeechSurface: Send {
    fn speak(&mut self, utterance: Utterance);
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    /// BCP 47 language tag, e.g. `en-GB`
    pub language: String,
    pub rate: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            language: "en-GB".into(),
            rate: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: VoiceSettings,
}

impl Utterance {
    pub fn new(text: &str, voice: &VoiceSettings) -> Self {
        Self {
            text: text.to_string(),
            voice: voice.clone(),
        }
    }
}

/// Logs what a map would show.
#[derive(Debug, Default)]
pub struct TracingDisplay {
    drawn_points: usize,
}

impl DisplaySurface for TracingDisplay {
    fn center_on(&mut self, coordinate: Coordinate) {
        tracing::info!("Map centered on {:.6}, {:.6}", coordinate.latitude, coordinate.longitude);
    }

    fn show_route(&mut self, region: Option<MapRegion>, path: &[Coordinate]) {
        // Only log when the route actually grew or shrank
        if path.len() == self.drawn_points {
            return;
        }
        self.drawn_points = path.len();

        match region {
            Some(region) => tracing::info!(
                "Route of {} points, region {:.6}, {:.6} spanning {:.4} x {:.4} degrees",
                path.len(),
                region.center.latitude,
                region.center.longitude,
                region.span.latitude_delta,
                region.span.longitude_delta
            ),
            None => tracing::info!("Route is empty"),
        }
    }

    fn clear(&mut self) {
        self.drawn_points = 0;
        tracing::info!("Map overlays removed");
    }
}

#[derive(Debug, Default)]
pub struct TracingSpeech;

impl SpeechSurface for TracingSpeech {
    fn speak(&mut self, utterance: Utterance) {
        tracing::info!(
            language = %utterance.voice.language,
            rate = utterance.voice.rate,
            "Speaking: {}",
            utterance.text
        );
    }
}

//! Decorative animation/video pairs keyed by condition label.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Animation {
    Sun,
    Cloud,
    Rain,
    Snow,
    Stormy,
}

impl Animation {
    /// Asset name of the animation file (without extension).
    pub fn asset(&self) -> &'static str {
        match self {
            Animation::Sun => "sun",
            Animation::Cloud => "cloud",
            Animation::Rain => "rain",
            Animation::Snow => "snow",
            Animation::Stormy => "stormy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Video {
    Sunny,
    Cloudy,
    Rainy,
    Snow,
    Stormy,
}

impl Video {
    pub fn asset(&self) -> &'static str {
        match self {
            Video::Sunny => "sunny_video2",
            Video::Cloudy => "cloudy_video",
            Video::Rainy => "rainy_video2",
            Video::Snow => "snow_video",
            Video::Stormy => "stormy_video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scene {
    pub animation: Animation,
    pub video: Video,
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.animation.asset(), self.video.asset())
    }
}

pub const CLEAR: Scene = Scene {
    animation: Animation::Sun,
    video: Video::Sunny,
};

const CLOUDY: Scene = Scene {
    animation: Animation::Cloud,
    video: Video::Cloudy,
};

const RAINY: Scene = Scene {
    animation: Animation::Rain,
    video: Video::Rainy,
};

const SNOWY: Scene = Scene {
    animation: Animation::Snow,
    video: Video::Snow,
};

const STORMY: Scene = Scene {
    animation: Animation::Stormy,
    video: Video::Stormy,
};

const SCENES: &[(&[&str], Scene)] = &[
    (&["clear sky", "sunny", "clear"], CLEAR),
    (&["partly clouds", "clouds", "overcast", "mist", "foggy"], CLOUDY),
    (
        &["light rain", "drizzle", "moderate rain", "showers", "heavy rain", "rain"],
        RAINY,
    ),
    (
        &["light snow", "moderate snow", "heavy snow", "blizzard", "snow"],
        SNOWY,
    ),
    (
        &["storm", "stormy", "thunderstorm", "lightning", "thunder"],
        STORMY,
    ),
];

/// Pick the scene for a condition label. Unknown labels get the clear scene.
///
/// Matching ignores case and surrounding whitespace. Only the spellings in
/// the table count: "Light Show"/"Moderate Show" are not snow labels and fall
/// back to clear.
pub fn scene_for(condition: &str) -> Scene {
    let label = condition.trim().to_lowercase();

    SCENES
        .iter()
        .find(|(labels, _)| labels.contains(&label.as_str()))
        .map(|(_, scene)| *scene)
        .unwrap_or(CLEAR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Off,
    All,
}

/// Playback state of the decorative layer behind the readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backdrop {
    pub scene: Scene,
    pub video_repeat: Repeat,
    pub video_playing: bool,
    pub animation_playing: bool,
}

impl Backdrop {
    /// Video loops forever; both layers start immediately.
    pub fn playing(scene: Scene) -> Self {
        Self {
            scene,
            video_repeat: Repeat::All,
            video_playing: true,
            animation_playing: true,
        }
    }
}

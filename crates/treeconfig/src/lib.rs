use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Upper bound of the ornament slider.
pub const MAX_ORNAMENTS: u32 = 150;
/// Upper bound of the gift slider.
pub const MAX_GIFTS: u32 = 80;
/// Upper bound of the "photos hanging on the tree" slider.
pub const MAX_PHOTO_CAP: u32 = 50;
/// Hard cap on how many files a single selection may ingest.
pub const MAX_UPLOAD_FILES: usize = 50;
/// Longest accepted upload step delay or frame step.
pub const MAX_STEP_DELAY: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_AUDIO_SOURCE: &str =
    "https://www.chosic.com/wp-content/uploads/2021/11/We-Wish-You-A-Merry-Christmas.mp3";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneConfig {
    pub version: u32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub counts: Counts,
    #[serde(default)]
    pub colors: SceneColors,
    #[serde(default)]
    pub motion: Motion,
    #[serde(default)]
    pub formation: FormationShape,
    #[serde(default)]
    pub upload: UploadTimings,
    #[serde(default)]
    pub audio: AudioDefaults,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: 1,
            seed: default_seed(),
            counts: Counts::default(),
            colors: SceneColors::default(),
            motion: Motion::default(),
            formation: FormationShape::default(),
            upload: UploadTimings::default(),
            audio: AudioDefaults::default(),
        }
    }
}

/// Object counts the formation generator and display subset honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Counts {
    pub ornaments: u32,
    pub gifts: u32,
    pub max_photos: u32,
}

impl Default for Counts {
    fn default() -> Self {
        Self {
            ornaments: 60,
            gifts: 30,
            max_photos: 10,
        }
    }
}

impl Counts {
    /// Builds a validated count set, as the configuration sliders would.
    pub fn new(ornaments: u32, gifts: u32, max_photos: u32) -> Result<Self, ConfigError> {
        let counts = Self {
            ornaments,
            gifts,
            max_photos,
        };
        counts.validate()?;
        Ok(counts)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ornaments > MAX_ORNAMENTS {
            return Err(ConfigError::Invalid(format!(
                "counts.ornaments must be within 0..={MAX_ORNAMENTS}, got {}",
                self.ornaments
            )));
        }
        if self.gifts > MAX_GIFTS {
            return Err(ConfigError::Invalid(format!(
                "counts.gifts must be within 0..={MAX_GIFTS}, got {}",
                self.gifts
            )));
        }
        if self.max_photos == 0 || self.max_photos > MAX_PHOTO_CAP {
            return Err(ConfigError::Invalid(format!(
                "counts.max_photos must be within 1..={MAX_PHOTO_CAP}, got {}",
                self.max_photos
            )));
        }
        Ok(())
    }
}

/// An sRGB colour written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalised `[r, g, b]` in 0.0–1.0.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| format!("colour '{trimmed}' must start with '#'"))?;
        if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(format!("colour '{trimmed}' must be '#rrggbb'"));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|err| format!("colour '{trimmed}': {err}"))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneColors {
    pub bottom: Rgb,
    pub top: Rgb,
}

impl Default for SceneColors {
    fn default() -> Self {
        Self {
            bottom: Rgb::new(0x02, 0x2b, 0x1c),
            top: Rgb::new(0x21, 0x7a, 0x46),
        }
    }
}

/// Tuning for the mix easing and pointer mapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Motion {
    /// Exponential approach rate of the current mix, per second.
    pub easing_rate: f32,
    /// Longest frame delta the easing will integrate in one tick.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub max_frame_step: Duration,
    /// Horizontal gain applied to gesture positions relative to vertical.
    pub pointer_scale_x: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            easing_rate: 4.0,
            max_frame_step: Duration::from_millis(100),
            pointer_scale_x: 1.2,
        }
    }
}

/// Dimensions of the assembled tree and the dispersed cloud.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FormationShape {
    pub tree_height: f32,
    pub tree_radius: f32,
    pub scatter_radius: f32,
}

impl Default for FormationShape {
    fn default() -> Self {
        Self {
            tree_height: 14.0,
            tree_radius: 5.5,
            scatter_radius: 18.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadTimings {
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub ingest_delay: Duration,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub settle_delay: Duration,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub return_delay: Duration,
    pub max_files: usize,
}

impl Default for UploadTimings {
    fn default() -> Self {
        Self {
            ingest_delay: Duration::from_millis(50),
            settle_delay: Duration::from_millis(1200),
            return_delay: Duration::from_millis(800),
            max_files: MAX_UPLOAD_FILES,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioDefaults {
    pub source: String,
    pub volume: f32,
    pub looped: bool,
}

impl Default for AudioDefaults {
    fn default() -> Self {
        Self {
            source: DEFAULT_AUDIO_SOURCE.to_string(),
            volume: 0.3,
            looped: true,
        }
    }
}

fn default_seed() -> u64 {
    0x5eed_7ee
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            seconds(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(Visitor)
}

/// Parses a duration the same way configuration files do.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return seconds(value).map_err(|err| format!("duration '{trimmed}': {err}"));
    }
    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{trimmed}': {err}"))
}

fn seconds(value: f64) -> Result<Duration, String> {
    if value.is_sign_negative() {
        return Err("duration must be non-negative".into());
    }
    Duration::try_from_secs_f64(value).map_err(|err| format!("{value} seconds: {err}"))
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        self.counts.validate()?;

        let motion = &self.motion;
        if !(motion.easing_rate.is_finite() && motion.easing_rate > 0.0) {
            return Err(ConfigError::Invalid(
                "motion.easing_rate must be a positive number".into(),
            ));
        }
        if motion.max_frame_step.is_zero() {
            return Err(ConfigError::Invalid(
                "motion.max_frame_step must be greater than zero".into(),
            ));
        }
        check_step_delay("motion.max_frame_step", motion.max_frame_step)?;
        if !(motion.pointer_scale_x.is_finite() && motion.pointer_scale_x > 0.0) {
            return Err(ConfigError::Invalid(
                "motion.pointer_scale_x must be a positive number".into(),
            ));
        }

        let shape = &self.formation;
        for (name, value) in [
            ("tree_height", shape.tree_height),
            ("tree_radius", shape.tree_radius),
            ("scatter_radius", shape.scatter_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "formation.{name} must be a positive number"
                )));
            }
        }

        if self.upload.max_files == 0 || self.upload.max_files > MAX_UPLOAD_FILES {
            return Err(ConfigError::Invalid(format!(
                "upload.max_files must be within 1..={MAX_UPLOAD_FILES}"
            )));
        }
        check_step_delay("upload.ingest_delay", self.upload.ingest_delay)?;
        check_step_delay("upload.settle_delay", self.upload.settle_delay)?;
        check_step_delay("upload.return_delay", self.upload.return_delay)?;

        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(ConfigError::Invalid(
                "audio.volume must be within 0.0..=1.0".into(),
            ));
        }
        if self.audio.source.trim().is_empty() {
            return Err(ConfigError::Invalid("audio.source may not be empty".into()));
        }

        Ok(())
    }
}

fn check_step_delay(name: &str, value: Duration) -> Result<(), ConfigError> {
    if value > MAX_STEP_DELAY {
        return Err(ConfigError::Invalid(format!(
            "{name} must be at most {}, got {}",
            humantime::format_duration(MAX_STEP_DELAY),
            humantime::format_duration(value)
        )));
    }
    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use mixer::{GestureSample, MixTarget, SceneController};
use serde::{Deserialize, Deserializer};
use treeconfig::Counts;

/// Timed input events replayed against a scene.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptEvent {
    /// Scene time at which the event fires.
    #[serde(deserialize_with = "deserialize_at")]
    pub at: Duration,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Action {
    Toggle,
    Target {
        value: u8,
    },
    Gesture {
        open: bool,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
    },
    GestureLost,
    /// Select images. `count` adds generated names after `files`.
    Upload {
        #[serde(default)]
        files: Vec<PathBuf>,
        #[serde(default)]
        count: usize,
    },
    Delete {
        uri: String,
    },
    Audio {
        file: PathBuf,
    },
    Mute,
    Interact,
    Counts {
        ornaments: u32,
        gifts: u32,
        max_photos: u32,
    },
    Signature {
        text: String,
    },
}

fn deserialize_at<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    treeconfig::parse_duration(&raw).map_err(serde::de::Error::custom)
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read script at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("failed to parse script at {}", path.display()))
    }

    /// Parses and orders events by time; events sharing a time keep file order.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let mut script: Script = toml::from_str(input)?;
        script.events.sort_by_key(|event| event.at);
        Ok(script)
    }

    /// Time of the last event, zero for an empty script.
    pub fn end(&self) -> Duration {
        self.events.last().map_or(Duration::ZERO, |event| event.at)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// Hands out script events as scene time passes.
#[derive(Debug)]
pub struct ScriptPlayer {
    script: Script,
    next: usize,
}

impl ScriptPlayer {
    pub fn new(script: Script) -> Self {
        Self { script, next: 0 }
    }

    /// Events due at or before `elapsed` that have not fired yet.
    pub fn take_due(&mut self, elapsed: Duration) -> &[ScriptEvent] {
        let start = self.next;
        while self
            .script
            .events
            .get(self.next)
            .is_some_and(|event| event.at <= elapsed)
        {
            self.next += 1;
        }
        &self.script.events[start..self.next]
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.script.events.len()
    }
}

impl Action {
    /// Applies the event. Rejected events are logged and skipped.
    pub fn apply(&self, scene: &mut SceneController, now: Instant) {
        match self {
            Action::Toggle => {
                let target = scene.toggle();
                tracing::debug!(target = target.as_u8(), "script toggle");
            }
            Action::Target { value } => match MixTarget::try_from(*value) {
                Ok(target) => {
                    scene.set_target(target);
                }
                Err(err) => tracing::warn!(%err, "ignoring script target"),
            },
            Action::Gesture { open, x, y } => {
                scene.on_gesture(GestureSample::hand(*open, *x, *y));
            }
            Action::GestureLost => scene.on_gesture(GestureSample::lost()),
            Action::Upload { files, count } => {
                let mut selection = files.clone();
                selection.extend((0..*count).map(|i| PathBuf::from(format!("photo-{i:03}.jpg"))));
                if !scene.select_photos(selection, now) {
                    tracing::debug!("script upload selected no files");
                }
            }
            Action::Delete { uri } => {
                if let Err(err) = scene.delete_photo(uri) {
                    tracing::warn!(%err, "ignoring script delete");
                }
            }
            Action::Audio { file } => scene.select_audio(file),
            Action::Mute => {
                let muted = scene.toggle_mute();
                tracing::debug!(muted, "script mute toggle");
            }
            Action::Interact => scene.interact(),
            Action::Counts {
                ornaments,
                gifts,
                max_photos,
            } => {
                let counts = Counts {
                    ornaments: *ornaments,
                    gifts: *gifts,
                    max_photos: *max_photos,
                };
                if let Err(err) = scene.set_counts(counts) {
                    tracing::warn!(%err, "ignoring script counts");
                }
            }
            Action::Signature { text } => scene.set_signature(text),
        }
    }
}

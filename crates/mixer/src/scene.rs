use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use formation::DisplaySubset;
use serde::Serialize;
use treeconfig::{Counts, SceneColors, SceneConfig};

use crate::audio::{AmbientAudio, AudioSink, AudioStatus};
use crate::mix::{MixController, MixState, MixTarget, TargetSource};
use crate::photos::{PhotoSet, ResourceRegistry, ResourceUri};
use crate::pointer::{GestureSample, PointerCell, PointerSample};
use crate::upload::{UploadEffect, UploadPhase, UploadSequence};

/// Longest signature the polaroid card accepts.
pub const SIGNATURE_MAX_CHARS: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("no photo with uri '{0}'")]
    UnknownPhoto(String),
    #[error(transparent)]
    Config(#[from] treeconfig::ConfigError),
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub frame: u64,
    pub mix_factor: f32,
    pub target: MixTarget,
    pub pointer: PointerSample,
    pub colors: SceneColors,
    /// Photos currently hanging on the tree (the display subset).
    pub photos: Vec<ResourceUri>,
    pub total_photos: usize,
    pub ornament_count: u32,
    pub gift_count: u32,
    pub signature_text: String,
    pub processing: bool,
    pub upload_phase: UploadPhase,
    pub audio: AudioStatus,
}

/// Reconciles UI, gesture, and upload inputs against one mix state.
///
/// All methods run on the event loop thread. [`SceneController::advance`]
/// is the frame tick; every other method is an input event.
pub struct SceneController {
    counts: Counts,
    pointer_scale_x: f32,
    mix: MixController,
    pointer: PointerCell,
    photos: PhotoSet,
    subset: DisplaySubset<ResourceUri>,
    registry: ResourceRegistry,
    upload: UploadSequence,
    audio: AmbientAudio,
    interacted: bool,
    last_frame: Option<Instant>,
    frame: u64,
    /// Reused between frames; photos are recopied only when the display
    /// subset key changes.
    published: SceneSnapshot,
    published_photos: Option<(u64, usize)>,
}

impl SceneController {
    pub fn new(config: &SceneConfig, sink: Box<dyn AudioSink>) -> Self {
        let audio = AmbientAudio::new(sink, &config.audio);
        let published = SceneSnapshot {
            frame: 0,
            mix_factor: 1.0,
            target: MixTarget::Assembled,
            pointer: PointerSample::default(),
            colors: config.colors,
            photos: Vec::new(),
            total_photos: 0,
            ornament_count: config.counts.ornaments,
            gift_count: config.counts.gifts,
            signature_text: String::new(),
            processing: false,
            upload_phase: UploadPhase::Idle,
            audio: audio.status(),
        };
        Self {
            counts: config.counts,
            pointer_scale_x: config.motion.pointer_scale_x,
            mix: MixController::new(
                MixTarget::Assembled,
                config.motion.easing_rate,
                config.motion.max_frame_step,
            ),
            pointer: PointerCell::new(),
            photos: PhotoSet::new(),
            subset: DisplaySubset::new(config.seed),
            registry: ResourceRegistry::new(),
            upload: UploadSequence::new(config.upload.clone()),
            audio,
            interacted: false,
            last_frame: None,
            frame: 0,
            published,
            published_photos: None,
        }
    }

    /// Handle to the pointer slot; reading it never blocks the writer.
    pub fn pointer(&self) -> PointerCell {
        self.pointer.clone()
    }

    pub fn mix_state(&self) -> MixState {
        self.mix.state()
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn photos(&self) -> &PhotoSet {
        &self.photos
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn upload_phase(&self) -> UploadPhase {
        self.upload.phase()
    }

    pub fn is_processing(&self) -> bool {
        self.upload.is_processing()
    }

    pub fn has_interacted(&self) -> bool {
        self.interacted
    }

    pub fn audio_status(&self) -> AudioStatus {
        self.audio.status()
    }

    /// First-interaction latch: unlocks audio.
    pub fn interact(&mut self) {
        if self.interacted {
            return;
        }
        self.interacted = true;
        tracing::debug!("first user interaction");
        self.audio.unlock();
        self.published.audio = self.audio.status();
    }

    /// The dispersed/assembled button.
    pub fn toggle(&mut self) -> MixTarget {
        self.interact();
        self.mix.toggle_target(TargetSource::Ui)
    }

    pub fn set_target(&mut self, target: MixTarget) -> bool {
        self.interact();
        self.mix.set_target(target, TargetSource::Ui)
    }

    /// Gesture adapter callback; cheap enough to call at camera rate.
    pub fn on_gesture(&mut self, sample: GestureSample) {
        if !sample.detected {
            self.pointer.deactivate();
            return;
        }
        self.interact();
        let wanted = if sample.open {
            MixTarget::Dispersed
        } else {
            MixTarget::Assembled
        };
        if wanted != self.mix.target() {
            self.mix.set_target(wanted, TargetSource::Gesture);
        }
        self.pointer.set(PointerSample {
            x: sample.x * self.pointer_scale_x,
            y: sample.y,
            active: true,
        });
    }

    /// A completed image selection. Returns `false` for an empty selection.
    pub fn select_photos(&mut self, files: Vec<PathBuf>, now: Instant) -> bool {
        if !files.is_empty() {
            self.interact();
        }
        if !self.upload.begin(files, now) {
            return false;
        }
        self.mix.set_target(MixTarget::Dispersed, TargetSource::Upload);
        true
    }

    pub fn delete_photo(&mut self, uri: &str) -> Result<(), SceneError> {
        self.interact();
        let entry = self
            .photos
            .remove(uri)
            .ok_or_else(|| SceneError::UnknownPhoto(uri.to_string()))?;
        let file = self.registry.release(&entry.uri);
        tracing::info!(
            uri,
            file = ?file,
            remaining = self.photos.len(),
            "photo removed"
        );
        Ok(())
    }

    pub fn select_audio(&mut self, file: &Path) {
        let uri = self.registry.mint(file);
        tracing::info!(file = %file.display(), %uri, "ambient audio replaced");
        self.interacted = true;
        let previous = self.audio.select(uri);
        self.registry.release(&previous);
        self.published.audio = self.audio.status();
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.interacted = true;
        let muted = self.audio.toggle_mute();
        self.published.audio = self.audio.status();
        muted
    }

    pub fn set_counts(&mut self, counts: Counts) -> Result<(), SceneError> {
        self.interact();
        counts.validate()?;
        if counts != self.counts {
            tracing::debug!(?counts, "object counts changed");
            self.counts = counts;
        }
        Ok(())
    }

    pub fn set_signature(&mut self, text: &str) {
        let signature = &mut self.published.signature_text;
        signature.clear();
        signature.extend(text.chars().take(SIGNATURE_MAX_CHARS));
    }

    /// Frame tick: fires due upload steps, then eases the mix once.
    pub fn advance(&mut self, now: Instant) -> f32 {
        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);

        while let Some(effect) = self.upload.poll(now) {
            self.apply_upload(effect);
        }

        self.frame += 1;
        self.mix.tick(dt)
    }

    /// Brings the published snapshot up to date and borrows it. Between
    /// photo changes this does not allocate.
    pub fn snapshot(&mut self) -> &SceneSnapshot {
        let key = (self.photos.revision(), self.counts.max_photos as usize);
        if self.published_photos != Some(key) {
            let subset = self.subset.resolve(key.0, self.photos.uris(), key.1);
            self.published.photos.clear();
            self.published.photos.extend_from_slice(subset);
            self.published_photos = Some(key);
        }

        let mix = self.mix.state();
        let published = &mut self.published;
        published.frame = self.frame;
        published.mix_factor = mix.current;
        published.target = mix.target;
        published.pointer = self.pointer.get();
        published.total_photos = self.photos.len();
        published.ornament_count = self.counts.ornaments;
        published.gift_count = self.counts.gifts;
        published.processing = self.upload.is_processing();
        published.upload_phase = self.upload.phase();
        &self.published
    }

    fn apply_upload(&mut self, effect: UploadEffect) {
        match effect {
            UploadEffect::Ingest(files) => {
                let registry = &mut self.registry;
                let added = self
                    .photos
                    .extend(files.iter().map(|path| registry.mint(path)));
                tracing::info!(added, total = self.photos.len(), "photos ingested");
            }
            UploadEffect::Settled => {
                tracing::debug!("upload processing finished");
            }
            UploadEffect::Return => {
                self.mix.set_target(MixTarget::Assembled, TargetSource::Upload);
            }
        }
    }
}

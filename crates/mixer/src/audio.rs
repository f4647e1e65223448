use serde::Serialize;
use treeconfig::AudioDefaults;

use crate::photos::ResourceUri;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("playback rejected: {0}")]
    Rejected(String),
    #[error("audio source unavailable: {0}")]
    Unavailable(String),
}

/// The single ambient audio element, as provided by the host.
pub trait AudioSink {
    fn configure(&mut self, volume: f32, looped: bool);
    /// Re-points the element; any current playback stops.
    fn set_source(&mut self, source: &str);
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
}

/// Sink that only tracks state. `reject_playback` simulates an autoplay
/// policy refusing to start.
#[derive(Debug, Default)]
pub struct NullSink {
    pub source: String,
    pub volume: f32,
    pub looped: bool,
    pub playing: bool,
    pub reject_playback: bool,
    pub play_attempts: u32,
}

impl NullSink {
    pub fn rejecting() -> Self {
        Self {
            reject_playback: true,
            ..Self::default()
        }
    }
}

impl AudioSink for NullSink {
    fn configure(&mut self, volume: f32, looped: bool) {
        self.volume = volume;
        self.looped = looped;
    }

    fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
        self.playing = false;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.play_attempts += 1;
        if self.reject_playback {
            return Err(PlaybackError::Rejected(
                "autoplay is not allowed before user interaction".into(),
            ));
        }
        if self.source.is_empty() {
            return Err(PlaybackError::Unavailable("no source set".into()));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioStatus {
    pub source: String,
    pub muted: bool,
    pub playing: bool,
    pub unlocked: bool,
}

/// Mute/unlock bookkeeping around one [`AudioSink`].
///
/// Nothing plays until [`AmbientAudio::unlock`] has been called once; every
/// playback failure is logged and dropped.
pub struct AmbientAudio {
    sink: Box<dyn AudioSink>,
    source: ResourceUri,
    muted: bool,
    unlocked: bool,
}

impl AmbientAudio {
    pub fn new(mut sink: Box<dyn AudioSink>, defaults: &AudioDefaults) -> Self {
        sink.configure(defaults.volume, defaults.looped);
        sink.set_source(&defaults.source);
        Self {
            sink,
            source: ResourceUri::External(defaults.source.clone()),
            muted: false,
            unlocked: false,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn source(&self) -> &ResourceUri {
        &self.source
    }

    /// First user interaction of any kind. Later calls do nothing.
    pub fn unlock(&mut self) {
        if self.unlocked {
            return;
        }
        self.unlocked = true;
        tracing::debug!("audio unlocked by first interaction");
        self.sync();
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.unlocked = true;
        self.muted = !self.muted;
        self.sync();
        self.muted
    }

    /// Points the element at `source`, resuming playback if it was running.
    /// Returns the previous source so the caller can release it.
    pub fn replace_source(&mut self, source: ResourceUri) -> ResourceUri {
        let was_playing = self.sink.is_playing();
        self.sink.set_source(source.as_str());
        let previous = std::mem::replace(&mut self.source, source);
        if was_playing && !self.muted {
            self.try_play();
        }
        previous
    }

    /// A freshly selected audio file: switch to it, unlock and unmute.
    pub fn select(&mut self, source: ResourceUri) -> ResourceUri {
        let previous = self.replace_source(source);
        self.unlocked = true;
        self.muted = false;
        self.sync();
        previous
    }

    pub fn status(&self) -> AudioStatus {
        AudioStatus {
            source: self.source.as_str().to_string(),
            muted: self.muted,
            playing: self.sink.is_playing(),
            unlocked: self.unlocked,
        }
    }

    fn sync(&mut self) {
        if !self.unlocked {
            return;
        }
        if self.muted {
            self.sink.pause();
        } else if !self.sink.is_playing() {
            self.try_play();
        }
    }

    fn try_play(&mut self) {
        if let Err(err) = self.sink.play() {
            tracing::debug!(%err, "ambient playback did not start; ignoring");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(sink: NullSink) -> AmbientAudio {
        AmbientAudio::new(Box::new(sink), &AudioDefaults::default())
    }

    #[test]
    fn never_plays_before_interaction() {
        let mut audio = audio(NullSink::default());
        assert!(!audio.status().playing);
        let previous = audio.replace_source(ResourceUri::External("other.mp3".into()));
        assert_eq!(previous.as_str(), treeconfig::DEFAULT_AUDIO_SOURCE);
        assert!(!audio.status().playing);
    }

    #[test]
    fn unlock_starts_playback_once() {
        let mut audio = audio(NullSink::default());
        audio.unlock();
        assert!(audio.status().playing);
        audio.unlock();
        assert!(audio.status().unlocked);
    }

    #[test]
    fn mute_pauses_and_resumes() {
        let mut audio = audio(NullSink::default());
        audio.unlock();
        assert!(audio.toggle_mute());
        assert!(!audio.status().playing);
        assert!(!audio.toggle_mute());
        assert!(audio.status().playing);
    }

    #[test]
    fn source_change_resumes_when_playing() {
        let mut audio = audio(NullSink::default());
        audio.unlock();
        audio.replace_source(ResourceUri::External("carol.mp3".into()));
        let status = audio.status();
        assert_eq!(status.source, "carol.mp3");
        assert!(status.playing);
    }

    #[test]
    fn rejected_playback_is_swallowed() {
        let mut audio = audio(NullSink::rejecting());
        audio.unlock();
        let status = audio.status();
        assert!(status.unlocked);
        assert!(!status.playing);
        assert!(!status.muted);
    }

    #[test]
    fn selecting_a_file_unmutes() {
        let mut audio = audio(NullSink::default());
        audio.toggle_mute();
        assert!(audio.is_muted());
        audio.select(ResourceUri::External("mine.mp3".into()));
        let status = audio.status();
        assert!(!status.muted);
        assert!(status.playing);
        assert_eq!(status.source, "mine.mp3");
    }
}

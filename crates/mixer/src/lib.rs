//! Scene state for the interactive tree: the eased mix between the
//! dispersed and assembled formations, and the inputs that drive it.
//!
//! Three writers share one target. The UI toggle and the hand tracker set it
//! directly; the photo upload sequence forces a dispersal and schedules the
//! return. Whoever writes last wins, and the renderer only ever reads the
//! eased value.

mod audio;
mod mix;
mod photos;
mod pointer;
mod scene;
mod upload;

pub use audio::{AmbientAudio, AudioSink, AudioStatus, NullSink, PlaybackError};
pub use mix::{MixController, MixState, MixTarget, TargetSource};
pub use photos::{GalleryEntry, PhotoSet, ResourceRegistry, ResourceUri, LOCAL_SCHEME};
pub use pointer::{GestureSample, PointerCell, PointerSample};
pub use scene::{SceneController, SceneError, SceneSnapshot, SIGNATURE_MAX_CHARS};
pub use upload::{UploadEffect, UploadPhase, UploadSequence};

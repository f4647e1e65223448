//! Formation generation for the tree scene.
//!
//! Every object in the scene (ornament, gift, photo frame) owns two poses: an
//! *assembled* pose on the cone-shaped tree and a *dispersed* pose somewhere in
//! the scatter sphere. The renderer blends between them with the mix factor.
//! [`DisplaySubset`] picks which uploaded photos actually hang on the tree.

mod layout;
mod subset;

pub use layout::{Formation, FormationParams, ObjectClass, Placement, Pose};
pub use subset::{select_display_subset, DisplaySubset};

//! CPU side of the tree renderer.
//!
//! [`SceneRenderer`] turns a [`SceneSnapshot`] into one [`InstanceRaw`] per
//! object: it owns the formation layout, blends every object between its
//! dispersed and assembled pose, and adds the pointer sway. Uploading the
//! records and drawing them belongs to whichever GPU backend hosts the scene.

mod instances;
mod runtime;
mod timeline;
mod types;

use bytemuck::Zeroable;
use formation::{Formation, FormationParams, ObjectClass};
use glam::{EulerRot, Quat, Vec2};
use mixer::{PointerSample, ResourceUri, SceneSnapshot};

use crate::timeline::staggered_progress;

pub use instances::InstanceRaw;
pub use runtime::{
    time_source_for, BoxedTimeSource, FixedStepTimeSource, SystemTimeSource, TimeSample,
    TimeSource,
};
pub use types::{CrossfadeCurve, SceneRendererConfig};

#[derive(Debug, Clone, PartialEq)]
struct LayoutKey {
    ornaments: u32,
    gifts: u32,
    photos: Vec<ResourceUri>,
}

impl LayoutKey {
    fn matches(&self, snapshot: &SceneSnapshot) -> bool {
        self.ornaments == snapshot.ornament_count
            && self.gifts == snapshot.gift_count
            && self.photos == snapshot.photos
    }
}

pub struct SceneRenderer {
    config: SceneRendererConfig,
    layout: Option<LayoutKey>,
    formation: Formation,
    instances: Vec<InstanceRaw>,
    sway: Vec2,
    regenerations: u64,
}

impl SceneRenderer {
    pub fn new(config: SceneRendererConfig) -> Self {
        Self {
            config,
            layout: None,
            formation: Formation::default(),
            instances: Vec::new(),
            sway: Vec2::ZERO,
            regenerations: 0,
        }
    }

    pub fn config(&self) -> &SceneRendererConfig {
        &self.config
    }

    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    /// How many times the layout has been rebuilt.
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    /// Instance records from the last [`SceneRenderer::frame`].
    pub fn instances(&self) -> &[InstanceRaw] {
        &self.instances
    }

    /// Computes this frame's instance records. Only a change in the counts
    /// or the displayed photo list reallocates.
    pub fn frame(&mut self, snapshot: &SceneSnapshot) -> &[InstanceRaw] {
        self.ensure_layout(snapshot);
        self.ease_pointer(snapshot.pointer);

        let mix = snapshot.mix_factor.clamp(0.0, 1.0);
        let spread = 1.0 - mix;
        let influence = self.config.pointer_influence * spread;
        let sway = Quat::from_euler(
            EulerRot::YXZ,
            self.sway.x * influence,
            self.sway.y * influence,
            0.0,
        );
        let height = self.config.tree_height.max(f32::EPSILON);

        for (raw, placement) in self
            .instances
            .iter_mut()
            .zip(self.formation.placements())
        {
            let progress =
                staggered_progress(self.config.curve, mix, placement.phase, self.config.stagger);
            let pose = placement.dispersed.lerp(&placement.assembled, progress);
            raw.position = (sway * pose.position).to_array();
            raw.rotation = pose.rotation.to_array();
            raw.color = instances::tint(
                placement.class,
                &snapshot.colors,
                placement.assembled.position.y / height + 0.5,
            );
        }
        &self.instances
    }

    fn ensure_layout(&mut self, snapshot: &SceneSnapshot) {
        if self
            .layout
            .as_ref()
            .is_some_and(|layout| layout.matches(snapshot))
        {
            return;
        }

        let params = FormationParams {
            ornaments: snapshot.ornament_count as usize,
            gifts: snapshot.gift_count as usize,
            photos: snapshot.photos.len(),
            tree_height: self.config.tree_height,
            tree_radius: self.config.tree_radius,
            scatter_radius: self.config.scatter_radius,
            seed: self.config.seed,
        };
        self.formation = Formation::generate(&params);
        self.instances.clear();
        self.instances.extend(self.formation.placements().iter().map(|placement| {
            InstanceRaw {
                scale: placement.scale,
                class_id: placement.class.id(),
                slot: placement.index as u32,
                ..InstanceRaw::zeroed()
            }
        }));
        self.layout = Some(LayoutKey {
            ornaments: snapshot.ornament_count,
            gifts: snapshot.gift_count,
            photos: snapshot.photos.clone(),
        });
        self.regenerations += 1;
        tracing::debug!(
            instances = self.instances.len(),
            photos = params.photos,
            regenerations = self.regenerations,
            "rebuilt scene layout"
        );
    }

    /// Eases towards the live pointer, or back to rest once the hand is gone.
    fn ease_pointer(&mut self, pointer: PointerSample) {
        let target = if pointer.active {
            Vec2::new(pointer.x, pointer.y)
        } else {
            Vec2::ZERO
        };
        let smoothing = self.config.pointer_smoothing.clamp(f32::EPSILON, 1.0);
        self.sway += (target - self.sway) * smoothing;
    }

    /// Number of photo frames in the current layout.
    pub fn photo_slots(&self) -> usize {
        self.formation.of_class(ObjectClass::Photo).count()
    }
}

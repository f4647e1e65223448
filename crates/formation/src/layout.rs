use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::prelude::*;
use rand::rngs::StdRng;

const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Kind of object occupying a slot in the formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Ornament,
    Gift,
    Photo,
}

impl ObjectClass {
    /// Stable numeric id used in GPU instance records.
    pub fn id(self) -> u32 {
        match self {
            Self::Ornament => 0,
            Self::Gift => 1,
            Self::Photo => 2,
        }
    }

    fn salt(self) -> u64 {
        match self {
            Self::Ornament => 0x6f72_6e61,
            Self::Gift => 0x6769_6674,
            Self::Photo => 0x7068_6f74,
        }
    }
}

/// Position plus Euler rotation (radians, XYZ order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Pose {
    /// Linear blend from `self` (t = 0) towards `other` (t = 1).
    pub fn lerp(&self, other: &Pose, t: f32) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.lerp(other.rotation, t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub class: ObjectClass,
    /// Index within its class; for photos this is the display-subset slot.
    pub index: usize,
    pub assembled: Pose,
    pub dispersed: Pose,
    pub scale: f32,
    /// Per-object stagger phase in `[0, 1)`; later phases start moving later.
    pub phase: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormationParams {
    pub ornaments: usize,
    pub gifts: usize,
    pub photos: usize,
    pub tree_height: f32,
    pub tree_radius: f32,
    pub scatter_radius: f32,
    pub seed: u64,
}

impl Default for FormationParams {
    fn default() -> Self {
        Self {
            ornaments: 60,
            gifts: 30,
            photos: 0,
            tree_height: 14.0,
            tree_radius: 5.5,
            scatter_radius: 18.0,
            seed: 0,
        }
    }
}

/// Both formations for every object, ordered ornaments, gifts, then photos.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Formation {
    placements: Vec<Placement>,
}

impl Formation {
    /// Builds the layout. Each class draws from its own seeded stream, so
    /// changing the photo count never moves an ornament.
    pub fn generate(params: &FormationParams) -> Self {
        let mut placements =
            Vec::with_capacity(params.ornaments + params.gifts + params.photos);

        let mut rng = class_rng(params.seed, ObjectClass::Ornament);
        for index in 0..params.ornaments {
            placements.push(ornament(params, index, &mut rng));
        }

        let mut rng = class_rng(params.seed, ObjectClass::Gift);
        for index in 0..params.gifts {
            placements.push(gift(params, index, &mut rng));
        }

        let mut rng = class_rng(params.seed, ObjectClass::Photo);
        for index in 0..params.photos {
            placements.push(photo(params, index, &mut rng));
        }

        tracing::debug!(
            ornaments = params.ornaments,
            gifts = params.gifts,
            photos = params.photos,
            seed = params.seed,
            "generated formation"
        );

        Self { placements }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn of_class(&self, class: ObjectClass) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(move |p| p.class == class)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

fn class_rng(seed: u64, class: ObjectClass) -> StdRng {
    StdRng::seed_from_u64(seed ^ class.salt())
}

fn base_y(params: &FormationParams) -> f32 {
    -params.tree_height * 0.5
}

/// Radius of the cone surface at height fraction `t` (0 = base, 1 = apex).
fn cone_radius(params: &FormationParams, t: f32) -> f32 {
    params.tree_radius * (1.0 - t.clamp(0.0, 1.0))
}

fn ornament(params: &FormationParams, index: usize, rng: &mut StdRng) -> Placement {
    let t = (index as f32 + 0.5) / params.ornaments as f32;
    let radius = cone_radius(params, t) * rng.gen_range(0.85..1.0);
    let theta = index as f32 * GOLDEN_ANGLE + rng.gen_range(-0.15..0.15);
    let position = Vec3::new(
        radius * theta.cos(),
        base_y(params) + t * params.tree_height,
        radius * theta.sin(),
    );
    Placement {
        class: ObjectClass::Ornament,
        index,
        assembled: Pose {
            position,
            rotation: Vec3::new(0.0, -theta, 0.0),
        },
        dispersed: scatter_pose(params, rng),
        scale: rng.gen_range(0.6..1.0),
        phase: rng.gen_range(0.0..1.0),
    }
}

fn gift(params: &FormationParams, index: usize, rng: &mut StdRng) -> Placement {
    // Gifts pile up around the lower third and spill onto the floor ring.
    let t = rng.gen_range(0.0..0.3);
    let radius = cone_radius(params, t) * rng.gen_range(0.6..1.05);
    let theta = rng.gen_range(0.0..TAU);
    let lift = if index % 3 == 0 { 0.0 } else { t * params.tree_height };
    let position = Vec3::new(
        radius * theta.cos(),
        base_y(params) + lift,
        radius * theta.sin(),
    );
    Placement {
        class: ObjectClass::Gift,
        index,
        assembled: Pose {
            position,
            rotation: Vec3::new(0.0, rng.gen_range(0.0..TAU), 0.0),
        },
        dispersed: scatter_pose(params, rng),
        scale: rng.gen_range(0.8..1.4),
        phase: rng.gen_range(0.0..1.0),
    }
}

fn photo(params: &FormationParams, index: usize, rng: &mut StdRng) -> Placement {
    let t = 0.1 + 0.8 * (index as f32 + 0.5) / params.photos as f32;
    let turns = 2.5 * TAU / params.photos.max(1) as f32;
    let theta = index as f32 * turns + rng.gen_range(-0.1..0.1);
    // Frames hang just outside the cone so they never clip into it.
    let radius = cone_radius(params, t) + 0.6;
    let position = Vec3::new(
        radius * theta.cos(),
        base_y(params) + t * params.tree_height,
        radius * theta.sin(),
    );
    Placement {
        class: ObjectClass::Photo,
        index,
        assembled: Pose {
            position,
            rotation: Vec3::new(0.0, PI * 0.5 - theta, rng.gen_range(-0.12..0.12)),
        },
        dispersed: scatter_pose(params, rng),
        scale: 1.0,
        phase: rng.gen_range(0.0..1.0),
    }
}

/// Uniform point inside the scatter sphere with a random orientation.
fn scatter_pose(params: &FormationParams, rng: &mut StdRng) -> Pose {
    let direction = loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let length_sq = candidate.length_squared();
        if length_sq > 1e-6 && length_sq <= 1.0 {
            break candidate / length_sq.sqrt();
        }
    };
    let distance = params.scatter_radius * rng.gen::<f32>().cbrt();
    Pose {
        position: direction * distance,
        rotation: Vec3::new(
            rng.gen_range(0.0..TAU),
            rng.gen_range(0.0..TAU),
            rng.gen_range(0.0..TAU),
        ),
    }
}

use treeconfig::SceneConfig;

/// Easing applied to each object's own share of the mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossfadeCurve {
    Linear,
    #[default]
    Smoothstep,
    EaseInOut,
}

/// Immutable configuration passed to the scene renderer at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRendererConfig {
    pub tree_height: f32,
    pub tree_radius: f32,
    pub scatter_radius: f32,
    /// Seed for the formation layout; same seed, same tree.
    pub seed: u64,
    /// Fraction of the mix range over which object start times are spread.
    /// Zero moves every object in lockstep.
    pub stagger: f32,
    /// Radians of sway per unit of pointer offset while dispersed.
    pub pointer_influence: f32,
    /// Per-frame blend towards the latest pointer, in (0, 1].
    pub pointer_smoothing: f32,
    pub curve: CrossfadeCurve,
}

impl Default for SceneRendererConfig {
    fn default() -> Self {
        Self {
            tree_height: 14.0,
            tree_radius: 5.5,
            scatter_radius: 18.0,
            seed: 0,
            stagger: 0.35,
            pointer_influence: 0.6,
            pointer_smoothing: 0.15,
            curve: CrossfadeCurve::default(),
        }
    }
}

impl From<&SceneConfig> for SceneRendererConfig {
    fn from(config: &SceneConfig) -> Self {
        Self {
            tree_height: config.formation.tree_height,
            tree_radius: config.formation.tree_radius,
            scatter_radius: config.formation.scatter_radius,
            seed: config.seed,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_shape_and_seed_from_scene_config() {
        let mut scene = SceneConfig::default();
        scene.seed = 42;
        scene.formation.tree_height = 20.0;
        let config = SceneRendererConfig::from(&scene);
        assert_eq!(config.seed, 42);
        assert_eq!(config.tree_height, 20.0);
        assert_eq!(config.stagger, SceneRendererConfig::default().stagger);
    }
}

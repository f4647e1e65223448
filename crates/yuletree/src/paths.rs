use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;
use treeconfig::SceneConfig;

pub const ENV_CONFIG_DIR: &str = "YULETREE_CONFIG_DIR";
pub const SCENE_FILE: &str = "scene.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Yuletree";
const APPLICATION: &str = "yuletree";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn scene_file(&self) -> PathBuf {
        self.config_dir.join(SCENE_FILE)
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Explicit(PathBuf),
    Discovered(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit(path) | Self::Discovered(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// `--config`, else `scene.toml` in the config directory, else defaults.
pub fn load_scene_config(
    explicit: Option<&Path>,
    paths: &AppPaths,
) -> Result<(SceneConfig, ConfigOrigin)> {
    if let Some(path) = explicit {
        let config = read_scene_config(path)?;
        return Ok((config, ConfigOrigin::Explicit(path.to_path_buf())));
    }
    let discovered = paths.scene_file();
    if discovered.is_file() {
        let config = read_scene_config(&discovered)?;
        return Ok((config, ConfigOrigin::Discovered(discovered)));
    }
    tracing::debug!(path = %discovered.display(), "no scene config found; using defaults");
    Ok((SceneConfig::default(), ConfigOrigin::Defaults))
}

pub fn read_scene_config(path: &Path) -> Result<SceneConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene config at {}", path.display()))?;
    SceneConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load scene config at {}", path.display()))
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

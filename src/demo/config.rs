use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::input::{default_bindings, DepthAction, KeyBind};
use crate::curve::hilbert::DEFAULT_MAX_DEPTH;
use crate::curve::palette::PaletteMode;

/// Settings read from `settings.toml`. Every field has a default, so a
/// partial file (or none at all) is fine. The file is never written back.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub shaders: ShaderConfig,
    pub curve: CurveConfig,
    pub key_bindings: HashMap<DepthAction, KeyBind>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    pub max_depth: u32,
    pub palette: PaletteMode,
    /// Seed for the random palette; fresh colors every run when unset.
    pub seed: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shaders: ShaderConfig::default(),
            curve: CurveConfig::default(),
            key_bindings: default_bindings(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Hilbert Curve".to_string(),
            width: 512,
            height: 512,
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("data/vertex.wgsl"),
            fragment: PathBuf::from("data/fragment.wgsl"),
        }
    }
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            palette: PaletteMode::Cycle,
            seed: None,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hilbert-view")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
}

impl DemoConfig {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => {
                    log::info!("loaded settings from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config {}: {e}. Using defaults.", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.fill_missing_bindings();
        config
    }

    /// A `[key_bindings]` table that names only one action keeps the default
    /// key for the other.
    fn fill_missing_bindings(&mut self) {
        for (action, bind) in default_bindings() {
            self.key_bindings.entry(action).or_insert(bind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::hilbert::{CurveState, DEPTH_CEILING};
    use std::io::Write;
    use winit::keyboard::KeyCode;

    #[test]
    fn test_default_config() {
        let config = DemoConfig::default();
        assert_eq!(config.window.width, 512);
        assert_eq!(config.window.height, 512);
        assert_eq!(config.shaders.vertex, PathBuf::from("data/vertex.wgsl"));
        assert_eq!(config.shaders.fragment, PathBuf::from("data/fragment.wgsl"));
        assert_eq!(config.curve.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.curve.palette, PaletteMode::Cycle);
        assert_eq!(config.key_bindings.len(), DepthAction::all().len());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = DemoConfig::default();
        let serialized = toml::to_string_pretty(&config).expect("serialize");
        let deserialized: DemoConfig = toml::from_str(&serialized).expect("deserialize");
        assert_eq!(deserialized.window.title, config.window.title);
        assert_eq!(deserialized.shaders.vertex, config.shaders.vertex);
        assert_eq!(deserialized.curve.max_depth, config.curve.max_depth);
        assert_eq!(deserialized.key_bindings, config.key_bindings);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "[curve]\nmax_depth = 6\npalette = \"random\"\nseed = 7\n\n[key_bindings]\nIncreaseDepth = \"PageUp\""
        )
        .expect("write");

        let config = DemoConfig::load_from(file.path());
        assert_eq!(config.curve.max_depth, 6);
        assert_eq!(config.curve.palette, PaletteMode::Random);
        assert_eq!(config.curve.seed, Some(7));
        assert_eq!(config.window.width, 512);
        assert_eq!(config.key_bindings[&DepthAction::IncreaseDepth].code, KeyCode::PageUp);
        assert_eq!(config.key_bindings[&DepthAction::DecreaseDepth].code, KeyCode::ArrowDown);
    }

    #[test]
    fn test_too_deep_max_depth_is_capped_by_curve() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[curve]\nmax_depth = 13").expect("write");
        let config = DemoConfig::load_from(file.path());
        assert_eq!(config.curve.max_depth, 13);
        let curve = CurveState::new(config.curve.max_depth);
        assert_eq!(curve.max_depth(), DEPTH_CEILING);
    }

    #[test]
    fn test_bad_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[curve\nmax_depth = ").expect("write");
        let config = DemoConfig::load_from(file.path());
        assert_eq!(config.curve.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DemoConfig::load_from(&dir.path().join("settings.toml"));
        assert_eq!(config.window.title, "Hilbert Curve");
    }
}

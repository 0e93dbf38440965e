//! Overlay configuration, loaded from YAML.
//!
//! Every field has a default, so an empty document is a valid config.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Grey, red, green, blue.
pub const DEFAULT_PALETTE: [[f32; 3]; 4] = [
    [0.7, 0.7, 0.7],
    [1.0, 0.5, 0.5],
    [0.5, 1.0, 0.5],
    [0.5, 0.5, 1.0],
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Outer width and depth in world units.
    pub size: f32,
    pub divisions: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 100.0,
            divisions: 100,
        }
    }
}

/// Optional icon image paths. Missing or unreadable images fall back to
/// generated placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub light: Option<PathBuf>,
    pub camera: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub grid: GridConfig,
    pub palette: [[f32; 3]; 4],
    pub icons: IconConfig,
    /// Master switch state after late initialization.
    pub start_active: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            palette: DEFAULT_PALETTE,
            icons: IconConfig::default(),
            start_active: true,
        }
    }
}

impl DebugConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file. Relative icon paths resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&source)?;
        if let Some(dir) = path.parent() {
            for icon in [&mut config.icons.light, &mut config.icons.camera] {
                if let Some(p) = icon.as_mut().filter(|p| p.is_relative()) {
                    *p = dir.join(&*p);
                }
            }
        }
        tracing::debug!(path = %path.display(), "loaded debug config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.divisions == 0 {
            return Err(ConfigError::NoDivisions);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = DebugConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, DebugConfig::default());
        assert_eq!(config.grid.divisions, 100);
        assert!(config.start_active);
    }

    #[test]
    fn partial_override() {
        let config = DebugConfig::from_yaml_str(
            "grid:\n  divisions: 20\nstart_active: false\n",
        )
        .unwrap();
        assert_eq!(config.grid.divisions, 20);
        assert_eq!(config.grid.size, 100.0);
        assert!(!config.start_active);
        assert_eq!(config.palette, DEFAULT_PALETTE);
    }

    #[test]
    fn zero_divisions_rejected() {
        let err = DebugConfig::from_yaml_str("grid:\n  divisions: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::NoDivisions));
    }

    #[test]
    fn malformed_yaml_rejected() {
        assert!(matches!(
            DebugConfig::from_yaml_str("grid: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn load_resolves_icon_paths_next_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "icons:\n  light: icons/light.png").unwrap();

        let config = DebugConfig::load(&path).unwrap();
        assert_eq!(
            config.icons.light.as_deref(),
            Some(dir.path().join("icons/light.png").as_path())
        );
        assert!(config.icons.camera.is_none());
    }

    #[test]
    fn load_missing_file() {
        let err = DebugConfig::load("/nonexistent/debug.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

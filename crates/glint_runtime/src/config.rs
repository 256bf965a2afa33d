//! Engine configuration
//!
//! Read from `glint.toml` (or any TOML string). Every field has a default, so
//! an empty file is a valid configuration.

use std::fs;
use std::path::Path;

use glint_core::{GlintError, Result};
use serde::{Deserialize, Serialize};

/// Default configuration file name
pub const CONFIG_FILE: &str = "glint.toml";

/// Runtime settings for one engine
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames per second for the background render loop
    pub target_fps: u32,
    /// Report unknown property ids as errors instead of skipping them
    pub strict_properties: bool,
    /// Initial capacity of the atlas texture table
    pub atlas_initial_capacity: usize,
    /// Log a frame summary once per second of frames
    pub log_frame_stats: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            strict_properties: false,
            atlas_initial_capacity: 16,
            log_frame_stats: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| GlintError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| GlintError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("EngineConfig: {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GlintError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.target_fps == 0 || self.target_fps > 1000 {
            return Err(GlintError::Config(format!(
                "target_fps must be between 1 and 1000, got {}",
                self.target_fps
            )));
        }
        Ok(())
    }

    /// Length of one frame at `target_fps`
    pub fn frame_duration(&self) -> std::time::Duration {
        std::time::Duration::from_micros(1_000_000 / self.target_fps.max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            target_fps = 120
            strict_properties = true
            "#,
        )
        .unwrap();
        assert_eq!(config.target_fps, 120);
        assert!(config.strict_properties);
        assert_eq!(config.atlas_initial_capacity, 16);
        assert_eq!(config.frame_duration().as_micros(), 8333);
    }

    #[test]
    fn test_rejects_zero_fps() {
        assert!(matches!(
            EngineConfig::from_toml_str("target_fps = 0"),
            Err(GlintError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(matches!(
            EngineConfig::from_toml_str("target_fps = \"fast\""),
            Err(GlintError::Config(_))
        ));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = EngineConfig {
            log_frame_stats: true,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = Path::new("definitely/not/here/glint.toml");
        assert_eq!(
            EngineConfig::load_or_default(path).unwrap(),
            EngineConfig::default()
        );
    }
}

//! Assembly configuration: catalog, palette, quotas and optimizer knobs

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::brick::{BrickCatalog, BrickSize, Palette};
use crate::core::{Error, Result};

/// Default colour index (bright red in the classic palette)
pub const DEFAULT_COLOR_ID: usize = 2;

/// Iteration cap of each auto-optimize loop
pub const DEFAULT_MAX_OPTIMIZE_STEPS: usize = 50;

/// Split-then-merge rounds of the manual shake operations
pub const DEFAULT_SHAKE_ROUNDS: usize = 10;

/// Maximum number of bricks of one footprint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickLimit {
    pub size: BrickSize,
    pub max: usize,
}

/// Configuration for a brick model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Footprints merges and cuts may produce
    pub catalog: BrickCatalog,
    /// Colours bricks may have
    pub palette: Palette,
    /// Palette index given to every new brick
    pub default_color: usize,
    /// Per-footprint quotas; footprints not listed are unlimited
    pub brick_limits: Vec<BrickLimit>,
    /// Random seed for candidate selection (0 = seed from the clock)
    pub seed: u64,
    /// Iteration cap of the auto-optimize loops (the connectivity loop uses twice this)
    pub max_optimize_steps: usize,
    /// Rounds of the manual split-then-merge shake operations
    pub shake_rounds: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            catalog: BrickCatalog::classic(),
            palette: Palette::classic(),
            default_color: DEFAULT_COLOR_ID,
            brick_limits: Vec::new(),
            seed: 0,
            max_optimize_steps: DEFAULT_MAX_OPTIMIZE_STEPS,
            shake_rounds: DEFAULT_SHAKE_ROUNDS,
        }
    }
}

impl AssemblyConfig {
    /// Default configuration with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Builder-style quota
    pub fn with_limit(mut self, size: BrickSize, max: usize) -> Self {
        self.brick_limits.retain(|l| l.size != size);
        self.brick_limits.push(BrickLimit { size, max });
        self
    }

    /// Reject configurations the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.catalog.is_empty() {
            return Err(Error::Config("brick catalog is empty".to_string()));
        }
        if !self.catalog.contains(BrickSize::UNIT) {
            return Err(Error::Config("brick catalog must contain the 1x1 footprint".to_string()));
        }
        for size in self.catalog.iter() {
            if size.width < 1 || size.width > size.length {
                return Err(Error::Config(format!("footprint {} is not normalized", size)));
            }
        }
        if self.palette.is_empty() {
            return Err(Error::Config("palette is empty".to_string()));
        }
        if self.default_color >= self.palette.len() {
            return Err(Error::Config(format!(
                "default colour {} is outside the {}-colour palette",
                self.default_color,
                self.palette.len()
            )));
        }
        for limit in &self.brick_limits {
            if !self.catalog.contains(limit.size) {
                return Err(Error::Config(format!(
                    "limit set for {} which is not in the catalog",
                    limit.size
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: AssemblyConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AssemblyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_color, 2);
        assert_eq!(config.max_optimize_steps, 50);
        assert!(config.brick_limits.is_empty());
    }

    #[test]
    fn test_limits() {
        let config = AssemblyConfig::with_seed(1)
            .with_limit(BrickSize::new(2, 4), 10)
            .with_limit(BrickSize::new(4, 2), 3);
        assert_eq!(config.brick_limits.len(), 1);
        assert_eq!(config.brick_limits[0], BrickLimit { size: BrickSize::new(2, 4), max: 3 });
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let mut config = AssemblyConfig::default();
        config.default_color = 9;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = AssemblyConfig {
            catalog: BrickCatalog::new([BrickSize::new(1, 2)]),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AssemblyConfig::default().with_limit(BrickSize::new(3, 3), 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assembly.json");

        let config = AssemblyConfig::with_seed(99).with_limit(BrickSize::new(1, 8), 4);
        config.save(&path).unwrap();
        let loaded = AssemblyConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AssemblyConfig = serde_json::from_str(r#"{ "seed": 5 }"#).unwrap();
        assert_eq!(config.seed, 5);
        assert_eq!(config.catalog, BrickCatalog::classic());
        assert_eq!(config.shake_rounds, DEFAULT_SHAKE_ROUNDS);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AssemblyConfig::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

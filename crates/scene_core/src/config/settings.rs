//! # Scene Configuration
//!
//! Tunables for the transform hierarchy, the bounding-volume tree and logging.
//! Every section has defaults, so a partial file (or an empty one) is valid.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::logging::LevelFilter;
use crate::scene::DestroyPolicy;

/// Deepest tree a config may request
pub const MAX_TREE_DEPTH_LIMIT: u32 = 32;

/// # Bounding Tree Configuration
///
/// Controls how far `BoundingVolumeTree::build` may subdivide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingTreeConfig {
    /// Maximum distance from the root to any leaf (root is depth 0)
    pub max_depth: u32,
}

impl Default for BoundingTreeConfig {
    fn default() -> Self {
        Self { max_depth: 10 }
    }
}

impl BoundingTreeConfig {
    /// Builder pattern: Set maximum depth
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth > MAX_TREE_DEPTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "bounding_tree.max_depth {} exceeds limit {}",
                self.max_depth, MAX_TREE_DEPTH_LIMIT
            )));
        }
        Ok(())
    }
}

/// # Hierarchy Configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// What happens to a node's children when the node is destroyed
    pub destroy_policy: DestroyPolicy,
}

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level (`off`, `error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed level filter
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.level)))
    }
}

/// # Scene Configuration
///
/// Root configuration consumed by `SceneManager`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Bounding tree settings
    pub bounding_tree: BoundingTreeConfig,
    /// Hierarchy settings
    pub hierarchy: HierarchyConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl SceneConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bounding_tree.validate()?;
        self.logging.level_filter()?;
        Ok(())
    }
}

impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.bounding_tree.max_depth, 10);
        assert_eq!(config.hierarchy.destroy_policy, DestroyPolicy::DestroySubtree);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SceneConfig::from_toml_str(
            r#"
            [bounding_tree]
            max_depth = 4

            [hierarchy]
            destroy_policy = "reparent_to_grandparent"
            "#,
        )
        .unwrap();

        assert_eq!(config.bounding_tree.max_depth, 4);
        assert_eq!(config.hierarchy.destroy_policy, DestroyPolicy::ReparentToGrandparent);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = SceneConfig::default();
        config.bounding_tree.max_depth = MAX_TREE_DEPTH_LIMIT + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SceneConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_ron_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("scene_core_cfg_{}.ron", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        let config = SceneConfig {
            bounding_tree: BoundingTreeConfig::default().with_max_depth(6),
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = SceneConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            SceneConfig::load_from_file("scene.yaml"),
            Err(ConfigError::Io(_) | ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SceneConfig::default().save_to_file("scene.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}

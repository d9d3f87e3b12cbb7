//! Magazine configuration loaded from defaults, TOML files and environment
//!
//! # TOML Format
//! ```toml
//! total_slots = 50
//! circular = false
//! run_length = 3
//! active_capacity = 40
//! ```
//!
//! Environment variables with the `MAGAZINE_` prefix override file values,
//! e.g. `MAGAZINE_CIRCULAR=true`.

use crate::error::{Error, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Slots in a freshly configured magazine
pub const DEFAULT_TOTAL_SLOTS: usize = 50;

/// Run length requested when none is given
pub const DEFAULT_RUN_LENGTH: usize = 3;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "MAGAZINE";

/// Configuration for a magazine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagazineConfig {
    /// Number of slots in the device
    pub total_slots: usize,
    /// Whether the last visible slot neighbours the first
    pub circular: bool,
    /// Default run length for allocation requests
    pub run_length: usize,
    /// Number of slots, from the front, that take part in allocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_capacity: Option<usize>,
}

impl Default for MagazineConfig {
    fn default() -> Self {
        Self {
            total_slots: DEFAULT_TOTAL_SLOTS,
            circular: false,
            run_length: DEFAULT_RUN_LENGTH,
            active_capacity: None,
        }
    }
}

impl MagazineConfig {
    /// Load configuration: defaults, then `path` (if given), then `MAGAZINE_*`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    pub(crate) fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading magazine config file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| Error::Config(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialise configuration to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("TOML serialise error: {}", e)))
    }

    /// Check the magazine invariants
    pub fn validate(&self) -> Result<()> {
        if self.run_length == 0 {
            return Err(Error::InvalidRunLength(self.run_length));
        }
        if let Some(capacity) = self.active_capacity {
            if capacity > self.total_slots {
                return Err(Error::CapacityOutOfRange {
                    requested: capacity,
                    total: self.total_slots,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MagazineConfig::default();
        assert_eq!(config.total_slots, 50);
        assert!(!config.circular);
        assert_eq!(config.run_length, 3);
        assert_eq!(config.active_capacity, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() -> Result<()> {
        let config = MagazineConfig::from_toml("total_slots = 12\ncircular = true\n")?;
        assert_eq!(config.total_slots, 12);
        assert!(config.circular);
        assert_eq!(config.run_length, DEFAULT_RUN_LENGTH);
        Ok(())
    }

    #[test]
    fn test_toml_round_trip() -> Result<()> {
        let config = MagazineConfig {
            total_slots: 8,
            circular: true,
            run_length: 2,
            active_capacity: Some(6),
        };
        let parsed = MagazineConfig::from_toml(&config.to_toml()?)?;
        assert_eq!(parsed, config);
        Ok(())
    }

    #[test]
    fn test_negative_slot_count_rejected() {
        assert!(matches!(
            MagazineConfig::from_toml("total_slots = -1"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = MagazineConfig {
            run_length: 0,
            ..MagazineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidRunLength(0))));

        let config = MagazineConfig {
            total_slots: 4,
            active_capacity: Some(5),
            ..MagazineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::CapacityOutOfRange {
                requested: 5,
                total: 4
            })
        ));
    }

    #[test]
    fn test_load_file_and_env() -> Result<()> {
        let temp_dir = std::env::temp_dir().join(format!("magazine_config_{}", std::process::id()));
        std::fs::create_dir_all(&temp_dir).map_err(|e| Error::Config(e.to_string()))?;
        let path = temp_dir.join("magazine.toml");
        std::fs::write(&path, "total_slots = 20\nrun_length = 4\n")
            .map_err(|e| Error::Config(e.to_string()))?;

        // A prefix of its own keeps this test away from other tests' variables
        std::env::set_var("MAGTEST_LOAD_CIRCULAR", "true");
        let config = MagazineConfig::load_with_prefix(Some(&path), "MAGTEST_LOAD")?;
        std::env::remove_var("MAGTEST_LOAD_CIRCULAR");

        assert_eq!(config.total_slots, 20);
        assert_eq!(config.run_length, 4);
        assert!(config.circular);

        // Cleanup
        std::fs::remove_dir_all(temp_dir).ok();
        Ok(())
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = std::env::temp_dir().join("magazine_config_does_not_exist.toml");
        assert!(matches!(
            MagazineConfig::load_with_prefix(Some(&path), "MAGTEST_MISSING"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_defaults_without_file() -> Result<()> {
        let config = MagazineConfig::load_with_prefix(None, "MAGTEST_DEFAULTS")?;
        assert_eq!(config, MagazineConfig::default());
        Ok(())
    }
}

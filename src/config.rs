use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

const CONFIG_DIR: &str = "config";
const DEFAULT_MINIMUM_BATCH_SIZE: u32 = 5;
const DEFAULT_MAX_BOM_DEPTH: u32 = 16;
const DEFAULT_SYSTEM_ACTOR: &str = "mrp-engine";

/// Engine configuration.
///
/// `minimum_batch_size` is the replenishment policy floor: assembly-level
/// shortage checks are evaluated against `max(reorder_level, minimum_batch_size)`
/// units so fast-moving assemblies do not generate one-unit requisitions.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MrpConfig {
    #[serde(default = "default_minimum_batch_size")]
    #[validate(range(min = 1))]
    pub minimum_batch_size: u32,

    /// Depth guard for BOM traversal. A path longer than this is treated as
    /// a cycle.
    #[serde(default = "default_max_bom_depth")]
    #[validate(range(min = 1, max = 64))]
    pub max_bom_depth: u32,

    /// Actor name recorded on sweep-generated requisitions and audit entries.
    #[serde(default = "default_system_actor")]
    pub system_actor: String,
}

fn default_minimum_batch_size() -> u32 {
    DEFAULT_MINIMUM_BATCH_SIZE
}

fn default_max_bom_depth() -> u32 {
    DEFAULT_MAX_BOM_DEPTH
}

fn default_system_actor() -> String {
    DEFAULT_SYSTEM_ACTOR.to_string()
}

impl Default for MrpConfig {
    fn default() -> Self {
        Self {
            minimum_batch_size: default_minimum_batch_size(),
            max_bom_depth: default_max_bom_depth(),
            system_actor: default_system_actor(),
        }
    }
}

impl MrpConfig {
    /// Loads configuration from `config/mrp.toml` (when present) layered with
    /// `MRP_*` environment variables, then validates ranges.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let file = Path::new(CONFIG_DIR).join("mrp.toml");
        if file.exists() {
            builder = builder.add_source(File::from(file));
        }

        let cfg: MrpConfig = builder
            .add_source(Environment::with_prefix("MRP"))
            .build()?
            .try_deserialize()?;

        cfg.validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = MrpConfig::default();
        assert_eq!(cfg.minimum_batch_size, 5);
        assert_eq!(cfg.max_bom_depth, 16);
        assert!(cfg.validate().is_ok());
    }
}

use std::path::Path;

use stepwise_common::{Error, Result};
use tracing::info;

use crate::model::StepwiseConfig;

/// Reads [`StepwiseConfig`] from TOML or YAML.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a config file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<StepwiseConfig> {
        let contents = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => Self::from_yaml_str(&contents)?,
            "toml" => Self::from_toml_str(&contents)?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other:?}"
                )));
            }
        };

        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<StepwiseConfig> {
        toml::from_str(contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))
    }

    pub fn from_yaml_str(contents: &str) -> Result<StepwiseConfig> {
        serde_yaml::from_str(contents).map_err(|e| Error::Config(format!("YAML parse error: {e}")))
    }
}

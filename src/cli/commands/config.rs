//! Implementation of the `upgradevisor config` command.

use anyhow::Result;
use std::path::Path;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Effective configuration as printed by `upgradevisor config`.
#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub struct ConfigOutput {
    /// Loaded configuration
    pub config: Config,
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_default()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

/// Load and print the effective configuration.
pub fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    output(&ConfigOutput { config }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_output_formats() {
        let out = ConfigOutput {
            config: Config {
                home: PathBuf::from("/var/lib/noded"),
                daemon_name: "noded".to_string(),
                ..Default::default()
            },
        };

        let yaml = out.to_human();
        assert!(yaml.contains("daemon_name: noded"));
        assert!(yaml.contains("restart_after_upgrade: true"));

        let json = out.to_json();
        assert_eq!(json["home"], "/var/lib/noded");
        assert_eq!(json["logging"]["level"], "info");
    }
}

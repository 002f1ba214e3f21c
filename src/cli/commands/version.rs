//! Implementation of the `upgradevisor version` command.

use crate::cli::output::{output, CommandOutput};

/// Package name and version.
#[derive(Debug, serde::Serialize)]
pub struct VersionOutput {
    pub name: &'static str,
    pub version: &'static str,
}

impl VersionOutput {
    /// Version of this build.
    pub const fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl CommandOutput for VersionOutput {
    fn to_human(&self) -> String {
        format!("{} {}", self.name, self.version)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Print the version.
pub fn execute(json_mode: bool) {
    output(&VersionOutput::current(), json_mode);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_output() {
        let out = VersionOutput::current();
        assert_eq!(out.to_human(), format!("upgradevisor {}", env!("CARGO_PKG_VERSION")));
        assert_eq!(out.to_json()["name"], "upgradevisor");
    }
}

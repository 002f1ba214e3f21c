//! Upgrade descriptors and the markers a daemon prints to request them.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{MarkerError, RunError};

/// File under `<home>/data` where the daemon persists the pending upgrade.
pub const UPGRADE_INFO_FILENAME: &str = "upgrade-info.json";

/// A JSON object line whose first key is `"name"`, the layout of upgrade-info.json.
static JSON_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*\{\s*"name"\s*:"#).expect("JSON marker pattern is valid")
});

/// `UPGRADE "<name>" NEEDED at height: <h>: <info>`
static TEXT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"UPGRADE "(.*)" NEEDED at height: (\d+):\s*(\S*)"#)
        .expect("text marker pattern is valid")
});

/// Upgrade requested by the supervised daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeDescriptor {
    /// Upgrade name, also the directory the new binary is installed under
    pub name: String,

    /// Block height at which the daemon halted
    #[serde(default)]
    pub height: i64,

    /// Opaque info attached to the upgrade plan
    #[serde(default)]
    pub info: String,
}

impl UpgradeDescriptor {
    /// Create a descriptor with empty info.
    pub fn new(name: impl Into<String>, height: i64) -> Self {
        Self {
            name: name.into(),
            height,
            info: String::new(),
        }
    }

    /// A descriptor without a name does not describe an upgrade.
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    /// Decode the contents of an upgrade-info file.
    pub fn from_upgrade_info(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    /// Match one output line against the upgrade markers.
    ///
    /// Returns `Ok(None)` for ordinary lines and for markers with an empty
    /// name. A line that has the shape of a marker but does not decode is an
    /// error.
    pub fn parse_marker(line: &str) -> Result<Option<Self>, MarkerError> {
        if let Some(caps) = TEXT_MARKER.captures(line) {
            let height = caps[2].parse().map_err(|source| MarkerError::Height {
                value: caps[2].to_string(),
                source,
            })?;
            let upgrade = Self {
                name: caps[1].to_string(),
                height,
                info: caps[3].to_string(),
            };
            return Ok(upgrade.is_named().then_some(upgrade));
        }

        if JSON_MARKER.is_match(line) {
            let upgrade: Self = serde_json::from_str(line.trim())?;
            return Ok(upgrade.is_named().then_some(upgrade));
        }

        Ok(None)
    }
}

impl fmt::Display for UpgradeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at height {}", self.name, self.height)
    }
}

/// Which daemon output stream a watcher reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Daemon standard output
    Stdout,
    /// Daemon standard error
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Verdict of one supervised run
#[derive(Debug, Clone)]
pub enum SupervisorOutcome {
    /// The daemon asked for an upgrade and has been stopped
    UpgradeRequested(UpgradeDescriptor),

    /// The daemon exited on its own, with the error if it failed
    ProcessExited(Option<RunError>),
}

impl SupervisorOutcome {
    /// The requested upgrade, if any.
    pub const fn upgrade(&self) -> Option<&UpgradeDescriptor> {
        match self {
            Self::UpgradeRequested(upgrade) => Some(upgrade),
            Self::ProcessExited(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_marker() {
        let upgrade = UpgradeDescriptor::parse_marker(r#"{"name":"v2","height":100}"#)
            .unwrap()
            .unwrap();
        assert_eq!(upgrade, UpgradeDescriptor::new("v2", 100));
    }

    #[test]
    fn test_parse_json_marker_with_info_and_padding() {
        let line = r#"   {"name": "v3", "height": 7, "info": "https://example.com/v3.json"}  "#;
        let upgrade = UpgradeDescriptor::parse_marker(line).unwrap().unwrap();
        assert_eq!(upgrade.name, "v3");
        assert_eq!(upgrade.height, 7);
        assert_eq!(upgrade.info, "https://example.com/v3.json");
    }

    #[test]
    fn test_parse_text_marker() {
        let line = r#"panic: UPGRADE "gaia-v5" NEEDED at height: 4200: {"binaries":{}}"#;
        let upgrade = UpgradeDescriptor::parse_marker(line).unwrap().unwrap();
        assert_eq!(upgrade.name, "gaia-v5");
        assert_eq!(upgrade.height, 4200);
        assert_eq!(upgrade.info, r#"{"binaries":{}}"#);
    }

    #[test]
    fn test_ordinary_lines_are_ignored() {
        for line in [
            "",
            "I[2026-10-15] committed state height=99",
            r#"{"level":"info","msg":"executed block"}"#,
            r#"{"level":"info","name":"p2p","msg":"dialing peer"}"#,
            "UPGRADE soon",
        ] {
            assert!(UpgradeDescriptor::parse_marker(line).unwrap().is_none(), "{line}");
        }
    }

    #[test]
    fn test_empty_name_is_not_an_upgrade() {
        assert!(UpgradeDescriptor::parse_marker(r#"{"name":"","height":3}"#)
            .unwrap()
            .is_none());
        assert!(UpgradeDescriptor::parse_marker(r#"UPGRADE "" NEEDED at height: 3: x"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_marker_is_an_error() {
        let result = UpgradeDescriptor::parse_marker(r#"{"name": "v2", "height": "#);
        assert!(matches!(result, Err(MarkerError::Json(_))));

        let result = UpgradeDescriptor::parse_marker(
            r#"UPGRADE "v2" NEEDED at height: 99999999999999999999999: x"#,
        );
        assert!(matches!(result, Err(MarkerError::Height { .. })));
    }

    #[test]
    fn test_from_upgrade_info() {
        let upgrade =
            UpgradeDescriptor::from_upgrade_info(br#"{"name":"v2","height":100,"info":""}"#)
                .unwrap();
        assert!(upgrade.is_named());
        assert_eq!(upgrade.to_string(), "v2 at height 100");
    }

    #[test]
    fn test_outcome_upgrade_accessor() {
        let outcome = SupervisorOutcome::UpgradeRequested(UpgradeDescriptor::new("v2", 1));
        assert_eq!(outcome.upgrade().map(|u| u.name.as_str()), Some("v2"));
        assert!(SupervisorOutcome::ProcessExited(None).upgrade().is_none());
    }
}

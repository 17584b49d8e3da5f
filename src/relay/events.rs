//! Site events delivered by the host application.

use serde::{Deserialize, Serialize};

/// A piece of content was saved.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentSave {
    #[serde(default)]
    pub post_id: i64,
    pub post_type: String,
    pub permalink: String,
    /// Revision saves never trigger a test.
    #[serde(default)]
    pub is_revision: bool,
}

impl ContentSave {
    pub fn action(&self) -> String {
        format!("{} published / updated.", self.post_type)
    }
}

/// Upgrade notice as the host describes it: the upgrader's class name plus
/// whichever metadata that upgrader exposes.
#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeNotice {
    #[serde(default)]
    pub upgrader: String,
    #[serde(default)]
    pub plugin_info: Option<PluginInfo>,
    #[serde(default)]
    pub result: Option<ThemeResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginInfo {
    #[serde(rename = "Name", default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeResult {
    #[serde(default)]
    pub destination_name: String,
}

/// What an install or upgrade touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpgradeOutcome {
    Plugin { name: String },
    Theme { destination_name: String },
    Other,
}

impl UpgradeOutcome {
    /// Action description, `None` for upgrades the relay does not describe.
    pub fn action(&self) -> Option<String> {
        match self {
            UpgradeOutcome::Plugin { name } => Some(format!("{} installed/updated.", name)),
            UpgradeOutcome::Theme { destination_name } => {
                Some(format!("{} installed/updated.", destination_name))
            }
            UpgradeOutcome::Other => None,
        }
    }
}

impl From<UpgradeNotice> for UpgradeOutcome {
    fn from(notice: UpgradeNotice) -> Self {
        match notice.upgrader.as_str() {
            "Plugin_Upgrader" => UpgradeOutcome::Plugin {
                name: notice.plugin_info.map(|p| p.name).unwrap_or_default(),
            },
            "Theme_Upgrader" => UpgradeOutcome::Theme {
                destination_name: notice.result.map(|r| r.destination_name).unwrap_or_default(),
            },
            _ => UpgradeOutcome::Other,
        }
    }
}

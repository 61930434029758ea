//! snap.yaml - the generated manifest.
//!
//! Field order in these structs is the key order of the written document.
//! Unset fields are left out.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::core::project::SnapType;

/// Top level of snap.yaml.
///
/// `apps` and `hooks` hold entries that already went through passthrough.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SnapManifest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub snap_type: Option<SnapType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub architectures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confinement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Mapping>,
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub apps: Mapping,
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub hooks: Mapping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugs: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots: Option<Mapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assumes: Vec<String>,
}

/// An entry of `apps` in snap.yaml.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppEntry {
    pub command: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command_chain: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_stop_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sockets: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autostart: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watchdog_timeout: Option<String>,
}

/// An entry of `hooks` in snap.yaml.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HookEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugs: Option<Vec<String>>,
}

/// Serialize any manifest section into an ordered YAML mapping.
pub fn to_mapping<T: Serialize>(value: &T) -> Result<Mapping> {
    match serde_yaml::to_value(value).context("failed to serialize manifest section")? {
        Value::Mapping(mapping) => Ok(mapping),
        other => anyhow::bail!("manifest section serialized to {:?}, not a mapping", other),
    }
}

/// Render the final document.
pub fn render(document: &Mapping) -> Result<String> {
    serde_yaml::to_string(document).context("failed to render snap.yaml")
}

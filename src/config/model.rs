// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::dag::template::TaskTemplate;
use crate::engine::EngineOptions;
use crate::ports::notify::NotifierConfig;
use crate::snapshot::propagate::DEFAULT_PROPAGATION_SLACK;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// notifications_enabled = true
/// propagation_slack = 5
///
/// [template.A]
/// name = "Fabric sourcing"
/// responsible = ["PUR"]
/// lead_time = 2
///
/// [template.B]
/// name = "Sampling"
/// responsible = ["DEV"]
/// preceding = ["A"]
/// lead_time = 3
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Templates from `[template.<order>]`, keyed by order code.
    #[serde(default)]
    pub template: BTreeMap<String, TemplateConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    #[serde(default = "default_notifications_enabled")]
    pub notifications_enabled: bool,

    /// Extra passes allowed beyond the number of snapshot entries before
    /// propagation gives up.
    #[serde(default = "default_propagation_slack")]
    pub propagation_slack: usize,

    /// JSON document holding templates, seasons and snapshots.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_attachments_dir")]
    pub attachments_dir: PathBuf,
}

fn default_notifications_enabled() -> bool {
    true
}

fn default_propagation_slack() -> usize {
    DEFAULT_PROPAGATION_SLACK
}

fn default_store_path() -> PathBuf {
    PathBuf::from("seasonflow.json")
}

fn default_attachments_dir() -> PathBuf {
    PathBuf::from(".seasonflow/attachments")
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            notifications_enabled: default_notifications_enabled(),
            propagation_slack: default_propagation_slack(),
            store_path: default_store_path(),
            attachments_dir: default_attachments_dir(),
        }
    }
}

/// `[template.<order>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    pub name: String,

    /// Department codes; normalized to upper case.
    #[serde(default)]
    pub responsible: Vec<String>,

    /// Order codes this template waits for. Each must sort before the
    /// template's own code.
    #[serde(default)]
    pub preceding: Vec<String>,

    #[serde(default)]
    pub lead_time: Option<u32>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (or
/// [`ConfigFile::new_unchecked`] for callers that already validated).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    /// Parsed templates sorted by order code.
    pub templates: Vec<TaskTemplate>,
}

impl ConfigFile {
    pub fn new_unchecked(config: ConfigSection, templates: Vec<TaskTemplate>) -> Self {
        Self { config, templates }
    }

    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig {
            enabled: self.config.notifications_enabled,
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            propagation_slack: self.config.propagation_slack,
        }
    }
}

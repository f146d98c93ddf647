// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::template::TaskTemplate;
use crate::dag::validate::validate_library;
use crate::errors::{Result, SeasonflowError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SeasonflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_templates(&raw)?;
        validate_global_config(&raw)?;
        let templates = build_templates(&raw)?;
        validate_library(&templates)?;
        Ok(ConfigFile::new_unchecked(raw.config, templates))
    }
}

fn ensure_has_templates(cfg: &RawConfigFile) -> Result<()> {
    if cfg.template.is_empty() {
        return Err(SeasonflowError::ConfigError(
            "config must contain at least one [template.<order>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.propagation_slack == 0 {
        return Err(SeasonflowError::ConfigError(
            "[config].propagation_slack must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn build_templates(cfg: &RawConfigFile) -> Result<Vec<TaskTemplate>> {
    let mut templates = cfg
        .template
        .iter()
        .map(|(order, t)| {
            if t.name.trim().is_empty() {
                return Err(SeasonflowError::ConfigError(format!(
                    "template '{order}' needs a non-empty name"
                )));
            }
            TaskTemplate::from_raw(order, t.name.trim(), &t.responsible, &t.preceding, t.lead_time, t.active)
        })
        .collect::<Result<Vec<_>>>()?;
    templates.sort_by(|a, b| a.order.cmp(&b.order));
    Ok(templates)
}

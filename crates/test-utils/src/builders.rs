#![allow(dead_code)]

use std::collections::BTreeMap;

use seasonflow::config::{ConfigFile, ConfigSection, RawConfigFile, TemplateConfig};
use seasonflow::dag::TaskTemplate;
use seasonflow::ports::{MemoryStore, Store};

/// Builder for a single `TaskTemplate`.
pub struct TemplateBuilder {
    order: String,
    config: TemplateConfig,
}

impl TemplateBuilder {
    pub fn new(order: &str, name: &str) -> Self {
        Self {
            order: order.to_string(),
            config: TemplateConfig {
                name: name.to_string(),
                responsible: vec![],
                preceding: vec![],
                lead_time: None,
                active: true,
            },
        }
    }

    pub fn responsible(mut self, dept: &str) -> Self {
        self.config.responsible.push(dept.to_string());
        self
    }

    pub fn after(mut self, order: &str) -> Self {
        self.config.preceding.push(order.to_string());
        self
    }

    pub fn lead_time(mut self, days: u32) -> Self {
        self.config.lead_time = Some(days);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.config.active = false;
        self
    }

    pub fn build(self) -> TaskTemplate {
        let c = &self.config;
        TaskTemplate::from_raw(&self.order, c.name.clone(), &c.responsible, &c.preceding, c.lead_time, c.active)
            .expect("Failed to build valid template from builder")
    }
}

/// Builder for a whole template library.
pub struct LibraryBuilder {
    config: RawConfigFile,
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                template: BTreeMap::new(),
            },
        }
    }

    pub fn with(mut self, template: TemplateBuilder) -> Self {
        self.config.template.insert(template.order, template.config);
        self
    }

    pub fn propagation_slack(mut self, slack: usize) -> Self {
        self.config.config.propagation_slack = slack;
        self
    }

    pub fn notifications_enabled(mut self, enabled: bool) -> Self {
        self.config.config.notifications_enabled = enabled;
        self
    }

    /// Validated config; panics if the library is invalid.
    pub fn build_config(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn build(self) -> Vec<TaskTemplate> {
        self.build_config().templates
    }

    /// A memory store pre-loaded with the library.
    pub fn into_store(self) -> MemoryStore {
        let mut store = MemoryStore::new();
        for template in self.build() {
            store.save_template(&template).expect("memory store save");
        }
        store
    }
}

impl Default for LibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// src/dag/template.rs

//! Library-level task templates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::dag::order::{OrderCode, normalize_department};
use crate::errors::{Result, SeasonflowError};

/// Lead time used when a stored template carries none.
pub const DEFAULT_LEAD_TIME_DAYS: u32 = 1;

/// Longest lead time a template may declare (ten years).
pub const MAX_LEAD_TIME_DAYS: u32 = 3650;

/// A season-independent task template.
///
/// Templates form the graph that every new season is materialized from.
/// Edges are `preceding` order codes, never pointers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub order: OrderCode,
    pub name: String,
    #[serde(default)]
    pub responsible: BTreeSet<String>,
    #[serde(default)]
    pub preceding: BTreeSet<OrderCode>,
    /// Days between "ready" and "due". `None` only appears in legacy data.
    #[serde(default)]
    pub lead_time: Option<u32>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TaskTemplate {
    /// Build a template from raw user input, normalizing every code.
    pub fn from_raw(
        order: &str,
        name: impl Into<String>,
        responsible: &[String],
        preceding: &[String],
        lead_time: Option<u32>,
        active: bool,
    ) -> Result<Self> {
        let order = OrderCode::parse(order)?;
        if let Some(days) = lead_time.filter(|d| *d > MAX_LEAD_TIME_DAYS) {
            return Err(SeasonflowError::Validation(format!(
                "task '{order}' has a lead time of {days} days (at most {MAX_LEAD_TIME_DAYS})"
            )));
        }
        let responsible = responsible
            .iter()
            .map(|d| normalize_department(d))
            .collect::<Result<BTreeSet<_>>>()?;
        let preceding = preceding
            .iter()
            .map(|p| OrderCode::parse(p))
            .collect::<Result<BTreeSet<_>>>()?;

        Ok(Self {
            order,
            name: name.into(),
            responsible,
            preceding,
            lead_time,
            active,
        })
    }

    pub fn effective_lead_time(&self) -> u32 {
        self.lead_time.unwrap_or(DEFAULT_LEAD_TIME_DAYS)
    }

    /// Preceding codes as plain strings, in order-code order.
    pub fn preceding_codes(&self) -> Vec<String> {
        self.preceding.iter().map(|c| c.to_string()).collect()
    }
}

// src/ports/store.rs

//! Persistence of templates, seasons and snapshots.
//!
//! Every season and snapshot carries a `version`. Saves compare the caller's
//! version with the stored one and fail with `Conflict` on mismatch, so two
//! transactions racing on the same snapshot cannot silently lose a write.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dag::template::TaskTemplate;
use crate::errors::{Result, SeasonflowError};
use crate::fs::FileSystem;
use crate::season::Season;
use crate::snapshot::model::Snapshot;
use crate::types::SeasonId;

/// Abstract record store consumed by the season service.
pub trait Store {
    fn load_season(&self, id: SeasonId) -> Result<Option<Season>>;
    fn find_season_by_name(&self, name: &str) -> Result<Option<Season>>;
    fn list_seasons(&self) -> Result<Vec<Season>>;
    /// Versioned save; bumps `season.version` on success.
    fn save_season(&mut self, season: &mut Season) -> Result<()>;
    /// Remove a season together with its snapshot.
    fn delete_season(&mut self, id: SeasonId) -> Result<()>;

    fn load_snapshot(&self, season_id: SeasonId) -> Result<Option<Snapshot>>;
    /// Versioned save; bumps `snapshot.version` on success.
    fn save_snapshot(&mut self, snapshot: &mut Snapshot) -> Result<()>;
    /// Save a season and its snapshot together: both versions are checked
    /// before either record is written.
    fn save_progress(&mut self, season: &mut Season, snapshot: &mut Snapshot) -> Result<()>;
    /// Seasons whose snapshot contains an entry with `order`.
    fn snapshots_referencing(&self, order: &str) -> Result<Vec<SeasonId>>;

    fn load_template(&self, order: &str) -> Result<Option<TaskTemplate>>;
    /// All templates, or only those with the given `active` flag.
    fn list_templates(&self, active: Option<bool>) -> Result<Vec<TaskTemplate>>;
    fn save_template(&mut self, template: &TaskTemplate) -> Result<()>;
    fn delete_template(&mut self, order: &str) -> Result<()>;
}

/// The whole store as one serializable document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub templates: BTreeMap<String, TaskTemplate>,
    #[serde(default)]
    pub seasons: BTreeMap<SeasonId, Season>,
    /// Keyed by season: one snapshot per season.
    #[serde(default)]
    pub snapshots: BTreeMap<SeasonId, Snapshot>,
}

fn check_version(kind: &str, key: &str, stored: Option<u64>, incoming: u64) -> Result<()> {
    match stored {
        None if incoming == 0 => Ok(()),
        None => Err(SeasonflowError::Conflict(format!(
            "{kind} '{key}' was removed by another writer"
        ))),
        Some(v) if v == incoming => Ok(()),
        Some(v) => Err(SeasonflowError::Conflict(format!(
            "{kind} '{key}' changed concurrently (stored version {v}, yours {incoming})"
        ))),
    }
}

impl StoreData {
    fn check_season(&self, season: &Season) -> Result<()> {
        let stored = self.seasons.get(&season.id).map(|s| s.version);
        check_version("season", &season.name, stored, season.version)
    }

    fn check_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(existing) = self.snapshots.get(&snapshot.season_id) {
            if existing.id != snapshot.id {
                return Err(SeasonflowError::Conflict(format!(
                    "season {} already has snapshot {}",
                    snapshot.season_id, existing.id
                )));
            }
        }
        let stored = self
            .snapshots
            .get(&snapshot.season_id)
            .map(|s| s.version);
        check_version("snapshot", &snapshot.id.to_string(), stored, snapshot.version)
    }

    fn put_season(&mut self, season: &mut Season) {
        season.version += 1;
        self.seasons.insert(season.id, season.clone());
    }

    fn put_snapshot(&mut self, snapshot: &mut Snapshot) {
        snapshot.version += 1;
        self.snapshots.insert(snapshot.season_id, snapshot.clone());
    }

    fn find_season_by_name(&self, name: &str) -> Option<Season> {
        self.seasons.values().find(|s| s.name == name).cloned()
    }

    fn snapshots_referencing(&self, order: &str) -> Vec<SeasonId> {
        self.snapshots
            .values()
            .filter(|s| s.contains_order(order))
            .map(|s| s.season_id)
            .collect()
    }

    fn list_templates(&self, active: Option<bool>) -> Vec<TaskTemplate> {
        let mut templates: Vec<TaskTemplate> = self
            .templates
            .values()
            .filter(|t| active.is_none_or(|a| t.active == a))
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.order.cmp(&b.order));
        templates
    }

    fn remove_season(&mut self, id: SeasonId) -> Result<()> {
        if self.seasons.remove(&id).is_none() {
            return Err(SeasonflowError::NotFound(format!("season {id}")));
        }
        self.snapshots.remove(&id);
        Ok(())
    }

    fn remove_template(&mut self, order: &str) -> Result<()> {
        self.templates
            .remove(order)
            .map(|_| ())
            .ok_or_else(|| SeasonflowError::NotFound(format!("template '{order}'")))
    }
}

/// Store that lives only in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: StoreData,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn load_season(&self, id: SeasonId) -> Result<Option<Season>> {
        Ok(self.data.seasons.get(&id).cloned())
    }

    fn find_season_by_name(&self, name: &str) -> Result<Option<Season>> {
        Ok(self.data.find_season_by_name(name))
    }

    fn list_seasons(&self) -> Result<Vec<Season>> {
        Ok(self.data.seasons.values().cloned().collect())
    }

    fn save_season(&mut self, season: &mut Season) -> Result<()> {
        self.data.check_season(season)?;
        self.data.put_season(season);
        Ok(())
    }

    fn delete_season(&mut self, id: SeasonId) -> Result<()> {
        self.data.remove_season(id)
    }

    fn load_snapshot(&self, season_id: SeasonId) -> Result<Option<Snapshot>> {
        Ok(self.data.snapshots.get(&season_id).cloned())
    }

    fn save_snapshot(&mut self, snapshot: &mut Snapshot) -> Result<()> {
        self.data.check_snapshot(snapshot)?;
        self.data.put_snapshot(snapshot);
        Ok(())
    }

    fn save_progress(&mut self, season: &mut Season, snapshot: &mut Snapshot) -> Result<()> {
        self.data.check_season(season)?;
        self.data.check_snapshot(snapshot)?;
        self.data.put_season(season);
        self.data.put_snapshot(snapshot);
        Ok(())
    }

    fn snapshots_referencing(&self, order: &str) -> Result<Vec<SeasonId>> {
        Ok(self.data.snapshots_referencing(order))
    }

    fn load_template(&self, order: &str) -> Result<Option<TaskTemplate>> {
        Ok(self.data.templates.get(order).cloned())
    }

    fn list_templates(&self, active: Option<bool>) -> Result<Vec<TaskTemplate>> {
        Ok(self.data.list_templates(active))
    }

    fn save_template(&mut self, template: &TaskTemplate) -> Result<()> {
        self.data
            .templates
            .insert(template.order.to_string(), template.clone());
        Ok(())
    }

    fn delete_template(&mut self, order: &str) -> Result<()> {
        self.data.remove_template(order)
    }
}

/// Store persisted as a single JSON document.
///
/// Every call reads the document; every write replaces it via a temp file
/// and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore<F: FileSystem> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem> JsonFileStore<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    fn load(&self) -> Result<StoreData> {
        if !self.fs.exists(&self.path) {
            debug!(path = ?self.path, "store file missing; starting empty");
            return Ok(StoreData::default());
        }
        let contents = self.fs.read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn persist(&self, data: &StoreData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        self.fs.write(&tmp, json.as_bytes())?;
        self.fs.rename(&tmp, &self.path)?;
        info!(path = ?self.path, "store saved");
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T> {
        let mut data = self.load()?;
        let out = f(&mut data)?;
        self.persist(&data)?;
        Ok(out)
    }
}

impl<F: FileSystem> Store for JsonFileStore<F> {
    fn load_season(&self, id: SeasonId) -> Result<Option<Season>> {
        Ok(self.load()?.seasons.get(&id).cloned())
    }

    fn find_season_by_name(&self, name: &str) -> Result<Option<Season>> {
        Ok(self.load()?.find_season_by_name(name))
    }

    fn list_seasons(&self) -> Result<Vec<Season>> {
        Ok(self.load()?.seasons.into_values().collect())
    }

    fn save_season(&mut self, season: &mut Season) -> Result<()> {
        self.modify(|data| {
            data.check_season(season)?;
            data.put_season(season);
            Ok(())
        })
    }

    fn delete_season(&mut self, id: SeasonId) -> Result<()> {
        self.modify(|data| data.remove_season(id))
    }

    fn load_snapshot(&self, season_id: SeasonId) -> Result<Option<Snapshot>> {
        Ok(self.load()?.snapshots.get(&season_id).cloned())
    }

    fn save_snapshot(&mut self, snapshot: &mut Snapshot) -> Result<()> {
        self.modify(|data| {
            data.check_snapshot(snapshot)?;
            data.put_snapshot(snapshot);
            Ok(())
        })
    }

    fn save_progress(&mut self, season: &mut Season, snapshot: &mut Snapshot) -> Result<()> {
        self.modify(|data| {
            data.check_season(season)?;
            data.check_snapshot(snapshot)?;
            data.put_season(season);
            data.put_snapshot(snapshot);
            Ok(())
        })
    }

    fn snapshots_referencing(&self, order: &str) -> Result<Vec<SeasonId>> {
        Ok(self.load()?.snapshots_referencing(order))
    }

    fn load_template(&self, order: &str) -> Result<Option<TaskTemplate>> {
        Ok(self.load()?.templates.get(order).cloned())
    }

    fn list_templates(&self, active: Option<bool>) -> Result<Vec<TaskTemplate>> {
        Ok(self.load()?.list_templates(active))
    }

    fn save_template(&mut self, template: &TaskTemplate) -> Result<()> {
        self.modify(|data| {
            data.templates
                .insert(template.order.to_string(), template.clone());
            Ok(())
        })
    }

    fn delete_template(&mut self, order: &str) -> Result<()> {
        self.modify(|data| data.remove_template(order))
    }
}

// src/engine/service.rs

//! IO shell around the pure lifecycle core.
//!
//! Each operation loads what it needs from the store, runs the core,
//! persists with version checks, then performs the requested effects. A
//! failing notifier or activity logger is logged and otherwise ignored.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::dag::template::TaskTemplate;
use crate::dag::validate::{precedence_map, validate_template_graph};
use crate::engine::progress::{self, Effect, StatusOutcome, UpdateOutcome};
use crate::engine::{EngineOptions, TaskUpdate};
use crate::errors::{Result, SeasonflowError};
use crate::ports::activity::{ActivityAction, ActivityEntry, ActivityLogger};
use crate::ports::attachments::AttachmentStore;
use crate::ports::notify::{Delivery, Notifier};
use crate::ports::store::Store;
use crate::season::Season;
use crate::snapshot::materialize::materialize_snapshot_with_slack;
use crate::snapshot::model::{Attachment, Snapshot};
use crate::types::{Actor, SeasonId, SeasonStatus, TaskId};

pub struct SeasonService<S: Store> {
    store: S,
    notifier: Box<dyn Notifier>,
    activity: Box<dyn ActivityLogger>,
    attachments: Box<dyn AttachmentStore>,
    options: EngineOptions,
}

impl<S: Store> SeasonService<S> {
    pub fn new(
        store: S,
        notifier: Box<dyn Notifier>,
        activity: Box<dyn ActivityLogger>,
        attachments: Box<dyn AttachmentStore>,
        options: EngineOptions,
    ) -> Self {
        Self {
            store,
            notifier,
            activity,
            attachments,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ----- templates -----------------------------------------------------

    /// Create or update a template after validating it against the stored
    /// library.
    pub fn sync_template(&mut self, actor: &Actor, template: &TaskTemplate) -> Result<()> {
        require_elevated(actor, "edit task templates")?;

        let library = self.store.list_templates(None)?;
        let existing = precedence_map(library.iter());
        validate_template_graph(template.order.as_str(), &template.preceding_codes(), &existing)?;

        self.store.save_template(template)?;
        info!(task = %template.order, active = template.active, "template saved");
        Ok(())
    }

    /// Delete a template nobody depends on.
    pub fn delete_template(&mut self, actor: &Actor, order: &str) -> Result<()> {
        require_elevated(actor, "delete task templates")?;

        if self.store.load_template(order)?.is_none() {
            return Err(SeasonflowError::NotFound(format!("template '{order}'")));
        }

        let dependents: Vec<String> = self
            .store
            .list_templates(None)?
            .into_iter()
            .filter(|t| t.preceding.iter().any(|p| p.as_str() == order))
            .map(|t| t.order.to_string())
            .collect();
        if !dependents.is_empty() {
            return Err(SeasonflowError::Validation(format!(
                "template '{order}' is a preceding task of {dependents:?}"
            )));
        }

        let seasons = self.store.snapshots_referencing(order)?;
        if !seasons.is_empty() {
            return Err(SeasonflowError::Validation(format!(
                "template '{order}' is used by {} season snapshot(s)",
                seasons.len()
            )));
        }

        self.store.delete_template(order)?;
        info!(task = %order, "template deleted");
        Ok(())
    }

    // ----- seasons -------------------------------------------------------

    /// Create a season and freeze the current template library into its
    /// snapshot.
    pub fn create_season(&mut self, actor: &Actor, name: &str, buyer: &str) -> Result<Season> {
        self.create_season_at(actor, name, buyer, Utc::now())
    }

    /// [`create_season`](Self::create_season) with an explicit creation time.
    pub fn create_season_at(
        &mut self,
        actor: &Actor,
        name: &str,
        buyer: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Season> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SeasonflowError::Validation("season name must not be empty".to_string()));
        }
        if self.store.find_season_by_name(name)?.is_some() {
            return Err(SeasonflowError::Validation(format!(
                "a season named '{name}' already exists"
            )));
        }

        let templates = self.store.list_templates(None)?;
        let materialized =
            materialize_snapshot_with_slack(&templates, created_at, self.options.propagation_slack);

        let mut season = Season::new(name, buyer.trim(), &actor.id, created_at);
        season.require_attention = materialized.require_attention;
        let mut snapshot = Snapshot::new(season.id, created_at, materialized.entries);

        self.store.save_progress(&mut season, &mut snapshot)?;
        info!(
            season = %season.name,
            tasks = snapshot.entries.len(),
            attention = ?season.require_attention,
            "season created"
        );

        self.perform(vec![Effect::Record(ActivityEntry::new(
            season.id,
            None,
            &actor.id,
            ActivityAction::SeasonCreated,
            format!("season '{}' for {} created with {} tasks", season.name, season.buyer, snapshot.entries.len()),
        ))]);
        Ok(season)
    }

    pub fn season_by_name(&self, name: &str) -> Result<Season> {
        self.store
            .find_season_by_name(name)?
            .ok_or_else(|| SeasonflowError::NotFound(format!("season '{name}'")))
    }

    /// Load a season together with its snapshot.
    pub fn load(&self, season_id: SeasonId) -> Result<(Season, Snapshot)> {
        let season = self
            .store
            .load_season(season_id)?
            .ok_or_else(|| SeasonflowError::NotFound(format!("season {season_id}")))?;
        let snapshot = self
            .store
            .load_snapshot(season_id)?
            .ok_or_else(|| SeasonflowError::NotFound(format!("snapshot of season '{}'", season.name)))?;
        Ok((season, snapshot))
    }

    /// Run a task completion transaction.
    pub fn update_task(
        &mut self,
        actor: &Actor,
        season_id: SeasonId,
        task_id: TaskId,
        update: &TaskUpdate,
    ) -> Result<UpdateOutcome> {
        let (mut season, mut snapshot) = self.load(season_id)?;

        let outcome = progress::update_task_and_progress(
            actor,
            &mut season,
            &mut snapshot,
            task_id,
            update,
            &self.options,
        )?;

        if outcome.is_noop() {
            info!(season = %season.name, task = %task_id, "no changes");
            return Ok(outcome);
        }

        if let Some(err) = outcome.propagation.and_then(|r| r.non_termination()) {
            error!(season = %season.name, error = %err, "snapshot has an unrepresentable task graph");
        }

        self.store.save_progress(&mut season, &mut snapshot)?;
        self.perform(outcome.effects.clone());
        Ok(outcome)
    }

    /// Move a season to another status.
    pub fn change_season_status(
        &mut self,
        actor: &Actor,
        season_id: SeasonId,
        to: SeasonStatus,
    ) -> Result<StatusOutcome> {
        let (mut season, snapshot) = self.load(season_id)?;
        let outcome = progress::change_status(actor, &mut season, &snapshot, to);

        if outcome.effects.is_empty() {
            return Ok(outcome);
        }

        self.store.save_season(&mut season)?;
        self.perform(outcome.effects.clone());
        Ok(outcome)
    }

    /// Store a file and attach its metadata to a task entry.
    pub fn attach_file(
        &mut self,
        actor: &Actor,
        season_id: SeasonId,
        task_id: TaskId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Attachment> {
        let (season, mut snapshot) = self.load(season_id)?;
        let snapshot_id = snapshot.id;
        let entry = snapshot
            .entry_mut(task_id)
            .ok_or_else(|| SeasonflowError::NotFound(format!("task {} in season '{}'", task_id, season.name)))?;

        let content_hash = self.attachments.put(snapshot_id, task_id, bytes)?;
        let attachment = Attachment {
            file_name: file_name.to_string(),
            content_hash,
            size: bytes.len() as u64,
            uploaded_at: Utc::now(),
            uploaded_by: actor.id.clone(),
        };
        entry.attachments.push(attachment.clone());
        let order = entry.order.to_string();

        self.store.save_snapshot(&mut snapshot)?;
        self.perform(vec![Effect::Record(ActivityEntry::new(
            season.id,
            Some(task_id),
            &actor.id,
            ActivityAction::AttachmentAdded,
            format!("{}: attached '{}'", order, file_name),
        ))]);
        Ok(attachment)
    }

    /// Read back an attachment's content.
    pub fn read_attachment(&self, season_id: SeasonId, task_id: TaskId, content_hash: &str) -> Result<Vec<u8>> {
        let snapshot = self
            .store
            .load_snapshot(season_id)?
            .ok_or_else(|| SeasonflowError::NotFound(format!("snapshot of season {season_id}")))?;
        Ok(self.attachments.get(snapshot.id, task_id, content_hash)?)
    }

    /// Delete a season. Refused while its snapshot still holds tasks.
    pub fn delete_season(&mut self, actor: &Actor, season_id: SeasonId) -> Result<()> {
        require_elevated(actor, "delete seasons")?;
        let (season, snapshot) = self.load(season_id)?;
        if !snapshot.entries.is_empty() {
            return Err(SeasonflowError::Validation(format!(
                "season '{}' still has {} task(s)",
                season.name,
                snapshot.entries.len()
            )));
        }

        self.store.delete_season(season_id)?;
        self.perform(vec![Effect::Record(ActivityEntry::new(
            season.id,
            None,
            &actor.id,
            ActivityAction::SeasonDeleted,
            format!("season '{}' deleted", season.name),
        ))]);
        Ok(())
    }

    /// Carry out effects after a successful commit. Never fails.
    fn perform(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Record(entry) => {
                    if let Err(err) = self.activity.record(&entry) {
                        warn!(action = %entry.action, error = %err, "failed to record activity");
                    }
                }
                Effect::Notify(notification) => match self.notifier.notify(&notification) {
                    Delivery::Delivered => {
                        info!(subject = %notification.subject, "notification delivered");
                    }
                    Delivery::Suppressed => {
                        info!(subject = %notification.subject, "notifications disabled; skipped");
                    }
                    Delivery::Failed(reason) => {
                        warn!(
                            subject = %notification.subject,
                            recipients = ?notification.recipients,
                            %reason,
                            "notification delivery failed"
                        );
                    }
                },
            }
        }
    }
}

fn require_elevated(actor: &Actor, what: &str) -> Result<()> {
    if actor.role.is_elevated() {
        Ok(())
    } else {
        Err(SeasonflowError::Forbidden(format!(
            "{} may not {what}",
            actor.id
        )))
    }
}

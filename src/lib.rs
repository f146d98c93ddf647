// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod ports;
pub mod season;
pub mod snapshot;
pub mod types;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::TaskGraph;
use crate::engine::{SeasonService, TaskUpdate, parse_completion_date};
use crate::fs::{FileSystem, RealFileSystem};
use crate::ports::{FileAttachmentStore, JsonFileStore, LogNotifier, TracingActivityLog};
use crate::season::Season;
use crate::snapshot::model::Snapshot;
use crate::types::Actor;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, wires the file-backed store, attachment
/// store, notifier and activity log into a [`SeasonService`], then runs one
/// subcommand.
pub fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading config {:?}", args.config))?;

    if let Command::Check = args.command {
        print_dry_run(&cfg);
        return Ok(());
    }

    let actor = Actor::new(args.actor.clone(), args.role.into());
    let fs = RealFileSystem;
    let mut service = SeasonService::new(
        JsonFileStore::new(fs.clone(), &cfg.config.store_path),
        Box::new(LogNotifier::new(cfg.notifier_config())),
        Box::new(TracingActivityLog),
        Box::new(FileAttachmentStore::new(fs.clone(), &cfg.config.attachments_dir)),
        cfg.engine_options(),
    );

    match args.command {
        Command::Check => {}
        Command::SyncTemplates => {
            for template in cfg.templates.iter() {
                service.sync_template(&actor, template)?;
            }
            info!(count = cfg.templates.len(), "templates synced");
        }
        Command::CreateSeason { name, buyer } => {
            let season = service.create_season(&actor, &name, &buyer)?;
            let (season, snapshot) = service.load(season.id)?;
            print_season(&season, &snapshot);
        }
        Command::Update {
            season,
            task,
            completed_on,
            remarks,
        } => {
            let season = service.season_by_name(&season)?;
            let (_, snapshot) = service.load(season.id)?;
            let task_id = task_id_by_order(&snapshot, &task)?;
            let update = TaskUpdate {
                actual_completion: completed_on
                    .as_deref()
                    .map(parse_completion_date)
                    .transpose()?,
                remarks,
            };
            let outcome = service.update_task(&actor, season.id, task_id, &update)?;
            if outcome.is_noop() {
                println!("no changes");
            }
            let (season, snapshot) = service.load(season.id)?;
            print_season(&season, &snapshot);
        }
        Command::Status { season, to } => {
            let season = service.season_by_name(&season)?;
            service.change_season_status(&actor, season.id, to.into())?;
            let (season, snapshot) = service.load(season.id)?;
            print_season(&season, &snapshot);
        }
        Command::Attach { season, task, file } => {
            let season = service.season_by_name(&season)?;
            let (_, snapshot) = service.load(season.id)?;
            let task_id = task_id_by_order(&snapshot, &task)?;
            let bytes = fs.read(&file)?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow!("{:?} has no file name", file))?;
            let attachment = service.attach_file(&actor, season.id, task_id, &file_name, &bytes)?;
            println!("{} {} ({} bytes)", attachment.content_hash, attachment.file_name, attachment.size);
        }
        Command::Show { season } => {
            let season = service.season_by_name(&season)?;
            let (season, snapshot) = service.load(season.id)?;
            print_season(&season, &snapshot);
        }
    }

    Ok(())
}

fn task_id_by_order(snapshot: &Snapshot, order: &str) -> Result<types::TaskId> {
    let code = dag::OrderCode::parse(order)?;
    snapshot
        .entry_by_order(code.as_str())
        .map(|e| e.id)
        .ok_or_else(|| anyhow!("no task '{}' in this season", code))
}

/// Print the validated template library.
fn print_dry_run(cfg: &ConfigFile) {
    println!("seasonflow dry-run");
    println!("  config.notifications_enabled = {}", cfg.config.notifications_enabled);
    println!("  config.propagation_slack = {}", cfg.config.propagation_slack);
    println!("  config.store_path = {:?}", cfg.config.store_path);
    println!();

    println!("templates ({}):", cfg.templates.len());
    for t in cfg.templates.iter() {
        let inactive = if t.active { "" } else { " (inactive)" };
        println!("  - {} {}{}", t.order, t.name, inactive);
        println!("      lead_time: {} day(s)", t.effective_lead_time());
        if !t.responsible.is_empty() {
            println!("      responsible: {:?}", t.responsible);
        }
        if !t.preceding.is_empty() {
            println!("      preceding: {:?}", t.preceding_codes());
        }
    }
}

fn print_season(season: &Season, snapshot: &Snapshot) {
    println!(
        "{} [{}] buyer={} created={}",
        season.name,
        season.status,
        season.buyer,
        season.created_at.date_naive()
    );
    println!("  attention: {:?}", season.require_attention);

    let graph = TaskGraph::new(&snapshot.entries);
    for e in snapshot.entries.iter() {
        let dates = e
            .computed_dates
            .map(|d| format!("{}..{}", d.start.date_naive(), d.end.date_naive()))
            .unwrap_or_else(|| "-".to_string());
        let done = e
            .actual_completion
            .map(|d| d.date_naive().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<4} {:<10} {:<24} {:<24} done={} waiting_on={:?}",
            e.order,
            e.status,
            e.name,
            dates,
            done,
            graph.open_predecessors(e)
        );
        if !e.remarks.is_empty() {
            println!("       remarks: {}", e.remarks);
        }
        for a in e.attachments.iter() {
            println!("       attachment: {} ({})", a.file_name, a.content_hash);
        }
    }
}

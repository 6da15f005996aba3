use anyhow::{anyhow, Context, Result};
use clap::Parser;
use evidence_log::paths::StorePaths;
use evidence_log::{
    EvidenceError, EvidenceService, LogType, PackRequest, ReasonCategory, RevisionRecord,
    RevisionRequest,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{
    Command, LogCommand, LogRef, ModeCommand, PackCommand, PackCreateArgs, ReviseArgs, RootArgs,
};

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Validation messages are meant to be shown verbatim.
            match err.downcast_ref::<EvidenceError>() {
                Some(EvidenceError::Validation(message)) => eprintln!("{message}"),
                Some(evidence) if evidence.is_retryable() => {
                    eprintln!("error: {err:#}\nThe change was not saved. Please try again.")
                }
                _ => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: RootArgs) -> Result<()> {
    let root = match args.store {
        Some(root) => root,
        None => StorePaths::default_root()
            .ok_or_else(|| anyhow!("no platform data directory; pass --store <DIR>"))?,
    };
    let service = EvidenceService::open_dir(root)?;

    match args.command {
        Command::Mode(command) => cmd_mode(&service, command),
        Command::Log(command) => cmd_log(&service, command),
        Command::Pack(command) => cmd_pack(&service, command),
    }
}

fn cmd_mode(service: &EvidenceService, command: ModeCommand) -> Result<()> {
    match command {
        ModeCommand::Enable { profile } => service.enable_evidence_mode(&profile)?,
        ModeCommand::Disable => service.disable_evidence_mode()?,
        ModeCommand::Status => {}
    }
    print_json(&service.evidence_mode_config())
}

fn cmd_log(service: &EvidenceService, command: LogCommand) -> Result<()> {
    match command {
        LogCommand::Save { log, file } => {
            let log_type = parse_log_type(&log)?;
            let content = read_json(&file)?;
            let outcome = service.save_log(&log.id, log_type, &content)?;
            print_json(&json!({ "log_id": log.id, "outcome": outcome }))
        }
        LogCommand::Finalize { log, profile } => {
            let log_type = parse_log_type(&log)?;
            let entry = service.finalize_log(&log.id, log_type, &profile)?;
            print_json(&entry)
        }
        LogCommand::Status { id } => {
            let check = service.can_modify_log(&id);
            print_json(&json!({
                "log_id": id,
                "finalized": service.is_log_finalized(&id),
                "finalization": service.get_finalization(&id),
                "can_modify": check.can_modify,
                "reason": check.reason,
                "revision_count": service.get_revision_count(&id),
            }))
        }
        LogCommand::Revise(args) => cmd_revise(service, args),
        LogCommand::Revisions { id } => {
            let records = service.get_log_revisions_newest_first(&id);
            let revisions: Vec<RevisionView<'_>> = records.iter().map(RevisionView::from).collect();
            print_json(&revisions)
        }
        LogCommand::Finalized { log_type } => {
            let log_type = log_type
                .as_deref()
                .map(str::parse::<LogType>)
                .transpose()?;
            print_json(&service.list_finalized(log_type))
        }
    }
}

/// Revision history entry with the display label for its reason.
#[derive(Serialize)]
struct RevisionView<'a> {
    #[serde(flatten)]
    record: &'a RevisionRecord,
    reason_label: &'static str,
}

impl<'a> From<&'a RevisionRecord> for RevisionView<'a> {
    fn from(record: &'a RevisionRecord) -> Self {
        Self {
            record,
            reason_label: record.reason_category.label(),
        }
    }
}

fn cmd_revise(service: &EvidenceService, args: ReviseArgs) -> Result<()> {
    let log_type = parse_log_type(&args.log)?;
    let reason_category: ReasonCategory = args.category.parse()?;
    let original_log = service
        .get_log(log_type, &args.log.id)?
        .ok_or_else(|| anyhow!("no stored content for {} log {}", log_type, args.log.id))?;
    let updated_log = read_json(&args.file)?;
    let outcome = service.update_log_with_revision(RevisionRequest {
        log_id: args.log.id,
        log_type,
        profile_id: args.profile,
        original_log,
        updated_log,
        reason_category,
        reason_note: args.note,
        summary: args.summary,
    })?;
    print_json(&outcome)
}

fn cmd_pack(service: &EvidenceService, command: PackCommand) -> Result<()> {
    match command {
        PackCommand::Create(args) => cmd_pack_create(service, args),
        PackCommand::List { profile } => {
            print_json(&service.get_submission_packs(profile.as_deref()))
        }
        PackCommand::Show { id } => {
            let pack = service
                .get_submission_pack(&id)
                .ok_or_else(|| EvidenceError::NotFound {
                    kind: "submission pack",
                    id: id.clone(),
                })?;
            print_json(&pack)
        }
    }
}

fn cmd_pack_create(service: &EvidenceService, args: PackCreateArgs) -> Result<()> {
    let pack = service.create_pack(PackRequest {
        profile_id: args.profile,
        title: args.title,
        start_date: args.start,
        end_date: args.end,
        daily_log_ids: args.daily,
        activity_log_ids: args.activity,
        report_ids: args.report,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
    })?;
    print_json(&pack)
}

fn parse_log_type(log: &LogRef) -> Result<LogType> {
    Ok(log.log_type.parse::<LogType>()?)
}

fn read_json(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

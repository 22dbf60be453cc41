//! CLI subcommand handlers.

use crate::render;
use crate::{AuditAction, Commands, ConfigAction};
use anyhow::Context;
use ragcheck_core::audit::{AuditFormat, AuditRecord, AuditSink, FileAuditSink, NullAuditSink};
use ragcheck_core::config::VerifierConfig;
use ragcheck_eval::rag::RetrievalQuery;
use ragcheck_eval::{InMemoryRetriever, PassageFilter, Verifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Load configuration from an explicit file, or from the layered sources
/// rooted at `workspace`.
pub fn load(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<VerifierConfig> {
    let config = match config_file {
        Some(path) => ragcheck_core::config::load_config_file(path),
        None => ragcheck_core::config::load_config(Some(workspace), None),
    }
    .context("Configuration error")?;

    for (role, llm) in [("judge", &config.judge), ("entailment", &config.entailment)] {
        for warning in llm.validate() {
            warn!(model = role, "{}", warning);
        }
    }
    Ok(config)
}

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    config: VerifierConfig,
    workspace: &Path,
    quiet: bool,
) -> anyhow::Result<()> {
    match command {
        Commands::Validate {
            prompt,
            output,
            grounding,
            passages,
            filter,
            limit,
            json,
        } => {
            let source = match (grounding, passages) {
                (Some(path), _) => Source::Document(path),
                (None, Some(path)) => Source::Passages {
                    path,
                    filter,
                    limit,
                },
                (None, None) => anyhow::bail!("either --grounding or --passages is required"),
            };
            handle_validate(&config, &prompt, &output, source, json, quiet).await
        }
        Commands::Config { action } => handle_config(action, &config, workspace),
        Commands::Audit { action } => handle_audit(action, &config),
    }
}

enum Source {
    Document(PathBuf),
    Passages {
        path: PathBuf,
        filter: Option<String>,
        limit: Option<usize>,
    },
}

/// Resolve a text argument: `@path` reads the file, anything else is literal.
pub fn read_text_arg(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path)),
        None => Ok(value.to_string()),
    }
}

fn audit_sink(config: &VerifierConfig) -> anyhow::Result<Arc<dyn AuditSink>> {
    if !config.audit.enabled {
        return Ok(Arc::new(NullAuditSink));
    }
    let path = config.audit.resolved_path();
    let sink = FileAuditSink::open(&path, config.audit.format)
        .with_context(|| format!("Failed to open audit log {}", path.display()))?;
    Ok(Arc::new(sink))
}

async fn handle_validate(
    config: &VerifierConfig,
    prompt: &str,
    output: &str,
    source: Source,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let output = read_text_arg(output)?;
    let verifier = Verifier::from_config(config)?.with_audit(audit_sink(config)?);

    let report = match source {
        Source::Document(path) => {
            let document = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            verifier.validate(prompt, &document, &output).await?
        }
        Source::Passages {
            path,
            filter,
            limit,
        } => {
            let retriever = InMemoryRetriever::from_jsonl(&path)?;
            let mut query = RetrievalQuery::new(limit.unwrap_or(config.retrieval.limit));
            if let Some(filter) = filter.or_else(|| config.retrieval.filter.clone()) {
                query = query.with_filter(filter.parse::<PassageFilter>()?);
            }
            verifier
                .validate_retrieved(&retriever, &query, prompt, &output)
                .await?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::text_report(&report, !quiet));
    }
    Ok(())
}

fn handle_config(
    action: ConfigAction,
    config: &VerifierConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            if !ragcheck_core::config::config_exists(Some(workspace)) {
                println!("# No configuration file found; showing defaults and environment.");
            }
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

fn handle_audit(action: AuditAction, config: &VerifierConfig) -> anyhow::Result<()> {
    match action {
        AuditAction::Show { id, last, path } => {
            let path = path.unwrap_or_else(|| config.audit.resolved_path());
            if !path.exists() {
                println!("No audit log at {}", path.display());
                return Ok(());
            }
            if config.audit.format == AuditFormat::Text {
                let content = std::fs::read_to_string(&path)?;
                let needle = id.map(|id| id.to_string());
                for line in content.lines() {
                    if needle.as_deref().is_none_or(|n| line.contains(n)) {
                        println!("{}", line);
                    }
                }
                return Ok(());
            }

            let records = ragcheck_core::audit::read_jsonl(&path)?;
            let groups = select_validations(records, id, last);
            if groups.is_empty() {
                println!("No matching validations in {}", path.display());
            }
            for (validation_id, records) in groups {
                println!("== {}", validation_id);
                for record in records {
                    println!("  {}", record.to_text());
                }
            }
            Ok(())
        }
    }
}

/// Group records by validation in order of first appearance, then apply
/// the `id` filter and keep the last `last` groups.
pub fn select_validations(
    records: Vec<AuditRecord>,
    id: Option<Uuid>,
    last: Option<usize>,
) -> Vec<(Uuid, Vec<AuditRecord>)> {
    let mut groups: Vec<(Uuid, Vec<AuditRecord>)> = Vec::new();
    for record in records {
        if let Some(id) = id
            && record.validation_id != id
        {
            continue;
        }
        match groups.iter_mut().find(|(v, _)| *v == record.validation_id) {
            Some((_, group)) => group.push(record),
            None => groups.push((record.validation_id, vec![record])),
        }
    }
    if let Some(last) = last {
        let skip = groups.len().saturating_sub(last);
        groups.drain(..skip);
    }
    groups
}

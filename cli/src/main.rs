//! CLI entrypoint for trend-scout
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use scout_application::{
    ConnectionManager, EventLogger, KeywordLifecycleUpdater, LifecyclePolicy, NoEventLogger,
    PlatformAdapter, ReportAssembler, RunCycleInput, RunResearchCycleUseCase,
};
use scout_domain::KeywordState;
use scout_infrastructure::{
    ConfigLoader, FileConfig, JsonKeywordStore, JsonlEventLogger, LlmKeywordExtractor,
    LlmRecommender, LlmSelection, McpPlatformAdapter, build_client, build_sinks, process_env,
};
use scout_presentation::{
    Cli, Command, ConsoleFormatter, KeywordsCommand, OutputFormat, ProgressReporter,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    // File log only for research runs
    let log_dir = match cli.command {
        Command::Run => config.logging.dir.as_deref(),
        _ => None,
    };
    let _guard = init_logging(cli.verbose, log_dir);

    info!("Starting trend-scout");

    let issues = config.validate();
    if !issues.is_empty() {
        let list = issues
            .iter()
            .map(|issue| format!("  - {}", issue))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Invalid configuration:\n{}", list);
    }

    match &cli.command {
        Command::Run => run(&cli, &config).await,
        Command::Keywords { action } => keywords(&cli, &config, action).await,
        Command::Platforms => platforms(&cli, &config),
        Command::Config => {
            let sources = ConfigLoader::config_sources(cli.config.as_ref());
            print!(
                "{}",
                ConsoleFormatter::format_sources(
                    sources.iter().map(|s| (s.label, s.path.as_deref(), s.found))
                )
            );
            Ok(())
        }
    }
}

/// Stderr logging by verbosity, plus a daily rolling file when `log_dir`
/// is set. The returned guard flushes the file writer on drop.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let appender = log_dir.and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("trend-scout")
            .filename_suffix("log")
            .build(dir)
            .map_err(|e| eprintln!("File logging disabled ({}): {}", dir.display(), e))
            .ok()
    });
    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

fn keyword_updater(config: &FileConfig) -> KeywordLifecycleUpdater {
    let store = Arc::new(JsonKeywordStore::new(config.keywords.store_dir.clone()));
    let params = config.to_cycle_params();
    KeywordLifecycleUpdater::new(store, LifecyclePolicy::from_params(&params))
}

async fn run(cli: &Cli, config: &FileConfig) -> Result<()> {
    let params = config.to_cycle_params();
    let specs = config.platform_specs(&process_env)?;

    // === Dependency Injection ===
    let adapters: Vec<Arc<dyn PlatformAdapter>> = specs
        .iter()
        .map(|spec| {
            Arc::new(McpPlatformAdapter::for_platform(spec.name.clone())) as Arc<dyn PlatformAdapter>
        })
        .collect();

    let logger: Arc<dyn EventLogger> = match config
        .logging
        .event_log
        .as_ref()
        .and_then(JsonlEventLogger::new)
    {
        Some(logger) => Arc::new(logger),
        None => Arc::new(NoEventLogger),
    };

    let client = match config.llm.resolve(&process_env) {
        LlmSelection::Enabled(settings) => match build_client(&settings) {
            Ok(client) => {
                info!("Using LLM {}/{}", settings.provider, settings.model);
                client
            }
            Err(e) => {
                warn!("LLM client unavailable, using heuristics: {}", e);
                None
            }
        },
        LlmSelection::Disabled(reason) => {
            info!("LLM disabled ({}), using heuristics", reason);
            None
        }
    };

    let sinks = build_sinks(&config.reports, &process_env);
    let mut use_case = RunResearchCycleUseCase::from_params(
        &params,
        ConnectionManager::new(adapters),
        keyword_updater(config),
        Arc::new(LlmKeywordExtractor::new(client.clone(), params.max_new_keywords)),
        Arc::new(LlmRecommender::new(client)),
        ReportAssembler::new(sinks),
        logger,
    );

    // Ctrl-C cancels the fan-out; connections are still closed and
    // reports still published.
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling research cycle");
            token.cancel();
        }
    });

    let input = RunCycleInput::new(specs).with_cancellation(cancel);
    let report = if cli.quiet {
        use_case.execute(input).await?
    } else {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(input, &progress).await?
    };

    let output = match cli.output {
        OutputFormat::Summary => ConsoleFormatter::format(&report),
        OutputFormat::Json => ConsoleFormatter::format_json(&report),
    };
    println!("{}", output);

    Ok(())
}

async fn keywords(cli: &Cli, config: &FileConfig, action: &KeywordsCommand) -> Result<()> {
    let updater = keyword_updater(config);
    match action {
        KeywordsCommand::List { state } => {
            let mut records = updater.list().await?;
            if let Some(filter) = state {
                let wanted = KeywordState::from(*filter);
                records.retain(|r| r.state == wanted);
            }
            let output = match cli.output {
                OutputFormat::Summary => ConsoleFormatter::format_keywords(&records),
                OutputFormat::Json => ConsoleFormatter::format_keywords_json(&records),
            };
            print!("{}", output);
        }
        KeywordsCommand::Add { texts } => {
            let added = updater.add_manual(texts, Utc::now()).await?;
            for record in &added {
                println!("Added '{}'", record.text);
            }
            let skipped = texts.len() - added.len();
            if skipped > 0 {
                println!("{} already known, skipped", skipped);
            }
        }
        KeywordsCommand::Reactivate { text } => {
            let record = updater.reactivate(text, Utc::now()).await?;
            println!("Reactivated '{}' ({})", record.text, record.state);
        }
    }
    Ok(())
}

fn platforms(cli: &Cli, config: &FileConfig) -> Result<()> {
    let specs = config.platform_specs(&process_env)?;
    let output = match cli.output {
        OutputFormat::Summary => ConsoleFormatter::format_platforms(&specs),
        OutputFormat::Json => ConsoleFormatter::format_platforms_json(&specs),
    };
    print!("{}", output);
    Ok(())
}

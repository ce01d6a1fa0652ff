//! wakeandwait - Wake hosts and wait for their services
//!
//! Entry point for the wakeandwait application.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wakeandwait::cli::Cli;
use wakeandwait::config::{Config, ConfigStore, LogFormat, LoggingConfig};
use wakeandwait::error::exit_code;
use wakeandwait::notify::{DesktopNotifier, NoopNotifier, Notifier};
use wakeandwait::orchestrator::{Cancellation, OrchestratorOptions, PhaseState};
use wakeandwait::{report, MagicPacketSender, Orchestrator, Resolver, RunSummary, WakeWaitError};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = ConfigStore::from_path(cli.config.as_ref())
        .and_then(|store| store.load().map(|config| (store, config)));

    let logging = loaded
        .as_ref()
        .map(|(_, config)| config.logging.clone())
        .unwrap_or_default();
    if let Err(e) = init_logging(&cli, &logging) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::from(exit_code::CONFIG_ERROR as u8);
    }

    let result = loaded.and_then(|(store, config)| run(&cli, &store, &config));
    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            log_error(&e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Logs an error together with everything that caused it.
fn log_error(e: &WakeWaitError) {
    let causes = e.causes();
    if causes.is_empty() {
        error!("{}", e);
    } else {
        error!(caused_by = %causes.join(": "), "{}", e);
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the level.
fn init_logging(
    cli: &Cli,
    logging: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level: tracing::Level = cli.log_level(logging.level).into();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
}

/// Main application logic. Returns the process exit code.
fn run(cli: &Cli, store: &ConfigStore, config: &Config) -> wakeandwait::Result<i32> {
    if cli.list {
        return list_aliases(config);
    }

    let tokens = if cli.destinations.is_empty() {
        let name = config
            .default_alias()
            .ok_or(WakeWaitError::NoDestinations)?;
        if !config.aliases.contains(name) {
            warn!(alias = %name, "Default alias is not defined");
        }
        info!(alias = %name, "Using default alias");
        vec![name.to_string()]
    } else {
        cli.destinations.clone()
    };

    let resolution = Resolver::new(&config.aliases).resolve(&tokens);
    for e in &resolution.errors {
        warn!("{}", e);
    }

    let destinations = resolution.destinations;
    if destinations.is_empty() {
        return Err(WakeWaitError::NoDestinations);
    }

    if let Some(name) = &cli.save {
        store.save_alias(name, &destinations, cli.default)?;
    }

    let options = OrchestratorOptions {
        interval: cli.interval().unwrap_or_else(|| config.retry.interval()),
        timeout: cli.timeout().or_else(|| config.retry.timeout()),
        cancellation: Cancellation::never(),
    };
    let waker = Arc::new(MagicPacketSender::new(config.broadcast_addr()?));

    info!(
        wake = destinations.wake_targets.len(),
        services = destinations.readiness_checks.len(),
        commands = destinations.commands.len(),
        interval_ms = options.interval.as_millis() as u64,
        timeout_secs = options.timeout.map(|t| t.as_secs()),
        "Starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (shutdown, cancellation) = Cancellation::signal();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; abandoning remaining units");
                let _ = shutdown.send(true);
            }
        });

        let orchestrator = Orchestrator::new(waker, report::select(cli.quiet)).with_options(
            OrchestratorOptions {
                cancellation,
                ..options
            },
        );
        let summary = orchestrator.run(&destinations).await?;

        let notifier: Box<dyn Notifier> = if cli.notify {
            Box::new(DesktopNotifier::new())
        } else {
            Box::new(NoopNotifier)
        };
        let ready: Vec<_> = summary.services.succeeded().cloned().collect();
        notifier.notify(&ready).await;

        if let Some(e) = failure(&summary) {
            log_error(&e);
        }
        Ok::<_, WakeWaitError>(summary.exit_code())
    })
}

/// Prints the alias table as YAML.
fn list_aliases(config: &Config) -> wakeandwait::Result<i32> {
    if config.aliases.is_empty() {
        println!("No aliases configured");
        return Ok(exit_code::SUCCESS);
    }

    print!("{}", serde_yaml::to_string(&config.aliases)?);
    if let Some(name) = config.default_alias() {
        println!("# default: {}", name);
    }
    Ok(exit_code::SUCCESS)
}

/// The error describing an unsuccessful run, if any.
fn failure(summary: &RunSummary) -> Option<WakeWaitError> {
    if summary.services.state == PhaseState::Abandoned {
        Some(WakeWaitError::ServicesNotReady {
            pending: summary.services.pending_count(),
        })
    } else if summary.commands.state == PhaseState::Abandoned {
        Some(WakeWaitError::CommandsNotCompleted {
            pending: summary.commands.pending_count(),
        })
    } else {
        None
    }
}

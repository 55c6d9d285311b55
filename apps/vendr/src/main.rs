//! vendr - vendor tree manager for Go-style import paths
//!
//! This is the CLI application that loads configuration, wires the installer
//! to the git/hg/bzr/svn driver and renders the result of each command.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{CommandReport, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};
use vendr_config::{find_project_root, vendor_dir, Config};
use vendr_events::{EventEmitter, EventReceiver, EventSender};
use vendr_install::{InstallConfig, Installer};
use vendr_types::{ColorChoice, Lockfile, Manifest, LOCK_FILE, MANIFEST_FILE};
use vendr_vcs::{CacheOptions, CommandVcs};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    // Configuration precedence: file (or defaults), then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);
    config.validate()?;

    init_tracing(cli.global.json, cli.global.debug, &config.home().join("logs"));
    info!("Starting vendr v{}", env!("CARGO_PKG_VERSION"));

    let cwd = std::env::current_dir()?;
    let root = find_project_root(&cwd)?;
    let vendor = vendor_dir(&root)?;

    let (event_sender, event_receiver) = vendr_events::channel();
    let installer = build_installer(&config, &root, &vendor, &event_sender);

    let cancel = installer.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let colors_enabled = match cli.global.color.unwrap_or(config.general.color) {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stdout().features().colors_supported(),
    };
    let renderer = OutputRenderer::new(cli.global.json, colors_enabled);
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, cli.global.json);

    let command = cli.command;
    let report = execute_command_with_events(
        execute_command(command, &installer, &root, &event_sender),
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_report(&report)?;

    let unsuccessful = report.unsuccessful();
    if unsuccessful > 0 {
        return Err(CliError::Incomplete {
            command: report.command,
            failed: unsuccessful,
        });
    }

    info!("Command completed successfully");
    Ok(())
}

fn build_installer(
    config: &Config,
    root: &Path,
    vendor: &Path,
    event_sender: &EventSender,
) -> Installer {
    let cache = CacheOptions {
        home: config.home(),
        use_cache: config.cache.use_cache,
        use_cache_source_path: config.cache.use_cache_source_path,
        use_source_path: config.cache.use_source_path,
        source_path: config.source_path(),
    };
    let install_config = InstallConfig::default()
        .with_workers(config.install.workers)
        .with_timeout(config.install.operation_timeout)
        .with_delete_unused(config.install.delete_unused)
        .with_dedupe_subpackages(config.install.dedupe_subpackages)
        .with_cache(cache);

    let vcs = CommandVcs::new()
        .with_force(config.install.force)
        .with_event_sender(event_sender.clone());

    Installer::new(install_config, root, Arc::new(vcs))
        .with_vendor_dir(vendor)
        .with_event_sender(event_sender.clone())
}

/// Drive a command while draining its events
async fn execute_command_with_events<F>(
    command: F,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandReport, CliError>
where
    F: std::future::Future<Output = Result<CommandReport, CliError>>,
{
    let mut command_future = Box::pin(command);

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(&event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(&event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    installer: &Installer,
    root: &Path,
    events: &EventSender,
) -> Result<CommandReport, CliError> {
    let manifest = Manifest::load(&root.join(MANIFEST_FILE)).await?;
    let lock_path = root.join(LOCK_FILE);

    match command {
        Commands::Install => {
            if !tokio::fs::try_exists(&lock_path).await? {
                events.emit_warning(format!(
                    "{LOCK_FILE} not found, running update to create it"
                ));
                return update(installer, &manifest, &lock_path).await;
            }

            let lock = Lockfile::load(&lock_path).await?;
            if !lock.matches(&manifest.hash()?) {
                events.emit_warning(format!(
                    "{LOCK_FILE} is out of date with {MANIFEST_FILE}, running update"
                ));
                return update(installer, &manifest, &lock_path).await;
            }

            let outcome = installer.install(&lock, &manifest).await?;
            let mut report = CommandReport::new("install");
            report.add_pool_run(&outcome.imports);
            report.add_pool_run(&outcome.dev_imports);
            Ok(report)
        }

        Commands::Update { .. } => update(installer, &manifest, &lock_path).await,

        Commands::Checkout { dev } => {
            let fetched = installer.checkout(&manifest, dev).await?;
            let mut report = CommandReport::new("checkout");
            report.fetched = fetched;
            Ok(report)
        }
    }
}

async fn update(
    installer: &Installer,
    manifest: &Manifest,
    lock_path: &Path,
) -> Result<CommandReport, CliError> {
    let result = installer.update_with_report(manifest).await?;
    result.lockfile.save(lock_path).await?;

    let mut report = CommandReport::new("update")
        .with_lock_file(lock_path)
        .with_pruned(&result.pruned);
    report.add_pool_run(&result.imports);
    report.add_pool_run(&result.dev_imports);
    Ok(report)
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool, log_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        let log_file = log_dir.join(format!(
            "vendr-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));
        let file = std::fs::create_dir_all(log_dir).and_then(|()| std::fs::File::create(&log_file));

        match file {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,vendr=debug"),
                        ),
                    )
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,vendr=debug"),
                        ),
                    )
                    .init();
            }
        }
    } else if json_mode {
        // JSON mode: keep stdout clean for the report
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Status lines cover warnings; only errors go through tracing
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::new("error"))
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if let Some(home) = &global.home {
        config.cache.home = Some(home.clone());
    }
    if let Some(workers) = global.workers {
        config.install.workers = workers;
    }
    if let Some(timeout) = global.timeout {
        config.install.operation_timeout = timeout;
    }
    if global.no_cache {
        config.cache.use_cache = false;
    }
    if global.force {
        config.install.force = true;
    }
    if global.use_source_path {
        config.cache.use_source_path = true;
    }

    if let Commands::Update {
        delete_unused,
        dedupe_subpackages,
    } = command
    {
        config.install.delete_unused |= *delete_unused;
        config.install.dedupe_subpackages |= *dedupe_subpackages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from([
            "vendr",
            "update",
            "--delete-unused",
            "--workers",
            "3",
            "--no-cache",
            "--home",
            "/tmp/vendr-home",
        ]);
        let mut config = Config::default();
        apply_cli_config(&mut config, &cli.global, &cli.command);

        assert_eq!(config.install.workers, 3);
        assert!(config.install.delete_unused);
        assert!(!config.install.dedupe_subpackages);
        assert!(!config.cache.use_cache);
        assert_eq!(config.home(), Path::new("/tmp/vendr-home"));
    }

    #[test]
    fn zero_workers_fail_validation() {
        let cli = Cli::parse_from(["vendr", "install", "-w", "0"]);
        let mut config = Config::default();
        apply_cli_config(&mut config, &cli.global, &cli.command);
        assert!(config.validate().is_err());
    }
}

mod cli;
mod error_fmt;
mod report;
mod run;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(e) = real_main(cli) {
        let code = error_fmt::exit_code_for_error(&e);
        if cli::json_mode() {
            println!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        tracing::error!(error = ?e, code, "exiting");
        std::process::exit(code);
    }
}

fn real_main(cli: Cli) -> Result<()> {
    // The [logging] section lives in the config, so it is loaded first.
    let cfg = run::load_config(&cli.config)?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "config loaded");

    match cli.cmd {
        Commands::Health => {
            println!("ok");
            Ok(())
        }
        Commands::SelfCheck => run::self_check(&cfg),
        Commands::Run { cycles, period_ms } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .map_err(|e| eyre::eyre!("install Ctrl-C handler: {e}"))?;

            let summary = run::run_loop(&cfg, cycles, period_ms, shutdown)?;
            if !cli.json {
                println!(
                    "stopped after {} cycles ({}), motor started {} times",
                    summary.cycles,
                    summary.reason.as_str(),
                    summary.starts
                );
            }
            Ok(())
        }
    }
}

fn rotation(policy: Option<&str>) -> tracing_appender::rolling::Rotation {
    use tracing_appender::rolling::Rotation;
    match policy {
        Some("daily") => Rotation::DAILY,
        Some("hourly") => Rotation::HOURLY,
        _ => Rotation::NEVER,
    }
}

/// Console layer on stderr (stdout carries reports) plus an optional JSON file sink.
fn init_tracing(json: bool, level: &str, logging: &proxmotor_config::Logging) -> Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let file_layer = match logging.file.as_deref() {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {path:?}"))?;
            let appender = tracing_appender::rolling::RollingFileAppender::builder()
                .rotation(rotation(logging.rotation.as_deref()))
                .filename_prefix(name.to_string_lossy())
                .build(dir)
                .map_err(|e| eyre::eyre!("open log file {path:?}: {e}"))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))
}

//! `vitals` command line entry point.

mod cli;
mod error_fmt;
mod node;
mod render;
mod replay;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE, json_mode};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::{Result, WrapErr};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};
use vitals_core::{NodeCfg, VitalsError};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        if json_mode() {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
            tracing::debug!("{err:?}");
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    if !cli.json {
        // Pretty reports for `{:?}` at debug level; JSON mode keeps stdout machine-readable.
        color_eyre::install()?;
    }
    tracing::debug!(config = %cli.config.display(), "config loaded");

    let node_cfg = NodeCfg::from(&cfg);
    match cli.cmd {
        Commands::Run {
            seconds,
            cadence,
            bpm,
            fall_at_ms,
            no_contact,
        } => {
            let params = node::SimParams {
                cadence_spm: cadence,
                bpm,
                fall_at_ms,
                contact: !no_contact,
            };
            let publish = Duration::from_millis(cfg.sampling.publish_ms);
            node::run(node_cfg, publish, seconds, &params, cli.json)
        }
        Commands::Replay { motion, ppg } => {
            replay::replay(&node_cfg, &motion, ppg.as_deref(), cli.json)
        }
        Commands::SelfCheck => node::self_check(&node_cfg, cli.json),
    }
}

fn load_config(path: &Path) -> Result<vitals_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = vitals_config::load_toml(&text)?;
    cfg.validate()
        .map_err(|e| VitalsError::Config(e.to_string()))?;
    Ok(cfg)
}

fn init_tracing(json: bool, level: Option<&str>, logging: &vitals_config::Logging) -> Result<()> {
    let level = level
        .or(logging.level.as_deref())
        .unwrap_or("info")
        .to_string();
    // RUST_LOG wins over flags and config.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .boxed(),
        );
    } else {
        layers.push(fmt::layer().with_writer(std::io::stderr).with_target(false).boxed());
    }

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file must name a file, got {file:?}"))?;
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "never" => tracing_appender::rolling::never(dir, name),
            "daily" => tracing_appender::rolling::daily(dir, name),
            "hourly" => tracing_appender::rolling::hourly(dir, name),
            other => eyre::bail!("logging.rotation must be never|daily|hourly, got {other:?}"),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(fmt::layer().json().with_ansi(false).with_writer(writer).boxed());
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}

//! otter-proxy demo CLI
//!
//! Runs the interception scenarios against the library and prints what a
//! caller would observe.

use anyhow::{Context, Result};
use clap::Parser;
use otter_proxy::ProxyConfig;
use otter_proxy::config::CONFIG_FILE_NAME;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::EnvFilter;

mod scenarios;

use scenarios::Scenario;

#[derive(Parser)]
#[command(
    name = "otter-proxy-demo",
    version,
    about = "Run Proxy/Reflect interception scenarios",
    long_about = "Runs the otter-proxy interception scenarios and prints their results.\n\n\
                  Everything:   otter-proxy-demo\n\
                  One scenario: otter-proxy-demo protected\n\
                  With logs:    otter-proxy-demo --log-level otter::proxy=trace range"
)]
struct Cli {
    /// Scenario to run
    #[arg(value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Config file path (defaults to ./otter-proxy.toml when it exists)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `otter::proxy=trace`
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter '{directive}'"))?,
        None => EnvFilter::from_default_env().add_directive("warn".parse()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ProxyConfig> {
    match path {
        Some(path) => ProxyConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let default_path = Path::new(CONFIG_FILE_NAME);
            if default_path.exists() {
                Ok(ProxyConfig::load(default_path)?)
            } else {
                Ok(ProxyConfig::default())
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");
    let context = scenarios::Context::from_config(&config)?;

    let mut out = std::io::stdout().lock();
    for scenario in cli.scenario.expand() {
        writeln!(out, "== {}", scenario.title())?;
        scenarios::run(*scenario, &context, &mut out)
            .with_context(|| format!("scenario '{}' failed", scenario.title()))?;
        writeln!(out)?;
    }
    Ok(())
}

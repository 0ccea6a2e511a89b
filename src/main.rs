//! bleach: elimina metadata identificable de archivos desde la línea de comandos.

mod cli;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use bleach::{Dispatcher, TypeCache};
use cli::Cli;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(anyhow::Error::msg)
        .context("no se pudo inicializar el registro")?;

    let dispatcher = Dispatcher::new(cli.tool_config());
    let json = cli.json;
    let request = cli.command.into_request();

    let mut cache = TypeCache::new();
    let result = dispatcher.scrub(&mut cache, &request);

    if json {
        ui::render_json(&result)?;
    } else {
        ui::render_result(&result);
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

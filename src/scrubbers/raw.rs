//! Limpieza de fotografías RAW delegada en exiftool.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ToolConfig;
use crate::error::Result;
use crate::tool::{self, ToolInvocation, ToolOutput};

use super::StrategyReport;
use super::utils::{commit, display_name, staged_copy};

/// Ejecuta `exiftool <borrado> -overwrite_original <path>` sobre una copia de trabajo.
///
/// Elimina el `<path>_original` que algunas versiones dejan aunque se pida
/// sobrescribir.
pub(super) fn run_exiftool(path: &Path, delete_tags: &str, config: &ToolConfig) -> Result<ToolOutput> {
    let invocation = ToolInvocation {
        tool: "exiftool",
        program: &config.exiftool,
        args: vec![
            OsString::from(delete_tags),
            OsString::from("-overwrite_original"),
            path.as_os_str().to_os_string(),
        ],
        timeout: config.exiftool_timeout,
        poll_interval: config.poll_interval,
    };
    let result = tool::run(&invocation);

    let leftover = exiftool_leftover(path);
    if leftover.exists()
        && let Err(error) = fs::remove_file(&leftover)
    {
        warn!(path = %leftover.display(), %error, "no se pudo eliminar la copia que dejó exiftool");
    }

    result?.into_checked("exiftool")
}

fn exiftool_leftover(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push("_original");
    PathBuf::from(name)
}

/// Extrae las advertencias de exiftool (`Warning: ...`) como campos residuales.
pub(super) fn exiftool_warnings(output: &ToolOutput) -> Vec<String> {
    output
        .stdout
        .lines()
        .chain(output.stderr.lines())
        .filter_map(|line| line.trim().strip_prefix("Warning:"))
        .map(|warning| warning.trim().to_string())
        .filter(|warning| !warning.is_empty())
        .collect()
}

pub fn scrub_raw(input: &Path, target: &Path, config: &ToolConfig) -> Result<StrategyReport> {
    let staged = staged_copy(input, target)?;
    let output = run_exiftool(staged.path(), "-all=", config)?;

    let residual = exiftool_warnings(&output);
    for field in &residual {
        warn!(input = %input.display(), field = %field, "exiftool no pudo eliminar un campo");
    }

    commit(staged, input, target)?;
    info!(input = %input.display(), output = %target.display(), "RAW limpio");

    Ok(StrategyReport {
        residual,
        ..StrategyReport::new(format!("Limpio: {}", display_name(target)))
    })
}

//! Ejecución de binarios externos con tiempo límite y salida capturada.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Result, ScrubError};

/// Invocación de una herramienta externa.
#[derive(Debug)]
pub(crate) struct ToolInvocation<'a> {
    /// Nombre legible para mensajes (`ffmpeg`, `exiftool`).
    pub tool: &'a str,
    pub program: &'a Path,
    pub args: Vec<OsString>,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Convierte una salida no exitosa en error.
    pub fn into_checked(self, tool: &str) -> Result<ToolOutput> {
        if self.success() {
            Ok(self)
        } else {
            Err(ScrubError::tool_failed(tool, self.status.code(), &self.stderr))
        }
    }
}

/// Resuelve un programa en `PATH`, o comprueba la ruta si ya incluye directorios.
pub(crate) fn locate(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return is_executable(program).then(|| program.to_path_buf());
    }

    let search_path = env::var_os("PATH")?;
    env::split_paths(&search_path)
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| is_executable(candidate))
}

fn candidates(dir: &Path, program: &Path) -> Vec<PathBuf> {
    let base = dir.join(program);
    if cfg!(windows) && program.extension().is_none() {
        vec![base.with_extension("exe"), base]
    } else {
        vec![base]
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Ejecuta la herramienta y espera hasta que termine o venza el plazo.
///
/// stdout y stderr se redirigen a archivos temporales anónimos, de modo que
/// el proceso nunca se bloquea por una tubería llena y no hacen falta hilos
/// lectores. Al vencer el plazo el proceso se mata y se recoge antes de
/// devolver [`ScrubError::Timeout`].
pub(crate) fn run(invocation: &ToolInvocation<'_>) -> Result<ToolOutput> {
    let tool = invocation.tool;
    let capture_error = |error: io::Error| ScrubError::ToolSpawn {
        tool: tool.to_string(),
        source: error,
    };

    let mut stdout_sink = tempfile::tempfile().map_err(capture_error)?;
    let mut stderr_sink = tempfile::tempfile().map_err(capture_error)?;

    debug!(
        tool,
        program = %invocation.program.display(),
        args = ?invocation.args,
        timeout_secs = invocation.timeout.as_secs_f64(),
        "ejecutando herramienta externa"
    );

    let mut child = Command::new(invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_sink.try_clone().map_err(capture_error)?))
        .stderr(Stdio::from(stderr_sink.try_clone().map_err(capture_error)?))
        .spawn()
        .map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => ScrubError::tool_missing(tool, invocation.program),
            _ => capture_error(error),
        })?;

    // Un plazo que no cabe en `Instant` equivale a esperar sin límite.
    let deadline = Instant::now().checked_add(invocation.timeout);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                let now = Instant::now();
                let Some(deadline) = deadline else {
                    thread::sleep(invocation.poll_interval);
                    continue;
                };
                if now >= deadline {
                    warn!(tool, timeout_secs = invocation.timeout.as_secs_f64(), "tiempo límite agotado; deteniendo proceso");
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ScrubError::Timeout {
                        tool: tool.to_string(),
                        timeout: invocation.timeout,
                    });
                }
                thread::sleep(invocation.poll_interval.min(deadline - now));
            }
            Err(error) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(capture_error(error));
            }
        }
    };

    let stdout = read_sink(&mut stdout_sink).map_err(capture_error)?;
    let stderr = read_sink(&mut stderr_sink).map_err(capture_error)?;
    debug!(tool, code = ?status.code(), "herramienta finalizada");

    Ok(ToolOutput {
        status,
        stdout,
        stderr,
    })
}

fn read_sink(sink: &mut File) -> io::Result<String> {
    sink.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    sink.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

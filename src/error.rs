//! Tipos de error compartidos por el clasificador, las estrategias y el despachador.

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::file_type::FileKind;

/// Alias de resultado para las operaciones de limpieza.
pub type Result<T> = std::result::Result<T, ScrubError>;

/// Longitud máxima del extracto de stderr incluido en los mensajes.
const STDERR_EXCERPT_LIMIT: usize = 400;

/// Categoría estable de un fallo, pensada para el llamador y la salida JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    UnsupportedFormat,
    ExternalToolMissing,
    ExternalToolFailed,
    Timeout,
    Verification,
    Io,
}

/// Error tipado de cualquier paso de la limpieza.
#[derive(Error, Debug)]
pub enum ScrubError {
    #[error("archivo no encontrado: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("la ruta es un directorio, no un archivo: {}", .path.display())]
    NotAFile { path: PathBuf },

    #[error("formato no soportado para `{}`: {reason}", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error(
        "`{}` parece ser de tipo {detected}, no {expected}",
        .path.display()
    )]
    KindMismatch {
        path: PathBuf,
        expected: FileKind,
        detected: FileKind,
    },

    #[error("no se encontró `{tool}` ({}); instálalo o indica su ruta", .program.display())]
    ToolMissing { tool: String, program: PathBuf },

    #[error("{tool} falló (código {}): {stderr}", .code.map_or_else(|| "desconocido".to_string(), |c| c.to_string()))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("no se pudo ejecutar {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} superó el tiempo límite de {}s y fue detenido", .timeout.as_secs_f64())]
    Timeout { tool: String, timeout: Duration },

    #[error("no se pudo {action} `{}`: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no se pudo decodificar la imagen `{}`: {source}", .path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no se pudo guardar la imagen limpia `{}`: {source}", .path.display())]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no es un PDF válido `{}`: {source}", .path.display())]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("no es un documento Office válido `{}`: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("error procesando {part}: {message}")]
    Xml { part: String, message: String },

    #[error("la verificación de `{}` falló: {detail}", .path.display())]
    Verification { path: PathBuf, detail: String },
}

impl ScrubError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile { path: path.into() }
    }

    pub fn unsupported(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn tool_missing(tool: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self::ToolMissing {
            tool: tool.into(),
            program: program.into(),
        }
    }

    /// Construye un error de herramienta recortando stderr a un extracto legible.
    pub fn tool_failed(tool: impl Into<String>, code: Option<i32>, stderr: &str) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            code,
            stderr: stderr_excerpt(stderr),
        }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn xml(part: impl Into<String>, message: impl ToString) -> Self {
        Self::Xml {
            part: part.into(),
            message: message.to_string(),
        }
    }

    pub fn verification(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Verification {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Categoría del error según la taxonomía pública.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } | Self::NotAFile { .. } => FailureKind::NotFound,
            Self::UnsupportedFormat { .. }
            | Self::KindMismatch { .. }
            | Self::ImageDecode { .. }
            | Self::Pdf { .. }
            | Self::Archive { .. }
            | Self::Xml { .. } => FailureKind::UnsupportedFormat,
            Self::ToolMissing { .. } => FailureKind::ExternalToolMissing,
            Self::ToolFailed { .. } | Self::ToolSpawn { .. } => FailureKind::ExternalToolFailed,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Verification { .. } => FailureKind::Verification,
            Self::Io { .. } | Self::ImageEncode { .. } => FailureKind::Io,
        }
    }
}

/// Conserva la parte final de stderr, que es donde las herramientas dejan la causa.
fn stderr_excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return "sin salida de error".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= STDERR_EXCERPT_LIMIT {
        return trimmed.to_string();
    }

    let tail: String = chars[chars.len() - STDERR_EXCERPT_LIMIT..].iter().collect();
    format!("…{tail}")
}

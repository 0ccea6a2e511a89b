//! Clasificación de archivos por extensión y, como respaldo, por contenido.

use infer::Infer;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ScrubError};

/// Bytes inspeccionados por la heurística de texto plano.
const TEXT_SNIFF_LIMIT: u64 = 8 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp", "bmp", "gif"];
const PDF_EXTENSIONS: &[&str] = &["pdf"];
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "mkv", "avi", "webm", "wmv", "flv", "mpg", "mpeg", "3gp",
];
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "aac", "flac", "wav", "ogg", "oga", "opus", "wma", "aif", "aiff",
];
const RAW_EXTENSIONS: &[&str] = &[
    "nef", "nrw", "cr2", "cr3", "crw", "arw", "srf", "sr2", "dng", "orf", "rw2", "raf", "pef",
    "srw", "x3f", "3fr", "erf", "kdc", "mrw",
];
const OFFICE_EXTENSIONS: &[&str] = &["docx", "docm", "dotx", "xlsx", "xlsm", "pptx", "pptm"];
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "rst", "log", "csv", "tsv", "ini", "cfg", "conf", "toml", "yaml", "yml", "json",
    "xml", "py", "sh", "bash", "zsh", "rb", "pl", "lua", "sql", "js", "ts", "c", "h", "cpp", "hpp",
    "rs", "go", "java", "kt", "properties", "env",
];

const RAW_MIME_TYPES: &[&str] = &[
    "image/x-canon-cr2",
    "image/x-canon-cr3",
    "image/x-nikon-nef",
    "image/x-sony-arw",
    "image/x-adobe-dng",
    "image/x-olympus-orf",
    "image/x-panasonic-rw2",
    "image/x-fuji-raf",
];
const OFFICE_MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
];

/// Tipos canónicos con una estrategia de limpieza asociada.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Pdf,
    Video,
    Audio,
    Raw,
    Docx,
    Text,
}

impl FileKind {
    pub const ALL: [FileKind; 7] = [
        FileKind::Image,
        FileKind::Pdf,
        FileKind::Video,
        FileKind::Audio,
        FileKind::Raw,
        FileKind::Docx,
        FileKind::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Pdf => "pdf",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Raw => "raw",
            FileKind::Docx => "docx",
            FileKind::Text => "text",
        }
    }

    /// Video y audio reemplazan el original salvo que se pida lo contrario.
    pub fn in_place_by_default(self) -> bool {
        matches!(self, FileKind::Video | FileKind::Audio)
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            FileKind::Image => IMAGE_EXTENSIONS,
            FileKind::Pdf => PDF_EXTENSIONS,
            FileKind::Video => VIDEO_EXTENSIONS,
            FileKind::Audio => AUDIO_EXTENSIONS,
            FileKind::Raw => RAW_EXTENSIONS,
            FileKind::Docx => OFFICE_EXTENSIONS,
            FileKind::Text => TEXT_EXTENSIONS,
        }
    }

    /// Busca el tipo asociado a una extensión, sin distinguir mayúsculas.
    pub fn from_extension(extension: &str) -> Option<FileKind> {
        let extension = extension.to_ascii_lowercase();
        FileKind::ALL
            .into_iter()
            .find(|kind| kind.extensions().contains(&extension.as_str()))
    }

    /// Traduce un tipo MIME detectado por contenido al tipo canónico.
    pub fn from_mime(mime: &str) -> Option<FileKind> {
        if RAW_MIME_TYPES.contains(&mime) {
            return Some(FileKind::Raw);
        }
        if OFFICE_MIME_TYPES.contains(&mime) {
            return Some(FileKind::Docx);
        }
        if mime == "application/pdf" {
            return Some(FileKind::Pdf);
        }

        match mime.split_once('/').map(|(top, _)| top) {
            Some("image") => Some(FileKind::Image),
            Some("video") => Some(FileKind::Video),
            Some("audio") => Some(FileKind::Audio),
            Some("text") => Some(FileKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Señal que originó la clasificación.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "value", rename_all = "lowercase")]
pub enum DetectionSignal {
    Extension(String),
    Sniffed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileTypeInfo {
    pub kind: FileKind,
    pub signal: DetectionSignal,
}

/// Verifica que la ruta exista y sea un archivo.
pub fn ensure_file(path: &Path) -> Result<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScrubError::not_found(path));
        }
        Err(error) => return Err(ScrubError::io("leer la metadata de", path, error)),
    };

    if metadata.is_dir() {
        return Err(ScrubError::not_a_file(path));
    }
    Ok(())
}

/// Clasifica un archivo sin pasar por la caché.
pub fn classify(path: &Path) -> Result<FileTypeInfo> {
    ensure_file(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if let Some(ext) = extension.as_deref()
        && let Some(kind) = FileKind::from_extension(ext)
    {
        return Ok(FileTypeInfo {
            kind,
            signal: DetectionSignal::Extension(ext.to_string()),
        });
    }

    if let Some(mime) = sniff_mime(path)
        && let Some(kind) = FileKind::from_mime(&mime)
    {
        return Ok(FileTypeInfo {
            kind,
            signal: DetectionSignal::Sniffed(mime),
        });
    }

    if looks_like_text(path)? {
        return Ok(FileTypeInfo {
            kind: FileKind::Text,
            signal: DetectionSignal::Sniffed("text/plain".to_string()),
        });
    }

    let reason = match extension {
        Some(ext) => format!("no hay un manejador para la extensión .{ext}"),
        None => "no se pudo determinar el tipo del contenido".to_string(),
    };
    Err(ScrubError::unsupported(path, reason))
}

/// Intenta detectar el tipo MIME del archivo a partir de su contenido.
fn sniff_mime(path: &Path) -> Option<String> {
    let infer = Infer::new();
    infer
        .get_from_path(path)
        .ok()
        .flatten()
        .map(|kind| kind.mime_type().to_string())
}

fn looks_like_text(path: &Path) -> Result<bool> {
    let file = File::open(path).map_err(|e| ScrubError::io("abrir", path, e))?;
    let mut head = Vec::new();
    file.take(TEXT_SNIFF_LIMIT)
        .read_to_end(&mut head)
        .map_err(|e| ScrubError::io("leer", path, e))?;

    if head.is_empty() || head.contains(&0) {
        return Ok(false);
    }

    match std::str::from_utf8(&head) {
        Ok(_) => Ok(true),
        // Un carácter multibyte puede quedar cortado en el límite de lectura.
        Err(error) => Ok(error.error_len().is_none()),
    }
}

/// Memoriza clasificaciones por ruta literal.
///
/// No se invalida cuando el archivo cambia: si una ruta se reutiliza tras
/// modificar su contenido el resultado puede quedar desactualizado. Úsala como
/// optimización, no como garantía, y llama a [`TypeCache::forget`] o
/// [`TypeCache::clear`] cuando sepas que el archivo cambió.
#[derive(Debug, Default)]
pub struct TypeCache {
    entries: HashMap<PathBuf, FileTypeInfo>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, path: &Path) -> Result<FileTypeInfo> {
        if let Some(info) = self.entries.get(path) {
            debug!(path = %path.display(), kind = %info.kind, "tipo recuperado de la caché");
            return Ok(info.clone());
        }

        let info = classify(path)?;
        debug!(path = %path.display(), kind = %info.kind, signal = ?info.signal, "tipo detectado");
        self.entries.insert(path.to_path_buf(), info.clone());
        Ok(info)
    }

    /// Consulta la caché sin clasificar.
    pub fn get(&self, path: &Path) -> Option<&FileTypeInfo> {
        self.entries.get(path)
    }

    pub fn forget(&mut self, path: &Path) -> Option<FileTypeInfo> {
        self.entries.remove(path)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

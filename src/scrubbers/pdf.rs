//! Limpieza de PDF: borrado de etiquetas con exiftool y reescritura estructural con lopdf.

use lopdf::{Dictionary, Document, Object};
use std::collections::BTreeSet;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::ToolConfig;
use crate::error::{FailureKind, Result, ScrubError};

use super::StrategyReport;
use super::raw::{exiftool_warnings, run_exiftool};
use super::utils::{commit, display_name, staged_copy, staging_file};

/// Claves eliminadas de cualquier diccionario del documento.
const STRIPPED_KEYS: [&[u8]; 4] = [b"Metadata", b"PieceInfo", b"Annots", b"AcroForm"];

/// Claves del trailer que identifican al documento o a su autor.
const STRIPPED_TRAILER_KEYS: [&[u8]; 2] = [b"Info", b"ID"];

/// Herramientas disponibles para limpiar un PDF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PdfMode {
    /// exiftool y después la reescritura con lopdf.
    Full,
    /// Solo la reescritura con lopdf; exiftool no está disponible.
    LibraryOnly,
}

/// Limpia un PDF y lo guarda en `target`.
///
/// En modo [`PdfMode::Full`] un fallo o la ausencia de exiftool degradan a la
/// limpieza con biblioteca salvo que `strict` esté activo. exiftool solo añade una
/// actualización incremental; la reescritura posterior con lopdf descarta las
/// revisiones anteriores del archivo.
pub fn scrub_pdf(
    input: &Path,
    target: &Path,
    mode: PdfMode,
    strict: bool,
    config: &ToolConfig,
) -> Result<StrategyReport> {
    let mut report = StrategyReport::new(format!("Limpio: {}", display_name(target)));

    let exiftool_copy = match mode {
        PdfMode::Full => {
            let staged = staged_copy(input, target)?;
            match run_exiftool(staged.path(), "-all:all=", config) {
                Ok(output) => {
                    report.residual.extend(exiftool_warnings(&output));
                    Some(staged)
                }
                Err(error) if !strict && degradable(&error) => {
                    warn!(input = %input.display(), %error, "exiftool falló; se continúa solo con lopdf");
                    report
                        .notes
                        .push(format!("exiftool falló ({error}); se aplicó solo la limpieza estructural"));
                    None
                }
                Err(error) => return Err(error),
            }
        }
        PdfMode::LibraryOnly => {
            report.notes.push(
                "exiftool no está disponible; se aplicó solo la limpieza estructural".to_string(),
            );
            None
        }
    };

    let source = exiftool_copy.as_ref().map_or(input, |staged| staged.path());
    let mut doc = Document::load(source).map_err(|e| pdf_error(input, e))?;
    if doc.trailer.has(b"Encrypt") {
        return Err(ScrubError::unsupported(input, "el PDF está cifrado"));
    }

    let removed = strip_document(&mut doc);
    debug!(removed, "entradas de metadata eliminadas del PDF");

    let mut output = staging_file(target)?;
    {
        let mut writer = BufWriter::new(output.as_file_mut());
        doc.save_to(&mut writer)
            .and_then(|()| writer.flush())
            .map_err(|e| ScrubError::io("escribir", target, e))?;
    }
    drop(exiftool_copy);

    let saved = Document::load(output.path()).map_err(|e| pdf_error(target, e))?;
    for field in residual_fields(&saved) {
        if !report.residual.contains(&field) {
            report.residual.push(field);
        }
    }
    for field in &report.residual {
        warn!(input = %input.display(), field = %field, "metadata residual en el PDF");
    }

    commit(output, input, target)?;
    info!(input = %input.display(), output = %target.display(), ?mode, "PDF limpio");
    Ok(report)
}

/// Fallos de exiftool que permiten continuar solo con lopdf. Un tiempo límite agotado no lo es.
fn degradable(error: &ScrubError) -> bool {
    matches!(
        error.kind(),
        FailureKind::ExternalToolMissing | FailureKind::ExternalToolFailed
    )
}

fn pdf_error(path: &Path, source: lopdf::Error) -> ScrubError {
    ScrubError::Pdf {
        path: path.to_path_buf(),
        source,
    }
}

/// Quita la metadata del trailer y de todos los objetos, y purga lo que quedó huérfano.
fn strip_document(doc: &mut Document) -> usize {
    let mut removed = 0;
    for key in STRIPPED_TRAILER_KEYS {
        removed += usize::from(doc.trailer.remove(key).is_some());
    }

    for object in doc.objects.values_mut() {
        if let Some(dict) = dictionary_mut(object) {
            for key in STRIPPED_KEYS {
                removed += usize::from(dict.remove(key).is_some());
            }
        }
    }

    let pruned = doc.prune_objects();
    debug!(pruned = pruned.len(), "objetos huérfanos eliminados");
    removed
}

fn dictionary_mut(object: &mut Object) -> Option<&mut Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&mut stream.dict),
        _ => None,
    }
}

fn dictionary(object: &Object) -> Option<&Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Nombres de las entradas de metadata que siguen presentes en el documento.
fn residual_fields(doc: &Document) -> Vec<String> {
    let mut found = BTreeSet::new();
    for key in [b"Info".as_slice(), b"Encrypt".as_slice()] {
        if doc.trailer.has(key) {
            found.insert(String::from_utf8_lossy(key).into_owned());
        }
    }
    for dict in doc.objects.values().filter_map(dictionary) {
        for key in STRIPPED_KEYS {
            if dict.has(key) {
                found.insert(String::from_utf8_lossy(key).into_owned());
            }
        }
    }
    found.into_iter().collect()
}

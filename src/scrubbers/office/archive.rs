use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Result, ScrubError};

/// Copia el paquete `input` en `output` transformando solo las partes de `parts`.
///
/// Las demás entradas se copian en crudo, sin descomprimir. La transformación
/// devuelve `None` cuando la parte no necesita cambios. Devuelve cuántas
/// partes se reescribieron.
pub(super) fn rewrite_package<F>(
    input: &Path,
    output: &mut File,
    parts: &[&str],
    mut transform: F,
) -> Result<usize>
where
    F: FnMut(&str, &[u8]) -> Result<Option<Vec<u8>>>,
{
    let archive_error = |source| ScrubError::Archive {
        path: input.to_path_buf(),
        source,
    };

    let source = File::open(input).map_err(|e| ScrubError::io("abrir", input, e))?;
    let mut archive = ZipArchive::new(source).map_err(archive_error)?;
    let mut writer = ZipWriter::new(output);
    let mut rewritten = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(archive_error)?;
        let name = entry.name().to_string();

        if entry.is_dir() || !parts.contains(&name.as_str()) {
            writer.raw_copy_file(entry).map_err(archive_error)?;
            continue;
        }

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| ScrubError::io("leer una parte de", input, e))?;

        let mut options = FileOptions::<'_, ()>::default().compression_method(entry.compression());
        if let Some(mode) = entry.unix_mode() {
            options = options.unix_permissions(mode);
        }
        if let Some(time) = entry.last_modified() {
            options = options.last_modified_time(time);
        }

        let data = match transform(&name, &contents)? {
            Some(sanitized) => {
                rewritten += 1;
                sanitized
            }
            None => contents,
        };

        writer.start_file(name, options).map_err(archive_error)?;
        writer
            .write_all(&data)
            .map_err(|e| ScrubError::io("escribir el paquete limpio de", input, e))?;
    }

    writer.finish().map_err(archive_error)?;
    Ok(rewritten)
}

/// Lee una parte del paquete; `None` si no existe.
pub(super) fn read_part(archive: &mut ZipArchive<File>, path: &Path, part: &str) -> Result<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(part) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(source) => {
            return Err(ScrubError::Archive {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let mut contents = Vec::new();
    entry
        .read_to_end(&mut contents)
        .map_err(|e| ScrubError::io("leer una parte de", path, e))?;
    Ok(Some(contents))
}

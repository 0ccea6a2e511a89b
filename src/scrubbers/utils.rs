//! Utilidades compartidas para escribir a un temporal y reemplazar el destino.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

use crate::error::{Result, ScrubError};

/// Ruta hermana `<nombre>.scrubbed.<ext>` usada cuando no se indica salida.
pub fn scrubbed_sibling(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.scrubbed.{}", ext.to_string_lossy()),
        None => format!("{stem}.scrubbed"),
    };
    path.with_file_name(name)
}

/// Crea un archivo temporal oculto en el mismo directorio que `target`.
///
/// Conserva la extensión para que las herramientas externas detecten el
/// formato. Se elimina solo si no llega a confirmarse con [`commit`].
pub(crate) fn staging_file(target: &Path) -> Result<NamedTempFile> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stem = target.file_stem().unwrap_or_default().to_string_lossy();
    let suffix = target
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    Builder::new()
        .prefix(&format!(".{stem}_bleach_"))
        .suffix(&suffix)
        .tempfile_in(parent)
        .map_err(|e| ScrubError::io("crear un archivo temporal en", parent, e))
}

/// Copia el original a un temporal junto a `target` para editarlo allí.
pub(crate) fn staged_copy(input: &Path, target: &Path) -> Result<NamedTempFile> {
    let staged = staging_file(target)?;
    fs::copy(input, staged.path()).map_err(|e| ScrubError::io("copiar", input, e))?;
    Ok(staged)
}

/// Renombra el temporal sobre `target` copiando antes los permisos del original.
pub(crate) fn commit(staged: NamedTempFile, source: &Path, target: &Path) -> Result<()> {
    if let Ok(metadata) = fs::metadata(source) {
        fs::set_permissions(staged.path(), metadata.permissions())
            .map_err(|e| ScrubError::io("ajustar permisos de", staged.path(), e))?;
    }

    staged
        .persist(target)
        .map_err(|e| ScrubError::io("reemplazar", target, e.error))?;
    Ok(())
}

/// Nombre de archivo para mensajes al usuario.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sibling_keeps_extension() {
        assert_eq!(
            scrubbed_sibling(Path::new("/fotos/photo.jpg")),
            PathBuf::from("/fotos/photo.scrubbed.jpg")
        );
        assert_eq!(
            scrubbed_sibling(Path::new("archivo.tar.gz")),
            PathBuf::from("archivo.tar.scrubbed.gz")
        );
        assert_eq!(
            scrubbed_sibling(Path::new("Makefile")),
            PathBuf::from("Makefile.scrubbed")
        );
    }

    #[test]
    fn uncommitted_staging_file_is_removed() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let target = dir.path().join("video.mp4");
        let staged_path = {
            let staged = staging_file(&target)?;
            assert_eq!(staged.path().extension().and_then(|e| e.to_str()), Some("mp4"));
            assert_eq!(staged.path().parent(), Some(dir.path()));
            staged.path().to_path_buf()
        };
        assert!(!staged_path.exists());
        Ok(())
    }

    #[test]
    fn commit_replaces_target_atomically() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let target = dir.path().join("nota.txt");
        fs::write(&target, "viejo")?;

        let staged = staging_file(&target)?;
        fs::write(staged.path(), "nuevo")?;
        commit(staged, &target, &target)?;

        assert_eq!(fs::read_to_string(&target)?, "nuevo");
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }
}

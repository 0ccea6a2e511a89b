//! Enrutamiento de solicitudes hacia la estrategia de cada tipo de archivo.
//!
//! El orden de los pasos es parte del contrato: ningún archivo se escribe
//! antes de validar la entrada, detectar su tipo y comprobar que las
//! herramientas externas necesarias existen; el respaldo, si se pidió, queda
//! completo antes de que la estrategia toque el original.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::backup::{BackupStatus, maybe_backup};
use crate::config::ToolConfig;
use crate::error::{Result, ScrubError};
use crate::file_type::{FileKind, TypeCache, ensure_file};
use crate::request::{ScrubRequest, ScrubResult};
use crate::scrubbers::{
    MediaKind, PdfMode, PropertyScope, StrategyReport, scrub_image, scrub_media, scrub_office,
    scrub_pdf, scrub_raw, scrub_text, scrubbed_sibling,
};
use crate::tool;

/// Resultado tipado de una limpieza exitosa.
#[derive(Clone, Debug)]
pub struct ScrubOutcome {
    pub kind: FileKind,
    pub output: PathBuf,
    pub in_place: bool,
    pub report: StrategyReport,
    pub backup: BackupStatus,
}

impl ScrubOutcome {
    /// Convierte el resultado en un [`ScrubResult`], pasando a advertencias el
    /// respaldo fallido, los campos residuales y las notas de la estrategia.
    pub fn into_result(self, input: &Path) -> ScrubResult {
        let mut warnings = Vec::new();
        if let BackupStatus::Failed(reason) = &self.backup {
            warnings.push(reason.clone());
        }
        if self.report.is_partial() {
            warnings.push(format!(
                "limpieza parcial; persisten: {}",
                self.report.residual.join(", ")
            ));
        }
        warnings.extend(self.report.notes.iter().cloned());

        ScrubResult {
            success: true,
            message: self.report.message,
            input: input.to_path_buf(),
            output: Some(self.output),
            kind: Some(self.kind),
            in_place: self.in_place,
            failure: None,
            warnings,
            backup: self.backup.record().cloned(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    config: ToolConfig,
}

impl Dispatcher {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Ejecuta la solicitud y devuelve siempre un resultado, exitoso o no.
    ///
    /// Si la estrategia falla después de crear el respaldo, el resultado
    /// conserva el registro del respaldo.
    pub fn scrub(&self, cache: &mut TypeCache, request: &ScrubRequest) -> ScrubResult {
        let mut backup = BackupStatus::Skipped;
        match self.run(cache, request, &mut backup) {
            Ok(outcome) => outcome.into_result(&request.input),
            Err(error) => {
                warn!(input = %request.input.display(), %error, "limpieza fallida");
                let kind = cache.get(&request.input).map(|info| info.kind);
                ScrubResult::failed(&request.input, kind, &error).with_backup_status(&backup)
            }
        }
    }

    pub fn try_scrub(&self, cache: &mut TypeCache, request: &ScrubRequest) -> Result<ScrubOutcome> {
        self.run(cache, request, &mut BackupStatus::Skipped)
    }

    fn run(
        &self,
        cache: &mut TypeCache,
        request: &ScrubRequest,
        backup: &mut BackupStatus,
    ) -> Result<ScrubOutcome> {
        let input = request.input.as_path();
        let options = &request.options;

        ensure_file(input)?;
        let kind = cache.classify(input)?.kind;
        if let Some(expected) = request.expected
            && expected != kind
        {
            return Err(ScrubError::KindMismatch {
                path: input.to_path_buf(),
                expected,
                detected: kind,
            });
        }

        let (target, in_place) = resolve_target(kind, request);
        let pdf_mode = self.preflight(kind, options.strict)?;
        debug!(
            input = %input.display(),
            output = %target.display(),
            %kind,
            in_place,
            "solicitud validada"
        );

        *backup = maybe_backup(input, options.backup);

        let report = match kind {
            FileKind::Image => scrub_image(input, &target)?,
            FileKind::Pdf => scrub_pdf(
                input,
                &target,
                pdf_mode.unwrap_or(PdfMode::LibraryOnly),
                options.strict,
                &self.config,
            )?,
            FileKind::Video => scrub_media(MediaKind::Video, input, &target, options, &self.config)?,
            FileKind::Audio => scrub_media(MediaKind::Audio, input, &target, options, &self.config)?,
            FileKind::Raw => scrub_raw(input, &target, &self.config)?,
            FileKind::Docx => scrub_office(
                input,
                &target,
                PropertyScope::from_all_properties(options.all_properties),
            )?,
            FileKind::Text => scrub_text(input, &target, &options.prefixes)?,
        };

        Ok(ScrubOutcome {
            kind,
            output: target,
            in_place,
            report,
            backup: backup.clone(),
        })
    }

    /// Comprueba que las herramientas externas existen antes de escribir nada.
    ///
    /// Para PDF devuelve el modo a usar: sin exiftool se degrada a la limpieza
    /// con biblioteca, salvo en modo estricto.
    fn preflight(&self, kind: FileKind, strict: bool) -> Result<Option<PdfMode>> {
        let (tool_name, program) = match kind {
            FileKind::Video | FileKind::Audio => ("ffmpeg", &self.config.ffmpeg),
            FileKind::Raw | FileKind::Pdf => ("exiftool", &self.config.exiftool),
            FileKind::Image | FileKind::Docx | FileKind::Text => return Ok(None),
        };

        let available = tool::locate(program).is_some();
        match (kind, available) {
            (FileKind::Pdf, true) => Ok(Some(PdfMode::Full)),
            (FileKind::Pdf, false) if !strict => {
                warn!(program = %program.display(), "exiftool no encontrado; el PDF se limpiará solo con lopdf");
                Ok(Some(PdfMode::LibraryOnly))
            }
            (_, true) => Ok(None),
            (_, false) => Err(ScrubError::tool_missing(tool_name, program)),
        }
    }
}

/// Decide el destino y si la operación reemplaza al original.
///
/// Una salida explícita tiene prioridad sobre el comportamiento por defecto
/// del formato; si coincide con la entrada la operación es en sitio.
fn resolve_target(kind: FileKind, request: &ScrubRequest) -> (PathBuf, bool) {
    let input = &request.input;
    if let Some(output) = &request.output {
        return (output.clone(), same_file(input, output));
    }

    let in_place = request
        .options
        .in_place
        .unwrap_or_else(|| kind.in_place_by_default());
    if in_place {
        (input.clone(), true)
    } else {
        (scrubbed_sibling(input), false)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use tempfile::tempdir;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn offline_dispatcher(dir: &Path) -> Dispatcher {
        Dispatcher::new(
            ToolConfig::default()
                .with_ffmpeg(dir.join("no-ffmpeg"))
                .with_exiftool(dir.join("no-exiftool")),
        )
    }

    #[test]
    fn unsupported_input_touches_nothing() -> TestResult {
        let dir = tempdir()?;
        let source = dir.path().join("blob");
        fs::write(&source, [0x00, 0x13, 0x37, 0x00, 0xfe])?;

        let mut cache = TypeCache::new();
        let result = offline_dispatcher(dir.path())
            .scrub(&mut cache, &ScrubRequest::new(&source).with_backup(true));

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::UnsupportedFormat));
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn missing_input_and_directories_are_not_found() -> TestResult {
        let dir = tempdir()?;
        let dispatcher = offline_dispatcher(dir.path());
        let mut cache = TypeCache::new();

        let missing = dispatcher.scrub(&mut cache, &ScrubRequest::new(dir.path().join("nada.jpg")));
        assert_eq!(missing.failure, Some(FailureKind::NotFound));

        let directory = dispatcher.scrub(&mut cache, &ScrubRequest::new(dir.path()));
        assert_eq!(directory.failure, Some(FailureKind::NotFound));
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn text_defaults_to_sibling_with_backup() -> TestResult {
        let dir = tempdir()?;
        let source = dir.path().join("notas.txt");
        fs::write(&source, "# privado\nvisible\n")?;

        let mut cache = TypeCache::new();
        let result = offline_dispatcher(dir.path())
            .scrub(&mut cache, &ScrubRequest::new(&source).with_backup(true));

        assert!(result.success, "{}", result.message);
        assert!(!result.in_place);
        assert_eq!(result.output, Some(dir.path().join("notas.scrubbed.txt")));
        assert_eq!(fs::read_to_string(dir.path().join("notas.scrubbed.txt"))?, "visible\n");
        assert_eq!(fs::read_to_string(&source)?, "# privado\nvisible\n");

        let backup = result.backup.expect("se pidió respaldo");
        assert_eq!(backup.backup, dir.path().join("notas.txt.backup"));
        assert_eq!(fs::read(&backup.backup)?, fs::read(&source)?);
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn explicit_in_place_and_output_equal_to_input() -> TestResult {
        let dir = tempdir()?;
        let source = dir.path().join("config.ini");
        fs::write(&source, "; generado por ana\nclave=valor\n")?;
        let dispatcher = offline_dispatcher(dir.path());
        let mut cache = TypeCache::new();

        let result = dispatcher.scrub(&mut cache, &ScrubRequest::new(&source).with_in_place(true));
        assert!(result.success && result.in_place);
        assert_eq!(fs::read_to_string(&source)?, "clave=valor\n");

        fs::write(&source, "; otra vez\nclave=valor\n")?;
        let result = dispatcher.scrub(&mut cache, &ScrubRequest::new(&source).with_output(&source));
        assert!(result.success && result.in_place);
        assert_eq!(fs::read_to_string(&source)?, "clave=valor\n");
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn backup_failure_is_a_warning() -> TestResult {
        let dir = tempdir()?;
        let source = dir.path().join("app.log");
        fs::write(&source, "// traza\nlinea\n")?;
        fs::create_dir(dir.path().join("app.log.backup"))?;

        let mut cache = TypeCache::new();
        let result = offline_dispatcher(dir.path())
            .scrub(&mut cache, &ScrubRequest::new(&source).with_backup(true));

        assert!(result.success);
        assert!(result.backup.is_none());
        assert!(result.warnings.iter().any(|w| w.contains("respaldo")));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn failed_strategy_keeps_backup_record() -> TestResult {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let ffmpeg = dir.path().join("ffmpeg");
        fs::write(&ffmpeg, "#!/bin/sh\necho 'Invalid data' >&2\nexit 1\n")?;
        fs::set_permissions(&ffmpeg, fs::Permissions::from_mode(0o755))?;
        let source = dir.path().join("clip.mp4");
        fs::write(&source, b"video")?;

        let dispatcher = Dispatcher::new(ToolConfig::default().with_ffmpeg(&ffmpeg));
        let mut cache = TypeCache::new();
        let result = dispatcher.scrub(&mut cache, &ScrubRequest::new(&source).with_backup(true));

        assert_eq!(result.failure, Some(FailureKind::ExternalToolFailed));
        let backup = result.backup.expect("el respaldo existe en disco");
        assert_eq!(backup.backup, dir.path().join("clip.mp4.backup"));
        assert_eq!(fs::read(&backup.backup)?, b"video");
        assert_eq!(fs::read(&source)?, b"video");
        Ok(())
    }

    #[test]
    fn expected_kind_mismatch_is_unsupported() -> TestResult {
        let dir = tempdir()?;
        let source = dir.path().join("notas.md");
        fs::write(&source, "texto\n")?;

        let mut cache = TypeCache::new();
        let result = offline_dispatcher(dir.path())
            .scrub(&mut cache, &ScrubRequest::for_kind(FileKind::Image, &source));

        assert_eq!(result.failure, Some(FailureKind::UnsupportedFormat));
        assert_eq!(result.kind, Some(FileKind::Text));
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn missing_tool_fails_before_backup() -> TestResult {
        let dir = tempdir()?;
        let video = dir.path().join("clip.mp4");
        let raw = dir.path().join("foto.nef");
        fs::write(&video, b"video")?;
        fs::write(&raw, b"raw")?;
        let dispatcher = offline_dispatcher(dir.path());
        let mut cache = TypeCache::new();

        for path in [&video, &raw] {
            let result = dispatcher.scrub(&mut cache, &ScrubRequest::new(path).with_backup(true));
            assert_eq!(result.failure, Some(FailureKind::ExternalToolMissing));
        }
        assert_eq!(fs::read(&video)?, b"video");
        assert_eq!(fs::read_dir(dir.path())?.count(), 2);
        Ok(())
    }

    #[test]
    fn strict_pdf_requires_exiftool() -> TestResult {
        let dir = tempdir()?;
        let source = dir.path().join("informe.pdf");
        fs::write(&source, b"%PDF-1.4\n")?;

        let mut cache = TypeCache::new();
        let result = offline_dispatcher(dir.path())
            .scrub(&mut cache, &ScrubRequest::new(&source).with_strict(true));

        assert_eq!(result.failure, Some(FailureKind::ExternalToolMissing));
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn media_defaults_to_in_place_unless_output_given() {
        let request = ScrubRequest::new("/videos/clip.mp4");
        assert_eq!(
            resolve_target(FileKind::Video, &request),
            (PathBuf::from("/videos/clip.mp4"), true)
        );

        let request = ScrubRequest::new("/videos/clip.mp4").with_in_place(false);
        assert_eq!(
            resolve_target(FileKind::Video, &request),
            (PathBuf::from("/videos/clip.scrubbed.mp4"), false)
        );

        let request = ScrubRequest::new("/videos/clip.mp4").with_output("/tmp/limpio.mp4");
        assert_eq!(
            resolve_target(FileKind::Video, &request),
            (PathBuf::from("/tmp/limpio.mp4"), false)
        );

        let request = ScrubRequest::new("/fotos/photo.jpg");
        assert_eq!(
            resolve_target(FileKind::Image, &request),
            (PathBuf::from("/fotos/photo.scrubbed.jpg"), false)
        );
    }
}

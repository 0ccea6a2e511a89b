//! Solicitudes de limpieza y resultados devueltos al llamador.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::backup::{BackupRecord, BackupStatus};
use crate::error::{FailureKind, ScrubError};
use crate::file_type::FileKind;

/// Prefijos de comentario usados cuando no se indica ninguno.
pub const DEFAULT_COMMENT_PREFIXES: [&str; 3] = ["#", "//", ";"];

/// Preajuste de velocidad del codificador x264.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Preset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    #[default]
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl Preset {
    pub const NAMES: [&'static str; 9] = [
        "ultrafast",
        "superfast",
        "veryfast",
        "faster",
        "fast",
        "medium",
        "slow",
        "slower",
        "veryslow",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Ultrafast => "ultrafast",
            Preset::Superfast => "superfast",
            Preset::Veryfast => "veryfast",
            Preset::Faster => "faster",
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Slower => "slower",
            Preset::Veryslow => "veryslow",
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "ultrafast" => Ok(Preset::Ultrafast),
            "superfast" => Ok(Preset::Superfast),
            "veryfast" => Ok(Preset::Veryfast),
            "faster" => Ok(Preset::Faster),
            "fast" => Ok(Preset::Fast),
            "medium" => Ok(Preset::Medium),
            "slow" => Ok(Preset::Slow),
            "slower" => Ok(Preset::Slower),
            "veryslow" => Ok(Preset::Veryslow),
            other => Err(format!(
                "preajuste desconocido `{other}`; usa uno de: {}",
                Preset::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calidad VBR de LAME: 0 es la mejor, 9 la peor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioQuality(u8);

impl AudioQuality {
    pub const BEST: u8 = 0;
    pub const WORST: u8 = 9;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::WORST).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for AudioQuality {
    fn default() -> Self {
        Self(2)
    }
}

impl FromStr for AudioQuality {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(AudioQuality::new)
            .ok_or_else(|| {
                format!(
                    "calidad inválida `{value}`; debe estar entre {} y {}",
                    Self::BEST,
                    Self::WORST
                )
            })
    }
}

/// Convierte una lista separada por comas en prefijos, descartando los vacíos.
pub fn parse_prefixes(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect()
}

/// Opciones compartidas por todas las estrategias; cada una usa las suyas.
#[derive(Clone, Debug)]
pub struct ScrubOptions {
    pub backup: bool,
    /// `None` aplica el comportamiento por defecto del formato.
    pub in_place: Option<bool>,
    pub reencode: bool,
    pub preset: Preset,
    pub quality: AudioQuality,
    pub prefixes: Vec<String>,
    /// En PDF, exige exiftool en lugar de degradar a la limpieza con biblioteca.
    pub strict: bool,
    /// En documentos Office, limpia también `app.xml` y `custom.xml`.
    pub all_properties: bool,
}

impl Default for ScrubOptions {
    fn default() -> Self {
        Self {
            backup: false,
            in_place: None,
            reencode: false,
            preset: Preset::default(),
            quality: AudioQuality::default(),
            prefixes: DEFAULT_COMMENT_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            strict: false,
            all_properties: false,
        }
    }
}

/// Solicitud inmutable; los métodos `with_*` consumen y devuelven una copia.
#[derive(Clone, Debug)]
pub struct ScrubRequest {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    /// Tipo esperado; `None` acepta lo que detecte el clasificador.
    pub expected: Option<FileKind>,
    pub options: ScrubOptions,
}

impl ScrubRequest {
    pub fn new(input: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: None,
            expected: None,
            options: ScrubOptions::default(),
        }
    }

    pub fn for_kind(kind: FileKind, input: impl AsRef<Path>) -> Self {
        Self::new(input).expecting(kind)
    }

    pub fn expecting(mut self, kind: FileKind) -> Self {
        self.expected = Some(kind);
        self
    }

    pub fn with_output(mut self, output: impl AsRef<Path>) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.options.backup = backup;
        self
    }

    pub fn with_in_place(mut self, in_place: bool) -> Self {
        self.options.in_place = Some(in_place);
        self
    }

    pub fn with_reencode(mut self, reencode: bool) -> Self {
        self.options.reencode = reencode;
        self
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.options.preset = preset;
        self
    }

    pub fn with_quality(mut self, quality: AudioQuality) -> Self {
        self.options.quality = quality;
        self
    }

    /// Reemplaza los prefijos de comentario; una lista vacía conserva los de por defecto.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|prefix| !prefix.is_empty())
            .collect();
        if !prefixes.is_empty() {
            self.options.prefixes = prefixes;
        }
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn with_all_properties(mut self, all_properties: bool) -> Self {
        self.options.all_properties = all_properties;
        self
    }
}

/// Resultado terminal de una limpieza. No se persiste.
#[derive(Clone, Debug, Serialize)]
pub struct ScrubResult {
    pub success: bool,
    pub message: String,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub kind: Option<FileKind>,
    pub in_place: bool,
    pub failure: Option<FailureKind>,
    /// Advertencias no fatales: respaldo fallido, campos residuales, modo degradado.
    pub warnings: Vec<String>,
    pub backup: Option<BackupRecord>,
}

impl ScrubResult {
    pub(crate) fn failed(input: &Path, kind: Option<FileKind>, error: &ScrubError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            input: input.to_path_buf(),
            output: None,
            kind,
            in_place: false,
            failure: Some(error.kind()),
            warnings: Vec::new(),
            backup: None,
        }
    }

    /// Añade al resultado el estado del respaldo: el registro si se creó, la
    /// razón como advertencia si falló.
    pub(crate) fn with_backup_status(mut self, backup: &BackupStatus) -> Self {
        match backup {
            BackupStatus::Created(record) => self.backup = Some(record.clone()),
            BackupStatus::Failed(reason) => self.warnings.push(reason.clone()),
            BackupStatus::Skipped => {}
        }
        self
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_parse_case_insensitively() {
        assert_eq!("Fast".parse::<Preset>(), Ok(Preset::Fast));
        assert_eq!("veryslow".parse::<Preset>(), Ok(Preset::Veryslow));
        assert!("turbo".parse::<Preset>().is_err());
        assert_eq!(Preset::default().as_str(), "medium");
    }

    #[test]
    fn audio_quality_is_bounded() {
        assert_eq!("0".parse::<AudioQuality>().map(AudioQuality::value), Ok(0));
        assert_eq!("9".parse::<AudioQuality>().map(AudioQuality::value), Ok(9));
        assert!("10".parse::<AudioQuality>().is_err());
        assert!("-1".parse::<AudioQuality>().is_err());
        assert_eq!(AudioQuality::default().value(), 2);
    }

    #[test]
    fn prefix_list_drops_empty_entries() {
        assert_eq!(parse_prefixes("#, //,,;"), vec!["#", "//", ";"]);
        assert!(parse_prefixes(" , ").is_empty());
    }

    #[test]
    fn empty_prefix_override_keeps_defaults() {
        let request = ScrubRequest::new("a.txt").with_prefixes(Vec::<String>::new());
        assert_eq!(request.options.prefixes, vec!["#", "//", ";"]);

        let request = ScrubRequest::new("a.txt").with_prefixes(["--"]);
        assert_eq!(request.options.prefixes, vec!["--"]);
    }
}

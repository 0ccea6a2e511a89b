use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use bleach::request::parse_prefixes;
use bleach::{AudioQuality, FileKind, Preset, ScrubRequest, ToolConfig};

/// Elimina metadata identificable de imágenes, PDF, multimedia, RAW, Office y texto.
#[derive(Parser, Debug)]
#[command(name = "bleach")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Nivel de detalle de los registros (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Imprime el resultado como JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Ruta del binario de ffmpeg
    #[arg(long, env = "BLEACH_FFMPEG", value_name = "RUTA", global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// Ruta del binario de exiftool
    #[arg(long, env = "BLEACH_EXIFTOOL", value_name = "RUTA", global = true)]
    pub exiftool: Option<PathBuf>,

    /// Tiempo límite en segundos para cualquier herramienta externa
    #[arg(long, env = "BLEACH_TIMEOUT", value_name = "SEGUNDOS", global = true)]
    pub timeout: Option<u64>,
}

impl Cli {
    pub fn tool_config(&self) -> ToolConfig {
        let mut config = ToolConfig::default();
        if let Some(ffmpeg) = &self.ffmpeg {
            config = config.with_ffmpeg(ffmpeg);
        }
        if let Some(exiftool) = &self.exiftool {
            config = config.with_exiftool(exiftool);
        }
        if let Some(seconds) = self.timeout {
            config = config.with_timeout(Duration::from_secs(seconds));
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconstruye una imagen solo a partir de sus píxeles
    Image(SiblingArgs),
    /// Borra información del documento, XMP, anotaciones y formularios de un PDF
    Pdf(PdfArgs),
    /// Quita la metadata del contenedor de un video (en sitio por defecto)
    Video(VideoArgs),
    /// Quita las etiquetas de un archivo de audio (en sitio por defecto)
    Audio(AudioArgs),
    /// Borra todas las etiquetas de una fotografía RAW con exiftool
    Raw(SiblingArgs),
    /// Limpia las propiedades de un documento Office (docx, xlsx, pptx)
    Docx(DocxArgs),
    /// Elimina líneas de comentario de un archivo de texto
    Text(TextArgs),
    /// Detecta el tipo de archivo y aplica la limpieza correspondiente
    Auto(AutoArgs),
}

#[derive(Args, Debug)]
pub struct PathArgs {
    /// Archivo a limpiar
    pub input: PathBuf,

    /// Archivo de salida (por defecto `<nombre>.scrubbed.<ext>` o en sitio)
    pub output: Option<PathBuf>,

    /// Copia el original a `<archivo>.backup` antes de modificar nada
    #[arg(long)]
    pub backup: bool,
}

/// Formatos que por defecto escriben una copia hermana.
#[derive(Args, Debug)]
pub struct SiblingArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Sobrescribe el original en lugar de crear una copia
    #[arg(long)]
    pub in_place: bool,
}

/// Formatos que por defecto se limpian en sitio.
#[derive(Args, Debug)]
pub struct MediaArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Escribe `<nombre>.scrubbed.<ext>` en lugar de sobrescribir
    #[arg(long)]
    pub no_inplace: bool,

    /// Recodifica los flujos además de quitar la metadata del contenedor
    #[arg(long)]
    pub reencode: bool,
}

#[derive(Args, Debug)]
pub struct VideoArgs {
    #[command(flatten)]
    pub media: MediaArgs,

    /// Preajuste de velocidad de x264 (ultrafast … veryslow)
    #[arg(long, default_value = "medium", value_name = "VELOCIDAD")]
    pub preset: Preset,
}

#[derive(Args, Debug)]
pub struct AudioArgs {
    #[command(flatten)]
    pub media: MediaArgs,

    /// Calidad VBR de LAME, de 0 (mejor) a 9 (peor)
    #[arg(long, default_value = "2", value_name = "0-9")]
    pub quality: AudioQuality,
}

#[derive(Args, Debug)]
pub struct PdfArgs {
    #[command(flatten)]
    pub sibling: SiblingArgs,

    /// Falla si exiftool no está disponible en lugar de limpiar solo con lopdf
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct DocxArgs {
    #[command(flatten)]
    pub sibling: SiblingArgs,

    /// Limpia también app.xml y custom.xml
    #[arg(long)]
    pub all_properties: bool,
}

#[derive(Args, Debug)]
pub struct TextArgs {
    #[command(flatten)]
    pub sibling: SiblingArgs,

    /// Prefijos de comentario separados por comas (por defecto "#,//,;")
    #[arg(long, value_name = "LISTA", allow_hyphen_values = true)]
    pub prefixes: Option<String>,
}

#[derive(Args, Debug)]
pub struct AutoArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Sobrescribe el original
    #[arg(long, conflicts_with = "no_inplace")]
    pub in_place: bool,

    /// Escribe una copia hermana aunque el formato se limpie en sitio por defecto
    #[arg(long)]
    pub no_inplace: bool,

    /// Recodifica video o audio
    #[arg(long)]
    pub reencode: bool,

    /// Preajuste de x264 al recodificar video
    #[arg(long, default_value = "medium", value_name = "VELOCIDAD")]
    pub preset: Preset,

    /// Calidad de LAME al recodificar audio
    #[arg(long, default_value = "2", value_name = "0-9")]
    pub quality: AudioQuality,

    /// Prefijos de comentario para archivos de texto
    #[arg(long, value_name = "LISTA", allow_hyphen_values = true)]
    pub prefixes: Option<String>,

    /// En PDF, exige exiftool
    #[arg(long)]
    pub strict: bool,

    /// En Office, limpia también app.xml y custom.xml
    #[arg(long)]
    pub all_properties: bool,
}

impl PathArgs {
    fn request(self, kind: Option<FileKind>) -> ScrubRequest {
        let mut request = ScrubRequest::new(&self.input).with_backup(self.backup);
        if let Some(kind) = kind {
            request = request.expecting(kind);
        }
        if let Some(output) = self.output {
            request = request.with_output(output);
        }
        request
    }
}

impl SiblingArgs {
    fn request(self, kind: FileKind) -> ScrubRequest {
        let in_place = self.in_place;
        let request = self.paths.request(Some(kind));
        if in_place { request.with_in_place(true) } else { request }
    }
}

impl MediaArgs {
    fn request(self, kind: FileKind) -> ScrubRequest {
        let (no_inplace, reencode) = (self.no_inplace, self.reencode);
        let request = self.paths.request(Some(kind)).with_reencode(reencode);
        if no_inplace { request.with_in_place(false) } else { request }
    }
}

fn prefixes_or_default(request: ScrubRequest, prefixes: Option<&str>) -> ScrubRequest {
    match prefixes {
        Some(list) => request.with_prefixes(parse_prefixes(list)),
        None => request,
    }
}

impl Command {
    /// Traduce el subcomando a una solicitud de limpieza.
    pub fn into_request(self) -> ScrubRequest {
        match self {
            Command::Image(args) => args.request(FileKind::Image),
            Command::Raw(args) => args.request(FileKind::Raw),
            Command::Pdf(args) => args.sibling.request(FileKind::Pdf).with_strict(args.strict),
            Command::Docx(args) => args
                .sibling
                .request(FileKind::Docx)
                .with_all_properties(args.all_properties),
            Command::Text(args) => {
                let request = args.sibling.request(FileKind::Text);
                prefixes_or_default(request, args.prefixes.as_deref())
            }
            Command::Video(args) => args.media.request(FileKind::Video).with_preset(args.preset),
            Command::Audio(args) => args.media.request(FileKind::Audio).with_quality(args.quality),
            Command::Auto(args) => {
                let mut request = args
                    .paths
                    .request(None)
                    .with_reencode(args.reencode)
                    .with_preset(args.preset)
                    .with_quality(args.quality)
                    .with_strict(args.strict)
                    .with_all_properties(args.all_properties);
                if args.in_place {
                    request = request.with_in_place(true);
                } else if args.no_inplace {
                    request = request.with_in_place(false);
                }
                prefixes_or_default(request, args.prefixes.as_deref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("argumentos válidos")
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn video_is_in_place_unless_disabled() {
        let request = parse(&["bleach", "video", "clip.mp4"]).command.into_request();
        assert_eq!(request.expected, Some(FileKind::Video));
        assert_eq!(request.options.in_place, None);

        let request = parse(&["bleach", "video", "clip.mp4", "--no-inplace", "--reencode", "--preset", "fast"])
            .command
            .into_request();
        assert_eq!(request.options.in_place, Some(false));
        assert!(request.options.reencode);
        assert_eq!(request.options.preset, Preset::Fast);
    }

    #[test]
    fn audio_quality_is_validated() {
        assert!(Cli::try_parse_from(["bleach", "audio", "a.mp3", "--quality", "12"]).is_err());
        let request = parse(&["bleach", "audio", "a.mp3", "--quality", "0"]).command.into_request();
        assert_eq!(request.options.quality.value(), 0);
    }

    #[test]
    fn text_prefixes_and_output() {
        let request = parse(&["bleach", "text", "a.sql", "b.sql", "--prefixes", "%, #", "--backup"])
            .command
            .into_request();
        assert_eq!(request.options.prefixes, vec!["%", "#"]);
        assert_eq!(request.output, Some(PathBuf::from("b.sql")));
        assert!(request.options.backup);
    }

    #[test]
    fn global_flags_build_tool_config() {
        let cli = parse(&["bleach", "-vv", "raw", "x.nef", "--exiftool", "/opt/exiftool", "--timeout", "5"]);
        assert_eq!(cli.verbose, 2);
        let config = cli.tool_config();
        assert_eq!(config.exiftool, PathBuf::from("/opt/exiftool"));
        assert_eq!(config.exiftool_timeout, Duration::from_secs(5));
    }
}

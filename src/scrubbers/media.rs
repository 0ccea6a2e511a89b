//! Limpieza de video y audio delegada en ffmpeg.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::ToolConfig;
use crate::error::Result;
use crate::request::ScrubOptions;
use crate::tool::{self, ToolInvocation};

use super::StrategyReport;
use super::utils::{commit, display_name, staging_file};

/// Tipo de contenedor multimedia; decide el códec de recodificación y el tiempo límite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    fn timeout(self, config: &ToolConfig) -> Duration {
        match self {
            MediaKind::Video => config.video_timeout,
            MediaKind::Audio => config.audio_timeout,
        }
    }

    fn codec_args(self, options: &ScrubOptions) -> Vec<String> {
        if !options.reencode {
            return vec!["-c".into(), "copy".into()];
        }
        match self {
            MediaKind::Video => vec![
                "-c:v".into(),
                "libx264".into(),
                "-preset".into(),
                options.preset.to_string(),
                "-crf".into(),
                "20".into(),
                "-c:a".into(),
                "aac".into(),
            ],
            MediaKind::Audio => vec![
                "-c:a".into(),
                "libmp3lame".into(),
                "-q:a".into(),
                options.quality.value().to_string(),
            ],
        }
    }
}

/// Argumentos de ffmpeg para copiar `input` a `output` sin metadata global ni capítulos.
fn ffmpeg_args(kind: MediaKind, input: &Path, output: &Path, options: &ScrubOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-hide_banner", "-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_os_string());
    args.extend(
        ["-map_metadata", "-1", "-map_chapters", "-1"]
            .into_iter()
            .map(OsString::from),
    );
    args.extend(kind.codec_args(options).into_iter().map(OsString::from));
    args.push(output.as_os_str().to_os_string());
    args
}

/// Ejecuta ffmpeg hacia un temporal y lo renombra sobre `target` solo si terminó bien.
///
/// Si el proceso excede el tiempo límite se detiene, el temporal se elimina y
/// `input` queda intacto.
pub fn scrub_media(
    kind: MediaKind,
    input: &Path,
    target: &Path,
    options: &ScrubOptions,
    config: &ToolConfig,
) -> Result<StrategyReport> {
    let staged = staging_file(target)?;
    let invocation = ToolInvocation {
        tool: "ffmpeg",
        program: &config.ffmpeg,
        args: ffmpeg_args(kind, input, staged.path(), options),
        timeout: kind.timeout(config),
        poll_interval: config.poll_interval,
    };
    tool::run(&invocation)?.into_checked("ffmpeg")?;

    commit(staged, input, target)?;
    info!(
        input = %input.display(),
        output = %target.display(),
        reencode = options.reencode,
        "multimedia limpia"
    );

    let detail = match (options.reencode, kind) {
        (false, _) => String::new(),
        (true, MediaKind::Video) => format!(" (recodificado, preajuste {})", options.preset),
        (true, MediaKind::Audio) => format!(" (recodificado, calidad {})", options.quality.value()),
    };
    Ok(StrategyReport::new(format!(
        "Limpio: {}{detail}",
        display_name(target)
    )))
}

//! Configuración de las herramientas externas y sus tiempos límite.

use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_FFMPEG: &str = "ffmpeg";
const DEFAULT_EXIFTOOL: &str = "exiftool";
const DEFAULT_VIDEO_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_AUDIO_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_EXIFTOOL_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Ubicación de los binarios externos y límites de ejecución de cada uno.
#[derive(Clone, Debug)]
pub struct ToolConfig {
    pub ffmpeg: PathBuf,
    pub exiftool: PathBuf,
    pub video_timeout: Duration,
    pub audio_timeout: Duration,
    pub exiftool_timeout: Duration,
    /// Frecuencia con la que se consulta si el proceso hijo terminó.
    pub poll_interval: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
            exiftool: PathBuf::from(DEFAULT_EXIFTOOL),
            video_timeout: DEFAULT_VIDEO_TIMEOUT,
            audio_timeout: DEFAULT_AUDIO_TIMEOUT,
            exiftool_timeout: DEFAULT_EXIFTOOL_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ToolConfig {
    pub fn with_ffmpeg(mut self, program: impl AsRef<Path>) -> Self {
        self.ffmpeg = program.as_ref().to_path_buf();
        self
    }

    pub fn with_exiftool(mut self, program: impl AsRef<Path>) -> Self {
        self.exiftool = program.as_ref().to_path_buf();
        self
    }

    /// Aplica el mismo límite a todas las herramientas.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.video_timeout = timeout;
        self.audio_timeout = timeout;
        self.exiftool_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tool_budgets() {
        let config = ToolConfig::default();
        assert_eq!(config.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(config.video_timeout, Duration::from_secs(600));
        assert_eq!(config.audio_timeout, Duration::from_secs(300));
        assert_eq!(config.exiftool_timeout, Duration::from_secs(60));
    }

    #[test]
    fn shared_timeout_overrides_every_tool() {
        let config = ToolConfig::default().with_timeout(Duration::from_secs(5));
        assert_eq!(config.video_timeout, Duration::from_secs(5));
        assert_eq!(config.audio_timeout, Duration::from_secs(5));
        assert_eq!(config.exiftool_timeout, Duration::from_secs(5));
    }
}

//! Bleach elimina metadata identificable de imágenes, PDF, multimedia, RAW,
//! documentos Office y archivos de texto.
//!
//! El punto de entrada es [`Dispatcher`]: clasifica el archivo, comprueba las
//! herramientas externas, crea el respaldo si se pidió y delega en la
//! estrategia del tipo detectado.

pub mod backup;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod file_type;
pub mod request;
pub mod scrubbers;
mod tool;

pub use backup::{BackupRecord, BackupStatus};
pub use config::ToolConfig;
pub use dispatcher::{Dispatcher, ScrubOutcome};
pub use error::{FailureKind, Result, ScrubError};
pub use file_type::{DetectionSignal, FileKind, FileTypeInfo, TypeCache};
pub use request::{AudioQuality, Preset, ScrubOptions, ScrubRequest, ScrubResult};

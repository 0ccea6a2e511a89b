//! Estrategias de limpieza de metadata, una por tipo de archivo.
//!
//! Todas escriben primero en un temporal junto al destino y solo lo renombran
//! sobre él cuando la operación terminó y, si aplica, fue verificada.

mod image;
mod media;
mod office;
mod pdf;
mod raw;
mod text;
mod utils;

pub use self::image::{scrub_image, verify_image_metadata_clean};
pub use self::media::{MediaKind, scrub_media};
pub use self::office::{PropertyScope, scrub_office, verify_office_metadata_clean};
pub use self::pdf::{PdfMode, scrub_pdf};
pub use self::raw::scrub_raw;
pub use self::text::{scrub_text, strip_comment_lines};
pub use self::utils::scrubbed_sibling;

use serde::Serialize;

/// Lo que una estrategia informa al despachador tras una limpieza exitosa.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StrategyReport {
    pub message: String,
    /// Campos detectados que no se pudieron eliminar (limpieza parcial).
    pub residual: Vec<String>,
    /// Observaciones no fatales, como un modo degradado.
    pub notes: Vec<String>,
}

impl StrategyReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.residual.is_empty()
    }
}

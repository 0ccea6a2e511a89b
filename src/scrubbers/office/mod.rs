//! Limpieza de propiedades en documentos Office Open XML (docx, xlsx, pptx).

mod archive;
mod constants;
mod sanitize;
mod verify;
mod xml;

use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, ScrubError};

use self::archive::rewrite_package;
use self::constants::{APP_PART, CORE_PART, CUSTOM_PART};
use self::sanitize::{sanitize_app_properties, sanitize_core_properties, sanitize_custom_properties};
use self::verify::remaining_properties;
use super::StrategyReport;
use super::utils::{commit, display_name, staging_file};

pub use self::verify::verify_office_metadata_clean;

/// Partes de `docProps/` que se limpian.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PropertyScope {
    /// Solo `core.xml`: autoría, fechas, título y descripción.
    #[default]
    CoreOnly,
    /// Además `app.xml` y `custom.xml`.
    All,
}

impl PropertyScope {
    pub fn from_all_properties(all: bool) -> Self {
        if all { Self::All } else { Self::CoreOnly }
    }

    fn parts(self) -> &'static [&'static str] {
        match self {
            Self::CoreOnly => &[CORE_PART],
            Self::All => &[CORE_PART, APP_PART, CUSTOM_PART],
        }
    }
}

/// Reescribe el paquete con las propiedades limpias y lo verifica antes de confirmarlo.
pub fn scrub_office(input: &Path, target: &Path, scope: PropertyScope) -> Result<StrategyReport> {
    let mut staged = staging_file(target)?;

    let rewritten = rewrite_package(input, staged.as_file_mut(), scope.parts(), |part, contents| {
        debug!(part, "limpiando propiedades");
        match part {
            CORE_PART => sanitize_core_properties(contents),
            APP_PART => sanitize_app_properties(contents),
            CUSTOM_PART => Ok(sanitize_custom_properties(contents)),
            _ => Ok(None),
        }
    })?;

    let remaining = remaining_properties(staged.path(), scope)?;
    if !remaining.is_empty() {
        return Err(ScrubError::verification(
            target,
            format!("persisten propiedades: {}", remaining.join(", ")),
        ));
    }

    commit(staged, input, target)?;
    info!(input = %input.display(), output = %target.display(), rewritten, "documento limpio");

    let message = if rewritten == 0 {
        format!("Limpio: {} (sin metadata sensible)", display_name(target))
    } else {
        format!("Limpio: {}", display_name(target))
    };
    Ok(StrategyReport::new(message))
}

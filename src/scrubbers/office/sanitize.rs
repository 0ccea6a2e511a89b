use crate::error::Result;

use super::constants::{APP_PART, APP_RULES, CORE_PART, CORE_RULES, CUSTOM_PROPERTIES_EMPTY, FieldRule};
use super::xml::{apply_rules, parse_part, write_part};

/// Elimina autoría, fechas y descripciones de `core.xml`.
pub(super) fn sanitize_core_properties(contents: &[u8]) -> Result<Option<Vec<u8>>> {
    sanitize_with_rules(CORE_PART, contents, &CORE_RULES)
}

/// Elimina aplicación, empresa y estadísticas de `app.xml`.
pub(super) fn sanitize_app_properties(contents: &[u8]) -> Result<Option<Vec<u8>>> {
    sanitize_with_rules(APP_PART, contents, &APP_RULES)
}

/// Sustituye las propiedades personalizadas por una plantilla vacía.
pub(super) fn sanitize_custom_properties(contents: &[u8]) -> Option<Vec<u8>> {
    let empty = CUSTOM_PROPERTIES_EMPTY.as_bytes();
    (contents != empty).then(|| empty.to_vec())
}

/// `None` indica que la parte ya estaba limpia y puede copiarse sin cambios.
fn sanitize_with_rules(part: &str, contents: &[u8], rules: &[FieldRule]) -> Result<Option<Vec<u8>>> {
    let mut root = parse_part(part, contents)?;
    if !apply_rules(&mut root, rules) {
        return Ok(None);
    }
    write_part(part, &root).map(Some)
}

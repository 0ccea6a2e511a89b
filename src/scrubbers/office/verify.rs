use std::fs::File;
use std::path::Path;
use xmltree::XMLNode;
use zip::ZipArchive;

use crate::error::{Result, ScrubError};

use super::PropertyScope;
use super::archive::read_part;
use super::constants::{APP_PART, APP_RULES, CORE_PART, CORE_RULES, CUSTOM_PART, CUSTOM_PROPERTIES_EMPTY};
use super::xml::{element_text, parse_part, residual_fields};

/// Comprueba que un documento Office no conserva las propiedades del alcance indicado.
pub fn verify_office_metadata_clean(path: &Path, scope: PropertyScope) -> Result<bool> {
    Ok(remaining_properties(path, scope)?.is_empty())
}

/// Lista los campos que siguen presentes, como `docProps/core.xml:dc:creator`.
pub(super) fn remaining_properties(path: &Path, scope: PropertyScope) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| ScrubError::io("abrir para verificar", path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|source| ScrubError::Archive {
        path: path.to_path_buf(),
        source,
    })?;

    let mut remaining = Vec::new();
    if let Some(contents) = read_part(&mut archive, path, CORE_PART)? {
        let root = parse_part(CORE_PART, &contents)?;
        remaining.extend(
            residual_fields(&root, &CORE_RULES)
                .into_iter()
                .map(|field| format!("{CORE_PART}:{field}")),
        );
    }

    if scope == PropertyScope::CoreOnly {
        return Ok(remaining);
    }

    if let Some(contents) = read_part(&mut archive, path, APP_PART)? {
        let root = parse_part(APP_PART, &contents)?;
        remaining.extend(
            residual_fields(&root, &APP_RULES)
                .into_iter()
                .map(|field| format!("{APP_PART}:{field}")),
        );
    }

    if let Some(contents) = read_part(&mut archive, path, CUSTOM_PART)?
        && !is_custom_metadata_clean(&contents)?
    {
        remaining.push(CUSTOM_PART.to_string());
    }

    Ok(remaining)
}

fn is_custom_metadata_clean(contents: &[u8]) -> Result<bool> {
    if contents == CUSTOM_PROPERTIES_EMPTY.as_bytes() {
        return Ok(true);
    }

    let root = parse_part(CUSTOM_PART, contents)?;
    let has_properties = root
        .children
        .iter()
        .any(|node| matches!(node, XMLNode::Element(_)));
    Ok(!has_properties && element_text(&root).is_empty())
}

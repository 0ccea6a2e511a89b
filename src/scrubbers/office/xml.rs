use std::io::Cursor;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{Result, ScrubError};

use super::constants::FieldRule;

/// Ubicación de un nodo hijo directo en el XML de propiedades.
#[derive(Clone, Copy, Debug)]
pub(super) struct FieldSpec {
    pub prefix: Option<&'static str>,
    pub local_name: &'static str,
    pub namespace: &'static str,
}

impl FieldSpec {
    pub const fn new(
        prefix: Option<&'static str>,
        local_name: &'static str,
        namespace: &'static str,
    ) -> Self {
        Self {
            prefix,
            local_name,
            namespace,
        }
    }

    /// Nombre calificado para mensajes, como `dc:creator`.
    pub fn qualified_name(&self) -> String {
        match self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local_name),
            None => self.local_name.to_string(),
        }
    }

    fn matches(&self, element: &Element) -> bool {
        element.name == self.local_name && element.namespace.as_deref() == Some(self.namespace)
    }
}

pub(super) fn parse_part(part: &str, contents: &[u8]) -> Result<Element> {
    Element::parse(Cursor::new(contents)).map_err(|e| ScrubError::xml(part, e))
}

pub(super) fn write_part(part: &str, root: &Element) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut config = EmitterConfig::new();
    config.perform_indent = false;
    config.write_document_declaration = true;
    root.write_with_config(&mut output, config)
        .map_err(|e| ScrubError::xml(part, e))?;
    Ok(output)
}

/// Aplica las reglas sobre los hijos directos de `root`. Devuelve si hubo cambios.
///
/// Los campos ausentes no se crean.
pub(super) fn apply_rules(root: &mut Element, rules: &[FieldRule]) -> bool {
    let mut modified = false;
    for rule in rules {
        match rule.value {
            None => {
                let before = root.children.len();
                root.children.retain(|node| match node {
                    XMLNode::Element(child) => !rule.field.matches(child),
                    _ => true,
                });
                modified |= root.children.len() != before;
            }
            Some(value) => {
                for node in root.children.iter_mut() {
                    if let XMLNode::Element(child) = node
                        && rule.field.matches(child)
                    {
                        modified |= set_element_text(child, value);
                    }
                }
            }
        }
    }
    modified
}

/// Campos que aún no cumplen su regla.
pub(super) fn residual_fields(root: &Element, rules: &[FieldRule]) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| {
            root.children.iter().any(|node| match node {
                XMLNode::Element(child) if rule.field.matches(child) => {
                    let text = element_text(child);
                    match rule.value {
                        None => !text.is_empty(),
                        Some(value) => text != value,
                    }
                }
                _ => false,
            })
        })
        .map(|rule| rule.field.qualified_name())
        .collect()
}

fn set_element_text(element: &mut Element, value: &str) -> bool {
    if element_text(element) == value {
        return false;
    }
    element.children.clear();
    element.children.push(XMLNode::Text(value.to_string()));
    true
}

/// Texto plano del elemento, sin espacios en los extremos.
pub(super) fn element_text(element: &Element) -> String {
    let mut content = String::new();
    for node in &element.children {
        match node {
            XMLNode::Text(text) | XMLNode::CData(text) => content.push_str(text),
            _ => {}
        }
    }
    content.trim().to_string()
}

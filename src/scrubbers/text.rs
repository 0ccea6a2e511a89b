//! Eliminación de líneas de comentario en archivos de texto.

use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::{Result, ScrubError};

use super::StrategyReport;
use super::utils::{commit, display_name, staging_file};

/// Quita las líneas cuyo primer contenido no blanco empieza con algún prefijo.
///
/// Trabaja sobre bytes para no exigir UTF-8 y conserva tal cual los finales de
/// línea de las líneas que sobreviven. Devuelve el contenido y cuántas líneas
/// se eliminaron.
pub fn strip_comment_lines(content: &[u8], prefixes: &[String]) -> (Vec<u8>, usize) {
    let prefixes: Vec<&[u8]> = prefixes
        .iter()
        .map(|prefix| prefix.as_bytes())
        .filter(|prefix| !prefix.is_empty())
        .collect();

    let mut kept = Vec::with_capacity(content.len());
    let mut removed = 0;
    for line in content.split_inclusive(|&byte| byte == b'\n') {
        let body = line.trim_ascii_start();
        if prefixes.iter().any(|prefix| body.starts_with(prefix)) {
            removed += 1;
        } else {
            kept.extend_from_slice(line);
        }
    }
    (kept, removed)
}

pub fn scrub_text(input: &Path, target: &Path, prefixes: &[String]) -> Result<StrategyReport> {
    let content = fs::read(input).map_err(|e| ScrubError::io("leer", input, e))?;
    let (cleaned, removed) = strip_comment_lines(&content, prefixes);

    let mut staged = staging_file(target)?;
    staged
        .write_all(&cleaned)
        .and_then(|_| staged.flush())
        .map_err(|e| ScrubError::io("escribir", target, e))?;
    commit(staged, input, target)?;

    info!(input = %input.display(), removed, "comentarios eliminados");
    let noun = if removed == 1 { "línea eliminada" } else { "líneas eliminadas" };
    Ok(StrategyReport::new(format!(
        "Limpio: {} ({removed} {noun})",
        display_name(target)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        vec!["#".into(), "//".into(), ";".into()]
    }

    #[test]
    fn removes_indented_comments_and_keeps_code() {
        let input = b"# cabecera\nx = 1\n    // nota\n\tvalor ; no es comentario\n;ini\n";
        let (out, removed) = strip_comment_lines(input, &defaults());
        assert_eq!(out, b"x = 1\n\tvalor ; no es comentario\n");
        assert_eq!(removed, 3);
    }

    #[test]
    fn preserves_crlf_and_missing_final_newline() {
        let input = b"a\r\n# b\r\nc";
        let (out, removed) = strip_comment_lines(input, &defaults());
        assert_eq!(out, b"a\r\nc");
        assert_eq!(removed, 1);
    }

    #[test]
    fn blank_lines_are_not_comments() {
        let input = b"\n   \nfin\n";
        let (out, removed) = strip_comment_lines(input, &defaults());
        assert_eq!(out, input);
        assert_eq!(removed, 0);
    }

    #[test]
    fn empty_prefixes_never_match() {
        let input = b"uno\ndos\n";
        let (out, removed) = strip_comment_lines(input, &[String::new()]);
        assert_eq!(out, input);
        assert_eq!(removed, 0);
    }

    #[test]
    fn custom_prefixes_replace_defaults() {
        let input = b"-- sql\n# shell\n";
        let (out, removed) = strip_comment_lines(input, &["--".to_string()]);
        assert_eq!(out, b"# shell\n");
        assert_eq!(removed, 1);
    }
}

use anyhow::Result;
use console::style;

use bleach::{FailureKind, ScrubResult};

pub fn render_json(result: &ScrubResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

pub fn render_result(result: &ScrubResult) {
    if result.success {
        render_success(result);
    } else {
        render_failure(result);
    }
}

fn render_success(result: &ScrubResult) {
    let title = if result.has_warnings() {
        style("┌─ Metadata eliminada con advertencias ─").yellow()
    } else {
        style("┌─ Metadata eliminada ─").green()
    };
    println!("\n{title}");
    println!("{}", style(format!("│ {}", result.message)).green().bold());

    if let Some(output) = &result.output {
        let label = if result.in_place { "Reemplazado" } else { "Salida" };
        println!("{}", style(format!("│ {label}: {}", output.display())).dim());
    }
    if let Some(backup) = &result.backup {
        println!(
            "{}",
            style(format!("│ Respaldo: {}", backup.backup.display())).dim()
        );
    }
    for warning in &result.warnings {
        println!("{}", style(format!("│ ⚠ {warning}")).yellow());
    }
    println!("{}", style("└─").green());
}

fn render_failure(result: &ScrubResult) {
    eprintln!("\n{}", style("┌─ No se pudo limpiar el archivo ─").red());
    eprintln!(
        "{}",
        style(format!("│ Archivo: {}", result.input.display()))
            .red()
            .bold()
    );
    eprintln!("{}", style(format!("│ {}", result.message)).red());
    for warning in &result.warnings {
        eprintln!("{}", style(format!("│ ⚠ {warning}")).yellow());
    }
    if result.failure != Some(FailureKind::NotFound) {
        eprintln!("{}", style("│ El archivo original no fue modificado.").dim());
    }
    eprintln!("{}", style("└─").red());
}

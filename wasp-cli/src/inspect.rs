//! `wasp inspect`.

use anyhow::{Context, Result};
use wasp::Engine;

use crate::OutputFormat;

pub fn inspect(plugin: &str, format: OutputFormat) -> Result<()> {
    let bytes = std::fs::read(plugin).with_context(|| format!("failed to read {plugin}"))?;
    let info = Engine::with_callbacks(crate::callbacks()).inspect(&bytes)?;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{:<10} {:<24} {:<24} STATUS", "KIND", "MODULE", "NAME");
    for import in &info.imports {
        let status = if info.missing_imports.contains(import) {
            "missing"
        } else {
            "ok"
        };
        println!(
            "{:<10} {:<24} {:<24} {status}",
            "import", import.module, import.name
        );
    }
    for export in &info.exports {
        println!("{:<10} {:<24} {:<24} ok", "export", "", export);
    }
    for export in &info.missing_exports {
        println!("{:<10} {:<24} {:<24} missing", "export", "", export);
    }
    println!(
        "\n{}",
        if info.is_loadable() {
            "loadable"
        } else {
            "not loadable"
        }
    );
    Ok(())
}

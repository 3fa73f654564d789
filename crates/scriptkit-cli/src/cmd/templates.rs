use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use scriptkit_core::template::{self, TemplateKind, EXAMPLE_FILE};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum TemplatesSubcommand {
    /// List the built-in template kinds
    List,

    /// Write the built-in templates and the example script to a directory
    Export {
        /// Target directory (created if missing)
        dir: PathBuf,

        /// Replace files that already exist
        #[arg(long, short = 'f')]
        force: bool,
    },
}

pub fn run(subcmd: TemplatesSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TemplatesSubcommand::List => list(json),
        TemplatesSubcommand::Export { dir, force } => export(dir, force, json),
    }
}

fn list(json: bool) -> anyhow::Result<()> {
    if json {
        let kinds: Vec<_> = TemplateKind::all()
            .iter()
            .map(|k| {
                serde_json::json!({
                    "kind": k,
                    "file": k.file_name(),
                    "description": k.description(),
                })
            })
            .collect();
        return print_json(&serde_json::json!({ "templates": kinds, "example": EXAMPLE_FILE }));
    }

    let rows: Vec<Vec<String>> = TemplateKind::all()
        .iter()
        .map(|k| {
            vec![
                k.as_str().to_string(),
                k.file_name().to_string(),
                k.description().to_string(),
            ]
        })
        .collect();
    print_table(&["KIND", "FILE", "DESCRIPTION"], &rows);
    Ok(())
}

fn export(dir: PathBuf, force: bool, json: bool) -> anyhow::Result<()> {
    let exported = template::export_all(&dir, force)
        .with_context(|| format!("failed to export templates to {}", dir.display()))?;

    if json {
        return print_json(&exported);
    }

    for file in &exported {
        let status = if file.written { "written:" } else { "exists: " };
        println!("  {status} {}", file.path.display());
    }
    Ok(())
}

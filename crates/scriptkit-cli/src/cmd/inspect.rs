use crate::output::{print_json, print_table};
use anyhow::Context;
use scriptkit_core::{io, metadata::Metadata};
use std::path::Path;

pub fn run(file: &Path, json: bool) -> anyhow::Result<()> {
    let text = io::read_script(file)?;
    let metadata =
        Metadata::parse(&text).with_context(|| format!("cannot inspect {}", file.display()))?;

    if json {
        return print_json(&metadata);
    }

    let rows: Vec<Vec<String>> = metadata
        .entries
        .iter()
        .map(|e| vec![format!("@{}", e.key), e.value.clone()])
        .collect();
    print_table(&["KEY", "VALUE"], &rows);

    if let Some(Err(e)) = metadata.run_at() {
        eprintln!("warning: {e}");
    }
    Ok(())
}

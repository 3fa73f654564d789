use crate::output::print_json;
use anyhow::Context;
use scriptkit_core::{
    config::Config,
    validator::{Category, Status, ValidationReport, Validator},
};
use std::path::Path;

pub fn run(root: &Path, file: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let validator = Validator::with_config(config.validator);
    let report = validator
        .validate_file(file)
        .with_context(|| format!("cannot validate {}", file.display()))?;

    if json {
        print_json(&report)?;
    } else {
        print_report(file, &report);
    }

    if !report.is_ok() {
        anyhow::bail!(
            "{} failed validation with {} error(s)",
            file.display(),
            report.errors
        );
    }
    Ok(())
}

fn print_report(file: &Path, report: &ValidationReport) {
    println!("Validating {}", file.display());
    for &category in Category::all() {
        let mut annotations = report.in_category(category).peekable();
        if annotations.peek().is_none() {
            continue;
        }
        println!();
        println!("[{category}]");
        for a in annotations {
            println!("  {} {}", marker(a.status), a.message);
        }
    }
    println!();
    println!(
        "{} error(s), {} warning(s)",
        report.errors, report.warnings
    );
}

fn marker(status: Status) -> &'static str {
    match status {
        Status::Pass => "✓",
        Status::Warning => "⚠",
        Status::Error => "✗",
    }
}

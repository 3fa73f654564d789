use crate::output::print_json;
use anyhow::Context;
use scriptkit_core::{
    config::Config,
    generator::{self, GenerateOutcome, GenerateRequest},
    template::TemplateSource,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub struct GenerateArgs {
    pub name: String,
    pub url_pattern: String,
    pub kind: Option<String>,
    pub templates_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub force: bool,
}

pub fn run(root: &Path, args: GenerateArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    let kind = args
        .kind
        .unwrap_or_else(|| config.default_kind.as_str().to_string());
    let request = GenerateRequest::new(&args.name, &args.url_pattern, &kind)?;

    let templates_dir = args
        .templates_dir
        .or_else(|| config.templates_dir.as_ref().map(|d| config.resolve(root, d)));
    let source = TemplateSource::from_dir(templates_dir.as_deref());

    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => config.resolve(root, &config.output_dir),
    };

    tracing::debug!(
        name = %request.name,
        kind = %request.kind,
        output_dir = %output_dir.display(),
        "generating userscript"
    );

    let force = args.force;
    let outcome = generator::generate(&request, &source, &output_dir, &config, |path| {
        force || confirm_overwrite(path)
    })?;

    if json {
        return print_json(&outcome);
    }

    match &outcome {
        GenerateOutcome::Written {
            path,
            kind,
            title,
            overwritten,
        } => {
            let verb = if *overwritten { "Overwrote" } else { "Created" };
            println!("{verb} {} ({kind} template)", path.display());
            println!("  @name   {}", request.name);
            println!("  @match  {}", request.url_pattern);
            println!("  title   {title}");
        }
        GenerateOutcome::Declined { path } => {
            println!("Left {} unchanged.", path.display());
        }
    }
    Ok(())
}

/// Ask on stderr, read one line from stdin. Anything but y/yes declines,
/// including end of input.
fn confirm_overwrite(path: &Path) -> bool {
    eprint!("{} already exists. Overwrite? [y/N] ", path.display());
    let _ = std::io::stderr().flush();

    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(e) => {
            tracing::warn!(error = %e, "could not read confirmation; not overwriting");
            false
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n\n"));
        assert!(!is_yes("yep"));
    }
}

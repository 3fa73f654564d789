use crate::output::print_json;
use anyhow::Context;
use scriptkit_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(
    root: &Path,
    author: Option<&str>,
    namespace: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    if !json {
        println!("Initializing scriptkit in: {}", root.display());
    }

    let dir = paths::scriptkit_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    let created = !config_path.exists();
    if created {
        let config = Config {
            author: author.map(str::to_string),
            namespace: namespace.map(str::to_string),
            ..Config::default()
        };
        config.save(root).context("failed to write config.yaml")?;
    }

    if json {
        return print_json(&serde_json::json!({
            "root": root,
            "config": config_path,
            "created": created,
        }));
    }

    if created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    Ok(())
}

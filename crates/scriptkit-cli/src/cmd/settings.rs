use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use scriptkit_core::paths;
use scriptkit_runtime::{FileStore, SettingKey, Settings};
use serde_json::Value;
use std::path::Path;

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show every setting with its effective value
    Show,

    /// Override a setting; the value is parsed as JSON (true, 300, ...)
    Set { key: String, value: String },

    /// Drop one override, or all of them
    Reset { key: Option<String> },
}

pub fn run(
    root: &Path,
    store: Option<&Path>,
    subcmd: SettingsSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let store = FileStore::new(match store {
        Some(p) => p.to_path_buf(),
        None => paths::storage_path(root),
    });
    let settings = Settings::new(&store);

    match subcmd {
        SettingsSubcommand::Show => {
            let mut entries = Vec::new();
            for &key in SettingKey::all() {
                entries.push((key, settings.get(key)?, settings.is_overridden(key)?));
            }
            if json {
                let map: serde_json::Map<String, Value> = entries
                    .into_iter()
                    .map(|(k, v, _)| (k.as_str().to_string(), v))
                    .collect();
                return print_json(&map);
            }
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|(k, v, overridden)| {
                    let source = if *overridden { "stored" } else { "default" };
                    vec![k.to_string(), v.to_string(), source.to_string()]
                })
                .collect();
            print_table(&["KEY", "VALUE", "SOURCE"], &rows);
            Ok(())
        }
        SettingsSubcommand::Set { key, value } => {
            let key = parse_key(&key)?;
            let value: Value = serde_json::from_str(&value)
                .with_context(|| format!("'{value}' is not a JSON value"))?;
            settings.set(key, value.clone())?;
            if json {
                return print_json(&serde_json::json!({ "key": key.as_str(), "value": value }));
            }
            println!("{key} = {value}");
            Ok(())
        }
        SettingsSubcommand::Reset { key: Some(key) } => {
            let key = parse_key(&key)?;
            settings.reset(key)?;
            if json {
                return print_reset(&[key]);
            }
            println!("{key} reset to {}", key.default_value());
            Ok(())
        }
        SettingsSubcommand::Reset { key: None } => {
            settings.reset_all()?;
            if json {
                return print_reset(SettingKey::all());
            }
            println!("All settings reset to defaults.");
            Ok(())
        }
    }
}

/// `{"reset": {"<key>": <default>, ...}}`
fn print_reset(keys: &[SettingKey]) -> anyhow::Result<()> {
    let defaults: serde_json::Map<String, Value> = keys
        .iter()
        .map(|k| (k.as_str().to_string(), k.default_value()))
        .collect();
    print_json(&serde_json::json!({ "reset": defaults }))
}

fn parse_key(key: &str) -> anyhow::Result<SettingKey> {
    key.parse::<SettingKey>().map_err(|e| {
        let known: Vec<&str> = SettingKey::all().iter().map(|k| k.as_str()).collect();
        anyhow::anyhow!("{e}; expected one of {}", known.join(", "))
    })
}

use crate::error::{Result, ScriptkitError};
use crate::io;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded template text
// ---------------------------------------------------------------------------

const BASIC_TEMPLATE: &str = include_str!("../templates/basic-template.user.js");
const ADVANCED_TEMPLATE: &str = include_str!("../templates/advanced-template.user.js");
const SPA_TEMPLATE: &str = include_str!("../templates/spa-template.user.js");

/// File name of the worked example shipped alongside the templates.
pub const EXAMPLE_FILE: &str = "youtube-timestamp-bookmarker.user.js";
/// A complete userscript built from the advanced template's patterns.
pub const EXAMPLE_SCRIPT: &str = include_str!("../templates/youtube-timestamp-bookmarker.user.js");

// ---------------------------------------------------------------------------
// TemplateKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    #[default]
    Basic,
    Advanced,
    Spa,
}

impl TemplateKind {
    pub fn all() -> &'static [TemplateKind] {
        &[TemplateKind::Basic, TemplateKind::Advanced, TemplateKind::Spa]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKind::Basic => "basic",
            TemplateKind::Advanced => "advanced",
            TemplateKind::Spa => "spa",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            TemplateKind::Basic => "basic-template.user.js",
            TemplateKind::Advanced => "advanced-template.user.js",
            TemplateKind::Spa => "spa-template.user.js",
        }
    }

    /// Title string the template uses wherever the script's display name goes.
    pub fn placeholder_title(self) -> &'static str {
        match self {
            TemplateKind::Basic => "My Userscript",
            TemplateKind::Advanced => "Advanced Userscript",
            TemplateKind::Spa => "SPA Userscript",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TemplateKind::Basic => "minimal IIFE with a wait-for-element helper",
            TemplateKind::Advanced => "settings with defaults, injected styles, draggable panel, menu commands",
            TemplateKind::Spa => "route table and navigation watcher for single-page apps",
        }
    }

    pub fn embedded(self) -> &'static str {
        match self {
            TemplateKind::Basic => BASIC_TEMPLATE,
            TemplateKind::Advanced => ADVANCED_TEMPLATE,
            TemplateKind::Spa => SPA_TEMPLATE,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = ScriptkitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "basic" => Ok(TemplateKind::Basic),
            "advanced" => Ok(TemplateKind::Advanced),
            "spa" => Ok(TemplateKind::Spa),
            other => Err(ScriptkitError::UnknownTemplateKind(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateSource
// ---------------------------------------------------------------------------

/// Where template text comes from: the copies compiled into the binary, or a
/// directory of `<kind>-template.user.js` files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Embedded,
    Directory(PathBuf),
}

impl TemplateSource {
    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(d) => TemplateSource::Directory(d.to_path_buf()),
            None => TemplateSource::Embedded,
        }
    }

    pub fn load(&self, kind: TemplateKind) -> Result<String> {
        match self {
            TemplateSource::Embedded => Ok(kind.embedded().to_string()),
            TemplateSource::Directory(dir) => {
                let path = dir.join(kind.file_name());
                if !path.is_file() {
                    return Err(ScriptkitError::TemplateNotFound(path.display().to_string()));
                }
                Ok(std::fs::read_to_string(&path)?)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub written: bool,
}

/// Write every embedded template plus the example script into `dir`.
/// Existing files are left alone unless `force` is set.
pub fn export_all(dir: &Path, force: bool) -> Result<Vec<ExportedFile>> {
    io::ensure_dir(dir)?;

    let files = TemplateKind::all()
        .iter()
        .map(|k| (k.file_name(), k.embedded()))
        .chain(std::iter::once((EXAMPLE_FILE, EXAMPLE_SCRIPT)));

    let mut exported = Vec::new();
    for (name, text) in files {
        let path = dir.join(name);
        let written = if force {
            io::atomic_write(&path, text.as_bytes())?;
            true
        } else {
            io::write_if_missing(&path, text.as_bytes())?
        };
        exported.push(ExportedFile { path, written });
    }
    Ok(exported)
}

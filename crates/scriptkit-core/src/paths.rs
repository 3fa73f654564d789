use crate::error::{Result, ScriptkitError};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SCRIPTKIT_DIR: &str = ".scriptkit";
pub const CONFIG_FILE: &str = ".scriptkit/config.yaml";
pub const STORAGE_FILE: &str = ".scriptkit/storage.json";

pub const USERSCRIPT_EXT: &str = ".user.js";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn scriptkit_dir(root: &Path) -> PathBuf {
    root.join(SCRIPTKIT_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn storage_path(root: &Path) -> PathBuf {
    root.join(STORAGE_FILE)
}

/// `<dir>/<name>.user.js`
pub fn script_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{USERSCRIPT_EXT}"))
}

// ---------------------------------------------------------------------------
// Script name validation
// ---------------------------------------------------------------------------

/// Names become file stems, so they must stay inside the output directory.
pub fn validate_script_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\', '\0'])
    {
        return Err(ScriptkitError::InvalidScriptName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["dark-mode", "My Script", "a", "yt_bookmarks"] {
            validate_script_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "  ", "..", "a/b", "..\\evil"] {
            assert!(validate_script_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.scriptkit/config.yaml")
        );
        assert_eq!(
            script_path(root, "dark-mode"),
            PathBuf::from("/tmp/proj/dark-mode.user.js")
        );
    }
}

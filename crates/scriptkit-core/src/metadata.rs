use crate::error::{Result, ScriptkitError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

pub const BLOCK_START: &str = "// ==UserScript==";
pub const BLOCK_END: &str = "// ==/UserScript==";

/// Width the key column is padded to in `// @key value` lines.
const KEY_WIDTH: usize = 12;

static ENTRY_RE: OnceLock<Regex> = OnceLock::new();

fn entry_re() -> &'static Regex {
    ENTRY_RE.get_or_init(|| Regex::new(r"^\s*//\s*@(\S+)(?:\s+(.*?))?\s*$").unwrap())
}

// ---------------------------------------------------------------------------
// RunAt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunAt {
    DocumentStart,
    DocumentBody,
    DocumentEnd,
    DocumentIdle,
    ContextMenu,
}

impl RunAt {
    pub fn all() -> &'static [RunAt] {
        &[
            RunAt::DocumentStart,
            RunAt::DocumentBody,
            RunAt::DocumentEnd,
            RunAt::DocumentIdle,
            RunAt::ContextMenu,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunAt::DocumentStart => "document-start",
            RunAt::DocumentBody => "document-body",
            RunAt::DocumentEnd => "document-end",
            RunAt::DocumentIdle => "document-idle",
            RunAt::ContextMenu => "context-menu",
        }
    }
}

impl fmt::Display for RunAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunAt {
    type Err = ScriptkitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RunAt::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ScriptkitError::InvalidMetadata(format!("unknown @run-at value '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// The `// ==UserScript==` header, in declaration order. Keys may repeat
/// (`@match`, `@grant`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub entries: Vec<MetadataEntry>,
}

impl Metadata {
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();

        if !lines.by_ref().any(|l| l.trim() == BLOCK_START) {
            return Err(ScriptkitError::InvalidMetadata(format!(
                "missing '{BLOCK_START}' line"
            )));
        }

        let mut entries = Vec::new();
        for line in lines {
            if line.trim() == BLOCK_END {
                return Ok(Self { entries });
            }
            if let Some(caps) = entry_re().captures(line) {
                entries.push(MetadataEntry {
                    key: caps[1].to_string(),
                    value: caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string(),
                });
            }
        }

        Err(ScriptkitError::InvalidMetadata(format!(
            "missing '{BLOCK_END}' line"
        )))
    }

    /// First value declared for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn grants(&self) -> Vec<&str> {
        self.get_all("grant").collect()
    }

    /// `None` when no `@run-at` is declared.
    pub fn run_at(&self) -> Option<Result<RunAt>> {
        self.get("run-at").map(str::parse)
    }
}

/// Render a header line with the key column aligned the way Tampermonkey's
/// editor writes new scripts.
pub fn format_line(key: &str, value: &str) -> String {
    format!("// @{key:<width$} {value}", width = KEY_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "\
// ==UserScript==
// @name         Demo
// @match        https://a.example/*
// @match        https://b.example/*
// @grant        GM_getValue
// @grant        GM_setValue
// @noframes
// @run-at       document-start
// ==/UserScript==

console.log('hi');
";

    #[test]
    fn parses_entries_in_order() {
        let meta = Metadata::parse(SCRIPT).unwrap();
        assert_eq!(meta.get("name"), Some("Demo"));
        assert_eq!(
            meta.get_all("match").collect::<Vec<_>>(),
            vec!["https://a.example/*", "https://b.example/*"]
        );
        assert_eq!(meta.grants(), vec!["GM_getValue", "GM_setValue"]);
        assert_eq!(meta.get("noframes"), Some(""));
        assert_eq!(meta.entries[0].key, "name");
    }

    #[test]
    fn run_at_parses() {
        let meta = Metadata::parse(SCRIPT).unwrap();
        assert_eq!(meta.run_at().unwrap().unwrap(), RunAt::DocumentStart);
    }

    #[test]
    fn run_at_rejects_unknown_value() {
        let meta = Metadata {
            entries: vec![MetadataEntry {
                key: "run-at".into(),
                value: "document-later".into(),
            }],
        };
        assert!(meta.run_at().unwrap().is_err());
    }

    #[test]
    fn missing_start_banner_errors() {
        let err = Metadata::parse("// @name x\n").unwrap_err();
        assert!(err.to_string().contains("==UserScript=="));
    }

    #[test]
    fn unterminated_block_errors() {
        let err = Metadata::parse("// ==UserScript==\n// @name x\n").unwrap_err();
        assert!(err.to_string().contains("==/UserScript=="));
    }

    #[test]
    fn format_line_pads_key() {
        assert_eq!(format_line("name", "X"), "// @name         X");
        assert_eq!(
            format_line("match", "https://github.com/*"),
            "// @match        https://github.com/*"
        );
    }
}

//! Textual lint for userscripts.
//!
//! Every check looks at the raw text: there is no lexer, so a pattern inside
//! a comment or string literal counts the same as live code.

pub mod checks;

use crate::config::ValidatorConfig;
use crate::error::Result;
use crate::io;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use checks::{default_checks, Check};

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Metadata,
    Grants,
    Performance,
    Security,
    Style,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Metadata,
            Category::Grants,
            Category::Performance,
            Category::Security,
            Category::Style,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Metadata => "metadata",
            Category::Grants => "grants",
            Category::Performance => "performance",
            Category::Security => "security",
            Category::Style => "style",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Warning,
    Error,
}

/// Outcome of one check. `Warning` and `Error` annotations are the findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub check: String,
    pub category: Category,
    pub status: Status,
    pub message: String,
}

impl Annotation {
    pub fn pass(check: &Check, message: impl Into<String>) -> Self {
        Self::new(check, Status::Pass, message)
    }

    pub fn warning(check: &Check, message: impl Into<String>) -> Self {
        Self::new(check, Status::Warning, message)
    }

    pub fn error(check: &Check, message: impl Into<String>) -> Self {
        Self::new(check, Status::Error, message)
    }

    fn new(check: &Check, status: Status, message: impl Into<String>) -> Self {
        Self {
            check: check.id(),
            category: check.category(),
            status,
            message: message.into(),
        }
    }

    pub fn is_finding(&self) -> bool {
        self.status != Status::Pass
    }
}

// ---------------------------------------------------------------------------
// ValidationReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub errors: usize,
    pub warnings: usize,
    pub annotations: Vec<Annotation>,
}

impl ValidationReport {
    fn from_annotations(path: Option<PathBuf>, annotations: Vec<Annotation>) -> Self {
        let errors = annotations
            .iter()
            .filter(|a| a.status == Status::Error)
            .count();
        let warnings = annotations
            .iter()
            .filter(|a| a.status == Status::Warning)
            .count();
        Self {
            path,
            errors,
            warnings,
            annotations,
        }
    }

    /// Warnings never fail a script; any error does.
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }

    pub fn findings(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(|a| a.is_finding())
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(move |a| a.category == category)
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

pub struct Validator {
    checks: Vec<Check>,
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(checks: Vec<Check>, config: ValidatorConfig) -> Self {
        Self { checks, config }
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self::new(default_checks(), config)
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn validate_text(&self, text: &str) -> ValidationReport {
        let annotations = self
            .checks
            .iter()
            .filter_map(|c| c.evaluate(text, &self.config))
            .collect();
        ValidationReport::from_annotations(None, annotations)
    }

    pub fn validate_file(&self, path: &Path) -> Result<ValidationReport> {
        let text = io::read_script(path)?;
        let mut report = self.validate_text(&text);
        report.path = Some(path.to_path_buf());
        Ok(report)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::with_config(ValidatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptkitError;
    use crate::template::{TemplateKind, EXAMPLE_SCRIPT};
    use tempfile::TempDir;

    const CLEAN: &str = "\
// ==UserScript==
// @name         Clean
// @namespace    http://tampermonkey.net/
// @version      1.0.0
// @description  clean script
// @author       You
// @match        https://example.com/*
// @grant        GM_setValue
// ==/UserScript==

(function () {
    'use strict';
    GM_setValue('seen', true);
})();
";

    fn finding<'a>(report: &'a ValidationReport, check: &str) -> Option<&'a Annotation> {
        report.findings().find(|a| a.check == check)
    }

    #[test]
    fn clean_script_has_no_findings() {
        let report = Validator::default().validate_text(CLEAN);
        assert_eq!(report.errors, 0, "{:#?}", report.annotations);
        assert_eq!(report.warnings, 0, "{:#?}", report.annotations);
        assert!(report.is_ok());
    }

    #[test]
    fn bundled_scripts_have_no_errors() {
        let validator = Validator::default();
        for kind in TemplateKind::all() {
            let report = validator.validate_text(kind.embedded());
            assert_eq!(report.errors, 0, "{kind}: {:#?}", report.annotations);
        }
        let report = validator.validate_text(EXAMPLE_SCRIPT);
        assert_eq!(report.errors, 0, "{:#?}", report.annotations);
    }

    #[test]
    fn missing_required_fields_each_error() {
        let text = CLEAN
            .replace("// @name         Clean\n", "")
            .replace("// @version      1.0.0\n", "")
            .replace("// @match        https://example.com/*\n", "");
        let report = Validator::default().validate_text(&text);

        assert_eq!(report.errors, 3, "{:#?}", report.annotations);
        for key in ["name", "version", "match"] {
            let a = finding(&report, &format!("required:{key}")).unwrap();
            assert_eq!(a.status, Status::Error);
        }
        assert!(!report.is_ok());
    }

    #[test]
    fn grant_error_cleared_by_declaration() {
        let text = CLEAN.replace(
            "    GM_setValue('seen', true);\n",
            "    GM_setValue('seen', true);\n    GM_addStyle('body{}');\n",
        );
        let report = Validator::default().validate_text(&text);
        let a = finding(&report, "grant:GM_addStyle").unwrap();
        assert_eq!(a.status, Status::Error);
        assert_eq!(report.errors, 1);

        let fixed = text.replace(
            "// @grant        GM_setValue\n",
            "// @grant        GM_setValue\n// @grant        GM_addStyle\n",
        );
        let report = Validator::default().validate_text(&fixed);
        assert!(finding(&report, "grant:GM_addStyle").is_none());
        assert_eq!(report.errors, 0);
    }

    #[test]
    fn validating_twice_is_stable() {
        let text = CLEAN.replace("'use strict';", "eval('1');");
        let validator = Validator::default();
        let a = validator.validate_text(&text);
        let b = validator.validate_text(&text);
        assert_eq!(a, b);
        assert_eq!((a.errors, a.warnings), (1, 1));
    }

    #[test]
    fn console_log_threshold_is_configurable() {
        let logs = "    console.log('x');\n".repeat(3);
        let text = CLEAN.replace("    'use strict';\n", &format!("    'use strict';\n{logs}"));

        let report = Validator::default().validate_text(&text);
        assert!(finding(&report, "style:console-log").is_none());

        let strict = Validator::with_config(ValidatorConfig {
            console_log_threshold: 2,
        });
        let report = strict.validate_text(&text);
        assert_eq!(
            finding(&report, "style:console-log").unwrap().status,
            Status::Warning
        );
    }

    #[test]
    fn validate_file_records_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clean.user.js");
        std::fs::write(&path, CLEAN).unwrap();
        let report = Validator::default().validate_file(&path).unwrap();
        assert_eq!(report.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn validate_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let err = Validator::default()
            .validate_file(&dir.path().join("missing.user.js"))
            .unwrap_err();
        assert!(matches!(err, ScriptkitError::ScriptNotFound(_)));
    }
}

use super::{Annotation, Category};
use crate::config::ValidatorConfig;
use crate::metadata::RunAt;
use regex::Regex;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Helper macros
// ---------------------------------------------------------------------------

macro_rules! regex {
    ($pat:expr) => {{
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new($pat).unwrap())
    }};
}

// ---------------------------------------------------------------------------
// Fixed tables
// ---------------------------------------------------------------------------

pub const REQUIRED_FIELDS: &[&str] = &[
    "name",
    "namespace",
    "version",
    "description",
    "author",
    "match",
];

/// APIs that only work when declared with a matching `// @grant` line.
pub const GRANTED_APIS: &[&str] = &[
    "GM_getValue",
    "GM_setValue",
    "GM_deleteValue",
    "GM_listValues",
    "GM_addStyle",
    "GM_xmlhttpRequest",
    "GM_notification",
    "GM_setClipboard",
    "GM_openInTab",
    "GM_registerMenuCommand",
    "GM_download",
    "GM_getResourceText",
];

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Value of a `// @key value` line, or `None` when the line declares
/// something else.
fn declaration_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line
        .trim_start()
        .strip_prefix("//")?
        .trim_start()
        .strip_prefix('@')?
        .strip_prefix(key)?;
    if rest.is_empty() {
        Some("")
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn declarations<'a>(text: &'a str, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    text.lines().filter_map(move |l| declaration_value(l, key))
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// `word` appears with no identifier character directly on either side.
fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(i, _)| {
        let before = text[..i].chars().next_back();
        let after = text[i + word.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    RequiredField(&'static str),
    Grant(&'static str),
    UnsafeWindow,
    RunAtValue,
    LoopedQuery,
    UnclearedInterval,
    UnremovedListener,
    DynamicCode,
    InnerHtml,
    DocumentWrite,
    StrictMode,
    IifeWrapper,
    ConsoleLog,
}

impl Check {
    pub fn id(&self) -> String {
        match self {
            Check::RequiredField(key) => format!("required:{key}"),
            Check::Grant(api) => format!("grant:{api}"),
            Check::UnsafeWindow => "grant:unsafeWindow".to_string(),
            Check::RunAtValue => "metadata:run-at".to_string(),
            Check::LoopedQuery => "performance:looped-query".to_string(),
            Check::UnclearedInterval => "performance:interval".to_string(),
            Check::UnremovedListener => "performance:listener".to_string(),
            Check::DynamicCode => "security:eval".to_string(),
            Check::InnerHtml => "security:inner-html".to_string(),
            Check::DocumentWrite => "security:document-write".to_string(),
            Check::StrictMode => "style:strict-mode".to_string(),
            Check::IifeWrapper => "style:iife".to_string(),
            Check::ConsoleLog => "style:console-log".to_string(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Check::RequiredField(_) | Check::RunAtValue => Category::Metadata,
            Check::Grant(_) | Check::UnsafeWindow => Category::Grants,
            Check::LoopedQuery | Check::UnclearedInterval | Check::UnremovedListener => {
                Category::Performance
            }
            Check::DynamicCode | Check::InnerHtml | Check::DocumentWrite => Category::Security,
            Check::StrictMode | Check::IifeWrapper | Check::ConsoleLog => Category::Style,
        }
    }

    /// `None` when the check does not apply (e.g. an API the script never
    /// mentions).
    pub fn evaluate(&self, text: &str, config: &ValidatorConfig) -> Option<Annotation> {
        let annotation = match self {
            Check::RequiredField(key) => {
                if declarations(text, key).next().is_some() {
                    Annotation::pass(self, format!("@{key} present"))
                } else {
                    Annotation::error(self, format!("missing required field: @{key}"))
                }
            }

            Check::Grant(api) => {
                if !contains_word(text, api) {
                    return None;
                }
                if declarations(text, "grant").any(|g| g == *api) {
                    Annotation::pass(self, format!("{api} is granted"))
                } else {
                    Annotation::error(self, format!("{api} used without '// @grant {api}'"))
                }
            }

            Check::UnsafeWindow => {
                if !contains_word(text, "unsafeWindow") {
                    return None;
                }
                if declarations(text, "grant").any(|g| g == "unsafeWindow") {
                    Annotation::pass(self, "unsafeWindow is granted")
                } else {
                    Annotation::warning(
                        self,
                        "unsafeWindow used without '// @grant unsafeWindow'",
                    )
                }
            }

            Check::RunAtValue => {
                let value = declarations(text, "run-at").next()?;
                if value.parse::<RunAt>().is_ok() {
                    Annotation::pass(self, format!("@run-at {value}"))
                } else {
                    let known: Vec<_> = RunAt::all().iter().map(|r| r.as_str()).collect();
                    Annotation::warning(
                        self,
                        format!(
                            "unknown @run-at value '{value}' (expected one of {})",
                            known.join(", ")
                        ),
                    )
                }
            }

            Check::LoopedQuery => {
                let looped = regex!(r"\b(?:for|while)\s*\(|\.forEach\s*\(");
                let hit = text
                    .lines()
                    .any(|l| l.contains("querySelector") && looped.is_match(l));
                if hit {
                    Annotation::warning(
                        self,
                        "querySelector inside a loop: query once and reuse the result",
                    )
                } else {
                    Annotation::pass(self, "no selector queries inside loops")
                }
            }

            Check::UnclearedInterval => {
                if !contains_word(text, "setInterval") {
                    return None;
                }
                if contains_word(text, "clearInterval") {
                    Annotation::pass(self, "setInterval has a matching clearInterval")
                } else {
                    Annotation::warning(self, "setInterval without clearInterval")
                }
            }

            Check::UnremovedListener => {
                if !contains_word(text, "addEventListener") {
                    return None;
                }
                if contains_word(text, "removeEventListener") {
                    Annotation::pass(self, "event listeners are removed")
                } else {
                    Annotation::warning(self, "addEventListener without removeEventListener")
                }
            }

            Check::DynamicCode => {
                if regex!(r"\beval\s*\(|\bnew\s+Function\s*\(").is_match(text) {
                    Annotation::error(self, "eval() / new Function() executes dynamic code")
                } else {
                    Annotation::pass(self, "no dynamic code execution")
                }
            }

            Check::InnerHtml => {
                if regex!(r"\.innerHTML\s*\+?=(?:[^=]|$)").is_match(text) {
                    Annotation::warning(
                        self,
                        "innerHTML assignment: sanitize input or use textContent",
                    )
                } else {
                    Annotation::pass(self, "no innerHTML assignment")
                }
            }

            Check::DocumentWrite => {
                if regex!(r"\bdocument\.write(?:ln)?\s*\(").is_match(text) {
                    Annotation::warning(self, "document.write() replaces the page")
                } else {
                    Annotation::pass(self, "no document.write()")
                }
            }

            Check::StrictMode => {
                if regex!(r#"['"]use strict['"]"#).is_match(text) {
                    Annotation::pass(self, "strict mode enabled")
                } else {
                    Annotation::warning(self, "missing 'use strict'")
                }
            }

            Check::IifeWrapper => {
                let iife = regex!(
                    r"\(\s*(?:async\s+)?function\b|\(\s*(?:async\s*)?\(\s*\)\s*=>"
                );
                if iife.is_match(text) {
                    Annotation::pass(self, "wrapped in an IIFE")
                } else {
                    Annotation::warning(
                        self,
                        "not wrapped in an IIFE: globals leak into the page",
                    )
                }
            }

            Check::ConsoleLog => {
                let count = text.lines().filter(|l| l.contains("console.log")).count();
                if count > config.console_log_threshold {
                    Annotation::warning(
                        self,
                        format!(
                            "{count} console.log lines (more than {})",
                            config.console_log_threshold
                        ),
                    )
                } else {
                    Annotation::pass(self, format!("{count} console.log lines"))
                }
            }
        };
        Some(annotation)
    }
}

// ---------------------------------------------------------------------------
// Default battery
// ---------------------------------------------------------------------------

pub fn default_checks() -> Vec<Check> {
    let mut checks: Vec<Check> = REQUIRED_FIELDS
        .iter()
        .copied()
        .map(Check::RequiredField)
        .collect();
    checks.push(Check::RunAtValue);
    checks.extend(GRANTED_APIS.iter().copied().map(Check::Grant));
    checks.extend([
        Check::UnsafeWindow,
        Check::LoopedQuery,
        Check::UnclearedInterval,
        Check::UnremovedListener,
        Check::DynamicCode,
        Check::InnerHtml,
        Check::DocumentWrite,
        Check::StrictMode,
        Check::IifeWrapper,
        Check::ConsoleLog,
    ]);
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Status;

    fn run(check: Check, text: &str) -> Option<Status> {
        check
            .evaluate(text, &ValidatorConfig::default())
            .map(|a| a.status)
    }

    #[test]
    fn declaration_value_matches_exact_key() {
        assert_eq!(declaration_value("// @name   Foo", "name"), Some("Foo"));
        assert_eq!(declaration_value("//@noframes", "noframes"), Some(""));
        assert_eq!(declaration_value("// @namespace x", "name"), None);
        assert_eq!(declaration_value("let x = '@name';", "name"), None);
    }

    #[test]
    fn contains_word_respects_boundaries() {
        assert!(contains_word("GM_getValue('a')", "GM_getValue"));
        assert!(!contains_word("GM_getValues()", "GM_getValue"));
        assert!(!contains_word("my_GM_getValue()", "GM_getValue"));
    }

    #[test]
    fn unused_api_is_skipped() {
        assert_eq!(run(Check::Grant("GM_download"), "(function(){})()"), None);
        assert_eq!(run(Check::UnclearedInterval, "foo()"), None);
        assert_eq!(run(Check::RunAtValue, "// @name x"), None);
    }

    #[test]
    fn unsafe_window_is_only_a_warning() {
        assert_eq!(
            run(Check::UnsafeWindow, "unsafeWindow.foo = 1;"),
            Some(Status::Warning)
        );
        assert_eq!(
            run(
                Check::UnsafeWindow,
                "// @grant unsafeWindow\nunsafeWindow.foo = 1;"
            ),
            Some(Status::Pass)
        );
    }

    #[test]
    fn looped_query_needs_both_on_one_line() {
        assert_eq!(
            run(
                Check::LoopedQuery,
                "for (let i = 0; i < n; i++) document.querySelector('a');"
            ),
            Some(Status::Warning)
        );
        assert_eq!(
            run(
                Check::LoopedQuery,
                "items.forEach(i => document.querySelectorAll(i));"
            ),
            Some(Status::Warning)
        );
        assert_eq!(
            run(Check::LoopedQuery, "for (const a of b) {}\ndocument.querySelector('a');"),
            Some(Status::Pass)
        );
    }

    #[test]
    fn interval_and_listener_pairs() {
        assert_eq!(
            run(Check::UnclearedInterval, "const t = setInterval(f, 10);"),
            Some(Status::Warning)
        );
        assert_eq!(
            run(
                Check::UnclearedInterval,
                "const t = setInterval(f, 10); clearInterval(t);"
            ),
            Some(Status::Pass)
        );
        assert_eq!(
            run(Check::UnremovedListener, "el.addEventListener('x', f);"),
            Some(Status::Warning)
        );
    }

    #[test]
    fn security_patterns() {
        assert_eq!(run(Check::DynamicCode, "eval(code)"), Some(Status::Error));
        assert_eq!(run(Check::DynamicCode, "new Function('a', b)"), Some(Status::Error));
        assert_eq!(run(Check::DynamicCode, "evaluate(x)"), Some(Status::Pass));
        assert_eq!(run(Check::InnerHtml, "el.innerHTML = html;"), Some(Status::Warning));
        assert_eq!(run(Check::InnerHtml, "el.innerHTML += html;"), Some(Status::Warning));
        assert_eq!(run(Check::InnerHtml, "if (el.innerHTML === '')"), Some(Status::Pass));
        assert_eq!(run(Check::DocumentWrite, "document.write('<p>')"), Some(Status::Warning));
    }

    #[test]
    fn style_patterns() {
        assert_eq!(run(Check::StrictMode, "\"use strict\";"), Some(Status::Pass));
        assert_eq!(run(Check::StrictMode, "foo();"), Some(Status::Warning));
        assert_eq!(run(Check::IifeWrapper, "(() => {\n})();"), Some(Status::Pass));
        assert_eq!(run(Check::IifeWrapper, "(async function () {})();"), Some(Status::Pass));
        assert_eq!(run(Check::IifeWrapper, "function main() {}\nmain();"), Some(Status::Warning));
    }

    #[test]
    fn console_log_threshold_is_exclusive() {
        let five = "console.log(1);\n".repeat(5);
        let six = "console.log(1);\n".repeat(6);
        assert_eq!(run(Check::ConsoleLog, &five), Some(Status::Pass));
        assert_eq!(run(Check::ConsoleLog, &six), Some(Status::Warning));
    }

    #[test]
    fn run_at_value_checked() {
        assert_eq!(
            run(Check::RunAtValue, "// @run-at document-end"),
            Some(Status::Pass)
        );
        assert_eq!(
            run(Check::RunAtValue, "// @run-at whenever"),
            Some(Status::Warning)
        );
    }

    #[test]
    fn default_battery_has_unique_ids() {
        let checks = default_checks();
        let mut ids: Vec<_> = checks.iter().map(Check::id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), checks.len());
    }
}

use crate::config::Config;
use crate::error::{Result, ScriptkitError};
use crate::metadata::{self, BLOCK_END};
use crate::paths;
use crate::template::{TemplateKind, TemplateSource};
use crate::io;
use regex::{NoExpand, Regex};
use serde::Serialize;
use std::path::{Path, PathBuf};

const FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons?sz=64&domain=";

// ---------------------------------------------------------------------------
// GenerateRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub name: String,
    pub url_pattern: String,
    pub kind: TemplateKind,
}

impl GenerateRequest {
    /// Checks run in the order the CLI reports them: required arguments,
    /// then the script name, then the template kind.
    pub fn new(name: &str, url_pattern: &str, kind: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(ScriptkitError::MissingArgument("name"));
        }
        if url_pattern.trim().is_empty() {
            return Err(ScriptkitError::MissingArgument("url-pattern"));
        }
        paths::validate_script_name(name)?;
        Ok(Self {
            name: name.trim().to_string(),
            url_pattern: url_pattern.trim().to_string(),
            kind: kind.parse()?,
        })
    }
}

// ---------------------------------------------------------------------------
// GenerateOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerateOutcome {
    Written {
        path: PathBuf,
        kind: TemplateKind,
        title: String,
        overwritten: bool,
    },
    /// The output file existed and the caller declined to overwrite it.
    Declined { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Substitution helpers
// ---------------------------------------------------------------------------

/// Host part of a match pattern, used to pick a favicon.
///
/// `https://github.com/*` gives `github.com`; `*://*.reddit.com/*` gives
/// `reddit.com`; anything still containing a wildcard falls back to
/// `default_host`.
pub fn icon_host(url_pattern: &str, default_host: &str) -> String {
    let rest = match url_pattern.find("://") {
        Some(i) => &url_pattern[i + 3..],
        None => url_pattern,
    };
    let host = rest.split('/').next().unwrap_or_default();
    let host = host.strip_prefix("*.").unwrap_or(host);
    if host.is_empty() || host.contains('*') {
        default_host.to_string()
    } else {
        host.to_string()
    }
}

pub fn icon_url(host: &str) -> String {
    format!("{FAVICON_SERVICE}{host}")
}

/// `dark-mode` and `DARK_MODE` both become `Dark Mode`.
pub fn title_case(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace the first `// @key ...` line with `// @key value`, or insert one
/// just before the closing banner when the template has none.
fn set_metadata(text: &str, key: &str, value: &str) -> String {
    let line = metadata::format_line(key, value);
    let pattern = format!(r"(?m)^//[ \t]*@{}(?:[ \t][^\r\n]*)?$", regex::escape(key));
    let re = Regex::new(&pattern).expect("metadata key pattern is valid");

    if re.is_match(text) {
        return re.replace(text, NoExpand(&line)).into_owned();
    }
    match text.find(BLOCK_END) {
        Some(pos) => format!("{}{line}\n{}", &text[..pos], &text[pos..]),
        None => text.to_string(),
    }
}

/// Apply all substitutions for `request` to a template's text.
pub fn render(template: &str, request: &GenerateRequest, config: &Config) -> String {
    let host = icon_host(&request.url_pattern, &config.icon_default_host);

    let mut text = set_metadata(template, "name", &request.name);
    text = set_metadata(&text, "match", &request.url_pattern);
    text = set_metadata(&text, "icon", &icon_url(&host));
    if let Some(author) = &config.author {
        text = set_metadata(&text, "author", author);
    }
    if let Some(namespace) = &config.namespace {
        text = set_metadata(&text, "namespace", namespace);
    }

    text.replace(request.kind.placeholder_title(), &title_case(&request.name))
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

/// Render `request` into `<output_dir>/<name>.user.js`.
///
/// When the file already exists `confirm_overwrite` decides; declining is not
/// an error and leaves the file untouched.
pub fn generate(
    request: &GenerateRequest,
    source: &TemplateSource,
    output_dir: &Path,
    config: &Config,
    confirm_overwrite: impl FnOnce(&Path) -> bool,
) -> Result<GenerateOutcome> {
    let template = source.load(request.kind)?;
    let path = paths::script_path(output_dir, &request.name);

    let overwritten = path.exists();
    if overwritten && !confirm_overwrite(&path) {
        return Ok(GenerateOutcome::Declined { path });
    }

    let rendered = render(&template, request, config);
    io::atomic_write(&path, rendered.as_bytes())?;

    Ok(GenerateOutcome::Written {
        path,
        kind: request.kind,
        title: title_case(&request.name),
        overwritten,
    })
}

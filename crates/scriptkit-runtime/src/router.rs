use crate::error::{Result, RuntimeError};
use regex::Regex;

/// Boxed page handler receiving the route's captures in order.
pub type Handler = Box<dyn FnMut(&[String]) + Send>;

// ─── Helpers ──────────────────────────────────────────────────────────────

/// Path component of a URL: scheme, host, query and fragment are dropped.
/// Input without a scheme is treated as already being a path.
pub fn url_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let without_query = &url[..end];
    let path = match without_query.find("://") {
        Some(i) => {
            let rest = &without_query[i + 3..];
            rest.find('/').map(|j| &rest[j..]).unwrap_or("/")
        }
        None => without_query,
    };
    match path {
        "" => "/",
        path => path,
    }
}

/// Compile `/users/:id/posts/:post` into an anchored regex where each
/// `:name` segment captures one path segment. A trailing slash is optional.
fn compile_path(pattern: &str) -> Result<Regex> {
    let trimmed = pattern.trim_end_matches('/');
    let source = if trimmed.is_empty() {
        "^/?$".to_string()
    } else {
        let body = trimmed
            .split('/')
            .map(|seg| match seg.strip_prefix(':') {
                Some(name)
                    if !name.is_empty()
                        && name.chars().all(|c| c.is_alphanumeric() || c == '_') =>
                {
                    "([^/]+)".to_string()
                }
                _ => regex::escape(seg),
            })
            .collect::<Vec<_>>()
            .join("/");
        format!("^{body}/?$")
    };
    Regex::new(&source).map_err(|source| RuntimeError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Positional capture groups when `regex` matches `path`.
fn captures(regex: &Regex, path: &str) -> Option<Vec<String>> {
    let caps = regex.captures(path)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
    )
}

// ─── Router ───────────────────────────────────────────────────────────────

struct Route<T> {
    pattern: String,
    regex: Regex,
    value: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// Registration index of the winning route.
    pub index: usize,
    pub pattern: &'a str,
    pub value: &'a T,
    /// Capture groups in order; unmatched optional groups are empty.
    pub params: Vec<String>,
}

/// Ordered route table. The first route registered that matches wins.
pub struct Router<T = Handler> {
    routes: Vec<Route<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Register a path pattern with `:param` placeholders.
    pub fn add_path(&mut self, pattern: &str, value: T) -> Result<&mut Self> {
        let regex = compile_path(pattern)?;
        self.routes.push(Route {
            pattern: pattern.to_string(),
            regex,
            value,
        });
        Ok(self)
    }

    /// Register a custom expression, matched against the URL path as is.
    pub fn add_regex(&mut self, regex: Regex, value: T) -> &mut Self {
        self.routes.push(Route {
            pattern: regex.as_str().to_string(),
            regex,
            value,
        });
        self
    }

    /// Like [`Router::add_regex`] but compiles `pattern` first.
    pub fn add_pattern(&mut self, pattern: &str, value: T) -> Result<&mut Self> {
        let regex = Regex::new(pattern).map_err(|source| RuntimeError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(self.add_regex(regex, value))
    }

    pub fn resolve(&self, url: &str) -> Option<RouteMatch<'_, T>> {
        let path = url_path(url);
        self.routes.iter().enumerate().find_map(|(index, route)| {
            let params = captures(&route.regex, path)?;
            Some(RouteMatch {
                index,
                pattern: &route.pattern,
                value: &route.value,
                params,
            })
        })
    }
}

impl<F> Router<F>
where
    F: FnMut(&[String]),
{
    /// Run the first matching handler. Returns the winning route's index.
    pub fn dispatch(&mut self, url: &str) -> Option<usize> {
        let path = url_path(url);
        let (index, params) = self
            .routes
            .iter()
            .enumerate()
            .find_map(|(i, route)| captures(&route.regex, path).map(|p| (i, p)))?;
        let route = &mut self.routes[index];
        tracing::debug!(url, route = %route.pattern, "route matched");
        (route.value)(&params);
        Some(index)
    }
}

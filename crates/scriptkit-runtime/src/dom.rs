use crate::error::{Result, RuntimeError};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

// ─── Element ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Assigned by the document on insertion.
    pub node: ElementId,
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub text: String,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            node: ElementId(0),
            tag: tag.into().to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            text: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        selector.alternatives.iter().any(|c| c.matches(self))
    }
}

// ─── Selector ─────────────────────────────────────────────────────────────

/// Compound selectors (`tag`, `#id`, `.class`, `tag#id.a.b`, `*`) joined by
/// commas. Combinators and attribute selectors are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(input: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut rest = input;

        let tag_end = rest.find(['#', '.']).unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        if !tag.is_empty() && tag != "*" {
            if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return None;
            }
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
            {
                return None;
            }
            match marker {
                '#' if compound.id.is_none() => compound.id = Some(name.to_string()),
                '.' => compound.classes.push(name.to_string()),
                _ => return None,
            }
            rest = &body[end..];
        }

        Some(compound)
    }

    fn matches(&self, el: &Element) -> bool {
        self.tag.as_ref().map_or(true, |t| *t == el.tag)
            && self.id.as_ref().map_or(true, |id| el.id.as_ref() == Some(id))
            && self.classes.iter().all(|c| el.classes.contains(c))
    }
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = || RuntimeError::InvalidSelector(source.to_string());
        let alternatives = source
            .split(',')
            .map(|part| {
                let part = part.trim();
                if part.is_empty() || part.contains(char::is_whitespace) {
                    return None;
                }
                Compound::parse(part)
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

// ─── Events ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// One batch of structural changes.
    Mutation {
        added: Vec<ElementId>,
        removed: Vec<ElementId>,
    },
    /// History back/forward.
    PopState { url: String },
}

// ─── Document ─────────────────────────────────────────────────────────────

/// The slice of a live page the runtime patterns need.
pub trait Document: Send + Sync {
    fn query_selector(&self, selector: &Selector) -> Option<Element>;

    fn location(&self) -> String;

    /// Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent>;
}

// ─── MemoryDocument ───────────────────────────────────────────────────────

#[derive(Debug)]
struct State {
    elements: Vec<Element>,
    history: Vec<String>,
    next_node: u64,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    events: broadcast::Sender<DocumentEvent>,
}

/// In-memory [`Document`]. Clones share the same page.
///
/// Like a browser, `navigate` (pushState) changes the location without an
/// event of its own; only `back` emits a pop-state event.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    inner: Arc<Inner>,
}

impl MemoryDocument {
    pub fn new(url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    elements: Vec::new(),
                    history: vec![url.into()],
                    next_node: 1,
                }),
                events,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: DocumentEvent) {
        // No subscribers is fine: nobody is watching.
        let _ = self.inner.events.send(event);
    }

    pub fn append(&self, mut element: Element) -> ElementId {
        let node = {
            let mut state = self.state();
            let node = ElementId(state.next_node);
            state.next_node += 1;
            element.node = node;
            state.elements.push(element);
            node
        };
        tracing::trace!(node = node.0, "element appended");
        self.emit(DocumentEvent::Mutation {
            added: vec![node],
            removed: Vec::new(),
        });
        node
    }

    pub fn remove(&self, node: ElementId) -> bool {
        let removed = {
            let mut state = self.state();
            let before = state.elements.len();
            state.elements.retain(|e| e.node != node);
            state.elements.len() != before
        };
        if removed {
            self.emit(DocumentEvent::Mutation {
                added: Vec::new(),
                removed: vec![node],
            });
        }
        removed
    }

    /// Live subscriptions; waiters and watchers drop theirs when done.
    pub fn receiver_count(&self) -> usize {
        self.inner.events.receiver_count()
    }

    /// `history.pushState`: new location, no event.
    pub fn navigate(&self, url: impl Into<String>) {
        self.state().history.push(url.into());
    }

    /// `history.back()`: returns the restored location and emits pop-state.
    /// `None` at the first history entry.
    pub fn back(&self) -> Option<String> {
        let url = {
            let mut state = self.state();
            if state.history.len() < 2 {
                return None;
            }
            state.history.pop();
            state.history.last().cloned()?
        };
        self.emit(DocumentEvent::PopState { url: url.clone() });
        Some(url)
    }
}

impl Document for MemoryDocument {
    fn query_selector(&self, selector: &Selector) -> Option<Element> {
        self.state()
            .elements
            .iter()
            .find(|e| e.matches(selector))
            .cloned()
    }

    fn location(&self) -> String {
        self.state().history.last().cloned().unwrap_or_default()
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.inner.events.subscribe()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn selector_parses_compound_forms() {
        let el = Element::new("DIV").with_id("app").with_class("a").with_class("b");
        for s in ["div", "#app", ".a", "div#app.a.b", "*", ".b.a", "span, .a"] {
            assert!(el.matches(&sel(s)), "{s}");
        }
        for s in ["span", "#other", ".c", "div.a.c"] {
            assert!(!el.matches(&sel(s)), "{s}");
        }
    }

    #[test]
    fn selector_rejects_unsupported_syntax() {
        for s in ["", "div p", "a > b", "[data-x]", "#", ".", "#a#b", "div,"] {
            assert!(Selector::parse(s).is_err(), "{s}");
        }
    }

    #[test]
    fn append_and_query() {
        let doc = MemoryDocument::new("https://example.com/");
        assert!(doc.query_selector(&sel("video")).is_none());

        let node = doc.append(Element::new("video").with_class("main"));
        let found = doc.query_selector(&sel("video.main")).unwrap();
        assert_eq!(found.node, node);

        assert!(doc.remove(node));
        assert!(!doc.remove(node));
        assert!(doc.query_selector(&sel("video")).is_none());
    }

    #[tokio::test]
    async fn mutations_are_broadcast() {
        let doc = MemoryDocument::new("https://example.com/");
        let mut rx = doc.subscribe();
        let node = doc.append(Element::new("p"));
        assert_eq!(
            rx.recv().await.unwrap(),
            DocumentEvent::Mutation {
                added: vec![node],
                removed: vec![]
            }
        );
    }

    #[tokio::test]
    async fn navigate_is_silent_back_emits() {
        let doc = MemoryDocument::new("https://example.com/a");
        let mut rx = doc.subscribe();

        doc.navigate("https://example.com/b");
        assert_eq!(doc.location(), "https://example.com/b");
        assert!(rx.try_recv().is_err());

        assert_eq!(doc.back().as_deref(), Some("https://example.com/a"));
        assert_eq!(
            rx.recv().await.unwrap(),
            DocumentEvent::PopState {
                url: "https://example.com/a".into()
            }
        );
        assert_eq!(doc.back(), None);
    }
}

use crate::dom::Document;
use tokio::sync::broadcast::error::RecvError;

/// Detects client-side navigation by comparing the document location to the
/// last URL it saw, on every mutation batch and pop-state event.
///
/// Each watcher owns its own `last_url`, so several can watch one document
/// without interfering. Detection is level-triggered: two navigations inside
/// one notification batch are reported as a single change to the final URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationWatcher {
    last_url: String,
}

impl NavigationWatcher {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            last_url: initial_url.into(),
        }
    }

    /// Start from the document's current location.
    pub fn for_document<D: Document + ?Sized>(doc: &D) -> Self {
        Self::new(doc.location())
    }

    pub fn last_url(&self) -> &str {
        &self.last_url
    }

    /// Record `current`; returns it when it differs from the last URL seen.
    pub fn observe(&mut self, current: &str) -> Option<&str> {
        if current == self.last_url {
            return None;
        }
        current.clone_into(&mut self.last_url);
        Some(&self.last_url)
    }

    /// Call `on_change` with each new URL until the document's event channel
    /// closes. Drop or abort the future to stop watching.
    pub async fn run<D, F>(mut self, doc: &D, mut on_change: F)
    where
        D: Document + ?Sized,
        F: FnMut(&str),
    {
        let mut events = doc.subscribe();
        loop {
            match events.recv().await {
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "navigation watcher lagged; re-checking location");
                }
                Err(RecvError::Closed) => return,
            }
            if let Some(url) = self.observe(&doc.location()) {
                tracing::debug!(url, "navigation detected");
                on_change(url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Element, MemoryDocument};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn observe_reports_only_changes() {
        let mut w = NavigationWatcher::new("https://x.test/a");
        assert_eq!(w.observe("https://x.test/a"), None);
        assert_eq!(w.observe("https://x.test/b"), Some("https://x.test/b"));
        assert_eq!(w.last_url(), "https://x.test/b");
        assert_eq!(w.observe("https://x.test/b"), None);
    }

    #[test]
    fn watchers_are_independent() {
        let mut a = NavigationWatcher::new("https://x.test/");
        let mut b = NavigationWatcher::new("https://x.test/");
        assert!(a.observe("https://x.test/next").is_some());
        assert_eq!(b.last_url(), "https://x.test/");
        assert!(b.observe("https://x.test/next").is_some());
    }

    fn spawn_watcher(doc: &MemoryDocument) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let doc = doc.clone();
        let watcher = NavigationWatcher::for_document(&doc);
        tokio::spawn(async move {
            watcher
                .run(&doc, |url| sink.lock().unwrap().push(url.to_string()))
                .await;
        });
        seen
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn push_state_detected_on_next_mutation() {
        let doc = MemoryDocument::new("https://app.test/");
        let seen = spawn_watcher(&doc);
        settle().await;

        doc.navigate("https://app.test/users/7");
        settle().await;
        assert!(seen.lock().unwrap().is_empty());

        doc.append(Element::new("h1").with_text("User 7"));
        settle().await;
        assert_eq!(*seen.lock().unwrap(), vec!["https://app.test/users/7"]);

        // Further mutations on the same page are not new navigations.
        doc.append(Element::new("p"));
        settle().await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn back_is_detected_via_pop_state() {
        let doc = MemoryDocument::new("https://app.test/");
        doc.navigate("https://app.test/search");
        let seen = spawn_watcher(&doc);
        settle().await;

        doc.back();
        settle().await;
        assert_eq!(*seen.lock().unwrap(), vec!["https://app.test/"]);
    }

    #[tokio::test(start_paused = true)]
    async fn two_watchers_each_fire_once() {
        let doc = MemoryDocument::new("https://app.test/");
        let first = spawn_watcher(&doc);
        let second = spawn_watcher(&doc);
        settle().await;

        doc.navigate("https://app.test/feed");
        doc.append(Element::new("article"));
        settle().await;

        assert_eq!(*first.lock().unwrap(), vec!["https://app.test/feed"]);
        assert_eq!(*second.lock().unwrap(), vec!["https://app.test/feed"]);
    }
}

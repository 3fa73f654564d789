//! Timestamp bookmarks from the YouTube example script.
//!
//! Each video's bookmarks live under `bookmarks_<videoId>` as a JSON-encoded
//! string holding an array of `{time, note}` records sorted by time.

use crate::error::Result;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const KEY_PREFIX: &str = "bookmarks_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Seconds from the start of the video.
    pub time: u64,
    pub note: String,
}

pub fn storage_key(video_id: &str) -> String {
    format!("{KEY_PREFIX}{video_id}")
}

/// Video id from a watch, shorts or youtu.be URL.
pub fn video_id_from_url(url: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let (base, query) = match without_fragment.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (without_fragment, None),
    };

    if let Some(id) = query
        .into_iter()
        .flat_map(|q| q.split('&'))
        .find_map(|pair| pair.strip_prefix("v="))
        .filter(|id| !id.is_empty())
    {
        return Some(id.to_string());
    }

    let rest = base.split_once("://").map(|(_, r)| r).unwrap_or(base);
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    let id = if host.ends_with("youtu.be") {
        path.split('/').next()
    } else {
        path.strip_prefix("shorts/").and_then(|p| p.split('/').next())
    };
    id.filter(|id| !id.is_empty()).map(str::to_string)
}

/// `75` → `1:15`, `3725` → `1:02:05`.
pub fn format_timestamp(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Accepts plain seconds (`95`), `m:ss` or `h:mm:ss`.
pub fn parse_timestamp(input: &str) -> Option<u64> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    let mut total: u64 = 0;
    for (i, part) in parts.iter().enumerate() {
        let n: u64 = part.parse().ok()?;
        if i > 0 && n >= 60 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(n)?;
    }
    Some(total)
}

// ─── BookmarkStore ────────────────────────────────────────────────────────

pub struct BookmarkStore<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> BookmarkStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Bookmarks for `video_id`, sorted by time. Unreadable data reads as
    /// empty, matching the script's `try { JSON.parse } catch`.
    pub fn list(&self, video_id: &str) -> Result<Vec<Bookmark>> {
        let key = storage_key(video_id);
        let Some(value) = self.store.get(&key)? else {
            return Ok(Vec::new());
        };
        let parsed = match value {
            Value::String(s) => serde_json::from_str::<Vec<Bookmark>>(&s),
            other => serde_json::from_value::<Vec<Bookmark>>(other),
        };
        match parsed {
            Ok(mut bookmarks) => {
                bookmarks.sort_by_key(|b| b.time);
                Ok(bookmarks)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring unreadable bookmarks");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, video_id: &str, bookmarks: &[Bookmark]) -> Result<()> {
        let key = storage_key(video_id);
        if bookmarks.is_empty() {
            return self.store.delete(&key);
        }
        let encoded = serde_json::to_string(bookmarks)?;
        self.store.set(&key, Value::String(encoded))
    }

    /// Returns `false` (and stores nothing) when `time` is already bookmarked.
    pub fn add(&self, video_id: &str, time: u64, note: &str) -> Result<bool> {
        let mut bookmarks = self.list(video_id)?;
        if bookmarks.iter().any(|b| b.time == time) {
            return Ok(false);
        }
        bookmarks.push(Bookmark {
            time,
            note: note.to_string(),
        });
        bookmarks.sort_by_key(|b| b.time);
        self.save(video_id, &bookmarks)?;
        Ok(true)
    }

    /// Returns whether a bookmark at `time` existed.
    pub fn remove(&self, video_id: &str, time: u64) -> Result<bool> {
        let mut bookmarks = self.list(video_id)?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.time != time);
        if bookmarks.len() == before {
            return Ok(false);
        }
        self.save(video_id, &bookmarks)?;
        Ok(true)
    }

    /// Ids of every video with at least one stored bookmark entry.
    pub fn videos(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(KEY_PREFIX).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn video_ids() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?feature=x&v=abc#c").as_deref(),
            Some("abc")
        );
        assert_eq!(
            video_id_from_url("https://www.youtube.com/shorts/xyz123").as_deref(),
            Some("xyz123")
        );
        assert_eq!(
            video_id_from_url("https://youtu.be/short1?si=q").as_deref(),
            Some("short1")
        );
        assert_eq!(video_id_from_url("https://www.youtube.com/feed/library"), None);
        assert_eq!(video_id_from_url("https://www.youtube.com/watch?v="), None);
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0), "0:00");
        assert_eq!(format_timestamp(75), "1:15");
        assert_eq!(format_timestamp(3725), "1:02:05");
        assert_eq!(parse_timestamp("95"), Some(95));
        assert_eq!(parse_timestamp("1:15"), Some(75));
        assert_eq!(parse_timestamp("1:02:05"), Some(3725));
        assert_eq!(parse_timestamp("1:75"), None);
        assert_eq!(parse_timestamp("1::2"), None);
        assert_eq!(parse_timestamp("abc"), None);
    }

    #[test]
    fn add_keeps_sorted_and_unique() {
        let store = MemoryStore::new();
        let marks = BookmarkStore::new(&store);

        assert!(marks.add("vid", 120, "chorus").unwrap());
        assert!(marks.add("vid", 30, "intro").unwrap());
        assert!(!marks.add("vid", 120, "again").unwrap());

        let list = marks.list("vid").unwrap();
        assert_eq!(
            list,
            vec![
                Bookmark { time: 30, note: "intro".into() },
                Bookmark { time: 120, note: "chorus".into() },
            ]
        );
    }

    #[test]
    fn stored_as_json_string_under_video_key() {
        let store = MemoryStore::new();
        BookmarkStore::new(&store).add("abc", 5, "x").unwrap();
        assert_eq!(
            store.get("bookmarks_abc").unwrap(),
            Some(json!("[{\"time\":5,\"note\":\"x\"}]"))
        );
    }

    #[test]
    fn remove_and_cleanup() {
        let store = MemoryStore::new();
        let marks = BookmarkStore::new(&store);
        marks.add("v1", 10, "").unwrap();
        marks.add("v2", 20, "").unwrap();
        assert_eq!(marks.videos().unwrap(), vec!["v1", "v2"]);

        assert!(marks.remove("v1", 10).unwrap());
        assert!(!marks.remove("v1", 10).unwrap());
        assert_eq!(marks.videos().unwrap(), vec!["v2"]);
    }

    #[test]
    fn corrupt_entry_reads_empty() {
        let store = MemoryStore::new();
        store.set("bookmarks_bad", json!("{not json")).unwrap();
        let marks = BookmarkStore::new(&store);
        assert!(marks.list("bad").unwrap().is_empty());
        assert!(marks.add("bad", 1, "fresh").unwrap());
        assert_eq!(marks.list("bad").unwrap().len(), 1);
    }
}

//! `scriptkit-runtime`: the reusable patterns the userscript templates
//! embed, as a Rust library.
//!
//! # Architecture
//!
//! ```text
//! Document (trait)        ← query_selector / location / subscribe
//!     │                      MemoryDocument broadcasts mutation and
//!     │                      pop-state events over tokio::sync::broadcast
//!     ├── wait_for_element   resolve on first match, or time out once
//!     └── NavigationWatcher  owns last_url, fires on change
//!               │
//!               ▼
//!           Router           ordered first-match, positional captures
//!
//! KeyValueStore (trait)   ← GM_getValue / GM_setValue model
//!     ├── Settings           key-typed values with a default table
//!     └── BookmarkStore      per-video timestamp bookmarks
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use scriptkit_runtime::{wait_for_element, MemoryDocument};
//! use std::time::Duration;
//!
//! let doc = MemoryDocument::new("https://example.com/");
//! let el = wait_for_element(&doc, "#app", Duration::from_secs(5)).await?;
//! ```

pub mod bookmarks;
pub mod dom;
pub mod error;
pub mod navigation;
pub mod router;
pub mod settings;
pub mod storage;
pub mod wait;

pub use bookmarks::{Bookmark, BookmarkStore};
pub use dom::{Document, DocumentEvent, Element, ElementId, MemoryDocument, Selector};
pub use error::{Result, RuntimeError};
pub use navigation::NavigationWatcher;
pub use router::{RouteMatch, Router};
pub use settings::{SettingKey, Settings};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use wait::{wait_for_element, DEFAULT_TIMEOUT};

use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use scriptkit_core::paths;
use scriptkit_runtime::{
    bookmarks::{format_timestamp, parse_timestamp, video_id_from_url},
    BookmarkStore, FileStore,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum BookmarkSubcommand {
    /// Bookmark a moment in a video
    Add {
        /// Video URL or bare video id
        video: String,
        /// Seconds, m:ss or h:mm:ss
        time: String,
        /// Optional note
        #[arg(default_value = "")]
        note: String,
    },

    /// List bookmarks for one video, or every bookmarked video
    List {
        /// Video URL or bare video id
        video: Option<String>,
    },

    /// Remove the bookmark at a given time
    Remove {
        video: String,
        time: String,
    },
}

pub fn run(
    root: &Path,
    store: Option<&Path>,
    subcmd: BookmarkSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let store = FileStore::new(match store {
        Some(p) => p.to_path_buf(),
        None => paths::storage_path(root),
    });
    let bookmarks = BookmarkStore::new(&store);

    match subcmd {
        BookmarkSubcommand::Add { video, time, note } => {
            let id = resolve_video(&video)?;
            let seconds = resolve_time(&time)?;
            let added = bookmarks
                .add(&id, seconds, &note)
                .with_context(|| format!("failed to update {}", store.path().display()))?;
            if json {
                return print_json(&serde_json::json!({
                    "video": id,
                    "time": seconds,
                    "added": added,
                }));
            }
            if added {
                println!("Bookmarked {id} at {}", format_timestamp(seconds));
            } else {
                println!("{id} already has a bookmark at {}", format_timestamp(seconds));
            }
            Ok(())
        }
        BookmarkSubcommand::List { video: Some(video) } => {
            let id = resolve_video(&video)?;
            let list = bookmarks.list(&id)?;
            if json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("No bookmarks for {id}.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = list
                .iter()
                .map(|b| vec![format_timestamp(b.time), b.note.clone()])
                .collect();
            print_table(&["TIME", "NOTE"], &rows);
            Ok(())
        }
        BookmarkSubcommand::List { video: None } => {
            let videos = bookmarks.videos()?;
            if json {
                return print_json(&videos);
            }
            if videos.is_empty() {
                println!("No bookmarks.");
                return Ok(());
            }
            let mut rows = Vec::with_capacity(videos.len());
            for id in &videos {
                let count = bookmarks.list(id)?.len();
                rows.push(vec![id.clone(), count.to_string()]);
            }
            print_table(&["VIDEO", "BOOKMARKS"], &rows);
            Ok(())
        }
        BookmarkSubcommand::Remove { video, time } => {
            let id = resolve_video(&video)?;
            let seconds = resolve_time(&time)?;
            if !bookmarks.remove(&id, seconds)? {
                anyhow::bail!("no bookmark for {id} at {}", format_timestamp(seconds));
            }
            if json {
                return print_json(&serde_json::json!({ "video": id, "time": seconds, "removed": true }));
            }
            println!("Removed {id} at {}", format_timestamp(seconds));
            Ok(())
        }
    }
}

/// A watch/shorts/youtu.be URL, or a bare id when there is no path at all.
fn resolve_video(input: &str) -> anyhow::Result<String> {
    if let Some(id) = video_id_from_url(input) {
        return Ok(id);
    }
    if !input.is_empty() && !input.contains(['/', '?', ':']) {
        return Ok(input.to_string());
    }
    anyhow::bail!("cannot find a video id in '{input}'")
}

fn resolve_time(input: &str) -> anyhow::Result<u64> {
    parse_timestamp(input)
        .with_context(|| format!("invalid time '{input}': expected seconds, m:ss or h:mm:ss"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_accepts_urls_and_bare_ids() {
        assert_eq!(
            resolve_video("https://www.youtube.com/watch?v=abc123").unwrap(),
            "abc123"
        );
        assert_eq!(resolve_video("abc123").unwrap(), "abc123");
        assert!(resolve_video("https://example.com/page").is_err());
        assert!(resolve_video("").is_err());
    }
}

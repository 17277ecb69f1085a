//! Gallery loading: turn a directory of images (or nothing) into cards.
//!
//! This module performs filesystem reads and returns plain data structures.
//! No UI or Ratatui types are used here.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use walkdir::WalkDir;

/// Extensions the decoder understands.  Files without an extension are
/// sniffed by content instead.
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "ico",
];

/// Payload of one gallery card.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryCard {
    pub title: String,
    pub caption: String,
    /// Source image, decoded lazily when the card nears the front.
    pub image: Option<PathBuf>,
}

impl GalleryCard {
    pub fn text(title: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            caption: caption.into(),
            image: None,
        }
    }
}

/// Text-only cards used when no directory is given.
pub fn placeholder_cards(count: usize) -> Vec<GalleryCard> {
    (1..=count)
        .map(|n| GalleryCard::text(format!("Card {n}"), format!("{n} of {count}")))
        .collect()
}

/// Collect image files under `root`, `depth` levels deep (1 = only `root`'s
/// own files).  Hidden entries are skipped; results are sorted by path.
pub fn scan_images(root: &Path, depth: usize) -> anyhow::Result<Vec<GalleryCard>> {
    let meta = std::fs::metadata(root).with_context(|| format!("reading {}", root.display()))?;
    anyhow::ensure!(meta.is_dir(), "{} is not a directory", root.display());

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(depth.max(1))
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!(%err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_image(e.path()))
        .map(|e| e.into_path())
        .collect();
    paths.sort();

    tracing::info!(root = %root.display(), images = paths.len(), "gallery scanned");
    Ok(paths.into_iter().map(card_for_image).collect())
}

fn card_for_image(path: PathBuf) -> GalleryCard {
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let caption = std::fs::metadata(&path)
        .and_then(|m| m.modified())
        .map(format_modified)
        .unwrap_or_default();
    GalleryCard {
        title,
        caption,
        image: Some(path),
    }
}

fn format_modified(t: SystemTime) -> String {
    let dt: chrono::DateTime<chrono::Local> = t.into();
    dt.format("%Y/%m/%d").to_string()
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_image(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        // Content sniffing via shared-mime-info magic.
        None => tree_magic_mini::from_filepath(path).is_some_and(|m| m.starts_with("image/")),
    }
}

//! Background image decoding so the UI thread never blocks on disk or codecs.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

/// Longest edge of a decoded thumbnail.  Cards are at most a few dozen cells
/// wide, so anything larger is wasted work per frame.
const THUMBNAIL_EDGE: u32 = 256;

pub struct ImageLoaded {
    pub path: PathBuf,
    pub result: anyhow::Result<Arc<image::RgbaImage>>,
}

/// Decode `path` on a plain thread and post the thumbnail to `tx`.
pub fn spawn_image_decode(tx: mpsc::UnboundedSender<ImageLoaded>, path: PathBuf) {
    std::thread::spawn(move || {
        let result = decode_thumbnail(&path);
        let _ = tx.send(ImageLoaded { path, result });
    });
}

fn decode_thumbnail(path: &std::path::Path) -> anyhow::Result<Arc<image::RgbaImage>> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    Ok(Arc::new(img.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE).to_rgba8()))
}

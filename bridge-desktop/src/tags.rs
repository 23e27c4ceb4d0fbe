//! Tag Store Implementation using Lofty
//!
//! Reads title/artist/album, lyrics and the front cover from the file's
//! primary tag (falling back to the first tag present) and writes lyrics and
//! artwork back. Artwork is downscaled to fit [`MAX_ARTWORK_DIMENSION`] before
//! it is embedded.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    tags::{TagStore, TagUpdates, TrackTags},
};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{Picture, PictureType};
use lofty::tag::{Accessor, ItemKey, Tag};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Artwork larger than this is rejected before embedding
pub const MAX_ARTWORK_BYTES: usize = 5 * 1024 * 1024;

/// Longest edge of embedded artwork
pub const MAX_ARTWORK_DIMENSION: u32 = 500;

/// Lofty-backed tag store
///
/// All file access runs on the blocking pool.
#[derive(Debug, Default, Clone)]
pub struct LoftyTagStore;

impl LoftyTagStore {
    pub fn new() -> Self {
        Self
    }

    fn tag_error(path: &Path, action: &str, e: impl std::fmt::Display) -> BridgeError {
        BridgeError::OperationFailed(format!(
            "failed to {} tags of {}: {}",
            action,
            path.display(),
            e
        ))
    }

    fn read_blocking(path: &Path) -> Result<TrackTags> {
        let tagged_file =
            lofty::read_from_path(path).map_err(|e| Self::tag_error(path, "read", e))?;

        let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            Some(tag) => tag,
            None => {
                debug!(path = %path.display(), "File has no tags");
                return Ok(TrackTags::default());
            }
        };

        let text = |value: Option<std::borrow::Cow<'_, str>>| {
            value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let artwork = tag
            .pictures()
            .iter()
            .find(|pic| pic.pic_type() == PictureType::CoverFront)
            .or_else(|| tag.pictures().first())
            .map(|pic| Bytes::copy_from_slice(pic.data()))
            .filter(|data| !data.is_empty());

        Ok(TrackTags {
            title: text(tag.title()),
            artist: text(tag.artist()),
            album: text(tag.album()),
            lyrics: tag
                .get_string(&ItemKey::Lyrics)
                .map(str::to_string)
                .filter(|s| !s.trim().is_empty()),
            artwork,
        })
    }

    fn edit_blocking(path: &Path, updates: &TagUpdates) -> Result<()> {
        // Validate and prepare artwork before touching the file
        let picture = match &updates.artwork {
            Some(data) => Some(prepare_picture(data)?),
            None => None,
        };

        let mut tagged_file =
            lofty::read_from_path(path).map_err(|e| Self::tag_error(path, "read", e))?;

        if tagged_file.primary_tag().is_none() {
            let tag_type = tagged_file.primary_tag_type();
            tagged_file.insert_tag(Tag::new(tag_type));
        }

        let tag = tagged_file.primary_tag_mut().ok_or_else(|| {
            BridgeError::NotAvailable(format!("no writable tag for {}", path.display()))
        })?;

        if let Some(lyrics) = &updates.lyrics {
            if !tag.insert_text(ItemKey::Lyrics, lyrics.clone()) {
                return Err(BridgeError::NotAvailable(format!(
                    "tag format of {} does not support lyrics",
                    path.display()
                )));
            }
        } else if updates.clear_lyrics {
            tag.remove_key(&ItemKey::Lyrics);
        }

        if picture.is_some() || updates.clear_artwork {
            while !tag.pictures().is_empty() {
                tag.remove_picture(0);
            }
        }
        if let Some(picture) = picture {
            tag.push_picture(picture);
        }

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|e| Self::tag_error(path, "write", e))?;

        debug!(path = %path.display(), "Tags written");
        Ok(())
    }
}

/// Size-check, downscale and wrap artwork bytes as a front-cover picture
fn prepare_picture(data: &[u8]) -> Result<Picture> {
    if data.len() > MAX_ARTWORK_BYTES {
        return Err(BridgeError::InvalidInput(format!(
            "artwork is {} bytes, limit is {}",
            data.len(),
            MAX_ARTWORK_BYTES
        )));
    }

    let resized = match downscale(data) {
        Ok(Some(resized)) => resized,
        Ok(None) => data.to_vec(),
        Err(e) => {
            warn!(error = %e, "Artwork resize failed, embedding original");
            data.to_vec()
        }
    };

    let mut picture = Picture::from_reader(&mut Cursor::new(resized))
        .map_err(|e| BridgeError::InvalidInput(format!("artwork is not an image: {}", e)))?;
    picture.set_pic_type(PictureType::CoverFront);
    Ok(picture)
}

/// Re-encode `data` so that neither edge exceeds [`MAX_ARTWORK_DIMENSION`].
///
/// Returns `Ok(None)` when the image already fits.
fn downscale(data: &[u8]) -> std::result::Result<Option<Vec<u8>>, image::ImageError> {
    let format = image::guess_format(data)?;
    let img = image::load_from_memory_with_format(data, format)?;

    if img.width() <= MAX_ARTWORK_DIMENSION && img.height() <= MAX_ARTWORK_DIMENSION {
        return Ok(None);
    }

    let thumb = img.thumbnail(MAX_ARTWORK_DIMENSION, MAX_ARTWORK_DIMENSION);
    let (thumb, format) = match format {
        ImageFormat::Jpeg => (DynamicImage::ImageRgb8(thumb.to_rgb8()), ImageFormat::Jpeg),
        ImageFormat::Png => (thumb, ImageFormat::Png),
        // Formats we can't reliably re-encode become JPEG
        _ => (DynamicImage::ImageRgb8(thumb.to_rgb8()), ImageFormat::Jpeg),
    };

    let mut out = Cursor::new(Vec::new());
    thumb.write_to(&mut out, format)?;
    Ok(Some(out.into_inner()))
}

async fn run_blocking<T, F>(path: &Path, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(PathBuf) -> Result<T> + Send + 'static,
{
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || f(owned))
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("tag task failed: {}", e)))?
}

#[async_trait]
impl TagStore for LoftyTagStore {
    async fn read_tags(&self, path: &Path) -> Result<TrackTags> {
        run_blocking(path, |p| Self::read_blocking(&p)).await
    }

    async fn edit_tags(&self, path: &Path, updates: &TagUpdates) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let updates = updates.clone();
        run_blocking(path, move |p| Self::edit_blocking(&p, &updates)).await
    }
}

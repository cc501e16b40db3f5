use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::{PreparedImage, decode_data_url, decode_image};
use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::scene::model::{StoryFrame, VisualSource};

/// A decoded image together with the paint the render surface samples from.
#[derive(Clone)]
pub struct SlotImage {
    image: Arc<PreparedImage>,
    paint: vello_cpu::Image,
}

impl SlotImage {
    /// Prepare `image` for compositing.
    ///
    /// Fails with an asset error when the image does not fit the render surface.
    pub fn new(image: Arc<PreparedImage>) -> StoryreelResult<Self> {
        let paint = image.to_paint()?;
        Ok(Self { image, paint })
    }

    /// The decoded image.
    pub fn image(&self) -> &Arc<PreparedImage> {
        &self.image
    }

    pub(crate) fn paint(&self) -> &vello_cpu::Image {
        &self.paint
    }
}

impl PartialEq for SlotImage {
    fn eq(&self, other: &Self) -> bool {
        self.image == other.image
    }
}

impl Eq for SlotImage {}

impl std::fmt::Debug for SlotImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SlotImage").field(&self.image).finish()
    }
}

/// Per-frame visual, decided once before rendering starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameSlot {
    /// Decoded image ready for compositing.
    Loaded(SlotImage),
    /// The visual was missing or failed to load; a placeholder tile is drawn instead.
    Placeholder,
}

impl FrameSlot {
    /// Return `true` for [`FrameSlot::Placeholder`].
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Stable key for fingerprinting rendered frames.
    pub(crate) fn content_key(&self) -> u64 {
        match self {
            Self::Loaded(img) => img.image.digest(),
            Self::Placeholder => 0,
        }
    }
}

/// Normalize and validate a relative asset path.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> StoryreelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(StoryreelError::asset_load("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(StoryreelError::asset_load("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StoryreelError::asset_load(
                "asset paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StoryreelError::asset_load(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Absolute paths are used as-is; relative paths are normalized and joined onto `assets_root`.
pub(crate) fn resolve_asset_path(path: &Path, assets_root: &Path) -> StoryreelResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let rel = path
        .to_str()
        .ok_or_else(|| StoryreelError::asset_load("asset path is not valid utf-8"))?;
    Ok(assets_root.join(normalize_rel_path(rel)?))
}

/// Load one visual into a decoded image.
pub fn load_visual(source: &VisualSource, assets_root: &Path) -> StoryreelResult<Arc<PreparedImage>> {
    match source {
        VisualSource::Missing => Err(StoryreelError::asset_load("frame has no visual")),
        VisualSource::Encoded(bytes) => decode_image(bytes).map(Arc::new),
        VisualSource::DataUrl { url } => decode_image(&decode_data_url(url)?).map(Arc::new),
        VisualSource::File { path } => {
            let full = resolve_asset_path(path, assets_root)?;
            let bytes = std::fs::read(&full).map_err(|e| {
                StoryreelError::asset_load(format!("failed to read '{}': {e}", full.display()))
            })?;
            decode_image(&bytes).map(Arc::new)
        }
        VisualSource::Decoded(img) => Ok(img.clone()),
    }
}

/// Load every frame's visual concurrently, one slot per frame in input order.
///
/// Failures never propagate: they are logged and the slot becomes [`FrameSlot::Placeholder`].
/// This includes images that decode but are too large for the render surface.
#[tracing::instrument(level = "debug", skip_all, fields(frames = frames.len()))]
pub fn load_frame_slots(frames: &[StoryFrame], assets_root: &Path) -> Vec<FrameSlot> {
    let slots: Vec<FrameSlot> = frames
        .par_iter()
        .map(|frame| match load_visual(&frame.visual, assets_root).and_then(SlotImage::new) {
            Ok(img) => FrameSlot::Loaded(img),
            Err(e) => {
                if !matches!(frame.visual, VisualSource::Missing) {
                    tracing::warn!(frame = frame.id, error = %e, "frame visual failed to load");
                }
                FrameSlot::Placeholder
            }
        })
        .collect();

    let placeholders = slots.iter().filter(|s| s.is_placeholder()).count();
    tracing::debug!(
        loaded = slots.len() - placeholders,
        placeholders,
        "frame visuals settled"
    );
    slots
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;

use std::sync::Arc;

use base64::Engine as _;

use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Raster image in premultiplied RGBA8 form, ready for compositing.
#[derive(Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
    digest: u64,
}

impl std::fmt::Debug for PreparedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PreparedImage {
    /// Wrap straight-alpha RGBA8 pixels, premultiplying them.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> StoryreelResult<Self> {
        if width == 0 || height == 0 {
            return Err(StoryreelError::asset_load("image has zero width or height"));
        }
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba.len() != expected {
            return Err(StoryreelError::asset_load(format!(
                "rgba buffer is {} bytes, expected {expected} for {width}x{height}",
                rgba.len()
            )));
        }
        premultiply_rgba8_in_place(&mut rgba);
        let mut h = xxhash_rust::xxh3::Xxh3::new();
        h.update(&width.to_le_bytes());
        h.update(&height.to_le_bytes());
        h.update(&rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
            digest: h.digest(),
        })
    }

    /// Stable 64-bit digest of dimensions and pixels (xxh3), computed once at construction.
    pub fn digest(&self) -> u64 {
        self.digest
    }

    /// Build the paint the CPU render surface samples from.
    ///
    /// Fails when a side exceeds the surface's `u16` limit.
    pub(crate) fn to_paint(&self) -> StoryreelResult<vello_cpu::Image> {
        premul_bytes_to_paint(&self.rgba8_premul, self.width, self.height)
    }
}

/// Wrap premultiplied RGBA8 bytes as a `vello_cpu` image paint.
pub(crate) fn premul_bytes_to_paint(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> StoryreelResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StoryreelError::asset_load(format!("image width {width} exceeds u16")))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StoryreelError::asset_load(format!("image height {height} exceeds u16")))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(StoryreelError::asset_load("pixmap byte len mismatch"));
    }
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    let may_have_opacities = bytes.chunks_exact(4).any(|px| px[3] != 255);
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Decode an encoded raster (PNG, JPEG, ...) into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> StoryreelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| StoryreelError::asset_load(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PreparedImage::from_straight_rgba8(width, height, rgba.into_raw())
}

/// Extract the payload of a base64 `data:` URL.
///
/// Only `;base64` URLs are accepted; the media type is not checked because the image decoder
/// sniffs the format from the bytes.
pub fn decode_data_url(url: &str) -> StoryreelResult<Vec<u8>> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| StoryreelError::asset_load("not a data: url"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| StoryreelError::asset_load("data: url has no payload separator"))?;
    if !meta.ends_with(";base64") {
        return Err(StoryreelError::asset_load(
            "only base64-encoded data: urls are supported",
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| StoryreelError::asset_load(format!("invalid base64 in data: url: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

/// A rendered frame as premultiplied RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major, premultiplied alpha.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Read one pixel as `[r, g, b, a]`.
    ///
    /// Returns `None` when `(x, y)` is outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Stable 64-bit digest of the pixel data (xxh3).
    pub fn digest(&self) -> u64 {
        xxhash_rust::xxh3::xxh3_64(&self.data)
    }
}

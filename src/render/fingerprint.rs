use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5e71_7a2c_90d4_b36f;

/// 128-bit identity of everything that affects a rendered frame's pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FrameFingerprint {
    pub(crate) hi: u64,
    pub(crate) lo: u64,
}

/// Fingerprint a frame from its visual, its motion state and its caption.
///
/// Placeholder frames ignore zoom because the tile does not move.
pub(crate) fn fingerprint_frame(
    slot_key: Option<u64>,
    zoom: f64,
    caption_key: u64,
) -> FrameFingerprint {
    let mut h = StableHasher::new();
    match slot_key {
        Some(k) => {
            h.write_u8(1);
            h.write_u64(k);
            h.write_f64(zoom);
        }
        None => h.write_u8(0),
    }
    h.write_u64(caption_key);
    h.finish()
}

/// Stable key of a caption's text and font.
pub(crate) fn caption_key(text: &str, font_digest: u64) -> u64 {
    let mut h = StableHasher::new();
    h.write_u64(font_digest);
    h.write_bytes(text.as_bytes());
    h.finish().lo
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn finish(self) -> FrameFingerprint {
        let v = self.inner.digest128();
        FrameFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/fingerprint.rs"]
mod tests;

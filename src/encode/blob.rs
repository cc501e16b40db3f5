use base64::Engine as _;

/// MIME type of canonical PCM WAV output.
pub const MIME_WAV: &str = "audio/wav";
/// MIME type of MPEG Layer III output.
pub const MIME_MP3: &str = "audio/mpeg";
/// MIME type of MP4 video output.
pub const MIME_MP4: &str = "video/mp4";
/// MIME type of raw premultiplied RGBA8 frame streams produced by [`crate::InMemorySink`].
pub const MIME_RAW_RGBA: &str = "application/octet-stream";

/// Encoded media bytes tagged with their container type.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaBlob {
    mime: &'static str,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for MediaBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaBlob")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl MediaBlob {
    /// Wrap `bytes` with the given container type.
    pub fn new(mime: &'static str, bytes: Vec<u8>) -> Self {
        Self { mime, bytes }
    }

    /// Container MIME type.
    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Borrow the encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Return `true` when no bytes were produced.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension conventionally used for this container type.
    pub fn extension(&self) -> &'static str {
        match self.mime {
            MIME_WAV => "wav",
            MIME_MP3 => "mp3",
            MIME_MP4 => "mp4",
            _ => "bin",
        }
    }

    /// Download file name built from `stem` and the container extension.
    pub fn suggested_file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }

    /// Self-contained `data:` URL suitable for direct playback in a media element.
    pub fn to_data_url(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{b64}", self.mime)
    }

    /// Stable 64-bit content digest (xxh3).
    pub fn digest(&self) -> u64 {
        xxhash_rust::xxh3::xxh3_64(&self.bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/blob.rs"]
mod tests;

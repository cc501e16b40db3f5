use crate::audio::wav::encode_wav;
use crate::audio::waveform::WaveformBuffer;
use crate::encode::blob::{MIME_MP3, MediaBlob};
use crate::encode::ffmpeg::{ffmpeg_has_encoder, is_ffmpeg_on_path, transcode_stdin_to_file};
use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::scene::config::PipelineConfig;

/// Default constant bitrate for compressed narration.
pub const DEFAULT_MP3_BITRATE_KBPS: u32 = 128;

/// Bitrates accepted by MPEG-1/2 Layer III encoders.
const VALID_KBPS: &[u32] = &[
    8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 192, 224, 256, 320,
];

/// Samples per MP3 frame at the given sample rate (MPEG-1 vs MPEG-2/2.5 Layer III).
pub fn mp3_frame_samples(sample_rate: u32) -> usize {
    if sample_rate >= 32_000 { 1152 } else { 576 }
}

/// Options for [`encode_mp3`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mp3Opts {
    /// Constant bitrate in kbit/s.
    pub bitrate_kbps: u32,
}

impl Default for Mp3Opts {
    fn default() -> Self {
        Self {
            bitrate_kbps: DEFAULT_MP3_BITRATE_KBPS,
        }
    }
}

impl From<&PipelineConfig> for Mp3Opts {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            bitrate_kbps: cfg.mp3_bitrate_kbps,
        }
    }
}

impl Mp3Opts {
    /// Check the bitrate against the Layer III table.
    pub fn validate(&self) -> StoryreelResult<()> {
        if !VALID_KBPS.contains(&self.bitrate_kbps) {
            return Err(StoryreelError::config(format!(
                "unsupported mp3 bitrate {} kbps",
                self.bitrate_kbps
            )));
        }
        Ok(())
    }
}

/// Return `true` when MP3 encoding is available on this host.
pub fn mp3_encoder_available() -> bool {
    is_ffmpeg_on_path() && ffmpeg_has_encoder("libmp3lame")
}

/// Encode a waveform as a constant-bitrate MP3 stream at the source sample rate.
///
/// Encoding runs through the system ffmpeg (`libmp3lame`) entirely in memory. The output carries a
/// LAME info header so gapless-aware decoders trim encoder delay and padding.
#[tracing::instrument(level = "debug", skip(w), fields(samples = w.len(), sample_rate = w.sample_rate()))]
pub fn encode_mp3(w: &WaveformBuffer, opts: Mp3Opts) -> StoryreelResult<MediaBlob> {
    opts.validate()?;
    if !is_ffmpeg_on_path() {
        return Err(StoryreelError::encoder_setup(
            "ffmpeg is required for mp3 encoding, but was not found on PATH",
        ));
    }
    if !ffmpeg_has_encoder("libmp3lame") {
        return Err(StoryreelError::encoder_setup(
            "ffmpeg build does not provide the 'libmp3lame' encoder",
        ));
    }

    let wav = encode_wav(w)?;
    let bitrate = format!("{}k", opts.bitrate_kbps);
    let sample_rate = w.sample_rate().to_string();
    let bytes = transcode_stdin_to_file(
        &["-f", "wav"],
        &[
            "-vn",
            "-c:a",
            "libmp3lame",
            "-b:a",
            &bitrate,
            "-ar",
            &sample_rate,
            "-ac",
            "1",
            "-f",
            "mp3",
        ],
        "narration.mp3",
        wav.bytes(),
    )?;
    if bytes.is_empty() {
        return Err(StoryreelError::encoder_runtime(
            "mp3 encoder produced no output",
        ));
    }
    tracing::debug!(bytes = bytes.len(), "mp3 encoded");
    Ok(MediaBlob::new(MIME_MP3, bytes))
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mp3.rs"]
mod tests;

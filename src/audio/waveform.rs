use std::sync::Arc;

use base64::Engine as _;

use crate::foundation::error::{StoryreelError, StoryreelResult};

/// Sample rate of narration PCM delivered by the speech service.
pub const NARRATION_SAMPLE_RATE: u32 = 24_000;

/// Immutable mono 16-bit linear PCM waveform.
///
/// Invariants: `sample_rate > 0`, `channels == 1`, at least one sample.
#[derive(Clone, PartialEq, Eq)]
pub struct WaveformBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Arc<[i16]>,
}

impl std::fmt::Debug for WaveformBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveformBuffer")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("samples", &self.samples.len())
            .finish()
    }
}

impl WaveformBuffer {
    /// Create a validated waveform.
    pub fn new(
        sample_rate: u32,
        channels: u16,
        samples: impl Into<Arc<[i16]>>,
    ) -> StoryreelResult<Self> {
        let samples = samples.into();
        if sample_rate == 0 {
            return Err(StoryreelError::invalid_audio("sample rate must be > 0"));
        }
        if channels != 1 {
            return Err(StoryreelError::invalid_audio(format!(
                "unsupported channel count {channels} (only mono is supported)"
            )));
        }
        if samples.is_empty() {
            return Err(StoryreelError::invalid_audio("waveform has no samples"));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// Create a validated mono waveform.
    pub fn mono(sample_rate: u32, samples: impl Into<Arc<[i16]>>) -> StoryreelResult<Self> {
        Self::new(sample_rate, 1, samples)
    }

    /// Interpret raw little-endian `s16` bytes as a mono waveform.
    pub fn from_pcm_le_bytes(bytes: &[u8], sample_rate: u32) -> StoryreelResult<Self> {
        if !bytes.len().is_multiple_of(2) {
            return Err(StoryreelError::invalid_audio(format!(
                "pcm byte length {} is not a whole number of 16-bit samples",
                bytes.len()
            )));
        }
        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        Self::mono(sample_rate, samples)
    }

    /// Decode the base64 PCM payload returned by the narration service.
    pub fn from_base64_pcm(payload: &str, sample_rate: u32) -> StoryreelResult<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| StoryreelError::invalid_audio(format!("invalid base64 payload: {e}")))?;
        Self::from_pcm_le_bytes(&bytes, sample_rate)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count (always 1).
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Borrow the samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false` for a validated waveform.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Normalized `f32` samples in `[-1, 1)`.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|&s| f32::from(s) / 32_768.0)
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/waveform.rs"]
mod tests;

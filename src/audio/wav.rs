use std::io::Cursor;

use anyhow::Context as _;

use crate::audio::waveform::WaveformBuffer;
use crate::encode::blob::{MIME_WAV, MediaBlob};
use crate::foundation::error::{StoryreelError, StoryreelResult};

/// Size of the canonical PCM WAV header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

fn wav_spec(w: &WaveformBuffer) -> hound::WavSpec {
    hound::WavSpec {
        channels: w.channels(),
        sample_rate: w.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Wrap a waveform into an uncompressed 16-bit PCM WAV container.
///
/// Output is a 44-byte RIFF/WAVE header followed by little-endian samples, so decoding it with
/// [`decode_wav`] yields the original samples bit-for-bit.
pub fn encode_wav(w: &WaveformBuffer) -> StoryreelResult<MediaBlob> {
    let data_len = w.len().saturating_mul(2);
    if u32::try_from(data_len).is_err() {
        return Err(StoryreelError::invalid_audio(
            "waveform too long for a RIFF container",
        ));
    }

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + data_len));
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, wav_spec(w)).context("start wav writer")?;
        for &s in w.samples() {
            writer.write_sample(s).context("write wav sample")?;
        }
        writer.finalize().context("finalize wav header")?;
    }
    Ok(MediaBlob::new(MIME_WAV, cursor.into_inner()))
}

/// Decode a mono 16-bit PCM WAV container back into a waveform.
pub fn decode_wav(bytes: &[u8]) -> StoryreelResult<WaveformBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| StoryreelError::invalid_audio(format!("not a readable wav stream: {e}")))?;
    let spec = reader.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(StoryreelError::invalid_audio(format!(
            "expected 16-bit integer pcm, got {} bits {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()
        .map_err(|e| StoryreelError::invalid_audio(format!("truncated wav data: {e}")))?;
    WaveformBuffer::new(spec.sample_rate, spec.channels, samples)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/wav.rs"]
mod tests;

use crate::audio::waveform::WaveformBuffer;
use crate::encode::blob::{MIME_RAW_RGBA, MediaBlob};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::render::frame::FrameRGBA;

/// Configuration provided to a [`VideoSink`] when an export enters rendering.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Target video bitrate in bits per second.
    pub bitrate_bps: u64,
    /// Narration track muxed alongside the frames.
    pub audio: Option<WaveformBuffer>,
}

impl SinkConfig {
    /// Output canvas described by this config.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Lifecycle: `begin` once, `push_frame` in strictly increasing [`FrameIndex`] order, then exactly
/// one of `finish` (produce the encoded blob) or `abort` (discard everything, release resources).
/// `abort` must be safe to call at any point, including after a failed `begin` or `finish`.
pub trait VideoSink: Send {
    /// Start the encoder.
    fn begin(&mut self, cfg: SinkConfig) -> StoryreelResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StoryreelResult<()>;
    /// Flush the encoder and return the finished container.
    fn finish(&mut self) -> StoryreelResult<MediaBlob>;
    /// Stop the encoder immediately and discard buffered output.
    fn abort(&mut self);
}

/// In-memory sink for tests and debugging.
///
/// Records every frame's digest and, unless created with [`InMemorySink::digests_only`], the
/// frames themselves. The finished blob is the concatenation of retained frame bytes.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    retain_frames: bool,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    digests: Vec<(FrameIndex, u64)>,
    last_idx: Option<FrameIndex>,
    finished: bool,
    aborted: bool,
}

impl InMemorySink {
    /// Create a sink that keeps every frame.
    pub fn new() -> Self {
        Self {
            retain_frames: true,
            ..Self::default()
        }
    }

    /// Create a sink that keeps only per-frame digests (for large canvases).
    pub fn digests_only() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Retained frames in timeline order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Digests of every pushed frame in timeline order.
    pub fn digests(&self) -> &[(FrameIndex, u64)] {
        &self.digests
    }

    /// Number of frames pushed.
    pub fn frame_count(&self) -> usize {
        self.digests.len()
    }

    /// Return `true` once `finish` succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Return `true` once `abort` was called.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl VideoSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> StoryreelResult<()> {
        cfg.canvas().validate_for_encode()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.digests.clear();
        self.last_idx = None;
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StoryreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StoryreelError::encoder_runtime("in-memory sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(StoryreelError::encoder_runtime(
                "in-memory sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(StoryreelError::encoder_runtime(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);
        self.digests.push((idx, frame.digest()));
        if self.retain_frames {
            self.frames.push((idx, frame.clone()));
        }
        Ok(())
    }

    fn finish(&mut self) -> StoryreelResult<MediaBlob> {
        if self.cfg.is_none() {
            return Err(StoryreelError::encoder_runtime("in-memory sink not started"));
        }
        let mut bytes = Vec::new();
        for (_, f) in &self.frames {
            bytes.extend_from_slice(&f.data);
        }
        self.finished = true;
        Ok(MediaBlob::new(MIME_RAW_RGBA, bytes))
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use crate::assets::loader::{FrameSlot, load_frame_slots};
use crate::encode::blob::MediaBlob;
use crate::encode::ffmpeg::{FfmpegMp4Sink, FfmpegSinkOpts};
use crate::encode::sink::{SinkConfig, VideoSink};
use crate::eval::timeline::Timeline;
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::render::compositor::{Compositor, CompositorStyle, FrameView, PreparedCaption};
use crate::render::fingerprint::{FrameFingerprint, fingerprint_frame};
use crate::render::frame::FrameRGBA;
use crate::scene::config::PipelineConfig;
use crate::scene::model::ExportRequest;

/// Lifecycle of an [`ExportJob`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Created, not started.
    Idle,
    /// Validating input, loading fonts and visuals.
    Preparing,
    /// Producing frames into the sink.
    Rendering,
    /// Waiting for the encoder to flush.
    Finalizing,
    /// Finished with a blob.
    Completed,
    /// Finished with an error.
    Failed,
    /// Stopped by a [`CancelToken`].
    Cancelled,
}

impl JobState {
    /// Return `true` for `Completed`, `Failed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Cooperative cancellation flag shared between a job and its controllers.
///
/// Clones observe the same flag; cancelling from any thread stops the job at its next check.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`CancelToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal result of an export that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The encoded video.
    Completed(MediaBlob),
    /// The job was cancelled; nothing was produced.
    Cancelled,
}

impl ExportOutcome {
    /// The finished blob, if any.
    pub fn into_blob(self) -> Option<MediaBlob> {
        match self {
            Self::Completed(blob) => Some(blob),
            Self::Cancelled => None,
        }
    }

    /// Return `true` for [`ExportOutcome::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Export statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Output frames the narration requires.
    pub frames_total: u64,
    /// Frames drawn by the compositor.
    pub frames_rendered: u64,
    /// Frames that reused the previous frame's pixels.
    pub frames_elided: u64,
    /// Story frames drawn as placeholder tiles.
    pub placeholder_slots: usize,
}

/// One video export: a request, its configuration, and the state machine that runs it.
///
/// A job runs at most once. It owns its compositor surface for the duration of [`ExportJob::run`];
/// concurrent exports need independent jobs and sinks.
pub struct ExportJob {
    request: ExportRequest,
    config: PipelineConfig,
    state: JobState,
    progress: u8,
    cancel: CancelToken,
    stats: ExportStats,
}

impl std::fmt::Debug for ExportJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportJob")
            .field("frames", &self.request.frames.len())
            .field("tier", &self.request.render.tier)
            .field("state", &self.state)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl ExportJob {
    /// Create an idle job.
    pub fn new(request: ExportRequest, config: PipelineConfig) -> Self {
        Self {
            request,
            config,
            state: JobState::Idle,
            progress: 0,
            cancel: CancelToken::new(),
            stats: ExportStats::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Last reported progress in `[0, 100]`.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Statistics of the last run.
    pub fn stats(&self) -> ExportStats {
        self.stats
    }

    /// A token that cancels this job.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The request this job exports.
    pub fn request(&self) -> &ExportRequest {
        &self.request
    }

    /// Run the export into the system ffmpeg as H.264/AAC MP4.
    pub fn run_mp4(&mut self, on_progress: impl FnMut(u8)) -> StoryreelResult<ExportOutcome> {
        let mut sink = FfmpegMp4Sink::new(FfmpegSinkOpts::from(&self.config.encoder));
        self.run(&mut sink, on_progress)
    }

    /// Run the export into `sink`.
    ///
    /// `on_progress` is called once per rendered frame with a non-decreasing percentage and a final
    /// `100` on completion. Cancellation resolves as `Ok(ExportOutcome::Cancelled)` after the sink
    /// was aborted. Any error aborts the sink and leaves the job in [`JobState::Failed`].
    #[tracing::instrument(
        skip_all,
        fields(
            frames = self.request.frames.len(),
            tier = %self.request.render.tier,
            language = %self.request.language,
        )
    )]
    pub fn run(
        &mut self,
        sink: &mut dyn VideoSink,
        mut on_progress: impl FnMut(u8),
    ) -> StoryreelResult<ExportOutcome> {
        if self.state != JobState::Idle {
            return Err(StoryreelError::config(format!(
                "export job already ran (state {:?})",
                self.state
            )));
        }
        if self.cancel.is_cancelled() {
            return Ok(self.cancelled(sink));
        }

        self.transition(JobState::Preparing);
        let prepared = match prepare(&self.request, &self.config) {
            Ok(p) => p,
            Err(e) => return Err(self.failed(sink, e)),
        };
        self.stats = ExportStats {
            frames_total: prepared.total_frames,
            placeholder_slots: prepared.slots.iter().filter(|s| s.is_placeholder()).count(),
            ..ExportStats::default()
        };
        if self.cancel.is_cancelled() {
            return Ok(self.cancelled(sink));
        }

        self.transition(JobState::Rendering);
        match self.stream(prepared, sink, &mut on_progress) {
            Ok(Some(blob)) => {
                if self.cancel.is_cancelled() {
                    return Ok(self.cancelled(sink));
                }
                self.progress = 100;
                on_progress(100);
                self.transition(JobState::Completed);
                tracing::info!(
                    bytes = blob.len(),
                    rendered = self.stats.frames_rendered,
                    elided = self.stats.frames_elided,
                    "export completed"
                );
                Ok(ExportOutcome::Completed(blob))
            }
            Ok(None) => Ok(self.cancelled(sink)),
            Err(e) => Err(self.failed(sink, e)),
        }
    }

    /// Render frames on this thread and encode them on a scoped encoder thread.
    ///
    /// Returns `Ok(None)` when the job was cancelled before the sink finished.
    fn stream(
        &mut self,
        prepared: Prepared,
        sink: &mut dyn VideoSink,
        on_progress: &mut impl FnMut(u8),
    ) -> StoryreelResult<Option<MediaBlob>> {
        let Prepared {
            mut compositor,
            slots,
            captions,
            timeline,
            total_frames,
        } = prepared;

        let render = &self.request.render;
        let fps = render.fps;
        let cfg = SinkConfig {
            width: render.width,
            height: render.height,
            fps,
            bitrate_bps: render.bitrate_bps,
            audio: Some(self.request.waveform.clone()),
        };
        let duration = timeline.total_secs();
        let cap = self.config.encoder.channel_capacity.max(1);
        let elide = self.config.encoder.static_frame_elision;

        std::thread::scope(|scope| -> StoryreelResult<Option<MediaBlob>> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);
            let sink_ref: &mut dyn VideoSink = &mut *sink;

            let enc = scope.spawn(move || -> StoryreelResult<Option<MediaBlob>> {
                sink_ref.begin(cfg)?;
                let mut pushed = 0u64;
                for msg in rx.iter() {
                    sink_ref.push_frame(msg.idx, &msg.frame)?;
                    pushed += 1;
                }
                if pushed < total_frames {
                    return Ok(None);
                }
                sink_ref.finish().map(Some)
            });

            let mut last: Option<(FrameFingerprint, Arc<FrameRGBA>)> = None;
            let produce_res = (|| -> StoryreelResult<bool> {
                for k in 0..total_frames {
                    if self.cancel.is_cancelled() {
                        tracing::debug!(frame = k, "cancellation observed while rendering");
                        return Ok(false);
                    }
                    let t = fps.frames_to_secs(k);
                    let pos = timeline.locate(t);
                    let slot = &slots[pos.frame_index];
                    let caption = &captions[pos.frame_index];
                    let fp = fingerprint_frame(
                        match slot {
                            FrameSlot::Loaded(_) => Some(slot.content_key()),
                            FrameSlot::Placeholder => None,
                        },
                        compositor.zoom_for(pos.local_progress),
                        caption.key,
                    );

                    let reuse = match &last {
                        Some((prev, frame)) if elide && *prev == fp => Some(frame.clone()),
                        _ => None,
                    };
                    let frame = match reuse {
                        Some(frame) => {
                            self.stats.frames_elided += 1;
                            frame
                        }
                        None => {
                            let frame = Arc::new(compositor.render(FrameView {
                                slot,
                                local_progress: pos.local_progress,
                                caption,
                            })?);
                            self.stats.frames_rendered += 1;
                            last = Some((fp, frame.clone()));
                            frame
                        }
                    };

                    tx.send(FrameMsg {
                        idx: FrameIndex(k),
                        frame,
                    })
                    .map_err(|_| {
                        StoryreelError::encoder_runtime("encoder thread is not accepting frames")
                    })?;

                    let pct = ((t / duration) * 100.0).floor().clamp(0.0, 100.0) as u8;
                    self.progress = self.progress.max(pct);
                    on_progress(self.progress);
                }
                Ok(true)
            })();

            let finished_rendering = matches!(produce_res, Ok(true));
            if finished_rendering {
                self.transition(JobState::Finalizing);
            }
            drop(tx);
            let enc_res = enc
                .join()
                .map_err(|_| StoryreelError::encoder_runtime("encoder thread panicked"))?;

            // The producer only sees a closed channel; the encoder holds the real cause.
            let blob = enc_res?;
            produce_res?;
            Ok(if finished_rendering { blob } else { None })
        })
    }

    fn transition(&mut self, to: JobState) {
        tracing::info!(from = ?self.state, to = ?to, progress = self.progress, "export state");
        self.state = to;
    }

    fn cancelled(&mut self, sink: &mut dyn VideoSink) -> ExportOutcome {
        sink.abort();
        self.transition(JobState::Cancelled);
        ExportOutcome::Cancelled
    }

    fn failed(&mut self, sink: &mut dyn VideoSink, err: StoryreelError) -> StoryreelError {
        sink.abort();
        tracing::error!(kind = ?err.kind(), error = %err, "export failed");
        self.transition(JobState::Failed);
        err
    }
}

/// Render the frame an export would show at `t_secs` without encoding anything.
///
/// `t_secs` is clamped into the narration's duration.
pub fn render_preview(
    request: &ExportRequest,
    config: &PipelineConfig,
    t_secs: f64,
) -> StoryreelResult<FrameRGBA> {
    let mut prepared = prepare(request, config)?;
    let last_frame = prepared.total_frames.saturating_sub(1);
    let fps = request.render.fps;
    let t = if t_secs.is_nan() {
        0.0
    } else {
        t_secs.clamp(0.0, fps.frames_to_secs(last_frame))
    };
    let pos = prepared.timeline.locate(t);
    prepared.compositor.render(FrameView {
        slot: &prepared.slots[pos.frame_index],
        local_progress: pos.local_progress,
        caption: &prepared.captions[pos.frame_index],
    })
}

#[derive(Debug)]
struct FrameMsg {
    idx: FrameIndex,
    frame: Arc<FrameRGBA>,
}

/// Everything Rendering needs, resolved once.
struct Prepared {
    compositor: Compositor,
    slots: Vec<FrameSlot>,
    captions: Vec<PreparedCaption>,
    timeline: Timeline,
    total_frames: u64,
}

fn prepare(request: &ExportRequest, config: &PipelineConfig) -> StoryreelResult<Prepared> {
    config.validate()?;
    request.validate()?;

    let duration = request.waveform.duration_secs();
    let timeline = Timeline::new(request.frames.len(), duration)?;
    let total_frames = request.render.fps.secs_to_frames_ceil(duration);
    if total_frames == 0 {
        return Err(StoryreelError::invalid_audio(
            "narration is shorter than one output frame",
        ));
    }

    let root = config.assets_root.as_path();
    let caption_font = config.fonts.load_for_language(&request.language, root)?;
    let label_font = config.fonts.load_default(root)?;
    let slots = load_frame_slots(&request.frames, root);

    let canvas = Canvas {
        width: request.render.width,
        height: request.render.height,
    };
    let mut compositor = Compositor::new(
        canvas,
        CompositorStyle::from_config(config),
        caption_font,
        label_font,
    )?;
    let captions = request
        .frames
        .iter()
        .map(|f| compositor.prepare_caption(&f.caption))
        .collect::<StoryreelResult<Vec<_>>>()?;

    tracing::debug!(
        width = canvas.width,
        height = canvas.height,
        duration_secs = duration,
        total_frames,
        slice_secs = timeline.slice_secs(),
        "export prepared"
    );
    Ok(Prepared {
        compositor,
        slots,
        captions,
        timeline,
        total_frames,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/session/export_job.rs"]
mod tests;

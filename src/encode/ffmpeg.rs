use crate::audio::waveform::WaveformBuffer;
use crate::encode::blob::{MIME_MP4, MediaBlob};
use crate::encode::sink::{SinkConfig, VideoSink};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::FrameRGBA;
use crate::scene::config::EncoderOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Options for [`FfmpegMp4Sink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// AAC bitrate for the narration track.
    pub audio_bitrate_kbps: u32,
    /// x264 preset.
    pub preset: String,
    /// Upper bound on how long `finish` waits for ffmpeg to flush and exit.
    pub finalize_timeout: Duration,
    /// Directory for per-export scratch files. `None` uses the system temp dir.
    pub scratch_root: Option<PathBuf>,
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            bg_rgba: [0, 0, 0, 255],
            audio_bitrate_kbps: 128,
            preset: "medium".to_owned(),
            finalize_timeout: Duration::from_secs(30),
            scratch_root: None,
        }
    }
}

impl From<&EncoderOptions> for FfmpegSinkOpts {
    fn from(enc: &EncoderOptions) -> Self {
        Self {
            audio_bitrate_kbps: enc.audio_bitrate_kbps,
            preset: enc.preset.clone(),
            finalize_timeout: Duration::from_millis(enc.finalize_timeout_ms),
            ..Self::default()
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to stdin.
///
/// Video is H.264 (`yuv420p`) at the configured bitrate; the narration track, when present, is
/// encoded as AAC. ffmpeg writes into a private scratch directory and the finished MP4 is read back
/// into memory by [`VideoSink::finish`].
pub struct FfmpegMp4Sink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Option<ScratchDir>,

    flatten_buf: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegMp4Sink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: None,
            flatten_buf: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn out_path(&self) -> StoryreelResult<PathBuf> {
        self.scratch
            .as_ref()
            .map(|s| s.path.join("out.mp4"))
            .ok_or_else(|| StoryreelError::encoder_runtime("ffmpeg sink not started"))
    }

    fn join_stderr(&mut self) -> String {
        match self.stderr_drain.take() {
            Some(handle) => match handle.join() {
                Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).trim().to_owned(),
                Ok(Err(e)) => format!("<stderr read failed: {e}>"),
                Err(_) => "<stderr drain thread panicked>".to_owned(),
            },
            None => String::new(),
        }
    }

    /// Tear the process down after a stream error and fold its stderr into the error.
    fn fail(&mut self, context: String) -> StoryreelError {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let stderr = self.join_stderr();
        self.scratch = None;
        self.cfg = None;
        classify_ffmpeg_failure(&format!("{context}: {stderr}"))
    }
}

impl VideoSink for FfmpegMp4Sink {
    fn begin(&mut self, cfg: SinkConfig) -> StoryreelResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(StoryreelError::config("fps must be non-zero"));
        }
        cfg.canvas().validate_for_encode()?;
        if cfg.bitrate_bps == 0 {
            return Err(StoryreelError::config("video bitrate must be non-zero"));
        }

        if !is_ffmpeg_on_path() {
            return Err(StoryreelError::encoder_setup(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }
        for encoder in ["libx264", "aac"] {
            if !ffmpeg_has_encoder(encoder) {
                return Err(StoryreelError::encoder_setup(format!(
                    "ffmpeg build does not provide the '{encoder}' encoder"
                )));
            }
        }

        let scratch = ScratchDir::create(self.opts.scratch_root.as_deref(), "export")?;
        let out_path = scratch.path.join("out.mp4");

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args(["-y", "-hide_banner", "-loglevel", "error"]);

        // Input: raw RGBA8 frames. ffmpeg does not understand premul, so frames are flattened
        // before writing to stdin (push_frame).
        cmd.args([
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        if let Some(audio) = cfg.audio.as_ref() {
            let audio_path = scratch.path.join("narration.f32le");
            write_waveform_f32le(audio, &audio_path)?;
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate().to_string(),
                "-ac",
                &audio.channels().to_string(),
                "-i",
            ])
            .arg(&audio_path);
        }

        let bitrate = cfg.bitrate_bps.to_string();
        cmd.args([
            "-c:v",
            "libx264",
            "-preset",
            &self.opts.preset,
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            &bitrate,
            "-maxrate",
            &bitrate,
            "-bufsize",
            &(cfg.bitrate_bps.saturating_mul(2)).to_string(),
        ]);
        if cfg.audio.is_some() {
            cmd.args([
                "-c:a",
                "aac",
                "-b:a",
                &format!("{}k", self.opts.audio_bitrate_kbps),
                "-shortest",
            ]);
        } else {
            cmd.arg("-an");
        }
        cmd.args(["-movflags", "+faststart"]).arg(&out_path);

        let mut child = cmd.spawn().map_err(|e| {
            StoryreelError::encoder_setup(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            StoryreelError::encoder_setup("failed to open ffmpeg stdin (unexpected)")
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            StoryreelError::encoder_setup("failed to open ffmpeg stderr (unexpected)")
        })?;

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            bitrate = cfg.bitrate_bps,
            audio = cfg.audio.is_some(),
            "ffmpeg mp4 encoder started"
        );

        self.flatten_buf = vec![0u8; cfg.canvas().rgba_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(spawn_stderr_drain(stderr));
        self.scratch = Some(scratch);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StoryreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StoryreelError::encoder_runtime("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(StoryreelError::encoder_runtime(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(StoryreelError::encoder_runtime(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);

        flatten_premul_over_bg_to_opaque_rgba8(
            &mut self.flatten_buf,
            &frame.data,
            self.opts.bg_rgba,
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(StoryreelError::encoder_runtime(
                "ffmpeg sink is already finalized",
            ));
        };
        if let Err(e) = stdin.write_all(&self.flatten_buf) {
            return Err(self.fail(format!("failed to write frame {} to ffmpeg: {e}", idx.0)));
        }
        Ok(())
    }

    fn finish(&mut self) -> StoryreelResult<MediaBlob> {
        // Closing stdin signals end-of-stream; ffmpeg then flushes and writes the moov atom.
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| StoryreelError::encoder_runtime("ffmpeg sink not started"))?;

        let deadline = Instant::now() + self.opts.finalize_timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let stderr = self.join_stderr();
                    self.scratch = None;
                    self.cfg = None;
                    return Err(StoryreelError::encoder_runtime(format!(
                        "ffmpeg did not finish within {:?}: {stderr}",
                        self.opts.finalize_timeout
                    )));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(10)),
                Err(e) => {
                    self.child = Some(child);
                    return Err(self.fail(format!("failed to wait for ffmpeg: {e}")));
                }
            }
        };

        let stderr = self.join_stderr();
        if !status.success() {
            self.scratch = None;
            self.cfg = None;
            return Err(classify_ffmpeg_failure(&format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }

        let out_path = self.out_path()?;
        let bytes = std::fs::read(&out_path).map_err(|e| {
            StoryreelError::encoder_runtime(format!(
                "failed to read encoded output '{}': {e}",
                out_path.display()
            ))
        })?;
        self.scratch = None;
        self.cfg = None;
        Ok(MediaBlob::new(MIME_MP4, bytes))
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = self.join_stderr();
        self.scratch = None;
        self.cfg = None;
        self.last_idx = None;
    }
}

impl Drop for FfmpegMp4Sink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

/// Scratch directory removed on drop.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create(root: Option<&Path>, tag: &str) -> StoryreelResult<Self> {
        let root = root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        let path = root.join(format!(
            "storyreel_{tag}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        std::fs::create_dir_all(&path).map_err(|e| {
            StoryreelError::encoder_setup(format!(
                "failed to create scratch directory '{}': {e}",
                path.display()
            ))
        })?;
        Ok(Self { path })
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate (rational num/den).
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn spawn_stderr_drain(
    mut stderr: std::process::ChildStderr,
) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut stderr_bytes = Vec::new();
        stderr.read_to_end(&mut stderr_bytes)?;
        Ok(stderr_bytes)
    })
}

/// Write a waveform as raw little-endian `f32` PCM.
fn write_waveform_f32le(w: &WaveformBuffer, out_path: &Path) -> StoryreelResult<()> {
    let samples = w.to_f32();
    let mut bytes = Vec::<u8>::with_capacity(samples.len() * 4);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        StoryreelError::encoder_setup(format!(
            "failed to write narration track '{}': {e}",
            out_path.display()
        ))
    })
}

/// Map ffmpeg's stderr to setup vs runtime failures.
fn classify_ffmpeg_failure(msg: &str) -> StoryreelError {
    let setup_markers = [
        "Unknown encoder",
        "Encoder not found",
        "Unrecognized option",
        "Invalid argument",
        "Error while opening encoder",
    ];
    if setup_markers.iter().any(|m| msg.contains(m)) {
        StoryreelError::encoder_setup(msg.trim().to_owned())
    } else {
        StoryreelError::encoder_runtime(msg.trim().to_owned())
    }
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> StoryreelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(StoryreelError::encoder_runtime(
            "flatten expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Run ffmpeg with `input` on stdin and return the bytes it writes to `<scratch>/<out_name>`.
///
/// Output goes to a real file because several muxers only write their trailing headers (the mp3
/// LAME info frame among them) when the output is seekable.
pub(crate) fn transcode_stdin_to_file(
    input_args: &[&str],
    output_args: &[&str],
    out_name: &str,
    input: &[u8],
) -> StoryreelResult<Vec<u8>> {
    let scratch = ScratchDir::create(None, "transcode")?;
    let out_path = scratch.path.join(out_name);

    let mut child = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error"])
        .args(input_args)
        .args(["-i", "pipe:0"])
        .args(output_args)
        .arg(&out_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| StoryreelError::encoder_setup(format!("failed to spawn ffmpeg: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| StoryreelError::encoder_setup("failed to open ffmpeg stdin (unexpected)"))?;
    let stderr = child.stderr.take().ok_or_else(|| {
        StoryreelError::encoder_setup("failed to open ffmpeg stderr (unexpected)")
    })?;
    let stderr_drain = spawn_stderr_drain(stderr);

    let write_res = stdin.write_all(input);
    drop(stdin);

    let status = child
        .wait()
        .map_err(|e| StoryreelError::encoder_runtime(format!("failed to wait for ffmpeg: {e}")))?;
    let stderr = match stderr_drain.join() {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).trim().to_owned(),
        _ => String::new(),
    };

    if !status.success() {
        return Err(classify_ffmpeg_failure(&format!(
            "ffmpeg exited with status {status}: {stderr}"
        )));
    }
    write_res.map_err(|e| {
        StoryreelError::encoder_runtime(format!("failed to stream input to ffmpeg: {e}"))
    })?;
    std::fs::read(&out_path).map_err(|e| {
        StoryreelError::encoder_runtime(format!(
            "failed to read encoded output '{}': {e}",
            out_path.display()
        ))
    })
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when the installed ffmpeg lists `name` among its encoders.
pub fn ffmpeg_has_encoder(name: &str) -> bool {
    let Ok(out) = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
    else {
        return false;
    };
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;

//! storyreel is the media synthesis core of a narrated short-video studio.
//!
//! It turns a mono 16-bit narration waveform and an ordered list of still images with captions
//! into distributable media:
//!
//! - WAV and MP3 narration blobs ([`encode_wav`], [`encode_mp3`])
//! - a vertical H.264/AAC MP4 with Ken Burns motion, a bottom vignette and two-tone captions,
//!   rendered offline at deterministic timestamps by an [`ExportJob`] into a [`VideoSink`]
//!
//! Frame placement is a pure function of the narration length ([`Timeline`]); every story frame
//! owns an equal slice. Visuals that fail to load are drawn as a placeholder tile and never fail
//! the export.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod audio;
mod encode;
mod eval;
mod foundation;
mod layout;
mod render;
mod scene;
mod session;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Rgba8Premul};
pub use crate::foundation::error::{ErrorKind, StoryreelError, StoryreelResult};

pub use crate::audio::mp3::{
    DEFAULT_MP3_BITRATE_KBPS, Mp3Opts, encode_mp3, mp3_encoder_available, mp3_frame_samples,
};
pub use crate::audio::wav::{WAV_HEADER_LEN, decode_wav, encode_wav};
pub use crate::audio::waveform::{NARRATION_SAMPLE_RATE, WaveformBuffer};

pub use crate::encode::blob::{MIME_MP3, MIME_MP4, MIME_RAW_RGBA, MIME_WAV, MediaBlob};
pub use crate::encode::ffmpeg::{
    FfmpegMp4Sink, FfmpegSinkOpts, ffmpeg_has_encoder, is_ffmpeg_on_path,
};
pub use crate::encode::sink::{InMemorySink, SinkConfig, VideoSink};

pub use crate::eval::timeline::{Timeline, TimelinePosition};

pub use crate::layout::caption::{
    CaptionLine, CaptionLines, TextMeasure, layout_caption, line_centers,
};
pub use crate::layout::fonts::FontTable;

pub use crate::assets::color::RgbaColor;
pub use crate::assets::decode::{PreparedImage, decode_data_url, decode_image};
pub use crate::assets::loader::{FrameSlot, SlotImage, load_frame_slots, load_visual};
pub use crate::assets::text::CaptionFont;

pub use crate::render::frame::FrameRGBA;

pub use crate::scene::config::{
    CaptionStyle, EncoderOptions, MotionStyle, PipelineConfig, PlaceholderStyle, QualityTable,
    ShadowStyle, TierSpec, VignetteStyle,
};
pub use crate::scene::model::{
    ExportRequest, QualityTier, RenderConfig, StoryFrame, VisualSource,
};

pub use crate::session::export_job::{
    CancelToken, ExportJob, ExportOutcome, ExportStats, JobState, render_preview,
};

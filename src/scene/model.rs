use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::decode::PreparedImage;
use crate::audio::waveform::WaveformBuffer;
use crate::foundation::core::Fps;
use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::scene::config::QualityTable;

/// Where a frame's still image comes from.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualSource {
    /// No image was generated for this frame.
    #[default]
    Missing,
    /// Encoded raster bytes (PNG, JPEG, ...).
    #[serde(skip)]
    Encoded(Arc<Vec<u8>>),
    /// A base64 `data:` URL.
    DataUrl {
        /// The full `data:` URL.
        url: String,
    },
    /// A file path, relative to the assets root unless absolute.
    File {
        /// Path to the image file.
        path: PathBuf,
    },
    /// An already decoded image.
    #[serde(skip)]
    Decoded(Arc<PreparedImage>),
}

impl VisualSource {
    /// Data URL source.
    pub fn data_url(url: impl Into<String>) -> Self {
        Self::DataUrl { url: url.into() }
    }

    /// File source.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Encoded bytes source.
    pub fn encoded(bytes: Vec<u8>) -> Self {
        Self::Encoded(Arc::new(bytes))
    }
}

/// One scene of the story: a still image and its caption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryFrame {
    /// Unique id; frames are ordered by their position in the request.
    pub id: u32,
    /// Image shown for this frame.
    #[serde(default)]
    pub visual: VisualSource,
    /// Caption burned into the frame.
    #[serde(default)]
    pub caption: String,
    /// Advisory timing label from the script writer. Never used for placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_hint: Option<String>,
}

impl StoryFrame {
    /// Frame with the given visual and caption.
    pub fn new(id: u32, visual: VisualSource, caption: impl Into<String>) -> Self {
        Self {
            id,
            visual,
            caption: caption.into(),
            timing_hint: None,
        }
    }
}

/// Output quality preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityTier {
    /// 720x1280.
    #[serde(rename = "720p")]
    P720,
    /// 1080x1920.
    #[default]
    #[serde(rename = "1080p")]
    P1080,
    /// 1440x2560.
    #[serde(rename = "1440p")]
    P1440,
}

impl QualityTier {
    /// Every tier, lowest first.
    pub const ALL: [Self; 3] = [Self::P720, Self::P1080, Self::P1440];

    /// Label used in file names and config (`"720p"`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Self::P720 => "720p",
            Self::P1080 => "1080p",
            Self::P1440 => "1440p",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for QualityTier {
    type Err = StoryreelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StoryreelError::config(format!("unknown quality tier '{s}'")))
    }
}

/// Immutable per-export output settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Tier the dimensions came from.
    pub tier: QualityTier,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Target video bitrate.
    pub bitrate_bps: u64,
    /// Output frame rate.
    pub fps: Fps,
}

impl RenderConfig {
    /// Resolve `tier` against `table`.
    pub fn for_tier(tier: QualityTier, table: &QualityTable, fps: Fps) -> Self {
        let spec = table.get(tier);
        Self {
            tier,
            width: spec.width,
            height: spec.height,
            bitrate_bps: spec.bitrate_bps,
            fps,
        }
    }

    /// Resolution scale relative to the 720 px reference width.
    pub fn scale(&self) -> f64 {
        f64::from(self.width) / 720.0
    }

    /// Suggested download name for the finished video, `storyreel-video-{tier}-{unix_millis}`.
    pub fn output_stem(&self, unix_millis: u128) -> String {
        format!("storyreel-video-{}-{unix_millis}", self.tier)
    }
}

/// Everything needed to export one video.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    /// Frames in story order.
    pub frames: Vec<StoryFrame>,
    /// Narration track; its duration defines the video length.
    pub waveform: WaveformBuffer,
    /// Output settings.
    pub render: RenderConfig,
    /// Language tag used to pick the caption font.
    pub language: String,
}

impl ExportRequest {
    /// Check the request before any work starts.
    pub fn validate(&self) -> StoryreelResult<()> {
        if self.frames.is_empty() {
            return Err(StoryreelError::empty_timeline(
                "export request has no frames",
            ));
        }
        let mut seen = std::collections::HashSet::with_capacity(self.frames.len());
        for f in &self.frames {
            if !seen.insert(f.id) {
                return Err(StoryreelError::config(format!(
                    "duplicate frame id {}",
                    f.id
                )));
            }
        }
        if self.render.fps.num == 0 || self.render.fps.den == 0 {
            return Err(StoryreelError::config("fps must be non-zero"));
        }
        if self.render.bitrate_bps == 0 {
            return Err(StoryreelError::config("video bitrate must be non-zero"));
        }
        crate::foundation::core::Canvas {
            width: self.render.width,
            height: self.render.height,
        }
        .validate_for_encode()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;

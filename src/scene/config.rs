use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::color::RgbaColor;
use crate::audio::mp3::DEFAULT_MP3_BITRATE_KBPS;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::layout::fonts::FontTable;
use crate::scene::model::QualityTier;

/// Output dimensions and bitrate of one quality tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Video bitrate in bits per second.
    pub bitrate_bps: u64,
}

/// Tier to output dimensions mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityTable {
    /// 720p entry.
    #[serde(rename = "720p")]
    pub p720: TierSpec,
    /// 1080p entry.
    #[serde(rename = "1080p")]
    pub p1080: TierSpec,
    /// 1440p entry.
    #[serde(rename = "1440p")]
    pub p1440: TierSpec,
}

impl Default for QualityTable {
    fn default() -> Self {
        Self {
            p720: TierSpec {
                width: 720,
                height: 1280,
                bitrate_bps: 6_000_000,
            },
            p1080: TierSpec {
                width: 1080,
                height: 1920,
                bitrate_bps: 12_000_000,
            },
            p1440: TierSpec {
                width: 1440,
                height: 2560,
                bitrate_bps: 20_000_000,
            },
        }
    }
}

impl QualityTable {
    /// Entry for `tier`.
    pub fn get(&self, tier: QualityTier) -> TierSpec {
        match tier {
            QualityTier::P720 => self.p720,
            QualityTier::P1080 => self.p1080,
            QualityTier::P1440 => self.p1440,
        }
    }

    fn validate(&self) -> StoryreelResult<()> {
        for tier in QualityTier::ALL {
            let spec = self.get(tier);
            Canvas {
                width: spec.width,
                height: spec.height,
            }
            .validate_for_encode()
            .map_err(|e| StoryreelError::config(format!("quality tier {tier}: {e}")))?;
            if spec.bitrate_bps == 0 {
                return Err(StoryreelError::config(format!(
                    "quality tier {tier}: bitrate must be > 0"
                )));
            }
        }
        Ok(())
    }
}

/// Caption appearance. Sizes are in pixels at the 720 px reference width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Font size.
    pub font_size: f64,
    /// Distance between consecutive line centers.
    pub line_height: f64,
    /// Maximum line width as a fraction of the canvas width.
    pub max_width_frac: f64,
    /// Vertical center of the caption block as a fraction of the canvas height.
    pub anchor_y_frac: f64,
    /// Outline width, drawn beneath the fill.
    pub stroke_width: f64,
    /// Outline color.
    pub stroke_color: RgbaColor,
    /// Fill colors cycled per line.
    pub fill_colors: Vec<RgbaColor>,
    /// Hard drop shadow under the outline, if any.
    pub shadow: Option<ShadowStyle>,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size: 48.0,
            line_height: 70.0,
            max_width_frac: 0.85,
            anchor_y_frac: 0.78,
            stroke_width: 8.0,
            stroke_color: RgbaColor::BLACK,
            fill_colors: vec![RgbaColor::rgb(0xFF, 0x00, 0x7A), RgbaColor::WHITE],
            shadow: Some(ShadowStyle::default()),
        }
    }
}

impl CaptionStyle {
    /// Fill color of line `i`.
    pub fn fill_for_line(&self, i: usize) -> RgbaColor {
        if self.fill_colors.is_empty() {
            return RgbaColor::WHITE;
        }
        self.fill_colors[i % self.fill_colors.len()]
    }

    fn validate(&self) -> StoryreelResult<()> {
        positive("caption.font_size", self.font_size)?;
        positive("caption.line_height", self.line_height)?;
        unit_interval("caption.max_width_frac", self.max_width_frac)?;
        unit_interval("caption.anchor_y_frac", self.anchor_y_frac)?;
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(StoryreelError::config(
                "caption.stroke_width must be finite and >= 0",
            ));
        }
        if self.fill_colors.is_empty() {
            return Err(StoryreelError::config(
                "caption.fill_colors must list at least one color",
            ));
        }
        if let Some(shadow) = &self.shadow
            && (!shadow.offset.0.is_finite() || !shadow.offset.1.is_finite())
        {
            return Err(StoryreelError::config("caption.shadow.offset must be finite"));
        }
        Ok(())
    }
}

/// Offset copy of the caption outline drawn before it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowStyle {
    /// Shadow color.
    pub color: RgbaColor,
    /// `(dx, dy)` offset at the reference width.
    pub offset: (f64, f64),
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            color: RgbaColor::rgba(0, 0, 0, 204),
            offset: (2.0, 2.0),
        }
    }
}

/// Tile drawn when a frame's image is unavailable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderStyle {
    /// Tile color.
    pub fill: RgbaColor,
    /// Label color.
    pub label_color: RgbaColor,
    /// Label text, centered on the canvas. Empty disables the label.
    pub label: String,
    /// Label font size at the reference width.
    pub label_font_size: f64,
}

impl Default for PlaceholderStyle {
    fn default() -> Self {
        Self {
            fill: RgbaColor::rgb(0x1e, 0x29, 0x3b),
            label_color: RgbaColor::rgb(0x94, 0xa3, 0xb8),
            label: "[Asset Processing]".to_owned(),
            label_font_size: 24.0,
        }
    }
}

/// Vertical darkening gradient behind the captions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteStyle {
    /// Gradient start as a fraction of the canvas height.
    pub start_frac: f64,
    /// Color at `start_frac`.
    pub start_color: RgbaColor,
    /// Color at the bottom edge.
    pub end_color: RgbaColor,
}

impl Default for VignetteStyle {
    fn default() -> Self {
        Self {
            start_frac: 0.5,
            start_color: RgbaColor::TRANSPARENT,
            end_color: RgbaColor::rgba(0, 0, 0, 242),
        }
    }
}

/// Ken Burns motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionStyle {
    /// Extra zoom reached at the end of a frame slot: `zoom = 1 + progress * zoom_per_slot`.
    pub zoom_per_slot: f64,
}

impl Default for MotionStyle {
    fn default() -> Self {
        Self {
            zoom_per_slot: 0.08,
        }
    }
}

/// Streaming encoder options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderOptions {
    /// Bounded channel capacity between the renderer and the encoder thread.
    pub channel_capacity: usize,
    /// Grace period for the encoder to flush after the last frame.
    pub finalize_timeout_ms: u64,
    /// Reuse the previous frame's pixels when nothing visible changed.
    pub static_frame_elision: bool,
    /// AAC bitrate of the muxed narration.
    pub audio_bitrate_kbps: u32,
    /// x264 preset.
    pub preset: String,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            channel_capacity: 4,
            finalize_timeout_ms: 30_000,
            static_frame_elision: true,
            audio_bitrate_kbps: 128,
            preset: "medium".to_owned(),
        }
    }
}

/// Pipeline-wide configuration.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Output frame rate.
    pub fps: Fps,
    /// Tier dimensions.
    pub quality: QualityTable,
    /// Caption fonts per language.
    pub fonts: FontTable,
    /// Root for relative font and image paths.
    pub assets_root: PathBuf,
    /// Caption appearance.
    pub caption: CaptionStyle,
    /// Placeholder tile appearance.
    pub placeholder: PlaceholderStyle,
    /// Bottom gradient.
    pub vignette: VignetteStyle,
    /// Ken Burns motion.
    pub motion: MotionStyle,
    /// Compressed narration bitrate.
    pub mp3_bitrate_kbps: u32,
    /// Streaming encoder options.
    pub encoder: EncoderOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            quality: QualityTable::default(),
            fonts: FontTable::default(),
            assets_root: PathBuf::from("."),
            caption: CaptionStyle::default(),
            placeholder: PlaceholderStyle::default(),
            vignette: VignetteStyle::default(),
            motion: MotionStyle::default(),
            mp3_bitrate_kbps: DEFAULT_MP3_BITRATE_KBPS,
            encoder: EncoderOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(s: &str) -> StoryreelResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| StoryreelError::serde(format!("parse pipeline config JSON: {e}")))
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> StoryreelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StoryreelError::config(format!("open pipeline config '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            StoryreelError::serde(format!(
                "parse pipeline config '{}': {e}",
                path.display()
            ))
        })
    }

    /// Serialize as pretty JSON.
    pub fn to_json_string(&self) -> StoryreelResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoryreelError::serde(format!("serialize pipeline config: {e}")))
    }

    /// Check value ranges.
    pub fn validate(&self) -> StoryreelResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        self.quality.validate()?;
        self.fonts.validate()?;
        self.caption.validate()?;
        positive("placeholder.label_font_size", self.placeholder.label_font_size)?;
        unit_interval("vignette.start_frac", self.vignette.start_frac)?;
        if !self.motion.zoom_per_slot.is_finite() || self.motion.zoom_per_slot < 0.0 {
            return Err(StoryreelError::config(
                "motion.zoom_per_slot must be finite and >= 0",
            ));
        }
        crate::audio::mp3::Mp3Opts::from(self).validate()?;
        if self.encoder.channel_capacity == 0 {
            return Err(StoryreelError::config(
                "encoder.channel_capacity must be >= 1",
            ));
        }
        if self.encoder.finalize_timeout_ms == 0 {
            return Err(StoryreelError::config(
                "encoder.finalize_timeout_ms must be > 0",
            ));
        }
        if self.encoder.audio_bitrate_kbps == 0 {
            return Err(StoryreelError::config(
                "encoder.audio_bitrate_kbps must be > 0",
            ));
        }
        Ok(())
    }
}

fn positive(name: &str, v: f64) -> StoryreelResult<()> {
    if !v.is_finite() || v <= 0.0 {
        return Err(StoryreelError::config(format!(
            "{name} must be finite and > 0"
        )));
    }
    Ok(())
}

fn unit_interval(name: &str, v: f64) -> StoryreelResult<()> {
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        return Err(StoryreelError::config(format!("{name} must be within [0, 1]")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/config.rs"]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::layout::caption::TextMeasure;

/// A caption font loaded from raw TrueType/OpenType bytes.
#[derive(Clone)]
pub struct CaptionFont {
    label: String,
    bytes: Arc<Vec<u8>>,
    digest: u64,
    cpu: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("label", &self.label)
            .field("bytes", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl CaptionFont {
    /// Parse font bytes. `label` names the font in logs and errors.
    pub fn from_bytes(bytes: Vec<u8>, label: impl Into<String>) -> StoryreelResult<Self> {
        let label = label.into();
        let mut probe = parley::FontContext::default();
        let families = probe
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        if families.is_empty() {
            return Err(StoryreelError::asset_load(format!(
                "'{label}' contains no usable font faces"
            )));
        }

        let digest = xxhash_rust::xxh3::xxh3_64(&bytes);
        let bytes = Arc::new(bytes);
        let cpu = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );
        Ok(Self {
            label,
            bytes,
            digest,
            cpu,
        })
    }

    /// Human-readable source of the font.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Content digest of the font file (xxh3).
    pub fn digest(&self) -> u64 {
        self.digest
    }

    pub(crate) fn cpu_font(&self) -> &vello_cpu::peniko::FontData {
        &self.cpu
    }
}

/// Glyph id with its pen position relative to the line's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlacedGlyph {
    pub(crate) id: u32,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

/// A single shaped line, positioned with its top-left corner at the origin.
#[derive(Clone, Debug)]
pub(crate) struct ShapedLine {
    pub(crate) glyphs: Vec<PlacedGlyph>,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) font_size: f32,
}

/// Stateful helper for shaping caption text with Parley from raw font bytes.
///
/// Each font is registered once per engine; its family name is cached by content digest.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    families: HashMap<u64, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    fn family_for(&mut self, font: &CaptionFont) -> StoryreelResult<String> {
        if let Some(name) = self.families.get(&font.digest) {
            return Ok(name.clone());
        }
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            StoryreelError::asset_load(format!("no font families registered from '{}'", font.label))
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| StoryreelError::asset_load("registered font family has no name"))?
            .to_string();
        self.families.insert(font.digest, family_name.clone());
        Ok(family_name)
    }

    /// Shape `text` on one line without wrapping.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        font: &CaptionFont,
        size_px: f32,
    ) -> StoryreelResult<parley::Layout<()>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(StoryreelError::config("text size_px must be finite and > 0"));
        }
        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Shape `text` and flatten it into absolutely positioned glyphs.
    pub(crate) fn shape_line(
        &mut self,
        text: &str,
        font: &CaptionFont,
        size_px: f32,
    ) -> StoryreelResult<ShapedLine> {
        let layout = self.layout_line(text, font, size_px)?;
        let mut glyphs = Vec::new();
        let mut font_size = size_px;
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                font_size = run.run().font_size();
                glyphs.extend(run.positioned_glyphs().map(|g| PlacedGlyph {
                    id: u32::from(g.id),
                    x: g.x,
                    y: g.y,
                }));
            }
        }
        Ok(ShapedLine {
            glyphs,
            width: layout.width(),
            height: layout.height(),
            font_size,
        })
    }

    /// Advance width of `text` on one line.
    pub(crate) fn measure(
        &mut self,
        text: &str,
        font: &CaptionFont,
        size_px: f32,
    ) -> StoryreelResult<f32> {
        Ok(self.layout_line(text, font, size_px)?.width())
    }
}

/// [`TextMeasure`] backed by real shaping at a fixed font size.
pub(crate) struct ShapingMeasure<'a> {
    pub(crate) engine: &'a mut TextLayoutEngine,
    pub(crate) font: &'a CaptionFont,
    pub(crate) size_px: f32,
}

impl TextMeasure for ShapingMeasure<'_> {
    fn measure(&mut self, text: &str) -> StoryreelResult<f32> {
        self.engine.measure(text, self.font, self.size_px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;

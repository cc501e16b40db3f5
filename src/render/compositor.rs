use crate::assets::color::RgbaColor;
use crate::assets::decode::premul_bytes_to_paint;
use crate::assets::loader::{FrameSlot, SlotImage};
use crate::assets::text::{CaptionFont, ShapedLine, ShapingMeasure, TextLayoutEngine};
use crate::foundation::core::{Affine, Canvas, Rgba8Premul};
use crate::foundation::error::{StoryreelError, StoryreelResult};
use crate::layout::caption::{layout_caption, line_centers};
use crate::render::fingerprint::caption_key;
use crate::render::frame::FrameRGBA;
use crate::scene::config::{
    CaptionStyle, MotionStyle, PipelineConfig, PlaceholderStyle, VignetteStyle,
};

/// Visual style of one export.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CompositorStyle {
    pub(crate) background: RgbaColor,
    pub(crate) caption: CaptionStyle,
    pub(crate) placeholder: PlaceholderStyle,
    pub(crate) vignette: VignetteStyle,
    pub(crate) motion: MotionStyle,
}

impl CompositorStyle {
    pub(crate) fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            background: RgbaColor::BLACK,
            caption: cfg.caption.clone(),
            placeholder: cfg.placeholder.clone(),
            vignette: cfg.vignette,
            motion: cfg.motion,
        }
    }
}

/// A caption wrapped and shaped for the compositor's canvas.
#[derive(Clone, Debug)]
pub(crate) struct PreparedCaption {
    pub(crate) lines: Vec<ShapedLine>,
    pub(crate) key: u64,
}

/// What to draw for one output frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrameView<'a> {
    pub(crate) slot: &'a FrameSlot,
    pub(crate) local_progress: f64,
    pub(crate) caption: &'a PreparedCaption,
}

/// CPU compositor owning one `vello_cpu` surface.
///
/// Layers, bottom to top: background, image (cover fit with Ken Burns zoom) or placeholder tile,
/// bottom vignette, captions (shadow, outline, fill per line).
pub(crate) struct Compositor {
    canvas: Canvas,
    scale: f64,
    style: CompositorStyle,
    caption_font: CaptionFont,
    label_font: CaptionFont,
    text_engine: TextLayoutEngine,

    ctx: vello_cpu::RenderContext,
    target: vello_cpu::Pixmap,

    vignette: Option<vello_cpu::Image>,
    placeholder_label: Option<ShapedLine>,
}

impl Compositor {
    pub(crate) fn new(
        canvas: Canvas,
        style: CompositorStyle,
        caption_font: CaptionFont,
        label_font: CaptionFont,
    ) -> StoryreelResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(StoryreelError::config("canvas width/height must be non-zero"));
        }
        let w: u16 = canvas
            .width
            .try_into()
            .map_err(|_| StoryreelError::config("canvas width exceeds u16"))?;
        let h: u16 = canvas
            .height
            .try_into()
            .map_err(|_| StoryreelError::config("canvas height exceeds u16"))?;

        let scale = f64::from(canvas.width) / 720.0;
        let mut text_engine = TextLayoutEngine::new();
        let placeholder_label = if style.placeholder.label.trim().is_empty() {
            None
        } else {
            Some(text_engine.shape_line(
                &style.placeholder.label,
                &label_font,
                (style.placeholder.label_font_size * scale) as f32,
            )?)
        };

        Ok(Self {
            canvas,
            scale,
            style,
            caption_font,
            label_font,
            text_engine,
            ctx: vello_cpu::RenderContext::new(w, h),
            target: vello_cpu::Pixmap::new(w, h),
            vignette: None,
            placeholder_label,
        })
    }

    /// Ken Burns zoom for a slot's local progress.
    pub(crate) fn zoom_for(&self, local_progress: f64) -> f64 {
        ken_burns_zoom(local_progress, self.style.motion.zoom_per_slot)
    }

    /// Wrap and shape a caption at this canvas's scale.
    pub(crate) fn prepare_caption(&mut self, text: &str) -> StoryreelResult<PreparedCaption> {
        let caption = &self.style.caption;
        let size_px = (caption.font_size * self.scale) as f32;
        let max_width = (caption.max_width_frac * f64::from(self.canvas.width)) as f32;

        let mut measure = ShapingMeasure {
            engine: &mut self.text_engine,
            font: &self.caption_font,
            size_px,
        };
        let wrapped = layout_caption(text, max_width, &mut measure)?;

        let mut lines = Vec::with_capacity(wrapped.len());
        for line in &wrapped {
            lines.push(
                self.text_engine
                    .shape_line(&line.text, &self.caption_font, size_px)?,
            );
        }
        Ok(PreparedCaption {
            lines,
            key: caption_key(text, self.caption_font.digest()),
        })
    }

    /// Render one frame.
    pub(crate) fn render(&mut self, view: FrameView<'_>) -> StoryreelResult<FrameRGBA> {
        let (w, h) = (
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        );

        self.ctx.reset();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(self.style.background.to_cpu());
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));

        match view.slot {
            FrameSlot::Loaded(img) => {
                let zoom = self.zoom_for(view.local_progress);
                self.draw_image(img, zoom);
            }
            FrameSlot::Placeholder => self.draw_placeholder(),
        }
        self.draw_vignette()?;
        self.draw_caption(view.caption);

        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.target);
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.target.data_as_u8_slice().to_vec(),
        })
    }

    fn draw_image(&mut self, img: &SlotImage, zoom: f64) {
        let (w, h) = (img.image().width, img.image().height);
        let tr = cover_transform(self.canvas, w, h, zoom);
        self.ctx.set_transform(affine_to_cpu(tr));
        self.ctx.set_paint(img.paint().clone());
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
    }

    fn draw_placeholder(&mut self) {
        let (w, h) = (
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        );
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(self.style.placeholder.fill.to_cpu());
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));

        if let Some(label) = &self.placeholder_label {
            let origin = (
                (w - f64::from(label.width)) / 2.0,
                (h - f64::from(label.height)) / 2.0,
            );
            fill_line(
                &mut self.ctx,
                self.label_font.cpu_font(),
                label,
                origin,
                self.style.placeholder.label_color,
            );
        }
    }

    fn draw_vignette(&mut self) -> StoryreelResult<()> {
        let (w, h) = (self.canvas.width, self.canvas.height);
        let y0 = (self.style.vignette.start_frac * f64::from(h)).round() as u32;
        let gh = h.saturating_sub(y0);
        if gh == 0 {
            return Ok(());
        }
        let img = match &self.vignette {
            Some(img) => img.clone(),
            None => {
                let img = gradient_image(
                    self.style.vignette.start_color.to_premul(),
                    self.style.vignette.end_color.to_premul(),
                    w,
                    gh,
                )?;
                self.vignette = Some(img.clone());
                img
            }
        };
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((0.0, f64::from(y0))));
        self.ctx.set_paint(img);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(gh),
        ));
        Ok(())
    }

    fn draw_caption(&mut self, caption: &PreparedCaption) {
        if caption.lines.is_empty() {
            return;
        }
        let style = &self.style.caption;
        let w = f64::from(self.canvas.width);
        let centers = line_centers(
            caption.lines.len(),
            style.anchor_y_frac * f64::from(self.canvas.height),
            style.line_height * self.scale,
        );
        let font = self.caption_font.cpu_font();
        let stroke_width = style.stroke_width * self.scale;

        for (i, (line, cy)) in caption.lines.iter().zip(centers).enumerate() {
            let origin = (
                (w - f64::from(line.width)) / 2.0,
                cy - f64::from(line.height) / 2.0,
            );
            if let Some(shadow) = style.shadow {
                let shadow_origin = (
                    origin.0 + shadow.offset.0 * self.scale,
                    origin.1 + shadow.offset.1 * self.scale,
                );
                if stroke_width > 0.0 {
                    stroke_line(&mut self.ctx, font, line, shadow_origin, shadow.color, stroke_width);
                } else {
                    fill_line(&mut self.ctx, font, line, shadow_origin, shadow.color);
                }
            }
            if stroke_width > 0.0 {
                stroke_line(&mut self.ctx, font, line, origin, style.stroke_color, stroke_width);
            }
            fill_line(&mut self.ctx, font, line, origin, style.fill_for_line(i));
        }
    }
}

/// `1 + progress * zoom_per_slot`, with progress clamped into `[0, 1]`.
pub(crate) fn ken_burns_zoom(local_progress: f64, zoom_per_slot: f64) -> f64 {
    1.0 + local_progress.clamp(0.0, 1.0) * zoom_per_slot
}

/// Cover-fit `img_w x img_h` onto the canvas, centered, scaled by `zoom`.
pub(crate) fn cover_transform(canvas: Canvas, img_w: u32, img_h: u32, zoom: f64) -> Affine {
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let (iw, ih) = (f64::from(img_w.max(1)), f64::from(img_h.max(1)));
    let s = (cw / iw).max(ch / ih) * zoom;
    let x = (cw - iw * s) / 2.0;
    let y = (ch - ih * s) / 2.0;
    Affine::translate((x, y)) * Affine::scale(s)
}

fn fill_line(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    line: &ShapedLine,
    origin: (f64, f64),
    color: RgbaColor,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate(origin));
    ctx.set_paint(color.to_cpu());
    ctx.glyph_run(font)
        .font_size(line.font_size)
        .fill_glyphs(line.glyphs.iter().map(|g| vello_cpu::Glyph {
            id: g.id,
            x: g.x,
            y: g.y,
        }));
}

fn stroke_line(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    line: &ShapedLine,
    origin: (f64, f64),
    color: RgbaColor,
    width: f64,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate(origin));
    ctx.set_paint(color.to_cpu());
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
    ctx.glyph_run(font)
        .font_size(line.font_size)
        .stroke_glyphs(line.glyphs.iter().map(|g| vello_cpu::Glyph {
            id: g.id,
            x: g.x,
            y: g.y,
        }));
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

/// Vertical gradient interpolated in premultiplied space, `start` on the first row.
fn gradient_image(
    start: Rgba8Premul,
    end: Rgba8Premul,
    w: u32,
    h: u32,
) -> StoryreelResult<vello_cpu::Image> {
    let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
    let h1 = (h.max(1) - 1) as f32;
    let row_len = (w as usize) * 4;
    for y in 0..h {
        let t = if h1 <= 0.0 { 0.0 } else { (y as f32) / h1 };
        let lerp = |a: u8, b: u8| -> u8 {
            let af = a as f32;
            let bf = b as f32;
            (af + (bf - af) * t).round().clamp(0.0, 255.0) as u8
        };
        let c = [
            lerp(start.r, end.r),
            lerp(start.g, end.g),
            lerp(start.b, end.b),
            lerp(start.a, end.a),
        ];
        let row = &mut bytes[(y as usize) * row_len..(y as usize + 1) * row_len];
        for px in row.chunks_exact_mut(4) {
            px.copy_from_slice(&c);
        }
    }
    premul_bytes_to_paint(&bytes, w, h)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;

//! Text engine: font metrics and rasterization using `cosmic-text`.
//!
//! The engine manages a `FontSystem` (font discovery + shaping) and a
//! `SwashCache` (glyph rasterization). Layout only needs widths and line
//! spacing from it; the raster cache asks it to draw batch entries into
//! the scratch bitmap.
//!
//! Runs handed to the rasterizer are already in visual order, so they are
//! wrapped in a left-to-right override to keep cosmic-text from running
//! its own bidi pass over them.

use std::cell::RefCell;

use cosmic_text::{
    Attrs, Buffer, Color as CColor, Family, FontSystem, Metrics, Shaping, Style as CStyle,
    SwashCache, Weight,
};

use inkline_core::{FontMetrics, FontSpec, PixelRect, Rgba};

use crate::raster::{BatchEntry, Bitmap, Rasterizer};

const LRO: char = '\u{202D}';
const PDF: char = '\u{202C}';

/// Line height relative to the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Map the first family of a CSS-style chain onto cosmic-text.
fn family_of(spec: &FontSpec) -> Family<'_> {
    let first = spec
        .family
        .split(',')
        .next()
        .unwrap_or(&spec.family)
        .trim()
        .trim_matches('"')
        .trim_matches('\'');
    match first {
        "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        concrete => Family::Name(concrete),
    }
}

fn attrs_of(spec: &FontSpec) -> Attrs<'_> {
    let style = if spec.italic {
        CStyle::Italic
    } else {
        CStyle::Normal
    };
    Attrs::new()
        .family(family_of(spec))
        .weight(Weight(spec.weight))
        .style(style)
}

/// Core text engine wrapping cosmic-text.
///
/// Interior mutability lets it serve the `&self` provider traits; the
/// engine is single-threaded like the rest of the pipeline.
pub struct TextEngine {
    font_system: RefCell<FontSystem>,
    swash_cache: RefCell<SwashCache>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    /// Create a new text engine with system font discovery.
    pub fn new() -> Self {
        let font_system = FontSystem::new();
        log::info!("text engine ready, {} font faces", font_system.db().faces().count());
        Self::with_font_system(font_system)
    }

    /// Use a prepared font system (e.g. with bundled fonts loaded).
    pub fn with_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system: RefCell::new(font_system),
            swash_cache: RefCell::new(SwashCache::new()),
        }
    }

    pub fn face_count(&self) -> usize {
        self.font_system.borrow().db().faces().count()
    }

    fn metrics_for(spec: &FontSpec, scale: f32) -> Metrics {
        let size = (spec.size * scale).max(1.0);
        Metrics::new(size, (size * LINE_HEIGHT_FACTOR).ceil())
    }

    /// Shape `text` on a single unbounded line.
    fn shape(&self, text: &str, spec: &FontSpec, scale: f32) -> Buffer {
        let mut fs = self.font_system.borrow_mut();
        let mut buffer = Buffer::new(&mut fs, Self::metrics_for(spec, scale));
        buffer.set_size(&mut fs, None, None);
        buffer.set_text(&mut fs, text, attrs_of(spec), Shaping::Advanced);
        buffer.shape_until_scroll(&mut fs, false);
        buffer
    }

    /// Draw `buffer` at `origin`, keeping every pixel inside `clip`
    /// (target coordinates).
    fn draw_buffer(
        &self,
        buffer: &Buffer,
        origin: [i32; 2],
        clip: PixelRect,
        color: Rgba,
        target: &mut Bitmap,
    ) {
        let mut fs = self.font_system.borrow_mut();
        let mut cache = self.swash_cache.borrow_mut();
        let base = CColor::rgba(color.r, color.g, color.b, color.a);
        buffer.draw(&mut fs, &mut cache, base, |x, y, w, h, c| {
            let r = PixelRect::new(origin[0] + x, origin[1] + y, w as i32, h as i32).intersect(&clip);
            if r.is_empty() {
                return;
            }
            target.blend_rect(
                r.x,
                r.y,
                r.width as u32,
                r.height as u32,
                Rgba::new(c.r(), c.g(), c.b(), c.a()),
            );
        });
    }
}

impl FontMetrics for TextEngine {
    fn measure(&self, text: &str, font: &FontSpec) -> i32 {
        let visible: String = text.chars().filter(|&c| c != '\n').collect();
        if visible.is_empty() {
            return 0;
        }
        let buffer = self.shape(&visible, font, 1.0);
        let width = buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0f32, f32::max);
        width.ceil() as i32
    }

    fn line_spacing(&self, font: &FontSpec) -> i32 {
        (font.size * LINE_HEIGHT_FACTOR).ceil() as i32
    }
}

impl Rasterizer for TextEngine {
    fn rasterize(&self, entries: &[BatchEntry], offset: [i32; 2], target: &mut Bitmap) {
        for entry in entries {
            let wrapped = format!("{LRO}{}{PDF}", entry.text);
            let buffer = self.shape(&wrapped, &entry.font, entry.scale[1]);
            let origin = [
                entry.position[0].floor() as i32 - offset[0],
                entry.position[1].floor() as i32 - offset[1],
            ];
            let clip = entry.rect();
            let clip = PixelRect::new(clip.x - offset[0], clip.y - offset[1], clip.width, clip.height);

            if let Some(outline) = entry.outline {
                let radius = outline.width as i32;
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        if (dx, dy) == (0, 0) || dx * dx + dy * dy > radius * radius {
                            continue;
                        }
                        self.draw_buffer(
                            &buffer,
                            [origin[0] + dx, origin[1] + dy],
                            clip,
                            outline.color,
                            target,
                        );
                    }
                }
            }
            self.draw_buffer(&buffer, origin, clip, entry.color, target);
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

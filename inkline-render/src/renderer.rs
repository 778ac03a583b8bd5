//! Frame renderer: resolves a draw list into textured quads through the
//! glyph raster cache.

use thiserror::Error;

use inkline_text::{
    BatchEntry, CacheError, CacheLookup, GlyphRasterCache, RasterCacheConfig, Rasterizer,
    TextureStore,
};

use crate::bridge::{DrawInstruction, DrawKind};
use crate::vertex::QuadInstance;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("raster cache: {0}")]
    Cache(#[from] CacheError),
}

/// Frame statistics returned after each render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Glyph runs sent to the raster cache.
    pub text_runs: u32,
    /// Number of quads produced.
    pub quad_count: u32,
    /// Instructions left for the host (icons, keycaps, caret).
    pub passthrough: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOutput {
    pub quads: Vec<QuadInstance>,
    pub passthrough: Vec<DrawInstruction>,
    /// How the text batch was served, `None` when there was no text.
    pub lookup: Option<CacheLookup>,
    pub stats: FrameStats,
}

/// Turns draw lists into quads.
///
/// # Usage
///
/// ```ignore
/// let mut renderer = TextRenderer::new(RasterCacheConfig::default());
/// let list = collect_draw_list(&mut document, origin, &style, 0, 8);
/// let frame = renderer.render(&list, &engine, &mut store)?;
/// host.draw(&frame.quads);
/// ```
pub struct TextRenderer {
    cache: GlyphRasterCache,
}

impl TextRenderer {
    pub fn new(config: RasterCacheConfig) -> Self {
        Self {
            cache: GlyphRasterCache::new(config),
        }
    }

    pub fn cache(&self) -> &GlyphRasterCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut GlyphRasterCache {
        &mut self.cache
    }

    /// Batch every glyph run of `list` through the raster cache.
    ///
    /// The batch becomes a single quad. Icon, keycap and caret
    /// instructions are returned untouched for the host to draw.
    pub fn render(
        &mut self,
        list: &[DrawInstruction],
        rasterizer: &dyn Rasterizer,
        store: &mut dyn TextureStore,
    ) -> Result<FrameOutput, RenderError> {
        let mut output = FrameOutput::default();

        self.cache.begin_batch();
        for instruction in list {
            match &instruction.kind {
                DrawKind::Text {
                    text,
                    font,
                    outline,
                } => {
                    let mut entry = BatchEntry::new(
                        text.clone(),
                        [instruction.position.x, instruction.position.y],
                        font.clone(),
                        instruction.color,
                        instruction.size,
                    )
                    .with_clip(instruction.clip);
                    if let Some(outline) = outline {
                        entry = entry.with_outline(outline.color, outline.width);
                    }
                    self.cache.add_entry(entry)?;
                    output.stats.text_runs += 1;
                }
                _ => output.passthrough.push(instruction.clone()),
            }
        }

        if let Some(batch) = self.cache.flush(rasterizer, store)? {
            output.lookup = Some(batch.lookup);
            output.quads.push(QuadInstance::textured(
                batch.texture,
                batch.texture_size,
                batch.source,
                batch.dest,
            ));
        }

        output.stats.quad_count = output.quads.len() as u32;
        output.stats.passthrough = output.passthrough.len() as u32;
        log::trace!(
            "frame: {} runs, {} quads, {} passthrough, {:?}",
            output.stats.text_runs,
            output.stats.quad_count,
            output.stats.passthrough,
            output.lookup
        );
        Ok(output)
    }
}

// ===================================================================
// Tests
// ===================================================================

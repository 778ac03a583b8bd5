//! Raster collaborators: CPU bitmaps, batch entries, and the traits the
//! raster cache drives (a rasterizer that draws entries into a bitmap,
//! and a texture store that accepts uploads).

use inkline_core::{FontSpec, PixelRect, Rgba};
use rustc_hash::FxHashMap;

// ── Bitmap ──────────────────────────────────────────────────────────

/// RGBA8 bitmap, straight alpha, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
    /// Bounds of every pixel written since the last clear.
    dirty: Option<PixelRect>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
            dirty: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let px = &self.data[idx..idx + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Source-over blend of a solid color into a rectangle, clipped to
    /// the bitmap.
    pub fn blend_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba) {
        if color.a == 0 {
            return;
        }
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x + w as i32).clamp(0, self.width as i32) as u32;
        let y1 = (y + h as i32).clamp(0, self.height as i32) as u32;
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let touched = PixelRect::new(x0 as i32, y0 as i32, (x1 - x0) as i32, (y1 - y0) as i32);
        self.dirty = Some(match self.dirty {
            Some(dirty) => dirty.union(&touched),
            None => touched,
        });

        for py in y0..y1 {
            for px in x0..x1 {
                let idx = ((py * self.width + px) * 4) as usize;
                let dst = &mut self.data[idx..idx + 4];
                blend_over(dst, color);
            }
        }
    }

    /// Copy a region out as tightly packed RGBA rows.
    pub fn copy_region(&self, rect: PixelRect) -> Vec<u8> {
        let clipped = rect.intersect(&PixelRect::new(0, 0, self.width as i32, self.height as i32));
        if clipped.is_empty() {
            return Vec::new();
        }
        let row_bytes = clipped.width as usize * 4;
        let mut out = Vec::with_capacity(row_bytes * clipped.height as usize);
        for y in clipped.y..clipped.bottom() {
            let start = ((y as u32 * self.width + clipped.x as u32) * 4) as usize;
            out.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        out
    }

    /// Zero a region (clipped to the bitmap).
    pub fn clear_region(&mut self, rect: PixelRect) {
        let clipped = rect.intersect(&PixelRect::new(0, 0, self.width as i32, self.height as i32));
        if clipped.is_empty() {
            return;
        }
        let row_bytes = clipped.width as usize * 4;
        for y in clipped.y..clipped.bottom() {
            let start = ((y as u32 * self.width + clipped.x as u32) * 4) as usize;
            self.data[start..start + row_bytes].fill(0);
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.dirty = None;
    }

    /// Bounds of the pixels written since the last clear.
    pub fn dirty_rect(&self) -> Option<PixelRect> {
        self.dirty
    }

    /// Zero everything written since the last clear, wherever it landed.
    pub fn clear_dirty(&mut self) {
        if let Some(dirty) = self.dirty.take() {
            self.clear_region(dirty);
        }
    }
}

fn blend_over(dst: &mut [u8], src: Rgba) {
    let sa = src.a as u32;
    let da = dst[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        dst.fill(0);
        return;
    }
    let mix = |s: u8, d: u8| -> u8 {
        let s = s as u32 * sa;
        let d = d as u32 * da * (255 - sa) / 255;
        ((s + d) / out_a).min(255) as u8
    };
    dst[0] = mix(src.r, dst[0]);
    dst[1] = mix(src.g, dst[1]);
    dst[2] = mix(src.b, dst[2]);
    dst[3] = out_a.min(255) as u8;
}

/// Convert straight-alpha RGBA rows to premultiplied alpha in place.
///
/// Rows are independent. Fully transparent and fully opaque pixels are
/// left as they are.
pub fn premultiply(data: &mut [u8], width: u32) {
    let row_bytes = width as usize * 4;
    if row_bytes == 0 {
        return;
    }
    for row in data.chunks_exact_mut(row_bytes) {
        let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(row);
        for px in pixels {
            let a = px[3] as u32;
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((*c as u32 * a + 127) / 255) as u8;
            }
        }
    }
}

// ── Batch entries ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outline {
    pub color: Rgba,
    /// Ring radius in pixels.
    pub width: u32,
}

/// One text run queued for rasterization.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchEntry {
    pub text: String,
    /// Top-left in batch coordinates (pixels).
    pub position: [f32; 2],
    pub clip: PixelRect,
    pub font: FontSpec,
    pub color: Rgba,
    pub outline: Option<Outline>,
    pub scale: [f32; 2],
    /// Measured size of the run at scale (pixels).
    pub size: [f32; 2],
}

impl BatchEntry {
    /// An unclipped entry at unit scale.
    pub fn new(
        text: impl Into<String>,
        position: [f32; 2],
        font: FontSpec,
        color: Rgba,
        size: [f32; 2],
    ) -> Self {
        Self {
            text: text.into(),
            position,
            clip: PixelRect::new(i32::MIN / 2, i32::MIN / 2, i32::MAX, i32::MAX),
            font,
            color,
            outline: None,
            scale: [1.0, 1.0],
            size,
        }
    }

    pub fn with_clip(mut self, clip: PixelRect) -> Self {
        self.clip = clip;
        self
    }

    pub fn with_outline(mut self, color: Rgba, width: u32) -> Self {
        self.outline = Some(Outline { color, width });
        self
    }

    pub fn with_scale(mut self, scale: [f32; 2]) -> Self {
        self.scale = scale;
        self
    }

    fn outline_width(&self) -> i32 {
        self.outline.map(|o| o.width as i32).unwrap_or(0)
    }

    /// Pixel rectangle the entry may touch, intersected with its clip.
    ///
    /// One extra pixel on the right and bottom covers antialiasing; the
    /// outline ring widens the run on every side.
    pub fn rect(&self) -> PixelRect {
        let outline = self.outline_width();
        let rect = PixelRect::new(
            self.position[0].floor() as i32 - outline,
            self.position[1].floor() as i32 - outline,
            self.size[0].ceil() as i32 + 2 * outline + 1,
            self.size[1].ceil() as i32 + 2 * outline + 1,
        );
        rect.intersect(&self.clip)
    }
}

// ── Collaborator traits ─────────────────────────────────────────────

/// Draws batch entries into a bitmap.
pub trait Rasterizer {
    /// Draw `entries` with `offset` subtracted from their positions.
    fn rasterize(&self, entries: &[BatchEntry], offset: [i32; 2], target: &mut Bitmap);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// GPU-side texture owner.
pub trait TextureStore {
    fn create_texture(&mut self, width: u32, height: u32) -> TextureHandle;

    /// False once the texture has been lost (device reset, eviction).
    fn is_valid(&self, handle: TextureHandle) -> bool;

    /// Upload premultiplied RGBA rows into a sub-rectangle.
    fn upload(&mut self, handle: TextureHandle, x: u32, y: u32, width: u32, height: u32, data: &[u8]);
}

/// Texture store backed by host memory. Used headless and in tests.
#[derive(Debug, Default)]
pub struct MemoryTextureStore {
    textures: FxHashMap<u32, Bitmap>,
    next_id: u32,
    uploads: usize,
}

impl MemoryTextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a texture as a lost device would.
    pub fn invalidate(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle.0);
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Bitmap> {
        self.textures.get(&handle.0)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of uploads received so far.
    pub fn upload_count(&self) -> usize {
        self.uploads
    }
}

impl TextureStore for MemoryTextureStore {
    fn create_texture(&mut self, width: u32, height: u32) -> TextureHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.textures.insert(id, Bitmap::new(width, height));
        TextureHandle(id)
    }

    fn is_valid(&self, handle: TextureHandle) -> bool {
        self.textures.contains_key(&handle.0)
    }

    fn upload(&mut self, handle: TextureHandle, x: u32, y: u32, width: u32, height: u32, data: &[u8]) {
        let Some(tex) = self.textures.get_mut(&handle.0) else {
            log::warn!("upload to unknown texture {}", handle.0);
            return;
        };
        self.uploads += 1;
        if x >= tex.width {
            return;
        }
        let row_bytes = width as usize * 4;
        for (row, src) in data.chunks_exact(row_bytes.max(1)).take(height as usize).enumerate() {
            let ty = y + row as u32;
            if ty >= tex.height {
                break;
            }
            let cols = width.min(tex.width.saturating_sub(x)) as usize;
            let start = ((ty * tex.width + x) * 4) as usize;
            tex.data[start..start + cols * 4].copy_from_slice(&src[..cols * 4]);
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

//! Quad data handed to the host renderer.
//!
//! All types derive `bytemuck::Pod` + `Zeroable` so hosts can upload
//! them to a GPU buffer without copying.

use bytemuck::{Pod, Zeroable};
use inkline_core::{PixelRect, Rgba};
use inkline_text::TextureHandle;

// ───────────────────────────────────────────────────────────────────
// Vertex (unit quad)
// ───────────────────────────────────────────────────────────────────

/// A single vertex of the unit quad (0,0)→(1,1), shared by all
/// instances.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

impl QuadVertex {
    pub const VERTICES: [QuadVertex; 4] = [
        QuadVertex { position: [0.0, 0.0] }, // top-left
        QuadVertex { position: [1.0, 0.0] }, // top-right
        QuadVertex { position: [0.0, 1.0] }, // bottom-left
        QuadVertex { position: [1.0, 1.0] }, // bottom-right
    ];

    pub const INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];
}

// ───────────────────────────────────────────────────────────────────
// Instance data
// ───────────────────────────────────────────────────────────────────

/// One textured quad: a resolved raster batch placed on screen.
///
/// 64 bytes per instance.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    /// Screen-space top-left in pixels.
    pub position: [f32; 2],
    pub size: [f32; 2],
    /// Texture UV top-left.
    pub uv_min: [f32; 2],
    /// Texture UV bottom-right.
    pub uv_max: [f32; 2],
    /// Tint, each channel in [0.0, 1.0]. Premultiplied texels are drawn
    /// with white.
    pub color: [f32; 4],
    /// Host texture id (`TextureHandle.0`).
    pub texture: u32,
    pub _pad: [u32; 3],
}

impl QuadInstance {
    /// Quad drawing `source` (texels of a `texture_size` texture) at
    /// `dest`, trimmed by one texel on the right and bottom so bilinear
    /// sampling never reads the neighbouring slot.
    pub fn textured(
        texture: TextureHandle,
        texture_size: [u32; 2],
        source: PixelRect,
        dest: PixelRect,
    ) -> Self {
        let w = (source.width - 1).max(0) as f32;
        let h = (source.height - 1).max(0) as f32;
        let tw = texture_size[0].max(1) as f32;
        let th = texture_size[1].max(1) as f32;
        Self {
            position: [dest.x as f32, dest.y as f32],
            size: [w, h],
            uv_min: [source.x as f32 / tw, source.y as f32 / th],
            uv_max: [(source.x as f32 + w) / tw, (source.y as f32 + h) / th],
            color: Rgba::WHITE.to_f32(),
            texture: texture.0,
            _pad: [0; 3],
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color.to_f32();
        self
    }

    pub fn texture_handle(&self) -> TextureHandle {
        TextureHandle(self.texture)
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_vertex_size() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 8);
        assert_eq!(QuadVertex::VERTICES.len(), 4);
        assert_eq!(QuadVertex::INDICES.len(), 6);
    }

    #[test]
    fn test_quad_instance_size() {
        assert_eq!(std::mem::size_of::<QuadInstance>(), 64);
    }

    #[test]
    fn test_textured_quad_is_trimmed() {
        let q = QuadInstance::textured(
            TextureHandle(3),
            [100, 50],
            PixelRect::new(10, 0, 21, 11),
            PixelRect::new(5, 7, 21, 11),
        );
        assert_eq!(q.position, [5.0, 7.0]);
        assert_eq!(q.size, [20.0, 10.0]);
        assert_eq!(q.uv_min, [0.1, 0.0]);
        assert_eq!(q.uv_max, [0.3, 0.2]);
        assert_eq!(q.texture_handle(), TextureHandle(3));
        assert_eq!(q.color, [1.0; 4]);
    }

    #[test]
    fn test_quad_instance_bytemuck_cast() {
        let q = QuadInstance::textured(
            TextureHandle(1),
            [64, 64],
            PixelRect::new(0, 0, 9, 9),
            PixelRect::new(0, 0, 9, 9),
        )
        .with_color(Rgba::new(255, 0, 0, 255));
        let bytes = bytemuck::bytes_of(&q);
        assert_eq!(bytes.len(), 64);
        let back: &QuadInstance = bytemuck::from_bytes(bytes);
        assert_eq!(back, &q);
    }
}

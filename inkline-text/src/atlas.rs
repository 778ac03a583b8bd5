//! Slot atlas: fixed-size cache slots laid out on square texture pages.
//!
//! Uses the same row-based "shelf" packing as a glyph atlas. Because
//! every slot has the same size each shelf is one slot tall, and a new
//! page is started when a shelf no longer fits. The layout is computed
//! once up front; pages are only turned into textures on first use.

use inkline_core::PixelRect;

use crate::raster::{TextureHandle, TextureStore};

/// Index of a slot in the atlas.
pub type SlotId = usize;

/// A region within a page texture (UV coordinates normalized to [0,1]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasRegion {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

/// Placement of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRect {
    pub page: usize,
    pub x: u32,
    pub y: u32,
}

/// Shelf (row) on a page.
struct Shelf {
    y: u32,
    cursor_x: u32,
}

pub struct SlotAtlas {
    /// Page width and height in pixels (always square).
    pub page_size: u32,
    pub slot_width: u32,
    pub slot_height: u32,
    slots: Vec<SlotRect>,
    /// Lazily created page textures.
    pages: Vec<Option<TextureHandle>>,
}

impl SlotAtlas {
    /// Lay out `slot_count` slots. The page grows to fit at least one slot.
    pub fn new(slot_width: u32, slot_height: u32, slot_count: usize, page_size: u32) -> Self {
        let slot_width = slot_width.max(1);
        let slot_height = slot_height.max(1);
        let page_size = page_size.max(slot_width).max(slot_height);

        let mut slots = Vec::with_capacity(slot_count);
        let mut page = 0;
        let mut shelves: Vec<Shelf> = Vec::new();
        while slots.len() < slot_count {
            match Self::allocate(&mut shelves, slot_width, slot_height, page_size) {
                Some((x, y)) => slots.push(SlotRect { page, x, y }),
                None => {
                    page += 1;
                    shelves.clear();
                }
            }
        }
        let page_count = slots.last().map(|s| s.page + 1).unwrap_or(0);

        Self {
            page_size,
            slot_width,
            slot_height,
            slots,
            pages: vec![None; page_count],
        }
    }

    /// Place a slot on the current page using shelf packing.
    fn allocate(shelves: &mut Vec<Shelf>, width: u32, height: u32, page_size: u32) -> Option<(u32, u32)> {
        if let Some(shelf) = shelves.last_mut() {
            if shelf.cursor_x + width <= page_size {
                let pos = (shelf.cursor_x, shelf.y);
                shelf.cursor_x += width;
                return Some(pos);
            }
        }

        let shelf_y = shelves.last().map(|s| s.y + height).unwrap_or(0);
        if shelf_y + height > page_size {
            return None;
        }
        shelves.push(Shelf {
            y: shelf_y,
            cursor_x: width,
        });
        Some((0, shelf_y))
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn slot(&self, id: SlotId) -> Option<SlotRect> {
        self.slots.get(id).copied()
    }

    /// Slots living on `page`.
    pub fn slots_on_page(&self, page: usize) -> impl Iterator<Item = SlotId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.page == page)
            .map(|(id, _)| id)
    }

    /// Pixel rect of `size` anchored at the slot's top-left corner.
    pub fn source_rect(&self, id: SlotId, width: u32, height: u32) -> Option<PixelRect> {
        let slot = self.slot(id)?;
        Some(PixelRect::new(
            slot.x as i32,
            slot.y as i32,
            width.min(self.slot_width) as i32,
            height.min(self.slot_height) as i32,
        ))
    }

    /// Convert a pixel rect on a page to normalized UVs.
    pub fn region(&self, rect: PixelRect) -> AtlasRegion {
        let inv = 1.0 / self.page_size as f32;
        AtlasRegion {
            u_min: rect.x as f32 * inv,
            v_min: rect.y as f32 * inv,
            u_max: rect.right() as f32 * inv,
            v_max: rect.bottom() as f32 * inv,
        }
    }

    pub fn page_texture(&self, page: usize) -> Option<TextureHandle> {
        self.pages.get(page).copied().flatten()
    }

    /// Texture for `page`, created through `store` on first use.
    pub fn ensure_page(&mut self, page: usize, store: &mut dyn TextureStore) -> Option<TextureHandle> {
        let entry = self.pages.get_mut(page)?;
        if entry.is_none() {
            log::debug!("creating atlas page {page} ({0}x{0})", self.page_size);
            *entry = Some(store.create_texture(self.page_size, self.page_size));
        }
        *entry
    }

    /// Pages whose texture the store no longer holds. Their handles are
    /// forgotten so the next use recreates them.
    pub fn take_invalid_pages(&mut self, store: &dyn TextureStore) -> Vec<usize> {
        let mut lost = Vec::new();
        for (page, entry) in self.pages.iter_mut().enumerate() {
            if let Some(handle) = *entry {
                if !store.is_valid(handle) {
                    *entry = None;
                    lost.push(page);
                }
            }
        }
        lost
    }

    /// Forget every page texture.
    pub fn clear(&mut self) {
        self.pages.iter_mut().for_each(|p| *p = None);
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::MemoryTextureStore;

    #[test]
    fn test_slot_layout_fills_rows_then_pages() {
        // 4 per shelf, 2 shelves per page.
        let atlas = SlotAtlas::new(64, 128, 10, 256);
        assert_eq!(atlas.slot_count(), 10);
        assert_eq!(atlas.page_count(), 2);
        assert_eq!(atlas.slot(0), Some(SlotRect { page: 0, x: 0, y: 0 }));
        assert_eq!(atlas.slot(3), Some(SlotRect { page: 0, x: 192, y: 0 }));
        assert_eq!(atlas.slot(4), Some(SlotRect { page: 0, x: 0, y: 128 }));
        assert_eq!(atlas.slot(8), Some(SlotRect { page: 1, x: 0, y: 0 }));
        assert_eq!(atlas.slots_on_page(1).count(), 2);
    }

    #[test]
    fn test_default_dimensions_fit_one_page() {
        let atlas = SlotAtlas::new(512, 128, 32, 2048);
        assert_eq!(atlas.page_count(), 1);
        assert_eq!(atlas.slot(31), Some(SlotRect { page: 0, x: 1536, y: 896 }));
    }

    #[test]
    fn test_page_grows_to_fit_slot() {
        let atlas = SlotAtlas::new(300, 20, 1, 256);
        assert_eq!(atlas.page_size, 300);
        assert_eq!(atlas.slot_count(), 1);
    }

    #[test]
    fn test_region_uvs() {
        let atlas = SlotAtlas::new(64, 64, 4, 128);
        let rect = atlas.source_rect(3, 32, 100).unwrap();
        assert_eq!(rect, PixelRect::new(64, 64, 32, 64), "clamped to the slot");
        let r = atlas.region(rect);
        assert_eq!((r.u_min, r.v_min, r.u_max, r.v_max), (0.5, 0.5, 0.75, 1.0));
    }

    #[test]
    fn test_pages_created_lazily_and_swept_when_lost() {
        let mut atlas = SlotAtlas::new(64, 64, 8, 128);
        let mut store = MemoryTextureStore::new();
        assert_eq!(atlas.page_texture(1), None);

        let tex = atlas.ensure_page(1, &mut store).unwrap();
        assert_eq!(atlas.ensure_page(1, &mut store), Some(tex), "created once");
        assert_eq!(store.texture_count(), 1);

        store.invalidate(tex);
        assert_eq!(atlas.take_invalid_pages(&store), vec![1]);
        assert_eq!(atlas.page_texture(1), None);
        assert!(atlas.take_invalid_pages(&store).is_empty());
    }
}

//! Glyph raster cache.
//!
//! Text runs are collected into a batch, then flushed. A flush
//! fingerprints the batch content and either reuses an atlas slot that
//! already holds the same pixels, or rasterizes the batch into the
//! shared scratch bitmap, premultiplies it and uploads it into the
//! least-recently-used slot. Batches larger than a slot go through a
//! separate overflow texture that remembers only the last fingerprint.
//!
//! ```text
//! begin_batch ─► add_entry* ─► flush
//!                               │
//!               ┌───────────────┼──────────────────┐
//!               ▼               ▼                  ▼
//!        rect > overflow   rect > slot         fits a slot
//!          BatchTooLarge   overflow texture    LRU lookup ─► hit / evict + upload
//! ```

use std::fmt::Write as _;
use std::num::NonZeroUsize;

use lru::LruCache;
use thiserror::Error;

use inkline_core::PixelRect;

use crate::atlas::{SlotAtlas, SlotId};
use crate::raster::{premultiply, BatchEntry, Bitmap, Rasterizer, TextureHandle, TextureStore};

// ── Configuration ───────────────────────────────────────────────────

/// Cache geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterCacheConfig {
    pub slot_width: u32,
    pub slot_height: u32,
    pub slot_count: usize,
    /// Atlas page edge length.
    pub page_size: u32,
    pub overflow_width: u32,
    pub overflow_height: u32,
}

impl Default for RasterCacheConfig {
    fn default() -> Self {
        Self {
            slot_width: 512,
            slot_height: 128,
            slot_count: 32,
            page_size: 2048,
            overflow_width: 2048,
            overflow_height: 1024,
        }
    }
}

// ── Errors & results ────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("batch of {width}x{height} exceeds the overflow bitmap ({max_width}x{max_height}); split it")]
    BatchTooLarge {
        width: i32,
        height: i32,
        max_width: u32,
        max_height: u32,
    },
    #[error("no batch is being collected")]
    NotCollecting,
}

/// How a flush was served.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
    /// Too large for a slot. `rerendered` is false when the previous
    /// overflow batch had the same fingerprint.
    Overflow { rerendered: bool },
}

/// Where a flushed batch's pixels live.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedBatch {
    pub lookup: CacheLookup,
    pub texture: TextureHandle,
    pub texture_size: [u32; 2],
    /// Pixels on the texture.
    pub source: PixelRect,
    /// Where those pixels go, in batch coordinates.
    pub dest: PixelRect,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub overflow_renders: u64,
}

/// Batch content identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of `entries` relative to their bounding `rect`, so the
    /// same content drawn elsewhere on screen still matches.
    pub fn of(entries: &[BatchEntry], rect: PixelRect) -> Self {
        let mut key = String::new();
        let _ = write!(key, "{}x{}", rect.width, rect.height);
        for e in entries {
            let _ = write!(
                key,
                "|{}@{:.2},{:.2}/{}/{}/{:.3},{:.3}",
                e.text,
                e.position[0] - rect.x as f32,
                e.position[1] - rect.y as f32,
                e.font,
                e.color,
                e.scale[0],
                e.scale[1],
            );
            if let Some(outline) = e.outline {
                let _ = write!(key, "/o{}:{}", outline.color, outline.width);
            }
        }
        Fingerprint(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ── Cache ───────────────────────────────────────────────────────────

enum BatchState {
    Collecting(Vec<BatchEntry>),
    Resolved,
}

pub struct GlyphRasterCache {
    config: RasterCacheConfig,
    atlas: SlotAtlas,
    /// Fingerprint → slot, most recently used first.
    lru: LruCache<Fingerprint, SlotId>,
    /// Reverse map for invalidation.
    owners: Vec<Option<Fingerprint>>,
    /// Slots not holding anything, reused before evicting.
    free: Vec<SlotId>,
    scratch: Bitmap,
    overflow_texture: Option<TextureHandle>,
    last_overflow: Option<Fingerprint>,
    state: BatchState,
    stats: CacheStats,
}

impl GlyphRasterCache {
    pub fn new(config: RasterCacheConfig) -> Self {
        let atlas = SlotAtlas::new(
            config.slot_width,
            config.slot_height,
            config.slot_count,
            config.page_size,
        );
        let capacity = NonZeroUsize::new(atlas.slot_count()).unwrap_or(NonZeroUsize::MIN);
        let scratch_width = config.overflow_width.max(atlas.slot_width);
        let scratch_height = config.overflow_height.max(atlas.slot_height);
        Self {
            config,
            lru: LruCache::new(capacity),
            owners: vec![None; atlas.slot_count()],
            free: (0..atlas.slot_count()).rev().collect(),
            atlas,
            scratch: Bitmap::new(scratch_width, scratch_height),
            overflow_texture: None,
            last_overflow: None,
            state: BatchState::Resolved,
            stats: CacheStats::default(),
        }
    }

    pub fn config(&self) -> &RasterCacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn atlas(&self) -> &SlotAtlas {
        &self.atlas
    }

    /// Cached batches.
    pub fn len(&self) -> usize {
        self.lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lru.is_empty()
    }

    /// Fingerprints from most to least recently used.
    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.lru.iter().map(|(fp, _)| fp)
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.state, BatchState::Collecting(_))
    }

    /// Start a new batch, dropping anything collected but not flushed.
    pub fn begin_batch(&mut self) {
        self.state = BatchState::Collecting(Vec::new());
    }

    pub fn add_entry(&mut self, entry: BatchEntry) -> Result<(), CacheError> {
        match &mut self.state {
            BatchState::Collecting(entries) => {
                entries.push(entry);
                Ok(())
            }
            BatchState::Resolved => Err(CacheError::NotCollecting),
        }
    }

    /// Resolve the collected batch to texture pixels.
    ///
    /// Returns `Ok(None)` when the batch has nothing to draw.
    pub fn flush(
        &mut self,
        rasterizer: &dyn Rasterizer,
        store: &mut dyn TextureStore,
    ) -> Result<Option<ResolvedBatch>, CacheError> {
        let entries = match std::mem::replace(&mut self.state, BatchState::Resolved) {
            BatchState::Collecting(entries) => entries,
            BatchState::Resolved => return Err(CacheError::NotCollecting),
        };

        let rect = entries
            .iter()
            .fold(PixelRect::default(), |acc, e| acc.union(&e.rect()));
        if rect.is_empty() {
            return Ok(None);
        }

        let (max_w, max_h) = (self.config.overflow_width, self.config.overflow_height);
        if rect.width as u32 > max_w || rect.height as u32 > max_h {
            log::error!(
                "raster batch {}x{} is larger than the overflow bitmap {}x{}",
                rect.width,
                rect.height,
                max_w,
                max_h
            );
            return Err(CacheError::BatchTooLarge {
                width: rect.width,
                height: rect.height,
                max_width: max_w,
                max_height: max_h,
            });
        }

        let fingerprint = Fingerprint::of(&entries, rect);
        let fits_slot =
            rect.width as u32 <= self.atlas.slot_width && rect.height as u32 <= self.atlas.slot_height;
        // Without slots every batch takes the overflow path.
        if !fits_slot || self.atlas.slot_count() == 0 {
            return Ok(Some(self.flush_overflow(&entries, rect, fingerprint, rasterizer, store)));
        }

        self.sweep_invalid_pages(store);

        if let Some(&slot) = self.lru.get(&fingerprint) {
            if let Some(resolved) = self.resolve_slot(slot, rect, CacheLookup::Hit, store) {
                self.stats.hits += 1;
                return Ok(Some(resolved));
            }
        }

        let Some(slot) = self.acquire_slot() else {
            return Ok(Some(self.flush_overflow(&entries, rect, fingerprint, rasterizer, store)));
        };
        self.stats.misses += 1;
        self.render(&entries, rect, rasterizer);
        let Some(resolved) = self.resolve_slot(slot, rect, CacheLookup::Miss, store) else {
            self.free.push(slot);
            return Ok(None);
        };
        self.upload_scratch(resolved.texture, resolved.source, store);

        self.owners[slot] = Some(fingerprint.clone());
        self.lru.put(fingerprint, slot);
        Ok(Some(resolved))
    }

    /// Drop every cached fingerprint.
    pub fn invalidate_all(&mut self) {
        log::debug!("raster cache invalidated ({} entries)", self.lru.len());
        self.lru.clear();
        self.owners.iter_mut().for_each(|o| *o = None);
        self.free = (0..self.atlas.slot_count()).rev().collect();
        self.last_overflow = None;
    }

    // ---------------------------------------------------------------
    // Internal helpers
    // ---------------------------------------------------------------

    /// Forget fingerprints whose page texture is gone.
    fn sweep_invalid_pages(&mut self, store: &dyn TextureStore) {
        for page in self.atlas.take_invalid_pages(store) {
            let slots: Vec<SlotId> = self.atlas.slots_on_page(page).collect();
            let mut dropped = 0;
            for slot in slots {
                if let Some(fp) = self.owners[slot].take() {
                    self.lru.pop(&fp);
                    self.free.push(slot);
                    dropped += 1;
                }
            }
            log::warn!("atlas page {page} texture lost, {dropped} cached batches dropped");
        }
    }

    /// A free slot, else the least recently used one. `None` only when
    /// the atlas has no slots at all.
    fn acquire_slot(&mut self) -> Option<SlotId> {
        if let Some(slot) = self.free.pop() {
            return Some(slot);
        }
        let (_, slot) = self.lru.pop_lru()?;
        self.stats.evictions += 1;
        self.owners[slot] = None;
        Some(slot)
    }

    fn resolve_slot(
        &mut self,
        slot: SlotId,
        rect: PixelRect,
        lookup: CacheLookup,
        store: &mut dyn TextureStore,
    ) -> Option<ResolvedBatch> {
        let page = self.atlas.slot(slot)?.page;
        let texture = self.atlas.ensure_page(page, store)?;
        let source = self
            .atlas
            .source_rect(slot, rect.width as u32, rect.height as u32)?;
        Some(ResolvedBatch {
            lookup,
            texture,
            texture_size: [self.atlas.page_size; 2],
            source,
            dest: rect,
        })
    }

    fn flush_overflow(
        &mut self,
        entries: &[BatchEntry],
        rect: PixelRect,
        fingerprint: Fingerprint,
        rasterizer: &dyn Rasterizer,
        store: &mut dyn TextureStore,
    ) -> ResolvedBatch {
        let (w, h) = (self.config.overflow_width, self.config.overflow_height);
        let texture = match self.overflow_texture {
            Some(tex) if store.is_valid(tex) => tex,
            _ => {
                self.last_overflow = None;
                let tex = store.create_texture(w, h);
                self.overflow_texture = Some(tex);
                tex
            }
        };

        let source = PixelRect::new(0, 0, rect.width, rect.height);
        let rerendered = self.last_overflow.as_ref() != Some(&fingerprint);
        if rerendered {
            self.render(entries, rect, rasterizer);
            self.upload_scratch(texture, source, store);
            self.last_overflow = Some(fingerprint);
            self.stats.overflow_renders += 1;
        }

        ResolvedBatch {
            lookup: CacheLookup::Overflow { rerendered },
            texture,
            texture_size: [w, h],
            source,
            dest: rect,
        }
    }

    fn render(&mut self, entries: &[BatchEntry], rect: PixelRect, rasterizer: &dyn Rasterizer) {
        self.scratch.clear_dirty();
        rasterizer.rasterize(entries, [rect.x, rect.y], &mut self.scratch);
    }

    /// Copy the rendered region out of the scratch bitmap, premultiply it,
    /// upload it, and clear the scratch for the next batch. The clear
    /// covers whatever the rasterizer touched, inside `rect` or not.
    fn upload_scratch(
        &mut self,
        texture: TextureHandle,
        source: PixelRect,
        store: &mut dyn TextureStore,
    ) {
        let region = PixelRect::new(0, 0, source.width, source.height);
        let mut pixels = self.scratch.copy_region(region);
        premultiply(&mut pixels, source.width as u32);
        store.upload(
            texture,
            source.x as u32,
            source.y as u32,
            source.width as u32,
            source.height as u32,
            &pixels,
        );
        self.scratch.clear_dirty();
    }
}

impl Default for GlyphRasterCache {
    fn default() -> Self {
        Self::new(RasterCacheConfig::default())
    }
}

// ===================================================================
// Tests
// ===================================================================

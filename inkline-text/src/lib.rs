//! # inkline-text
//!
//! Character-level text pipeline for Inkline: annotation, markup token
//! substitution, ligature and contextual shaping, bidi resolution, and
//! the glyph raster cache that turns laid-out runs into texture pixels.
//!
//! ## Architecture
//!
//! ```text
//! raw text ─► annotate ─► Substitutor ─► bidi::resolve_levels ─► shaping::shape
//!                                                                     │
//!                               (line layout lives in inkline-layout) ▼
//!                                                      bidi::reorder_line
//!                                                                     │
//! TextEngine (cosmic-text) ─► GlyphRasterCache ◄── BatchEntry runs ◄──┘
//!                                  │
//!                                  ▼
//!                   SlotAtlas pages ─► TextureStore upload
//! ```
//!
//! - **`annotate`**: Sanitising and per-character Unicode annotation.
//! - **`tokens`**: `[label]` keycaps, `<name>` icons and live values.
//! - **`shaping`**: Ligatures and joining-script presentation forms.
//! - **`bidi`**: Embedding levels (pass 1) and per-line reordering (pass 2).
//! - **`unicode`**: Built-in Unicode data provider.
//! - **`engine`**: cosmic-text backed metrics and rasterizer.
//! - **`raster`**: Bitmaps, batch entries and the raster collaborator traits.
//! - **`atlas`**: Fixed-slot texture atlas with shelf packing.
//! - **`cache`**: LRU glyph raster cache.

pub mod annotate;
pub mod atlas;
pub mod bidi;
pub mod cache;
pub mod engine;
pub mod raster;
pub mod shaping;
pub mod tokens;
pub mod unicode;

// Re-exports for ergonomic use.
pub use annotate::{annotate, sanitize, Annotated};
pub use atlas::{AtlasRegion, SlotAtlas, SlotId};
pub use bidi::{reorder_line, resolve_levels};
pub use cache::{
    CacheError, CacheLookup, CacheStats, Fingerprint, GlyphRasterCache, RasterCacheConfig,
    ResolvedBatch,
};
pub use engine::TextEngine;
pub use raster::{
    premultiply, BatchEntry, Bitmap, MemoryTextureStore, Outline, Rasterizer, TextureHandle,
    TextureStore,
};
pub use shaping::shape;
pub use tokens::{IconTable, SubstitutionMode, Substitutor};
pub use unicode::StaticUnicodeData;

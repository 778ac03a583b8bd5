//! # inkline-render
//!
//! Turns laid-out Inkline documents into data a host renderer can draw.
//!
//! ## Architecture
//!
//! ```text
//!  TextDocument (inkline-layout)
//!       │
//!       ▼
//!  bridge::collect_draw_list()      ◀─── visible lines → DrawInstruction
//!       │
//!       ▼
//!  TextRenderer.render(list)        ◀─── glyph runs → GlyphRasterCache
//!       │
//!       ▼
//!  FrameOutput { quads, passthrough }
//! ```
//!
//! ## Crate modules
//!
//! - [`bridge`]: document → draw instruction conversion
//! - [`renderer`]: per-frame batching through the raster cache
//! - [`vertex`]: quad vertex and instance data types

pub mod bridge;
pub mod renderer;
pub mod vertex;

// Re-exports for convenience
pub use bridge::{
    collect_draw_list, CaretStyle, DrawInstruction, DrawKind, Shadow, TextStyle, UNCLIPPED,
};
pub use renderer::{FrameOutput, FrameStats, RenderError, TextRenderer};
pub use vertex::{QuadInstance, QuadVertex};

//! # inkline-layout
//!
//! Word segmentation, greedy line layout and cursor mapping for Inkline,
//! plus the `TextDocument` that owns a string and re-flows it lazily.
//!
//! ## Architecture
//!
//! ```text
//! TextDocument::flow
//!   annotate ─► substitute ─► resolve_levels ─► shape      (inkline-text)
//!                                                 │
//!                                                 ▼
//!   segment ─► LineLayout::wrap ─► reorder_line per line ─► place
//!                                                 │
//!                                                 ▼
//!                                  CursorMapper (offset ◄─► line, x)
//! ```
//!
//! - **`params`**: `LayoutParams` and the text backend switch.
//! - **`segment`**: Units (text runs, tokens, breaks) and their widths.
//! - **`engine`**: Line breaking, per-line reordering and placement.
//! - **`cursor`**: Logical offset / pixel position mapping.
//! - **`document`**: Lazy flow, cursor movement and editing.

pub mod cursor;
pub mod document;
pub mod engine;
pub mod params;
pub mod segment;

pub use cursor::{CursorMapper, CursorPosition};
pub use document::{TextDocument, TextServices};
pub use engine::{LayoutError, Line, LineLayout};
pub use params::{LayoutParams, TextBackend, MAX_LAYOUT_WIDTH};
pub use segment::{merge_text_units, segment, Measure, Unit, UnitKind};

//! # inkline-core
//!
//! Shared value types for the inkline text engine, plus the collaborator
//! traits the engine calls instead of reimplementing (Unicode data, font
//! metrics, icon lookup, value substitution, content filtering).
//!
//! ## Architecture
//!
//! ```text
//!  raw text ──► inkline-text (annotate, tokens, shaping, bidi)
//!                   │
//!                   ▼
//!              inkline-layout (segment, wrap, cursor, TextDocument)
//!                   │
//!                   ▼
//!              inkline-render (draw list ──► raster cache ──► quads)
//! ```
//!
//! Everything in this crate is plain data: no crate here owns a font,
//! a texture or a window.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod metrics;
pub mod providers;

pub use metrics::FixedAdvanceMetrics;
pub use providers::{
    ContentFilter, ContextualForms, FontMetrics, IconRegistry, LigatureEntry, UnicodeData,
    ValueSource,
};

/// Private-use codepoint carried by substituted token characters.
pub const TOKEN_CHAR: char = '\u{F8FF}';

// ── Bidi classification ─────────────────────────────────────────────

/// Unicode bidirectional character type (the subset the engine resolves).
///
/// Isolate controls (LRI, RLI, FSI, PDI) are not modelled and classify
/// as [`BidiType::ON`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidiType {
    L,
    R,
    AL,
    EN,
    ES,
    ET,
    AN,
    CS,
    NSM,
    BN,
    B,
    S,
    WS,
    ON,
    LRE,
    LRO,
    RLE,
    RLO,
    PDF,
}

impl Default for BidiType {
    fn default() -> Self {
        Self::ON
    }
}

impl BidiType {
    /// L, R or AL.
    #[inline]
    pub fn is_strong(self) -> bool {
        matches!(self, Self::L | Self::R | Self::AL)
    }

    /// Types whose presence switches a paragraph into bidi processing.
    #[inline]
    pub fn is_rtl_trigger(self) -> bool {
        matches!(self, Self::R | Self::AL | Self::RLE | Self::RLO)
    }

    #[inline]
    pub fn is_neutral(self) -> bool {
        matches!(self, Self::B | Self::S | Self::WS | Self::ON)
    }

    /// Explicit embedding and override codes, removed after level resolution.
    #[inline]
    pub fn is_explicit(self) -> bool {
        matches!(
            self,
            Self::LRE | Self::LRO | Self::RLE | Self::RLO | Self::PDF
        )
    }
}

// ── Tokens ──────────────────────────────────────────────────────────

/// Opaque handle to an icon known to the host's [`IconRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconRef(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// `<name>` resolved to a button icon.
    Icon,
    /// `[label]` drawn as a key face.
    Keycap,
}

/// Payload of a token character substituted from inline markup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Characters originally between the delimiters.
    pub label: Vec<Character>,
    pub icon_id: Option<IconRef>,
    /// Key-face overlay icon for keycaps such as `[arrowleft]`.
    pub secondary_icon_id: Option<IconRef>,
}

impl Token {
    pub fn label_text(&self) -> String {
        self.label.iter().map(|c| c.codepoint).collect()
    }
}

// ── Character ───────────────────────────────────────────────────────

/// One logical character of a flowed document, annotated for layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub codepoint: char,
    /// Resolved type; rewritten while bidi levels are computed.
    pub bidi_type: BidiType,
    /// Type as classified from the source codepoint.
    pub original_type: BidiType,
    pub mirrored: bool,
    pub mirror_partner: Option<char>,
    pub embedding_level: u8,
    /// Index of the first source character this character covers.
    pub raw_index: usize,
    /// Number of source characters covered (2 + label for tokens).
    pub raw_len: usize,
    pub logical_index: usize,
    pub display_index: usize,
    pub token: Option<Box<Token>>,
}

impl Character {
    /// A plain character at `raw_index`, with indices to be renumbered later.
    pub fn new(
        codepoint: char,
        bidi_type: BidiType,
        mirror_partner: Option<char>,
        raw_index: usize,
    ) -> Self {
        Self {
            codepoint,
            bidi_type,
            original_type: bidi_type,
            mirrored: mirror_partner.is_some(),
            mirror_partner,
            embedding_level: 0,
            raw_index,
            raw_len: 1,
            logical_index: raw_index,
            display_index: raw_index,
            token: None,
        }
    }

    /// A bidi-neutral token character standing in for a markup span.
    pub fn token(token: Token, raw_index: usize, raw_len: usize) -> Self {
        Self {
            codepoint: TOKEN_CHAR,
            bidi_type: BidiType::ON,
            original_type: BidiType::ON,
            mirrored: false,
            mirror_partner: None,
            embedding_level: 0,
            raw_index,
            raw_len,
            logical_index: raw_index,
            display_index: raw_index,
            token: Some(Box::new(token)),
        }
    }

    #[inline]
    pub fn is_token(&self) -> bool {
        self.token.is_some()
    }

    #[inline]
    pub fn is_line_break(&self) -> bool {
        self.token.is_none() && self.codepoint == '\n'
    }

    /// Whitespace as classified by the source type (WS), used for word runs.
    #[inline]
    pub fn is_whitespace(&self) -> bool {
        self.token.is_none() && self.original_type == BidiType::WS
    }

    /// Displayed right-to-left (odd resolved level).
    #[inline]
    pub fn is_rtl(&self) -> bool {
        self.embedding_level % 2 == 1
    }

    pub fn token_kind(&self) -> Option<TokenKind> {
        self.token.as_ref().map(|t| t.kind)
    }

    pub fn label(&self) -> Option<&[Character]> {
        self.token.as_ref().map(|t| t.label.as_slice())
    }

    pub fn icon_id(&self) -> Option<IconRef> {
        self.token.as_ref().and_then(|t| t.icon_id)
    }

    pub fn secondary_icon_id(&self) -> Option<IconRef> {
        self.token.as_ref().and_then(|t| t.secondary_icon_id)
    }

    /// One past the last source character covered.
    #[inline]
    pub fn raw_end(&self) -> usize {
        self.raw_index + self.raw_len
    }
}

/// Reset logical and display indices to the sequence position.
pub fn renumber(chars: &mut [Character]) {
    for (i, c) in chars.iter_mut().enumerate() {
        c.logical_index = i;
        c.display_index = i;
    }
}

// ── Fonts & colors ──────────────────────────────────────────────────

/// Font identity as understood by the metrics and raster backends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// CSS-style family chain (e.g. `"Noto Sans, sans-serif"`).
    pub family: String,
    /// Size in pixels.
    pub size: f32,
    /// Weight (100–900). 400 = normal, 700 = bold.
    pub weight: u16,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: String::from("sans-serif"),
            size: 16.0,
            weight: 400,
            italic: false,
        }
    }
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            ..Default::default()
        }
    }

    /// Same face at `factor` times the size.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            size: self.size * factor,
            ..self.clone()
        }
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.family, self.size, self.weight)?;
        if self.italic {
            f.write_str(":i")?;
        }
        Ok(())
    }
}

/// 8-bit straight-alpha color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels normalized to [0.0, 1.0].
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

// ── Geometry ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Integer pixel rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Overlap of two rects; empty (zero-sized) when they are disjoint.
    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return PixelRect::new(x, y, 0, 0);
        }
        PixelRect::new(x, y, right - x, bottom - y)
    }

    /// Smallest rect covering both. Empty rects do not contribute.
    pub fn union(&self, other: &PixelRect) -> PixelRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        PixelRect::new(x, y, right - x, bottom - y)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

// ── Layout enums ────────────────────────────────────────────────────

/// Horizontal placement of each line inside the layout width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Justification {
    #[default]
    Left,
    Center,
    Right,
}

impl Justification {
    /// Offset of a line of `line_width` inside `width`.
    pub fn margin(self, width: i32, line_width: i32) -> i32 {
        match self {
            Self::Left => 0,
            Self::Center => (width - line_width) / 2,
            Self::Right => width - line_width,
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

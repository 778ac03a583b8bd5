//! Word segmentation: splits a character slice into render units.

use inkline_core::{Character, FontMetrics, FontSpec, IconRef, TokenKind};

use crate::params::TextBackend;

/// Button glyph size relative to the font's line spacing.
const BUTTON_SCALE: f32 = 1.55;
/// Keycap label font relative to the document font.
const KEYCAP_FONT_SCALE: f32 = 0.75;
/// Horizontal margin around a keycap label.
const KEYCAP_MARGIN: i32 = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitKind {
    Text,
    Icon(IconRef),
    Keycap { secondary_icon_id: Option<IconRef> },
    LineBreak,
}

/// A contiguous render atom.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    pub kind: UnitKind,
    pub characters: Vec<Character>,
    /// Codepoints for text runs; the label for tokens.
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    /// Display index of the first character.
    pub start: usize,
}

impl Unit {
    pub fn text_run(characters: Vec<Character>, measure: &Measure<'_>) -> Self {
        let text: String = characters.iter().map(|c| c.codepoint).collect();
        Self {
            kind: UnitKind::Text,
            width: measure.text_width(&text),
            start: characters.first().map(|c| c.display_index).unwrap_or(0),
            characters,
            text,
            x: 0,
            y: 0,
        }
    }

    pub fn token(c: Character, measure: &Measure<'_>) -> Self {
        let label = c.token.as_ref().map(|t| t.label_text()).unwrap_or_default();
        let (kind, width) = match c.token_kind() {
            Some(TokenKind::Keycap) => {
                let secondary_icon_id = c.secondary_icon_id();
                let width = if secondary_icon_id.is_some() {
                    measure.button_width()
                } else {
                    measure.keycap_width(&label)
                };
                (UnitKind::Keycap { secondary_icon_id }, width)
            }
            _ => {
                let icon = c.icon_id().unwrap_or(IconRef(0));
                (UnitKind::Icon(icon), measure.button_width())
            }
        };
        Self {
            kind,
            start: c.display_index,
            characters: vec![c],
            text: label,
            x: 0,
            y: 0,
            width,
        }
    }

    pub fn line_break(c: Character) -> Self {
        Self {
            kind: UnitKind::LineBreak,
            start: c.display_index,
            characters: vec![c],
            text: String::from("\n"),
            x: 0,
            y: 0,
            width: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn is_token(&self) -> bool {
        matches!(self.kind, UnitKind::Icon(_) | UnitKind::Keycap { .. })
    }

    /// Contains a line break (always its last character).
    pub fn ends_with_break(&self) -> bool {
        self.characters.last().is_some_and(|c| c.is_line_break())
    }

    /// A text run made only of spaces (and possibly a closing break).
    pub fn is_whitespace(&self) -> bool {
        self.kind == UnitKind::Text
            && self.characters.iter().any(|c| c.is_whitespace())
            && self
                .characters
                .iter()
                .all(|c| c.is_whitespace() || c.is_line_break())
    }
}

/// Width rules for one font and backend.
pub struct Measure<'a> {
    metrics: &'a dyn FontMetrics,
    font: &'a FontSpec,
    keycap_font: FontSpec,
    backend: TextBackend,
}

impl<'a> Measure<'a> {
    pub fn new(metrics: &'a dyn FontMetrics, font: &'a FontSpec, backend: TextBackend) -> Self {
        Self {
            metrics,
            font,
            keycap_font: font.scaled(KEYCAP_FONT_SCALE),
            backend,
        }
    }

    pub fn backend(&self) -> TextBackend {
        self.backend
    }

    pub fn font(&self) -> &FontSpec {
        self.font
    }

    pub fn keycap_font(&self) -> &FontSpec {
        &self.keycap_font
    }

    pub fn line_spacing(&self) -> i32 {
        self.metrics.line_spacing(self.font)
    }

    pub fn padding(&self) -> i32 {
        self.metrics.padding(self.font)
    }

    /// Width of a text run; line breaks have no width.
    pub fn text_width(&self, text: &str) -> i32 {
        let visible: String = text.chars().filter(|&c| c != '\n').collect();
        let width = self.metrics.measure(&visible, self.font);
        match self.backend {
            TextBackend::Sprite => width,
            TextBackend::System => (width - 2 * self.padding()).max(0),
        }
    }

    pub fn chars_width(&self, chars: &[Character]) -> i32 {
        let text: String = chars.iter().map(|c| c.codepoint).collect();
        self.text_width(&text)
    }

    pub fn button_size(&self) -> f32 {
        self.line_spacing() as f32 * BUTTON_SCALE
    }

    /// `button_size * 40 / 64`, kept in integers so it floors exactly.
    pub fn button_width(&self) -> i32 {
        self.line_spacing() * 31 / 32
    }

    pub fn keycap_label_width(&self, label: &str) -> i32 {
        self.metrics.measure(label, &self.keycap_font)
    }

    pub fn keycap_width(&self, label: &str) -> i32 {
        self.button_width()
            .max(self.keycap_label_width(label) + KEYCAP_MARGIN)
    }
}

/// Segment `chars` (in the order they will be drawn) into units.
///
/// Tokens and leading line breaks stand alone. Other runs grow while
/// their whitespace-ness stays the same; a line break ends the run it
/// closes.
pub fn segment(chars: &[Character], measure: &Measure<'_>) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = &chars[i];
        if c.is_token() {
            units.push(Unit::token(c.clone(), measure));
            i += 1;
            continue;
        }
        if c.is_line_break() {
            units.push(Unit::line_break(c.clone()));
            i += 1;
            continue;
        }

        let whitespace = c.is_whitespace();
        let mut end = i + 1;
        while end < chars.len() {
            let next = &chars[end];
            if next.is_token() {
                break;
            }
            if next.is_line_break() {
                end += 1;
                break;
            }
            if next.is_whitespace() != whitespace {
                break;
            }
            end += 1;
        }
        units.push(Unit::text_run(chars[i..end].to_vec(), measure));
        i = end;
    }
    units
}

/// Merge neighbouring plain-text units and re-measure them.
pub fn merge_text_units(units: Vec<Unit>, measure: &Measure<'_>) -> Vec<Unit> {
    let mut merged: Vec<Unit> = Vec::with_capacity(units.len());
    for unit in units {
        match merged.last_mut() {
            Some(prev)
                if prev.kind == UnitKind::Text
                    && unit.kind == UnitKind::Text
                    && !prev.ends_with_break() =>
            {
                prev.characters.extend(unit.characters);
                prev.text.push_str(&unit.text);
                prev.width = measure.text_width(&prev.text);
            }
            _ => merged.push(unit),
        }
    }
    merged
}

// ===================================================================
// Tests
// ===================================================================

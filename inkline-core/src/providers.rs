//! Collaborator interfaces.
//!
//! The engine never owns Unicode tables, fonts, icon art or game state
//! directly. Hosts hand in implementations of these traits; the
//! `inkline-text` crate ships defaults for the Unicode data, metrics
//! and icon lookup.

use crate::{BidiType, FontSpec, IconRef};

/// A ligature candidate: when `followers` come right after the base
/// character, the whole sequence collapses into `joined`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LigatureEntry {
    pub followers: Vec<char>,
    pub joined: char,
}

/// Presentation forms of a joining-script character. `None` means the
/// form does not exist and the character is left unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextualForms {
    pub isolated: Option<char>,
    pub initial: Option<char>,
    pub medial: Option<char>,
    pub final_form: Option<char>,
}

/// Static Unicode character data.
pub trait UnicodeData {
    fn bidi_class(&self, c: char) -> BidiType;

    /// Mirrored glyph for bracket-like characters.
    fn mirror(&self, c: char) -> Option<char>;

    /// Ligature candidates starting with `c`.
    fn ligatures(&self, c: char) -> &[LigatureEntry];

    fn contextual_forms(&self, c: char) -> Option<ContextualForms>;
}

/// Text measurement for a font backend. Widths are whole pixels.
pub trait FontMetrics {
    fn measure(&self, text: &str, font: &FontSpec) -> i32;

    fn line_spacing(&self, font: &FontSpec) -> i32;

    /// Backend-specific blank margin drawn before and after a string.
    fn padding(&self, _font: &FontSpec) -> i32 {
        0
    }
}

/// Name → icon lookup for `<name>` and `[name]` markup.
pub trait IconRegistry {
    fn resolve(&self, name: &str) -> Option<IconRef>;

    /// Button icons stand alone inline; the rest only decorate keycaps.
    fn is_button_icon(&self, icon: IconRef) -> bool;
}

/// Live values (scores and the like) substituted for `<alias>` markup.
pub trait ValueSource {
    fn value(&self, alias: &str) -> Option<String>;
}

impl<F> ValueSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn value(&self, alias: &str) -> Option<String> {
        self(alias)
    }
}

/// Text scrubbing applied to raw text before it is annotated.
pub trait ContentFilter {
    /// `None` leaves the text as is.
    fn scrub(&self, text: &str) -> Option<String>;
}

impl<F> ContentFilter for F
where
    F: Fn(&str) -> Option<String>,
{
    fn scrub(&self, text: &str) -> Option<String> {
        self(text)
    }
}

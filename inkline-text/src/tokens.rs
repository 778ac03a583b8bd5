//! Token substitution: `[label]` keycaps and `<name>` icons.
//!
//! Both passes rebuild the character list from the previous one rather
//! than editing it in place. Markup that does not resolve stays literal.

use inkline_core::{
    renumber, Character, IconRef, IconRegistry, Token, TokenKind, UnicodeData, ValueSource,
};
use rustc_hash::FxHashMap;

use crate::annotate::annotate_char;

/// Whether value aliases are expanded (a running game) or left as
/// markup (an editor).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SubstitutionMode {
    #[default]
    Edit,
    Live,
}

// ── Icon table ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
struct IconEntry {
    icon: IconRef,
    button: bool,
}

/// Default [`IconRegistry`]: a case-insensitive name table.
#[derive(Clone, Debug, Default)]
pub struct IconTable {
    entries: FxHashMap<String, IconEntry>,
}

impl IconTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stand-alone button icon.
    pub fn with_button(mut self, name: &str, icon: IconRef) -> Self {
        self.insert(name, icon, true);
        self
    }

    /// Register an icon that may only decorate a keycap face.
    pub fn with_key_overlay(mut self, name: &str, icon: IconRef) -> Self {
        self.insert(name, icon, false);
        self
    }

    fn insert(&mut self, name: &str, icon: IconRef, button: bool) {
        self.entries
            .insert(name.to_lowercase(), IconEntry { icon, button });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IconRegistry for IconTable {
    fn resolve(&self, name: &str) -> Option<IconRef> {
        self.entries.get(&name.to_lowercase()).map(|e| e.icon)
    }

    fn is_button_icon(&self, icon: IconRef) -> bool {
        self.entries.values().any(|e| e.icon == icon && e.button)
    }
}

// ── Substitutor ─────────────────────────────────────────────────────

/// What a `<name>` span turns into.
enum IconMatch {
    Button(IconRef),
    Value(String),
    Literal,
}

/// Runs the keycap pass then the icon pass over an annotated list.
pub struct Substitutor<'a> {
    data: &'a dyn UnicodeData,
    icons: &'a dyn IconRegistry,
    values: Option<&'a dyn ValueSource>,
    mode: SubstitutionMode,
}

impl<'a> Substitutor<'a> {
    pub fn new(data: &'a dyn UnicodeData, icons: &'a dyn IconRegistry) -> Self {
        Self {
            data,
            icons,
            values: None,
            mode: SubstitutionMode::Edit,
        }
    }

    pub fn with_values(mut self, values: &'a dyn ValueSource, mode: SubstitutionMode) -> Self {
        self.values = Some(values);
        self.mode = mode;
        self
    }

    /// Substitute all markup and renumber the result.
    pub fn run(&self, chars: Vec<Character>) -> Vec<Character> {
        let chars = self.substitute_keycaps(chars);
        let mut chars = self.substitute_icons(chars);
        renumber(&mut chars);
        chars
    }

    fn substitute_keycaps(&self, chars: Vec<Character>) -> Vec<Character> {
        let mut out = Vec::with_capacity(chars.len());
        let mut i = 0;
        while i < chars.len() {
            if is_opening(&chars[i], '[') {
                if let Some(close) = find_closing(&chars, i, ']') {
                    out.push(self.keycap(&chars[i..=close]));
                    i = close + 1;
                    continue;
                }
                log::debug!("unterminated keycap at raw index {}", chars[i].raw_index);
            }
            out.push(chars[i].clone());
            i += 1;
        }
        out
    }

    fn substitute_icons(&self, chars: Vec<Character>) -> Vec<Character> {
        let mut out = Vec::with_capacity(chars.len());
        let mut i = 0;
        while i < chars.len() {
            if is_opening(&chars[i], '<') {
                if let Some(close) = find_closing(&chars, i, '>') {
                    let span = &chars[i..=close];
                    let name: String = span[1..span.len() - 1]
                        .iter()
                        .map(|c| c.codepoint)
                        .collect();
                    match self.match_icon(&name) {
                        IconMatch::Button(icon) => {
                            out.push(token_for(span, TokenKind::Icon, Some(icon), None));
                            i = close + 1;
                            continue;
                        }
                        IconMatch::Value(text) => {
                            self.push_value(&mut out, span, &text);
                            i = close + 1;
                            continue;
                        }
                        IconMatch::Literal => {
                            log::debug!("unresolved icon name {name:?}, kept as text");
                        }
                    }
                }
            }
            out.push(chars[i].clone());
            i += 1;
        }
        out
    }

    fn match_icon(&self, name: &str) -> IconMatch {
        let alias = name.to_lowercase();
        if self.mode == SubstitutionMode::Live {
            if let Some(text) = self.values.and_then(|v| v.value(&alias)) {
                return IconMatch::Value(text);
            }
        }
        match self.icons.resolve(&alias) {
            Some(icon) if self.icons.is_button_icon(icon) => IconMatch::Button(icon),
            _ => IconMatch::Literal,
        }
    }

    fn keycap(&self, span: &[Character]) -> Character {
        let label = &span[1..span.len() - 1];
        let name: String = label.iter().map(|c| c.codepoint).collect::<String>().to_lowercase();
        let secondary = if name.contains("arrow") {
            self.icons
                .resolve(&name)
                .filter(|&icon| !self.icons.is_button_icon(icon))
        } else {
            None
        };
        token_for(span, TokenKind::Keycap, None, secondary)
    }

    /// Expand a live value into plain characters. Each one covers the
    /// whole markup span, so editing next to any of them edits the markup.
    fn push_value(&self, out: &mut Vec<Character>, span: &[Character], text: &str) {
        let raw_index = span[0].raw_index;
        let raw_len: usize = span.iter().map(|c| c.raw_len).sum();
        for c in text.chars() {
            let mut ch = annotate_char(c, raw_index, self.data);
            ch.raw_len = raw_len;
            out.push(ch);
        }
    }
}

fn is_opening(c: &Character, delimiter: char) -> bool {
    !c.is_token() && c.codepoint == delimiter
}

/// Index of the closing delimiter on the same line, if any.
fn find_closing(chars: &[Character], open: usize, delimiter: char) -> Option<usize> {
    for (j, c) in chars.iter().enumerate().skip(open + 1) {
        if c.is_token() || c.is_line_break() {
            return None;
        }
        if c.codepoint == delimiter {
            return Some(j);
        }
    }
    None
}

fn token_for(
    span: &[Character],
    kind: TokenKind,
    icon_id: Option<IconRef>,
    secondary_icon_id: Option<IconRef>,
) -> Character {
    let token = Token {
        kind,
        label: span[1..span.len() - 1].to_vec(),
        icon_id,
        secondary_icon_id,
    };
    let raw_len = span.iter().map(|c| c.raw_len).sum();
    Character::token(token, span[0].raw_index, raw_len)
}

// ===================================================================
// Tests
// ===================================================================

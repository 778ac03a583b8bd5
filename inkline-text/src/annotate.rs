//! Character annotation: turns scrubbed text into a fresh `Character`
//! list carrying bidi types and mirroring data.

use inkline_core::{Character, UnicodeData};

/// Annotated logical sequence for one document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotated {
    pub characters: Vec<Character>,
    /// Any R, AL, RLE or RLO character present.
    pub has_rtl: bool,
}

/// Replace characters the layout cannot place.
///
/// Control characters other than `\n` become a space and the typographic
/// apostrophe becomes `'`. The result has the same length in characters
/// as the input.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' => '\n',
            '\u{2019}' => '\'',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect()
}

/// Annotate a single codepoint taken from source position `raw_index`.
pub fn annotate_char(c: char, raw_index: usize, data: &dyn UnicodeData) -> Character {
    Character::new(c, data.bidi_class(c), data.mirror(c), raw_index)
}

/// Rebuild the character list for `text` from scratch.
pub fn annotate(text: &str, data: &dyn UnicodeData) -> Annotated {
    let characters: Vec<Character> = text
        .chars()
        .enumerate()
        .map(|(i, c)| annotate_char(c, i, data))
        .collect();
    let has_rtl = characters.iter().any(|c| c.original_type.is_rtl_trigger());
    Annotated {
        characters,
        has_rtl,
    }
}

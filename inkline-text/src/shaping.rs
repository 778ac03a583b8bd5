//! Ligature merging and contextual (joining) form selection.

use inkline_core::{renumber, BidiType, Character, ContextualForms, UnicodeData};

/// Merge ligature sequences. The longest matching candidate wins; the
/// first character takes the joined codepoint and absorbs the raw span
/// of the characters it replaces.
pub fn apply_ligatures(chars: Vec<Character>, data: &dyn UnicodeData) -> Vec<Character> {
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let mut c = chars[i].clone();
        i += 1;
        if c.is_token() {
            out.push(c);
            continue;
        }

        let rest = &chars[i..];
        let best = data
            .ligatures(c.codepoint)
            .iter()
            .filter(|entry| {
                entry.followers.len() <= rest.len()
                    && entry
                        .followers
                        .iter()
                        .zip(rest)
                        .all(|(&f, next)| !next.is_token() && next.codepoint == f)
            })
            .max_by_key(|entry| entry.followers.len());

        if let Some(entry) = best {
            let taken = entry.followers.len();
            c.codepoint = entry.joined;
            let end = rest[..taken]
                .iter()
                .map(Character::raw_end)
                .fold(c.raw_end(), usize::max);
            c.raw_len = end - c.raw_index;
            c.mirrored = false;
            c.mirror_partner = None;
            i += taken;
        }
        out.push(c);
    }
    out
}

#[inline]
fn joins(c: &Character) -> bool {
    matches!(c.original_type, BidiType::R | BidiType::AL)
}

/// Pick the presentation form for a character from its neighbours.
/// `None` (the letter stays as it is) when the font data has no such form.
fn select_form(forms: ContextualForms, joins_before: bool, joins_after: bool) -> Option<char> {
    match (joins_before, joins_after) {
        (false, false) => forms.isolated,
        (false, true) => forms.initial,
        (true, true) => forms.medial,
        (true, false) => forms.final_form,
    }
}

/// Rewrite joining-script characters into isolated, initial, medial or
/// final forms, judged by the neighbours' original bidi types.
pub fn apply_contextual_forms(chars: &mut [Character], data: &dyn UnicodeData) {
    let joining: Vec<bool> = chars.iter().map(joins).collect();
    for i in 0..chars.len() {
        if chars[i].is_token() {
            continue;
        }
        let Some(forms) = data.contextual_forms(chars[i].codepoint) else {
            continue;
        };
        let before = i > 0 && joining[i - 1];
        let after = i + 1 < chars.len() && joining[i + 1];
        if let Some(form) = select_form(forms, before, after) {
            chars[i].codepoint = form;
        }
    }
}

/// Ligatures, then contextual forms when the text contains RTL, then
/// renumbering.
pub fn shape(chars: Vec<Character>, data: &dyn UnicodeData, has_rtl: bool) -> Vec<Character> {
    let mut chars = apply_ligatures(chars, data);
    if has_rtl {
        apply_contextual_forms(&mut chars, data);
    }
    renumber(&mut chars);
    chars
}

// ===================================================================
// Tests
// ===================================================================

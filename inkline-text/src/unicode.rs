//! Built-in Unicode data provider.
//!
//! Bidi classes come from the `unicode-bidi` tables. Mirroring pairs,
//! Arabic presentation forms and the LAM+ALEF ligatures are small
//! hand-kept tables covering the scripts the engine shapes.

use inkline_core::{BidiType, ContextualForms, LigatureEntry, UnicodeData};
use rustc_hash::FxHashMap;
use unicode_bidi::BidiClass;

/// Mirrored bracket pairs. Each pair is registered in both directions.
const MIRROR_PAIRS: &[(char, char)] = &[
    ('(', ')'),
    ('<', '>'),
    ('[', ']'),
    ('{', '}'),
    ('«', '»'),
    ('‹', '›'),
    ('⁅', '⁆'),
    ('⁽', '⁾'),
    ('₍', '₎'),
    ('≤', '≥'),
    ('∈', '∋'),
    ('⟨', '⟩'),
    ('〈', '〉'),
    ('《', '》'),
    ('「', '」'),
    ('『', '』'),
    ('【', '】'),
    ('〔', '〕'),
    ('（', '）'),
    ('［', '］'),
    ('｛', '｝'),
    ('＜', '＞'),
];

/// Arabic letters and their presentation forms:
/// `(base, isolated, final, initial, medial)`; 0 marks a missing form.
const ARABIC_FORMS: &[(u32, u32, u32, u32, u32)] = &[
    (0x0621, 0xFE80, 0, 0, 0),
    (0x0622, 0xFE81, 0xFE82, 0, 0),
    (0x0623, 0xFE83, 0xFE84, 0, 0),
    (0x0624, 0xFE85, 0xFE86, 0, 0),
    (0x0625, 0xFE87, 0xFE88, 0, 0),
    (0x0626, 0xFE89, 0xFE8A, 0xFE8B, 0xFE8C),
    (0x0627, 0xFE8D, 0xFE8E, 0, 0),
    (0x0628, 0xFE8F, 0xFE90, 0xFE91, 0xFE92),
    (0x0629, 0xFE93, 0xFE94, 0, 0),
    (0x062A, 0xFE95, 0xFE96, 0xFE97, 0xFE98),
    (0x062B, 0xFE99, 0xFE9A, 0xFE9B, 0xFE9C),
    (0x062C, 0xFE9D, 0xFE9E, 0xFE9F, 0xFEA0),
    (0x062D, 0xFEA1, 0xFEA2, 0xFEA3, 0xFEA4),
    (0x062E, 0xFEA5, 0xFEA6, 0xFEA7, 0xFEA8),
    (0x062F, 0xFEA9, 0xFEAA, 0, 0),
    (0x0630, 0xFEAB, 0xFEAC, 0, 0),
    (0x0631, 0xFEAD, 0xFEAE, 0, 0),
    (0x0632, 0xFEAF, 0xFEB0, 0, 0),
    (0x0633, 0xFEB1, 0xFEB2, 0xFEB3, 0xFEB4),
    (0x0634, 0xFEB5, 0xFEB6, 0xFEB7, 0xFEB8),
    (0x0635, 0xFEB9, 0xFEBA, 0xFEBB, 0xFEBC),
    (0x0636, 0xFEBD, 0xFEBE, 0xFEBF, 0xFEC0),
    (0x0637, 0xFEC1, 0xFEC2, 0xFEC3, 0xFEC4),
    (0x0638, 0xFEC5, 0xFEC6, 0xFEC7, 0xFEC8),
    (0x0639, 0xFEC9, 0xFECA, 0xFECB, 0xFECC),
    (0x063A, 0xFECD, 0xFECE, 0xFECF, 0xFED0),
    (0x0641, 0xFED1, 0xFED2, 0xFED3, 0xFED4),
    (0x0642, 0xFED5, 0xFED6, 0xFED7, 0xFED8),
    (0x0643, 0xFED9, 0xFEDA, 0xFEDB, 0xFEDC),
    (0x0644, 0xFEDD, 0xFEDE, 0xFEDF, 0xFEE0),
    (0x0645, 0xFEE1, 0xFEE2, 0xFEE3, 0xFEE4),
    (0x0646, 0xFEE5, 0xFEE6, 0xFEE7, 0xFEE8),
    (0x0647, 0xFEE9, 0xFEEA, 0xFEEB, 0xFEEC),
    (0x0648, 0xFEED, 0xFEEE, 0, 0),
    (0x0649, 0xFEEF, 0xFEF0, 0, 0),
    (0x064A, 0xFEF1, 0xFEF2, 0xFEF3, 0xFEF4),
    // LAM+ALEF ligatures keep their own final forms.
    (0xFEF5, 0xFEF5, 0xFEF6, 0, 0),
    (0xFEF7, 0xFEF7, 0xFEF8, 0, 0),
    (0xFEF9, 0xFEF9, 0xFEFA, 0, 0),
    (0xFEFB, 0xFEFB, 0xFEFC, 0, 0),
];

/// `(first, followers, joined)`.
const LIGATURES: &[(char, &[char], char)] = &[
    ('\u{0644}', &['\u{0622}'], '\u{FEF5}'),
    ('\u{0644}', &['\u{0623}'], '\u{FEF7}'),
    ('\u{0644}', &['\u{0625}'], '\u{FEF9}'),
    ('\u{0644}', &['\u{0627}'], '\u{FEFB}'),
];

/// Map a `unicode-bidi` class onto the engine's subset.
pub fn bidi_type_of(class: BidiClass) -> BidiType {
    match class {
        BidiClass::L => BidiType::L,
        BidiClass::R => BidiType::R,
        BidiClass::AL => BidiType::AL,
        BidiClass::EN => BidiType::EN,
        BidiClass::ES => BidiType::ES,
        BidiClass::ET => BidiType::ET,
        BidiClass::AN => BidiType::AN,
        BidiClass::CS => BidiType::CS,
        BidiClass::NSM => BidiType::NSM,
        BidiClass::BN => BidiType::BN,
        BidiClass::B => BidiType::B,
        BidiClass::S => BidiType::S,
        BidiClass::WS => BidiType::WS,
        BidiClass::LRE => BidiType::LRE,
        BidiClass::LRO => BidiType::LRO,
        BidiClass::RLE => BidiType::RLE,
        BidiClass::RLO => BidiType::RLO,
        BidiClass::PDF => BidiType::PDF,
        // Isolates are outside the supported subset.
        BidiClass::LRI | BidiClass::RLI | BidiClass::FSI | BidiClass::PDI | BidiClass::ON => {
            BidiType::ON
        }
    }
}

/// Default [`UnicodeData`] implementation.
pub struct StaticUnicodeData {
    mirrors: FxHashMap<char, char>,
    forms: FxHashMap<char, ContextualForms>,
    ligatures: FxHashMap<char, Vec<LigatureEntry>>,
}

impl Default for StaticUnicodeData {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticUnicodeData {
    pub fn new() -> Self {
        let mut mirrors = FxHashMap::default();
        for &(open, close) in MIRROR_PAIRS {
            mirrors.insert(open, close);
            mirrors.insert(close, open);
        }

        let mut forms = FxHashMap::default();
        for &(base, isolated, fin, initial, medial) in ARABIC_FORMS {
            let Some(base) = char::from_u32(base) else {
                continue;
            };
            let form = |cp: u32| if cp == 0 { None } else { char::from_u32(cp) };
            forms.insert(
                base,
                ContextualForms {
                    isolated: form(isolated),
                    initial: form(initial),
                    medial: form(medial),
                    final_form: form(fin),
                },
            );
        }

        let mut data = Self {
            mirrors,
            forms,
            ligatures: FxHashMap::default(),
        };
        for &(first, followers, joined) in LIGATURES {
            data = data.with_ligature(first, followers, joined);
        }
        data
    }

    /// Register an extra ligature. Candidates stay sorted longest first.
    pub fn with_ligature(mut self, first: char, followers: &[char], joined: char) -> Self {
        let entries = self.ligatures.entry(first).or_default();
        entries.push(LigatureEntry {
            followers: followers.to_vec(),
            joined,
        });
        entries.sort_by(|a, b| b.followers.len().cmp(&a.followers.len()));
        self
    }
}

impl UnicodeData for StaticUnicodeData {
    fn bidi_class(&self, c: char) -> BidiType {
        bidi_type_of(unicode_bidi::bidi_class(c))
    }

    fn mirror(&self, c: char) -> Option<char> {
        self.mirrors.get(&c).copied()
    }

    fn ligatures(&self, c: char) -> &[LigatureEntry] {
        self.ligatures.get(&c).map(Vec::as_slice).unwrap_or(&[])
    }

    fn contextual_forms(&self, c: char) -> Option<ContextualForms> {
        self.forms.get(&c).copied()
    }
}

// ===================================================================
// Tests
// ===================================================================

//! Bidirectional reordering.
//!
//! Pass 1 runs on the whole logical sequence before wrapping and
//! resolves an embedding level per character. Pass 2 runs on each
//! wrapped line and puts its characters into visual order.
//!
//! This is the subset of UAX #9 needed for mixed-direction UI strings:
//! explicit embeddings and overrides, weak and neutral type resolution,
//! implicit levels, line-level reordering and mirroring. Isolates are
//! not supported and the whole text is one paragraph.

use inkline_core::{renumber, BidiType, Character};

/// Deepest explicit embedding level.
pub const MAX_DEPTH: u8 = 61;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Override {
    Neutral,
    Ltr,
    Rtl,
}

#[inline]
fn direction_of(level: u8) -> BidiType {
    if level % 2 == 1 {
        BidiType::R
    } else {
        BidiType::L
    }
}

/// Base level from the first strong character, `None` when there is none.
pub fn paragraph_level(chars: &[Character]) -> Option<u8> {
    chars.iter().find_map(|c| match c.bidi_type {
        BidiType::L => Some(0),
        BidiType::R | BidiType::AL => Some(1),
        _ => None,
    })
}

// ── Pass 1 ──────────────────────────────────────────────────────────

/// Resolve embedding levels for the logical sequence.
///
/// Explicit codes and boundary neutrals are removed and the survivors
/// renumbered. Returns the characters and the paragraph level. Text
/// without a strong character is returned untouched at level 0.
pub fn resolve_levels(mut chars: Vec<Character>) -> (Vec<Character>, u8) {
    let Some(base) = paragraph_level(&chars) else {
        return (chars, 0);
    };

    apply_explicit_levels(&mut chars, base);
    chars.retain(|c| !(c.original_type.is_explicit() || c.original_type == BidiType::BN));

    let mut start = 0;
    while start < chars.len() {
        let level = chars[start].embedding_level;
        let mut end = start + 1;
        while end < chars.len() && chars[end].embedding_level == level {
            end += 1;
        }

        let before = if start == 0 {
            base
        } else {
            chars[start - 1].embedding_level
        };
        let after = if end == chars.len() {
            base
        } else {
            chars[end].embedding_level
        };
        let sor = direction_of(before.max(level));
        let eor = direction_of(after.max(level));

        let run = &mut chars[start..end];
        resolve_weak(run, sor);
        resolve_neutral(run, sor, eor, level);
        resolve_implicit(run);
        start = end;
    }

    renumber(&mut chars);
    (chars, base)
}

/// Rules X1–X8: explicit embeddings and overrides.
fn apply_explicit_levels(chars: &mut [Character], base: u8) {
    let mut stack: Vec<(u8, Override)> = vec![(base, Override::Neutral)];
    for c in chars.iter_mut() {
        let (level, status) = stack.last().copied().unwrap_or((base, Override::Neutral));
        c.embedding_level = level;
        match c.bidi_type {
            BidiType::RLE | BidiType::RLO => {
                let next = (level + 1) | 1;
                if next <= MAX_DEPTH {
                    let status = if c.bidi_type == BidiType::RLO {
                        Override::Rtl
                    } else {
                        Override::Neutral
                    };
                    stack.push((next, status));
                }
            }
            BidiType::LRE | BidiType::LRO => {
                let next = (level + 2) & !1;
                if next <= MAX_DEPTH {
                    let status = if c.bidi_type == BidiType::LRO {
                        Override::Ltr
                    } else {
                        Override::Neutral
                    };
                    stack.push((next, status));
                }
            }
            BidiType::PDF => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            BidiType::B => {
                stack.truncate(1);
                c.embedding_level = base;
            }
            BidiType::BN => {}
            _ => match status {
                Override::Ltr => c.bidi_type = BidiType::L,
                Override::Rtl => c.bidi_type = BidiType::R,
                Override::Neutral => {}
            },
        }
    }
}

/// Rules W1–W7 over one level run.
fn resolve_weak(run: &mut [Character], sor: BidiType) {
    // W1: NSM takes the type of the previous character.
    for i in 0..run.len() {
        if run[i].bidi_type == BidiType::NSM {
            run[i].bidi_type = if i == 0 { sor } else { run[i - 1].bidi_type };
        }
    }

    // W2: EN after AL becomes AN.  W3: AL becomes R.
    let mut last_strong = sor;
    for c in run.iter_mut() {
        match c.bidi_type {
            BidiType::L | BidiType::R | BidiType::AL => last_strong = c.bidi_type,
            BidiType::EN if last_strong == BidiType::AL => c.bidi_type = BidiType::AN,
            _ => {}
        }
    }
    for c in run.iter_mut() {
        if c.bidi_type == BidiType::AL {
            c.bidi_type = BidiType::R;
        }
    }

    // W4: a single separator between two numbers of the same kind.
    for i in 1..run.len().saturating_sub(1) {
        let prev = run[i - 1].bidi_type;
        let next = run[i + 1].bidi_type;
        match run[i].bidi_type {
            BidiType::ES if prev == BidiType::EN && next == BidiType::EN => {
                run[i].bidi_type = BidiType::EN;
            }
            BidiType::CS
                if prev == next && matches!(prev, BidiType::EN | BidiType::AN) =>
            {
                run[i].bidi_type = prev;
            }
            _ => {}
        }
    }

    // W5: terminator sequences adjacent to EN become EN.
    let mut i = 0;
    while i < run.len() {
        if run[i].bidi_type != BidiType::ET {
            i += 1;
            continue;
        }
        let start = i;
        while i < run.len() && run[i].bidi_type == BidiType::ET {
            i += 1;
        }
        let touches_number = (start > 0 && run[start - 1].bidi_type == BidiType::EN)
            || (i < run.len() && run[i].bidi_type == BidiType::EN);
        if touches_number {
            for c in &mut run[start..i] {
                c.bidi_type = BidiType::EN;
            }
        }
    }

    // W6: remaining separators and terminators become ON.
    for c in run.iter_mut() {
        if matches!(c.bidi_type, BidiType::ES | BidiType::ET | BidiType::CS) {
            c.bidi_type = BidiType::ON;
        }
    }

    // W7: EN after L (or an L start of run) becomes L.
    let mut last_strong = sor;
    for c in run.iter_mut() {
        match c.bidi_type {
            BidiType::L | BidiType::R => last_strong = c.bidi_type,
            BidiType::EN if last_strong == BidiType::L => c.bidi_type = BidiType::L,
            _ => {}
        }
    }
}

/// Strong direction for neutral resolution: numbers count as R.
#[inline]
fn strong_for_neutrals(t: BidiType) -> Option<BidiType> {
    match t {
        BidiType::L => Some(BidiType::L),
        BidiType::R | BidiType::EN | BidiType::AN => Some(BidiType::R),
        _ => None,
    }
}

/// Rules N1–N2 over one level run.
fn resolve_neutral(run: &mut [Character], sor: BidiType, eor: BidiType, level: u8) {
    let embedding = direction_of(level);
    let mut i = 0;
    while i < run.len() {
        if !run[i].bidi_type.is_neutral() {
            i += 1;
            continue;
        }
        let start = i;
        while i < run.len() && run[i].bidi_type.is_neutral() {
            i += 1;
        }
        let before = if start == 0 {
            sor
        } else {
            strong_for_neutrals(run[start - 1].bidi_type).unwrap_or(embedding)
        };
        let after = if i == run.len() {
            eor
        } else {
            strong_for_neutrals(run[i].bidi_type).unwrap_or(embedding)
        };
        let resolved = if before == after { before } else { embedding };
        for c in &mut run[start..i] {
            c.bidi_type = resolved;
        }
    }
}

/// Rules I1–I2.
fn resolve_implicit(run: &mut [Character]) {
    for c in run.iter_mut() {
        let even = c.embedding_level % 2 == 0;
        match (even, c.bidi_type) {
            (true, BidiType::R) => c.embedding_level += 1,
            (true, BidiType::AN | BidiType::EN) => c.embedding_level += 2,
            (false, BidiType::L | BidiType::EN | BidiType::AN) => c.embedding_level += 1,
            _ => {}
        }
    }
}

// ── Pass 2 ──────────────────────────────────────────────────────────

/// Reorder one line into visual order (L1, L2, L4).
///
/// Display indices are left to the caller, which knows where the line
/// starts in the document.
pub fn reorder_line(line: &mut [Character], paragraph_level: u8) {
    // L1: separators, and whitespace before them or at the line end.
    let mut trailing = true;
    for c in line.iter_mut().rev() {
        match c.original_type {
            BidiType::S | BidiType::B => {
                c.embedding_level = paragraph_level;
                trailing = true;
            }
            BidiType::WS if !c.is_token() => {
                if trailing {
                    c.embedding_level = paragraph_level;
                }
            }
            _ => trailing = false,
        }
    }

    // L2: reverse from the highest level down to the lowest odd level.
    let highest = line.iter().map(|c| c.embedding_level).max().unwrap_or(0);
    let lowest_odd = line
        .iter()
        .map(|c| c.embedding_level)
        .filter(|l| l % 2 == 1)
        .min();
    if let Some(lowest_odd) = lowest_odd {
        for level in (lowest_odd..=highest).rev() {
            let mut i = 0;
            while i < line.len() {
                if line[i].embedding_level < level {
                    i += 1;
                    continue;
                }
                let start = i;
                while i < line.len() && line[i].embedding_level >= level {
                    i += 1;
                }
                line[start..i].reverse();
            }
        }
    }

    // L4: mirror glyphs displayed right to left.
    for c in line.iter_mut() {
        if c.is_rtl() && c.mirrored {
            if let Some(partner) = c.mirror_partner {
                c.codepoint = partner;
            }
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

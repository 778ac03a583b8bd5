//! Cursor/position mapping between logical offsets and `(line, x)`.
//!
//! With RTL content a logical offset next to a direction change has two
//! visual candidates. The character the caret last moved across (the
//! approach character) picks one.

use inkline_core::Character;
use serde::{Deserialize, Serialize};

use crate::engine::Line;
use crate::params::{LayoutParams, TextBackend};
use crate::segment::{Measure, Unit, UnitKind};

/// Caret location: line index and pixel x inside the layout width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: usize,
    pub x: i32,
}

pub struct CursorMapper<'a> {
    lines: &'a [Line],
    chars: &'a [Character],
    has_rtl: bool,
    params: &'a LayoutParams,
    measure: &'a Measure<'a>,
}

impl<'a> CursorMapper<'a> {
    pub fn new(
        lines: &'a [Line],
        chars: &'a [Character],
        has_rtl: bool,
        params: &'a LayoutParams,
        measure: &'a Measure<'a>,
    ) -> Self {
        Self {
            lines,
            chars,
            has_rtl,
            params,
            measure,
        }
    }

    fn margin(&self, line_width: i32) -> i32 {
        self.params
            .justification
            .margin(self.params.max_width, line_width)
    }

    /// Index of the line holding logical `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.lines
            .iter()
            .rposition(|l| l.start <= offset)
            .unwrap_or(0)
    }

    /// The caret sits on the virtual line after a trailing line break.
    fn at_paragraph_end(&self, offset: usize) -> bool {
        offset >= self.chars.len() && self.chars.last().is_some_and(Character::is_line_break)
    }

    pub fn offset_to_position(&self, offset: usize, approach: Option<&Character>) -> CursorPosition {
        let offset = offset.min(self.chars.len());
        if self.lines.is_empty() {
            return CursorPosition {
                line: 0,
                x: self.margin(0),
            };
        }
        if self.at_paragraph_end(offset) {
            return CursorPosition {
                line: self.lines.len(),
                x: self.margin(0),
            };
        }

        let index = self.line_of(offset);
        let line = &self.lines[index];
        let display = if self.has_rtl {
            self.display_offset(offset, line, approach)
        } else {
            offset
        };

        let mut x = match unit_at(line, display) {
            Some(unit) => unit.x + self.partial_width(unit, display),
            None => 0,
        };
        if offset == 0 && self.measure.backend() == TextBackend::System {
            x += self.measure.padding();
        }
        CursorPosition {
            line: index,
            x: x + self.margin(line.width()),
        }
    }

    /// Logical to display offset, resolving direction changes.
    fn display_offset(&self, offset: usize, line: &Line, approach: Option<&Character>) -> usize {
        let n = self.chars.len();
        let first = line.start;
        let last = line.start + line.len();
        let clamp = |d: usize| d.clamp(first, last);

        if offset == n {
            let left = &self.chars[n - 1];
            return clamp(if left.is_rtl() {
                left.display_index
            } else {
                left.display_index + 1
            });
        }

        let right = &self.chars[offset];
        // Line start: only the right neighbour is on this line.
        if offset == line.start {
            return clamp(if right.is_rtl() && !right.is_line_break() {
                right.display_index + 1
            } else {
                right.display_index
            });
        }

        let left = &self.chars[offset - 1];
        let approach_rtl = approach.unwrap_or(left).is_rtl();
        let d = match (left.is_rtl(), right.is_rtl()) {
            (false, false) => right.display_index,
            (true, true) => left.display_index,
            (false, true) => {
                if approach_rtl {
                    right.display_index + 1
                } else {
                    left.display_index + 1
                }
            }
            (true, false) => {
                if approach_rtl {
                    left.display_index
                } else {
                    right.display_index
                }
            }
        };
        clamp(d)
    }

    fn partial_width(&self, unit: &Unit, display: usize) -> i32 {
        let k = display.saturating_sub(unit.start);
        match unit.kind {
            UnitKind::Icon(_) | UnitKind::Keycap { .. } => {
                if k > 0 {
                    unit.width
                } else {
                    0
                }
            }
            UnitKind::Text | UnitKind::LineBreak => {
                let k = k.min(unit.len());
                self.measure
                    .chars_width(&unit.characters[..k])
                    .min(unit.width)
            }
        }
    }

    /// Pixel position to logical offset, plus the character the offset
    /// was derived through (the new approach character).
    pub fn position_to_offset(&self, line: usize, x: i32) -> (usize, Option<Character>) {
        let n = self.chars.len();
        if self.lines.is_empty() {
            return (0, None);
        }
        if line >= self.lines.len() {
            return (n, self.chars.last().cloned());
        }

        let index = line;
        let line = &self.lines[index];
        let px = x - self.margin(line.width());
        let Some(unit) = line
            .units
            .iter()
            .rev()
            .find(|u| u.x <= px)
            .or_else(|| line.units.first())
        else {
            return (line.start, None);
        };

        let mut best = 0;
        let mut best_distance = i32::MAX;
        for (k, edge) in self.boundaries(unit).into_iter().enumerate() {
            let distance = (unit.x + edge - px).abs();
            if distance < best_distance {
                best = k;
                best_distance = distance;
            }
        }

        let p = (unit.start + best).saturating_sub(line.start);
        self.boundary_to_offset(index, p)
    }

    /// Pixel offsets of each caret stop inside `unit`.
    fn boundaries(&self, unit: &Unit) -> Vec<i32> {
        if unit.is_token() {
            return vec![0, unit.width];
        }
        (0..=unit.len())
            .map(|k| {
                self.measure
                    .chars_width(&unit.characters[..k])
                    .min(unit.width)
            })
            .collect()
    }

    /// Map display boundary `p` of line `index` to a logical offset.
    ///
    /// Both neighbours are candidates, left first. A candidate is taken
    /// when mapping it forward puts the caret back on the same boundary.
    fn boundary_to_offset(&self, index: usize, p: usize) -> (usize, Option<Character>) {
        let line = &self.lines[index];
        let p = p.min(line.len());
        let left = p
            .checked_sub(1)
            .and_then(|i| line.characters.get(i))
            .map(|c| (offset_after(c), c));
        let right = line.characters.get(p).map(|c| (offset_before(c), c));

        let mut fallback = None;
        for (offset, c) in [left, right].into_iter().flatten() {
            if self.caret(offset, Some(c)) == Some((index, line.start + p)) {
                return (offset, Some(c.clone()));
            }
            fallback.get_or_insert((offset, c));
        }
        match fallback {
            Some((offset, c)) => (offset, Some(c.clone())),
            None => (line.start, None),
        }
    }

    /// Line and display offset the caret for `offset` lands on.
    fn caret(&self, offset: usize, approach: Option<&Character>) -> Option<(usize, usize)> {
        if self.lines.is_empty() || self.at_paragraph_end(offset) {
            return None;
        }
        let index = self.line_of(offset);
        let display = if self.has_rtl {
            self.display_offset(offset, &self.lines[index], approach)
        } else {
            offset
        };
        Some((index, display))
    }
}

/// Logical offset at the visual right edge of `c`.
fn offset_after(c: &Character) -> usize {
    if c.is_line_break() || c.is_rtl() {
        c.logical_index
    } else {
        c.logical_index + 1
    }
}

/// Logical offset at the visual left edge of `c`.
fn offset_before(c: &Character) -> usize {
    if c.is_rtl() && !c.is_line_break() {
        c.logical_index + 1
    } else {
        c.logical_index
    }
}

/// The unit with the greatest start not past `display`.
fn unit_at(line: &Line, display: usize) -> Option<&Unit> {
    line.units
        .iter()
        .filter(|u| u.start <= display)
        .max_by_key(|u| u.start)
        .or_else(|| line.units.first())
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LineLayout;
    use inkline_core::{FixedAdvanceMetrics, FontSpec, Justification};
    use inkline_text::{annotate, resolve_levels, StaticUnicodeData};

    struct Laid {
        lines: Vec<Line>,
        chars: Vec<Character>,
        has_rtl: bool,
    }

    fn lay(text: &str, params: &LayoutParams, measure: &Measure<'_>) -> Laid {
        let data = StaticUnicodeData::new();
        let a = annotate(text, &data);
        let (mut chars, level) = if a.has_rtl {
            resolve_levels(a.characters)
        } else {
            (a.characters, 0)
        };
        let lines = LineLayout::new(measure, params).layout(&mut chars, level, a.has_rtl);
        Laid {
            lines,
            chars,
            has_rtl: a.has_rtl,
        }
    }

    fn pos(line: usize, x: i32) -> CursorPosition {
        CursorPosition { line, x }
    }

    #[test]
    fn test_ltr_offsets() {
        let metrics = FixedAdvanceMetrics::default();
        let font = FontSpec::default();
        let params = LayoutParams::new(51);
        let m = Measure::new(&metrics, &font, params.backend);
        let laid = lay("hello world", &params, &m);
        let mapper = CursorMapper::new(&laid.lines, &laid.chars, laid.has_rtl, &params, &m);

        assert_eq!(mapper.offset_to_position(0, None), pos(0, 0));
        assert_eq!(mapper.offset_to_position(5, None), pos(0, 50));
        assert_eq!(mapper.offset_to_position(6, None), pos(1, 0));
        assert_eq!(mapper.offset_to_position(11, None), pos(1, 50));
        assert_eq!(mapper.position_to_offset(1, 24).0, 8);
        assert_eq!(mapper.position_to_offset(1, 25).0, 8, "ties go left");
        assert_eq!(mapper.position_to_offset(0, 500).0, 6);
    }

    #[test]
    fn test_empty_document() {
        let metrics = FixedAdvanceMetrics::default();
        let font = FontSpec::default();
        let params = LayoutParams {
            justification: Justification::Center,
            ..LayoutParams::new(100)
        };
        let m = Measure::new(&metrics, &font, params.backend);
        let laid = lay("", &params, &m);
        let mapper = CursorMapper::new(&laid.lines, &laid.chars, laid.has_rtl, &params, &m);
        assert_eq!(mapper.offset_to_position(0, None), pos(0, 50));
        assert_eq!(mapper.position_to_offset(0, 10), (0, None));
    }

    #[test]
    fn test_trailing_line_break() {
        let metrics = FixedAdvanceMetrics::default();
        let font = FontSpec::default();
        let params = LayoutParams::new(100);
        let m = Measure::new(&metrics, &font, params.backend);
        let laid = lay("ab\n", &params, &m);
        let mapper = CursorMapper::new(&laid.lines, &laid.chars, laid.has_rtl, &params, &m);
        assert_eq!(mapper.offset_to_position(2, None), pos(0, 20));
        assert_eq!(mapper.offset_to_position(3, None), pos(1, 0));
        assert_eq!(mapper.position_to_offset(1, 0).0, 3);
        assert_eq!(mapper.position_to_offset(0, 90).0, 2, "never after the break");
    }

    #[test]
    fn test_right_justified_margin() {
        let metrics = FixedAdvanceMetrics::default();
        let font = FontSpec::default();
        let params = LayoutParams {
            justification: Justification::Right,
            ..LayoutParams::new(100)
        };
        let m = Measure::new(&metrics, &font, params.backend);
        let laid = lay("abc", &params, &m);
        let mapper = CursorMapper::new(&laid.lines, &laid.chars, laid.has_rtl, &params, &m);
        assert_eq!(mapper.offset_to_position(0, None), pos(0, 70));
        assert_eq!(mapper.position_to_offset(0, 80).0, 1);
    }

    #[test]
    fn test_system_padding_at_start() {
        let metrics = FixedAdvanceMetrics::default().with_padding(2);
        let font = FontSpec::default();
        let params = LayoutParams {
            backend: TextBackend::System,
            ..LayoutParams::new(100)
        };
        let m = Measure::new(&metrics, &font, params.backend);
        let laid = lay("abc", &params, &m);
        let mapper = CursorMapper::new(&laid.lines, &laid.chars, laid.has_rtl, &params, &m);
        assert_eq!(mapper.offset_to_position(0, None).x, 2);
    }

    #[test]
    fn test_bidi_boundary_uses_approach() {
        let metrics = FixedAdvanceMetrics::default();
        let font = FontSpec::default();
        let params = LayoutParams::new(200);
        let m = Measure::new(&metrics, &font, params.backend);
        // Display: a b ב א
        let laid = lay("ab\u{05D0}\u{05D1}", &params, &m);
        let mapper = CursorMapper::new(&laid.lines, &laid.chars, laid.has_rtl, &params, &m);

        let from_left = mapper.offset_to_position(2, Some(&laid.chars[1]));
        let from_right = mapper.offset_to_position(2, Some(&laid.chars[2]));
        assert_eq!(from_left, pos(0, 20));
        assert_eq!(from_right, pos(0, 40), "caret sits after the RTL run's start");
        assert_eq!(mapper.offset_to_position(2, Some(&laid.chars[2])), from_right);

        // Inside the RTL run: between א (display 3) and ב (display 2).
        assert_eq!(mapper.offset_to_position(3, None), pos(0, 30));
        assert_eq!(mapper.position_to_offset(0, 30).0, 3);
    }

    #[test]
    fn test_rtl_paragraph_end() {
        let metrics = FixedAdvanceMetrics::default();
        let font = FontSpec::default();
        let params = LayoutParams::new(200);
        let m = Measure::new(&metrics, &font, params.backend);
        let laid = lay("\u{05D0}\u{05D1}", &params, &m);
        let mapper = CursorMapper::new(&laid.lines, &laid.chars, laid.has_rtl, &params, &m);
        assert_eq!(mapper.offset_to_position(0, None), pos(0, 20));
        assert_eq!(mapper.offset_to_position(2, None), pos(0, 0));
        assert_eq!(mapper.position_to_offset(0, 0).0, 2);
        assert_eq!(mapper.position_to_offset(0, 20).0, 0);
    }

    #[test]
    fn test_line_beyond_end() {
        let metrics = FixedAdvanceMetrics::default();
        let font = FontSpec::default();
        let params = LayoutParams::new(100);
        let m = Measure::new(&metrics, &font, params.backend);
        let laid = lay("abc", &params, &m);
        let mapper = CursorMapper::new(&laid.lines, &laid.chars, laid.has_rtl, &params, &m);
        assert_eq!(mapper.position_to_offset(4, 0).0, 3);
        assert_eq!(mapper.line_of(2), 0);
    }
}

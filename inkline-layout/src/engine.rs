//! Line layout: greedy wrapping of units into lines, per-line bidi
//! reordering and pixel placement.
//!
//! ```text
//! units ─► wrap (hanging spaces, hard splits) ─► reorder (RTL only)
//!                                                   │
//!                      place (x, y) ◄── merge (System backend only)
//! ```

use std::collections::VecDeque;

use inkline_core::Character;
use inkline_text::reorder_line;
use thiserror::Error;

use crate::params::{LayoutParams, TextBackend};
use crate::segment::{merge_text_units, segment, Measure, Unit, UnitKind};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout width must be positive, got {0}")]
    NonPositiveWidth(i32),
    #[error("line {line} out of range ({count} lines)")]
    LineOutOfRange { line: usize, count: usize },
}

/// One wrapped row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Line {
    /// Characters in display order (logical order for pure LTR text).
    pub characters: Vec<Character>,
    pub units: Vec<Unit>,
    /// Logical index of the line's first character.
    pub start: usize,
}

impl Line {
    fn from_units(units: Vec<Unit>) -> Self {
        let start = units
            .iter()
            .flat_map(|u| u.characters.iter())
            .map(|c| c.logical_index)
            .min()
            .unwrap_or(0);
        let characters = units
            .iter()
            .flat_map(|u| u.characters.iter().cloned())
            .collect();
        Self {
            characters,
            units,
            start,
        }
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Sum of unit widths.
    pub fn width(&self) -> i32 {
        self.units.iter().map(|u| u.width).sum()
    }

    /// Unit texts joined in display order.
    pub fn text(&self) -> String {
        self.units.iter().map(|u| u.text.as_str()).collect()
    }

    /// The line was closed by a line break.
    pub fn ends_with_break(&self) -> bool {
        self.characters.iter().any(|c| c.is_line_break())
    }
}

/// Greedy line breaking with hard-split fallback.
pub struct LineLayout<'a> {
    measure: &'a Measure<'a>,
    params: &'a LayoutParams,
}

impl<'a> LineLayout<'a> {
    pub fn new(measure: &'a Measure<'a>, params: &'a LayoutParams) -> Self {
        Self { measure, params }
    }

    pub fn max_width(&self) -> i32 {
        self.params.max_width
    }

    /// Total line spacing: font spacing plus adjustment.
    pub fn total_spacing(&self) -> i32 {
        self.measure.line_spacing() + self.params.line_spacing_adjustment
    }

    /// Lay out a flowed character list.
    ///
    /// With RTL content each line is reordered into display order, and
    /// the new display indices and levels are written back to `chars`.
    pub fn layout(&self, chars: &mut [Character], paragraph_level: u8, has_rtl: bool) -> Vec<Line> {
        let units = segment(chars, self.measure);
        let mut lines = self.wrap(units);

        for line in &mut lines {
            if has_rtl {
                self.reorder(line, chars, paragraph_level);
            }
            if self.measure.backend() == TextBackend::System {
                let units = std::mem::take(&mut line.units);
                line.units = merge_text_units(units, self.measure);
            }
        }

        self.place(&mut lines);
        lines
    }

    /// Pack units into lines.
    pub fn wrap(&self, units: Vec<Unit>) -> Vec<Line> {
        let max = self.max_width();
        let mut queue: VecDeque<Unit> = units.into();
        let mut lines = Vec::new();
        let mut current: Vec<Unit> = Vec::new();
        let mut total = 0;

        while let Some(mut unit) = queue.pop_front() {
            if total + unit.width <= max {
                total += unit.width;
                let closes = unit.ends_with_break();
                current.push(unit);
                if closes {
                    lines.push(Line::from_units(std::mem::take(&mut current)));
                    total = 0;
                }
                continue;
            }

            if !current.is_empty() {
                if unit.is_whitespace() {
                    // Trailing spaces hang in whatever room is left.
                    unit.width = max - total;
                    current.push(unit);
                } else {
                    queue.push_front(unit);
                }
                lines.push(Line::from_units(std::mem::take(&mut current)));
                total = 0;
                continue;
            }

            match self.split(&unit) {
                Some((head, tail)) => {
                    log::debug!("hard-split a {}px unit at {} chars", unit.width, head.len());
                    lines.push(Line::from_units(vec![head]));
                    queue.push_front(tail);
                }
                None => lines.push(Line::from_units(vec![unit])),
            }
        }

        if !current.is_empty() {
            lines.push(Line::from_units(current));
        }
        lines
    }

    /// Split an over-wide text unit at the longest prefix that fits,
    /// keeping at least one character. Tokens never split.
    fn split(&self, unit: &Unit) -> Option<(Unit, Unit)> {
        if unit.kind != UnitKind::Text || unit.len() < 2 {
            return None;
        }
        let max = self.max_width();
        let mut cut = 1;
        for k in (1..unit.len()).rev() {
            if self.measure.chars_width(&unit.characters[..k]) <= max {
                cut = k;
                break;
            }
        }
        let head = Unit::text_run(unit.characters[..cut].to_vec(), self.measure);
        let tail = Unit::text_run(unit.characters[cut..].to_vec(), self.measure);
        Some((head, tail))
    }

    /// Second bidi pass on one line, then re-segment the visual order.
    fn reorder(&self, line: &mut Line, chars: &mut [Character], paragraph_level: u8) {
        let mut display = std::mem::take(&mut line.characters);
        reorder_line(&mut display, paragraph_level);
        for (pos, c) in display.iter_mut().enumerate() {
            c.display_index = line.start + pos;
            if let Some(logical) = chars.get_mut(c.logical_index) {
                logical.display_index = c.display_index;
                logical.embedding_level = c.embedding_level;
            }
        }
        line.units = segment(&display, self.measure);
        line.characters = display;
        self.clamp_hanging(&mut line.units);
    }

    /// Re-measuring can bring back the width a hanging space gave up;
    /// take it out of the logically last whitespace units again.
    fn clamp_hanging(&self, units: &mut [Unit]) {
        let max = self.max_width();
        let mut excess = units.iter().map(|u| u.width).sum::<i32>() - max;
        if excess <= 0 {
            return;
        }
        let mut order: Vec<usize> = (0..units.len())
            .filter(|&i| units[i].is_whitespace())
            .collect();
        order.sort_by_key(|&i| {
            std::cmp::Reverse(
                units[i]
                    .characters
                    .iter()
                    .map(|c| c.logical_index)
                    .max()
                    .unwrap_or(0),
            )
        });
        for i in order {
            let cut = excess.min(units[i].width);
            units[i].width -= cut;
            excess -= cut;
            if excess == 0 {
                break;
            }
        }
    }

    /// Assign pixel offsets: `x` accumulates along the line, `y` steps by
    /// the total spacing per line.
    pub fn place(&self, lines: &mut [Line]) {
        let spacing = self.total_spacing();
        for (index, line) in lines.iter_mut().enumerate() {
            let y = index as i32 * spacing;
            let mut x = 0;
            for unit in &mut line.units {
                unit.x = x;
                unit.y = y;
                x += unit.width;
            }
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use inkline_core::{FixedAdvanceMetrics, FontSpec, IconRef};
    use inkline_text::{annotate, resolve_levels, IconTable, StaticUnicodeData, Substitutor};

    struct Fixture {
        metrics: FixedAdvanceMetrics,
        font: FontSpec,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                metrics: FixedAdvanceMetrics::default(),
                font: FontSpec::default(),
            }
        }

        fn lay(&self, text: &str, params: LayoutParams) -> (Vec<Line>, Vec<Character>) {
            let data = StaticUnicodeData::new();
            let icons = IconTable::new().with_button("a", IconRef(1));
            let annotated = annotate(text, &data);
            let chars = Substitutor::new(&data, &icons).run(annotated.characters);
            let (mut chars, level) = if annotated.has_rtl {
                resolve_levels(chars)
            } else {
                (chars, 0)
            };
            let measure = Measure::new(&self.metrics, &self.font, params.backend);
            let lines = LineLayout::new(&measure, &params).layout(&mut chars, level, annotated.has_rtl);
            (lines, chars)
        }
    }

    #[test]
    fn test_wrap_at_word_boundary() {
        let f = Fixture::new();
        let (lines, _) = f.lay("hello world", LayoutParams::new(51));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "hello ");
        assert_eq!(lines[0].width(), 51, "hanging space fills the rest");
        assert_eq!(lines[1].text(), "world");
        assert_eq!(lines[1].start, 6);
    }

    #[test]
    fn test_everything_fits_on_one_line() {
        let f = Fixture::new();
        let (lines, _) = f.lay("a b c", LayoutParams::new(500));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width(), 50);
    }

    #[test]
    fn test_line_break_closes_line() {
        let f = Fixture::new();
        let (lines, _) = f.lay("ab\ncd\n", LayoutParams::new(500));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "ab\n");
        assert!(lines[1].ends_with_break());
        assert_eq!(lines[1].start, 3);
    }

    #[test]
    fn test_hard_split_keeps_every_piece_in_bounds() {
        let f = Fixture::new();
        let (lines, _) = f.lay("abcdefghijklmnopqrstuvwxy", LayoutParams::new(100));
        let texts: Vec<String> = lines.iter().map(Line::text).collect();
        assert_eq!(texts, vec!["abcdefghij", "klmnopqrst", "uvwxy"]);
        assert!(lines.iter().all(|l| l.width() <= 100));
    }

    #[test]
    fn test_narrow_width_still_progresses() {
        let f = Fixture::new();
        let (lines, _) = f.lay("abc", LayoutParams::new(5));
        assert_eq!(lines.len(), 3, "one character per line");
    }

    #[test]
    fn test_token_wider_than_line_stands_alone() {
        let f = Fixture::new();
        // Button width 19 with line spacing 20.
        let (lines, _) = f.lay("x<a>y", LayoutParams::new(15));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].units.len(), 1);
        assert_eq!(lines[1].units[0].kind, UnitKind::Icon(IconRef(1)));
    }

    #[test]
    fn test_offsets_and_spacing() {
        let f = Fixture::new();
        let params = LayoutParams {
            line_spacing_adjustment: 4,
            ..LayoutParams::new(51)
        };
        let (lines, _) = f.lay("hello world", params);
        assert_eq!(lines[1].units[0].y, 24);
        let xs: Vec<i32> = lines[0].units.iter().map(|u| u.x).collect();
        assert_eq!(xs, vec![0, 50]);
    }

    #[test]
    fn test_rtl_line_is_reordered_and_written_back() {
        let f = Fixture::new();
        let (lines, chars) = f.lay("ab \u{05D0}\u{05D1}", LayoutParams::new(500));
        let line = &lines[0];
        let visual: String = line.characters.iter().map(|c| c.codepoint).collect();
        assert_eq!(visual, "ab \u{05D1}\u{05D0}");
        assert_eq!(chars[3].display_index, 4);
        assert_eq!(chars[4].display_index, 3);
        assert_eq!(line.units.last().unwrap().start, 3);
    }

    #[test]
    fn test_rtl_hanging_space_stays_clamped() {
        let f = Fixture::new();
        let (lines, _) = f.lay("\u{05D0}\u{05D1}\u{05D2} \u{05D3}\u{05D4}", LayoutParams::new(31));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].width() <= 31);
    }

    #[test]
    fn test_system_backend_merges_runs() {
        let f = Fixture::new();
        let params = LayoutParams {
            backend: TextBackend::System,
            ..LayoutParams::new(500)
        };
        let (lines, _) = f.lay("one two three", params);
        assert_eq!(lines[0].units.len(), 1);
        assert_eq!(lines[0].units[0].text, "one two three");
    }

    #[test]
    fn test_empty_text_has_no_lines() {
        let f = Fixture::new();
        let (lines, _) = f.lay("", LayoutParams::new(100));
        assert!(lines.is_empty());
    }
}

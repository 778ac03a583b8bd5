//! `TextDocument`: raw text, lazy flow and single-cursor editing.
//!
//! Every mutation only marks the document dirty. The next query runs the
//! whole pipeline (annotate, substitute, bidi, shape, lay out) once.

use std::rc::Rc;

use inkline_core::{
    Character, ContentFilter, FixedAdvanceMetrics, FontMetrics, FontSpec, IconRegistry,
    Justification, UnicodeData, ValueSource,
};
use inkline_text::{
    annotate, resolve_levels, sanitize, shape, IconTable, StaticUnicodeData, SubstitutionMode,
    Substitutor,
};

use crate::cursor::{CursorMapper, CursorPosition};
use crate::engine::{LayoutError, Line, LineLayout};
use crate::params::{checked_width, LayoutParams, TextBackend};
use crate::segment::{Measure, Unit, UnitKind};

const ELLIPSIS: &str = "...";

/// Collaborators a document calls into.
#[derive(Clone)]
pub struct TextServices {
    pub unicode: Rc<dyn UnicodeData>,
    pub metrics: Rc<dyn FontMetrics>,
    pub icons: Rc<dyn IconRegistry>,
    pub filter: Option<Rc<dyn ContentFilter>>,
    pub values: Option<Rc<dyn ValueSource>>,
}

impl TextServices {
    pub fn new(
        unicode: Rc<dyn UnicodeData>,
        metrics: Rc<dyn FontMetrics>,
        icons: Rc<dyn IconRegistry>,
    ) -> Self {
        Self {
            unicode,
            metrics,
            icons,
            filter: None,
            values: None,
        }
    }

    /// Built-in Unicode data, fixed-advance metrics and no icons.
    pub fn headless() -> Self {
        Self::new(
            Rc::new(StaticUnicodeData::new()),
            Rc::new(FixedAdvanceMetrics::default()),
            Rc::new(IconTable::new()),
        )
    }

    pub fn with_filter(mut self, filter: Rc<dyn ContentFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_values(mut self, values: Rc<dyn ValueSource>) -> Self {
        self.values = Some(values);
        self
    }
}

pub struct TextDocument {
    services: TextServices,
    font: FontSpec,
    params: LayoutParams,
    mode: SubstitutionMode,

    raw: Vec<char>,
    scrubbed: String,
    display: String,

    chars: Vec<Character>,
    lines: Vec<Line>,
    has_rtl: bool,
    paragraph_level: u8,

    cursor: usize,
    approach: Option<Character>,
    /// Raw position to re-derive the cursor from after the next flow.
    pending_raw_cursor: Option<usize>,
    dirty: bool,
}

impl TextDocument {
    pub fn new(
        services: TextServices,
        font: FontSpec,
        params: LayoutParams,
    ) -> Result<Self, LayoutError> {
        let params = params.validated()?;
        Ok(Self {
            services,
            font,
            params,
            mode: SubstitutionMode::Edit,
            raw: Vec::new(),
            scrubbed: String::new(),
            display: String::new(),
            chars: Vec::new(),
            lines: Vec::new(),
            has_rtl: false,
            paragraph_level: 0,
            cursor: 0,
            approach: None,
            pending_raw_cursor: None,
            dirty: true,
        })
    }

    // ── Text ────────────────────────────────────────────────────────

    pub fn set_raw_text(&mut self, text: &str) {
        self.raw = sanitize(text).chars().collect();
        self.approach = None;
        self.pending_raw_cursor = None;
        self.rescrub();
    }

    pub fn raw_text(&self) -> String {
        self.raw.iter().collect()
    }

    pub fn scrubbed_text(&self) -> &str {
        &self.scrubbed
    }

    /// Unit texts in display order, line by line. Tokens show their label.
    pub fn display_text(&mut self) -> &str {
        self.flow();
        &self.display
    }

    fn rescrub(&mut self) {
        let raw: String = self.raw.iter().collect();
        self.scrubbed = match self.services.filter.as_ref().and_then(|f| f.scrub(&raw)) {
            Some(scrubbed) if scrubbed.chars().count() == self.raw.len() => scrubbed,
            Some(_) => {
                log::warn!("content filter changed the text length; keeping the raw text");
                raw
            }
            None => raw,
        };
        self.dirty = true;
    }

    // ── Parameters ──────────────────────────────────────────────────

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    pub fn set_width(&mut self, width: i32) -> Result<(), LayoutError> {
        self.params.max_width = checked_width(width)?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_font(&mut self, font: FontSpec) {
        self.font = font;
        self.dirty = true;
    }

    pub fn set_justification(&mut self, justification: Justification) {
        self.params.justification = justification;
        self.dirty = true;
    }

    pub fn set_line_spacing_adjustment(&mut self, adjustment: i32) {
        self.params.line_spacing_adjustment = adjustment;
        self.dirty = true;
    }

    pub fn set_single_line(&mut self, single_line: bool) {
        self.params.single_line = single_line;
        self.dirty = true;
    }

    pub fn set_backend(&mut self, backend: TextBackend) {
        self.params.backend = backend;
        self.dirty = true;
    }

    pub fn set_mode(&mut self, mode: SubstitutionMode) {
        self.mode = mode;
        self.dirty = true;
    }

    pub fn set_value_source(&mut self, values: Option<Rc<dyn ValueSource>>) {
        self.services.values = values;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ── Flow ────────────────────────────────────────────────────────

    /// Width rules for the current font and backend.
    pub fn measure(&self) -> Measure<'_> {
        Measure::new(
            self.services.metrics.as_ref(),
            &self.font,
            self.params.backend,
        )
    }

    /// Rebuild characters and lines if anything changed since the last
    /// flow.
    pub fn flow(&mut self) {
        if !self.dirty {
            return;
        }
        let data = self.services.unicode.as_ref();
        let annotated = annotate(&self.scrubbed, data);

        let mut substitutor = Substitutor::new(data, self.services.icons.as_ref());
        if let Some(values) = self.services.values.as_deref() {
            substitutor = substitutor.with_values(values, self.mode);
        }
        let chars = substitutor.run(annotated.characters);

        // Live values may bring RTL text of their own.
        let has_rtl = chars.iter().any(|c| c.original_type.is_rtl_trigger());
        let (chars, paragraph_level) = if has_rtl {
            resolve_levels(chars)
        } else {
            (chars, 0)
        };
        let mut chars = shape(chars, data, has_rtl);

        let measure = self.measure();
        let lines = LineLayout::new(&measure, &self.params).layout(
            &mut chars,
            paragraph_level,
            has_rtl,
        );

        self.display = lines.iter().map(Line::text).collect();
        log::debug!(
            "flowed {} characters into {} lines (rtl: {has_rtl})",
            chars.len(),
            lines.len()
        );

        self.chars = chars;
        self.lines = lines;
        self.has_rtl = has_rtl;
        self.paragraph_level = paragraph_level;
        self.dirty = false;

        self.cursor = match self.pending_raw_cursor.take() {
            Some(raw) => self.offset_for_raw(raw),
            None => self.cursor.min(self.chars.len()),
        };
    }

    pub fn lines(&mut self) -> &[Line] {
        self.flow();
        &self.lines
    }

    /// Lines from the last flow, or `None` while an edit is pending.
    pub fn flowed_lines(&self) -> Option<&[Line]> {
        (!self.dirty).then_some(self.lines.as_slice())
    }

    pub fn characters(&mut self) -> &[Character] {
        self.flow();
        &self.chars
    }

    pub fn num_lines(&mut self) -> usize {
        self.flow();
        self.lines.len()
    }

    pub fn line_width(&mut self, index: usize) -> Result<i32, LayoutError> {
        self.flow();
        self.lines
            .get(index)
            .map(Line::width)
            .ok_or(LayoutError::LineOutOfRange {
                line: index,
                count: self.lines.len(),
            })
    }

    /// Font line spacing plus the adjustment.
    pub fn total_spacing(&self) -> i32 {
        self.services.metrics.line_spacing(&self.font) + self.params.line_spacing_adjustment
    }

    pub fn has_rtl(&mut self) -> bool {
        self.flow();
        self.has_rtl
    }

    pub fn paragraph_level(&mut self) -> u8 {
        self.flow();
        self.paragraph_level
    }

    // ── Cursor ──────────────────────────────────────────────────────

    fn with_mapper<R>(&self, f: impl FnOnce(&CursorMapper<'_>) -> R) -> R {
        let measure = self.measure();
        let mapper = CursorMapper::new(
            &self.lines,
            &self.chars,
            self.has_rtl,
            &self.params,
            &measure,
        );
        f(&mapper)
    }

    /// Logical offset of the first character derived from raw index `raw`
    /// or later.
    fn offset_for_raw(&self, raw: usize) -> usize {
        self.chars.partition_point(|c| c.raw_index < raw)
    }

    pub fn cursor(&mut self) -> usize {
        self.flow();
        self.cursor
    }

    pub fn approach(&self) -> Option<&Character> {
        self.approach.as_ref()
    }

    /// Move to `offset` (clamped), approaching from the previous character.
    pub fn set_cursor(&mut self, offset: usize) {
        self.flow();
        self.cursor = offset.min(self.chars.len());
        self.approach = self
            .cursor
            .checked_sub(1)
            .and_then(|i| self.chars.get(i))
            .cloned();
    }

    /// Cursor position in the raw text.
    pub fn raw_cursor_position(&mut self) -> usize {
        self.flow();
        self.raw_position_of(self.cursor)
    }

    fn raw_position_of(&self, offset: usize) -> usize {
        offset
            .checked_sub(1)
            .and_then(|i| self.chars.get(i))
            .map_or(0, Character::raw_end)
    }

    pub fn cursor_position(&mut self) -> CursorPosition {
        self.flow();
        let cursor = self.cursor;
        let approach = self.approach.as_ref();
        self.with_mapper(|m| m.offset_to_position(cursor, approach))
    }

    pub fn cursor_left(&mut self) {
        self.flow();
        if self.cursor > 0 {
            self.cursor -= 1;
            self.approach = self.chars.get(self.cursor).cloned();
        }
    }

    pub fn cursor_right(&mut self) {
        self.flow();
        if self.cursor < self.chars.len() {
            self.approach = self.chars.get(self.cursor).cloned();
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        let position = self.cursor_position();
        if position.line > 0 {
            self.move_to(position.line - 1, position.x);
        }
    }

    pub fn cursor_down(&mut self) {
        let position = self.cursor_position();
        if position.line + 1 < self.lines.len() {
            self.move_to(position.line + 1, position.x);
        } else if position.line < self.lines.len()
            && self.chars.last().is_some_and(Character::is_line_break)
        {
            self.set_cursor(self.chars.len());
        }
    }

    /// Start of the current line.
    pub fn home(&mut self) {
        self.flow();
        if self.lines.is_empty() {
            return;
        }
        let index = self.with_mapper(|m| m.line_of(self.cursor));
        let start = self.lines[index].start;
        if self.cursor < self.chars.len() || !self.ends_with_break() {
            self.set_cursor(start);
        }
    }

    /// End of the current line, before its line break.
    pub fn end(&mut self) {
        self.flow();
        if self.lines.is_empty() || (self.cursor == self.chars.len() && self.ends_with_break()) {
            return;
        }
        let index = self.with_mapper(|m| m.line_of(self.cursor));
        let line = &self.lines[index];
        let mut end = line.start + line.len();
        if line.ends_with_break() {
            end -= 1;
        }
        self.set_cursor(end);
    }

    fn ends_with_break(&self) -> bool {
        self.chars.last().is_some_and(Character::is_line_break)
    }

    fn move_to(&mut self, line: usize, x: i32) {
        let (offset, approach) = self.with_mapper(|m| m.position_to_offset(line, x));
        self.cursor = offset;
        self.approach = approach;
    }

    /// Place the cursor nearest to `x` on `line`. `line` may be one past
    /// the last line, meaning the end of the text.
    pub fn set_cursor_position(&mut self, line: usize, x: i32) -> Result<(), LayoutError> {
        self.flow();
        if line > self.lines.len() {
            log::error!("cursor line {line} out of range ({} lines)", self.lines.len());
            return Err(LayoutError::LineOutOfRange {
                line,
                count: self.lines.len(),
            });
        }
        self.move_to(line, x);
        Ok(())
    }

    /// Place the cursor nearest to a point relative to the layout origin.
    pub fn set_cursor_to_point(&mut self, x: i32, y: i32) {
        self.flow();
        let spacing = self.total_spacing().max(1);
        let last = if self.ends_with_break() {
            self.lines.len()
        } else {
            self.lines.len().saturating_sub(1)
        };
        let line = ((y.max(0) / spacing) as usize).min(last);
        self.move_to(line, x);
    }

    // ── Editing ─────────────────────────────────────────────────────

    fn edit_raw(&mut self, raw: Vec<char>, raw_cursor: usize) {
        self.raw = raw;
        self.pending_raw_cursor = Some(raw_cursor);
        self.approach = None;
        self.rescrub();
    }

    /// Insert at the cursor. In single-line mode an insertion that would
    /// wrap is undone and `false` returned.
    pub fn insert_str(&mut self, text: &str) -> bool {
        let text = sanitize(text);
        if text.is_empty() {
            return true;
        }
        let at = self.raw_cursor_position().min(self.raw.len());
        let previous = self.raw.clone();

        let inserted: Vec<char> = text.chars().collect();
        let mut raw = previous.clone();
        raw.splice(at..at, inserted.iter().copied());
        self.edit_raw(raw, at + inserted.len());

        if self.params.single_line {
            self.flow();
            if self.lines.len() > 1 || self.ends_with_break() {
                log::debug!("insertion rejected: single-line text would wrap");
                self.edit_raw(previous, at);
                return false;
            }
        }
        true
    }

    /// Insert a line break; nothing happens in single-line mode.
    pub fn enter(&mut self) -> bool {
        if self.params.single_line {
            return false;
        }
        self.insert_str("\n")
    }

    /// Remove the raw character before the cursor. A token loses its
    /// closing delimiter and falls back to markup.
    pub fn backspace(&mut self) -> bool {
        self.flow();
        let Some(previous) = self.cursor.checked_sub(1).and_then(|i| self.chars.get(i)) else {
            return false;
        };
        let index = previous.raw_end().saturating_sub(1);
        if index >= self.raw.len() {
            return false;
        }
        let mut raw = self.raw.clone();
        raw.remove(index);
        self.edit_raw(raw, index);
        true
    }

    /// Remove the raw character after the cursor.
    pub fn delete(&mut self) -> bool {
        self.flow();
        let Some(next) = self.chars.get(self.cursor) else {
            return false;
        };
        let index = next.raw_index;
        if index >= self.raw.len() {
            return false;
        }
        let mut raw = self.raw.clone();
        raw.remove(index);
        self.edit_raw(raw, index);
        true
    }

    // ── Ellipsis ────────────────────────────────────────────────────

    /// Cut the text after line `index` and end that line with "...".
    pub fn add_ellipsis_to_line(&mut self, index: usize) -> Result<(), LayoutError> {
        self.flow();
        if index >= self.lines.len() {
            return Err(LayoutError::LineOutOfRange {
                line: index,
                count: self.lines.len(),
            });
        }
        if self.has_rtl {
            log::debug!("ellipsis skipped for RTL text");
            return Ok(());
        }

        let measure = Measure::new(
            self.services.metrics.as_ref(),
            &self.font,
            self.params.backend,
        );
        let max = self.params.max_width;
        let ellipsis_width = measure.text_width(ELLIPSIS);

        self.lines.truncate(index + 1);
        let line = &mut self.lines[index];
        let y = line.units.first().map_or(0, |u| u.y);
        let mut units = std::mem::take(&mut line.units);
        loop {
            let total: i32 = units.iter().map(|u| u.width).sum();
            let Some(last) = units.last() else { break };
            let trailing_break = last.ends_with_break();
            if total + ellipsis_width <= max && !trailing_break {
                break;
            }
            let Some(last) = units.pop() else { break };
            if last.kind == UnitKind::Text && last.len() > 1 {
                let mut kept = last.characters;
                kept.pop();
                units.push(Unit::text_run(kept, &measure));
            }
        }

        let x: i32 = units.iter().map(|u| u.width).sum();
        let start = units.last().map_or(line.start, |u| u.start + u.len());
        let mut ellipsis = Unit::text_run(Vec::new(), &measure);
        ellipsis.text = ELLIPSIS.to_owned();
        ellipsis.width = ellipsis_width;
        ellipsis.start = start;
        ellipsis.x = x;
        ellipsis.y = y;

        let mut x = 0;
        for unit in &mut units {
            unit.x = x;
            unit.y = y;
            x += unit.width;
        }
        units.push(ellipsis);
        line.characters = units
            .iter()
            .flat_map(|u| u.characters.iter().cloned())
            .collect();
        line.units = units;

        self.display = self.lines.iter().map(Line::text).collect();
        self.cursor = self.cursor.min(self.chars.len());
        Ok(())
    }
}

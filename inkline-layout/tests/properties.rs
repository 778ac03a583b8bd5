//! Integration tests for document flow, layout properties and cursor
//! mapping.
//!
//! Everything runs on `FixedAdvanceMetrics` (10 px per character, 20 px
//! line spacing), so widths below are exact.

use std::rc::Rc;

use inkline_core::{FixedAdvanceMetrics, FontSpec, IconRef, Justification, TokenKind};
use inkline_layout::{
    LayoutError, LayoutParams, Line, TextBackend, TextDocument, TextServices, UnitKind,
};
use inkline_text::{IconTable, StaticUnicodeData, SubstitutionMode};

const ICON_A: IconRef = IconRef(1);
const ICON_SCORE: IconRef = IconRef(2);

fn services() -> TextServices {
    let icons = IconTable::new()
        .with_button("a", ICON_A)
        .with_button("score", ICON_SCORE)
        .with_key_overlay("arrowup", IconRef(9));
    TextServices::new(
        Rc::new(StaticUnicodeData::new()),
        Rc::new(FixedAdvanceMetrics::default()),
        Rc::new(icons),
    )
}

fn document(text: &str, width: i32) -> TextDocument {
    let mut doc =
        TextDocument::new(services(), FontSpec::default(), LayoutParams::new(width)).unwrap();
    doc.set_raw_text(text);
    doc
}

fn line_texts(doc: &mut TextDocument) -> Vec<String> {
    doc.lines().iter().map(Line::text).collect()
}

const PARAGRAPH: &str = "Press <a> to jump and [Shift] to run. The quick brown fox \
    jumps over the lazy dog, then <a> again.";

// ===================================================================
// Layout properties
// ===================================================================

#[test]
fn test_flow_is_idempotent() {
    let mut doc = document(PARAGRAPH, 120);
    let first = doc.lines().to_vec();
    let again = doc.lines().to_vec();
    assert_eq!(first, again);

    // Re-flowing with identical parameters gives the same structure.
    doc.set_width(120).unwrap();
    assert!(doc.is_dirty());
    assert_eq!(doc.lines().to_vec(), first);
}

#[test]
fn test_ltr_round_trip() {
    let text = "the quick brown fox jumps over the lazy dog";
    for width in [35, 60, 95, 170, 500] {
        let mut doc = document(text, width);
        for line in doc.lines() {
            let from_units: String = line.units.iter().map(|u| u.text.as_str()).collect();
            let from_chars: String = line.characters.iter().map(|c| c.codepoint).collect();
            assert_eq!(from_units, from_chars, "width {width}");
        }
        assert_eq!(line_texts(&mut doc).concat(), text, "width {width}");
    }
}

#[test]
fn test_width_bound() {
    // From the widest token up; narrower lines hold a lone oversized keycap.
    for width in (90..=300).step_by(7) {
        let mut doc = document(PARAGRAPH, width);
        for (i, line) in doc.lines().iter().enumerate() {
            assert!(
                line.width() <= width,
                "line {i} is {}px wide at width {width}",
                line.width()
            );
        }
    }
}

#[test]
fn test_tokens_never_split() {
    for width in (20..=300).step_by(11) {
        let mut doc = document(PARAGRAPH, width);
        let token_units: Vec<_> = doc
            .lines()
            .iter()
            .flat_map(|l| l.units.iter())
            .filter(|u| u.characters.iter().any(|c| c.is_token()))
            .cloned()
            .collect();
        assert_eq!(token_units.len(), 3, "width {width}");
        for unit in token_units {
            assert!(unit.is_token());
            assert_eq!(unit.len(), 1);
        }
    }
}

#[test]
fn test_units_reconstruct_line_characters() {
    let mut doc = document("ab \u{05D0}\u{05D1}\u{05D2} 12 cd\nnext line", 60);
    for line in doc.lines() {
        let from_units: Vec<_> = line
            .units
            .iter()
            .flat_map(|u| u.characters.iter().map(|c| c.logical_index))
            .collect();
        let from_line: Vec<_> = line.characters.iter().map(|c| c.logical_index).collect();
        assert_eq!(from_units, from_line);
    }
}

#[test]
fn test_indices_are_contiguous() {
    let mut doc = document("x <a> [Up] \u{05D0}\u{05D1} \u{202B}y\u{202C}", 500);
    let chars = doc.characters();
    for (i, c) in chars.iter().enumerate() {
        assert_eq!(c.logical_index, i);
    }
    let mut display: Vec<_> = chars.iter().map(|c| c.display_index).collect();
    display.sort_unstable();
    assert_eq!(display, (0..chars.len()).collect::<Vec<_>>());
}

// ===================================================================
// Examples
// ===================================================================

#[test]
fn test_example_wrap_hello_world() {
    let mut doc = document("hello world", 51);
    let texts = line_texts(&mut doc);
    let trimmed: Vec<&str> = texts.iter().map(|t| t.trim_end()).collect();
    assert_eq!(trimmed, vec!["hello", "world"]);
}

#[test]
fn test_example_icon_token() {
    let mut doc = document("<score>", 200);
    let lines = doc.lines().to_vec();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].units.len(), 1);
    let unit = &lines[0].units[0];
    assert_eq!(unit.kind, UnitKind::Icon(ICON_SCORE));
    assert_eq!(unit.characters[0].raw_index, 0);
    assert_eq!(unit.characters[0].raw_len, 7);
}

#[test]
fn test_example_keycap_token() {
    let mut doc = document("[A]", 200);
    let unit = doc.lines()[0].units[0].clone();
    assert_eq!(
        unit.kind,
        UnitKind::Keycap {
            secondary_icon_id: None
        }
    );
    assert_eq!(unit.text, "A");
    assert_eq!(unit.characters[0].token_kind(), Some(TokenKind::Keycap));
}

#[test]
fn test_example_mixed_direction() {
    let mut doc = document("ab\u{05D0}\u{05D1}", 200);
    let display: String = doc.lines()[0]
        .characters
        .iter()
        .map(|c| c.codepoint)
        .collect();
    assert_eq!(display, "ab\u{05D1}\u{05D0}");

    doc.set_cursor(2);
    let first = doc.cursor_position();
    for _ in 0..3 {
        assert_eq!(doc.cursor_position(), first, "repeated queries agree");
    }
    assert_eq!(first.x, 20);
}

#[test]
fn test_example_word_wider_than_line() {
    let mut doc = document("abcdefghijklmno", 100);
    let lines = doc.lines().to_vec();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text(), "abcdefghij");
    assert_eq!(lines[1].text(), "klmno");
    assert!(lines.iter().all(|l| l.width() <= 100));
}

// ===================================================================
// Cursor mapping
// ===================================================================

/// Map every offset to a position and back. At a direction change the
/// round trip may land on the other offset with the same caret.
fn assert_inverse(doc: &mut TextDocument) {
    let n = doc.characters().len();
    for offset in 0..=n {
        doc.set_cursor(offset);
        let position = doc.cursor_position();
        doc.set_cursor_position(position.line, position.x).unwrap();
        let back = doc.cursor();
        if back != offset {
            assert_eq!(
                doc.cursor_position(),
                position,
                "offset {offset} came back as {back} at a different caret"
            );
        }
    }
}

#[test]
fn test_cursor_inverse_ltr_multiline() {
    let mut doc = document("one two three four five six\nseven\n\neight", 60);
    assert!(doc.num_lines() > 3);
    let n = doc.characters().len();
    for offset in 0..=n {
        doc.set_cursor(offset);
        let position = doc.cursor_position();
        doc.set_cursor_position(position.line, position.x).unwrap();
        let back = doc.cursor();
        // A hanging space shares its caret with the next line's start.
        let same_caret = back != offset && {
            let p = doc.cursor_position();
            p == position
        };
        assert!(back == offset || same_caret, "offset {offset} came back as {back}");
    }
}

#[test]
fn test_cursor_inverse_mixed_single_line() {
    for text in [
        "ab \u{05D0}\u{05D1}",
        "\u{05D0}\u{05D1} ab",
        "x \u{05D0}\u{05D1}\u{05D2} 123 y",
        "\u{05D0} (\u{05D1}) 42",
        "go <a> \u{05D0}\u{05D1}",
    ] {
        let mut doc = document(text, 500);
        assert_inverse(&mut doc);
    }
}

#[test]
fn test_cursor_inverse_wrapped_rtl() {
    let mut doc = document(
        "\u{05D0}\u{05D1}\u{05D2} \u{05D3}\u{05D4} \u{05D5}\u{05D6}\u{05D7} ab cd",
        45,
    );
    assert!(doc.num_lines() > 2, "the text wraps");
    assert_eq!(doc.paragraph_level(), 1);
    assert_inverse(&mut doc);
}

#[test]
fn test_cursor_inverse_mixed_with_line_break() {
    let mut doc = document("ab \u{05D0}\u{05D1}\ncd", 500);
    assert_eq!(doc.num_lines(), 2);
    assert_inverse(&mut doc);

    // Before the break the caret sits where the RTL run ends visually.
    doc.set_cursor(5);
    assert_eq!(doc.cursor_position().x, 30);
}

#[test]
fn test_cursor_movement() {
    let mut doc = document("hello world", 51);
    doc.set_cursor(0);
    doc.cursor_down();
    assert_eq!(doc.cursor(), 6);
    doc.cursor_right();
    doc.cursor_up();
    assert_eq!(doc.cursor(), 1);

    doc.end();
    assert_eq!(doc.cursor(), 6);
    doc.cursor_left();
    doc.home();
    assert_eq!(doc.cursor(), 0);

    doc.set_cursor(1_000);
    assert_eq!(doc.cursor(), 11);
    doc.cursor_right();
    assert_eq!(doc.cursor(), 11);
}

#[test]
fn test_cursor_down_to_paragraph_end() {
    let mut doc = document("ab\n", 100);
    doc.set_cursor(1);
    doc.cursor_down();
    assert_eq!(doc.cursor(), 3);
    assert_eq!(doc.cursor_position().line, 1);
}

#[test]
fn test_set_cursor_to_point() {
    let mut doc = document("hello world", 51);
    doc.set_cursor_to_point(21, 25);
    assert_eq!(doc.cursor(), 8);
    doc.set_cursor_to_point(0, 10_000);
    assert_eq!(doc.cursor(), 6, "clamped to the last line");
}

#[test]
fn test_set_cursor_position_out_of_range() {
    let mut doc = document("abc", 100);
    assert_eq!(
        doc.set_cursor_position(5, 0),
        Err(LayoutError::LineOutOfRange { line: 5, count: 1 })
    );
    assert!(doc.set_cursor_position(1, 0).is_ok());
    assert_eq!(doc.cursor(), 3);
}

#[test]
fn test_centered_empty_document() {
    let mut doc = document("", 100);
    doc.set_justification(Justification::Center);
    assert_eq!(doc.cursor_position().x, 50);
    assert_eq!(doc.num_lines(), 0);
}

// ===================================================================
// Editing
// ===================================================================

#[test]
fn test_completing_markup_moves_cursor_past_token() {
    let mut doc = document("press <a", 500);
    doc.set_cursor(8);
    assert!(doc.insert_str(">"));
    assert_eq!(doc.characters().len(), 7);
    assert_eq!(doc.cursor(), 7);
    assert_eq!(doc.raw_cursor_position(), 9);
}

#[test]
fn test_backspace_opens_token() {
    let mut doc = document("x<a>", 500);
    doc.set_cursor(2);
    assert!(doc.backspace());
    assert_eq!(doc.raw_text(), "x<a");
    assert_eq!(doc.cursor(), 3);
    assert_eq!(doc.characters().len(), 3);
}

#[test]
fn test_delete_and_backspace_bounds() {
    let mut doc = document("abc", 500);
    doc.set_cursor(0);
    assert!(!doc.backspace());
    assert!(doc.delete());
    assert_eq!(doc.raw_text(), "bc");
    doc.set_cursor(2);
    assert!(!doc.delete());
    assert!(doc.backspace());
    assert_eq!(doc.raw_text(), "b");
    assert_eq!(doc.cursor(), 1);
}

#[test]
fn test_single_line_rejects_wrapping_insert() {
    let mut doc = document("abcd", 60);
    doc.set_single_line(true);
    doc.set_cursor(4);
    assert!(doc.insert_str("e"));
    assert!(!doc.insert_str(" fghij"));
    assert_eq!(doc.raw_text(), "abcde");
    assert_eq!(doc.cursor(), 5);
    assert!(!doc.enter());
    assert_eq!(doc.num_lines(), 1);
}

#[test]
fn test_enter_inserts_break() {
    let mut doc = document("ab", 100);
    doc.set_cursor(1);
    assert!(doc.enter());
    assert_eq!(doc.raw_text(), "a\nb");
    assert_eq!(doc.num_lines(), 2);
    assert_eq!(doc.cursor_position().line, 1);
}

#[test]
fn test_insert_is_sanitised() {
    let mut doc = document("", 100);
    assert!(doc.insert_str("it\u{2019}s\ta"));
    assert_eq!(doc.raw_text(), "it's a");
}

#[test]
fn test_content_filter() {
    let stars = |text: &str| Some(text.replace("darn", "****"));
    let services = services().with_filter(Rc::new(stars));
    let mut doc = TextDocument::new(services, FontSpec::default(), LayoutParams::new(500)).unwrap();
    doc.set_raw_text("oh darn");
    assert_eq!(doc.scrubbed_text(), "oh ****");
    assert_eq!(doc.display_text(), "oh ****");

    let shorter = |text: &str| Some(text.replace("darn", "*"));
    let services = TextServices::headless().with_filter(Rc::new(shorter));
    let mut doc = TextDocument::new(services, FontSpec::default(), LayoutParams::new(500)).unwrap();
    doc.set_raw_text("oh darn");
    assert_eq!(doc.scrubbed_text(), "oh darn", "length change is rejected");
}

#[test]
fn test_live_values() {
    let values = |alias: &str| (alias == "score").then(|| String::from("42"));
    let mut doc = document("score: <score>", 500);
    doc.set_value_source(Some(Rc::new(values)));
    assert_eq!(doc.display_text(), "score: score");

    doc.set_mode(SubstitutionMode::Live);
    assert_eq!(doc.display_text(), "score: 42");
}

#[test]
fn test_editing_next_to_live_value_edits_its_markup() {
    let live = |text: &str| {
        let values = |alias: &str| (alias == "score").then(|| String::from("42"));
        let mut doc = document(text, 500);
        doc.set_value_source(Some(Rc::new(values)));
        doc.set_mode(SubstitutionMode::Live);
        doc
    };

    let mut doc = live("x<score>");
    assert_eq!(doc.display_text(), "x42");
    doc.set_cursor(2);
    assert!(doc.backspace());
    assert_eq!(doc.raw_text(), "x<score", "closing delimiter removed, not the x");

    let mut doc = live("x<score>");
    doc.set_cursor(2);
    assert!(doc.delete());
    assert_eq!(doc.raw_text(), "xscore>");

    let mut doc = live("x<score>y");
    doc.set_cursor(2);
    assert_eq!(doc.raw_cursor_position(), 8, "inside a value the raw cursor is past its markup");
}

#[test]
fn test_non_positive_width() {
    assert_eq!(
        TextDocument::new(services(), FontSpec::default(), LayoutParams::new(0)).err(),
        Some(LayoutError::NonPositiveWidth(0))
    );
    let mut doc = document("abc", 100);
    assert!(doc.set_width(-1).is_err());
    assert_eq!(doc.params().max_width, 100);
}

#[test]
fn test_system_backend_merges() {
    let mut doc = document("one two <a> three", 500);
    doc.set_backend(TextBackend::System);
    let kinds: Vec<_> = doc.lines()[0].units.iter().map(|u| u.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![UnitKind::Text, UnitKind::Icon(ICON_A), UnitKind::Text]
    );
}

// ===================================================================
// Ellipsis
// ===================================================================

#[test]
fn test_ellipsis_truncates() {
    let mut doc = document("hello there world", 80);
    assert_eq!(doc.num_lines(), 3);
    doc.add_ellipsis_to_line(0).unwrap();
    let lines = doc.lines().to_vec();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text(), "hello...");
    assert!(lines[0].width() <= 80);
    assert_eq!(doc.display_text(), "hello...");
}

#[test]
fn test_ellipsis_out_of_range() {
    let mut doc = document("abc", 100);
    assert!(doc.add_ellipsis_to_line(3).is_err());
}

#[test]
fn test_ellipsis_skipped_for_rtl() {
    let mut doc = document("\u{05D0}\u{05D1}\u{05D2} \u{05D3}\u{05D4}", 35);
    let before = doc.lines().to_vec();
    doc.add_ellipsis_to_line(0).unwrap();
    assert_eq!(doc.lines().to_vec(), before);
}

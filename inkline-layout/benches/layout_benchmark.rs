use std::hint::black_box;
use std::rc::Rc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use inkline_core::{FixedAdvanceMetrics, FontSpec, IconRef};
use inkline_layout::{LayoutParams, TextDocument, TextServices};
use inkline_text::{IconTable, StaticUnicodeData};

const PARAGRAPH: &str = "Press <A> to jump and [Shift] to sprint. Collect every coin \
    before the timer runs out, then head for the exit. \u{05E9}\u{05DC}\u{05D5}\u{05DD} \
    (123) \u{0627}\u{0644}\u{0633}\u{0644}\u{0627}\u{0645} and back to English.\n";

fn services() -> TextServices {
    TextServices::new(
        Rc::new(StaticUnicodeData::new()),
        Rc::new(FixedAdvanceMetrics::default()),
        Rc::new(IconTable::new().with_button("a", IconRef(1))),
    )
}

fn document(text: &str, width: i32) -> TextDocument {
    let mut doc = TextDocument::new(services(), FontSpec::default(), LayoutParams::new(width))
        .expect("valid width");
    doc.set_raw_text(text);
    doc
}

/// Benchmark: full flow of a paragraph repeated N times
fn bench_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow_paragraphs");

    for count in [1, 10] {
        let text = PARAGRAPH.repeat(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &text, |b, text| {
            let mut doc = document(text, 320);
            b.iter(|| {
                doc.set_width(black_box(320)).expect("valid width");
                doc.num_lines()
            });
        });
    }

    group.finish();
}

/// Benchmark: map every offset to a caret position and back
fn bench_cursor_sweep(c: &mut Criterion) {
    let mut doc = document(PARAGRAPH, 320);
    let n = doc.characters().len();

    c.bench_function("cursor_sweep", |b| {
        b.iter(|| {
            for offset in 0..=n {
                doc.set_cursor(black_box(offset));
                let p = doc.cursor_position();
                let _ = doc.set_cursor_position(p.line, p.x);
            }
        });
    });
}

/// Benchmark: single character inserts (each one re-flows)
fn bench_typing(c: &mut Criterion) {
    c.bench_function("insert_and_flow", |b| {
        b.iter(|| {
            let mut doc = document("", 320);
            for ch in ["h", "e", "l", "l", "o", " ", "<", "a", ">"] {
                doc.insert_str(black_box(ch));
            }
            doc.num_lines()
        });
    });
}

criterion_group!(benches, bench_flow, bench_cursor_sweep, bench_typing);
criterion_main!(benches);

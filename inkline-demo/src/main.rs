//! Inkline demo: lays out a mixed-direction paragraph with system fonts,
//! walks the caret across it and renders one frame into memory.
//!
//! Run with `RUST_LOG=debug` (or `trace`) to see the pipeline at work.

use std::error::Error;
use std::rc::Rc;

use log::info;

use inkline_core::{FontSpec, IconRef, Justification, Point, Rgba};
use inkline_layout::{LayoutParams, TextDocument, TextServices};
use inkline_render::{collect_draw_list, CaretStyle, Shadow, TextRenderer, TextStyle};
use inkline_text::{
    IconTable, MemoryTextureStore, RasterCacheConfig, StaticUnicodeData, SubstitutionMode,
    TextEngine,
};

const SAMPLE: &str = "Press <A> to jump, [Shift] to sprint.\n\
    \u{05E9}\u{05DC}\u{05D5}\u{05DD} (42) means hello.\n\
    Coins: <coins>";

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let engine = Rc::new(TextEngine::new());
    let icons = IconTable::new()
        .with_button("a", IconRef(1))
        .with_key_overlay("arrowleft", IconRef(2));
    let services = TextServices::new(Rc::new(StaticUnicodeData::new()), engine.clone(), Rc::new(icons))
        .with_values(Rc::new(|alias: &str| (alias == "coins").then(|| "1200".to_string())));

    let mut document = TextDocument::new(services, FontSpec::default(), LayoutParams::new(360))?;
    document.set_justification(Justification::Center);
    document.set_raw_text(SAMPLE);

    info!("edit mode: {} lines", document.num_lines());
    document.set_mode(SubstitutionMode::Live);
    info!("live mode: {:?}", document.display_text());

    for (index, line) in document.lines().iter().enumerate() {
        info!(
            "line {index}: start {} width {} units {} {:?}",
            line.start,
            line.width(),
            line.units.len(),
            line.text()
        );
    }

    document.set_cursor(0);
    let end = document.characters().len();
    while document.cursor() < end {
        let position = document.cursor_position();
        log::debug!("cursor {} -> line {} x {}", document.cursor(), position.line, position.x);
        document.cursor_right();
    }
    info!("walked {end} caret stops");

    let style = TextStyle {
        shadow: Some(Shadow {
            offset: [1.0, 1.0],
            color: Rgba::BLACK,
        }),
        caret: Some(CaretStyle {
            color: Rgba::WHITE,
            width: 2.0,
        }),
        ..Default::default()
    };
    let list = collect_draw_list(&mut document, Point::new(16.0, 16.0), &style, 0, 8);

    let mut renderer = TextRenderer::new(RasterCacheConfig::default());
    let mut store = MemoryTextureStore::new();
    let frame = renderer.render(&list, engine.as_ref(), &mut store)?;
    info!(
        "frame: {} quads, {} passthrough, lookup {:?}",
        frame.stats.quad_count, frame.stats.passthrough, frame.lookup
    );

    let again = renderer.render(&list, engine.as_ref(), &mut store)?;
    info!("second frame lookup {:?}, cache {:?}", again.lookup, renderer.cache().stats());
    Ok(())
}

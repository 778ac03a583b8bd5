//! Document → draw list bridge: turns a flowed `TextDocument` into
//! positioned draw instructions for the visible lines.

use inkline_core::{FontSpec, IconRef, PixelRect, Point, Rgba};
use inkline_layout::{TextDocument, UnitKind};
use inkline_text::Outline;

/// Clip rect that never clips.
pub const UNCLIPPED: PixelRect = PixelRect::new(i32::MIN / 2, i32::MIN / 2, i32::MAX, i32::MAX);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub offset: [f32; 2],
    pub color: Rgba,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaretStyle {
    pub color: Rgba,
    pub width: f32,
}

/// How a document is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub color: Rgba,
    pub outline: Option<Outline>,
    pub shadow: Option<Shadow>,
    pub clip: Option<PixelRect>,
    pub icon_tint: Rgba,
    pub keycap_color: Rgba,
    pub keycap_label_color: Rgba,
    /// Draw the caret when set.
    pub caret: Option<CaretStyle>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Rgba::WHITE,
            outline: None,
            shadow: None,
            clip: None,
            icon_tint: Rgba::WHITE,
            keycap_color: Rgba::new(60, 60, 64, 255),
            keycap_label_color: Rgba::WHITE,
            caret: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawKind {
    /// A glyph run for the raster cache.
    Text {
        text: String,
        font: FontSpec,
        outline: Option<Outline>,
    },
    Icon(IconRef),
    /// Key face background; its label or overlay icon follows as its own
    /// instruction.
    Keycap,
    Caret,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawInstruction {
    pub kind: DrawKind,
    /// Document line the instruction belongs to.
    pub line: usize,
    pub position: Point,
    pub size: [f32; 2],
    pub color: Rgba,
    pub clip: PixelRect,
}

/// Build draw instructions for up to `max_lines` lines starting at
/// `first_line`. Line `first_line` is drawn at `origin`.
pub fn collect_draw_list(
    document: &mut TextDocument,
    origin: Point,
    style: &TextStyle,
    first_line: usize,
    max_lines: usize,
) -> Vec<DrawInstruction> {
    document.flow();
    let caret = style.caret.map(|c| (c, document.cursor_position()));

    let document: &TextDocument = document;
    let Some(lines) = document.flowed_lines() else {
        return Vec::new();
    };
    let measure = document.measure();
    let params = document.params();
    let spacing = document.total_spacing();
    let line_height = measure.line_spacing();
    let clip = style.clip.unwrap_or(UNCLIPPED);
    let visible = first_line..first_line.saturating_add(max_lines);

    let mut list = Vec::new();
    for index in visible.clone() {
        let Some(line) = lines.get(index) else { break };
        let margin = params.justification.margin(params.max_width, line.width());
        let top = origin.y + ((index - first_line) as i32 * spacing) as f32;

        for unit in &line.units {
            let left = origin.x + (margin + unit.x) as f32;
            match &unit.kind {
                UnitKind::Text => {
                    let text: String = unit.text.chars().filter(|&c| c != '\n').collect();
                    if text.trim().is_empty() {
                        continue;
                    }
                    let size = [unit.width as f32, line_height as f32];
                    if let Some(shadow) = style.shadow {
                        list.push(DrawInstruction {
                            kind: DrawKind::Text {
                                text: text.clone(),
                                font: measure.font().clone(),
                                outline: None,
                            },
                            line: index,
                            position: Point::new(left + shadow.offset[0], top + shadow.offset[1]),
                            size,
                            color: shadow.color,
                            clip,
                        });
                    }
                    list.push(DrawInstruction {
                        kind: DrawKind::Text {
                            text,
                            font: measure.font().clone(),
                            outline: style.outline,
                        },
                        line: index,
                        position: Point::new(left, top),
                        size,
                        color: style.color,
                        clip,
                    });
                }
                UnitKind::LineBreak => {}
                UnitKind::Icon(icon) => {
                    let side = measure.button_size();
                    list.push(DrawInstruction {
                        kind: DrawKind::Icon(*icon),
                        line: index,
                        position: Point::new(
                            left + (unit.width as f32 - side) / 2.0,
                            top + (line_height as f32 - side) / 2.0,
                        ),
                        size: [side, side],
                        color: style.icon_tint,
                        clip,
                    });
                }
                UnitKind::Keycap { secondary_icon_id } => {
                    list.push(DrawInstruction {
                        kind: DrawKind::Keycap,
                        line: index,
                        position: Point::new(left, top),
                        size: [unit.width as f32, line_height as f32],
                        color: style.keycap_color,
                        clip,
                    });
                    match secondary_icon_id {
                        Some(icon) => {
                            let side = measure.button_width() as f32;
                            list.push(DrawInstruction {
                                kind: DrawKind::Icon(*icon),
                                line: index,
                                position: Point::new(
                                    left + (unit.width as f32 - side) / 2.0,
                                    top + (line_height as f32 - side) / 2.0,
                                ),
                                size: [side, side],
                                color: style.icon_tint,
                                clip,
                            });
                        }
                        None => {
                            let width = measure.keycap_label_width(&unit.text) as f32;
                            let height = line_height as f32 * 0.75;
                            list.push(DrawInstruction {
                                kind: DrawKind::Text {
                                    text: unit.text.clone(),
                                    font: measure.keycap_font().clone(),
                                    outline: None,
                                },
                                line: index,
                                position: Point::new(
                                    left + (unit.width as f32 - width) / 2.0,
                                    top + (line_height as f32 - height) / 2.0,
                                ),
                                size: [width, height],
                                color: style.keycap_label_color,
                                clip,
                            });
                        }
                    }
                }
            }
        }
    }

    if let Some((caret, position)) = caret {
        if visible.contains(&position.line) {
            list.push(DrawInstruction {
                kind: DrawKind::Caret,
                line: position.line,
                position: Point::new(
                    origin.x + position.x as f32,
                    origin.y + ((position.line - first_line) as i32 * spacing) as f32,
                ),
                size: [caret.width, line_height as f32],
                color: caret.color,
                clip,
            });
        }
    }

    log::trace!("collected {} draw instructions", list.len());
    list
}

// ===================================================================
// Tests
// ===================================================================

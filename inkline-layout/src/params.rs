//! Layout parameters.

use inkline_core::Justification;
use serde::{Deserialize, Serialize};

use crate::engine::LayoutError;

/// Widest layout the engine accepts; larger widths are clamped.
pub const MAX_LAYOUT_WIDTH: i32 = 2048;

/// Which text backend will draw the result. The system backend merges
/// adjacent plain runs and reports widths with its side bearing padding
/// removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextBackend {
    #[default]
    Sprite,
    System,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub max_width: i32,
    pub justification: Justification,
    /// Extra pixels added to the font's line spacing.
    pub line_spacing_adjustment: i32,
    /// Reject edits that would wrap onto a second line.
    pub single_line: bool,
    pub backend: TextBackend,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            max_width: 512,
            justification: Justification::Left,
            line_spacing_adjustment: 0,
            single_line: false,
            backend: TextBackend::Sprite,
        }
    }
}

impl LayoutParams {
    pub fn new(max_width: i32) -> Self {
        Self {
            max_width,
            ..Default::default()
        }
    }

    /// Check the width and clamp it to [`MAX_LAYOUT_WIDTH`].
    pub fn validated(mut self) -> Result<Self, LayoutError> {
        self.max_width = checked_width(self.max_width)?;
        Ok(self)
    }
}

pub(crate) fn checked_width(width: i32) -> Result<i32, LayoutError> {
    if width <= 0 {
        log::error!("layout width must be positive, got {width}");
        return Err(LayoutError::NonPositiveWidth(width));
    }
    Ok(width.min(MAX_LAYOUT_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_is_clamped() {
        let p = LayoutParams::new(10_000).validated().unwrap();
        assert_eq!(p.max_width, MAX_LAYOUT_WIDTH);
    }

    #[test]
    fn test_non_positive_width_rejected() {
        assert_eq!(
            LayoutParams::new(0).validated(),
            Err(LayoutError::NonPositiveWidth(0))
        );
        assert!(LayoutParams::new(-5).validated().is_err());
    }

    #[test]
    fn test_params_serde_roundtrip() {
        let p = LayoutParams {
            justification: Justification::Center,
            backend: TextBackend::System,
            ..LayoutParams::new(300)
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: LayoutParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}

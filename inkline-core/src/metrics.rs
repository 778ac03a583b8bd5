//! Deterministic metrics for headless hosts and tests.

use crate::providers::FontMetrics;
use crate::FontSpec;

/// Every character advances by the same number of pixels, whatever the
/// font. Line breaks have no width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedAdvanceMetrics {
    pub advance: i32,
    pub line_spacing: i32,
    pub padding: i32,
}

impl Default for FixedAdvanceMetrics {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

impl FixedAdvanceMetrics {
    pub fn new(advance: i32, line_spacing: i32) -> Self {
        Self {
            advance,
            line_spacing,
            padding: 0,
        }
    }

    pub fn with_padding(mut self, padding: i32) -> Self {
        self.padding = padding;
        self
    }
}

impl FontMetrics for FixedAdvanceMetrics {
    fn measure(&self, text: &str, _font: &FontSpec) -> i32 {
        let count = text.chars().filter(|&c| c != '\n').count() as i32;
        count * self.advance
    }

    fn line_spacing(&self, _font: &FontSpec) -> i32 {
        self.line_spacing
    }

    fn padding(&self, _font: &FontSpec) -> i32 {
        self.padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_advance_ignores_breaks() {
        let m = FixedAdvanceMetrics::new(7, 12);
        let font = FontSpec::default();
        assert_eq!(m.measure("abc\n", &font), 21);
        assert_eq!(m.measure("", &font), 0);
        assert_eq!(m.line_spacing(&font), 12);
        assert_eq!(m.with_padding(2).padding(&font), 2);
    }
}

// src/canvas/gc.rs

use crate::color::{Color16, Rgba};
use log::{debug, trace};

/// Drawing state passed to every primitive: colors and stroke width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsContext {
    foreground: Rgba,
    background: Rgba,
    line_width: u32,
}

impl Default for GraphicsContext {
    fn default() -> Self {
        Self {
            foreground: Rgba::TRANSPARENT,
            background: Rgba::TRANSPARENT,
            line_width: 1,
        }
    }
}

impl GraphicsContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn foreground(&self) -> Rgba {
        self.foreground
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn line_width(&self) -> u32 {
        self.line_width
    }

    pub fn set_foreground(&mut self, color: Color16) {
        trace!("GraphicsContext: set_foreground {:?}", color);
        self.foreground = color.to_rgba();
    }

    pub fn set_background(&mut self, color: Color16) {
        trace!("GraphicsContext: set_background {:?}", color);
        self.background = color.to_rgba();
    }

    /// Widths below 1 are stored as 1.
    pub fn set_line_width(&mut self, width: u32) {
        trace!("GraphicsContext: set_line_width {}", width);
        self.line_width = width.max(1);
    }

    /// Dash patterns are accepted and ignored; every stroke is solid.
    pub fn set_dashes(&mut self, width: u32, offset: i32, dash_list: &[u8]) {
        debug!(
            "GraphicsContext: ignoring dash pattern (width={}, offset={}, {} entries)",
            width,
            offset,
            dash_list.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_defaults_to_line_width_one() {
        assert_eq!(GraphicsContext::new().line_width(), 1);
    }

    #[test_log::test]
    fn test_colors_are_truncated_to_eight_bits() {
        let mut gc = GraphicsContext::new();
        gc.set_foreground(Color16::new(0xffff, 0x8000, 0x00ff, 0x0100));
        gc.set_background(Color16::new(0x0100, 0x01ff, 0xfeff, 0));
        assert_eq!(gc.foreground(), Rgba::new(255, 128, 0, 1));
        assert_eq!(gc.background(), Rgba::new(1, 1, 254, 0));
    }

    #[test_log::test]
    fn test_dashes_do_not_change_state() {
        let mut gc = GraphicsContext::new();
        gc.set_line_width(3);
        let before = gc.clone();
        gc.set_dashes(3, 0, &[4, 2]);
        assert_eq!(gc, before);
    }
}

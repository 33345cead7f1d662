//! Color palettes.

use peniko::Color;

/// Colors used to draw a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub grid: Color,
    pub node_fill: Color,
    pub component_fill: Color,
    pub interface_fill: Color,
    pub node_stroke: Color,
    pub text: Color,
    pub edge: Color,
    pub selection: Color,
    pub hover: Color,
    pub import_port: Color,
    pub export_port: Color,
    pub port_highlight: Color,
    pub preview: Color,
    pub tooltip_background: Color,
    pub tooltip_text: Color,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            background: Color::from_rgba8(250, 250, 250, 255),
            grid: Color::from_rgba8(200, 200, 200, 100),
            node_fill: Color::from_rgba8(255, 255, 255, 255),
            component_fill: Color::from_rgba8(239, 246, 255, 255),
            interface_fill: Color::from_rgba8(240, 253, 244, 255),
            node_stroke: Color::from_rgba8(75, 85, 99, 255),
            text: Color::from_rgba8(17, 24, 39, 255),
            edge: Color::from_rgba8(107, 114, 128, 255),
            selection: Color::from_rgba8(59, 130, 246, 255), // Blue
            hover: Color::from_rgba8(147, 197, 253, 255),
            import_port: Color::from_rgba8(16, 185, 129, 255),
            export_port: Color::from_rgba8(249, 115, 22, 255),
            port_highlight: Color::from_rgba8(234, 179, 8, 255),
            preview: Color::from_rgba8(59, 130, 246, 180),
            tooltip_background: Color::from_rgba8(31, 41, 55, 230),
            tooltip_text: Color::from_rgba8(255, 255, 255, 255),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::from_rgba8(24, 24, 27, 255),
            grid: Color::from_rgba8(63, 63, 70, 120),
            node_fill: Color::from_rgba8(39, 39, 42, 255),
            component_fill: Color::from_rgba8(30, 41, 59, 255),
            interface_fill: Color::from_rgba8(20, 45, 35, 255),
            node_stroke: Color::from_rgba8(161, 161, 170, 255),
            text: Color::from_rgba8(244, 244, 245, 255),
            edge: Color::from_rgba8(161, 161, 170, 255),
            selection: Color::from_rgba8(96, 165, 250, 255),
            hover: Color::from_rgba8(59, 130, 246, 160),
            import_port: Color::from_rgba8(52, 211, 153, 255),
            export_port: Color::from_rgba8(251, 146, 60, 255),
            port_highlight: Color::from_rgba8(250, 204, 21, 255),
            preview: Color::from_rgba8(96, 165, 250, 180),
            tooltip_background: Color::from_rgba8(244, 244, 245, 235),
            tooltip_text: Color::from_rgba8(24, 24, 27, 255),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

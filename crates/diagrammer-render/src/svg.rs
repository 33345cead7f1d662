//! SVG backend for snapshots and debugging.

use crate::renderer::{RenderResult, Renderer, RendererError};
use crate::scene::{DrawCommand, Scene, TextAnchor};
use peniko::Color;
use std::fmt::Write as _;
use std::path::Path;

/// Serializes each frame to an SVG document and keeps the latest one.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    document: Option<String>,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent frame, if any.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Write the most recent frame to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let document = self
            .document
            .as_deref()
            .ok_or_else(|| RendererError::RenderFailed("no frame rendered yet".into()))?;
        std::fs::write(path.as_ref(), document)?;
        log::info!("Wrote SVG frame to {}", path.as_ref().display());
        Ok(())
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, scene: &Scene) -> RenderResult<()> {
        let document = scene_to_svg(scene)
            .map_err(|e| RendererError::RenderFailed(format!("SVG formatting: {e}")))?;
        self.document = Some(document);
        Ok(())
    }
}

/// Serialize a scene as a standalone SVG document.
pub fn scene_to_svg(scene: &Scene) -> Result<String, std::fmt::Error> {
    let (width, height) = (scene.size.width, scene.size.height);
    let mut svg = String::new();
    writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    )?;
    writeln!(
        svg,
        "  <rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        svg_color(scene.background)
    )?;

    for command in &scene.commands {
        match command {
            DrawCommand::Fill { path, color } => {
                writeln!(
                    svg,
                    "  <path d=\"{}\" fill=\"{}\"/>",
                    path.to_svg(),
                    svg_color(*color)
                )?;
            }
            DrawCommand::Stroke {
                path,
                color,
                width,
                dashed,
            } => {
                let dash = if *dashed {
                    format!(" stroke-dasharray=\"{} {}\"", width * 3.0, width * 2.0)
                } else {
                    String::new()
                };
                writeln!(
                    svg,
                    "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\"{dash}/>",
                    path.to_svg(),
                    svg_color(*color)
                )?;
            }
            DrawCommand::Text {
                position,
                text,
                size,
                color,
                anchor,
            } => {
                let anchor = match anchor {
                    TextAnchor::Start => "start",
                    TextAnchor::Middle => "middle",
                    TextAnchor::End => "end",
                };
                writeln!(
                    svg,
                    "  <text x=\"{:.2}\" y=\"{:.2}\" font-family=\"sans-serif\" font-size=\"{size:.1}\" text-anchor=\"{anchor}\" fill=\"{}\">{}</text>",
                    position.x,
                    position.y,
                    svg_color(*color),
                    escape_xml(text)
                )?;
            }
        }
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn svg_color(color: Color) -> String {
    let c = color.to_rgba8();
    if c.a == 255 {
        format!("#{:02X}{:02X}{:02X}", c.r, c.g, c.b)
    } else {
        format!("rgba({}, {}, {}, {:.3})", c.r, c.g, c.b, f64::from(c.a) / 255.0)
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{GridStyle, RenderContext};
    use diagrammer_core::{Bounds, DiagramCanvas, DiagramModel, Node};

    fn canvas() -> DiagramCanvas {
        let mut model = DiagramModel::new("workflow");
        model.add_element(
            Node::new("task", Bounds::new(10.0, 10.0, 100.0, 60.0))
                .with_id("a")
                .with_label("Fetch <data> & parse"),
        );
        let mut canvas = DiagramCanvas::default();
        canvas.set_diagram(model);
        canvas
    }

    #[test]
    fn test_colors() {
        assert_eq!(svg_color(Color::from_rgba8(255, 0, 16, 255)), "#FF0010");
        assert_eq!(
            svg_color(Color::from_rgba8(0, 0, 0, 51)),
            "rgba(0, 0, 0, 0.200)"
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_xml("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn test_render_document() {
        let canvas = canvas();
        let scene = Scene::build(&RenderContext::new(&canvas).with_grid(GridStyle::None));
        let mut renderer = SvgRenderer::new();
        assert!(renderer.document().is_none());
        renderer.render(&scene).unwrap();

        let doc = renderer.document().unwrap();
        assert!(doc.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"800\" height=\"600\""));
        assert!(doc.contains("Fetch &lt;data&gt; &amp; parse"));
        assert!(doc.trim_end().ends_with("</svg>"));
        // Node fill and outline; the background is a rect.
        assert_eq!(doc.matches("<path").count(), 2);
    }

    #[test]
    fn test_dashed_preview() {
        let mut canvas = canvas();
        canvas.set_interaction_mode("create-edge");
        canvas.handle_pointer(diagrammer_core::PointerEvent::Click {
            position: kurbo::Point::new(50.0, 40.0),
            button: diagrammer_core::MouseButton::Left,
        });
        canvas.handle_pointer(diagrammer_core::PointerEvent::Move {
            position: kurbo::Point::new(300.0, 300.0),
        });
        let scene = Scene::build(&RenderContext::new(&canvas).with_grid(GridStyle::None));
        let doc = scene_to_svg(&scene).unwrap();
        assert!(doc.contains("stroke-dasharray=\"6 4\""));
    }

    #[test]
    fn test_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.svg");
        let mut renderer = SvgRenderer::new();
        assert!(renderer.save(&path).is_err());

        let canvas = canvas();
        renderer
            .render(&Scene::build(&RenderContext::new(&canvas)))
            .unwrap();
        renderer.save(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(Some(written.as_str()), renderer.document());
    }
}

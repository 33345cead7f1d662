//! Display list construction.
//!
//! [`Scene::build`] turns the current canvas state into a flat list of draw
//! commands in screen space. It reads state and nothing else, so the same
//! state always yields the same scene.

use crate::renderer::{GridStyle, RenderContext, Tooltip};
use diagrammer_core::geometry::midpoint;
use diagrammer_core::routing::clip_to_rect;
use diagrammer_core::{
    DiagramModel, Edge, Node, NodeProperties, PortLayout, PortRef, PortSide, arrowhead, route,
};
use kurbo::{Affine, BezPath, Circle, Point, Rect, RoundedRect, Shape, Size, Vec2};
use peniko::Color;

/// World units between grid lines.
pub const GRID_SIZE: f64 = 20.0;
/// Grid is skipped when lines would be closer than this on screen.
const MIN_GRID_SPACING_PX: f64 = 6.0;
const NODE_CORNER_RADIUS: f64 = 6.0;
const ARROW_SIZE_PX: f64 = 10.0;
const PORT_DRAW_RADIUS_PX: f64 = 6.0;
const LABEL_SIZE: f64 = 13.0;
const PORT_LABEL_SIZE: f64 = 11.0;

/// Horizontal text alignment relative to the text position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

/// One drawing operation. Paths are in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill {
        path: BezPath,
        color: Color,
    },
    Stroke {
        path: BezPath,
        color: Color,
        width: f64,
        dashed: bool,
    },
    Text {
        position: Point,
        text: String,
        size: f64,
        color: Color,
        anchor: TextAnchor,
    },
}

/// A complete frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub size: Size,
    pub background: Color,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    /// Build the display list for the canvas state in `ctx`.
    pub fn build(ctx: &RenderContext) -> Scene {
        let canvas = ctx.canvas;
        let viewport = canvas.viewport();
        let size = Size::new(
            viewport.size.width * ctx.scale_factor,
            viewport.size.height * ctx.scale_factor,
        );
        let mut builder = SceneBuilder {
            ctx,
            transform: Affine::scale(ctx.scale_factor) * viewport.transform(),
            scale: viewport.scale(),
            commands: Vec::new(),
        };

        builder.render_grid(size);
        if let Some(model) = canvas.model() {
            for edge in model.edges() {
                builder.render_edge(model, edge);
            }
            // Reverse order so the node that wins hit testing is drawn on top.
            let nodes: Vec<&Node> = model.nodes().collect();
            for node in nodes.into_iter().rev() {
                builder.render_node(node);
            }
        }
        builder.render_previews();
        if let Some(tooltip) = &ctx.tooltip {
            builder.render_tooltip(tooltip);
        }

        Scene {
            size,
            background: ctx.theme.background,
            commands: builder.commands,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All text runs in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn dashed_strokes(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { dashed: true, .. }))
            .count()
    }
}

struct SceneBuilder<'a> {
    ctx: &'a RenderContext<'a>,
    /// World to device pixels.
    transform: Affine,
    /// Viewport zoom, without the device scale factor.
    scale: f64,
    commands: Vec<DrawCommand>,
}

impl SceneBuilder<'_> {
    fn fill(&mut self, mut path: BezPath, color: Color) {
        path.apply_affine(self.transform);
        self.commands.push(DrawCommand::Fill { path, color });
    }

    fn stroke(&mut self, mut path: BezPath, color: Color, width: f64, dashed: bool) {
        path.apply_affine(self.transform);
        self.commands.push(DrawCommand::Stroke {
            path,
            color,
            width: width * self.ctx.scale_factor,
            dashed,
        });
    }

    fn text(&mut self, world: Point, text: String, size: f64, color: Color, anchor: TextAnchor) {
        self.commands.push(DrawCommand::Text {
            position: self.transform * world,
            text,
            size: size * self.scale * self.ctx.scale_factor,
            color,
            anchor,
        });
    }

    /// Stroke color and width for an element given selection and hover.
    fn highlight(&self, id: &str, base: Color, base_width: f64) -> (Color, f64) {
        let canvas = self.ctx.canvas;
        if canvas.is_selected(id) {
            (self.ctx.theme.selection, base_width + 1.0)
        } else if canvas.selection().hovered.as_deref() == Some(id) {
            (self.ctx.theme.hover, base_width + 0.5)
        } else {
            (base, base_width)
        }
    }

    fn render_grid(&mut self, size: Size) {
        if self.ctx.grid_style == GridStyle::None || GRID_SIZE * self.scale < MIN_GRID_SPACING_PX {
            return;
        }
        let inv = self.transform.inverse();
        let world_tl = inv * Point::ZERO;
        let world_br = inv * Point::new(size.width, size.height);
        let start_x = (world_tl.x / GRID_SIZE).floor() * GRID_SIZE;
        let start_y = (world_tl.y / GRID_SIZE).floor() * GRID_SIZE;
        let end_x = (world_br.x / GRID_SIZE).ceil() * GRID_SIZE;
        let end_y = (world_br.y / GRID_SIZE).ceil() * GRID_SIZE;

        // Batch the whole grid into a single path.
        let mut path = BezPath::new();
        match self.ctx.grid_style {
            GridStyle::None => return,
            GridStyle::Lines => {
                let mut x = start_x;
                while x <= end_x {
                    path.move_to(Point::new(x, start_y));
                    path.line_to(Point::new(x, end_y));
                    x += GRID_SIZE;
                }
                let mut y = start_y;
                while y <= end_y {
                    path.move_to(Point::new(start_x, y));
                    path.line_to(Point::new(end_x, y));
                    y += GRID_SIZE;
                }
                self.stroke(path, self.ctx.theme.grid, 0.5, false);
            }
            GridStyle::Dots => {
                let dot = 1.5 / self.scale;
                let mut x = start_x;
                while x <= end_x {
                    let mut y = start_y;
                    while y <= end_y {
                        let rect = Rect::new(x - dot, y - dot, x + dot, y + dot);
                        path.extend(rect.path_elements(0.1));
                        y += GRID_SIZE;
                    }
                    x += GRID_SIZE;
                }
                self.fill(path, self.ctx.theme.grid);
            }
        }
    }

    fn render_edge(&mut self, model: &DiagramModel, edge: &Edge) {
        let Some((source, target)) = model.edge_endpoints(edge) else {
            log::trace!("Skipping dangling edge {}", edge.id);
            return;
        };
        let style = edge
            .routing_style
            .unwrap_or(self.ctx.canvas.config().edge_style);
        let routed = route(source, target, &edge.routing_points, style);
        let (color, width) = self.highlight(&edge.id, self.ctx.theme.edge, 2.0);
        self.stroke(routed.path, color, width, false);

        // Stop the arrow at the target's border; the node is drawn on top.
        let tip = model
            .node(&edge.target_id)
            .and_then(|n| n.bounds)
            .map_or(target, |b| clip_to_rect(target, routed.approach, b.to_rect()));
        if let Some(head) = arrowhead(tip, routed.approach, ARROW_SIZE_PX / self.scale) {
            self.fill(head, color);
        }

        if let Some(label) = &edge.label {
            let at = match edge.routing_points.as_slice() {
                [] => midpoint(source, target),
                points => points[points.len() / 2],
            };
            self.text(
                at + Vec2::new(0.0, -6.0),
                label.clone(),
                LABEL_SIZE,
                self.ctx.theme.text,
                TextAnchor::Middle,
            );
        }
    }

    fn render_node(&mut self, node: &Node) {
        let Some(bounds) = node.bounds else {
            return;
        };
        let theme = self.ctx.theme;
        let rect = bounds.to_rect();
        let fill = match &node.properties {
            NodeProperties::Component(_) => theme.component_fill,
            NodeProperties::WitInterface(_) => theme.interface_fill,
            NodeProperties::Basic => theme.node_fill,
        };
        let outline = RoundedRect::from_rect(rect, NODE_CORNER_RADIUS).to_path(0.1);
        self.fill(outline.clone(), fill);
        let (color, width) = self.highlight(&node.id, theme.node_stroke, 1.5);
        self.stroke(outline, color, width, false);

        let title = node
            .label
            .clone()
            .or_else(|| node.component().and_then(|c| c.component_name.clone()))
            .unwrap_or_else(|| node.element_type.clone());
        self.text(
            Point::new(rect.x0 + 8.0, rect.y0 + 18.0),
            title,
            LABEL_SIZE,
            theme.text,
            TextAnchor::Start,
        );

        if let NodeProperties::WitInterface(wit) = &node.properties {
            let count = wit.functions.len();
            self.text(
                Point::new(rect.x0 + 8.0, rect.y0 + 34.0),
                format!("{count} functions"),
                PORT_LABEL_SIZE,
                theme.text,
                TextAnchor::Start,
            );
        }

        if node.component().is_some() {
            self.render_ports(node, rect);
        }
    }

    fn render_ports(&mut self, node: &Node, rect: Rect) {
        let canvas = self.ctx.canvas;
        let theme = self.ctx.theme;
        let layout = PortLayout::from_config(canvas.config());

        // Header rule above the first port.
        let header_y = rect.y0 + layout.header_offset / 2.0 + 4.0;
        let mut rule = BezPath::new();
        rule.move_to(Point::new(rect.x0, header_y));
        rule.line_to(Point::new(rect.x1, header_y));
        self.stroke(rule, theme.node_stroke, 0.5, false);

        let pending = canvas.modes().interface_source();
        for port in layout.ports(node) {
            let port_ref: PortRef = port.port_ref();
            let active = canvas.hovered_port() == Some(&port_ref)
                || pending.is_some_and(|src| src.same_port(&port.to_link_source()));
            let color = if active {
                theme.port_highlight
            } else {
                match port.side {
                    PortSide::Import => theme.import_port,
                    PortSide::Export => theme.export_port,
                }
            };
            let circle = Circle::new(port.position, PORT_DRAW_RADIUS_PX / self.scale).to_path(0.1);
            self.fill(circle.clone(), color);
            self.stroke(circle, theme.node_stroke, 1.0, false);

            let (offset, anchor) = match port.side {
                PortSide::Import => (10.0, TextAnchor::Start),
                PortSide::Export => (-10.0, TextAnchor::End),
            };
            self.text(
                port.position + Vec2::new(offset, 4.0),
                port.interface.name.clone(),
                PORT_LABEL_SIZE,
                theme.text,
                anchor,
            );
        }
    }

    fn render_previews(&mut self) {
        let canvas = self.ctx.canvas;
        let previews = [canvas.edge_preview(), canvas.interface_preview()];
        for (from, to) in previews.into_iter().flatten() {
            let mut path = BezPath::new();
            path.move_to(from);
            path.line_to(to);
            self.stroke(path, self.ctx.theme.preview, 2.0, true);
        }
    }

    /// Tooltips are anchored in logical screen space.
    fn render_tooltip(&mut self, tooltip: &Tooltip) {
        let theme = self.ctx.theme;
        let device = Affine::scale(self.ctx.scale_factor);
        let width = tooltip.text.chars().count() as f64 * 7.0 + 12.0;
        let rect = Rect::from_origin_size(tooltip.anchor, (width, 22.0));
        let mut path = RoundedRect::from_rect(rect, 4.0).to_path(0.1);
        path.apply_affine(device);
        self.commands.push(DrawCommand::Fill {
            path,
            color: theme.tooltip_background,
        });
        self.commands.push(DrawCommand::Text {
            position: device * (tooltip.anchor + Vec2::new(6.0, 15.0)),
            text: tooltip.text.clone(),
            size: 12.0 * self.ctx.scale_factor,
            color: theme.tooltip_text,
            anchor: TextAnchor::Start,
        });
    }
}

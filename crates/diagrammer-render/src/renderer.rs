//! Render context and the backend trait.

use crate::scene::Scene;
use crate::theme::Theme;
use diagrammer_core::DiagramCanvas;
use kurbo::Point;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    /// No grid.
    None,
    /// Full grid lines.
    #[default]
    Lines,
    /// Only corner dots (.).
    Dots,
}

/// Tooltip text anchored at a screen position.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub anchor: Point,
}

/// Everything a frame needs besides the canvas itself.
pub struct RenderContext<'a> {
    /// The canvas to render.
    pub canvas: &'a DiagramCanvas,
    /// Device pixel ratio; scene coordinates are in device pixels.
    pub scale_factor: f64,
    pub theme: Theme,
    pub grid_style: GridStyle,
    /// Tooltip for the hovered interface port, if any.
    pub tooltip: Option<Tooltip>,
}

impl<'a> RenderContext<'a> {
    /// Create a context for the canvas. The tooltip is derived from the
    /// hovered port.
    pub fn new(canvas: &'a DiagramCanvas) -> Self {
        Self {
            canvas,
            scale_factor: 1.0,
            theme: Theme::default(),
            grid_style: GridStyle::default(),
            tooltip: port_tooltip(canvas),
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Set the grid style.
    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }
}

/// "name (import) · 3 functions" next to the hovered port.
fn port_tooltip(canvas: &DiagramCanvas) -> Option<Tooltip> {
    let hovered = canvas.hovered_port()?;
    let model = canvas.model()?;
    let node = model.node(&hovered.component_id)?;
    let layout = diagrammer_core::PortLayout::from_config(canvas.config());
    let port = layout
        .ports(node)
        .into_iter()
        .find(|p| p.side == hovered.side && p.index == hovered.index)?;
    let count = port.interface.functions.len();
    let noun = if count == 1 { "function" } else { "functions" };
    Some(Tooltip {
        text: format!(
            "{} ({}) · {} {}",
            port.interface.name,
            port.side.as_str(),
            count,
            noun
        ),
        anchor: canvas.world_to_screen(port.position) + kurbo::Vec2::new(12.0, -12.0),
    })
}

/// Trait for rendering backends.
///
/// Backends receive a finished display list; building it is backend
/// independent (see [`Scene::build`]).
pub trait Renderer: Send + Sync {
    /// Draw one frame.
    fn render(&mut self, scene: &Scene) -> RenderResult<()>;
}

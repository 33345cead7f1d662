//! Diagrammer Render Library
//!
//! Turns canvas state into a backend-independent display list and drives
//! renderers from the canvas' redraw flag. The bundled backend writes SVG.

mod render_loop;
mod renderer;
pub mod scene;
mod svg;
mod theme;

pub use render_loop::RenderLoop;
pub use renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError, Tooltip};
pub use scene::{DrawCommand, GRID_SIZE, Scene, TextAnchor};
pub use svg::{SvgRenderer, scene_to_svg};
pub use theme::Theme;

//! Redraw-on-demand loop.

use crate::renderer::{GridStyle, RenderContext, RenderResult, Renderer};
use crate::scene::Scene;
use crate::theme::Theme;
use diagrammer_core::DiagramCanvas;

/// Drives a [`Renderer`] from the canvas' redraw flag.
///
/// Call [`pump`](Self::pump) after feeding input; a frame is produced only
/// when something visible changed since the previous one.
pub struct RenderLoop<R: Renderer> {
    renderer: R,
    pub theme: Theme,
    pub grid_style: GridStyle,
    pub scale_factor: f64,
    frames: u64,
}

impl<R: Renderer> RenderLoop<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            theme: Theme::default(),
            grid_style: GridStyle::default(),
            scale_factor: 1.0,
            frames: 0,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_grid(mut self, grid_style: GridStyle) -> Self {
        self.grid_style = grid_style;
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Render if the canvas asked for it. Returns whether a frame was drawn.
    pub fn pump(&mut self, canvas: &mut DiagramCanvas) -> RenderResult<bool> {
        if !canvas.take_redraw() {
            return Ok(false);
        }
        self.redraw(canvas)?;
        Ok(true)
    }

    /// Render unconditionally.
    pub fn redraw(&mut self, canvas: &DiagramCanvas) -> RenderResult<()> {
        let ctx = RenderContext::new(canvas)
            .with_scale_factor(self.scale_factor)
            .with_theme(self.theme)
            .with_grid(self.grid_style);
        let scene = Scene::build(&ctx);
        self.renderer.render(&scene)?;
        self.frames += 1;
        log::trace!("Frame {} ({} commands)", self.frames, scene.commands.len());
        Ok(())
    }
}

//! A canvas plus its render loop, driven step by step.

use crate::script::{Script, ScriptStep};
use crate::ReplayResult;
use diagrammer_core::{
    CanvasConfig, DiagramCanvas, DiagramModel, InteractionEvent, InteractionMode, KeyEvent,
};
use diagrammer_render::{GridStyle, RenderLoop, SvgRenderer, Theme};
use kurbo::{Size, Vec2};
use std::path::Path;

/// Shell settings that live outside the engine.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub viewport: Size,
    pub grid_style: GridStyle,
    pub theme: Theme,
    /// Device pixels per logical pixel in SVG output.
    pub scale_factor: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            viewport: Size::new(800.0, 600.0),
            grid_style: GridStyle::Lines,
            theme: Theme::light(),
            scale_factor: 1.0,
        }
    }
}

pub struct Replay {
    canvas: DiagramCanvas,
    frames: RenderLoop<SvgRenderer>,
}

impl Replay {
    pub fn new(canvas_config: CanvasConfig, config: ReplayConfig) -> ReplayResult<Self> {
        let mut canvas = DiagramCanvas::try_new(canvas_config)?;
        canvas.set_viewport_size(config.viewport);
        let frames = RenderLoop::new(SvgRenderer::new())
            .with_theme(config.theme)
            .with_grid(config.grid_style)
            .with_scale_factor(config.scale_factor);
        Ok(Self { canvas, frames })
    }

    pub fn load(&mut self, model: DiagramModel) {
        self.canvas.set_diagram(model);
    }

    pub fn canvas(&self) -> &DiagramCanvas {
        &self.canvas
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames.frames()
    }

    /// The latest rendered frame as SVG.
    pub fn svg(&self) -> Option<&str> {
        self.frames.renderer().document()
    }

    /// Render the current state if needed, then write it out.
    pub fn save_svg(&mut self, path: impl AsRef<Path>) -> ReplayResult<()> {
        if self.svg().is_none() {
            self.frames.redraw(&self.canvas)?;
        } else {
            self.frames.pump(&mut self.canvas)?;
        }
        self.frames.renderer().save(path)?;
        Ok(())
    }

    /// Apply one step and render if it changed anything visible.
    pub fn step(&mut self, step: &ScriptStep) -> ReplayResult<Vec<InteractionEvent>> {
        let canvas = &mut self.canvas;
        let mut events = Vec::new();
        match step {
            ScriptStep::Pointer { event, modifiers } => {
                canvas.set_modifiers(*modifiers);
                events = canvas.handle_pointer(event.clone());
            }
            ScriptStep::Mode { name } => {
                let mode: InteractionMode = name.parse()?;
                canvas.set_mode(mode);
            }
            ScriptStep::NodeType { name } => canvas.set_node_type(name.clone()),
            ScriptStep::EdgeType { name } => canvas.set_edge_type(name.clone()),
            ScriptStep::Select { ids } => canvas.set_selected(ids),
            ScriptStep::Zoom { factor, anchor } => canvas.zoom(*factor, *anchor),
            ScriptStep::Pan { dx, dy } => canvas.pan_by(Vec2::new(*dx, *dy)),
            ScriptStep::Fit => canvas.fit_to_content(),
            ScriptStep::ResetView => canvas.reset_view(),
            ScriptStep::Key { key } => {
                canvas.handle_key(KeyEvent::Pressed(key.clone()));
                canvas.handle_key(KeyEvent::Released(key.clone()));
            }
            ScriptStep::Resize { width, height } => {
                canvas.set_viewport_size(Size::new(*width, *height));
            }
        }
        self.frames.pump(&mut self.canvas)?;
        Ok(events)
    }

    /// Apply every step in order and collect the emitted events.
    pub fn run(&mut self, script: &Script) -> ReplayResult<Vec<InteractionEvent>> {
        let mut events = Vec::new();
        for step in &script.steps {
            events.extend(self.step(step)?);
        }
        log::info!(
            "Replayed {} steps: {} events, {} frames",
            script.len(),
            events.len(),
            self.frames()
        );
        Ok(events)
    }
}

//! Viewport: pan/zoom transform and content-bounds clamping.

use crate::config::CanvasConfig;
use crate::model::DiagramModel;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Viewport manages the view transform for the canvas.
///
/// `screen = world * scale + offset`, so `world = (screen - offset) / scale`.
/// The scale is kept within `[min_scale, max_scale]` by every mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Current translation offset (pan), in screen pixels.
    pub offset: Vec2,
    scale: f64,
    min_scale: f64,
    max_scale: f64,
    /// Size of the drawing surface in screen pixels.
    pub size: Size,
    /// World-space box panning is clamped against.
    scroll_bounds: Option<Rect>,
}

impl Default for Viewport {
    fn default() -> Self {
        let config = CanvasConfig::default();
        Self::new(config.min_scale, config.max_scale)
    }
}

impl Viewport {
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0_f64.clamp(min_scale, max_scale),
            min_scale,
            max_scale,
            size: Size::new(800.0, 600.0),
            scroll_bounds: None,
        }
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.min_scale, config.max_scale)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    /// Set the scale directly, clamped to the allowed range.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(self.min_scale, self.max_scale);
    }

    /// World-to-screen transform for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Screen-to-world transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a screen-pixel distance to world units at the current scale.
    pub fn screen_distance_to_world(&self, distance: f64) -> f64 {
        distance / self.scale
    }

    /// Multiply the scale by `factor`, keeping `anchor` (screen coordinates)
    /// fixed. Without an anchor the viewport centre is used.
    ///
    /// Returns false when the clamped scale did not change.
    pub fn zoom(&mut self, factor: f64, anchor: Option<Point>) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return false;
        }
        let anchor = anchor.unwrap_or_else(|| self.center());
        let anchor = anchor.to_vec2();
        self.offset = anchor - (anchor - self.offset) * (new_scale / self.scale);
        self.scale = new_scale;
        true
    }

    /// Pan by a delta in screen coordinates. Unconstrained; call
    /// [`constrain_pan`](Self::constrain_pan) when the gesture ends.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Screen-space centre of the drawing surface.
    pub fn center(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn scroll_bounds(&self) -> Option<Rect> {
        self.scroll_bounds
    }

    pub fn set_scroll_bounds(&mut self, bounds: Option<Rect>) {
        self.scroll_bounds = bounds;
    }

    /// Recompute scroll bounds from the model: the union of node bounds,
    /// widened laterally around component nodes, plus padding.
    pub fn update_scroll_bounds(&mut self, model: Option<&DiagramModel>, config: &CanvasConfig) {
        self.scroll_bounds = model.and_then(|model| {
            model
                .nodes()
                .filter_map(|n| {
                    let rect = n.bounds?.to_rect();
                    Some(if n.component().is_some() {
                        rect.inflate(config.component_lateral_allowance, 0.0)
                    } else {
                        rect
                    })
                })
                .reduce(|a, b| a.union(b))
                .map(|r| r.inflate(config.scroll_padding, config.scroll_padding))
        });
    }

    /// Clamp the offset so content larger than the viewport cannot be panned
    /// fully out of view. Axes where the content fits are left alone.
    pub fn constrain_pan(&mut self) {
        let Some(bounds) = self.scroll_bounds else {
            return;
        };
        if bounds.width() * self.scale > self.size.width {
            let min_x = self.size.width - bounds.x1 * self.scale;
            let max_x = -bounds.x0 * self.scale;
            self.offset.x = self.offset.x.clamp(min_x, max_x);
        }
        if bounds.height() * self.scale > self.size.height {
            let min_y = self.size.height - bounds.y1 * self.scale;
            let max_y = -bounds.y0 * self.scale;
            self.offset.y = self.offset.y.clamp(min_y, max_y);
        }
    }

    /// Visible region in world coordinates.
    pub fn visible_world_rect(&self) -> Rect {
        let p0 = self.screen_to_world(Point::ZERO);
        let p1 = self.screen_to_world(Point::new(self.size.width, self.size.height));
        Rect::from_points(p0, p1)
    }

    /// Reset to scale 1 with no offset, clamped to the scale range.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.set_scale(1.0);
    }

    /// Fit `bounds` plus `margin` into the viewport, centred.
    /// Never zooms in past 1:1.
    pub fn fit_to_content(&mut self, bounds: Rect, margin: f64) {
        let padded = bounds.inflate(margin, margin);
        let scale_x = self.size.width / padded.width().max(1.0);
        let scale_y = self.size.height / padded.height().max(1.0);
        self.set_scale(scale_x.min(scale_y).min(1.0));

        let center = bounds.center();
        let viewport_center = self.center();
        self.offset = Vec2::new(
            viewport_center.x - center.x * self.scale,
            viewport_center.y - center.y * self.scale,
        );
    }
}

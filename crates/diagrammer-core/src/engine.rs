//! The interaction engine.
//!
//! [`DiagramCanvas`] owns the model and all interaction state. Hosts feed it
//! raw pointer and key events in screen coordinates and get back the
//! high-level [`InteractionEvent`]s each one produced. Every state change
//! raises the redraw flag; the render loop consumes it with
//! [`DiagramCanvas::take_redraw`] before the next event is delivered.

use crate::config::{CanvasConfig, ConfigError};
use crate::drag::DragController;
use crate::events::InteractionEvent;
use crate::hit_test::HitTester;
use crate::input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::mode::{InteractionMode, InteractionModeManager};
use crate::model::{DiagramModel, ModelElement};
use crate::ports::PortRef;
use crate::selection::{SelectionManager, SelectionState};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};

/// Headless diagram canvas: model, viewport, selection and input dispatch.
#[derive(Debug)]
pub struct DiagramCanvas {
    config: CanvasConfig,
    model: Option<DiagramModel>,
    viewport: Viewport,
    selection: SelectionManager,
    modes: InteractionModeManager,
    hit_tester: HitTester,
    drag: DragController,
    input: InputState,
    /// Button driving the current pan gesture.
    pan: Option<MouseButton>,
    /// Last pointer position in world coordinates, for previews.
    pointer_world: Option<Point>,
    hovered_port: Option<PortRef>,
    needs_redraw: bool,
}

impl Default for DiagramCanvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl DiagramCanvas {
    /// Create a canvas. The config is assumed valid; use
    /// [`try_new`](Self::try_new) for untrusted input.
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            viewport: Viewport::from_config(&config),
            modes: InteractionModeManager::from_config(&config),
            hit_tester: HitTester::from_config(&config),
            selection: SelectionManager::new(),
            drag: DragController::new(),
            input: InputState::new(),
            model: None,
            pan: None,
            pointer_world: None,
            hovered_port: None,
            needs_redraw: true,
            config,
        }
    }

    pub fn try_new(config: CanvasConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn model(&self) -> Option<&DiagramModel> {
        self.model.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    pub fn mode(&self) -> InteractionMode {
        self.modes.mode()
    }

    pub fn modes(&self) -> &InteractionModeManager {
        &self.modes
    }

    pub fn hovered_port(&self) -> Option<&PortRef> {
        self.hovered_port.as_ref()
    }

    pub fn pointer_world(&self) -> Option<Point> {
        self.pointer_world
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    // --- Model lifecycle ---

    /// Replace the model wholesale. Resets viewport, selection and any
    /// in-flight gesture.
    pub fn set_diagram(&mut self, model: DiagramModel) {
        log::info!(
            "Loading diagram {} ({} elements, revision {})",
            model.id,
            model.len(),
            model.revision
        );
        self.reset_interaction();
        self.model = Some(model);
        self.refresh_scroll_bounds();
        self.request_redraw();
    }

    /// Drop the model.
    pub fn clear(&mut self) {
        log::info!("Clearing diagram");
        self.reset_interaction();
        self.model = None;
        self.refresh_scroll_bounds();
        self.request_redraw();
    }

    /// Take the model out of the canvas, leaving it empty.
    pub fn take_diagram(&mut self) -> Option<DiagramModel> {
        self.reset_interaction();
        let model = self.model.take();
        self.refresh_scroll_bounds();
        self.request_redraw();
        model
    }

    fn reset_interaction(&mut self) {
        self.drag.clear();
        self.pan = None;
        self.modes.reset_transient();
        self.hovered_port = None;
        self.pointer_world = None;
        self.input.release_all();
        self.selection.reset();
        let size = self.viewport.size;
        self.viewport = Viewport::from_config(&self.config);
        self.viewport.set_size(size);
    }

    /// Mutate the model from outside the engine.
    ///
    /// Rejected (returns `None`) while a drag is active, since the drag owns
    /// node bounds until pointer-up. Selection, hover and pending sources
    /// that refer to removed elements are dropped afterwards.
    pub fn edit_model<R>(&mut self, edit: impl FnOnce(&mut DiagramModel) -> R) -> Option<R> {
        if self.drag.is_active() {
            log::warn!("Model edit rejected while a drag is active");
            return None;
        }
        let model = self.model.as_mut()?;
        let result = edit(model);

        let model = self.model.as_ref()?;
        self.selection.retain_existing(model);
        if self
            .modes
            .edge_source()
            .is_some_and(|source| !model.contains(source.id()))
            || self
                .modes
                .interface_source()
                .is_some_and(|source| !model.contains(&source.component_id))
        {
            log::debug!("Pending link source removed from model");
            self.modes.reset_transient();
        }
        if self
            .hovered_port
            .as_ref()
            .is_some_and(|port| !model.contains(&port.component_id))
        {
            self.hovered_port = None;
        }
        self.refresh_scroll_bounds();
        self.request_redraw();
        Some(result)
    }

    fn refresh_scroll_bounds(&mut self) {
        self.viewport
            .update_scroll_bounds(self.model.as_ref(), &self.config);
    }

    // --- Redraw flag ---

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Consume the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    // --- Modes and selection ---

    /// Switch mode by name. Unknown names are logged and ignored.
    pub fn set_interaction_mode(&mut self, name: &str) -> bool {
        match name.parse::<InteractionMode>() {
            Ok(mode) => {
                self.set_mode(mode);
                true
            }
            Err(e) => {
                log::warn!("{}; staying in {} mode", e, self.modes.mode());
                false
            }
        }
    }

    /// Switch mode, cancelling any in-flight gesture.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        let previous = self.modes.set_mode(mode);
        self.drag.clear();
        self.pan = None;
        self.hovered_port = None;
        self.selection.set_hover(None);
        log::debug!("Interaction mode {} -> {}", previous, mode);
        self.request_redraw();
    }

    pub fn set_node_type(&mut self, node_type: impl Into<String>) {
        self.modes.selected_node_type = node_type.into();
    }

    pub fn set_edge_type(&mut self, edge_type: impl Into<String>) {
        self.modes.selected_edge_type = edge_type.into();
    }

    /// Replace the selection. Ids not in the model are ignored.
    pub fn set_selected<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(model) = self.model.as_ref() else {
            self.selection.clear_selection();
            return;
        };
        let existing: Vec<String> = ids
            .into_iter()
            .filter(|id| model.contains(id.as_ref()))
            .map(|id| id.as_ref().to_string())
            .collect();
        if self.selection.select_multiple(existing, false) {
            self.request_redraw();
        }
    }

    pub fn select_all(&mut self) {
        if let Some(model) = self.model.as_ref() {
            if self.selection.select_all(model) {
                self.request_redraw();
            }
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear_selection() {
            self.request_redraw();
        }
    }

    /// Register a selection change listener.
    pub fn on_selection_change(&mut self, listener: impl FnMut(&SelectionState) + 'static) {
        self.selection.on_change(listener);
    }

    // --- Viewport ---

    pub fn scale(&self) -> f64 {
        self.viewport.scale()
    }

    pub fn offset(&self) -> Vec2 {
        self.viewport.offset
    }

    /// World-space scroll bounds enclosing all content, for minimaps.
    pub fn world_bounds(&self) -> Option<Rect> {
        self.viewport.scroll_bounds()
    }

    pub fn visible_world_rect(&self) -> Rect {
        self.viewport.visible_world_rect()
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.viewport.screen_to_world(screen)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        self.viewport.world_to_screen(world)
    }

    /// Zoom around a screen anchor (the viewport centre when `None`).
    pub fn zoom(&mut self, factor: f64, anchor: Option<Point>) {
        if self.viewport.zoom(factor, anchor) {
            self.request_redraw();
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom(self.config.zoom_step, None);
    }

    pub fn zoom_out(&mut self) {
        self.zoom(1.0 / self.config.zoom_step, None);
    }

    /// Pan by a screen delta, then clamp to the content.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
        self.viewport.constrain_pan();
        self.request_redraw();
    }

    pub fn fit_to_content(&mut self) {
        match self.model.as_ref().and_then(DiagramModel::bounds) {
            Some(bounds) => self.viewport.fit_to_content(bounds, self.config.fit_margin),
            None => self.viewport.reset(),
        }
        self.request_redraw();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.request_redraw();
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport.set_size(size);
        self.viewport.constrain_pan();
        self.request_redraw();
    }

    // --- Queries ---

    /// Element under a world point using the engine's hit rules.
    pub fn hit_test(&self, world: Point) -> Option<&ModelElement> {
        let model = self.model.as_ref()?;
        self.hit_tester.hit_test(model, world, self.viewport.scale())
    }

    /// Element under a world point with caller-chosen edge handling.
    pub fn element_at(
        &self,
        world: Point,
        include_edges: bool,
        tolerance_px: f64,
    ) -> Option<&ModelElement> {
        let model = self.model.as_ref()?;
        self.hit_tester
            .element_at(model, world, self.viewport.scale(), include_edges, tolerance_px)
    }

    /// Dashed preview from the pending edge source to the pointer.
    pub fn edge_preview(&self) -> Option<(Point, Point)> {
        let source = self.modes.edge_source()?;
        let bounds = self.model.as_ref()?.get(source.id())?.bounds()?;
        Some((bounds.center(), self.pointer_world?))
    }

    /// Dashed preview from the pending interface port to the pointer.
    pub fn interface_preview(&self) -> Option<(Point, Point)> {
        let source = self.modes.interface_source()?;
        Some((source.position, self.pointer_world?))
    }

    // --- Input dispatch ---

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.input.set_modifiers(modifiers);
    }

    /// Feed one pointer event (screen coordinates) and collect the
    /// interaction events it produced.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<InteractionEvent> {
        log::trace!("{:?} in {} mode", event, self.modes.mode());
        self.input.handle_pointer_event(&event);
        let mut events = Vec::new();
        match event {
            PointerEvent::Down { position, button } => {
                self.on_pointer_down(position, button, &mut events)
            }
            PointerEvent::Up { position, button } => {
                self.on_pointer_up(position, button, &mut events)
            }
            PointerEvent::Move { position } => self.on_pointer_move(position, &mut events),
            PointerEvent::Click { position, button } => {
                self.on_click(position, button, &mut events)
            }
            PointerEvent::Scroll { position, delta } => self.on_scroll(position, delta),
        }
        events
    }

    /// Feed one key event. Escape cancels the current gesture.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        match event {
            KeyEvent::Pressed(key) if key == "Escape" => self.cancel_gesture(),
            _ => false,
        }
    }

    /// Abort any drag (restoring positions), pan or pending link.
    pub fn cancel_gesture(&mut self) -> bool {
        let mut cancelled = match self.model.as_mut() {
            Some(model) => self.drag.cancel(model),
            None => {
                self.drag.clear();
                false
            }
        };
        if self.pan.take().is_some() {
            self.viewport.constrain_pan();
            cancelled = true;
        }
        cancelled |= self.modes.reset_transient();
        if cancelled {
            log::debug!("Gesture cancelled");
            self.refresh_scroll_bounds();
            self.request_redraw();
        }
        cancelled
    }

    fn on_pointer_down(
        &mut self,
        screen: Point,
        button: MouseButton,
        events: &mut Vec<InteractionEvent>,
    ) {
        let pans = button == MouseButton::Middle
            || (button == MouseButton::Left && self.modes.mode() == InteractionMode::Pan);
        if pans {
            log::debug!("Pan started with {:?} button", button);
            self.pan = Some(button);
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        // A new press starts a new gesture; nothing carries over.
        self.drag.clear();
        if !self.modes.mode().allows_selection() {
            return;
        }
        let world = self.viewport.screen_to_world(screen);
        let Some(model) = self.model.as_ref() else {
            return;
        };
        let Some(hit) = self.hit_tester.hit_test(model, world, self.viewport.scale()) else {
            return;
        };
        if !self.selection.is_selected(hit.id()) {
            return;
        }
        if self
            .drag
            .begin(model, self.selection.selected(), hit.id(), world)
        {
            let element_ids = self.drag.element_ids();
            log::debug!("Drag started on {} ({} elements)", hit.id(), element_ids.len());
            events.push(InteractionEvent::DragStart {
                position: world,
                element: hit.clone(),
                element_ids,
            });
        }
    }

    fn on_pointer_move(&mut self, screen: Point, events: &mut Vec<InteractionEvent>) {
        let world = self.viewport.screen_to_world(screen);
        self.pointer_world = Some(world);

        if self.pan.is_some() {
            self.viewport.pan(self.input.pointer_delta());
            self.request_redraw();
            return;
        }

        if self.drag.is_active() {
            if let Some(model) = self.model.as_mut() {
                let element_ids = self.drag.update(model, world);
                let delta = self.drag.start().map_or(Vec2::ZERO, |start| world - start);
                events.push(InteractionEvent::DragMove {
                    position: world,
                    element_ids,
                    delta,
                });
            }
            self.request_redraw();
            return;
        }

        match self.modes.mode() {
            InteractionMode::Pan => {}
            InteractionMode::CreateInterfaceLink => {
                let scale = self.viewport.scale();
                let port = self
                    .model
                    .as_ref()
                    .and_then(|model| self.hit_tester.hit_port(model, world, scale))
                    .map(|port| port.port_ref());
                if port != self.hovered_port {
                    self.hovered_port = port;
                    self.request_redraw();
                }
                if self.modes.interface_source().is_some() {
                    self.request_redraw();
                }
            }
            InteractionMode::Select | InteractionMode::CreateNode | InteractionMode::CreateEdge => {
                let hit = self.hit_test(world).cloned();
                if self.selection.set_hover(hit.as_ref().map(ModelElement::id)) {
                    events.push(InteractionEvent::Hover {
                        position: world,
                        element: hit,
                    });
                    self.request_redraw();
                }
                if self.modes.edge_source().is_some() {
                    self.request_redraw();
                }
            }
        }
    }

    fn on_pointer_up(
        &mut self,
        screen: Point,
        button: MouseButton,
        events: &mut Vec<InteractionEvent>,
    ) {
        if self
            .pan
            .is_some_and(|held| held == button && !self.input.is_button_pressed(held))
        {
            self.pan = None;
            self.viewport.constrain_pan();
            log::debug!("Pan ended at offset {:?}", self.viewport.offset);
            self.request_redraw();
            return;
        }
        if button != MouseButton::Left {
            return;
        }
        if let Some(outcome) = self.drag.end() {
            if outcome.has_dragged {
                log::debug!("Drag ended, moved {} elements", outcome.element_ids.len());
                self.refresh_scroll_bounds();
                events.push(InteractionEvent::DragEnd {
                    position: self.viewport.screen_to_world(screen),
                    element_ids: outcome.element_ids,
                    delta: outcome.delta,
                });
            }
            self.request_redraw();
        }
    }

    fn on_click(&mut self, screen: Point, button: MouseButton, events: &mut Vec<InteractionEvent>) {
        if button != MouseButton::Left {
            return;
        }
        if self.drag.take_click_suppression() {
            log::trace!("Click suppressed after drag");
            return;
        }
        let world = self.viewport.screen_to_world(screen);
        match self.modes.mode() {
            InteractionMode::Select => self.click_select(world, events),
            InteractionMode::CreateNode => self.click_create_node(world, events),
            InteractionMode::CreateEdge => self.click_create_edge(world, events),
            InteractionMode::CreateInterfaceLink => self.click_interface_link(world, events),
            InteractionMode::Pan => {}
        }
    }

    fn click_select(&mut self, world: Point, events: &mut Vec<InteractionEvent>) {
        let modifiers = self.input.modifiers;
        let hit = self.hit_test(world).cloned();
        match &hit {
            Some(element) => {
                self.selection.select(element.id(), modifiers.is_additive());
            }
            None if !modifiers.any() => {
                self.selection.clear_selection();
            }
            None => {}
        }
        events.push(InteractionEvent::Click {
            position: world,
            element: hit,
            modifiers,
        });
        self.request_redraw();
    }

    fn click_create_node(&mut self, world: Point, events: &mut Vec<InteractionEvent>) {
        if let Some(element) = self.hit_test(world) {
            log::trace!("Create-node click on {} ignored", element.id());
            return;
        }
        events.push(InteractionEvent::CanvasClick {
            position: world,
            node_type: self.modes.selected_node_type.clone(),
        });
    }

    fn click_create_edge(&mut self, world: Point, events: &mut Vec<InteractionEvent>) {
        let hit = self.hit_test(world).cloned();
        let edge_type = self.modes.selected_edge_type.clone();
        match hit {
            Some(target @ ModelElement::Node(_)) => match self.modes.take_edge_source() {
                None => {
                    log::debug!("Edge source set to {}", target.id());
                    self.modes.set_edge_source(target.clone());
                    events.push(InteractionEvent::EdgeStart {
                        position: world,
                        source: target,
                        edge_type,
                    });
                }
                Some(source) if source.id() == target.id() => {
                    self.modes.set_edge_source(source);
                }
                Some(pending) => {
                    // The pending clone may predate an edit_model call.
                    let source = self
                        .model
                        .as_ref()
                        .and_then(|model| model.get(pending.id()))
                        .cloned()
                        .unwrap_or(pending);
                    log::debug!("Edge completed {} -> {}", source.id(), target.id());
                    events.push(InteractionEvent::EdgeEnd {
                        position: world,
                        source,
                        target,
                        edge_type,
                    });
                }
            },
            Some(ModelElement::Edge(edge)) => {
                log::trace!("Edge {} is not a valid endpoint", edge.id);
            }
            None => {
                if self.modes.take_edge_source().is_some() {
                    log::debug!("Edge creation cancelled");
                }
            }
        }
        self.request_redraw();
    }

    fn click_interface_link(&mut self, world: Point, events: &mut Vec<InteractionEvent>) {
        let scale = self.viewport.scale();
        let hit = self.model.as_ref().and_then(|model| {
            let port = self.hit_tester.hit_port(model, world, scale)?;
            let component = model.get(port.component_id)?.clone();
            Some((component, port.to_link_source()))
        });

        match hit {
            Some((component, clicked)) => match self.modes.take_interface_source() {
                Some(pending) if pending.same_port(&clicked) => {
                    log::debug!("Interface link cancelled on {}", pending.interface.name);
                }
                pending => {
                    let completes = pending.is_some();
                    events.push(InteractionEvent::InterfaceClick {
                        position: world,
                        component,
                        interface: clicked.interface.clone(),
                        side: clicked.side,
                        link_source: pending,
                    });
                    if !completes {
                        log::debug!(
                            "Interface link started from {}:{}",
                            clicked.component_id,
                            clicked.interface.name
                        );
                        self.modes.set_interface_source(clicked);
                    }
                }
            },
            None => {
                if self.modes.take_interface_source().is_some() {
                    log::debug!("Interface linking cancelled");
                }
                self.hovered_port = None;
            }
        }
        self.request_redraw();
    }

    fn on_scroll(&mut self, screen: Point, delta: Vec2) {
        let factor = if delta.y > 0.0 {
            self.config.zoom_step
        } else if delta.y < 0.0 {
            1.0 / self.config.zoom_step
        } else {
            return;
        };
        self.zoom(factor, Some(screen));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds, Edge, Node};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn left_down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    fn left_up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    fn move_to(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    fn click(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Click {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    /// Press, release and click at the same point.
    fn tap(canvas: &mut DiagramCanvas, x: f64, y: f64) -> Vec<InteractionEvent> {
        let mut events = canvas.handle_pointer(left_down(x, y));
        events.extend(canvas.handle_pointer(left_up(x, y)));
        events.extend(canvas.handle_pointer(click(x, y)));
        events
    }

    fn kinds(events: &[InteractionEvent]) -> Vec<&'static str> {
        events.iter().map(InteractionEvent::kind).collect()
    }

    fn two_nodes_and_edge() -> DiagramModel {
        let mut model = DiagramModel::new("workflow");
        model.add_element(Node::new("task", Bounds::new(0.0, 0.0, 100.0, 100.0)).with_id("A"));
        model.add_element(Node::new("task", Bounds::new(300.0, 0.0, 100.0, 100.0)).with_id("B"));
        model.add_element(Edge::new("flow", "A", "B").with_id("e1"));
        model
    }

    fn component_model() -> DiagramModel {
        let json = r#"{"elements": [
            {"id": "c1", "type": "wasm-component",
             "bounds": {"x": 0, "y": 0, "width": 200, "height": 150},
             "interfaces": [{"name": "in", "interface_type": "import"},
                            {"name": "out", "interface_type": "export"}]},
            {"id": "c2", "type": "wasm-component",
             "bounds": {"x": 400, "y": 0, "width": 200, "height": 150},
             "interfaces": [{"name": "in", "interface_type": "import"}]}
        ]}"#;
        DiagramModel::from_json(json).unwrap()
    }

    fn canvas_with(model: DiagramModel) -> DiagramCanvas {
        let mut canvas = DiagramCanvas::default();
        canvas.set_diagram(model);
        canvas
    }

    fn origin(canvas: &DiagramCanvas, id: &str) -> Point {
        canvas
            .model()
            .and_then(|m| m.node(id))
            .and_then(|n| n.bounds)
            .map(|b| b.origin())
            .unwrap()
    }

    #[test]
    fn test_click_on_edge_selects_it() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        let events = tap(&mut canvas, 200.0, 55.0);
        assert_eq!(kinds(&events), vec!["click"]);
        assert_eq!(events[0].element().map(ModelElement::id), Some("e1"));
        assert_eq!(canvas.selection().selected_ids(), vec!["e1"]);
    }

    #[test]
    fn test_click_between_nodes_hits_edge() {
        let mut model = DiagramModel::new("workflow");
        model.add_element(Node::new("task", Bounds::new(0.0, 0.0, 100.0, 50.0)).with_id("A"));
        model.add_element(Node::new("task", Bounds::new(300.0, 0.0, 100.0, 50.0)).with_id("B"));
        model.add_element(Edge::new("flow", "A", "B").with_id("e1"));
        let mut canvas = canvas_with(model);
        let events = canvas.handle_pointer(click(150.0, 25.0));
        assert_eq!(kinds(&events), vec!["click"]);
        assert_eq!(events[0].element().map(ModelElement::id), Some("e1"));
        assert_eq!(canvas.selection().selected_ids(), vec!["e1"]);
    }

    #[test]
    fn test_click_empty_clears_selection() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_selected(["A", "B"]);
        tap(&mut canvas, 200.0, 400.0);
        assert!(canvas.selection().selected.is_empty());
    }

    #[test]
    fn test_click_empty_with_modifier_keeps_selection() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_selected(["A"]);
        canvas.set_modifiers(Modifiers::shift());
        tap(&mut canvas, 200.0, 400.0);
        assert_eq!(canvas.selection().selected_ids(), vec!["A"]);
    }

    #[test]
    fn test_shift_click_toggles() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        tap(&mut canvas, 50.0, 50.0);
        canvas.set_modifiers(Modifiers::shift());
        tap(&mut canvas, 350.0, 50.0);
        assert_eq!(canvas.selection().selected_ids(), vec!["A", "B"]);
        // Shift-press on a selected element starts a (zero-length) drag; the
        // click still toggles it off.
        tap(&mut canvas, 50.0, 50.0);
        assert_eq!(canvas.selection().selected_ids(), vec!["B"]);
    }

    #[test]
    fn test_edge_creation() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        assert!(canvas.set_interaction_mode("create-edge"));

        let events = tap(&mut canvas, 50.0, 50.0);
        assert_eq!(kinds(&events), vec!["edge-start"]);
        assert_eq!(canvas.modes().edge_source().map(ModelElement::id), Some("A"));

        let events = tap(&mut canvas, 350.0, 50.0);
        match &events[..] {
            [InteractionEvent::EdgeEnd {
                source,
                target,
                edge_type,
                ..
            }] => {
                assert_eq!(source.id(), "A");
                assert_eq!(target.id(), "B");
                assert_eq!(edge_type, "flow");
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert!(canvas.modes().edge_source().is_none());
        assert!(canvas.selection().selected.is_empty());
    }

    #[test]
    fn test_edge_end_reports_current_source() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_interaction_mode("create-edge");
        tap(&mut canvas, 50.0, 50.0);
        canvas
            .edit_model(|model| {
                let node = Node::new("task", Bounds::new(0.0, 0.0, 120.0, 100.0))
                    .with_id("A")
                    .with_label("Renamed");
                model.add_element(node);
            })
            .unwrap();

        let events = tap(&mut canvas, 350.0, 50.0);
        match &events[..] {
            [InteractionEvent::EdgeEnd { source, .. }] => {
                assert_eq!(source.label(), Some("Renamed"));
                assert_eq!(source.bounds().map(|b| b.width), Some(120.0));
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn test_edge_creation_cancelled_on_empty_click() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_interaction_mode("create-edge");
        tap(&mut canvas, 50.0, 50.0);
        let events = tap(&mut canvas, 200.0, 400.0);
        assert!(events.is_empty());
        assert!(canvas.modes().edge_source().is_none());
    }

    #[test]
    fn test_edge_source_clicked_twice_stays_pending() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_interaction_mode("create-edge");
        tap(&mut canvas, 50.0, 50.0);
        let events = tap(&mut canvas, 60.0, 60.0);
        assert!(events.is_empty());
        assert_eq!(canvas.modes().edge_source().map(ModelElement::id), Some("A"));
    }

    #[test]
    fn test_edge_preview_follows_pointer() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_interaction_mode("create-edge");
        tap(&mut canvas, 50.0, 50.0);
        canvas.handle_pointer(move_to(200.0, 300.0));
        assert_eq!(
            canvas.edge_preview(),
            Some((Point::new(50.0, 50.0), Point::new(200.0, 300.0)))
        );
    }

    #[test]
    fn test_create_node_click() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_interaction_mode("create-node");
        canvas.set_node_type("gateway");
        let events = tap(&mut canvas, 500.0, 500.0);
        assert_eq!(
            events,
            vec![InteractionEvent::CanvasClick {
                position: Point::new(500.0, 500.0),
                node_type: "gateway".to_string(),
            }]
        );
        assert!(tap(&mut canvas, 50.0, 50.0).is_empty());
    }

    #[test]
    fn test_zoom_floor() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.zoom(0.1, None);
        assert!((canvas.scale() - 0.1).abs() < f64::EPSILON);
        let offset = canvas.offset();
        for _ in 0..5 {
            canvas.zoom(0.9, None);
            assert!((canvas.scale() - 0.1).abs() < f64::EPSILON);
            assert_eq!(canvas.offset(), offset);
        }
    }

    #[test]
    fn test_scroll_zooms_at_pointer() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        let anchor = Point::new(120.0, 80.0);
        let before = canvas.screen_to_world(anchor);
        canvas.handle_pointer(PointerEvent::Scroll {
            position: anchor,
            delta: Vec2::new(0.0, 1.0),
        });
        assert!((canvas.scale() - 1.1).abs() < 1e-10);
        let after = canvas.screen_to_world(anchor);
        assert!((before - after).hypot() < 1e-9);
    }

    #[test]
    fn test_drag_moves_selection_as_formation() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_selected(["A", "B"]);
        let gap = origin(&canvas, "B") - origin(&canvas, "A");

        let events = canvas.handle_pointer(left_down(50.0, 50.0));
        assert_eq!(kinds(&events), vec!["drag-start"]);
        for (x, y) in [(60.0, 70.0), (-20.0, 10.0), (80.0, 90.0)] {
            let events = canvas.handle_pointer(move_to(x, y));
            assert_eq!(kinds(&events), vec!["drag-move"]);
            let now = origin(&canvas, "B") - origin(&canvas, "A");
            assert!((now - gap).hypot() < 1e-10);
        }
        let events = canvas.handle_pointer(left_up(80.0, 90.0));
        assert_eq!(kinds(&events), vec!["drag-end"]);
        assert_eq!(origin(&canvas, "A"), Point::new(30.0, 40.0));
        assert!(!canvas.is_dragging());

        // The click that follows the drag is swallowed, the next one is not.
        assert!(canvas.handle_pointer(click(80.0, 90.0)).is_empty());
        assert_eq!(kinds(&tap(&mut canvas, 600.0, 500.0)), vec!["click"]);
    }

    #[test]
    fn test_press_without_move_emits_no_drag_end() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_selected(["A"]);
        let events = tap(&mut canvas, 50.0, 50.0);
        assert_eq!(kinds(&events), vec!["drag-start", "click"]);
    }

    #[test]
    fn test_press_on_unselected_does_not_drag() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.handle_pointer(left_down(50.0, 50.0));
        assert!(!canvas.is_dragging());
        let events = canvas.handle_pointer(move_to(90.0, 90.0));
        assert!(events.iter().all(|e| e.kind() == "hover"));
        assert_eq!(origin(&canvas, "A"), Point::ZERO);
    }

    #[test]
    fn test_escape_restores_dragged_nodes() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_selected(["A"]);
        canvas.handle_pointer(left_down(50.0, 50.0));
        canvas.handle_pointer(move_to(150.0, 250.0));
        assert!(canvas.handle_key(KeyEvent::Pressed("Escape".into())));
        assert_eq!(origin(&canvas, "A"), Point::ZERO);
        assert!(canvas.handle_pointer(left_up(150.0, 250.0)).is_empty());
    }

    #[test]
    fn test_mode_switch_cancels_pending_edge() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_interaction_mode("create-edge");
        tap(&mut canvas, 50.0, 50.0);
        canvas.set_interaction_mode("select");
        assert!(canvas.modes().edge_source().is_none());
    }

    #[test]
    fn test_unknown_mode_ignored() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_interaction_mode("create-edge");
        assert!(!canvas.set_interaction_mode("lasso"));
        assert_eq!(canvas.mode(), InteractionMode::CreateEdge);
    }

    #[test]
    fn test_interface_link_mode_isolation() {
        let mut canvas = canvas_with(component_model());
        canvas.set_selected(["c1"]);
        canvas.set_interaction_mode("create-interface-link");

        // Body of a selected component: no selection change, no drag, no click.
        let mut events = canvas.handle_pointer(left_down(100.0, 100.0));
        events.extend(canvas.handle_pointer(move_to(150.0, 120.0)));
        events.extend(canvas.handle_pointer(left_up(150.0, 120.0)));
        events.extend(canvas.handle_pointer(click(150.0, 120.0)));
        assert!(events.is_empty());
        assert_eq!(origin(&canvas, "c1"), Point::ZERO);
        assert_eq!(canvas.selection().selected_ids(), vec!["c1"]);
    }

    #[test]
    fn test_interface_link_flow() {
        let mut canvas = canvas_with(component_model());
        canvas.set_interaction_mode("create-interface-link");

        // Export "out" of c1 sits at (200, 40).
        let events = tap(&mut canvas, 202.0, 41.0);
        match &events[..] {
            [InteractionEvent::InterfaceClick {
                component,
                interface,
                side,
                link_source,
                ..
            }] => {
                assert_eq!(component.id(), "c1");
                assert_eq!(interface.name, "out");
                assert_eq!(*side, crate::model::PortSide::Export);
                assert!(link_source.is_none());
            }
            other => panic!("unexpected events {other:?}"),
        }

        canvas.handle_pointer(move_to(300.0, 60.0));
        assert_eq!(
            canvas.interface_preview(),
            Some((Point::new(200.0, 40.0), Point::new(300.0, 60.0)))
        );

        // Import "in" of c2 sits at (400, 40).
        let events = tap(&mut canvas, 400.0, 40.0);
        match &events[..] {
            [InteractionEvent::InterfaceClick {
                component,
                link_source: Some(source),
                ..
            }] => {
                assert_eq!(component.id(), "c2");
                assert_eq!(source.component_id, "c1");
                assert_eq!(source.interface.name, "out");
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert!(canvas.modes().interface_source().is_none());
    }

    #[test]
    fn test_interface_link_cancelled_by_miss_or_repeat() {
        let mut canvas = canvas_with(component_model());
        canvas.set_interaction_mode("create-interface-link");
        tap(&mut canvas, 200.0, 40.0);
        assert!(tap(&mut canvas, 300.0, 300.0).is_empty());
        assert!(canvas.modes().interface_source().is_none());

        tap(&mut canvas, 200.0, 40.0);
        assert!(tap(&mut canvas, 200.0, 40.0).is_empty());
        assert!(canvas.modes().interface_source().is_none());
    }

    #[test]
    fn test_hover_port_tracking() {
        let mut canvas = canvas_with(component_model());
        canvas.set_interaction_mode("create-interface-link");
        canvas.handle_pointer(move_to(0.0, 42.0));
        let port = canvas.hovered_port().unwrap();
        assert_eq!(port.component_id, "c1");
        assert_eq!(port.side, crate::model::PortSide::Import);
        canvas.handle_pointer(move_to(100.0, 100.0));
        assert!(canvas.hovered_port().is_none());
    }

    #[test]
    fn test_middle_button_pans_in_any_mode() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_interaction_mode("create-edge");
        canvas.handle_pointer(PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Middle,
        });
        assert!(canvas.is_panning());
        let events = canvas.handle_pointer(move_to(130.0, 90.0));
        assert!(events.is_empty());
        assert_eq!(canvas.offset(), Vec2::new(30.0, -10.0));
        canvas.handle_pointer(PointerEvent::Up {
            position: Point::new(130.0, 90.0),
            button: MouseButton::Middle,
        });
        assert!(!canvas.is_panning());
        // Content fits the viewport, so the pan is kept as-is.
        assert_eq!(canvas.offset(), Vec2::new(30.0, -10.0));
    }

    #[test]
    fn test_pan_ends_only_with_its_own_button() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.handle_pointer(PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Middle,
        });
        canvas.handle_pointer(move_to(110.0, 100.0));
        canvas.handle_pointer(left_up(110.0, 100.0));
        assert!(canvas.is_panning());
        canvas.handle_pointer(move_to(115.0, 104.0));
        assert_eq!(canvas.offset(), Vec2::new(15.0, 4.0));
        canvas.handle_pointer(PointerEvent::Up {
            position: Point::new(115.0, 104.0),
            button: MouseButton::Middle,
        });
        assert!(!canvas.is_panning());
    }

    #[test]
    fn test_pan_mode_suppresses_selection() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_interaction_mode("pan");
        let events = tap(&mut canvas, 50.0, 50.0);
        assert!(events.is_empty());
        assert!(canvas.selection().selected.is_empty());
    }

    #[test]
    fn test_pan_is_clamped_for_large_content() {
        let mut model = DiagramModel::new("workflow");
        model.add_element(Node::new("task", Bounds::new(0.0, 0.0, 2000.0, 2000.0)).with_id("big"));
        let mut canvas = canvas_with(model);
        canvas.pan_by(Vec2::new(5000.0, 5000.0));
        let once = canvas.offset();
        assert_eq!(once, Vec2::new(100.0, 100.0));
        canvas.pan_by(Vec2::ZERO);
        assert_eq!(canvas.offset(), once);
    }

    #[test]
    fn test_hover_emits_on_change_only() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        let events = canvas.handle_pointer(move_to(10.0, 10.0));
        assert_eq!(kinds(&events), vec!["hover"]);
        assert!(canvas.handle_pointer(move_to(20.0, 20.0)).is_empty());
        let events = canvas.handle_pointer(move_to(200.0, 400.0));
        assert_eq!(kinds(&events), vec!["hover"]);
        assert!(events[0].element().is_none());
        assert!(canvas.selection().hovered.is_none());
    }

    #[test]
    fn test_set_diagram_resets_state() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_selected(["A"]);
        canvas.zoom(2.0, Some(Point::new(10.0, 10.0)));
        canvas.set_diagram(two_nodes_and_edge());
        assert!(canvas.selection().selected.is_empty());
        assert!((canvas.scale() - 1.0).abs() < f64::EPSILON);
        assert_eq!(canvas.offset(), Vec2::ZERO);
    }

    #[test]
    fn test_set_selected_ignores_unknown_ids() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_selected(["A", "nope"]);
        assert_eq!(canvas.selection().selected_ids(), vec!["A"]);
    }

    #[test]
    fn test_edit_model_prunes_selection() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_selected(["A", "e1"]);
        canvas.edit_model(|m| m.remove_element("A"));
        assert_eq!(canvas.selection().selected_ids(), vec!["e1"]);
        // The edge now dangles and can no longer be hit.
        let events = tap(&mut canvas, 200.0, 50.0);
        assert!(events[0].element().is_none());
    }

    #[test]
    fn test_edit_model_rejected_during_drag() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.set_selected(["A"]);
        canvas.handle_pointer(left_down(50.0, 50.0));
        assert!(canvas.edit_model(|m| m.remove_element("A")).is_none());
        assert!(canvas.model().is_some_and(|m| m.contains("A")));
    }

    #[test]
    fn test_empty_canvas_is_inert() {
        let mut canvas = DiagramCanvas::default();
        assert!(canvas.hit_test(Point::ZERO).is_none());
        let events = tap(&mut canvas, 10.0, 10.0);
        assert_eq!(kinds(&events), vec!["click"]);
        assert!(canvas.world_bounds().is_none());
        canvas.fit_to_content();
        assert!((canvas.scale() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selection_listener_called_synchronously() {
        let calls = Rc::new(RefCell::new(0));
        let mut canvas = canvas_with(two_nodes_and_edge());
        let c = calls.clone();
        canvas.on_selection_change(move |_| *c.borrow_mut() += 1);
        tap(&mut canvas, 50.0, 50.0);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_redraw_flag() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        assert!(canvas.take_redraw());
        assert!(!canvas.take_redraw());
        tap(&mut canvas, 50.0, 50.0);
        assert!(canvas.take_redraw());
    }

    #[test]
    fn test_fit_to_content() {
        let mut canvas = canvas_with(two_nodes_and_edge());
        canvas.fit_to_content();
        assert!((canvas.scale() - 1.0).abs() < f64::EPSILON);
        let center = canvas.world_to_screen(Point::new(200.0, 50.0));
        assert!((center.x - 400.0).abs() < 1e-10);
        assert!((center.y - 300.0).abs() < 1e-10);
    }
}

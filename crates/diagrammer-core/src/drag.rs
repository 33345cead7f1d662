//! Multi-element drag.
//!
//! While a drag is active the controller is the only writer of node bounds.
//! Each selected node keeps its offset from the pointer, so the selection
//! moves as a rigid formation.

use crate::model::{DiagramModel, ElementId};
use kurbo::{Point, Vec2};
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct DragState {
    grabbed: ElementId,
    start_world: Point,
    last_world: Point,
    /// `top_left - pointer` per dragged node, in model order.
    offsets: Vec<(ElementId, Vec2)>,
    /// Top-left corners at drag start, for cancellation.
    originals: Vec<(ElementId, Point)>,
    has_dragged: bool,
}

/// Result of finishing a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragOutcome {
    pub grabbed: ElementId,
    pub element_ids: Vec<ElementId>,
    pub has_dragged: bool,
    /// Total pointer movement in world units.
    pub delta: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    active: Option<DragState>,
    suppress_click: bool,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn has_dragged(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.has_dragged)
    }

    /// Pointer position (world) where the drag began.
    pub fn start(&self) -> Option<Point> {
        self.active.as_ref().map(|s| s.start_world)
    }

    pub fn grabbed(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.grabbed.as_str())
    }

    /// Ids being dragged, in model order.
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.active
            .as_ref()
            .map(|s| s.offsets.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default()
    }

    /// Start dragging every selected node with bounds. Returns false when
    /// nothing in the selection can move.
    pub fn begin(
        &mut self,
        model: &DiagramModel,
        selected: &HashSet<ElementId>,
        grabbed: &str,
        pointer_world: Point,
    ) -> bool {
        self.suppress_click = false;
        let mut offsets = Vec::new();
        let mut originals = Vec::new();
        for node in model.nodes().filter(|n| selected.contains(&n.id)) {
            let Some(bounds) = node.bounds else {
                continue;
            };
            offsets.push((node.id.clone(), bounds.origin() - pointer_world));
            originals.push((node.id.clone(), bounds.origin()));
        }
        if offsets.is_empty() {
            self.active = None;
            return false;
        }
        self.active = Some(DragState {
            grabbed: grabbed.to_string(),
            start_world: pointer_world,
            last_world: pointer_world,
            offsets,
            originals,
            has_dragged: false,
        });
        true
    }

    /// Move the formation to follow the pointer. Elements removed from the
    /// model since the drag began are skipped. Returns the ids that moved.
    pub fn update(&mut self, model: &mut DiagramModel, pointer_world: Point) -> Vec<ElementId> {
        let Some(state) = self.active.as_mut() else {
            return Vec::new();
        };
        state.has_dragged = true;
        state.last_world = pointer_world;
        state
            .offsets
            .iter()
            .filter(|(id, offset)| model.set_node_origin(id, pointer_world + *offset))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Finish the drag. The next click is suppressed if the pointer moved.
    pub fn end(&mut self) -> Option<DragOutcome> {
        let state = self.active.take()?;
        self.suppress_click = state.has_dragged;
        Some(DragOutcome {
            grabbed: state.grabbed,
            element_ids: state.offsets.into_iter().map(|(id, _)| id).collect(),
            has_dragged: state.has_dragged,
            delta: state.last_world - state.start_world,
        })
    }

    /// Abort the drag and put every node back where it started.
    pub fn cancel(&mut self, model: &mut DiagramModel) -> bool {
        let Some(state) = self.active.take() else {
            return false;
        };
        if state.has_dragged {
            for (id, origin) in &state.originals {
                model.set_node_origin(id, *origin);
            }
        }
        self.suppress_click = false;
        true
    }

    /// Drop all drag state without touching the model.
    pub fn clear(&mut self) {
        self.active = None;
        self.suppress_click = false;
    }

    /// Consume the one-shot click suppression flag.
    pub fn take_click_suppression(&mut self) -> bool {
        std::mem::take(&mut self.suppress_click)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds, Node};

    fn model() -> DiagramModel {
        let mut model = DiagramModel::new("workflow");
        model.add_element(Node::new("task", Bounds::new(0.0, 0.0, 50.0, 50.0)).with_id("a"));
        model.add_element(Node::new("task", Bounds::new(100.0, 30.0, 50.0, 50.0)).with_id("b"));
        model.add_element(Node::new("task", Bounds::new(400.0, 400.0, 50.0, 50.0)).with_id("c"));
        model
    }

    fn origin(model: &DiagramModel, id: &str) -> Point {
        model.node(id).and_then(|n| n.bounds).map(|b| b.origin()).unwrap()
    }

    fn selection(ids: &[&str]) -> HashSet<ElementId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_drag_preserves_formation() {
        let mut model = model();
        let mut drag = DragController::new();
        assert!(drag.begin(&model, &selection(&["a", "b"]), "a", Point::new(10.0, 10.0)));
        let before = origin(&model, "b") - origin(&model, "a");

        for p in [Point::new(40.0, 25.0), Point::new(-80.0, 300.0), Point::new(5.5, 7.25)] {
            let moved = drag.update(&mut model, p);
            assert_eq!(moved, vec!["a", "b"]);
            let after = origin(&model, "b") - origin(&model, "a");
            assert!((after - before).hypot() < 1e-10);
        }
        assert_eq!(origin(&model, "a"), Point::new(-4.5, -2.75));
        assert_eq!(origin(&model, "c"), Point::new(400.0, 400.0));
    }

    #[test]
    fn test_end_sets_click_suppression_once() {
        let mut model = model();
        let mut drag = DragController::new();
        drag.begin(&model, &selection(&["a"]), "a", Point::ZERO);
        drag.update(&mut model, Point::new(5.0, 0.0));
        let outcome = drag.end().unwrap();
        assert!(outcome.has_dragged);
        assert_eq!(outcome.delta, Vec2::new(5.0, 0.0));
        assert!(!drag.is_active());
        assert!(drag.take_click_suppression());
        assert!(!drag.take_click_suppression());
    }

    #[test]
    fn test_press_release_without_move() {
        let model = model();
        let mut drag = DragController::new();
        drag.begin(&model, &selection(&["a"]), "a", Point::ZERO);
        let outcome = drag.end().unwrap();
        assert!(!outcome.has_dragged);
        assert!(!drag.take_click_suppression());
        assert!(drag.end().is_none());
    }

    #[test]
    fn test_removed_element_is_skipped() {
        let mut model = model();
        let mut drag = DragController::new();
        drag.begin(&model, &selection(&["a", "b"]), "a", Point::ZERO);
        model.remove_element("b");
        let moved = drag.update(&mut model, Point::new(10.0, 10.0));
        assert_eq!(moved, vec!["a"]);
        assert_eq!(origin(&model, "a"), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_cancel_restores_positions() {
        let mut model = model();
        let mut drag = DragController::new();
        drag.begin(&model, &selection(&["a", "b"]), "b", Point::new(1.0, 1.0));
        drag.update(&mut model, Point::new(200.0, 200.0));
        assert!(drag.cancel(&mut model));
        assert_eq!(origin(&model, "a"), Point::new(0.0, 0.0));
        assert_eq!(origin(&model, "b"), Point::new(100.0, 30.0));
        assert!(!drag.take_click_suppression());
    }

    #[test]
    fn test_begin_with_nothing_movable() {
        let model = model();
        let mut drag = DragController::new();
        assert!(!drag.begin(&model, &selection(&["ghost"]), "ghost", Point::ZERO));
        assert!(!drag.is_active());
    }
}

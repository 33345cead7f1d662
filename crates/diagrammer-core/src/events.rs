//! High-level interaction events emitted by the engine.

use crate::input::Modifiers;
use crate::model::{ElementId, InterfaceDescriptor, ModelElement, PortSide};
use crate::ports::InterfaceLinkSource;
use kurbo::{Point, Vec2};
use serde::Serialize;

/// Events returned from [`DiagramCanvas`](crate::DiagramCanvas) input handlers.
///
/// Every position is in world coordinates. Serialized with a kebab-case
/// `type` tag (`"drag-start"`, `"interface-click"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum InteractionEvent {
    /// Select-mode click. `element` is `None` on empty canvas.
    Click {
        position: Point,
        element: Option<ModelElement>,
        modifiers: Modifiers,
    },
    /// The hovered element changed.
    Hover {
        position: Point,
        element: Option<ModelElement>,
    },
    DragStart {
        position: Point,
        element: ModelElement,
        element_ids: Vec<ElementId>,
    },
    DragMove {
        position: Point,
        element_ids: Vec<ElementId>,
        /// Movement since the drag started.
        delta: Vec2,
    },
    DragEnd {
        position: Point,
        element_ids: Vec<ElementId>,
        delta: Vec2,
    },
    /// Click on empty space in create-node mode.
    CanvasClick { position: Point, node_type: String },
    EdgeStart {
        position: Point,
        source: ModelElement,
        edge_type: String,
    },
    EdgeEnd {
        position: Point,
        source: ModelElement,
        target: ModelElement,
        edge_type: String,
    },
    /// Port click in create-interface-link mode. `link_source` carries the
    /// previously clicked port when this click completes a link.
    InterfaceClick {
        position: Point,
        component: ModelElement,
        interface: InterfaceDescriptor,
        side: PortSide,
        link_source: Option<InterfaceLinkSource>,
    },
}

impl InteractionEvent {
    /// Wire name of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            InteractionEvent::Click { .. } => "click",
            InteractionEvent::Hover { .. } => "hover",
            InteractionEvent::DragStart { .. } => "drag-start",
            InteractionEvent::DragMove { .. } => "drag-move",
            InteractionEvent::DragEnd { .. } => "drag-end",
            InteractionEvent::CanvasClick { .. } => "canvas-click",
            InteractionEvent::EdgeStart { .. } => "edge-start",
            InteractionEvent::EdgeEnd { .. } => "edge-end",
            InteractionEvent::InterfaceClick { .. } => "interface-click",
        }
    }

    pub fn position(&self) -> Point {
        match self {
            InteractionEvent::Click { position, .. }
            | InteractionEvent::Hover { position, .. }
            | InteractionEvent::DragStart { position, .. }
            | InteractionEvent::DragMove { position, .. }
            | InteractionEvent::DragEnd { position, .. }
            | InteractionEvent::CanvasClick { position, .. }
            | InteractionEvent::EdgeStart { position, .. }
            | InteractionEvent::EdgeEnd { position, .. }
            | InteractionEvent::InterfaceClick { position, .. } => *position,
        }
    }

    /// The element the event is about, if any.
    pub fn element(&self) -> Option<&ModelElement> {
        match self {
            InteractionEvent::Click { element, .. } | InteractionEvent::Hover { element, .. } => {
                element.as_ref()
            }
            InteractionEvent::DragStart { element, .. } => Some(element),
            InteractionEvent::EdgeStart { source, .. } => Some(source),
            InteractionEvent::EdgeEnd { target, .. } => Some(target),
            InteractionEvent::InterfaceClick { component, .. } => Some(component),
            InteractionEvent::DragMove { .. }
            | InteractionEvent::DragEnd { .. }
            | InteractionEvent::CanvasClick { .. } => None,
        }
    }
}

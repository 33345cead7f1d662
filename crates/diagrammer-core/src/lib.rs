//! Diagrammer Core Library
//!
//! Headless interaction and hit-testing engine for a node/edge diagram
//! canvas: model, viewport transforms, selection, interaction modes, drag,
//! edge routing and the event stream consumed by application logic.

pub mod config;
pub mod drag;
pub mod engine;
pub mod events;
pub mod geometry;
pub mod input;
pub mod mode;
pub mod model;
pub mod ports;
pub mod routing;
pub mod selection;
pub mod viewport;

pub use config::{CanvasConfig, ConfigError};
pub use drag::{DragController, DragOutcome};
pub use engine::DiagramCanvas;
pub use events::InteractionEvent;
pub use hit_test::HitTester;
pub use input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use mode::{InteractionMode, InteractionModeManager, UnknownModeError};
pub use model::{
    Bounds, DiagramModel, Edge, ElementId, InterfaceDescriptor, ModelElement, ModelError, Node,
    NodeProperties, PortSide,
};
pub use ports::{InterfaceLinkSource, Port, PortLayout, PortRef};
pub use routing::{EdgeStyle, RoutedEdge, arrowhead, route};
pub use selection::{SelectionManager, SelectionState};
pub use viewport::Viewport;

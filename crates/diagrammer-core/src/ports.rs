//! Interface port layout for component nodes.
//!
//! Imports run down the left edge, exports down the right edge. Each side
//! is indexed independently starting below a fixed header.

use crate::config::CanvasConfig;
use crate::model::{ElementId, InterfaceDescriptor, Node, PortSide};
use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortLayout {
    /// Distance from the node's top edge to the first port.
    pub header_offset: f64,
    /// Vertical distance between ports on the same side.
    pub spacing: f64,
}

impl PortLayout {
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            header_offset: config.port_header_offset,
            spacing: config.port_spacing,
        }
    }

    /// World positions of every port on a component node, imports first.
    /// Non-component nodes and nodes without bounds have no ports.
    pub fn ports<'a>(&self, node: &'a Node) -> Vec<Port<'a>> {
        let (Some(bounds), Some(component)) = (node.bounds, node.component()) else {
            return Vec::new();
        };
        let mut ports = Vec::with_capacity(component.interfaces.len());
        for side in [PortSide::Import, PortSide::Export] {
            let x = match side {
                PortSide::Import => bounds.x,
                PortSide::Export => bounds.x + bounds.width,
            };
            for (index, interface) in component.interfaces_on(side).enumerate() {
                ports.push(Port {
                    component_id: &node.id,
                    interface,
                    side,
                    index,
                    position: Point::new(
                        x,
                        bounds.y + self.header_offset + index as f64 * self.spacing,
                    ),
                });
            }
        }
        ports
    }
}

impl Default for PortLayout {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

/// A port borrowed from the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port<'a> {
    pub component_id: &'a str,
    pub interface: &'a InterfaceDescriptor,
    pub side: PortSide,
    /// Position among ports on the same side.
    pub index: usize,
    pub position: Point,
}

impl Port<'_> {
    pub fn port_ref(&self) -> PortRef {
        PortRef {
            component_id: self.component_id.to_string(),
            side: self.side,
            index: self.index,
        }
    }

    pub fn to_link_source(&self) -> InterfaceLinkSource {
        InterfaceLinkSource {
            component_id: self.component_id.to_string(),
            interface: self.interface.clone(),
            side: self.side,
            position: self.position,
        }
    }
}

/// Owned identity of a port, stable across model edits that keep the
/// component's interface list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub component_id: ElementId,
    pub side: PortSide,
    pub index: usize,
}

/// The first port clicked while linking interfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceLinkSource {
    pub component_id: ElementId,
    pub interface: InterfaceDescriptor,
    pub side: PortSide,
    /// World position of the port when it was clicked.
    pub position: Point,
}

impl InterfaceLinkSource {
    /// Whether both refer to the same interface on the same component side.
    pub fn same_port(&self, other: &InterfaceLinkSource) -> bool {
        self.component_id == other.component_id
            && self.side == other.side
            && self.interface.name == other.interface.name
    }
}

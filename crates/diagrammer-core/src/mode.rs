//! Interaction modes and their transient state.

use crate::config::CanvasConfig;
use crate::model::ModelElement;
use crate::ports::InterfaceLinkSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    #[default]
    Select,
    Pan,
    CreateNode,
    CreateEdge,
    CreateInterfaceLink,
}

impl InteractionMode {
    pub const ALL: [InteractionMode; 5] = [
        InteractionMode::Select,
        InteractionMode::Pan,
        InteractionMode::CreateNode,
        InteractionMode::CreateEdge,
        InteractionMode::CreateInterfaceLink,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Select => "select",
            InteractionMode::Pan => "pan",
            InteractionMode::CreateNode => "create-node",
            InteractionMode::CreateEdge => "create-edge",
            InteractionMode::CreateInterfaceLink => "create-interface-link",
        }
    }

    /// Whether clicks may select elements and start drags.
    pub fn allows_selection(&self) -> bool {
        matches!(self, InteractionMode::Select)
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown interaction mode: {0}")]
pub struct UnknownModeError(pub String);

impl FromStr for InteractionMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InteractionMode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnknownModeError(s.to_string()))
    }
}

/// Current mode plus the state scoped to it.
///
/// Switching mode drops any pending edge source or interface link.
#[derive(Debug, Clone)]
pub struct InteractionModeManager {
    mode: InteractionMode,
    /// Type tag for nodes created in `CreateNode`.
    pub selected_node_type: String,
    /// Type tag for edges created in `CreateEdge`.
    pub selected_edge_type: String,
    edge_creation_source: Option<ModelElement>,
    source_interface: Option<InterfaceLinkSource>,
}

impl Default for InteractionModeManager {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

impl InteractionModeManager {
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            mode: InteractionMode::default(),
            selected_node_type: config.default_node_type.clone(),
            selected_edge_type: config.default_edge_type.clone(),
            edge_creation_source: None,
            source_interface: None,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Enter a mode, resetting mode-scoped state. Returns the previous mode.
    pub fn set_mode(&mut self, mode: InteractionMode) -> InteractionMode {
        let previous = self.mode;
        self.mode = mode;
        self.reset_transient();
        previous
    }

    /// Drop pending edge and interface-link sources.
    pub fn reset_transient(&mut self) -> bool {
        let had = self.edge_creation_source.is_some() || self.source_interface.is_some();
        self.edge_creation_source = None;
        self.source_interface = None;
        had
    }

    pub fn edge_source(&self) -> Option<&ModelElement> {
        self.edge_creation_source.as_ref()
    }

    pub fn set_edge_source(&mut self, source: ModelElement) {
        self.edge_creation_source = Some(source);
    }

    pub fn take_edge_source(&mut self) -> Option<ModelElement> {
        self.edge_creation_source.take()
    }

    pub fn interface_source(&self) -> Option<&InterfaceLinkSource> {
        self.source_interface.as_ref()
    }

    pub fn set_interface_source(&mut self, source: InterfaceLinkSource) {
        self.source_interface = Some(source);
    }

    pub fn take_interface_source(&mut self) -> Option<InterfaceLinkSource> {
        self.source_interface.take()
    }

    /// Whether an edge or interface link is waiting for its second click.
    pub fn has_pending(&self) -> bool {
        self.edge_creation_source.is_some() || self.source_interface.is_some()
    }
}

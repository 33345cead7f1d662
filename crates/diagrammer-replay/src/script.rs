//! Gesture scripts.

use crate::{ReplayResult, read_file};
use diagrammer_core::{Modifiers, PointerEvent};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One scripted action against the canvas.
///
/// ```json
/// {"step": "pointer", "event": {"click": {"position": {"x": 50, "y": 30}, "button": "left"}},
///  "modifiers": {"shift": true}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum ScriptStep {
    /// Pointer event in screen coordinates, with the modifiers held.
    Pointer {
        event: PointerEvent,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Mode {
        name: String,
    },
    NodeType {
        name: String,
    },
    EdgeType {
        name: String,
    },
    Select {
        ids: Vec<String>,
    },
    /// Zoom by `factor` around a screen anchor (viewport centre if absent).
    Zoom {
        factor: f64,
        #[serde(default)]
        anchor: Option<Point>,
    },
    Pan {
        dx: f64,
        dy: f64,
    },
    Fit,
    ResetView,
    /// Press and release a key.
    Key {
        key: String,
    },
    Resize {
        width: f64,
        height: f64,
    },
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScript {
    Steps(Vec<ScriptStep>),
    Object(Script),
}

impl Script {
    /// Parse either `{"steps": [...]}` or a bare array of steps.
    pub fn from_json(json: &str) -> ReplayResult<Self> {
        let raw: RawScript = serde_json::from_str(json)?;
        Ok(match raw {
            RawScript::Steps(steps) => Script { steps },
            RawScript::Object(script) => script,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> ReplayResult<Self> {
        let script = Self::from_json(&read_file(path.as_ref())?)?;
        log::debug!(
            "Loaded {} script steps from {}",
            script.steps.len(),
            path.as_ref().display()
        );
        Ok(script)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

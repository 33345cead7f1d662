//! Diagrammer Replay
//!
//! Headless application shell: loads a diagram and a gesture script, feeds
//! the script through a [`DiagramCanvas`](diagrammer_core::DiagramCanvas)
//! and renders frames on demand.

mod script;
mod session;

pub use script::{Script, ScriptStep};
pub use session::{Replay, ReplayConfig};

use diagrammer_core::{CanvasConfig, ConfigError, DiagramModel, ModelError, UnknownModeError};
use diagrammer_render::RendererError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
    #[error("Invalid diagram: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid script: {0}")]
    Script(#[from] serde_json::Error),
    #[error(transparent)]
    Mode(#[from] UnknownModeError),
    #[error(transparent)]
    Render(#[from] RendererError),
}

pub type ReplayResult<T> = Result<T, ReplayError>;

pub(crate) fn read_file(path: &Path) -> ReplayResult<String> {
    std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a diagram JSON file.
pub fn load_diagram(path: impl AsRef<Path>) -> ReplayResult<DiagramModel> {
    let path = path.as_ref();
    let model = DiagramModel::from_json(&read_file(path)?)?;
    log::info!("Loaded {} elements from {}", model.len(), path.display());
    Ok(model)
}

/// Load and validate a canvas config JSON file.
pub fn load_config(path: impl AsRef<Path>) -> ReplayResult<CanvasConfig> {
    Ok(CanvasConfig::from_json(&read_file(path.as_ref())?)?)
}

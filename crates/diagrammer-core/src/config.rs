//! Engine configuration.

use crate::routing::EdgeStyle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or validating a [`CanvasConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Scale bounds must satisfy 0 < min_scale < max_scale (got {min}..{max})")]
    ScaleBounds { min: f64, max: f64 },
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
}

/// Tunable constants for the interaction engine.
///
/// Distances suffixed with `_px` are screen pixels and are divided by the
/// current scale before being compared against world geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Edge hit radius.
    pub hit_tolerance_px: f64,
    /// Interface port hit radius.
    pub port_radius_px: f64,
    /// Distance from a component's top edge to its first port, in world units.
    pub port_header_offset: f64,
    /// Vertical distance between consecutive ports, in world units.
    pub port_spacing: f64,
    /// Padding added around the content when computing scroll bounds.
    pub scroll_padding: f64,
    /// Extra horizontal room around component nodes for port labels.
    pub component_lateral_allowance: f64,
    pub fit_margin: f64,
    /// Multiplicative zoom per wheel notch or `zoom_in` call.
    pub zoom_step: f64,
    pub default_node_type: String,
    pub default_edge_type: String,
    pub edge_style: EdgeStyle,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            hit_tolerance_px: 8.0,
            port_radius_px: 8.0,
            port_header_offset: 40.0,
            port_spacing: 25.0,
            scroll_padding: 100.0,
            component_lateral_allowance: 120.0,
            fit_margin: 50.0,
            zoom_step: 1.1,
            default_node_type: "task".to_string(),
            default_edge_type: "flow".to_string(),
            edge_style: EdgeStyle::default(),
        }
    }
}

impl CanvasConfig {
    /// Parse a config from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_scale > 0.0 && self.min_scale < self.max_scale) {
            return Err(ConfigError::ScaleBounds {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        let positive = [
            ("hit_tolerance_px", self.hit_tolerance_px),
            ("port_radius_px", self.port_radius_px),
            ("port_spacing", self.port_spacing),
            ("zoom_step", self.zoom_step),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CanvasConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.min_scale - 0.1).abs() < f64::EPSILON);
        assert!((config.max_scale - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.default_node_type, "task");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CanvasConfig::from_json(r#"{"max_scale": 3.0, "edge_style": "orthogonal"}"#)
            .unwrap();
        assert!((config.max_scale - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.edge_style, EdgeStyle::Orthogonal);
        assert!((config.port_spacing - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_inverted_scale_bounds() {
        let err = CanvasConfig::from_json(r#"{"min_scale": 2.0, "max_scale": 1.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ScaleBounds { .. }));
    }

    #[test]
    fn test_rejects_non_positive_spacing() {
        let config = CanvasConfig {
            port_spacing: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "port_spacing", .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            CanvasConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}

//! Edge routing geometry.

use crate::geometry::midpoint;
use kurbo::{BezPath, Point, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an edge is routed between its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    /// Polyline through the routing points.
    #[default]
    Straight,
    /// Quadratic segments; an arc when there are no routing points.
    Curved,
    /// Axis-aligned segments; an L-shape when there are no routing points.
    Orthogonal,
    /// Single cubic curve.
    Bezier,
}

impl EdgeStyle {
    pub fn name(&self) -> &'static str {
        match self {
            EdgeStyle::Straight => "straight",
            EdgeStyle::Curved => "curved",
            EdgeStyle::Orthogonal => "orthogonal",
            EdgeStyle::Bezier => "bezier",
        }
    }
}

impl fmt::Display for EdgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EdgeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "straight" => Ok(EdgeStyle::Straight),
            "curved" => Ok(EdgeStyle::Curved),
            "orthogonal" => Ok(EdgeStyle::Orthogonal),
            "bezier" => Ok(EdgeStyle::Bezier),
            other => Err(format!("unknown edge style: {other}")),
        }
    }
}

/// Arc height as a fraction of the endpoint distance for curved edges
/// without routing points.
const ARC_BIAS: f64 = 0.2;

/// A routed edge path in world coordinates.
#[derive(Debug, Clone)]
pub struct RoutedEdge {
    pub path: BezPath,
    /// Point the path approaches the target from; arrowheads point from here.
    pub approach: Point,
}

/// Build the path for an edge. Output depends only on the inputs.
pub fn route(source: Point, target: Point, routing_points: &[Point], style: EdgeStyle) -> RoutedEdge {
    let mut path = BezPath::new();
    path.move_to(source);

    let approach = match style {
        EdgeStyle::Straight => {
            for &p in routing_points {
                path.line_to(p);
            }
            path.line_to(target);
            routing_points.last().copied().unwrap_or(source)
        }
        EdgeStyle::Curved => {
            if routing_points.is_empty() {
                let mid = midpoint(source, target);
                let ctrl = Point::new(mid.x, mid.y - source.distance(target) * ARC_BIAS);
                path.quad_to(ctrl, target);
                ctrl
            } else {
                let mut prev = source;
                let mut ctrl = source;
                for &p in routing_points.iter().chain(std::iter::once(&target)) {
                    ctrl = Point::new((prev.x + p.x) / 2.0, prev.y);
                    path.quad_to(ctrl, p);
                    prev = p;
                }
                ctrl
            }
        }
        EdgeStyle::Orthogonal => {
            if routing_points.is_empty() {
                let corner = Point::new(target.x, source.y);
                path.line_to(corner);
                path.line_to(target);
                if corner == target { source } else { corner }
            } else {
                for &p in routing_points {
                    path.line_to(p);
                }
                path.line_to(target);
                routing_points.last().copied().unwrap_or(source)
            }
        }
        EdgeStyle::Bezier => {
            let (c1, c2) = match routing_points {
                [a, b, ..] => (*a, *b),
                _ => {
                    let dx = target.x - source.x;
                    (
                        Point::new(source.x + dx * 0.25, source.y),
                        Point::new(source.x + dx * 0.75, target.y),
                    )
                }
            };
            path.curve_to(c1, c2, target);
            if c2 == target { c1 } else { c2 }
        }
    };

    RoutedEdge { path, approach }
}

/// Closed triangular arrowhead with its tip at `tip`, pointing away from `from`.
pub fn arrowhead(tip: Point, from: Point, size: f64) -> Option<BezPath> {
    let dir = Vec2::new(tip.x - from.x, tip.y - from.y);
    let len = dir.hypot();
    if len < f64::EPSILON {
        return None;
    }
    let dir = dir / len;
    let perp = Vec2::new(-dir.y, dir.x);
    let back = tip - dir * size;
    let left = back + perp * (size * 0.5);
    let right = back - perp * (size * 0.5);

    let mut path = BezPath::new();
    path.move_to(tip);
    path.line_to(left);
    path.line_to(right);
    path.close_path();
    Some(path)
}

/// Where a straight line from `center` towards `toward` leaves `rect`.
///
/// Used to stop edges at node borders instead of centres.
pub fn clip_to_rect(center: Point, toward: Point, rect: kurbo::Rect) -> Point {
    let d = toward - center;
    if d.hypot() < f64::EPSILON {
        return center;
    }
    let hw = rect.width() / 2.0;
    let hh = rect.height() / 2.0;
    let tx = if d.x.abs() > f64::EPSILON { hw / d.x.abs() } else { f64::INFINITY };
    let ty = if d.y.abs() > f64::EPSILON { hh / d.y.abs() } else { f64::INFINITY };
    let t = tx.min(ty).min(1.0);
    center + d * t
}

//! Diagram model: nodes, edges and the ordered element map.
//!
//! Raw GLSP-style JSON is resolved once at load into [`ModelElement`], a tagged
//! union with typed per-category node properties. The original property bag
//! is kept alongside so documents round-trip unchanged.

use crate::routing::EdgeStyle;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a model element.
pub type ElementId = String;

/// Type tag of the root element in GLSP documents; it is never drawn.
pub const GRAPH_ROOT_TYPE: &str = "graph";

/// Size given to nodes created without explicit bounds.
pub const DEFAULT_NODE_WIDTH: f64 = 100.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 50.0;

/// Errors produced while loading or editing a diagram model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid diagram JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Duplicate element id: {0}")]
    DuplicateId(ElementId),
    #[error("Element of type '{0}' has no id")]
    MissingId(String),
    #[error("Edge {0} must have both sourceId and targetId")]
    HalfEdge(ElementId),
    #[error("Element {id} has malformed properties: {reason}")]
    MalformedProperties { id: ElementId, reason: String },
}

/// Axis-aligned bounds in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive containment on all four edges.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.x = origin.x;
        self.y = origin.y;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// Which side of a component an interface port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSide {
    /// Imported interfaces, laid out down the left edge.
    Import,
    /// Exported interfaces, laid out down the right edge.
    Export,
}

impl PortSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortSide::Import => "import",
            PortSide::Export => "export",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParam {
    pub name: String,
    #[serde(default, alias = "type", alias = "paramType")]
    pub param_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceFunction {
    pub name: String,
    #[serde(default)]
    pub params: Vec<FunctionParam>,
    #[serde(default)]
    pub returns: Vec<FunctionParam>,
}

/// An interface imported or exported by a component node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    pub name: String,
    #[serde(rename = "interface_type", alias = "interfaceType")]
    pub side: PortSide,
    #[serde(default)]
    pub functions: Vec<InterfaceFunction>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentProperties {
    pub component_name: Option<String>,
    pub description: Option<String>,
    pub interfaces: Vec<InterfaceDescriptor>,
}

impl ComponentProperties {
    /// Interfaces on one side, in declaration order.
    pub fn interfaces_on(&self, side: PortSide) -> impl Iterator<Item = &InterfaceDescriptor> {
        self.interfaces.iter().filter(move |i| i.side == side)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WitInterfaceProperties {
    pub interface_name: Option<String>,
    pub package: Option<String>,
    pub functions: Vec<InterfaceFunction>,
}

/// Typed node properties, resolved from the raw property bag at load.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeProperties {
    Component(ComponentProperties),
    WitInterface(WitInterfaceProperties),
    #[default]
    Basic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: ElementId,
    pub element_type: String,
    pub bounds: Option<Bounds>,
    pub label: Option<String>,
    pub properties: NodeProperties,
    /// Raw property bag as loaded, used when serializing back out.
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(element_type: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            element_type: element_type.into(),
            bounds: Some(bounds),
            label: None,
            properties: NodeProperties::Basic,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_properties(mut self, properties: NodeProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn component(&self) -> Option<&ComponentProperties> {
        match &self.properties {
            NodeProperties::Component(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: ElementId,
    pub element_type: String,
    pub source_id: ElementId,
    pub target_id: ElementId,
    pub routing_points: Vec<Point>,
    pub label: Option<String>,
    /// Per-edge routing override (`routingStyle` property).
    pub routing_style: Option<EdgeStyle>,
    pub extra: Map<String, Value>,
}

impl Edge {
    pub fn new(
        element_type: impl Into<String>,
        source_id: impl Into<ElementId>,
        target_id: impl Into<ElementId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            element_type: element_type.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            routing_points: Vec::new(),
            label: None,
            routing_style: None,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_routing_points(mut self, points: Vec<Point>) -> Self {
        self.routing_points = points;
        self
    }
}

/// A diagram element: either a node or an edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawElement", into = "RawElement")]
pub enum ModelElement {
    Node(Node),
    Edge(Edge),
}

impl ModelElement {
    pub fn id(&self) -> &str {
        match self {
            ModelElement::Node(n) => &n.id,
            ModelElement::Edge(e) => &e.id,
        }
    }

    pub fn element_type(&self) -> &str {
        match self {
            ModelElement::Node(n) => &n.element_type,
            ModelElement::Edge(e) => &e.element_type,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ModelElement::Node(n) => n.label.as_deref(),
            ModelElement::Edge(e) => e.label.as_deref(),
        }
    }

    /// Bounds of a node; edges have none.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            ModelElement::Node(n) => n.bounds,
            ModelElement::Edge(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            ModelElement::Node(n) => Some(n),
            ModelElement::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            ModelElement::Edge(e) => Some(e),
            ModelElement::Node(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, ModelElement::Node(_))
    }

    pub fn is_edge(&self) -> bool {
        matches!(self, ModelElement::Edge(_))
    }
}

impl From<Node> for ModelElement {
    fn from(node: Node) -> Self {
        ModelElement::Node(node)
    }
}

impl From<Edge> for ModelElement {
    fn from(edge: Edge) -> Self {
        ModelElement::Edge(edge)
    }
}

/// Element as it appears on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawElement {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", alias = "element_type", default)]
    element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(
        rename = "sourceId",
        alias = "source_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    source_id: Option<String>,
    #[serde(
        rename = "targetId",
        alias = "target_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    target_id: Option<String>,
    #[serde(
        rename = "routingPoints",
        alias = "routing_points",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    routing_points: Option<Vec<Point>>,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

fn str_prop(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| props.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn typed_prop<T: serde::de::DeserializeOwned>(
    id: &str,
    props: &Map<String, Value>,
    key: &str,
) -> Result<Option<T>, ModelError> {
    match props.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| ModelError::MalformedProperties {
                id: id.to_string(),
                reason: format!("{key}: {e}"),
            }),
    }
}

/// Whether a type tag denotes a component node with interface ports.
pub fn is_component_type(element_type: &str) -> bool {
    matches!(element_type, "wasm-component" | "component")
}

fn resolve_node_properties(
    id: &str,
    element_type: &str,
    props: &Map<String, Value>,
) -> Result<NodeProperties, ModelError> {
    if is_component_type(element_type) {
        Ok(NodeProperties::Component(ComponentProperties {
            component_name: str_prop(props, &["componentName", "component_name"]),
            description: str_prop(props, &["description"]),
            interfaces: typed_prop(id, props, "interfaces")?.unwrap_or_default(),
        }))
    } else if element_type == "wit-interface" {
        Ok(NodeProperties::WitInterface(WitInterfaceProperties {
            interface_name: str_prop(props, &["interfaceName", "interface_name", "name"]),
            package: str_prop(props, &["package", "packageName"]),
            functions: typed_prop(id, props, "functions")?.unwrap_or_default(),
        }))
    } else {
        Ok(NodeProperties::Basic)
    }
}

/// Older documents carry `position` and `size` instead of `bounds`.
fn legacy_bounds(props: &mut Map<String, Value>) -> Option<Bounds> {
    let pos = props.get("position")?;
    let x = pos.get("x")?.as_f64()?;
    let y = pos.get("y")?.as_f64()?;
    let (width, height) = match props.get("size") {
        Some(size) => (
            size.get("width").and_then(Value::as_f64)?,
            size.get("height").and_then(Value::as_f64)?,
        ),
        None => (DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT),
    };
    props.remove("position");
    props.remove("size");
    Some(Bounds::new(x, y, width, height))
}

impl TryFrom<RawElement> for ModelElement {
    type Error = ModelError;

    fn try_from(raw: RawElement) -> Result<Self, Self::Error> {
        let RawElement {
            id,
            element_type,
            bounds,
            label,
            source_id,
            target_id,
            routing_points,
            mut properties,
        } = raw;
        if id.is_empty() {
            return Err(ModelError::MissingId(element_type));
        }
        match (source_id, target_id) {
            (Some(source_id), Some(target_id)) => {
                let routing_style = match str_prop(&properties, &["routingStyle", "edgeStyle"]) {
                    Some(name) => match name.parse::<EdgeStyle>() {
                        Ok(style) => Some(style),
                        Err(_) => {
                            log::warn!("Edge {id}: unknown routing style '{name}', using default");
                            None
                        }
                    },
                    None => None,
                };
                Ok(ModelElement::Edge(Edge {
                    id,
                    element_type,
                    source_id,
                    target_id,
                    routing_points: routing_points.unwrap_or_default(),
                    label,
                    routing_style,
                    extra: properties,
                }))
            }
            (None, None) => {
                let bounds = bounds.or_else(|| legacy_bounds(&mut properties));
                let node_props = resolve_node_properties(&id, &element_type, &properties)?;
                Ok(ModelElement::Node(Node {
                    id,
                    element_type,
                    bounds,
                    label,
                    properties: node_props,
                    extra: properties,
                }))
            }
            _ => Err(ModelError::HalfEdge(id)),
        }
    }
}

impl From<ModelElement> for RawElement {
    fn from(element: ModelElement) -> Self {
        match element {
            ModelElement::Node(n) => RawElement {
                id: n.id,
                element_type: n.element_type,
                bounds: n.bounds,
                label: n.label,
                properties: n.extra,
                ..Default::default()
            },
            ModelElement::Edge(e) => RawElement {
                id: e.id,
                element_type: e.element_type,
                label: e.label,
                source_id: Some(e.source_id),
                target_id: Some(e.target_id),
                routing_points: (!e.routing_points.is_empty()).then_some(e.routing_points),
                properties: e.extra,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawElements {
    List(Vec<RawElement>),
    Map(BTreeMap<String, RawElement>),
}

impl Default for RawElements {
    fn default() -> Self {
        RawElements::List(Vec::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDiagram {
    #[serde(default)]
    id: String,
    #[serde(default, alias = "diagramType")]
    diagram_type: String,
    #[serde(default)]
    revision: u32,
    #[serde(default)]
    elements: RawElements,
}

/// The element map the engine reads from and the drag writes node bounds into.
///
/// Iteration follows insertion order, which is also the hit-test tie-break
/// for overlapping nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDiagram", into = "RawDiagram")]
pub struct DiagramModel {
    pub id: String,
    pub diagram_type: String,
    /// Bumped on every mutation.
    pub revision: u32,
    elements: HashMap<ElementId, ModelElement>,
    order: Vec<ElementId>,
}

impl Default for DiagramModel {
    fn default() -> Self {
        Self::new("workflow")
    }
}

impl DiagramModel {
    pub fn new(diagram_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            diagram_type: diagram_type.into(),
            revision: 0,
            elements: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let raw: RawDiagram = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Insert an element, replacing any element with the same id in place.
    pub fn add_element(&mut self, element: impl Into<ModelElement>) -> Option<ModelElement> {
        let element = element.into();
        let id = element.id().to_string();
        let previous = self.elements.insert(id.clone(), element);
        if previous.is_none() {
            self.order.push(id);
        }
        self.revision += 1;
        previous
    }

    pub fn remove_element(&mut self, id: &str) -> Option<ModelElement> {
        let removed = self.elements.remove(id)?;
        self.order.retain(|o| o != id);
        self.revision += 1;
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&ModelElement> {
        self.elements.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.get(id).and_then(ModelElement::as_node)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &ModelElement> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &ElementId> {
        self.order.iter()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.elements().filter_map(ModelElement::as_node)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.elements().filter_map(ModelElement::as_edge)
    }

    /// Move a node's top-left corner. Returns false when the id is not a
    /// node with bounds.
    pub fn set_node_origin(&mut self, id: &str, origin: Point) -> bool {
        let Some(ModelElement::Node(node)) = self.elements.get_mut(id) else {
            return false;
        };
        let Some(bounds) = node.bounds.as_mut() else {
            return false;
        };
        bounds.set_origin(origin);
        self.revision += 1;
        true
    }

    /// Centres of an edge's endpoints, or `None` if either endpoint is
    /// missing or has no bounds.
    pub fn edge_endpoints(&self, edge: &Edge) -> Option<(Point, Point)> {
        let source = self.node(&edge.source_id)?.bounds?;
        let target = self.node(&edge.target_id)?.bounds?;
        Some((source.center(), target.center()))
    }

    /// Source centre, routing points, target centre.
    pub fn edge_polyline(&self, edge: &Edge) -> Option<Vec<Point>> {
        let (source, target) = self.edge_endpoints(edge)?;
        let mut points = Vec::with_capacity(edge.routing_points.len() + 2);
        points.push(source);
        points.extend_from_slice(&edge.routing_points);
        points.push(target);
        Some(points)
    }

    /// Union of all node bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes()
            .filter_map(|n| n.bounds)
            .map(|b| b.to_rect())
            .reduce(|a, b| a.union(b))
    }
}

impl TryFrom<RawDiagram> for DiagramModel {
    type Error = ModelError;

    fn try_from(raw: RawDiagram) -> Result<Self, Self::Error> {
        let raw_elements: Vec<RawElement> = match raw.elements {
            RawElements::List(list) => list,
            RawElements::Map(map) => map
                .into_iter()
                .map(|(key, mut el)| {
                    if el.id.is_empty() {
                        el.id = key;
                    }
                    el
                })
                .collect(),
        };

        let mut model = DiagramModel::new(raw.diagram_type);
        if !raw.id.is_empty() {
            model.id = raw.id;
        }
        let mut seen = HashSet::new();
        for raw_el in raw_elements {
            if raw_el.element_type == GRAPH_ROOT_TYPE {
                continue;
            }
            let element = ModelElement::try_from(raw_el)?;
            if !seen.insert(element.id().to_string()) {
                return Err(ModelError::DuplicateId(element.id().to_string()));
            }
            model.add_element(element);
        }
        model.revision = raw.revision;
        Ok(model)
    }
}

impl From<DiagramModel> for RawDiagram {
    fn from(mut model: DiagramModel) -> Self {
        let elements = model
            .order
            .iter()
            .filter_map(|id| model.elements.remove(id))
            .map(RawElement::from)
            .collect();
        RawDiagram {
            id: model.id,
            diagram_type: model.diagram_type,
            revision: model.revision,
            elements: RawElements::List(elements),
        }
    }
}

//! Core data structures for the class dependency graph

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Opaque, stable identifier for a structural element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

/// What kind of structural element a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    #[default]
    Class,
    Interface,
    Struct,
    Enum,
    Union,
    Concept,
    #[serde(other)]
    Other,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Class => "class",
            ElementKind::Interface => "interface",
            ElementKind::Struct => "struct",
            ElementKind::Enum => "enum",
            ElementKind::Union => "union",
            ElementKind::Concept => "concept",
            ElementKind::Other => "other",
        }
    }

    /// Lenient conversion used by the parsers; unknown kinds become `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "class" => ElementKind::Class,
            "interface" => ElementKind::Interface,
            "struct" => ElementKind::Struct,
            "enum" => ElementKind::Enum,
            "union" => ElementKind::Union,
            "concept" => ElementKind::Concept,
            _ => ElementKind::Other,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    /// Inheritance.
    Extension,
    Composition,
    Aggregation,
    Association,
    Dependency,
    #[default]
    #[serde(other)]
    Other,
}

impl RelationshipKind {
    /// Coupling weight of this relationship kind. Stronger coupling weighs more.
    pub fn weight(&self) -> f64 {
        match self {
            RelationshipKind::Extension => 2.0,
            RelationshipKind::Composition => 1.8,
            RelationshipKind::Aggregation => 1.5,
            RelationshipKind::Association => 1.2,
            RelationshipKind::Dependency => 0.8,
            RelationshipKind::Other => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Extension => "extension",
            RelationshipKind::Composition => "composition",
            RelationshipKind::Aggregation => "aggregation",
            RelationshipKind::Association => "association",
            RelationshipKind::Dependency => "dependency",
            RelationshipKind::Other => "other",
        }
    }

    /// Lenient conversion used by the parsers; unknown kinds become `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "extension" => RelationshipKind::Extension,
            "composition" => RelationshipKind::Composition,
            "aggregation" => RelationshipKind::Aggregation,
            "association" => RelationshipKind::Association,
            "dependency" => RelationshipKind::Dependency,
            _ => RelationshipKind::Other,
        }
    }
}

/// Element record handed over by the structural-export parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ElementRecord {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub display_name: String,
    pub namespace: String,
    pub kind: ElementKind,
    pub is_abstract: bool,
    pub is_template: bool,
    pub member_count: u32,
    pub method_count: u32,
    pub complexity_score: f64,
    /// Field signatures for rendering, e.g. `-id : int`.
    pub members: Vec<String>,
    /// Method signatures for rendering, e.g. `+find(int) : Order`.
    pub methods: Vec<String>,
}

/// Relationship record handed over by the structural-export parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelationshipRecord {
    pub source: String,
    pub destination: String,
    pub kind: RelationshipKind,
    pub label: Option<String>,
    pub access: Option<String>,
}

/// A single class-like node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub name: String,
    pub display_name: String,
    pub full_name: String,
    pub namespace: String,
    pub kind: ElementKind,
    pub is_abstract: bool,
    pub is_template: bool,
    pub member_count: u32,
    pub method_count: u32,
    /// Precomputed complexity, never negative.
    pub complexity: f64,
    pub members: Vec<String>,
    pub methods: Vec<String>,
}

impl GraphNode {
    /// True when `name` is this node's short, display or fully qualified name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name || self.display_name == name || self.full_name == name
    }
}

impl From<&ElementRecord> for GraphNode {
    fn from(record: &ElementRecord) -> Self {
        let display_name = if record.display_name.is_empty() {
            record.name.clone()
        } else {
            record.display_name.clone()
        };
        GraphNode {
            id: NodeId::new(record.id.clone()),
            name: record.name.clone(),
            display_name,
            full_name: record.full_name.clone(),
            namespace: record.namespace.clone(),
            kind: record.kind,
            is_abstract: record.is_abstract,
            is_template: record.is_template,
            member_count: record.member_count,
            method_count: record.method_count,
            complexity: record.complexity_score.max(0.0),
            members: record.members.clone(),
            methods: record.methods.clone(),
        }
    }
}

/// A directed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: RelationshipKind,
    pub label: Option<String>,
    pub access: Option<String>,
    /// Derived from `kind`, see [`RelationshipKind::weight`].
    pub weight: f64,
}

impl From<&RelationshipRecord> for GraphEdge {
    fn from(record: &RelationshipRecord) -> Self {
        GraphEdge {
            source: NodeId::new(record.source.clone()),
            target: NodeId::new(record.destination.clone()),
            kind: record.kind,
            label: record.label.clone(),
            access: record.access.clone(),
            weight: record.kind.weight(),
        }
    }
}

/// Which edges a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraversalDirection {
    /// Predecessors: nodes that depend on the current node.
    In,
    /// Successors: nodes the current node depends on.
    Out,
    #[default]
    Both,
}

impl TraversalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraversalDirection::In => "in",
            TraversalDirection::Out => "out",
            TraversalDirection::Both => "both",
        }
    }
}

impl FromStr for TraversalDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(TraversalDirection::In),
            "out" => Ok(TraversalDirection::Out),
            "both" => Ok(TraversalDirection::Both),
            other => Err(CoreError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for TraversalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

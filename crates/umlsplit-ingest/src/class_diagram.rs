//! clang-uml class diagram JSON parser
//!
//! Elements nested in namespace/package/directory/module containers are
//! flattened; the containers themselves never become elements.

use crate::error::{IngestError, Result, read_file};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use umlsplit_core::{ElementKind, ElementRecord, Graph, RelationshipKind, RelationshipRecord};

const CONTAINER_KINDS: [&str; 4] = ["namespace", "package", "directory", "module"];

/// A parsed class diagram.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDiagram {
    pub name: String,
    pub diagram_type: String,
    pub elements: Vec<ElementRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub metadata: Map<String, Value>,
}

/// Counts reported by [`ClassDiagram::statistics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDiagramStatistics {
    pub total_elements: usize,
    pub total_relationships: usize,
    pub namespace_count: usize,
    /// Element count per kind name.
    pub element_kinds: BTreeMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct RawDiagram {
    name: Option<String>,
    diagram_type: Option<String>,
    #[serde(default)]
    elements: Vec<RawElement>,
    #[serde(default)]
    relationships: Vec<RawRelationship>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    display_name: Option<String>,
    #[serde(default)]
    namespace: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    is_template: bool,
    #[serde(default)]
    members: Vec<Value>,
    #[serde(default)]
    methods: Vec<Value>,
    #[serde(default)]
    elements: Vec<RawElement>,
    complexity_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    #[serde(default)]
    source: String,
    #[serde(default)]
    destination: String,
    #[serde(rename = "type", default)]
    kind: String,
    label: Option<String>,
    access: Option<String>,
}

impl RawElement {
    fn is_container(&self) -> bool {
        CONTAINER_KINDS.contains(&self.kind.as_str())
    }

    fn into_record(self) -> ElementRecord {
        let member_count = self.members.len() as u32;
        let method_count = self.methods.len() as u32;
        let full_name = if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace, self.name)
        };
        let complexity_score = self
            .complexity_score
            .unwrap_or_else(|| derived_complexity(member_count, method_count));

        ElementRecord {
            display_name: self.display_name.unwrap_or_else(|| self.name.clone()),
            kind: ElementKind::from_name(&self.kind),
            id: self.id,
            name: self.name,
            full_name,
            namespace: self.namespace,
            is_abstract: self.is_abstract,
            is_template: self.is_template,
            member_count,
            method_count,
            complexity_score,
            members: self.members.iter().filter_map(member_signature).collect(),
            methods: self.methods.iter().filter_map(method_signature).collect(),
        }
    }
}

/// `-count : int`; `None` for entries without a name.
fn member_signature(member: &Value) -> Option<String> {
    let name = member.get("name")?.as_str()?;
    Some(match type_name(member) {
        Some(ty) => format!("{}{} : {}", access_symbol(member), name, ty),
        None => format!("{}{}", access_symbol(member), name),
    })
}

/// `+find(int, const std::string &) : Order *`; `None` for entries without a name.
fn method_signature(method: &Value) -> Option<String> {
    let name = method.get("name")?.as_str()?;
    let parameters: Vec<&str> = method
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| params.iter().filter_map(type_name).collect())
        .unwrap_or_default();
    let signature = format!("{}{}({})", access_symbol(method), name, parameters.join(", "));
    Some(match type_name(method) {
        Some(ty) => format!("{} : {}", signature, ty),
        None => signature,
    })
}

fn type_name(value: &Value) -> Option<&str> {
    value
        .get("type")
        .and_then(Value::as_str)
        .filter(|ty| !ty.is_empty())
}

fn access_symbol(value: &Value) -> &'static str {
    match value.get("access").and_then(Value::as_str) {
        Some("public") => "+",
        Some("protected") => "#",
        Some("private") => "-",
        _ => "",
    }
}

/// Methods count twice as much as fields.
fn derived_complexity(member_count: u32, method_count: u32) -> f64 {
    f64::from(member_count) + 2.0 * f64::from(method_count)
}

fn flatten(raw: Vec<RawElement>, out: &mut Vec<ElementRecord>) {
    for mut element in raw {
        let children = std::mem::take(&mut element.elements);
        if element.is_container() {
            tracing::debug!("Descending into {} {}", element.kind, element.name);
        } else if element.id.is_empty() {
            tracing::warn!("Skipping element {:?} without an id", element.name);
        } else {
            out.push(element.into_record());
        }
        flatten(children, out);
    }
}

impl ClassDiagram {
    /// Parse class diagram JSON. `fallback_name` is used when the export carries no name.
    pub fn parse(json: &str, fallback_name: &str) -> Result<Self> {
        let raw: RawDiagram = serde_json::from_str(json)?;

        let diagram_type = raw.diagram_type.unwrap_or_else(|| "class".to_string());
        if diagram_type != "class" {
            return Err(IngestError::UnsupportedDiagramType {
                expected: "class",
                found: diagram_type,
            });
        }

        let mut elements = Vec::new();
        flatten(raw.elements, &mut elements);

        let relationships: Vec<RelationshipRecord> = raw
            .relationships
            .into_iter()
            .map(|r| RelationshipRecord {
                kind: RelationshipKind::from_name(&r.kind),
                source: r.source,
                destination: r.destination,
                label: r.label,
                access: r.access,
            })
            .collect();

        let diagram = ClassDiagram {
            name: raw.name.unwrap_or_else(|| fallback_name.to_string()),
            diagram_type,
            elements,
            relationships,
            metadata: raw.metadata,
        };
        tracing::info!(
            "Parsed class diagram {}: {} elements, {} relationships",
            diagram.name,
            diagram.elements.len(),
            diagram.relationships.len()
        );
        Ok(diagram)
    }

    /// Read and parse a class diagram file; the file stem names the diagram when the export does not.
    pub fn load(path: &Path) -> Result<Self> {
        let json = read_file(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(&json, &stem)
    }

    /// Sorted distinct non-empty namespaces.
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.elements
            .iter()
            .filter(|e| !e.namespace.is_empty())
            .map(|e| e.namespace.clone())
            .collect()
    }

    pub fn statistics(&self) -> ClassDiagramStatistics {
        let mut element_kinds = BTreeMap::new();
        for element in &self.elements {
            *element_kinds.entry(element.kind.to_string()).or_insert(0) += 1;
        }

        ClassDiagramStatistics {
            total_elements: self.elements.len(),
            total_relationships: self.relationships.len(),
            namespace_count: self.namespaces().len(),
            element_kinds,
        }
    }

    pub fn build_graph(&self) -> Graph {
        Graph::from_records(&self.elements, &self.relationships)
    }
}

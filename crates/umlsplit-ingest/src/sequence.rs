//! clang-uml sequence diagram JSON parser

use crate::error::{IngestError, Result, read_file};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use umlsplit_core::{ElementKind, ElementRecord, RelationshipKind, RelationshipRecord};

/// Keys under which nested message items live.
const NESTED_BLOCKS: [&str; 5] = ["messages", "if_blocks", "else_blocks", "case_blocks", "loop_blocks"];

/// A class, function or method taking part in a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_participant_kind")]
    pub kind: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

fn default_participant_kind() -> String {
    "class".to_string()
}

impl Participant {
    pub fn full_name(&self) -> String {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => format!("{}::{}", ns, self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Call,
    Return,
}

/// One call or return between two participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub from_id: String,
    pub to_id: String,
    pub name: String,
    pub kind: MessageKind,
    pub scope: Option<String>,
    pub return_type: Option<String>,
    pub source_location: Option<Value>,
}

/// A parsed sequence diagram with messages flattened in traversal order.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceDiagram {
    pub name: String,
    pub diagram_type: String,
    /// In export order.
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,
    pub metadata: Map<String, Value>,
    pub start_from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceStatistics {
    pub diagram_name: String,
    pub diagram_type: String,
    pub total_participants: usize,
    pub total_messages: usize,
    pub start_from: Option<String>,
    pub clang_uml_version: Option<String>,
    pub llvm_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDiagram {
    name: Option<String>,
    diagram_type: Option<String>,
    #[serde(default)]
    participants: Vec<Participant>,
    #[serde(default)]
    sequences: Vec<Value>,
    #[serde(default)]
    metadata: Map<String, Value>,
    start_from: Option<Value>,
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(str::to_string)
}

fn endpoint_id(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(|endpoint| endpoint.get("id"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Depth-first: the item itself, then every nested block in key order.
fn extract_messages(item: &Value, out: &mut Vec<Message>) {
    let kind = match item.get("type").and_then(Value::as_str) {
        Some("call") => Some(MessageKind::Call),
        Some("return") => Some(MessageKind::Return),
        _ => None,
    };
    if let Some(kind) = kind {
        out.push(Message {
            from_id: endpoint_id(item, "from"),
            to_id: endpoint_id(item, "to"),
            name: string_field(item, "name").unwrap_or_default(),
            kind,
            scope: string_field(item, "scope"),
            return_type: string_field(item, "return_type"),
            source_location: item.get("source_location").cloned(),
        });
    }

    for key in NESTED_BLOCKS {
        if let Some(Value::Array(children)) = item.get(key) {
            for child in children {
                extract_messages(child, out);
            }
        }
    }
}

impl SequenceDiagram {
    /// Parse sequence diagram JSON. `fallback_name` is used when the export carries no name.
    pub fn parse(json: &str, fallback_name: &str) -> Result<Self> {
        let raw: RawDiagram = serde_json::from_str(json)?;

        let diagram_type = raw.diagram_type.unwrap_or_else(|| "sequence".to_string());
        if diagram_type != "sequence" {
            return Err(IngestError::UnsupportedDiagramType {
                expected: "sequence",
                found: diagram_type,
            });
        }

        let mut messages = Vec::new();
        for item in &raw.sequences {
            extract_messages(item, &mut messages);
        }

        let start_from = match raw.start_from {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        let diagram = SequenceDiagram {
            name: raw.name.unwrap_or_else(|| fallback_name.to_string()),
            diagram_type,
            participants: raw.participants,
            messages,
            metadata: raw.metadata,
            start_from,
        };
        tracing::info!(
            "Parsed sequence diagram {}: {} participants, {} messages",
            diagram.name,
            diagram.participants.len(),
            diagram.messages.len()
        );
        Ok(diagram)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = read_file(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(&json, &stem)
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// First participant whose name or full name matches.
    pub fn participant_by_name(&self, name: &str) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.name == name || p.full_name() == name)
    }

    pub fn calls_from(&self, participant_id: &str) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.from_id == participant_id).collect()
    }

    pub fn calls_to(&self, participant_id: &str) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.to_id == participant_id).collect()
    }

    pub fn statistics(&self) -> SequenceStatistics {
        let version = |key: &str| self.metadata.get(key).and_then(Value::as_str).map(str::to_string);
        SequenceStatistics {
            diagram_name: self.name.clone(),
            diagram_type: self.diagram_type.clone(),
            total_participants: self.participants.len(),
            total_messages: self.messages.len(),
            start_from: self.start_from.clone(),
            clang_uml_version: version("clang_uml_version"),
            llvm_version: version("llvm_version"),
        }
    }

    /// The trace as a call graph: participants become elements and each
    /// distinct (caller, callee, method) call becomes a dependency.
    ///
    /// A participant's method count is the number of distinct methods called
    /// on it; complexity follows the class-diagram rule.
    pub fn call_graph_records(&self) -> (Vec<ElementRecord>, Vec<RelationshipRecord>) {
        let mut invoked: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut seen = HashSet::new();
        let mut relationships = Vec::new();

        for message in self.messages.iter().filter(|m| m.kind == MessageKind::Call) {
            invoked
                .entry(message.to_id.as_str())
                .or_default()
                .insert(message.name.as_str());
            if !seen.insert((message.from_id.as_str(), message.to_id.as_str(), message.name.as_str())) {
                continue;
            }
            relationships.push(RelationshipRecord {
                source: message.from_id.clone(),
                destination: message.to_id.clone(),
                kind: RelationshipKind::Dependency,
                label: (!message.name.is_empty()).then(|| message.name.clone()),
                access: message.scope.clone(),
            });
        }

        let elements = self
            .participants
            .iter()
            .map(|p| {
                let method_count = invoked.get(p.id.as_str()).map_or(0, |m| m.len() as u32);
                ElementRecord {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    full_name: p.full_name(),
                    display_name: p.display_name.clone().unwrap_or_else(|| p.name.clone()),
                    namespace: p.namespace.clone().unwrap_or_default(),
                    kind: ElementKind::from_name(&p.kind),
                    method_count,
                    complexity_score: 2.0 * f64::from(method_count),
                    ..Default::default()
                }
            })
            .collect();

        (elements, relationships)
    }
}

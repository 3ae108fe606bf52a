//! PlantUML writers for class views and sequence diagrams

use crate::config::DiagramConfig;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use umlsplit_core::{ElementKind, Graph, GraphNode, NodeId, NodeSet, RelationshipKind, file_stem};
use umlsplit_ingest::{MessageKind, SequenceDiagram};

pub const EXTENSION: &str = "puml";

fn class_alias(id: &NodeId) -> String {
    format!("C_{}", file_stem(id.as_str()))
}

fn participant_alias(id: &str) -> String {
    format!("P_{}", file_stem(id))
}

fn arrow(kind: RelationshipKind) -> &'static str {
    match kind {
        RelationshipKind::Extension => "--|>",
        RelationshipKind::Composition => "*--",
        RelationshipKind::Aggregation => "o--",
        RelationshipKind::Association => "-->",
        RelationshipKind::Dependency => "..>",
        RelationshipKind::Other => "--",
    }
}

/// Keyword and optional stereotype a node is declared with.
fn declaration(node: &GraphNode) -> (&'static str, Option<&'static str>) {
    match node.kind {
        ElementKind::Interface => ("interface", None),
        ElementKind::Enum => ("enum", None),
        ElementKind::Struct => ("struct", None),
        ElementKind::Class if node.is_abstract => ("abstract class", None),
        ElementKind::Class => ("class", None),
        ElementKind::Union => ("class", Some("union")),
        ElementKind::Concept => ("class", Some("concept")),
        ElementKind::Other => ("class", None),
    }
}

fn push_class(lines: &mut Vec<String>, node: &GraphNode, options: &DiagramConfig, indent: &str) {
    let (keyword, stereotype) = declaration(node);
    let mut head = format!("{}{} \"{}\" as {}", indent, keyword, node.display_name, class_alias(&node.id));
    if let Some(stereotype) = stereotype {
        head.push_str(&format!(" <<{}>>", stereotype));
    }

    let mut body: Vec<&String> = Vec::new();
    if options.show_members {
        body.extend(&node.members);
    }
    if options.show_methods {
        body.extend(&node.methods);
    }

    if body.is_empty() {
        lines.push(head);
        return;
    }
    lines.push(format!("{} {{", head));
    for line in body {
        lines.push(format!("{}  {}", indent, line));
    }
    lines.push(format!("{}}}", indent));
}

/// The induced subgraph of `nodes` as a PlantUML class diagram.
pub fn render_view(title: &str, graph: &Graph, nodes: &NodeSet, options: &DiagramConfig) -> String {
    let view = graph.subgraph(nodes);
    let mut classes: Vec<&GraphNode> = view.all_nodes().collect();
    classes.sort_by(|a, b| a.id.cmp(&b.id));

    let mut lines = vec![
        "@startuml".to_string(),
        format!("title {}", title),
        "set separator none".to_string(),
        String::new(),
    ];

    if options.group_by_namespace {
        let mut packages: BTreeMap<&str, Vec<&GraphNode>> = BTreeMap::new();
        for node in classes {
            packages.entry(node.namespace.as_str()).or_default().push(node);
        }
        for (namespace, members) in packages {
            if namespace.is_empty() {
                for node in members {
                    push_class(&mut lines, node, options, "");
                }
                continue;
            }
            lines.push(format!("package \"{}\" {{", namespace));
            for node in members {
                push_class(&mut lines, node, options, "  ");
            }
            lines.push("}".to_string());
        }
    } else {
        for node in classes {
            push_class(&mut lines, node, options, "");
        }
    }

    let mut edges: Vec<String> = view
        .all_edges()
        .map(|edge| {
            let line = format!("{} {} {}", class_alias(&edge.source), arrow(edge.kind), class_alias(&edge.target));
            match edge.label.as_deref().filter(|label| !label.is_empty()) {
                Some(label) => format!("{} : {}", line, label),
                None => line,
            }
        })
        .collect();
    edges.sort();
    edges.dedup();

    if !edges.is_empty() {
        lines.push(String::new());
        lines.extend(edges);
    }
    lines.push(String::new());
    lines.push("@enduml".to_string());
    lines.join("\n") + "\n"
}

/// A sequence diagram in PlantUML, participants in declaration order.
pub fn render_sequence(sequence: &SequenceDiagram) -> String {
    let mut lines = vec!["@startuml".to_string(), format!("title {}", sequence.name), String::new()];

    for participant in &sequence.participants {
        let label = participant.display_name.as_deref().unwrap_or(&participant.name);
        lines.push(format!("participant \"{}\" as {}", label, participant_alias(&participant.id)));
    }
    lines.push(String::new());

    for message in &sequence.messages {
        let from = participant_alias(&message.from_id);
        let to = participant_alias(&message.to_id);
        lines.push(match message.kind {
            MessageKind::Call => format!("{} -> {}: {}", from, to, message.name),
            MessageKind::Return => format!("{} --> {}: {}", to, from, message.name),
        });
    }

    lines.push(String::new());
    lines.push("@enduml".to_string());
    lines.join("\n") + "\n"
}

fn write_puml(dir: &Path, name: &str, text: String) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("{}.{}", file_stem(name), EXTENSION));
    std::fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Write the view as `<name>.puml` into `dir`.
pub fn write_view(
    dir: &Path,
    name: &str,
    graph: &Graph,
    nodes: &NodeSet,
    options: &DiagramConfig,
) -> anyhow::Result<PathBuf> {
    write_puml(dir, name, render_view(name, graph, nodes, options))
}

pub fn write_sequence(dir: &Path, sequence: &SequenceDiagram) -> anyhow::Result<PathBuf> {
    write_puml(dir, &sequence.name, render_sequence(sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use umlsplit_core::{ElementRecord, RelationshipRecord};

    fn record(id: &str, name: &str, namespace: &str) -> ElementRecord {
        ElementRecord {
            id: id.to_string(),
            name: name.to_string(),
            display_name: name.to_string(),
            full_name: format!("{}::{}", namespace, name),
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }

    fn link(source: &str, destination: &str, kind: RelationshipKind) -> RelationshipRecord {
        RelationshipRecord {
            source: source.into(),
            destination: destination.into(),
            kind,
            ..Default::default()
        }
    }

    fn shop_graph() -> Graph {
        let order = ElementRecord {
            members: vec!["-id : int".to_string()],
            methods: vec!["+total() : double".to_string()],
            ..record("1", "Order", "shop::model")
        };
        let entity = ElementRecord {
            is_abstract: true,
            ..record("2", "Entity", "shop::model")
        };
        let repo = ElementRecord {
            kind: ElementKind::Interface,
            ..record("3", "Repository", "shop::db")
        };
        let free = record("4", "Clock", "");
        Graph::from_records(
            &[order, entity, repo, free],
            &[
                link("1", "2", RelationshipKind::Extension),
                link("3", "1", RelationshipKind::Dependency),
                RelationshipRecord {
                    label: Some("now".to_string()),
                    ..link("1", "4", RelationshipKind::Association)
                },
            ],
        )
    }

    fn all(graph: &Graph) -> NodeSet {
        graph.node_ids().cloned().collect()
    }

    #[test]
    fn test_view_groups_by_namespace() {
        let graph = shop_graph();
        let text = render_view("shop_all", &graph, &all(&graph), &DiagramConfig::default());

        assert!(text.starts_with("@startuml\ntitle shop_all\n"));
        assert!(text.trim_end().ends_with("@enduml"));
        assert!(text.contains("package \"shop::model\" {\n  class \"Order\" as C_1 {\n    -id : int\n    +total() : double\n  }\n  abstract class \"Entity\" as C_2\n}"));
        assert!(text.contains("package \"shop::db\" {\n  interface \"Repository\" as C_3\n}"));
        // global namespace classes sit outside any package
        assert!(text.contains("\nclass \"Clock\" as C_4\n"));
        assert!(text.contains("C_1 --|> C_2\n"));
        assert!(text.contains("C_3 ..> C_1\n"));
        assert!(text.contains("C_1 --> C_4 : now\n"));
    }

    #[test]
    fn test_view_keeps_only_induced_edges() {
        let graph = shop_graph();
        let nodes: NodeSet = [NodeId::from("1"), NodeId::from("2")].into();
        let text = render_view("pair", &graph, &nodes, &DiagramConfig::default());

        assert!(text.contains("C_1 --|> C_2"));
        assert!(!text.contains("C_3"));
        assert!(!text.contains("C_4"));
        assert!(!text.contains("shop::db"));
    }

    #[test]
    fn test_view_without_members_or_packages() {
        let graph = shop_graph();
        let options = DiagramConfig {
            show_members: false,
            show_methods: false,
            group_by_namespace: false,
        };
        let text = render_view("flat", &graph, &all(&graph), &options);

        assert!(!text.contains("package"));
        assert!(!text.contains("-id : int"));
        assert!(text.contains("\nclass \"Order\" as C_1\n"));
    }

    #[test]
    fn test_sequence_arrows() {
        let json = r#"{
            "diagram_type": "sequence",
            "name": "checkout",
            "participants": [
                {"id": "1", "name": "main", "type": "function"},
                {"id": "2", "name": "OrderService", "display_name": "shop::OrderService"}
            ],
            "sequences": [
                {"messages": [
                    {"type": "call", "from": {"id": "1"}, "to": {"id": "2"}, "name": "checkout"},
                    {"type": "return", "from": {"id": "1"}, "to": {"id": "2"}, "name": "bool"}
                ]}
            ]
        }"#;
        let sequence = SequenceDiagram::parse(json, "x").unwrap();
        let text = render_sequence(&sequence);

        assert!(text.contains("participant \"main\" as P_1\n"));
        assert!(text.contains("participant \"shop::OrderService\" as P_2\n"));
        assert!(text.contains("P_1 -> P_2: checkout\n"));
        assert!(text.contains("P_2 --> P_1: bool\n"));
    }

    #[test]
    fn test_write_view_sanitizes_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let graph = shop_graph();
        let path = write_view(dir.path(), "../escape", &graph, &all(&graph), &DiagramConfig::default()).unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(path.file_name().unwrap(), "______escape.puml");
        assert!(std::fs::read_to_string(&path).unwrap().contains("title ../escape"));
    }
}

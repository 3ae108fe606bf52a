//! Unit tests for umlsplit-ingest module

use crate::*;
use std::io::Write;
use umlsplit_core::{ElementKind, GraphAnalyzer, NodeId, RelationshipKind, TraversalDirection};

const CLASS_JSON: &str = r#"{
    "diagram_type": "class",
    "name": "app_class_diagram",
    "elements": [
        {
            "id": "100",
            "name": "app",
            "type": "namespace",
            "elements": [
                {
                    "id": "1",
                    "name": "UserService",
                    "namespace": "app::service",
                    "type": "class",
                    "members": [{"name": "repo"}],
                    "methods": [{"name": "create"}, {"name": "remove"}]
                },
                {
                    "id": "101",
                    "name": "model",
                    "type": "namespace",
                    "elements": [
                        {"id": "2", "name": "User", "namespace": "app::model", "type": "struct", "display_name": "User<T>", "is_template": true},
                        {"id": "3", "name": "Entity", "namespace": "app::model", "type": "class", "is_abstract": true}
                    ]
                }
            ]
        },
        {"id": "4", "name": "main_helper", "type": "function"}
    ],
    "relationships": [
        {"source": "1", "destination": "2", "type": "dependency", "label": "creates"},
        {"source": "2", "destination": "3", "type": "extension", "access": "public"},
        {"source": "1", "destination": "3", "type": "friendship"},
        {"source": "1", "destination": "999", "type": "association"}
    ],
    "metadata": {"clang_uml_version": "0.5.1"}
}"#;

const SEQUENCE_JSON: &str = r#"{
    "diagram_type": "sequence",
    "name": "create_user_flow",
    "participants": [
        {"id": "1", "name": "main", "type": "function"},
        {"id": "2", "name": "UserService", "type": "class", "namespace": "app"},
        {"id": "3", "name": "Repository", "type": "class", "namespace": "app::db", "display_name": "Repo"}
    ],
    "sequences": [
        {
            "from": {"id": "1"},
            "messages": [
                {"type": "call", "from": {"id": "1"}, "to": {"id": "2"}, "name": "createUser", "scope": "normal"},
                {
                    "type": "alt",
                    "if_blocks": [
                        {"type": "call", "from": {"id": "2"}, "to": {"id": "3"}, "name": "save"}
                    ],
                    "else_blocks": [
                        {"type": "call", "from": {"id": "2"}, "to": {"id": "3"}, "name": "update"}
                    ]
                },
                {
                    "type": "loop",
                    "loop_blocks": [
                        {"type": "call", "from": {"id": "2"}, "to": {"id": "3"}, "name": "save"}
                    ]
                },
                {"type": "return", "from": {"id": "2"}, "to": {"id": "1"}, "name": "User", "return_type": "User"}
            ]
        }
    ],
    "metadata": {"clang_uml_version": "0.5.1", "llvm_version": "17.0.6"},
    "start_from": "main"
}"#;

#[test]
fn test_class_diagram_flattens_containers() {
    let diagram = ClassDiagram::parse(CLASS_JSON, "fallback").unwrap();
    assert_eq!(diagram.name, "app_class_diagram");

    let ids: Vec<&str> = diagram.elements.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
}

#[test]
fn test_class_diagram_element_fields() {
    let diagram = ClassDiagram::parse(CLASS_JSON, "fallback").unwrap();

    let service = &diagram.elements[0];
    assert_eq!(service.full_name, "app::service::UserService");
    assert_eq!(service.display_name, "UserService");
    assert_eq!(service.member_count, 1);
    assert_eq!(service.method_count, 2);
    assert_eq!(service.complexity_score, 5.0);

    let user = &diagram.elements[1];
    assert_eq!(user.kind, ElementKind::Struct);
    assert_eq!(user.display_name, "User<T>");
    assert!(user.is_template);
    assert!(diagram.elements[2].is_abstract);

    let helper = &diagram.elements[3];
    assert_eq!(helper.full_name, "main_helper");
    assert_eq!(helper.kind, ElementKind::Other);
    assert_eq!(helper.complexity_score, 0.0);
}

#[test]
fn test_class_diagram_relationship_kinds() {
    let diagram = ClassDiagram::parse(CLASS_JSON, "fallback").unwrap();
    let kinds: Vec<RelationshipKind> = diagram.relationships.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RelationshipKind::Dependency,
            RelationshipKind::Extension,
            RelationshipKind::Other,
            RelationshipKind::Association,
        ]
    );
    assert_eq!(diagram.relationships[0].label.as_deref(), Some("creates"));
    assert_eq!(diagram.relationships[1].access.as_deref(), Some("public"));
}

#[test]
fn test_class_diagram_graph_drops_dangling_relationship() {
    let diagram = ClassDiagram::parse(CLASS_JSON, "fallback").unwrap();
    let graph = diagram.build_graph();
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn test_class_diagram_namespaces_and_statistics() {
    let diagram = ClassDiagram::parse(CLASS_JSON, "fallback").unwrap();
    let namespaces: Vec<String> = diagram.namespaces().into_iter().collect();
    assert_eq!(namespaces, vec!["app::model", "app::service"]);

    let stats = diagram.statistics();
    assert_eq!(stats.total_elements, 4);
    assert_eq!(stats.total_relationships, 4);
    assert_eq!(stats.namespace_count, 2);
    assert_eq!(stats.element_kinds["class"], 2);
    assert_eq!(stats.element_kinds["struct"], 1);
    assert_eq!(stats.element_kinds["other"], 1);
}

#[test]
fn test_class_diagram_rejects_other_types() {
    let err = ClassDiagram::parse(r#"{"diagram_type": "sequence"}"#, "x").unwrap_err();
    assert!(matches!(
        err,
        IngestError::UnsupportedDiagramType { expected: "class", .. }
    ));
}

#[test]
fn test_malformed_json() {
    let err = ClassDiagram::parse("{ not json", "x").unwrap_err();
    assert!(matches!(err, IngestError::Json(_)));
}

#[test]
fn test_detect_diagram_type() {
    assert_eq!(detect_diagram_type(CLASS_JSON).unwrap(), DiagramType::Class);
    assert_eq!(detect_diagram_type(SEQUENCE_JSON).unwrap(), DiagramType::Sequence);
    assert_eq!(detect_diagram_type("{}").unwrap(), DiagramType::Class);
    assert!(detect_diagram_type(r#"{"diagram_type": "include"}"#).is_err());
}

#[test]
fn test_sequence_messages_in_traversal_order() {
    let diagram = SequenceDiagram::parse(SEQUENCE_JSON, "fallback").unwrap();
    let names: Vec<&str> = diagram.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["createUser", "save", "update", "save", "User"]);
    assert_eq!(diagram.messages[0].scope.as_deref(), Some("normal"));
    assert_eq!(diagram.messages[4].kind, MessageKind::Return);
    assert_eq!(diagram.messages[4].return_type.as_deref(), Some("User"));
}

#[test]
fn test_sequence_queries() {
    let diagram = SequenceDiagram::parse(SEQUENCE_JSON, "fallback").unwrap();

    assert_eq!(diagram.participant_by_name("app::UserService").unwrap().id, "2");
    assert_eq!(diagram.participant_by_name("main").unwrap().id, "1");
    assert!(diagram.participant_by_name("Nobody").is_none());

    assert_eq!(diagram.calls_from("2").len(), 4);
    assert_eq!(diagram.calls_to("3").len(), 3);
    assert_eq!(diagram.participant("3").unwrap().full_name(), "app::db::Repository");
}

#[test]
fn test_sequence_statistics() {
    let diagram = SequenceDiagram::parse(SEQUENCE_JSON, "fallback").unwrap();
    let stats = diagram.statistics();
    assert_eq!(stats.diagram_name, "create_user_flow");
    assert_eq!(stats.diagram_type, "sequence");
    assert_eq!(stats.total_participants, 3);
    assert_eq!(stats.total_messages, 5);
    assert_eq!(stats.start_from.as_deref(), Some("main"));
    assert_eq!(stats.clang_uml_version.as_deref(), Some("0.5.1"));
    assert_eq!(stats.llvm_version.as_deref(), Some("17.0.6"));
}

#[test]
fn test_sequence_call_graph() {
    let diagram = SequenceDiagram::parse(SEQUENCE_JSON, "fallback").unwrap();
    let (elements, relationships) = diagram.call_graph_records();

    assert_eq!(elements.len(), 3);
    // repeated `save` collapses; the return is not a call
    assert_eq!(relationships.len(), 3);
    assert!(relationships.iter().all(|r| r.kind == RelationshipKind::Dependency));

    let repo = elements.iter().find(|e| e.id == "3").unwrap();
    assert_eq!(repo.display_name, "Repo");
    assert_eq!(repo.namespace, "app::db");
    assert_eq!(repo.method_count, 2);
    assert_eq!(repo.complexity_score, 4.0);

    let graph = umlsplit_core::Graph::from_records(&elements, &relationships);
    let analyzer = GraphAnalyzer::new(&graph);
    assert_eq!(
        graph.nodes_within_hops(&NodeId::from("1"), 2, TraversalDirection::Out).len(),
        3
    );
    assert!(analyzer.leaf_nodes().contains(&NodeId::from("3")));
}

#[test]
fn test_sequence_rejects_class_export() {
    let err = SequenceDiagram::parse(CLASS_JSON, "x").unwrap_err();
    assert!(err.to_string().contains("class"));
}

#[test]
fn test_load_diagram_from_file() {
    let dir = tempfile::tempdir().unwrap();

    let class_path = dir.path().join("classes.json");
    std::fs::write(&class_path, r#"{"elements": [{"id": "1", "name": "A"}]}"#).unwrap();
    match load_diagram(&class_path).unwrap() {
        Diagram::Class(diagram) => {
            assert_eq!(diagram.name, "classes");
            assert_eq!(diagram.elements.len(), 1);
        }
        other => panic!("expected class diagram, got {:?}", other.diagram_type()),
    }

    let seq_path = dir.path().join("flow.json");
    let mut file = std::fs::File::create(&seq_path).unwrap();
    file.write_all(SEQUENCE_JSON.as_bytes()).unwrap();
    drop(file);
    assert_eq!(load_diagram(&seq_path).unwrap().diagram_type(), DiagramType::Sequence);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = ClassDiagram::load(&missing).unwrap_err();
    match err {
        IngestError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("expected io error, got {}", other),
    }
}

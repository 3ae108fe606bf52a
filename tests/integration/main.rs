//! Integration tests for umlsplit
//!
//! These tests drive the compiled binary end to end on small diagram exports.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const CLASS_DIAGRAM: &str = r#"{
    "diagram_type": "class",
    "name": "shop",
    "elements": [
        {"id": "1", "name": "OrderService", "namespace": "shop::service", "type": "class",
         "members": [{}, {}, {}], "methods": [{}, {}, {}, {}]},
        {"id": "2", "name": "Order", "namespace": "shop::model", "type": "class", "members": [{}]},
        {"id": "3", "name": "Customer", "namespace": "shop::model", "type": "class"},
        {"id": "4", "name": "Repository", "namespace": "shop::db", "type": "class", "methods": [{}]},
        {"id": "5", "name": "Entity", "namespace": "shop::model", "type": "class", "is_abstract": true}
    ],
    "relationships": [
        {"source": "1", "destination": "2", "type": "dependency"},
        {"source": "1", "destination": "3", "type": "dependency"},
        {"source": "1", "destination": "4", "type": "association"},
        {"source": "2", "destination": "5", "type": "extension"},
        {"source": "3", "destination": "5", "type": "extension"},
        {"source": "2", "destination": "3", "type": "aggregation"}
    ]
}"#;

const SEQUENCE_DIAGRAM: &str = r#"{
    "diagram_type": "sequence",
    "name": "checkout",
    "participants": [
        {"id": "1", "name": "main", "type": "function"},
        {"id": "2", "name": "OrderService", "type": "class", "namespace": "shop"}
    ],
    "sequences": [
        {"messages": [{"type": "call", "from": {"id": "1"}, "to": {"id": "2"}, "name": "checkout"}]}
    ],
    "metadata": {"clang_uml_version": "0.5.1"}
}"#;

fn umlsplit(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_umlsplit"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute umlsplit")
}

fn workspace(diagram: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("diagram.json"), diagram).unwrap();
    dir
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = umlsplit(dir.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Split large UML class diagrams"));
    assert!(stdout.contains("views"));
}

#[test]
fn test_analyze_writes_markdown_report() {
    let dir = workspace(CLASS_DIAGRAM);
    let output = umlsplit(dir.path(), &["analyze", "-i", "diagram.json", "-o", "out"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = std::fs::read_to_string(dir.path().join("out/analysis_report.md")).unwrap();
    assert!(report.contains("- Total classes: 5"));
    assert!(report.contains("- Total relationships: 6"));
    assert!(report.contains("| shop::model | 3 |"));
    assert!(!dir.path().join("out/views.json").exists());
}

#[test]
fn test_views_respects_config() {
    let dir = workspace(CLASS_DIAGRAM);
    std::fs::write(
        dir.path().join("umlsplit.yaml"),
        r#"
input:
  json_file: diagram.json
output:
  directory: generated
analysis:
  report_format: json
views:
  community:
    enabled: false
  hotspot:
    enabled: false
  importance:
    top_n: 1
    include_neighbors: false
  layer:
    enabled: true
    layers:
      model: shop::model
"#,
    )
    .unwrap();

    let output = umlsplit(dir.path(), &["views"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("generated/analysis_report.json")).unwrap())
            .unwrap();
    assert_eq!(report["summary"]["total_nodes"], 5);

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("generated/views.json")).unwrap()).unwrap();
    let names: Vec<&str> = manifest["views"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["view_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["importance_pagerank_top1", "layer_model", "namespace_shop_model"]);

    let model = &manifest["views"][2];
    assert_eq!(model["node_count"], 3);
    assert_eq!(model["edge_count"], 3);

    let puml = std::fs::read_to_string(dir.path().join("generated/namespace_shop_model.puml")).unwrap();
    assert!(puml.starts_with("@startuml\ntitle namespace_shop_model\n"));
    assert!(puml.contains("package \"shop::model\" {"));
    assert!(puml.contains("abstract class \"Entity\" as C_5"));
    assert!(puml.contains("C_2 o-- C_3"));
    assert!(!puml.contains("OrderService"));
    assert!(dir.path().join("generated/layer_model.puml").exists());
    assert!(dir.path().join("generated/importance_pagerank_top1.puml").exists());
}

fn community_view_names(resolution: Option<f64>) -> Vec<String> {
    let dir = workspace(CLASS_DIAGRAM);
    let community = match resolution {
        Some(resolution) => format!("{{min_size: 1, resolution: {}}}", resolution),
        None => "{min_size: 1}".to_string(),
    };
    std::fs::write(
        dir.path().join("umlsplit.yaml"),
        format!(
            "input: {{json_file: diagram.json}}\n\
             output: {{directory: out}}\n\
             views:\n  \
               namespace: {{enabled: false}}\n  \
               hotspot: {{enabled: false}}\n  \
               importance: {{enabled: false}}\n  \
               community: {}\n",
            community
        ),
    )
    .unwrap();

    let output = umlsplit(dir.path(), &["views"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("out/views.json")).unwrap()).unwrap();
    let names: Vec<String> = manifest["views"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["view_name"].as_str().unwrap().to_string())
        .collect();

    let report = std::fs::read_to_string(dir.path().join("out/analysis_report.md")).unwrap();
    assert!(report.contains(&format!("- Communities: {}\n", names.len())));
    for name in &names {
        assert!(dir.path().join(format!("out/{}.puml", name)).exists());
    }
    names
}

#[test]
fn test_views_apply_configured_resolution() {
    let fine = community_view_names(Some(50.0));
    assert_eq!(
        fine,
        vec!["community_0", "community_1", "community_2", "community_3", "community_4"]
    );

    let default = community_view_names(None);
    assert!(default.len() < fine.len(), "{:?}", default);
}

#[test]
fn test_context_command() {
    let dir = workspace(CLASS_DIAGRAM);
    let output = umlsplit(
        dir.path(),
        &["context", "Order", "--hops", "1", "--direction", "out", "-i", "diagram.json", "-o", "out"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("context_Order_h1 (3 classes"));
    assert!(stdout.contains("shop::model::Entity"));
    assert!(!stdout.contains("shop::service::OrderService"));

    let puml = std::fs::read_to_string(dir.path().join("out/context_Order_h1.puml")).unwrap();
    assert!(puml.contains("C_2 --|> C_5"));
    assert!(!puml.contains("C_1"));
}

#[test]
fn test_context_unknown_class_fails() {
    let dir = workspace(CLASS_DIAGRAM);
    let output = umlsplit(dir.path(), &["context", "Nope", "-i", "diagram.json", "-o", "out"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("class not found: Nope"));
}

#[test]
fn test_chain_command() {
    let dir = workspace(CLASS_DIAGRAM);
    let output = umlsplit(
        dir.path(),
        &["chain", "OrderService", "Entity", "--expand", "0", "-i", "diagram.json", "-o", "out"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("dependency_OrderService_to_Entity (3 classes"));

    let unreachable = umlsplit(dir.path(), &["chain", "Entity", "OrderService", "-i", "diagram.json", "-o", "out"]);
    assert!(!unreachable.status.success());
}

#[test]
fn test_sequence_input_routes_to_trace() {
    let dir = workspace(SEQUENCE_DIAGRAM);
    let output = umlsplit(dir.path(), &["analyze", "-i", "diagram.json", "-o", "out"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("checkout: 2 participants, 1 messages"));

    let stats: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("out/checkout_trace.json")).unwrap()).unwrap();
    assert_eq!(stats["clang_uml_version"], "0.5.1");
    assert!(dir.path().join("out/analysis_report.md").exists());

    let puml = std::fs::read_to_string(dir.path().join("out/checkout.puml")).unwrap();
    assert!(puml.contains("participant \"OrderService\" as P_2"));
    assert!(puml.contains("P_1 -> P_2: checkout"));
}

#[test]
fn test_trace_output_stays_in_output_directory() {
    let dir = workspace(&SEQUENCE_DIAGRAM.replace("\"name\": \"checkout\",", "\"name\": \"../../escaped\","));
    std::fs::create_dir_all(dir.path().join("nested/out")).unwrap();
    let output = umlsplit(dir.path(), &["trace", "-i", "diagram.json", "-o", "nested/out"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(dir.path().join("nested/out/______escaped_trace.json").exists());
    assert!(dir.path().join("nested/out/______escaped.puml").exists());
    assert!(!dir.path().join("escaped_trace.json").exists());
    assert!(!dir.path().join("escaped.puml").exists());
}

#[test]
fn test_trace_rejects_class_diagram() {
    let dir = workspace(CLASS_DIAGRAM);
    let output = umlsplit(dir.path(), &["trace", "-i", "diagram.json", "-o", "out"]);
    assert!(!output.status.success());
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    let output = umlsplit(dir.path(), &["analyze"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No input file"));
}

//! Graph fixtures shared by the unit tests

use crate::graph::Graph;
use crate::model::{ElementKind, ElementRecord, RelationshipKind, RelationshipRecord};

/// Element record with a derived fully qualified name and zero complexity.
pub fn element(id: &str, name: &str, namespace: &str) -> ElementRecord {
    let full_name = if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace, name)
    };
    ElementRecord {
        id: id.to_string(),
        name: name.to_string(),
        full_name,
        display_name: name.to_string(),
        namespace: namespace.to_string(),
        kind: ElementKind::Class,
        ..Default::default()
    }
}

pub fn complex_element(id: &str, name: &str, namespace: &str, complexity: f64) -> ElementRecord {
    ElementRecord {
        complexity_score: complexity,
        ..element(id, name, namespace)
    }
}

pub fn relationship(source: &str, destination: &str, kind: RelationshipKind) -> RelationshipRecord {
    RelationshipRecord {
        source: source.to_string(),
        destination: destination.to_string(),
        kind,
        label: None,
        access: None,
    }
}

/// A -> B (dependency), B -> C (extension).
pub fn chain_graph() -> Graph {
    Graph::from_records(
        &[element("a", "A", ""), element("b", "B", ""), element("c", "C", "")],
        &[
            relationship("a", "b", RelationshipKind::Dependency),
            relationship("b", "c", RelationshipKind::Extension),
        ],
    )
}

/// Two 4-cliques (`a1..a4` in `left`, `b1..b4` in `right`) joined by a1 -> b1.
pub fn two_cliques_graph() -> Graph {
    let mut elements = Vec::new();
    let mut relationships = Vec::new();
    for (prefix, namespace) in [("a", "left"), ("b", "right")] {
        let ids: Vec<String> = (1..=4).map(|i| format!("{}{}", prefix, i)).collect();
        for id in &ids {
            elements.push(element(id, &id.to_uppercase(), namespace));
        }
        for (i, source) in ids.iter().enumerate() {
            for target in &ids[i + 1..] {
                relationships.push(relationship(source, target, RelationshipKind::Association));
            }
        }
    }
    relationships.push(relationship("a1", "b1", RelationshipKind::Dependency));
    Graph::from_records(&elements, &relationships)
}

/// `ns1` holds X and Y (X -> Y); Y -> Z crosses into `ns2`.
pub fn namespace_graph() -> Graph {
    Graph::from_records(
        &[
            element("x", "X", "ns1"),
            element("y", "Y", "ns1"),
            element("z", "Z", "ns2"),
        ],
        &[
            relationship("x", "y", RelationshipKind::Association),
            relationship("y", "z", RelationshipKind::Dependency),
        ],
    )
}

/// A hub with ten spokes; `hub` has complexity 10, `busy` has degree 10 but complexity 5.
pub fn hub_graph() -> Graph {
    let mut elements = vec![
        complex_element("hub", "Hub", "app::core", 10.0),
        complex_element("busy", "Busy", "app::core", 5.0),
    ];
    let mut relationships = Vec::new();
    for i in 0..10 {
        let id = format!("s{}", i);
        elements.push(complex_element(&id, &format!("Spoke{}", i), "app::leaf", 1.0));
        relationships.push(relationship(&id, "hub", RelationshipKind::Dependency));
        relationships.push(relationship("busy", &id, RelationshipKind::Association));
    }
    Graph::from_records(&elements, &relationships)
}

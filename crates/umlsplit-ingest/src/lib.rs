//! Diagram export parsing (clang-uml class and sequence JSON)

pub mod class_diagram;
pub mod error;
pub mod sequence;

#[cfg(test)]
pub mod tests;

pub use class_diagram::{ClassDiagram, ClassDiagramStatistics};
pub use error::{IngestError, Result};
pub use sequence::{Message, MessageKind, Participant, SequenceDiagram, SequenceStatistics};

use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramType {
    Class,
    Sequence,
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramType::Class => f.write_str("class"),
            DiagramType::Sequence => f.write_str("sequence"),
        }
    }
}

/// Read the `diagram_type` field; exports without one are class diagrams.
pub fn detect_diagram_type(json: &str) -> Result<DiagramType> {
    #[derive(Deserialize)]
    struct Probe {
        diagram_type: Option<String>,
    }

    let probe: Probe = serde_json::from_str(json)?;
    match probe.diagram_type.as_deref() {
        None | Some("class") => Ok(DiagramType::Class),
        Some("sequence") => Ok(DiagramType::Sequence),
        Some(other) => Err(IngestError::UnsupportedDiagramType {
            expected: "class or sequence",
            found: other.to_string(),
        }),
    }
}

/// Either kind of parsed diagram.
#[derive(Debug, Clone)]
pub enum Diagram {
    Class(ClassDiagram),
    Sequence(SequenceDiagram),
}

impl Diagram {
    pub fn diagram_type(&self) -> DiagramType {
        match self {
            Diagram::Class(_) => DiagramType::Class,
            Diagram::Sequence(_) => DiagramType::Sequence,
        }
    }
}

/// Read a diagram file and parse it according to its `diagram_type`.
pub fn load_diagram(path: &Path) -> Result<Diagram> {
    let json = error::read_file(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let diagram = match detect_diagram_type(&json)? {
        DiagramType::Class => Diagram::Class(ClassDiagram::parse(&json, &stem)?),
        DiagramType::Sequence => Diagram::Sequence(SequenceDiagram::parse(&json, &stem)?),
    };
    tracing::debug!("Loaded {} diagram from {}", diagram.diagram_type(), path.display());
    Ok(diagram)
}

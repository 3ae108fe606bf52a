//! umlsplit core: class graph model, graph analysis and view filtering

pub mod analyzer;
pub mod centrality;
pub mod community;
pub mod error;
pub mod filter;
pub mod graph;
pub mod model;
pub mod options;


#[cfg(test)]
pub mod test_utils;

pub use analyzer::{AnalysisSummary, GraphAnalyzer, Metric, NamespaceCoupling, RankedNode};
pub use error::{CoreError, Result};
pub use filter::{NodeSet, ViewFilter, ViewMap, ViewNode, ViewStatistics, ViewStrategy, file_stem};
pub use graph::{Graph, GraphStatistics};
pub use model::{
    ElementKind, ElementRecord, GraphEdge, GraphNode, NodeId, RelationshipKind, RelationshipRecord,
    TraversalDirection,
};
pub use options::{
    AutoViewOptions, CommunityOptions, ContextOptions, DependencyChainOptions, HotspotOptions, ImportanceOptions,
    NamespaceOptions, OutlierOptions,
};

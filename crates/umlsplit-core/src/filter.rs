//! View filtering strategies
//!
//! A view is a named set of node ids meant to be rendered as one diagram. Every
//! strategy both stores its result under a derived name and returns it.
//! Re-running a strategy with the same parameters overwrites the stored view
//! with an identical set.

use crate::analyzer::GraphAnalyzer;
use crate::error::{CoreError, Result};
use crate::graph::Graph;
use crate::model::{NodeId, TraversalDirection};
use crate::options::*;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub type NodeSet = HashSet<NodeId>;
pub type ViewMap = BTreeMap<String, NodeSet>;

pub const HOTSPOT_VIEW: &str = "hotspot";
pub const OUTLIER_VIEW: &str = "god_classes";

/// Strategies for splitting the graph into views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStrategy {
    /// N-hop neighborhood of one class.
    Context,
    Namespace,
    Community,
    Hotspot,
    Importance,
    /// Namespace-prefix layers (api, service, core, ...).
    Layer,
    /// Shortest path between two classes plus context.
    DependencyChain,
    /// Complexity outliers.
    GodClasses,
}

impl ViewStrategy {
    pub const ALL: [ViewStrategy; 8] = [
        ViewStrategy::Context,
        ViewStrategy::Namespace,
        ViewStrategy::Community,
        ViewStrategy::Hotspot,
        ViewStrategy::Importance,
        ViewStrategy::Layer,
        ViewStrategy::DependencyChain,
        ViewStrategy::GodClasses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewStrategy::Context => "context",
            ViewStrategy::Namespace => "namespace",
            ViewStrategy::Community => "community",
            ViewStrategy::Hotspot => "hotspot",
            ViewStrategy::Importance => "importance",
            ViewStrategy::Layer => "layer",
            ViewStrategy::DependencyChain => "dependency_chain",
            ViewStrategy::GodClasses => "god_classes",
        }
    }
}

impl FromStr for ViewStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        ViewStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| CoreError::InvalidStrategy(s.to_string()))
    }
}

impl fmt::Display for ViewStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node as listed in view statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    pub id: NodeId,
    pub display_name: String,
    pub full_name: String,
}

/// Statistics for a stored view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewStatistics {
    pub view_name: String,
    pub node_count: usize,
    /// Edges of the induced subgraph.
    pub edge_count: usize,
    pub density: f64,
    /// Sorted by id.
    pub nodes: Vec<ViewNode>,
}

/// Builds and stores views over a graph and its analyzer.
pub struct ViewFilter<'a> {
    analyzer: &'a GraphAnalyzer<'a>,
    views: DashMap<String, NodeSet>,
}

impl<'a> ViewFilter<'a> {
    pub fn new(analyzer: &'a GraphAnalyzer<'a>) -> Self {
        ViewFilter {
            analyzer,
            views: DashMap::new(),
        }
    }

    fn graph(&self) -> &'a Graph {
        self.analyzer.graph()
    }

    fn store(&self, name: String, nodes: NodeSet) {
        tracing::debug!("Storing view {} with {} nodes", name, nodes.len());
        self.views.insert(name, nodes);
    }

    /// Union `nodes` with the direct neighbors (both directions) of every member.
    fn with_neighbors(&self, nodes: NodeSet) -> NodeSet {
        let mut extended = nodes.clone();
        for node in &nodes {
            extended.extend(self.graph().neighbors(node, TraversalDirection::Both));
        }
        extended
    }

    /// Nodes within `max_hops` of the class named `center`.
    pub fn create_context_view(
        &self,
        center: &str,
        options: &ContextOptions,
        view_name: Option<&str>,
    ) -> Result<NodeSet> {
        let center_id = self
            .graph()
            .find_node_by_name(center)
            .ok_or_else(|| CoreError::NodeNotFound(center.to_string()))?;

        let nodes = self
            .graph()
            .nodes_within_hops(&center_id, options.max_hops, options.direction);

        let name = view_name
            .map(str::to_string)
            .unwrap_or_else(|| context_view_name(center, options.max_hops));
        self.store(name, nodes.clone());
        Ok(nodes)
    }

    /// One view per namespace prefix holding at least `min_nodes` nodes.
    pub fn create_namespace_views(&self, options: &NamespaceOptions) -> ViewMap {
        let namespaces: Vec<String> = match &options.namespaces {
            Some(list) => list.clone(),
            None => self.graph().namespaces().into_iter().collect(),
        };

        let mut created = ViewMap::new();
        for namespace in namespaces {
            let nodes = self.graph().nodes_by_namespace_prefix(&namespace);
            if nodes.len() < options.min_nodes {
                tracing::debug!(
                    "Skipping namespace {}: {} nodes below minimum {}",
                    namespace,
                    nodes.len(),
                    options.min_nodes
                );
                continue;
            }
            let name = format!("namespace_{}", flatten_namespace(&namespace));
            self.store(name.clone(), nodes.clone());
            created.insert(name, nodes);
        }
        created
    }

    /// One view per detected community of at least `min_size` members.
    pub fn create_community_views(&self, options: &CommunityOptions) -> Result<ViewMap> {
        if !options.resolution.is_finite() || options.resolution < 0.0 {
            return Err(CoreError::InvalidParameter {
                name: "resolution",
                reason: format!("{} is not a non-negative number", options.resolution),
            });
        }

        let mut created = ViewMap::new();
        for (community, members) in self.analyzer.community_members(options.resolution) {
            if members.len() < options.min_size {
                continue;
            }
            let name = format!("community_{}", community);
            self.store(name.clone(), members.clone());
            created.insert(name, members);
        }
        Ok(created)
    }

    /// Hotspots (degree and complexity thresholds), optionally with their neighbors.
    pub fn create_hotspot_view(&self, options: &HotspotOptions) -> NodeSet {
        let mut nodes = self
            .analyzer
            .hotspots(options.min_degree, options.min_complexity);
        if options.include_neighbors {
            nodes = self.with_neighbors(nodes);
        }
        self.store(HOTSPOT_VIEW.to_string(), nodes.clone());
        nodes
    }

    /// Top-N nodes by a metric, optionally with their neighbors.
    pub fn create_importance_view(&self, options: &ImportanceOptions) -> NodeSet {
        let mut nodes: NodeSet = self
            .analyzer
            .top_by_metric(options.metric, options.top_n)
            .into_iter()
            .map(|ranked| ranked.id)
            .collect();
        if options.include_neighbors {
            nodes = self.with_neighbors(nodes);
        }
        self.store(importance_view_name(options), nodes.clone());
        nodes
    }

    /// One view per layer, given as layer name -> namespace prefix. Empty layers are skipped.
    pub fn create_layer_views(&self, layers: &BTreeMap<String, String>) -> ViewMap {
        let mut created = ViewMap::new();
        for (layer, prefix) in layers {
            let nodes = self.graph().nodes_by_namespace_prefix(prefix);
            if nodes.is_empty() {
                tracing::debug!("Layer {} ({}) matched no nodes", layer, prefix);
                continue;
            }
            let name = format!("layer_{}", layer);
            self.store(name.clone(), nodes.clone());
            created.insert(name, nodes);
        }
        created
    }

    /// Shortest path from `start` to `end` plus `expand_hops` of context around it.
    ///
    /// `None` when either class is unknown or no path exists.
    pub fn create_dependency_chain_view(
        &self,
        start: &str,
        end: &str,
        options: &DependencyChainOptions,
    ) -> Option<NodeSet> {
        let graph = self.graph();
        let (Some(start_id), Some(end_id)) = (graph.find_node_by_name(start), graph.find_node_by_name(end))
        else {
            tracing::debug!("Dependency chain {} -> {}: endpoint not found", start, end);
            return None;
        };

        let Some(path) = graph.shortest_path(&start_id, &end_id) else {
            tracing::debug!("Dependency chain {} -> {}: unreachable", start, end);
            return None;
        };

        let mut nodes: NodeSet = path.iter().cloned().collect();
        if options.expand_hops > 0 {
            for node in &path {
                nodes.extend(graph.nodes_within_hops(node, options.expand_hops, TraversalDirection::Both));
            }
        }

        self.store(dependency_view_name(start, end), nodes.clone());
        Some(nodes)
    }

    /// Complexity outliers ("god classes"), optionally with their neighbors.
    pub fn create_outlier_view(&self, options: &OutlierOptions) -> Result<NodeSet> {
        let mut nodes = self.analyzer.outlier_classes(options.percentile)?;
        if options.include_neighbors {
            nodes = self.with_neighbors(nodes);
        }
        self.store(OUTLIER_VIEW.to_string(), nodes.clone());
        Ok(nodes)
    }

    /// Run the default-parameter strategies (namespace, community, hotspot, importance).
    ///
    /// Strategies that need caller input are skipped. A failing strategy is
    /// logged and does not stop the others. Empty hotspot and importance views
    /// are stored but left out of the returned map.
    pub fn auto_create(&self, strategies: Option<&[ViewStrategy]>) -> ViewMap {
        self.auto_create_with(strategies, &AutoViewOptions::default())
    }

    /// `auto_create` with explicit parameters for each strategy.
    pub fn auto_create_with(&self, strategies: Option<&[ViewStrategy]>, options: &AutoViewOptions) -> ViewMap {
        let strategies = strategies.unwrap_or(&ViewStrategy::ALL[..]);
        let mut created = ViewMap::new();

        for &strategy in strategies {
            match self.run_default_strategy(strategy, options) {
                Ok(Some(views)) => {
                    tracing::info!("Created {} {} views", views.len(), strategy);
                    created.extend(views);
                }
                Ok(None) => {
                    tracing::debug!("Strategy {} needs explicit parameters; skipped", strategy);
                }
                Err(e) => {
                    tracing::warn!("Failed to create {} view: {}", strategy, e);
                }
            }
        }

        created
    }

    fn run_default_strategy(&self, strategy: ViewStrategy, options: &AutoViewOptions) -> Result<Option<ViewMap>> {
        let non_empty = |name: String, nodes: NodeSet| {
            if nodes.is_empty() {
                ViewMap::new()
            } else {
                ViewMap::from([(name, nodes)])
            }
        };

        let views = match strategy {
            ViewStrategy::Namespace => self.create_namespace_views(&options.namespace),
            ViewStrategy::Community => self.create_community_views(&options.community)?,
            ViewStrategy::Hotspot => non_empty(HOTSPOT_VIEW.to_string(), self.create_hotspot_view(&options.hotspot)),
            ViewStrategy::Importance => non_empty(
                importance_view_name(&options.importance),
                self.create_importance_view(&options.importance),
            ),
            ViewStrategy::Context
            | ViewStrategy::Layer
            | ViewStrategy::DependencyChain
            | ViewStrategy::GodClasses => return Ok(None),
        };
        Ok(Some(views))
    }

    /// A stored view by name.
    pub fn view(&self, name: &str) -> Option<NodeSet> {
        self.views.get(name).map(|entry| entry.value().clone())
    }

    /// Snapshot of all stored views.
    pub fn views(&self) -> ViewMap {
        self.views
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn view_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.views.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Size, induced edge count, density and member listing of a stored view.
    pub fn view_statistics(&self, name: &str) -> Option<ViewStatistics> {
        let nodes = self.view(name)?;
        let graph = self.graph();
        let subgraph = graph.subgraph(&nodes);

        let mut listing: Vec<ViewNode> = nodes
            .iter()
            .filter_map(|id| graph.node(id))
            .map(|node| ViewNode {
                id: node.id.clone(),
                display_name: node.display_name.clone(),
                full_name: node.full_name.clone(),
            })
            .collect();
        listing.sort_by(|a, b| a.id.cmp(&b.id));

        Some(ViewStatistics {
            view_name: name.to_string(),
            node_count: nodes.len(),
            edge_count: subgraph.edge_count(),
            density: subgraph.density(),
            nodes: listing,
        })
    }
}

/// Name under which an importance view is stored.
pub fn importance_view_name(options: &ImportanceOptions) -> String {
    format!("importance_{}_top{}", options.metric, options.top_n)
}

/// Name under which a context view is stored when none is given.
pub fn context_view_name(center: &str, max_hops: usize) -> String {
    format!("context_{}_h{}", center, max_hops)
}

pub fn dependency_view_name(start: &str, end: &str) -> String {
    format!("dependency_{}_to_{}", start, end)
}

/// `app::core` -> `app_core`.
fn flatten_namespace(namespace: &str) -> String {
    namespace.replace("::", "_").replace(['.', '/'], "_")
}

/// A view or diagram name reduced to a single safe file name component.
///
/// Path separators, `::` and dots become `_`, as do other characters outside
/// `[A-Za-z0-9_-]`. An empty result becomes `unnamed`.
pub fn file_stem(name: &str) -> String {
    let stem: String = flatten_namespace(name)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() { "unnamed".to_string() } else { stem }
}

//! Graph wrapper using petgraph::StableDiGraph keyed by element id

use crate::model::*;
use petgraph::Direction;
use petgraph::algo::{astar, is_cyclic_directed, tarjan_scc};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// The class graph: a directed multigraph, append-only once analysis starts.
pub struct Graph {
    inner: StableDiGraph<GraphNode, GraphEdge>,
    index: HashMap<NodeId, NodeIndex>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

/// Aggregate statistics of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    /// edges / (n * (n - 1)); 0 for fewer than two nodes.
    pub density: f64,
    pub is_dag: bool,
    /// All strongly connected components, singletons included.
    pub scc_count: usize,
    /// Components of size > 1 or carrying a self-loop.
    pub cycle_count: usize,
    pub avg_in_degree: f64,
    pub avg_out_degree: f64,
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build a graph from parsed element and relationship records.
    ///
    /// Relationships whose source or destination is not a known element are dropped.
    pub fn from_records(elements: &[ElementRecord], relationships: &[RelationshipRecord]) -> Self {
        let mut graph = Graph::new();
        for element in elements {
            graph.add_node(GraphNode::from(element));
        }

        let mut dropped = 0usize;
        for relationship in relationships {
            if !graph.add_edge(GraphEdge::from(relationship)) {
                tracing::debug!(
                    "Dropping relationship {} -> {}: unknown endpoint",
                    relationship.source,
                    relationship.destination
                );
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::info!("Dropped {} relationships with unknown endpoints", dropped);
        }

        graph
    }

    /// Add a node. Re-adding a known id overwrites its attributes.
    ///
    /// Returns `false` when an existing node was overwritten.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if let Some(&idx) = self.index.get(&node.id) {
            if let Some(existing) = self.inner.node_weight_mut(idx) {
                *existing = node;
            }
            return false;
        }
        let id = node.id.clone();
        let idx = self.inner.add_node(node);
        self.index.insert(id, idx);
        true
    }

    /// Add an edge. Returns `false` (and adds nothing) if an endpoint is unknown.
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        let (Some(&source), Some(&target)) = (self.index.get(&edge.source), self.index.get(&edge.target))
        else {
            return false;
        };
        self.inner.add_edge(source, target, edge);
        true
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Get a node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index
            .get(id)
            .and_then(|&idx| self.inner.node_weight(idx))
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all nodes in insertion order.
    pub fn all_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    /// Iterate over all edges in insertion order.
    pub fn all_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.inner
            .edge_indices()
            .filter_map(move |idx| self.inner.edge_weight(idx))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.all_nodes().map(|n| &n.id)
    }

    /// Number of incoming edges (dependents).
    pub fn in_degree(&self, id: &NodeId) -> usize {
        self.degree_in(id, Direction::Incoming)
    }

    /// Number of outgoing edges (dependees).
    pub fn out_degree(&self, id: &NodeId) -> usize {
        self.degree_in(id, Direction::Outgoing)
    }

    /// In-degree plus out-degree; a self-loop counts twice.
    pub fn degree(&self, id: &NodeId) -> usize {
        self.in_degree(id) + self.out_degree(id)
    }

    fn degree_in(&self, id: &NodeId, direction: Direction) -> usize {
        self.index
            .get(id)
            .map_or(0, |&idx| self.inner.edges_directed(idx, direction).count())
    }

    /// Direct neighbors of a node. Unknown nodes have none.
    pub fn neighbors(&self, id: &NodeId, direction: TraversalDirection) -> HashSet<NodeId> {
        let Some(&idx) = self.index.get(id) else {
            return HashSet::new();
        };
        let ids = |dir: Direction| {
            self.inner
                .neighbors_directed(idx, dir)
                .filter_map(|n| self.inner.node_weight(n))
                .map(|n| n.id.clone())
        };
        match direction {
            TraversalDirection::In => ids(Direction::Incoming).collect(),
            TraversalDirection::Out => ids(Direction::Outgoing).collect(),
            TraversalDirection::Both => ids(Direction::Incoming)
                .chain(ids(Direction::Outgoing))
                .collect(),
        }
    }

    /// Breadth-first expansion from `center` up to `max_hops` layers.
    ///
    /// The result always contains `center` when it is a known node; an unknown
    /// center yields the empty set.
    pub fn nodes_within_hops(
        &self,
        center: &NodeId,
        max_hops: usize,
        direction: TraversalDirection,
    ) -> HashSet<NodeId> {
        if !self.contains(center) {
            return HashSet::new();
        }

        let mut visited = HashSet::from([center.clone()]);
        let mut frontier = vec![center.clone()];

        for _ in 0..max_hops {
            let mut next = Vec::new();
            for node in &frontier {
                for neighbor in self.neighbors(node, direction) {
                    if visited.insert(neighbor.clone()) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        visited
    }

    /// Nodes whose namespace string starts with `prefix`.
    ///
    /// Plain string prefix: `app::core` also matches `app::core2`.
    pub fn nodes_by_namespace_prefix(&self, prefix: &str) -> HashSet<NodeId> {
        self.all_nodes()
            .filter(|n| n.namespace.starts_with(prefix))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Distinct non-empty namespaces, sorted.
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.all_nodes()
            .filter(|n| !n.namespace.is_empty())
            .map(|n| n.namespace.clone())
            .collect()
    }

    /// Find a node by short, display or fully qualified name (first match in insertion order).
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.all_nodes()
            .find(|n| n.matches_name(name))
            .map(|n| n.id.clone())
    }

    /// Fewest-hops path from `source` to `target`, both inclusive.
    pub fn shortest_path(&self, source: &NodeId, target: &NodeId) -> Option<Vec<NodeId>> {
        let &start = self.index.get(source)?;
        let &goal = self.index.get(target)?;

        let (_, path) = astar(&self.inner, start, |n| n == goal, |_| 1usize, |_| 0)?;
        Some(
            path.into_iter()
                .filter_map(|idx| self.inner.node_weight(idx))
                .map(|n| n.id.clone())
                .collect(),
        )
    }

    /// Induced subgraph over the known nodes of `ids`.
    pub fn subgraph(&self, ids: &HashSet<NodeId>) -> Graph {
        let mut sub = Graph::new();
        for node in self.all_nodes().filter(|n| ids.contains(&n.id)) {
            sub.add_node(node.clone());
        }
        for edge in self.all_edges() {
            if ids.contains(&edge.source) && ids.contains(&edge.target) {
                sub.add_edge(edge.clone());
            }
        }
        sub
    }

    /// edges / (n * (n - 1)); 0 for fewer than two nodes.
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        self.edge_count() as f64 / (n * (n - 1)) as f64
    }

    /// Compute aggregate statistics.
    pub fn statistics(&self) -> GraphStatistics {
        let node_count = self.node_count();
        let edge_count = self.edge_count();
        let sccs = tarjan_scc(&self.inner);
        let cycle_count = sccs
            .iter()
            .filter(|scc| scc.len() > 1 || self.inner.find_edge(scc[0], scc[0]).is_some())
            .count();
        // Every edge contributes one in- and one out-degree.
        let avg_degree = if node_count > 0 {
            edge_count as f64 / node_count as f64
        } else {
            0.0
        };

        GraphStatistics {
            node_count,
            edge_count,
            density: self.density(),
            is_dag: !is_cyclic_directed(&self.inner),
            scc_count: sccs.len(),
            cycle_count,
            avg_in_degree: avg_degree,
            avg_out_degree: avg_degree,
        }
    }

    pub(crate) fn inner(&self) -> &StableDiGraph<GraphNode, GraphEdge> {
        &self.inner
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

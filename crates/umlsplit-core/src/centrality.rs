//! Importance, betweenness and degree centrality over the class graph
//!
//! All scores are keyed by [`NodeId`]. Algorithms work on a dense index
//! snapshot of the graph so they never touch petgraph indices directly.

use crate::graph::Graph;
use crate::model::NodeId;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Random-walk continuation probability.
pub const DEFAULT_DAMPING: f64 = 0.85;
pub const PAGERANK_MAX_ITERATIONS: usize = 100;
pub const PAGERANK_TOLERANCE: f64 = 1.0e-6;

/// Dense, insertion-ordered snapshot of the graph topology.
struct DenseGraph {
    ids: Vec<NodeId>,
    /// Outgoing (target, weight) pairs, one entry per edge.
    weighted_out: Vec<Vec<(usize, f64)>>,
    /// Distinct successors in ascending position order.
    successors: Vec<Vec<usize>>,
}

impl DenseGraph {
    fn from_graph(graph: &Graph) -> Self {
        let inner = graph.inner();
        let indices: Vec<_> = inner.node_indices().collect();
        let position: HashMap<_, _> = indices.iter().enumerate().map(|(i, &idx)| (idx, i)).collect();

        let mut ids = Vec::with_capacity(indices.len());
        let mut weighted_out = vec![Vec::new(); indices.len()];
        let mut successors = vec![Vec::new(); indices.len()];

        for (i, &idx) in indices.iter().enumerate() {
            if let Some(node) = inner.node_weight(idx) {
                ids.push(node.id.clone());
            }
            let mut distinct = BTreeSet::new();
            for edge in inner.edges(idx) {
                let target = position[&edge.target()];
                weighted_out[i].push((target, edge.weight().weight));
                distinct.insert(target);
            }
            successors[i] = distinct.into_iter().collect();
        }

        DenseGraph {
            ids,
            weighted_out,
            successors,
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn into_scores(self, scores: Vec<f64>) -> HashMap<NodeId, f64> {
        self.ids.into_iter().zip(scores).collect()
    }
}

/// Weighted PageRank with uniform teleport and uniform redistribution of dangling mass.
///
/// Each edge is followed with probability proportional to its coupling weight
/// among the source's outgoing edges. Stops when the L1 change falls below
/// `n * PAGERANK_TOLERANCE`; if that never happens the last iterate is returned.
pub fn pagerank(graph: &Graph, damping: f64) -> HashMap<NodeId, f64> {
    let dense = DenseGraph::from_graph(graph);
    let n = dense.len();
    if n == 0 {
        return HashMap::new();
    }

    let uniform = 1.0 / n as f64;
    let out_weight: Vec<f64> = dense
        .weighted_out
        .iter()
        .map(|edges| edges.iter().map(|(_, w)| w).sum())
        .collect();
    let dangling: Vec<usize> = (0..n).filter(|&i| out_weight[i] == 0.0).collect();

    let mut scores = vec![uniform; n];
    for iteration in 0..PAGERANK_MAX_ITERATIONS {
        let dangling_sum: f64 = damping * dangling.iter().map(|&i| scores[i]).sum::<f64>();
        let mut next = vec![dangling_sum * uniform + (1.0 - damping) * uniform; n];

        for (source, edges) in dense.weighted_out.iter().enumerate() {
            if out_weight[source] == 0.0 {
                continue;
            }
            let share = damping * scores[source] / out_weight[source];
            for &(target, weight) in edges {
                next[target] += share * weight;
            }
        }

        let delta: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
        scores = next;
        if delta < n as f64 * PAGERANK_TOLERANCE {
            tracing::debug!("PageRank converged after {} iterations", iteration + 1);
            return dense.into_scores(scores);
        }
    }

    tracing::warn!(
        "PageRank did not converge within {} iterations",
        PAGERANK_MAX_ITERATIONS
    );
    dense.into_scores(scores)
}

/// Betweenness centrality over unweighted directed shortest paths (Brandes).
///
/// Normalized by `1 / ((n - 1)(n - 2))`; graphs with two nodes or fewer score 0.
pub fn betweenness(graph: &Graph) -> HashMap<NodeId, f64> {
    let dense = DenseGraph::from_graph(graph);
    let n = dense.len();
    let mut centrality = vec![0.0; n];

    for source in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut distance: Vec<Option<usize>> = vec![None; n];
        sigma[source] = 1.0;
        distance[source] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let dv = distance[v].unwrap_or(0);
            for &w in &dense.successors[v] {
                if distance[w].is_none() {
                    distance[w] = Some(dv + 1);
                    queue.push_back(w);
                }
                if distance[w] == Some(dv + 1) {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut dependency = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                dependency[v] += sigma[v] / sigma[w] * (1.0 + dependency[w]);
            }
            if w != source {
                centrality[w] += dependency[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for value in &mut centrality {
            *value *= scale;
        }
    }

    dense.into_scores(centrality)
}

/// Total degree divided by `n - 1`. A lone node scores 1.
pub fn degree_centrality(graph: &Graph) -> HashMap<NodeId, f64> {
    let n = graph.node_count();
    if n == 0 {
        return HashMap::new();
    }
    let scale = if n > 1 { 1.0 / (n - 1) as f64 } else { 1.0 };
    graph
        .node_ids()
        .map(|id| (id.clone(), graph.degree(id) as f64 * scale))
        .collect()
}

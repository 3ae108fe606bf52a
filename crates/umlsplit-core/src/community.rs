//! Louvain community detection on the undirected collapse of the class graph.
//!
//! Deterministic variant: nodes are visited in ascending id order, candidate
//! communities in ascending community order, and the final community ids are
//! renumbered densely from 0 in node order.

use crate::graph::Graph;
use crate::model::NodeId;
use std::collections::{BTreeMap, HashMap};

/// Minimum modularity gain for another pass or level to be worth it.
const MIN_GAIN: f64 = 1.0e-7;

/// Weighted undirected graph; `adjacency[i][i]` holds self-loop weight.
#[derive(Debug, Clone)]
struct UndirectedGraph {
    adjacency: Vec<BTreeMap<usize, f64>>,
}

impl UndirectedGraph {
    fn len(&self) -> usize {
        self.adjacency.len()
    }

    fn loop_weight(&self, node: usize) -> f64 {
        self.adjacency[node].get(&node).copied().unwrap_or(0.0)
    }

    /// Weighted degree; a self-loop counts twice.
    fn degree(&self, node: usize) -> f64 {
        self.adjacency[node].values().sum::<f64>() + self.loop_weight(node)
    }

    /// Sum of edge weights, each undirected edge once.
    fn total_weight(&self) -> f64 {
        (0..self.len()).map(|i| self.degree(i)).sum::<f64>() / 2.0
    }

    /// Collapse each community into one node.
    fn induced(&self, partition: &[usize], community_count: usize) -> UndirectedGraph {
        let mut adjacency = vec![BTreeMap::new(); community_count];
        for (i, neighbors) in self.adjacency.iter().enumerate() {
            for (&j, &weight) in neighbors.range(i..) {
                let (ci, cj) = (partition[i], partition[j]);
                *adjacency[ci].entry(cj).or_insert(0.0) += weight;
                if ci != cj {
                    *adjacency[cj].entry(ci).or_insert(0.0) += weight;
                }
            }
        }
        UndirectedGraph { adjacency }
    }
}

/// Per-level bookkeeping for the local moving phase.
struct Level<'a> {
    graph: &'a UndirectedGraph,
    resolution: f64,
    two_m: f64,
    node_community: Vec<usize>,
    degrees: Vec<f64>,
    /// Sum of member degrees per community.
    totals: Vec<f64>,
    /// Internal edge weight per community.
    internals: Vec<f64>,
}

impl<'a> Level<'a> {
    fn new(graph: &'a UndirectedGraph, resolution: f64) -> Self {
        let n = graph.len();
        let degrees: Vec<f64> = (0..n).map(|i| graph.degree(i)).collect();
        let internals = (0..n).map(|i| graph.loop_weight(i)).collect();
        Level {
            graph,
            resolution,
            two_m: 2.0 * graph.total_weight(),
            node_community: (0..n).collect(),
            totals: degrees.clone(),
            degrees,
            internals,
        }
    }

    fn modularity(&self) -> f64 {
        let m = self.two_m / 2.0;
        self.internals
            .iter()
            .zip(&self.totals)
            .filter(|(_, total)| **total > 0.0)
            .map(|(internal, total)| internal / m - self.resolution * (total / self.two_m).powi(2))
            .sum()
    }

    /// Edge weight from `node` to each adjacent community, self-loop excluded.
    fn neighbor_communities(&self, node: usize) -> BTreeMap<usize, f64> {
        let mut weights = BTreeMap::new();
        for (&neighbor, &weight) in &self.graph.adjacency[node] {
            if neighbor != node {
                *weights.entry(self.node_community[neighbor]).or_insert(0.0) += weight;
            }
        }
        weights
    }

    fn remove(&mut self, node: usize, community: usize, weight_to_community: f64) {
        self.totals[community] -= self.degrees[node];
        self.internals[community] -= weight_to_community + self.graph.loop_weight(node);
    }

    fn insert(&mut self, node: usize, community: usize, weight_to_community: f64) {
        self.node_community[node] = community;
        self.totals[community] += self.degrees[node];
        self.internals[community] += weight_to_community + self.graph.loop_weight(node);
    }

    /// Repeatedly move single nodes to the neighboring community with the best gain.
    fn optimize(&mut self) {
        let mut current = self.modularity();
        loop {
            let mut moved = false;
            for node in 0..self.graph.len() {
                let own = self.node_community[node];
                let neighbors = self.neighbor_communities(node);
                let own_weight = neighbors.get(&own).copied().unwrap_or(0.0);
                self.remove(node, own, own_weight);

                let scaled_degree = self.degrees[node] / self.two_m;
                let resolution = self.resolution;
                let gain = |community: usize, weight: f64, totals: &[f64]| {
                    weight - resolution * totals[community] * scaled_degree
                };

                let mut best = own;
                let mut best_gain = gain(own, own_weight, &self.totals);
                for (&community, &weight) in &neighbors {
                    let candidate = gain(community, weight, &self.totals);
                    if candidate > best_gain {
                        best = community;
                        best_gain = candidate;
                    }
                }

                let best_weight = neighbors.get(&best).copied().unwrap_or(0.0);
                self.insert(node, best, best_weight);
                moved |= best != own;
            }

            let next = self.modularity();
            if !moved || next - current < MIN_GAIN {
                break;
            }
            current = next;
        }
    }

    /// Community per node renumbered densely from 0, plus the community count.
    fn renumbered(&self) -> (Vec<usize>, usize) {
        let mut mapping = HashMap::new();
        let partition = self
            .node_community
            .iter()
            .map(|&c| {
                let next = mapping.len();
                *mapping.entry(c).or_insert(next)
            })
            .collect();
        (partition, mapping.len())
    }
}

/// Partition all nodes into communities.
///
/// Direction is discarded: parallel and antiparallel edges between a pair
/// collapse into one undirected edge carrying the largest coupling weight.
/// Higher `resolution` favours more, smaller communities.
pub fn detect_communities(graph: &Graph, resolution: f64) -> HashMap<NodeId, usize> {
    let mut ids: Vec<NodeId> = graph.node_ids().cloned().collect();
    ids.sort();
    let position: HashMap<&NodeId, usize> = ids.iter().enumerate().map(|(i, id)| (id, i)).collect();

    let mut adjacency = vec![BTreeMap::new(); ids.len()];
    for edge in graph.all_edges() {
        let (a, b) = (position[&edge.source], position[&edge.target]);
        for (from, to) in [(a, b), (b, a)] {
            let slot = adjacency[from].entry(to).or_insert(0.0f64);
            *slot = slot.max(edge.weight);
        }
    }
    let mut current = UndirectedGraph { adjacency };

    // Every node starts alone; without edges there is nothing to merge.
    let mut membership: Vec<usize> = (0..ids.len()).collect();
    if current.total_weight() == 0.0 {
        return ids.into_iter().zip(membership).collect();
    }

    let mut modularity = f64::NEG_INFINITY;
    let mut levels = 0usize;
    loop {
        let mut level = Level::new(&current, resolution);
        level.optimize();
        let gained = level.modularity();
        if levels > 0 && gained - modularity < MIN_GAIN {
            break;
        }

        let (partition, count) = level.renumbered();
        for community in &mut membership {
            *community = partition[*community];
        }
        modularity = gained;
        levels += 1;

        if count == current.len() {
            break;
        }
        current = current.induced(&partition, count);
    }

    tracing::debug!(
        "Louvain finished after {} levels with modularity {:.4}",
        levels,
        modularity
    );

    // Renumber in node order so ids do not depend on level history.
    let mut mapping = HashMap::new();
    ids.into_iter()
        .zip(membership)
        .map(|(id, community)| {
            let next = mapping.len();
            (id, *mapping.entry(community).or_insert(next))
        })
        .collect()
}

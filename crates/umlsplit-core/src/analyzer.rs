//! Graph analysis: importance metrics, communities, hotspots and namespace coupling

use crate::centrality::{self, DEFAULT_DAMPING};
use crate::community::detect_communities;
use crate::error::{CoreError, Result};
use crate::graph::Graph;
use crate::model::NodeId;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const DEFAULT_HOTSPOT_MIN_DEGREE: usize = 5;
pub const DEFAULT_HOTSPOT_MIN_COMPLEXITY: f64 = 10.0;
pub const DEFAULT_RESOLUTION: f64 = 1.0;
pub const DEFAULT_OUTLIER_PERCENTILE: f64 = 90.0;
const SUMMARY_TOP_N: usize = 5;

/// Node scoring metric used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Metric {
    /// Global influence (PageRank).
    #[default]
    #[serde(rename = "pagerank", alias = "importance")]
    Importance,
    #[serde(rename = "betweenness")]
    Betweenness,
    /// Normalized total degree.
    #[serde(rename = "degree")]
    Degree,
    #[serde(rename = "in_degree")]
    InDegree,
    #[serde(rename = "out_degree")]
    OutDegree,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Importance,
        Metric::Betweenness,
        Metric::Degree,
        Metric::InDegree,
        Metric::OutDegree,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Importance => "pagerank",
            Metric::Betweenness => "betweenness",
            Metric::Degree => "degree",
            Metric::InDegree => "in_degree",
            Metric::OutDegree => "out_degree",
        }
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pagerank" | "importance" => Ok(Metric::Importance),
            "betweenness" => Ok(Metric::Betweenness),
            "degree" => Ok(Metric::Degree),
            "in_degree" => Ok(Metric::InDegree),
            "out_degree" => Ok(Metric::OutDegree),
            other => Err(CoreError::InvalidMetric(other.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node with its score under some metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    pub id: NodeId,
    pub name: String,
    pub score: f64,
}

/// Coupling figures for one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NamespaceCoupling {
    pub node_count: usize,
    pub internal_edges: usize,
    /// Edges crossing the namespace boundary in either direction.
    pub external_edges: usize,
    /// internal / (internal + external), 0 without edges.
    pub cohesion: f64,
    /// external / node_count.
    pub coupling: f64,
}

/// High-level summary of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub community_count: usize,
    pub hotspot_count: usize,
    pub leaf_count: usize,
    pub root_count: usize,
    pub top_important: Vec<RankedNode>,
    pub top_connected: Vec<RankedNode>,
}

struct CommunityAssignment {
    resolution: f64,
    membership: HashMap<NodeId, usize>,
}

/// Read-only analyzer over a fully built graph.
///
/// Importance, betweenness and communities are computed at most once per
/// analyzer; concurrent first access blocks on the same initializer.
pub struct GraphAnalyzer<'g> {
    graph: &'g Graph,
    importance: OnceLock<HashMap<NodeId, f64>>,
    betweenness: OnceLock<HashMap<NodeId, f64>>,
    communities: OnceLock<CommunityAssignment>,
}

impl<'g> GraphAnalyzer<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        GraphAnalyzer {
            graph,
            importance: OnceLock::new(),
            betweenness: OnceLock::new(),
            communities: OnceLock::new(),
        }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// PageRank scores (damping 0.85); higher means more nodes depend on it transitively.
    pub fn importance(&self) -> &HashMap<NodeId, f64> {
        self.importance.get_or_init(|| {
            tracing::debug!("Computing importance over {} nodes", self.graph.node_count());
            centrality::pagerank(self.graph, DEFAULT_DAMPING)
        })
    }

    /// Betweenness centrality; higher means more bridge-like.
    pub fn betweenness(&self) -> &HashMap<NodeId, f64> {
        self.betweenness.get_or_init(|| {
            tracing::debug!("Computing betweenness over {} nodes", self.graph.node_count());
            centrality::betweenness(self.graph)
        })
    }

    /// Normalized (in + out) degree. Not cached.
    pub fn degree_centrality(&self) -> HashMap<NodeId, f64> {
        centrality::degree_centrality(self.graph)
    }

    /// Raw scores for a metric.
    pub fn scores(&self, metric: Metric) -> Cow<'_, HashMap<NodeId, f64>> {
        match metric {
            Metric::Importance => Cow::Borrowed(self.importance()),
            Metric::Betweenness => Cow::Borrowed(self.betweenness()),
            Metric::Degree => Cow::Owned(self.degree_centrality()),
            Metric::InDegree => Cow::Owned(
                self.graph
                    .node_ids()
                    .map(|id| (id.clone(), self.graph.in_degree(id) as f64))
                    .collect(),
            ),
            Metric::OutDegree => Cow::Owned(
                self.graph
                    .node_ids()
                    .map(|id| (id.clone(), self.graph.out_degree(id) as f64))
                    .collect(),
            ),
        }
    }

    /// The `n` highest-scoring nodes, score descending then id ascending.
    pub fn top_by_metric(&self, metric: Metric, n: usize) -> Vec<RankedNode> {
        let scores = self.scores(metric);
        let mut ranked: Vec<(&NodeId, f64)> = scores.iter().map(|(id, &s)| (id, s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(n)
            .map(|(id, score)| RankedNode {
                id: id.clone(),
                name: self.display_name(id),
                score,
            })
            .collect()
    }

    /// Same as [`top_by_metric`](Self::top_by_metric) with the metric given by name.
    pub fn top_by_metric_name(&self, metric: &str, n: usize) -> Result<Vec<RankedNode>> {
        Ok(self.top_by_metric(metric.parse()?, n))
    }

    /// Community id per node (Louvain on the undirected collapse).
    ///
    /// The first call fixes the partition for this analyzer; later calls with a
    /// different resolution get the cached partition back.
    pub fn communities(&self, resolution: f64) -> &HashMap<NodeId, usize> {
        let assignment = self.communities.get_or_init(|| {
            tracing::debug!("Detecting communities at resolution {}", resolution);
            CommunityAssignment {
                resolution,
                membership: detect_communities(self.graph, resolution),
            }
        });
        if assignment.resolution != resolution {
            tracing::warn!(
                "Communities already computed at resolution {}; ignoring requested resolution {}",
                assignment.resolution,
                resolution
            );
        }
        &assignment.membership
    }

    /// Members grouped by community id.
    pub fn community_members(&self, resolution: f64) -> BTreeMap<usize, HashSet<NodeId>> {
        let mut members: BTreeMap<usize, HashSet<NodeId>> = BTreeMap::new();
        for (id, &community) in self.communities(resolution) {
            members.entry(community).or_default().insert(id.clone());
        }
        members
    }

    /// Nodes with total degree >= `min_degree` and complexity >= `min_complexity`.
    pub fn hotspots(&self, min_degree: usize, min_complexity: f64) -> HashSet<NodeId> {
        self.graph
            .all_nodes()
            .filter(|n| self.graph.degree(&n.id) >= min_degree && n.complexity >= min_complexity)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Nodes whose complexity is at or above the given percentile of all complexities.
    pub fn outlier_classes(&self, percentile: f64) -> Result<HashSet<NodeId>> {
        if !(0.0..=100.0).contains(&percentile) {
            return Err(CoreError::InvalidParameter {
                name: "percentile",
                reason: format!("{} is outside 0..=100", percentile),
            });
        }

        let complexities: Vec<f64> = self.graph.all_nodes().map(|n| n.complexity).collect();
        let Some(threshold) = percentile_of(complexities, percentile) else {
            return Ok(HashSet::new());
        };

        Ok(self
            .graph
            .all_nodes()
            .filter(|n| n.complexity >= threshold)
            .map(|n| n.id.clone())
            .collect())
    }

    /// Nodes without outgoing edges.
    pub fn leaf_nodes(&self) -> HashSet<NodeId> {
        self.graph
            .node_ids()
            .filter(|id| self.graph.out_degree(id) == 0)
            .cloned()
            .collect()
    }

    /// Nodes without incoming edges.
    pub fn root_nodes(&self) -> HashSet<NodeId> {
        self.graph
            .node_ids()
            .filter(|id| self.graph.in_degree(id) == 0)
            .cloned()
            .collect()
    }

    /// Cohesion and coupling per namespace, keyed by namespace.
    pub fn namespace_coupling(&self) -> BTreeMap<String, NamespaceCoupling> {
        let mut table: BTreeMap<String, NamespaceCoupling> = BTreeMap::new();
        for node in self.graph.all_nodes() {
            table.entry(node.namespace.clone()).or_default().node_count += 1;
        }

        for edge in self.graph.all_edges() {
            let (Some(source), Some(target)) = (self.graph.node(&edge.source), self.graph.node(&edge.target))
            else {
                continue;
            };
            if source.namespace == target.namespace {
                table.entry(source.namespace.clone()).or_default().internal_edges += 1;
            } else {
                table.entry(source.namespace.clone()).or_default().external_edges += 1;
                table.entry(target.namespace.clone()).or_default().external_edges += 1;
            }
        }

        for stats in table.values_mut() {
            let total = stats.internal_edges + stats.external_edges;
            stats.cohesion = if total > 0 {
                stats.internal_edges as f64 / total as f64
            } else {
                0.0
            };
            stats.coupling = if stats.node_count > 0 {
                stats.external_edges as f64 / stats.node_count as f64
            } else {
                0.0
            };
        }

        table
    }

    /// Summary with default hotspot thresholds and community resolution.
    pub fn summary(&self) -> AnalysisSummary {
        self.summary_with(DEFAULT_RESOLUTION)
    }

    /// Summary counting communities at `resolution`.
    ///
    /// Callers that later create community views should pass the same
    /// resolution, since the first partition computed is the one kept.
    pub fn summary_with(&self, resolution: f64) -> AnalysisSummary {
        let community_count = self
            .communities(resolution)
            .values()
            .collect::<HashSet<_>>()
            .len();

        AnalysisSummary {
            total_nodes: self.graph.node_count(),
            total_edges: self.graph.edge_count(),
            community_count,
            hotspot_count: self
                .hotspots(DEFAULT_HOTSPOT_MIN_DEGREE, DEFAULT_HOTSPOT_MIN_COMPLEXITY)
                .len(),
            leaf_count: self.leaf_nodes().len(),
            root_count: self.root_nodes().len(),
            top_important: self.top_by_metric(Metric::Importance, SUMMARY_TOP_N),
            top_connected: self.top_by_metric(Metric::Degree, SUMMARY_TOP_N),
        }
    }

    fn display_name(&self, id: &NodeId) -> String {
        self.graph
            .node(id)
            .map(|n| n.display_name.clone())
            .unwrap_or_default()
    }
}

/// Linear-interpolation percentile; `None` for no values.
fn percentile_of(mut values: Vec<f64>, percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let rank = percentile / 100.0 * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * fraction)
}

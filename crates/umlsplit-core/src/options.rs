//! Parameters for the view strategies, deserializable from configuration

use crate::analyzer::{
    DEFAULT_HOTSPOT_MIN_COMPLEXITY, DEFAULT_HOTSPOT_MIN_DEGREE, DEFAULT_OUTLIER_PERCENTILE,
    DEFAULT_RESOLUTION, Metric,
};
use crate::model::TraversalDirection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    pub max_hops: usize,
    pub direction: TraversalDirection,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            max_hops: 2,
            direction: TraversalDirection::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceOptions {
    /// Namespaces to split on; all discovered namespaces when `None`.
    pub namespaces: Option<Vec<String>>,
    pub min_nodes: usize,
}

impl Default for NamespaceOptions {
    fn default() -> Self {
        NamespaceOptions {
            namespaces: None,
            min_nodes: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityOptions {
    pub min_size: usize,
    pub resolution: f64,
}

impl Default for CommunityOptions {
    fn default() -> Self {
        CommunityOptions {
            min_size: 3,
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotOptions {
    pub min_degree: usize,
    pub min_complexity: f64,
    pub include_neighbors: bool,
}

impl Default for HotspotOptions {
    fn default() -> Self {
        HotspotOptions {
            min_degree: DEFAULT_HOTSPOT_MIN_DEGREE,
            min_complexity: DEFAULT_HOTSPOT_MIN_COMPLEXITY,
            include_neighbors: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportanceOptions {
    pub top_n: usize,
    pub metric: Metric,
    pub include_neighbors: bool,
}

impl Default for ImportanceOptions {
    fn default() -> Self {
        ImportanceOptions {
            top_n: 15,
            metric: Metric::Importance,
            include_neighbors: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyChainOptions {
    /// Hops of context around every path node; 0 keeps the bare path.
    pub expand_hops: usize,
}

impl Default for DependencyChainOptions {
    fn default() -> Self {
        DependencyChainOptions { expand_hops: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierOptions {
    pub percentile: f64,
    pub include_neighbors: bool,
}

impl Default for OutlierOptions {
    fn default() -> Self {
        OutlierOptions {
            percentile: DEFAULT_OUTLIER_PERCENTILE,
            include_neighbors: true,
        }
    }
}

/// Parameters for the strategies `ViewFilter::auto_create_with` runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoViewOptions {
    pub namespace: NamespaceOptions,
    pub community: CommunityOptions,
    pub hotspot: HotspotOptions,
    pub importance: ImportanceOptions,
}

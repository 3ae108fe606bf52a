//! Analysis report and view manifest writers

use crate::config::ReportFormat;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use umlsplit_core::{AnalysisSummary, GraphAnalyzer, GraphStatistics, NamespaceCoupling, ViewFilter, ViewStatistics};

pub const MANIFEST_FILE: &str = "views.json";

/// Everything the analysis report shows.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: AnalysisSummary,
    pub namespace_coupling: BTreeMap<String, NamespaceCoupling>,
    pub graph_statistics: GraphStatistics,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Communities are counted at `resolution`.
    pub fn collect(analyzer: &GraphAnalyzer<'_>, resolution: f64) -> Self {
        AnalysisReport {
            summary: analyzer.summary_with(resolution),
            namespace_coupling: analyzer.namespace_coupling(),
            graph_statistics: analyzer.graph().statistics(),
            generated_at: Utc::now(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let summary = &self.summary;
        let mut lines = vec![
            "# UML Analysis Report".to_string(),
            String::new(),
            "## Overall statistics".to_string(),
            format!("- Total classes: {}", summary.total_nodes),
            format!("- Total relationships: {}", summary.total_edges),
            format!("- Communities: {}", summary.community_count),
            format!("- Hotspots: {}", summary.hotspot_count),
            format!("- Leaf classes: {}", summary.leaf_count),
            format!("- Root classes: {}", summary.root_count),
            String::new(),
            "## Most important classes (PageRank)".to_string(),
            String::new(),
        ];
        for (i, node) in summary.top_important.iter().enumerate() {
            lines.push(format!("{}. **{}** (score: {:.4})", i + 1, node.name, node.score));
        }

        lines.extend([String::new(), "## Most connected classes".to_string(), String::new()]);
        for (i, node) in summary.top_connected.iter().enumerate() {
            lines.push(format!("{}. **{}** (degree centrality: {:.4})", i + 1, node.name, node.score));
        }

        lines.extend([
            String::new(),
            "## Namespace coupling analysis".to_string(),
            String::new(),
            "| Namespace | Class count | Cohesion | Coupling |".to_string(),
            "|-----------|-------------|----------|----------|".to_string(),
        ]);
        for (namespace, stats) in self.namespace_coupling.iter().filter(|(ns, _)| !ns.is_empty()) {
            lines.push(format!(
                "| {} | {} | {:.2} | {:.2} |",
                namespace, stats.node_count, stats.cohesion, stats.coupling
            ));
        }

        let stats = &self.graph_statistics;
        lines.extend([
            String::new(),
            "## Graph structure".to_string(),
            format!("- Density: {:.3}", stats.density),
            format!("- Acyclic: {}", stats.is_dag),
            format!("- Strongly connected components: {}", stats.scc_count),
            format!("- Cycles: {}", stats.cycle_count),
            String::new(),
            format!("_Generated {}_", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        ]);

        let mut markdown = lines.join("\n");
        markdown.push('\n');
        markdown
    }

    pub fn render(&self, format: ReportFormat) -> anyhow::Result<String> {
        match format {
            ReportFormat::Markdown => Ok(self.to_markdown()),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    /// Write `analysis_report.{md,json}` into `dir` and return its path.
    pub fn write(&self, dir: &Path, format: ReportFormat) -> anyhow::Result<PathBuf> {
        let path = dir.join(format!("analysis_report.{}", format.extension()));
        std::fs::write(&path, self.render(format)?)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(path)
    }
}

/// Per-view statistics, as written to `views.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ViewManifest {
    pub diagram: String,
    pub generated_at: DateTime<Utc>,
    pub views: Vec<ViewStatistics>,
}

impl ViewManifest {
    /// Statistics for the named views; unknown names are skipped.
    pub fn collect<'n>(diagram: &str, filter: &ViewFilter<'_>, names: impl IntoIterator<Item = &'n String>) -> Self {
        let views = names
            .into_iter()
            .filter_map(|name| filter.view_statistics(name))
            .collect();
        ViewManifest {
            diagram: diagram.to_string(),
            generated_at: Utc::now(),
            views,
        }
    }

    pub fn write(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(path)
    }
}

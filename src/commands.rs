//! CLI command implementations

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::puml;
use crate::report::{AnalysisReport, ViewManifest};
use anyhow::{Context, bail};
use std::path::{Path, PathBuf};
use umlsplit_core::filter::{
    HOTSPOT_VIEW, OUTLIER_VIEW, context_view_name, dependency_view_name, importance_view_name,
};
use umlsplit_core::{
    ContextOptions, DependencyChainOptions, Graph, GraphAnalyzer, TraversalDirection, ViewFilter, ViewMap,
    file_stem,
};
use umlsplit_ingest::{Diagram, SequenceDiagram, load_diagram};

/// Configuration merged with the global CLI flags.
pub struct Settings {
    pub config: Config,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Settings {
    /// CLI flags win over the config file for input and output.
    pub fn resolve(
        config_path: Option<PathBuf>,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let config = Config::load(&config_path)?;

        let Some(input) = input.or_else(|| config.input.json_file.clone()) else {
            bail!("No input file: pass --input or set input.json_file in {}", config_path.display());
        };
        if !input.is_file() {
            bail!("Input file not found: {}", input.display());
        }

        let output = output.unwrap_or_else(|| config.output.directory.clone());
        std::fs::create_dir_all(&output)
            .with_context(|| format!("Failed to create output directory {}", output.display()))?;

        tracing::info!("Input: {}", input.display());
        tracing::info!("Output directory: {}", output.display());
        Ok(Settings { config, input, output })
    }

    /// Resolution every community count and community view uses.
    fn resolution(&self) -> f64 {
        self.config.views.community.options.resolution
    }
}

fn load(settings: &Settings) -> anyhow::Result<Diagram> {
    load_diagram(&settings.input).with_context(|| format!("Failed to load {}", settings.input.display()))
}

/// Graph of a diagram: the class graph, or the call graph of a trace.
fn diagram_graph(diagram: &Diagram) -> (String, Graph) {
    match diagram {
        Diagram::Class(class) => (class.name.clone(), class.build_graph()),
        Diagram::Sequence(sequence) => {
            let (elements, relationships) = sequence.call_graph_records();
            (sequence.name.clone(), Graph::from_records(&elements, &relationships))
        }
    }
}

fn log_graph(graph: &Graph) {
    let stats = graph.statistics();
    tracing::info!(
        "Graph: {} nodes, {} edges, density {:.3}, acyclic {}",
        stats.node_count,
        stats.edge_count,
        stats.density,
        stats.is_dag
    );
}

fn write_report(settings: &Settings, analyzer: &GraphAnalyzer<'_>) -> anyhow::Result<()> {
    let analysis = &settings.config.analysis;
    if !analysis.generate_report {
        tracing::info!("Report generation disabled");
        return Ok(());
    }
    let report = AnalysisReport::collect(analyzer, settings.resolution());
    let path = report.write(&settings.output, analysis.report_format)?;
    println!("Analysis report: {}", path.display());
    Ok(())
}

fn print_summary(settings: &Settings, analyzer: &GraphAnalyzer<'_>) {
    let summary = analyzer.summary_with(settings.resolution());
    println!(
        "{} classes, {} relationships, {} communities, {} hotspots",
        summary.total_nodes, summary.total_edges, summary.community_count, summary.hotspot_count
    );
}

pub fn analyze(settings: &Settings) -> anyhow::Result<()> {
    let diagram = load(settings)?;
    let Diagram::Class(class) = &diagram else {
        tracing::info!("Sequence diagram input; running trace analysis");
        return trace_diagram(settings, &diagram);
    };

    let stats = class.statistics();
    tracing::info!(
        "Parsed {} classes, {} relationships, {} namespaces",
        stats.total_elements,
        stats.total_relationships,
        stats.namespace_count
    );

    let graph = class.build_graph();
    log_graph(&graph);
    let analyzer = GraphAnalyzer::new(&graph);
    print_summary(settings, &analyzer);
    write_report(settings, &analyzer)
}

pub fn views(settings: &Settings) -> anyhow::Result<()> {
    let diagram = load(settings)?;
    let Diagram::Class(class) = &diagram else {
        tracing::info!("Sequence diagram input; running trace analysis");
        return trace_diagram(settings, &diagram);
    };

    let graph = class.build_graph();
    log_graph(&graph);
    let analyzer = GraphAnalyzer::new(&graph);
    print_summary(settings, &analyzer);
    write_report(settings, &analyzer)?;

    let filter = ViewFilter::new(&analyzer);
    let created = create_configured_views(&settings.config, &filter);
    println!("{} views created", created.len());
    for (name, nodes) in &created {
        let path = puml::write_view(&settings.output, name, &graph, nodes, &settings.config.diagram)?;
        println!("  {} ({} classes) -> {}", name, nodes.len(), path.display());
    }

    let path = ViewManifest::collect(&class.name, &filter, created.keys()).write(&settings.output)?;
    println!("View manifest: {}", path.display());
    Ok(())
}

/// Run every enabled view section. Failing sections are logged and skipped;
/// empty hotspot and importance views are left out.
fn create_configured_views(config: &Config, filter: &ViewFilter<'_>) -> ViewMap {
    let views = &config.views;
    let mut created = ViewMap::new();

    if views.namespace.enabled {
        let namespace_views = filter.create_namespace_views(&views.namespace.options);
        tracing::info!("Namespace views: {}", namespace_views.len());
        created.extend(namespace_views);
    }

    if views.community.enabled {
        match filter.create_community_views(&views.community.options) {
            Ok(community_views) => {
                tracing::info!("Community views: {}", community_views.len());
                created.extend(community_views);
            }
            Err(e) => tracing::warn!("Failed to create community views: {}", e),
        }
    }

    if views.hotspot.enabled {
        let nodes = filter.create_hotspot_view(&views.hotspot.options);
        tracing::info!("Hotspot view: {} nodes", nodes.len());
        if !nodes.is_empty() {
            created.insert(HOTSPOT_VIEW.to_string(), nodes);
        }
    }

    if views.importance.enabled {
        let options = &views.importance.options;
        let nodes = filter.create_importance_view(options);
        tracing::info!("Importance view: {} nodes", nodes.len());
        if !nodes.is_empty() {
            created.insert(importance_view_name(options), nodes);
        }
    }

    if views.layer.enabled {
        let layers = &views.layer.options.layers;
        if layers.is_empty() {
            tracing::warn!("Layer views enabled but no layers configured");
        } else {
            let layer_views = filter.create_layer_views(layers);
            tracing::info!("Layer views: {}", layer_views.len());
            created.extend(layer_views);
        }
    }

    if views.god_classes.enabled {
        match filter.create_outlier_view(&views.god_classes.options) {
            Ok(nodes) if !nodes.is_empty() => {
                created.insert(OUTLIER_VIEW.to_string(), nodes);
            }
            Ok(_) => tracing::info!("No god classes found"),
            Err(e) => tracing::warn!("Failed to create god class view: {}", e),
        }
    }

    created
}

pub fn context(
    settings: &Settings,
    class: &str,
    hops: usize,
    direction: TraversalDirection,
) -> anyhow::Result<()> {
    let diagram = load(settings)?;
    let (name, graph) = diagram_graph(&diagram);
    let analyzer = GraphAnalyzer::new(&graph);
    let filter = ViewFilter::new(&analyzer);

    let options = ContextOptions {
        max_hops: hops,
        direction,
    };
    filter.create_context_view(class, &options, None)?;
    write_single_view(settings, &name, &graph, &filter, &context_view_name(class, hops))
}

pub fn chain(settings: &Settings, from: &str, to: &str, expand: usize) -> anyhow::Result<()> {
    let diagram = load(settings)?;
    let (name, graph) = diagram_graph(&diagram);
    let analyzer = GraphAnalyzer::new(&graph);
    let filter = ViewFilter::new(&analyzer);

    let options = DependencyChainOptions { expand_hops: expand };
    if filter.create_dependency_chain_view(from, to, &options).is_none() {
        bail!("No dependency chain from {} to {}", from, to);
    }
    write_single_view(settings, &name, &graph, &filter, &dependency_view_name(from, to))
}

fn write_single_view(
    settings: &Settings,
    diagram: &str,
    graph: &Graph,
    filter: &ViewFilter<'_>,
    view: &str,
) -> anyhow::Result<()> {
    let Some(nodes) = filter.view(view) else {
        bail!("View {} was not stored", view);
    };
    let path = puml::write_view(&settings.output, view, graph, &nodes, &settings.config.diagram)?;
    println!("PlantUML: {}", path.display());

    let view = view.to_string();
    let manifest = ViewManifest::collect(diagram, filter, [&view]);
    for stats in &manifest.views {
        println!("{} ({} classes, {} relationships)", stats.view_name, stats.node_count, stats.edge_count);
        for node in &stats.nodes {
            println!("  {}", node.full_name);
        }
    }
    let path = manifest.write(&settings.output)?;
    println!("View manifest: {}", path.display());
    Ok(())
}

pub fn trace(settings: &Settings) -> anyhow::Result<()> {
    let diagram = load(settings)?;
    trace_diagram(settings, &diagram)
}

fn trace_diagram(settings: &Settings, diagram: &Diagram) -> anyhow::Result<()> {
    let Diagram::Sequence(sequence) = diagram else {
        bail!("{} is not a sequence diagram", settings.input.display());
    };

    let stats = sequence.statistics();
    println!(
        "{}: {} participants, {} messages",
        stats.diagram_name, stats.total_participants, stats.total_messages
    );
    let path = write_trace_statistics(&settings.output, sequence)?;
    println!("Trace statistics: {}", path.display());
    let path = puml::write_sequence(&settings.output, sequence)?;
    println!("PlantUML: {}", path.display());

    let (_, graph) = diagram_graph(diagram);
    log_graph(&graph);
    let analyzer = GraphAnalyzer::new(&graph);
    print_summary(settings, &analyzer);
    write_report(settings, &analyzer)
}

fn write_trace_statistics(dir: &Path, sequence: &SequenceDiagram) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("{}_trace.json", file_stem(&sequence.name)));
    let json = serde_json::to_string_pretty(&sequence.statistics())?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

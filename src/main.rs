//! umlsplit CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use umlsplit_core::TraversalDirection;

mod commands;
mod config;
mod puml;
mod report;

#[derive(Parser)]
#[command(name = "umlsplit")]
#[command(about = "Split large UML class diagrams into focused views", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to umlsplit.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Input diagram JSON (overrides input.json_file)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Output directory (overrides output.directory)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the diagram and write the analysis report
    Analyze,
    /// Analyze, then write the configured views as PlantUML plus views.json
    Views,
    /// Create the neighborhood view of one class
    Context {
        /// Class name, display name or fully qualified name
        class: String,

        /// Maximum number of hops from the class
        #[arg(long, default_value_t = 2)]
        hops: usize,

        /// Edge direction to follow (in, out, both)
        #[arg(long, default_value = "both")]
        direction: TraversalDirection,
    },
    /// Create the shortest dependency chain between two classes
    Chain {
        from: String,
        to: String,

        /// Hops of context around every class on the chain
        #[arg(long, default_value_t = 1)]
        expand: usize,
    },
    /// Analyze a sequence diagram as a call graph
    Trace,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("umlsplit={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("umlsplit v{}", env!("CARGO_PKG_VERSION"));

    let settings = commands::Settings::resolve(cli.config, cli.input, cli.output)?;

    match cli.command {
        Commands::Analyze => commands::analyze(&settings),
        Commands::Views => commands::views(&settings),
        Commands::Context {
            class,
            hops,
            direction,
        } => commands::context(&settings, &class, hops, direction),
        Commands::Chain { from, to, expand } => commands::chain(&settings, &from, &to, expand),
        Commands::Trace => commands::trace(&settings),
    }
}

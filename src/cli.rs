//! CLI command definitions and handlers

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use densest::config::{load_config, Defaults};
use densest::density::DensityMethod;
use densest::graph::{load_graph, Graph};
use densest::report::{self, EngineReport, OutputFormat};
use densest::{flow, peel, spectral};

/// Densest subgraph search
#[derive(Parser, Debug)]
#[command(name = "densest")]
#[command(
    version,
    about = "Find the densest subgraph of a weighted undirected graph",
    after_help = "\
Examples:
  densest charikar graph.txt                  Greedy peel, plain density
  densest peel graph.txt --method fraudar     Generalized peel, weighted density
  densest flow graph.txt --epsilon 0.01       Exact density by parametric min cuts
  densest spectral graph.txt -k 5             Spectral candidates, then peeling
  densest compare graph.txt --format json     All engines with timings, as JSON"
)]
pub struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: densest.toml in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: text, json
    #[arg(long, short = 'f', global = true, value_parser = ["text", "json"])]
    pub format: Option<String>,

    /// Disable ANSI colors in text output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generalized greedy peeling under a density method
    Peel {
        /// Graph file
        graph: PathBuf,

        /// Density method (plain, min-quotient-cut, weighted, sparsity-penalized, risk-averse)
        #[arg(long, short = 'm')]
        method: Option<String>,

        /// Alpha for sparsity-penalized density
        #[arg(long)]
        alpha: Option<f64>,
    },

    /// Greedy peeling with a running edge count (plain density)
    Charikar {
        /// Graph file
        graph: PathBuf,
    },

    /// Exact densest subgraph by binary search over minimum cuts
    Flow {
        /// Graph file
        graph: PathBuf,

        /// Binary-search tolerance
        #[arg(long, short = 'e')]
        epsilon: Option<f64>,
    },

    /// Peel the candidate sets of the top-k singular vectors
    Spectral {
        /// Graph file
        graph: PathBuf,

        /// Number of singular triplets
        #[arg(short = 'k', long)]
        k: Option<usize>,

        /// Density method used on each candidate
        #[arg(long, short = 'm')]
        method: Option<String>,

        /// Alpha for sparsity-penalized density
        #[arg(long)]
        alpha: Option<f64>,
    },

    /// Run charikar, flow and spectral on one graph and time them
    Compare {
        /// Graph file
        graph: PathBuf,

        /// Number of singular triplets for the spectral engine
        #[arg(short = 'k', long)]
        k: Option<usize>,

        /// Density method for the spectral engine
        #[arg(long, short = 'm')]
        method: Option<String>,

        /// Alpha for sparsity-penalized density
        #[arg(long)]
        alpha: Option<f64>,

        /// Binary-search tolerance for the flow engine
        #[arg(long, short = 'e')]
        epsilon: Option<f64>,
    },
}

/// Flag values that override the config file
#[derive(Debug, Default)]
struct Overrides {
    method: Option<String>,
    alpha: Option<f64>,
    k: Option<usize>,
    epsilon: Option<f64>,
}

impl Overrides {
    fn apply(self, mut defaults: Defaults) -> Defaults {
        if let Some(method) = self.method {
            defaults.method = DensityMethod::parse(&method);
        }
        if let Some(alpha) = self.alpha {
            defaults.alpha = alpha;
        }
        if let Some(k) = self.k {
            defaults.k = k;
        }
        if let Some(epsilon) = self.epsilon {
            defaults.epsilon = epsilon;
        }
        defaults
    }
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref());
    let format = match &cli.format {
        Some(f) => f.parse::<OutputFormat>()?,
        None => config.defaults.format,
    };
    let color = !cli.no_color && std::io::stdout().is_terminal();

    let (graph_path, overrides, engines) = match cli.command {
        Commands::Peel {
            graph,
            method,
            alpha,
        } => (
            graph,
            Overrides {
                method,
                alpha,
                ..Default::default()
            },
            vec![Engine::Peel],
        ),
        Commands::Charikar { graph } => (graph, Overrides::default(), vec![Engine::Charikar]),
        Commands::Flow { graph, epsilon } => (
            graph,
            Overrides {
                epsilon,
                ..Default::default()
            },
            vec![Engine::Flow],
        ),
        Commands::Spectral {
            graph,
            k,
            method,
            alpha,
        } => (
            graph,
            Overrides {
                method,
                alpha,
                k,
                ..Default::default()
            },
            vec![Engine::Spectral],
        ),
        Commands::Compare {
            graph,
            k,
            method,
            alpha,
            epsilon,
        } => (
            graph,
            Overrides {
                method,
                alpha,
                k,
                epsilon,
            },
            vec![Engine::Charikar, Engine::Flow, Engine::Spectral],
        ),
    };

    let settings = overrides.apply(config.defaults);
    settings.validate()?;
    debug!("Resolved settings: {:?}", settings);

    let graph = read_graph(&graph_path)?;
    let timed = engines.len() > 1;

    let mut reports = Vec::with_capacity(engines.len());
    for engine in engines {
        let start = Instant::now();
        let report = engine.run(&graph, &settings)?;
        let elapsed = start.elapsed();
        info!("{} finished in {:?}", engine.name(), elapsed);
        reports.push(if timed {
            report.with_elapsed(elapsed)
        } else {
            report
        });
    }

    print!("{}", report::render(&reports, format, color)?);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn read_graph(path: &Path) -> Result<Graph> {
    let graph =
        load_graph(path).with_context(|| format!("Failed to load graph from {}", path.display()))?;
    info!(
        "Loaded {} vertices and {} edges from {}",
        graph.num_nodes(),
        graph.num_edges(),
        path.display()
    );
    Ok(graph)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Engine {
    Peel,
    Charikar,
    Flow,
    Spectral,
}

impl Engine {
    fn name(self) -> &'static str {
        match self {
            Engine::Peel => "peel",
            Engine::Charikar => "charikar",
            Engine::Flow => "flow",
            Engine::Spectral => "spectral",
        }
    }

    fn run(self, graph: &Graph, settings: &Defaults) -> Result<EngineReport> {
        let method = settings.method.clone().with_alpha(settings.alpha);
        let report = match self {
            Engine::Peel => {
                let outcome = peel::peel_graph(graph, &method.quadratic_forms(graph));
                EngineReport::new(self.name(), outcome.score, &outcome.vertices)
            }
            Engine::Charikar => {
                let outcome = peel::charikar(graph);
                EngineReport::new(self.name(), outcome.score, &outcome.vertices)
            }
            Engine::Flow => {
                let outcome = flow::densest_exact(graph, settings.epsilon)?;
                EngineReport::new(self.name(), outcome.density, &outcome.vertices)
            }
            Engine::Spectral => {
                let outcome = spectral::spectral_densest(graph, settings.k, &method)?;
                EngineReport::new(self.name(), outcome.score, &outcome.vertices)
            }
        };
        Ok(report)
    }
}

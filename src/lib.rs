//! Densest subgraph search
//!
//! Three engines share one graph model:
//! - [`peel`]: greedy peeling under any density expressed as a pair of
//!   quadratic forms (see [`density`])
//! - [`flow`]: exact plain density by parametric minimum cuts
//! - [`spectral`]: candidate sets from the top singular vectors, each peeled
//!
//! ```no_run
//! use densest::{density::DensityMethod, graph::load_graph, peel, spectral};
//!
//! let graph = load_graph(std::path::Path::new("graph.txt"))?;
//! let greedy = peel::charikar(&graph);
//! let candidates = spectral::spectral_densest(&graph, 10, &DensityMethod::Plain)?;
//! println!("{} vs {}", greedy.score, candidates.score);
//! # Ok::<(), densest::GraphError>(())
//! ```

pub mod config;
pub mod density;
pub mod error;
pub mod flow;
pub mod graph;
pub mod lanczos;
pub mod linalg;
pub mod peel;
pub mod report;
pub mod spectral;

pub use density::{DensityMethod, QuadraticForms};
pub use error::{GraphError, Result};
pub use graph::{Edge, Graph};

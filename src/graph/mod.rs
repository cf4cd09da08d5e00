//! Undirected weighted graph model
//!
//! A [`Graph`] is built once from an edge list and never mutated afterwards.
//! Every engine reads it through the materialized adjacency matrix
//! (`A[u][v] = A[v][u] = Σ w` over parallel edges), the weighted degree
//! vector and the per-vertex weights.

mod loader;

pub use loader::{load_graph, parse_graph};

use sprs::{CsMat, TriMat};
use tracing::{debug, warn};

use crate::error::{GraphError, Result};

/// One undirected edge `(u, v, w)` with `u != v`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

impl Edge {
    pub fn new(u: usize, v: usize, weight: f64) -> Self {
        Self { u, v, weight }
    }
}

/// Immutable weighted undirected graph
#[derive(Debug, Clone)]
pub struct Graph {
    node_weights: Vec<f64>,
    edges: Vec<Edge>,
    adjacency: CsMat<f64>,
    degrees: Vec<f64>,
}

/// Validate that every edge references a vertex below `num_nodes` and is not a self-loop.
fn validate_edges(edges: &[Edge], num_nodes: usize) -> Result<()> {
    for (i, edge) in edges.iter().enumerate() {
        for endpoint in [edge.u, edge.v] {
            if endpoint >= num_nodes {
                return Err(GraphError::InvalidParameter(format!(
                    "edge {} references vertex {} but the graph has {} vertices",
                    i, endpoint, num_nodes
                )));
            }
        }
        if edge.u == edge.v {
            return Err(GraphError::InvalidParameter(format!(
                "edge {} is a self-loop on vertex {}",
                i, edge.u
            )));
        }
        if !edge.weight.is_finite() {
            return Err(GraphError::InvalidParameter(format!(
                "edge {} has non-finite weight {}",
                i, edge.weight
            )));
        }
    }
    Ok(())
}

impl Graph {
    /// Build a graph from per-vertex weights and an edge list.
    ///
    /// The vertex count is `node_weights.len()`.
    ///
    /// # Errors
    /// - `InvalidParameter` if an edge is out of range, a self-loop, or has a non-finite weight
    pub fn new(node_weights: Vec<f64>, edges: Vec<Edge>) -> Result<Self> {
        let n = node_weights.len();
        validate_edges(&edges, n)?;

        if n == 0 {
            warn!("Degenerate input: graph has no vertices");
        } else if edges.is_empty() {
            warn!("Degenerate input: graph with {} vertices has no edges", n);
        }

        let mut triplets = TriMat::new((n, n));
        for edge in &edges {
            // Parallel edges collapse into one entry: to_csr sums duplicates
            triplets.add_triplet(edge.u, edge.v, edge.weight);
            triplets.add_triplet(edge.v, edge.u, edge.weight);
        }
        let adjacency: CsMat<f64> = triplets.to_csr();

        let degrees: Vec<f64> = adjacency
            .outer_iterator()
            .map(|row| row.iter().map(|(_, &w)| w).sum())
            .collect();

        debug!(
            "Built graph: n = {}, m = {}, nnz(A) = {}",
            n,
            edges.len(),
            adjacency.nnz()
        );

        Ok(Self {
            node_weights,
            edges,
            adjacency,
            degrees,
        })
    }

    /// Unit-weight graph with all node weights set to 1
    pub fn from_pairs(n: usize, pairs: &[(usize, usize)]) -> Result<Self> {
        let edges = pairs.iter().map(|&(u, v)| Edge::new(u, v, 1.0)).collect();
        Self::new(vec![1.0; n], edges)
    }

    /// Number of vertices
    pub fn num_nodes(&self) -> usize {
        self.node_weights.len()
    }

    /// Number of edges as declared (parallel edges counted separately)
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_weights(&self) -> &[f64] {
        &self.node_weights
    }

    /// Symmetric sparse adjacency matrix `A`
    pub fn adjacency(&self) -> &CsMat<f64> {
        &self.adjacency
    }

    /// Weighted degrees, `deg[v] = Σ_u A[v][u]`
    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Number of incident edges per vertex, ignoring weights
    pub fn edge_degrees(&self) -> Vec<usize> {
        let mut deg = vec![0usize; self.num_nodes()];
        for edge in &self.edges {
            deg[edge.u] += 1;
            deg[edge.v] += 1;
        }
        deg
    }

    /// Number of edges with both endpoints in `members` (membership mask of length n)
    pub fn induced_edge_count(&self, members: &[bool]) -> usize {
        self.edges
            .iter()
            .filter(|e| members[e.u] && members[e.v])
            .count()
    }

    /// Plain density `edges(S) / |S|`, or 0 for an empty set
    pub fn edge_density(&self, vertices: &[usize]) -> f64 {
        if vertices.is_empty() {
            return 0.0;
        }
        let mut members = vec![false; self.num_nodes()];
        for &v in vertices {
            members[v] = true;
        }
        self.induced_edge_count(&members) as f64 / vertices.len() as f64
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// K4 on {0,1,2,3} plus the pendant edge (0,4)
    pub(crate) fn k4_with_pendant() -> Graph {
        Graph::from_pairs(
            5,
            &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3), (0, 4)],
        )
        .unwrap()
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let g = k4_with_pendant();
        let a = g.adjacency();
        assert_eq!(a.get(0, 4), Some(&1.0));
        assert_eq!(a.get(4, 0), Some(&1.0));
        assert_eq!(a.get(1, 4), None);
        assert_eq!(a.nnz(), 14);
    }

    #[test]
    fn test_degrees() {
        let g = k4_with_pendant();
        assert_eq!(g.degrees(), &[4.0, 3.0, 3.0, 3.0, 1.0]);
        assert_eq!(g.edge_degrees(), vec![4, 3, 3, 3, 1]);
    }

    #[test]
    fn test_parallel_edges_are_summed() {
        let g = Graph::new(
            vec![1.0; 2],
            vec![Edge::new(0, 1, 2.0), Edge::new(1, 0, 0.5)],
        )
        .unwrap();
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.adjacency().get(0, 1), Some(&2.5));
        assert_eq!(g.degrees(), &[2.5, 2.5]);
        assert_eq!(g.edge_degrees(), vec![2, 2]);
    }

    #[test]
    fn test_edge_density() {
        let g = k4_with_pendant();
        assert!((g.edge_density(&[0, 1, 2, 3]) - 1.5).abs() < 1e-12);
        assert!((g.edge_density(&[0, 1, 2, 3, 4]) - 1.4).abs() < 1e-12);
        assert_eq!(g.edge_density(&[]), 0.0);
    }

    #[test]
    fn test_out_of_range_edge_rejected() {
        let result = Graph::from_pairs(3, &[(0, 3)]);
        assert!(matches!(result, Err(GraphError::InvalidParameter(_))));
    }

    #[test]
    fn test_self_loop_rejected() {
        let result = Graph::from_pairs(3, &[(1, 1)]);
        assert!(matches!(result, Err(GraphError::InvalidParameter(_))));
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_empty_graph() {
            let g = Graph::new(vec![], vec![]).unwrap();
            assert_eq!(g.num_nodes(), 0);
            assert_eq!(g.adjacency().nnz(), 0);
            assert!(g.degrees().is_empty());
        }

        #[test]
        fn test_isolated_vertices_have_zero_degree() {
            let g = Graph::from_pairs(4, &[]).unwrap();
            assert_eq!(g.degrees(), &[0.0; 4]);
            assert_eq!(g.edge_density(&[0, 1, 2, 3]), 0.0);
        }
    }
}

//! Graph file loader
//!
//! Text format (whitespace separated, 0-indexed vertices):
//!
//! ```text
//! n m
//! w_0 w_1 ... w_{n-1}
//! u v w        (m lines)
//! ```
//!
//! Blank lines are ignored. The weights line may be omitted only when
//! `n == 0`. Anything that does not match the declared counts is a
//! `GraphError::Format`: data is never truncated or padded.

use std::path::Path;

use tracing::debug;

use super::{Edge, Graph};
use crate::error::{GraphError, Result};

/// Read and parse a graph file.
///
/// # Errors
/// - `Io` if the file cannot be read
/// - `Format` if the content is malformed (see [`parse_graph`])
pub fn load_graph(path: &Path) -> Result<Graph> {
    let content = std::fs::read_to_string(path)?;
    debug!("Loading graph from {}", path.display());
    parse_graph(&content)
}

fn parse_field<T: std::str::FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token
        .parse::<T>()
        .map_err(|_| GraphError::format(line, format!("invalid {} '{}'", what, token)))
}

fn parse_weight(token: &str, line: usize, what: &str) -> Result<f64> {
    let value: f64 = parse_field(token, line, what)?;
    if !value.is_finite() {
        return Err(GraphError::format(
            line,
            format!("{} must be finite, got '{}'", what, token),
        ));
    }
    Ok(value)
}

/// Parse graph text.
///
/// # Errors
/// `Format` when the header is not `n m`, the node-weight count differs from
/// `n`, fewer or more than `m` edge lines are present, an edge line does not
/// have exactly three fields, a vertex index is outside `[0, n)`, or an edge
/// is a self-loop.
pub fn parse_graph(content: &str) -> Result<Graph> {
    // (1-based line number, trimmed text) of every non-blank line
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| GraphError::format(1, "missing header line 'n m'"))?;
    let header_fields: Vec<&str> = header.split_whitespace().collect();
    if header_fields.len() != 2 {
        return Err(GraphError::format(
            header_line,
            format!("header must be 'n m', got {} fields", header_fields.len()),
        ));
    }
    let n: usize = parse_field(header_fields[0], header_line, "vertex count")?;
    let m: usize = parse_field(header_fields[1], header_line, "edge count")?;

    let mut last_line = header_line;
    let node_weights: Vec<f64> = if n == 0 {
        Vec::new()
    } else {
        let (weights_line, text) = lines.next().ok_or_else(|| {
            GraphError::format(header_line + 1, format!("missing line of {} node weights", n))
        })?;
        let weights = text
            .split_whitespace()
            .map(|t| parse_weight(t, weights_line, "node weight"))
            .collect::<Result<Vec<f64>>>()?;
        if weights.len() != n {
            return Err(GraphError::format(
                weights_line,
                format!("expected {} node weights, found {}", n, weights.len()),
            ));
        }
        last_line = weights_line;
        weights
    };

    // `m` is untrusted until the edge lines are counted
    let mut edges = Vec::with_capacity(m.min(content.lines().count()));
    for _ in 0..m {
        let (line, text) = lines.next().ok_or_else(|| {
            GraphError::format(
                last_line + 1,
                format!("expected {} edge lines, found {}", m, edges.len()),
            )
        })?;
        last_line = line;

        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(GraphError::format(
                line,
                format!("edge line must be 'u v w', got {} fields", fields.len()),
            ));
        }
        let u: usize = parse_field(fields[0], line, "vertex index")?;
        let v: usize = parse_field(fields[1], line, "vertex index")?;
        let weight = parse_weight(fields[2], line, "edge weight")?;

        for endpoint in [u, v] {
            if endpoint >= n {
                return Err(GraphError::format(
                    line,
                    format!("vertex {} out of range [0, {})", endpoint, n),
                ));
            }
        }
        if u == v {
            return Err(GraphError::format(line, format!("self-loop on vertex {}", u)));
        }
        edges.push(Edge::new(u, v, weight));
    }

    if let Some((line, _)) = lines.next() {
        return Err(GraphError::format(
            line,
            format!("more than the declared {} edge lines", m),
        ));
    }

    Graph::new(node_weights, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    const K4_PENDANT: &str = "5 7
1 1 1 1 1
0 1 1
0 2 1
0 3 1
1 2 1
1 3 1
2 3 1
0 4 1
";

    fn format_line(result: Result<Graph>) -> usize {
        match result {
            Err(GraphError::Format { line, .. }) => line,
            other => panic!("expected format error, got {:?}", other.map(|g| g.num_edges())),
        }
    }

    #[test]
    fn test_parse_valid_graph() {
        let g = parse_graph(K4_PENDANT).unwrap();
        assert_eq!(g.num_nodes(), 5);
        assert_eq!(g.num_edges(), 7);
        assert_eq!(g.edges()[6], Edge::new(0, 4, 1.0));
        assert_eq!(g.node_weights(), &[1.0; 5]);
    }

    #[test]
    fn test_parse_real_weights() {
        let g = parse_graph("3 2\n0.5 2 -1\n0 1 2.5\n1 2 -0.25\n").unwrap();
        assert_eq!(g.node_weights(), &[0.5, 2.0, -1.0]);
        assert_eq!(g.degrees(), &[2.5, 2.25, -0.25]);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let g = parse_graph("\n2 1\n\n3 4\n\n0 1 1\n\n").unwrap();
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.node_weights(), &[3.0, 4.0]);
    }

    #[test]
    fn test_weight_count_mismatch() {
        assert_eq!(format_line(parse_graph("3 1\n1 1\n0 1 1\n")), 2);
        assert_eq!(format_line(parse_graph("2 1\n1 1 1\n0 1 1\n")), 2);
    }

    #[test]
    fn test_too_few_edge_lines() {
        assert_eq!(format_line(parse_graph("3 3\n1 1 1\n0 1 1\n1 2 1\n")), 5);
    }

    #[test]
    fn test_too_many_edge_lines() {
        assert_eq!(format_line(parse_graph("3 1\n1 1 1\n0 1 1\n1 2 1\n")), 4);
    }

    #[test]
    fn test_vertex_out_of_range() {
        assert_eq!(format_line(parse_graph("3 1\n1 1 1\n0 3 1\n")), 3);
    }

    #[test]
    fn test_negative_vertex_rejected() {
        assert_eq!(format_line(parse_graph("3 1\n1 1 1\n-1 2 1\n")), 3);
    }

    #[test]
    fn test_self_loop_rejected() {
        assert_eq!(format_line(parse_graph("3 1\n1 1 1\n2 2 1\n")), 3);
    }

    #[test]
    fn test_wrong_field_count() {
        assert_eq!(format_line(parse_graph("3 1\n1 1 1\n0 1\n")), 3);
        assert_eq!(format_line(parse_graph("3 1\n1 1 1\n0 1 1 7\n")), 3);
    }

    #[test]
    fn test_bad_header() {
        assert_eq!(format_line(parse_graph("")), 1);
        assert_eq!(format_line(parse_graph("3\n1 1 1\n")), 1);
        assert_eq!(format_line(parse_graph("x 1\n")), 1);
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        assert_eq!(format_line(parse_graph("2 1\n1 1\n0 1 NaN\n")), 3);
        assert_eq!(format_line(parse_graph("2 1\n1 inf\n0 1 1\n")), 2);
    }

    #[test]
    fn test_load_graph_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.txt");
        std::fs::write(&path, K4_PENDANT).unwrap();
        let g = load_graph(&path).unwrap();
        assert_eq!(g.num_edges(), 7);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_graph(Path::new("/nonexistent/densest/graph.txt"));
        assert!(matches!(result, Err(GraphError::Io(_))));
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_empty_graph_without_weight_line() {
            let g = parse_graph("0 0\n").unwrap();
            assert_eq!(g.num_nodes(), 0);
            assert_eq!(g.num_edges(), 0);
        }

        #[test]
        fn test_edgeless_graph() {
            let g = parse_graph("3 0\n1 2 3\n").unwrap();
            assert_eq!(g.num_nodes(), 3);
            assert_eq!(g.num_edges(), 0);
        }

        #[test]
        fn test_huge_declared_edge_count() {
            assert_eq!(
                format_line(parse_graph("2 1000000000000000000\n1 1\n0 1 1\n")),
                4
            );
            assert_eq!(format_line(parse_graph(&format!("2 {}\n1 1\n", usize::MAX))), 3);
        }

        #[test]
        fn test_missing_edges_reported_after_weights_line() {
            assert_eq!(format_line(parse_graph("2 1\n1 1\n")), 3);
        }

        #[test]
        fn test_empty_graph_with_edges_is_out_of_range() {
            assert_eq!(format_line(parse_graph("0 1\n0 1 1\n")), 2);
        }
    }
}

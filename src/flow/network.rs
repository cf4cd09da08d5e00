//! s-t flow network with Dinic's maximum flow
//!
//! Arcs live in a petgraph `DiGraph` and are always inserted in pairs: arc
//! `2k` is a forward arc and arc `2k + 1` its residual twin with capacity 0,
//! so the twin of arc `e` is `e ^ 1`. Residual capacities are kept outside
//! the graph so the topology stays immutable during a solve.
//!
//! Dinic's algorithm:
//! 1. BFS from the source over arcs with residual capacity, assigning levels
//! 2. DFS pushes blocking flow along level-increasing arcs only
//! 3. Repeat until the sink is unreachable
//!
//! The minimum cut's source side is the set of nodes reachable from the
//! source in the final residual graph. It is the unique inclusion-minimal
//! minimum cut, so cut selection is deterministic under ties.

use std::collections::VecDeque;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

/// Residual capacities at or below this are treated as saturated
pub const CAPACITY_EPSILON: f64 = 1e-9;

/// A directed network with real-valued capacities
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    graph: DiGraph<(), f64>,
    residual: Vec<f64>,
}

/// Result of a minimum s-t cut
#[derive(Debug, Clone)]
pub struct MinCut {
    pub value: f64,
    /// Membership mask of the source side, indexed by node
    pub source_side: Vec<bool>,
}

impl FlowNetwork {
    pub fn with_nodes(num_nodes: usize) -> Self {
        let mut graph = DiGraph::with_capacity(num_nodes, 0);
        for _ in 0..num_nodes {
            graph.add_node(());
        }
        Self {
            graph,
            residual: Vec::new(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Add arc `from → to`. Negative capacities are clamped to zero.
    pub fn add_arc(&mut self, from: usize, to: usize, capacity: f64) {
        let capacity = capacity.max(0.0);
        self.graph
            .add_edge(NodeIndex::new(from), NodeIndex::new(to), capacity);
        self.graph.add_edge(NodeIndex::new(to), NodeIndex::new(from), 0.0);
        self.residual.push(capacity);
        self.residual.push(0.0);
    }

    /// Outgoing arcs per node, in a fixed order for the DFS current-arc pointers
    fn arc_lists(&self) -> Vec<Vec<EdgeIndex>> {
        self.graph
            .node_indices()
            .map(|node| {
                let mut arcs: Vec<EdgeIndex> = self.graph.edges(node).map(|e| e.id()).collect();
                arcs.sort_unstable();
                arcs
            })
            .collect()
    }

    fn head(&self, arc: EdgeIndex) -> usize {
        self.graph
            .edge_endpoints(arc)
            .map(|(_, to)| to.index())
            .unwrap_or_default()
    }

    /// BFS levels over arcs with residual capacity; `None` marks unreachable nodes
    fn levels(&self, arcs: &[Vec<EdgeIndex>], source: usize) -> Vec<Option<usize>> {
        let mut level = vec![None; self.num_nodes()];
        level[source] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            let next = level[u].map(|l| l + 1);
            for &arc in &arcs[u] {
                let v = self.head(arc);
                if level[v].is_none() && self.residual[arc.index()] > CAPACITY_EPSILON {
                    level[v] = next;
                    queue.push_back(v);
                }
            }
        }
        level
    }

    /// Push up to `limit` units from `u` toward `sink` along the level graph
    fn augment(
        &mut self,
        arcs: &[Vec<EdgeIndex>],
        level: &[Option<usize>],
        next_arc: &mut [usize],
        u: usize,
        sink: usize,
        limit: f64,
    ) -> f64 {
        if u == sink {
            return limit;
        }
        while next_arc[u] < arcs[u].len() {
            let arc = arcs[u][next_arc[u]];
            let v = self.head(arc);
            let cap = self.residual[arc.index()];
            let forward = matches!((level[u], level[v]), (Some(lu), Some(lv)) if lv == lu + 1);
            if forward && cap > CAPACITY_EPSILON {
                let pushed = self.augment(arcs, level, next_arc, v, sink, limit.min(cap));
                if pushed > CAPACITY_EPSILON {
                    self.residual[arc.index()] -= pushed;
                    self.residual[arc.index() ^ 1] += pushed;
                    return pushed;
                }
            }
            next_arc[u] += 1;
        }
        0.0
    }

    /// Compute a maximum flow and return the corresponding minimum cut.
    ///
    /// Resets any flow from a previous solve.
    pub fn min_cut(&mut self, source: usize, sink: usize) -> MinCut {
        for (i, edge) in self.graph.edge_indices().enumerate() {
            self.residual[i] = self.graph[edge];
        }

        let arcs = self.arc_lists();
        let mut value = 0.0;
        loop {
            let level = self.levels(&arcs, source);
            if level[sink].is_none() {
                break;
            }
            let mut next_arc = vec![0; self.num_nodes()];
            loop {
                let pushed =
                    self.augment(&arcs, &level, &mut next_arc, source, sink, f64::INFINITY);
                if pushed <= CAPACITY_EPSILON {
                    break;
                }
                value += pushed;
            }
        }

        let source_side = self
            .levels(&arcs, source)
            .into_iter()
            .map(|l| l.is_some())
            .collect();
        MinCut { value, source_side }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_arc() {
        let mut net = FlowNetwork::with_nodes(2);
        net.add_arc(0, 1, 3.5);
        let cut = net.min_cut(0, 1);
        assert!((cut.value - 3.5).abs() < 1e-9);
        assert_eq!(cut.source_side, vec![true, false]);
    }

    #[test]
    fn test_classic_network() {
        // CLRS-style example, max flow 23
        let mut net = FlowNetwork::with_nodes(6);
        net.add_arc(0, 1, 16.0);
        net.add_arc(0, 2, 13.0);
        net.add_arc(1, 2, 10.0);
        net.add_arc(2, 1, 4.0);
        net.add_arc(1, 3, 12.0);
        net.add_arc(3, 2, 9.0);
        net.add_arc(2, 4, 14.0);
        net.add_arc(4, 3, 7.0);
        net.add_arc(3, 5, 20.0);
        net.add_arc(4, 5, 4.0);
        let cut = net.min_cut(0, 5);
        assert!((cut.value - 23.0).abs() < 1e-9);
        assert!(cut.source_side[0]);
        assert!(!cut.source_side[5]);
    }

    #[test]
    fn test_min_cut_is_source_minimal_under_ties() {
        // s -> a -> t with equal capacities: both {s} and {s, a} are min cuts
        let mut net = FlowNetwork::with_nodes(3);
        net.add_arc(0, 1, 1.0);
        net.add_arc(1, 2, 1.0);
        let cut = net.min_cut(0, 2);
        assert!((cut.value - 1.0).abs() < 1e-9);
        assert_eq!(cut.source_side, vec![true, false, false]);
    }

    #[test]
    fn test_resolve_resets_flow() {
        let mut net = FlowNetwork::with_nodes(2);
        net.add_arc(0, 1, 2.0);
        let first = net.min_cut(0, 1).value;
        let second = net.min_cut(0, 1).value;
        assert_eq!(first, second);
    }

    #[test]
    fn test_negative_capacity_clamped() {
        let mut net = FlowNetwork::with_nodes(2);
        net.add_arc(0, 1, -4.0);
        let cut = net.min_cut(0, 1);
        assert_eq!(cut.value, 0.0);
        assert_eq!(cut.source_side, vec![true, false]);
    }

    #[test]
    fn test_parallel_arcs_add_up() {
        let mut net = FlowNetwork::with_nodes(2);
        net.add_arc(0, 1, 1.0);
        net.add_arc(0, 1, 1.0);
        assert!((net.min_cut(0, 1).value - 2.0).abs() < 1e-9);
    }
}

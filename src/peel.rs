//! Greedy peeling engine
//!
//! Repeatedly removes the vertex of minimum weighted degree and scores every
//! surviving set with `0.5 · xᵗPx / xᵗQx`. The best score over the nested
//! sequence `V = S₀ ⊃ S₁ ⊃ ... ⊃ S_{n-1}` is returned.
//!
//! The priority queue never updates entries in place: a degree change pushes
//! a fresh entry and the old one goes stale. An entry is honored only if its
//! vertex is still a member and its degree equals the current degree.
//!
//! Quadratic forms are maintained incrementally. Removing `v` from `S`
//! lowers `xᵗMx` by `Σ_{j∈S} M[v][j] + Σ_{i∈S} M[i][v] − M[v][v]`, so the
//! whole run touches every vertex and every stored entry a constant number
//! of times, plus `O(log n)` per heap operation.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

use serde::Serialize;
use sprs::CsMat;
use tracing::{debug, trace};

use crate::density::{Denominator, QuadraticForms};
use crate::graph::Graph;
use crate::linalg;

/// Denominators at or below this are treated as zero and the step is not scored
pub const DENOMINATOR_EPSILON: f64 = 1e-12;

/// Best score and the vertex set achieving it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeelOutcome {
    pub score: f64,
    pub vertices: BTreeSet<usize>,
}

impl PeelOutcome {
    /// Result for an empty universe: no set can be scored
    pub fn empty() -> Self {
        Self {
            score: f64::NEG_INFINITY,
            vertices: BTreeSet::new(),
        }
    }
}

/// Observable record of one peeling run
#[derive(Debug, Clone, Default)]
pub struct PeelTrace {
    /// Vertices in the order they were removed
    pub removal_order: Vec<usize>,
    /// `scores[i]` is the score of the set left after `i` removals; `None` if guarded
    pub scores: Vec<Option<f64>>,
}

impl PeelTrace {
    /// The nested membership sets, from the full universe down to the empty set
    pub fn nested_sets(&self) -> Vec<BTreeSet<usize>> {
        let mut current: BTreeSet<usize> = self.removal_order.iter().copied().collect();
        let mut sets = Vec::with_capacity(self.removal_order.len() + 1);
        sets.push(current.clone());
        for v in &self.removal_order {
            current.remove(v);
            sets.push(current.clone());
        }
        sets
    }
}

/// Min-heap entry keyed by (degree, vertex)
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    degree: f64,
    vertex: usize,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the smallest degree, lowest id first
        other
            .degree
            .total_cmp(&self.degree)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Mutable state of one run: membership, induced degrees and the lazy heap
struct PeelState {
    members: Vec<bool>,
    degrees: Vec<f64>,
    heap: BinaryHeap<HeapEntry>,
}

impl PeelState {
    fn new(adjacency: &CsMat<f64>) -> Self {
        let degrees: Vec<f64> = adjacency
            .outer_iterator()
            .map(|row| row.iter().map(|(_, &w)| w).sum())
            .collect();
        let heap = degrees
            .iter()
            .enumerate()
            .map(|(vertex, &degree)| HeapEntry { degree, vertex })
            .collect();
        Self {
            members: vec![true; degrees.len()],
            degrees,
            heap,
        }
    }

    /// Pop the live vertex of minimum current degree, discarding stale entries
    fn pop_min(&mut self) -> Option<usize> {
        while let Some(entry) = self.heap.pop() {
            if self.members[entry.vertex] && entry.degree == self.degrees[entry.vertex] {
                return Some(entry.vertex);
            }
        }
        None
    }

    /// Remove `v`, decrementing the degree of every surviving neighbor
    fn remove(&mut self, adjacency: &CsMat<f64>, v: usize) {
        self.members[v] = false;
        if let Some(row) = adjacency.outer_view(v) {
            for (u, &w) in row.iter() {
                if self.members[u] {
                    self.degrees[u] -= w;
                    self.heap.push(HeapEntry {
                        degree: self.degrees[u],
                        vertex: u,
                    });
                }
            }
        }
    }
}

/// A quadratic form `xᵗMx` tracked under vertex removals
struct TrackedForm {
    mat: CsMat<f64>,
    transposed: CsMat<f64>,
    value: f64,
}

impl TrackedForm {
    fn new(mat: &CsMat<f64>, members: &[bool]) -> Self {
        Self {
            mat: mat.clone(),
            transposed: linalg::transpose(mat),
            value: linalg::quadratic_form(mat, members),
        }
    }

    /// Account for removing `v`; must be called while `v` is still a member
    fn remove(&mut self, v: usize, members: &[bool]) {
        self.value -= linalg::row_sum_over(&self.mat, v, members)
            + linalg::row_sum_over(&self.transposed, v, members)
            - linalg::diagonal_entry(&self.mat, v);
    }
}

enum TrackedDenominator {
    Cardinality(usize),
    Form(TrackedForm),
}

impl TrackedDenominator {
    fn value(&self) -> f64 {
        match self {
            TrackedDenominator::Cardinality(size) => *size as f64,
            TrackedDenominator::Form(form) => form.value,
        }
    }

    fn remove(&mut self, v: usize, members: &[bool]) {
        match self {
            TrackedDenominator::Cardinality(size) => *size -= 1,
            TrackedDenominator::Form(form) => form.remove(v, members),
        }
    }
}

/// `0.5 · num / den`, or `None` when the denominator is not positive
fn guarded_score(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > DENOMINATOR_EPSILON {
        Some(0.5 * numerator / denominator)
    } else {
        trace!("Skipping score: denominator {} is not positive", denominator);
        None
    }
}

/// Peel a (sub)graph with adjacency `adjacency` under the forms `(P, Q)`.
///
/// All three matrices must be square with the same size. Returns
/// `score = -inf` and an empty set when the universe is empty.
pub fn peel(adjacency: &CsMat<f64>, forms: &QuadraticForms) -> PeelOutcome {
    peel_with_trace(adjacency, forms).0
}

/// Like [`peel`], also returning the removal order and per-step scores
pub fn peel_with_trace(adjacency: &CsMat<f64>, forms: &QuadraticForms) -> (PeelOutcome, PeelTrace) {
    let n = adjacency.rows();
    if n == 0 {
        debug!("Peeling an empty vertex universe");
        return (PeelOutcome::empty(), PeelTrace::default());
    }
    debug_assert_eq!(forms.p.shape(), (n, n));

    let mut state = PeelState::new(adjacency);
    let mut numerator = TrackedForm::new(&forms.p, &state.members);
    let mut denominator = match &forms.q {
        Denominator::Cardinality => TrackedDenominator::Cardinality(n),
        Denominator::Form(q) => TrackedDenominator::Form(TrackedForm::new(q, &state.members)),
    };

    let mut best_score = f64::NEG_INFINITY;
    let mut best_step = 0;
    let mut run = PeelTrace {
        removal_order: Vec::with_capacity(n),
        scores: Vec::with_capacity(n),
    };

    for step in 0..n {
        let score = guarded_score(numerator.value, denominator.value());
        run.scores.push(score);
        if let Some(score) = score {
            // Strictly greater: ties keep the larger, earlier set
            if score > best_score {
                best_score = score;
                best_step = step;
            }
        }

        let Some(v) = state.pop_min() else {
            break;
        };
        numerator.remove(v, &state.members);
        denominator.remove(v, &state.members);
        state.remove(adjacency, v);
        run.removal_order.push(v);
    }

    let removed: BTreeSet<usize> = run.removal_order[..best_step].iter().copied().collect();
    let vertices: BTreeSet<usize> = (0..n).filter(|v| !removed.contains(v)).collect();
    debug!(
        "Peeling done: n = {}, best score = {}, best set size = {}",
        n,
        best_score,
        vertices.len()
    );

    (
        PeelOutcome {
            score: best_score,
            vertices,
        },
        run,
    )
}

/// Plain-density peeling over the whole graph, tracking surviving edge weight directly.
///
/// Equivalent to [`peel`] with `P = A`, `Q = I`, without evaluating quadratic
/// forms: each removal subtracts the weight of the edges it deletes.
pub fn charikar(graph: &Graph) -> PeelOutcome {
    let adjacency = graph.adjacency();
    let n = graph.num_nodes();
    if n == 0 {
        return PeelOutcome::empty();
    }

    let mut state = PeelState::new(adjacency);
    let mut edge_weight: f64 = graph.degrees().iter().sum::<f64>() / 2.0;
    let mut size = n;
    let mut best_score = f64::NEG_INFINITY;
    let mut removal_order = Vec::with_capacity(n);
    let mut best_step = 0;

    for step in 0..n {
        let score = edge_weight / size as f64;
        if score > best_score {
            best_score = score;
            best_step = step;
        }

        let Some(v) = state.pop_min() else {
            break;
        };
        if let Some(row) = adjacency.outer_view(v) {
            edge_weight -= row
                .iter()
                .filter(|(u, _)| state.members[*u] && *u != v)
                .map(|(_, &w)| w)
                .sum::<f64>();
        }
        state.remove(adjacency, v);
        removal_order.push(v);
        size -= 1;
    }

    let removed: BTreeSet<usize> = removal_order[..best_step].iter().copied().collect();
    let vertices: BTreeSet<usize> = (0..n).filter(|v| !removed.contains(v)).collect();
    debug!(
        "Charikar peeling done: best density = {}, best set size = {}",
        best_score,
        vertices.len()
    );
    PeelOutcome {
        score: best_score,
        vertices,
    }
}

/// Peel the whole graph under a density method's forms
pub fn peel_graph(graph: &Graph, forms: &QuadraticForms) -> PeelOutcome {
    peel(graph.adjacency(), forms)
}

//! Spectral candidate search
//!
//! The top-k singular triplets `(uᵢ, σᵢ, vᵢ)` of the adjacency matrix point
//! at dense regions. For each triplet the vertices whose component in `uᵢ`
//! or `vᵢ` exceeds `1/√n` form a candidate set; the induced subgraph is
//! handed to the peeling engine and the best result wins.
//!
//! Small graphs use a dense SVD. Larger ones use Lanczos on the sparse
//! adjacency: `A` is symmetric, so each eigenpair `(λ, x)` gives the triplet
//! `(x, |λ|, sign(λ)·x)`.
//!
//! The loop stops early once the running best reaches the next singular
//! value and no remaining candidate can beat it. A candidate's score is
//! bounded by the largest eigenvalue of `P` on the candidate (Gershgorin)
//! over the smallest diagonal entry of `Q`.

use std::collections::BTreeSet;

use serde::Serialize;
use sprs::CsMat;
use tracing::{debug, info, warn};

use crate::density::{Denominator, DensityMethod, QuadraticForms};
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::lanczos;
use crate::linalg;
use crate::peel;

/// Default number of singular triplets
pub const DEFAULT_K: usize = 10;

/// Largest vertex count handled by the dense SVD
pub const DENSE_SVD_MAX_NODES: usize = 400;

/// One singular triplet of the adjacency matrix
#[derive(Debug, Clone)]
pub struct SingularTriplet {
    pub left: Vec<f64>,
    pub value: f64,
    pub right: Vec<f64>,
}

impl SingularTriplet {
    /// Flip both vectors so the largest-magnitude entry of `left` (lowest
    /// index on ties) is positive
    fn sign_normalized(mut self) -> Self {
        let pivot = self
            .left
            .iter()
            .enumerate()
            .fold((0, 0.0_f64), |(best_i, best_abs), (i, &x)| {
                if x.abs() > best_abs {
                    (i, x.abs())
                } else {
                    (best_i, best_abs)
                }
            })
            .0;
        if self.left.get(pivot).is_some_and(|&x| x < 0.0) {
            self.left.iter_mut().for_each(|x| *x = -*x);
            self.right.iter_mut().for_each(|x| *x = -*x);
        }
        self
    }
}

/// Best candidate found by the spectral search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralOutcome {
    pub score: f64,
    pub vertices: BTreeSet<usize>,
    /// Number of candidate sets examined
    pub candidates_evaluated: usize,
    /// Whether the singular-value bound ended the search before k candidates
    pub stopped_early: bool,
}

/// The `k` largest singular triplets of the symmetric matrix `a`, in
/// descending order of singular value.
///
/// Each pair of vectors is sign-normalized so that the largest-magnitude
/// entry of the left vector (lowest index on ties) is positive; both vectors
/// flip together so `u σ vᵗ` is unchanged.
pub fn top_singular_triplets(a: &CsMat<f64>, k: usize) -> Vec<SingularTriplet> {
    if a.rows() <= DENSE_SVD_MAX_NODES {
        dense_triplets(a, k)
    } else {
        lanczos_triplets(a, k)
    }
}

fn dense_triplets(a: &CsMat<f64>, k: usize) -> Vec<SingularTriplet> {
    let n = a.rows();
    if n == 0 || k == 0 {
        return Vec::new();
    }

    let svd = linalg::to_dense(a).svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        warn!("SVD did not return singular vectors");
        return Vec::new();
    };
    let sigma = svd.singular_values;

    let mut order: Vec<usize> = (0..sigma.len()).collect();
    order.sort_by(|&i, &j| sigma[j].total_cmp(&sigma[i]));

    order
        .into_iter()
        .take(k)
        .map(|idx| {
            SingularTriplet {
                left: u.column(idx).iter().copied().collect(),
                value: sigma[idx],
                right: v_t.row(idx).iter().copied().collect(),
            }
            .sign_normalized()
        })
        .collect()
}

fn lanczos_triplets(a: &CsMat<f64>, k: usize) -> Vec<SingularTriplet> {
    lanczos::largest_magnitude(a, k)
        .into_iter()
        .map(|pair| {
            let right = if pair.value < 0.0 {
                pair.vector.iter().map(|x| -x).collect()
            } else {
                pair.vector.clone()
            };
            SingularTriplet {
                left: pair.vector,
                value: pair.value.abs(),
                right,
            }
            .sign_normalized()
        })
        .collect()
}

/// Vertices whose left or right component exceeds `threshold`, ascending
pub fn candidate_vertices(triplet: &SingularTriplet, threshold: f64) -> Vec<usize> {
    triplet
        .left
        .iter()
        .zip(&triplet.right)
        .enumerate()
        .filter(|&(_, (&l, &r))| l > threshold || r > threshold)
        .map(|(v, _)| v)
        .collect()
}

/// Upper bound on the score of any non-empty subset of `candidate`.
///
/// `xᵗPx ≤ λmax(P_C)·|S|` and, when `Q` has no negative entries,
/// `xᵗQx ≥ min_{v∈C} Q_vv · |S|`. Without such a floor there is no bound.
fn candidate_bound(forms: &QuadraticForms, candidate: &[usize], members: &[bool]) -> f64 {
    if candidate.is_empty() {
        return f64::NEG_INFINITY;
    }
    let top = linalg::gershgorin_max(&forms.p, candidate, members).max(0.0);
    if top == 0.0 {
        return 0.0;
    }
    let floor = match &forms.q {
        Denominator::Cardinality => 1.0,
        Denominator::Form(q) if q.data().iter().all(|&x| x >= 0.0) => candidate
            .iter()
            .map(|&v| linalg::diagonal_entry(q, v))
            .fold(f64::INFINITY, f64::min),
        Denominator::Form(_) => 0.0,
    };
    if floor > 0.0 {
        0.5 * top / floor
    } else {
        f64::INFINITY
    }
}

/// Spectral search under a density method
///
/// # Errors
/// - `InvalidParameter` if `k == 0`
pub fn spectral_densest(graph: &Graph, k: usize, method: &DensityMethod) -> Result<SpectralOutcome> {
    let forms = method.quadratic_forms(graph);
    spectral_search(graph, &forms, k, true)
}

/// Spectral search over precomputed forms.
///
/// With `early_termination` off, all `k` candidates are examined regardless
/// of the singular-value bound.
///
/// # Errors
/// - `InvalidParameter` if `k == 0`
pub fn spectral_search(
    graph: &Graph,
    forms: &QuadraticForms,
    k: usize,
    early_termination: bool,
) -> Result<SpectralOutcome> {
    if k == 0 {
        return Err(GraphError::InvalidParameter(
            "k must be at least 1".to_string(),
        ));
    }

    let n = graph.num_nodes();
    let mut outcome = SpectralOutcome {
        score: 0.0,
        vertices: BTreeSet::new(),
        candidates_evaluated: 0,
        stopped_early: false,
    };
    if n == 0 {
        warn!("Spectral search called on an empty graph");
        return Ok(outcome);
    }

    let k = if k > n {
        warn!("k = {} exceeds the number of vertices; using k = {}", k, n);
        n
    } else {
        k
    };

    let a = graph.adjacency();
    let triplets = top_singular_triplets(a, k);
    let threshold = 1.0 / (n as f64).sqrt();
    debug!(
        "Top singular values: {:?}, threshold = {:.6}",
        triplets.iter().map(|t| t.value).collect::<Vec<_>>(),
        threshold
    );

    let candidates: Vec<Vec<usize>> = triplets
        .iter()
        .map(|t| candidate_vertices(t, threshold))
        .collect();
    let bounds: Vec<f64> = if early_termination {
        let mut members = vec![false; n];
        candidates
            .iter()
            .map(|candidate| {
                candidate.iter().for_each(|&v| members[v] = true);
                let bound = candidate_bound(forms, candidate, &members);
                candidate.iter().for_each(|&v| members[v] = false);
                bound
            })
            .collect()
    } else {
        Vec::new()
    };

    for (i, candidate) in candidates.iter().enumerate() {
        outcome.candidates_evaluated += 1;

        if candidate.is_empty() {
            debug!("Candidate {} is empty, skipping", i);
        } else {
            let a_sub = linalg::restrict(a, candidate);
            let local = peel::peel(&a_sub, &forms.restrict(candidate));
            debug!(
                "Candidate {}: {} vertices, peeled score {}",
                i,
                candidate.len(),
                local.score
            );
            if local.score > outcome.score {
                outcome.score = local.score;
                outcome.vertices = local.vertices.iter().map(|&v| candidate[v]).collect();
            }
        }

        if early_termination {
            if let Some(next) = triplets.get(i + 1) {
                let rest_bounded = bounds[i + 1..].iter().all(|&b| b <= outcome.score);
                if outcome.score >= next.value && rest_bounded {
                    info!(
                        "Early termination: best score {:.4} >= σ[{}] = {:.4}",
                        outcome.score,
                        i + 1,
                        next.value
                    );
                    outcome.stopped_early = true;
                    break;
                }
            }
        }
    }

    Ok(outcome)
}

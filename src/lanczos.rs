//! Lanczos iteration for the largest-magnitude eigenpairs of a sparse
//! symmetric matrix
//!
//! Every new basis vector is orthogonalized against the whole basis (twice),
//! and the coefficients of that pass are the entries of the projected matrix
//! `H = QᵗAQ`, which nalgebra diagonalizes. Only the basis is stored, so the
//! memory cost is `O(n · basis size)` regardless of how sparse `A` is.
//!
//! A single Krylov sequence sees one vector per distinct eigenvalue. When the
//! sequence becomes invariant the iteration restarts from a fresh vector
//! orthogonal to the basis, which picks up repeated eigenvalues.

use nalgebra::{DMatrix, SymmetricEigen};
use sprs::CsMat;
use tracing::{debug, warn};

use crate::linalg;

/// Residual, relative to `max_i Σ_j |A_ij|`, at which a Ritz pair has converged
const TOLERANCE: f64 = 1e-10;

/// Extra basis vectors allowed beyond `4k`
const BASIS_SLACK: usize = 40;

/// Seed of the start vector; restarts use the following seeds
const SEED: u64 = 42;

/// Attempts at a restart vector that is not already in the basis span
const RESTART_ATTEMPTS: u64 = 3;

/// An eigenvalue with a unit eigenvector
#[derive(Debug, Clone)]
pub struct EigenPair {
    pub value: f64,
    pub vector: Vec<f64>,
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = dot(v, v).sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    norm
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// a -= scale * b
fn axpy(a: &mut [f64], b: &[f64], scale: f64) {
    for (ai, &bi) in a.iter_mut().zip(b) {
        *ai -= scale * bi;
    }
}

fn random_unit_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    let mut v: Vec<f64> = (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as f64) / (u32::MAX as f64) - 0.5
        })
        .collect();
    normalize(&mut v);
    v
}

/// Remove the components of `w` along the basis; returns the coefficients
fn orthogonalize(w: &mut [f64], basis: &[Vec<f64>]) -> Vec<f64> {
    let mut coeffs = vec![0.0; basis.len()];
    for _ in 0..2 {
        for (c, q) in coeffs.iter_mut().zip(basis) {
            let proj = dot(q, w);
            axpy(w, q, proj);
            *c += proj;
        }
    }
    coeffs
}

/// Eigenpairs of the diagonal block `H[start..start+len, start..start+len]`,
/// largest magnitude first, positive first on ties
fn ritz_pairs(h: &DMatrix<f64>, start: usize, len: usize) -> Vec<(f64, Vec<f64>)> {
    let block = h.view((start, start), (len, len)).clone_owned();
    let eigen = SymmetricEigen::new(block);
    let mut pairs: Vec<(f64, Vec<f64>)> = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .map(|(i, &theta)| (theta, eigen.eigenvectors.column(i).iter().copied().collect()))
        .collect();
    pairs.sort_by(|a, b| {
        b.0.abs()
            .total_cmp(&a.0.abs())
            .then_with(|| b.0.total_cmp(&a.0))
    });
    pairs
}

/// `|θ|` of the k-th Ritz value, or `-inf` when there are fewer than `k`
fn kth_magnitude(pairs: &[(f64, Vec<f64>)], k: usize) -> f64 {
    pairs
        .get(k - 1)
        .map_or(f64::NEG_INFINITY, |(theta, _)| theta.abs())
}

fn restart_vector(n: usize, basis: &[Vec<f64>], restarts: u64) -> Option<Vec<f64>> {
    (0..RESTART_ATTEMPTS).find_map(|attempt| {
        let mut v = random_unit_vector(n, SEED + 1 + restarts * RESTART_ATTEMPTS + attempt);
        orthogonalize(&mut v, basis);
        (normalize(&mut v) > 1e-8).then_some(v)
    })
}

/// The `k` eigenpairs of the symmetric matrix `a` with the largest `|λ|`,
/// ordered by `|λ|` descending (positive first on ties).
///
/// `k` is clamped to the dimension of `a`. If the basis cap is reached before
/// the Ritz pairs converge, the current approximations are returned with a
/// warning.
pub fn largest_magnitude(a: &CsMat<f64>, k: usize) -> Vec<EigenPair> {
    let n = a.rows();
    let k = k.min(n);
    if k == 0 {
        return Vec::new();
    }

    let tol = TOLERANCE * linalg::max_abs_row_sum(a).max(1.0);
    let max_basis = n.min(4 * k + BASIS_SLACK);

    let mut h = DMatrix::<f64>::zeros(max_basis, max_basis);
    let mut basis = vec![random_unit_vector(n, SEED)];
    let mut segment_start = 0;
    // k-th |θ| at the moment the current Krylov sequence was started
    let mut floor_before_segment = f64::NEG_INFINITY;
    let mut restarts = 0u64;

    loop {
        let j = basis.len() - 1;
        let mut w = linalg::mul_vec(a, &basis[j]);
        for (i, c) in orthogonalize(&mut w, &basis).into_iter().enumerate() {
            h[(i, j)] = c;
            h[(j, i)] = c;
        }
        let beta = normalize(&mut w);
        let m = j + 1;

        if m == max_basis {
            if m < n {
                warn!(
                    "Lanczos reached {} basis vectors without converging on {} eigenpairs",
                    m, k
                );
            }
            break;
        }

        if beta > tol {
            let pairs = ritz_pairs(&h, 0, m);
            let converged = m >= k
                && pairs
                    .iter()
                    .take(k)
                    .all(|(_, s)| (beta * s[m - 1]).abs() <= tol);
            if converged {
                debug!("Lanczos converged with {} basis vectors", m);
                break;
            }
            basis.push(w);
            continue;
        }

        // span(basis) is invariant under `a`
        let segment_top = ritz_pairs(&h, segment_start, m - segment_start)
            .first()
            .map_or(0.0, |(theta, _)| theta.abs());
        let found_larger = segment_top > floor_before_segment + tol;
        if m >= k && !(found_larger && restarts < k as u64) {
            debug!(
                "Lanczos stopped on an invariant subspace of dimension {} after {} restarts",
                m, restarts
            );
            break;
        }
        let Some(next) = restart_vector(n, &basis, restarts) else {
            break;
        };
        floor_before_segment = kth_magnitude(&ritz_pairs(&h, 0, m), k);
        restarts += 1;
        segment_start = m;
        basis.push(next);
    }

    let m = basis.len();
    ritz_pairs(&h, 0, m)
        .into_iter()
        .take(k)
        .map(|(value, s)| {
            let mut vector = vec![0.0; n];
            for (q, &coeff) in basis.iter().zip(&s) {
                axpy(&mut vector, q, -coeff);
            }
            normalize(&mut vector);
            EigenPair { value, vector }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    fn symmetric(n: usize, edges: &[(usize, usize, f64)]) -> CsMat<f64> {
        let mut t = TriMat::new((n, n));
        for &(u, v, w) in edges {
            t.add_triplet(u, v, w);
            t.add_triplet(v, u, w);
        }
        t.to_csr()
    }

    fn residual(a: &CsMat<f64>, pair: &EigenPair) -> f64 {
        let ax = linalg::mul_vec(a, &pair.vector);
        ax.iter()
            .zip(&pair.vector)
            .map(|(y, x)| (y - pair.value * x).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn test_star_has_symmetric_pair() {
        // K_{1,5}: eigenvalues ±√5 and 0 four times
        let edges: Vec<_> = (1..6).map(|v| (0, v, 1.0)).collect();
        let a = symmetric(6, &edges);
        let pairs = largest_magnitude(&a, 3);
        assert_eq!(pairs.len(), 3);
        let mut top: Vec<f64> = pairs[..2].iter().map(|p| p.value).collect();
        top.sort_by(f64::total_cmp);
        assert!((top[0] + 5.0_f64.sqrt()).abs() < 1e-9);
        assert!((top[1] - 5.0_f64.sqrt()).abs() < 1e-9);
        assert!(pairs[2].value.abs() < 1e-9);
        for p in &pairs {
            assert!((dot(&p.vector, &p.vector) - 1.0).abs() < 1e-9);
            assert!(residual(&a, p) < 1e-8);
        }
    }

    #[test]
    fn test_repeated_eigenvalue_recovered_by_restart() {
        // two disjoint triangles: eigenvalue 2 twice, -1 four times
        let a = symmetric(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 1.0),
                (0, 2, 1.0),
                (3, 4, 1.0),
                (4, 5, 1.0),
                (3, 5, 1.0),
            ],
        );
        let pairs = largest_magnitude(&a, 2);
        assert!((pairs[0].value - 2.0).abs() < 1e-9);
        assert!((pairs[1].value - 2.0).abs() < 1e-9);
        assert!(dot(&pairs[0].vector, &pairs[1].vector).abs() < 1e-8);
    }

    #[test]
    fn test_orders_by_magnitude() {
        // weighted path: eigenvalues of [[0, 1, 0], [1, 0, 3], [0, 3, 0]] are 0, ±√10
        let a = symmetric(3, &[(0, 1, 1.0), (1, 2, 3.0)]);
        let pairs = largest_magnitude(&a, 3);
        assert!((pairs[0].value.abs() - 10.0_f64.sqrt()).abs() < 1e-9);
        assert!((pairs[1].value.abs() - 10.0_f64.sqrt()).abs() < 1e-9);
        assert!((pairs[0].value + pairs[1].value).abs() < 1e-9);
        assert!(pairs[2].value.abs() < 1e-9);
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_empty_matrix() {
            let a = symmetric(0, &[]);
            assert!(largest_magnitude(&a, 3).is_empty());
        }

        #[test]
        fn test_zero_matrix_gives_orthonormal_vectors() {
            let a = symmetric(4, &[]);
            let pairs = largest_magnitude(&a, 2);
            assert_eq!(pairs.len(), 2);
            for p in &pairs {
                assert!(p.value.abs() < 1e-12);
                assert!((dot(&p.vector, &p.vector) - 1.0).abs() < 1e-9);
            }
            assert!(dot(&pairs[0].vector, &pairs[1].vector).abs() < 1e-8);
        }

        #[test]
        fn test_k_clamped_to_dimension() {
            let a = symmetric(2, &[(0, 1, 1.0)]);
            assert_eq!(largest_magnitude(&a, 10).len(), 2);
        }
    }
}

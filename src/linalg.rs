//! Sparse/dense matrix helpers shared by the engines
//!
//! Matrices are `sprs` CSR matrices over `f64`. Vertex subsets are passed as
//! membership masks, so a quadratic form `xᵗMx` over an indicator vector `x`
//! is just the sum of entries whose row and column are both members.

use nalgebra::DMatrix;
use sprs::{CsMat, TriMat};

/// Sparse identity of size `n`
pub fn identity(n: usize) -> CsMat<f64> {
    CsMat::eye(n)
}

/// Sparse diagonal matrix from a vector
pub fn diagonal(values: &[f64]) -> CsMat<f64> {
    let n = values.len();
    let mut triplets = TriMat::new((n, n));
    for (i, &v) in values.iter().enumerate() {
        if v != 0.0 {
            triplets.add_triplet(i, i, v);
        }
    }
    triplets.to_csr()
}

/// Linear combination `Σ cᵢ·Mᵢ` of equally-shaped sparse matrices
pub fn linear_combination(n: usize, terms: &[(f64, &CsMat<f64>)]) -> CsMat<f64> {
    let mut triplets = TriMat::new((n, n));
    for &(coeff, mat) in terms {
        debug_assert_eq!(mat.shape(), (n, n));
        if coeff == 0.0 {
            continue;
        }
        for (i, row) in mat.outer_iterator().enumerate() {
            for (j, &value) in row.iter() {
                triplets.add_triplet(i, j, coeff * value);
            }
        }
    }
    triplets.to_csr()
}

/// Elementwise map, dropping entries that become zero
pub fn map_entries(mat: &CsMat<f64>, f: impl Fn(f64) -> f64) -> CsMat<f64> {
    let mut triplets = TriMat::new(mat.shape());
    for (i, row) in mat.outer_iterator().enumerate() {
        for (j, &value) in row.iter() {
            let mapped = f(value);
            if mapped != 0.0 {
                triplets.add_triplet(i, j, mapped);
            }
        }
    }
    triplets.to_csr()
}

pub fn transpose(mat: &CsMat<f64>) -> CsMat<f64> {
    let (rows, cols) = mat.shape();
    let mut triplets = TriMat::new((cols, rows));
    for (i, row) in mat.outer_iterator().enumerate() {
        for (j, &value) in row.iter() {
            triplets.add_triplet(j, i, value);
        }
    }
    triplets.to_csr()
}

/// Principal submatrix `M[indices, indices]`, re-indexed to `0..indices.len()`.
///
/// `indices` must be distinct and in range.
pub fn restrict(mat: &CsMat<f64>, indices: &[usize]) -> CsMat<f64> {
    let k = indices.len();
    let mut local: Vec<Option<usize>> = vec![None; mat.cols()];
    for (pos, &idx) in indices.iter().enumerate() {
        local[idx] = Some(pos);
    }

    let mut triplets = TriMat::new((k, k));
    for (pos, &idx) in indices.iter().enumerate() {
        if let Some(row) = mat.outer_view(idx) {
            for (j, &value) in row.iter() {
                if let Some(col) = local[j] {
                    triplets.add_triplet(pos, col, value);
                }
            }
        }
    }
    triplets.to_csr()
}

/// `xᵗMx` for the indicator vector of `members`
pub fn quadratic_form(mat: &CsMat<f64>, members: &[bool]) -> f64 {
    mat.outer_iterator()
        .enumerate()
        .filter(|(i, _)| members[*i])
        .map(|(_, row)| {
            row.iter()
                .filter(|(j, _)| members[*j])
                .map(|(_, &value)| value)
                .sum::<f64>()
        })
        .sum()
}

/// Sum of row `i` restricted to member columns
pub fn row_sum_over(mat: &CsMat<f64>, i: usize, members: &[bool]) -> f64 {
    mat.outer_view(i)
        .map(|row| {
            row.iter()
                .filter(|(j, _)| members[*j])
                .map(|(_, &value)| value)
                .sum()
        })
        .unwrap_or(0.0)
}

pub fn diagonal_entry(mat: &CsMat<f64>, i: usize) -> f64 {
    mat.get(i, i).copied().unwrap_or(0.0)
}

/// Exact structural check for the identity matrix
pub fn is_identity(mat: &CsMat<f64>) -> bool {
    let (rows, cols) = mat.shape();
    rows == cols
        && mat.outer_iterator().enumerate().all(|(i, row)| {
            row.iter()
                .all(|(j, &value)| if i == j { value == 1.0 } else { value == 0.0 })
                && row.get(i).copied() == Some(1.0)
        })
}

/// Sparse matrix-vector product `M·x`
pub fn mul_vec(mat: &CsMat<f64>, x: &[f64]) -> Vec<f64> {
    mat.outer_iterator()
        .map(|row| row.iter().map(|(j, &value)| value * x[j]).sum())
        .collect()
}

/// `max_i Σ_j |M_ij|`, an upper bound on the spectral radius
pub fn max_abs_row_sum(mat: &CsMat<f64>) -> f64 {
    mat.outer_iterator()
        .map(|row| row.iter().map(|(_, &value)| value.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Gershgorin bound on the largest eigenvalue of the principal submatrix on
/// `indices`; `members` is the matching mask
pub fn gershgorin_max(mat: &CsMat<f64>, indices: &[usize], members: &[bool]) -> f64 {
    indices
        .iter()
        .map(|&i| {
            mat.outer_view(i)
                .map(|row| {
                    row.iter()
                        .filter(|(j, _)| members[*j])
                        .map(|(j, &value)| if j == i { value } else { value.abs() })
                        .sum::<f64>()
                })
                .unwrap_or(0.0)
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Dense copy for the SVD
pub fn to_dense(mat: &CsMat<f64>) -> DMatrix<f64> {
    let (rows, cols) = mat.shape();
    let mut dense = DMatrix::<f64>::zeros(rows, cols);
    for (i, row) in mat.outer_iterator().enumerate() {
        for (j, &value) in row.iter() {
            dense[(i, j)] += value;
        }
    }
    dense
}

//! Density variants as quadratic forms
//!
//! Every supported density definition is a pair of matrices `(P, Q)`; the
//! score of a vertex set with indicator vector `x` is `0.5 · xᵗPx / xᵗQx`.
//!
//! | Method             | P                          | Q          |
//! |--------------------|----------------------------|------------|
//! | plain              | A                          | I          |
//! | min-quotient-cut   | A − D                      | I          |
//! | weighted           | A + 2·Dw                   | I          |
//! | sparsity-penalized | A − (2α/(2α+1))·D          | I          |
//! | risk-averse        | A⁺ + λ₁I                   | A⁻ + λ₂I   |

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sprs::CsMat;
use tracing::{debug, warn};

use crate::graph::Graph;
use crate::linalg;

/// Default α for the sparsity-penalized variant
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Risk-averse λ₁ added to the positive part
pub const RISK_AVERSE_LAMBDA1: f64 = 1.0;

/// Risk-averse λ₂ added to the negative part
pub const RISK_AVERSE_LAMBDA2: f64 = 1.0;

/// A density definition, selected by a case-insensitive tag
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DensityMethod {
    /// Edge weight per vertex (Charikar)
    #[default]
    Plain,
    /// Negated Laplacian: rewards sets with few boundary edges
    MinQuotientCut,
    /// Vertex weights count twice (Fraudar-style suspiciousness)
    Weighted,
    /// Degree-penalized density, parameterized by α
    SparsityPenalized { alpha: f64 },
    /// Positive edges over negative edges
    RiskAverse,
    /// Unrecognized tag; behaves like `Plain`
    Unknown(String),
}

impl DensityMethod {
    /// Parse a method tag. Unknown tags are kept and derive plain density.
    pub fn parse(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase();
        match normalized.as_str() {
            "plain" | "charikar" => DensityMethod::Plain,
            "min-quotient-cut" | "minquotientcut" => DensityMethod::MinQuotientCut,
            "weighted" | "fraud" | "fraudar" => DensityMethod::Weighted,
            "sparsity-penalized" | "sparsecutds" => DensityMethod::SparsityPenalized {
                alpha: DEFAULT_ALPHA,
            },
            "risk-averse" | "risk-averse ds" | "riskaverse" => DensityMethod::RiskAverse,
            _ => {
                debug!("Unknown density method tag '{}'", tag);
                DensityMethod::Unknown(tag.to_string())
            }
        }
    }

    /// Override α; only meaningful for the sparsity-penalized variant
    pub fn with_alpha(self, alpha: f64) -> Self {
        match self {
            DensityMethod::SparsityPenalized { .. } => DensityMethod::SparsityPenalized { alpha },
            other => other,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DensityMethod::Plain => "plain",
            DensityMethod::MinQuotientCut => "min-quotient-cut",
            DensityMethod::Weighted => "weighted",
            DensityMethod::SparsityPenalized { .. } => "sparsity-penalized",
            DensityMethod::RiskAverse => "risk-averse",
            DensityMethod::Unknown(tag) => tag,
        }
    }

    /// Derive `(P, Q)` for this method over the whole graph
    pub fn quadratic_forms(&self, graph: &Graph) -> QuadraticForms {
        let n = graph.num_nodes();
        let a = graph.adjacency();

        let forms = match self {
            DensityMethod::Plain => QuadraticForms::over_cardinality(a.clone()),
            DensityMethod::Unknown(tag) => {
                warn!(
                    "Unknown density method '{}', falling back to plain density (P = A, Q = I)",
                    tag
                );
                QuadraticForms::over_cardinality(a.clone())
            }
            DensityMethod::MinQuotientCut => {
                let d = linalg::diagonal(graph.degrees());
                QuadraticForms::over_cardinality(linalg::linear_combination(
                    n,
                    &[(1.0, a), (-1.0, &d)],
                ))
            }
            DensityMethod::Weighted => {
                let dw = linalg::diagonal(graph.node_weights());
                QuadraticForms::over_cardinality(linalg::linear_combination(
                    n,
                    &[(1.0, a), (2.0, &dw)],
                ))
            }
            DensityMethod::SparsityPenalized { alpha } => {
                let coeff = (2.0 * alpha) / (2.0 * alpha + 1.0);
                let d = linalg::diagonal(graph.degrees());
                QuadraticForms::over_cardinality(linalg::linear_combination(
                    n,
                    &[(1.0, a), (-coeff, &d)],
                ))
            }
            DensityMethod::RiskAverse => {
                let i = linalg::identity(n);
                let a_plus = linalg::map_entries(a, |w| w.max(0.0));
                let a_minus = linalg::map_entries(a, |w| (-w).max(0.0));
                QuadraticForms {
                    p: linalg::linear_combination(
                        n,
                        &[(1.0, &a_plus), (RISK_AVERSE_LAMBDA1, &i)],
                    ),
                    q: Denominator::from_matrix(linalg::linear_combination(
                        n,
                        &[(1.0, &a_minus), (RISK_AVERSE_LAMBDA2, &i)],
                    )),
                }
            }
        };

        debug!(
            "Derived quadratic forms for '{}': nnz(P) = {}, Q = {}",
            self.name(),
            forms.p.nnz(),
            match &forms.q {
                Denominator::Cardinality => "I".to_string(),
                Denominator::Form(q) => format!("sparse (nnz = {})", q.nnz()),
            }
        );
        forms
    }
}

impl FromStr for DensityMethod {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DensityMethod::parse(s))
    }
}

impl From<String> for DensityMethod {
    fn from(s: String) -> Self {
        DensityMethod::parse(&s)
    }
}

impl From<DensityMethod> for String {
    fn from(method: DensityMethod) -> Self {
        method.name().to_string()
    }
}

impl fmt::Display for DensityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DensityMethod::SparsityPenalized { alpha } => {
                write!(f, "sparsity-penalized (alpha = {})", alpha)
            }
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Denominator of the score
#[derive(Debug, Clone)]
pub enum Denominator {
    /// `Q = I`: the denominator is the number of surviving vertices
    Cardinality,
    /// General `xᵗQx`
    Form(CsMat<f64>),
}

impl Denominator {
    /// Wrap a matrix, recognizing the identity so the engine can count instead
    pub fn from_matrix(q: CsMat<f64>) -> Self {
        if linalg::is_identity(&q) {
            Denominator::Cardinality
        } else {
            Denominator::Form(q)
        }
    }

    /// Restriction to a vertex subset
    pub fn restrict(&self, indices: &[usize]) -> Self {
        match self {
            Denominator::Cardinality => Denominator::Cardinality,
            Denominator::Form(q) => Denominator::Form(linalg::restrict(q, indices)),
        }
    }
}

/// The `(P, Q)` pair consumed by the peeling engine
#[derive(Debug, Clone)]
pub struct QuadraticForms {
    pub p: CsMat<f64>,
    pub q: Denominator,
}

impl QuadraticForms {
    fn over_cardinality(p: CsMat<f64>) -> Self {
        Self {
            p,
            q: Denominator::Cardinality,
        }
    }

    /// Restriction of both forms to the principal submatrix on `indices`
    pub fn restrict(&self, indices: &[usize]) -> Self {
        Self {
            p: linalg::restrict(&self.p, indices),
            q: self.q.restrict(indices),
        }
    }
}

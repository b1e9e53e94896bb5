//! Historical co-occurrence strengths between products.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::catalog::ProductId;
use crate::error::{BargainError, Result};

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Symmetric, non-negative matrix where cell `(i, j)` counts how often `i` and `j`
/// were bought together and the diagonal holds each product's own popularity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DMatrix<f64>", into = "DMatrix<f64>")]
pub struct CoOccurrenceMatrix {
    scores: DMatrix<f64>,
}

impl CoOccurrenceMatrix {
    /// Validates shape, sign and symmetry of `scores`.
    pub fn new(scores: DMatrix<f64>) -> Result<Self> {
        if scores.nrows() != scores.ncols() {
            return Err(BargainError::dimension_mismatch(
                "co-occurrence columns",
                scores.nrows(),
                scores.ncols(),
            ));
        }

        let n = scores.nrows();
        for row in 0..n {
            for col in 0..n {
                let value = scores[(row, col)];
                if !value.is_finite() {
                    return Err(BargainError::InvalidCoOccurrence {
                        row,
                        col,
                        reason: "not finite",
                    });
                }
                if value < 0.0 {
                    return Err(BargainError::InvalidCoOccurrence {
                        row,
                        col,
                        reason: "negative",
                    });
                }
                if col > row && (value - scores[(col, row)]).abs() > SYMMETRY_TOLERANCE {
                    return Err(BargainError::InvalidCoOccurrence {
                        row,
                        col,
                        reason: "asymmetric",
                    });
                }
            }
        }

        Ok(Self { scores })
    }

    /// Builds an `n x n` matrix from row-major data.
    pub fn from_row_slice(n: usize, data: &[f64]) -> Result<Self> {
        if data.len() != n * n {
            return Err(BargainError::dimension_mismatch(
                "co-occurrence cells",
                n * n,
                data.len(),
            ));
        }
        Self::new(DMatrix::from_row_slice(n, n, data))
    }

    /// Number of products covered.
    pub fn dimension(&self) -> usize {
        self.scores.nrows()
    }

    /// Read-only view of the raw scores.
    pub fn scores(&self) -> &DMatrix<f64> {
        &self.scores
    }

    pub fn score(&self, i: ProductId, j: ProductId) -> Result<f64> {
        self.check(i)?;
        self.check(j)?;
        Ok(self.scores[(i.index(), j.index())])
    }

    /// Diagonal entry; the normalizer for scores against this product.
    pub fn popularity(&self, product: ProductId) -> Result<f64> {
        let value = self.score(product, product)?;
        if value <= 0.0 {
            return Err(BargainError::NonPositivePopularity { product });
        }
        Ok(value)
    }

    /// Co-occurrence of `item` with `anchor` relative to the anchor's popularity.
    pub fn affinity(&self, anchor: ProductId, item: ProductId) -> Result<f64> {
        Ok(self.score(anchor, item)? / self.popularity(anchor)?)
    }

    /// Co-occurrence of `item` with `anchor` relative to the item's own popularity.
    pub fn lift(&self, anchor: ProductId, item: ProductId) -> Result<f64> {
        Ok(self.score(anchor, item)? / self.popularity(item)?)
    }

    /// Mean affinity between the anchor (last element) and every add-on.
    ///
    /// A bundle holding only the anchor has no add-ons and scores `0.0`.
    pub fn prior_signal(&self, bundle: &[ProductId]) -> Result<f64> {
        let (anchor, add_ons) = bundle.split_last().ok_or(BargainError::EmptyBundle)?;
        if add_ons.is_empty() {
            self.check(*anchor)?;
            return Ok(0.0);
        }
        let total = add_ons
            .iter()
            .map(|item| self.affinity(*anchor, *item))
            .sum::<Result<f64>>()?;
        Ok(total / add_ons.len() as f64)
    }

    fn check(&self, product: ProductId) -> Result<()> {
        if product.index() < self.dimension() {
            Ok(())
        } else {
            Err(BargainError::unknown_product(product))
        }
    }
}

impl TryFrom<DMatrix<f64>> for CoOccurrenceMatrix {
    type Error = BargainError;

    fn try_from(scores: DMatrix<f64>) -> Result<Self> {
        Self::new(scores)
    }
}

impl From<CoOccurrenceMatrix> for DMatrix<f64> {
    fn from(matrix: CoOccurrenceMatrix) -> Self {
        matrix.scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix() -> CoOccurrenceMatrix {
        CoOccurrenceMatrix::from_row_slice(3, &[10.0, 8.0, 2.0, 8.0, 16.0, 4.0, 2.0, 4.0, 5.0])
            .unwrap()
    }

    #[test]
    fn prior_signal_averages_anchor_affinity() {
        let matrix = matrix();
        let prior = matrix
            .prior_signal(&[ProductId(1), ProductId(2), ProductId(0)])
            .unwrap();
        assert_relative_eq!(prior, (0.8 + 0.2) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn anchor_only_bundle_has_zero_prior() {
        assert_eq!(matrix().prior_signal(&[ProductId(2)]).unwrap(), 0.0);
    }

    #[test]
    fn lift_normalizes_by_item_popularity() {
        let lift = matrix().lift(ProductId(0), ProductId(1)).unwrap();
        assert_relative_eq!(lift, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_asymmetric_scores() {
        let result = CoOccurrenceMatrix::from_row_slice(2, &[1.0, 3.0, 2.0, 1.0]);
        assert!(matches!(
            result,
            Err(BargainError::InvalidCoOccurrence {
                reason: "asymmetric",
                ..
            })
        ));
    }

    #[test]
    fn zero_popularity_cannot_normalize() {
        let matrix = CoOccurrenceMatrix::from_row_slice(2, &[0.0, 1.0, 1.0, 3.0]).unwrap();
        assert!(matches!(
            matrix.affinity(ProductId(0), ProductId(1)),
            Err(BargainError::NonPositivePopularity { .. })
        ));
    }
}

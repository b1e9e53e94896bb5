//! Bundle partner suggestions ranked by co-occurrence with the anchor.

use crate::catalog::ProductId;
use crate::cooccurrence::CoOccurrenceMatrix;
use crate::error::{BargainError, Result};

/// Number of partners suggested alongside an anchor unless configured otherwise.
pub const DEFAULT_SUGGESTIONS: usize = 2;

/// Ranks bundle partners for an anchor product.
#[derive(Clone, Copy, Debug)]
pub struct Recommender<'a> {
    matrix: &'a CoOccurrenceMatrix,
}

impl<'a> Recommender<'a> {
    pub fn new(matrix: &'a CoOccurrenceMatrix) -> Self {
        Self { matrix }
    }

    /// Returns up to `k` products other than `anchor`, highest score first.
    /// Equal scores keep catalog order.
    pub fn suggest_partners(&self, anchor: ProductId, k: usize) -> Result<Vec<ProductId>> {
        let mut ranked = Vec::with_capacity(self.matrix.dimension().saturating_sub(1));
        for index in 0..self.matrix.dimension() {
            let candidate = ProductId(index);
            if candidate != anchor {
                ranked.push((candidate, self.matrix.score(anchor, candidate)?));
            }
        }
        if ranked.is_empty() {
            // still surface a bad anchor id
            self.matrix.score(anchor, anchor)?;
        }

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        Ok(ranked.into_iter().map(|(product, _)| product).collect())
    }

    /// The single strongest partner of `anchor`.
    pub fn best_partner(&self, anchor: ProductId) -> Result<ProductId> {
        self.suggest_partners(anchor, 1)?
            .first()
            .copied()
            .ok_or(BargainError::NoPartners { anchor })
    }
}

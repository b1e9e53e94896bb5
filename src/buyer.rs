//! Buyer-side desirability tracking.
//!
//! Each product carries two counters over a session: how many times it was
//! part of a proposal (momentum) and how many times it was dropped after having
//! been on the table. The buyer's utility for a proposal blends the lift of its
//! items against the anchor with those counters.

use crate::catalog::ProductId;
use crate::cooccurrence::CoOccurrenceMatrix;
use crate::error::{BargainError, Result};
use crate::offer::Proposal;

/// Per-session momentum and drop counters for every catalog product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuyerModel {
    momentum: Vec<u32>,
    drops: Vec<u32>,
}

impl BuyerModel {
    /// Starts every counter at zero.
    pub fn new(product_count: usize) -> Self {
        Self {
            momentum: vec![0; product_count],
            drops: vec![0; product_count],
        }
    }

    pub fn momentum(&self, product: ProductId) -> u32 {
        self.momentum.get(product.index()).copied().unwrap_or(0)
    }

    pub fn drops(&self, product: ProductId) -> u32 {
        self.drops.get(product.index()).copied().unwrap_or(0)
    }

    /// Updates the counters for `proposal` and returns its buyer-side utility.
    ///
    /// The anchor is the proposal's last element. Counters are only touched once
    /// every product in both bundles has been resolved.
    pub fn utility(
        &mut self,
        matrix: &CoOccurrenceMatrix,
        proposal: &Proposal,
        previous_bundle: &[ProductId],
    ) -> Result<f64> {
        let anchor = proposal.anchor()?;
        let lift_total = proposal
            .bundle
            .iter()
            .map(|item| matrix.lift(anchor, *item))
            .sum::<Result<f64>>()?;
        for product in proposal.bundle.iter().chain(previous_bundle) {
            if product.index() >= self.momentum.len() {
                return Err(BargainError::unknown_product(*product));
            }
        }

        for product in &proposal.bundle {
            self.momentum[product.index()] += 1;
        }
        for product in previous_bundle {
            if !proposal.bundle.contains(product) {
                self.drops[product.index()] += 1;
            }
        }

        let size = proposal.bundle.len() as f64;
        let momentum_total: f64 = proposal
            .bundle
            .iter()
            .map(|product| f64::from(self.momentum[product.index()]))
            .sum();
        let drop_total: f64 = proposal
            .bundle
            .iter()
            .map(|product| f64::from(self.drops[product.index()]))
            .sum();

        Ok(lift_total / size + momentum_total / size - drop_total / size)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn matrix() -> CoOccurrenceMatrix {
        CoOccurrenceMatrix::from_row_slice(3, &[10.0, 8.0, 4.0, 8.0, 10.0, 2.0, 4.0, 2.0, 5.0])
            .unwrap()
    }

    #[test]
    fn repeated_bundle_builds_momentum() {
        let matrix = matrix();
        let mut buyer = BuyerModel::new(3);
        let proposal = Proposal::new(vec![ProductId(1), ProductId(0)], 120.0);

        let first = buyer.utility(&matrix, &proposal, &proposal.bundle).unwrap();
        // lift: (8/10 + 10/10) / 2, momentum 1 each
        assert_relative_eq!(first, 0.9 + 1.0, epsilon = 1e-12);

        let second = buyer.utility(&matrix, &proposal, &proposal.bundle).unwrap();
        assert_relative_eq!(second, 0.9 + 2.0, epsilon = 1e-12);
        assert_eq!(buyer.momentum(ProductId(1)), 2);
        assert_eq!(buyer.drops(ProductId(1)), 0);
    }

    #[test]
    fn dropped_items_are_counted() {
        let matrix = matrix();
        let mut buyer = BuyerModel::new(3);
        let previous = [ProductId(1), ProductId(2), ProductId(0)];
        let proposal = Proposal::new(vec![ProductId(2), ProductId(0)], 90.0);

        let utility = buyer.utility(&matrix, &proposal, &previous).unwrap();
        assert_eq!(buyer.drops(ProductId(1)), 1);
        assert_eq!(buyer.drops(ProductId(2)), 0);
        // lift: (4/5 + 10/10) / 2, momentum 1 each, no drops on the bundle
        assert_relative_eq!(utility, 0.9 + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn unknown_products_leave_counters_untouched() {
        let matrix = matrix();
        let mut buyer = BuyerModel::new(3);
        let proposal = Proposal::new(vec![ProductId(1), ProductId(0)], 120.0);
        let result = buyer.utility(&matrix, &proposal, &[ProductId(9)]);
        assert!(matches!(result, Err(BargainError::UnknownProduct { .. })));
        assert_eq!(buyer, BuyerModel::new(3));
    }
}

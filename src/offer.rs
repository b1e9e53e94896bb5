//! Fixed-shape offer values exchanged between the buyer and the agent.
//!
//! A bundle is an ordered list of product ids whose last element is the
//! anchor, the product the buyer originally asked for.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ProductId};
use crate::error::{BargainError, Result};

/// The anchor of `bundle`, i.e. its last element.
pub fn anchor_of(bundle: &[ProductId]) -> Result<ProductId> {
    bundle.last().copied().ok_or(BargainError::EmptyBundle)
}

/// Whether two bundles hold the same products regardless of order.
pub fn same_items(left: &[ProductId], right: &[ProductId]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut left = left.to_vec();
    let mut right = right.to_vec();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}

/// A buyer's counter-proposal: a bundle and the price they would pay for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub bundle: Vec<ProductId>,
    pub cost: f64,
}

impl Proposal {
    pub fn new(bundle: Vec<ProductId>, cost: f64) -> Self {
        Self { bundle, cost }
    }

    pub fn anchor(&self) -> Result<ProductId> {
        anchor_of(&self.bundle)
    }

    /// Every product except the anchor.
    pub fn add_ons(&self) -> &[ProductId] {
        self.bundle.split_last().map(|(_, rest)| rest).unwrap_or_default()
    }
}

/// An offer returned by the agent. Never mutated once handed out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub bundle: Vec<ProductId>,
    pub cost: f64,
    pub accepted: bool,
}

impl Offer {
    /// A counter-offer still open for negotiation.
    pub fn counter(bundle: Vec<ProductId>, cost: f64) -> Self {
        Self {
            bundle,
            cost,
            accepted: false,
        }
    }

    /// The buyer's proposal taken as-is.
    pub fn accepting(proposal: &Proposal) -> Self {
        Self {
            bundle: proposal.bundle.clone(),
            cost: proposal.cost,
            accepted: true,
        }
    }

    pub fn anchor(&self) -> Result<ProductId> {
        anchor_of(&self.bundle)
    }

    pub fn add_ons(&self) -> &[ProductId] {
        self.bundle.split_last().map(|(_, rest)| rest).unwrap_or_default()
    }

    /// Views the offer's bundle and price as a proposal for utility evaluation.
    pub fn as_proposal(&self) -> Proposal {
        Proposal::new(self.bundle.clone(), self.cost)
    }

    /// Listed price of the bundle minus what this offer asks for it.
    pub fn amount_saved(&self, catalog: &Catalog) -> Result<f64> {
        Ok(catalog.listed_total(&self.bundle)? - self.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_items_ignores_order_but_not_multiplicity() {
        let a = [ProductId(3), ProductId(1), ProductId(0)];
        let b = [ProductId(1), ProductId(3), ProductId(0)];
        assert!(same_items(&a, &b));
        assert!(!same_items(&a, &[ProductId(1), ProductId(0)]));
        assert!(!same_items(
            &[ProductId(1), ProductId(1)],
            &[ProductId(1), ProductId(0)]
        ));
    }

    #[test]
    fn anchor_is_the_last_element() {
        let proposal = Proposal::new(vec![ProductId(4), ProductId(2)], 10.0);
        assert_eq!(proposal.anchor().unwrap(), ProductId(2));
        assert_eq!(proposal.add_ons(), &[ProductId(4)]);
        assert!(matches!(
            Proposal::new(Vec::new(), 1.0).anchor(),
            Err(BargainError::EmptyBundle)
        ));
    }

    #[test]
    fn amount_saved_is_listed_total_minus_cost() {
        let catalog = Catalog::builder()
            .product("A", 100.0, 40.0)
            .product("B", 50.0, 20.0)
            .build()
            .unwrap();
        let offer = Offer::counter(vec![ProductId(1), ProductId(0)], 130.0);
        assert_eq!(offer.amount_saved(&catalog).unwrap(), 20.0);
    }
}

use thiserror::Error;

use crate::catalog::ProductId;
use crate::session::{NegotiationStatus, SessionId};

/// Unified error type for `bargain` operations.
#[derive(Debug, Error)]
pub enum BargainError {
    /// Raised when a product id does not resolve against the catalog or matrix.
    #[error("unknown product {product}")]
    UnknownProduct { product: ProductId },

    /// Raised when a product name cannot be found in the catalog.
    #[error("no product named `{name}` in the catalog")]
    UnknownProductName { name: String },

    /// Raised when catalog prices are non-positive or sell below cost.
    #[error(
        "product `{product}` has invalid prices: selling {selling_price}, cost {cost_price}"
    )]
    InvalidPrice {
        product: String,
        selling_price: f64,
        cost_price: f64,
    },

    /// Raised when provided collections have incompatible dimensions.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required dimension.
        expected: usize,
        /// The dimension that was actually supplied.
        found: usize,
    },

    /// Raised when a co-occurrence cell is negative, non-finite or asymmetric.
    #[error("co-occurrence cell ({row}, {col}) is invalid: {reason}")]
    InvalidCoOccurrence {
        row: usize,
        col: usize,
        reason: &'static str,
    },

    /// Raised when a product's own co-occurrence (popularity) is not positive.
    #[error("product {product} has non-positive popularity and cannot normalize scores")]
    NonPositivePopularity { product: ProductId },

    /// Raised when an offer or proposal carries no products.
    #[error("bundle must contain at least the anchor product")]
    EmptyBundle,

    /// Raised when a proposal names a different anchor than the session's.
    #[error("proposal anchors on {found} but the session is negotiating {expected}")]
    AnchorMismatch {
        expected: ProductId,
        found: ProductId,
    },

    /// Raised when a buyer proposal carries a NaN or infinite price.
    #[error("proposal price {cost} is not a finite amount")]
    InvalidProposalCost { cost: f64 },

    /// Raised when the bundle's listed total equals its cost total.
    #[error("bundle has no profit room (max profit {max_profit}); agent utility is undefined")]
    DegenerateBundle { max_profit: f64 },

    /// Raised when the buyer's opening counter-offer carries no discount at all.
    #[error("opening counter-offer carries a zero discount ratio; buyer utility is undefined")]
    DegenerateOpeningOffer,

    /// Raised when the counter-offer candidate range is empty and no acceptance rule fired.
    #[error("no counter-offer candidates between {start_price} and {max_cost}")]
    NoViableCounter { start_price: u64, max_cost: u64 },

    /// Raised when the catalog holds no product other than the anchor.
    #[error("no bundle partner available for {anchor}")]
    NoPartners { anchor: ProductId },

    /// Raised when a session key is not registered.
    #[error("unknown negotiation {session}")]
    UnknownSession { session: SessionId },

    /// Raised when a closed session receives another round.
    #[error("negotiation {session} is already {status:?}")]
    SessionClosed {
        session: SessionId,
        status: NegotiationStatus,
    },
}

impl BargainError {
    /// Helper to format a [`DimensionMismatch`](BargainError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper for ids that fall outside the catalog.
    pub fn unknown_product(product: ProductId) -> Self {
        Self::UnknownProduct { product }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, BargainError>;

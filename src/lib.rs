//! Seller-side bundle price negotiation.
//!
//! A buyer names the product they want (the *anchor*). The agent answers with
//! a bundle of the anchor and its strongest co-occurring partners at a
//! discounted price, then trades counter-offers with the buyer until one side
//! accepts or the buyer walks away. The crate provides
//!
//! - the product catalog and co-occurrence data (`catalog`, `cooccurrence`,
//!   `market` modules),
//! - bundle partner ranking (`recommender` module),
//! - the agent's utility and opponent models (`agent` module), its adaptive
//!   concession curve (`concession` module) and the counter-offer search
//!   (`bidding` module),
//! - buyer-side momentum tracking (`buyer` module), and
//! - per-session orchestration keyed by session id (`session` module).
//!
//! Everything is synchronous arithmetic. Sessions own their state exclusively;
//! the [`Market`] is the only value shared between them.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bargain::{Catalog, CoOccurrenceMatrix, Market, NegotiationOptions, Negotiator, Proposal};
//!
//! let catalog = Catalog::builder()
//!     .product("Smartphone", 10_000.0, 4_000.0)
//!     .product("Phone Case", 500.0, 100.0)
//!     .product("Screen Guard", 200.0, 50.0)
//!     .build()
//!     .expect("valid prices");
//! let matrix = CoOccurrenceMatrix::from_row_slice(
//!     3,
//!     &[50.0, 30.0, 25.0, 30.0, 40.0, 10.0, 25.0, 10.0, 35.0],
//! )
//! .expect("symmetric scores");
//! let market = Arc::new(Market::new(catalog, matrix).expect("matching dimensions"));
//!
//! let mut negotiator = Negotiator::new(market.clone(), NegotiationOptions::default());
//! let phone = market.catalog().find("Smartphone").expect("listed");
//! let (session, opening) = negotiator.start_session(phone).expect("opening offer");
//! println!("opening at {:.0}", opening.cost);
//!
//! let answer = negotiator
//!     .advance_session(session, Proposal::new(opening.bundle.clone(), 9_500.0))
//!     .expect("counter-offer");
//! println!("agent answers {:.0} (accepted: {})", answer.cost, answer.accepted);
//! ```

pub mod agent;
pub mod bidding;
pub mod buyer;
pub mod catalog;
pub mod concession;
pub mod cooccurrence;
pub mod error;
pub mod market;
pub mod offer;
pub mod options;
pub mod recommender;
pub mod session;

pub use agent::Agent;
pub use bidding::{AcceptanceRule, BidSpace};
pub use buyer::BuyerModel;
pub use catalog::{Catalog, Product, ProductId};
pub use cooccurrence::CoOccurrenceMatrix;
pub use error::{BargainError, Result};
pub use market::Market;
pub use offer::{Offer, Proposal};
pub use options::{AgentOptions, BidFilter, InitialPricing, NegotiationOptions};
pub use recommender::Recommender;
pub use session::{HistoryEntry, NegotiationSession, NegotiationStatus, Negotiator, SessionId};

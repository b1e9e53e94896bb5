//! Negotiation sessions and the registry that keys them.
//!
//! Each session exclusively owns its agent state, buyer counters and offer
//! history; only the [`Market`] is shared between sessions, read-only.
//! A round works on copies of the session state and commits them only when
//! every step succeeded, so a refused round leaves the session untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::buyer::BuyerModel;
use crate::catalog::ProductId;
use crate::error::{BargainError, Result};
use crate::market::Market;
use crate::offer::{Offer, Proposal};
use crate::options::NegotiationOptions;

/// Key of a negotiation session inside a [`Negotiator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session #{}", self.0)
    }
}

/// Lifecycle of a session. A session that does not exist yet has not started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationStatus {
    Negotiating,
    Accepted,
    Rejected,
}

/// One step of a session's exchange, in the order it happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HistoryEntry {
    /// A buyer counter-proposal and the buyer-side utility tracked for it.
    Proposal {
        proposal: Proposal,
        buyer_side_utility: f64,
    },
    /// An offer returned by the agent.
    Offer(Offer),
}

/// State of a single negotiation over one anchor product.
#[derive(Clone, Debug)]
pub struct NegotiationSession {
    id: SessionId,
    anchor: ProductId,
    status: NegotiationStatus,
    accept_when_counter_meets_proposal: bool,
    agent: Agent,
    buyer: BuyerModel,
    last_offer: Offer,
    last_proposal: Option<Proposal>,
    history: Vec<HistoryEntry>,
}

impl NegotiationSession {
    /// Builds the opening offer: recommended partners first, then the anchor.
    pub fn open(
        id: SessionId,
        market: &Market,
        options: &NegotiationOptions,
        anchor: ProductId,
    ) -> Result<Self> {
        market.catalog().product(anchor)?;
        let mut bundle = market
            .recommender()
            .suggest_partners(anchor, options.suggestion_count)?;
        bundle.push(anchor);

        let mut agent = Agent::new(options.agent.clone());
        let offer = agent.build_initial_offer(market, bundle)?;
        let utility = agent.agent_utility(market, &offer.as_proposal())?;
        agent.record_offer_utility(utility);

        info!(
            "{} opened on {} at {:.2} for {} products",
            id,
            anchor,
            offer.cost,
            offer.bundle.len()
        );

        Ok(Self {
            id,
            anchor,
            status: NegotiationStatus::Negotiating,
            accept_when_counter_meets_proposal: options.accept_when_counter_meets_proposal,
            agent,
            buyer: BuyerModel::new(market.catalog().len()),
            history: vec![HistoryEntry::Offer(offer.clone())],
            last_offer: offer,
            last_proposal: None,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn anchor(&self) -> ProductId {
        self.anchor
    }

    pub fn status(&self) -> NegotiationStatus {
        self.status
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn buyer(&self) -> &BuyerModel {
        &self.buyer
    }

    /// The agent's standing offer.
    pub fn last_offer(&self) -> &Offer {
        &self.last_offer
    }

    pub fn last_proposal(&self) -> Option<&Proposal> {
        self.last_proposal.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Runs one round against the buyer's `proposal` and returns the agent's answer.
    pub fn advance(&mut self, market: &Market, proposal: Proposal) -> Result<Offer> {
        self.ensure_negotiating()?;
        if !proposal.cost.is_finite() {
            return Err(BargainError::InvalidProposalCost {
                cost: proposal.cost,
            });
        }
        let anchor = proposal.anchor()?;
        if anchor != self.anchor {
            return Err(BargainError::AnchorMismatch {
                expected: self.anchor,
                found: anchor,
            });
        }
        market.catalog().validate_bundle(&proposal.bundle)?;

        let mut agent = self.agent.clone();
        let mut buyer = self.buyer.clone();
        let previous_bundle = self
            .last_proposal
            .as_ref()
            .map_or(self.last_offer.bundle.as_slice(), |previous| {
                previous.bundle.as_slice()
            });

        let buyer_side_utility = buyer.utility(market.matrix(), &proposal, previous_bundle)?;
        let buyer_utility = agent.estimate_buyer_utility(market, &proposal)?.min(1.0);
        let agent_utility = agent.agent_utility(market, &proposal)?;
        let target_utility = agent.next_target_utility(buyer_utility);
        debug!(
            "{} round {}: buyer {:.4}, agent {:.4}, target {:.4}, floor {:.4}",
            self.id,
            agent.time(),
            buyer_utility,
            agent_utility,
            target_utility,
            agent.min_agent_utility()
        );

        let bid_space = agent.build_bid_space(market, &proposal, target_utility, &self.last_offer)?;
        let mut offer = agent
            .decide(market, &bid_space, &proposal, target_utility, agent_utility)
            .map_err(|err| {
                warn!("{} refused round: {}", self.id, err);
                err
            })?;
        if !offer.accepted && self.accept_when_counter_meets_proposal && offer.cost <= proposal.cost
        {
            offer = Offer {
                accepted: true,
                ..offer
            };
        }

        self.agent = agent;
        self.buyer = buyer;
        self.history.push(HistoryEntry::Proposal {
            proposal: proposal.clone(),
            buyer_side_utility,
        });
        self.history.push(HistoryEntry::Offer(offer.clone()));
        self.last_proposal = Some(proposal);
        self.last_offer = offer.clone();
        if offer.accepted {
            self.status = NegotiationStatus::Accepted;
            info!("{} accepted at {:.2}", self.id, offer.cost);
        }
        Ok(offer)
    }

    /// The buyer takes the agent's standing offer.
    pub fn accept(&mut self) -> Result<Offer> {
        self.ensure_negotiating()?;
        let offer = Offer {
            accepted: true,
            ..self.last_offer.clone()
        };
        self.history.push(HistoryEntry::Offer(offer.clone()));
        self.last_offer = offer.clone();
        self.status = NegotiationStatus::Accepted;
        info!("{} accepted by buyer at {:.2}", self.id, offer.cost);
        Ok(offer)
    }

    /// The buyer walks away from the bundle; returns the anchor alone at its listed price.
    pub fn reject(&mut self, market: &Market) -> Result<Offer> {
        self.ensure_negotiating()?;
        let price = market.catalog().selling_price(self.anchor)?;
        let fallback = Offer::counter(vec![self.anchor], price);
        self.history.push(HistoryEntry::Offer(fallback.clone()));
        self.status = NegotiationStatus::Rejected;
        info!("{} rejected; falling back to {} alone", self.id, self.anchor);
        Ok(fallback)
    }

    fn ensure_negotiating(&self) -> Result<()> {
        match self.status {
            NegotiationStatus::Negotiating => Ok(()),
            status => Err(BargainError::SessionClosed {
                session: self.id,
                status,
            }),
        }
    }
}

/// Keeps concurrent negotiation sessions apart over one shared market.
///
/// Closed sessions stay readable until [`end_session`](Self::end_session) or
/// [`prune_closed`](Self::prune_closed) discards them.
#[derive(Debug)]
pub struct Negotiator {
    market: Arc<Market>,
    options: NegotiationOptions,
    sessions: HashMap<SessionId, NegotiationSession>,
    next_id: u64,
}

impl Negotiator {
    pub fn new(market: Arc<Market>, options: NegotiationOptions) -> Self {
        Self {
            market,
            options,
            sessions: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn options(&self) -> &NegotiationOptions {
        &self.options
    }

    /// Opens a session for `anchor` and returns its key with the opening offer.
    pub fn start_session(&mut self, anchor: ProductId) -> Result<(SessionId, Offer)> {
        let id = SessionId(self.next_id);
        let session = NegotiationSession::open(id, &self.market, &self.options, anchor)?;
        let offer = session.last_offer().clone();
        self.next_id += 1;
        self.sessions.insert(id, session);
        Ok((id, offer))
    }

    /// Runs one negotiation round for `id`.
    pub fn advance_session(&mut self, id: SessionId, proposal: Proposal) -> Result<Offer> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(BargainError::UnknownSession { session: id })?;
        session.advance(&self.market, proposal)
    }

    /// Partners the recommender would bundle with `anchor`.
    pub fn list_suggestions(&self, anchor: ProductId) -> Result<Vec<ProductId>> {
        self.market
            .recommender()
            .suggest_partners(anchor, self.options.suggestion_count)
    }

    /// The buyer takes the standing offer of `id`.
    pub fn accept_offer(&mut self, id: SessionId) -> Result<Offer> {
        self.session_mut(id)?.accept()
    }

    /// The buyer declines further negotiation on `id`.
    pub fn reject_session(&mut self, id: SessionId) -> Result<Offer> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(BargainError::UnknownSession { session: id })?;
        session.reject(&self.market)
    }

    pub fn session(&self, id: SessionId) -> Option<&NegotiationSession> {
        self.sessions.get(&id)
    }

    /// Discards a session, returning its final state.
    pub fn end_session(&mut self, id: SessionId) -> Option<NegotiationSession> {
        self.sessions.remove(&id)
    }

    /// Discards every accepted or rejected session; returns how many were dropped.
    pub fn prune_closed(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.status() == NegotiationStatus::Negotiating);
        before - self.sessions.len()
    }

    /// Number of sessions currently held, open or closed.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut NegotiationSession> {
        self.sessions
            .get_mut(&id)
            .ok_or(BargainError::UnknownSession { session: id })
    }
}

//! Candidate counter-offers and the accept/counter decision.

use log::{debug, trace};
use rayon::prelude::*;

use crate::agent::{Agent, ProfitProfile};
use crate::catalog::ProductId;
use crate::concession::mean_and_variance;
use crate::error::{BargainError, Result};
use crate::market::Market;
use crate::offer::{same_items, Offer, Proposal};
use crate::options::BidFilter;

/// Integer prices the agent may counter with, all for the same bundle.
///
/// Prices are produced lazily in ascending order; the range is never
/// materialized, so a ceiling quoted in minor currency units stays cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct BidSpace {
    bundle: Vec<ProductId>,
    start_price: u64,
    max_cost: u64,
    window: Option<TargetWindow>,
}

/// Keeps only prices whose utility lies within `tolerance` of `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct TargetWindow {
    profile: ProfitProfile,
    target: f64,
    tolerance: f64,
}

impl TargetWindow {
    fn admits(&self, price: u64) -> bool {
        (self.profile.utility(price as f64) - self.target).abs() <= self.tolerance
    }
}

impl BidSpace {
    /// Every integer price in `start_price..=max_cost`; empty when the range is.
    pub fn enumerate(bundle: Vec<ProductId>, start_price: u64, max_cost: u64) -> Self {
        Self {
            bundle,
            start_price,
            max_cost,
            window: None,
        }
    }

    fn within_tolerance(self, profile: ProfitProfile, target: f64, tolerance: f64) -> Self {
        Self {
            window: Some(TargetWindow {
                profile,
                target,
                tolerance,
            }),
            ..self
        }
    }

    pub fn bundle(&self) -> &[ProductId] {
        &self.bundle
    }

    fn admits(&self, price: u64) -> bool {
        self.window.map_or(true, |window| window.admits(price))
    }

    /// Candidate prices, lowest first.
    pub fn prices(&self) -> impl Iterator<Item = u64> + '_ {
        (self.start_price..=self.max_cost).filter(move |price| self.admits(*price))
    }

    fn par_prices(&self) -> impl ParallelIterator<Item = u64> + '_ {
        (self.start_price..=self.max_cost)
            .into_par_iter()
            .filter(move |price| self.admits(*price))
    }

    /// Lower end of the enumerated range, before any filtering.
    pub fn start_price(&self) -> u64 {
        self.start_price
    }

    /// Upper end of the enumerated range, before any filtering.
    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }

    /// Number of candidates; counts lazily when a tolerance filter applies.
    pub fn len(&self) -> usize {
        match self.window {
            Some(_) => self.prices().count(),
            None if self.start_price > self.max_cost => 0,
            None => usize::try_from((self.max_cost - self.start_price).saturating_add(1))
                .unwrap_or(usize::MAX),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prices().next().is_none()
    }

    /// Candidates as proposals, lowest price first.
    pub fn candidates(&self) -> impl Iterator<Item = Proposal> + '_ {
        self.prices()
            .map(|price| Proposal::new(self.bundle.clone(), price as f64))
    }
}

/// Which acceptance rule let the buyer's proposal through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcceptanceRule {
    /// The proposal is worth at least the agent's own latest offer.
    MatchesLastOffer,
    /// The proposal is worth at least the mean of the agent's past offers.
    MatchesRunningMean,
    /// The proposal reaches the target utility.
    ReachesTarget,
}

/// Prefers the smaller gap to the target; equal gaps keep the lower price.
fn closer(current: (u64, f64), other: (u64, f64)) -> (u64, f64) {
    let (price, gap) = current;
    let (other_price, other_gap) = other;
    if other_gap < gap || (other_gap == gap && other_price < price) {
        other
    } else {
        current
    }
}

impl Agent {
    /// Enumerates the prices the agent may counter `proposal` with.
    ///
    /// The ceiling is the previous offer's price while the bundle is unchanged;
    /// a different bundle is re-anchored at the price of a fresh opening offer.
    /// The floor mirrors the buyer's price below the ceiling.
    pub fn build_bid_space(
        &self,
        market: &Market,
        proposal: &Proposal,
        target_utility: f64,
        previous: &Offer,
    ) -> Result<BidSpace> {
        let ceiling = if same_items(&proposal.bundle, &previous.bundle) {
            previous.cost
        } else {
            self.initial_offer_cost(market, &proposal.bundle)?
        };
        let max_cost = ceiling.max(0.0).trunc() as u64;
        let start_price = (2.0 * proposal.cost - max_cost as f64).max(0.0).ceil() as u64;

        let mut space = BidSpace::enumerate(proposal.bundle.clone(), start_price, max_cost);
        if let BidFilter::WithinTolerance(tolerance) = self.options.bid_filter {
            let profile = ProfitProfile::of(market.catalog(), &proposal.bundle)?;
            space = space.within_tolerance(profile, target_utility, tolerance);
        }

        trace!("bid space {}..={} for {:?}", start_price, max_cost, self.options.bid_filter);
        Ok(space)
    }

    /// Accepts `proposal` as-is or counters with the candidate closest to the target.
    ///
    /// The utility of the returned offer is appended to the agent's offer history.
    pub fn decide(
        &mut self,
        market: &Market,
        bid_space: &BidSpace,
        proposal: &Proposal,
        target_utility: f64,
        agent_utility: f64,
    ) -> Result<Offer> {
        if let Some(rule) = self.acceptance_rule(target_utility, agent_utility) {
            debug!("accepting {} via {:?}", proposal.cost, rule);
            self.record_offer_utility(agent_utility);
            return Ok(Offer::accepting(proposal));
        }

        let profile = ProfitProfile::of(market.catalog(), bid_space.bundle())?;
        let (price, _) = bid_space
            .par_prices()
            .map(|price| (price, (target_utility - profile.utility(price as f64)).abs()))
            .reduce_with(closer)
            .ok_or(BargainError::NoViableCounter {
                start_price: bid_space.start_price(),
                max_cost: bid_space.max_cost(),
            })?;

        let utility = profile.utility(price as f64);
        debug!(
            "countering at {} (utility {:.4}, target {:.4})",
            price, utility, target_utility
        );
        self.record_offer_utility(utility);
        Ok(Offer::counter(bid_space.bundle().to_vec(), price as f64))
    }

    /// The first acceptance rule `agent_utility` satisfies, checked in order.
    pub(crate) fn acceptance_rule(
        &self,
        target_utility: f64,
        agent_utility: f64,
    ) -> Option<AcceptanceRule> {
        if let Some(last) = self.offer_utility_history.last() {
            if *last <= agent_utility {
                return Some(AcceptanceRule::MatchesLastOffer);
            }
            let (mean, _) = mean_and_variance(&self.offer_utility_history);
            if mean <= agent_utility {
                return Some(AcceptanceRule::MatchesRunningMean);
            }
        }
        if target_utility <= agent_utility {
            return Some(AcceptanceRule::ReachesTarget);
        }
        None
    }
}

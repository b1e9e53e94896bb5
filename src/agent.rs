//! Seller agent state and its utility models.
//!
//! The agent scores a proposal two ways. Its own utility is the share of the
//! bundle's profit room the price captures: `0` sells at cost, `1` at the
//! listed price. The buyer's utility is estimated by blending the buyer's
//! observed discount (relative to their opening ask) with the co-occurrence
//! prior of the bundle, trusting the prior less as rounds go by.

use log::{debug, warn};

use crate::catalog::{Catalog, ProductId};
use crate::concession::{self, CurvePoint, Stance, FIRST_ROUND_STEP, ROUND_STEP};
use crate::error::{BargainError, Result};
use crate::market::Market;
use crate::offer::{anchor_of, Offer, Proposal};
use crate::options::{AgentOptions, InitialPricing};

/// Exponent of the round-based decay applied to the co-occurrence prior.
pub const PRIOR_DECAY_EXPONENT: f64 = 2.2;

const DEGENERATE_EPSILON: f64 = 1e-12;

/// Profit figures of one bundle, independent of the price asked for it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ProfitProfile {
    total_cost: f64,
    max_profit: f64,
    anchor_profit: f64,
}

impl ProfitProfile {
    pub(crate) fn of(catalog: &Catalog, bundle: &[ProductId]) -> Result<Self> {
        let anchor = anchor_of(bundle)?;
        let total_cost = catalog.cost_total(bundle)?;
        let max_profit = catalog.listed_total(bundle)? - total_cost;
        if max_profit.abs() < DEGENERATE_EPSILON {
            return Err(BargainError::DegenerateBundle { max_profit });
        }
        let anchor_profit = catalog.product(anchor)?.margin();
        Ok(Self {
            total_cost,
            max_profit,
            anchor_profit,
        })
    }

    /// Share of the profit room captured at `price`; not clamped.
    pub(crate) fn utility(&self, price: f64) -> f64 {
        (price - self.total_cost) / self.max_profit
    }

    /// Utility of keeping the anchor's full margin plus `margin` of the add-ons' margin.
    pub(crate) fn floor(&self, margin: f64) -> f64 {
        (self.anchor_profit + margin * (self.max_profit - self.anchor_profit)) / self.max_profit
    }
}

/// Negotiation state of the seller agent for one session.
#[derive(Clone, Debug)]
pub struct Agent {
    pub(crate) options: AgentOptions,
    first_offer_value: Option<f64>,
    time: u32,
    alpha: f64,
    min_agent_utility: f64,
    buyer_utility_history: Vec<f64>,
    pub(crate) offer_utility_history: Vec<f64>,
}

impl Agent {
    pub fn new(options: AgentOptions) -> Self {
        Self {
            first_offer_value: None,
            time: 0,
            alpha: options.initial_alpha,
            min_agent_utility: 1.0,
            buyer_utility_history: Vec::new(),
            offer_utility_history: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    /// Rounds in which the agent has produced an offer.
    pub fn time(&self) -> u32 {
        self.time
    }

    /// Current concession elasticity.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Floor computed by the latest [`agent_utility`](Self::agent_utility) call.
    pub fn min_agent_utility(&self) -> f64 {
        self.min_agent_utility
    }

    /// Discount ratio of the buyer's first counter-offer, once seen.
    pub fn first_offer_value(&self) -> Option<f64> {
        self.first_offer_value
    }

    pub fn buyer_utility_history(&self) -> &[f64] {
        &self.buyer_utility_history
    }

    pub fn offer_utility_history(&self) -> &[f64] {
        &self.offer_utility_history
    }

    /// Opponent model: how favorable `proposal` is to the buyer.
    ///
    /// The first call records the proposal's discount ratio as the baseline;
    /// a zero or non-finite baseline is refused and not recorded.
    pub fn estimate_buyer_utility(&mut self, market: &Market, proposal: &Proposal) -> Result<f64> {
        let listed = market.catalog().listed_total(&proposal.bundle)?;
        let discount_ratio = (listed - proposal.cost) / listed;

        let baseline = match self.first_offer_value {
            Some(baseline) => baseline,
            None => {
                if !discount_ratio.is_finite() || discount_ratio.abs() < DEGENERATE_EPSILON {
                    warn!("opening counter-offer of {} carries no discount", proposal.cost);
                    return Err(BargainError::DegenerateOpeningOffer);
                }
                self.first_offer_value = Some(discount_ratio);
                discount_ratio
            }
        };

        let observed = discount_ratio / baseline;
        let prior = market.matrix().prior_signal(&proposal.bundle)?;
        let learning_rate = f64::from(self.time.max(1)).powf(-PRIOR_DECAY_EXPONENT);
        Ok((1.0 - learning_rate) * observed + learning_rate * prior)
    }

    /// The agent's own utility for `proposal`; also refreshes the utility floor.
    pub fn agent_utility(&mut self, market: &Market, proposal: &Proposal) -> Result<f64> {
        let profile = ProfitProfile::of(market.catalog(), &proposal.bundle)?;
        self.min_agent_utility = profile.floor(self.options.min_profit_margin);
        Ok(profile.utility(proposal.cost))
    }

    /// Utility of an arbitrary bundle and price, leaving the floor untouched.
    pub fn utility_of(&self, market: &Market, bundle: &[ProductId], price: f64) -> Result<f64> {
        Ok(ProfitProfile::of(market.catalog(), bundle)?.utility(price))
    }

    /// Adapts `alpha` to the buyer's stance and returns the next target utility.
    pub fn next_target_utility(&mut self, buyer_utility: f64) -> f64 {
        let step = if self.buyer_utility_history.is_empty() {
            FIRST_ROUND_STEP
        } else {
            let stance = Stance::classify(buyer_utility, &self.buyer_utility_history);
            let alpha = concession::adjust_alpha(self.alpha, stance, &self.options);
            debug!(
                "buyer stance {:?}/{:?}: alpha {:.3} -> {:.3}",
                stance.cooperativeness, stance.assertiveness, self.alpha, alpha
            );
            self.alpha = alpha;
            ROUND_STEP
        };

        let target = concession::target_utility(
            CurvePoint {
                min_agent_utility: self.min_agent_utility,
                buyer_utility,
                time: self.time,
                step,
                alpha: self.alpha,
            },
            &self.options,
        );

        self.time += 1;
        self.buyer_utility_history.push(buyer_utility);
        target
    }

    /// Price of an opening offer for `bundle` without advancing the round counter.
    pub fn initial_offer_cost(&self, market: &Market, bundle: &[ProductId]) -> Result<f64> {
        let catalog = market.catalog();
        let anchor = anchor_of(bundle)?;
        let anchor_price = catalog.selling_price(anchor)?;
        let prior = market.matrix().prior_signal(bundle)?;

        let priced = match self.options.initial_pricing {
            InitialPricing::FullBundle => bundle,
            InitialPricing::AddOnsOnly => &bundle[..bundle.len() - 1],
        };
        let listed = catalog.listed_total(priced)?;
        let cost = catalog.cost_total(priced)?;

        let rate = (1.0 - prior).min(self.options.max_initial_discount_rate);
        let discount = rate * (listed - cost);
        Ok(listed - discount + anchor_price)
    }

    /// Opening offer for `bundle` (partners first, anchor last).
    pub fn build_initial_offer(&mut self, market: &Market, bundle: Vec<ProductId>) -> Result<Offer> {
        let cost = self.initial_offer_cost(market, &bundle)?;
        self.time += 1;
        Ok(Offer::counter(bundle, cost))
    }

    pub(crate) fn record_offer_utility(&mut self, utility: f64) {
        self.offer_utility_history.push(utility);
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new(AgentOptions::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::cooccurrence::CoOccurrenceMatrix;

    pub(crate) const A: ProductId = ProductId(0);
    pub(crate) const B: ProductId = ProductId(1);

    /// A sells 100 (cost 40), B sells 50 (cost 20); they co-occur 8 of 10 times.
    pub(crate) fn market() -> Market {
        let catalog = Catalog::builder()
            .product("A", 100.0, 40.0)
            .product("B", 50.0, 20.0)
            .build()
            .unwrap();
        let matrix = CoOccurrenceMatrix::from_row_slice(2, &[10.0, 8.0, 8.0, 10.0]).unwrap();
        Market::new(catalog, matrix).unwrap()
    }

    #[test]
    fn agent_utility_is_share_of_profit_room() {
        let market = market();
        let mut agent = Agent::default();
        let utility = agent
            .agent_utility(&market, &Proposal::new(vec![B, A], 120.0))
            .unwrap();
        assert_eq!(utility, (120.0 - 60.0) / (150.0 - 60.0));
        assert_relative_eq!(agent.min_agent_utility(), 69.0 / 90.0, epsilon = 1e-12);
    }

    #[test]
    fn agent_utility_is_not_clamped() {
        let market = market();
        let mut agent = Agent::default();
        let above = agent
            .agent_utility(&market, &Proposal::new(vec![B, A], 240.0))
            .unwrap();
        let below = agent
            .agent_utility(&market, &Proposal::new(vec![B, A], 30.0))
            .unwrap();
        assert!(above > 1.0);
        assert!(below < 0.0);
    }

    #[test]
    fn floor_rises_with_min_profit_margin() {
        let market = market();
        let proposal = Proposal::new(vec![B, A], 120.0);
        let mut previous = f64::NEG_INFINITY;
        for margin in [0.0, 0.1, 0.3, 0.5, 0.9, 1.0] {
            let mut agent = Agent::new(AgentOptions::default().with_min_profit_margin(margin));
            agent.agent_utility(&market, &proposal).unwrap();
            assert!(agent.min_agent_utility() >= previous);
            previous = agent.min_agent_utility();
        }
    }

    #[test]
    fn bundle_without_profit_room_is_degenerate() {
        let catalog = Catalog::builder()
            .product("A", 40.0, 40.0)
            .build()
            .unwrap();
        let matrix = CoOccurrenceMatrix::from_row_slice(1, &[1.0]).unwrap();
        let market = Market::new(catalog, matrix).unwrap();
        let result = Agent::default().agent_utility(&market, &Proposal::new(vec![A], 40.0));
        assert!(matches!(result, Err(BargainError::DegenerateBundle { .. })));
    }

    #[test]
    fn opening_counter_sets_the_baseline() {
        let market = market();
        let mut agent = Agent::default();
        agent.build_initial_offer(&market, vec![B, A]).unwrap();

        // time is 1, so the estimate is entirely the co-occurrence prior
        let utility = agent
            .estimate_buyer_utility(&market, &Proposal::new(vec![B, A], 120.0))
            .unwrap();
        assert_relative_eq!(utility, 0.8, epsilon = 1e-12);
        assert_relative_eq!(agent.first_offer_value().unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn observed_signal_takes_over_in_later_rounds() {
        let market = market();
        let mut agent = Agent::default();
        agent.build_initial_offer(&market, vec![B, A]).unwrap();
        agent
            .estimate_buyer_utility(&market, &Proposal::new(vec![B, A], 120.0))
            .unwrap();
        agent.next_target_utility(0.8);

        let utility = agent
            .estimate_buyer_utility(&market, &Proposal::new(vec![B, A], 130.0))
            .unwrap();
        let learning_rate = 2.0_f64.powf(-2.2);
        let observed = (20.0 / 150.0) / 0.2;
        assert_relative_eq!(
            utility,
            (1.0 - learning_rate) * observed + learning_rate * 0.8,
            epsilon = 1e-12
        );
    }

    #[test]
    fn zero_discount_opening_is_refused_and_not_recorded() {
        let market = market();
        let mut agent = Agent::default();
        let result = agent.estimate_buyer_utility(&market, &Proposal::new(vec![B, A], 150.0));
        assert!(matches!(result, Err(BargainError::DegenerateOpeningOffer)));
        assert_eq!(agent.first_offer_value(), None);
    }

    #[test]
    fn non_finite_opening_is_refused_and_not_recorded() {
        let market = market();
        for cost in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut agent = Agent::default();
            let result = agent.estimate_buyer_utility(&market, &Proposal::new(vec![B, A], cost));
            assert!(matches!(result, Err(BargainError::DegenerateOpeningOffer)));
            assert_eq!(agent.first_offer_value(), None);
        }
    }

    #[test]
    fn initial_offer_inflates_by_anchor_price() {
        let market = market();
        let mut agent = Agent::default();
        let offer = agent.build_initial_offer(&market, vec![B, A]).unwrap();
        // discount = min(1 - 0.8, 0.1) * (150 - 60) = 9
        assert_relative_eq!(offer.cost, 150.0 - 9.0 + 100.0, epsilon = 1e-9);
        assert!(!offer.accepted);
        assert_eq!(agent.time(), 1);
    }

    #[test]
    fn add_on_pricing_discounts_only_partners() {
        let market = market();
        let options = AgentOptions::default().with_initial_pricing(InitialPricing::AddOnsOnly);
        let agent = Agent::new(options);
        let cost = agent.initial_offer_cost(&market, &[B, A]).unwrap();
        // discount = 0.1 * (50 - 20) = 3
        assert_relative_eq!(cost, 50.0 - 3.0 + 100.0, epsilon = 1e-9);
        assert_eq!(agent.time(), 0);
    }

    #[test]
    fn first_target_uses_first_round_step() {
        let market = market();
        let mut agent = Agent::default();
        agent.build_initial_offer(&market, vec![B, A]).unwrap();
        agent
            .agent_utility(&market, &Proposal::new(vec![B, A], 120.0))
            .unwrap();
        let target = agent.next_target_utility(0.8);

        let floor = 69.0 / 90.0;
        let expected = floor + (1.0 - floor) * (1.0 - 1.3 * 0.8 * 0.7_f64.powf(1.0 / 0.4));
        assert_relative_eq!(target, expected, epsilon = 1e-12);
        assert_eq!(agent.time(), 2);
        assert_eq!(agent.buyer_utility_history(), &[0.8]);
        assert_eq!(agent.alpha(), 0.4);
    }
}

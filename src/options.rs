//! Negotiation configuration, fixed when a session is created.

/// How the candidate counter-offers are pruned before selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BidFilter {
    /// Keep every integer price between the floor and the ceiling.
    Unfiltered,
    /// Keep only prices whose agent utility lies within the given distance of the target.
    WithinTolerance(f64),
}

/// How the opening offer's price is assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitialPricing {
    /// Discount the listed total of the whole bundle, then add the anchor's selling price on top.
    FullBundle,
    /// Discount only the add-ons, then add the anchor's selling price.
    AddOnsOnly,
}

/// Parameters of the seller agent's utility and concession model.
#[derive(Clone, Debug)]
pub struct AgentOptions {
    /// Upper bound on the discount ratio granted in the opening offer.
    pub max_initial_discount_rate: f64,
    /// Share of the add-on profit the agent insists on keeping.
    pub min_profit_margin: f64,
    /// Offset of the round clock in the concession curve.
    pub rounds_weight: f64,
    /// Concession elasticity at session start.
    pub initial_alpha: f64,
    /// Lowest value `alpha` may take.
    pub alpha_floor: f64,
    /// Highest value `alpha` may take.
    pub alpha_ceiling: f64,
    /// Weight of the buyer's utility in the concession curve.
    pub decay_factor: f64,
    /// Candidate pruning applied to each bid space.
    pub bid_filter: BidFilter,
    /// Arithmetic used for the opening offer.
    pub initial_pricing: InitialPricing,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_initial_discount_rate: 0.1,
            min_profit_margin: 0.3,
            rounds_weight: 0.6,
            initial_alpha: 0.4,
            alpha_floor: 0.3,
            alpha_ceiling: 1.0,
            decay_factor: 1.3,
            bid_filter: BidFilter::Unfiltered,
            initial_pricing: InitialPricing::FullBundle,
        }
    }
}

impl AgentOptions {
    /// Override the cap on the opening discount.
    pub fn with_max_initial_discount_rate(mut self, rate: f64) -> Self {
        self.max_initial_discount_rate = rate;
        self
    }

    /// Override the minimum profit margin that drives the utility floor.
    pub fn with_min_profit_margin(mut self, margin: f64) -> Self {
        self.min_profit_margin = margin;
        self
    }

    /// Override the rounds weight of the concession curve.
    pub fn with_rounds_weight(mut self, weight: f64) -> Self {
        self.rounds_weight = weight;
        self
    }

    /// Set the starting elasticity, clamped into the current bounds.
    pub fn with_initial_alpha(mut self, alpha: f64) -> Self {
        self.initial_alpha = alpha.clamp(self.alpha_floor, self.alpha_ceiling);
        self
    }

    /// Set the range `alpha` is kept within. Bounds are reordered if given backwards.
    pub fn with_alpha_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.alpha_floor = floor.min(ceiling);
        self.alpha_ceiling = floor.max(ceiling);
        self.initial_alpha = self.initial_alpha.clamp(self.alpha_floor, self.alpha_ceiling);
        self
    }

    /// Restrict counter-offers to those near the target utility.
    pub fn with_bid_filter(mut self, filter: BidFilter) -> Self {
        self.bid_filter = filter;
        self
    }

    /// Choose the opening offer arithmetic.
    pub fn with_initial_pricing(mut self, pricing: InitialPricing) -> Self {
        self.initial_pricing = pricing;
        self
    }
}

/// Session-level configuration used by the [`Negotiator`](crate::Negotiator).
#[derive(Clone, Debug)]
pub struct NegotiationOptions {
    /// Parameters for each session's agent.
    pub agent: AgentOptions,
    /// Number of recommended partners bundled with the anchor.
    pub suggestion_count: usize,
    /// Mark a counter as accepted when it does not exceed the buyer's own proposal.
    pub accept_when_counter_meets_proposal: bool,
}

impl Default for NegotiationOptions {
    fn default() -> Self {
        Self {
            agent: AgentOptions::default(),
            suggestion_count: crate::recommender::DEFAULT_SUGGESTIONS,
            accept_when_counter_meets_proposal: true,
        }
    }
}

impl NegotiationOptions {
    /// Override the agent settings while preserving other defaults.
    pub fn with_agent(mut self, agent: AgentOptions) -> Self {
        self.agent = agent;
        self
    }

    /// Set how many partners the recommender adds to the opening bundle.
    pub fn with_suggestion_count(mut self, count: usize) -> Self {
        self.suggestion_count = count;
        self
    }

    /// Enable or disable accepting counters that meet the buyer's price.
    pub fn with_counter_meets_proposal(mut self, accept: bool) -> Self {
        self.accept_when_counter_meets_proposal = accept;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_bounds_are_ordered_and_initial_alpha_clamped() {
        let options = AgentOptions::default()
            .with_alpha_bounds(0.9, 0.5)
            .with_initial_alpha(0.2);
        assert_eq!(options.alpha_floor, 0.5);
        assert_eq!(options.alpha_ceiling, 0.9);
        assert_eq!(options.initial_alpha, 0.5);
    }
}

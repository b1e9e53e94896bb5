//! Adaptive concession curve.
//!
//! Every round after the first, the buyer's latest utility is compared with the
//! running statistics of the previous rounds to read how cooperative and how
//! assertive the buyer is being. That reading nudges the elasticity `alpha`,
//! which in turn bends the curve that maps buyer utility and elapsed rounds to
//! the agent's next target utility.

use std::cmp::Ordering;

use nalgebra::DVector;

use crate::options::AgentOptions;

/// Round-clock step used on the very first concession.
pub const FIRST_ROUND_STEP: f64 = 0.1;
/// Round-clock step used on every later concession.
pub const ROUND_STEP: f64 = 0.08;

const ALPHA_RAISE: f64 = 0.15;
const ALPHA_EASE: f64 = 0.05;
const ALPHA_DROP: f64 = 0.25;

/// How the buyer's latest utility sits against their running mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cooperativeness {
    Cooperative,
    Neutral,
    Uncooperative,
}

/// How far the buyer's latest utility strays compared with the running variance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assertiveness {
    Passive,
    Neutral,
    Assertive,
}

/// The buyer's behaviour in one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stance {
    pub cooperativeness: Cooperativeness,
    pub assertiveness: Assertiveness,
}

impl Stance {
    /// Reads the buyer's stance from `buyer_utility` against the earlier `history`.
    pub fn classify(buyer_utility: f64, history: &[f64]) -> Self {
        let (mean, variance) = mean_and_variance(history);
        let deviation = (buyer_utility - mean).powi(2);

        let cooperativeness = match buyer_utility.partial_cmp(&mean) {
            Some(Ordering::Greater) => Cooperativeness::Uncooperative,
            Some(Ordering::Less) => Cooperativeness::Cooperative,
            _ => Cooperativeness::Neutral,
        };
        let assertiveness = match deviation.partial_cmp(&variance) {
            Some(Ordering::Less) => Assertiveness::Passive,
            Some(Ordering::Greater) => Assertiveness::Assertive,
            _ => Assertiveness::Neutral,
        };

        Self {
            cooperativeness,
            assertiveness,
        }
    }
}

/// Applies exactly one elasticity rule for `stance`, keeping the result in bounds.
pub fn adjust_alpha(alpha: f64, stance: Stance, options: &AgentOptions) -> f64 {
    let adjusted = match (stance.cooperativeness, stance.assertiveness) {
        (Cooperativeness::Cooperative, Assertiveness::Passive) => alpha + ALPHA_RAISE,
        (Cooperativeness::Neutral, Assertiveness::Neutral) => alpha - ALPHA_EASE,
        _ => alpha - ALPHA_DROP,
    };
    adjusted.clamp(options.alpha_floor, options.alpha_ceiling)
}

/// Inputs of the concession curve for one round.
#[derive(Clone, Copy, Debug)]
pub struct CurvePoint {
    /// Utility floor the agent will not go below.
    pub min_agent_utility: f64,
    /// Buyer utility, already clamped to at most one.
    pub buyer_utility: f64,
    /// Round counter before this round's increment.
    pub time: u32,
    /// [`FIRST_ROUND_STEP`] or [`ROUND_STEP`].
    pub step: f64,
    pub alpha: f64,
}

/// `floor + (1 - floor) * (1 - decay * u_b * min(w + t * step, 1)^(1 / alpha))`
pub fn target_utility(point: CurvePoint, options: &AgentOptions) -> f64 {
    let clock = (options.rounds_weight + f64::from(point.time) * point.step).min(1.0);
    let pressure = clock.powf(1.0 / point.alpha);
    point.min_agent_utility
        + (1.0 - point.min_agent_utility)
            * (1.0 - options.decay_factor * point.buyer_utility * pressure)
}

/// Mean and population variance; both zero for an empty history.
///
/// Variance is the mean squared deviation, so a constant history is exactly zero.
pub(crate) fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let values = DVector::from_column_slice(values);
    let mean = values.mean();
    let variance = values.add_scalar(-mean).norm_squared() / values.len() as f64;
    (mean, variance)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cooperative_and_passive_buyer_raises_alpha() {
        let stance = Stance::classify(0.4, &[0.2, 0.8]);
        assert_eq!(stance.cooperativeness, Cooperativeness::Cooperative);
        assert_eq!(stance.assertiveness, Assertiveness::Passive);

        let alpha = adjust_alpha(0.4, stance, &AgentOptions::default());
        assert_relative_eq!(alpha, 0.55, epsilon = 1e-12);
    }

    #[test]
    fn steady_buyer_eases_alpha() {
        let stance = Stance::classify(0.5, &[0.5]);
        assert_eq!(stance.cooperativeness, Cooperativeness::Neutral);
        assert_eq!(stance.assertiveness, Assertiveness::Neutral);

        let alpha = adjust_alpha(0.4, stance, &AgentOptions::default());
        assert_relative_eq!(alpha, 0.35, epsilon = 1e-12);
    }

    #[test]
    fn any_other_stance_drops_alpha_to_the_floor() {
        let stance = Stance::classify(0.9, &[0.2, 0.3]);
        assert_eq!(stance.cooperativeness, Cooperativeness::Uncooperative);
        assert_eq!(stance.assertiveness, Assertiveness::Assertive);
        assert_eq!(adjust_alpha(0.4, stance, &AgentOptions::default()), 0.3);
    }

    #[test]
    fn alpha_is_capped_at_the_ceiling() {
        let stance = Stance {
            cooperativeness: Cooperativeness::Cooperative,
            assertiveness: Assertiveness::Passive,
        };
        assert_eq!(adjust_alpha(0.95, stance, &AgentOptions::default()), 1.0);
    }

    #[test]
    fn target_matches_curve_on_first_round() {
        let options = AgentOptions::default();
        let point = CurvePoint {
            min_agent_utility: 0.5,
            buyer_utility: 0.8,
            time: 1,
            step: FIRST_ROUND_STEP,
            alpha: 0.4,
        };
        let expected = 0.5 + 0.5 * (1.0 - 1.3 * 0.8 * 0.7_f64.powf(2.5));
        assert_relative_eq!(target_utility(point, &options), expected, epsilon = 1e-12);
    }

    #[test]
    fn clock_saturates_at_one() {
        let options = AgentOptions::default();
        let point = CurvePoint {
            min_agent_utility: 0.2,
            buyer_utility: 0.5,
            time: 40,
            step: ROUND_STEP,
            alpha: 0.3,
        };
        let expected = 0.2 + 0.8 * (1.0 - 1.3 * 0.5);
        assert_relative_eq!(target_utility(point, &options), expected, epsilon = 1e-12);
    }
}

//! The AI seat's betting policy: equity plus pot geometry in, one action out.

use crate::state::{Action, Chips};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tunable thresholds of the AI policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// At or below this equity the AI only continues as a bluff.
    pub fold_threshold: f64,
    /// Minimum equity for a plain call.
    pub call_threshold: f64,
    /// At or above this equity the AI bets or raises for value.
    pub raise_threshold: f64,
    /// Chance of betting a weak hand when checked to.
    pub bluff_probability: f64,
    /// Chance of raising a hand that is only priced in to call.
    pub defend_bluff_probability: f64,
    pub big_blind: Chips,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            fold_threshold: 0.30,
            call_threshold: 0.45,
            raise_threshold: 0.75,
            bluff_probability: 0.20,
            defend_bluff_probability: 0.10,
            big_blind: 20.0,
        }
    }
}

/// An action and the chips it moves (0 for Check and Fold).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub amount: Chips,
}

impl Decision {
    fn check() -> Self {
        Decision { action: Action::Check, amount: 0.0 }
    }

    fn fold() -> Self {
        Decision { action: Action::Fold, amount: 0.0 }
    }

    fn call(amount: Chips) -> Self {
        Decision { action: Action::Call, amount }
    }

    fn bet(amount: Chips) -> Self {
        Decision { action: Action::Bet(amount), amount }
    }

    fn raise(amount: Chips) -> Self {
        Decision { action: Action::Raise(amount), amount }
    }
}

impl PolicyConfig {
    pub fn min_raise(&self, to_call: Chips) -> Chips {
        self.big_blind.max(2.0 * to_call)
    }

    /// Picks the AI's action.
    ///
    /// Bluff rolls come from `rng`, one independent draw per roll, and no
    /// amount ever exceeds `stack`.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        equity: f64,
        pot: Chips,
        to_call: Chips,
        stack: Chips,
        rng: &mut R,
    ) -> Decision {
        let min_raise = self.min_raise(to_call);

        if to_call <= 0.0 {
            // first to act on the street
            let sized = |fraction: f64| (fraction * pot).max(min_raise).min(stack);
            if equity >= self.raise_threshold {
                return Decision::bet(sized(0.75));
            }
            if equity <= self.fold_threshold && roll(rng, self.bluff_probability) {
                return Decision::bet(sized(0.50));
            }
            return Decision::check();
        }

        let required_equity = to_call / (pot + to_call);
        // a stack that cannot cover the bet has no raise left, only the all-in call
        let raise = || {
            if stack > to_call {
                Decision::raise((3.0 * to_call).max(min_raise).min(stack))
            } else {
                Decision::call(stack)
            }
        };

        if equity >= self.raise_threshold {
            raise()
        } else if equity >= required_equity && equity >= self.call_threshold {
            Decision::call(to_call.min(stack))
        } else if equity >= required_equity && roll(rng, self.defend_bluff_probability) {
            raise()
        } else {
            Decision::fold()
        }
    }
}

fn roll<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.random::<f64>() < probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn always_bluff() -> PolicyConfig {
        PolicyConfig { bluff_probability: 1.0, defend_bluff_probability: 1.0, ..PolicyConfig::default() }
    }

    fn never_bluff() -> PolicyConfig {
        PolicyConfig { bluff_probability: 0.0, defend_bluff_probability: 0.0, ..PolicyConfig::default() }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn test_value_bet_when_checked_to() {
        let d = never_bluff().decide(0.8, 100.0, 0.0, 1000.0, &mut rng());
        assert_eq!(d, Decision { action: Action::Bet(75.0), amount: 75.0 });

        let short = never_bluff().decide(0.8, 100.0, 0.0, 50.0, &mut rng());
        assert_eq!(short.action, Action::Bet(50.0));
    }

    #[test]
    fn test_bluff_or_check_with_weak_hand() {
        let bluff = always_bluff().decide(0.2, 100.0, 0.0, 1000.0, &mut rng());
        assert_eq!(bluff.action, Action::Bet(50.0));

        let check = never_bluff().decide(0.2, 100.0, 0.0, 1000.0, &mut rng());
        assert_eq!(check, Decision { action: Action::Check, amount: 0.0 });

        // medium hands never bluff
        let medium = always_bluff().decide(0.5, 100.0, 0.0, 1000.0, &mut rng());
        assert_eq!(medium.action, Action::Check);
    }

    #[test]
    fn test_small_pot_bet_is_floored_at_big_blind() {
        let d = never_bluff().decide(0.9, 16.0, 0.0, 1000.0, &mut rng());
        assert_eq!(d.action, Action::Bet(20.0));
    }

    #[test]
    fn test_value_raise_sizing() {
        let d = never_bluff().decide(0.8, 100.0, 20.0, 1000.0, &mut rng());
        assert_eq!(d, Decision { action: Action::Raise(60.0), amount: 60.0 });

        // 3x is capped by the stack, the min raise floor never overcommits
        let short = never_bluff().decide(0.8, 100.0, 20.0, 30.0, &mut rng());
        assert_eq!(short.action, Action::Raise(30.0));
    }

    #[test]
    fn test_short_stack_calls_instead_of_raising() {
        let d = never_bluff().decide(0.9, 600.0, 500.0, 100.0, &mut rng());
        assert_eq!(d, Decision { action: Action::Call, amount: 100.0 });

        let defend = always_bluff().decide(0.4, 1000.0, 100.0, 100.0, &mut rng());
        assert_eq!(defend, Decision { action: Action::Call, amount: 100.0 });
    }

    #[test]
    fn test_call_at_exact_pot_odds() {
        // required equity = 50 / (50 + 50) = 0.5, above the call threshold
        let d = never_bluff().decide(0.5, 50.0, 50.0, 1000.0, &mut rng());
        assert_eq!(d, Decision { action: Action::Call, amount: 50.0 });
    }

    #[test]
    fn test_fold_without_odds() {
        let d = always_bluff().decide(0.4, 50.0, 50.0, 1000.0, &mut rng());
        assert_eq!(d, Decision { action: Action::Fold, amount: 0.0 });
    }

    #[test]
    fn test_priced_in_but_weak_hand() {
        // required equity = 10 / 110, equity clears it but not the call threshold
        let defend = always_bluff().decide(0.4, 100.0, 10.0, 1000.0, &mut rng());
        assert_eq!(defend.action, Action::Raise(30.0));

        let give_up = never_bluff().decide(0.4, 100.0, 10.0, 1000.0, &mut rng());
        assert_eq!(give_up.action, Action::Fold);
    }

    #[test]
    fn test_call_is_capped_by_stack() {
        let d = never_bluff().decide(0.6, 500.0, 400.0, 100.0, &mut rng());
        assert_eq!(d, Decision { action: Action::Call, amount: 100.0 });
    }

    #[test]
    fn test_bluff_frequency_follows_probability() {
        let policy = PolicyConfig::default();
        let mut rng = StdRng::seed_from_u64(2025);
        let bluffs = (0..10_000)
            .filter(|_| matches!(policy.decide(0.1, 100.0, 0.0, 1000.0, &mut rng).action, Action::Bet(_)))
            .count();
        let rate = bluffs as f64 / 10_000.0;
        assert!((0.18..0.22).contains(&rate), "rate={rate}");
    }
}

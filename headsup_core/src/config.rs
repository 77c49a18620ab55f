use crate::equity::{DEFAULT_SIMULATIONS, MAX_SIMULATIONS};
use crate::error::GameError;
use crate::policy::PolicyConfig;
use crate::state::Chips;
use serde::{Deserialize, Serialize};

/// Settings of one heads-up match. Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Chips each seat starts with, and gets back on reset.
    pub initial_stack: Chips,
    pub big_blind: Chips,
    /// Monte Carlo budget for preflop and flop estimates.
    pub simulations: usize,
    /// Equity the AI assumes preflop instead of sampling. `None` samples.
    pub preflop_equity: Option<f64>,
    pub policy: PolicyConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            initial_stack: 1000.0,
            big_blind: 20.0,
            simulations: DEFAULT_SIMULATIONS,
            preflop_equity: Some(0.5),
            policy: PolicyConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Policy thresholds with the minimum raise tied to this match's big blind.
    pub fn policy(&self) -> PolicyConfig {
        PolicyConfig { big_blind: self.big_blind, ..self.policy }
    }

    /// Rejects settings a match cannot be played with.
    pub fn validate(&self) -> Result<(), GameError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(GameError::InvalidConfig(format!("{} must be positive, got {}", name, v)))
            }
        };
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(GameError::InvalidConfig(format!("{} must lie in [0, 1], got {}", name, v)))
            }
        };

        positive("initial_stack", self.initial_stack)?;
        positive("big_blind", self.big_blind)?;
        if self.simulations > MAX_SIMULATIONS {
            return Err(GameError::InvalidConfig(format!(
                "simulations must not exceed {}, got {}",
                MAX_SIMULATIONS, self.simulations
            )));
        }
        if let Some(equity) = self.preflop_equity {
            unit("preflop_equity", equity)?;
        }
        let policy = &self.policy;
        unit("fold_threshold", policy.fold_threshold)?;
        unit("call_threshold", policy.call_threshold)?;
        unit("bluff_probability", policy.bluff_probability)?;
        unit("defend_bluff_probability", policy.defend_bluff_probability)?;
        // above 1 disables value raises
        if policy.raise_threshold.is_nan() || policy.raise_threshold < 0.0 {
            return Err(GameError::InvalidConfig(format!(
                "raise_threshold must not be negative, got {}",
                policy.raise_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MatchConfig = serde_json::from_str(r#"{"big_blind": 50.0, "preflop_equity": null}"#).unwrap();
        assert_eq!(config.big_blind, 50.0);
        assert_eq!(config.initial_stack, 1000.0);
        assert_eq!(config.preflop_equity, None);
        assert_eq!(config.policy().big_blind, 50.0);
        assert_eq!(config.policy().raise_threshold, 0.75);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_unplayable_configs() {
        let bad = [
            MatchConfig { big_blind: -20.0, ..MatchConfig::default() },
            MatchConfig { big_blind: 0.0, ..MatchConfig::default() },
            MatchConfig { initial_stack: 0.0, ..MatchConfig::default() },
            MatchConfig { initial_stack: f64::INFINITY, ..MatchConfig::default() },
            MatchConfig { big_blind: f64::NAN, ..MatchConfig::default() },
            MatchConfig { preflop_equity: Some(1.5), ..MatchConfig::default() },
            MatchConfig { simulations: MAX_SIMULATIONS + 1, ..MatchConfig::default() },
            MatchConfig {
                policy: PolicyConfig { bluff_probability: -0.1, ..PolicyConfig::default() },
                ..MatchConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))), "{:?}", config);
        }

        let passive = MatchConfig {
            preflop_equity: None,
            policy: PolicyConfig { raise_threshold: 2.0, ..PolicyConfig::default() },
            ..MatchConfig::default()
        };
        assert_eq!(passive.validate(), Ok(()));
    }
}

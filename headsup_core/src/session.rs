//! One human-vs-AI match: the state machine plus the AI seat that answers
//! every player action, street advancement and showdown.

use crate::card::{Card, Hand};
use crate::config::MatchConfig;
use crate::equity::{EquityEstimate, EquityEstimator};
use crate::error::GameError;
use crate::eval::{HandScorer, RankEvaluator};
use crate::policy::{Decision, PolicyConfig};
use crate::state::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

/// A match between the human seat (`Seat::Player`) and the AI seat.
///
/// Dealing, equity sampling and bluff rolls each draw from their own
/// generator so a test can pin one concern without touching the others.
#[derive(Debug, Clone)]
pub struct Session<S = RankEvaluator> {
    config: MatchConfig,
    policy: PolicyConfig,
    state: MatchState,
    estimator: EquityEstimator<S>,
    deal_rng: StdRng,
    sample_rng: StdRng,
    bluff_rng: StdRng,
}

impl Session<RankEvaluator> {
    /// A match seeded from the thread-local generator.
    pub fn new(config: MatchConfig) -> Self {
        let mut entropy = rand::rng();
        Session::with_parts(
            config,
            RankEvaluator,
            StdRng::from_rng(&mut entropy),
            StdRng::from_rng(&mut entropy),
            StdRng::from_rng(&mut entropy),
        )
    }

    /// A match from settings received over the wire, checked first.
    pub fn try_new(config: MatchConfig) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Session::new(config))
    }

    /// A reproducible match.
    pub fn seeded(config: MatchConfig, seed: u64) -> Self {
        Session::with_parts(
            config,
            RankEvaluator,
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
            StdRng::seed_from_u64(seed.wrapping_add(2)),
        )
    }
}

impl<S: HandScorer> Session<S> {
    pub fn with_parts(
        config: MatchConfig,
        scorer: S,
        deal_rng: StdRng,
        sample_rng: StdRng,
        bluff_rng: StdRng,
    ) -> Self {
        Session {
            policy: config.policy(),
            state: MatchState::new(config.initial_stack, config.big_blind),
            estimator: EquityEstimator::with_scorer(scorer, config.simulations),
            config,
            deal_rng,
            sample_rng,
            bluff_rng,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn start_hand(&mut self) -> Result<Vec<HandEvent>, GameError> {
        self.state.start_hand(&mut self.deal_rng)
    }

    /// Restores both stacks to the configured starting stack.
    pub fn reset(&mut self) {
        self.state.reset(self.config.initial_stack);
    }

    /// Applies the human seat's action and plays the AI's reply.
    ///
    /// When betting on a street closes the next street is dealt, or the hand
    /// is shown down after the river.
    pub fn player_act(&mut self, action: Action) -> Result<Vec<HandEvent>, GameError> {
        let mut events = self.state.apply(Seat::Player, action)?;
        if !self.state.hand_active() {
            return Ok(events);
        }

        match action {
            Action::Call => self.close_street(&mut events)?,
            Action::Check | Action::Bet(_) | Action::Raise(_) => self.ai_turn(&mut events)?,
            Action::Fold => {}
        }
        Ok(events)
    }

    /// The human seat's equity on the current board.
    pub fn player_equity(&mut self) -> Result<EquityEstimate, GameError> {
        let hand = self
            .state
            .player_hand
            .ok_or_else(|| GameError::InvalidAction("no cards dealt yet".to_string()))?;
        self.estimator.estimate_with_rng(&hand, &self.state.board, &mut self.sample_rng)
    }

    /// The AI always answers: a policy action the state machine refuses is
    /// replaced by a check, or a call when facing a bet.
    fn ai_turn(&mut self, events: &mut Vec<HandEvent>) -> Result<(), GameError> {
        let fallback = if self.state.to_call > 0.0 { Action::Call } else { Action::Check };
        let action = match self.ai_decide() {
            Ok(decision) => decision.action,
            Err(e) => {
                warn!(error = %e, "ai could not decide");
                fallback
            }
        };
        let (action, reply) = match self.state.apply(Seat::Ai, action) {
            Ok(reply) => (action, reply),
            Err(e) => {
                warn!(%action, error = %e, "ai action rejected");
                (fallback, self.state.apply(Seat::Ai, fallback)?)
            }
        };
        events.extend(reply);
        if !self.state.hand_active() {
            return Ok(());
        }
        match action {
            // the player already acted on this street
            Action::Check | Action::Call => self.close_street(events),
            // the player has to answer
            Action::Bet(_) | Action::Raise(_) | Action::Fold => Ok(()),
        }
    }

    fn ai_decide(&mut self) -> Result<Decision, GameError> {
        let (pot, to_call, stack) = (self.state.pot, self.state.to_call, self.state.ai_stack);
        // an all-in seat has nothing left to decide
        if stack <= 0.0 {
            let action = if to_call > 0.0 { Action::Call } else { Action::Check };
            return Ok(Decision { action, amount: 0.0 });
        }

        let equity = self.ai_equity()?;
        let decision = self.policy.decide(equity, pot, to_call, stack, &mut self.bluff_rng);
        debug!(equity, action = %decision.action, "ai decided");
        Ok(decision)
    }

    fn ai_equity(&mut self) -> Result<f64, GameError> {
        if self.state.street == Street::Preflop {
            if let Some(equity) = self.config.preflop_equity {
                return Ok(equity);
            }
        }
        let hand = self
            .state
            .ai_hand
            .ok_or_else(|| GameError::InvalidAction("no cards dealt yet".to_string()))?;
        // a degenerate estimate reads as equity 0
        let estimate = self.estimator.estimate_with_rng(&hand, &self.state.board, &mut self.sample_rng)?;
        Ok(estimate.equity)
    }

    /// Deals the next street, or shows down after the river. With a seat
    /// all-in the board is run out to the river first.
    fn close_street(&mut self, events: &mut Vec<HandEvent>) -> Result<(), GameError> {
        loop {
            if self.state.street == Street::River {
                events.extend(self.state.resolve_showdown(self.estimator.scorer())?);
                return Ok(());
            }
            events.extend(self.state.advance_street()?);
            let all_in = self.state.player_stack <= 0.0 || self.state.ai_stack <= 0.0;
            if !all_in {
                return Ok(());
            }
        }
    }
}

impl<S: HandScorer + Clone> Session<S> {
    /// Stand-alone equity calculation for any hand and board, optionally with
    /// a different sampling budget than the match uses.
    pub fn estimate(
        &mut self,
        hand: &Hand,
        board: &[Card],
        simulations: Option<usize>,
    ) -> Result<EquityEstimate, GameError> {
        match simulations {
            Some(n) if n != self.estimator.simulations() => {
                EquityEstimator::with_scorer(self.estimator.scorer().clone(), n)
                    .estimate_with_rng(hand, board, &mut self.sample_rng)
            }
            _ => self.estimator.estimate_with_rng(hand, board, &mut self.sample_rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::find_duplicate;
    use crate::equity::Method;

    fn config(policy: PolicyConfig, preflop_equity: Option<f64>) -> MatchConfig {
        MatchConfig { simulations: 200, preflop_equity, policy, ..MatchConfig::default() }
    }

    /// Never bets or raises; calls whenever the price is right.
    fn passive() -> PolicyConfig {
        PolicyConfig {
            raise_threshold: 2.0,
            call_threshold: 0.0,
            bluff_probability: 0.0,
            defend_bluff_probability: 0.0,
            ..PolicyConfig::default()
        }
    }

    fn hand_ended(events: &[HandEvent]) -> bool {
        events.iter().any(|e| matches!(e, HandEvent::HandEnded(_)))
    }

    #[test]
    fn test_check_down_to_showdown() {
        let mut session = Session::seeded(config(passive(), Some(0.5)), 1);
        session.start_hand().unwrap();

        let events = session.player_act(Action::Call).unwrap();
        assert_eq!(session.state().street, Street::Flop);
        assert!(events.iter().any(|e| matches!(e, HandEvent::CommunityCardsDealt { street: Street::Flop, .. })));

        session.player_act(Action::Check).unwrap();
        assert_eq!(session.state().street, Street::Turn);
        session.player_act(Action::Check).unwrap();
        assert_eq!(session.state().street, Street::River);
        assert_eq!(session.state().board.len(), 5);

        let events = session.player_act(Action::Check).unwrap();
        assert!(hand_ended(&events));
        assert_eq!(session.state().phase, HandPhase::Over(EndReason::Showdown));
        assert_eq!(session.state().total_chips(), 2000.0);
        assert_eq!(session.state().pot, 0.0);
    }

    #[test]
    fn test_ai_reraises_strong_preflop() {
        let mut session = Session::seeded(config(PolicyConfig::default(), Some(0.9)), 2);
        session.start_hand().unwrap();

        let events = session.player_act(Action::Raise(40.0)).unwrap();
        assert!(events.contains(&HandEvent::SeatActed {
            seat: Seat::Ai,
            action: Action::Raise(120.0),
            stack: 860.0,
            pot: 190.0,
            to_call: 120.0,
        }));
        assert_eq!(session.state().street, Street::Preflop);
        assert_eq!(session.state().to_call, 120.0);
    }

    #[test]
    fn test_ai_folds_without_odds() {
        let mut session = Session::seeded(config(PolicyConfig::default(), Some(0.0)), 3);
        session.start_hand().unwrap();

        let events = session.player_act(Action::Raise(40.0)).unwrap();
        assert!(hand_ended(&events));
        assert_eq!(session.state().phase, HandPhase::Over(EndReason::EarlyFold));
        assert_eq!(session.state().player_stack, 1020.0);
        assert_eq!(session.state().ai_stack, 980.0);
    }

    #[test]
    fn test_all_in_runs_out_the_board() {
        let mut session = Session::seeded(config(PolicyConfig::default(), Some(0.5)), 4);
        session.start_hand().unwrap();

        // the AI is priced in at 50% and calls its last 980
        let events = session.player_act(Action::Raise(990.0)).unwrap();
        assert!(events.contains(&HandEvent::BetReturned { seat: Seat::Player, amount: 10.0, stack: 10.0 }));
        assert!(hand_ended(&events));
        let state = session.state();
        assert_eq!(state.board.len(), 5);
        assert_eq!(state.phase, HandPhase::Over(EndReason::Showdown));
        assert_eq!(state.total_chips(), 2000.0);
        assert_eq!(find_duplicate(&state.known_cards()), None);
    }

    #[test]
    fn test_player_equity_and_calculator() {
        let mut session = Session::seeded(config(passive(), Some(0.5)), 5);
        assert!(session.player_equity().is_err());

        session.start_hand().unwrap();
        session.player_act(Action::Call).unwrap();
        let estimate = session.player_equity().unwrap();
        assert_eq!(estimate.method, Method::Sampled);
        assert_eq!(estimate.trials, 200);

        let hand: Hand = ["As".parse().unwrap(), "Ks".parse().unwrap()];
        let board: Vec<Card> = ["Qs", "Js", "Ts", "2d", "3c"].iter().map(|c| c.parse().unwrap()).collect();
        let exact = session.estimate(&hand, &board, Some(50)).unwrap();
        assert_eq!((exact.equity, exact.method, exact.trials), (1.0, Method::Exact, 990));

        let sampled = session.estimate(&hand, &board[..3], Some(50)).unwrap();
        assert_eq!(sampled.trials, 50);
    }

    #[test]
    fn test_try_new_rejects_negative_blinds() {
        let config = MatchConfig { big_blind: -20.0, ..MatchConfig::default() };
        assert!(matches!(Session::try_new(config), Err(GameError::InvalidConfig(_))));
        assert!(Session::try_new(MatchConfig::default()).is_ok());
    }

    #[test]
    fn test_refused_ai_bet_falls_back_to_check() {
        // with no blinds the policy sizes its value bet at 0, which apply refuses
        let config = MatchConfig { big_blind: 0.0, ..config(PolicyConfig::default(), Some(0.9)) };
        let mut session = Session::seeded(config, 8);
        session.start_hand().unwrap();
        assert_eq!(session.state().to_call, 0.0);

        let events = session.player_act(Action::Check).unwrap();
        assert!(events.contains(&HandEvent::SeatActed {
            seat: Seat::Ai,
            action: Action::Check,
            stack: 1000.0,
            pot: 0.0,
            to_call: 0.0,
        }));
        assert_eq!(session.state().street, Street::Flop);
        assert!(session.state().hand_active());
    }

    #[test]
    fn test_calculator_budget_is_capped() {
        let mut session = Session::seeded(config(passive(), Some(0.5)), 10);
        let hand: Hand = ["As".parse().unwrap(), "Ks".parse().unwrap()];
        assert!(matches!(
            session.estimate(&hand, &[], Some(usize::MAX)),
            Err(GameError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_reset_after_bust() {
        let mut session = Session::seeded(config(PolicyConfig::default(), Some(0.5)), 6);
        session.start_hand().unwrap();
        session.player_act(Action::Fold).unwrap();
        assert_eq!(session.state().ai_stack, 1010.0);

        session.reset();
        assert_eq!(session.state().player_stack, 1000.0);
        assert_eq!(session.state().ai_stack, 1000.0);
        assert_eq!(session.state().phase, HandPhase::NotStarted);
    }

    #[test]
    fn test_seeded_sessions_deal_the_same_cards() {
        let mut a = Session::seeded(MatchConfig::default(), 9);
        let mut b = Session::seeded(MatchConfig::default(), 9);
        a.start_hand().unwrap();
        b.start_hand().unwrap();
        assert_eq!(a.state().player_hand, b.state().player_hand);
        assert_eq!(a.state().ai_hand, b.state().ai_hand);
    }
}

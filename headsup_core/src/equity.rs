//! Equity against a uniformly random opponent hand.
//!
//! With at most one community card to come the remaining run-outs are few
//! enough to enumerate exactly. Earlier streets fall back to Monte Carlo
//! sampling with a fixed trial budget.

use crate::card::{
    Card, Hand, enumerate_combinations, find_duplicate, full_deck, remove_known,
    sample_without_replacement,
};
use crate::error::GameError;
use crate::eval::{HandScorer, RankEvaluator, Score};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

const BOARD_SIZE: usize = 5;
const OPPONENT_CARDS: usize = 2;
/// Boards at least this long are enumerated exactly.
const EXACT_MIN_BOARD: usize = 4;

pub const DEFAULT_SIMULATIONS: usize = 10_000;
/// Largest sampling budget a caller may ask for.
pub const MAX_SIMULATIONS: usize = 1_000_000;

/// How an estimate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Exact,
    Sampled,
    /// No trial completed; the equity is a placeholder 0.
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityEstimate {
    /// Win probability with ties counted as half, in [0, 1].
    pub equity: f64,
    pub method: Method,
    /// Combinations enumerated or completed sampling trials.
    pub trials: usize,
}

impl EquityEstimate {
    fn degenerate() -> Self {
        EquityEstimate { equity: 0.0, method: Method::Degenerate, trials: 0 }
    }

    /// The estimate, or `DegenerateEquity` when no trial completed.
    pub fn confident(self) -> Result<Self, GameError> {
        match self.method {
            Method::Degenerate => Err(GameError::DegenerateEquity),
            _ => Ok(self),
        }
    }
}

impl fmt::Display for EquityEstimate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.method {
            Method::Exact => write!(f, "{:.2}% (exact, {} combinations)", self.equity * 100.0, self.trials),
            Method::Sampled => write!(f, "{:.2}% (monte carlo, {} simulations)", self.equity * 100.0, self.trials),
            Method::Degenerate => write!(f, "N/A"),
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    wins: usize,
    ties: usize,
    total: usize,
}

impl Tally {
    fn record(&mut self, hero: Score, villain: Score) {
        // lower score wins
        if hero < villain {
            self.wins += 1;
        } else if hero == villain {
            self.ties += 1;
        }
        self.total += 1;
    }

    fn into_estimate(self, method: Method) -> EquityEstimate {
        if self.total == 0 {
            return EquityEstimate::degenerate();
        }
        let equity = (self.wins as f64 + 0.5 * self.ties as f64) / self.total as f64;
        EquityEstimate { equity, method, trials: self.total }
    }
}

/// Equity estimator over a scoring oracle.
#[derive(Debug, Clone)]
pub struct EquityEstimator<S = RankEvaluator> {
    scorer: S,
    simulations: usize,
}

impl EquityEstimator<RankEvaluator> {
    pub fn new(simulations: usize) -> Self {
        Self::with_scorer(RankEvaluator, simulations)
    }
}

impl Default for EquityEstimator<RankEvaluator> {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATIONS)
    }
}

impl<S: HandScorer> EquityEstimator<S> {
    pub fn with_scorer(scorer: S, simulations: usize) -> Self {
        EquityEstimator { scorer, simulations }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn simulations(&self) -> usize {
        self.simulations
    }

    /// Estimates equity, sampling from the thread-local generator when needed.
    pub fn estimate(&self, hand: &Hand, board: &[Card]) -> Result<EquityEstimate, GameError> {
        self.estimate_with_rng(hand, board, &mut rand::rng())
    }

    /// Estimates equity. `rng` is only consulted on boards of 0 or 3 cards.
    pub fn estimate_with_rng<R: Rng + ?Sized>(
        &self,
        hand: &Hand,
        board: &[Card],
        rng: &mut R,
    ) -> Result<EquityEstimate, GameError> {
        if self.simulations > MAX_SIMULATIONS {
            return Err(GameError::InvalidAction(format!(
                "{} simulations exceed the maximum of {}",
                self.simulations, MAX_SIMULATIONS
            )));
        }
        if !matches!(board.len(), 0 | 3 | 4 | 5) {
            return Err(GameError::InvalidBoard(board.len()));
        }
        let known: Vec<Card> = hand.iter().chain(board).copied().collect();
        if let Some(card) = find_duplicate(&known) {
            return Err(GameError::DuplicateCard(card));
        }
        let pool = remove_known(&full_deck(), &known);

        let estimate = if board.len() >= EXACT_MIN_BOARD {
            self.enumerate(hand, board, &pool)
        } else {
            self.sample(hand, board, &pool, rng)
        };

        if estimate.method == Method::Degenerate {
            warn!(board = board.len(), simulations = self.simulations, "no equity trial completed");
        } else {
            debug!(equity = estimate.equity, method = ?estimate.method, trials = estimate.trials, "equity estimated");
        }
        Ok(estimate)
    }

    fn enumerate(&self, hand: &Hand, board: &[Card], pool: &[Card]) -> EquityEstimate {
        let draw_total = OPPONENT_CARDS + BOARD_SIZE - board.len();
        let mut tally = Tally::default();
        let mut final_board = Vec::with_capacity(BOARD_SIZE);

        for drawn in enumerate_combinations(pool, draw_total) {
            self.play_out(hand, board, &drawn, &mut final_board, &mut tally);
        }
        tally.into_estimate(Method::Exact)
    }

    fn sample<R: Rng + ?Sized>(
        &self,
        hand: &Hand,
        board: &[Card],
        pool: &[Card],
        rng: &mut R,
    ) -> EquityEstimate {
        let draw_total = OPPONENT_CARDS + BOARD_SIZE - board.len();
        let mut tally = Tally::default();
        let mut final_board = Vec::with_capacity(BOARD_SIZE);

        for _ in 0..self.simulations {
            // a short pool skips the trial without counting it
            let Ok(drawn) = sample_without_replacement(pool, draw_total, rng) else {
                continue;
            };
            self.play_out(hand, board, &drawn, &mut final_board, &mut tally);
        }
        tally.into_estimate(Method::Sampled)
    }

    /// Splits `drawn` into the opponent's hand and the rest of the board, then scores.
    fn play_out(
        &self,
        hand: &Hand,
        board: &[Card],
        drawn: &[Card],
        final_board: &mut Vec<Card>,
        tally: &mut Tally,
    ) {
        let opponent = [drawn[0], drawn[1]];
        final_board.clear();
        final_board.extend_from_slice(board);
        final_board.extend_from_slice(&drawn[OPPONENT_CARDS..]);

        let hero = self.scorer.score(hand, final_board);
        let villain = self.scorer.score(&opponent, final_board);
        tally.record(hero, villain);
    }
}

// --- Unit tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit, choose};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use Rank::*;
    use Suit::*;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    /// Scores every hand the same, so every trial is a tie.
    struct FlatScorer;

    impl HandScorer for FlatScorer {
        fn score(&self, _hand: &Hand, _board: &[Card]) -> Score {
            42
        }
    }

    #[test]
    fn test_royal_flush_on_river_is_exact_certainty() {
        let estimator = EquityEstimator::default();
        let hand = [card(Jack, Spade), card(Ten, Spade)];
        let board = [card(Ace, Spade), card(King, Spade), card(Queen, Spade), card(Two, Heart), card(Three, Heart)];

        let estimate = estimator.estimate(&hand, &board).unwrap();
        assert_eq!(estimate.equity, 1.0);
        assert_eq!(estimate.method, Method::Exact);
        assert_eq!(estimate.trials, 990);
    }

    #[test]
    fn test_turn_is_enumerated_exactly() {
        let estimator = EquityEstimator::default();
        let hand = [card(Ace, Heart), card(King, Heart)];
        let board = [card(Queen, Heart), card(Jack, Heart), card(Ten, Heart), card(Two, Club)];

        let estimate = estimator.estimate(&hand, &board).unwrap();
        assert_eq!(estimate.method, Method::Exact);
        assert_eq!(estimate.trials, choose(46, 3));
        assert_eq!(estimate.equity, 1.0);
    }

    #[test]
    fn test_exact_mode_is_deterministic() {
        let estimator = EquityEstimator::default();
        let hand = [card(Nine, Club), card(Eight, Club)];
        let board = [card(Ace, Diamond), card(Seven, Club), card(Six, Heart), card(Two, Club), card(King, Spade)];

        let first = estimator.estimate(&hand, &board).unwrap();
        let second = estimator.estimate(&hand, &board).unwrap();
        assert_eq!(first.equity.to_bits(), second.equity.to_bits());
        assert_eq!(first.trials, second.trials);
        assert!(first.equity > 0.0 && first.equity < 1.0);
    }

    #[test]
    fn test_method_switch_boundary() {
        let estimator = EquityEstimator::new(200);
        let mut rng = StdRng::seed_from_u64(3);
        let hand = [card(Ace, Spade), card(Ace, Heart)];
        let flop = [card(Two, Club), card(Seven, Diamond), card(Nine, Heart)];

        let preflop = estimator.estimate_with_rng(&hand, &[], &mut rng).unwrap();
        assert_eq!(preflop.method, Method::Sampled);
        assert_eq!(preflop.trials, 200);

        let on_flop = estimator.estimate_with_rng(&hand, &flop, &mut rng).unwrap();
        assert_eq!(on_flop.method, Method::Sampled);
        assert!((0.0..=1.0).contains(&on_flop.equity));
    }

    #[test]
    fn test_pocket_aces_preflop_equity() {
        let estimator = EquityEstimator::new(3_000);
        let mut rng = StdRng::seed_from_u64(99);
        let hand = [card(Ace, Spade), card(Ace, Heart)];

        let estimate = estimator.estimate_with_rng(&hand, &[], &mut rng).unwrap();
        // AA against a random hand is about 85%
        assert!(estimate.equity > 0.80 && estimate.equity < 0.90, "equity={}", estimate.equity);
    }

    #[test]
    fn test_sampling_is_reproducible_with_a_seed() {
        let estimator = EquityEstimator::new(300);
        let hand = [card(Queen, Diamond), card(Jack, Diamond)];
        let flop = [card(Ten, Diamond), card(Two, Spade), card(Three, Diamond)];

        let a = estimator.estimate_with_rng(&hand, &flop, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = estimator.estimate_with_rng(&hand, &flop, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_simulations_is_degenerate() {
        let estimator = EquityEstimator::new(0);
        let hand = [card(Ace, Spade), card(King, Spade)];

        let estimate = estimator.estimate(&hand, &[]).unwrap();
        assert_eq!(estimate.method, Method::Degenerate);
        assert_eq!(estimate.equity, 0.0);
        assert_eq!(estimate.trials, 0);
        assert_eq!(estimate.to_string(), "N/A");
        assert_eq!(estimate.confident(), Err(GameError::DegenerateEquity));
    }

    #[test]
    fn test_ties_count_half() {
        let estimator = EquityEstimator::with_scorer(FlatScorer, 0);
        let hand = [card(Two, Spade), card(Three, Heart)];
        let board = [card(Four, Club), card(Nine, Diamond), card(Jack, Heart), card(King, Club), card(Ace, Spade)];

        let estimate = estimator.estimate(&hand, &board).unwrap();
        assert_eq!(estimate.equity, 0.5);
        assert_eq!(estimate.trials, 990);
    }

    #[test]
    fn test_simulation_budget_is_capped() {
        let hand = [card(Ace, Spade), card(King, Spade)];
        assert!(matches!(
            EquityEstimator::new(MAX_SIMULATIONS + 1).estimate(&hand, &[]),
            Err(GameError::InvalidAction(_))
        ));
        assert!(matches!(
            EquityEstimator::new(usize::MAX).estimate(&hand, &[]),
            Err(GameError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_rejects_bad_input() {
        let estimator = EquityEstimator::new(10);
        let hand = [card(Ace, Spade), card(King, Spade)];

        let two_cards = [card(Two, Club), card(Three, Club)];
        assert_eq!(estimator.estimate(&hand, &two_cards), Err(GameError::InvalidBoard(2)));

        let clash = [card(Ace, Spade), card(Three, Club), card(Four, Club)];
        assert_eq!(estimator.estimate(&hand, &clash), Err(GameError::DuplicateCard(card(Ace, Spade))));
    }
}

use crate::card::Card;
use crate::state::Seat;
use thiserror::Error;

/// Errors returned by the equity estimator and the betting state machine.
///
/// Every variant is recoverable: the caller decides whether to re-prompt,
/// reset the match or abandon the hand.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("{seat} has no chips left (stack {stack}), reset the match to continue")]
    InsufficientChips { seat: Seat, stack: f64 },

    #[error("deck exhausted: needed {needed} cards, {remaining} remaining")]
    DeckExhausted { needed: usize, remaining: usize },

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("equity unavailable: no sampling trial completed")]
    DegenerateEquity,

    #[error("card {0} appears more than once")]
    DuplicateCard(Card),

    #[error("a board holds 0, 3, 4 or 5 cards, got {0}")]
    InvalidBoard(usize),

    #[error("cannot parse card {0:?}")]
    InvalidCard(String),

    #[error("invalid match config: {0}")]
    InvalidConfig(String),
}

use crate::card::{Card, Hand};
use crate::config::MatchConfig;
use crate::equity::EquityEstimate;
use crate::state::{Action, HandEvent, LegalAction, MatchState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = Uuid;

// --- Client -> server ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Opens a new match against the AI, replacing any current one.
    NewMatch { config: Option<MatchConfig> },
    /// Deals the next hand of the current match.
    StartHand,
    /// The human seat's action in the current hand.
    PerformAction(Action),
    /// The human seat's equity on the current board.
    ShowEquity,
    /// Equity of an arbitrary hand and board, outside of any hand.
    Estimate {
        hand: Hand,
        board: Vec<Card>,
        simulations: Option<usize>,
    },
    /// Restores both starting stacks.
    ResetMatch,
}

// --- Server -> client ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    MatchCreated {
        session_id: SessionId,
        state: MatchState,
    },
    /// Match snapshot as the human seat may see it, see `MatchState::for_player`.
    Snapshot(MatchState),
    Event(HandEvent),
    /// Sent whenever the human seat is expected to act.
    NextToAct { valid_actions: Vec<LegalAction> },
    Equity(EquityEstimate),
    Info { message: String },
    Error { message: String },
}

impl From<Action> for ClientMessage {
    fn from(action: Action) -> Self {
        ClientMessage::PerformAction(action)
    }
}

impl From<HandEvent> for ServerMessage {
    fn from(event: HandEvent) -> Self {
        ServerMessage::Event(event)
    }
}

use crate::card::{Card, Deck, Hand};
use crate::eval::Score;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chip amounts. Fractional values appear when a pot is split.
pub type Chips = f64;

/// The two seats at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    Player,
    Ai,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::Player => Seat::Ai,
            Seat::Ai => Seat::Player,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Seat::Player => "Player",
            Seat::Ai => "AI",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    /// The following street and how many community cards it deals.
    pub fn next(self) -> Option<(Street, usize)> {
        match self {
            Street::Preflop => Some((Street::Flop, 3)),
            Street::Flop => Some((Street::Turn, 1)),
            Street::Turn => Some((Street::River, 1)),
            Street::River => None,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Showdown,
    EarlyFold,
}

/// Hand lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandPhase {
    NotStarted,
    Active,
    Over(EndReason),
}

/// Seat actions. Bet and Raise carry the chips moved into the pot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Check,
    Call,
    Bet(Chips),
    Raise(Chips),
    Fold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Action::Check => write!(f, "checks"),
            Action::Call => write!(f, "calls"),
            Action::Bet(amount) => write!(f, "bets {}", amount),
            Action::Raise(amount) => write!(f, "raises {}", amount),
            Action::Fold => write!(f, "folds"),
        }
    }
}

/// Actions open to a seat, for the client's prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LegalAction {
    Fold,
    Check,
    Call(Chips),
    Bet { min: Chips, max: Chips },
    Raise { min: Chips, max: Chips },
}

/// One seat's hand at showdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowdownResult {
    pub seat: Seat,
    pub cards: Hand,
    pub score: Score,
    /// Oracle description, or `Score: N` when the oracle has none.
    pub description: String,
    pub winnings: Chips,
}

/// How the last hand ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HandOutcome {
    Fold { folded: Seat, pot: Chips },
    Showdown { player: ShowdownResult, ai: ShowdownResult, winner: Option<Seat> },
}

impl fmt::Display for HandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HandOutcome::Fold { folded, pot } => {
                write!(f, "{} folds, {} collects {} chips", folded, folded.other(), pot)
            }
            HandOutcome::Showdown { player, ai, winner } => {
                write!(f, "{} vs {}: ", player.description, ai.description)?;
                match winner {
                    Some(seat) => {
                        let won = if *seat == Seat::Player { player.winnings } else { ai.winnings };
                        write!(f, "{} wins {} chips", seat, won)
                    }
                    None => write!(f, "split pot, {} chips each", player.winnings),
                }
            }
        }
    }
}

/// Notifications produced by state transitions, forwarded to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HandEvent {
    HandStarted { hand_number: u32, player_hand: Hand },
    BlindsPosted { small_blind: Chips, big_blind: Chips, pot: Chips },
    SeatActed { seat: Seat, action: Action, stack: Chips, pot: Chips, to_call: Chips },
    /// Uncalled chips handed back after a short all-in call.
    BetReturned { seat: Seat, amount: Chips, stack: Chips },
    CommunityCardsDealt { street: Street, cards: Vec<Card> },
    HandEnded(HandOutcome),
}

/// The mutable root of a heads-up match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub big_blind: Chips,
    pub player_stack: Chips,
    pub ai_stack: Chips,
    /// Chips committed by both seats in the current hand.
    pub pot: Chips,
    pub street: Street,
    /// Outstanding amount the seat to act must match.
    pub to_call: Chips,
    pub phase: HandPhase,
    pub player_hand: Option<Hand>,
    pub ai_hand: Option<Hand>,
    pub board: Vec<Card>,
    #[serde(skip)] // the live deck never leaves the server
    pub deck: Deck,
    pub outcome: Option<HandOutcome>,
    pub hands_played: u32,
}

impl MatchState {
    pub fn new(initial_stack: Chips, big_blind: Chips) -> Self {
        MatchState {
            big_blind,
            player_stack: initial_stack,
            ai_stack: initial_stack,
            pot: 0.0,
            street: Street::Preflop,
            to_call: 0.0,
            phase: HandPhase::NotStarted,
            player_hand: None,
            ai_hand: None,
            board: Vec::new(),
            deck: Deck::default(),
            outcome: None,
            hands_played: 0,
        }
    }

    pub fn hand_active(&self) -> bool {
        self.phase == HandPhase::Active
    }

    pub fn hand_over(&self) -> bool {
        matches!(self.phase, HandPhase::Over(_))
    }

    pub fn stack(&self, seat: Seat) -> Chips {
        match seat {
            Seat::Player => self.player_stack,
            Seat::Ai => self.ai_stack,
        }
    }

    pub(crate) fn stack_mut(&mut self, seat: Seat) -> &mut Chips {
        match seat {
            Seat::Player => &mut self.player_stack,
            Seat::Ai => &mut self.ai_stack,
        }
    }

    pub fn hand(&self, seat: Seat) -> Option<Hand> {
        match seat {
            Seat::Player => self.player_hand,
            Seat::Ai => self.ai_hand,
        }
    }

    /// Stacks plus pot; constant for the life of the match.
    pub fn total_chips(&self) -> Chips {
        self.player_stack + self.ai_stack + self.pot
    }

    /// Smallest legal bet or raise, before the all-in exception.
    pub fn min_raise(&self) -> Chips {
        self.big_blind.max(2.0 * self.to_call)
    }

    /// Hole cards of both seats followed by the board.
    pub fn known_cards(&self) -> Vec<Card> {
        self.player_hand
            .iter()
            .chain(self.ai_hand.iter())
            .flatten()
            .chain(self.board.iter())
            .copied()
            .collect()
    }

    /// Actions `seat` may take right now.
    pub fn legal_actions(&self, seat: Seat) -> Vec<LegalAction> {
        if !self.hand_active() {
            return vec![];
        }
        let stack = self.stack(seat);
        let min = self.min_raise().min(stack);
        let mut actions = Vec::with_capacity(3);
        if self.to_call > 0.0 {
            actions.push(LegalAction::Fold);
            actions.push(LegalAction::Call(self.to_call.min(stack)));
            if stack > self.to_call {
                actions.push(LegalAction::Raise { min, max: stack });
            }
        } else {
            actions.push(LegalAction::Check);
            if stack > 0.0 {
                actions.push(LegalAction::Bet { min, max: stack });
            }
        }
        actions
    }

    /// Copy of the state safe to send to the human seat: no deck, and the
    /// AI's hole cards only once they were shown down.
    pub fn for_player(&self) -> Self {
        let mut view = self.clone();
        view.deck = Deck::default();
        if self.phase != HandPhase::Over(EndReason::Showdown) {
            view.ai_hand = None;
        }
        view
    }
}

use crate::card::{Deck, find_duplicate};
use crate::error::GameError;
use crate::eval::HandScorer;
use crate::state::*;
use rand::Rng;
use tracing::debug;

// --- Hand flow ---

impl MatchState {
    /// Starts a new hand from a freshly shuffled deck.
    pub fn start_hand<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<HandEvent>, GameError> {
        self.start_hand_with_deck(Deck::shuffled(rng))
    }

    /// Starts a new hand dealing from `deck` front to back.
    ///
    /// - Both stacks must hold chips, otherwise the state is left untouched.
    /// - The Player receives the first two cards, the AI the next two.
    /// - The Player posts the small blind and the AI the big blind, each
    ///   clamped to what the seat has.
    pub fn start_hand_with_deck(&mut self, mut deck: Deck) -> Result<Vec<HandEvent>, GameError> {
        if self.hand_active() {
            return Err(GameError::InvalidAction("a hand is already in progress".to_string()));
        }
        for seat in [Seat::Player, Seat::Ai] {
            if self.stack(seat) <= 0.0 {
                return Err(GameError::InsufficientChips { seat, stack: self.stack(seat) });
            }
        }

        let hole = deck.draw(4)?;
        if let Some(card) = find_duplicate(&hole) {
            return Err(GameError::DuplicateCard(card));
        }
        let player_hand = [hole[0], hole[1]];

        self.deck = deck;
        self.player_hand = Some(player_hand);
        self.ai_hand = Some([hole[2], hole[3]]);
        self.board.clear();
        self.street = Street::Preflop;
        self.outcome = None;
        self.hands_played += 1;

        let small_blind = (self.big_blind / 2.0).min(self.player_stack);
        let big_blind = self.big_blind.min(self.ai_stack);
        self.player_stack -= small_blind;
        self.ai_stack -= big_blind;
        self.pot += small_blind + big_blind;
        self.to_call = big_blind;
        self.phase = HandPhase::Active;

        debug!(hand = self.hands_played, pot = self.pot, "hand started");
        Ok(vec![
            HandEvent::HandStarted { hand_number: self.hands_played, player_hand },
            HandEvent::BlindsPosted { small_blind, big_blind, pot: self.pot },
        ])
    }

    /// Deals the next street once betting on the current one is closed.
    pub fn advance_street(&mut self) -> Result<Vec<HandEvent>, GameError> {
        self.require_active()?;
        if self.to_call > 0.0 {
            return Err(GameError::InvalidAction(format!(
                "betting is still open, {} to call",
                self.to_call
            )));
        }
        let Some((next, count)) = self.street.next() else {
            return Err(GameError::InvalidAction("no street follows the river".to_string()));
        };

        let cards = self.deck.draw(count)?;
        self.board.extend_from_slice(&cards);
        self.street = next;
        self.to_call = 0.0;

        debug!(street = %next, board = self.board.len(), "street dealt");
        Ok(vec![HandEvent::CommunityCardsDealt { street: next, cards }])
    }

    /// Applies one seat action. The caller alternates the seats.
    pub fn apply(&mut self, seat: Seat, action: Action) -> Result<Vec<HandEvent>, GameError> {
        self.require_active()?;
        let stack = self.stack(seat);
        let mut events = Vec::with_capacity(2);

        match action {
            Action::Fold => return self.resolve_fold(seat),
            Action::Check => {
                if self.to_call > 0.0 {
                    return Err(GameError::InvalidAction(format!(
                        "{} cannot check facing {} to call",
                        seat, self.to_call
                    )));
                }
            }
            Action::Call => {
                if self.to_call <= 0.0 {
                    return Err(GameError::InvalidAction("there is nothing to call".to_string()));
                }
                // a short stack calls all-in and the uncalled rest goes back
                let paid = self.to_call.min(stack);
                let uncalled = self.to_call - paid;
                *self.stack_mut(seat) -= paid;
                self.pot += paid;
                self.to_call = 0.0;
                if uncalled > 0.0 {
                    let bettor = seat.other();
                    self.pot -= uncalled;
                    *self.stack_mut(bettor) += uncalled;
                    events.push(HandEvent::BetReturned {
                        seat: bettor,
                        amount: uncalled,
                        stack: self.stack(bettor),
                    });
                }
            }
            Action::Bet(amount) | Action::Raise(amount) => {
                let is_bet = matches!(action, Action::Bet(_));
                if is_bet && self.to_call > 0.0 {
                    return Err(GameError::InvalidAction(format!(
                        "{} faces {} to call, raise instead of betting",
                        seat, self.to_call
                    )));
                }
                if !is_bet && self.to_call <= 0.0 {
                    return Err(GameError::InvalidAction("nothing to raise, bet instead".to_string()));
                }
                // a short stack can only call, which returns the uncalled rest
                if !is_bet && amount <= self.to_call {
                    return Err(GameError::InvalidAction(format!(
                        "a raise must exceed the {} to call, call instead",
                        self.to_call
                    )));
                }
                self.validate_wager(amount, stack)?;
                *self.stack_mut(seat) -= amount;
                self.pot += amount;
                self.to_call = amount;
            }
        }

        debug!(%seat, %action, pot = self.pot, to_call = self.to_call, "seat acted");
        events.insert(0, HandEvent::SeatActed {
            seat,
            action,
            stack: self.stack(seat),
            pot: self.pot,
            to_call: self.to_call,
        });
        Ok(events)
    }

    /// Gives the whole pot to the seat that did not fold. Ends the hand.
    pub fn resolve_fold(&mut self, folding_seat: Seat) -> Result<Vec<HandEvent>, GameError> {
        self.require_active()?;
        let winner = folding_seat.other();
        let pot = self.pot;
        *self.stack_mut(winner) += pot;
        self.pot = 0.0;
        self.to_call = 0.0;
        self.phase = HandPhase::Over(EndReason::EarlyFold);

        let outcome = HandOutcome::Fold { folded: folding_seat, pot };
        debug!(%outcome, "hand ended");
        self.outcome = Some(outcome.clone());
        Ok(vec![
            HandEvent::SeatActed {
                seat: folding_seat,
                action: Action::Fold,
                stack: self.stack(folding_seat),
                pot: 0.0,
                to_call: 0.0,
            },
            HandEvent::HandEnded(outcome),
        ])
    }

    /// Scores both hands on the river. The lower score takes the pot,
    /// equal scores split it.
    pub fn resolve_showdown<S: HandScorer>(&mut self, scorer: &S) -> Result<Vec<HandEvent>, GameError> {
        self.require_active()?;
        if self.street != Street::River || self.to_call > 0.0 {
            return Err(GameError::InvalidAction(format!(
                "showdown needs a closed river, street is {} with {} to call",
                self.street, self.to_call
            )));
        }
        let (Some(player_cards), Some(ai_cards)) = (self.player_hand, self.ai_hand) else {
            return Err(GameError::InvalidAction("hole cards are missing".to_string()));
        };

        let player_score = scorer.score(&player_cards, &self.board);
        let ai_score = scorer.score(&ai_cards, &self.board);
        let pot = self.pot;
        let (winner, player_won, ai_won) = if player_score < ai_score {
            (Some(Seat::Player), pot, 0.0)
        } else if ai_score < player_score {
            (Some(Seat::Ai), 0.0, pot)
        } else {
            (None, pot / 2.0, pot / 2.0)
        };

        self.player_stack += player_won;
        self.ai_stack += ai_won;
        self.pot = 0.0;
        self.phase = HandPhase::Over(EndReason::Showdown);

        let describe = |score| scorer.describe(score).unwrap_or_else(|| format!("Score: {}", score));
        let outcome = HandOutcome::Showdown {
            player: ShowdownResult {
                seat: Seat::Player,
                cards: player_cards,
                score: player_score,
                description: describe(player_score),
                winnings: player_won,
            },
            ai: ShowdownResult {
                seat: Seat::Ai,
                cards: ai_cards,
                score: ai_score,
                description: describe(ai_score),
                winnings: ai_won,
            },
            winner,
        };
        debug!(%outcome, "hand ended");
        self.outcome = Some(outcome.clone());
        Ok(vec![HandEvent::HandEnded(outcome)])
    }

    /// Reinitializes both stacks and discards any hand in progress.
    pub fn reset(&mut self, initial_stack: Chips) {
        *self = MatchState::new(initial_stack, self.big_blind);
    }

    // --- helpers ---

    fn require_active(&self) -> Result<(), GameError> {
        if self.hand_active() {
            Ok(())
        } else {
            Err(GameError::InvalidAction("no hand is in progress".to_string()))
        }
    }

    fn validate_wager(&self, amount: Chips, stack: Chips) -> Result<(), GameError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(GameError::InvalidAction(format!("wager must be positive, got {}", amount)));
        }
        if amount > stack {
            return Err(GameError::InvalidAction(format!("wager {} exceeds stack {}", amount, stack)));
        }
        let all_in = amount == stack;
        if amount < self.min_raise() && !all_in {
            return Err(GameError::InvalidAction(format!(
                "wager {} is below the minimum {}",
                amount,
                self.min_raise()
            )));
        }
        Ok(())
    }
}

// --- Unit tests ---

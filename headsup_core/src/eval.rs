//! Hand scoring.
//!
//! The estimator and the state machine only talk to [`HandScorer`], an
//! opaque oracle where a *lower* score is a *better* hand. [`RankEvaluator`]
//! is the default oracle, built on a best-5-of-N categorical evaluation.

use crate::card::{Card, Hand, Rank, enumerate_combinations};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Oracle score. Lower is better; equal scores tie.
pub type Score = u32;

/// Hand scoring oracle.
pub trait HandScorer {
    /// Scores `hand` on a board of 3 to 5 cards. Lower is better.
    fn score(&self, hand: &Hand, board: &[Card]) -> Score;

    /// Human readable name for a score, when the oracle has one.
    fn describe(&self, _score: Score) -> Option<String> {
        None
    }
}

/// Hand category and tie-break ranks.
/// Variants go from weakest to strongest so the derived `Ord` compares hands.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Serialize, Deserialize)]
pub enum HandRank {
    HighCard(Rank, Rank, Rank, Rank, Rank),
    OnePair(Rank, Rank, Rank, Rank),
    TwoPair(Rank, Rank, Rank),
    ThreeOfAKind(Rank, Rank, Rank),
    Straight(Rank),
    Flush(Rank, Rank, Rank, Rank, Rank),
    FullHouse(Rank, Rank),
    FourOfAKind(Rank, Rank),
    StraightFlush(Rank),
    RoyalFlush,
}

const CATEGORY_SHIFT: u32 = 20;
const CATEGORY_NAMES: [&str; 10] = [
    "High Card", "One Pair", "Two Pair", "Three of a Kind", "Straight",
    "Flush", "Full House", "Four of a Kind", "Straight Flush", "Royal Flush",
];
/// One past the strongest possible strength.
const SCORE_CEILING: u32 = 10 << CATEGORY_SHIFT;

impl HandRank {
    fn category(&self) -> u32 {
        match self {
            HandRank::HighCard(..) => 0,
            HandRank::OnePair(..) => 1,
            HandRank::TwoPair(..) => 2,
            HandRank::ThreeOfAKind(..) => 3,
            HandRank::Straight(..) => 4,
            HandRank::Flush(..) => 5,
            HandRank::FullHouse(..) => 6,
            HandRank::FourOfAKind(..) => 7,
            HandRank::StraightFlush(..) => 8,
            HandRank::RoyalFlush => 9,
        }
    }

    fn kickers(&self) -> Vec<Rank> {
        match *self {
            HandRank::HighCard(a, b, c, d, e) | HandRank::Flush(a, b, c, d, e) => vec![a, b, c, d, e],
            HandRank::OnePair(a, b, c, d) => vec![a, b, c, d],
            HandRank::TwoPair(a, b, c) | HandRank::ThreeOfAKind(a, b, c) => vec![a, b, c],
            HandRank::FullHouse(a, b) | HandRank::FourOfAKind(a, b) => vec![a, b],
            HandRank::Straight(a) | HandRank::StraightFlush(a) => vec![a],
            HandRank::RoyalFlush => vec![],
        }
    }

    /// Packs the rank into an integer that orders exactly like `HandRank`.
    /// Higher is stronger.
    pub fn strength(&self) -> u32 {
        let packed = self
            .kickers()
            .into_iter()
            .chain(std::iter::repeat(Rank::Two))
            .take(5)
            .fold(0u32, |acc, r| (acc << 4) | r as u32);
        (self.category() << CATEGORY_SHIFT) | packed
    }

    /// Oracle score for this rank. Lower is better.
    pub fn score(&self) -> Score {
        SCORE_CEILING - self.strength()
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HandRank::OnePair(r, ..) => write!(f, "One Pair ({})", r),
            HandRank::TwoPair(r1, r2, ..) => write!(f, "Two Pair ({},{})", r1, r2),
            HandRank::ThreeOfAKind(r, ..) => write!(f, "Three of a Kind ({})", r),
            HandRank::FullHouse(r1, r2) => write!(f, "Full House ({} over {})", r1, r2),
            HandRank::FourOfAKind(r, _) => write!(f, "Four of a Kind ({})", r),
            other => write!(f, "{}", CATEGORY_NAMES[other.category() as usize]),
        }
    }
}

// --- Hand evaluation ---

/// Best 5-card rank out of 5 to 7 cards.
///
/// # Panics
/// If fewer than 5 or more than 7 cards are given.
pub fn find_best_hand(all_cards: &[Card]) -> HandRank {
    let card_count = all_cards.len();
    assert!((5..=7).contains(&card_count), "a hand is evaluated over 5 to 7 cards");

    if card_count == 5 {
        return evaluate_5_card_hand(all_cards);
    }

    // Every 5-card subset has to be checked: dropping the lowest cards
    // greedily can break a straight or a flush.
    enumerate_combinations(all_cards, 5)
        .map(|hand| evaluate_5_card_hand(&hand))
        .max()
        .unwrap_or(HandRank::HighCard(Rank::Two, Rank::Two, Rank::Two, Rank::Two, Rank::Two))
}

fn evaluate_5_card_hand(hand: &[Card]) -> HandRank {
    debug_assert_eq!(hand.len(), 5);

    let mut ranks = [Rank::Two; 5];
    for (slot, c) in ranks.iter_mut().zip(hand) {
        *slot = c.rank;
    }
    ranks.sort_by(|a, b| b.cmp(a));

    let is_flush = hand.windows(2).all(|w| w[0].suit == w[1].suit);
    let is_wheel = ranks == [Rank::Ace, Rank::Five, Rank::Four, Rank::Three, Rank::Two];
    let is_straight = is_wheel || ranks.windows(2).all(|w| w[0] as u8 == w[1] as u8 + 1);
    // in A-2-3-4-5 the five plays high
    let high_card = if is_wheel { Rank::Five } else { ranks[0] };

    if is_straight && is_flush {
        return if high_card == Rank::Ace {
            HandRank::RoyalFlush
        } else {
            HandRank::StraightFlush(high_card)
        };
    }

    // (count, rank) groups, most frequent first, then highest rank
    let mut counts = [0u8; 13];
    for r in ranks {
        counts[r as usize] += 1;
    }
    let mut groups: Vec<(u8, Rank)> = ranks
        .iter()
        .copied()
        .filter_map(|r| {
            let n = std::mem::take(&mut counts[r as usize]);
            (n > 0).then_some((n, r))
        })
        .collect();
    groups.sort_by(|a, b| b.cmp(a));

    match (groups[0].0, groups.get(1).map(|g| g.0)) {
        (4, _) => HandRank::FourOfAKind(groups[0].1, groups[1].1),
        (3, Some(2)) => HandRank::FullHouse(groups[0].1, groups[1].1),
        (3, _) => HandRank::ThreeOfAKind(groups[0].1, groups[1].1, groups[2].1),
        (2, Some(2)) => HandRank::TwoPair(groups[0].1, groups[1].1, groups[2].1),
        (2, _) => HandRank::OnePair(groups[0].1, groups[1].1, groups[2].1, groups[3].1),
        _ if is_flush => HandRank::Flush(ranks[0], ranks[1], ranks[2], ranks[3], ranks[4]),
        _ if is_straight => HandRank::Straight(high_card),
        _ => HandRank::HighCard(ranks[0], ranks[1], ranks[2], ranks[3], ranks[4]),
    }
}

// --- Default oracle ---

/// Default [`HandScorer`]: best five of hole cards plus board.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankEvaluator;

impl RankEvaluator {
    pub fn rank(&self, hand: &Hand, board: &[Card]) -> HandRank {
        let mut all_cards = Vec::with_capacity(7);
        all_cards.extend_from_slice(hand);
        all_cards.extend_from_slice(board);
        find_best_hand(&all_cards)
    }
}

impl HandScorer for RankEvaluator {
    /// # Panics
    /// If the board holds fewer than 3 or more than 5 cards.
    fn score(&self, hand: &Hand, board: &[Card]) -> Score {
        self.rank(hand, board).score()
    }

    fn describe(&self, score: Score) -> Option<String> {
        let strength = SCORE_CEILING.checked_sub(score)?;
        CATEGORY_NAMES
            .get((strength >> CATEGORY_SHIFT) as usize)
            .map(|name| name.to_string())
    }
}

// --- Unit tests ---

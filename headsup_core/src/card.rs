use crate::error::GameError;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Core card types ---

/// Suit
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Spade,
    Heart,
    Club,
    Diamond,
}

/// Rank
/// Ace is high by default; the A-2-3-4-5 straight is handled by the evaluator.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

/// A single playing card. Two cards are the same card iff rank and suit match.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

/// Two hole cards owned by one seat.
pub type Hand = [Card; 2];

pub const SUITS: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Club, Suit::Diamond];

pub const RANKS: [Rank; 13] = [
    Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven,
    Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
];

pub const DECK_SIZE: usize = 52;

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    /// Position of the card in `full_deck()`, 0..52.
    pub fn index(&self) -> usize {
        self.suit as usize * RANKS.len() + self.rank as usize
    }

    fn mask(&self) -> u64 {
        1u64 << self.index()
    }
}

impl Suit {
    fn to_char(self) -> char {
        match self {
            Suit::Spade => 's',
            Suit::Heart => 'h',
            Suit::Club => 'c',
            Suit::Diamond => 'd',
        }
    }

    fn from_char(c: char) -> Option<Suit> {
        match c.to_ascii_lowercase() {
            's' => Some(Suit::Spade),
            'h' => Some(Suit::Heart),
            'c' => Some(Suit::Club),
            'd' => Some(Suit::Diamond),
            _ => None,
        }
    }

    /// Glyph for terminal rendering.
    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Spade => "♠️",
            Suit::Heart => "♥️",
            Suit::Club => "♣️",
            Suit::Diamond => "♦️",
        }
    }
}

impl Rank {
    pub fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    fn from_char(c: char) -> Option<Rank> {
        RANKS.iter().copied().find(|r| r.to_char() == c.to_ascii_uppercase())
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Parses the two-character notation used by the client, e.g. `As`, `Td`, `2c`.
impl FromStr for Card {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let parsed = match (chars.next(), chars.next(), chars.next()) {
            (Some(r), Some(su), None) => Rank::from_char(r).zip(Suit::from_char(su)),
            _ => None,
        };
        parsed
            .map(|(rank, suit)| Card { rank, suit })
            .ok_or_else(|| GameError::InvalidCard(s.to_string()))
    }
}

// --- Card set operations ---

/// The 52 canonical cards, suit-major in `SUITS` order, ranks ascending.
pub fn full_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for &suit in &SUITS {
        for &rank in &RANKS {
            deck.push(Card { rank, suit });
        }
    }
    deck
}

/// `pool` minus every card present in `known`, preserving pool order.
pub fn remove_known(pool: &[Card], known: &[Card]) -> Vec<Card> {
    let dead = known.iter().fold(0u64, |m, c| m | c.mask());
    pool.iter().copied().filter(|c| dead & c.mask() == 0).collect()
}

/// First card that appears more than once in `cards`, if any.
pub fn find_duplicate(cards: &[Card]) -> Option<Card> {
    let mut seen = 0u64;
    for c in cards {
        if seen & c.mask() != 0 {
            return Some(*c);
        }
        seen |= c.mask();
    }
    None
}

/// Draws `k` distinct cards uniformly at random from `pool`.
pub fn sample_without_replacement<R: Rng + ?Sized>(
    pool: &[Card],
    k: usize,
    rng: &mut R,
) -> Result<Vec<Card>, GameError> {
    if k > pool.len() {
        return Err(GameError::DeckExhausted { needed: k, remaining: pool.len() });
    }
    Ok(rand::seq::index::sample(rng, pool.len(), k)
        .into_iter()
        .map(|i| pool[i])
        .collect())
}

/// All `k`-sized subsets of `pool`, see [`Combinations`].
pub fn enumerate_combinations<T: Copy>(pool: &[T], k: usize) -> Combinations<'_, T> {
    Combinations::new(pool, k)
}

/// Binomial coefficient C(n, k).
pub fn choose(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}

/// Lazy iterator over the k-subsets of a slice in lexicographic index order.
///
/// The iterator is `Clone`: cloning it before consumption gives an independent
/// restart of the same sequence.
#[derive(Debug, Clone)]
pub struct Combinations<'a, T> {
    pool: &'a [T],
    indices: Vec<usize>,
    done: bool,
}

impl<'a, T: Copy> Combinations<'a, T> {
    pub fn new(pool: &'a [T], k: usize) -> Self {
        Combinations {
            pool,
            indices: (0..k).collect(),
            done: k > pool.len(),
        }
    }

    /// Rewinds to the first subset.
    pub fn reset(&mut self) {
        let k = self.indices.len();
        self.indices = (0..k).collect();
        self.done = k > self.pool.len();
    }

    fn step(&mut self) {
        let n = self.pool.len();
        let k = self.indices.len();
        // rightmost index that can still move forward
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.indices[i] < n - k + i {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return;
            }
        }
        self.done = true;
    }
}

impl<T: Copy> Iterator for Combinations<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.indices.iter().map(|&i| self.pool[i]).collect();
        self.step();
        Some(item)
    }
}

// --- Deck ---

/// A shuffled deck with a draw cursor. Dealt cards never come back.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
    cursor: usize,
}

impl Deck {
    /// A freshly shuffled 52-card deck.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Deck {
        let mut cards = full_deck();
        cards.shuffle(rng);
        Deck { cards, cursor: 0 }
    }

    /// A deck that deals `cards` front to back, for replays and fixed scenarios.
    pub fn from_cards(cards: Vec<Card>) -> Deck {
        Deck { cards, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.cursor
    }

    /// Cards not yet dealt, in deal order.
    pub fn undealt(&self) -> &[Card] {
        &self.cards[self.cursor..]
    }

    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        if n > self.remaining() {
            return Err(GameError::DeckExhausted { needed: n, remaining: self.remaining() });
        }
        let drawn = self.cards[self.cursor..self.cursor + n].to_vec();
        self.cursor += n;
        Ok(drawn)
    }
}

// --- Unit tests ---

//! # Heads-up hold'em core
//!
//! Equity estimation against a random hand, the AI seat's betting policy,
//! and the two-seat no-limit betting state machine, together with the wire
//! messages shared by the server and the client. Nothing here knows about
//! sockets or terminals so any host application can drive it.

mod card;
mod config;
mod equity;
mod error;
mod eval;
mod logic;
mod message;
mod policy;
mod session;
mod state;

pub use card::*;

pub use config::MatchConfig;

pub use equity::*;

pub use error::GameError;

pub use eval::*;

pub use message::*;

pub use policy::*;

pub use session::Session;

pub use state::*;

//! The automated opponent: one ply, captures first, otherwise uniformly random.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Duration;

use crate::game::rules::{MoveInfo, RulesEngine};

pub const DEFAULT_OPPONENT_DELAY: Duration = Duration::from_millis(300);

/// Identifies one scheduled opponent move. A ticket is only honoured while it is the
/// latest one issued and has not been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTicket(u64);

pub struct OpponentDriver {
    rng: StdRng,
    delay: Duration,
    generation: u64,
    pending: Option<u64>,
}

impl OpponentDriver {
    pub fn new(delay: Duration) -> Self {
        Self::with_rng(delay, StdRng::from_entropy())
    }

    pub fn with_rng(delay: Duration, rng: StdRng) -> Self {
        Self {
            rng,
            delay,
            generation: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Issues a new ticket, invalidating any earlier one.
    pub fn schedule(&mut self) -> MoveTicket {
        self.generation += 1;
        self.pending = Some(self.generation);
        MoveTicket(self.generation)
    }

    /// Invalidates the pending ticket, if any.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes `ticket` if it is still the live one.
    pub fn redeem(&mut self, ticket: MoveTicket) -> bool {
        if self.pending == Some(ticket.0) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Picks a move for the side to move: a random capture if any exist, otherwise a
    /// random legal move.
    pub fn choose<E: RulesEngine>(&mut self, engine: &E) -> Option<MoveInfo> {
        let moves = engine.legal_moves(None);
        let captures: Vec<&MoveInfo> = moves.iter().filter(|mv| mv.flags.is_capture()).collect();
        let pick = if captures.is_empty() {
            moves.choose(&mut self.rng)
        } else {
            captures.choose(&mut self.rng).copied()
        };
        pick.cloned()
    }
}

use chess::Color;
use serde::{Deserialize, Serialize};

use crate::game::rules::RulesEngine;

/// Parameters of the one-shot confetti effect on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CelebrationEffect {
    pub particle_count: u32,
    pub spread: u32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub decay: f32,
}

impl Default for CelebrationEffect {
    fn default() -> Self {
        Self {
            particle_count: 150,
            spread: 70,
            origin_x: 0.5,
            origin_y: 0.6,
            decay: 0.92,
        }
    }
}

/// Fires when the human mates the automated opponent. Edge-triggered: each position is
/// looked at once, so a mate on screen does not fire again on every refresh.
#[derive(Debug, Default)]
pub struct CelebrationTrigger {
    last_seen: Option<String>,
}

impl CelebrationTrigger {
    /// Marks `fen` as already seen without firing, e.g. for a position restored at start-up.
    pub fn prime(&mut self, fen: String) {
        self.last_seen = Some(fen);
    }

    pub fn observe<E: RulesEngine>(&mut self, engine: &E, human: Color, vs_computer: bool) -> Option<CelebrationEffect> {
        let fen = engine.fen();
        if self.last_seen.as_deref() == Some(fen.as_str()) {
            return None;
        }
        self.last_seen = Some(fen);

        // Mate is always delivered by the side that just moved
        let winner = !engine.turn();
        if vs_computer && engine.is_checkmate() && winner == human {
            Some(CelebrationEffect::default())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::standard::StandardRules;

    const BLACK_MATED: &str = "rnbqkbnr/ppppp2p/5p2/6pQ/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 1 3";
    const WHITE_MATED: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";

    fn engine_at(fen: &str) -> StandardRules {
        let mut engine = StandardRules::default();
        engine.load(fen).unwrap();
        engine
    }

    #[test]
    fn fires_once_for_human_mate() {
        let engine = engine_at(BLACK_MATED);
        let mut trigger = CelebrationTrigger::default();
        assert!(trigger.observe(&engine, Color::White, true).is_some());
        assert!(trigger.observe(&engine, Color::White, true).is_none());
        assert!(trigger.observe(&engine, Color::White, true).is_none());
    }

    #[test]
    fn never_fires_for_computer_mate_or_two_player_games() {
        let mut trigger = CelebrationTrigger::default();
        assert!(trigger.observe(&engine_at(WHITE_MATED), Color::White, true).is_none());

        let mut trigger = CelebrationTrigger::default();
        assert!(trigger.observe(&engine_at(BLACK_MATED), Color::White, false).is_none());
    }

    #[test]
    fn primed_position_does_not_fire() {
        let engine = engine_at(BLACK_MATED);
        let mut trigger = CelebrationTrigger::default();
        trigger.prime(engine.fen());
        assert!(trigger.observe(&engine, Color::White, true).is_none());
    }
}
